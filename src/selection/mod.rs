//! Selection engine - resolves overlapping filter options into one query
//!
//! Precedence (highest first):
//! - starting id lower bound (optionally narrowed by owner type)
//! - owner type
//! - explicit id list
//! - everything

pub mod ids;

use log::info;
use std::fmt;

use crate::database::ops::repository::{MediaRepository, MediaStream};
use ids::{IdsArg, parse_media_ids, parse_starting_id};

/// Raw option inputs that decide which media get regenerated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionInput {
    pub model_type: Option<String>,
    pub ids: IdsArg,
    pub starting_from_id: Option<String>,
    pub exclude_starting_id: bool,
}

/// Exactly one query shape per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionCriterion {
    ByIds(Vec<String>),
    ByModelType(String),
    /// `bound` is never `0`; bounds below `1` select from the first record.
    ByIdLowerBound {
        bound: i64,
        inclusive: bool,
        model_type: Option<String>,
    },
    All,
}

impl fmt::Display for SelectionCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionCriterion::ByIds(ids) => write!(f, "ids [{}]", ids.join(",")),
            SelectionCriterion::ByModelType(model_type) => write!(f, "model type {model_type:?}"),
            SelectionCriterion::ByIdLowerBound {
                bound,
                inclusive,
                model_type,
            } => {
                let op = if *inclusive { ">=" } else { ">" };
                match model_type {
                    Some(model_type) => write!(f, "id {op} {bound} of model type {model_type:?}"),
                    None => write!(f, "id {op} {bound}"),
                }
            }
            SelectionCriterion::All => write!(f, "all media"),
        }
    }
}

impl SelectionCriterion {
    /// Open the lazy stream for this criterion. Nothing is read until the
    /// stream is consumed.
    pub fn fetch<'r, R>(&self, repository: &'r R) -> MediaStream<'r>
    where
        R: MediaRepository + ?Sized,
    {
        match self {
            SelectionCriterion::ByIds(ids) => repository.get_by_ids(ids),
            SelectionCriterion::ByModelType(model_type) => {
                repository.get_by_model_type(model_type)
            }
            SelectionCriterion::ByIdLowerBound {
                bound,
                inclusive,
                model_type,
            } => {
                let (bound, exclusive) = clamp_lower_bound(*bound, *inclusive);
                repository.get_by_id_greater_than(
                    bound,
                    exclusive,
                    model_type.as_deref().unwrap_or_default(),
                )
            }
            SelectionCriterion::All => repository.all(),
        }
    }
}

/// Map a signed lower bound onto stored ids: `(bound, exclusive)`.
/// Ids are unsigned, so any negative bound starts from id `0` inclusive.
pub fn clamp_lower_bound(bound: i64, inclusive: bool) -> (u64, bool) {
    match u64::try_from(bound) {
        Ok(bound) => (bound, !inclusive),
        Err(_) => (0, false),
    }
}

type Rule = fn(&SelectionInput) -> Option<SelectionCriterion>;

// Evaluated top-down; the first rule that matches wins.
const RULES: [Rule; 4] = [
    starting_id_rule,
    model_type_rule,
    ids_rule,
    all_rule,
];

fn starting_id_rule(input: &SelectionInput) -> Option<SelectionCriterion> {
    let bound = parse_starting_id(input.starting_from_id.as_deref())?;
    Some(SelectionCriterion::ByIdLowerBound {
        bound,
        inclusive: !input.exclude_starting_id,
        model_type: input.model_type.clone(),
    })
}

fn model_type_rule(input: &SelectionInput) -> Option<SelectionCriterion> {
    input.model_type.clone().map(SelectionCriterion::ByModelType)
}

fn ids_rule(input: &SelectionInput) -> Option<SelectionCriterion> {
    let ids = parse_media_ids(&input.ids);
    (!ids.is_empty()).then_some(SelectionCriterion::ByIds(ids))
}

fn all_rule(_: &SelectionInput) -> Option<SelectionCriterion> {
    Some(SelectionCriterion::All)
}

pub fn resolve(input: &SelectionInput) -> SelectionCriterion {
    RULES
        .iter()
        .find_map(|rule| rule(input))
        .unwrap_or(SelectionCriterion::All)
}

/// Resolve the criterion and open its stream in one step.
pub fn select<'r, R>(repository: &'r R, input: &SelectionInput) -> MediaStream<'r>
where
    R: MediaRepository + ?Sized,
{
    let criterion = resolve(input);
    info!("Regenerating {}", criterion);
    criterion.fetch(repository)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingRepository {
        calls: RefCell<Vec<String>>,
    }

    impl RecordingRepository {
        fn record(&self, call: String) -> MediaStream<'_> {
            self.calls.borrow_mut().push(call);
            Box::new(std::iter::empty())
        }
    }

    impl MediaRepository for RecordingRepository {
        fn get_by_ids(&self, ids: &[String]) -> MediaStream<'_> {
            self.record(format!("ids:{}", ids.join("|")))
        }

        fn get_by_model_type(&self, model_type: &str) -> MediaStream<'_> {
            self.record(format!("model_type:{model_type}"))
        }

        fn get_by_id_greater_than(
            &self,
            bound: u64,
            exclusive: bool,
            model_type: &str,
        ) -> MediaStream<'_> {
            self.record(format!("greater_than:{bound}:{exclusive}:{model_type}"))
        }

        fn all(&self) -> MediaStream<'_> {
            self.record("all".to_string())
        }

        fn count(&self, _criterion: &SelectionCriterion) -> Result<u64> {
            Ok(0)
        }
    }

    fn input(
        model_type: Option<&str>,
        ids: Option<&str>,
        starting_from_id: Option<&str>,
        exclude_starting_id: bool,
    ) -> SelectionInput {
        SelectionInput {
            model_type: model_type.map(str::to_string),
            ids: ids
                .map(|ids| IdsArg::Joined(ids.to_string()))
                .unwrap_or_default(),
            starting_from_id: starting_from_id.map(str::to_string),
            exclude_starting_id,
        }
    }

    #[test]
    fn starting_id_beats_every_other_input() {
        let criterion = resolve(&input(Some("Post"), Some("1,2"), Some("100"), true));
        assert_eq!(
            criterion,
            SelectionCriterion::ByIdLowerBound {
                bound: 100,
                inclusive: false,
                model_type: Some("Post".to_string()),
            }
        );

        let criterion = resolve(&input(None, Some("1,2"), Some("100"), false));
        assert_eq!(
            criterion,
            SelectionCriterion::ByIdLowerBound {
                bound: 100,
                inclusive: true,
                model_type: None,
            }
        );
    }

    #[test]
    fn model_type_beats_ids() {
        assert_eq!(
            resolve(&input(Some("Post"), Some("1,2"), None, false)),
            SelectionCriterion::ByModelType("Post".to_string())
        );
    }

    #[test]
    fn ids_beat_all() {
        assert_eq!(
            resolve(&input(None, Some("5,7,9"), None, false)),
            SelectionCriterion::ByIds(vec!["5".into(), "7".into(), "9".into()])
        );
    }

    #[test]
    fn nothing_given_selects_all() {
        assert_eq!(resolve(&SelectionInput::default()), SelectionCriterion::All);
    }

    #[test]
    fn zero_starting_id_falls_through() {
        assert_eq!(
            resolve(&input(Some("Post"), None, Some("0"), true)),
            SelectionCriterion::ByModelType("Post".to_string())
        );
        assert_eq!(
            resolve(&input(None, Some("3"), Some("0"), false)),
            SelectionCriterion::ByIds(vec!["3".into()])
        );
        assert_eq!(
            resolve(&input(None, None, Some("zero"), false)),
            SelectionCriterion::All
        );
    }

    #[test]
    fn negative_starting_id_still_beats_ids() {
        let criterion = resolve(&input(None, Some("5"), Some("-4"), true));
        assert_eq!(
            criterion,
            SelectionCriterion::ByIdLowerBound {
                bound: -4,
                inclusive: false,
                model_type: None,
            }
        );

        let repository = RecordingRepository::default();
        let _ = select(&repository, &input(Some("Post"), Some("5"), Some("-4"), true)).count();
        assert_eq!(
            *repository.calls.borrow(),
            vec!["greater_than:0:false:Post".to_string()]
        );
    }

    #[test]
    fn starting_id_with_trailing_garbage_uses_its_digits() {
        assert_eq!(
            resolve(&input(None, Some("5"), Some("100abc"), false)),
            SelectionCriterion::ByIdLowerBound {
                bound: 100,
                inclusive: true,
                model_type: None,
            }
        );
    }

    #[test]
    fn lower_bounds_clamp_to_stored_ids() {
        assert_eq!(clamp_lower_bound(100, true), (100, false));
        assert_eq!(clamp_lower_bound(100, false), (100, true));
        assert_eq!(clamp_lower_bound(-4, true), (0, false));
        assert_eq!(clamp_lower_bound(-1, false), (0, false));
    }

    #[test]
    fn every_combination_resolves_to_exactly_one_query() {
        let model_types = [None, Some("Post")];
        let id_lists = [None, Some("1,2")];
        let starts = [None, Some("0"), Some("7")];

        for model_type in model_types {
            for id_list in id_lists {
                for start in starts {
                    for exclude in [false, true] {
                        let repository = RecordingRepository::default();
                        let selection =
                            input(model_type, id_list, start, exclude);
                        let _ = select(&repository, &selection).count();

                        let calls = repository.calls.borrow();
                        assert_eq!(calls.len(), 1, "{selection:?} -> {calls:?}");

                        let expected = if start == Some("7") {
                            format!("greater_than:7:{exclude}:{}", model_type.unwrap_or(""))
                        } else if let Some(model_type) = model_type {
                            format!("model_type:{model_type}")
                        } else if id_list.is_some() {
                            "ids:1|2".to_string()
                        } else {
                            "all".to_string()
                        };
                        assert_eq!(calls[0], expected, "{selection:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn lower_bound_with_owner_type_never_runs_the_plain_owner_query() {
        let repository = RecordingRepository::default();
        let selection = input(Some("Post"), None, Some("100"), true);

        let _ = select(&repository, &selection).count();

        assert_eq!(
            *repository.calls.borrow(),
            vec!["greater_than:100:true:Post".to_string()]
        );
    }

    #[test]
    fn criteria_render_for_logging() {
        let criterion = SelectionCriterion::ByIdLowerBound {
            bound: 9,
            inclusive: false,
            model_type: None,
        };
        assert_eq!(criterion.to_string(), "id > 9");
        assert_eq!(SelectionCriterion::All.to_string(), "all media");
    }
}
