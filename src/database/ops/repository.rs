use anyhow::Result;
use log::debug;
use std::collections::BTreeSet;

use crate::common::ROW_BATCH_NUMBER;
use crate::database::ops::cursor::{MediaCursor, MediaPage};
use crate::database::ops::tree::Tree;
use crate::database::schema::media::MediaRecord;
use crate::selection::{SelectionCriterion, clamp_lower_bound};

/// Lazy sequence of records; items are fetched as they are consumed.
pub type MediaStream<'a> = Box<dyn Iterator<Item = Result<MediaRecord>> + 'a>;

/// The four query shapes the selection engine can resolve to.
///
/// Every shape yields records in ascending id order and never materialises
/// the full result set.
pub trait MediaRepository {
    /// Unknown or unparsable ids are ignored.
    fn get_by_ids(&self, ids: &[String]) -> MediaStream<'_>;

    fn get_by_model_type(&self, model_type: &str) -> MediaStream<'_>;

    /// An empty `model_type` applies no owner filter.
    fn get_by_id_greater_than(&self, bound: u64, exclusive: bool, model_type: &str)
    -> MediaStream<'_>;

    fn all(&self) -> MediaStream<'_>;

    /// Number of records a criterion would yield, for sizing progress.
    fn count(&self, criterion: &SelectionCriterion) -> Result<u64>;
}

fn parse_known_ids(ids: &[String]) -> Vec<u64> {
    ids.iter()
        .filter_map(|raw| match raw.trim().parse::<u64>() {
            Ok(id) => Some(id),
            Err(_) => {
                debug!("Ignoring media id {:?}", raw);
                None
            }
        })
        .collect::<BTreeSet<u64>>()
        .into_iter()
        .collect()
}

fn lower_bound(bound: u64, exclusive: bool) -> Option<u64> {
    if exclusive {
        bound.checked_add(1)
    } else {
        Some(bound)
    }
}

impl MediaRepository for Tree {
    fn get_by_ids(&self, ids: &[String]) -> MediaStream<'_> {
        let ids = parse_known_ids(ids);
        let Some(&first) = ids.first() else {
            return Box::new(MediaCursor::empty());
        };
        Box::new(MediaCursor::new(first, ROW_BATCH_NUMBER, move |from, limit| {
            let start = ids.partition_point(|id| *id < from);
            let chunk = &ids[start..(start + limit).min(ids.len())];
            let next_from = ids.get(start + chunk.len()).copied();
            Ok(MediaPage {
                records: self.read_media_by_ids(chunk)?,
                next_from,
            })
        }))
    }

    fn get_by_model_type(&self, model_type: &str) -> MediaStream<'_> {
        let model_type = model_type.to_string();
        Box::new(MediaCursor::new(0, ROW_BATCH_NUMBER, move |from, limit| {
            self.read_media_page_by_model_type(&model_type, from, limit)
        }))
    }

    fn get_by_id_greater_than(
        &self,
        bound: u64,
        exclusive: bool,
        model_type: &str,
    ) -> MediaStream<'_> {
        let Some(from) = lower_bound(bound, exclusive) else {
            return Box::new(MediaCursor::empty());
        };
        if model_type.is_empty() {
            return Box::new(MediaCursor::new(from, ROW_BATCH_NUMBER, move |from, limit| {
                self.read_media_page(from, limit)
            }));
        }
        let model_type = model_type.to_string();
        Box::new(MediaCursor::new(from, ROW_BATCH_NUMBER, move |from, limit| {
            self.read_media_page_by_model_type(&model_type, from, limit)
        }))
    }

    fn all(&self) -> MediaStream<'_> {
        Box::new(MediaCursor::new(0, ROW_BATCH_NUMBER, move |from, limit| {
            self.read_media_page(from, limit)
        }))
    }

    fn count(&self, criterion: &SelectionCriterion) -> Result<u64> {
        match criterion {
            SelectionCriterion::ByIds(ids) => self.count_media_by_ids(&parse_known_ids(ids)),
            SelectionCriterion::ByModelType(model_type) => {
                self.count_media_by_model_type(model_type, 0)
            }
            SelectionCriterion::ByIdLowerBound {
                bound,
                inclusive,
                model_type,
            } => {
                let (bound, exclusive) = clamp_lower_bound(*bound, *inclusive);
                let Some(from) = lower_bound(bound, exclusive) else {
                    return Ok(0);
                };
                match model_type.as_deref() {
                    Some(model_type) if !model_type.is_empty() => {
                        self.count_media_by_model_type(model_type, from)
                    }
                    _ => self.count_media_from(from),
                }
            }
            SelectionCriterion::All => self.count_media_from(0),
        }
    }
}
