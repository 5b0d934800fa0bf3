use serde::Deserialize;
use std::collections::BTreeSet;

use crate::common::errors::SelectionInputError;
use crate::regenerate::GenerationOptions;
use crate::selection::SelectionInput;
use crate::selection::ids::IdsArg;

pub const ARGS_PREFIX: &str = "REGENERATE_";

/// Inputs of one regenerate command, read from `REGENERATE_*` variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegenerateArgs {
    /// Owner type filter.
    pub model_type: Option<String>,
    /// Comma separated media ids.
    pub ids: Option<String>,
    /// Comma separated conversion names.
    pub only: Option<String>,
    pub starting_from_id: Option<String>,
    pub exclude_starting_id: bool,
    pub only_missing: bool,
    pub with_responsive_images: bool,
    /// Skip the production environment guard.
    pub force: bool,
    pub queue_all: bool,
}

impl RegenerateArgs {
    pub fn from_env() -> Result<Self, SelectionInputError> {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, SelectionInputError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(ARGS_PREFIX)
            .from_iter(vars)
            .map_err(|error| SelectionInputError::Malformed(error.to_string()))
    }

    pub fn selection_input(&self) -> SelectionInput {
        SelectionInput {
            model_type: self.model_type.clone(),
            ids: self
                .ids
                .clone()
                .map(IdsArg::Joined)
                .unwrap_or_default(),
            starting_from_id: self.starting_from_id.clone(),
            exclude_starting_id: self.exclude_starting_id,
        }
    }

    pub fn generation_options(&self) -> GenerationOptions {
        let only_conversions: BTreeSet<String> = self
            .only
            .iter()
            .flat_map(|only| only.split(','))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        GenerationOptions {
            only_conversions,
            only_missing: self.only_missing,
            with_responsive_images: self.with_responsive_images,
            force_queue_all: self.queue_all,
        }
    }
}
