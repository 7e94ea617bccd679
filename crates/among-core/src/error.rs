//! Error types for `among-core`.

use thiserror::Error;

use crate::{fish::FishId, tribe::Tribe};

#[derive(Debug, Error)]
pub enum Error {
  #[error("fish not found: {0}")]
  FishNotFound(FishId),

  #[error("fish {fish_id} already has an active classification for tribe {tribe}")]
  DuplicateClassification { fish_id: FishId, tribe: Tribe },

  #[error("unknown tribe: {0:?}")]
  UnknownTribe(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
