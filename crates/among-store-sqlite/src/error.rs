//! Error type for `among-store-sqlite`.

use among_core::{fish::FishId, tribe::Tribe};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] among_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// Attempted to act on a fish that has no active row.
  #[error("fish not found: {0}")]
  FishNotFound(FishId),

  #[error("fish {fish_id} already has an active classification for tribe {tribe}")]
  DuplicateClassification { fish_id: FishId, tribe: Tribe },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
