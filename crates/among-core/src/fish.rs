//! Fish — the primary entity. Everything else in the store hangs off one.
//!
//! A fish owns its child records exclusively (parent-pointer relationship).
//! The merge engine is the only component that moves a child record between
//! two fish.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a fish row. Positive, assigned by the store.
pub type FishId = i64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fish {
  pub fish_id:            FishId,
  pub name:               String,
  /// Storage key of the display image, if one has been uploaded.
  pub image_path:         Option<String>,
  /// Storage key of the primary pronunciation recording.
  pub primary_audio_path: Option<String>,
  pub created_at:         DateTime<Utc>,
  /// Tombstone. `Some` marks the fish as soft-deleted (recoverable); it is
  /// set when the fish is absorbed as a merge source or deleted directly.
  pub deleted_at:         Option<DateTime<Utc>>,
}

impl Fish {
  pub fn is_deleted(&self) -> bool { self.deleted_at.is_some() }
}

/// Input to [`crate::store::FishStore::add_fish`].
/// The id and `created_at` are always assigned by the store.
#[derive(Debug, Clone)]
pub struct NewFish {
  pub name:               String,
  pub image_path:         Option<String>,
  pub primary_audio_path: Option<String>,
}

impl NewFish {
  /// Convenience constructor with no media references.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name:               name.into(),
      image_path:         None,
      primary_audio_path: None,
    }
  }
}
