//! Child records owned by a fish.
//!
//! Notes, audios, and capture records carry no uniqueness constraints and are
//! freely transferable between fish. Tribal classifications are keyed by
//! tribe: an active fish holds at most one active classification per tribe.
//! Every record carries a tombstone; deletion is an explicit update, never a
//! physical removal.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  fish::{Fish, FishId},
  tribe::Tribe,
};

// ─── Note ────────────────────────────────────────────────────────────────────

/// A free-text observation about a fish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
  pub note_id:    i64,
  pub fish_id:    FishId,
  pub body:       String,
  pub created_at: DateTime<Utc>,
  pub deleted_at: Option<DateTime<Utc>>,
}

/// Input to [`crate::store::FishStore::add_note`].
#[derive(Debug, Clone)]
pub struct NewNote {
  pub fish_id: FishId,
  pub body:    String,
}

// ─── Audio ───────────────────────────────────────────────────────────────────

/// A pronunciation recording. The file itself lives in external storage; only
/// the storage key is kept here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Audio {
  pub audio_id:   i64,
  pub fish_id:    FishId,
  pub path:       String,
  /// Speaker or dialect annotation, free text.
  pub label:      Option<String>,
  pub created_at: DateTime<Utc>,
  pub deleted_at: Option<DateTime<Utc>>,
}

/// Input to [`crate::store::FishStore::add_audio`].
#[derive(Debug, Clone)]
pub struct NewAudio {
  pub fish_id: FishId,
  pub path:    String,
  pub label:   Option<String>,
}

// ─── CaptureRecord ───────────────────────────────────────────────────────────

/// One documented catch of this fish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureRecord {
  pub capture_id:  i64,
  pub fish_id:     FishId,
  pub location:    Option<String>,
  pub method:      Option<String>,
  pub captured_on: Option<NaiveDate>,
  pub created_at:  DateTime<Utc>,
  pub deleted_at:  Option<DateTime<Utc>>,
}

/// Input to [`crate::store::FishStore::add_capture_record`].
#[derive(Debug, Clone)]
pub struct NewCaptureRecord {
  pub fish_id:     FishId,
  pub location:    Option<String>,
  pub method:      Option<String>,
  pub captured_on: Option<NaiveDate>,
}

// ─── TribalClassification ────────────────────────────────────────────────────

/// One tribe's knowledge about one fish: how the village classifies it for
/// consumption and how it is prepared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TribalClassification {
  pub classification_id: i64,
  pub fish_id:           FishId,
  pub tribe:             Tribe,
  /// Fieldwork value, e.g. "oyod" (everyone may eat) or "rahet" (men only).
  pub food_category:     String,
  pub processing:        Option<String>,
  pub notes:             Option<String>,
  pub created_at:        DateTime<Utc>,
  pub deleted_at:        Option<DateTime<Utc>>,
}

/// Input to [`crate::store::FishStore::add_classification`].
#[derive(Debug, Clone)]
pub struct NewClassification {
  pub fish_id:       FishId,
  pub tribe:         Tribe,
  pub food_category: String,
  pub processing:    Option<String>,
  pub notes:         Option<String>,
}

// ─── FishBundle ──────────────────────────────────────────────────────────────

/// A fish together with all of its active child records, loaded eagerly via
/// explicit queries. There is no lazy I/O behind this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FishBundle {
  pub fish:            Fish,
  pub notes:           Vec<Note>,
  pub audios:          Vec<Audio>,
  pub capture_records: Vec<CaptureRecord>,
  pub classifications: Vec<TribalClassification>,
}
