//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, capture dates as `YYYY-MM-DD`,
//! tribes as their lowercase village codes. Tombstones are nullable
//! timestamps.

use among_core::{
  fish::Fish,
  record::{Audio, CaptureRecord, FishBundle, Note, TribalClassification},
  tribe::Tribe,
};
use chrono::{DateTime, NaiveDate, Utc};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_opt_dt(s: Option<&str>) -> Result<Option<DateTime<Utc>>> {
  s.map(decode_dt).transpose()
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Tribe ───────────────────────────────────────────────────────────────────

pub fn encode_tribe(t: Tribe) -> &'static str { t.as_str() }

pub fn decode_tribe(s: &str) -> Result<Tribe> { Ok(s.parse::<Tribe>()?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `fish` row.
pub struct RawFish {
  pub fish_id:            i64,
  pub name:               String,
  pub image_path:         Option<String>,
  pub primary_audio_path: Option<String>,
  pub created_at:         String,
  pub deleted_at:         Option<String>,
}

impl RawFish {
  pub fn into_fish(self) -> Result<Fish> {
    Ok(Fish {
      fish_id:            self.fish_id,
      name:               self.name,
      image_path:         self.image_path,
      primary_audio_path: self.primary_audio_path,
      created_at:         decode_dt(&self.created_at)?,
      deleted_at:         decode_opt_dt(self.deleted_at.as_deref())?,
    })
  }
}

/// Raw strings read directly from a `notes` row.
pub struct RawNote {
  pub note_id:    i64,
  pub fish_id:    i64,
  pub body:       String,
  pub created_at: String,
  pub deleted_at: Option<String>,
}

impl RawNote {
  pub fn into_note(self) -> Result<Note> {
    Ok(Note {
      note_id:    self.note_id,
      fish_id:    self.fish_id,
      body:       self.body,
      created_at: decode_dt(&self.created_at)?,
      deleted_at: decode_opt_dt(self.deleted_at.as_deref())?,
    })
  }
}

/// Raw strings read directly from an `audios` row.
pub struct RawAudio {
  pub audio_id:   i64,
  pub fish_id:    i64,
  pub path:       String,
  pub label:      Option<String>,
  pub created_at: String,
  pub deleted_at: Option<String>,
}

impl RawAudio {
  pub fn into_audio(self) -> Result<Audio> {
    Ok(Audio {
      audio_id:   self.audio_id,
      fish_id:    self.fish_id,
      path:       self.path,
      label:      self.label,
      created_at: decode_dt(&self.created_at)?,
      deleted_at: decode_opt_dt(self.deleted_at.as_deref())?,
    })
  }
}

/// Raw strings read directly from a `capture_records` row.
pub struct RawCaptureRecord {
  pub capture_id:  i64,
  pub fish_id:     i64,
  pub location:    Option<String>,
  pub method:      Option<String>,
  pub captured_on: Option<String>,
  pub created_at:  String,
  pub deleted_at:  Option<String>,
}

impl RawCaptureRecord {
  pub fn into_capture_record(self) -> Result<CaptureRecord> {
    Ok(CaptureRecord {
      capture_id:  self.capture_id,
      fish_id:     self.fish_id,
      location:    self.location,
      method:      self.method,
      captured_on: self.captured_on.as_deref().map(decode_date).transpose()?,
      created_at:  decode_dt(&self.created_at)?,
      deleted_at:  decode_opt_dt(self.deleted_at.as_deref())?,
    })
  }
}

/// Raw strings read directly from a `tribal_classifications` row.
pub struct RawClassification {
  pub classification_id: i64,
  pub fish_id:           i64,
  pub tribe:             String,
  pub food_category:     String,
  pub processing:        Option<String>,
  pub notes:             Option<String>,
  pub created_at:        String,
  pub deleted_at:        Option<String>,
}

impl RawClassification {
  pub fn into_classification(self) -> Result<TribalClassification> {
    Ok(TribalClassification {
      classification_id: self.classification_id,
      fish_id:           self.fish_id,
      tribe:             decode_tribe(&self.tribe)?,
      food_category:     self.food_category,
      processing:        self.processing,
      notes:             self.notes,
      created_at:        decode_dt(&self.created_at)?,
      deleted_at:        decode_opt_dt(self.deleted_at.as_deref())?,
    })
  }
}

/// A fish row plus raw child rows, read in one connection call.
pub struct RawBundle {
  pub fish:            RawFish,
  pub notes:           Vec<RawNote>,
  pub audios:          Vec<RawAudio>,
  pub capture_records: Vec<RawCaptureRecord>,
  pub classifications: Vec<RawClassification>,
}

impl RawBundle {
  pub fn into_bundle(self) -> Result<FishBundle> {
    Ok(FishBundle {
      fish:            self.fish.into_fish()?,
      notes:           self
        .notes
        .into_iter()
        .map(RawNote::into_note)
        .collect::<Result<_>>()?,
      audios:          self
        .audios
        .into_iter()
        .map(RawAudio::into_audio)
        .collect::<Result<_>>()?,
      capture_records: self
        .capture_records
        .into_iter()
        .map(RawCaptureRecord::into_capture_record)
        .collect::<Result<_>>()?,
      classifications: self
        .classifications
        .into_iter()
        .map(RawClassification::into_classification)
        .collect::<Result<_>>()?,
    })
  }
}
