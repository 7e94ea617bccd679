//! Handlers for a fish's child-record endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`/`POST` | `/fish/:id/notes` | |
//! | `GET`/`POST` | `/fish/:id/audios` | |
//! | `GET`/`POST` | `/fish/:id/capture-records` | |
//! | `GET`/`POST` | `/fish/:id/classifications` | POST is 409 if the tribe already has an active row |
//!
//! Every handler answers 404 when the fish itself has no active row.

use std::sync::Arc;

use among_core::{
  fish::FishId,
  record::{
    Audio, CaptureRecord, NewAudio, NewCaptureRecord, NewClassification,
    NewNote, Note, TribalClassification,
  },
  store::FishStore,
  tribe::Tribe,
};
use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::ApiError;

async fn require_fish<S>(store: &S, id: FishId) -> Result<(), ApiError>
where
  S: FishStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  store
    .get_fish(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("fish {id} not found")))?;
  Ok(())
}

// ─── Notes ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NoteBody {
  pub body: String,
}

/// `GET /fish/:id/notes`
pub async fn list_notes<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<FishId>,
) -> Result<Json<Vec<Note>>, ApiError>
where
  S: FishStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  require_fish(store.as_ref(), id).await?;
  let notes = store
    .notes_for(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(notes))
}

/// `POST /fish/:id/notes` — body: `{"body":"..."}`
pub async fn create_note<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<FishId>,
  Json(body): Json<NoteBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FishStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  require_fish(store.as_ref(), id).await?;
  let note = store
    .add_note(NewNote {
      fish_id: id,
      body:    body.body,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(note)))
}

// ─── Audios ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AudioBody {
  pub path:  String,
  pub label: Option<String>,
}

/// `GET /fish/:id/audios`
pub async fn list_audios<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<FishId>,
) -> Result<Json<Vec<Audio>>, ApiError>
where
  S: FishStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  require_fish(store.as_ref(), id).await?;
  let audios = store
    .audios_for(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(audios))
}

/// `POST /fish/:id/audios` — body: `{"path":"...","label":"..."}`
pub async fn create_audio<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<FishId>,
  Json(body): Json<AudioBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FishStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  require_fish(store.as_ref(), id).await?;
  let audio = store
    .add_audio(NewAudio {
      fish_id: id,
      path:    body.path,
      label:   body.label,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(audio)))
}

// ─── Capture records ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CaptureBody {
  pub location:    Option<String>,
  pub method:      Option<String>,
  pub captured_on: Option<NaiveDate>,
}

/// `GET /fish/:id/capture-records`
pub async fn list_captures<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<FishId>,
) -> Result<Json<Vec<CaptureRecord>>, ApiError>
where
  S: FishStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  require_fish(store.as_ref(), id).await?;
  let records = store
    .capture_records_for(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(records))
}

/// `POST /fish/:id/capture-records`
pub async fn create_capture<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<FishId>,
  Json(body): Json<CaptureBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FishStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  require_fish(store.as_ref(), id).await?;
  let record = store
    .add_capture_record(NewCaptureRecord {
      fish_id:     id,
      location:    body.location,
      method:      body.method,
      captured_on: body.captured_on,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Tribal classifications ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ClassificationBody {
  pub tribe:         Tribe,
  pub food_category: String,
  pub processing:    Option<String>,
  pub notes:         Option<String>,
}

/// `GET /fish/:id/classifications`
pub async fn list_classifications<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<FishId>,
) -> Result<Json<Vec<TribalClassification>>, ApiError>
where
  S: FishStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  require_fish(store.as_ref(), id).await?;
  let rows = store
    .classifications_for(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(rows))
}

/// `POST /fish/:id/classifications` — 409 if the tribe already has an active
/// row for this fish.
pub async fn create_classification<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<FishId>,
  Json(body): Json<ClassificationBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FishStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  require_fish(store.as_ref(), id).await?;

  let existing = store
    .classifications_for(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if existing.iter().any(|c| c.tribe == body.tribe) {
    return Err(ApiError::Conflict(format!(
      "fish {id} already has a classification for tribe {}",
      body.tribe
    )));
  }

  let row = store
    .add_classification(NewClassification {
      fish_id:       id,
      tribe:         body.tribe,
      food_category: body.food_category,
      processing:    body.processing,
      notes:         body.notes,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(row)))
}
