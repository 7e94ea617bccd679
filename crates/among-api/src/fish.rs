//! Handlers for `/fish` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/fish` | Active fish only |
//! | `POST`   | `/fish` | Body: [`CreateBody`]; returns 201 + stored fish |
//! | `GET`    | `/fish/:id` | Full bundle (fish + children); 404 if not found |
//! | `DELETE` | `/fish/:id` | Soft delete; 404 if not found |

use std::sync::Arc;

use among_core::{
  fish::{Fish, FishId, NewFish},
  record::FishBundle,
  store::FishStore,
};
use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /fish`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Fish>>, ApiError>
where
  S: FishStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let fish = store
    .list_fish()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(fish))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:               String,
  pub image_path:         Option<String>,
  pub primary_audio_path: Option<String>,
}

/// `POST /fish` — body: `{"name":"cilat"}`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FishStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let fish = store
    .add_fish(NewFish {
      name:               body.name,
      image_path:         body.image_path,
      primary_audio_path: body.primary_audio_path,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(fish)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /fish/:id` — the fish plus all of its active child records.
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<FishId>,
) -> Result<Json<FishBundle>, ApiError>
where
  S: FishStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let bundle = store
    .load_fish_bundle(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("fish {id} not found")))?;
  Ok(Json(bundle))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /fish/:id` — tombstones the fish and its child records.
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<FishId>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FishStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  store
    .get_fish(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("fish {id} not found")))?;

  store
    .delete_fish(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(StatusCode::NO_CONTENT)
}
