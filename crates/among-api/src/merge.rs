//! Handlers for the merge endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/fish/merge/preview` | Read-only simulation; mutates nothing |
//! | `POST` | `/fish/merge` | Transactional execution; all-or-nothing |
//!
//! Both take the same body and answer with the `{success, message, data}`
//! envelope. Shape violations and gate rejections are 422, a fish that
//! vanished between validation and load is 404, anything else a 500.

use std::{collections::BTreeSet, sync::Arc};

use among_core::{fish::FishId, merge, store::FishStore};
use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;

/// JSON body accepted by both merge endpoints.
#[derive(Debug, Deserialize)]
pub struct MergeBody {
  pub target_fish_id:  FishId,
  pub source_fish_ids: Vec<FishId>,
}

/// Shape checks performed before the business gate: ids must be positive and
/// the source list must not repeat itself. Existence, self-merge, and the
/// non-empty rule belong to [`merge::validate_merge`].
fn shape_errors(body: &MergeBody) -> Vec<String> {
  let mut errors = Vec::new();

  if body.target_fish_id <= 0 {
    errors.push("target_fish_id must be a positive integer".to_string());
  }
  if body.source_fish_ids.iter().any(|&id| id <= 0) {
    errors
      .push("source_fish_ids must contain only positive integers".to_string());
  }

  let mut seen = BTreeSet::new();
  if !body.source_fish_ids.iter().all(|id| seen.insert(id)) {
    errors.push("source_fish_ids must not contain duplicates".to_string());
  }

  errors
}

/// `POST /fish/merge/preview`
pub async fn preview<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<MergeBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: FishStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let errors = shape_errors(&body);
  if !errors.is_empty() {
    return Err(ApiError::Unprocessable(errors));
  }

  let preview =
    merge::preview_merge(store.as_ref(), body.target_fish_id, &body.source_fish_ids)
      .await
      .map_err(ApiError::from_merge)?;

  tracing::info!(
    target_fish_id = body.target_fish_id,
    source_fish_ids = ?body.source_fish_ids,
    conflicts = preview.summary.classification_conflicts,
    "merge preview produced"
  );

  Ok(Json(json!({
    "success": true,
    "message": "merge preview generated",
    "data": {
      "target": preview.target,
      "sources": preview.sources,
      "conflicts": preview.conflicts,
      "summary": preview.summary,
      "notes_count": preview.summary.notes,
      "audios_count": preview.summary.audios,
      "capture_records_count": preview.summary.capture_records,
    },
  })))
}

/// `POST /fish/merge`
pub async fn execute<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<MergeBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: FishStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let errors = shape_errors(&body);
  if !errors.is_empty() {
    return Err(ApiError::Unprocessable(errors));
  }

  let result =
    merge::execute_merge(store.as_ref(), body.target_fish_id, &body.source_fish_ids)
      .await
      .map_err(ApiError::from_merge)?;

  tracing::info!(
    target_fish_id = result.target_fish_id,
    merged_fish_ids = ?result.merged_fish_ids,
    conflicts_resolved = result.conflicts_resolved.tribal_classifications,
    "fish merged"
  );

  Ok(Json(json!({
    "success": true,
    "message": format!(
      "merged {} fish into #{}",
      result.merged_fish_ids.len(),
      result.target_fish_id
    ),
    "data": result,
  })))
}
