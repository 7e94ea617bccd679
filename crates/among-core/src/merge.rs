//! The fish-merge engine.
//!
//! Merging absorbs one or more source fish into a target fish: child records
//! are repointed to the target, tribal-classification conflicts are settled
//! by keeping the target's row, and each absorbed source is tombstoned.
//!
//! Entry points, in the order a request flows through them:
//! [`validate_merge`] (pre-flight checks, no side effects),
//! [`preview_merge`] (read-only simulation), and [`execute_merge`]
//! (validation gate + the store's transactional
//! [`merge_fish`](FishStore::merge_fish)).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
  fish::{Fish, FishId},
  record::TribalClassification,
  store::FishStore,
  tribe::Tribe,
};

// ─── Validation gate ─────────────────────────────────────────────────────────

/// Outcome of the pre-merge checks. All violations are collected; nothing
/// short-circuits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeValidation {
  pub valid:  bool,
  pub errors: Vec<String>,
}

/// Pre-flight checks shared by preview and execution:
///
/// - the target references an existing, active fish;
/// - every source references an existing, active fish (missing ids named);
/// - the target does not appear among the sources;
/// - at least one source is given.
///
/// Read-only. Business-rule violations come back as a structured
/// [`MergeValidation`], never as an error value; only store I/O can fail.
pub async fn validate_merge<S: FishStore>(
  store: &S,
  target_id: FishId,
  source_ids: &[FishId],
) -> Result<MergeValidation, S::Error> {
  let mut errors = Vec::new();

  if store.get_fish(target_id).await?.is_none() {
    errors.push("target fish id does not exist".to_string());
  }

  let mut missing = Vec::new();
  for &id in source_ids {
    if store.get_fish(id).await?.is_none() {
      missing.push(id.to_string());
    }
  }
  if !missing.is_empty() {
    errors.push(format!(
      "the following fish ids do not exist: {}",
      missing.join(", ")
    ));
  }

  if source_ids.contains(&target_id) {
    errors.push("cannot merge a fish into itself".to_string());
  }

  if source_ids.is_empty() {
    errors.push("at least one source fish is required".to_string());
  }

  Ok(MergeValidation {
    valid: errors.is_empty(),
    errors,
  })
}

// ─── Conflict resolver ───────────────────────────────────────────────────────

/// Decision for one source classification row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
  /// The target already carries an active classification for this tribe.
  Conflict,
  /// No classification for this tribe on the target; the row moves over.
  Transferable,
}

/// Classify one source classification row against the target's current set
/// of classified tribes.
///
/// The policy is fixed: on conflict, the target's existing row always wins
/// and the source's row is discarded — no field-by-field reconciliation, no
/// source-wins option. Tribal classifications are sourced from fieldwork per
/// village; a fish already documented for a tribe on the canonical record is
/// never silently overwritten by a duplicate entry from an absorbed fish.
pub fn resolve(target_tribes: &BTreeSet<Tribe>, source_tribe: Tribe) -> Resolution {
  if target_tribes.contains(&source_tribe) {
    Resolution::Conflict
  } else {
    Resolution::Transferable
  }
}

// ─── Conflict records ────────────────────────────────────────────────────────

/// How a classification conflict is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
  /// The target's existing row is kept; the source's row is tombstoned.
  KeepTarget,
}

/// One tribal-classification conflict between the target and a source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationConflict {
  pub tribe:          Tribe,
  pub source_fish_id: FishId,
  pub target_row:     TribalClassification,
  pub source_row:     TribalClassification,
  pub resolution:     ConflictResolution,
}

/// Discriminator for entries in [`MergePreview::conflicts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
  TribalClassifications,
  /// Legacy discriminant from the removed fish-size feature. Kept so older
  /// clients keep parsing the conflict list; no code path produces it.
  FishSize,
}

/// A flattened, human-readable conflict entry for the preview payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictNotice {
  #[serde(rename = "type")]
  pub kind:        ConflictKind,
  pub description: String,
}

impl ConflictNotice {
  fn tribal(target_id: FishId, conflict: &ClassificationConflict) -> Self {
    Self {
      kind:        ConflictKind::TribalClassifications,
      description: format!(
        "fish #{target_id} and fish #{source} both carry a classification \
         for tribe \"{tribe}\"; fish #{target_id}'s row is kept",
        source = conflict.source_fish_id,
        tribe = conflict.tribe,
      ),
    }
  }
}

// ─── Result shapes ───────────────────────────────────────────────────────────

/// Per-kind transfer counters.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct TransferCounts {
  pub notes:                  usize,
  pub audios:                 usize,
  pub capture_records:        usize,
  /// Non-conflicting classification transfers only; conflicting rows are
  /// counted in [`ConflictCounts`] instead.
  pub tribal_classifications: usize,
}

/// Counts of conflicts settled during a merge.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct ConflictCounts {
  pub tribal_classifications: usize,
}

/// Outcome of a committed merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeResult {
  pub target_fish_id:     FishId,
  /// Absorbed fish ids, in the order supplied by the caller.
  pub merged_fish_ids:    Vec<FishId>,
  pub transferred:        TransferCounts,
  pub conflicts_resolved: ConflictCounts,
}

// ─── Preview shapes ──────────────────────────────────────────────────────────

/// Identity plus display name, as embedded in preview payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FishRef {
  pub fish_id: FishId,
  pub name:    String,
}

impl From<&Fish> for FishRef {
  fn from(fish: &Fish) -> Self {
    Self {
      fish_id: fish.fish_id,
      name:    fish.name.clone(),
    }
  }
}

/// What one source would contribute to the target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcePreview {
  pub fish:                         FishRef,
  pub notes:                        usize,
  pub audios:                       usize,
  pub capture_records:              usize,
  pub transferable_classifications: usize,
  pub classification_conflicts:     Vec<ClassificationConflict>,
}

/// Aggregate counts across all sources.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct PreviewSummary {
  pub notes:                    usize,
  pub audios:                   usize,
  pub capture_records:          usize,
  /// Classifications that would transfer without conflict.
  pub tribal_classifications:   usize,
  pub classification_conflicts: usize,
}

/// Read-only simulation of a merge. Producing one mutates nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergePreview {
  pub target:    FishRef,
  pub sources:   Vec<SourcePreview>,
  pub conflicts: Vec<ConflictNotice>,
  pub summary:   PreviewSummary,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Failure modes shared by the preview and execution engines.
#[derive(Debug, Error)]
pub enum MergeError<E> {
  /// The validation gate refused the request; nothing was touched.
  #[error("merge validation failed: {}", .0.errors.join("; "))]
  Rejected(MergeValidation),

  /// A referenced fish vanished between validation and use.
  #[error("fish not found: {0}")]
  NotFound(FishId),

  /// The underlying store failed; any open transaction was rolled back.
  #[error("store error: {0}")]
  Store(#[source] E),
}

// ─── Preview engine ──────────────────────────────────────────────────────────

/// Simulate a merge without mutating the store.
///
/// Loads the target and every source with their full child collections, runs
/// the conflict resolver per source classification row, and tallies what a
/// subsequent [`execute_merge`] would transfer. A tribe transferred by an
/// earlier source is treated as present on the target for later sources, so
/// the preview's counts always equal the counts a real execution reports.
pub async fn preview_merge<S: FishStore>(
  store: &S,
  target_id: FishId,
  source_ids: &[FishId],
) -> Result<MergePreview, MergeError<S::Error>> {
  let validation = validate_merge(store, target_id, source_ids)
    .await
    .map_err(MergeError::Store)?;
  if !validation.valid {
    return Err(MergeError::Rejected(validation));
  }

  let target = store
    .load_fish_bundle(target_id)
    .await
    .map_err(MergeError::Store)?
    .ok_or(MergeError::NotFound(target_id))?;

  // The target's classification rows keyed by tribe. Rows transferred from
  // earlier sources join this map so later sources conflict against them.
  let mut claimed: BTreeMap<Tribe, TribalClassification> = target
    .classifications
    .iter()
    .map(|row| (row.tribe, row.clone()))
    .collect();

  let mut sources = Vec::with_capacity(source_ids.len());
  let mut conflicts = Vec::new();
  let mut summary = PreviewSummary::default();

  for &source_id in source_ids {
    let bundle = store
      .load_fish_bundle(source_id)
      .await
      .map_err(MergeError::Store)?
      .ok_or(MergeError::NotFound(source_id))?;

    let mut preview = SourcePreview {
      fish:                         FishRef::from(&bundle.fish),
      notes:                        bundle.notes.len(),
      audios:                       bundle.audios.len(),
      capture_records:              bundle.capture_records.len(),
      transferable_classifications: 0,
      classification_conflicts:     Vec::new(),
    };

    let claimed_tribes: BTreeSet<Tribe> = claimed.keys().copied().collect();
    for row in &bundle.classifications {
      match resolve(&claimed_tribes, row.tribe) {
        Resolution::Conflict => {
          // The resolver only answers Conflict for a claimed tribe, so the
          // lookup always succeeds.
          if let Some(target_row) = claimed.get(&row.tribe) {
            let conflict = ClassificationConflict {
              tribe:          row.tribe,
              source_fish_id: source_id,
              target_row:     target_row.clone(),
              source_row:     row.clone(),
              resolution:     ConflictResolution::KeepTarget,
            };
            conflicts.push(ConflictNotice::tribal(target_id, &conflict));
            preview.classification_conflicts.push(conflict);
          }
        }
        Resolution::Transferable => {
          claimed.insert(row.tribe, row.clone());
          preview.transferable_classifications += 1;
        }
      }
    }

    summary.notes += preview.notes;
    summary.audios += preview.audios;
    summary.capture_records += preview.capture_records;
    summary.tribal_classifications += preview.transferable_classifications;
    summary.classification_conflicts += preview.classification_conflicts.len();
    sources.push(preview);
  }

  Ok(MergePreview {
    target: FishRef::from(&target.fish),
    sources,
    conflicts,
    summary,
  })
}

// ─── Execution engine ────────────────────────────────────────────────────────

/// Run the validation gate, then the store's transactional merge.
///
/// The whole call has exactly two terminal states: fully committed, or fully
/// rolled back with the store untouched — including any sources already
/// processed before a failure. See [`FishStore::merge_fish`].
pub async fn execute_merge<S: FishStore>(
  store: &S,
  target_id: FishId,
  source_ids: &[FishId],
) -> Result<MergeResult, MergeError<S::Error>> {
  let validation = validate_merge(store, target_id, source_ids)
    .await
    .map_err(MergeError::Store)?;
  if !validation.valid {
    return Err(MergeError::Rejected(validation));
  }

  store.merge_fish(target_id, source_ids).await
}

// ─── Tests ───────────────────────────────────────────────────────────────────
