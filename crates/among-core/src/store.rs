//! The `FishStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `among-store-sqlite`).
//! Higher layers (`among-api`, the merge engine in [`crate::merge`]) depend
//! on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  fish::{Fish, FishId, NewFish},
  merge::{MergeError, MergeResult},
  record::{
    Audio, CaptureRecord, FishBundle, NewAudio, NewCaptureRecord,
    NewClassification, NewNote, Note, TribalClassification,
  },
};

/// Abstraction over an Among store backend.
///
/// Reads return active rows only unless the method name carries an `_any`
/// suffix, in which case tombstoned rows are included. Deletion is always a
/// tombstone update, never a physical delete.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait FishStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Fish ──────────────────────────────────────────────────────────────

  /// Create and persist a new fish. The store assigns id and `created_at`.
  fn add_fish(
    &self,
    input: NewFish,
  ) -> impl Future<Output = Result<Fish, Self::Error>> + Send + '_;

  /// Retrieve an active fish by id. Returns `None` if the id is unknown or
  /// the fish is tombstoned.
  fn get_fish(
    &self,
    id: FishId,
  ) -> impl Future<Output = Result<Option<Fish>, Self::Error>> + Send + '_;

  /// Like [`FishStore::get_fish`] but includes tombstoned fish.
  fn get_fish_any(
    &self,
    id: FishId,
  ) -> impl Future<Output = Result<Option<Fish>, Self::Error>> + Send + '_;

  /// List all active fish, ordered by id.
  fn list_fish(
    &self,
  ) -> impl Future<Output = Result<Vec<Fish>, Self::Error>> + Send + '_;

  /// Tombstone an active fish. Errors if there is no active fish with this
  /// id. Child records are tombstoned alongside the fish.
  fn delete_fish(
    &self,
    id: FishId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Child records ─────────────────────────────────────────────────────

  fn add_note(
    &self,
    input: NewNote,
  ) -> impl Future<Output = Result<Note, Self::Error>> + Send + '_;

  fn add_audio(
    &self,
    input: NewAudio,
  ) -> impl Future<Output = Result<Audio, Self::Error>> + Send + '_;

  fn add_capture_record(
    &self,
    input: NewCaptureRecord,
  ) -> impl Future<Output = Result<CaptureRecord, Self::Error>> + Send + '_;

  /// Record one tribe's classification of a fish.
  ///
  /// Errors if the fish already has an active classification for this tribe;
  /// at most one active row per (fish, tribe) is an application invariant,
  /// not merely a database constraint.
  fn add_classification(
    &self,
    input: NewClassification,
  ) -> impl Future<Output = Result<TribalClassification, Self::Error>> + Send + '_;

  /// Active notes for a fish, ordered by id.
  fn notes_for(
    &self,
    fish_id: FishId,
  ) -> impl Future<Output = Result<Vec<Note>, Self::Error>> + Send + '_;

  /// Active audios for a fish, ordered by id.
  fn audios_for(
    &self,
    fish_id: FishId,
  ) -> impl Future<Output = Result<Vec<Audio>, Self::Error>> + Send + '_;

  /// Active capture records for a fish, ordered by id.
  fn capture_records_for(
    &self,
    fish_id: FishId,
  ) -> impl Future<Output = Result<Vec<CaptureRecord>, Self::Error>> + Send + '_;

  /// Active tribal classifications for a fish, ordered by id.
  fn classifications_for(
    &self,
    fish_id: FishId,
  ) -> impl Future<Output = Result<Vec<TribalClassification>, Self::Error>> + Send + '_;

  /// All classifications for a fish including tombstoned rows. Used by
  /// audits and by tests asserting conflict resolutions.
  fn classifications_for_any(
    &self,
    fish_id: FishId,
  ) -> impl Future<Output = Result<Vec<TribalClassification>, Self::Error>> + Send + '_;

  // ── Aggregate reads ───────────────────────────────────────────────────

  /// An active fish with all of its active children, loaded eagerly.
  /// Returns `None` if there is no active fish with this id.
  fn load_fish_bundle(
    &self,
    id: FishId,
  ) -> impl Future<Output = Result<Option<FishBundle>, Self::Error>> + Send + '_;

  // ── Merge execution ───────────────────────────────────────────────────

  /// The transactional merge: absorb `source_ids` into `target_id`, in the
  /// order given.
  ///
  /// The backend must run the entire call as one atomic transaction: either
  /// every transfer, conflict resolution, and tombstone commits, or — on any
  /// failure, for any source — the store is left exactly as it was. A source
  /// (or the target) that no longer exists aborts the call with
  /// [`MergeError::NotFound`].
  ///
  /// Callers normally reach this through
  /// [`crate::merge::execute_merge`], which runs the validation gate first.
  fn merge_fish<'a>(
    &'a self,
    target_id: FishId,
    source_ids: &'a [FishId],
  ) -> impl Future<Output = Result<MergeResult, MergeError<Self::Error>>> + Send + 'a;
}
