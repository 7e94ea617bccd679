//! Integration tests for `SqliteStore` against an in-memory database.

use among_core::{
  fish::{FishId, NewFish},
  merge::{self, ConflictKind, ConflictResolution, MergeError},
  record::{NewAudio, NewCaptureRecord, NewClassification, NewNote},
  store::FishStore,
  tribe::Tribe,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_note(fish_id: FishId, body: &str) -> NewNote {
  NewNote {
    fish_id,
    body: body.into(),
  }
}

fn new_audio(fish_id: FishId, path: &str) -> NewAudio {
  NewAudio {
    fish_id,
    path: path.into(),
    label: None,
  }
}

fn new_capture(fish_id: FishId) -> NewCaptureRecord {
  NewCaptureRecord {
    fish_id,
    location: Some("Iraraley bay".into()),
    method: Some("night torch".into()),
    captured_on: None,
  }
}

fn new_classification(
  fish_id: FishId,
  tribe: Tribe,
  food_category: &str,
) -> NewClassification {
  NewClassification {
    fish_id,
    tribe,
    food_category: food_category.into(),
    processing: None,
    notes: None,
  }
}

/// Populate a fish with `notes`/`audios`/`captures` children and one
/// classification per `(tribe, food_category)` pair.
async fn seed_children(
  s: &SqliteStore,
  fish_id: FishId,
  notes: usize,
  audios: usize,
  captures: usize,
  tribes: &[(Tribe, &str)],
) {
  for i in 0..notes {
    s.add_note(new_note(fish_id, &format!("note {i}"))).await.unwrap();
  }
  for i in 0..audios {
    s.add_audio(new_audio(fish_id, &format!("audio/{fish_id}/{i}.ogg")))
      .await
      .unwrap();
  }
  for _ in 0..captures {
    s.add_capture_record(new_capture(fish_id)).await.unwrap();
  }
  for &(tribe, food) in tribes {
    s.add_classification(new_classification(fish_id, tribe, food))
      .await
      .unwrap();
  }
}

// ─── Fish CRUD ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_fish() {
  let s = store().await;

  let fish = s.add_fish(NewFish::new("cilat")).await.unwrap();
  assert!(fish.fish_id > 0);
  assert!(!fish.is_deleted());

  let fetched = s.get_fish(fish.fish_id).await.unwrap().unwrap();
  assert_eq!(fetched.fish_id, fish.fish_id);
  assert_eq!(fetched.name, "cilat");
}

#[tokio::test]
async fn get_fish_missing_returns_none() {
  let s = store().await;
  assert!(s.get_fish(4242).await.unwrap().is_none());
}

#[tokio::test]
async fn deleted_fish_hidden_from_active_reads() {
  let s = store().await;
  let fish = s.add_fish(NewFish::new("arayo")).await.unwrap();

  s.delete_fish(fish.fish_id).await.unwrap();

  assert!(s.get_fish(fish.fish_id).await.unwrap().is_none());
  let tombstoned = s.get_fish_any(fish.fish_id).await.unwrap().unwrap();
  assert!(tombstoned.is_deleted());
}

#[tokio::test]
async fn list_fish_excludes_deleted() {
  let s = store().await;
  let keep = s.add_fish(NewFish::new("mavaheng so panid")).await.unwrap();
  let gone = s.add_fish(NewFish::new("kolitan")).await.unwrap();
  s.delete_fish(gone.fish_id).await.unwrap();

  let all = s.list_fish().await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].fish_id, keep.fish_id);
}

#[tokio::test]
async fn delete_fish_tombstones_children() {
  let s = store().await;
  let fish = s.add_fish(NewFish::new("ivey")).await.unwrap();
  seed_children(&s, fish.fish_id, 2, 1, 1, &[(Tribe::Yayo, "oyod")]).await;

  s.delete_fish(fish.fish_id).await.unwrap();

  assert!(s.notes_for(fish.fish_id).await.unwrap().is_empty());
  assert!(s.audios_for(fish.fish_id).await.unwrap().is_empty());
  assert!(s.capture_records_for(fish.fish_id).await.unwrap().is_empty());
  assert!(s.classifications_for(fish.fish_id).await.unwrap().is_empty());

  let any = s.classifications_for_any(fish.fish_id).await.unwrap();
  assert_eq!(any.len(), 1);
  assert!(any[0].deleted_at.is_some());
}

#[tokio::test]
async fn delete_missing_fish_errors() {
  let s = store().await;
  let err = s.delete_fish(999).await.unwrap_err();
  assert!(matches!(err, Error::FishNotFound(999)));
}

// ─── Child records ───────────────────────────────────────────────────────────

#[tokio::test]
async fn children_are_recorded_and_listed_in_order() {
  let s = store().await;
  let fish = s.add_fish(NewFish::new("among no rarakeh")).await.unwrap();

  let first = s.add_note(new_note(fish.fish_id, "spawns in spring")).await.unwrap();
  let second = s.add_note(new_note(fish.fish_id, "found near reef")).await.unwrap();

  let notes = s.notes_for(fish.fish_id).await.unwrap();
  assert_eq!(notes.len(), 2);
  assert_eq!(notes[0].note_id, first.note_id);
  assert_eq!(notes[1].note_id, second.note_id);
  assert_eq!(notes[0].body, "spawns in spring");
}

#[tokio::test]
async fn capture_record_round_trip() {
  let s = store().await;
  let fish = s.add_fish(NewFish::new("tazokok")).await.unwrap();

  let input = NewCaptureRecord {
    fish_id:     fish.fish_id,
    location:    Some("Imorod shore".into()),
    method:      Some("hand net".into()),
    captured_on: Some("2024-03-18".parse().unwrap()),
  };
  s.add_capture_record(input).await.unwrap();

  let records = s.capture_records_for(fish.fish_id).await.unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].location.as_deref(), Some("Imorod shore"));
  assert_eq!(
    records[0].captured_on,
    Some("2024-03-18".parse().unwrap())
  );
}

#[tokio::test]
async fn duplicate_active_classification_is_rejected() {
  let s = store().await;
  let fish = s.add_fish(NewFish::new("cilat")).await.unwrap();

  s.add_classification(new_classification(fish.fish_id, Tribe::Ivalino, "oyod"))
    .await
    .unwrap();

  let err = s
    .add_classification(new_classification(fish.fish_id, Tribe::Ivalino, "rahet"))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::DuplicateClassification { tribe: Tribe::Ivalino, .. }
  ));

  // A different tribe is fine.
  s.add_classification(new_classification(fish.fish_id, Tribe::Iratay, "rahet"))
    .await
    .unwrap();
}

#[tokio::test]
async fn load_fish_bundle_aggregates_children() {
  let s = store().await;
  let fish = s.add_fish(NewFish::new("vaoyo")).await.unwrap();
  seed_children(&s, fish.fish_id, 2, 1, 3, &[(Tribe::Imorod, "oyod")]).await;

  let bundle = s.load_fish_bundle(fish.fish_id).await.unwrap().unwrap();
  assert_eq!(bundle.fish.fish_id, fish.fish_id);
  assert_eq!(bundle.notes.len(), 2);
  assert_eq!(bundle.audios.len(), 1);
  assert_eq!(bundle.capture_records.len(), 3);
  assert_eq!(bundle.classifications.len(), 1);

  assert!(s.load_fish_bundle(9999).await.unwrap().is_none());
  s.delete_fish(fish.fish_id).await.unwrap();
  assert!(s.load_fish_bundle(fish.fish_id).await.unwrap().is_none());
}

// ─── Validation gate ─────────────────────────────────────────────────────────

#[tokio::test]
async fn validate_accepts_a_well_formed_merge() {
  let s = store().await;
  let target = s.add_fish(NewFish::new("cilat")).await.unwrap();
  let source = s.add_fish(NewFish::new("cilat (dup)")).await.unwrap();

  let v = merge::validate_merge(&s, target.fish_id, &[source.fish_id])
    .await
    .unwrap();
  assert!(v.valid);
  assert!(v.errors.is_empty());
}

#[tokio::test]
async fn validate_rejects_missing_target() {
  let s = store().await;
  let source = s.add_fish(NewFish::new("arayo")).await.unwrap();

  let v = merge::validate_merge(&s, 999, &[source.fish_id]).await.unwrap();
  assert!(!v.valid);
  assert_eq!(v.errors, vec!["target fish id does not exist".to_string()]);
}

#[tokio::test]
async fn validate_names_every_missing_source() {
  let s = store().await;
  let target = s.add_fish(NewFish::new("arayo")).await.unwrap();
  let source = s.add_fish(NewFish::new("arayo (dup)")).await.unwrap();

  let v = merge::validate_merge(&s, target.fish_id, &[source.fish_id, 777, 888])
    .await
    .unwrap();
  assert!(!v.valid);
  assert_eq!(v.errors.len(), 1);
  assert!(v.errors[0].contains("777, 888"), "errors: {:?}", v.errors);
}

#[tokio::test]
async fn validate_rejects_self_merge() {
  let s = store().await;
  let target = s.add_fish(NewFish::new("ivey")).await.unwrap();

  let v = merge::validate_merge(&s, target.fish_id, &[target.fish_id])
    .await
    .unwrap();
  assert!(!v.valid);
  assert_eq!(v.errors, vec!["cannot merge a fish into itself".to_string()]);
}

#[tokio::test]
async fn validate_rejects_empty_source_list() {
  let s = store().await;
  let target = s.add_fish(NewFish::new("ivey")).await.unwrap();

  let v = merge::validate_merge(&s, target.fish_id, &[]).await.unwrap();
  assert!(!v.valid);
  assert_eq!(
    v.errors,
    vec!["at least one source fish is required".to_string()]
  );
}

#[tokio::test]
async fn validate_collects_all_violations_at_once() {
  let s = store().await;

  // Target 999 does not exist, is merged into itself, and is also a missing
  // source — three independent violations, all reported.
  let v = merge::validate_merge(&s, 999, &[999]).await.unwrap();
  assert!(!v.valid);
  assert_eq!(v.errors.len(), 3);
}

#[tokio::test]
async fn validate_treats_tombstoned_fish_as_missing() {
  let s = store().await;
  let target = s.add_fish(NewFish::new("cilat")).await.unwrap();
  let source = s.add_fish(NewFish::new("cilat (dup)")).await.unwrap();
  s.delete_fish(source.fish_id).await.unwrap();

  let v = merge::validate_merge(&s, target.fish_id, &[source.fish_id])
    .await
    .unwrap();
  assert!(!v.valid);
  assert!(v.errors[0].contains(&source.fish_id.to_string()));
}

// ─── Merge execution ─────────────────────────────────────────────────────────

#[tokio::test]
async fn merge_without_conflicts_transfers_everything() {
  let s = store().await;
  let target = s.add_fish(NewFish::new("cilat")).await.unwrap();
  let source = s.add_fish(NewFish::new("cilat (import)")).await.unwrap();

  seed_children(
    &s,
    target.fish_id,
    3,
    2,
    5,
    &[(Tribe::Imorod, "oyod"), (Tribe::Yayo, "oyod")],
  )
  .await;
  seed_children(
    &s,
    source.fish_id,
    2,
    1,
    3,
    &[(Tribe::Iraraley, "oyod"), (Tribe::Ivalino, "rahet")],
  )
  .await;

  let result = merge::execute_merge(&s, target.fish_id, &[source.fish_id])
    .await
    .unwrap();

  assert_eq!(result.target_fish_id, target.fish_id);
  assert_eq!(result.merged_fish_ids, vec![source.fish_id]);
  assert_eq!(result.transferred.notes, 2);
  assert_eq!(result.transferred.audios, 1);
  assert_eq!(result.transferred.capture_records, 3);
  assert_eq!(result.transferred.tribal_classifications, 2);
  assert_eq!(result.conflicts_resolved.tribal_classifications, 0);

  assert_eq!(s.notes_for(target.fish_id).await.unwrap().len(), 5);
  assert_eq!(s.audios_for(target.fish_id).await.unwrap().len(), 3);
  assert_eq!(s.capture_records_for(target.fish_id).await.unwrap().len(), 8);

  let classifications = s.classifications_for(target.fish_id).await.unwrap();
  let tribes: Vec<Tribe> = classifications.iter().map(|c| c.tribe).collect();
  assert_eq!(classifications.len(), 4);
  for tribe in [Tribe::Imorod, Tribe::Yayo, Tribe::Iraraley, Tribe::Ivalino] {
    assert!(tribes.contains(&tribe), "missing {tribe}");
  }

  // The absorbed source is tombstoned, not gone.
  assert!(s.get_fish(source.fish_id).await.unwrap().is_none());
  assert!(
    s.get_fish_any(source.fish_id)
      .await
      .unwrap()
      .unwrap()
      .is_deleted()
  );
}

#[tokio::test]
async fn merge_conflict_keeps_target_row_untouched() {
  let s = store().await;
  let target = s.add_fish(NewFish::new("cilat")).await.unwrap();
  let source = s.add_fish(NewFish::new("cilat (field dup)")).await.unwrap();

  let target_row = s
    .add_classification(new_classification(target.fish_id, Tribe::Ivalino, "oyod"))
    .await
    .unwrap();
  let source_row = s
    .add_classification(new_classification(source.fish_id, Tribe::Ivalino, "rahet"))
    .await
    .unwrap();
  s.add_classification(new_classification(source.fish_id, Tribe::Iraraley, "oyod"))
    .await
    .unwrap();

  let result = merge::execute_merge(&s, target.fish_id, &[source.fish_id])
    .await
    .unwrap();

  assert_eq!(result.transferred.tribal_classifications, 1);
  assert_eq!(result.conflicts_resolved.tribal_classifications, 1);

  // The target's row survives with the same id and field values.
  let rows = s.classifications_for(target.fish_id).await.unwrap();
  assert_eq!(rows.len(), 2);
  let ivalino = rows.iter().find(|c| c.tribe == Tribe::Ivalino).unwrap();
  assert_eq!(ivalino.classification_id, target_row.classification_id);
  assert_eq!(ivalino.food_category, "oyod");

  // The source's conflicting row is tombstoned, never transferred.
  let source_rows = s.classifications_for_any(source.fish_id).await.unwrap();
  let lost = source_rows
    .iter()
    .find(|c| c.classification_id == source_row.classification_id)
    .unwrap();
  assert!(lost.deleted_at.is_some());
  assert_eq!(lost.fish_id, source.fish_id);
}

#[tokio::test]
async fn merge_absorbs_sources_in_call_order() {
  let s = store().await;
  let target = s.add_fish(NewFish::new("arayo")).await.unwrap();
  let first = s.add_fish(NewFish::new("arayo (a)")).await.unwrap();
  let second = s.add_fish(NewFish::new("arayo (b)")).await.unwrap();

  seed_children(&s, first.fish_id, 2, 0, 1, &[]).await;
  seed_children(&s, second.fish_id, 1, 2, 0, &[]).await;

  let result =
    merge::execute_merge(&s, target.fish_id, &[first.fish_id, second.fish_id])
      .await
      .unwrap();

  assert_eq!(result.merged_fish_ids, vec![first.fish_id, second.fish_id]);
  assert_eq!(result.transferred.notes, 3);
  assert_eq!(result.transferred.audios, 2);
  assert_eq!(result.transferred.capture_records, 1);

  for source in [first.fish_id, second.fish_id] {
    assert!(s.get_fish(source).await.unwrap().is_none());
  }
}

#[tokio::test]
async fn same_tribe_in_two_sources_conflicts_both_times() {
  let s = store().await;
  let target = s.add_fish(NewFish::new("ivey")).await.unwrap();
  let first = s.add_fish(NewFish::new("ivey (a)")).await.unwrap();
  let second = s.add_fish(NewFish::new("ivey (b)")).await.unwrap();

  let kept = s
    .add_classification(new_classification(target.fish_id, Tribe::Yayo, "oyod"))
    .await
    .unwrap();
  s.add_classification(new_classification(first.fish_id, Tribe::Yayo, "rahet"))
    .await
    .unwrap();
  s.add_classification(new_classification(second.fish_id, Tribe::Yayo, "rahet"))
    .await
    .unwrap();

  let result =
    merge::execute_merge(&s, target.fish_id, &[first.fish_id, second.fish_id])
      .await
      .unwrap();

  assert_eq!(result.conflicts_resolved.tribal_classifications, 2);
  assert_eq!(result.transferred.tribal_classifications, 0);

  let rows = s.classifications_for(target.fish_id).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].classification_id, kept.classification_id);
}

#[tokio::test]
async fn tribe_transferred_from_earlier_source_conflicts_with_later_source() {
  let s = store().await;
  let target = s.add_fish(NewFish::new("tazokok")).await.unwrap();
  let first = s.add_fish(NewFish::new("tazokok (a)")).await.unwrap();
  let second = s.add_fish(NewFish::new("tazokok (b)")).await.unwrap();

  s.add_classification(new_classification(first.fish_id, Tribe::Iranmeylek, "oyod"))
    .await
    .unwrap();
  s.add_classification(new_classification(second.fish_id, Tribe::Iranmeylek, "rahet"))
    .await
    .unwrap();

  let result =
    merge::execute_merge(&s, target.fish_id, &[first.fish_id, second.fish_id])
      .await
      .unwrap();

  // First source's row transfers; the second now collides with it.
  assert_eq!(result.transferred.tribal_classifications, 1);
  assert_eq!(result.conflicts_resolved.tribal_classifications, 1);

  let rows = s.classifications_for(target.fish_id).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].food_category, "oyod");
}

#[tokio::test]
async fn rejected_merge_leaves_the_store_untouched() {
  let s = store().await;
  let target = s.add_fish(NewFish::new("cilat")).await.unwrap();
  seed_children(&s, target.fish_id, 1, 1, 1, &[(Tribe::Imorod, "oyod")]).await;

  // Self-merge, missing source, empty list: all refused by the gate.
  for sources in [
    vec![target.fish_id],
    vec![4242],
    vec![],
  ] {
    let err = merge::execute_merge(&s, target.fish_id, &sources)
      .await
      .unwrap_err();
    assert!(matches!(err, MergeError::Rejected(_)));
  }

  assert!(s.get_fish(target.fish_id).await.unwrap().is_some());
  assert_eq!(s.notes_for(target.fish_id).await.unwrap().len(), 1);
  assert_eq!(s.audios_for(target.fish_id).await.unwrap().len(), 1);
  assert_eq!(s.capture_records_for(target.fish_id).await.unwrap().len(), 1);
  assert_eq!(s.classifications_for(target.fish_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn merge_rolls_back_fully_when_a_source_is_missing() {
  let s = store().await;
  let target = s.add_fish(NewFish::new("arayo")).await.unwrap();
  let first = s.add_fish(NewFish::new("arayo (a)")).await.unwrap();
  let third = s.add_fish(NewFish::new("arayo (c)")).await.unwrap();
  seed_children(&s, first.fish_id, 2, 1, 1, &[(Tribe::Iratay, "oyod")]).await;

  // Bypass the gate to force the failure mid-transaction: source #2 of 3
  // does not exist.
  let err = s
    .merge_fish(target.fish_id, &[first.fish_id, 9999, third.fish_id])
    .await
    .unwrap_err();
  assert!(matches!(err, MergeError::NotFound(9999)));

  // Source #1 was processed before the failure, but nothing stuck.
  assert!(s.get_fish(first.fish_id).await.unwrap().is_some());
  assert_eq!(s.notes_for(first.fish_id).await.unwrap().len(), 2);
  assert_eq!(s.audios_for(first.fish_id).await.unwrap().len(), 1);
  assert_eq!(s.capture_records_for(first.fish_id).await.unwrap().len(), 1);
  assert_eq!(s.classifications_for(first.fish_id).await.unwrap().len(), 1);

  assert!(s.notes_for(target.fish_id).await.unwrap().is_empty());
  assert!(s.classifications_for(target.fish_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn merge_with_missing_target_is_not_found() {
  let s = store().await;
  let source = s.add_fish(NewFish::new("kolitan")).await.unwrap();

  let err = s.merge_fish(9999, &[source.fish_id]).await.unwrap_err();
  assert!(matches!(err, MergeError::NotFound(9999)));
  assert!(s.get_fish(source.fish_id).await.unwrap().is_some());
}

#[tokio::test]
async fn rerunning_a_committed_merge_fails_validation() {
  let s = store().await;
  let target = s.add_fish(NewFish::new("ivey")).await.unwrap();
  let source = s.add_fish(NewFish::new("ivey (dup)")).await.unwrap();

  merge::execute_merge(&s, target.fish_id, &[source.fish_id])
    .await
    .unwrap();

  // The absorbed source is tombstoned, so a blind retry is refused.
  let err = merge::execute_merge(&s, target.fish_id, &[source.fish_id])
    .await
    .unwrap_err();
  let MergeError::Rejected(v) = err else {
    panic!("expected rejection");
  };
  assert!(v.errors[0].contains(&source.fish_id.to_string()));
}

// ─── Preview ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn preview_reports_conflicts_without_mutating() {
  let s = store().await;
  let target = s.add_fish(NewFish::new("cilat")).await.unwrap();
  let source = s.add_fish(NewFish::new("cilat (dup)")).await.unwrap();

  let kept = s
    .add_classification(new_classification(target.fish_id, Tribe::Ivalino, "oyod"))
    .await
    .unwrap();
  s.add_classification(new_classification(source.fish_id, Tribe::Ivalino, "rahet"))
    .await
    .unwrap();
  s.add_classification(new_classification(source.fish_id, Tribe::Iraraley, "oyod"))
    .await
    .unwrap();
  seed_children(&s, source.fish_id, 2, 1, 3, &[]).await;

  let preview = merge::preview_merge(&s, target.fish_id, &[source.fish_id])
    .await
    .unwrap();

  assert_eq!(preview.target.fish_id, target.fish_id);
  assert_eq!(preview.sources.len(), 1);
  assert_eq!(preview.summary.notes, 2);
  assert_eq!(preview.summary.audios, 1);
  assert_eq!(preview.summary.capture_records, 3);
  assert_eq!(preview.summary.tribal_classifications, 1);
  assert_eq!(preview.summary.classification_conflicts, 1);

  let conflict = &preview.sources[0].classification_conflicts[0];
  assert_eq!(conflict.tribe, Tribe::Ivalino);
  assert_eq!(conflict.source_fish_id, source.fish_id);
  assert_eq!(conflict.target_row.classification_id, kept.classification_id);
  assert_eq!(conflict.resolution, ConflictResolution::KeepTarget);

  assert_eq!(preview.conflicts.len(), 1);
  assert_eq!(preview.conflicts[0].kind, ConflictKind::TribalClassifications);
  assert!(preview.conflicts[0].description.contains("ivalino"));

  // Nothing moved: both fish still active, every row where it started.
  let source_bundle = s.load_fish_bundle(source.fish_id).await.unwrap().unwrap();
  assert_eq!(source_bundle.notes.len(), 2);
  assert_eq!(source_bundle.audios.len(), 1);
  assert_eq!(source_bundle.capture_records.len(), 3);
  assert_eq!(source_bundle.classifications.len(), 2);
  assert!(
    source_bundle
      .classifications
      .iter()
      .all(|c| c.fish_id == source.fish_id && c.deleted_at.is_none())
  );

  let target_rows = s.classifications_for(target.fish_id).await.unwrap();
  assert_eq!(target_rows.len(), 1);
  assert_eq!(target_rows[0].classification_id, kept.classification_id);
}

#[tokio::test]
async fn preview_counts_match_a_subsequent_execution() {
  let s = store().await;
  let target = s.add_fish(NewFish::new("arayo")).await.unwrap();
  let first = s.add_fish(NewFish::new("arayo (a)")).await.unwrap();
  let second = s.add_fish(NewFish::new("arayo (b)")).await.unwrap();

  seed_children(
    &s,
    target.fish_id,
    1,
    0,
    2,
    &[(Tribe::Imorod, "oyod")],
  )
  .await;
  seed_children(
    &s,
    first.fish_id,
    2,
    2,
    1,
    &[(Tribe::Imorod, "rahet"), (Tribe::Yayo, "oyod")],
  )
  .await;
  seed_children(
    &s,
    second.fish_id,
    0,
    1,
    4,
    // Yayo arrives via the first source, so this one conflicts too.
    &[(Tribe::Yayo, "rahet"), (Tribe::Ivalino, "oyod")],
  )
  .await;

  let sources = [first.fish_id, second.fish_id];
  let preview = merge::preview_merge(&s, target.fish_id, &sources)
    .await
    .unwrap();
  let result = merge::execute_merge(&s, target.fish_id, &sources)
    .await
    .unwrap();

  assert_eq!(preview.summary.notes, result.transferred.notes);
  assert_eq!(preview.summary.audios, result.transferred.audios);
  assert_eq!(
    preview.summary.capture_records,
    result.transferred.capture_records
  );
  assert_eq!(
    preview.summary.tribal_classifications,
    result.transferred.tribal_classifications
  );
  assert_eq!(
    preview.summary.classification_conflicts,
    result.conflicts_resolved.tribal_classifications
  );
}

#[tokio::test]
async fn preview_is_rejected_by_the_same_gate_as_execution() {
  let s = store().await;
  let target = s.add_fish(NewFish::new("ivey")).await.unwrap();

  let err = merge::preview_merge(&s, target.fish_id, &[target.fish_id])
    .await
    .unwrap_err();
  let MergeError::Rejected(v) = err else {
    panic!("expected rejection");
  };
  assert_eq!(v.errors, vec!["cannot merge a fish into itself".to_string()]);
}
