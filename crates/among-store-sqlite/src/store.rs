//! [`SqliteStore`] — the SQLite implementation of [`FishStore`].

use std::{collections::BTreeSet, path::Path};

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use among_core::{
  fish::{Fish, FishId, NewFish},
  merge::{self, ConflictCounts, MergeError, MergeResult, Resolution, TransferCounts},
  record::{
    Audio, CaptureRecord, FishBundle, NewAudio, NewCaptureRecord,
    NewClassification, NewNote, Note, TribalClassification,
  },
  store::FishStore,
  tribe::Tribe,
};

use crate::{
  encode::{
    RawAudio, RawBundle, RawCaptureRecord, RawClassification, RawFish, RawNote,
    encode_date, encode_dt, encode_tribe,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Row readers ─────────────────────────────────────────────────────────────

const FISH_COLUMNS: &str =
  "fish_id, name, image_path, primary_audio_path, created_at, deleted_at";

fn read_fish_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawFish> {
  Ok(RawFish {
    fish_id:            row.get(0)?,
    name:               row.get(1)?,
    image_path:         row.get(2)?,
    primary_audio_path: row.get(3)?,
    created_at:         row.get(4)?,
    deleted_at:         row.get(5)?,
  })
}

fn read_note_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawNote> {
  Ok(RawNote {
    note_id:    row.get(0)?,
    fish_id:    row.get(1)?,
    body:       row.get(2)?,
    created_at: row.get(3)?,
    deleted_at: row.get(4)?,
  })
}

fn read_audio_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawAudio> {
  Ok(RawAudio {
    audio_id:   row.get(0)?,
    fish_id:    row.get(1)?,
    path:       row.get(2)?,
    label:      row.get(3)?,
    created_at: row.get(4)?,
    deleted_at: row.get(5)?,
  })
}

fn read_capture_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawCaptureRecord> {
  Ok(RawCaptureRecord {
    capture_id:  row.get(0)?,
    fish_id:     row.get(1)?,
    location:    row.get(2)?,
    method:      row.get(3)?,
    captured_on: row.get(4)?,
    created_at:  row.get(5)?,
    deleted_at:  row.get(6)?,
  })
}

fn read_classification_row(
  row: &rusqlite::Row<'_>,
) -> rusqlite::Result<RawClassification> {
  Ok(RawClassification {
    classification_id: row.get(0)?,
    fish_id:           row.get(1)?,
    tribe:             row.get(2)?,
    food_category:     row.get(3)?,
    processing:        row.get(4)?,
    notes:             row.get(5)?,
    created_at:        row.get(6)?,
    deleted_at:        row.get(7)?,
  })
}

// ─── In-transaction helpers ──────────────────────────────────────────────────

fn fish_is_active(
  conn: &rusqlite::Connection,
  id: FishId,
) -> rusqlite::Result<bool> {
  conn
    .query_row(
      "SELECT 1 FROM fish WHERE fish_id = ?1 AND deleted_at IS NULL",
      rusqlite::params![id],
      |_| Ok(true),
    )
    .optional()
    .map(|found| found.unwrap_or(false))
}

/// The set of tribes with an active classification on `fish_id`.
fn claimed_tribes(
  conn: &rusqlite::Connection,
  fish_id: FishId,
) -> std::result::Result<BTreeSet<Tribe>, tokio_rusqlite::Error> {
  let mut stmt = conn.prepare(
    "SELECT tribe FROM tribal_classifications
     WHERE fish_id = ?1 AND deleted_at IS NULL",
  )?;
  let codes = stmt
    .query_map(rusqlite::params![fish_id], |row| row.get::<_, String>(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  codes
    .iter()
    .map(|code| {
      code
        .parse::<Tribe>()
        .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))
    })
    .collect()
}

/// Active classification rows of `fish_id` as `(classification_id, tribe)`,
/// ordered by id.
fn active_classification_ids(
  conn: &rusqlite::Connection,
  fish_id: FishId,
) -> std::result::Result<Vec<(i64, Tribe)>, tokio_rusqlite::Error> {
  let mut stmt = conn.prepare(
    "SELECT classification_id, tribe FROM tribal_classifications
     WHERE fish_id = ?1 AND deleted_at IS NULL
     ORDER BY classification_id",
  )?;
  let rows = stmt
    .query_map(rusqlite::params![fish_id], |row| {
      Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  rows
    .into_iter()
    .map(|(id, code)| {
      code
        .parse::<Tribe>()
        .map(|tribe| (id, tribe))
        .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))
    })
    .collect()
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Among fish store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn fetch_fish(
    &self,
    id: FishId,
    include_deleted: bool,
  ) -> Result<Option<Fish>> {
    let raw: Option<RawFish> = self
      .conn
      .call(move |conn| {
        let sql = if include_deleted {
          format!("SELECT {FISH_COLUMNS} FROM fish WHERE fish_id = ?1")
        } else {
          format!(
            "SELECT {FISH_COLUMNS} FROM fish
             WHERE fish_id = ?1 AND deleted_at IS NULL"
          )
        };
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id], read_fish_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawFish::into_fish).transpose()
  }

  async fn fetch_classifications(
    &self,
    fish_id: FishId,
    include_deleted: bool,
  ) -> Result<Vec<TribalClassification>> {
    let raws: Vec<RawClassification> = self
      .conn
      .call(move |conn| {
        let sql = if include_deleted {
          "SELECT classification_id, fish_id, tribe, food_category,
                  processing, notes, created_at, deleted_at
           FROM tribal_classifications
           WHERE fish_id = ?1
           ORDER BY classification_id"
        } else {
          "SELECT classification_id, fish_id, tribe, food_category,
                  processing, notes, created_at, deleted_at
           FROM tribal_classifications
           WHERE fish_id = ?1 AND deleted_at IS NULL
           ORDER BY classification_id"
        };
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
          .query_map(rusqlite::params![fish_id], read_classification_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawClassification::into_classification)
      .collect()
  }
}

// ─── FishStore impl ──────────────────────────────────────────────────────────

impl FishStore for SqliteStore {
  type Error = Error;

  // ── Fish ──────────────────────────────────────────────────────────────────

  async fn add_fish(&self, input: NewFish) -> Result<Fish> {
    let created_at = Utc::now();
    let at_str = encode_dt(created_at);

    let name = input.name.clone();
    let image_path = input.image_path.clone();
    let primary_audio_path = input.primary_audio_path.clone();

    let fish_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO fish (name, image_path, primary_audio_path, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![name, image_path, primary_audio_path, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Fish {
      fish_id,
      name: input.name,
      image_path: input.image_path,
      primary_audio_path: input.primary_audio_path,
      created_at,
      deleted_at: None,
    })
  }

  async fn get_fish(&self, id: FishId) -> Result<Option<Fish>> {
    self.fetch_fish(id, false).await
  }

  async fn get_fish_any(&self, id: FishId) -> Result<Option<Fish>> {
    self.fetch_fish(id, true).await
  }

  async fn list_fish(&self) -> Result<Vec<Fish>> {
    let raws: Vec<RawFish> = self
      .conn
      .call(|conn| {
        let sql = format!(
          "SELECT {FISH_COLUMNS} FROM fish
           WHERE deleted_at IS NULL ORDER BY fish_id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], read_fish_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFish::into_fish).collect()
  }

  async fn delete_fish(&self, id: FishId) -> Result<()> {
    let at_str = encode_dt(Utc::now());

    let affected = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let affected = tx.execute(
          "UPDATE fish SET deleted_at = ?1
           WHERE fish_id = ?2 AND deleted_at IS NULL",
          rusqlite::params![at_str, id],
        )?;
        if affected > 0 {
          for table in [
            "notes",
            "audios",
            "capture_records",
            "tribal_classifications",
          ] {
            tx.execute(
              &format!(
                "UPDATE {table} SET deleted_at = ?1
                 WHERE fish_id = ?2 AND deleted_at IS NULL"
              ),
              rusqlite::params![at_str, id],
            )?;
          }
        }
        tx.commit()?;
        Ok(affected)
      })
      .await?;

    if affected == 0 {
      return Err(Error::FishNotFound(id));
    }
    Ok(())
  }

  // ── Child records ─────────────────────────────────────────────────────────

  async fn add_note(&self, input: NewNote) -> Result<Note> {
    let created_at = Utc::now();
    let at_str = encode_dt(created_at);
    let fish_id = input.fish_id;
    let body = input.body.clone();

    let note_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO notes (fish_id, body, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![fish_id, body, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Note {
      note_id,
      fish_id,
      body: input.body,
      created_at,
      deleted_at: None,
    })
  }

  async fn add_audio(&self, input: NewAudio) -> Result<Audio> {
    let created_at = Utc::now();
    let at_str = encode_dt(created_at);
    let fish_id = input.fish_id;
    let path = input.path.clone();
    let label = input.label.clone();

    let audio_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO audios (fish_id, path, label, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![fish_id, path, label, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Audio {
      audio_id,
      fish_id,
      path: input.path,
      label: input.label,
      created_at,
      deleted_at: None,
    })
  }

  async fn add_capture_record(
    &self,
    input: NewCaptureRecord,
  ) -> Result<CaptureRecord> {
    let created_at = Utc::now();
    let at_str = encode_dt(created_at);
    let fish_id = input.fish_id;
    let location = input.location.clone();
    let method = input.method.clone();
    let captured_on = input.captured_on.map(encode_date);

    let capture_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO capture_records
             (fish_id, location, method, captured_on, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![fish_id, location, method, captured_on, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(CaptureRecord {
      capture_id,
      fish_id,
      location: input.location,
      method: input.method,
      captured_on: input.captured_on,
      created_at,
      deleted_at: None,
    })
  }

  async fn add_classification(
    &self,
    input: NewClassification,
  ) -> Result<TribalClassification> {
    let created_at = Utc::now();
    let at_str = encode_dt(created_at);
    let fish_id = input.fish_id;
    let tribe = input.tribe;
    let tribe_str = encode_tribe(tribe);
    let food_category = input.food_category.clone();
    let processing = input.processing.clone();
    let notes = input.notes.clone();

    let inserted: Option<i64> = self
      .conn
      .call(move |conn| {
        let taken: bool = conn
          .query_row(
            "SELECT 1 FROM tribal_classifications
             WHERE fish_id = ?1 AND tribe = ?2 AND deleted_at IS NULL",
            rusqlite::params![fish_id, tribe_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(None);
        }

        conn.execute(
          "INSERT INTO tribal_classifications
             (fish_id, tribe, food_category, processing, notes, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            fish_id,
            tribe_str,
            food_category,
            processing,
            notes,
            at_str,
          ],
        )?;
        Ok(Some(conn.last_insert_rowid()))
      })
      .await?;

    let classification_id =
      inserted.ok_or(Error::DuplicateClassification { fish_id, tribe })?;

    Ok(TribalClassification {
      classification_id,
      fish_id,
      tribe,
      food_category: input.food_category,
      processing: input.processing,
      notes: input.notes,
      created_at,
      deleted_at: None,
    })
  }

  async fn notes_for(&self, fish_id: FishId) -> Result<Vec<Note>> {
    let raws: Vec<RawNote> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT note_id, fish_id, body, created_at, deleted_at
           FROM notes WHERE fish_id = ?1 AND deleted_at IS NULL
           ORDER BY note_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![fish_id], read_note_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNote::into_note).collect()
  }

  async fn audios_for(&self, fish_id: FishId) -> Result<Vec<Audio>> {
    let raws: Vec<RawAudio> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT audio_id, fish_id, path, label, created_at, deleted_at
           FROM audios WHERE fish_id = ?1 AND deleted_at IS NULL
           ORDER BY audio_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![fish_id], read_audio_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAudio::into_audio).collect()
  }

  async fn capture_records_for(
    &self,
    fish_id: FishId,
  ) -> Result<Vec<CaptureRecord>> {
    let raws: Vec<RawCaptureRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT capture_id, fish_id, location, method, captured_on,
                  created_at, deleted_at
           FROM capture_records WHERE fish_id = ?1 AND deleted_at IS NULL
           ORDER BY capture_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![fish_id], read_capture_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawCaptureRecord::into_capture_record)
      .collect()
  }

  async fn classifications_for(
    &self,
    fish_id: FishId,
  ) -> Result<Vec<TribalClassification>> {
    self.fetch_classifications(fish_id, false).await
  }

  async fn classifications_for_any(
    &self,
    fish_id: FishId,
  ) -> Result<Vec<TribalClassification>> {
    self.fetch_classifications(fish_id, true).await
  }

  // ── Aggregate reads ───────────────────────────────────────────────────────

  async fn load_fish_bundle(&self, id: FishId) -> Result<Option<FishBundle>> {
    let raw: Option<RawBundle> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {FISH_COLUMNS} FROM fish
           WHERE fish_id = ?1 AND deleted_at IS NULL"
        );
        let fish = conn
          .query_row(&sql, rusqlite::params![id], read_fish_row)
          .optional()?;
        let Some(fish) = fish else {
          return Ok(None);
        };

        let mut stmt = conn.prepare(
          "SELECT note_id, fish_id, body, created_at, deleted_at
           FROM notes WHERE fish_id = ?1 AND deleted_at IS NULL
           ORDER BY note_id",
        )?;
        let notes = stmt
          .query_map(rusqlite::params![id], read_note_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
          "SELECT audio_id, fish_id, path, label, created_at, deleted_at
           FROM audios WHERE fish_id = ?1 AND deleted_at IS NULL
           ORDER BY audio_id",
        )?;
        let audios = stmt
          .query_map(rusqlite::params![id], read_audio_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
          "SELECT capture_id, fish_id, location, method, captured_on,
                  created_at, deleted_at
           FROM capture_records WHERE fish_id = ?1 AND deleted_at IS NULL
           ORDER BY capture_id",
        )?;
        let capture_records = stmt
          .query_map(rusqlite::params![id], read_capture_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
          "SELECT classification_id, fish_id, tribe, food_category,
                  processing, notes, created_at, deleted_at
           FROM tribal_classifications
           WHERE fish_id = ?1 AND deleted_at IS NULL
           ORDER BY classification_id",
        )?;
        let classifications = stmt
          .query_map(rusqlite::params![id], read_classification_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(RawBundle {
          fish,
          notes,
          audios,
          capture_records,
          classifications,
        }))
      })
      .await?;

    raw.map(RawBundle::into_bundle).transpose()
  }

  // ── Merge execution ───────────────────────────────────────────────────────

  /// The whole merge runs inside one transaction. Returning early — for a
  /// vanished fish or on any database error — drops the transaction without
  /// commit, which rolls back every change made for every source.
  async fn merge_fish(
    &self,
    target_id: FishId,
    source_ids: &[FishId],
  ) -> std::result::Result<MergeResult, MergeError<Error>> {
    let sources = source_ids.to_vec();

    let outcome: std::result::Result<MergeResult, FishId> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let now_str = encode_dt(Utc::now());

        if !fish_is_active(&tx, target_id)? {
          return Ok(Err(target_id));
        }

        let mut transferred = TransferCounts::default();
        let mut conflicts_resolved = ConflictCounts::default();
        let mut merged_fish_ids = Vec::with_capacity(sources.len());
        let mut resolved_log: Vec<(Tribe, FishId)> = Vec::new();

        for &source_id in &sources {
          if !fish_is_active(&tx, source_id)? {
            return Ok(Err(source_id));
          }

          transferred.notes += tx.execute(
            "UPDATE notes SET fish_id = ?1
             WHERE fish_id = ?2 AND deleted_at IS NULL",
            rusqlite::params![target_id, source_id],
          )?;
          transferred.audios += tx.execute(
            "UPDATE audios SET fish_id = ?1
             WHERE fish_id = ?2 AND deleted_at IS NULL",
            rusqlite::params![target_id, source_id],
          )?;
          transferred.capture_records += tx.execute(
            "UPDATE capture_records SET fish_id = ?1
             WHERE fish_id = ?2 AND deleted_at IS NULL",
            rusqlite::params![target_id, source_id],
          )?;

          // Fresh read per source: tribes transferred from earlier sources
          // in this same call count as claimed by the target.
          let claimed = claimed_tribes(&tx, target_id)?;
          for (classification_id, tribe) in
            active_classification_ids(&tx, source_id)?
          {
            match merge::resolve(&claimed, tribe) {
              Resolution::Conflict => {
                tx.execute(
                  "UPDATE tribal_classifications SET deleted_at = ?1
                   WHERE classification_id = ?2",
                  rusqlite::params![now_str, classification_id],
                )?;
                conflicts_resolved.tribal_classifications += 1;
                resolved_log.push((tribe, source_id));
              }
              Resolution::Transferable => {
                tx.execute(
                  "UPDATE tribal_classifications SET fish_id = ?1
                   WHERE classification_id = ?2",
                  rusqlite::params![target_id, classification_id],
                )?;
                transferred.tribal_classifications += 1;
              }
            }
          }

          tx.execute(
            "UPDATE fish SET deleted_at = ?1 WHERE fish_id = ?2",
            rusqlite::params![now_str, source_id],
          )?;
          merged_fish_ids.push(source_id);
        }

        tx.commit()?;

        // Only durable resolutions are reported.
        for (tribe, source_id) in resolved_log {
          tracing::info!(
            target_fish_id = target_id,
            source_fish_id = source_id,
            tribe = %tribe,
            "classification conflict resolved, target row kept"
          );
        }

        Ok(Ok(MergeResult {
          target_fish_id: target_id,
          merged_fish_ids,
          transferred,
          conflicts_resolved,
        }))
      })
      .await
      .map_err(|e| MergeError::Store(Error::Database(e)))?;

    outcome.map_err(MergeError::NotFound)
  }
}
