//! SQL schema for the Among SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Every table carries a `deleted_at` tombstone column; NULL means active.
/// No row is ever physically deleted by the store.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS fish (
    fish_id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name               TEXT NOT NULL,
    image_path         TEXT,
    primary_audio_path TEXT,
    created_at         TEXT NOT NULL,   -- ISO 8601 UTC; server-assigned
    deleted_at         TEXT
);

CREATE TABLE IF NOT EXISTS notes (
    note_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    fish_id    INTEGER NOT NULL REFERENCES fish(fish_id),
    body       TEXT NOT NULL,
    created_at TEXT NOT NULL,
    deleted_at TEXT
);

CREATE TABLE IF NOT EXISTS audios (
    audio_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    fish_id    INTEGER NOT NULL REFERENCES fish(fish_id),
    path       TEXT NOT NULL,
    label      TEXT,
    created_at TEXT NOT NULL,
    deleted_at TEXT
);

CREATE TABLE IF NOT EXISTS capture_records (
    capture_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    fish_id     INTEGER NOT NULL REFERENCES fish(fish_id),
    location    TEXT,
    method      TEXT,
    captured_on TEXT,                   -- calendar date, no time component
    created_at  TEXT NOT NULL,
    deleted_at  TEXT
);

CREATE TABLE IF NOT EXISTS tribal_classifications (
    classification_id INTEGER PRIMARY KEY AUTOINCREMENT,
    fish_id           INTEGER NOT NULL REFERENCES fish(fish_id),
    tribe             TEXT NOT NULL,    -- lowercase village code
    food_category     TEXT NOT NULL,
    processing        TEXT,
    notes             TEXT,
    created_at        TEXT NOT NULL,
    deleted_at        TEXT
);

-- Backstop for the application-level invariant: at most one active
-- classification per (fish, tribe). The store checks before inserting and
-- the merge engine resolves collisions before repointing rows.
CREATE UNIQUE INDEX IF NOT EXISTS classifications_fish_tribe_active_idx
    ON tribal_classifications(fish_id, tribe) WHERE deleted_at IS NULL;

CREATE INDEX IF NOT EXISTS notes_fish_idx           ON notes(fish_id);
CREATE INDEX IF NOT EXISTS audios_fish_idx          ON audios(fish_id);
CREATE INDEX IF NOT EXISTS capture_records_fish_idx ON capture_records(fish_id);
CREATE INDEX IF NOT EXISTS classifications_fish_idx ON tribal_classifications(fish_id);

PRAGMA user_version = 1;
";
