use std::path::Path;

use rusqlite::{params, Connection};

use crate::db::{DbError, DbResult, RunRecord, SearchStrategy, StoredFingerprint};
use crate::model::MethodId;

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// SQLite-backed history of fingerprint runs.
///
/// This is a thin wrapper around `rusqlite::Connection` that is responsible for:
/// - Opening/creating the DB file.
/// - Applying schema migrations.
/// - Storing runs together with their ranked fingerprints.
#[derive(Debug)]
pub struct FingerprintDb {
    conn: Connection,
}

impl FingerprintDb {
    /// Open (or create) a run database at the given path and ensure the schema exists.
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// In-memory database, mostly for tests.
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Insert a run and its fingerprints; returns the run's row id.
    pub fn insert_run(&self, record: &RunRecord) -> DbResult<i64> {
        let tx = self.conn.unchecked_transaction()?;
        let settings_json = serde_json::to_string(&record.settings)?;

        tx.execute(
            r#"
            INSERT INTO runs (target, corpus_hash, settings, strategy, complete, started_at, finished_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.target.as_str(),
                record.corpus_hash,
                settings_json,
                record.strategy.as_str(),
                if record.complete { 1 } else { 0 },
                record.started_at,
                record.finished_at
            ],
        )?;
        let run_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO fingerprints (run_id, rank, features, pattern)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )?;
            for fingerprint in &record.fingerprints {
                let features_json = serde_json::to_string(&fingerprint.features)?;
                stmt.execute(params![
                    run_id,
                    fingerprint.rank as i64,
                    features_json,
                    fingerprint.pattern
                ])?;
            }
        }

        tx.commit()?;
        Ok(run_id)
    }

    /// List runs (oldest first), optionally filtered by target method.
    pub fn list_runs(&self, target: Option<&MethodId>) -> DbResult<Vec<RunRecord>> {
        struct RunRow {
            id: i64,
            target: String,
            corpus_hash: Option<String>,
            settings: String,
            strategy: String,
            complete: bool,
            started_at: String,
            finished_at: String,
        }

        fn map_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRow> {
            Ok(RunRow {
                id: row.get(0)?,
                target: row.get(1)?,
                corpus_hash: row.get(2)?,
                settings: row.get(3)?,
                strategy: row.get(4)?,
                complete: row.get::<_, i64>(5)? != 0,
                started_at: row.get(6)?,
                finished_at: row.get(7)?,
            })
        }

        let mut stmt = if target.is_some() {
            self.conn.prepare(
                r#"
                SELECT id, target, corpus_hash, settings, strategy, complete, started_at, finished_at
                FROM runs
                WHERE target = ?1
                ORDER BY id
                "#,
            )?
        } else {
            self.conn.prepare(
                r#"
                SELECT id, target, corpus_hash, settings, strategy, complete, started_at, finished_at
                FROM runs
                ORDER BY id
                "#,
            )?
        };

        let rows = if let Some(target) = target {
            stmt.query_map(params![target.as_str()], map_run)?
        } else {
            stmt.query_map([], map_run)?
        };

        let mut raw = Vec::new();
        for row in rows {
            raw.push(row?);
        }

        let mut out = Vec::with_capacity(raw.len());
        for run in raw {
            out.push(RunRecord {
                target: MethodId::new(run.target),
                corpus_hash: run.corpus_hash,
                settings: serde_json::from_str(&run.settings)?,
                strategy: SearchStrategy::from_stored(&run.strategy),
                complete: run.complete,
                started_at: run.started_at,
                finished_at: run.finished_at,
                fingerprints: self.load_fingerprints(run.id)?,
            });
        }
        Ok(out)
    }

    fn load_fingerprints(&self, run_id: i64) -> DbResult<Vec<StoredFingerprint>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT rank, features, pattern
            FROM fingerprints
            WHERE run_id = ?1
            ORDER BY rank
            "#,
        )?;
        let rows = stmt.query_map(params![run_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (rank, features_json, pattern) = row?;
            out.push(StoredFingerprint {
                rank: rank as usize,
                features: serde_json::from_str(&features_json)?,
                pattern,
            });
        }
        Ok(out)
    }
}

/// Apply schema migrations to bring the database to the latest version.
///
/// We use `PRAGMA user_version` as the schema version indicator.
///
/// Version map:
/// - 0: no schema
/// - 1: runs + fingerprints
fn apply_migrations(conn: &Connection) -> DbResult<()> {
    let current_version = current_schema_version(conn)?;

    // Reject DBs created with a newer schema than we support.
    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version < 1 {
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS runs (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                target      TEXT NOT NULL,
                corpus_hash TEXT,
                settings    TEXT NOT NULL,
                strategy    TEXT NOT NULL,
                complete    INTEGER NOT NULL,
                started_at  TEXT NOT NULL,
                finished_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS runs_target ON runs (target);

            CREATE TABLE IF NOT EXISTS fingerprints (
                id       INTEGER PRIMARY KEY AUTOINCREMENT,
                run_id   INTEGER NOT NULL REFERENCES runs (id) ON DELETE CASCADE,
                rank     INTEGER NOT NULL,
                features TEXT NOT NULL,
                pattern  TEXT NOT NULL
            );

            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}

/// Read the SQLite schema version from `PRAGMA user_version`.
fn current_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}
