//! SQLite-based alarm storage.
//!
//! Provides persistent storage for:
//! - Alarm definitions (one row per alarm)
//! - Key-value store for application state (pending notifications,
//!   countdown and stopwatch state)

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::data_dir;
use crate::alarm::{AlarmId, AlarmSpec, RepeatDays};
use crate::error::{CoreError, DatabaseError};

/// SQLite database for alarm storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/mathalarm/mathalarm.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("mathalarm.db");
        Ok(Self::open_at(&path)?)
    }

    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS alarms (
                id          TEXT PRIMARY KEY,
                label       TEXT NOT NULL DEFAULT '',
                hour        INTEGER NOT NULL,
                minute      INTEGER NOT NULL,
                repeat_days TEXT NOT NULL DEFAULT '0000000',
                enabled     INTEGER NOT NULL DEFAULT 1,
                created_at  TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
    }

    // ── Alarms ───────────────────────────────────────────────────────

    /// Insert or update an alarm.
    pub fn save_alarm(&self, alarm: &AlarmSpec) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO alarms
                (id, label, hour, minute, repeat_days, enabled, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                alarm.id().to_string(),
                alarm.label(),
                alarm.hour(),
                alarm.minute(),
                alarm.repeat_days().to_mask(),
                alarm.is_enabled(),
                alarm.created_at().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Returns `true` if a row was deleted.
    pub fn delete_alarm(&self, id: AlarmId) -> Result<bool, DatabaseError> {
        let n = self
            .conn
            .execute("DELETE FROM alarms WHERE id = ?1", params![id.to_string()])?;
        Ok(n > 0)
    }

    /// All alarms, oldest first.
    pub fn load_alarms(&self) -> Result<Vec<AlarmSpec>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, label, hour, minute, repeat_days, enabled, created_at
             FROM alarms ORDER BY created_at, id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, bool>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut alarms = Vec::new();
        for row in rows {
            let (id, label, hour, minute, mask, enabled, created_at) = row?;
            alarms.push(decode_alarm(
                &id,
                label,
                hour,
                minute,
                &mask,
                enabled,
                &created_at,
            )?);
        }
        Ok(alarms)
    }

    /// Replace the whole alarm table in one transaction.
    pub fn replace_alarms(&mut self, alarms: &[AlarmSpec]) -> Result<(), DatabaseError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM alarms", [])?;
        for alarm in alarms {
            tx.execute(
                "INSERT INTO alarms
                    (id, label, hour, minute, repeat_days, enabled, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    alarm.id().to_string(),
                    alarm.label(),
                    alarm.hour(),
                    alarm.minute(),
                    alarm.repeat_days().to_mask(),
                    alarm.is_enabled(),
                    alarm.created_at().to_rfc3339(),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // ── Key-value ────────────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DatabaseError> {
        match self.kv_get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| DatabaseError::CorruptRow {
                    table: "kv".into(),
                    message: format!("{key}: {e}"),
                }),
            None => Ok(None),
        }
    }

    pub fn kv_set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), DatabaseError> {
        let raw = serde_json::to_string(value)
            .map_err(|e| DatabaseError::QueryFailed(format!("{key}: {e}")))?;
        self.kv_set(key, &raw)
    }
}

fn decode_alarm(
    id: &str,
    label: String,
    hour: u32,
    minute: u32,
    mask: &str,
    enabled: bool,
    created_at: &str,
) -> Result<AlarmSpec, DatabaseError> {
    let corrupt = |message: String| DatabaseError::CorruptRow {
        table: "alarms".into(),
        message,
    };
    let id: AlarmId = id.parse().map_err(|e| corrupt(format!("id '{id}': {e}")))?;
    let repeat_days =
        RepeatDays::from_mask(mask).ok_or_else(|| corrupt(format!("repeat mask '{mask}'")))?;
    let created_at = DateTime::parse_from_rfc3339(created_at)
        .map_err(|e| corrupt(format!("created_at '{created_at}': {e}")))?
        .with_timezone(&Utc);
    AlarmSpec::restore(id, label, hour, minute, repeat_days, enabled, created_at)
        .map_err(|e| corrupt(format!("alarm {id}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weekday_alarm() -> AlarmSpec {
        AlarmSpec::new(6, 45)
            .unwrap()
            .with_label("Gym")
            .with_repeat_days(RepeatDays::WEEKDAYS)
    }

    #[test]
    fn save_and_load_alarm() {
        let db = Database::open_memory().unwrap();
        let alarm = weekday_alarm();
        db.save_alarm(&alarm).unwrap();

        let loaded = db.load_alarms().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id(), alarm.id());
        assert_eq!(loaded[0].label(), "Gym");
        assert_eq!(loaded[0].repeat_days(), RepeatDays::WEEKDAYS);
        assert_eq!(loaded[0].hour(), 6);
        assert_eq!(loaded[0].minute(), 45);
    }

    #[test]
    fn save_alarm_upserts() {
        let db = Database::open_memory().unwrap();
        let mut alarm = weekday_alarm();
        db.save_alarm(&alarm).unwrap();
        alarm.set_enabled(false);
        db.save_alarm(&alarm).unwrap();

        let loaded = db.load_alarms().unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(!loaded[0].is_enabled());
    }

    #[test]
    fn delete_alarm_reports_missing() {
        let db = Database::open_memory().unwrap();
        let alarm = weekday_alarm();
        db.save_alarm(&alarm).unwrap();
        assert!(db.delete_alarm(alarm.id()).unwrap());
        assert!(!db.delete_alarm(alarm.id()).unwrap());
        assert!(db.load_alarms().unwrap().is_empty());
    }

    #[test]
    fn replace_alarms_drops_stale_rows() {
        let mut db = Database::open_memory().unwrap();
        db.save_alarm(&weekday_alarm()).unwrap();
        let fresh = AlarmSpec::new(22, 0).unwrap();
        db.replace_alarms(std::slice::from_ref(&fresh)).unwrap();

        let loaded = db.load_alarms().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id(), fresh.id());
    }

    #[test]
    fn corrupt_row_is_reported() {
        let db = Database::open_memory().unwrap();
        db.conn()
            .execute(
                "INSERT INTO alarms (id, hour, minute, repeat_days, enabled, created_at)
                 VALUES ('not-a-uuid', 7, 0, '0000000', 1, '2026-10-19T00:00:00Z')",
                [],
            )
            .unwrap();
        assert!(matches!(
            db.load_alarms(),
            Err(DatabaseError::CorruptRow { .. })
        ));
    }

    #[test]
    fn out_of_range_time_is_corrupt() {
        let db = Database::open_memory().unwrap();
        db.conn()
            .execute(
                "INSERT INTO alarms (id, hour, minute, repeat_days, enabled, created_at)
                 VALUES (?1, 25, 0, '0000000', 1, '2026-10-19T00:00:00Z')",
                params![AlarmId::new().to_string()],
            )
            .unwrap();
        assert!(db.load_alarms().is_err());
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
    }

    #[test]
    fn kv_json_roundtrip_and_corruption() {
        let db = Database::open_memory().unwrap();
        db.kv_set_json("laps", &vec![1_u64, 2, 3]).unwrap();
        assert_eq!(
            db.kv_get_json::<Vec<u64>>("laps").unwrap(),
            Some(vec![1, 2, 3])
        );
        db.kv_set("laps", "{oops").unwrap();
        assert!(matches!(
            db.kv_get_json::<Vec<u64>>("laps"),
            Err(DatabaseError::CorruptRow { .. })
        ));
    }

    #[test]
    fn file_database_persists() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("alarms.db");
        let alarm = weekday_alarm();
        {
            let db = Database::open_at(&path).unwrap();
            db.save_alarm(&alarm).unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.load_alarms().unwrap()[0].id(), alarm.id());
    }
}
