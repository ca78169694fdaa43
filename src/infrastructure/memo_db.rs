//! `SQLite` reader for the Voice Memos `CloudRecordings.db`.
//!
//! Detects which recordings table is present and normalizes both the
//! cloud-era and the legacy layout into [`Recording`] values.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, Row, Statement};

use crate::domain::{AppError, Folder, Recording, Result, SchemaVariant};

/// Folder table shared by both schema generations.
const FOLDER_TABLE: &str = "ZFOLDER";

/// Columns that must exist for a table to be usable.
const REQUIRED_COLUMNS: &[&str] = &["Z_PK", "ZDATE"];

/// Column order of the normalized recordings query.
const RECORDING_COLUMNS: &[&str] = &[
    "Z_PK",
    "ZFOLDER",
    "ZDATE",
    "ZDURATION",
    "ZCUSTOMLABELFORSORTING",
    "ZCUSTOMLABEL",
    "ZPATH",
    "ZUNIQUEID",
];

const FOLDER_COLUMNS: &[&str] = &["Z_PK", "ZENCRYPTEDNAME", "ZRANK", "ZCOUNTOFRECORDINGS"];

/// Read-only reader for a recordings database.
///
/// The connection is closed when the reader is dropped.
pub struct MemoDbReader {
    conn: Connection,
    path: PathBuf,
    variant: SchemaVariant,
}

impl MemoDbReader {
    /// Opens a recordings database in read-only mode and detects its schema.
    ///
    /// # Errors
    /// Returns `DatabaseUnavailable` if the file cannot be opened or read,
    /// `SchemaNotFound` if no known recordings table exists.
    pub fn open(path: &Path) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn =
            Connection::open_with_flags(path, flags).map_err(|e| AppError::unavailable(path, e))?;

        conn.execute_batch(
            "PRAGMA query_only = ON;
             PRAGMA temp_store = MEMORY;",
        )
        .map_err(|e| AppError::unavailable(path, e))?;

        let variant = detect_variant(&conn)
            .map_err(|e| AppError::unavailable(path, e))?
            .ok_or_else(|| AppError::SchemaNotFound {
                path: path.to_path_buf(),
            })?;

        tracing::debug!(path = %path.display(), %variant, "Opened recordings database");

        Ok(Self {
            conn,
            path: path.to_path_buf(),
            variant,
        })
    }

    /// The recordings table variant found in this database.
    #[must_use]
    pub const fn variant(&self) -> SchemaVariant {
        self.variant
    }

    /// Path of the opened database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory audio paths are relative to.
    #[must_use]
    pub fn db_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Prepares the recordings query, ordered by date then primary key.
    ///
    /// # Errors
    /// Returns error if the query cannot be prepared.
    pub fn recordings(&self) -> Result<RecordingQuery<'_>> {
        let table = self.variant.table();
        let present = table_columns(&self.conn, table).map_err(AppError::database)?;
        let select = select_list(RECORDING_COLUMNS, &present);

        let sql = format!("SELECT {select} FROM {table} ORDER BY ZDATE ASC, Z_PK ASC");
        tracing::trace!(%sql, "Preparing recordings query");

        let stmt = self.conn.prepare(&sql).map_err(AppError::database)?;

        Ok(RecordingQuery {
            stmt,
            variant: self.variant,
        })
    }

    /// Fetches all folders. Returns an empty list if the table is absent.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn folders(&self) -> Result<Vec<Folder>> {
        if !table_exists(&self.conn, FOLDER_TABLE).map_err(AppError::database)? {
            return Ok(Vec::new());
        }

        let present = table_columns(&self.conn, FOLDER_TABLE).map_err(AppError::database)?;
        if !present.contains("Z_PK") {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {} FROM {FOLDER_TABLE} ORDER BY Z_PK",
            select_list(FOLDER_COLUMNS, &present)
        );
        let mut stmt = self.conn.prepare(&sql).map_err(AppError::database)?;

        let rows = stmt
            .query_map([], |row| {
                Ok(Folder {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    display_rank: row.get(2)?,
                    recording_count: row.get(3)?,
                })
            })
            .map_err(AppError::database)?;

        let mut folders = Vec::new();
        for row in rows {
            match row {
                Ok(folder) => folders.push(folder),
                Err(e) => {
                    tracing::warn!("Failed to read folder row: {}", e);
                }
            }
        }

        Ok(folders)
    }
}

/// A prepared recordings query.
pub struct RecordingQuery<'conn> {
    stmt: Statement<'conn>,
    variant: SchemaVariant,
}

impl RecordingQuery<'_> {
    /// Runs the query, yielding recordings lazily in date order.
    ///
    /// Rows without a primary key or date are logged and skipped.
    ///
    /// # Errors
    /// Returns error if the query cannot be started. Each item carries
    /// any error raised while stepping through the rows.
    pub fn iter(&mut self) -> Result<impl Iterator<Item = Result<Recording>> + '_> {
        let variant = self.variant;
        let rows = self
            .stmt
            .query_map([], move |row| read_recording(row, variant))
            .map_err(AppError::database)?;

        Ok(rows.filter_map(|row| match row {
            Ok(Some(recording)) => Some(Ok(recording)),
            Ok(None) => None,
            Err(e) => Some(Err(AppError::database(e))),
        }))
    }
}

/// Maps one normalized row. Returns `None` when the key columns are unusable.
///
/// Columns holding an unexpected storage class are treated as unset.
fn read_recording(row: &Row<'_>, variant: SchemaVariant) -> rusqlite::Result<Option<Recording>> {
    let id = integer_column(row, 0)?;
    let recorded_at = real_column(row, 2)?;

    let (Some(id), Some(recorded_at)) = (id, recorded_at) else {
        tracing::warn!(?id, "Skipping recording row without usable id or date");
        return Ok(None);
    };

    Ok(Some(Recording {
        id,
        folder_id: integer_column(row, 1)?,
        recorded_at,
        duration_seconds: real_column(row, 3)?,
        label_primary: text_column(row, 4, id)?,
        label_legacy: text_column(row, 5, id)?,
        relative_audio_path: text_column(row, 6, id)?,
        unique_id: text_column(row, 7, id)?,
        variant,
    }))
}

fn integer_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<i64>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Integer(v) => Some(v),
        ValueRef::Null => None,
        other => {
            tracing::warn!(column = RECORDING_COLUMNS[idx], kind = %other.data_type(), "Ignoring non-integer value");
            None
        }
    })
}

#[allow(clippy::cast_precision_loss)]
fn real_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<f64>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Real(v) => Some(v),
        ValueRef::Integer(v) => Some(v as f64),
        ValueRef::Null => None,
        other => {
            tracing::warn!(column = RECORDING_COLUMNS[idx], kind = %other.data_type(), "Ignoring non-numeric value");
            None
        }
    })
}

fn text_column(row: &Row<'_>, idx: usize, id: i64) -> rusqlite::Result<Option<String>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Null => None,
        other => {
            tracing::warn!(id, column = RECORDING_COLUMNS[idx], kind = %other.data_type(), "Ignoring non-text value");
            None
        }
    })
}

/// Picks the recordings table, preferring the cloud-era one.
fn detect_variant(conn: &Connection) -> rusqlite::Result<Option<SchemaVariant>> {
    for variant in [SchemaVariant::Cloud, SchemaVariant::Legacy] {
        if !table_exists(conn, variant.table())? {
            continue;
        }

        let columns = table_columns(conn, variant.table())?;
        if REQUIRED_COLUMNS.iter().all(|c| columns.contains(*c)) {
            return Ok(Some(variant));
        }

        tracing::warn!(
            table = variant.table(),
            "Recordings table lacks required columns"
        );
    }

    Ok(None)
}

fn table_exists(conn: &Connection, table_name: &str) -> rusqlite::Result<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        [table_name],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<HashSet<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    names.collect()
}

/// Builds a select list, substituting `NULL` for absent columns.
fn select_list(wanted: &[&str], present: &HashSet<String>) -> String {
    wanted
        .iter()
        .map(|col| {
            if present.contains(*col) {
                (*col).to_string()
            } else {
                format!("NULL AS {col}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Creates a cloud-era database with the given rows:
    /// `(pk, date, label_for_sorting, path)`.
    pub(crate) fn create_cloud_db(path: &Path, rows: &[(i64, f64, Option<&str>, Option<&str>)]) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "CREATE TABLE ZCLOUDRECORDING (
                Z_PK INTEGER PRIMARY KEY,
                ZFOLDER INTEGER,
                ZDATE TIMESTAMP,
                ZDURATION FLOAT,
                ZCUSTOMLABEL VARCHAR,
                ZCUSTOMLABELFORSORTING VARCHAR,
                ZPATH VARCHAR,
                ZUNIQUEID VARCHAR
            );
            CREATE TABLE ZFOLDER (
                Z_PK INTEGER PRIMARY KEY,
                ZENCRYPTEDNAME VARCHAR,
                ZRANK INTEGER,
                ZCOUNTOFRECORDINGS INTEGER
            );",
        )
        .unwrap();

        for (pk, date, label, rel_path) in rows {
            conn.execute(
                "INSERT INTO ZCLOUDRECORDING
                    (Z_PK, ZDATE, ZDURATION, ZCUSTOMLABELFORSORTING, ZPATH, ZUNIQUEID)
                 VALUES (?1, ?2, 12.5, ?3, ?4, ?5)",
                rusqlite::params![pk, date, label, rel_path, format!("uuid-{pk}")],
            )
            .unwrap();
        }
    }

    fn collect(reader: &MemoDbReader) -> Vec<Recording> {
        let mut query = reader.recordings().unwrap();
        let items: Vec<Recording> = query.iter().unwrap().map(|r| r.unwrap()).collect();
        items
    }

    #[test]
    fn test_cloud_schema_ordered_by_date_then_id() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("CloudRecordings.db");
        create_cloud_db(
            &db,
            &[
                (3, 200.0, Some("Later"), Some("c.m4a")),
                (2, 100.0, Some("Tie B"), Some("b.m4a")),
                (1, 100.0, Some("Tie A"), Some("a.m4a")),
            ],
        );

        let reader = MemoDbReader::open(&db).unwrap();
        assert_eq!(reader.variant(), SchemaVariant::Cloud);
        assert_eq!(reader.db_dir(), dir.path());

        let ids: Vec<i64> = collect(&reader).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_legacy_schema_missing_columns_are_unset() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("Recordings.db");
        {
            let conn = Connection::open(&db).unwrap();
            conn.execute_batch(
                "CREATE TABLE ZRECORDING (Z_PK INTEGER PRIMARY KEY, ZDATE TIMESTAMP,
                    ZCUSTOMLABEL VARCHAR, ZPATH VARCHAR);
                 INSERT INTO ZRECORDING VALUES (7, 5.0, 'Old memo', 'x.m4a');",
            )
            .unwrap();
        }

        let reader = MemoDbReader::open(&db).unwrap();
        assert_eq!(reader.variant(), SchemaVariant::Legacy);

        let recs = collect(&reader);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].label_legacy.as_deref(), Some("Old memo"));
        assert!(recs[0].label_primary.is_none());
        assert!(recs[0].unique_id.is_none());
        assert!(recs[0].duration_seconds.is_none());
        assert!(reader.folders().unwrap().is_empty());
    }

    #[test]
    fn test_rows_without_date_are_skipped() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("CloudRecordings.db");
        create_cloud_db(&db, &[(1, 10.0, None, Some("a.m4a"))]);
        {
            let conn = Connection::open(&db).unwrap();
            conn.execute("INSERT INTO ZCLOUDRECORDING (Z_PK) VALUES (2)", [])
                .unwrap();
        }

        let reader = MemoDbReader::open(&db).unwrap();
        let recs = collect(&reader);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].id, 1);
    }

    #[test]
    fn test_mistyped_columns_are_unset() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("CloudRecordings.db");
        create_cloud_db(
            &db,
            &[
                (1, 10.0, Some("First"), Some("a.m4a")),
                (3, 30.0, Some("Third"), Some("c.m4a")),
            ],
        );
        {
            let conn = Connection::open(&db).unwrap();
            conn.execute(
                "INSERT INTO ZCLOUDRECORDING (Z_PK, ZDATE, ZDURATION, ZCUSTOMLABELFORSORTING, ZPATH)
                 VALUES (2, 20.0, 'long', X'00FF', 'b.m4a')",
                [],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO ZCLOUDRECORDING (Z_PK, ZDATE, ZPATH) VALUES (4, 'yesterday', 'd.m4a')",
                [],
            )
            .unwrap();
        }

        let reader = MemoDbReader::open(&db).unwrap();
        let recs = collect(&reader);
        let ids: Vec<i64> = recs.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let odd = &recs[1];
        assert!(odd.label_primary.is_none());
        assert!(odd.duration_seconds.is_none());
        assert_eq!(odd.relative_audio_path.as_deref(), Some("b.m4a"));
        assert_eq!(recs[2].label_primary.as_deref(), Some("Third"));
    }

    #[test]
    fn test_folders_are_read() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("CloudRecordings.db");
        create_cloud_db(&db, &[]);
        {
            let conn = Connection::open(&db).unwrap();
            conn.execute("INSERT INTO ZFOLDER VALUES (1, 'Work', 0, 4)", [])
                .unwrap();
        }

        let reader = MemoDbReader::open(&db).unwrap();
        let folders = reader.folders().unwrap();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name.as_deref(), Some("Work"));
        assert_eq!(folders[0].recording_count, Some(4));
    }

    #[test]
    fn test_unknown_schema() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("other.db");
        {
            let conn = Connection::open(&db).unwrap();
            conn.execute_batch("CREATE TABLE notes (id INTEGER);").unwrap();
        }

        assert!(matches!(
            MemoDbReader::open(&db),
            Err(AppError::SchemaNotFound { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let dir = tempdir().unwrap();
        let result = MemoDbReader::open(&dir.path().join("absent.db"));
        assert!(matches!(result, Err(AppError::DatabaseUnavailable { .. })));
    }

    #[test]
    fn test_garbage_file_is_unavailable() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("garbage.db");
        std::fs::write(&db, b"this is definitely not an sqlite database file").unwrap();

        let result = MemoDbReader::open(&db);
        assert!(matches!(result, Err(AppError::DatabaseUnavailable { .. })));
    }

    #[test]
    fn test_reader_never_writes() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("CloudRecordings.db");
        create_cloud_db(&db, &[(1, 1.0, Some("A"), Some("a.m4a"))]);
        let before = std::fs::read(&db).unwrap();

        let reader = MemoDbReader::open(&db).unwrap();
        let _ = collect(&reader);
        let _ = reader.folders().unwrap();
        assert!(reader.conn.execute("DELETE FROM ZCLOUDRECORDING", []).is_err());
        drop(reader);

        assert_eq!(std::fs::read(&db).unwrap(), before);
    }
}
