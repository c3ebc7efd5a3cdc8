use chrono::{DateTime, Utc};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use webhook_tui_core::timestamp::{format_stored, parse_stored};
use webhook_tui_core::{HeaderMap, RecordPage, WebhookRecord};

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS webhooks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    method TEXT NOT NULL,
    path TEXT NOT NULL,
    headers TEXT,
    body TEXT,
    body_json TEXT
);";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not determine home directory for the record store")]
    HomeUnavailable,
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persistent webhook history.
/// Thread-safe: wraps the connection in a Mutex so it can be shared via `Arc<RecordStore>`.
pub struct RecordStore {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl RecordStore {
    /// Open (or create) the store at the default path.
    /// `~/.webhook-tui/webhooks.db`
    pub fn open() -> Result<Self, StoreError> {
        let path =
            webhook_tui_runtime_config::paths::db_path().map_err(|_| StoreError::HomeUnavailable)?;
        Self::open_path(&path)
    }

    /// Open (or create) the store at a specific path.
    pub fn open_path(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_data_dir(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;
        tracing::debug!(path = %path.display(), "record store opened");
        Ok(Self {
            conn: Mutex::new(conn),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Persist one record under its own id.
    pub fn insert(&self, record: &WebhookRecord) -> Result<(), StoreError> {
        let headers = serde_json::to_string(&record.headers)?;
        let body_json = match &record.body_json {
            Some(value) => serde_json::to_string(value)?,
            None => String::new(),
        };
        self.conn().execute(
            "INSERT INTO webhooks (id, timestamp, method, path, headers, body, body_json) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id,
                format_stored(&record.timestamp),
                &record.method,
                &record.path,
                headers,
                &record.body,
                body_json,
            ],
        )?;
        Ok(())
    }

    /// One page of records, newest id first, plus the total row count.
    pub fn query_page(&self, page: usize, page_size: usize) -> Result<RecordPage, StoreError> {
        let limit = i64::try_from(page_size).unwrap_or(i64::MAX);
        let offset = i64::try_from(page.saturating_mul(page_size)).unwrap_or(i64::MAX);

        let conn = self.conn();
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM webhooks", [], |row| row.get(0))?;

        let mut stmt = conn.prepare(
            "SELECT id, timestamp, method, path, headers, body, body_json \
             FROM webhooks ORDER BY id DESC LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt.query_map(params![limit, offset], row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(RecordPage {
            records,
            total: usize::try_from(total).unwrap_or(0),
            page,
        })
    }

    /// Highest stored id, 0 when the store is empty.
    pub fn max_id(&self) -> Result<i64, StoreError> {
        let max = self
            .conn()
            .query_row("SELECT COALESCE(MAX(id), 0) FROM webhooks", [], |row| {
                row.get(0)
            })?;
        Ok(max)
    }
}

#[cfg(unix)]
fn create_data_dir(dir: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o755)
        .create(dir)
        .map_err(|source| StoreError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })
}

#[cfg(not(unix))]
fn create_data_dir(dir: &Path) -> Result<(), StoreError> {
    std::fs::create_dir_all(dir).map_err(|source| StoreError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<WebhookRecord> {
    let headers: Option<String> = row.get(4)?;
    let body: Option<String> = row.get(5)?;
    let body_json: Option<String> = row.get(6)?;
    Ok(WebhookRecord {
        id: row.get(0)?,
        timestamp: timestamp_from_ref(row.get_ref(1)?),
        method: row.get(2)?,
        path: row.get(3)?,
        headers: decode_headers(headers.as_deref()),
        body: body.unwrap_or_default(),
        body_json: body_json
            .as_deref()
            .filter(|s| !s.is_empty())
            .and_then(|s| serde_json::from_str(s).ok()),
    })
}

fn timestamp_from_ref(value: ValueRef<'_>) -> DateTime<Utc> {
    match value {
        ValueRef::Text(bytes) => parse_stored(&String::from_utf8_lossy(bytes)),
        ValueRef::Integer(secs) => {
            DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        }
        _ => DateTime::<Utc>::UNIX_EPOCH,
    }
}

fn decode_headers(raw: Option<&str>) -> HeaderMap {
    raw.and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}
