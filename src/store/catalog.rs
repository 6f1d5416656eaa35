use async_trait::async_trait;
use chrono::DateTime;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::scan::{self, ImportResult};
use super::MediaStore;
use crate::error::StoreError;
use crate::state::data::{AssetPage, Item, ListRequest, MediaKind, PageToken, SortOrder};

/// The catalog stores one row per imported media file in SQLite and
/// serves it to the feed as a paginated media store.
pub struct CatalogStore {
    db_path: PathBuf,
}

impl CatalogStore {
    /// Open (or create) the catalog at the default location:
    /// - Linux: ~/.local/share/swipe-cull/catalog.db
    /// - macOS: ~/Library/Application Support/swipe-cull/catalog.db
    /// - Windows: %APPDATA%\swipe-cull\catalog.db
    pub fn open_default() -> Result<Self, StoreError> {
        let db_path = Self::default_db_path()
            .ok_or_else(|| StoreError::Io("could not determine user data directory".into()))?;
        Self::open(db_path)
    }

    /// Open (or create) a catalog database file
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let db_path = db_path.into();

        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&db_path)?;
        Self::init_schema(&conn)?;

        info!(path = %db_path.display(), "📁 Catalog initialized");
        Ok(CatalogStore { db_path })
    }

    fn default_db_path() -> Option<PathBuf> {
        let mut path = dirs::data_dir().or_else(dirs::home_dir)?;
        path.push("swipe-cull");
        path.push("catalog.db");
        Some(path)
    }

    /// Create all tables and indexes if they don't exist
    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS assets (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                path            TEXT NOT NULL UNIQUE,
                filename        TEXT NOT NULL,
                kind            TEXT NOT NULL,
                file_size       INTEGER,
                created_at      INTEGER NOT NULL,
                imported_at     INTEGER NOT NULL
            )",
            [],
        )?;

        // Keyset pagination walks this index in both directions
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_assets_created_at
             ON assets(created_at, id)",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_assets_kind
             ON assets(kind)",
            [],
        )?;

        Ok(())
    }

    /// Get the path to the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Open a connection for one operation.
    /// Connections are opened per call so work can move to blocking threads.
    fn connect(db_path: &Path) -> Result<Connection, StoreError> {
        Ok(Connection::open(db_path)?)
    }

    /// Get a count of assets in the catalog
    pub fn asset_count(&self) -> Result<i64, StoreError> {
        let conn = Self::connect(&self.db_path)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM assets", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Import every media file under `folder`, off the UI thread
    pub async fn import_folder(&self, folder: PathBuf) -> Result<ImportResult, StoreError> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = Self::connect(&db_path)?;
            scan::import_folder(&conn, &folder)
        })
        .await?
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogStore")
            .field("db_path", &self.db_path)
            .finish()
    }
}

/// Sort key of the last row of a page, encoded as "<created_at>:<id>"
fn encode_token(created_at: i64, id: i64) -> PageToken {
    PageToken(format!("{created_at}:{id}"))
}

fn decode_token(token: &PageToken) -> Result<(i64, i64), StoreError> {
    let invalid = || StoreError::InvalidToken(token.0.clone());
    let (created_at, id) = token.0.split_once(':').ok_or_else(invalid)?;
    Ok((
        created_at.parse().map_err(|_| invalid())?,
        id.parse().map_err(|_| invalid())?,
    ))
}

/// Run one page query
fn list_page(conn: &Connection, request: &ListRequest) -> Result<AssetPage, StoreError> {
    let kinds = request.effective_kinds();
    let mut params: Vec<Value> = kinds
        .iter()
        .map(|kind| Value::Text(kind.as_str().to_string()))
        .collect();
    let placeholders = vec!["?"; kinds.len()].join(", ");
    let mut sql = format!(
        "SELECT id, path, filename, kind, file_size, created_at FROM assets WHERE kind IN ({placeholders})"
    );

    if let Some(album) = &request.album {
        sql.push_str(" AND path LIKE ? ESCAPE '\\'");
        params.push(Value::Text(scan::like_prefix(Path::new(album))));
    }

    let (cmp, order) = match request.sort {
        SortOrder::NewestFirst => ("<", "DESC"),
        SortOrder::OldestFirst => (">", "ASC"),
    };
    if let Some(token) = &request.after {
        let (created_at, id) = decode_token(token)?;
        sql.push_str(&format!(
            " AND (created_at {cmp} ? OR (created_at = ? AND id {cmp} ?))"
        ));
        params.push(Value::Integer(created_at));
        params.push(Value::Integer(created_at));
        params.push(Value::Integer(id));
    }

    // One extra row tells us whether another page exists
    sql.push_str(&format!(" ORDER BY created_at {order}, id {order} LIMIT ?"));
    params.push(Value::Integer(request.page_size as i64 + 1));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
        let id: i64 = row.get(0)?;
        let kind: String = row.get(3)?;
        let file_size: Option<i64> = row.get(4)?;
        let created_at: i64 = row.get(5)?;
        let item = Item {
            id: id.to_string(),
            uri: row.get(1)?,
            filename: Some(row.get(2)?),
            created_at: DateTime::from_timestamp_millis(created_at),
            kind: MediaKind::parse(&kind),
            file_size: file_size.map(|size| size.max(0) as u64),
        };
        Ok((item, created_at, id))
    })?;

    let mut page = Vec::new();
    for row in rows {
        page.push(row?);
    }

    let has_more = page.len() > request.page_size;
    page.truncate(request.page_size);
    let end_token = page
        .last()
        .map(|(_, created_at, id)| encode_token(*created_at, *id));

    Ok(AssetPage {
        items: page.into_iter().map(|(item, _, _)| item).collect(),
        end_token,
        has_more,
    })
}

/// A file moved aside while its batch is pending
struct Staged {
    original: PathBuf,
    staged: PathBuf,
}

/// Move a file next to itself under a hidden name
fn stage(original: &Path) -> std::io::Result<Staged> {
    let name = original.file_name().unwrap_or_default().to_string_lossy();
    let staged = original.with_file_name(format!(".{name}.swipe-cull-staged"));
    std::fs::rename(original, &staged)?;
    Ok(Staged {
        original: original.to_path_buf(),
        staged,
    })
}

fn unstage(staged: &[Staged]) {
    for file in staged {
        if let Err(err) = std::fs::rename(&file.staged, &file.original) {
            warn!(path = %file.original.display(), error = %err, "failed to restore staged file");
        }
    }
}

fn remove_rows(conn: &mut Connection, targets: &[(i64, PathBuf)]) -> Result<(), StoreError> {
    let tx = conn.transaction()?;
    for (rowid, _) in targets {
        tx.execute("DELETE FROM assets WHERE id = ?1", [rowid])?;
    }
    tx.commit()?;
    Ok(())
}

/// Delete a batch of assets, all or nothing.
///
/// Files are first renamed aside, then the rows are removed in one
/// transaction, and only then are the staged files unlinked. Any failure
/// before the commit renames everything back.
fn delete_batch(conn: &mut Connection, ids: &[String]) -> Result<(), StoreError> {
    let mut targets = Vec::with_capacity(ids.len());
    for id in ids {
        let rowid: i64 = id
            .parse()
            .map_err(|_| StoreError::NotFound(id.clone()))?;
        let path: String = conn
            .query_row("SELECT path FROM assets WHERE id = ?1", [rowid], |row| row.get(0))
            .map_err(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(id.clone()),
                other => other.into(),
            })?;
        targets.push((rowid, PathBuf::from(path)));
    }

    let mut staged = Vec::with_capacity(targets.len());
    for (_, path) in &targets {
        match stage(path) {
            Ok(file) => staged.push(file),
            // Already gone from disk: only the row is left to remove
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                unstage(&staged);
                return Err(err.into());
            }
        }
    }

    if let Err(err) = remove_rows(conn, &targets) {
        unstage(&staged);
        return Err(err);
    }

    for file in &staged {
        if let Err(err) = std::fs::remove_file(&file.staged) {
            warn!(path = %file.staged.display(), error = %err, "failed to remove staged file");
        }
    }
    info!(count = targets.len(), "🗑️  Deleted assets");
    Ok(())
}

#[async_trait]
impl MediaStore for CatalogStore {
    async fn list_assets(&self, request: &ListRequest) -> Result<AssetPage, StoreError> {
        let db_path = self.db_path.clone();
        let request = request.clone();
        tokio::task::spawn_blocking(move || {
            let conn = Self::connect(&db_path)?;
            list_page(&conn, &request)
        })
        .await?
    }

    async fn delete_assets(&self, ids: &[String]) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        let db_path = self.db_path.clone();
        let ids = ids.to_vec();
        tokio::task::spawn_blocking(move || {
            let mut conn = Self::connect(&db_path)?;
            delete_batch(&mut conn, &ids)
        })
        .await?
    }
}
