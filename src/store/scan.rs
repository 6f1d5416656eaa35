/// Folder import
///
/// Walks a folder recursively and records every photo or video it finds
/// in the catalog. Files already in the catalog are skipped.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode};
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::StoreError;
use crate::state::data::MediaKind;

/// RAW extensions the `image` crate does not know about
const RAW_EXTENSIONS: [&str; 16] = [
    "nef", "dng", "cr2", "cr3", "arw", "raf", "orf", "rw2",
    "pef", "srw", "erf", "kdc", "dcr", "mos", "raw", "rwl",
];

const VIDEO_EXTENSIONS: [&str; 8] = ["mp4", "mov", "m4v", "avi", "mkv", "webm", "3gp", "mts"];

/// Result of a folder import operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportResult {
    pub imported_count: usize,
    pub skipped_count: usize,
    /// Catalog rows dropped because their file no longer exists
    pub forgotten_count: usize,
}

/// Decide whether a file is a photo, a video, or neither
pub fn detect_kind(path: &Path) -> Option<MediaKind> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else if RAW_EXTENSIONS.contains(&ext.as_str())
        || image::ImageFormat::from_extension(&ext).is_some()
    {
        Some(MediaKind::Photo)
    } else {
        None
    }
}

/// Creation time of a file, falling back to its modification time
fn file_time(meta: &std::fs::Metadata) -> DateTime<Utc> {
    meta.created()
        .or_else(|_| meta.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

/// Import every media file under `folder` into the catalog
pub fn import_folder(conn: &Connection, folder: &Path) -> Result<ImportResult, StoreError> {
    let mut result = ImportResult::default();

    info!(folder = %folder.display(), "🔍 Scanning folder");

    for entry in WalkDir::new(folder)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        // Only process files (not directories)
        if !path.is_file() {
            continue;
        }
        let Some(kind) = detect_kind(path) else {
            continue;
        };
        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot stat file");
                continue;
            }
        };

        let path_str = path.to_string_lossy().to_string();
        let filename = path.file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let inserted = conn.execute(
            "INSERT INTO assets (path, filename, kind, file_size, created_at, imported_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                &path_str,
                &filename,
                kind.as_str(),
                meta.len() as i64,
                file_time(&meta).timestamp_millis(),
                Utc::now().timestamp_millis(),
            ],
        );

        match inserted {
            Ok(_) => {
                result.imported_count += 1;
                if result.imported_count % 100 == 0 {
                    debug!(count = result.imported_count, "⏳ Imported files");
                }
            }
            Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::ConstraintViolation => {
                // Already in the catalog
                result.skipped_count += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    result.forgotten_count = forget_missing(conn, folder)?;

    info!(
        imported = result.imported_count,
        skipped = result.skipped_count,
        forgotten = result.forgotten_count,
        "✅ Import complete"
    );
    Ok(result)
}

/// Escape a folder path (with its trailing separator) for use as a LIKE prefix
pub(crate) fn like_prefix(folder: &Path) -> String {
    let mut pattern = String::new();
    for c in folder.join("").to_string_lossy().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Drop catalog rows under `folder` whose file is gone from disk
pub fn forget_missing(conn: &Connection, folder: &Path) -> Result<usize, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, path FROM assets WHERE path LIKE ?1 ESCAPE '\\'"
    )?;

    let rows: Vec<(i64, String)> = stmt
        .query_map([like_prefix(folder)], |row| Ok((row.get(0)?, row.get(1)?)))?
        .filter_map(|r| r.ok())
        .collect();

    let mut forgotten = 0;
    for (id, file_path) in rows {
        if !Path::new(&file_path).exists() {
            conn.execute("DELETE FROM assets WHERE id = ?1", [id])?;
            forgotten += 1;
        }
    }

    if forgotten > 0 {
        warn!(count = forgotten, "⚠️  Forgot missing files");
    }
    Ok(forgotten)
}
