/// Shared data structures for the triage state
///
/// These structs represent the data model that flows between
/// the media store, the feed manager and the deck.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of media an item holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    /// Name stored in the catalog
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
        }
    }

    /// Parse a catalog name back into a kind
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "photo" => Some(MediaKind::Photo),
            "video" => Some(MediaKind::Video),
            _ => None,
        }
    }
}

/// A single media entry. Identity is the `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// Opaque store identifier
    pub id: String,
    /// Locator of the media (a file path for the desktop store)
    pub uri: String,
    /// Filename only (e.g., "IMG_0001.JPG")
    pub filename: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub kind: Option<MediaKind>,
    /// Size in bytes
    pub file_size: Option<u64>,
}

impl Item {
    /// Create an item with no metadata
    pub fn new(id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
            filename: None,
            created_at: None,
            kind: None,
            file_size: None,
        }
    }
}

/// Order in which the store returns assets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Most recently created first
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Opaque resumption point returned by the store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageToken(pub String);

/// Parameters of a single `list_assets` call
#[derive(Debug, Clone, PartialEq)]
pub struct ListRequest {
    pub page_size: usize,
    /// Resume after this token (None = first page)
    pub after: Option<PageToken>,
    /// Empty means photos only
    pub kinds: Vec<MediaKind>,
    pub sort: SortOrder,
    /// Restrict the listing to one album (a folder for the desktop store)
    pub album: Option<String>,
}

impl ListRequest {
    /// Kinds to list, applying the "photos only" fallback for an empty filter
    pub fn effective_kinds(&self) -> Vec<MediaKind> {
        if self.kinds.is_empty() {
            vec![MediaKind::Photo]
        } else {
            let mut kinds = Vec::with_capacity(self.kinds.len());
            for kind in &self.kinds {
                if !kinds.contains(kind) {
                    kinds.push(*kind);
                }
            }
            kinds
        }
    }
}

/// One page of assets from the store
#[derive(Debug, Clone, PartialEq)]
pub struct AssetPage {
    pub items: Vec<Item>,
    pub end_token: Option<PageToken>,
    pub has_more: bool,
}

/// Result of a purge: which ids were deleted and which were not
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeOutcome {
    pub success_ids: Vec<String>,
    pub failed_ids: Vec<String>,
}

impl PurgeOutcome {
    /// True when nothing was attempted
    pub fn is_empty(&self) -> bool {
        self.success_ids.is_empty() && self.failed_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_kind_filter_means_photos() {
        let request = ListRequest {
            page_size: 10,
            after: None,
            kinds: vec![],
            sort: SortOrder::default(),
            album: None,
        };
        assert_eq!(request.effective_kinds(), vec![MediaKind::Photo]);
    }

    #[test]
    fn test_kind_filter_is_deduplicated() {
        let request = ListRequest {
            page_size: 10,
            after: None,
            kinds: vec![MediaKind::Video, MediaKind::Photo, MediaKind::Video],
            sort: SortOrder::OldestFirst,
            album: None,
        };
        assert_eq!(request.effective_kinds(), vec![MediaKind::Video, MediaKind::Photo]);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(MediaKind::parse(MediaKind::Video.as_str()), Some(MediaKind::Video));
        assert_eq!(MediaKind::parse("audio"), None);
    }
}
