/// Media store adapters
///
/// This module defines the contract the feed manager talks to:
/// - Paginated listing of assets
/// - All-or-nothing batch deletion
///
/// `catalog` implements it on top of a SQLite catalog of a scanned folder.

pub mod catalog;
pub mod scan;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::state::data::{AssetPage, ListRequest};

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Fetch one page of assets
    async fn list_assets(&self, request: &ListRequest) -> Result<AssetPage, StoreError>;

    /// Delete a batch of assets. Any failure means none were deleted.
    async fn delete_assets(&self, ids: &[String]) -> Result<(), StoreError>;
}
