/// Access to the media store
///
/// The core only needs to know whether it may load. Prompting the user
/// is left to the provider.

use rfd::FileDialog;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// Access to part of the library only
    Limited,
    Undetermined,
}

impl PermissionStatus {
    /// Anything other than granted or limited means "cannot load"
    pub fn can_load(&self) -> bool {
        matches!(self, PermissionStatus::Granted | PermissionStatus::Limited)
    }
}

pub trait PermissionProvider {
    fn status(&self) -> PermissionStatus;

    /// Ask for access; returns the resulting status
    fn request(&mut self) -> PermissionStatus;

    /// Widen a limited selection; returns the resulting status
    fn broaden_selection(&mut self) -> PermissionStatus;
}

/// Folder-based access for the desktop store.
///
/// - Undetermined until a folder is chosen
/// - Denied if the folder cannot be listed
/// - Limited if it is read-only (browsing works, purging will not)
/// - Granted otherwise
#[derive(Debug, Clone, Default)]
pub struct FolderAccess {
    root: Option<PathBuf>,
}

impl FolderAccess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Status of a folder on disk
    pub fn status_of(folder: &Path) -> PermissionStatus {
        if std::fs::read_dir(folder).is_err() {
            return PermissionStatus::Denied;
        }
        match std::fs::metadata(folder) {
            Ok(meta) if meta.permissions().readonly() => PermissionStatus::Limited,
            Ok(_) => PermissionStatus::Granted,
            Err(_) => PermissionStatus::Denied,
        }
    }

    /// Show the native folder picker dialog
    fn pick_folder(&mut self) -> PermissionStatus {
        let folder = FileDialog::new()
            .set_title("Select a Folder to Triage")
            .pick_folder();

        if let Some(folder) = folder {
            info!(folder = %folder.display(), "folder selected");
            self.root = Some(folder);
        }
        self.status()
    }
}

impl PermissionProvider for FolderAccess {
    fn status(&self) -> PermissionStatus {
        match &self.root {
            Some(root) => Self::status_of(root),
            None => PermissionStatus::Undetermined,
        }
    }

    fn request(&mut self) -> PermissionStatus {
        self.pick_folder()
    }

    fn broaden_selection(&mut self) -> PermissionStatus {
        if self.status() == PermissionStatus::Limited {
            self.pick_folder()
        } else {
            self.status()
        }
    }
}
