//! Per-workspace settings passed explicitly into the engines.

use std::path::{Path, PathBuf};

/// Everything the engines may read about the surrounding workspace.
///
/// Passed by the editor layer on each call; the engines hold no ambient
/// state of their own.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceContext {
    root_dir: Option<PathBuf>,
}

impl WorkspaceContext {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: Some(root_dir.into()),
        }
    }

    pub fn root_dir(&self) -> Option<&Path> {
        self.root_dir.as_deref()
    }

    /// The workspace directory basename, offered as the default project
    /// name. `None` when no workspace is open or the root has no basename.
    pub fn project_name(&self) -> Option<&str> {
        self.root_dir
            .as_deref()
            .and_then(Path::file_name)
            .and_then(|name| name.to_str())
    }
}
