//! Archived link handed to the extractor

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A resource to extract: its URL and the directory its artifacts live in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    pub link_dir: PathBuf,
}

impl Link {
    pub fn new(url: impl Into<String>, link_dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            link_dir: link_dir.into(),
        }
    }

    /// `out_dir` when given, otherwise the link's own directory.
    pub fn output_root<'a>(&'a self, out_dir: Option<&'a Path>) -> &'a Path {
        out_dir.unwrap_or(&self.link_dir)
    }
}
