use std::path::PathBuf;

pub const DEFAULT_EXTENSION: &str = "txt";

#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub root: PathBuf,
    pub min_size_kb: f64,
    /// Extension without the leading dot, compared case-insensitively
    pub extension: String,
}

impl ScanRequest {
    pub fn new(root: impl Into<PathBuf>, min_size_kb: f64) -> Self {
        Self {
            root: root.into(),
            min_size_kb,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    #[must_use]
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub relative_path: PathBuf,
    pub size_kb: f64,
}

#[derive(Debug, Clone)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct ScanReport {
    pub root_resolved: PathBuf,
    /// Matching files before the size filter
    pub total_files_found: usize,
    pub displayed: Vec<FileRecord>,
    pub total_displayed_size_kb: f64,
    pub skipped: Vec<SkippedEntry>,
    pub cancelled: bool,
}
