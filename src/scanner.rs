use crate::error::{FileAccessError, ScanError};
use crate::types::{FileRecord, ScanReport, ScanRequest, SkippedEntry};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use walkdir::{DirEntry, WalkDir};

/// Cooperative stop flag, checked between entries of a walk.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub fn scan(request: &ScanRequest) -> Result<ScanReport, ScanError> {
    scan_with_cancel(request, &CancelToken::new())
}

pub fn scan_with_cancel(
    request: &ScanRequest,
    cancel: &CancelToken,
) -> Result<ScanReport, ScanError> {
    let root = resolve_root(&request.root)?;
    log::debug!("scanning {} for *.{}", root.display(), request.extension);

    let mut found: Vec<FileRecord> = Vec::new();
    let mut skipped = Vec::new();
    let mut cancelled = false;

    for entry in WalkDir::new(&root) {
        if cancel.is_cancelled() {
            log::warn!("scan of {} cancelled", root.display());
            cancelled = true;
            break;
        }

        let entry = match entry {
            Ok(e) => e,
            Err(source) => {
                let path = source
                    .path()
                    .map_or_else(|| root.clone(), Path::to_path_buf);
                skip(&mut skipped, FileAccessError::Walk { path, source });
                continue;
            }
        };

        if !has_extension(&entry, &request.extension) {
            continue;
        }

        match file_size(&entry) {
            Some(Ok(len)) => {
                let relative_path = entry
                    .path()
                    .strip_prefix(&root)
                    .unwrap_or_else(|_| entry.path())
                    .to_path_buf();
                found.push(FileRecord {
                    relative_path,
                    size_kb: len as f64 / 1024.0,
                });
            }
            Some(Err(err)) => skip(&mut skipped, err),
            None => {}
        }
    }

    let total_files_found = found.len();
    let found_bytes: f64 = found.iter().map(|r| r.size_kb * 1024.0).sum();

    let mut displayed: Vec<FileRecord> = found
        .into_iter()
        .filter(|r| r.size_kb >= request.min_size_kb)
        .collect();
    // walk order is filesystem-dependent
    displayed.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    let total_displayed_size_kb = displayed.iter().map(|r| r.size_kb).sum();

    log::info!(
        "found {} .{} files ({}) under {}, {} at or above {} KB, {} skipped",
        total_files_found,
        request.extension,
        human_bytes::human_bytes(found_bytes),
        root.display(),
        displayed.len(),
        request.min_size_kb,
        skipped.len()
    );

    Ok(ScanReport {
        root_resolved: root,
        total_files_found,
        displayed,
        total_displayed_size_kb,
        skipped,
        cancelled,
    })
}

/// Size in bytes of a regular file or of the file a symlink points to.
/// `None` for directories and links to anything other than a file.
fn file_size(entry: &DirEntry) -> Option<Result<u64, FileAccessError>> {
    let path = entry.path().to_path_buf();
    let file_type = entry.file_type();

    if file_type.is_file() {
        Some(
            entry
                .metadata()
                .map(|m| m.len())
                .map_err(|source| FileAccessError::Metadata { path, source }),
        )
    } else if file_type.is_symlink() {
        match fs::metadata(&path) {
            Ok(m) if m.is_file() => Some(Ok(m.len())),
            Ok(_) => None,
            Err(source) => Some(Err(FileAccessError::Link { path, source })),
        }
    } else {
        None
    }
}

fn resolve_root(root: &Path) -> Result<PathBuf, ScanError> {
    let resolved = fs::canonicalize(root).map_err(|e| root_error(root, e))?;
    if !resolved.is_dir() {
        return Err(ScanError::NotADirectory(resolved));
    }
    Ok(resolved)
}

fn root_error(root: &Path, err: io::Error) -> ScanError {
    if err.kind() == io::ErrorKind::NotFound {
        ScanError::DirectoryNotFound(root.to_path_buf())
    } else {
        ScanError::Inaccessible {
            path: root.to_path_buf(),
            source: err,
        }
    }
}

fn has_extension(entry: &DirEntry, extension: &str) -> bool {
    entry
        .path()
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

fn skip(skipped: &mut Vec<SkippedEntry>, err: FileAccessError) {
    log::warn!("skipping entry: {err}");
    skipped.push(SkippedEntry {
        path: err.path().clone(),
        reason: err.to_string(),
    });
}
