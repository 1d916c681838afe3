//! Persisting pages to the output directory.
//!
//! Every page becomes `{sanitized simple name}.txt`. Writes run as independent tasks on a
//! `rayon` scope: the caller dispatches one task per page while it keeps assembling, and the end
//! of the scope is the join. A failing write is logged and recorded as a [`WriteFailure`]; it
//! never affects sibling writes.
//!
//! Two types whose names sanitize identically share one file, the last completed write wins.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use log::{debug, error};

use crate::{report::Page, Result};

/// Characters that may not appear in a file name, besides control characters.
const ILLEGAL_CHARS: &[char] = &['"', '<', '>', '|', ':', '*', '?', '\\', '/', ',', '`'];

/// Replaces every character that is illegal or unwanted in a file name with `_`.
///
/// ```rust
/// assert_eq!(typedump::writer::sanitize_file_name("Dictionary`2"), "Dictionary_2");
/// assert_eq!(typedump::writer::sanitize_file_name("<Start>d__4"), "_Start_d__4");
/// ```
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_control() || ILLEGAL_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// A page that could not be written.
#[derive(Debug)]
pub struct WriteFailure {
    /// Target path of the failed write
    pub path: PathBuf,
    /// The underlying I/O error
    pub error: io::Error,
}

/// Result of all writes dispatched through a [`ReportWriter`].
#[derive(Debug, Default)]
pub struct WriteOutcome {
    /// Number of pages successfully written
    pub written: usize,
    /// Failed writes, in completion order
    pub failures: Vec<WriteFailure>,
}

/// Writes pages into one output directory, possibly from several threads at once.
#[derive(Debug)]
pub struct ReportWriter {
    output_dir: PathBuf,
    written: AtomicUsize,
    failures: boxcar::Vec<WriteFailure>,
}

impl ReportWriter {
    /// Creates a writer for `output_dir`, creating the directory if missing.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the directory cannot be created.
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;

        Ok(ReportWriter {
            output_dir,
            written: AtomicUsize::new(0),
            failures: boxcar::Vec::new(),
        })
    }

    /// The directory pages are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Target path of `page`.
    #[must_use]
    pub fn path_for(&self, page: &Page) -> PathBuf {
        self.output_dir
            .join(format!("{}.txt", sanitize_file_name(&page.name)))
    }

    /// Writes `page` on the calling thread, recording the outcome.
    ///
    /// Returns `true` if the page was written.
    pub fn write(&self, page: &Page) -> bool {
        let path = self.path_for(page);
        match fs::write(&path, page.render()) {
            Ok(()) => {
                debug!("Wrote {}", path.display());
                self.written.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(err) => {
                error!("Failed to write {}: {}", path.display(), err);
                self.failures.push(WriteFailure { path, error: err });
                false
            }
        }
    }

    /// Schedules the write of `page` on `scope`; completion is awaited by the end of the scope.
    pub fn dispatch<'s>(&'s self, scope: &rayon::Scope<'s>, page: Page) {
        scope.spawn(move |_| {
            self.write(&page);
        });
    }

    /// Consumes the writer after all writes have joined.
    #[must_use]
    pub fn finish(self) -> WriteOutcome {
        WriteOutcome {
            written: self.written.into_inner(),
            failures: self.failures.into_iter().collect(),
        }
    }
}
