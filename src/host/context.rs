//! Context file for editor and agent tooling.
//!
//! The staged snapshot is rendered as Markdown to a project-scoped file
//! (`<project>/.inspector/selection.md` by default) on every change. The
//! file is removed when the snapshot becomes empty, so its presence alone
//! means "something is staged".

// ============================================================================
// Imports
// ============================================================================

use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::protocol::StagedElementWire;

// ============================================================================
// Constants
// ============================================================================

/// Directory created inside the project.
pub const CONTEXT_DIR: &str = ".inspector";

/// File name inside [`CONTEXT_DIR`].
pub const CONTEXT_FILE: &str = "selection.md";

// ============================================================================
// ContextWriter
// ============================================================================

/// Writes the staged snapshot to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextWriter {
    path: PathBuf,
}

impl ContextWriter {
    /// Writer for the default location under `project_dir`.
    #[must_use]
    pub fn for_project(project_dir: impl AsRef<Path>) -> Self {
        Self {
            path: project_dir.as_ref().join(CONTEXT_DIR).join(CONTEXT_FILE),
        }
    }

    /// Writer for an explicit file path.
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Target file.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `snapshot`, or removes the file when it is empty.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the file cannot be written or removed.
    pub fn write(&self, snapshot: &[StagedElementWire]) -> Result<()> {
        if snapshot.is_empty() {
            return self.clear();
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, render(snapshot))?;

        debug!(path = %self.path.display(), count = snapshot.len(), "Context file written");
        Ok(())
    }

    /// Removes the file if present.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] for failures other than a missing file.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Context file removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Renders the snapshot as Markdown.
#[must_use]
pub fn render(snapshot: &[StagedElementWire]) -> String {
    let mut out = String::from("# Staged elements\n");

    for (position, entry) in snapshot.iter().enumerate() {
        let _ = writeln!(out, "\n## {}. {}\n", position + 1, entry.summary);
        let _ = writeln!(out, "- Selector: `{}`", entry.selector);

        if let Some(component) = &entry.component {
            match &component.source {
                Some(source) => {
                    let _ = write!(out, "- Component: {} ({}", component.name, source.file);
                    if let Some(line) = source.line {
                        let _ = write!(out, ":{line}");
                    }
                    let _ = writeln!(out, ")");
                }
                None => {
                    let _ = writeln!(out, "- Component: {}", component.name);
                }
            }
        }

        if let Some(measurement) = &entry.measurement {
            let rect = measurement.rect;
            let _ = writeln!(
                out,
                "- Box: {}x{} at ({}, {})",
                rect.width, rect.height, rect.x, rect.y
            );
            if !measurement.classes.is_empty() {
                let _ = writeln!(out, "- Classes: `{}`", measurement.classes.join(" "));
            }
            for (property, value) in &measurement.styles {
                let _ = writeln!(out, "- `{property}`: {value}");
            }
        }
    }

    out
}

// ============================================================================
// Tests
// ============================================================================
