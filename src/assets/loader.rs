use std::path::{Path, PathBuf};

use crate::foundation::error::{FlipError, FlipResult};
use crate::sequence::pattern::FrameSource;

/// Host capability that fetches the encoded bytes of one frame.
///
/// Implementations are shared across loader threads, so they must be `Send + Sync`.
pub trait FrameLoader: Send + Sync {
    /// Read the encoded image for `source`.
    fn load(&self, source: &FrameSource) -> FlipResult<Vec<u8>>;
}

/// Loads frames from a directory on the local filesystem.
#[derive(Clone, Debug)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    /// Create a loader rooted at `root`. Frame paths are resolved relative to it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Assets root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FrameLoader for FsLoader {
    fn load(&self, source: &FrameSource) -> FlipResult<Vec<u8>> {
        let norm = normalize_rel_path(&source.rel_path)?;
        let p = self.root.join(Path::new(&norm));
        std::fs::read(&p)
            .map_err(|e| FlipError::load(format!("failed to read frame '{}': {e}", p.display())))
    }
}

/// Normalize and validate assets-relative frame paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub(crate) fn normalize_rel_path(source: &str) -> FlipResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(FlipError::validation("frame paths must be relative"));
    }
    if s.is_empty() {
        return Err(FlipError::validation("frame path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(FlipError::validation("frame paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(FlipError::validation(
            "frame path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/loader.rs"]
mod tests;
