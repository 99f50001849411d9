use crate::foundation::error::{FlipError, FlipResult};

/// Largest number of frames one sequence may name.
pub const MAX_FRAMES: usize = 100_000;

/// One contiguous numbered run of frame files, e.g. `frames/ezgif-frame-001.jpg ..= 120.jpg`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRun {
    /// Directory relative to the assets root. May be empty.
    #[serde(default)]
    pub dir: String,
    /// File name prefix placed before the padded number.
    #[serde(default)]
    pub prefix: String,
    /// First number in the run (inclusive).
    pub first: u32,
    /// Last number in the run (inclusive).
    pub last: u32,
    /// Zero-padding width of the number.
    #[serde(default = "default_pad")]
    pub pad: usize,
    /// File extension without the leading dot.
    pub ext: String,
}

fn default_pad() -> usize {
    3
}

impl FrameRun {
    /// Number of frames in this run.
    pub fn len(&self) -> usize {
        if self.last < self.first {
            return 0;
        }
        ((self.last - self.first) as usize).saturating_add(1)
    }

    /// Return `true` when the run names no frames.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Relative path of the frame numbered `n`.
    pub fn path_for(&self, n: u32) -> String {
        let dir = self.dir.trim_end_matches(['/', '\\']);
        let file = format!(
            "{}{:0pad$}.{}",
            self.prefix,
            n,
            self.ext,
            pad = self.pad
        );
        if dir.is_empty() {
            file
        } else {
            format!("{dir}/{file}")
        }
    }

    fn validate(&self) -> FlipResult<()> {
        if self.last < self.first {
            return Err(FlipError::validation(format!(
                "frame run '{}{{{}..={}}}' must have last >= first",
                self.prefix, self.first, self.last
            )));
        }
        if self.pad == 0 {
            return Err(FlipError::validation("frame run pad must be > 0"));
        }
        if self.ext.trim().is_empty() || self.ext.contains(['/', '\\']) {
            return Err(FlipError::validation(
                "frame run ext must be a non-empty file extension",
            ));
        }
        Ok(())
    }
}

/// A single frame request produced by expanding a [`SequencePattern`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameSource {
    /// Position of the frame within the whole sequence.
    pub index: usize,
    /// Path relative to the assets root.
    pub rel_path: String,
}

/// Ordered concatenation of numbered runs making up one flipbook.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SequencePattern {
    /// Runs in playback order.
    pub runs: Vec<FrameRun>,
}

impl SequencePattern {
    /// Build a pattern from a single run.
    pub fn single(run: FrameRun) -> Self {
        Self { runs: vec![run] }
    }

    /// Total frame count across all runs.
    pub fn frame_count(&self) -> usize {
        self.runs
            .iter()
            .map(FrameRun::len)
            .fold(0, usize::saturating_add)
    }

    /// Check every run and require at least one frame.
    pub fn validate(&self) -> FlipResult<()> {
        if self.runs.is_empty() {
            return Err(FlipError::validation(
                "sequence pattern must contain at least one run",
            ));
        }
        let mut total = 0usize;
        for run in &self.runs {
            run.validate()?;
            total = total.saturating_add(run.len());
        }
        if total > MAX_FRAMES {
            return Err(FlipError::validation(format!(
                "sequence names {total} frames, limit is {MAX_FRAMES}"
            )));
        }
        Ok(())
    }

    /// Expand into one [`FrameSource`] per frame, in playback order.
    pub fn sources(&self) -> FlipResult<Vec<FrameSource>> {
        self.validate()?;
        let mut out = Vec::with_capacity(self.frame_count());
        for run in &self.runs {
            for n in run.first..=run.last {
                out.push(FrameSource {
                    index: out.len(),
                    rel_path: run.path_for(n),
                });
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/pattern.rs"]
mod tests;
