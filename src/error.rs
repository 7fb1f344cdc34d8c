use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Error returned by a [`SynthesisEngine`](crate::SynthesisEngine) or one of its chunk streams.
pub type EngineError = Box<dyn std::error::Error + Send + Sync>;

/// Error returned by a [`PlaybackSink`](crate::playback::PlaybackSink).
pub type PlaybackError = Box<dyn std::error::Error + Send + Sync>;

/// A single field of a synthesis request that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub reason: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Every violation found while validating one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(pub Vec<FieldViolation>);

impl Violations {
    pub fn push(&mut self, field: &'static str, reason: impl Into<String>) {
        self.0.push(FieldViolation {
            field,
            reason: reason.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names of the violated fields, in the order they were checked.
    pub fn fields(&self) -> Vec<&'static str> {
        self.0.iter().map(|v| v.field).collect()
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TtsError {
    #[error("Required {artifact} '{}' not found", .path.display())]
    MissingPrerequisite { artifact: &'static str, path: PathBuf },
    #[error("Invalid request: {0}")]
    InvalidRequest(Violations),
    #[error("Synthesis failed at chunk {index}: {source}")]
    SynthesisFailed {
        index: usize,
        #[source]
        source: EngineError,
    },
    #[error("Synthesis of chunk {index} timed out after {timeout:?}")]
    SynthesisTimeout { index: usize, timeout: Duration },
    #[error("Audio playback failed{}: {source}", chunk_suffix(.index))]
    PlaybackFailed {
        index: Option<usize>,
        #[source]
        source: PlaybackError,
    },
    #[error("Failed to load voice catalog from {}: {reason}", .path.display())]
    Catalog { path: PathBuf, reason: String },
    #[error("Failed to write {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

fn chunk_suffix(index: &Option<usize>) -> String {
    index.map(|i| format!(" at chunk {i}")).unwrap_or_default()
}

impl TtsError {
    /// Chunk index the failure is attributed to, if any.
    pub fn chunk_index(&self) -> Option<usize> {
        match self {
            TtsError::SynthesisFailed { index, .. } | TtsError::SynthesisTimeout { index, .. } => {
                Some(*index)
            }
            TtsError::PlaybackFailed { index, .. } => *index,
            _ => None,
        }
    }
}
