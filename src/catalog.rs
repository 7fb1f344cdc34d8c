use std::collections::BTreeSet;
use std::path::Path;

use crate::error::TtsError;

/// Voices shipped with the kokoro-v0_19 voice pack.
const BUILTIN_VOICES: &[&str] = &[
    "af",
    "af_bella",
    "af_nicole",
    "af_sarah",
    "af_sky",
    "am_adam",
    "am_michael",
    "bf_emma",
    "bf_isabella",
    "bm_george",
    "bm_lewis",
];

/// A source of valid voice identifiers.
///
/// Implementations must be pure: `contains` never fails and never touches
/// external state, and `voices` returns the same sorted list on every call.
pub trait VoiceCatalog {
    /// Whether `voice` is a known voice id.
    fn contains(&self, voice: &str) -> bool;

    /// All known voice ids in sorted order.
    fn voices(&self) -> Vec<&str>;
}

/// An in-memory voice set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticCatalog {
    voices: BTreeSet<String>,
}

impl StaticCatalog {
    pub fn new<I, S>(voices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            voices: voices.into_iter().map(Into::into).collect(),
        }
    }

    /// The default voice set.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_VOICES.iter().copied())
    }
}

impl VoiceCatalog for StaticCatalog {
    fn contains(&self, voice: &str) -> bool {
        self.voices.contains(voice)
    }

    fn voices(&self) -> Vec<&str> {
        self.voices.iter().map(String::as_str).collect()
    }
}

/// A catalog read from a voice metadata file.
///
/// The file is a JSON object keyed by voice id. Values carry engine-specific
/// voice data and are not interpreted here, so a kokoro `voices.json` loads
/// as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonCatalog {
    inner: StaticCatalog,
}

impl JsonCatalog {
    pub fn load(path: &Path) -> Result<Self, TtsError> {
        let content = std::fs::read_to_string(path).map_err(|e| TtsError::Catalog {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let catalog = Self::from_json(&content).map_err(|reason| TtsError::Catalog {
            path: path.to_path_buf(),
            reason,
        })?;
        log::info!("Loaded {} voices from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn from_json(content: &str) -> Result<Self, String> {
        let json: serde_json::Value =
            serde_json::from_str(content).map_err(|e| format!("Failed to parse JSON: {e}"))?;
        let entries = json
            .as_object()
            .ok_or_else(|| "top-level value must be an object keyed by voice id".to_string())?;

        if entries.is_empty() {
            return Err("no voices defined".to_string());
        }

        Ok(Self {
            inner: StaticCatalog::new(entries.keys().cloned()),
        })
    }

    pub fn len(&self) -> usize {
        self.inner.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.voices.is_empty()
    }
}

impl VoiceCatalog for JsonCatalog {
    fn contains(&self, voice: &str) -> bool {
        self.inner.contains(voice)
    }

    fn voices(&self) -> Vec<&str> {
        self.inner.voices()
    }
}
