use std::path::{Path, PathBuf};

use crate::{AudioChunk, ChunkStream, EngineError, SynthesisEngine, SynthesisRequest};

use super::process::{EspeakError, Invocation};
use super::segment::{normalize, split_sentences};

/// espeak-ng speaking rate at speed 1.0, in words per minute.
pub const BASE_WORDS_PER_MINUTE: f32 = 175.0;
const MIN_WORDS_PER_MINUTE: u32 = 80;
const MAX_WORDS_PER_MINUTE: u32 = 450;

/// Where to find espeak-ng.
#[derive(Debug, Clone, Default)]
pub struct EspeakConfig {
    /// The espeak-ng binary. `None` uses `espeak-ng` from PATH.
    pub bin_path: Option<PathBuf>,
    /// The `espeak-ng-data` directory. `None` uses the compiled-in location.
    pub data_path: Option<PathBuf>,
}

impl EspeakConfig {
    fn bin(&self) -> &Path {
        self.bin_path
            .as_deref()
            .unwrap_or_else(|| Path::new("espeak-ng"))
    }

    /// espeak-ng's `--path` wants the directory that contains `espeak-ng-data`.
    fn data_root(&self) -> Option<&Path> {
        self.data_path.as_deref().map(|data| match data.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        })
    }
}

/// espeak-ng text-to-speech engine.
///
/// # Quick Start
///
/// ```rust,no_run
/// use tts_cli::{catalog::StaticCatalog, SynthesisEngine, SynthesisRequest};
/// use tts_cli::engines::espeak::{EspeakConfig, EspeakEngine};
/// use std::path::PathBuf;
///
/// // Point to a bundled espeak-ng data directory
/// let mut engine = EspeakEngine::new(EspeakConfig {
///     bin_path: None,
///     data_path: Some(PathBuf::from("./espeak-ng-data")),
/// });
/// let request = SynthesisRequest::builder()
///     .text("Hello, world!")
///     .build(&StaticCatalog::builtin())?;
/// let chunk = engine.synthesize(&request)?;
/// # Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct EspeakEngine {
    config: EspeakConfig,
}

impl EspeakEngine {
    pub fn new(config: EspeakConfig) -> Self {
        Self { config }
    }
}

impl SynthesisEngine for EspeakEngine {
    fn synthesize(&mut self, request: &SynthesisRequest) -> Result<AudioChunk, EngineError> {
        let voice = espeak_voice(request.language(), request.voice());
        let invocation = Invocation {
            bin: self.config.bin(),
            data_root: self.config.data_root(),
            voice: &voice,
            words_per_minute: words_per_minute(request.speed()),
        };
        Ok(invocation.render(&normalize(request.text()))?)
    }

    fn synthesize_stream(&mut self, request: &SynthesisRequest) -> Result<ChunkStream, EngineError> {
        let segments = split_sentences(request.text());
        log::debug!("Streaming {} sentence chunk(s)", segments.len());

        Ok(Box::new(SentenceStream {
            config: self.config.clone(),
            voice: espeak_voice(request.language(), request.voice()),
            words_per_minute: words_per_minute(request.speed()),
            segments: segments.into_iter(),
        }))
    }
}

/// Renders one sentence per `next()` call.
struct SentenceStream {
    config: EspeakConfig,
    voice: String,
    words_per_minute: u32,
    segments: std::vec::IntoIter<String>,
}

impl SentenceStream {
    fn render(&self, segment: &str) -> Result<AudioChunk, EspeakError> {
        Invocation {
            bin: self.config.bin(),
            data_root: self.config.data_root(),
            voice: &self.voice,
            words_per_minute: self.words_per_minute,
        }
        .render(segment)
    }
}

impl Iterator for SentenceStream {
    type Item = Result<AudioChunk, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        let segment = self.segments.next()?;
        Some(self.render(&segment).map_err(EngineError::from))
    }
}

/// Map a language tag and kokoro-style voice id to an espeak-ng voice.
///
/// The second character of the voice id is its gender (`af_sarah` is female,
/// `bm_lewis` male).
pub fn espeak_voice(language: &str, voice: &str) -> String {
    let variant = match voice.chars().nth(1) {
        Some('m') => "m3",
        _ => "f3",
    };
    format!("{}+{variant}", language.to_ascii_lowercase())
}

pub fn words_per_minute(speed: f32) -> u32 {
    ((BASE_WORDS_PER_MINUTE * speed).round() as u32).clamp(MIN_WORDS_PER_MINUTE, MAX_WORDS_PER_MINUTE)
}
