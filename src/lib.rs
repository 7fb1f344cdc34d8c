//! # tts-cli
//!
//! A command-line text-to-speech front end built around a streaming
//! synthesis-and-playback pipeline.
//!
//! ## Features
//!
//! - **Chunked streaming**: audio is pulled from the engine one chunk at a time
//!   and played as soon as it is ready
//! - **Play, save or both**: chunks fan out to an audio device and/or a single
//!   atomically written WAV file
//! - **Pluggable collaborators**: engines, playback sinks, encoders and voice
//!   catalogs are all traits
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! tts-cli = { version = "2026.2", features = ["playback"] }
//! ```
//!
//! ```ignore
//! use std::path::PathBuf;
//! use tts_cli::{
//!     catalog::StaticCatalog,
//!     encoder::WavEncoder,
//!     engines::espeak::{EspeakConfig, EspeakEngine},
//!     router::{OutputPlan, OutputRouter},
//!     SynthesisEngine, SynthesisRequest,
//! };
//!
//! let request = SynthesisRequest::builder()
//!     .text("Hello, world! This is streamed.")
//!     .build(&StaticCatalog::builtin())?;
//!
//! let mut engine = EspeakEngine::new(EspeakConfig::default());
//! let chunks = engine.synthesize_stream(&request)?;
//!
//! let plan = OutputPlan::new(false, true, PathBuf::from("outputs/audio.wav"));
//! let summary = OutputRouter::new(&WavEncoder).route(&plan, chunks)?;
//! assert!(summary.saved);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod catalog;
pub mod coordinator;
pub mod encoder;
pub mod engines;
pub mod error;
pub mod playback;
pub mod prereq;
pub mod request;
pub mod router;
pub mod source;

pub use error::{EngineError, TtsError};
pub use request::{SynthesisRequest, SynthesisRequestBuilder};

/// One unit of synthesized audio.
///
/// Contains raw f32 mono samples and the sample rate they were produced at.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    /// Raw audio samples as f32 values
    pub samples: Vec<f32>,
    /// Sample rate of the audio in Hz
    pub sample_rate: u32,
}

impl AudioChunk {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// A lazy, ordered, finite sequence of chunks. Not restartable.
pub type ChunkStream = Box<dyn Iterator<Item = Result<AudioChunk, EngineError>> + Send>;

/// Common interface for text-to-speech synthesis engines.
///
/// An engine either renders the whole request in one piece, or hands back a
/// [`ChunkStream`] that produces audio lazily as it is pulled.
pub trait SynthesisEngine {
    /// Synthesize the whole request as a single chunk.
    fn synthesize(&mut self, request: &SynthesisRequest) -> Result<AudioChunk, EngineError>;

    /// Synthesize the request as a stream of chunks.
    ///
    /// Default implementation yields the output of `synthesize()` as a
    /// one-chunk stream.
    fn synthesize_stream(&mut self, request: &SynthesisRequest) -> Result<ChunkStream, EngineError> {
        let chunk = self.synthesize(request)?;
        Ok(Box::new(std::iter::once(Ok::<_, EngineError>(chunk))))
    }
}
