//! espeak-ng synthesis engine.
//!
//! Drives the `espeak-ng` command-line synthesizer. Text is split into
//! sentences and each sentence is rendered on demand, so a long passage starts
//! playing as soon as its first sentence is ready.
//!
//! # System Requirements
//!
//! **espeak-ng** must be installed on your system:
//! - **Linux**: `sudo apt-get install espeak-ng`
//! - **macOS**: `brew install espeak-ng`
//! - **Windows**: Download installer from <https://espeak-ng.org/download>
//!
//! # Voices
//!
//! Voice ids follow the kokoro pattern `{language}{gender}_{name}` (e.g.
//! `af_sarah`, `bm_lewis`). The gender letter picks the espeak variant (`f3`
//! or `m3`); the language comes from the request.
//!
//! # Example
//!
//! ```rust,no_run
//! use tts_cli::{catalog::StaticCatalog, SynthesisEngine, SynthesisRequest};
//! use tts_cli::engines::espeak::{EspeakConfig, EspeakEngine};
//!
//! let request = SynthesisRequest::builder()
//!     .text("Hello there. How are you?")
//!     .voice("bf_emma")
//!     .language("en-gb")
//!     .build(&StaticCatalog::builtin())?;
//!
//! let mut engine = EspeakEngine::new(EspeakConfig::default());
//! for chunk in engine.synthesize_stream(&request)? {
//!     let chunk = chunk?;
//!     println!("{} samples at {}Hz", chunk.samples.len(), chunk.sample_rate);
//! }
//! # Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
//! ```

pub mod engine;
pub mod process;
pub mod segment;

pub use engine::{EspeakConfig, EspeakEngine};
pub use process::EspeakError;
