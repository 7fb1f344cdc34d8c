//! Speech synthesis engines.
//!
//! This module contains [`SynthesisEngine`](crate::SynthesisEngine)
//! implementations.
//!
//! # Available Engines
//!
//! - `espeak` - drives the `espeak-ng` synthesizer process, one sentence per chunk

pub mod espeak;
