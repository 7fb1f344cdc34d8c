//! The streaming playback loop.
//!
//! [`Coordinator::run`] pulls chunks one at a time, trims the leading silence
//! off every chunk after the first, and hands the result to the playback sink
//! and/or the accumulation buffer. A chunk is only requested after the previous
//! one has finished playing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use derive_builder::Builder;
use serde::Serialize;

use crate::error::TtsError;
use crate::playback::PlaybackSink;
use crate::source::{ChunkSource, Pull};

/// Seconds of lead-in dropped from every chunk after the first.
pub const LEADING_TRIM_SECS: f64 = 0.5;

/// Cooperative cancellation, checked between chunks.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Settings for one coordinated run.
#[derive(Debug, Clone, Builder)]
#[builder(default)]
pub struct StreamOptions {
    /// Leading seconds trimmed from chunks with index > 0.
    pub trim_secs: f64,
    pub cancel: CancelFlag,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            trim_secs: LEADING_TRIM_SECS,
            cancel: CancelFlag::default(),
        }
    }
}

impl StreamOptions {
    pub fn builder() -> StreamOptionsBuilder {
        StreamOptionsBuilder::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Termination {
    Completed,
    Cancelled,
}

/// What a run got through before it ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Chunks pulled, trimmed and delivered.
    pub chunks: usize,
    /// Samples delivered after trimming.
    pub samples: usize,
    pub termination: Termination,
}

impl RunReport {
    pub fn is_cancelled(&self) -> bool {
        self.termination == Termination::Cancelled
    }
}

/// Accumulates delivered audio for a single encoder write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    /// Adopted from the first chunk appended.
    pub sample_rate: Option<u32>,
}

impl AudioBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.sample_rate.is_none()
    }

    fn accepts(&self, sample_rate: u32) -> bool {
        self.sample_rate.map_or(true, |rate| rate == sample_rate)
    }

    fn append(&mut self, samples: &[f32], sample_rate: u32) {
        self.sample_rate.get_or_insert(sample_rate);
        self.samples.extend_from_slice(samples);
    }
}

/// Number of leading samples dropped from the chunk at `index`.
pub fn trim_len(index: usize, sample_rate: u32, trim_secs: f64) -> usize {
    if index == 0 {
        return 0;
    }
    (sample_rate as f64 * trim_secs).floor() as usize
}

/// Drives one synthesis stream to the sink and/or buffer.
pub struct Coordinator<'a> {
    sink: Option<&'a mut dyn PlaybackSink>,
    options: StreamOptions,
}

impl<'a> Coordinator<'a> {
    pub fn new(options: StreamOptions) -> Self {
        Self {
            sink: None,
            options,
        }
    }

    pub fn with_sink(mut self, sink: &'a mut dyn PlaybackSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Consume `source` until it ends, fails, or the run is cancelled.
    ///
    /// On error, everything before the failing chunk has already been played
    /// and/or appended to `buffer`; nothing after it is attempted.
    pub fn run<S: ChunkSource>(
        &mut self,
        mut source: S,
        mut buffer: Option<&mut AudioBuffer>,
    ) -> Result<RunReport, TtsError> {
        let mut index = 0;
        let mut delivered = 0;

        loop {
            if self.options.cancel.is_cancelled() {
                log::info!("Cancelled before chunk {index}");
                return Ok(RunReport {
                    chunks: index,
                    samples: delivered,
                    termination: Termination::Cancelled,
                });
            }

            let chunk = match source.pull() {
                Pull::Chunk(chunk) => chunk,
                Pull::End => break,
                Pull::Failed(err) => {
                    return Err(TtsError::SynthesisFailed { index, source: err });
                }
                Pull::TimedOut(timeout) => {
                    return Err(TtsError::SynthesisTimeout { index, timeout });
                }
            };

            if chunk.sample_rate == 0 {
                return Err(TtsError::SynthesisFailed {
                    index,
                    source: "engine returned a zero sample rate".into(),
                });
            }
            if let Some(buffer) = buffer.as_deref() {
                if !buffer.accepts(chunk.sample_rate) {
                    return Err(TtsError::SynthesisFailed {
                        index,
                        source: format!(
                            "sample rate changed mid-stream ({} Hz after {} Hz)",
                            chunk.sample_rate,
                            buffer.sample_rate.unwrap_or_default()
                        )
                        .into(),
                    });
                }
            }

            let skip = trim_len(index, chunk.sample_rate, self.options.trim_secs);
            let samples = &chunk.samples[skip.min(chunk.samples.len())..];
            log::debug!(
                "Chunk {index}: {:.2}s at {} Hz, {} samples trimmed",
                chunk.duration_secs(),
                chunk.sample_rate,
                chunk.samples.len() - samples.len()
            );

            if let Some(sink) = self.sink.as_mut() {
                sink.play(samples, chunk.sample_rate)
                    .map_err(|source| TtsError::PlaybackFailed {
                        index: Some(index),
                        source,
                    })?;
            }
            if let Some(buffer) = buffer.as_deref_mut() {
                buffer.append(samples, chunk.sample_rate);
            }

            delivered += samples.len();
            index += 1;
        }

        Ok(RunReport {
            chunks: index,
            samples: delivered,
            termination: Termination::Completed,
        })
    }
}
