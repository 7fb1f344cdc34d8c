use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::coordinator::{AudioBuffer, Coordinator, RunReport, StreamOptions};
use crate::encoder::Encoder;
use crate::error::TtsError;
use crate::playback::PlaybackSink;
use crate::source::ChunkSource;

pub const DEFAULT_OUTPUT: &str = "outputs/audio.wav";

/// Where the audio of one run should go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPlan {
    pub stream: bool,
    pub save: bool,
    pub output_path: PathBuf,
}

impl OutputPlan {
    pub fn new(stream: bool, save: bool, output_path: impl Into<PathBuf>) -> Self {
        Self {
            stream,
            save,
            output_path: output_path.into(),
        }
    }
}

impl Default for OutputPlan {
    fn default() -> Self {
        Self::new(true, false, DEFAULT_OUTPUT)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputSummary {
    pub played: bool,
    pub saved: bool,
    pub path: Option<PathBuf>,
    pub report: RunReport,
}

/// Sends a chunk stream to the playback sink, the encoder, or both.
pub struct OutputRouter<'a> {
    encoder: &'a dyn Encoder,
    sink: Option<&'a mut dyn PlaybackSink>,
    options: StreamOptions,
}

impl<'a> OutputRouter<'a> {
    pub fn new(encoder: &'a dyn Encoder) -> Self {
        Self {
            encoder,
            sink: None,
            options: StreamOptions::default(),
        }
    }

    pub fn with_sink(mut self, sink: &'a mut dyn PlaybackSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_options(mut self, options: StreamOptions) -> Self {
        self.options = options;
        self
    }

    /// Run `source` according to `plan`.
    ///
    /// The encoder is called at most once, after the stream has been fully
    /// consumed or cancelled. On any error nothing is written.
    pub fn route<S: ChunkSource>(
        &mut self,
        plan: &OutputPlan,
        source: S,
    ) -> Result<OutputSummary, TtsError> {
        if plan.stream && self.sink.is_none() {
            return Err(TtsError::PlaybackFailed {
                index: None,
                source: "no playback device available".into(),
            });
        }
        if !plan.stream && !plan.save {
            log::info!("Neither streaming nor saving; synthesized audio will be discarded");
        }

        let mut buffer = plan.save.then(AudioBuffer::new);
        let mut coordinator = Coordinator::new(self.options.clone());
        if plan.stream {
            if let Some(sink) = self.sink.as_deref_mut() {
                coordinator = coordinator.with_sink(sink);
            }
        }

        let report = coordinator.run(source, buffer.as_mut())?;
        if report.is_cancelled() {
            log::info!("Run cancelled after {} chunk(s)", report.chunks);
        }

        let mut summary = OutputSummary {
            played: plan.stream && report.chunks > 0,
            saved: false,
            path: None,
            report,
        };

        if let Some(buffer) = buffer {
            let Some(sample_rate) = buffer.sample_rate else {
                log::warn!(
                    "No audio was produced; not writing {}",
                    plan.output_path.display()
                );
                return Ok(summary);
            };
            ensure_parent_dir(&plan.output_path)?;
            self.encoder
                .encode(&buffer.samples, sample_rate, &plan.output_path)
                .map_err(|source| TtsError::Output {
                    path: plan.output_path.clone(),
                    source,
                })?;
            summary.saved = true;
            summary.path = Some(plan.output_path.clone());
        }

        Ok(summary)
    }
}

/// Create the directory that will hold `path`. Succeeds if it already exists.
fn ensure_parent_dir(path: &Path) -> Result<(), TtsError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .map_err(|e| TtsError::Output {
                path: parent.to_path_buf(),
                source: Box::new(e),
            }),
        _ => Ok(()),
    }
}
