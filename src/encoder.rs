use std::io::BufWriter;
use std::path::Path;

/// Error returned by an [`Encoder`].
pub type EncodeError = Box<dyn std::error::Error + Send + Sync>;

/// Writes one complete PCM buffer to a container file.
pub trait Encoder {
    fn encode(&self, samples: &[f32], sample_rate: u32, path: &Path) -> Result<(), EncodeError>;
}

/// Writes 32-bit float mono WAV files.
///
/// Audio goes to a temporary file next to `path` which is renamed into place
/// once the header is finalized, so readers never see a partial file.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavEncoder;

impl Encoder for WavEncoder {
    fn encode(&self, samples: &[f32], sample_rate: u32, path: &Path) -> Result<(), EncodeError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::Builder::new()
            .prefix(".tts-")
            .suffix(".wav.part")
            .tempfile_in(dir)?;

        {
            let mut writer = hound::WavWriter::new(BufWriter::new(tmp.as_file_mut()), spec)?;
            for &sample in samples {
                writer.write_sample(sample)?;
            }
            writer.finalize()?;
        }

        tmp.persist(path).map_err(|e| e.error)?;
        log::debug!(
            "Wrote {} samples at {} Hz to {}",
            samples.len(),
            sample_rate,
            path.display()
        );
        Ok(())
    }
}
