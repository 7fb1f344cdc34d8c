use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::AudioChunk;

#[derive(thiserror::Error, Debug)]
pub enum EspeakError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WAV decode error: {0}")]
    Wav(#[from] hound::Error),
    #[error(
        "espeak-ng not found at '{}'. Install: Linux: `sudo apt-get install espeak-ng`, \
         macOS: `brew install espeak-ng`, Windows: https://espeak-ng.org/download",
        .0.display()
    )]
    NotFound(PathBuf),
    #[error("espeak-ng failed: {0}")]
    Failed(String),
}

/// One espeak-ng invocation.
pub struct Invocation<'a> {
    pub bin: &'a Path,
    /// Directory that contains `espeak-ng-data`.
    pub data_root: Option<&'a Path>,
    pub voice: &'a str,
    pub words_per_minute: u32,
}

impl Invocation<'_> {
    /// Render `text` to audio.
    ///
    /// espeak-ng writes into a temporary WAV file rather than stdout, because
    /// it can only fill in the RIFF length fields on a seekable output.
    pub fn render(&self, text: &str) -> Result<AudioChunk, EspeakError> {
        let wav = tempfile::Builder::new()
            .prefix("tts-espeak-")
            .suffix(".wav")
            .tempfile()?;

        let mut command = Command::new(self.bin);
        command
            .args(["-b", "1", "--stdin", "-v", self.voice])
            .arg("-s")
            .arg(self.words_per_minute.to_string())
            .arg("-w")
            .arg(wav.path());
        if let Some(root) = self.data_root {
            command.arg(format!("--path={}", root.display()));
        }
        // Keep a terminal Ctrl-C away from the child so the chunk in flight
        // completes and the caller can stop at the next chunk boundary.
        #[cfg(unix)]
        std::os::unix::process::CommandExt::process_group(&mut command, 0);

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EspeakError::NotFound(self.bin.to_path_buf())
                } else {
                    EspeakError::Io(e)
                }
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(canonicalize_stdin_payload(text).as_bytes()) {
                drop(stdin);
                let _ = child.kill();
                let _ = child.wait();
                return Err(e.into());
            }
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EspeakError::Failed(format!(
                "exited with code {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        decode_wav(wav.path())
    }
}

/// espeak-ng reads stdin line by line; an unterminated last line can lose its
/// final token.
fn canonicalize_stdin_payload(input: &str) -> Cow<'_, str> {
    if input.ends_with('\n') {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(format!("{input}\n"))
    }
}

/// Read a WAV file as mono f32 samples in `[-1.0, 1.0]`.
///
/// Multi-channel audio is averaged down to one channel.
pub fn decode_wav(path: &Path) -> Result<AudioChunk, EspeakError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()?
        }
    };

    let channels = spec.channels.max(1) as usize;
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    Ok(AudioChunk::new(samples, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_i16_wav(path: &Path, channels: u16, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn appends_trailing_newline_for_stdin() {
        assert_eq!(canonicalize_stdin_payload("America"), "America\n");
        assert_eq!(canonicalize_stdin_payload("America\n"), "America\n");
    }

    #[test]
    fn decodes_int_wav_to_unit_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_i16_wav(&path, 1, &[0, 16384, -32768]);

        let chunk = decode_wav(&path).unwrap();
        assert_eq!(chunk.sample_rate, 22050);
        assert_eq!(chunk.samples, vec![0.0, 0.5, -1.0]);
    }

    #[test]
    fn downmixes_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_i16_wav(&path, 2, &[16384, 0, -16384, -16384]);

        let chunk = decode_wav(&path).unwrap();
        assert_eq!(chunk.samples, vec![0.25, -0.5]);
    }

    /// Fake espeak-ng that records `pid pgrp` into `record` and copies
    /// `fixture` to the `-w` path.
    #[cfg(target_os = "linux")]
    fn fake_espeak(dir: &Path, fixture: &Path, record: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = format!(
            "#!/bin/sh\n\
             while [ $# -gt 0 ]; do\n\
               if [ \"$1\" = \"-w\" ]; then out=\"$2\"; fi\n\
               shift\n\
             done\n\
             cat > /dev/null\n\
             echo \"$$ $(sed 's/.*) //' /proc/$$/stat | cut -d' ' -f3)\" > '{}'\n\
             cp '{}' \"$out\"\n",
            record.display(),
            fixture.display()
        );
        let bin = dir.join("espeak-ng");
        std::fs::write(&bin, script).unwrap();
        std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();
        bin
    }

    #[cfg(target_os = "linux")]
    fn own_process_group() -> String {
        let stat = std::fs::read_to_string("/proc/self/stat").unwrap();
        let (_, rest) = stat.rsplit_once(") ").unwrap();
        rest.split_whitespace().nth(2).unwrap().to_string()
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn child_runs_in_its_own_process_group() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = dir.path().join("fixture.wav");
        let record = dir.path().join("pgrp");
        write_i16_wav(&fixture, 1, &[0, 16384]);
        let bin = fake_espeak(dir.path(), &fixture, &record);

        let invocation = Invocation {
            bin: &bin,
            data_root: None,
            voice: "en-us+f3",
            words_per_minute: 175,
        };
        let chunk = invocation.render("Hello").unwrap();
        assert_eq!(chunk.samples, vec![0.0, 0.5]);

        let recorded = std::fs::read_to_string(&record).unwrap();
        let mut fields = recorded.split_whitespace();
        let pid = fields.next().unwrap();
        let pgrp = fields.next().unwrap();
        assert_eq!(pid, pgrp, "child should lead its own process group");
        assert_ne!(pgrp, own_process_group());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn child_that_ignores_stdin_is_reported_as_io_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("espeak-ng");
        std::fs::write(&bin, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();

        let invocation = Invocation {
            bin: &bin,
            data_root: None,
            voice: "en-us+f3",
            words_per_minute: 175,
        };
        let text = "word ".repeat(1 << 20);
        let err = invocation.render(&text).unwrap_err();
        assert!(matches!(err, EspeakError::Io(_)));
    }

    #[test]
    fn missing_binary_is_reported() {
        let invocation = Invocation {
            bin: Path::new("/nonexistent/espeak-ng"),
            data_root: None,
            voice: "en-us+f3",
            words_per_minute: 175,
        };
        let err = invocation.render("Hello").unwrap_err();
        assert!(matches!(err, EspeakError::NotFound(_)));
    }
}
