//! Playback sinks.
//!
//! A sink plays one buffer at a time and blocks until the device has finished
//! with it. The [`Coordinator`](crate::coordinator::Coordinator) relies on that
//! to keep synthesis and playback from overlapping.

use crate::error::PlaybackError;

/// Blocking real-time audio output.
pub trait PlaybackSink {
    /// Play mono f32 `samples` at `sample_rate` and return once playback ends.
    ///
    /// An empty slice is a no-op and must return `Ok(())`.
    fn play(&mut self, samples: &[f32], sample_rate: u32) -> Result<(), PlaybackError>;
}

impl<S: PlaybackSink + ?Sized> PlaybackSink for &mut S {
    fn play(&mut self, samples: &[f32], sample_rate: u32) -> Result<(), PlaybackError> {
        (**self).play(samples, sample_rate)
    }
}

impl<S: PlaybackSink + ?Sized> PlaybackSink for Box<S> {
    fn play(&mut self, samples: &[f32], sample_rate: u32) -> Result<(), PlaybackError> {
        (**self).play(samples, sample_rate)
    }
}

#[cfg(feature = "playback")]
pub use device::DeviceSink;

#[cfg(feature = "playback")]
mod device {
    use rodio::buffer::SamplesBuffer;
    use rodio::{OutputStream, OutputStreamBuilder, Sink};

    use super::PlaybackSink;
    use crate::error::PlaybackError;

    /// Plays through the system's default output device via rodio.
    ///
    /// The output stream is opened once and held for the whole run.
    pub struct DeviceSink {
        // Dropping the stream closes the device, so it must outlive `sink`.
        _stream: OutputStream,
        sink: Sink,
    }

    impl DeviceSink {
        pub fn open_default() -> Result<Self, PlaybackError> {
            let mut stream = OutputStreamBuilder::open_default_stream()
                .map_err(|e| format!("audio device initialization failed: {e}"))?;
            stream.log_on_drop(false);
            let sink = Sink::connect_new(stream.mixer());
            log::debug!("Opened default audio output device");
            Ok(Self {
                _stream: stream,
                sink,
            })
        }
    }

    impl PlaybackSink for DeviceSink {
        fn play(&mut self, samples: &[f32], sample_rate: u32) -> Result<(), PlaybackError> {
            if samples.is_empty() {
                return Ok(());
            }
            if sample_rate == 0 {
                return Err("sample rate must be positive".into());
            }

            self.sink
                .append(SamplesBuffer::new(1, sample_rate, samples.to_vec()));
            self.sink.sleep_until_end();
            Ok(())
        }
    }
}
