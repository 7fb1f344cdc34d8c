//! Pull-based chunk sources consumed by the [`Coordinator`](crate::coordinator::Coordinator).

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::EngineError;
use crate::AudioChunk;

/// Outcome of asking a source for its next chunk.
#[derive(Debug)]
pub enum Pull {
    Chunk(AudioChunk),
    Failed(EngineError),
    TimedOut(Duration),
    End,
}

/// A lazy, finite, ordered producer of audio chunks.
///
/// `pull` is only called after the previous chunk has been fully delivered,
/// so implementations never need to buffer ahead.
pub trait ChunkSource {
    fn pull(&mut self) -> Pull;
}

impl<I> ChunkSource for I
where
    I: Iterator<Item = Result<AudioChunk, EngineError>>,
{
    fn pull(&mut self) -> Pull {
        match self.next() {
            Some(Ok(chunk)) => Pull::Chunk(chunk),
            Some(Err(e)) => Pull::Failed(e),
            None => Pull::End,
        }
    }
}

/// Runs a producer on a worker thread and bounds every pull by `timeout`.
///
/// The worker produces one chunk per request over a rendezvous channel, so it
/// never runs ahead of the consumer. Once a pull times out the source is spent:
/// the worker is detached and every later pull returns [`Pull::End`].
pub struct TimedSource {
    requests: Option<SyncSender<()>>,
    replies: Receiver<Option<Result<AudioChunk, EngineError>>>,
    worker: Option<JoinHandle<()>>,
    timeout: Duration,
}

impl TimedSource {
    pub fn spawn<I>(producer: I, timeout: Duration) -> Self
    where
        I: Iterator<Item = Result<AudioChunk, EngineError>> + Send + 'static,
    {
        let (request_tx, request_rx) = mpsc::sync_channel::<()>(0);
        let (reply_tx, reply_rx) = mpsc::sync_channel(1);

        let worker = thread::spawn(move || {
            let mut producer = producer;
            while request_rx.recv().is_ok() {
                let item = producer.next();
                let done = item.is_none();
                if reply_tx.send(item).is_err() || done {
                    break;
                }
            }
        });

        Self {
            requests: Some(request_tx),
            replies: reply_rx,
            worker: Some(worker),
            timeout,
        }
    }

    fn stop(&mut self) {
        self.requests = None;
    }
}

impl ChunkSource for TimedSource {
    fn pull(&mut self) -> Pull {
        let Some(requests) = self.requests.as_ref() else {
            return Pull::End;
        };
        if requests.send(()).is_err() {
            self.stop();
            return Pull::End;
        }

        match self.replies.recv_timeout(self.timeout) {
            Ok(Some(Ok(chunk))) => Pull::Chunk(chunk),
            Ok(Some(Err(e))) => Pull::Failed(e),
            Ok(None) | Err(RecvTimeoutError::Disconnected) => {
                self.stop();
                Pull::End
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!("No chunk within {:?}, abandoning producer", self.timeout);
                self.stop();
                // The worker may be blocked inside the engine; let it finish on its own.
                self.worker = None;
                Pull::TimedOut(self.timeout)
            }
        }
    }
}

impl Drop for TimedSource {
    fn drop(&mut self) {
        self.stop();
        if let Some(worker) = self.worker.take() {
            if worker.is_finished() {
                let _ = worker.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(n: usize) -> Result<AudioChunk, EngineError> {
        Ok(AudioChunk::new(vec![0.0; n], 8000))
    }

    #[test]
    fn iterator_source_maps_items() {
        let mut source = vec![chunk(3), Err("boom".into())].into_iter();
        assert!(matches!(source.pull(), Pull::Chunk(c) if c.samples.len() == 3));
        assert!(matches!(source.pull(), Pull::Failed(e) if e.to_string() == "boom"));
        assert!(matches!(source.pull(), Pull::End));
    }

    #[test]
    fn timed_source_passes_chunks_through_in_order() {
        let mut source = TimedSource::spawn(
            vec![chunk(1), chunk(2), chunk(3)].into_iter(),
            Duration::from_secs(5),
        );
        for expected in 1..=3 {
            match source.pull() {
                Pull::Chunk(c) => assert_eq!(c.samples.len(), expected),
                other => panic!("unexpected pull: {other:?}"),
            }
        }
        assert!(matches!(source.pull(), Pull::End));
        assert!(matches!(source.pull(), Pull::End));
    }

    #[test]
    fn timed_source_reports_stalled_producer() {
        let slow = (0..2).map(|i| {
            if i == 1 {
                thread::sleep(Duration::from_millis(500));
            }
            chunk(4)
        });
        let mut source = TimedSource::spawn(slow, Duration::from_millis(50));
        assert!(matches!(source.pull(), Pull::Chunk(_)));
        assert!(matches!(source.pull(), Pull::TimedOut(t) if t == Duration::from_millis(50)));
        assert!(matches!(source.pull(), Pull::End));
    }

    #[test]
    fn timed_source_produces_only_on_demand() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let produced = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&produced);
        let producer = (0..10).map(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            chunk(1)
        });

        let mut source = TimedSource::spawn(producer, Duration::from_secs(5));
        assert!(matches!(source.pull(), Pull::Chunk(_)));
        thread::sleep(Duration::from_millis(50));
        assert_eq!(produced.load(Ordering::SeqCst), 1);
    }
}
