use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use tts_cli::catalog::{JsonCatalog, StaticCatalog, VoiceCatalog};
use tts_cli::coordinator::{CancelFlag, StreamOptions};
use tts_cli::encoder::WavEncoder;
use tts_cli::engines::espeak::{EspeakConfig, EspeakEngine};
use tts_cli::playback::PlaybackSink;
use tts_cli::prereq::{self, Artifact};
use tts_cli::request::{DEFAULT_LANG, DEFAULT_VOICE};
use tts_cli::router::{OutputPlan, OutputRouter, OutputSummary, DEFAULT_OUTPUT};
use tts_cli::source::TimedSource;
use tts_cli::{ChunkStream, SynthesisEngine, SynthesisRequest, TtsError};

const DEFAULT_TEXT: &str = "Hey there! I hope you're doing well!";
const DEFAULT_VOICES: &str = "voices.json";
const DEFAULT_MODEL: &str = "espeak-ng-data";

#[derive(Debug, Parser)]
#[command(name = "tts")]
#[command(about = "Generate speech from text and play it, save it, or both")]
struct Args {
    /// Text to be converted to speech
    #[arg(long, default_value = DEFAULT_TEXT)]
    text: String,
    /// Voice to be used for speech generation
    #[arg(long, default_value = DEFAULT_VOICE)]
    voice: String,
    /// Speed of the generated speech
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    speed: f32,
    /// Language of the generated speech
    #[arg(long, default_value = DEFAULT_LANG)]
    lang: String,
    /// Output file for the generated audio
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,
    /// Play audio as it is generated (on by default)
    #[arg(long, overrides_with = "no_stream")]
    stream: bool,
    /// Do not play audio
    #[arg(long, overrides_with = "stream")]
    no_stream: bool,
    /// Save the generated audio to --output
    #[arg(long)]
    save: bool,
    /// List all available voices
    #[arg(long)]
    list_voices: bool,
    /// Voice metadata file (JSON object keyed by voice id)
    #[arg(long, default_value = DEFAULT_VOICES)]
    voices: PathBuf,
    /// espeak-ng data directory
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: PathBuf,
    /// espeak-ng binary (defaults to espeak-ng on PATH)
    #[arg(long)]
    espeak_bin: Option<PathBuf>,
    /// Synthesize the whole text as a single chunk
    #[arg(long)]
    no_chunking: bool,
    /// Give up if a chunk takes longer than this many seconds to synthesize
    #[arg(long, value_parser = parse_timeout)]
    chunk_timeout: Option<Duration>,
    /// Accept empty --text
    #[arg(long)]
    allow_empty_text: bool,
}

impl Args {
    fn plan(&self) -> OutputPlan {
        let stream = self.stream || !self.no_stream;
        OutputPlan::new(stream, self.save, &self.output)
    }
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    let secs: f64 = value
        .parse()
        .map_err(|e| format!("invalid number of seconds: {e}"))?;
    if !(secs.is_finite() && secs > 0.0) {
        return Err("timeout must be a positive number of seconds".to_string());
    }
    Ok(Duration::from_secs_f64(secs))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            if let Some(index) = e.chunk_index() {
                log::debug!("Run stopped at chunk {index}; no audio was saved");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), TtsError> {
    if args.list_voices {
        let catalog = listing_catalog(&args.voices)?;
        println!("Available voices:");
        for voice in catalog.voices() {
            println!("{voice}");
        }
        return Ok(());
    }

    prereq::check(&[
        Artifact::dir("model data", &args.model),
        Artifact::file("voice metadata", &args.voices),
    ])?;
    let catalog = JsonCatalog::load(&args.voices)?;

    let request = SynthesisRequest::builder()
        .text(args.text.as_str())
        .voice(args.voice.as_str())
        .speed(args.speed)
        .language(args.lang.as_str())
        .build_with(&catalog, args.allow_empty_text)?;

    let plan = args.plan();
    let summary = synthesize(args, &request, &plan)?;

    if summary.played {
        log::info!("Audio successfully played");
    }
    if let Some(path) = &summary.path {
        log::info!("Audio saved to {}", path.display());
    }
    if summary.report.is_cancelled() {
        log::info!(
            "Playback cancelled after {} chunk(s)",
            summary.report.chunks
        );
    }
    if let Ok(json) = serde_json::to_string(&summary) {
        log::debug!("Summary: {json}");
    }
    Ok(())
}

/// The catalog shown by `--list-voices`: the metadata file if present,
/// otherwise the builtin voices.
fn listing_catalog(voices: &Path) -> Result<Box<dyn VoiceCatalog>, TtsError> {
    if voices.is_file() {
        Ok(Box::new(JsonCatalog::load(voices)?))
    } else {
        Ok(Box::new(StaticCatalog::builtin()))
    }
}

fn synthesize(
    args: &Args,
    request: &SynthesisRequest,
    plan: &OutputPlan,
) -> Result<OutputSummary, TtsError> {
    let cancel = CancelFlag::new();
    let handler_flag = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_flag.cancel()) {
        log::warn!("Could not install Ctrl-C handler: {e}");
    }

    let engine = EspeakEngine::new(EspeakConfig {
        bin_path: args.espeak_bin.clone(),
        data_path: Some(args.model.clone()),
    });
    let chunks = chunk_stream(engine, request, args.no_chunking)?;

    let mut sink = if plan.stream {
        Some(open_sink()?)
    } else {
        None
    };

    let encoder = WavEncoder;
    let mut router = OutputRouter::new(&encoder).with_options(StreamOptions {
        cancel,
        ..StreamOptions::default()
    });
    if let Some(sink) = sink.as_deref_mut() {
        router = router.with_sink(sink);
    }

    match args.chunk_timeout {
        Some(timeout) => router.route(plan, TimedSource::spawn(chunks, timeout)),
        None => router.route(plan, chunks),
    }
}

/// Chunks for `request`. Without chunking the whole text becomes one lazily
/// rendered chunk, so it still runs under the per-chunk timeout and only
/// after the sink is open.
fn chunk_stream<E>(
    mut engine: E,
    request: &SynthesisRequest,
    no_chunking: bool,
) -> Result<ChunkStream, TtsError>
where
    E: SynthesisEngine + Send + 'static,
{
    if no_chunking {
        let request = request.clone();
        return Ok(Box::new(std::iter::once_with(move || {
            engine.synthesize(&request)
        })));
    }
    engine
        .synthesize_stream(request)
        .map_err(|source| TtsError::SynthesisFailed { index: 0, source })
}

#[cfg(feature = "playback")]
fn open_sink() -> Result<Box<dyn PlaybackSink>, TtsError> {
    let sink = tts_cli::playback::DeviceSink::open_default()
        .map_err(|source| TtsError::PlaybackFailed { index: None, source })?;
    Ok(Box::new(sink))
}

#[cfg(not(feature = "playback"))]
fn open_sink() -> Result<Box<dyn PlaybackSink>, TtsError> {
    Err(TtsError::PlaybackFailed {
        index: None,
        source: "built without the `playback` feature; use --no-stream --save".into(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tts_cli::{AudioChunk, EngineError};

    use super::*;

    #[test]
    fn defaults_stream_and_do_not_save() {
        let args = Args::parse_from(["tts"]);
        let plan = args.plan();
        assert!(plan.stream);
        assert!(!plan.save);
        assert_eq!(plan.output_path, PathBuf::from("outputs/audio.wav"));
        assert_eq!(args.voice, "af_sarah");
        assert_eq!(args.lang, "en-us");
        assert_eq!(args.speed, 1.0);
        assert_eq!(args.text, DEFAULT_TEXT);
    }

    #[test]
    fn last_stream_flag_wins() {
        let plan = Args::parse_from(["tts", "--stream", "--no-stream", "--save"]).plan();
        assert!(!plan.stream);
        assert!(plan.save);

        let plan = Args::parse_from(["tts", "--no-stream", "--stream"]).plan();
        assert!(plan.stream);
    }

    #[test]
    fn parses_timeout_seconds() {
        let args = Args::parse_from(["tts", "--chunk-timeout", "2.5"]);
        assert_eq!(args.chunk_timeout, Some(Duration::from_millis(2500)));
        assert!(Args::try_parse_from(["tts", "--chunk-timeout", "0"]).is_err());
        assert!(Args::try_parse_from(["tts", "--chunk-timeout", "soon"]).is_err());
    }

    #[test]
    fn list_voices_skips_prerequisites_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let voices = dir.path().join("voices.json");
        let args = Args::parse_from([
            "tts",
            "--list-voices",
            "--voice",
            "nobody",
            "--model",
            dir.path().join("missing").to_str().unwrap(),
            "--voices",
            voices.to_str().unwrap(),
        ]);

        run(&args).unwrap();
        run(&args).unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn unknown_voice_is_rejected_before_synthesis() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("espeak-ng-data");
        let voices = dir.path().join("voices.json");
        std::fs::create_dir(&model).unwrap();
        std::fs::write(&voices, r#"{"af_sarah": {}}"#).unwrap();

        let args = Args::parse_from([
            "tts",
            "--voice",
            "zz_nobody",
            "--espeak-bin",
            "/nonexistent/espeak-ng",
            "--model",
            model.to_str().unwrap(),
            "--voices",
            voices.to_str().unwrap(),
        ]);

        let err = run(&args).unwrap_err();
        assert!(matches!(err, TtsError::InvalidRequest(ref v) if v.fields() == vec!["voice"]));
    }

    struct SlowEngine {
        calls: Arc<AtomicUsize>,
        delay: Duration,
    }

    impl SynthesisEngine for SlowEngine {
        fn synthesize(&mut self, _request: &SynthesisRequest) -> Result<AudioChunk, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            Ok(AudioChunk::new(vec![0.25; 100], 24000))
        }
    }

    fn sample_request() -> SynthesisRequest {
        SynthesisRequest::builder()
            .text("One. Two. Three.")
            .build(&StaticCatalog::builtin())
            .unwrap()
    }

    #[test]
    fn unchunked_synthesis_waits_for_the_first_pull() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = SlowEngine {
            calls: calls.clone(),
            delay: Duration::ZERO,
        };
        let mut chunks = chunk_stream(engine, &sample_request(), true).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let chunk = chunks.next().unwrap().unwrap();
        assert_eq!(chunk.samples.len(), 100);
        assert!(chunks.next().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unchunked_synthesis_honours_chunk_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("audio.wav");
        let engine = SlowEngine {
            calls: Arc::new(AtomicUsize::new(0)),
            delay: Duration::from_secs(2),
        };
        let chunks = chunk_stream(engine, &sample_request(), true).unwrap();

        let err = OutputRouter::new(&WavEncoder)
            .route(
                &OutputPlan::new(false, true, &path),
                TimedSource::spawn(chunks, Duration::from_millis(50)),
            )
            .unwrap_err();

        assert!(matches!(err, TtsError::SynthesisTimeout { index: 0, .. }));
        assert!(!path.exists());
    }

    #[test]
    fn missing_artifacts_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args::parse_from([
            "tts",
            "--model",
            dir.path().join("espeak-ng-data").to_str().unwrap(),
        ]);
        let err = run(&args).unwrap_err();
        assert!(matches!(err, TtsError::MissingPrerequisite { .. }));
    }
}
