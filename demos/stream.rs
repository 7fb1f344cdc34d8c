use std::path::PathBuf;
use std::time::Instant;

use tts_cli::{
    catalog::StaticCatalog,
    encoder::WavEncoder,
    engines::espeak::{EspeakConfig, EspeakEngine},
    router::{OutputPlan, OutputRouter},
    SynthesisEngine, SynthesisRequest,
};

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    let text = "We've just been hearing from a senior meteorologist. \
                Kansas City is seeing its heaviest snow in 32 years. \
                Temperatures are set to drop in the next several days. \
                There is a special alert for Kansas, urging people not to leave their homes.";

    let request = SynthesisRequest::builder()
        .text(text)
        .voice("af_nicole")
        .build(&StaticCatalog::builtin())?;

    let mut engine = EspeakEngine::new(EspeakConfig::default());
    let chunks = engine.synthesize_stream(&request)?;

    let plan = OutputPlan::new(false, true, PathBuf::from("output.wav"));
    let start = Instant::now();
    let summary = OutputRouter::new(&WavEncoder).route(&plan, chunks)?;

    println!(
        "Synthesized {} chunk(s), {} samples in {:.2?}",
        summary.report.chunks,
        summary.report.samples,
        start.elapsed()
    );
    println!("Saved to output.wav");
    Ok(())
}
