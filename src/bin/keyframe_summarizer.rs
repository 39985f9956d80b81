use std::path::Path;
use std::sync::atomic::Ordering;

use clap::Parser;
use log::{debug, warn};

use video_keyframe_summarizer::detector::FastBriefExtractor;
use video_keyframe_summarizer::engine::EngineConfig;
use video_keyframe_summarizer::error::Result;
use video_keyframe_summarizer::frame_source::ImageSequenceSource;
use video_keyframe_summarizer::io::{self, ImageDirSink, RunReport};
use video_keyframe_summarizer::matcher::MatcherKind;
use video_keyframe_summarizer::stream::{StreamConfig, StreamController};

#[derive(Parser)]
#[command(version, about, author)]
struct VkfsCli {
    /// path to input frame folder
    input: String,

    /// output folder path
    #[arg(short, long, default_value = "./output/")]
    output: String,

    /// sensitivity threshold
    #[arg(short, long, default_value_t = 0.4)]
    sensitivity: f64,

    /// noise threshold
    #[arg(short, long, default_value_t = 0.8)]
    noise: f64,

    /// matches distance threshold
    #[arg(short, long, default_value_t = 0.2)]
    distance: f32,

    /// interval for average matches count
    #[arg(short = 't', long, default_value_t = 30)]
    interval: usize,

    /// distance between two processed frames
    #[arg(short = 'e', long, default_value_t = 3)]
    step: usize,

    /// descriptor matching strategy
    #[arg(long, value_enum, default_value = "exact")]
    matcher: MatcherKind,

    /// FAST corner threshold
    #[arg(long, default_value_t = 20)]
    fast_threshold: u8,

    /// keep at most this many keypoints per frame
    #[arg(long, default_value_t = 500)]
    max_features: usize,

    /// file extension for saved keyframes
    #[arg(long, default_value = "jpg")]
    image_ext: String,

    /// print internal values
    #[arg(short, long)]
    verbose: bool,
}

fn run(cli: VkfsCli) -> Result<()> {
    let config = StreamConfig {
        engine: EngineConfig {
            sensitivity_threshold: cli.sensitivity,
            noise_threshold: cli.noise,
            distance_threshold: cli.distance,
            window_len: cli.interval,
        },
        frame_step: cli.step,
        progress: !cli.verbose,
    };
    debug!("operating with: {config:?}, matcher {:?}", cli.matcher);

    let source = ImageSequenceSource::open(&cli.input)?;
    debug!("{} frames queued from {}", source.remaining(), cli.input);
    let sink = ImageDirSink::create(&cli.output, &cli.image_ext)?;
    let extractor = FastBriefExtractor::new(cli.fast_threshold, cli.max_features);

    let mut controller = StreamController::new(
        config,
        Box::new(source),
        Box::new(extractor),
        cli.matcher.create(),
        Box::new(sink),
    )?;

    let cancel = controller.cancel_flag();
    if let Err(e) = ctrlc::set_handler(move || cancel.store(true, Ordering::SeqCst)) {
        warn!("ctrl-c handler not installed: {e}");
    }

    println!("Processing ...");
    let summary = controller.run()?;

    let report = RunReport {
        input: cli.input,
        frame_step: cli.step,
        window_len: cli.interval,
        sensitivity_threshold: cli.sensitivity,
        noise_threshold: cli.noise,
        distance_threshold: cli.distance,
        frames_seen: summary.frames_seen,
        frames_evaluated: summary.frames_evaluated,
        keyframes: summary.keyframes.clone(),
        keyframes_saved: summary.keyframes_saved,
    };
    io::write_report(Path::new(&cli.output).join("summary.json"), &report)?;

    println!(
        "Done. {} keyframes saved from {} frames ({} evaluated).",
        summary.keyframes_saved, summary.frames_seen, summary.frames_evaluated
    );
    Ok(())
}

fn main() {
    let cli = VkfsCli::parse();
    env_logger::Builder::from_default_env()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .init();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
