use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use emotion_core::analysis::infrastructure::analyzer_args::AnalyzerArgs;
use emotion_core::analysis::infrastructure::analyzer_factory::create_analyzer;
use emotion_core::capture::domain::frame_source::FrameSource;
use emotion_core::capture::infrastructure::image_file_source::ImageFileSource;
use emotion_core::persistence::infrastructure::image_file_writer::ImageFileWriter;
use emotion_core::pipeline::capture_emotion_use_case::{AnalysisOutcome, CaptureEmotionUseCase};
use emotion_core::pipeline::emotion_invoker::EmotionInvoker;
use emotion_core::shared::constants::{
    DEFAULT_CAMERA_DEVICE, DEFAULT_CAPTURE_FILENAME, IMAGE_EXTENSIONS,
};

/// Exit status when the source produced no frame.
const EXIT_NO_FRAME: i32 = 2;

/// Capture one frame, report its dominant emotion and save it.
#[derive(Parser)]
#[command(name = "emotion-capture")]
struct Cli {
    /// Where to save the captured frame (overwritten).
    #[arg(short, long, default_value = DEFAULT_CAPTURE_FILENAME)]
    output: PathBuf,

    /// Camera device to capture from.
    #[arg(long, default_value = DEFAULT_CAMERA_DEVICE)]
    device: PathBuf,

    /// Requested capture width.
    #[arg(long, default_value = "640")]
    width: u32,

    /// Requested capture height.
    #[arg(long, default_value = "480")]
    height: u32,

    /// Analyse an existing image instead of capturing from the camera.
    #[arg(long)]
    input: Option<PathBuf>,

    #[command(flatten)]
    analyzer: AnalyzerArgs,
}

fn main() {
    env_logger::init();

    match run() {
        Ok(Some(outcome)) => print_outcome(&outcome),
        Ok(None) => {
            eprintln!("No frame captured");
            process::exit(EXIT_NO_FRAME);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run() -> Result<Option<AnalysisOutcome>, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let mut source = open_source(&cli)?;
    source.open()?;

    let analyzer = create_analyzer(&cli.analyzer.backend(), Some(download_progress))?;
    let invoker = EmotionInvoker::new(
        analyzer,
        cli.analyzer.options(),
        cli.analyzer.face_selection,
    );

    let mut use_case = CaptureEmotionUseCase::new(source, Box::new(ImageFileWriter::new()), invoker);
    let outcome = use_case.execute(Some(&cli.output));
    use_case.release();
    Ok(outcome)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    cli.analyzer.validate()?;
    if let Some(input) = &cli.input {
        if !input.exists() {
            return Err(format!("Input file not found: {}", input.display()).into());
        }
        if !is_image(input) {
            return Err(format!("Unsupported image format: {}", input.display()).into());
        }
    }
    if cli.width == 0 || cli.height == 0 {
        return Err(format!(
            "Capture size must be non-zero, got {}x{}",
            cli.width, cli.height
        )
        .into());
    }
    Ok(())
}

fn open_source(cli: &Cli) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error>> {
    if let Some(input) = &cli.input {
        return Ok(Box::new(ImageFileSource::new(input.clone())));
    }
    camera_source(cli)
}

#[cfg(all(feature = "v4l2", target_os = "linux"))]
fn camera_source(cli: &Cli) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error>> {
    use emotion_core::capture::infrastructure::v4l2_camera::{CameraConfig, V4l2Camera};

    Ok(Box::new(V4l2Camera::new(CameraConfig {
        device: cli.device.clone(),
        width: cli.width,
        height: cli.height,
    })))
}

#[cfg(not(all(feature = "v4l2", target_os = "linux")))]
fn camera_source(cli: &Cli) -> Result<Box<dyn FrameSource>, Box<dyn std::error::Error>> {
    Err(format!(
        "Camera capture from {} is not available in this build; use --input",
        cli.device.display()
    )
    .into())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn print_outcome(outcome: &AnalysisOutcome) {
    match &outcome.emotion {
        Some(emotion) => println!("emotion: {emotion}"),
        None => println!("emotion: none"),
    }
    match &outcome.saved_path {
        Some(path) => println!("saved: {}", path.display()),
        None => println!("saved: none"),
    }
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading model... {pct}%");
    } else {
        eprint!("\rDownloading model... {downloaded} bytes");
    }
    if total > 0 && downloaded >= total {
        eprintln!();
    }
}
