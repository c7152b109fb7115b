use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn, Level};

use frame_sequencer::{config::Config, FrameSequencer, FrameSize};

#[derive(Parser)]
#[command(
    name = "frame-sequencer",
    version,
    about = "Turn a folder of images into a video, one image per frame",
    long_about = "Frame Sequencer reads the JPEG, PNG and BMP files in a folder, orders them by natural filename order (img2 before img10) and writes them as consecutive frames of an MP4 file."
)]
struct Cli {
    /// Folder containing the images
    input: Option<PathBuf>,

    /// Folder the video is written into (created if missing)
    output: Option<PathBuf>,

    /// Frame size as "<width>,<height>"; defaults to the first image's size
    size: Option<FrameSize>,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Frames per second
    #[arg(long)]
    fps: Option<f64>,

    /// Output file name
    #[arg(short, long)]
    name: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Layer command line values over the loaded configuration
    fn apply(self, mut config: Config) -> Config {
        match (self.input, self.output) {
            (Some(input), Some(output)) => {
                config.input.directory = input;
                config.output.directory = output;
            }
            (Some(input), None) => {
                warn!("No output folder given, using {:?}", config.output.directory);
                config.input.directory = input;
            }
            _ => warn!("No input folder given, using {:?}", config.input.directory),
        }

        if let Some(size) = self.size {
            config.video.frame_size = Some(size);
        }
        if let Some(fps) = self.fps {
            config.video.fps = fps;
        }
        if let Some(name) = self.name {
            config.output.file_name = name;
        }
        config
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    info!("Starting Frame Sequencer v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => Config::default(),
    };
    let config = cli.apply(config);

    match config.video.frame_size {
        Some(size) => info!("Converting {:?} -> {:?} at {}", config.input.directory, config.output.directory, size),
        None => info!("Converting {:?} -> {:?} at the first image's size", config.input.directory, config.output.directory),
    }

    let summary = FrameSequencer::new(config)
        .and_then(|mut sequencer| sequencer.convert())
        .map_err(|e| {
            error!("{}", e.user_message());
            anyhow::Error::new(e)
        })?;

    info!(
        "Done! {} of {} images written to {:?}",
        summary.frames_written, summary.total_entries, summary.output_path
    );
    Ok(())
}
