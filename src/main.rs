// SPDX-License-Identifier: GPL-3.0-only

use camhal::backends::camera::BackendPreference;
use camhal::geometry::{Facing, PreviewGeometry, PreviewScale, Rotation, Size};
use camhal::settings::Settings;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "camhal")]
#[command(about = "Camera HAL demo running against the simulated device")]
#[command(version)]
struct Cli {
    /// JSON settings file with integration defaults
    /// (default: ~/.config/camhal/settings.json when present)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Device API to drive (overrides the settings file)
    #[arg(long, global = true, value_enum)]
    backend: Option<BackendArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Auto,
    Legacy,
    Modern,
}

impl From<BackendArg> for BackendPreference {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Auto => BackendPreference::Auto,
            BackendArg::Legacy => BackendPreference::Legacy,
            BackendArg::Modern => BackendPreference::Modern,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FacingArg {
    Back,
    Front,
    External,
}

impl From<FacingArg> for Facing {
    fn from(arg: FacingArg) -> Self {
        match arg {
            FacingArg::Back => Facing::Back,
            FacingArg::Front => Facing::Front,
            FacingArg::External => Facing::External,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ScaleArg {
    Manual,
    Fit,
    Fill,
    AutoFit,
    AutoFill,
}

impl From<ScaleArg> for PreviewScale {
    fn from(arg: ScaleArg) -> Self {
        match arg {
            ScaleArg::Manual => PreviewScale::Manual,
            ScaleArg::Fit => PreviewScale::ManualFit,
            ScaleArg::Fill => PreviewScale::ManualFill,
            ScaleArg::AutoFit => PreviewScale::AutoFit,
            ScaleArg::AutoFill => PreviewScale::AutoFill,
        }
    }
}

/// View and sensor description shared by the geometry commands
#[derive(clap::Args)]
struct GeometryArgs {
    /// View size, e.g. 1080x1920
    #[arg(long, default_value = "1080x1920")]
    view: Size,

    /// Preview buffer size, e.g. 1920x1080
    #[arg(long, default_value = "1920x1080")]
    preview: Size,

    /// Sensor mounting orientation in degrees
    #[arg(long, default_value = "90")]
    sensor: i32,

    /// Display rotation in degrees
    #[arg(long, default_value = "0")]
    rotation: i32,

    #[arg(long, value_enum, default_value = "back")]
    facing: FacingArg,

    #[arg(long, value_enum, default_value = "auto-fill")]
    scale: ScaleArg,

    /// Mirror the preview
    #[arg(long)]
    mirror: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras as JSON
    List,

    /// Take a photo
    Photo {
        /// Camera index to use (from 'camhal list')
        #[arg(short, long, default_value = "0")]
        camera: usize,

        /// Output file path (default: ~/Pictures/Camera/photo_TIMESTAMP.jpg)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretend the display is rotated by this many degrees
        #[arg(short, long)]
        rotation: Option<i32>,

        /// Zoom level 0-100
        #[arg(short, long)]
        zoom: Option<u32>,
    },

    /// Record a video
    Video {
        /// Camera index to use (from 'camhal list')
        #[arg(short, long, default_value = "0")]
        camera: usize,

        /// Recording duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,

        /// Output file path (default: ~/Videos/Camera/video_TIMESTAMP.rec)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the preview transform for a view/sensor combination
    Transform {
        #[command(flatten)]
        geometry: GeometryArgs,
    },

    /// Print the focus region for a touch
    Focus {
        #[command(flatten)]
        geometry: GeometryArgs,

        /// Touch x in view pixels
        x: f32,

        /// Touch y in view pixels
        y: f32,

        /// Active array size for the modern driver space; the legacy
        /// [-1000, 1000] space is used when omitted
        #[arg(long)]
        active_array: Option<Size>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=camhal=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    let mut settings = match cli.settings.as_deref() {
        Some(path) => Settings::load(path)?,
        None => match dirs::config_dir() {
            Some(dir) => Settings::load_or_default(&dir.join("camhal").join("settings.json"))?,
            None => Settings::default(),
        },
    };
    if let Some(backend) = cli.backend {
        settings.backend = backend.into();
    }

    match cli.command {
        Commands::List => cli::list_cameras(&settings),
        Commands::Photo {
            camera,
            output,
            rotation,
            zoom,
        } => cli::take_photo(&settings, camera, output, rotation, zoom),
        Commands::Video {
            camera,
            duration,
            output,
        } => cli::record_video(&settings, camera, duration, output),
        Commands::Transform { geometry } => cli::print_transform(&geometry.into()),
        Commands::Focus {
            geometry,
            x,
            y,
            active_array,
        } => cli::print_focus(&geometry.into(), x, y, active_array),
    }
}

impl From<GeometryArgs> for PreviewGeometry {
    fn from(args: GeometryArgs) -> Self {
        Self {
            view: args.view,
            preview: args.preview,
            device_rotation: Rotation::from_degrees_int(args.rotation),
            sensor_orientation: Rotation::from_degrees_int(args.sensor),
            facing: args.facing.into(),
            policy: args.scale.into(),
            mirror: args.mirror,
        }
    }
}
