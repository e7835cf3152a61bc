//! filekit: PDF, image and video tools on the command line

mod files;
mod image;
mod pdf;
mod video;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "filekit")]
#[command(version, about = "Local PDF and image transforms, plus remote video downloads")]
struct Cli {
    /// Directory results are written to
    #[arg(short, long, global = true, default_value = ".")]
    out_dir: PathBuf,

    /// TOML file with video service settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Video service base URL, overriding the config file
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Concatenate PDFs in the order given; a single file is copied
    Merge {
        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,
    },
    /// Write one PDF per page range
    Split {
        file: PathBuf,
        /// 1-based ranges, one output each, e.g. "1-3, 5"
        #[arg(short, long)]
        ranges: String,
    },
    /// Rotate every page clockwise by 90, 180 or 270 degrees
    Rotate {
        file: PathBuf,
        #[arg(short, long, default_value_t = 90)]
        degrees: i64,
    },
    /// Remove pages
    Delete {
        file: PathBuf,
        /// 1-based pages, e.g. "2, 4-6"
        #[arg(short, long)]
        pages: String,
    },
    /// Draw a line of text on one page
    AddText {
        file: PathBuf,
        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        text: String,
        /// Points from the left edge
        #[arg(short, long)]
        x: f32,
        /// Points from the top edge
        #[arg(short, long)]
        y: f32,
        #[arg(long, default_value_t = pdfkit_core::DEFAULT_TEXT_SIZE)]
        size: f32,
    },
    /// Re-save a PDF with compressed object streams
    Compress { file: PathBuf },
    /// Print page sizes and rotations as JSON
    Inspect { file: PathBuf },
    /// One page per PNG, JPEG or WebP image
    ImagesToPdf {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Run a JSON-encoded PDF command and print the result as JSON
    Run { command: PathBuf },
    /// Remove a rectangle drawn on the image preview
    Unwatermark(image::UnwatermarkArgs),
    /// Apply the same source-pixel region to many images
    Batch(image::BatchArgs),
    /// Re-encode an image as PNG, JPEG or WebP
    Convert(image::ConvertArgs),
    /// Show title, duration and qualities for a video URL
    VideoInfo { url: String },
    /// Download a video through the remote service
    VideoDownload {
        url: String,
        /// Target height such as 720; the service picks when omitted
        #[arg(long)]
        height: Option<u32>,
        #[arg(long, default_value = "video.mp4")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries results, so logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("filekit v{}", env!("CARGO_PKG_VERSION"));

    let out = cli.out_dir.as_path();
    match cli.command {
        Command::Merge { files } => pdf::merge(&files, out),
        Command::Split { file, ranges } => pdf::split(&file, &ranges, out),
        Command::Rotate { file, degrees } => pdf::rotate(&file, degrees, out),
        Command::Delete { file, pages } => pdf::delete(&file, &pages, out),
        Command::AddText {
            file,
            page,
            text,
            x,
            y,
            size,
        } => pdf::add_text(&file, page, text, x, y, size, out),
        Command::Compress { file } => pdf::compress(&file, out),
        Command::Inspect { file } => pdf::inspect(&file),
        Command::ImagesToPdf { files } => pdf::images_to_pdf(&files, out),
        Command::Run { command } => pdf::run_json(&command),
        Command::Unwatermark(args) => image::unwatermark(&args, out),
        Command::Batch(args) => image::batch(&args, out).await,
        Command::Convert(args) => image::convert(&args, out),
        Command::VideoInfo { url } => {
            let config = video::load_config(cli.config.as_deref(), cli.base_url)?;
            video::info(&config, &url).await
        }
        Command::VideoDownload { url, height, name } => {
            let config = video::load_config(cli.config.as_deref(), cli.base_url)?;
            video::download(&config, &url, height, &name, out).await
        }
    }
}
