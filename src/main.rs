//! OIS Remote - command line driver for OI.Share Wi-Fi cameras
//!
//! ## Usage
//! ```bash
//! # Model and connection
//! ois-remote info
//! ois-remote connect
//!
//! # Capture and download
//! ois-remote take --out last.jpg
//! ois-remote list
//! ois-remote thumbnail P5100027.ORF
//!
//! # Dump 30 live view frames as img_N.jpg
//! ois-remote live-view --frames 30
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use ois_remote::{
    image_store::ImageStore,
    models::ResizeSize,
    AppConfig, CameraSession,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "ois-remote")]
#[command(about = "Remote control and live view for OI.Share Wi-Fi cameras")]
struct Args {
    /// Camera control URL (e.g., http://192.168.0.10)
    #[arg(long, global = true)]
    camera_url: Option<String>,

    /// Directory for downloaded images
    #[arg(long, global = true)]
    output_dir: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print get_caminfo.cgi
    Info,
    /// Probe the control endpoint once
    Connect,
    /// List pictures on the card as JSON
    List,
    /// Take a picture and save it
    Take {
        #[arg(long, default_value = "last.jpg")]
        out: String,
    },
    /// Stream live view and save frames
    LiveView {
        #[arg(long, default_value_t = 10)]
        frames: u64,
    },
    /// Download a full-size picture
    Image { filename: String },
    /// Download a picture's thumbnail
    Thumbnail { filename: String },
    /// Download a camera-resized copy (1024, 1600, 1920 or 2048)
    Resize { filename: String, size: ResizeSize },
    /// Set the AF point in live view coordinates
    Focus { x: u32, y: u32 },
    /// Turn the camera off
    PowerOff,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ois_remote=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // Load configuration
    let mut config = AppConfig::default();
    if let Some(url) = args.camera_url {
        config.camera_url = url;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }

    tracing::debug!(camera_url = %config.camera_url, "Configuration loaded");

    let store = ImageStore::new(config.output_dir.clone())
        .await
        .context("Failed to prepare output directory")?;
    tracing::debug!(output_dir = %store.dir().display(), "Output directory ready");
    let session = CameraSession::new(config).context("Failed to create camera client")?;

    let result = run(&session, &store, args.command).await;

    if let Some(e) = result.as_ref().err().and_then(|e| e.downcast_ref::<ois_remote::Error>()) {
        if e.is_camera_failure() {
            tracing::error!(
                camera_url = %session.config().camera_url,
                "Camera unreachable or command refused; check the Wi-Fi connection"
            );
        }
    }

    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "Failed to close camera session cleanly");
    }

    result
}

async fn run(session: &CameraSession, store: &ImageStore, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Info => {
            println!("{}", session.info().await?);
        }
        Command::Connect => {
            session.connect().await;
            let snapshot = session.connection().await;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Command::List => {
            let images = session.list_images().await?;
            println!("{}", serde_json::to_string_pretty(&images)?);
        }
        Command::Take { out } => {
            let image = session.take().await?;
            let path = store.save(&out, &image).await?;
            println!("{}", path.display());
        }
        Command::LiveView { frames } => {
            live_view(session, store, frames).await?;
        }
        Command::Image { filename } => {
            let data = session.image(&filename).await?;
            let path = store.save(&filename, &data).await?;
            println!("{}", path.display());
        }
        Command::Thumbnail { filename } => {
            let data = session.thumbnail(&filename).await?;
            let path = store.save(&format!("th_{}", filename), &data).await?;
            println!("{}", path.display());
        }
        Command::Resize { filename, size } => {
            let data = session.resized(&filename, size).await?;
            let path = store
                .save(&format!("{}_{}", size.as_str(), filename), &data)
                .await?;
            println!("{}", path.display());
        }
        Command::Focus { x, y } => {
            println!("{}", session.auto_focus(x, y).await?);
        }
        Command::PowerOff => {
            session.power_off().await?;
        }
    }

    Ok(())
}

async fn live_view(session: &CameraSession, store: &ImageStore, frames: u64) -> anyhow::Result<()> {
    let mut rx = session.start_live_view().await?;
    tracing::info!(frames = frames, "Receiving live view");

    let mut saved = 0;
    while saved < frames {
        tokio::select! {
            frame = rx.recv() => {
                let Some(frame) = frame else { break };
                let path = store.save_frame(saved, frame.as_bytes()).await?;
                tracing::debug!(
                    path = %path.display(),
                    completed_at = %frame.completed_at(),
                    "Frame saved"
                );
                saved += 1;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    session.stop_live_view().await?;

    let stats = session.live_view_stats();
    tracing::info!(
        saved = saved,
        datagrams = stats.datagrams,
        dropped = stats.frames_dropped,
        "Live view finished"
    );

    Ok(())
}
