use std::path::PathBuf;

use anyhow::{anyhow, Context};
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing::{info, warn};

mod acquisition;
mod analysis;
mod analyzer;
mod client;
mod config;
mod handlers;
mod llm;
mod render;
mod state;
#[cfg(test)]
mod test_support;
mod theme;
mod utils;

use acquisition::{EncodedImage, ImageSelector};
use client::AnalysisClient;
use config::CONFIG;
use state::AppState;
use utils::http::get_http_client;
use utils::logging::init_logging;

#[derive(Debug, PartialEq, Eq)]
enum ImageSource {
    File(PathBuf),
    Camera(String),
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Serve,
    Analyze { source: ImageSource, server: String },
    Help,
}

fn usage() -> &'static str {
    "Usage:\n  face_frames [serve]\n  face_frames analyze --file <path> [--server <url>]\n  face_frames capture [--device <path>] [--server <url>]"
}

fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let Some(command) = args.get(1).map(|value| value.as_str()) else {
        return Ok(Command::Serve);
    };

    let source_kind = match command {
        "serve" => return Ok(Command::Serve),
        "--help" | "-h" | "help" => return Ok(Command::Help),
        "analyze" | "capture" => command,
        other => return Err(anyhow!("Unknown command: {other}\n{}", usage())),
    };

    let mut file_path: Option<PathBuf> = None;
    let mut device = CONFIG.camera_device.clone();
    let mut server = CONFIG.analyze_server_url.clone();

    let mut index = 2;
    while index < args.len() {
        match args[index].as_str() {
            "--file" if source_kind == "analyze" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --file"))?;
                file_path = Some(PathBuf::from(value));
            }
            "--device" if source_kind == "capture" => {
                index += 1;
                device = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --device"))?
                    .clone();
            }
            "--server" => {
                index += 1;
                server = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --server"))?
                    .trim_end_matches('/')
                    .to_string();
            }
            "--help" | "-h" => return Ok(Command::Help),
            other => {
                return Err(anyhow!(
                    "Unknown {source_kind} argument: {other}\n{}",
                    usage()
                ));
            }
        }
        index += 1;
    }

    let source = if source_kind == "analyze" {
        ImageSource::File(file_path.ok_or_else(|| anyhow!("--file is required"))?)
    } else {
        ImageSource::Camera(device)
    };
    Ok(Command::Analyze { source, server })
}

#[cfg(feature = "v4l-camera")]
async fn capture_from_camera(device: String) -> anyhow::Result<EncodedImage> {
    use acquisition::camera::CaptureSession;
    use acquisition::v4l_source::V4lSource;

    tokio::task::spawn_blocking(move || {
        let mut source = V4lSource::new(device);
        let session = CaptureSession::open(&mut source)?;
        session.capture()
    })
    .await
    .context("Camera task failed")?
    .map_err(anyhow::Error::from)
}

#[cfg(not(feature = "v4l-camera"))]
async fn capture_from_camera(device: String) -> anyhow::Result<EncodedImage> {
    Err(anyhow!(
        "Unable to access camera {device}: this build was compiled without the v4l-camera feature"
    ))
}

async fn run_analyze(source: ImageSource, server: String) -> anyhow::Result<()> {
    let (selector, mut receiver) = ImageSelector::channel(1);
    match source {
        ImageSource::File(path) => {
            if !selector.select_file(&path).await? {
                warn!("{} is not an image; nothing to analyze", path.display());
            }
        }
        ImageSource::Camera(device) => {
            let encoded = capture_from_camera(device).await?;
            selector.deliver(encoded).await;
        }
    }
    drop(selector);

    let Some(image) = receiver.recv().await else {
        return Ok(());
    };

    let client = AnalysisClient::new(get_http_client().clone(), &server);
    println!("Analyzing your face shape...");
    let result = client
        .analyze(&image)
        .await
        .map_err(|err| anyhow!("{err}"))?;
    println!("{}", render::result_text(&result));
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn run_server() -> anyhow::Result<()> {
    if CONFIG.gemini_api_key.trim().is_empty() {
        return Err(anyhow!("GEMINI_API_KEY is required to serve"));
    }

    let state = AppState::from_config(&CONFIG);
    let router = handlers::build_router(state);
    let listener = TcpListener::bind(&CONFIG.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", CONFIG.bind_addr))?;
    info!(
        "Starting Face & Frames on http://{} (model {})",
        listener.local_addr()?,
        CONFIG.gemini_model
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let _guards = init_logging();

    let args: Vec<String> = std::env::args().collect();
    match parse_args(&args)? {
        Command::Serve => run_server().await,
        Command::Analyze { source, server } => run_analyze(source, server).await,
        Command::Help => {
            println!("{}", usage());
            Ok(())
        }
    }
}
