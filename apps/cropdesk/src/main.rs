use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    ControllerOptions, HttpBackend, Outcome, OutputSizes, StatusSource, WorkflowController,
};
use shared::domain::Orientation;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod console;

use config::{load_settings, normalize_server_url, Settings};
use console::ConsoleView;

#[derive(Parser, Debug)]
#[command(name = "cropdesk", about = "Crop workflow client for the photo crop service")]
struct Args {
    /// Crop service base url; overrides cropdesk.toml and the environment.
    #[arg(long)]
    server_url: Option<String>,
    /// Only treat unprocessed images as needing work.
    #[arg(long)]
    unprocessed_only: bool,
    #[arg(long)]
    log_filter: Option<String>,
    /// Answer yes to every confirmation.
    #[arg(long, short = 'y')]
    yes: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pull new images from the photo service.
    Sync,
    /// List images and their status.
    List,
    /// Re-derive an image's status from its saved crops.
    Status { identifier: String },
    /// Mark an image completed and move to the next one needing work.
    Complete { identifier: String },
    /// Discard an image's crops.
    Reset { identifier: String },
    /// Upload every processed crop to the photo service.
    UploadAll,
    /// Show processed images and their crops.
    Manage,
    DeleteCrop {
        identifier: String,
        orientation: Orientation,
    },
    Reupload {
        identifier: String,
        orientation: Orientation,
    },
    Recrop {
        identifier: String,
        orientation: Orientation,
    },
    /// Permanently remove the source image from the photo service.
    DeleteOriginal { identifier: String },
}

impl Command {
    fn renders_list(&self) -> bool {
        matches!(self, Command::Sync | Command::List | Command::DeleteOriginal { .. })
    }
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(url) = &self.server_url {
            settings.server_url = url.clone();
        }
        if let Some(filter) = &self.log_filter {
            settings.log_filter = filter.clone();
        }
        if self.unprocessed_only {
            settings.unprocessed_only = true;
        }
    }
}

/// Turns a finished operation into the process result; blocked operations are
/// only logged.
fn settle<T>(operation: &str, outcome: Outcome<T>) -> Result<Option<T>> {
    match outcome {
        Outcome::Done(value) => Ok(Some(value)),
        Outcome::Blocked(reason) => {
            warn!(operation, ?reason, "nothing done");
            Ok(None)
        }
        Outcome::Failed(message) => bail!("{operation} failed: {message}"),
    }
}

async fn select(controller: &WorkflowController, identifier: &str) -> Result<()> {
    if settle("select", controller.select_image(identifier).await)?.is_none() {
        bail!("unknown image '{identifier}'");
    }
    Ok(())
}

async fn run(command: &Command, controller: &WorkflowController) -> Result<()> {
    match command {
        Command::List => {}
        Command::Sync => {
            let outcome = controller.sync().await.context("sync failed")?;
            if let Some(summary) = settle("sync", outcome)? {
                println!(
                    "{} new files, {} images in list",
                    summary.new_files, summary.images
                );
            }
        }
        Command::Status { identifier } => {
            let report = controller.reconcile_status(identifier).await;
            if report.source == StatusSource::Stored {
                println!(
                    "{identifier}: {} (crop lookup failed; stored status kept)",
                    report.status
                );
            }
            info!(identifier, source = ?report.source, "status checked");
        }
        Command::Complete { identifier } => {
            select(controller, identifier).await?;
            settle("complete", controller.complete_image().await)?;
        }
        Command::Reset { identifier } => {
            select(controller, identifier).await?;
            settle("reset", controller.reset_image().await)?;
        }
        Command::UploadAll => {
            let outcome = controller.upload_all().await.context("upload failed")?;
            if let Some(assets) = settle("upload", outcome)? {
                for asset in assets {
                    println!("  {asset}");
                }
            }
        }
        Command::Manage => {
            settle("manage", controller.open_manage().await)?;
        }
        Command::DeleteCrop {
            identifier,
            orientation,
        } => {
            settle(
                "delete crop",
                controller.delete_crop_image(identifier, *orientation).await,
            )?;
        }
        Command::Reupload {
            identifier,
            orientation,
        } => {
            settle(
                "re-upload",
                controller.reupload_crop_image(identifier, *orientation).await,
            )?;
        }
        Command::Recrop {
            identifier,
            orientation,
        } => {
            settle(
                "recrop",
                controller.recrop_image(identifier, *orientation).await,
            )?;
        }
        Command::DeleteOriginal { identifier } => {
            let display_name = controller
                .snapshot()
                .await
                .image(identifier)
                .map(|image| image.display_name().to_string())
                .unwrap_or_else(|| identifier.clone());
            settle(
                "delete original",
                controller
                    .delete_original_image(identifier, &display_name)
                    .await,
            )?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings();
    args.apply(&mut settings);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let server_url = normalize_server_url(&settings.server_url)?;
    let backend = HttpBackend::new(&server_url)
        .with_context(|| format!("invalid server url '{server_url}'"))?;
    info!(%server_url, unprocessed_only = settings.unprocessed_only, "starting cropdesk");

    let view = Arc::new(ConsoleView::new(args.yes, args.command.renders_list()));
    let controller = WorkflowController::new(
        Arc::new(backend),
        view,
        ControllerOptions {
            output_sizes: OutputSizes {
                portrait: settings.portrait_size,
                landscape: settings.landscape_size,
            },
            unprocessed_only: settings.unprocessed_only,
        },
    );

    controller
        .initialize()
        .await
        .context("failed to load image list")?;
    let result = run(&args.command, &controller).await;
    controller.run_frame().await;
    result
}
