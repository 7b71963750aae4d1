//! Fampho CLI: operate the photo archive directly against its database and storage.
//!
//! Reads DATABASE_URL, STORAGE_ROOT and the upload/derivative settings from the
//! environment (or `.env`). Every command prints its result as JSON; archive
//! errors are printed as a JSON error body and exit with status 1.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use fampho_cli::{content_type_for, error_body, init_tracing};
use fampho_core::models::{MetadataUpdate, PhotoState, TriageAction};
use fampho_core::{AppError, Config, ErrorMetadata, LogLevel};
use fampho_db::{PostgresPhotoFileRepository, PostgresPhotoRepository};
use fampho_services::{Archive, UploadedFile};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "fampho", about = "Family photo archive")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations and exit
    Migrate,
    /// Ingest one or more image files into a library
    Ingest {
        /// Library UUID
        #[arg(long)]
        library: Uuid,
        /// Uploading user UUID
        #[arg(long)]
        uploader: Uuid,
        /// Files to ingest
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Move a photo between workflow states
    Transition {
        /// Photo UUID
        id: Uuid,
        /// Expected current state
        #[arg(long)]
        from: PhotoState,
        /// Target state
        #[arg(long)]
        to: PhotoState,
        /// Acting user UUID
        #[arg(long)]
        actor: Uuid,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Apply a triage decision: keep, discard or duplicate
    Triage {
        /// Photo UUID
        id: Uuid,
        action: TriageAction,
        #[arg(long)]
        actor: Uuid,
        #[arg(long)]
        reason: Option<String>,
        /// Photo this one duplicates (required for `duplicate`)
        #[arg(long)]
        duplicate_of: Option<Uuid>,
    },
    /// Return a rejected photo to triage
    UndoDiscard {
        id: Uuid,
        #[arg(long)]
        actor: Uuid,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Mark metadata entry as finished
    Complete {
        id: Uuid,
        #[arg(long)]
        actor: Uuid,
    },
    /// Edit a photo's descriptive metadata
    Metadata {
        id: Uuid,
        #[arg(long)]
        actor: Uuid,
        /// Capture time, RFC 3339 or `YYYY-MM-DD`
        #[arg(long)]
        date_taken: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Write a rotated copy of a photo file
    Rotate {
        id: Uuid,
        /// Clockwise: 90, 180 or 270
        degrees: i64,
        /// Source file UUID (defaults to the primary file)
        #[arg(long)]
        source: Option<Uuid>,
    },
    /// Render a screen-sized preview
    Preview {
        id: Uuid,
        #[arg(long)]
        source: Option<Uuid>,
    },
    /// Show a photo with its files
    Get { id: Uuid },
    /// List photos in a library
    List {
        #[arg(long)]
        library: Uuid,
        #[arg(long)]
        state: Option<PhotoState>,
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        offset: Option<i64>,
    },
    /// Find files by SHA-256 digest
    Lookup { sha256: String },
    /// Show pending work for a library
    Queues {
        #[arg(long)]
        library: Uuid,
    },
    /// List rejected photos in a library
    Rejected {
        #[arg(long)]
        library: Uuid,
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        offset: Option<i64>,
    },
    /// Show a photo's workflow history
    History { id: Uuid },
    /// Soft-delete a photo
    Delete {
        id: Uuid,
        #[arg(long)]
        actor: Uuid,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn upload_from_path(path: PathBuf) -> UploadedFile {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    let content_type = content_type_for(&path);
    UploadedFile::from_path(name, content_type, path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate()?;

    let pool = fampho_db::setup::connect(&config).await?;
    let storage = fampho_storage::create_storage(&config)
        .await
        .context("Failed to initialize storage")?;
    let archive = Archive::new(
        Arc::new(PostgresPhotoRepository::new(pool.clone())),
        Arc::new(PostgresPhotoFileRepository::new(pool.clone())),
        storage,
        &config.upload,
        config.derivatives,
    );

    let result = run(&archive, &pool, cli.command).await;
    pool.close().await;

    match result {
        Err(e) => match e.downcast_ref::<AppError>() {
            Some(err) => {
                match err.log_level() {
                    LogLevel::Error => tracing::error!(error = %err.detailed_message(), "Command failed"),
                    LogLevel::Warn => tracing::warn!(error = %err, "Command failed"),
                    LogLevel::Debug => tracing::debug!(error = %err, "Command failed"),
                }
                print_json(&error_body(err))?;
                std::process::exit(1);
            }
            None => Err(e),
        },
        ok => ok,
    }
}

async fn run(archive: &Archive, pool: &PgPool, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Migrate => {
            fampho_db::setup::run_migrations(pool).await?;
            print_json(&serde_json::json!({ "success": true }))?;
        }
        Commands::Ingest {
            library,
            uploader,
            files,
        } => {
            let uploads = files.into_iter().map(upload_from_path).collect();
            let report = archive.ingestion.ingest(library, uploader, uploads).await;
            print_json(&report)?;
        }
        Commands::Transition {
            id,
            from,
            to,
            actor,
            reason,
        } => {
            let photo = archive
                .workflow
                .transition(id, from, to, actor, reason)
                .await?;
            print_json(&photo)?;
        }
        Commands::Triage {
            id,
            action,
            actor,
            reason,
            duplicate_of,
        } => {
            let photo = archive
                .workflow
                .triage_action(id, action, actor, reason, duplicate_of)
                .await?;
            print_json(&photo)?;
        }
        Commands::UndoDiscard { id, actor, reason } => {
            let photo = archive.workflow.undo_discard(id, actor, reason).await?;
            print_json(&photo)?;
        }
        Commands::Complete { id, actor } => {
            let photo = archive.workflow.complete_metadata_entry(id, actor).await?;
            print_json(&photo)?;
        }
        Commands::Metadata {
            id,
            actor,
            date_taken,
            location,
            description,
        } => {
            let update = MetadataUpdate {
                date_taken,
                location_text: location,
                description,
            };
            let photo = archive.photos.update_metadata(id, actor, update).await?;
            print_json(&photo)?;
        }
        Commands::Rotate { id, degrees, source } => {
            let file = archive.derivatives.rotate(id, degrees, source).await?;
            print_json(&file)?;
        }
        Commands::Preview { id, source } => {
            let file = archive.derivatives.generate_preview(id, source).await?;
            print_json(&file)?;
        }
        Commands::Get { id } => {
            let photo = archive.photos.get(id).await?;
            let files = archive.photos.files(id).await?;
            print_json(&serde_json::json!({ "photo": photo, "files": files }))?;
        }
        Commands::List {
            library,
            state,
            limit,
            offset,
        } => {
            let photos = archive.photos.list(library, state, limit, offset).await?;
            print_json(&photos)?;
        }
        Commands::Lookup { sha256 } => {
            let files = archive.photos.lookup_by_digest(&sha256).await?;
            print_json(&files)?;
        }
        Commands::Queues { library } => {
            let queues = archive.workflow.work_queues(library).await?;
            print_json(&queues)?;
        }
        Commands::Rejected {
            library,
            limit,
            offset,
        } => {
            let queue = archive
                .workflow
                .rejected_queue(library, limit, offset)
                .await?;
            print_json(&queue)?;
        }
        Commands::History { id } => {
            let events = archive.workflow.history(id).await?;
            print_json(&events)?;
        }
        Commands::Delete { id, actor } => {
            archive.photos.soft_delete(id, actor).await?;
            print_json(
                &serde_json::json!({ "success": true, "message": format!("Photo {} deleted", id) }),
            )?;
        }
    }

    Ok(())
}
