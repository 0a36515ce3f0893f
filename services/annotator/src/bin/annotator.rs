//! services/annotator/src/bin/annotator.rs
//!
//! The `annotator` command line workbench. It drives the selection, annotation
//! and synchronization pipeline against a running project backend.
//!
//! ```bash
//! annotator login --token <TOKEN>
//! annotator show 42 --search anxious
//! annotator upload 42 interview1.txt interview2.txt
//! annotator code 42 7 --segment 1 --start 13 --end 27 --code Emotions
//! annotator delete 42 7
//! ```

use annotator_lib::{
    adapters::{
        http::HttpBackend,
        prompt::{AssumeYes, StdinConfirmation},
        token_file::FileTokenStore,
    },
    config::Config,
    error::AnnotatorError,
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use thematic_core::browse::{
    code_color, filter_code_assignments, filter_comments, truncate, CODEBOOK_PREVIEW_LEN,
    COMMENT_PREVIEW_LEN,
};
use thematic_core::domain::{DocumentId, ProjectId, StagedFile};
use thematic_core::ports::{Confirmation, PortError, TokenStore};
use thematic_core::selection::{handle_pointer_up, CaptureOutcome, PointerEvent};
use thematic_core::store::{NewCodeFields, Store};
use thematic_core::surface::{Point, TextSurface};
use thematic_core::sync::{DeleteOutcome, LoadOutcome, SyncError, Synchronizer};
use thematic_core::AnnotationDispatcher;
use tokio::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "annotator",
    about = "Select passages in project documents and turn them into comments or code assignments",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store the bearer token used for every backend request.
    Login {
        #[arg(long)]
        token: String,
    },

    /// Forget the stored token.
    Logout,

    /// Load a project and print its documents, codes, comments and assignments.
    Show {
        project: ProjectId,

        /// Only list comments and assignments containing this text.
        #[arg(long)]
        search: Option<String>,
    },

    /// Upload one or more files into a project.
    Upload {
        project: ProjectId,

        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Display name (single-file uploads only).
        #[arg(long)]
        name: Option<String>,

        /// Description (single-file uploads only).
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a document from a project.
    Delete {
        project: ProjectId,
        document: DocumentId,

        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },

    /// Select a passage and assign a code to it.
    Code {
        project: ProjectId,
        document: DocumentId,
        #[command(flatten)]
        range: RangeArgs,

        /// An existing code.
        #[arg(long, conflicts_with = "create", required_unless_present = "create")]
        code: Option<String>,

        /// Create this code first, then assign it.
        #[arg(long)]
        create: Option<String>,
    },

    /// Select a passage and attach a comment to it.
    Comment {
        project: ProjectId,
        document: DocumentId,
        #[command(flatten)]
        range: RangeArgs,

        #[arg(long)]
        text: String,
    },
}

#[derive(clap::Args)]
struct RangeArgs {
    /// Zero-based segment index within the document.
    #[arg(long)]
    segment: usize,

    /// First selected character (inclusive).
    #[arg(long)]
    start: usize,

    /// Last selected character (exclusive).
    #[arg(long)]
    end: usize,
}

#[tokio::main]
async fn main() -> Result<(), AnnotatorError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let cli = Cli::parse();
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let tokens = Arc::new(FileTokenStore::new(config.token_path.clone()));

    // --- 2. Commands that never reach the backend ---
    let command = match cli.command {
        Commands::Login { token } => {
            tokens.save(&token)?;
            println!("Logged in. Token stored at {}.", tokens.path().display());
            return Ok(());
        }
        Commands::Logout => {
            tokens.clear()?;
            println!("Logged out.");
            return Ok(());
        }
        other => other,
    };

    // --- 3. Initialize the Backend Adapter ---
    let client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .map_err(|e| AnnotatorError::Internal(format!("HTTP client: {}", e)))?;
    let backend = Arc::new(HttpBackend::new(client, config.api_base_url.clone(), tokens));
    info!("Using backend at {}", config.api_base_url);

    // --- 4. Run, abandoning in-flight requests on Ctrl-C ---
    let store = Arc::new(Mutex::new(Store::new()));
    let sync = Arc::new(Synchronizer::new(backend, store));
    if let Some(project_id) = project_of(&command) {
        sync.open_project(project_id).await;
    }
    let interrupt = {
        let sync = sync.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                sync.shutdown();
            }
        })
    };

    let result = run(command, &sync).await;
    interrupt.abort();
    report_notifications(&sync).await;
    if sync.is_shut_down() {
        eprintln!("Interrupted; pending changes were not applied.");
    }

    if let Err(AnnotatorError::Sync(SyncError::Unauthorized)) = &result {
        eprintln!("Authentication failed. Run `annotator login --token <TOKEN>` and try again.");
    }
    result
}

fn project_of(command: &Commands) -> Option<ProjectId> {
    match command {
        Commands::Show { project, .. }
        | Commands::Upload { project, .. }
        | Commands::Delete { project, .. }
        | Commands::Code { project, .. }
        | Commands::Comment { project, .. } => Some(*project),
        Commands::Login { .. } | Commands::Logout => None,
    }
}

async fn run(command: Commands, sync: &Synchronizer) -> Result<(), AnnotatorError> {
    match command {
        Commands::Show { project, search } => show(sync, project, search.as_deref()).await,
        Commands::Upload {
            files,
            name,
            description,
            ..
        } => upload(sync, files, name, description).await,
        Commands::Delete { document, yes, .. } => {
            let confirmation: &dyn Confirmation = if yes { &AssumeYes } else { &StdinConfirmation };
            match sync.delete_document(document, confirmation).await? {
                DeleteOutcome::Declined => println!("Deletion cancelled."),
                DeleteOutcome::Cancelled => println!("Interrupted before deleting."),
                DeleteOutcome::Deleted { refresh } => {
                    println!("Document {} deleted.", document);
                    log_refresh(refresh);
                }
            }
            Ok(())
        }
        Commands::Code {
            project,
            document,
            range,
            code,
            create,
        } => {
            let mut surface = open_document(sync, project, document).await?;
            let store = sync.store();
            let mut store = store.lock().await;
            select(&mut store, &mut surface, &range)?;

            let dispatcher = AnnotationDispatcher::new();
            dispatcher.assign_code(&mut store)?;
            let code = match (code, create) {
                (_, Some(name)) => {
                    dispatcher.start_new_code(&mut store)?;
                    dispatcher.edit_new_code(
                        &mut store,
                        NewCodeFields {
                            name,
                            ..Default::default()
                        },
                    )?;
                    dispatcher.save_new_code(&mut store)?.name
                }
                (Some(name), None) => {
                    dispatcher.choose_code(&mut store, name.clone())?;
                    name
                }
                (None, None) => {
                    dispatcher.discard(&mut store);
                    return Err(AnnotatorError::Internal("no code given".to_string()));
                }
            };
            let assignment = dispatcher.save_code_assignment(&mut store, Utc::now())?;
            println!(
                "Assigned '{}' to \"{}\" in {}.",
                code, assignment.selected_text, assignment.document_name
            );
            Ok(())
        }
        Commands::Comment {
            project,
            document,
            range,
            text,
        } => {
            let mut surface = open_document(sync, project, document).await?;
            let store = sync.store();
            let mut store = store.lock().await;
            select(&mut store, &mut surface, &range)?;

            let dispatcher = AnnotationDispatcher::new();
            dispatcher.add_comment(&mut store)?;
            dispatcher.edit_comment(&mut store, text)?;
            let comment = dispatcher.save_comment(&mut store, Utc::now())?;
            println!(
                "Comment added on \"{}\" in {}.",
                comment.selected_text, comment.document_name
            );
            Ok(())
        }
        Commands::Login { .. } | Commands::Logout => Ok(()),
    }
}

async fn show(
    sync: &Synchronizer,
    project: ProjectId,
    search: Option<&str>,
) -> Result<(), AnnotatorError> {
    if sync.load_project(project).await? != LoadOutcome::Applied {
        return Ok(());
    }
    let store = sync.store();
    let store = store.lock().await;

    if let Some(summary) = store.project() {
        println!("{} (#{})", summary.title, summary.id);
        if !summary.description.is_empty() {
            println!("  {}", summary.description);
        }
    }

    println!("\nDocuments ({}):", store.documents().len());
    for document in store.documents() {
        let segments = document
            .segments
            .as_ref()
            .map_or_else(|| "?".to_string(), |s| s.len().to_string());
        println!(
            "  [{}] {:<8} {} ({} bytes, {} segments)",
            document.id,
            document.kind().label(),
            document.name,
            document.file_size.unwrap_or(0),
            segments
        );
    }

    println!("\nCodes ({}):", store.codes().len());
    for code in store.codes() {
        let about = code
            .definition
            .as_deref()
            .or(code.description.as_deref())
            .unwrap_or("");
        println!(
            "  {} {} {}",
            code_color(code),
            code.name,
            truncate(about, CODEBOOK_PREVIEW_LEN)
        );
    }

    let query = search.unwrap_or("");
    let comments = filter_comments(store.comments(), query);
    println!("\nComments ({}):", comments.len());
    for comment in comments {
        println!(
            "  {} \"{}\": {}",
            comment.document_name,
            comment.selected_text,
            truncate(&comment.comment, COMMENT_PREVIEW_LEN)
        );
    }

    let assignments = filter_code_assignments(store.code_assignments(), query);
    println!("\nCode assignments ({}):", assignments.len());
    for assignment in assignments {
        println!(
            "  [{}] {} \"{}\"",
            assignment.code,
            assignment.document_name,
            truncate(&assignment.selected_text, CODEBOOK_PREVIEW_LEN)
        );
    }
    Ok(())
}

async fn upload(
    sync: &Synchronizer,
    paths: Vec<PathBuf>,
    name: Option<String>,
    description: Option<String>,
) -> Result<(), AnnotatorError> {
    let single = paths.len() == 1;
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let content = tokio::fs::read(&path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| AnnotatorError::Internal(format!("{} is not a file", path.display())))?;
        let mut file = StagedFile::new(file_name, content);
        if single {
            file.display_name = name.clone();
            file.description = description.clone();
        }
        files.push(file);
    }
    if !single && (name.is_some() || description.is_some()) {
        warn!("--name and --description only apply to single-file uploads; ignoring.");
    }

    sync.stage_files(files).await;
    let outcome = sync.upload_files().await?;
    for document in &outcome.uploaded {
        println!("Uploaded [{}] {} ({})", document.id, document.name, document.document_type);
    }
    log_refresh(outcome.refresh);
    Ok(())
}

/// Loads the project, activates `document` and renders its segments.
async fn open_document(
    sync: &Synchronizer,
    project: ProjectId,
    document: DocumentId,
) -> Result<TextSurface, AnnotatorError> {
    sync.load_project(project).await?;
    let found = {
        let store = sync.store();
        let store = store.lock().await;
        store.document(document).cloned()
    };
    let Some(found) = found else {
        return Err(PortError::NotFound(format!("document {} in project {}", document, project)).into());
    };
    sync.select_document(&found).await?;

    let store = sync.store();
    let store = store.lock().await;
    Ok(TextSurface::render(store.active_segments().unwrap_or(&[])))
}

/// Selects the range on the surface and releases the pointer over it.
fn select(store: &mut Store, surface: &mut TextSurface, range: &RangeArgs) -> Result<(), AnnotatorError> {
    surface
        .select_in(range.segment, range.start, range.end)
        .map_err(|e| AnnotatorError::Internal(e.to_string()))?;
    let (Some(target), Some(bounds)) = (surface.line(range.segment), surface.line_bounds(range.segment)) else {
        return Err(AnnotatorError::Internal(format!("no segment {}", range.segment)));
    };
    let release = PointerEvent {
        target,
        position: Point {
            x: bounds.left,
            y: bounds.top,
        },
    };
    match handle_pointer_up(store, surface, &release, Utc::now()) {
        CaptureOutcome::Captured { candidate, .. } => {
            info!("Selected \"{}\" in {}", candidate.text, candidate.document_name);
            Ok(())
        }
        _ => Err(AnnotatorError::Internal("the selected range contains no text".to_string())),
    }
}

fn log_refresh(refresh: Result<LoadOutcome, SyncError>) {
    match refresh {
        Ok(LoadOutcome::Applied) => info!("Project data refreshed."),
        Ok(other) => info!("Project refresh not applied: {:?}", other),
        Err(e) => warn!("Project refresh failed: {}", e),
    }
}

async fn report_notifications(sync: &Synchronizer) {
    let store = sync.store();
    let store = store.lock().await;
    for notification in store.notifications() {
        eprintln!("[{:?}] {}", notification.level, notification.message);
    }
}
