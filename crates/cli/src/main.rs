mod settings;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use facegallery_core::corpus::infrastructure::directory_corpus::DirectoryCorpus;
use facegallery_core::corpus::infrastructure::image_file_loader::ImageFileLoader;
use facegallery_core::detection::infrastructure::command_face_encoder::CommandFaceEncoder;
use facegallery_core::gallery::infrastructure::json_gallery_store::JsonGalleryStore;
use facegallery_core::matching::domain::matcher::Matcher;
use facegallery_core::pipeline::gallery_lifecycle::IdentityChange;
use facegallery_core::pipeline::recognition_service::{Bootstrap, FaceRecognitionService};

use settings::Settings;

/// Face gallery training and recognition.
#[derive(Parser)]
#[command(name = "facegallery")]
struct Cli {
    /// Reference image directory (one subdirectory per identity).
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,

    /// Persisted gallery file.
    #[arg(long, global = true)]
    gallery: Option<PathBuf>,

    /// Maximum distance for a match (exclusive).
    #[arg(long, global = true)]
    tolerance: Option<f64>,

    /// Extractor command line, e.g. "python3 encode_faces.py".
    #[arg(long, global = true)]
    extractor: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the gallery from the reference images.
    Train,
    /// Recognize the faces in an image and print the result as JSON.
    Recognize { image: PathBuf },
    /// Add a reference image for a person and retrain.
    Add { name: String, image: PathBuf },
    /// Delete all reference images of a person and retrain.
    Remove { name: String },
    /// Delete top-level reference files starting with a prefix and retrain.
    Purge { prefix: String },
    /// List the identities in the reference corpus.
    List,
}

struct Config {
    corpus_dir: PathBuf,
    gallery_path: PathBuf,
    tolerance: f64,
    extractor: Vec<String>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli, Settings::load());
    validate(&cli, &config)?;

    let service = open_service(&config, bootstrap_for(&cli.command))?;

    match cli.command {
        Command::Train => {
            let summary = service.rebuild_all()?;
            println!(
                "Trained {} identities from {} face encoding(s)",
                summary.identity_count, summary.vector_count
            );
            if summary.skipped_images > 0 || summary.failed_images > 0 {
                println!(
                    "{} image(s) without a face, {} image(s) failed",
                    summary.skipped_images, summary.failed_images
                );
            }
        }
        Command::Recognize { image } => {
            let outcome = service.recognize_image_file(&image)?;
            log::info!("{}", outcome.message());
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Add { name, image } => {
            let change = service.add_identity(&name, &image)?;
            report(&change, "Added");
        }
        Command::Remove { name } => {
            let change = service.remove_identity(&name)?;
            report(&change, "Removed");
        }
        Command::Purge { prefix } => {
            let change = service.remove_by_prefix(&prefix)?;
            report(&change, "Purged");
        }
        Command::List => {
            let snapshot = service.snapshot();
            for name in service.identities()? {
                let encodings = snapshot.gallery().get(&name).map_or(0, |e| e.len());
                println!("{name}\t{encodings}");
            }
        }
    }

    Ok(())
}

fn resolve_config(cli: &Cli, settings: Settings) -> Config {
    Config {
        corpus_dir: cli.corpus.clone().unwrap_or(settings.corpus_dir),
        gallery_path: cli.gallery.clone().unwrap_or(settings.gallery_path),
        tolerance: cli.tolerance.unwrap_or(settings.tolerance),
        extractor: match &cli.extractor {
            Some(command) => command.split_whitespace().map(String::from).collect(),
            None => settings.extractor,
        },
    }
}

/// Only recognition needs a trained gallery up front; every other command
/// either retrains itself or only reads what is already there.
fn bootstrap_for(command: &Command) -> Bootstrap {
    match command {
        Command::Recognize { .. } => Bootstrap::IfMissing,
        _ => Bootstrap::Skip,
    }
}

fn open_service(
    config: &Config,
    bootstrap: Bootstrap,
) -> Result<FaceRecognitionService, Box<dyn std::error::Error>> {
    let encoder = CommandFaceEncoder::from_command_line(&config.extractor)
        .map_err(|e| -> Box<dyn std::error::Error> { e })?;
    let service = FaceRecognitionService::open_with(
        Box::new(JsonGalleryStore::new(&config.gallery_path)),
        Box::new(DirectoryCorpus::new(&config.corpus_dir)),
        Arc::new(ImageFileLoader::new()),
        Arc::new(encoder),
        Matcher::new(config.tolerance),
        bootstrap,
    )?;
    Ok(service)
}

fn validate(cli: &Cli, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if !config.tolerance.is_finite() || config.tolerance < 0.0 {
        return Err(format!(
            "Tolerance must be a non-negative number, got {}",
            config.tolerance
        )
        .into());
    }
    if config.extractor.is_empty() {
        return Err("No extractor configured; pass --extractor or set it in settings.json".into());
    }
    match &cli.command {
        Command::Recognize { image } | Command::Add { image, .. } if !image.exists() => {
            Err(format!("Input file not found: {}", image.display()).into())
        }
        _ => Ok(()),
    }
}

fn report(change: &IdentityChange, verb: &str) {
    println!("{verb} '{}' ({} path(s))", change.name, change.paths.len());
    for path in &change.paths {
        log::debug!("  {}", path.display());
    }
    println!(
        "Retrained: {} identities, {} face encoding(s)",
        change.summary.identity_count, change.summary.vector_count
    );
}
