//! xpage - split a paginated XHTML/iXBRL document into one file per page
//!
//! Usage:
//!   xpage filing.xhtml                     Pages + manifest under ./extracted_pages/filing/
//!   xpage filing.xhtml --out-dir out       Pages + manifest under out/filing/
//!   xpage filing.xhtml --manifest-only     Only manifest.json
//!   xpage filing.xhtml --catalog cat.json  Custom marker catalog

use anyhow::{Context, Result};
use clap::Parser;
use pager::{PatternCatalog, Paginator, PipelineConfig};
use std::fs;
use std::path::PathBuf;
use tools::writer::{self, DEFAULT_EXTENSION, PageWriter};
use tracing_subscriber::EnvFilter;

/// Split a paginated XHTML/iXBRL document into pages
#[derive(Parser, Debug)]
#[command(name = "xpage")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input XHTML file
    input: PathBuf,

    /// Base output directory (default: extracted_pages/ next to the input)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// JSON pattern catalog replacing the built-in one
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Write manifest.json only
    #[arg(long)]
    manifest_only: bool,

    /// Disable size/attribute based page detection
    #[arg(long)]
    no_semantic: bool,

    /// Debug logging (overrides RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    run(&args)
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::default();
    if let Some(path) = &args.catalog {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        config.catalog = PatternCatalog::from_json_str(&json)
            .with_context(|| format!("Invalid catalog {}", path.display()))?;
    }
    config.semantic_detection = !args.no_semantic;
    Ok(config)
}

fn run(args: &Args) -> Result<()> {
    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let paginator = Paginator::with_config(load_config(args)?).context("Invalid configuration")?;
    let pagination = paginator
        .paginate_str(&text)
        .with_context(|| format!("Failed to paginate {}", args.input.display()))?;

    let extension = args
        .input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or(DEFAULT_EXTENSION);
    let dir = writer::document_dir(&args.input, args.out_dir.as_deref());
    let page_writer = PageWriter::create(&dir, extension)?;

    if !args.manifest_only {
        let pages = pagination
            .page_documents()
            .context("Failed to serialize pages")?;
        page_writer.write_pages(&pages, pagination.manifest.has_duplicate_numbers())?;
    }
    let manifest_path = page_writer.write_manifest(&pagination.manifest)?;

    tracing::info!(
        pages = pagination.manifest.document_info.total_pages,
        manifest = %manifest_path.display(),
        "extraction complete"
    );
    println!("{}", page_writer.dir().display());
    Ok(())
}
