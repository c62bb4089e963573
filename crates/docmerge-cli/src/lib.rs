mod payload;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use docmerge_config::{Config, LoadOptions};
use docmerge_core::DocMerge;
use docmerge_format::Response;
use docmerge_model::Document;
use docmerge_store::{DocumentStore, FsStore};
use log::LevelFilter;

pub use payload::{load_payload, PayloadSource};

const LOG_MODULES: &[&str] = &[
    "docmerge_cli",
    "docmerge_core",
    "docmerge_engine",
    "docmerge_format",
    "docmerge_store",
];

/// Entry point for CLI execution. Returns the desired exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut options = LoadOptions::default();
    if let Some(path) = &cli.config {
        options = options.with_override_path(path);
    }
    let config = Config::load(options)?;
    let root = cli
        .store
        .clone()
        .unwrap_or_else(|| config.storage.root.clone());
    let store = FsStore::open_root(&root)
        .with_context(|| format!("failed to open store at '{}'", root.display()))?;

    match cli.command {
        Command::Get(args) => {
            let engine = DocMerge::bootstrap(config, store)?;
            Ok(emit(&engine.handle_get(Some(&args.template_doc_id))))
        }
        Command::Post(args) => {
            let body = load_payload(PayloadSource::from_args(args.with, args.with_string))?;
            let mut engine = DocMerge::bootstrap(config, store)?;
            Ok(emit(&engine.handle_post(&body)))
        }
        Command::Import(args) => handle_import(store, args),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    for module in LOG_MODULES {
        builder.filter_module(module, level);
    }
    builder.parse_default_env();
    let _ = builder.try_init();
}

fn handle_import(mut store: FsStore, args: ImportArgs) -> Result<i32> {
    let contents = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read document '{}'", args.file.display()))?;
    let document: Document = serde_json::from_str(&contents)
        .with_context(|| format!("'{}' is not a document", args.file.display()))?;

    let id = store.create(&document.title, &document)?;
    if let Some(folder) = args.folder.as_deref() {
        store.create_folder(folder)?;
        store.move_to_folder(&id, folder)?;
    }

    println!("{id}");
    Ok(0)
}

fn emit(response: &Response) -> i32 {
    println!("{}", response.body());
    if response.is_success() {
        0
    } else {
        1
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Template document composition", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Document store directory (overrides `[storage] root`)
    #[arg(long, value_name = "DIR", global = true)]
    store: Option<PathBuf>,

    /// Configuration file applied on top of discovered `.docmerge.toml` files
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log every directive and rule
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the element structure of a template
    Get(GetArgs),
    /// Execute a createDocFromTemplate or mergeDocFromTemplate request
    Post(PostArgs),
    /// Add a document JSON file to the store and print its id
    Import(ImportArgs),
}

#[derive(Args, Debug)]
struct GetArgs {
    #[arg(value_name = "TEMPLATE_DOC_ID")]
    template_doc_id: String,
}

#[derive(Args, Debug)]
struct PostArgs {
    /// Read the request body from file (use '-' for stdin)
    #[arg(long = "with", value_name = "PATH", allow_hyphen_values = true)]
    with: Option<PathBuf>,

    /// Inline request body
    #[arg(
        long = "with-string",
        value_name = "JSON",
        allow_hyphen_values = true,
        conflicts_with = "with"
    )]
    with_string: Option<String>,
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// Document JSON file
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Folder to file the document under (created if missing)
    #[arg(long, value_name = "ID")]
    folder: Option<String>,
}
