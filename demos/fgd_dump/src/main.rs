//! FGD Dump Example
//!
//! Loads FGD files or directories, resolves inheritance, and prints the
//! flattened classes back out as FGD text.
//!
//! ```text
//! fgd_dump base.fgd game/ --editor --verbose
//! fgd_dump unified/ --tags tf2
//! ```

use clap::Parser;
use entforge_core::ExportConfig;
use entforge_script::{schema_to_string, Loader, LoaderConfig};
use env_logger::{Builder, Env};
use log::LevelFilter;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

/// Print resolved entity classes from FGD files
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// FGD files or directories, loaded in order
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// RON file with export options
    #[arg(long)]
    config: Option<PathBuf>,

    /// RON file with loader options
    #[arg(long)]
    loader_config: Option<PathBuf>,

    /// Leave out engine-only keyvalues
    #[arg(long)]
    editor: bool,

    /// Export only what applies to these tags, e.g. one game
    #[arg(long, value_delimiter = ',')]
    tags: Vec<String>,

    /// Only list class names and kinds
    #[arg(short, long)]
    list: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let env = Env::default().default_filter_or(level.to_string());
    let _ = Builder::from_env(env).try_init();
}

fn run(args: &Args) -> entforge_script::Result<()> {
    let loader_config = match &args.loader_config {
        Some(path) => LoaderConfig::from_file(path)?,
        None => LoaderConfig::default(),
    };
    let mut export = match &args.config {
        Some(path) => ExportConfig::from_ron_str(&fs::read_to_string(path)?)?,
        None => ExportConfig::default(),
    };
    if args.editor {
        export.include_engine_fields = false;
    }
    if !args.tags.is_empty() {
        export.tags = args.tags.clone();
    }

    let mut loader = Loader::with_config(loader_config);
    for path in &args.paths {
        if path.is_dir() {
            loader.load_directory(path)?;
        } else {
            loader.load_file(path)?;
        }
    }
    let schema = loader.finish()?;
    log::info!("resolved {} classes", schema.len());

    if args.list {
        for class in schema.all_classes() {
            println!("{:<12} {}", class.kind.keyword(), class.name);
        }
    } else {
        print!("{}", schema_to_string(&schema, &export));
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
