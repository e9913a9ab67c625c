//! ebook-cover: generate cover thumbnails for PDF ebooks.
//!
//! - `ebook-cover extract book.pdf [more.pdf ...] [-o DIR]`
//! - `ebook-cover placeholder "intro-to-computing" [-o DIR]`
//! - `ebook-cover custom --title "Networks" -o cover.jpg`

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use rayon::prelude::*;
use serde::Serialize;

use cover_core::options::{parse_size, CoverOptions};
use cover_placeholder::CustomCoverOptions;
use cover_utils::mime;
use ebook_cover::{CoverRecord, StorageLayout};

#[derive(Parser)]
#[command(
    name = "ebook-cover",
    version,
    about = "Cover thumbnails for PDF ebooks"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Upload tree root (ebooks/ and covers/ live below it)
    #[arg(long, global = true)]
    storage_root: Option<PathBuf>,

    /// Cover size (WxH, default 300x420)
    #[arg(long, global = true)]
    cover_size: Option<String>,

    /// JPEG quality (1-100, default 85)
    #[arg(long, global = true)]
    jpeg_quality: Option<u8>,

    /// First page render scale (default 1.5)
    #[arg(long, global = true)]
    render_scale: Option<f32>,

    /// pdftoppm executable
    #[arg(long, global = true)]
    pdftoppm: Option<PathBuf>,

    /// TrueType font for placeholder text
    #[arg(long, global = true)]
    font: Option<PathBuf>,

    /// Dump effective merged config as TOML and exit
    #[arg(long, global = true)]
    dump_config: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract covers from one or more PDFs
    Extract {
        /// PDF files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory (default: <storage-root>/covers)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Placeholder title (default: derived from each file name)
        #[arg(long)]
        title: Option<String>,

        /// Print one JSON cover record per input
        #[arg(long)]
        json: bool,
    },
    /// Draw a placeholder cover without reading a PDF
    Placeholder {
        /// Book name, e.g. the uploaded file name
        name: String,

        /// Output directory (default: <storage-root>/covers)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Draw a styled cover from a title and author
    Custom {
        #[arg(long)]
        title: String,

        #[arg(long)]
        author: Option<String>,

        /// Gradient start colour (#rrggbb)
        #[arg(long)]
        background: Option<String>,

        /// Gradient end colour (#rrggbb)
        #[arg(long)]
        accent: Option<String>,

        /// Canvas size (WxH, default 400x600)
        #[arg(long)]
        size: Option<String>,

        /// Output JPEG file
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// One line of `extract --json` output.
#[derive(Serialize)]
struct ExtractReport<'a> {
    input: &'a Path,
    #[serde(flatten)]
    record: CoverRecord,
}

/// Log records raised before the logger exists; replayed after `init_logging`.
type Deferred = Vec<(log::Level, String)>;

/// Load config from global and project-local TOML files.
/// Later files override earlier ones. Missing files are silently ignored.
fn load_config(notes: &mut Deferred) -> CoverOptions {
    let mut opts = CoverOptions::default();

    // 1. Global config: ~/.config/ebook-cover/config.toml
    if let Some(config_dir) = dirs::config_dir() {
        let global_path = config_dir.join("ebook-cover").join("config.toml");
        if let Some(parsed) = read_config(&global_path, notes) {
            opts = parsed;
        }
    }

    // 2. Project-local config: ./.ebook-cover.toml, replaces the global one
    if let Some(parsed) = read_config(Path::new(".ebook-cover.toml"), notes) {
        opts = parsed;
    }

    opts
}

fn read_config(path: &Path, notes: &mut Deferred) -> Option<CoverOptions> {
    let contents = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<CoverOptions>(&contents) {
        Ok(parsed) => {
            notes.push((log::Level::Debug, format!("Loaded config from {}", path.display())));
            Some(parsed)
        }
        Err(e) => {
            notes.push((log::Level::Warn, format!("Failed to parse {}: {}", path.display(), e)));
            None
        }
    }
}

/// Apply CLI flags on top of config-loaded options.
/// Only overrides when the CLI flag was explicitly provided.
fn apply_cli_overrides(opts: &mut CoverOptions, cli: &Cli, notes: &mut Deferred) {
    let matches = Cli::command().get_matches_from(std::env::args_os());

    if matches.value_source("verbose") == Some(clap::parser::ValueSource::CommandLine) {
        opts.verbose = cli.verbose;
    }

    if let Some(ref root) = cli.storage_root {
        opts.storage_root = root.clone();
    }

    if let Some(ref size_str) = cli.cover_size {
        match parse_size(size_str) {
            Some(size) => opts.cover_size = size,
            None => notes.push((
                log::Level::Warn,
                format!("Ignoring --cover-size {:?}: expected WxH", size_str),
            )),
        }
    }

    if let Some(quality) = cli.jpeg_quality {
        opts.jpeg_quality = quality.clamp(1, 100);
    }

    if let Some(scale) = cli.render_scale {
        opts.render_scale = scale;
    }

    if let Some(ref path) = cli.pdftoppm {
        opts.pdftoppm_path = path.clone();
    }

    if cli.font.is_some() {
        opts.font_path = cli.font.clone();
    }
}

fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn init_logging(verbose: u8) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter(verbose)),
    )
    .init();
}

fn main() {
    let cli = Cli::parse();

    let mut notes = Deferred::new();
    let mut opts = load_config(&mut notes);
    apply_cli_overrides(&mut opts, &cli, &mut notes);

    // Config `verbose` counts unless -v was given.
    init_logging(opts.verbose);
    for (level, message) in notes {
        log::log!(level, "{}", message);
    }

    if cli.dump_config {
        match toml::to_string_pretty(&opts) {
            Ok(s) => {
                println!("{}", s);
                process::exit(0);
            }
            Err(e) => {
                eprintln!("Error serializing config: {}", e);
                process::exit(1);
            }
        }
    }

    let result = match &cli.command {
        Some(Commands::Extract {
            inputs,
            output_dir,
            title,
            json,
        }) => run_extract(&opts, inputs, output_dir.as_deref(), title.as_deref(), *json),
        Some(Commands::Placeholder { name, output_dir }) => {
            run_placeholder(&opts, name, output_dir.as_deref())
        }
        Some(Commands::Custom {
            title,
            author,
            background,
            accent,
            size,
            output,
        }) => run_custom(
            &opts,
            title,
            author.as_deref(),
            background.as_deref(),
            accent.as_deref(),
            size.as_deref(),
            output,
        ),
        None => {
            eprintln!("Usage: ebook-cover extract <PDF>... [-o DIR]");
            eprintln!("   or: ebook-cover placeholder <NAME> [-o DIR]");
            eprintln!("   or: ebook-cover custom --title <TITLE> -o <FILE>");
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Resolve the output directory, creating the storage tree when defaulted.
fn covers_dir(opts: &CoverOptions, output_dir: Option<&Path>) -> Result<PathBuf> {
    match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create {}", dir.display()))?;
            Ok(dir.to_path_buf())
        }
        None => {
            let layout = StorageLayout::from_options(opts);
            layout
                .ensure_dirs()
                .with_context(|| format!("Cannot prepare {}", layout.root().display()))?;
            Ok(layout.covers_dir())
        }
    }
}

fn run_extract(
    opts: &CoverOptions,
    inputs: &[PathBuf],
    output_dir: Option<&Path>,
    title: Option<&str>,
    json: bool,
) -> Result<()> {
    let out_dir = covers_dir(opts, output_dir)?;
    let pipeline = ebook_cover::default_pipeline(opts).map_err(|e| anyhow::anyhow!("{}", e))?;
    let layout = StorageLayout::from_options(opts);

    log::info!("Extracting {} cover(s) into {}", inputs.len(), out_dir.display());
    for input in inputs.iter().filter(|p| !mime::is_pdf_path(p)) {
        log::warn!("{} is not a .pdf file; trying anyway", input.display());
    }

    let results: Vec<(&PathBuf, Option<PathBuf>)> = inputs
        .par_iter()
        .map(|input| (input, pipeline.extract_titled(input, &out_dir, title)))
        .collect();

    let mut missing = 0;
    for (input, cover) in results {
        if cover.is_none() {
            missing += 1;
        }
        if json {
            let report = ExtractReport {
                input,
                record: layout.cover_record(cover),
            };
            println!("{}", serde_json::to_string(&report)?);
        } else {
            match cover {
                Some(path) => println!("{} -> {}", input.display(), path.display()),
                None => println!("{} -> (no cover)", input.display()),
            }
        }
    }

    if missing > 0 {
        anyhow::bail!("{} of {} cover(s) could not be written", missing, inputs.len());
    }
    Ok(())
}

fn run_placeholder(opts: &CoverOptions, name: &str, output_dir: Option<&Path>) -> Result<()> {
    let out_dir = covers_dir(opts, output_dir)?;
    let path = ebook_cover::render_placeholder_cover(opts, name, &out_dir)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    println!("{}", path.display());
    Ok(())
}

fn run_custom(
    opts: &CoverOptions,
    title: &str,
    author: Option<&str>,
    background: Option<&str>,
    accent: Option<&str>,
    size: Option<&str>,
    output: &Path,
) -> Result<()> {
    let mut custom = CustomCoverOptions {
        title: title.to_string(),
        ..Default::default()
    };
    if let Some(author) = author {
        custom.author = author.to_string();
    }
    if let Some(background) = background {
        custom.background = background.to_string();
    }
    if let Some(accent) = accent {
        custom.accent = accent.to_string();
    }
    if let Some(size_str) = size {
        let (w, h) = parse_size(size_str)
            .with_context(|| format!("Invalid --size {:?}, expected WxH", size_str))?;
        custom.width = w;
        custom.height = h;
    }

    ebook_cover::write_custom_cover(opts, &custom, output)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    println!("{}", output.display());
    Ok(())
}
