#![deny(unsafe_code)]
//! CLI binary for the retouch image editor.
//!
//! Subcommands:
//! - `edit <input>`: load an image, apply filters and a stroke script, write PNG
//! - `info <input>`: report format and working dimensions

mod error;
mod script;

use clap::{ArgAction, Parser, Subcommand};
use error::CliError;
use retouch_editor::{EditorConfig, EditorSession, DEFAULT_EXPORT_NAME};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "retouch", about = "Two-layer raster image editor CLI")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Editor configuration as a JSON file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Longest side of the working image (overrides the config file).
    #[arg(long, global = true)]
    max_side: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load an image, apply filters and strokes, and write the flattened PNG.
    Edit {
        /// Input image (PNG or JPEG).
        input: PathBuf,

        /// Output file path.
        #[arg(short, long, default_value = DEFAULT_EXPORT_NAME)]
        output: PathBuf,

        /// Brightness percent, 0-200.
        #[arg(long)]
        brightness: Option<f32>,

        /// Contrast percent, 0-200.
        #[arg(long)]
        contrast: Option<f32>,

        /// Saturation percent, 0-200.
        #[arg(long)]
        saturation: Option<f32>,

        /// Blur radius in pixels, 0-20.
        #[arg(long)]
        blur: Option<f32>,

        /// Stroke script (JSON array of strokes).
        #[arg(long)]
        strokes: Option<PathBuf>,
    },
    /// Print format and dimensions of an image as the editor would load it.
    Info {
        /// Input image (PNG or JPEG).
        input: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|e| CliError::Io(format!("{}: {e}", path.display())))
}

/// Builds the editor config from an optional JSON file plus flag overrides.
fn load_config(path: Option<&Path>, max_side: Option<u32>) -> Result<EditorConfig, CliError> {
    let mut config = match path {
        Some(path) => {
            let text = String::from_utf8(read_file(path)?)
                .map_err(|e| CliError::Input(format!("config {}: {e}", path.display())))?;
            let params: serde_json::Value = serde_json::from_str(&text)
                .map_err(|e| CliError::Input(format!("invalid config JSON: {e}")))?;
            EditorConfig::from_json(&params)
        }
        None => EditorConfig::default(),
    };
    if let Some(max_side) = max_side {
        config = config.with_max_side(max_side);
    }
    tracing::debug!(?config, "configuration");
    Ok(config)
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.config.as_deref(), cli.max_side)?;

    match cli.command {
        Command::Info { input } => {
            let session = EditorSession::from_bytes(&read_file(&input)?, config)?;
            let (w, h) = session.dimensions().unwrap_or_default();
            let (sw, sh) = session.source_dimensions().unwrap_or_default();
            let format = session
                .source_format()
                .map(|f| format!("{f:?}").to_lowercase())
                .unwrap_or_default();
            if cli.json {
                let info = serde_json::json!({
                    "input": input.display().to_string(),
                    "format": format,
                    "source_width": sw,
                    "source_height": sh,
                    "width": w,
                    "height": h,
                    "downscaled": (w, h) != (sw, sh),
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("{}: {format} {sw}x{sh}, working size {w}x{h}", input.display());
            }
        }
        Command::Edit {
            input,
            output,
            brightness,
            contrast,
            saturation,
            blur,
            strokes,
        } => {
            let strokes = match strokes {
                Some(path) => {
                    let text = String::from_utf8(read_file(&path)?)
                        .map_err(|e| CliError::Input(format!("{}: {e}", path.display())))?;
                    script::parse(&text)?
                }
                None => Vec::new(),
            };

            let mut session = EditorSession::from_bytes(&read_file(&input)?, config)?;

            let mut filters = session.filters();
            if let Some(v) = brightness {
                filters.set_brightness(v);
            }
            if let Some(v) = contrast {
                filters.set_contrast(v);
            }
            if let Some(v) = saturation {
                filters.set_saturation(v);
            }
            if let Some(v) = blur {
                filters.set_blur(v);
            }
            session.set_filters(filters);

            let drawn = script::apply(&mut session, &strokes)?;
            session.export_to_path(&output)?;

            let (w, h) = session.dimensions().unwrap_or_default();
            let css = session.filters().css();
            if cli.json {
                let info = serde_json::json!({
                    "input": input.display().to_string(),
                    "output": output.display().to_string(),
                    "width": w,
                    "height": h,
                    "filter": css,
                    "strokes": drawn,
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                eprintln!(
                    "edited {} ({w}x{h}, {css}, {drawn} strokes) -> {}",
                    input.display(),
                    output.display()
                );
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({
                "error": e.to_string(),
                "kind": e.kind(),
                "exit_code": e.exit_code(),
            });
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
