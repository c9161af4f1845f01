use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use recipenow_core::OcrLine;
use recipenow_parsing::{RecipeParser, VisionExtraction, missing_critical_fields};

mod config;
mod logging;
mod output;

use output::ColorMode;

/// RecipeNow parser - reconstruct structured recipes from OCR lines with per-field provenance
#[derive(Parser, Debug)]
#[command(name = "recipenow", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a JSON array of OCR lines into a recipe draft, spans and field statuses
    Parse {
        /// Path to the OCR lines JSON file
        ocr_json: PathBuf,

        /// Asset identifier recorded on every span
        #[arg(long)]
        asset_id: String,

        /// Vision extractor output to merge into fields the parser could not find
        #[arg(long)]
        vision: Option<PathBuf>,

        /// Config file (default: .recipenow.toml over the platform config)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,

        /// Write the JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show how each OCR line is classified and which section it falls in
    Classify {
        /// Path to the OCR lines JSON file
        ocr_json: PathBuf,

        /// Config file (default: .recipenow.toml over the platform config)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init().context("init logging")?;

    match cli.command {
        Command::Parse {
            ocr_json,
            asset_id,
            vision,
            config,
            pretty,
            output,
        } => parse(
            &ocr_json,
            &asset_id,
            vision.as_deref(),
            config.as_deref(),
            pretty,
            output,
        ),
        Command::Classify {
            ocr_json,
            config,
            no_color,
        } => classify(&ocr_json, config.as_deref(), no_color),
    }
}

fn read_lines(path: &Path) -> anyhow::Result<Vec<OcrLine>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read OCR lines from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("parse OCR lines JSON in {}", path.display()))
}

fn parse(
    ocr_json: &Path,
    asset_id: &str,
    vision: Option<&Path>,
    config_path: Option<&Path>,
    pretty: bool,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let file = config::load(config_path)?;
    let parser = RecipeParser::with_config(config::parsing_config(&file)?);
    let lines = read_lines(ocr_json)?;

    let mut result = parser.parse(&lines, asset_id);

    let missing = missing_critical_fields(&result.field_statuses);
    match vision {
        Some(path) if !missing.is_empty() => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("read vision output from {}", path.display()))?;
            let extraction: VisionExtraction = serde_json::from_str(&content)
                .with_context(|| format!("parse vision output JSON in {}", path.display()))?;
            let report = parser.merge_vision_fallback(&mut result, &extraction, &lines, asset_id);
            if !report.unprovenanced.is_empty() {
                tracing::warn!(
                    fields = ?report.unprovenanced,
                    "vision values kept without provenance"
                );
            }
        }
        Some(_) => tracing::info!("all critical fields extracted, vision output not needed"),
        None if !missing.is_empty() => {
            tracing::warn!(?missing, "critical fields missing and no vision output given")
        }
        None => {}
    }

    let pretty = pretty || file.output.and_then(|o| o.pretty).unwrap_or(false);
    let json = if pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };

    let mut writer: Box<dyn Write> = if let Some(ref output_path) = output {
        Box::new(
            std::fs::File::create(output_path)
                .with_context(|| format!("create {}", output_path.display()))?,
        )
    } else {
        Box::new(std::io::stdout())
    };
    writeln!(writer, "{json}")?;
    Ok(())
}

fn classify(ocr_json: &Path, config_path: Option<&Path>, no_color: bool) -> anyhow::Result<()> {
    let file = config::load(config_path)?;
    let parser = RecipeParser::with_config(config::parsing_config(&file)?);
    let lines = read_lines(ocr_json)?;

    let classes = parser.classify_lines(&lines);
    let sections = parser.segment(&lines);

    let mut stdout = std::io::stdout().lock();
    output::print_classification(
        &mut stdout,
        &lines,
        &classes,
        &sections,
        ColorMode(!no_color),
    )?;
    Ok(())
}
