//! CLI tool for translating PowerPoint files while preserving formatting.

mod backend;

use anyhow::{anyhow, bail, Context, Result};
use backend::CommandBackend;
use clap::{Args, Parser, Subcommand, ValueEnum};
use pptx_translate_core::config::{DEFAULT_BATCH_SIZE, DEFAULT_CONTEXT_THRESHOLD};
use pptx_translate_core::{FontMap, SplitPolicy, TranslationResult, TranslatorConfig};
use pptx_translate_pptx::{PptxDocument, PresentationTranslator};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Slides shown by `info`.
const INFO_SLIDES: usize = 5;

/// Preview length used by `info`.
const INFO_PREVIEW_CHARS: usize = 100;

/// Translate PowerPoint presentations while keeping their formatting.
#[derive(Parser, Debug)]
#[command(name = "pptx-translate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate every slide of a presentation
    Translate(TranslateArgs),

    /// Translate selected slides of a presentation
    TranslateSlides {
        /// Slide numbers, e.g. "1,3,5" or "2-4"
        #[arg(short, long)]
        slides: String,

        #[command(flatten)]
        args: TranslateArgs,
    },

    /// Show slide count and previews of the first slides
    Info {
        /// Input presentation (.pptx)
        input: PathBuf,
    },

    /// Print the extracted text structure of one slide as JSON
    Inspect {
        /// Input presentation (.pptx)
        input: PathBuf,

        /// Slide number (1-based)
        #[arg(short, long)]
        slide: usize,
    },
}

/// CLI wrapper for SplitPolicy to implement ValueEnum
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CliSplitPolicy {
    Proportional,
    WordBoundary,
}

impl From<CliSplitPolicy> for SplitPolicy {
    fn from(policy: CliSplitPolicy) -> Self {
        match policy {
            CliSplitPolicy::Proportional => SplitPolicy::Proportional,
            CliSplitPolicy::WordBoundary => SplitPolicy::WordBoundary,
        }
    }
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// Input presentations (.pptx)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Target language code (e.g. 'ko', 'ja', 'fr')
    #[arg(short, long, env = "PPTX_TRANSLATE_LANGUAGE", default_value = "en")]
    target_language: String,

    /// Output file (default: next to each input; only with a single input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Backend command; receives a JSON request on stdin
    #[arg(short, long, env = "PPTX_TRANSLATE_BACKEND")]
    backend: String,

    /// Slides with more text frames than this are translated with shared context
    #[arg(long, env = "PPTX_TRANSLATE_CONTEXT_THRESHOLD", default_value_t = DEFAULT_CONTEXT_THRESHOLD)]
    context_threshold: usize,

    /// Maximum text frames per batch request
    #[arg(long, env = "PPTX_TRANSLATE_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Seconds to wait for one backend request (0 waits forever)
    #[arg(long, default_value_t = 120)]
    timeout_secs: u64,

    /// How translated text is spread over the runs of a paragraph
    #[arg(long, value_enum, default_value_t = CliSplitPolicy::WordBoundary)]
    split_policy: CliSplitPolicy,

    /// Font for a target language, e.g. "ko=Nanum Gothic" (repeatable)
    #[arg(long = "font", value_name = "LANG=FONT", value_parser = parse_font_entry)]
    fonts: Vec<(String, String)>,

    /// Keep the original fonts unless set with --font
    #[arg(long)]
    keep_fonts: bool,

    /// Leave speaker notes untranslated
    #[arg(long)]
    no_notes: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

impl TranslateArgs {
    fn config(&self) -> TranslatorConfig {
        TranslatorConfig::new(&self.target_language)
            .with_context_threshold(self.context_threshold)
            .with_batch_size(self.batch_size)
            .with_split_policy(self.split_policy.into())
            .with_notes(!self.no_notes)
            .with_fonts(self.font_map())
    }

    fn font_map(&self) -> FontMap {
        let base = if self.keep_fonts {
            FontMap::empty()
        } else {
            FontMap::default()
        };
        self.fonts
            .iter()
            .fold(base, |map, (language, font)| map.with_font(language, font.as_str()))
    }

    fn backend(&self) -> CommandBackend {
        let timeout = (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs));
        CommandBackend::new(&self.backend).with_timeout(timeout)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match cli.command {
        Commands::Translate(args) => run_translate(&args, None),
        Commands::TranslateSlides { slides, args } => run_translate(&args, Some(&slides)),
        Commands::Info { input } => run_info(&input),
        Commands::Inspect { input, slide } => run_inspect(&input, slide),
    }
}

/// Outcome of translating one input file.
#[derive(Debug, Serialize)]
struct FileReport {
    input: PathBuf,
    output: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<TranslationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl FileReport {
    fn failed(&self) -> bool {
        match &self.result {
            Some(result) => {
                result.translated_count == 0
                    && result.translated_notes_count == 0
                    && !result.errors.is_empty()
            }
            None => true,
        }
    }
}

fn run_translate(args: &TranslateArgs, slides: Option<&str>) -> Result<()> {
    if args.output.is_some() && args.inputs.len() > 1 {
        bail!("--output can only be used with a single input file");
    }
    let numbers = slides.map(parse_slide_numbers).transpose()?;

    let config = args.config();
    let backend = args.backend();
    let translator = PresentationTranslator::new(config, &backend);

    let mut reports = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        let output = output_path(args, input, slides);
        eprintln!(
            "Translating {} -> {} ({})",
            input.display(),
            output.display(),
            args.target_language
        );

        let translated = match &numbers {
            Some(numbers) => translator.translate_slides(input, &output, numbers),
            None => translator.translate_presentation(input, &output),
        };
        let report = match translated {
            Ok(result) => FileReport {
                input: input.clone(),
                output,
                result: Some(result),
                error: None,
            },
            Err(e) => {
                log::error!("Failed to translate {}: {}", input.display(), e);
                FileReport {
                    input: input.clone(),
                    output,
                    result: None,
                    error: Some(e.to_string()),
                }
            }
        };
        if !args.json {
            print_report(&report);
        }
        reports.push(report);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    let failed = reports.iter().filter(|r| r.failed()).count();
    if reports.len() > 1 && !args.json {
        println!(
            "Summary: {} of {} file(s) translated",
            reports.len() - failed,
            reports.len()
        );
    }
    if failed > 0 {
        bail!("{} of {} file(s) failed to translate", failed, reports.len());
    }
    Ok(())
}

fn output_path(args: &TranslateArgs, input: &Path, slides: Option<&str>) -> PathBuf {
    match &args.output {
        Some(path) => path.clone(),
        None => default_output_path(input, &args.target_language, slides),
    }
}

fn print_report(report: &FileReport) {
    match (&report.result, &report.error) {
        (Some(result), _) => print_result(result, &report.output),
        (None, error) => println!(
            "Translation failed: {}: {}",
            report.input.display(),
            error.as_deref().unwrap_or("unknown error")
        ),
    }
}

fn print_result(result: &TranslationResult, output: &Path) {
    println!("Translation completed: {}", output.display());
    println!("  Texts translated: {}", result.translated_count);
    println!("  Notes translated: {}", result.translated_notes_count);
    println!("  Shapes visited:   {}", result.total_shapes);

    if !result.errors.is_empty() {
        println!("  Errors: {}", result.errors.len());
        for error in &result.errors {
            println!("    - {}", error);
        }
    }
}

fn run_info(input: &Path) -> Result<()> {
    let document = PptxDocument::open(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let count = document.slide_count();

    println!("Presentation: {}", input.display());
    println!("Total slides: {}", count);
    println!();

    for number in 1..=count.min(INFO_SLIDES) {
        let preview = document
            .slide_preview(number, INFO_PREVIEW_CHARS)
            .with_context(|| format!("Failed to read slide {}", number))?;
        println!("Slide {}:", number);
        println!("  • {}", preview);
        println!();
    }

    if count > INFO_SLIDES {
        println!("... and {} more slides", count - INFO_SLIDES);
    }
    Ok(())
}

fn run_inspect(input: &Path, slide: usize) -> Result<()> {
    let document = PptxDocument::open(input)
        .with_context(|| format!("Failed to open {}", input.display()))?;
    let frames = document
        .inspect_slide(slide)
        .with_context(|| format!("Failed to inspect slide {}", slide))?;

    println!("{}", serde_json::to_string_pretty(&frames)?);
    Ok(())
}

/// Parse a slide list such as "1,3,5" or "2-4,7".
fn parse_slide_numbers(spec: &str) -> Result<Vec<usize>> {
    let mut numbers = Vec::new();

    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let start = parse_number(start)?;
                let end = parse_number(end)?;
                if start > end {
                    bail!("Invalid slide range '{}'", part);
                }
                numbers.extend(start..=end);
            }
            None => numbers.push(parse_number(part)?),
        }
    }

    if numbers.is_empty() {
        return Err(anyhow!("No slide numbers given in '{}'", spec));
    }
    Ok(numbers)
}

fn parse_number(text: &str) -> Result<usize> {
    text.trim()
        .parse::<usize>()
        .with_context(|| format!("Invalid slide number '{}'", text.trim()))
}

fn parse_font_entry(entry: &str) -> Result<(String, String)> {
    match entry.split_once('=') {
        Some((language, font)) if !language.trim().is_empty() && !font.trim().is_empty() => {
            Ok((language.trim().to_string(), font.trim().to_string()))
        }
        _ => bail!("Expected LANG=FONT, got '{}'", entry),
    }
}

/// Output path next to the input, named after the language and slide list.
fn default_output_path(input: &Path, language: &str, slides: Option<&str>) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("pptx");

    let filename = match slides {
        Some(spec) => format!(
            "{}_slides_{}_{}.{}",
            stem,
            spec.replace(',', "_").replace('-', "to"),
            language,
            extension
        ),
        None => format!("{}_translated_{}.{}", stem, language, extension),
    };

    match input.parent() {
        Some(parent) => parent.join(filename),
        None => PathBuf::from(filename),
    }
}
