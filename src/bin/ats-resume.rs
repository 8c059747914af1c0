//! CLI binary for ats-resume.
//!
//! A thin shim over the library crate: clap flags map onto `AnalyzerConfig`,
//! each requested analysis is one button press on an `InteractionController`.

use anyhow::{Context, Result};
use ats_resume::{
    build_controller, inspect, AnalysisKind, AnalyzerConfig, Backend, InteractionController,
    InteractionObserver, InteractionState, ModelConfig, Notice, Outcome,
};
use ats_resume::pipeline::input::load_document;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── Spinner observer using indicatif ─────────────────────────────────────────

/// Shows a spinner for the duration of each button press, labelled with the
/// controller's current state.
struct SpinnerObserver {
    bar: Mutex<Option<ProgressBar>>,
}

impl SpinnerObserver {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
        })
    }

    fn with_bar(&self, f: impl FnOnce(&mut Option<ProgressBar>)) {
        if let Ok(mut guard) = self.bar.lock() {
            f(&mut guard);
        }
    }
}

impl InteractionObserver for SpinnerObserver {
    fn on_press(&self, kind: AnalysisKind) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix(kind.button_label());
        bar.set_message("Checking inputs…");
        bar.enable_steady_tick(Duration::from_millis(80));
        self.with_bar(|slot| *slot = Some(bar));
    }

    fn on_transition(&self, _from: InteractionState, to: InteractionState) {
        self.with_bar(|slot| match to {
            InteractionState::Extracting => {
                if let Some(bar) = slot {
                    bar.set_message("Rendering page 1…");
                }
            }
            InteractionState::Invoking => {
                if let Some(bar) = slot {
                    bar.set_message("Waiting for the model…");
                }
            }
            InteractionState::Idle => {
                if let Some(bar) = slot.take() {
                    bar.finish_and_clear();
                }
            }
            _ => {}
        });
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Overall evaluation
  ats-resume cv.pdf --job-field Engineering --job-description-file job.txt

  # Match percentage as JSON
  ats-resume cv.pdf --job-field Marketing --job-description-file job.txt -a match --json

  # All four analyses
  ats-resume cv.pdf --job-field "Data Science" --job-description "..." -a all

  # Interactive session
  ats-resume --interactive

  # Page count only (no API key needed)
  ats-resume --inspect-only cv.pdf

  # Any edgequake-llm provider instead of Gemini
  ats-resume --backend provider --provider openai --model gpt-4.1 cv.pdf --job-field Finance

INTERACTIVE COMMANDS:
  upload <path|url>   Replace the current résumé
  field <text>        Set the job field
  jd <text>           Set the job description
  jd-file <path>      Read the job description from a file
  analyze | recommend | missing | match
                      Press one button
  all                 Press all four buttons
  status              Show the current inputs
  help                Show this list
  quit                Leave the session

ENVIRONMENT VARIABLES:
  GENAI_API_KEY           Google Gemini API key (fallback: GEMINI_API_KEY)
  ATS_MODEL               Override model ID (default: gemini-1.5-pro)
  ATS_JOB_FIELD           Default job field
  PDFIUM_LIB_PATH         Path to an existing libpdfium
  EDGEQUAKE_LLM_PROVIDER  Provider for --backend provider
  EDGEQUAKE_MODEL         Model for --backend provider

  A .env file in the working directory is loaded at startup.
"#;

/// Evaluate a PDF résumé against a job description with a vision LLM.
#[derive(Parser, Debug)]
#[command(
    name = "ats-resume",
    version,
    about = "Evaluate a PDF résumé against a job description with a vision LLM",
    long_about = "Render the first page of a résumé, send it with a job description to a \
generative model and print an ATS-style evaluation: an overall analysis, improvement \
suggestions, missing keywords or a match percentage.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Résumé PDF: local file path or HTTP/HTTPS URL.
    resume: Option<String>,

    /// Professional domain substituted into the prompts (e.g. Engineering).
    #[arg(short = 'f', long, env = "ATS_JOB_FIELD")]
    job_field: Option<String>,

    /// Job description text.
    #[arg(short = 'j', long, conflicts_with = "job_description_file")]
    job_description: Option<String>,

    /// Read the job description from a file.
    #[arg(long, env = "ATS_JOB_DESCRIPTION_FILE")]
    job_description_file: Option<PathBuf>,

    /// Analysis to run; repeat for several. Default: analyze.
    #[arg(short, long = "analysis", value_enum)]
    analyses: Vec<AnalysisArg>,

    /// Start a line-oriented session instead of a one-shot run.
    #[arg(short, long)]
    interactive: bool,

    /// Remote backend: gemini (REST) or provider (edgequake-llm).
    #[arg(long, env = "ATS_BACKEND", default_value = "gemini")]
    backend: Backend,

    /// Model ID.
    #[arg(long, env = "ATS_MODEL")]
    model: Option<String>,

    /// edgequake-llm provider name (openai, anthropic, gemini, ollama…).
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Gemini API key.
    #[arg(long, env = "GENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini base URL override.
    #[arg(long, env = "ATS_ENDPOINT")]
    endpoint: Option<String>,

    /// Longest side of the rendered page in pixels.
    #[arg(long, env = "ATS_MAX_PIXELS", default_value_t = 2000,
          value_parser = clap::value_parser!(u32).range(100..=8000))]
    max_pixels: u32,

    /// JPEG quality (1–100).
    #[arg(long, env = "ATS_JPEG_QUALITY", default_value_t = 75,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// PDF user password for encrypted résumés.
    #[arg(long, env = "ATS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "ATS_TEMPERATURE")]
    temperature: Option<f32>,

    /// Max output tokens per analysis.
    #[arg(long, env = "ATS_MAX_TOKENS")]
    max_tokens: Option<usize>,

    /// Path to an existing libpdfium.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Output each outcome as JSON.
    #[arg(long)]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "ATS_NO_PROGRESS")]
    no_progress: bool,

    /// Print the page count only, no analysis.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long)]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "ATS_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum AnalysisArg {
    Analyze,
    Recommend,
    Missing,
    Match,
    All,
}

impl AnalysisArg {
    fn kinds(self) -> &'static [AnalysisKind] {
        match self {
            AnalysisArg::Analyze => &[AnalysisKind::Analyze],
            AnalysisArg::Recommend => &[AnalysisKind::Recommend],
            AnalysisArg::Missing => &[AnalysisKind::Missing],
            AnalysisArg::Match => &[AnalysisKind::Match],
            AnalysisArg::All => &AnalysisKind::ALL,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives the feedback; library INFO lines would tear it.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let resume = cli
            .resume
            .as_deref()
            .context("--inspect-only needs a résumé path or URL")?;
        let pages = inspect(resume, &config).await.context("Failed to inspect PDF")?;
        if cli.json {
            println!("{}", serde_json::json!({ "file": resume, "page_count": pages }));
        } else {
            println!("File:   {}", resume);
            println!("Pages:  {}", pages);
        }
        return Ok(());
    }

    let mut controller = build_controller(&config).context("Failed to set up model client")?;
    if show_progress {
        controller = controller.with_observer(SpinnerObserver::new());
    }

    if let Some(ref field) = cli.job_field {
        controller.set_job_field(field.as_str());
    }
    if let Some(jd) = read_job_description(&cli).await? {
        controller.set_job_description(jd);
    }
    if let Some(ref resume) = cli.resume {
        let document = load_document(resume, config.download_timeout_secs)
            .await
            .with_context(|| format!("Failed to load résumé '{resume}'"))?;
        controller.upload(document);
    }

    if cli.interactive {
        return interactive(controller, &cli, &config).await;
    }

    // ── One-shot mode ────────────────────────────────────────────────────
    let mut kinds: Vec<AnalysisKind> = Vec::new();
    for arg in &cli.analyses {
        for &kind in arg.kinds() {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
    }
    if kinds.is_empty() {
        kinds.push(AnalysisKind::Analyze);
    }

    let mut rejected = false;
    for kind in kinds {
        let outcome = controller
            .press(kind)
            .await
            .with_context(|| format!("{} failed", kind.button_label()))?;
        rejected |= outcome.is_rejected();
        print_outcome(&outcome, &cli)?;
        if rejected {
            break;
        }
    }

    if rejected {
        std::process::exit(2);
    }
    Ok(())
}

/// Map CLI args to `AnalyzerConfig`.
fn build_config(cli: &Cli) -> Result<AnalyzerConfig> {
    let mut builder = AnalyzerConfig::builder()
        .model_config(ModelConfig::from_env())
        .backend(cli.backend)
        .max_rendered_pixels(cli.max_pixels)
        .jpeg_quality(cli.jpeg_quality)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.as_str());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.as_str());
    }
    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.as_str());
    }
    if let Some(ref endpoint) = cli.endpoint {
        builder = builder.endpoint(endpoint.as_str());
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password.as_str());
    }
    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }
    if let Some(n) = cli.max_tokens {
        builder = builder.max_tokens(n);
    }
    if let Some(ref path) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(path.clone());
    }

    builder.build().context("Invalid configuration")
}

async fn read_job_description(cli: &Cli) -> Result<Option<String>> {
    if let Some(ref path) = cli.job_description_file {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read job description from {:?}", path))?;
        return Ok(Some(text));
    }
    Ok(cli.job_description.clone())
}

fn print_outcome(outcome: &Outcome, cli: &Cli) -> Result<()> {
    if cli.json {
        let json = serde_json::to_string_pretty(outcome).context("Failed to serialise outcome")?;
        println!("{json}");
        return Ok(());
    }

    match outcome {
        Outcome::Rejected(r) => {
            eprintln!("{} {}", red("✘"), red(&r.message));
        }
        Outcome::Displayed(report) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}\n", bold(&format!("## {}", report.heading)))
                .context("Failed to write to stdout")?;
            writeln!(handle, "{}\n", report.text).context("Failed to write to stdout")?;

            if !cli.quiet {
                if let Some(pct) = report.match_percentage {
                    eprintln!("{} match: {}", green("✔"), bold(&format!("{pct}%")));
                }
                eprintln!(
                    "   {}",
                    dim(&format!(
                        "{}  ·  {} page(s)  ·  {} KB image  ·  {}ms render  ·  {}ms model",
                        report.model,
                        report.stats.page_count,
                        report.stats.image_bytes / 1024,
                        report.stats.extract_ms,
                        report.stats.model_ms,
                    ))
                );
            }
        }
    }
    Ok(())
}

fn print_notices(controller: &InteractionController) {
    for notice in controller.notices() {
        match notice {
            Notice::Success(m) => eprintln!("{} {}", green("✔"), m),
            Notice::Warning(m) => eprintln!("{} {}", yellow("⚠"), m),
        }
    }
}

// ── Interactive session ──────────────────────────────────────────────────────

async fn interactive(
    mut controller: InteractionController,
    cli: &Cli,
    config: &AnalyzerConfig,
) -> Result<()> {
    eprintln!(
        "{} {}  {}",
        cyan("◆"),
        bold("ATS résumé session"),
        dim(&format!("model client: {}  ·  type 'help' for commands", controller.client_name()))
    );
    print_notices(&controller);

    let stdin = io::stdin();
    loop {
        eprint!("{} ", cyan("ats>"));
        io::stderr().flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).context("Failed to read stdin")? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };

        match command.to_lowercase().as_str() {
            "quit" | "exit" | "q" => break,
            "help" | "?" => eprintln!("{}", interactive_help()),
            "status" => {
                eprintln!(
                    "résumé: {}  ·  job field: {}  ·  job description: {} chars",
                    controller
                        .document()
                        .map(|d| d.name().unwrap_or("<unnamed>").to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    if controller.job_field().is_empty() {
                        "-"
                    } else {
                        controller.job_field()
                    },
                    controller.job_description().chars().count(),
                );
                print_notices(&controller);
            }
            "upload" => match load_document(rest, config.download_timeout_secs).await {
                Ok(doc) => {
                    controller.upload(doc);
                    print_notices(&controller);
                }
                Err(e) => eprintln!("{} {}", red("✘"), e),
            },
            "field" => {
                controller.set_job_field(rest);
                print_notices(&controller);
            }
            "jd" => controller.set_job_description(rest),
            "jd-file" => match tokio::fs::read_to_string(rest).await {
                Ok(text) => {
                    eprintln!("{} job description: {} chars", green("✔"), text.chars().count());
                    controller.set_job_description(text);
                }
                Err(e) => eprintln!("{} {}: {}", red("✘"), rest, e),
            },
            "all" => {
                for kind in AnalysisKind::ALL {
                    if !press_and_print(&mut controller, kind, cli).await? {
                        break;
                    }
                }
            }
            _ => match line.parse::<AnalysisKind>() {
                Ok(kind) => {
                    press_and_print(&mut controller, kind, cli).await?;
                }
                Err(_) => eprintln!(
                    "{} unknown command '{}'; type 'help'",
                    yellow("⚠"),
                    command
                ),
            },
        }
    }

    Ok(())
}

/// Press one button; errors are shown and the session continues.
/// Returns `false` when the next press should not be attempted.
async fn press_and_print(
    controller: &mut InteractionController,
    kind: AnalysisKind,
    cli: &Cli,
) -> Result<bool> {
    match controller.press(kind).await {
        Ok(outcome) => {
            print_outcome(&outcome, cli)?;
            Ok(!outcome.is_rejected())
        }
        Err(e) => {
            eprintln!("{} {}: {}", red("✘"), kind.button_label(), e);
            Ok(false)
        }
    }
}

fn interactive_help() -> &'static str {
    AFTER_HELP
        .split("INTERACTIVE COMMANDS:\n")
        .nth(1)
        .and_then(|s| s.split("\n\n").next())
        .unwrap_or("")
}
