//! CLI binary for edgequake-docs2pdf.
//!
//! Parses flags, builds a `ConversionConfig`, runs the merge and prints a
//! per-page summary (or a JSON report with `--json`).

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_docs2pdf::{
    convert, inspect, ConversionConfig, ConversionProgressCallback, ProgressCallback, ToolCommand,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── Terminal colours ─────────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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

/// Apply `style` only when writing to a terminal.
fn paint(color: bool, style: fn(&str) -> String, s: &str) -> String {
    if color {
        style(s)
    } else {
        s.to_string()
    }
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── Progress bar ─────────────────────────────────────────────────────────────

/// Terminal progress callback: a live progress bar plus one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the page currently being processed.
    page_started: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Create a callback whose length is set by `on_conversion_start`.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading site configuration…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_started: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Rendering");
        self.bar.reset_eta();
    }

    fn skipped(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }

    fn page_elapsed_secs(&self) -> f64 {
        self.page_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Merging {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, _page_num: usize, _total: usize, source: &Path) {
        if let Ok(mut started) = self.page_started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_message(source.display().to_string());
    }

    fn on_page_complete(&self, page_num: usize, total: usize, pdf_pages: usize) {
        let elapsed = self.page_elapsed_secs();
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<10}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{pdf_pages:>3} pdf pages")),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        let elapsed = self.page_elapsed_secs();
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg = match error.char_indices().nth(100) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
        let failed = self.skipped();
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} pages merged successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages merged  ({} skipped)",
                cyan("⚠"),
                bold(&success_count.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }
}

impl Drop for CliProgressCallback {
    fn drop(&mut self) {
        // Fail-fast runs never reach on_conversion_complete.
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Merge the pages listed in ./mkdocs.yml into ./output.pdf
  docs2pdf

  # Different site, docs directory and output
  docs2pdf --config site/mkdocs.yml --docs-dir site/docs -o manual.pdf

  # Keep going when a page fails; the failed pages are reported
  docs2pdf --skip-failed

  # Show the resolved page list without rendering anything
  docs2pdf --list-only

  # Use pandoc instead of grip for the HTML step
  docs2pdf --html-renderer pandoc --html-args "{input} -s -o {output}"

  # Machine-readable per-page report
  docs2pdf --json > report.json

SITE CONFIGURATION:
  pages:                      # or nav:
    - ['index.md', 'Home']    # [path, title]
    - about.md                # bare path
    - Install: install.md     # Title: path
    - Guide:                  # nested section, flattened in order
        - guide/one.md

  docs_dir (default Docs) and site_name (PDF title) are read when present.

INTERMEDIATE FILES:
  For each page P the tool writes P.temp, P.temp.html and P.pdf next to
  the source and removes them once the page is merged (--keep-intermediates
  leaves them in place).

REQUIREMENTS:
  grip          https://github.com/joeyespo/grip
  wkhtmltopdf   https://wkhtmltopdf.org
"#;

/// Merge mkdocs documentation pages into a single PDF.
#[derive(Parser, Debug)]
#[command(
    name = "docs2pdf",
    version,
    about = "Merge mkdocs documentation pages into a single PDF",
    long_about = "Read the page list from an mkdocs-style site configuration, render each page \
to PDF with external tools (grip and wkhtmltopdf by default), and concatenate the results in \
page-list order.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Site configuration file.
    #[arg(long, env = "DOCS2PDF_CONFIG", default_value = "mkdocs.yml")]
    config: PathBuf,

    /// Documentation directory (default: docs_dir from the config, else Docs).
    #[arg(long, env = "DOCS2PDF_DOCS_DIR")]
    docs_dir: Option<PathBuf>,

    /// Merged PDF destination.
    #[arg(short, long, env = "DOCS2PDF_OUTPUT", default_value = "output.pdf")]
    output: PathBuf,

    /// Markdown-to-HTML renderer executable.
    #[arg(long, env = "DOCS2PDF_HTML_RENDERER", default_value = "grip")]
    html_renderer: String,

    /// Arguments for the HTML renderer; {input} and {output} are substituted.
    #[arg(
        long,
        env = "DOCS2PDF_HTML_ARGS",
        default_value = "--wide --export {input} {output}",
        allow_hyphen_values = true
    )]
    html_args: String,

    /// HTML-to-PDF renderer executable.
    #[arg(long, env = "DOCS2PDF_PDF_RENDERER", default_value = "wkhtmltopdf")]
    pdf_renderer: String,

    /// Arguments for the PDF renderer; {input} and {output} are substituted.
    #[arg(
        long,
        env = "DOCS2PDF_PDF_ARGS",
        default_value = "-l {input} {output}",
        allow_hyphen_values = true
    )]
    pdf_args: String,

    /// Leave each page's intermediate files on disk.
    #[arg(long, env = "DOCS2PDF_KEEP_INTERMEDIATES")]
    keep_intermediates: bool,

    /// Skip pages that fail instead of aborting.
    #[arg(long, env = "DOCS2PDF_SKIP_FAILED")]
    skip_failed: bool,

    /// Print the resolved page list only, no rendering.
    #[arg(long)]
    list_only: bool,

    /// Print a JSON report instead of the human-readable summary.
    #[arg(long, env = "DOCS2PDF_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOCS2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Log at DEBUG level (overridden by RUST_LOG).
    #[arg(short, long, env = "DOCS2PDF_VERBOSE")]
    verbose: bool,

    /// Print errors only.
    #[arg(short, long, env = "DOCS2PDF_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Tracing ──────────────────────────────────────────────────────────
    // The progress bar replaces INFO-level logs; -v brings them back.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.list_only;
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

    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── List-only mode ───────────────────────────────────────────────────
    if cli.list_only {
        let summary = inspect(&config)
            .await
            .context("Failed to read site configuration")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("Failed to serialise page list")?
            );
        } else {
            let color = io::stdout().is_terminal();

            println!("Config:    {}", summary.site_config.display());
            if let Some(ref name) = summary.site_name {
                println!("Site:      {}", name);
            }
            println!("Docs dir:  {}", summary.docs_dir.display());
            println!("Pages:     {}", summary.pages.len());
            for page in &summary.pages {
                let marker = if page.exists {
                    paint(color, green, "✓")
                } else {
                    paint(color, red, "✗ missing")
                };
                match page.title {
                    Some(ref title) => println!(
                        "  {:>3}. {}  {}  {}",
                        page.page_num,
                        page.path.display(),
                        paint(color, dim, title),
                        marker
                    ),
                    None => println!("  {:>3}. {}  {}", page.page_num, page.path.display(), marker),
                }
            }
        }
        return Ok(());
    }

    // ── Merge ────────────────────────────────────────────────────────────
    let output = convert(&config).await.context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        let stats = &output.stats;
        eprintln!(
            "{}  {}/{} pages  {} PDF pages  {}ms  →  {}",
            if stats.failed_pages == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.merged_pages,
            stats.total_pages,
            stats.output_page_count,
            stats.total_duration_ms,
            bold(&output.output_path.display().to_string()),
        );
        for page in output.pages.iter().filter(|p| !p.is_ok()) {
            if let Some(ref e) = page.error {
                eprintln!("   {} {}", red("skipped"), e);
            }
        }
    }

    Ok(())
}

/// Translate parsed flags into a `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .site_config(&cli.config)
        .output(&cli.output)
        .html_renderer(tool_command(&cli.html_renderer, &cli.html_args))
        .pdf_renderer(tool_command(&cli.pdf_renderer, &cli.pdf_args))
        .keep_intermediates(cli.keep_intermediates)
        .skip_failed_pages(cli.skip_failed);

    if let Some(ref dir) = cli.docs_dir {
        builder = builder.docs_dir(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Split a whitespace-separated argument template into a `ToolCommand`.
///
/// Placeholders are substituted after splitting, so page paths containing
/// spaces stay single arguments.
fn tool_command(program: &str, args: &str) -> ToolCommand {
    ToolCommand::new(program, args.split_whitespace())
}
