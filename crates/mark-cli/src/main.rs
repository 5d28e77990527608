//! mark: CLI tool to convert markdown files to HTML

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use config::Config;
use mark_core::fixture::{self, FixtureOutcome};
use mark_core::{BatchOptions, Mark, Options, convert_directory};

#[derive(Parser, Debug)]
#[command(name = "mark")]
#[command(about = "Convert markdown files to HTML")]
#[command(version)]
#[command(after_help = "Examples:
  mark README.md                    # Print README.md as HTML
  mark README.md -o README.html     # Convert to a specific output file
  cat notes.md | mark               # Convert stdin to stdout
  mark docs/ -r -o site/ -j4        # Convert a directory tree with 4 jobs
  mark --fixtures tests/fixtures    # Check .text/.html fixture pairs")]
struct Cli {
    /// Input markdown file or directory (stdin when omitted or `-`)
    input: Option<PathBuf>,

    /// Output file or directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Curly quotes, dashes and ellipses
    #[arg(long)]
    smartypants: bool,

    /// Fraction glyphs for 1/2, 1/4 and 3/4 (with --smartypants)
    #[arg(long)]
    fractions: bool,

    /// Disable fenced code, strikethrough and bare URL links
    #[arg(long)]
    no_gfm: bool,

    /// Print the parsed node tree as JSON instead of HTML
    #[arg(long)]
    ast: bool,

    /// Configuration file (defaults to `_mark.toml` in the working directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Check `<name>.text`/`<name>.html` fixture pairs in a directory
    #[arg(long, value_name = "DIR", conflicts_with_all = ["input", "ast"])]
    fixtures: Option<PathBuf>,

    /// Number of parallel jobs (defaults to number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Process directories recursively
    #[arg(short, long)]
    recursive: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only show errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Defaults, then the config file, then command line flags
    fn options(&self) -> Result<Options> {
        let config = match &self.config {
            Some(path) => Some(Config::load(path)?),
            None => Config::load_from_dir(Path::new("."))?,
        };

        let mut options = match &config {
            Some(config) => config.apply(Options::default()),
            None => Options::default(),
        };
        if self.smartypants {
            options.smartypants = true;
        }
        if self.fractions {
            options.fractions = true;
        }
        if self.no_gfm {
            options.gfm = false;
        }
        Ok(options)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let options = cli.options()?;
    log::debug!("options: {options:?}");

    if cli.print_config {
        print!("{}", Config::from_options(&options).to_toml()?);
        return Ok(());
    }

    if let Some(dir) = &cli.fixtures {
        return run_fixtures(dir, cli.quiet);
    }

    match cli.input.as_deref() {
        None => convert_stdin(&options, cli.output.as_deref(), cli.ast),
        Some(path) if path == Path::new("-") => {
            convert_stdin(&options, cli.output.as_deref(), cli.ast)
        }
        Some(path) if path.is_file() => {
            convert_file(path, cli.output.as_deref(), &options, cli.ast, cli.quiet)
        }
        Some(path) if path.is_dir() => {
            if cli.ast {
                anyhow::bail!("--ast needs a single input file");
            }
            let batch = BatchOptions {
                output_dir: cli.output.clone(),
                recursive: cli.recursive,
                parallel_jobs: cli.jobs,
                options,
            };
            convert_dir(path, &batch, cli.quiet)
        }
        Some(path) => anyhow::bail!("Input path does not exist: {}", path.display()),
    }
}

/// `-v` shows debug logs, `-q` only errors; `RUST_LOG` overrides both
fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Render `source` as HTML, or as a JSON node tree when `ast` is set
fn convert_source(source: &str, options: &Options, ast: bool) -> Result<String> {
    let mark = Mark::new(source, Some(*options));
    if ast {
        let mut json =
            serde_json::to_string_pretty(mark.document()).context("Failed to serialize tree")?;
        json.push('\n');
        Ok(json)
    } else {
        let mut html = mark.render();
        html.push('\n');
        Ok(html)
    }
}

fn convert_stdin(options: &Options, output: Option<&Path>, ast: bool) -> Result<()> {
    let mut source = String::new();
    io::stdin()
        .read_to_string(&mut source)
        .context("Failed to read stdin")?;

    let rendered = convert_source(&source, options, ast)?;
    write_output(output, &rendered)
}

/// Convert a single markdown file; without `-o` the result goes to stdout
fn convert_file(
    input: &Path,
    output: Option<&Path>,
    options: &Options,
    ast: bool,
    quiet: bool,
) -> Result<()> {
    log::debug!("converting {}", input.display());

    let source = fs::read_to_string(input)
        .with_context(|| format!("Failed to read: {}", input.display()))?;
    let rendered = convert_source(&source, options, ast)?;

    write_output(output, &rendered)?;
    if let Some(path) = output
        && !quiet
    {
        eprintln!("{}", path.display());
    }
    Ok(())
}

fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
            fs::write(path, content)
                .with_context(|| format!("Failed to write: {}", path.display()))
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(content.as_bytes())
                .context("Failed to write stdout")?;
            stdout.flush().context("Failed to write stdout")
        }
    }
}

/// Convert a directory of markdown files
fn convert_dir(input: &Path, options: &BatchOptions, quiet: bool) -> Result<()> {
    let result = convert_directory(input, options)
        .with_context(|| format!("Failed to convert directory: {}", input.display()))?;

    if result.success_count == 0 && result.failed_files.is_empty() {
        if !quiet {
            eprintln!("No markdown files found in {}", input.display());
        }
        return Ok(());
    }

    if !quiet {
        for path in &result.output_files {
            println!("{}", path.display());
        }
    }
    for (file, e) in &result.failed_files {
        eprintln!("Error converting {}: {}", file.display(), e);
    }

    let failed_count = result.failed_files.len();
    if !quiet {
        eprintln!(
            "Converted {} files, {} failed",
            result.success_count, failed_count
        );
    }

    if failed_count > 0 {
        anyhow::bail!("{} files failed to convert", failed_count);
    }
    Ok(())
}

/// Check every fixture in `dir`, printing each mismatch
fn run_fixtures(dir: &Path, quiet: bool) -> Result<()> {
    let report = fixture::run(dir)
        .with_context(|| format!("Failed to run fixtures in {}", dir.display()))?;

    for (name, outcome) in &report.mismatches {
        if let FixtureOutcome::Mismatch { expected, actual } = outcome {
            eprintln!("FAIL {name}\n  expected: {expected}\n  actual:   {actual}");
        }
    }

    let failed = report.mismatches.len();
    if !quiet {
        eprintln!("{} passed, {} failed", report.passed, failed);
    }
    if failed > 0 {
        anyhow::bail!("{} fixtures failed", failed);
    }
    Ok(())
}
