#![warn(missing_docs)]
//! wasmjig CLI Library
//!
//! This module provides the CLI infrastructure for test runner binaries.
//! The binary supplies a [`Compiler`] and a [`Runtime`]; wasmjig discovers
//! entry files, compiles them, runs every module and reports the results.
//!
//! # Example
//!
//! ```ignore
//! fn main() -> anyhow::Result<()> {
//!     wasmjig_cli::run(&my_compiler, &my_runtime)
//! }
//! ```

mod config;
mod entries;
mod runner;
mod toolchain;

pub use config::*;
pub use entries::{EntryPlan, build_plan, plan_entries, resolve_globs};
pub use runner::{RunOptions, RunOutcome, run_modules};
pub use toolchain::{
    Artifact, CompileError, CompileOutput, Compiler, CompilerFlags, Runtime, companion_imports,
};

use clap::Parser;
use regex::Regex;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use wasmjig_core::PerformanceOverrides;
use wasmjig_report::{
    DefaultReporter, EmptyReporter, ReporterKind, SummaryReporter, generate_json_report,
};

/// wasmjig CLI arguments
#[derive(Parser, Debug)]
#[command(name = "wasmjig")]
#[command(author, version, about = "wasmjig - test runner for WebAssembly guest modules")]
pub struct Cli {
    /// Configuration file (defaults to the nearest wasmjig.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write a default wasmjig.toml to the current directory and exit
    #[arg(long)]
    pub init: bool,

    /// Reporter: default, summary, json, empty
    #[arg(short, long)]
    pub reporter: Option<ReporterKind>,

    /// Output file, relative to the working directory (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only run entry files whose path matches this regex
    #[arg(long)]
    pub file: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Sample every test
    #[arg(long, action = clap::ArgAction::Set)]
    pub performance: Option<bool>,

    /// Stop sampling a test after this many samples
    #[arg(long)]
    pub max_samples: Option<u32>,

    /// Stop sampling a test after this long (e.g. "500ms", "2s"; bare numbers are ms)
    #[arg(long, value_parser = WasmjigConfig::parse_duration_ms)]
    pub max_test_run_time: Option<f64>,

    /// Decimal places reported statistics are rounded to
    #[arg(long)]
    pub round_decimal_places: Option<u32>,

    /// Report the mean
    #[arg(long, action = clap::ArgAction::Set)]
    pub report_average: Option<bool>,

    /// Report the median
    #[arg(long, action = clap::ArgAction::Set)]
    pub report_median: Option<bool>,

    /// Report the standard deviation
    #[arg(long, action = clap::ArgAction::Set)]
    pub report_std_dev: Option<bool>,

    /// Report the slowest sample
    #[arg(long, action = clap::ArgAction::Set)]
    pub report_max: Option<bool>,

    /// Report the fastest sample
    #[arg(long, action = clap::ArgAction::Set)]
    pub report_min: Option<bool>,

    /// Report the variance
    #[arg(long, action = clap::ArgAction::Set)]
    pub report_variance: Option<bool>,
}

impl Cli {
    /// Performance settings given on the command line; they win over wasmjig.toml
    pub fn performance_overrides(&self) -> PerformanceOverrides {
        PerformanceOverrides {
            enabled: self.performance,
            max_samples: self.max_samples,
            max_test_run_time: self.max_test_run_time,
            round_decimal_places: self.round_decimal_places,
            report_average: self.report_average,
            report_median: self.report_median,
            report_std_dev: self.report_std_dev,
            report_max: self.report_max,
            report_min: self.report_min,
            report_variance: self.report_variance,
        }
    }
}

/// Run the wasmjig CLI with the process arguments.
/// This is the main entry point for test runner binaries.
///
/// Exits the process with status 1 when any module fails.
pub fn run<C, R>(compiler: &C, runtime: &R) -> anyhow::Result<()>
where
    C: Compiler + ?Sized,
    R: Runtime + ?Sized,
{
    let cli = Cli::parse();
    run_with_cli(cli, compiler, runtime)
}

/// Run the wasmjig CLI with pre-parsed arguments.
pub fn run_with_cli<C, R>(cli: Cli, compiler: &C, runtime: &R) -> anyhow::Result<()>
where
    C: Compiler + ?Sized,
    R: Runtime + ?Sized,
{
    // Initialize logging
    let filter = if cli.verbose {
        "wasmjig=debug"
    } else {
        "wasmjig=info"
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let cwd = std::env::current_dir()?;
    if cli.init {
        let path = write_default_config(&cwd)?;
        println!("Created {}", path.display());
        return Ok(());
    }

    let (config, root) = load_config(&cli, &cwd)?;
    let Some(outcome) = execute(&cli, &config, &root, &cwd, compiler, runtime)? else {
        return Ok(());
    };

    if !outcome.success() {
        std::process::exit(1);
    }
    Ok(())
}

/// Write the default configuration into `dir`, refusing to overwrite
pub fn write_default_config(dir: &Path) -> anyhow::Result<PathBuf> {
    let path = dir.join(CONFIG_FILE);
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    std::fs::write(&path, WasmjigConfig::default_toml())?;
    Ok(path)
}

/// Load the configuration and the directory its globs are relative to.
///
/// `--config` wins, then the nearest wasmjig.toml, then built-in defaults
/// relative to `cwd`.
pub fn load_config(cli: &Cli, cwd: &Path) -> anyhow::Result<(WasmjigConfig, PathBuf)> {
    let path = match &cli.config {
        Some(path) => Some(cwd.join(path)),
        None => WasmjigConfig::find(cwd),
    };

    match path {
        Some(path) => {
            let config = WasmjigConfig::load(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", path.display(), e))?;
            let root = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| cwd.to_path_buf());
            tracing::debug!(config = %path.display(), "Loaded configuration");
            Ok((config, root))
        }
        None => Ok((WasmjigConfig::default(), cwd.to_path_buf())),
    }
}

/// Plan, compile, run and report.
///
/// Config paths resolve against `root`; `--output` resolves against `cwd`.
/// Returns `None` when no entry file matched.
pub fn execute<C, R>(
    cli: &Cli,
    config: &WasmjigConfig,
    root: &Path,
    cwd: &Path,
    compiler: &C,
    runtime: &R,
) -> anyhow::Result<Option<RunOutcome>>
where
    C: Compiler + ?Sized,
    R: Runtime + ?Sized,
{
    let file_filter = cli.file.as_deref().map(Regex::new).transpose()?;
    let disclude = config.disclude_patterns()?;
    let plan = plan_entries(
        &config.include,
        &config.add,
        &disclude,
        file_filter.as_ref(),
        root,
    )?;

    if plan.is_empty() {
        println!("No test entry files found.");
        return Ok(None);
    }

    let options = RunOptions {
        defaults: cli
            .performance_overrides()
            .apply_to(&config.performance_defaults()),
        filter: config.stack_filter()?,
        flags: config.flags.clone(),
        imports: config.imports.as_ref().map(|path| root.join(path)),
    };
    let reporter = cli.reporter.unwrap_or(config.output.reporter);
    let output = cli
        .output
        .as_ref()
        .map(|path| cwd.join(path))
        .or_else(|| config.output.file.as_ref().map(|path| root.join(path)));

    tracing::info!(
        entries = plan.entries.len(),
        added = plan.added.len(),
        reporter = ?reporter,
        "Running wasmjig"
    );

    let mut sink = open_output(output.as_deref())?;
    let outcome = match reporter {
        ReporterKind::Default => {
            let mut reporter = DefaultReporter::new(&mut sink);
            let outcome = run_modules(&plan, &options, compiler, runtime, &mut reporter);
            reporter.finish()?;
            write_module_errors(&mut sink, &outcome)?;
            outcome
        }
        ReporterKind::Summary => {
            let mut reporter = SummaryReporter::new(&mut sink);
            let outcome = run_modules(&plan, &options, compiler, runtime, &mut reporter);
            reporter.finish()?;
            write_module_errors(&mut sink, &outcome)?;
            outcome
        }
        ReporterKind::Json => {
            let outcome = run_modules(&plan, &options, compiler, runtime, &mut EmptyReporter);
            let report = outcome.clone().into_report();
            writeln!(sink, "{}", generate_json_report(&report)?)?;
            outcome
        }
        ReporterKind::Empty => {
            run_modules(&plan, &options, compiler, runtime, &mut EmptyReporter)
        }
    };
    sink.flush()?;

    if let Some(path) = &output {
        tracing::info!("Report written to: {}", path.display());
    }

    Ok(Some(outcome))
}

fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Ok(Box::new(BufWriter::new(File::create(path)?)))
        }
        None => Ok(Box::new(io::stdout())),
    }
}

fn write_module_errors(out: &mut impl Write, outcome: &RunOutcome) -> io::Result<()> {
    for error in &outcome.errors {
        writeln!(out, "\n[Error]: {}: {}", error.file, error.message)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_performance_overrides() {
        let cli = Cli::try_parse_from([
            "wasmjig",
            "--performance",
            "true",
            "--max-samples",
            "25",
            "--max-test-run-time",
            "1.5s",
            "--report-median",
            "false",
        ])
        .unwrap();

        let overrides = cli.performance_overrides();
        assert_eq!(overrides.enabled, Some(true));
        assert_eq!(overrides.max_samples, Some(25));
        assert_eq!(overrides.max_test_run_time, Some(1_500.0));
        assert_eq!(overrides.report_median, Some(false));
        assert_eq!(overrides.report_average, None);
    }

    #[test]
    fn test_cli_defaults_are_unset() {
        let cli = Cli::try_parse_from(["wasmjig"]).unwrap();
        assert!(cli.performance_overrides().is_empty());
        assert!(cli.reporter.is_none());
        assert!(!cli.init);
    }

    #[test]
    fn test_cli_rejects_bad_values() {
        assert!(Cli::try_parse_from(["wasmjig", "--reporter", "xml"]).is_err());
        assert!(Cli::try_parse_from(["wasmjig", "--max-test-run-time", "soon"]).is_err());
        assert!(Cli::try_parse_from(["wasmjig", "--performance"]).is_err());
    }

    #[test]
    fn test_load_config_prefers_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("pkg");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "include = [\"outer/*.ts\"]").unwrap();
        std::fs::write(nested.join("custom.toml"), "include = [\"inner/*.ts\"]").unwrap();

        let cli = Cli::try_parse_from(["wasmjig"]).unwrap();
        let (config, root) = load_config(&cli, &nested).unwrap();
        assert_eq!(config.include, vec!["outer/*.ts"]);
        assert_eq!(root, dir.path());

        let cli = Cli::try_parse_from(["wasmjig", "-c", "custom.toml"]).unwrap();
        let (config, root) = load_config(&cli, &nested).unwrap();
        assert_eq!(config.include, vec!["inner/*.ts"]);
        assert_eq!(root, nested);
    }

    #[test]
    fn test_write_default_config_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_default_config(dir.path()).unwrap();
        assert!(WasmjigConfig::load(&path).is_ok());
        assert!(write_default_config(dir.path()).is_err());
    }
}
