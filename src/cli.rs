//! Command-line interface for gosight.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::analysis::{Analyzer, PackageAnalysis};
use crate::config::{self, Config};
use crate::report;
use crate::session::DocumentStore;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Go source analysis: symbols, references, complexity and diagnostics.
#[derive(Parser)]
#[command(name = "gosight")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log level for tracing output (overridden by RUST_LOG).
    #[arg(long, global = true, value_enum, default_value = "warn")]
    pub log_level: LogLevel,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a file or directory and report diagnostics
    #[command(visible_alias = "check")]
    Analyze(PathArgs),
    /// Report code metrics
    Metrics(PathArgs),
    /// List the imports each package actually uses
    Deps(PathArgs),
    /// List the symbols declared in one file
    Symbols(SymbolsArgs),
    /// Write a default config file
    Init(InitArgs),
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
}

/// Arguments for commands that take a file or directory.
#[derive(Parser)]
pub struct PathArgs {
    /// Path to analyze (file or directory)
    pub path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,
}

/// Arguments for the symbols command.
#[derive(Parser)]
pub struct SymbolsArgs {
    /// Go source file
    pub file: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "gosight.yaml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Collect Go files under `root`.
pub fn collect_files(root: &Path, config: &Config) -> anyhow::Result<Vec<PathBuf>> {
    let include_test_files = config.should_include_test_files();
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            // Skip hidden, vendored and fixture directories
            !(name.starts_with('.') || name == "vendor" || name == "testdata")
        })
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("go") {
            continue;
        }
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if !include_test_files && name.ends_with("_test.go") {
            continue;
        }
        if config.is_path_excluded(path) {
            tracing::debug!(path = %path.display(), "excluded by configuration");
            continue;
        }
        files.push(path.to_path_buf());
    }

    Ok(files)
}

/// Load the config named on the command line, or discover one.
fn load_config(cli: &Cli) -> anyhow::Result<(Config, Option<PathBuf>)> {
    let path = match &cli.config {
        Some(p) => Some(p.clone()),
        None => Config::discover(Path::new(".")),
    };
    let config = Config::load(path.as_deref(), Path::new("."))?;
    Ok((config, path))
}

/// Read and analyze every Go file under `path`.
fn analyze_path(path: &Path, config: &Config) -> anyhow::Result<Option<PackageAnalysis>> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| anyhow::anyhow!("cannot access path {:?}: {}", path, e))?;

    let files = if metadata.is_dir() {
        collect_files(path, config)?
    } else {
        vec![path.to_path_buf()]
    };
    if files.is_empty() {
        return Ok(None);
    }

    let mut sources = Vec::with_capacity(files.len());
    for file in &files {
        let text = std::fs::read_to_string(file)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", file.display(), e))?;
        sources.push((file.to_string_lossy().to_string(), text));
    }
    tracing::debug!(files = sources.len(), "analyzing files");

    let analyzer = Analyzer::from_config(config)?;
    let engine = analyzer.diagnostics_engine();
    tracing::debug!(
        rules = ?engine.rule_codes(),
        source = engine.source(),
        "diagnostics configured"
    );
    Ok(Some(analyzer.analyze_package(&sources)))
}

/// Run the analyze command.
pub fn run_analyze(cli: &Cli, args: &PathArgs) -> anyhow::Result<i32> {
    let (config, config_path) = load_config(cli)?;
    let Some(analysis) = analyze_path(&args.path, &config)? else {
        eprintln!("Warning: no files to analyze");
        return Ok(EXIT_SUCCESS);
    };

    let path_str = args.path.to_string_lossy().to_string();
    let config_str = config_path.map(|p| p.to_string_lossy().to_string());
    match args.format {
        OutputFormat::Json => report::write_json(&path_str, config_str.as_deref(), &analysis)?,
        OutputFormat::Pretty => report::write_pretty(&path_str, config_str.as_deref(), &analysis),
    }

    if report::passed(&analysis) {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}

/// Run the metrics command.
pub fn run_metrics(cli: &Cli, args: &PathArgs) -> anyhow::Result<i32> {
    let (config, _) = load_config(cli)?;
    let Some(analysis) = analyze_path(&args.path, &config)? else {
        eprintln!("Warning: no files to analyze");
        return Ok(EXIT_SUCCESS);
    };

    let path_str = args.path.to_string_lossy().to_string();
    match args.format {
        OutputFormat::Json => report::write_metrics_json(&path_str, &analysis)?,
        OutputFormat::Pretty => report::write_metrics_pretty(&path_str, &analysis),
    }
    Ok(EXIT_SUCCESS)
}

/// Run the deps command.
pub fn run_deps(cli: &Cli, args: &PathArgs) -> anyhow::Result<i32> {
    let (config, _) = load_config(cli)?;
    let Some(analysis) = analyze_path(&args.path, &config)? else {
        eprintln!("Warning: no files to analyze");
        return Ok(EXIT_SUCCESS);
    };

    let deps = analysis.dependencies();
    match args.format {
        OutputFormat::Json => report::write_deps_json(&deps)?,
        OutputFormat::Pretty => report::write_deps_pretty(&deps),
    }
    Ok(EXIT_SUCCESS)
}

/// Run the symbols command.
pub fn run_symbols(cli: &Cli, args: &SymbolsArgs) -> anyhow::Result<i32> {
    let (config, _) = load_config(cli)?;
    let text = std::fs::read_to_string(&args.file)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {}", args.file.display(), e))?;
    let uri = args.file.to_string_lossy().to_string();

    let store = DocumentStore::with_analyzer(Analyzer::from_config(&config)?);
    store.open_document(&uri, &text, 1)?;
    let symbols = store.symbols(&uri)?;
    store.close_document(&uri)?;

    match args.format {
        OutputFormat::Json => report::write_symbols_json(&symbols)?,
        OutputFormat::Pretty => report::write_symbols_pretty(&uri, &symbols),
    }
    Ok(EXIT_SUCCESS)
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.output.exists() && !args.force {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or pass --force to overwrite");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            std::fs::create_dir_all(parent)
                .map_err(|e| anyhow::anyhow!("failed to create directory: {}", e))?;
        }
    }

    std::fs::write(&args.output, config::DEFAULT_CONFIG)
        .map_err(|e| anyhow::anyhow!("failed to write config: {}", e))?;

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to customize for your project", args.output.display());
    println!("  2. Run: gosight analyze . --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}

/// Dispatch a parsed command line.
pub fn run(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Analyze(args) => run_analyze(cli, args),
        Commands::Metrics(args) => run_metrics(cli, args),
        Commands::Deps(args) => run_deps(cli, args),
        Commands::Symbols(args) => run_symbols(cli, args),
        Commands::Init(args) => run_init(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_global_options() {
        let cli = Cli::try_parse_from([
            "gosight",
            "--log-level",
            "debug",
            "analyze",
            "src",
            "--format",
            "json",
            "--config",
            "custom.yaml",
        ])
        .unwrap();
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
        match cli.command {
            Commands::Analyze(args) => assert_eq!(args.format, OutputFormat::Json),
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_default_log_level_is_warn() {
        let cli = Cli::try_parse_from(["gosight", "deps", "."]).unwrap();
        assert_eq!(cli.log_level, LogLevel::Warn);
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["gosight", "metrics", ".", "--format", "sarif"]).is_err());
    }

    #[test]
    fn test_collect_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("vendor/dep")).unwrap();
        std::fs::create_dir_all(root.join("gen")).unwrap();
        std::fs::write(root.join("main.go"), "package main\n").unwrap();
        std::fs::write(root.join("main_test.go"), "package main\n").unwrap();
        std::fs::write(root.join("README.md"), "docs\n").unwrap();
        std::fs::write(root.join("vendor/dep/dep.go"), "package dep\n").unwrap();
        std::fs::write(root.join("gen/api.go"), "package gen\n").unwrap();

        let config = Config::default();
        let files = collect_files(root, &config).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["gen/api.go", "main.go"]);

        let config = Config::parse_str("include_test_files: true\nexcluded_paths: [\"**/gen/**\"]\n")
            .unwrap();
        let files = collect_files(root, &config).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().any(|p| p.ends_with("main_test.go")));
        assert!(!files.iter().any(|p| p.ends_with("api.go")));
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("gosight.yaml");
        let args = InitArgs {
            output: output.clone(),
            force: false,
        };
        assert_eq!(run_init(&args).unwrap(), EXIT_SUCCESS);
        assert!(Config::parse_file(&output).is_ok());
        assert_eq!(run_init(&args).unwrap(), EXIT_ERROR);
    }
}
