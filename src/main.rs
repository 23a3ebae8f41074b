//! doctodo CLI
//!
//! Usage:
//!   doctodo [OPTIONS] [SOURCE_DIR]
//!
//! Builds every `.tdoc` document below SOURCE_DIR (default: the current
//! directory) into `<out_dir>/<format>/`, or lists the todo entries with `--list`.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use doctodo::config::Config;
use doctodo::project::{load_config, TodoReport};
use doctodo::{BuildError, BuildWarning, OutputFormat, Project};

#[derive(Parser)]
#[command(name = "doctodo")]
#[command(version, about = "Build documents with todo annotations")]
struct Cli {
    /// Project root holding the sources and doctodo.toml
    #[arg(default_value = ".")]
    source_dir: PathBuf,

    /// Configuration file (default: SOURCE_DIR/doctodo.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory, relative to the project root
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Worker threads used to read sources
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Render todo entries and todo lists
    #[arg(long)]
    include_annotations: bool,

    /// Backlinks without the file and line sentence
    #[arg(long)]
    link_only: bool,

    /// Warn about every todo entry while reading
    #[arg(long)]
    emit_warnings: bool,

    /// Exit with status 1 when the build produced warnings
    #[arg(short = 'W', long)]
    fail_on_warning: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Print every todo entry instead of building
    #[arg(long)]
    list: bool,

    /// With --list: print JSON
    #[arg(long, requires = "list")]
    json: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "doctodo=debug"
    } else {
        "doctodo=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(warnings) => {
            if cli.fail_on_warning && warnings > 0 {
                eprintln!("build produced {} warning(s)", warnings);
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Returns the number of warnings
fn run(cli: &Cli) -> Result<usize, BuildError> {
    let config = configure(cli)?;
    let format = config.build.format;
    let project = Project::with_config(&cli.source_dir, config)?;

    if cli.list {
        let report = project.collect_todos()?;
        print_todos(&report, cli.json)?;
        return Ok(report.warnings.len());
    }

    let report = project.build(format)?;
    print_warnings(&report.warnings);
    println!(
        "{} document(s) written to {}",
        report.written.len(),
        project.out_dir().join(format.name()).display()
    );
    Ok(report.warnings.len())
}

/// The configuration file with command-line overrides applied
fn configure(cli: &Cli) -> Result<Config, BuildError> {
    let mut config = load_config(&cli.source_dir, cli.config.as_deref())?;

    if let Some(out_dir) = &cli.out_dir {
        config.build.out_dir = out_dir.clone();
    }
    if let Some(format) = cli.format {
        config.build.format = format;
    }
    if let Some(jobs) = cli.jobs {
        config.build.jobs = jobs.max(1);
    }
    if cli.include_annotations {
        config.set("todo", "include_annotations", true);
    }
    if cli.link_only {
        config.set("todo", "link_only", true);
    }
    if cli.emit_warnings {
        config.set("todo", "emit_warnings", true);
    }
    Ok(config)
}

fn print_todos(report: &TodoReport, json: bool) -> Result<(), BuildError> {
    if json {
        println!("{}", serde_json::to_string_pretty(&report.todos)?);
        return Ok(());
    }
    for marker in &report.todos {
        match marker.line {
            Some(line) => println!("{}:{}: {}", marker.source, line, marker.text()),
            None => println!("{}: {}", marker.source, marker.text()),
        }
    }
    Ok(())
}

fn print_warnings(warnings: &[BuildWarning]) {
    for warning in warnings {
        eprintln!("{}", warning);
    }
    if !warnings.is_empty() {
        eprintln!("build succeeded, {} warning(s).", warnings.len());
    }
}
