//! recordcheck CLI.
//!
//! Checks JSON input against a schema document or a catalog schema, replays
//! the validation lessons, and summarizes the git repository in the current
//! directory.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use recordcheck::check::{SchemaSource, run_check};
use recordcheck::demo::{Lesson, run_lesson};
use recordcheck::exit_codes;
use recordcheck::io::config::{CONFIG_FILE, Config, OutputFormat, load_config};
use recordcheck::io::init::{InitOptions, init_project};
use recordcheck::io::input::STDIN;
use recordcheck::logging;
use recordcheck::report::render;
use recordcheck::repo::summarize;

#[derive(Parser)]
#[command(
    name = "recordcheck",
    version,
    about = "Validate records against declarative schemas"
)]
struct Cli {
    /// Config file (missing file means defaults).
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate one JSON object; exits 2 when it is rejected.
    Check(CheckArgs),
    /// Walk through the catalog schemas.
    Demo {
        #[arg(value_enum, default_value_t = Lesson::All)]
        lesson: Lesson,
    },
    /// Summarize the git repository in the current directory.
    Repo {
        /// Number of recent commits to list (default from config).
        #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
        log: Option<usize>,
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Write the default config and example schemas.
    Init {
        /// Overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Args)]
struct CheckArgs {
    /// Schema document (JSON).
    #[arg(long, conflicts_with = "catalog", required_unless_present = "catalog")]
    schema: Option<PathBuf>,
    /// Built-in catalog schema name.
    #[arg(long)]
    catalog: Option<String>,
    /// Input file, or `-` for stdin.
    #[arg(long, default_value = STDIN)]
    input: String,
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
}

impl CheckArgs {
    fn source(&self) -> SchemaSource {
        match (&self.schema, &self.catalog) {
            (Some(path), _) => SchemaSource::File(path.clone()),
            (None, Some(name)) => SchemaSource::Catalog(name.clone()),
            // clap requires one of the two.
            (None, None) => SchemaSource::Catalog(String::new()),
        }
    }
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::ERROR);
        }
    }
}

fn run() -> Result<i32> {
    // Usage errors exit 1; 2 is reserved for rejected input.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                exit_codes::ERROR
            } else {
                exit_codes::OK
            };
            err.print().context("print usage")?;
            return Ok(code);
        }
    };
    match cli.command {
        Command::Check(args) => cmd_check(&cli.config, &args),
        Command::Demo { lesson } => cmd_demo(lesson),
        Command::Repo { log, format } => cmd_repo(&cli.config, log, format),
        Command::Init { force } => cmd_init(&cli.config, force),
    }
}

fn cmd_check(config_path: &Path, args: &CheckArgs) -> Result<i32> {
    let config = load_config(config_path)?;
    let format = args.format.unwrap_or(config.output.format);
    let (schema, outcome) = run_check(&args.source(), &args.input)?;
    let rendered = render(schema.name(), &outcome, format)?;
    println!("{}", rendered.trim_end());
    Ok(outcome.exit_code())
}

fn cmd_demo(lesson: Lesson) -> Result<i32> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_lesson(lesson, &mut out)?;
    out.flush().context("flush stdout")?;
    Ok(exit_codes::OK)
}

fn cmd_repo(config_path: &Path, log: Option<usize>, format: Option<OutputFormat>) -> Result<i32> {
    let config: Config = load_config(config_path)?;
    let workdir = std::env::current_dir().context("resolve current directory")?;
    let entries = log.unwrap_or(config.git.log_entries);
    let summary = summarize(&workdir, config.git.limits(), entries)?;
    match format.unwrap_or(config.output.format) {
        OutputFormat::Text => println!("{summary}"),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("serialize repo summary")?
        ),
    }
    Ok(exit_codes::OK)
}

fn cmd_init(config_path: &Path, force: bool) -> Result<i32> {
    let root = std::env::current_dir().context("resolve current directory")?;
    let options = InitOptions {
        force,
        config_file: config_path.to_path_buf(),
    };
    let paths = init_project(&root, &options)?;
    println!("wrote {}", paths.config_path.display());
    println!("wrote {}", paths.document_schema_path.display());
    println!("wrote {}", paths.example_schema_path.display());
    Ok(exit_codes::OK)
}
