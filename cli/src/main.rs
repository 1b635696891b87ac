mod config;
mod manifest;
mod output;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use common::{CrontabSession, CrontabStore, Definition, FieldValue, ScheduleRecord};
use config::{Config, LoggingConfig};
use manifest::Manifest;
use output::OutputFormat;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (.yaml, .yml or .toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Edit this user's crontab instead of your own
    #[arg(short, long, global = true)]
    user: Option<String>,
    /// More logging; repeat for trace
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List crontab entries by id
    List {
        /// Print the crontab lines as installed
        #[arg(long)]
        raw: bool,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Add or replace an entry
    Add {
        id: String,
        /// Full crontab line, e.g. "5,35 0-23/2 * * * echo 123"
        #[arg(conflicts_with_all = ["minute", "hour", "day", "month", "weekday", "command"])]
        line: Option<String>,
        #[arg(long)]
        minute: Option<String>,
        #[arg(long)]
        hour: Option<String>,
        #[arg(long)]
        day: Option<String>,
        #[arg(long)]
        month: Option<String>,
        #[arg(long)]
        weekday: Option<String>,
        #[arg(short, long)]
        command: Option<String>,
        /// Show the pending change instead of installing it
        #[arg(long)]
        dry_run: bool,
    },
    /// Remove entries
    Remove {
        #[arg(required = true)]
        ids: Vec<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Add every line of a crontab file ("-" for stdin)
    Import {
        file: String,
        #[arg(long)]
        dry_run: bool,
    },
    /// Apply a manifest of entries and removals
    Apply {
        manifest: PathBuf,
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the expanded fields of a crontab line
    Parse {
        line: String,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if cli.user.is_some() {
        config.crontab.user = cli.user;
    }
    setup_logging(&config.logging, cli.verbose)?;
    log::debug!("using config: {:?}", config);

    let mut session = CrontabSession::new(config.store()).with_consistency(config.consistency());
    let stdout = std::io::stdout();
    run(cli.command, &mut session, &mut stdout.lock())
}

fn run<S: CrontabStore, W: Write>(command: Commands, session: &mut CrontabSession<S>, out: &mut W) -> anyhow::Result<()> {
    let dry_run = match command {
        Commands::List { raw: true, .. } => {
            for line in session.list_raw()? {
                writeln!(out, "{}", line)?;
            }
            return Ok(());
        }
        Commands::List { raw: false, format } => {
            return output::write_snapshot(out, &session.list()?, format);
        }
        Commands::Parse { line, format } => {
            let record = ScheduleRecord::decode(&line)?;
            return output::write_record(out, &record, format);
        }
        Commands::Add { id, line, minute, hour, day, month, weekday, command, dry_run } => {
            let definition = match line {
                Some(line) => Definition::Text(line),
                None => {
                    let fields = [
                        ("minute", minute),
                        ("hour", hour),
                        ("day", day),
                        ("month", month),
                        ("weekday", weekday),
                        ("command", command),
                    ];
                    Definition::fields(
                        fields
                            .into_iter()
                            .filter_map(|(k, v)| v.map(|v| (k, FieldValue::Text(v)))),
                    )
                }
            };
            session
                .add(id.as_str(), &definition)
                .with_context(|| format!("Invalid definition for '{}'", id))?;
            dry_run
        }
        Commands::Remove { ids, dry_run } => {
            for id in ids {
                session
                    .remove(id.as_str())
                    .with_context(|| format!("Invalid id '{}'", id))?;
            }
            dry_run
        }
        Commands::Import { file, dry_run } => {
            let reader: Box<dyn BufRead> = if file == "-" {
                Box::new(std::io::stdin().lock())
            } else {
                let f = std::fs::File::open(&file)
                    .with_context(|| format!("Failed to open {}", file))?;
                Box::new(BufReader::new(f))
            };
            let count = session
                .import_from(reader)
                .with_context(|| format!("Failed to import {}", file))?;
            log::info!("staged {} entries from {}", count, file);
            dry_run
        }
        Commands::Apply { manifest, dry_run } => {
            Manifest::from_file(&manifest)?.stage(session)?;
            dry_run
        }
    };

    if dry_run {
        write!(out, "{}", session.review())?;
        session.rollback();
        return Ok(());
    }

    let merged = session.commit().context("Failed to install crontab")?;
    writeln!(out, "Installed crontab with {} entries", merged.len())?;
    Ok(())
}

fn setup_logging(logging: &LoggingConfig, verbose: u8) -> anyhow::Result<()> {
    let level = match verbose {
        0 => logging.level.parse::<log::LevelFilter>()
            .map_err(|_| anyhow::anyhow!("Invalid log level: {}", logging.level))?,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {}",
                chrono::Local::now().format("%Y-%m-%d][%H:%M:%S"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr());

    // CRONEDIT_LOG wins over the config file
    let log_file = std::env::var_os(common::LOG_ENV_VAR)
        .map(PathBuf::from)
        .or_else(|| logging.output.clone());
    if let Some(path) = log_file {
        dispatch = dispatch.chain(fern::log_file(&path)
            .with_context(|| format!("Failed to open log file {:?}", path))?);
    }

    dispatch.apply()?;
    Ok(())
}
