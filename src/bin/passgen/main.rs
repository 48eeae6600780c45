use std::path::PathBuf;
use std::process;

use clap::Parser;
use rand::rngs::ThreadRng;

use passgen::{App, Config, FileStore, GeneratorOptions, Notice, SystemClipboard};

mod commands;
mod interactive;
mod select;
mod table;

/// Generate random passwords and keep a history of them.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Directory holding the history and config.yaml [default: $PASSGEN_HOME, or ~/.passgen]
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Log more; repeat for debug output.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Generate a password, print it, and add it to the history.
    Generate(commands::GenerateArgs),
    /// List previously generated passwords, newest first.
    History,
    /// Pick a password from the history and copy it to the clipboard.
    Copy,
    /// Delete the whole history.
    Clear {
        /// Don't ask for confirmation.
        #[arg(long)]
        yes: bool,
    },
    /// Browse the generator and history screens in the terminal. This is the default.
    Interactive,
}

type CliApp = App<FileStore, SystemClipboard, ThreadRng>;

fn run(args: Args) -> Result<(), ProgError> {
    let mut app = load_app(args.data_dir)?;

    match args.command.unwrap_or(Command::Interactive) {
        Command::Generate(gen_args) => commands::generate(&mut app, gen_args)?,
        Command::History => commands::list_history(&app)?,
        Command::Copy => commands::copy_from_history(&mut app)?,
        Command::Clear { yes } => commands::clear_history(&mut app, yes)?,
        Command::Interactive => interactive::run(&mut app)?,
    }

    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(()) => (),
        Err(ProgError::Other(err)) => {
            eprintln!("{err:?}");
            process::exit(1);
        }
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .format_timestamp_secs()
        .init();
}

fn load_app(data_dir: Option<PathBuf>) -> Result<CliApp, ProgError> {
    let data_dir = passgen::config::resolve_data_dir(data_dir)?;
    let config = Config::load(data_dir)?;
    log::debug!("using data directory {}", config.data_dir.display());

    let options = GeneratorOptions {
        length: config.default_length,
        classes: config.default_classes,
    };
    let app = App::new(
        config.history(),
        config.clipboard(),
        rand::thread_rng(),
        options,
    )
    .with_copy_on_generate(config.copy_on_generate);
    Ok(app)
}

#[derive(Debug, thiserror::Error)]
enum ProgError {
    #[error("{0}")]
    Notice(Notice),
    #[error("Selection cancelled; exiting.")]
    SelectionCancelled,
    #[error("Clear aborted; exiting.")]
    ClearAborted,
    #[error("Configuration error: {0}")]
    Config(passgen::ConfigError),
    #[error(transparent)]
    Other(anyhow::Error),
}

impl From<anyhow::Error> for ProgError {
    fn from(err: anyhow::Error) -> ProgError {
        ProgError::Other(err)
    }
}

impl From<passgen::ConfigError> for ProgError {
    fn from(err: passgen::ConfigError) -> ProgError {
        ProgError::Config(err)
    }
}
