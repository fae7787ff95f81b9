//! `dotlink` command-line entry point.
use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{CommandFactory as _, Parser as _};

use dotlink::cli::{Cli, Command};
use dotlink::commands;
use dotlink::logging::{self, Log, Logger};
use dotlink::operations::{FileSystemOps, SystemFileSystemOps};

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    let command = args.command.clone().unwrap_or_default();

    match &command {
        Command::Completions { shell } => {
            clap_complete::generate(*shell, &mut Cli::command(), "dotlink", &mut io::stdout());
            return ExitCode::SUCCESS;
        }
        Command::Version => {
            let version = option_env!("DOTLINK_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
            println!("dotlink {version}");
            return ExitCode::SUCCESS;
        }
        Command::Install | Command::Clean | Command::Add(_) => {}
    }

    logging::init_subscriber(args.global.verbosity(), command.name());
    let logger = Logger::new(command.name());
    let log_path = logger.log_path().map(Path::to_path_buf);
    let log: Arc<dyn Log> = Arc::new(logger);
    let fs: Arc<dyn FileSystemOps> = Arc::new(SystemFileSystemOps);

    let result = match &command {
        Command::Install => commands::install::run(&args.global, &fs, &log),
        Command::Clean => commands::clean::run(&args.global, &fs, &log),
        Command::Add(opts) => commands::add::run(&args.global, opts, &fs, &log),
        Command::Completions { .. } | Command::Version => Ok(()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log.error(&format!("{e:#}"));
            if let Some(path) = log_path {
                log.info(&format!("full log: {}", path.display()));
            }
            ExitCode::FAILURE
        }
    }
}
