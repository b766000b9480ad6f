use anyhow::Result;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use media_batch::cli::{Command, RootArgs};
use media_batch::{config, run, status};

fn main() -> Result<()> {
    let args = RootArgs::parse();
    match args.command {
        Command::Run(args) => {
            init_logging(args.verbose, args.quiet);
            run::run_batch(&args)
        }
        Command::Status(args) => {
            init_logging(false, false);
            status::run_status(&args)
        }
        Command::Config => {
            println!("{}", config::config_stub()?);
            Ok(())
        }
    }
}

/// Map verbosity flags onto a tracing subscriber.
///
/// `RUST_LOG` still wins when neither flag is set.
fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true),
        )
        .init();
}
