//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to [`run`] or [`health`].

pub mod health;
pub mod run;

use crate::cli::{Cli, Commands};
use crate::error::ServiceError;

pub async fn dispatch(cli: Cli) -> Result<(), ServiceError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(*args).await,
        Some(Commands::Health(args)) => health::execute(args).await,
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  webmux v{version}: HTTP service with a composed middleware pipeline\n\n  \
         No command provided. To get started:\n\n    \
         webmux run                        Serve every route group on :3000\n    \
         webmux run --routes check         Serve liveness and readiness only\n    \
         webmux health                     Probe http://localhost:3000\n    \
         webmux --help                     See all commands and options\n"
    );
}
