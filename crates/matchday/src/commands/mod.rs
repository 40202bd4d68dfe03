//! Command handlers for everything that talks to the match service.

pub mod commentary;
pub mod config_cmd;
pub mod watch;

use matchday_core::LiveConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, Printer};

pub async fn dispatch(cmd: Command, config: LiveConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let printer = printer(global);
    match cmd {
        Command::Watch(args) => watch::handle(args, config, printer).await,
        Command::Commentary(args) => commentary::handle(args, config, printer).await,
        Command::Config(args) => config_cmd::handle(&args, global),
    }
}

pub fn printer(global: &GlobalOpts) -> Printer {
    Printer {
        format: global.output,
        color: output::should_color(global.color),
        quiet: global.quiet,
    }
}
