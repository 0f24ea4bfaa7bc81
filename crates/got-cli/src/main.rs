use std::sync::Arc;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use got_core::{error_outcome, CommandContext, GlobalOptions, SystemEffects};

mod cli;
mod dispatch;
mod output;
mod style;

use cli::GotCli;
use output::{emit_output, OutputOptions};

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = match GotCli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            std::process::exit(code);
        }
    };
    init_tracing(cli.debug);

    let global = GlobalOptions {
        debug: cli.debug,
        json: cli.json,
    };
    let opts = OutputOptions { json: cli.json };

    let (info, outcome) = match CommandContext::new(&global, Arc::new(SystemEffects::new())) {
        Ok(ctx) => dispatch::dispatch_command(&ctx, &cli.command)?,
        Err(err) if global.propagates_errors() => return Err(eyre!("{err:?}")),
        Err(err) => (dispatch::command_info(&cli.command), error_outcome(&err)),
    };
    let code = emit_output(opts, info, &outcome)?;

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing(debug: u8) {
    let level = match debug {
        0 => "error",
        1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    };

    let filter = if debug >= 4 {
        level.to_string()
    } else {
        format!("error,git_got={level},got_core={level},got_domain={level}")
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug >= 4)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
