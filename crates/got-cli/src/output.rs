use atty::Stream;
use color_eyre::Result;
use got_core::{CommandInfo, CommandStatus, ExecutionOutcome};
use serde_json::Value;

use crate::style::Style;

#[derive(Clone, Copy, Debug)]
pub struct OutputOptions {
    pub json: bool,
}

/// Renders an outcome and returns the process exit code for it.
pub fn emit_output(opts: OutputOptions, info: CommandInfo, outcome: &ExecutionOutcome) -> Result<i32> {
    let code = exit_code(&outcome.status);

    if opts.json {
        let payload = got_core::to_json_response(info, outcome, code);
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(code);
    }

    if let CommandStatus::Ok = outcome.status {
        let style = Style::new(atty::is(Stream::Stdout));
        if is_passthrough(&outcome.details) {
            println!("{}", outcome.message);
        } else {
            let message = got_core::format_status_message(info, &outcome.message);
            println!("{}", style.status(&outcome.status, &message));
        }
    } else {
        let style = Style::new(atty::is(Stream::Stderr));
        let message = got_core::format_status_message(info, &outcome.message);
        eprintln!("{}", style.status(&outcome.status, &message));
        if let Some(hint) = hint_from_details(&outcome.details) {
            let hint_line = format!("Hint: {hint}");
            eprintln!("{}", style.info(&hint_line));
        }
    }

    Ok(code)
}

fn exit_code(status: &CommandStatus) -> i32 {
    match status {
        CommandStatus::Ok => 0,
        CommandStatus::UserError => 1,
        CommandStatus::Failure => 2,
    }
}

fn hint_from_details(details: &Value) -> Option<&str> {
    details
        .as_object()
        .and_then(|map| map.get("hint"))
        .and_then(Value::as_str)
}

fn is_passthrough(details: &Value) -> bool {
    details
        .as_object()
        .and_then(|map| map.get("passthrough"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}
