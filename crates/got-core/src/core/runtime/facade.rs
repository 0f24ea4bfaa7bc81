use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::context::CommandInfo;
use crate::errors::find_got_error;
use crate::outcome::{CommandStatus, ExecutionOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandGroup {
    Init,
    Add,
    Get,
    Status,
    Reset,
    Rm,
    RmLocal,
    Mv,
    AddRemote,
    RemoveRemote,
    ListRemotes,
    Chmod,
    ClearLocalCache,
    FillLocalCache,
    Upgrade,
}

impl fmt::Display for CommandGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandGroup::Init => "init",
            CommandGroup::Add => "add",
            CommandGroup::Get => "get",
            CommandGroup::Status => "status",
            CommandGroup::Reset => "reset",
            CommandGroup::Rm => "rm",
            CommandGroup::RmLocal => "rm_local",
            CommandGroup::Mv => "mv",
            CommandGroup::AddRemote => "add_remote",
            CommandGroup::RemoveRemote => "remove_remote",
            CommandGroup::ListRemotes => "list_remotes",
            CommandGroup::Chmod => "chmod",
            CommandGroup::ClearLocalCache => "clear-local-cache",
            CommandGroup::FillLocalCache => "fill-local-cache",
            CommandGroup::Upgrade => "upgrade",
        };
        f.write_str(name)
    }
}

#[must_use]
pub fn to_json_response(info: CommandInfo, outcome: &ExecutionOutcome, _code: i32) -> Value {
    let status = match outcome.status {
        CommandStatus::Ok => "ok",
        CommandStatus::UserError => "user-error",
        CommandStatus::Failure => "error",
    };
    let details = match &outcome.details {
        Value::Object(_) => outcome.details.clone(),
        Value::Null => json!({}),
        other => json!({ "value": other }),
    };
    json!({
        "status": status,
        "message": format_status_message(info, &outcome.message),
        "details": details,
    })
}

#[must_use]
pub fn format_status_message(info: CommandInfo, message: &str) -> String {
    let group_name = info.group.to_string();
    let prefix = if group_name == info.name {
        format!("got {}", info.name)
    } else {
        format!("got {} {}", group_name, info.name)
    };
    if message.is_empty() {
        prefix
    } else if message.starts_with(&prefix) {
        message.to_string()
    } else {
        format!("{prefix}: {message}")
    }
}

/// Classifies a failed command by the [`crate::GotError`] in its chain.
#[must_use]
pub fn error_outcome(err: &anyhow::Error) -> ExecutionOutcome {
    let message = format!("{err:#}");
    match find_got_error(err) {
        Some(got) => {
            let details = json!({
                "reason": got.reason(),
                "code": got.code(),
                "hint": got.hint(),
            });
            if got.is_user_error() {
                ExecutionOutcome::user_error(message, details)
            } else {
                ExecutionOutcome::failure(message, details)
            }
        }
        None => {
            let issues: Vec<String> = err.chain().map(ToString::to_string).collect();
            ExecutionOutcome::failure(
                message,
                json!({
                    "reason": "internal_error",
                    "code": crate::diagnostics::codes::GENERIC,
                    "issues": issues,
                }),
            )
        }
    }
}
