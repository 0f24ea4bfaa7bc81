use anyhow::{Context, Result};
use serde_json::json;
use tracing::debug;

use super::walker::TrackedEntity;
use super::Session;
use crate::errors::GotError;
use crate::fs::apply_mode;
use crate::{CommandContext, ExecutionOutcome};

#[derive(Clone, Debug)]
pub struct ChmodRequest {
    pub path: String,
    pub mode: String,
}

/// Parses `0o755`, `0755`, `0x1ed`, `0b111101101`, or plain decimal.
///
/// # Errors
/// Returns a usage error for anything else or for values above `0o7777`.
pub fn parse_mode(raw: &str) -> Result<u32, GotError> {
    let value = raw.trim();
    let lower = value.to_ascii_lowercase();
    let parsed = if let Some(digits) = lower.strip_prefix("0o") {
        u32::from_str_radix(digits, 8)
    } else if let Some(digits) = lower.strip_prefix("0x") {
        u32::from_str_radix(digits, 16)
    } else if let Some(digits) = lower.strip_prefix("0b") {
        u32::from_str_radix(digits, 2)
    } else if lower.len() > 1 && lower.starts_with('0') {
        u32::from_str_radix(&lower[1..], 8)
    } else {
        lower.parse::<u32>()
    };
    match parsed {
        Ok(mode) if mode <= 0o7777 => Ok(mode),
        _ => Err(GotError::usage(format!("Invalid mode '{value}'"))),
    }
}

/// Changes the recorded permission bits of tracked files.
///
/// # Errors
/// Returns an error for an unparsable mode or on the first file that cannot
/// be updated.
pub fn chmod(ctx: &CommandContext, request: &ChmodRequest) -> Result<ExecutionOutcome> {
    let bits = parse_mode(&request.mode)?;
    let session = Session::open(ctx)?;
    let mut changed = Vec::new();
    for entity in session.walker().tracked(std::slice::from_ref(&request.path))? {
        if chmod_one(ctx, &session, &entity, bits)
            .with_context(|| format!("Failed to change mode on '{}'", entity.label))?
        {
            changed.push(entity.label);
        }
    }
    let message = if changed.is_empty() {
        format!("mode already {bits:o}")
    } else {
        format!("mode set to {bits:o} on {}", super::describe_files(&changed))
    };
    Ok(ExecutionOutcome::success(
        message,
        json!({ "mode": format!("{bits:o}"), "files": changed }),
    ))
}

fn chmod_one(
    ctx: &CommandContext,
    session: &Session,
    entity: &TrackedEntity,
    bits: u32,
) -> Result<bool> {
    let record = entity.record()?;
    if record.permission_bits() == bits {
        debug!(file = %entity.label, "mode unchanged");
        return Ok(false);
    }
    let updated = record.with_permissions(bits);
    updated.write(&entity.sidecar)?;
    let root = session.root();
    ctx.git().stage(root, &entity.sidecar_in(root))?;
    if entity.real.exists() {
        apply_mode(&entity.real, updated.mode)?;
    }
    Ok(true)
}
