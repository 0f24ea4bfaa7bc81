use color_eyre::{eyre::eyre, Result};
use got_core::api as got_core;
use got_core::{
    AddRequest, ChmodRequest, ClearCacheRequest, CommandContext, CommandGroup,
    CommandInfo, ExecutionOutcome, FillCacheRequest, GetRequest, ListRemotesRequest, MvRequest,
    RegisterRemoteRequest, RemoveRemoteRequest, ResetRequest, RmLocalRequest, RmRequest,
    StatusRequest, UpgradeRequest,
};
use tracing::debug;

use crate::cli::{CommandGroupCli, RemoteArgs};

/// Names the command a parsed invocation runs.
pub fn command_info(group: &CommandGroupCli) -> CommandInfo {
    let (group, name) = match group {
        CommandGroupCli::Init(_) => (CommandGroup::Init, "init"),
        CommandGroupCli::Add(_) => (CommandGroup::Add, "add"),
        CommandGroupCli::Get(_) => (CommandGroup::Get, "get"),
        CommandGroupCli::Status(_) => (CommandGroup::Status, "status"),
        CommandGroupCli::Reset(_) => (CommandGroup::Reset, "reset"),
        CommandGroupCli::Rm(_) => (CommandGroup::Rm, "rm"),
        CommandGroupCli::RmLocal => (CommandGroup::RmLocal, "rm_local"),
        CommandGroupCli::Mv(_) => (CommandGroup::Mv, "mv"),
        CommandGroupCli::AddRemote(_) => (CommandGroup::AddRemote, "add_remote"),
        CommandGroupCli::RemoveRemote(_) => (CommandGroup::RemoveRemote, "remove_remote"),
        CommandGroupCli::ListRemotes => (CommandGroup::ListRemotes, "list_remotes"),
        CommandGroupCli::Chmod(_) => (CommandGroup::Chmod, "chmod"),
        CommandGroupCli::ClearLocalCache => (CommandGroup::ClearLocalCache, "clear-local-cache"),
        CommandGroupCli::FillLocalCache(_) => (CommandGroup::FillLocalCache, "fill-local-cache"),
        CommandGroupCli::Upgrade => (CommandGroup::Upgrade, "upgrade"),
    };
    CommandInfo::new(group, name)
}

pub fn dispatch_command(
    ctx: &CommandContext,
    group: &CommandGroupCli,
) -> Result<(CommandInfo, ExecutionOutcome)> {
    let info = command_info(group);
    match group {
        CommandGroupCli::Init(args) => {
            let request = register_request(args);
            core_call(ctx, info, || got_core::init(ctx, &request))
        }
        CommandGroupCli::Add(args) => {
            let request = AddRequest {
                paths: args.paths.clone(),
                recurse: args.recurse,
                remote: args.remote.clone(),
            };
            core_call(ctx, info, || got_core::add(ctx, &request))
        }
        CommandGroupCli::Get(args) => {
            let request = GetRequest {
                paths: args.paths.clone(),
                force: args.force,
            };
            core_call(ctx, info, || got_core::get(ctx, &request))
        }
        CommandGroupCli::Status(args) => {
            let request = StatusRequest {
                paths: args.paths.clone(),
                verbose: args.verbose,
            };
            core_call(ctx, info, || got_core::status(ctx, &request))
        }
        CommandGroupCli::Reset(args) => {
            let request = ResetRequest {
                paths: args.paths.clone(),
            };
            core_call(ctx, info, || got_core::reset(ctx, &request))
        }
        CommandGroupCli::Rm(args) => {
            let request = RmRequest {
                paths: args.paths.clone(),
                recurse: args.recurse,
            };
            core_call(ctx, info, || got_core::rm(ctx, &request))
        }
        CommandGroupCli::RmLocal => core_call(ctx, info, || got_core::rm_local(ctx, &RmLocalRequest)),
        CommandGroupCli::Mv(args) => {
            let request = MvRequest {
                source: args.source.clone(),
                destination: args.destination.clone(),
            };
            core_call(ctx, info, || got_core::mv(ctx, &request))
        }
        CommandGroupCli::AddRemote(args) => {
            let request = register_request(args);
            core_call(ctx, info, || got_core::add_remote(ctx, &request))
        }
        CommandGroupCli::RemoveRemote(args) => {
            let request = RemoveRemoteRequest {
                name: args.name.clone(),
            };
            core_call(ctx, info, || got_core::remove_remote(ctx, &request))
        }
        CommandGroupCli::ListRemotes => {
            core_call(ctx, info, || got_core::list_remotes(ctx, &ListRemotesRequest))
        }
        CommandGroupCli::Chmod(args) => {
            let request = ChmodRequest {
                path: args.path.clone(),
                mode: args.mode.clone(),
            };
            core_call(ctx, info, || got_core::chmod(ctx, &request))
        }
        CommandGroupCli::ClearLocalCache => {
            core_call(ctx, info, || got_core::clear_local_cache(ctx, &ClearCacheRequest))
        }
        CommandGroupCli::FillLocalCache(args) => {
            let request = FillCacheRequest {
                paths: args.paths.clone(),
            };
            core_call(ctx, info, || got_core::fill_local_cache(ctx, &request))
        }
        CommandGroupCli::Upgrade => core_call(ctx, info, || got_core::upgrade(ctx, &UpgradeRequest)),
    }
}

fn register_request(args: &RemoteArgs) -> RegisterRemoteRequest {
    RegisterRemoteRequest {
        name: args.name.clone(),
        remote_type: args.remote_type.clone(),
        url: args.url.clone(),
    }
}

fn core_call<F>(
    ctx: &CommandContext,
    info: CommandInfo,
    action: F,
) -> Result<(CommandInfo, ExecutionOutcome)>
where
    F: FnOnce() -> anyhow::Result<ExecutionOutcome>,
{
    match action() {
        Ok(outcome) => Ok((info, outcome)),
        Err(err) if ctx.global.propagates_errors() => Err(eyre!("{err:?}")),
        Err(err) => {
            debug!(command = %info.group, error = %format!("{err:#}"), "command failed");
            Ok((info, got_core::error_outcome(&err)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::GotCli;
    use clap::Parser;

    #[test]
    fn aliases_resolve_to_canonical_command_names() {
        let cli = GotCli::try_parse_from(["git-got", "list-remotes"]).expect("parse");
        let info = command_info(&cli.command);
        assert_eq!(info.group, CommandGroup::ListRemotes);
        assert_eq!(info.name, "list_remotes");
        assert_eq!(
            ::got_core::format_status_message(info, "ok"),
            "got list_remotes: ok"
        );
    }
}
