use clap::{value_parser, Args, Parser, Subcommand};

pub const GOT_AFTER_HELP: &str = concat!(
    "Examples:\n",
    "  git got init origin file file:///srv/got-store\n",
    "  git got add -R assets\n",
    "  git got get\n",
    "  git got status -v\n",
    "  git got --json list_remotes\n",
);

#[derive(Parser, Debug)]
#[command(
    name = "git-got",
    bin_name = "git got",
    version,
    about = "Look-aside content-addressed storage for large files in git",
    long_about = "Tracks large files through small .<name>.got records committed to git while \
                  the content lives on scp, srr, ftp, or file remotes with a local cache.",
    disable_help_subcommand = true,
    after_help = GOT_AFTER_HELP
)]
pub struct GotCli {
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        default_value_t = 0,
        value_parser = value_parser!(u8).range(0..=4),
        help = "Logging level 0-4; 3 and above also show full error chains",
        global = true
    )]
    pub debug: u8,
    #[arg(
        long,
        help = "Emit {status,message,details} JSON envelopes",
        global = true
    )]
    pub json: bool,
    #[command(subcommand)]
    pub command: CommandGroupCli,
}

#[derive(Subcommand, Debug)]
pub enum CommandGroupCli {
    #[command(
        about = "Initialize got in this repository with a default remote.",
        override_usage = "git got init <NAME> <TYPE> <URL>",
        after_help = "Example:\n  git got init origin scp ssh://store.example/srv/got\n"
    )]
    Init(RemoteArgs),
    #[command(
        about = "Upload files to a remote and replace them in git with got records.",
        override_usage = "git got add [-R] [-r REMOTE] <PATH>..."
    )]
    Add(AddArgs),
    #[command(
        about = "Retrieve tracked files that are missing or modified locally.",
        override_usage = "git got get [-f] [PATH]..."
    )]
    Get(GetArgs),
    #[command(about = "Report tracked files that differ from their records.")]
    Status(StatusArgs),
    #[command(
        about = "Restore tracked files to their recorded content.",
        override_usage = "git got reset <PATH>..."
    )]
    Reset(PathArgs),
    #[command(
        about = "Stop tracking files and delete their working copies.",
        override_usage = "git got rm [-R] <PATH>..."
    )]
    Rm(RmArgs),
    #[command(
        name = "rm_local",
        visible_alias = "rm-local",
        about = "Delete working copies of tracked files, keeping their records."
    )]
    RmLocal,
    #[command(about = "Rename a tracked file along with its record.")]
    Mv(MvArgs),
    #[command(
        name = "add_remote",
        visible_alias = "add-remote",
        about = "Register an additional remote.",
        override_usage = "git got add_remote <NAME> <TYPE> <URL>"
    )]
    AddRemote(RemoteArgs),
    #[command(
        name = "remove_remote",
        visible_alias = "remove-remote",
        about = "Unregister a remote no tracked file refers to."
    )]
    RemoveRemote(RemoveRemoteArgs),
    #[command(
        name = "list_remotes",
        visible_alias = "list-remotes",
        about = "List registered remotes; the default is marked with '*'."
    )]
    ListRemotes,
    #[command(
        about = "Set the permission bits recorded for a tracked file.",
        after_help = "Examples:\n  git got chmod tool.sh 0o755\n  git got chmod assets 644\n"
    )]
    Chmod(ChmodArgs),
    #[command(
        name = "clear-local-cache",
        visible_alias = "clear_local_cache",
        about = "Delete everything in the local cache."
    )]
    ClearLocalCache,
    #[command(
        name = "fill-local-cache",
        visible_alias = "fill_local_cache",
        about = "Copy clean working files into the local cache."
    )]
    FillLocalCache(PathArgs),
    #[command(about = "Rewrite remote registrations in the current schema version.")]
    Upgrade,
}

#[derive(Args, Debug)]
pub struct RemoteArgs {
    #[arg(value_name = "NAME")]
    pub name: String,
    #[arg(value_name = "TYPE", help = "One of scp, srr, file, ftp")]
    pub remote_type: String,
    #[arg(value_name = "URL")]
    pub url: String,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(short = 'R', long, help = "Add every untracked file below directory arguments")]
    pub recurse: bool,
    #[arg(short = 'r', long, value_name = "REMOTE", help = "Remote to upload to (defaults to the default remote)")]
    pub remote: Option<String>,
    #[arg(value_name = "PATH")]
    pub paths: Vec<String>,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    #[arg(short, long, help = "Download again even when the working file matches")]
    pub force: bool,
    #[arg(value_name = "PATH")]
    pub paths: Vec<String>,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[arg(short, long, help = "Also list unmodified files")]
    pub verbose: bool,
    #[arg(value_name = "PATH")]
    pub paths: Vec<String>,
}

#[derive(Args, Debug)]
pub struct RmArgs {
    #[arg(short = 'R', long, help = "Remove every tracked file below directory arguments")]
    pub recurse: bool,
    #[arg(value_name = "PATH")]
    pub paths: Vec<String>,
}

#[derive(Args, Debug)]
pub struct PathArgs {
    #[arg(value_name = "PATH")]
    pub paths: Vec<String>,
}

#[derive(Args, Debug)]
pub struct MvArgs {
    #[arg(value_name = "SOURCE")]
    pub source: String,
    #[arg(value_name = "DESTINATION")]
    pub destination: String,
}

#[derive(Args, Debug)]
pub struct RemoveRemoteArgs {
    #[arg(value_name = "NAME")]
    pub name: String,
}

#[derive(Args, Debug)]
pub struct ChmodArgs {
    #[arg(value_name = "FILE")]
    pub path: String,
    #[arg(value_name = "MODE", help = "Integer literal such as 0o755, 0755, 0x1ed, or 493")]
    pub mode: String,
}
