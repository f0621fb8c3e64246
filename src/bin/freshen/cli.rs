use anyhow::format_err;

use super::commands;
use crate::command_prelude::*;

pub fn main() -> CliResult {
    let args = cli().try_get_matches()?;

    let Some((cmd, subcommand_args)) = args.subcommand() else {
        return Err(format_err!("no subcommand given, see `freshen --help`").into());
    };
    let Some(exec) = commands::builtin_exec(cmd) else {
        return Err(format_err!("no such command: `{}`", cmd).into());
    };
    tracing::trace!("executing `{}`", cmd);
    exec(subcommand_args)
}

pub fn cli() -> Command {
    Command::new("freshen")
        .about("Run build steps only when their inputs changed")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .after_help(
            "Environment:\n  \
             FRESHEN_LOG      tracing filter for diagnostics on stderr\n  \
             FRESHEN_EXPLAIN  describe why stale steps run\n  \
             FRESHEN_FORCE    treat every step as stale\n",
        )
        .subcommands(commands::builtin())
}

#[test]
fn verify_cli() {
    cli().debug_assert();
}
