use std::io::Write;

use freshen::{Freshness, Tracker, TrackerConfig};

use crate::command_prelude::*;

pub fn cli() -> Command {
    subcommand("status")
        .about("Report whether a step is fresh without running anything")
        .arg_step()
        .arg(flag("explain", "Describe what changed when the step is stale"))
        .arg_command(false)
        .after_help(
            "Prints `fresh` and exits with 0, or prints `stale: <reason>` and exits with 1.\n\
             Pass the same options and command as to `freshen run`.\n",
        )
}

pub fn exec(args: &ArgMatches) -> CliResult {
    let mut config = TrackerConfig::from_env();
    config.explain |= args.flag("explain");

    let mut step = args.step()?;
    step.input_strings(&args.command()?);

    let freshness = Tracker::new(config).check(&step)?;
    let mut stdout = std::io::stdout().lock();
    match freshness {
        Freshness::Fresh => {
            writeln!(stdout, "fresh")?;
            Ok(())
        }
        Freshness::Dirty {
            reason,
            explanation,
        } => {
            writeln!(stdout, "stale: {}", reason)?;
            if let Some(explanation) = explanation {
                writeln!(stdout, "{}", explanation)?;
            }
            Err(CliError::code(1))
        }
    }
}
