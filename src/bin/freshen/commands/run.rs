use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use freshen::{Changes, FreshenResult, Tracker, TrackerConfig};
use freshen_util::{ProcessBuilder, ProcessError, is_simple_exit_code, paths};
use serde::Serialize;

use crate::command_prelude::*;

pub fn cli() -> Command {
    subcommand("run")
        .about("Run a command if its inputs changed since its last successful run")
        .arg_step()
        .arg(opt("depfile", "Write a depfile naming the inputs").value_name("PATH"))
        .arg(multi_opt(
            "depfile-dep",
            "PATH",
            "Dependency listed in the depfile without being fingerprinted",
        ))
        .arg(opt("stamp", "File to touch after a successful run").value_name("PATH"))
        .arg(flag("explain", "Describe why the command has to run"))
        .arg(
            opt(
                "changes-file",
                "Write a JSON summary of the changes before running the command",
            )
            .value_name("PATH"),
        )
        .arg_command(true)
        .after_help(
            "The command line itself is part of the step's inputs, so changing a flag\n\
             makes the step stale.\n",
        )
}

pub fn exec(args: &ArgMatches) -> CliResult {
    let mut config = TrackerConfig::from_env();
    config.explain |= args.flag("explain");
    let explain = config.explain;

    let command = args.command()?;
    let mut step = args.step()?;
    step.input_strings(&command);

    let Some((program, program_args)) = command.split_first() else {
        return Err(anyhow::format_err!("no command given").into());
    };
    let mut process = ProcessBuilder::new(program);
    process.args(program_args);
    let changes_file = args.value_of_path("changes-file");

    let tracker = Tracker::new(config);
    let result = tracker.run_if_stale(&step, |changes| {
        if explain {
            let mut stderr = std::io::stderr().lock();
            writeln!(
                stderr,
                "freshen: `{}` is stale: {}",
                step,
                changes.describe_difference()
            )?;
        }
        if let Some(path) = &changes_file {
            write_changes_file(path, step.get_track_subentries(), changes)?;
        }
        process.exec()
    });

    match result {
        Ok(_) => Ok(()),
        Err(err) => Err(to_cli_error(err)),
    }
}

/// Exits with the command's own exit code when it failed normally.
fn to_cli_error(err: anyhow::Error) -> CliError {
    let Some(proc_err) = err.downcast_ref::<ProcessError>() else {
        return CliError::new(err, 101);
    };
    let Some(exit_code) = proc_err.code else {
        return CliError::new(err, 101);
    };
    if is_simple_exit_code(exit_code) {
        CliError::code(exit_code)
    } else {
        CliError::new(err, exit_code)
    }
}

#[derive(Serialize)]
struct ChangesFile<'a> {
    has_record: bool,
    forced: bool,
    added_or_modified_only: bool,
    strings_changed: bool,
    added: Vec<&'a Path>,
    modified: Vec<&'a Path>,
    removed: Vec<&'a Path>,
    missing_outputs: &'a [PathBuf],
    changed_subpaths: BTreeMap<&'a Path, Vec<String>>,
}

fn write_changes_file(path: &Path, tracked: &[PathBuf], changes: &Changes<'_>) -> FreshenResult<()> {
    let mut changed_subpaths = BTreeMap::new();
    for container in tracked {
        changed_subpaths.insert(container.as_path(), changes.changed_subpaths(container)?);
    }
    let summary = ChangesFile {
        has_record: changes.has_record(),
        forced: changes.is_forced(),
        added_or_modified_only: changes.added_or_modified_only(),
        strings_changed: changes.has_string_changes(),
        added: changes.iter_added_paths().collect(),
        modified: changes.iter_modified_paths().collect(),
        removed: changes.iter_removed_paths().collect(),
        missing_outputs: changes.missing_outputs(),
        changed_subpaths,
    };
    paths::create_parent_dir_all(path)?;
    paths::write(path, serde_json::to_string_pretty(&summary)?)
}
