//! Shared argument definitions for the `freshen` subcommands.

use std::path::PathBuf;

pub use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::tracker::Step;
use crate::util::{FreshenResult, expand_file_args, parse_gn_lists, read_sources_list};
pub use crate::{CliError, CliResult};

pub fn flag(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .help(help)
        .action(ArgAction::SetTrue)
}

pub fn opt(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help).action(ArgAction::Set)
}

pub fn multi_opt(name: &'static str, value_name: &'static str, help: &'static str) -> Arg {
    opt(name, help)
        .value_name(value_name)
        .action(ArgAction::Append)
}

pub fn subcommand(name: &'static str) -> Command {
    Command::new(name)
}

pub trait CommandExt: Sized {
    fn _arg(self, arg: Arg) -> Self;

    /// Arguments describing a step, shared by `run` and `status`.
    fn arg_step(self) -> Self {
        self._arg(multi_opt("input", "PATH", "Input file or directory").short('i'))
            ._arg(multi_opt(
                "inputs-from",
                "FILE",
                "File listing one input path per line",
            ))
            ._arg(multi_opt(
                "input-list",
                "GN-LIST",
                "Input paths given as a GN list such as [\"a\", \"b\"]",
            ))
            ._arg(multi_opt(
                "input-string",
                "STRING",
                "String that is part of the step's inputs",
            ))
            ._arg(multi_opt("output", "PATH", "Output produced by the step").short('o'))
            ._arg(opt("record", "Path of the step's record").value_name("PATH"))
            ._arg(multi_opt(
                "track-subentries",
                "PATH",
                "Input archive whose entries are tracked individually",
            ))
            ._arg(flag("force", "Treat the step as stale"))
    }

    /// The wrapped command, given after `--`.
    fn arg_command(self, required: bool) -> Self {
        self._arg(
            Arg::new("command")
                .value_name("COMMAND")
                .help("Program and arguments; `@FileArg(file.json:key)` references are expanded")
                .num_args(1..)
                .last(true)
                .required(required),
        )
    }
}

impl CommandExt for Command {
    fn _arg(self, arg: Arg) -> Self {
        self.arg(arg)
    }
}

pub trait ArgMatchesExt {
    fn flag(&self, name: &str) -> bool;

    fn _value_of(&self, name: &str) -> Option<&str>;

    fn _values_of(&self, name: &str) -> Vec<String>;

    fn value_of_path(&self, name: &str) -> Option<PathBuf> {
        self._value_of(name).map(PathBuf::from)
    }

    fn values_of_path(&self, name: &str) -> Vec<PathBuf> {
        self._values_of(name).into_iter().map(PathBuf::from).collect()
    }

    /// Builds the step described by the arguments of [`CommandExt::arg_step`]
    /// and, where defined, `--depfile`, `--depfile-dep` and `--stamp`.
    ///
    /// Inputs are added in this order: `--input`, the files listed by
    /// `--inputs-from`, then `--input-list`.
    fn step(&self) -> FreshenResult<Step> {
        let mut step = Step::new();
        step.input_paths(&self.values_of_path("input"));
        for list in self.values_of_path("inputs-from") {
            step.input_paths(&read_sources_list(&list)?);
        }
        step.input_paths(&parse_gn_lists(self._values_of("input-list"))?);
        step.input_strings(&self._values_of("input-string"));
        step.output_paths(&self.values_of_path("output"));
        if let Some(record) = self.value_of_path("record") {
            step.record_path(record);
        }
        if let Some(depfile) = self.value_of_path("depfile") {
            step.depfile(depfile);
        }
        for dep in self.values_of_path("depfile-dep") {
            step.depfile_extra_dep(dep);
        }
        if let Some(stamp) = self.value_of_path("stamp") {
            step.stamp(stamp);
        }
        for container in self.values_of_path("track-subentries") {
            step.track_subentries(container);
        }
        step.force(self.flag("force"));
        Ok(step)
    }

    /// The wrapped command with `@FileArg` references expanded.
    fn command(&self) -> FreshenResult<Vec<String>> {
        expand_file_args(&self._values_of("command"))
    }
}

impl ArgMatchesExt for ArgMatches {
    fn flag(&self, name: &str) -> bool {
        ignore_unknown(self.try_get_one::<bool>(name))
            .copied()
            .unwrap_or(false)
    }

    fn _value_of(&self, name: &str) -> Option<&str> {
        ignore_unknown(self.try_get_one::<String>(name)).map(String::as_str)
    }

    fn _values_of(&self, name: &str) -> Vec<String> {
        ignore_unknown(self.try_get_many::<String>(name))
            .unwrap_or_default()
            .cloned()
            .collect()
    }
}

#[track_caller]
pub fn ignore_unknown<T: Default>(r: Result<T, clap::parser::MatchesError>) -> T {
    match r {
        Ok(t) => t,
        Err(clap::parser::MatchesError::UnknownArgument { .. }) => Default::default(),
        Err(e) => {
            panic!("mismatch between definition and access: {}", e);
        }
    }
}
