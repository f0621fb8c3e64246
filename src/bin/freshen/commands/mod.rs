use crate::command_prelude::*;

pub fn builtin() -> Vec<Command> {
    vec![run::cli(), status::cli()]
}

pub type Exec = fn(&ArgMatches) -> CliResult;

pub fn builtin_exec(cmd: &str) -> Option<Exec> {
    let f = match cmd {
        "run" => run::exec,
        "status" => status::exec,
        _ => return None,
    };
    Some(f)
}

pub mod run;
pub mod status;
