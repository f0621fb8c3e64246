#![allow(clippy::disallowed_methods)]
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]

mod cli;
mod fingerprint;
mod record;
mod subentries;
mod utils;
