pub use self::errors::{CliError, CliResult, ConfigError, FreshenResult, MissingInputError};
pub use self::file_args::expand_file_args;
pub use self::gn::{parse_gn_list, parse_gn_lists, to_gn_string};
pub use self::sources::read_sources_list;

pub mod command_prelude;
mod errors;
mod file_args;
mod gn;
mod sources;
