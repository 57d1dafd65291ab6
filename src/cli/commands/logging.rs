//! Log verbosity flag.
//!
//! `-v` may be repeated (`-vvv`); `GATEHOUSE_LOG_LEVEL` accepts either the
//! repeat count or a level name. `RUST_LOG` still wins over both.

use clap::{Arg, ArgAction, Command, builder::ValueParser};

pub const ARG_VERBOSITY: &str = "verbosity";

const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Count of `-v` flags for a level name or number; `error` is zero.
fn parse_verbosity(value: &str) -> Result<u8, String> {
    let value = value.trim();
    if let Ok(count) = value.parse::<u8>() {
        return Ok(count.min(4));
    }
    LEVELS
        .iter()
        .position(|level| level.eq_ignore_ascii_case(value))
        .and_then(|index| u8::try_from(index).ok())
        .ok_or_else(|| format!("unknown log level '{value}', expected one of {LEVELS:?}"))
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Increase log output, -v warn up to -vvvv trace; errors are always logged")
            .env("GATEHOUSE_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(ValueParser::from(parse_verbosity)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_map_to_counts() {
        assert_eq!(parse_verbosity("error"), Ok(0));
        assert_eq!(parse_verbosity("INFO"), Ok(2));
        assert_eq!(parse_verbosity(" trace "), Ok(4));
    }

    #[test]
    fn numbers_are_capped_at_trace() {
        assert_eq!(parse_verbosity("1"), Ok(1));
        assert_eq!(parse_verbosity("200"), Ok(4));
    }

    #[test]
    fn unknown_level_is_rejected() {
        assert!(parse_verbosity("chatty").is_err());
    }

    #[test]
    fn repeated_flag_counts() {
        temp_env::with_var_unset("GATEHOUSE_LOG_LEVEL", || {
            let matches =
                with_args(Command::new("gatehouse")).get_matches_from(["gatehouse", "-vvv"]);
            assert_eq!(matches.get_one::<u8>(ARG_VERBOSITY).copied(), Some(3));
        });
    }
}
