//! Command-line parsing.

use std::path::PathBuf;
use std::str::FromStr;

use crate::config::{ConfigError, Overrides};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Server,
    Client,
    Levels,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub mode: Mode,
    pub config_path: Option<PathBuf>,
    pub overrides: Overrides,
}

/// Parse the arguments after the program name.
pub fn parse(args: &[String]) -> Result<Invocation, ConfigError> {
    let Some(first) = args.first() else {
        return Err(ConfigError::Usage(usage_text()));
    };
    let mode = match first.as_str() {
        "server" => Mode::Server,
        "client" => Mode::Client,
        "levels" => Mode::Levels,
        "-h" | "--help" | "help" => Mode::Help,
        other => return Err(usage(format!("unknown subcommand '{other}'"))),
    };

    let mut invocation = Invocation {
        mode,
        config_path: None,
        overrides: Overrides::default(),
    };
    let mut index = 1usize;
    while index < args.len() {
        let flag = args[index].as_str();
        if !flag_allowed(mode, flag) {
            return Err(usage(format!("'{flag}' is not an option of '{first}'")));
        }
        let overrides = &mut invocation.overrides;
        match flag {
            "--two-player" => {
                overrides.two_player = true;
                index += 1;
                continue;
            }
            "--port" => overrides.port = Some(value(args, index)?),
            "--bind" => overrides.bind = Some(value(args, index)?),
            "--host" => overrides.host = Some(value(args, index)?),
            "--seed" => overrides.seed = Some(value(args, index)?),
            "--levels" => overrides.levels = Some(value(args, index)?),
            "--level" => overrides.level = Some(value(args, index)?),
            "--ticks" => overrides.ticks = Some(value(args, index)?),
            "--config" => invocation.config_path = Some(value(args, index)?),
            _ => return Err(usage(format!("unknown option '{flag}'"))),
        }
        index += 2;
    }
    Ok(invocation)
}

fn flag_allowed(mode: Mode, flag: &str) -> bool {
    match mode {
        Mode::Server => matches!(
            flag,
            "--port"
                | "--bind"
                | "--two-player"
                | "--seed"
                | "--levels"
                | "--level"
                | "--ticks"
                | "--config"
        ),
        Mode::Client => matches!(flag, "--host" | "--port" | "--ticks" | "--config"),
        Mode::Levels => matches!(flag, "--levels" | "--config"),
        Mode::Help => false,
    }
}

fn value<T: FromStr>(args: &[String], index: usize) -> Result<T, ConfigError> {
    let flag = &args[index];
    let raw = args
        .get(index + 1)
        .ok_or_else(|| usage(format!("missing value for {flag}")))?;
    raw.parse()
        .map_err(|_| usage(format!("invalid {flag} value '{raw}'")))
}

fn usage(message: String) -> ConfigError {
    ConfigError::Usage(format!("{message}\n\n{}", usage_text()))
}

pub fn usage_text() -> String {
    [
        "kobo - networked top-down shooter, headless",
        "",
        "Usage:",
        "  kobo server [--port N] [--bind ADDR] [--two-player] [--seed N] [--levels FILE] [--level N] [--ticks N] [--config FILE]",
        "  kobo client [--host HOST] [--port N] [--ticks N] [--config FILE]",
        "  kobo levels [--levels FILE] [--config FILE]",
        "",
        "Environment:",
        "  KOBO_PORT KOBO_BIND KOBO_HOST KOBO_SEED KOBO_TWO_PLAYER KOBO_LEVELS KOBO_LEVEL KOBO_TICK_RATE KOBO_TICKS",
        "  RUST_LOG (default: info)",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_server_flags() {
        let parsed = parse(&args(&[
            "server",
            "--port",
            "2000",
            "--two-player",
            "--seed",
            "5",
            "--ticks",
            "600",
        ]))
        .unwrap();
        assert_eq!(parsed.mode, Mode::Server);
        assert_eq!(parsed.overrides.port, Some(2000));
        assert!(parsed.overrides.two_player);
        assert_eq!(parsed.overrides.seed, Some(5));
        assert_eq!(parsed.overrides.ticks, Some(600));
        assert_eq!(parsed.config_path, None);
    }

    #[test]
    fn test_client_flags() {
        let parsed = parse(&args(&["client", "--host", "10.1.1.1", "--config", "k.json"])).unwrap();
        assert_eq!(parsed.mode, Mode::Client);
        assert_eq!(parsed.overrides.host.as_deref(), Some("10.1.1.1"));
        assert_eq!(parsed.config_path, Some(PathBuf::from("k.json")));
    }

    #[test]
    fn test_usage_errors() {
        assert!(matches!(parse(&[]), Err(ConfigError::Usage(_))));
        assert!(matches!(
            parse(&args(&["dance"])),
            Err(ConfigError::Usage(_))
        ));
        assert!(matches!(
            parse(&args(&["server", "--port"])),
            Err(ConfigError::Usage(_))
        ));
        assert!(matches!(
            parse(&args(&["server", "--port", "http"])),
            Err(ConfigError::Usage(_))
        ));
        // --two-player is a server option
        assert!(matches!(
            parse(&args(&["client", "--two-player"])),
            Err(ConfigError::Usage(_))
        ));
    }

    #[test]
    fn test_help() {
        assert_eq!(parse(&args(&["--help"])).unwrap().mode, Mode::Help);
    }
}
