use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "chores",
    version,
    about = "A small localized to-do list for the terminal",
    arg_required_else_help = false
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub rc_overrides: Vec<KeyVal>,

    /// Alternative rc file.
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Alternative data directory.
    #[arg(long = "data")]
    pub data: Option<PathBuf>,

    /// Optional one-shot command; without it the interactive shell starts.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub rest: Vec<String>,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Whether list output should be painted: the `color` key decides, and a
/// redirected stdout turns it off regardless.
pub fn use_color(cfg: &Config) -> bool {
    cfg.get_bool("color").unwrap_or(true) && std::io::stdout().is_terminal()
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{GlobalCli, KeyVal};

    #[test]
    fn key_val_parses_and_rejects() {
        let kv: KeyVal = "page.size = 5".parse().expect("parse");
        assert_eq!(kv.key, "page.size");
        assert_eq!(kv.value, "5");
        assert!("nothing-here".parse::<KeyVal>().is_err());
    }

    #[test]
    fn trailing_words_become_the_one_shot_command() {
        let cli = GlobalCli::parse_from(["chores", "-v", "add", "buy", "milk"]);
        assert_eq!(cli.verbose, 1);
        assert_eq!(cli.rest, vec!["add", "buy", "milk"]);
    }
}
