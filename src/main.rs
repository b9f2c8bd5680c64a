//! # netshort
//!
//! **netshort** is a link shortener for static sites that serve redirects
//! from a `_redirects` file (Netlify style).
//!
//! Features:
//! - `netshort shorten <url> [key]` adds `/<key> -> <url>` to the top of the
//!   ledger, realigns the file, then commits and pushes it
//! - `netshort list` prints the current redirects
//! - `netshort path` prints the resolved config and ledger paths
//!
//! This CLI is built with [clap](https://docs.rs/clap).

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use netshort::{cmd_list, cmd_shorten, config_path, load_config};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Command-line interface definition.
#[derive(Parser, Debug)]
#[command(
    name = "netshort",
    version,
    about = "netshort - link shortener for _redirects files",
    arg_required_else_help = true
)]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/netshort/config.toml or $HOME/netshort.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Cmd,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Cmd {
    /// Shorten a long URL and publish the short link
    ///
    /// Without a short key a random one is generated with the configured
    /// length (default 5).
    Shorten {
        /// URL to redirect to
        long_url: String,
        /// Custom short key (alphanumeric)
        short_key: Option<String>,
        /// Update the ledger without committing or pushing
        #[arg(long)]
        no_publish: bool,
    },
    /// Print the redirects in the ledger
    List,
    /// Print the resolved config and ledger paths
    Path,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = cli.config.as_deref();

    match cli.cmd {
        Cmd::Shorten {
            long_url,
            short_key,
            no_publish,
        } => cmd_shorten(config, &long_url, short_key.as_deref(), no_publish),
        Cmd::List => cmd_list(config),
        Cmd::Path => {
            let (cfg_path, _) = config_path(config);
            println!("config: {}", cfg_path.display());
            let cfg = load_config(config)?;
            println!("ledger: {}", cfg.ledger_path()?.display());
            Ok(())
        }
    }
}
