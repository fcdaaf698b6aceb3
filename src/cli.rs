//! CLI for inspecting and maintaining the session namespace
//!
//! Commands:
//! - `info`: store name and connection settings
//! - `keys` / `size`: list or count stored sessions
//! - `show <id>`: print a session as JSON
//! - `remove <id>` / `clear`: delete one or every session

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use etcd_session_core::{EtcdStore, SessionStore, StoreManagement, SIZE_UNKNOWN};
use std::sync::Arc;
use tracing::debug;

use crate::loader;

/// etcd session store CLI
#[derive(Parser, Debug)]
#[command(name = "etcd-session")]
#[command(about = "Inspect and maintain sessions persisted in etcd")]
#[command(version)]
pub struct Cli {
    /// etcd host (overrides configuration)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// etcd client port (overrides configuration)
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show store name and connection settings
    Info,
    /// List stored session identifiers
    Keys,
    /// Count stored sessions
    Size,
    /// Print a session as JSON
    Show {
        /// Session identifier
        id: String,
    },
    /// Delete a session
    Remove {
        /// Session identifier
        id: String,
    },
    /// Delete every session
    Clear {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

/// Run the CLI command
pub fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        cmd.print_help()?;
        println!();
        return Ok(());
    };

    let mut config = loader::load_config()?;
    if let Some(host) = cli.host {
        config.store.host = host;
    }
    if let Some(port) = cli.port {
        config.store.port = port;
    }

    debug!(
        endpoint = %config.store.endpoint(),
        manager = %config.manager.name,
        "Configuration loaded"
    );

    let store = Arc::new(EtcdStore::from_config(&config.store));
    store.set_manager(Arc::new(config.manager.build()));
    store
        .start()
        .with_context(|| format!("Failed to connect to etcd at {}", store.endpoint()))?;

    let result = execute(&store, command);
    store.stop();
    result
}

fn execute(store: &EtcdStore, command: Commands) -> Result<()> {
    match command {
        Commands::Info => {
            println!("Store:    {}", store.info());
            println!("Host:     {}", StoreManagement::host(store));
            println!("Port:     {}", StoreManagement::port(store));
            println!("Endpoint: {}", store.endpoint());
            Ok(())
        }
        Commands::Keys => {
            let keys = store
                .keys()
                .context("Session namespace could not be listed")?;
            for key in keys {
                println!("{key}");
            }
            Ok(())
        }
        Commands::Size => {
            let size = store.size();
            anyhow::ensure!(size != SIZE_UNKNOWN, "Session namespace could not be listed");
            println!("{size}");
            Ok(())
        }
        Commands::Show { id } => {
            let session = store.load(&id);
            if session.is_new() {
                println!("Session '{id}' not found.");
                return Ok(());
            }
            println!("{}", serde_json::to_string_pretty(&session)?);
            Ok(())
        }
        Commands::Remove { id } => {
            store.remove(&id);
            println!("Removed session '{id}'.");
            Ok(())
        }
        Commands::Clear { force } => {
            if !force && !confirm("Delete every stored session?") {
                println!("Cancelled.");
                return Ok(());
            }
            store.clear();
            println!("Cleared sessions.");
            Ok(())
        }
    }
}

fn confirm(prompt: &str) -> bool {
    use std::io::{self, Write};
    print!("{prompt} [y/N] ");
    io::stdout().flush().ok();
    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_ok() {
        matches!(input.trim(), "y" | "Y" | "yes" | "YES")
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_connection_overrides() {
        let cli = Cli::parse_from(["etcd-session", "size", "--host", "etcd", "--port", "4001"]);
        assert_eq!(cli.host.as_deref(), Some("etcd"));
        assert_eq!(cli.port, Some(4001));
        assert!(matches!(cli.command, Some(Commands::Size)));
    }

    #[test]
    fn test_clear_requires_flag_for_force() {
        let cli = Cli::parse_from(["etcd-session", "clear"]);
        assert!(matches!(cli.command, Some(Commands::Clear { force: false })));

        let cli = Cli::parse_from(["etcd-session", "clear", "--force"]);
        assert!(matches!(cli.command, Some(Commands::Clear { force: true })));
    }
}
