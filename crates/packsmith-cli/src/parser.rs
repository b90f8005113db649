//! Main CLI parser and top-level argument handling.
//!
//! This module defines the root CLI structure with global options. The
//! subcommands themselves live in [`crate::commands`]; running with no
//! subcommand prints the help text.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for the packsmith generation toolkit.
///
/// Global options apply to every subcommand. `--db` wins over the
/// `PACKSMITH_DB_PATH` environment variable, which wins over the default
/// path from the loaded configuration.
#[derive(Parser)]
#[command(name = "packsmith")]
#[command(about = "Generate product concepts, 3D models and packaging textures")]
#[command(version)]
pub struct Cli {
    /// Override the session database for this invocation
    #[arg(long = "db", env = "PACKSMITH_DB_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Subcommand to run; help is printed when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        // Verify the CLI parser can be constructed
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from(["packsmith", "--verbose", "--db", "/tmp/p.db", "status"]);
        assert!(cli.verbose);
        assert_eq!(cli.db_path, Some(PathBuf::from("/tmp/p.db")));
        assert!(matches!(cli.command, Some(Commands::Status)));
    }

    #[test]
    fn test_subcommand_is_optional() {
        let cli = Cli::parse_from(["packsmith"]);
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }
}
