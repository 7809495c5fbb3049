use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// schemachain: manifest paging and FTP upload helpers
#[derive(Parser)]
#[command(name = "schemachain")]
#[command(version)]
#[command(about = "Schema manifest pager and FTP upload helper")]
#[command(
    long_about = "Registers loose schema definition files in a chain of fixed-size manifest pages, and uploads build artifacts to an FTP target with bounded retries."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (defaults to ./schemachain.yaml, then the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(long, value_enum, default_value = "info", global = true)]
    pub log_level: LogLevel,
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Registers new definition files in the manifest chain
    Update {
        /// Manifest directory
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Maximum entries per manifest page
        #[arg(long)]
        capacity: Option<usize>,

        /// Show the planned page writes without changing any file
        #[arg(long)]
        dry_run: bool,
    },

    /// Uploads a file to the FTP target
    Upload {
        /// File to upload
        file: String,

        /// FTP server, host or host:port
        #[arg(short, long)]
        server: Option<String>,

        /// Remote directory the file is stored under
        #[arg(long)]
        remote_dir: Option<String>,

        /// Per-attempt timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Maximum number of attempts
        #[arg(long)]
        retries: Option<u32>,

        /// Use passive mode data connections
        #[arg(long)]
        passive: bool,

        /// Login user
        #[arg(long)]
        user: Option<String>,

        /// Login password
        #[arg(long, requires = "user")]
        password: Option<String>,
    },

    /// Checks the manifest chain and index for integrity problems
    Check {
        /// Manifest directory
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Maximum entries per manifest page
        #[arg(long)]
        capacity: Option<usize>,
    },
}

impl Commands {
    /// Get the command name as a string
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Update { .. } => "update",
            Commands::Upload { .. } => "upload",
            Commands::Check { .. } => "check",
        }
    }

    /// Check if this command modifies files
    pub fn modifies_files(&self) -> bool {
        matches!(self, Commands::Update { dry_run: false, .. })
    }

    /// Check if this command talks to the network
    pub fn uses_network(&self) -> bool {
        matches!(self, Commands::Upload { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_update_command_defaults() {
        let cli = Cli::parse_from(["schemachain", "update"]);

        match cli.command {
            Commands::Update {
                dir,
                capacity,
                dry_run,
            } => {
                assert_eq!(dir, None);
                assert_eq!(capacity, None);
                assert!(!dry_run);
            }
            _ => panic!("Wrong command parsed"),
        }
        assert_eq!(cli.log_level, LogLevel::Info);
        assert_eq!(cli.config, None);
    }

    #[test]
    fn test_update_command_flags() {
        let cli = Cli::parse_from([
            "schemachain",
            "update",
            "--dir",
            "defs",
            "--capacity",
            "10",
            "--dry-run",
            "--log-level",
            "debug",
        ]);

        match cli.command {
            Commands::Update {
                dir,
                capacity,
                dry_run,
            } => {
                assert_eq!(dir, Some(PathBuf::from("defs")));
                assert_eq!(capacity, Some(10));
                assert!(dry_run);
            }
            _ => panic!("Wrong command parsed"),
        }
        assert_eq!(cli.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_upload_command() {
        let cli = Cli::parse_from([
            "schemachain",
            "upload",
            "build/app.bin",
            "--server",
            "10.0.0.5:2121",
            "--retries",
            "3",
        ]);

        match cli.command {
            Commands::Upload {
                file,
                server,
                remote_dir,
                timeout,
                retries,
                passive,
                user,
                password,
            } => {
                assert_eq!(file, "build/app.bin");
                assert_eq!(server.as_deref(), Some("10.0.0.5:2121"));
                assert_eq!(remote_dir, None);
                assert_eq!(timeout, None);
                assert_eq!(retries, Some(3));
                assert!(!passive);
                assert_eq!(user, None);
                assert_eq!(password, None);
            }
            _ => panic!("Wrong command parsed"),
        }
    }

    #[test]
    fn test_password_requires_user() {
        let result = Cli::try_parse_from(["schemachain", "upload", "a.bin", "--password", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_command_properties() {
        let update = Commands::Update {
            dir: None,
            capacity: None,
            dry_run: false,
        };
        assert_eq!(update.name(), "update");
        assert!(update.modifies_files());
        assert!(!update.uses_network());

        let dry_run = Commands::Update {
            dir: None,
            capacity: None,
            dry_run: true,
        };
        assert!(!dry_run.modifies_files());

        let check = Commands::Check {
            dir: None,
            capacity: None,
        };
        assert_eq!(check.name(), "check");
        assert!(!check.modifies_files());
    }
}
