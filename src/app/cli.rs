//! Command line definition.

use std::fmt;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::Theme;

#[derive(Debug, Parser)]
#[command(name = "smartsend")]
#[command(version)]
#[command(about = "Send one message to a list of recipients through Brevo", long_about = None)]
pub struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Database file (defaults to the platform data directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the sender address
    Login {
        /// Address messages are sent from
        email: String,
    },
    /// Forget the sender address
    Logout,
    /// Show the sender address
    Whoami,
    /// Manage saved recipient lists
    Lists {
        #[command(subcommand)]
        command: ListsCommand,
    },
    /// Send a message to every recipient
    Send(SendArgs),
    /// Show the last delivery report
    Report,
    /// Clear the last delivery report
    NewBatch,
    /// Show or change the color theme
    Theme {
        #[command(subcommand)]
        command: ThemeCommand,
    },
    /// Settings and API key management
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum ListsCommand {
    /// Save a list, one address per line (reads stdin without --file)
    Save {
        /// List name
        name: String,
        /// File to read addresses from
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,
    },
    /// Print a saved list
    Load {
        /// List name
        name: String,
    },
    /// Delete a saved list
    Delete {
        /// List name
        name: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show all saved lists
    Show,
}

#[derive(Debug, Args)]
pub struct SendArgs {
    /// File with one recipient per line
    #[arg(short, long, value_name = "FILE", conflicts_with = "list", required_unless_present = "list")]
    pub recipients: Option<PathBuf>,

    /// Saved list to send to
    #[arg(short, long, value_name = "NAME")]
    pub list: Option<String>,

    /// File holding the message body
    #[arg(short, long, value_name = "FILE", conflicts_with = "body", required_unless_present = "body")]
    pub message: Option<PathBuf>,

    /// Message body text
    #[arg(short, long)]
    pub body: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum ThemeCommand {
    /// Print the current theme
    Show,
    /// Choose a theme
    Set {
        #[arg(value_enum)]
        theme: ThemeArg,
    },
    /// Switch between dark and light
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    Dark,
    Light,
}

impl From<ThemeArg> for Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::Light => Theme::Light,
        }
    }
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the settings and database locations
    Path,
    /// Store the Brevo API key in the OS keychain
    SetKey {
        /// Brevo API key
        key: String,
    },
    /// Remove the Brevo API key from the OS keychain
    ClearKey,
}

impl fmt::Debug for ConfigCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigCommand::Path => f.write_str("Path"),
            ConfigCommand::SetKey { .. } => f
                .debug_struct("SetKey")
                .field("key", &format_args!("***"))
                .finish(),
            ConfigCommand::ClearKey => f.write_str("ClearKey"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn send_requires_recipients_and_message() {
        assert!(Cli::try_parse_from(["smartsend", "send", "--body", "hi"]).is_err());
        assert!(Cli::try_parse_from(["smartsend", "send", "--list", "team"]).is_err());

        let cli = Cli::try_parse_from(["smartsend", "send", "--list", "team", "--body", "hi"])
            .unwrap();
        match cli.command {
            Command::Send(args) => {
                assert_eq!(args.list.as_deref(), Some("team"));
                assert_eq!(args.body.as_deref(), Some("hi"));
                assert!(args.recipients.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn send_sources_conflict() {
        let result = Cli::try_parse_from([
            "smartsend",
            "send",
            "--list",
            "team",
            "--recipients",
            "r.txt",
            "--body",
            "hi",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn global_paths() {
        let cli = Cli::try_parse_from(["smartsend", "whoami", "--database", "/tmp/x.db"]).unwrap();
        assert_eq!(cli.database, Some(PathBuf::from("/tmp/x.db")));
        assert!(matches!(cli.command, Command::Whoami));
    }

    #[test]
    fn theme_arg() {
        let cli = Cli::try_parse_from(["smartsend", "theme", "set", "light"]).unwrap();
        match cli.command {
            Command::Theme {
                command: ThemeCommand::Set { theme },
            } => assert_eq!(Theme::from(theme), Theme::Light),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn set_key_debug_hides_key() {
        let cli = Cli::try_parse_from(["smartsend", "config", "set-key", "xkeysib-SECRET"]).unwrap();
        let printed = format!("{:?}", cli.command);
        assert!(printed.contains("SetKey"));
        assert!(!printed.contains("SECRET"));

        match cli.command {
            Command::Config {
                command: ConfigCommand::SetKey { key },
            } => assert_eq!(key, "xkeysib-SECRET"),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
