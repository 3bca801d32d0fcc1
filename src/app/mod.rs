//! Command line application.
//!
//! [`App`] opens settings, storage and the session once, then runs a single
//! [`Command`] against them.

pub mod cli;
pub mod render;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use console::style;
use tokio_util::sync::CancellationToken;

pub use cli::{Cli, Command, ConfigCommand, ListsCommand, SendArgs, ThemeCommand};
use render::{ConsoleNotifier, ProgressObserver, INFO, SUCCESS};

use crate::config::{
    resolve_api_key, ApiKey, AppPaths, CredentialSource, Settings, PROVIDER_NAME,
};
use crate::domain::MessageDraft;
use crate::providers::email::BrevoProvider;
use crate::services::{
    DeliveryEngine, DeliveryService, EngineOptions, ListService, Notification, Notifier, Session,
};
use crate::storage::{Database, KeychainAccess, StorageLayer};

/// File checked for `BREVO_API_KEY=` in the working directory.
const DOTENV_FILE: &str = ".env";

/// An opened application: settings, storage and the restored session.
pub struct App {
    settings: Settings,
    paths: AppPaths,
    storage: StorageLayer,
    session: Arc<Session<Database>>,
    lists: ListService<Database>,
}

impl App {
    /// Opens the application and runs one command.
    pub async fn run(cli: Cli) -> Result<()> {
        let app = Self::open(cli.config, cli.database).await?;
        app.execute(cli.command).await
    }

    /// Loads settings and opens the database, creating it if needed.
    pub async fn open(config: Option<PathBuf>, database: Option<PathBuf>) -> Result<Self> {
        let paths = resolve_paths(config, database)?;
        let settings = Settings::load(&paths.settings_file)?;
        if !paths.settings_file.exists() {
            settings.save(&paths.settings_file)?;
            tracing::info!(path = %paths.settings_file.display(), "Wrote default settings");
        }
        let storage = StorageLayer::new(&paths.database_file)
            .await
            .with_context(|| format!("Failed to open {}", paths.database_file.display()))?;

        let session = Arc::new(Session::restore(storage.db(), settings.appearance.theme).await?);
        let lists = ListService::new(storage.db());

        tracing::debug!(database = %paths.database_file.display(), "Storage opened");
        Ok(Self {
            settings,
            paths,
            storage,
            session,
            lists,
        })
    }

    pub async fn execute(&self, command: Command) -> Result<()> {
        let theme = self.session.theme().await;
        let notifier = Arc::new(ConsoleNotifier::new(theme));

        match command {
            Command::Login { email } => {
                let email = self.session.login(&email).await?;
                println!("{} Logged in as {}", SUCCESS, render::accent(theme, email));
            }
            Command::Logout => {
                self.session.logout().await?;
                println!("{} Logged out", SUCCESS);
            }
            Command::Whoami => self.whoami(notifier.as_ref()).await?,
            Command::Lists { command } => self.lists(command).await?,
            Command::Send(args) => self.send(args, notifier).await?,
            Command::Report => match self.session.last_report().await {
                Some(report) => println!("{}", render::report_table(&report)),
                None => println!("{}", style("(No report yet)").dim()),
            },
            Command::NewBatch => {
                self.session.new_batch().await?;
                println!("{} Ready for a new batch", SUCCESS);
            }
            Command::Theme { command } => {
                let theme = match command {
                    ThemeCommand::Show => self.session.theme().await,
                    ThemeCommand::Set { theme } => self.session.set_theme(theme.into()).await?,
                    ThemeCommand::Toggle => self.session.toggle_theme().await?,
                };
                println!("{} Theme: {}", INFO, render::accent(theme, theme.as_str()));
            }
            Command::Config { command } => self.config(command).await?,
        }

        Ok(())
    }

    async fn whoami(&self, notifier: &dyn Notifier) -> Result<()> {
        match self.session.sender().await {
            Some(sender) => println!("{}", sender),
            None => println!("{}", style("(Not logged in)").dim()),
        }
        match self.api_key().await {
            Some((source, _)) => println!("{} API key: {}", INFO, source),
            None => notifier.notify(Notification::credential_missing()),
        }
        Ok(())
    }

    async fn lists(&self, command: ListsCommand) -> Result<()> {
        let theme = self.session.theme().await;
        match command {
            ListsCommand::Save { name, file } => {
                let raw = match file {
                    Some(path) => read_file(&path)?,
                    None => {
                        let mut raw = String::new();
                        std::io::stdin()
                            .read_to_string(&mut raw)
                            .context("Failed to read addresses from stdin")?;
                        raw
                    }
                };
                let list = self.lists.save_from_text(&name, &raw).await?;
                println!(
                    "{} Saved list {} ({} addresses)",
                    SUCCESS,
                    render::accent(theme, &list.name),
                    list.addresses.len()
                );
            }
            ListsCommand::Load { name } => {
                let list = self.lists.load(&name).await?;
                println!("{}", list.to_text());
            }
            ListsCommand::Delete { name, yes } => {
                if !yes && !confirm(&format!("Delete list '{}'?", name))? {
                    println!("Cancelled.");
                    return Ok(());
                }
                if self.lists.delete(&name).await? {
                    println!("{} Deleted list {}", SUCCESS, render::accent(theme, &name));
                } else {
                    println!("{} No list named {}", INFO, render::accent(theme, &name));
                }
            }
            ListsCommand::Show => {
                let lists = self.lists.list().await?;
                println!("{}", render::list_table(&lists, theme));
            }
        }
        Ok(())
    }

    async fn send(&self, args: SendArgs, notifier: Arc<ConsoleNotifier>) -> Result<()> {
        let theme = self.session.theme().await;
        let recipients = match (&args.recipients, &args.list) {
            (Some(path), _) => read_file(path)?,
            (None, Some(name)) => self.lists.load(name).await?.to_text(),
            (None, None) => bail!("either --recipients or --list is required"),
        };
        let draft = match (&args.message, args.body) {
            (Some(path), _) => MessageDraft::new(read_file(path)?),
            (None, Some(body)) => MessageDraft::new(body),
            (None, None) => bail!("either --message or --body is required"),
        };

        let api_key = self.api_key().await.map(|(_, key)| key);
        let provider = BrevoProvider::new(api_key)
            .with_endpoint(self.settings.provider.api_url.clone())
            .with_timeout(Duration::from_secs(
                self.settings.provider.request_timeout_secs,
            ))?;
        let engine = DeliveryEngine::new(
            Arc::new(provider),
            EngineOptions::default(),
        );
        let service = DeliveryService::new(Arc::clone(&self.session), engine, notifier);

        let cancel = CancellationToken::new();
        let interrupt = cancel.clone();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("{} Stopping after the current message...", INFO);
                interrupt.cancel();
            }
        });

        let observer = ProgressObserver::new(theme);
        let result = service
            .send_batch(&recipients, &draft, &observer, &cancel)
            .await;
        watcher.abort();

        let summary = result?;
        if !summary.rejected.is_empty() {
            println!(
                "{} Skipped {} invalid line(s):\n{}",
                INFO,
                summary.rejected.len(),
                render::rejected_lines(&summary.rejected)
            );
        }
        println!("{}", render::report_table(&summary.report));
        Ok(())
    }

    async fn config(&self, command: ConfigCommand) -> Result<()> {
        let keychain = self.storage.keychain();
        let entry = KeychainAccess::provider_api_key(PROVIDER_NAME);

        match command {
            ConfigCommand::Path => {
                println!("settings: {}", self.paths.settings_file.display());
                println!("database: {}", self.paths.database_file.display());
            }
            ConfigCommand::SetKey { key } => {
                let Some(key) = ApiKey::new(key) else {
                    bail!("not a usable API key");
                };
                keychain.store(&entry, key.expose()).await?;
                println!("{} API key stored in {}", SUCCESS, keychain.service_name());
            }
            ConfigCommand::ClearKey => {
                if keychain.delete(&entry).await? {
                    println!("{} API key removed", SUCCESS);
                } else {
                    println!("{} No API key stored", INFO);
                }
            }
        }
        Ok(())
    }

    async fn api_key(&self) -> Option<(CredentialSource, ApiKey)> {
        resolve_api_key(
            &self.settings,
            Some(self.storage.keychain()),
            Path::new(DOTENV_FILE),
        )
        .await
    }
}

fn resolve_paths(config: Option<PathBuf>, database: Option<PathBuf>) -> Result<AppPaths> {
    if let (Some(settings_file), Some(database_file)) = (&config, &database) {
        return Ok(AppPaths {
            settings_file: settings_file.clone(),
            database_file: database_file.clone(),
        });
    }

    let mut paths = AppPaths::discover()?;
    if let Some(settings_file) = config {
        paths.settings_file = settings_file;
    }
    if let Some(database_file) = database {
        paths.database_file = database_file;
    }
    Ok(paths)
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Asks a y/N question on stdin.
fn confirm(prompt: &str) -> Result<bool> {
    println!("{} (y/N): ", prompt);

    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn app(dir: &TempDir) -> App {
        App::open(
            Some(dir.path().join("settings.json")),
            Some(dir.path().join("smartsend.db")),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn state_persists_between_runs() {
        let dir = TempDir::new().unwrap();

        let first = app(&dir).await;
        first
            .execute(Command::Login {
                email: "me@example.com".to_string(),
            })
            .await
            .unwrap();
        first
            .execute(Command::Theme {
                command: ThemeCommand::Toggle,
            })
            .await
            .unwrap();
        drop(first);

        let second = app(&dir).await;
        assert_eq!(
            second.session.sender().await,
            Some("me@example.com".to_string())
        );
        assert_eq!(second.session.theme().await, crate::config::Theme::Light);
    }

    #[tokio::test]
    async fn lists_save_from_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("team.txt");
        std::fs::write(&file, "a@a.com\n\nb@b.com\n").unwrap();

        let app = app(&dir).await;
        app.execute(Command::Lists {
            command: ListsCommand::Save {
                name: "team".to_string(),
                file: Some(file),
            },
        })
        .await
        .unwrap();

        let list = app.lists.load("team").await.unwrap();
        assert_eq!(list.addresses, vec!["a@a.com", "b@b.com"]);

        app.execute(Command::Lists {
            command: ListsCommand::Delete {
                name: "team".to_string(),
                yes: true,
            },
        })
        .await
        .unwrap();
        assert!(app.lists.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn login_rejects_non_address() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir).await;
        let result = app
            .execute(Command::Login {
                email: "nobody".to_string(),
            })
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn explicit_paths_skip_discovery() {
        let paths = resolve_paths(
            Some(PathBuf::from("/tmp/s.json")),
            Some(PathBuf::from("/tmp/d.db")),
        )
        .unwrap();
        assert_eq!(paths.settings_file, PathBuf::from("/tmp/s.json"));
        assert_eq!(paths.database_file, PathBuf::from("/tmp/d.db"));
    }
}
