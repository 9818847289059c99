use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use rainwatch_core::{
    API_KEY_ENV, OpenWeatherProvider, Secrets, WeatherProvider, classify, resolve_api_key,
};

use crate::{
    render::{self, DEFAULT_CITY},
    web::{self, AppState},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "rainwatch", version, about = "Current weather with rain and flood alerts")]
pub struct Cli {
    /// Secrets file holding the API key; defaults to the platform config directory.
    #[arg(long, global = true)]
    pub secrets: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the web UI.
    Serve {
        /// Address to listen on.
        #[arg(long, default_value = "127.0.0.1:8501")]
        bind: SocketAddr,
    },

    /// Print weather and alerts for a city.
    Show {
        /// City name.
        #[arg(default_value = DEFAULT_CITY)]
        city: String,
    },

    /// Store the OpenWeather API key in the secrets file.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let secrets_path = match self.secrets {
            Some(path) => path,
            None => Secrets::secrets_file_path()?,
        };

        match self.command {
            Command::Serve { bind } => {
                let provider = build_provider(std::env::var(API_KEY_ENV).ok(), &secrets_path)?;
                let state = AppState::new(Arc::new(provider))?;
                web::serve(state, bind).await
            }
            Command::Show { city } => {
                let provider = build_provider(std::env::var(API_KEY_ENV).ok(), &secrets_path)?;
                let reading = provider
                    .current(&city)
                    .await
                    .with_context(|| format!("Could not fetch weather data for '{city}'"))?;

                print!("{}", render::render_text(&reading, &classify(&reading)));
                Ok(())
            }
            Command::Configure => configure(&secrets_path),
        }
    }
}

/// Resolve the API key once and hand it to the provider.
fn build_provider(env_value: Option<String>, path: &Path) -> anyhow::Result<OpenWeatherProvider> {
    let api_key = resolve_api_key(env_value, path)?;

    match &api_key {
        Some(key) => tracing::info!(source = %key.source(), "loaded OpenWeather API key"),
        None => tracing::warn!(
            secrets = %path.display(),
            "OpenWeather API key not found in the environment or secrets file"
        ),
    }

    Ok(OpenWeatherProvider::new(api_key))
}

fn configure(path: &Path) -> anyhow::Result<()> {
    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;

    let api_key = api_key.trim();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    let mut secrets = Secrets::load_from(path)?;
    secrets.set_openweather_key(api_key.to_string());
    secrets.save_to(path)?;

    println!("Saved OpenWeather API key to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_defaults_to_mumbai() {
        let cli = Cli::try_parse_from(["rainwatch", "show"]).unwrap();
        match cli.command {
            Command::Show { city } => assert_eq!(city, "Mumbai"),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn serve_accepts_bind_and_secrets() {
        let cli = Cli::try_parse_from([
            "rainwatch",
            "serve",
            "--bind",
            "0.0.0.0:9000",
            "--secrets",
            "/tmp/secrets.toml",
        ])
        .unwrap();

        assert_eq!(cli.secrets.as_deref(), Some(Path::new("/tmp/secrets.toml")));
        match cli.command {
            Command::Serve { bind } => assert_eq!(bind.port(), 9000),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn env_key_ignores_malformed_secrets_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.toml");
        std::fs::write(&path, "api_keys = [not toml").unwrap();

        let provider = build_provider(Some("ENV_KEY".into()), &path).unwrap();
        assert!(provider.has_api_key());

        let err = build_provider(None, &path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse secrets file"));
    }

    #[test]
    fn missing_key_still_builds_provider() {
        let dir = tempfile::tempdir().unwrap();

        let provider = build_provider(None, &dir.path().join("absent.toml")).unwrap();
        assert!(!provider.has_api_key());
    }

    #[test]
    fn rejects_bad_bind_address() {
        assert!(Cli::try_parse_from(["rainwatch", "serve", "--bind", "nowhere"]).is_err());
    }
}
