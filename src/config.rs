use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Base URL of the managed backend project
    #[arg(long, env = "BACKEND_URL")]
    pub backend_url: Option<String>,

    /// API key for the managed backend project
    #[arg(long, env = "BACKEND_API_KEY")]
    pub backend_api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://myproject.backend.example/`.
    pub base_url: String,
    /// Project API key sent with every request.
    pub api_key: String,
    /// Per-request timeout in seconds. Change feeds are exempt.
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Idle minutes after which a UI session is swept.
    pub idle_timeout_minutes: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder();

        // 1. Defaults
        builder = builder
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("backend.base_url", "")?
            .set_default("backend.api_key", "")?
            .set_default("backend.request_timeout_secs", 30)?
            .set_default("session.idle_timeout_minutes", 30)?;

        // 2. Config file (CLI flag or CONFIG_FILE; ./config.yaml as fallback)
        if let Some(path) = &cli.config {
            builder = builder.add_source(File::with_name(path));
        } else if std::path::Path::new("config.yaml").exists() {
            builder = builder.add_source(File::with_name("config.yaml"));
        }

        // 3. Environment variables, e.g. HUDDLE_SERVER__PORT=8000
        builder = builder.add_source(
            Environment::with_prefix("HUDDLE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // Direct env names kept for container deployments that predate the
        // HUDDLE_ prefix.
        if let Ok(val) = env::var("BACKEND_URL") {
            builder = builder.set_override("backend.base_url", val)?;
        }
        if let Ok(val) = env::var("BACKEND_API_KEY") {
            builder = builder.set_override("backend.api_key", val)?;
        }

        // 4. CLI overrides win over everything
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(url) = cli.backend_url {
            builder = builder.set_override("backend.base_url", url)?;
        }
        if let Some(key) = cli.backend_api_key {
            builder = builder.set_override("backend.api_key", key)?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }
}
