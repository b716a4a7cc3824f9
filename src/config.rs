use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

/// Application settings: built-in defaults, then an optional `appsettings`
/// file, then `APP__SECTION__KEY` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub storage: StorageSettings,
    pub session: SessionSettings,
    #[serde(default)]
    pub admin: AdminSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Without a URL the service runs on the in-memory store.
    pub url: Option<String>,
    pub pool_size: u32,
    pub timeout_seconds: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    pub root: String,
    pub public_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub lifetime_minutes: i64,
    pub secure: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AdminSettings {
    pub bootstrap_name: Option<String>,
    pub bootstrap_email: Option<String>,
    pub bootstrap_password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub level: String,
}

fn with_defaults(builder: ConfigBuilder<DefaultState>) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    builder
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8000_i64)?
        .set_default("server.allowed_origins", Vec::<String>::new())?
        .set_default("database.pool_size", 10_i64)?
        .set_default("database.timeout_seconds", 30_i64)?
        .set_default("database.run_migrations", true)?
        .set_default("storage.root", "storage")?
        .set_default("storage.public_prefix", "/storage")?
        .set_default("session.cookie_name", "catalog_admin_session")?
        .set_default("session.lifetime_minutes", 120_i64)?
        .set_default("session.secure", false)?
        .set_default("log.level", "info")
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        with_defaults(Config::builder())?
            .add_source(File::with_name("appsettings").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.allowed_origins")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Built-in defaults only, ignoring files and the environment.
    pub fn defaults() -> Result<Self, ConfigError> {
        with_defaults(Config::builder())?.build()?.try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
