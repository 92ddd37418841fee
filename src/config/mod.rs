use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use config::builder::DefaultState;
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: u32,
}

impl ServerConfig {
    /// Worker threads for `HttpServer`, which rejects zero.
    pub fn workers(&self) -> usize {
        (self.workers as usize).max(1)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allowed_origin: String,
    pub max_age: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub cookie_secret: String,
    /// Zero keeps sessions for the lifetime of the process.
    pub idle_timeout_minutes: i64,
    pub cleanup_interval_secs: u64,
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Option<chrono::Duration> {
        (self.idle_timeout_minutes > 0).then(|| chrono::Duration::minutes(self.idle_timeout_minutes))
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs.max(1))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MongoConfig {
    pub connect_timeout_secs: u64,
    pub app_name: String,
}

impl MongoConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub session: SessionConfig,
    pub mongo: MongoConfig,
}

fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
    environment: &str,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    builder
        .set_default("environment", environment)?
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8000)?
        .set_default("server.workers", num_cpus::get() as i64)?
        .set_default("cors.allowed_origin", "http://127.0.0.1:3000")?
        .set_default("cors.max_age", 3600)?
        .set_default("session.cookie_secret", "development_cookie_secret")?
        .set_default("session.idle_timeout_minutes", 60)?
        .set_default("session.cleanup_interval_secs", 60)?
        .set_default("mongo.connect_timeout_secs", 5)?
        .set_default("mongo.app_name", "mongo-gateway")
}

// `separator` would also become the prefix separator, so set it back to `_`
fn environment(prefix: &str) -> Environment {
    Environment::with_prefix(prefix)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = with_defaults(Config::builder(), "development")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // E.g., `APP_SERVER__PORT=5001` would set `Settings.server.port`
            .add_source(environment("app"))
            .build()?;

        s.try_deserialize()
    }

    /// Defaults only; config files and the environment are ignored.
    pub fn new_for_test() -> Result<Self, ConfigError> {
        with_defaults(Config::builder(), "test")?
            .set_override("session.cookie_secret", "test_cookie_secret")?
            .build()?
            .try_deserialize()
    }
}
