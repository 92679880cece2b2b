use serde::Deserialize;
use std::path::{Path, PathBuf};
use validator::Validate;

/// Main configuration for the chat server
#[derive(Debug, Deserialize, Validate, Clone)]
pub struct Config {
    /// Interface to bind
    pub server_host: String,

    /// HTTP server port
    #[validate(range(min = 1))]
    pub server_port: u16,

    /// Database URL (SeaORM / SQLite)
    pub database_url: String,

    /// Maximum database connections
    #[validate(range(min = 1, max = 100))]
    pub max_connections: u32,

    /// Log level used when RUST_LOG is not set (e.g., info, debug, trace)
    pub log_level: String,

    /// Front-end origin allowed by CORS. `None` allows any origin without credentials.
    pub client_url: Option<String>,

    /// Directory holding the built single-page app; non-API routes are served from here
    pub static_dir: Option<PathBuf>,

    /// PEM-encoded RS256 public key of the identity provider
    pub jwt_public_key: Option<String>,

    /// HS256 shared secret, for deployments that mint their own tokens
    #[validate(length(min = 32))]
    pub jwt_secret: Option<String>,

    /// Expected `iss` claim, if any
    pub jwt_issuer: Option<String>,

    /// Image CDN credentials used to sign browser uploads
    pub imagekit_public_key: Option<String>,
    pub imagekit_private_key: Option<String>,
    pub imagekit_url_endpoint: Option<String>,

    /// Requests per minute allowed per client IP on /api routes
    #[validate(range(min = 1))]
    pub rate_limit_per_minute: u32,

    /// Chat titles are the first N characters of the opening message
    #[validate(range(min = 1, max = 200))]
    pub title_max_chars: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            database_url: "sqlite://parley.db".to_string(),
            max_connections: 10,
            log_level: "info".to_string(),
            client_url: None,
            static_dir: None,
            jwt_public_key: None,
            jwt_secret: None,
            jwt_issuer: None,
            imagekit_public_key: None,
            imagekit_private_key: None,
            imagekit_url_endpoint: None,
            rate_limit_per_minute: 600,
            title_max_chars: 40,
        }
    }
}

impl Config {
    /// Loads configuration from `~/.parley/config.toml` (or `path`, when given)
    /// and `PARLEY__*` environment variables, in that order of precedence.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let file = match path {
            Some(p) => config::File::from(p.to_path_buf()).required(true),
            None => {
                let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
                config::File::from(home.join(".parley").join("config")).required(false)
            }
        };

        let defaults = Config::default();
        let settings = config::Config::builder()
            .set_default("server_host", defaults.server_host)?
            .set_default("server_port", defaults.server_port)?
            .set_default("database_url", defaults.database_url)?
            .set_default("max_connections", defaults.max_connections)?
            .set_default("log_level", defaults.log_level)?
            .set_default("rate_limit_per_minute", defaults.rate_limit_per_minute)?
            .set_default("title_max_chars", defaults.title_max_chars as u64)?
            .add_source(file)
            // Environment overrides: PARLEY__SERVER_PORT, PARLEY__JWT_SECRET, etc.
            .add_source(config::Environment::with_prefix("PARLEY").separator("__"))
            .build()?;

        let cfg: Config = settings.try_deserialize()?;
        cfg.check()?;
        Ok(cfg)
    }

    /// Field validation plus the cross-field rules `validator` can't express.
    pub fn check(&self) -> Result<(), config::ConfigError> {
        self.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;

        if self.jwt_public_key.is_none() && self.jwt_secret.is_none() {
            return Err(config::ConfigError::Message(
                "one of jwt_public_key or jwt_secret must be set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Upload signing is only available when the CDN private key is configured.
    pub fn uploads_enabled(&self) -> bool {
        self.imagekit_private_key.is_some()
    }
}
