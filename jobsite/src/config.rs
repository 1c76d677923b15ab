use crate::error::JobsiteError;
use anyhow::Result;
use directories::ProjectDirs;
use log::debug;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Minimum length of the secret used to sign access tokens
pub const MIN_JWT_SECRET_LEN: usize = 16;

/// Application configuration struct
/// Holds the settings of the HTTP server, the database, token signing and uploads.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct AppConfiguration {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseSettings,

    pub auth: AuthConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct ServerConfig {
    /// Address and port the HTTP server binds to, i.e. `127.0.0.1:4000`
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "127.0.0.1:4000".to_string(),
        }
    }
}

/// Holds the configuration for the `database` section of the Toml file
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct DatabaseSettings {
    /// The path to the Sqlite database file
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: data_dir().join("jobsite.db").to_string_lossy().to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    #[serde(default = "default_admin_cookie")]
    pub admin_cookie: String,
    #[serde(default = "default_user_cookie")]
    pub user_cookie: String,
}

impl AuthConfig {
    /// Creates an auth section holding a freshly generated signing secret
    #[must_use]
    pub fn with_random_secret() -> Self {
        let secret: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(48)
            .map(char::from)
            .collect();
        AuthConfig {
            jwt_secret: secret,
            token_ttl_hours: default_token_ttl_hours(),
            admin_cookie: default_admin_cookie(),
            user_cookie: default_user_cookie(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct StorageConfig {
    /// Directory holding uploaded files and signatures
    pub upload_dir: String,
    /// Prefix of the public URL of an uploaded file, the blob key is appended
    pub public_base_url: String,
    pub max_upload_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            upload_dir: data_dir().join("uploads").to_string_lossy().to_string(),
            public_base_url: "http://127.0.0.1:4000/files".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl AppConfiguration {
    /// Default configuration with a random signing secret, used by `init-config`
    #[must_use]
    pub fn generate() -> Self {
        AppConfiguration {
            server: ServerConfig::default(),
            database: DatabaseSettings::default(),
            auth: AuthConfig::with_random_secret(),
            storage: StorageConfig::default(),
        }
    }

    /// Verifies the settings which can not be expressed by the serde defaults
    ///
    /// # Errors
    /// Returns `JobsiteError::InvalidConfig` naming the offending setting
    pub fn validate(&self) -> Result<(), JobsiteError> {
        if self.auth.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(JobsiteError::InvalidConfig(format!(
                "auth.jwt_secret must hold at least {MIN_JWT_SECRET_LEN} characters"
            )));
        }
        if self.auth.token_ttl_hours <= 0 {
            return Err(JobsiteError::InvalidConfig(
                "auth.token_ttl_hours must be positive".to_string(),
            ));
        }
        if self.auth.admin_cookie == self.auth.user_cookie {
            return Err(JobsiteError::InvalidConfig(
                "auth.admin_cookie and auth.user_cookie must differ".to_string(),
            ));
        }
        self.bind_address()?;
        url::Url::parse(&self.storage.public_base_url)?;
        Ok(())
    }

    /// # Errors
    /// Returns an error if `server.bind` is not a socket address
    pub fn bind_address(&self) -> Result<SocketAddr, JobsiteError> {
        self.server.bind.parse().map_err(|_| {
            JobsiteError::InvalidConfig(format!(
                "server.bind '{}' is not a valid socket address",
                self.server.bind
            ))
        })
    }
}

/// Filename holding the application configuration parameters
#[must_use]
pub fn configuration_file() -> PathBuf {
    project_dirs().map_or_else(
        || PathBuf::from("jobsite.toml"),
        |dirs| dirs.config_dir().join("jobsite.toml"),
    )
}

fn data_dir() -> PathBuf {
    project_dirs().map_or_else(|| PathBuf::from("."), |dirs| dirs.data_dir().to_path_buf())
}

/// Loads and validates the configuration from `path`, or from the default location
///
/// # Errors
/// Returns an error if the file can not be read, parsed or holds invalid settings
pub fn load(path: Option<&Path>) -> Result<AppConfiguration, JobsiteError> {
    let config_path = path.map_or_else(configuration_file, Path::to_path_buf);
    debug!("Loading configuration from {}", config_path.display());
    let app_config = read(&config_path)?;
    app_config.validate()?;
    Ok(app_config)
}

#[allow(clippy::missing_errors_doc)]
pub fn save(cfg: &AppConfiguration, path: &Path) -> Result<()> {
    create_configuration_file(cfg, path)
}

#[allow(clippy::missing_errors_doc)]
pub fn application_config_to_string(cfg: &AppConfiguration) -> Result<String> {
    Ok(toml::to_string::<AppConfiguration>(cfg)?)
}

fn default_token_ttl_hours() -> i64 {
    12
}

fn default_admin_cookie() -> String {
    "admin_token".to_string()
}

fn default_user_cookie() -> String {
    "user_token".to_string()
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "jobsite", "jobsite")
}

/// Reads the `AppConfiguration` struct from the supplied TOML file
fn read(path: &Path) -> Result<AppConfiguration, JobsiteError> {
    let mut file = File::open(path).map_err(|source| JobsiteError::ApplicationConfig {
        path: path.into(),
        source,
    })?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|source| JobsiteError::ApplicationConfig {
            path: path.into(),
            source,
        })?;
    toml::from_str::<AppConfiguration>(&contents).map_err(|source| JobsiteError::TomlParse {
        path: path.into(),
        source,
    })
}

fn create_configuration_file(cfg: &AppConfiguration, path: &Path) -> Result<()> {
    if let Some(directory) = path.parent() {
        if !directory.as_os_str().is_empty() && !directory.try_exists()? {
            fs::create_dir_all(directory)?;
        }
    }

    let mut file = File::create(path)?;
    let toml = application_config_to_string(cfg)?;
    file.write_all(toml.as_bytes())?;

    Ok(())
}
