//! Configuration module
//!
//! Settings are read from the process environment (optionally seeded from a
//! `.env` file). Every component receives the pieces it needs explicitly at
//! startup; nothing reads the environment after `Config::from_env` returns.

use std::env;
use std::path::PathBuf;

const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_FILE_SIZE_MB: usize = 100;
const THUMBNAIL_MAX_DIMENSION: u32 = 300;
const THUMBNAIL_QUALITY: u8 = 85;
const PREVIEW_MAX_DIMENSION: u32 = 1920;
const PREVIEW_QUALITY: u8 = 90;

/// Upload acceptance rules
#[derive(Clone, Debug)]
pub struct UploadLimits {
    pub max_file_size_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_size_bytes: MAX_FILE_SIZE_MB * 1024 * 1024,
            allowed_extensions: split_list("jpg,jpeg,png,tif,tiff"),
            allowed_content_types: split_list("image/jpeg,image/png,image/tiff"),
        }
    }
}

/// Derivative rendering parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DerivativeSettings {
    pub thumbnail_max_dimension: u32,
    pub thumbnail_quality: u8,
    pub preview_max_width: u32,
    pub preview_max_height: u32,
    pub preview_quality: u8,
}

impl Default for DerivativeSettings {
    fn default() -> Self {
        Self {
            thumbnail_max_dimension: THUMBNAIL_MAX_DIMENSION,
            thumbnail_quality: THUMBNAIL_QUALITY,
            preview_max_width: PREVIEW_MAX_DIMENSION,
            preview_max_height: PREVIEW_MAX_DIMENSION,
            preview_quality: PREVIEW_QUALITY,
        }
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub storage_root: PathBuf,
    pub upload: UploadLimits,
    pub derivatives: DerivativeSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_FILE_SIZE_MB);

        let defaults = UploadLimits::default();
        let upload = UploadLimits {
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            allowed_extensions: env::var("ALLOWED_EXTENSIONS")
                .map(|s| split_list(&s))
                .unwrap_or(defaults.allowed_extensions),
            allowed_content_types: env::var("ALLOWED_CONTENT_TYPES")
                .map(|s| split_list(&s))
                .unwrap_or(defaults.allowed_content_types),
        };

        let derivatives = DerivativeSettings {
            thumbnail_max_dimension: env::var("THUMBNAIL_MAX_DIMENSION")
                .unwrap_or_else(|_| THUMBNAIL_MAX_DIMENSION.to_string())
                .parse()
                .unwrap_or(THUMBNAIL_MAX_DIMENSION),
            thumbnail_quality: env::var("THUMBNAIL_QUALITY")
                .unwrap_or_else(|_| THUMBNAIL_QUALITY.to_string())
                .parse()
                .unwrap_or(THUMBNAIL_QUALITY),
            preview_max_width: env::var("PREVIEW_MAX_WIDTH")
                .unwrap_or_else(|_| PREVIEW_MAX_DIMENSION.to_string())
                .parse()
                .unwrap_or(PREVIEW_MAX_DIMENSION),
            preview_max_height: env::var("PREVIEW_MAX_HEIGHT")
                .unwrap_or_else(|_| PREVIEW_MAX_DIMENSION.to_string())
                .parse()
                .unwrap_or(PREVIEW_MAX_DIMENSION),
            preview_quality: env::var("PREVIEW_QUALITY")
                .unwrap_or_else(|_| PREVIEW_QUALITY.to_string())
                .parse()
                .unwrap_or(PREVIEW_QUALITY),
        };

        Ok(Config {
            environment,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            storage_root: env::var("STORAGE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./storage")),
            upload,
            derivatives,
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.db_max_connections == 0 {
            return Err(anyhow::anyhow!("DB_MAX_CONNECTIONS must be at least 1"));
        }

        if self.upload.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be at least 1"));
        }

        if self.upload.allowed_extensions.is_empty() || self.upload.allowed_content_types.is_empty()
        {
            return Err(anyhow::anyhow!(
                "ALLOWED_EXTENSIONS and ALLOWED_CONTENT_TYPES must not be empty"
            ));
        }

        let d = &self.derivatives;
        for (name, quality) in [
            ("THUMBNAIL_QUALITY", d.thumbnail_quality),
            ("PREVIEW_QUALITY", d.preview_quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(anyhow::anyhow!("{} must be between 1 and 100", name));
            }
        }
        if d.thumbnail_max_dimension == 0 || d.preview_max_width == 0 || d.preview_max_height == 0
        {
            return Err(anyhow::anyhow!("Derivative dimensions must be non-zero"));
        }

        if self.is_production() && self.storage_root.is_relative() {
            return Err(anyhow::anyhow!(
                "STORAGE_ROOT must be an absolute path in production"
            ));
        }

        Ok(())
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            environment: "development".to_string(),
            database_url: "postgresql://localhost/fampho".to_string(),
            db_max_connections: 5,
            db_timeout_seconds: 30,
            storage_root: PathBuf::from("./storage"),
            upload: UploadLimits::default(),
            derivatives: DerivativeSettings::default(),
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(config().validate().is_ok());
        let d = DerivativeSettings::default();
        assert_eq!(d.thumbnail_max_dimension, 300);
        assert_eq!(d.thumbnail_quality, 85);
        assert_eq!((d.preview_max_width, d.preview_max_height), (1920, 1920));
        assert_eq!(d.preview_quality, 90);
    }

    #[test]
    fn rejects_non_postgres_url() {
        let mut c = config();
        c.database_url = "mysql://localhost/fampho".to_string();
        assert!(c.validate().is_err());
    }

    #[test]
    fn rejects_bad_quality() {
        let mut c = config();
        c.derivatives.preview_quality = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn production_requires_absolute_storage_root() {
        let mut c = config();
        c.environment = "Production".to_string();
        assert!(c.is_production());
        assert!(c.validate().is_err());
        c.storage_root = PathBuf::from("/var/lib/fampho");
        assert!(c.validate().is_ok());
    }

    #[test]
    fn split_list_trims_and_lowercases() {
        assert_eq!(split_list(" JPG, png ,,"), vec!["jpg", "png"]);
    }
}
