use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

use crate::domains::registrants::identity::DEFAULT_ALLOCATION_ATTEMPTS;
use crate::domains::registrants::models::SectorTable;
use crate::kernel::DEFAULT_BATCH_SIZE;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Reject registrants whose sector is missing or unknown instead of
    /// falling back to the generic prefix
    pub strict_sectors: bool,
    pub allocation_attempts: u32,
    /// JSON file of sector prefix overrides, merged over the built-in table
    pub sector_table_path: Option<PathBuf>,
    pub reconcile_batch_size: i64,
    pub scheduler_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            strict_sectors: parse_bool("MEMBER_ID_STRICT_SECTORS", false)?,
            allocation_attempts: env::var("MEMBER_ID_ALLOCATION_ATTEMPTS")
                .unwrap_or_else(|_| DEFAULT_ALLOCATION_ATTEMPTS.to_string())
                .parse()
                .context("MEMBER_ID_ALLOCATION_ATTEMPTS must be a positive number")?,
            sector_table_path: env::var("SECTOR_TABLE_PATH").ok().map(PathBuf::from),
            reconcile_batch_size: env::var("RECONCILE_BATCH_SIZE")
                .unwrap_or_else(|_| DEFAULT_BATCH_SIZE.to_string())
                .parse()
                .context("RECONCILE_BATCH_SIZE must be a valid number")?,
            scheduler_enabled: parse_bool("SCHEDULER_ENABLED", true)?,
        })
    }

    /// Built-in sector table, with overrides from `sector_table_path` if set
    pub fn load_sector_table(&self) -> Result<SectorTable> {
        match &self.sector_table_path {
            Some(path) => SectorTable::from_json_file(path),
            None => Ok(SectorTable::default()),
        }
    }
}

fn parse_bool(key: &str, default: bool) -> Result<bool> {
    match env::var(key) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            other => anyhow::bail!("{} must be a boolean, got {:?}", key, other),
        },
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::registrants::models::Sector;

    fn config(sector_table_path: Option<PathBuf>) -> Config {
        Config {
            database_url: "postgres://localhost/test".to_string(),
            port: 8080,
            strict_sectors: false,
            allocation_attempts: DEFAULT_ALLOCATION_ATTEMPTS,
            sector_table_path,
            reconcile_batch_size: DEFAULT_BATCH_SIZE,
            scheduler_enabled: true,
        }
    }

    #[test]
    fn test_default_sector_table_without_path() {
        let table = config(None).load_sector_table().unwrap();
        assert_eq!(table.prefix(Sector::Youth), "YTH");
    }

    #[test]
    fn test_missing_sector_table_file_is_an_error() {
        let path = PathBuf::from("/nonexistent/sectors.json");
        assert!(config(Some(path)).load_sector_table().is_err());
    }
}
