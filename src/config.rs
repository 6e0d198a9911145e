use dotenvy::dotenv;
use std::env;
use eyre::{Result, eyre};

pub const DEFAULT_SNAPSHOT_PATH: &str = "data/sample_snapshot.json";
pub const DEFAULT_EARN_CATALOG_PATH: &str = "data/earn_catalog.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub snapshot_path: String,
    pub earn_catalog_path: String,
    pub include_empty: bool, // Report every known opportunity, not only the ones the wallet holds
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let snapshot_path = env::var("SNAPSHOT_PATH").unwrap_or_else(|_| DEFAULT_SNAPSHOT_PATH.to_string());
        let earn_catalog_path = env::var("EARN_CATALOG_PATH").unwrap_or_else(|_| DEFAULT_EARN_CATALOG_PATH.to_string());

        let include_empty = match env::var("REPORT_INCLUDE_EMPTY") {
            Ok(value) => parse_bool(&value)
                .ok_or_else(|| eyre!("Invalid REPORT_INCLUDE_EMPTY value `{}` (must be 'true' or 'false')", value))?,
            Err(_) => true,
        };

        Ok(Config {
            snapshot_path,
            earn_catalog_path,
            include_empty,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::parse_bool;

    #[test]
    fn parses_common_boolean_spellings() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" no "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
