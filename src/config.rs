//! Environment configuration

use std::env;
use std::str::FromStr;

use crate::domain::barcode::{CodeSettings, DEFAULT_COUNTRY_CODE, DEFAULT_PRODUCER_CODE};

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub max_connections: u32,
    pub nats_url: Option<String>,
    pub codes: CodeSettings,
    pub product_code_attempts: u32,
}

impl Config {
    /// Read `.env` (if any) and the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let producer = env::var("BARCODE_PRODUCER_CODE").unwrap_or_else(|_| DEFAULT_PRODUCER_CODE.to_string());
        let country = env::var("BARCODE_COUNTRY_CODE").unwrap_or_else(|_| DEFAULT_COUNTRY_CODE.to_string());
        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            port: parse_or("PORT", 8083)?,
            max_connections: parse_or("DB_MAX_CONNECTIONS", 10)?,
            nats_url: env::var("NATS_URL").ok().filter(|u| !u.is_empty()),
            codes: CodeSettings::new(producer, country)?,
            product_code_attempts: parse_or("PRODUCT_CODE_ATTEMPTS", 8)?,
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|e| anyhow::anyhow!("{key}={raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}
