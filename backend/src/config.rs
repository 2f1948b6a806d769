use anyhow::{anyhow, Context};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: u64,
    pub time_zone: Tz,
    pub directory_timeout_ms: u64,
    pub bind_addr: String,
    pub db_max_connections: u32,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;

        let jwt_expiration_hours = parse_or("JWT_EXPIRATION_HOURS", 1)?;

        let time_zone_name = env::var("APP_TIMEZONE").unwrap_or_else(|_| "UTC".to_string());
        let time_zone: Tz = time_zone_name
            .parse()
            .map_err(|_| anyhow!("Invalid APP_TIMEZONE value: {}", time_zone_name))?;

        let directory_timeout_ms = parse_or("DIRECTORY_TIMEOUT_MS", 2000)?;
        if directory_timeout_ms == 0 {
            return Err(anyhow!("DIRECTORY_TIMEOUT_MS must be positive"));
        }

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", 10)?;

        Ok(Config {
            database_url,
            jwt_secret,
            jwt_expiration_hours,
            time_zone,
            directory_timeout_ms,
            bind_addr,
            db_max_connections,
        })
    }

    pub fn directory_timeout(&self) -> Duration {
        Duration::from_millis(self.directory_timeout_ms)
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow!("Invalid {} value: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_falls_back_when_unset() {
        let value: u64 = parse_or("SELFSERVICE_TEST_UNSET_KEY", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn directory_timeout_is_in_milliseconds() {
        let config = Config {
            database_url: "postgres://localhost/selfservice".into(),
            jwt_secret: "secret".into(),
            jwt_expiration_hours: 1,
            time_zone: chrono_tz::UTC,
            directory_timeout_ms: 1500,
            bind_addr: "127.0.0.1:0".into(),
            db_max_connections: 5,
        };
        assert_eq!(config.directory_timeout(), Duration::from_millis(1500));
    }
}
