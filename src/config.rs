// src/config.rs
use std::net::IpAddr;

use anyhow::{anyhow, Context};

use crate::finance::calculator::BataBase;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub db_max_connections: u32,
    pub bata_base: BataBase,
}

impl Config {
    /// Reads the process environment; call after `dotenvy::dotenv()`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = get("DATABASE_URL").context("DATABASE_URL must be set")?;

        let host = match get("HOST") {
            Some(h) => h.parse().with_context(|| format!("HOST '{h}' is not an IP address"))?,
            None => IpAddr::from([127, 0, 0, 1]),
        };
        let port = match get("PORT") {
            Some(p) => p.parse().with_context(|| format!("PORT '{p}' is not a port number"))?,
            None => 3000,
        };
        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(n) => n
                .parse()
                .with_context(|| format!("DB_MAX_CONNECTIONS '{n}' is not a number"))?,
            None => 5,
        };
        let bata_base = match get("DRIVER_BATA_BASE") {
            Some(b) => b.parse::<BataBase>().map_err(|e| anyhow!(e))?,
            None => BataBase::default(),
        };

        Ok(Self {
            database_url,
            host,
            port,
            db_max_connections,
            bata_base,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/fleet")]).unwrap();
        assert_eq!(config.host, IpAddr::from([127, 0, 0, 1]));
        assert_eq!(config.port, 3000);
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.bata_base, BataBase::Rent);
    }

    #[test]
    fn database_url_is_required() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("DATABASE_URL", "postgres://db/fleet"),
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("DRIVER_BATA_BASE", "net_of_commission"),
        ])
        .unwrap();
        assert_eq!(config.host, IpAddr::from([0, 0, 0, 0]));
        assert_eq!(config.port, 8080);
        assert_eq!(config.bata_base, BataBase::NetOfCommission);
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(load(&[("DATABASE_URL", "x"), ("PORT", "http")]).is_err());
        assert!(load(&[("DATABASE_URL", "x"), ("DRIVER_BATA_BASE", "gross")]).is_err());
    }
}
