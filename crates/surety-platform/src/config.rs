use anyhow::{Context, Result};
use surety_core::Identity;
use uuid::Uuid;

pub const DEFAULT_GENESIS_AIRLINE_NAME: &str = "First Airline";
pub const DEFAULT_GATEWAY_IDENTITY: &str = "surety-gateway";

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub http_addr: String,
    pub owner: Identity,
    pub genesis_airline: Identity,
    pub genesis_airline_name: String,
    pub gateway_identity: Identity,
    pub entropy_seed: String,
    pub redis_url: Option<String>,
    /// Shared secret for the owner-only admin routes; unset disables them.
    pub admin_token: Option<String>,
}

impl ServiceConfig {
    pub fn from_env(default_http_addr: &str) -> Result<Self> {
        Self::from_lookup(default_http_addr, |key| std::env::var(key).ok())
    }

    pub fn from_lookup(
        default_http_addr: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let owner = lookup("LEDGER_OWNER").context("LEDGER_OWNER is required")?;
        let owner = Identity::parse(&owner).context("LEDGER_OWNER is not a valid identity")?;

        let genesis_airline = lookup("GENESIS_AIRLINE").context("GENESIS_AIRLINE is required")?;
        let genesis_airline = Identity::parse(&genesis_airline)
            .context("GENESIS_AIRLINE is not a valid identity")?;

        let genesis_airline_name = lookup("GENESIS_AIRLINE_NAME")
            .unwrap_or_else(|| DEFAULT_GENESIS_AIRLINE_NAME.to_string());

        let gateway_identity = lookup("GATEWAY_IDENTITY")
            .unwrap_or_else(|| DEFAULT_GATEWAY_IDENTITY.to_string());
        let gateway_identity = Identity::parse(&gateway_identity)
            .context("GATEWAY_IDENTITY is not a valid identity")?;

        let http_addr = lookup("HTTP_ADDR").unwrap_or_else(|| default_http_addr.to_string());
        let entropy_seed = lookup("LEDGER_ENTROPY_SEED")
            .filter(|seed| !seed.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let redis_url = lookup("REDIS_URL").filter(|url| !url.is_empty());
        let admin_token = lookup("ADMIN_TOKEN").filter(|token| !token.trim().is_empty());

        Ok(Self {
            http_addr,
            owner,
            genesis_airline,
            genesis_airline_name,
            gateway_identity,
            entropy_seed,
            redis_url,
            admin_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn applies_defaults() {
        let config = ServiceConfig::from_lookup(
            "0.0.0.0:8080",
            lookup(&[("LEDGER_OWNER", "0xOwner"), ("GENESIS_AIRLINE", "0xFirst")]),
        )
        .unwrap();

        assert_eq!(config.http_addr, "0.0.0.0:8080");
        assert_eq!(config.owner.as_str(), "0xowner");
        assert_eq!(config.genesis_airline_name, DEFAULT_GENESIS_AIRLINE_NAME);
        assert_eq!(config.gateway_identity.as_str(), DEFAULT_GATEWAY_IDENTITY);
        assert!(!config.entropy_seed.is_empty());
        assert_eq!(config.redis_url, None);
        assert_eq!(config.admin_token, None);
    }

    #[test]
    fn reads_overrides() {
        let config = ServiceConfig::from_lookup(
            "0.0.0.0:8080",
            lookup(&[
                ("LEDGER_OWNER", "owner"),
                ("GENESIS_AIRLINE", "first"),
                ("GENESIS_AIRLINE_NAME", "Origin Air"),
                ("HTTP_ADDR", "127.0.0.1:9000"),
                ("LEDGER_ENTROPY_SEED", "fixed"),
                ("REDIS_URL", "redis://localhost:6379"),
                ("ADMIN_TOKEN", "s3cret"),
            ]),
        )
        .unwrap();

        assert_eq!(config.genesis_airline_name, "Origin Air");
        assert_eq!(config.http_addr, "127.0.0.1:9000");
        assert_eq!(config.entropy_seed, "fixed");
        assert_eq!(config.redis_url.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(config.admin_token.as_deref(), Some("s3cret"));
    }

    #[test]
    fn blank_admin_token_disables_admin_routes() {
        let config = ServiceConfig::from_lookup(
            "0.0.0.0:8080",
            lookup(&[
                ("LEDGER_OWNER", "owner"),
                ("GENESIS_AIRLINE", "first"),
                ("ADMIN_TOKEN", "   "),
            ]),
        )
        .unwrap();
        assert_eq!(config.admin_token, None);
    }

    #[test]
    fn owner_is_required() {
        let err = ServiceConfig::from_lookup("0.0.0.0:8080", lookup(&[("GENESIS_AIRLINE", "first")]))
            .unwrap_err();
        assert!(err.to_string().contains("LEDGER_OWNER"));

        let err = ServiceConfig::from_lookup(
            "0.0.0.0:8080",
            lookup(&[("LEDGER_OWNER", "  "), ("GENESIS_AIRLINE", "first")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("LEDGER_OWNER"));
    }
}
