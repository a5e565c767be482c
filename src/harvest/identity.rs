//! Outbound request identity
//!
//! Every fetch attempt draws a fresh identity: a browser user-agent string
//! picked uniformly at random, combined with a fixed baseline header set.
//! Successive attempts for the same unit therefore do not share a
//! fingerprint.

use crate::config::IdentityConfig;
use crate::ConfigError;
use rand::seq::IndexedRandom;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, REFERER, USER_AGENT,
};

/// The simulated client fingerprint of one request
#[derive(Debug, Clone)]
pub struct Identity {
    user_agent: String,
    headers: HeaderMap,
}

impl Identity {
    /// Builds an identity from a user agent and a baseline header set
    ///
    /// The user agent is merged over the baseline.
    pub fn new(user_agent: &str, baseline: &HeaderMap) -> Result<Self, ConfigError> {
        let mut headers = baseline.clone();
        headers.insert(USER_AGENT, parse_value("user-agent", user_agent)?);

        Ok(Self {
            user_agent: user_agent.to_string(),
            headers,
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Full header set to send, user agent included
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// Supplies the identity for each fetch attempt
pub trait IdentitySource: Send + Sync {
    fn next_identity(&self) -> Identity;
}

/// Picks a random identity from a fixed pool
///
/// Identities are built once at construction; `next_identity` only draws
/// from the pool, so the rotator holds no mutable state.
#[derive(Debug, Clone)]
pub struct IdentityRotator {
    pool: Vec<Identity>,
}

impl IdentityRotator {
    /// Builds the pool from the configured user agents and baseline headers
    ///
    /// # Arguments
    ///
    /// * `config` - User agents and baseline header values
    /// * `referer` - Referer header sent with every request of the stage
    pub fn from_config(config: &IdentityConfig, referer: &str) -> Result<Self, ConfigError> {
        let baseline = baseline_headers(config, referer)?;

        let mut pool: Vec<Identity> = Vec::with_capacity(config.user_agents.len());
        for agent in config.user_agents.iter().map(|agent| agent.trim()) {
            if agent.is_empty() || pool.iter().any(|identity| identity.user_agent == agent) {
                continue;
            }
            pool.push(Identity::new(agent, &baseline)?);
        }

        if pool.is_empty() {
            return Err(ConfigError::Validation(
                "at least one user agent is required".to_string(),
            ));
        }

        Ok(Self { pool })
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}

impl IdentitySource for IdentityRotator {
    fn next_identity(&self) -> Identity {
        // pool is never empty once constructed
        self.pool
            .choose(&mut rand::rng())
            .unwrap_or(&self.pool[0])
            .clone()
    }
}

/// Always hands out the same identity
#[derive(Debug, Clone)]
pub struct FixedIdentity(Identity);

impl FixedIdentity {
    pub fn new(identity: Identity) -> Self {
        Self(identity)
    }
}

impl IdentitySource for FixedIdentity {
    fn next_identity(&self) -> Identity {
        self.0.clone()
    }
}

/// Builds the baseline header set shared by every identity of a stage
pub fn baseline_headers(config: &IdentityConfig, referer: &str) -> Result<HeaderMap, ConfigError> {
    let mut headers = HeaderMap::new();
    let entries: [(HeaderName, &str, &str); 4] = [
        (ACCEPT, "accept", &config.accept),
        (ACCEPT_LANGUAGE, "accept-language", &config.accept_language),
        (CONNECTION, "connection", &config.connection),
        (REFERER, "referer", referer),
    ];

    for (name, label, value) in entries {
        headers.insert(name, parse_value(label, value)?);
    }

    Ok(headers)
}

fn parse_value(name: &str, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value).map_err(|_| {
        ConfigError::Validation(format!("Invalid value for header {}: '{}'", name, value))
    })
}
