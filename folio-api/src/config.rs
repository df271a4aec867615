use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{Context, Result, anyhow};
use secrecy::SecretString;
use tracing::{info, warn};

use crate::session::DEFAULT_SESSION_TTL;

const DEFAULT_ADMIN_USER: &str = "admin";
const DEFAULT_ADMIN_PASS: &str = "change-me-now";
const DEFAULT_SESSION_SECRET: &str = "replace-this-session-secret";

pub struct Config {
    pub port: u16,
    pub content_file: PathBuf,
    pub admin_user: String,
    /// bcrypt hash the login password is verified against.
    pub admin_pass_hash: String,
    pub session_secret: SecretString,
    pub session_ttl: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        let admin_pass_hash = match var("ADMIN_PASS_HASH") {
            Some(hash) => hash,
            None => {
                let plain = var("ADMIN_PASS").unwrap_or_else(|| {
                    warn!("ADMIN_PASS not set, using the default password. Override it before deploying.");
                    DEFAULT_ADMIN_PASS.to_string()
                });
                bcrypt::hash(plain, bcrypt::DEFAULT_COST).context("Failed to hash ADMIN_PASS")?
            }
        };

        let session_secret = var("SESSION_SECRET").unwrap_or_else(|| {
            warn!("SESSION_SECRET not set, session cookies are signed with the default secret.");
            DEFAULT_SESSION_SECRET.to_string()
        });

        Ok(Self {
            port: try_load("PORT", "3000")?,
            content_file: try_load("CONTENT_FILE", "data/content.json")?,
            admin_user: try_load("ADMIN_USER", DEFAULT_ADMIN_USER)?,
            admin_pass_hash,
            session_secret: SecretString::from(session_secret),
            session_ttl: Duration::from_secs(try_load(
                "SESSION_TTL_SECS",
                &DEFAULT_SESSION_TTL.as_secs().to_string(),
            )?),
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| anyhow!("Invalid {key} value: {e}"))
}
