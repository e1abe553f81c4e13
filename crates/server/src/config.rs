//! Process configuration, read from the environment once at startup.

use std::{
    fmt::Display,
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use secrecy::SecretString;
use services::services::og_metadata::SiteMetadata;
use thiserror::Error;

use crate::routes::og::RENDERER_PATH;

/// Party codes accepted before the first directory refresh completes.
pub const DEFAULT_PARTY_CODES: &str = "dmj,ppp,rnp,tmj,gnp";
pub const DEFAULT_EXCLUDED_PREFIXES: &str = "api,assets,static,favicon.ico,robots.txt";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
    #[error(
        "no candidate directory configured: set DATABASE_URL, or SUPABASE_URL and SUPABASE_ANON_KEY"
    )]
    MissingDirectory,
}

/// Where candidate records are read from.
#[derive(Debug)]
pub enum DirectoryConfig {
    Postgres { database_url: SecretString },
    Rest { base_url: String, api_key: SecretString },
}

/// Shared-cache policy for resolved share cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub s_maxage_secs: u64,
    pub stale_while_revalidate_secs: u64,
}

impl CachePolicy {
    pub fn header_value(&self) -> String {
        format!(
            "public, s-maxage={}, stale-while-revalidate={}",
            self.s_maxage_secs, self.stale_while_revalidate_secs
        )
    }
}

#[derive(Debug)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub environment: String,
    pub sentry_dsn: Option<String>,
    pub site: SiteMetadata,
    pub directory: DirectoryConfig,
    pub lookup_timeout: Duration,
    pub party_codes: Vec<String>,
    pub party_code_refresh: Duration,
    pub cache: CachePolicy,
    pub static_dir: Option<PathBuf>,
    pub excluded_prefixes: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let host: IpAddr = env.parse("HOST", IpAddr::from([0, 0, 0, 0]))?;
        let port: u16 = env.parse("PORT", 3000)?;

        let origin = env.string("SITE_ORIGIN", "http://localhost:3000");
        if !(origin.starts_with("http://") || origin.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "SITE_ORIGIN",
                message: format!("expected an http(s) origin, got {origin:?}"),
            });
        }
        let origin = origin.trim_end_matches('/').to_string();
        let default_image = format!("{origin}/og-default.png");

        let site = SiteMetadata {
            name: env.string("SITE_NAME", "Meet the Candidates"),
            description: env.string(
                "SITE_DESCRIPTION",
                "Candidate profiles, pledges and news in one place.",
            ),
            default_image_url: env.string("DEFAULT_OG_IMAGE_URL", &default_image),
            cheer_description: env.string(
                "CHEER_DESCRIPTION",
                "Someone cheered for this candidate!",
            ),
            locale: env.string("SITE_LOCALE", "ko_KR"),
            origin,
        };

        let directory = match (
            env.optional("DATABASE_URL"),
            env.optional("SUPABASE_URL"),
            env.optional("SUPABASE_ANON_KEY"),
        ) {
            (Some(database_url), _, _) => DirectoryConfig::Postgres {
                database_url: SecretString::from(database_url),
            },
            (None, Some(base_url), Some(api_key)) => DirectoryConfig::Rest {
                base_url,
                api_key: SecretString::from(api_key),
            },
            _ => return Err(ConfigError::MissingDirectory),
        };

        let excluded_prefixes = env.list("GATEWAY_EXCLUDED_PREFIXES", DEFAULT_EXCLUDED_PREFIXES);
        let party_codes: Vec<String> = env
            .list("PARTY_CODES", DEFAULT_PARTY_CODES)
            .into_iter()
            .map(|code| code.to_ascii_lowercase())
            .collect();
        let renderer_prefix = RENDERER_PATH.trim_matches('/').split('/').next();
        if let Some(clash) = party_codes
            .iter()
            .find(|code| excluded_prefixes.contains(code) || renderer_prefix == Some(code.as_str()))
        {
            return Err(ConfigError::Invalid {
                key: "PARTY_CODES",
                message: format!("party code {clash:?} collides with a reserved path prefix"),
            });
        }

        Ok(Self {
            bind_addr: SocketAddr::new(host, port),
            environment: env.string("APP_ENV", "production"),
            sentry_dsn: env.optional("SENTRY_DSN"),
            site,
            directory,
            lookup_timeout: Duration::from_millis(env.parse("LOOKUP_TIMEOUT_MS", 3000)?),
            party_codes,
            party_code_refresh: Duration::from_secs(env.parse("PARTY_CODE_REFRESH_SECS", 300)?),
            cache: CachePolicy {
                s_maxage_secs: env.parse("OG_CACHE_S_MAXAGE", 3600)?,
                stale_while_revalidate_secs: env.parse("OG_CACHE_STALE_WHILE_REVALIDATE", 86_400)?,
            },
            static_dir: env.optional("STATIC_DIR").map(PathBuf::from),
            excluded_prefixes,
        })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Trimmed value, `None` when unset or blank.
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.optional(key) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                message: format!("{raw:?}: {e}"),
            }),
        }
    }

    fn list(&self, key: &str, default: &str) -> Vec<String> {
        self.string(key, default)
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    }
}
