//! Candidate Directory: the read-only candidate lookup behind share previews.

use std::time::Duration;

use async_trait::async_trait;
use db::{DBService, models::candidate::CandidateSummary};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::debug;
use url::Url;

const CANDIDATES_TABLE_PATH: &str = "rest/v1/candidates";
const CANDIDATE_COLUMNS: &str = "party_code,candidate_code,display_name:name,candidate_number,party,election_name,constituency,photo_url,thumbnail_url,is_active";

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("json error: {0}")]
    Serde(String),
    #[error("invalid directory url: {0}")]
    InvalidUrl(String),
}

impl From<sqlx::Error> for DirectoryError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut => Self::Timeout,
            other => Self::Database(other),
        }
    }
}

/// Read access to candidate records, keyed by `(party_code, candidate_code)`.
#[async_trait]
pub trait CandidateDirectory: Send + Sync {
    /// The active candidate for the exact pair, if any.
    async fn find_active(
        &self,
        party_code: &str,
        candidate_code: &str,
    ) -> Result<Option<CandidateSummary>, DirectoryError>;

    /// Party codes that have at least one active candidate.
    async fn active_party_codes(&self) -> Result<Vec<String>, DirectoryError>;

    /// Cheap reachability probe.
    async fn ping(&self) -> Result<(), DirectoryError>;

    fn backend_name(&self) -> &'static str;
}

/// Directory backed by a direct Postgres connection.
#[derive(Clone)]
pub struct PostgresDirectory {
    db: DBService,
}

impl PostgresDirectory {
    pub fn new(db: DBService) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CandidateDirectory for PostgresDirectory {
    async fn find_active(
        &self,
        party_code: &str,
        candidate_code: &str,
    ) -> Result<Option<CandidateSummary>, DirectoryError> {
        Ok(CandidateSummary::find_active(&self.db.pool, party_code, candidate_code).await?)
    }

    async fn active_party_codes(&self) -> Result<Vec<String>, DirectoryError> {
        Ok(CandidateSummary::active_party_codes(&self.db.pool).await?)
    }

    async fn ping(&self) -> Result<(), DirectoryError> {
        sqlx::query("SELECT 1").execute(&self.db.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

#[derive(Debug, Deserialize)]
struct PartyCodeRow {
    party_code: String,
}

/// Directory backed by the hosted backend's PostgREST interface.
#[derive(Debug)]
pub struct RestDirectory {
    http: Client,
    table_url: Url,
    api_key: SecretString,
}

impl RestDirectory {
    pub fn new(
        base_url: &str,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, DirectoryError> {
        let table_url = candidates_table_url(base_url)?;
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("candidate-share-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            table_url,
            api_key,
        })
    }

    async fn get_rows<T: DeserializeOwned>(
        &self,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, DirectoryError> {
        let key = self.api_key.expose_secret();
        let res = self
            .http
            .get(self.table_url.clone())
            .header("apikey", key)
            .bearer_auth(key)
            .header("accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => res
                .json::<Vec<T>>()
                .await
                .map_err(|e| DirectoryError::Serde(e.to_string())),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(DirectoryError::Http { status, body })
            }
        }
    }
}

#[async_trait]
impl CandidateDirectory for RestDirectory {
    async fn find_active(
        &self,
        party_code: &str,
        candidate_code: &str,
    ) -> Result<Option<CandidateSummary>, DirectoryError> {
        debug!(party_code, candidate_code, "Querying candidate over REST");
        let rows = self
            .get_rows::<CandidateSummary>(&find_active_query(party_code, candidate_code))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn active_party_codes(&self) -> Result<Vec<String>, DirectoryError> {
        let rows = self
            .get_rows::<PartyCodeRow>(&[
                ("select", "party_code".to_string()),
                ("is_active", "eq.true".to_string()),
            ])
            .await?;

        let mut codes: Vec<String> = rows.into_iter().map(|row| row.party_code).collect();
        codes.sort();
        codes.dedup();
        Ok(codes)
    }

    async fn ping(&self) -> Result<(), DirectoryError> {
        self.get_rows::<PartyCodeRow>(&[
            ("select", "party_code".to_string()),
            ("limit", "1".to_string()),
        ])
        .await
        .map(|_| ())
    }

    fn backend_name(&self) -> &'static str {
        "rest"
    }
}

fn candidates_table_url(base_url: &str) -> Result<Url, DirectoryError> {
    let mut base =
        Url::parse(base_url.trim()).map_err(|e| DirectoryError::InvalidUrl(e.to_string()))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(CANDIDATES_TABLE_PATH)
        .map_err(|e| DirectoryError::InvalidUrl(e.to_string()))
}

fn find_active_query(party_code: &str, candidate_code: &str) -> Vec<(&'static str, String)> {
    vec![
        ("select", CANDIDATE_COLUMNS.to_string()),
        ("party_code", format!("eq.{party_code}")),
        ("candidate_code", format!("eq.{candidate_code}")),
        ("is_active", "eq.true".to_string()),
        ("limit", "1".to_string()),
    ]
}

fn map_reqwest_error(e: reqwest::Error) -> DirectoryError {
    if e.is_timeout() {
        DirectoryError::Timeout
    } else if e.is_decode() {
        DirectoryError::Serde(e.to_string())
    } else {
        DirectoryError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url_appends_rest_path() {
        let url = candidates_table_url("https://abc.supabase.co").unwrap();
        assert_eq!(url.as_str(), "https://abc.supabase.co/rest/v1/candidates");
    }

    #[test]
    fn test_table_url_keeps_base_path_prefix() {
        let url = candidates_table_url("https://gateway.example/backend").unwrap();
        assert_eq!(
            url.as_str(),
            "https://gateway.example/backend/rest/v1/candidates"
        );
    }

    #[test]
    fn test_table_url_rejects_garbage() {
        assert!(matches!(
            candidates_table_url("not a url"),
            Err(DirectoryError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_find_active_query_filters_on_all_three_predicates() {
        let query = find_active_query("ppp", "000123");
        assert!(query.contains(&("party_code", "eq.ppp".to_string())));
        assert!(query.contains(&("candidate_code", "eq.000123".to_string())));
        assert!(query.contains(&("is_active", "eq.true".to_string())));
        assert!(query.contains(&("limit", "1".to_string())));
    }

    #[test]
    fn test_pool_timeout_maps_to_timeout() {
        let err: DirectoryError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DirectoryError::Timeout));
    }
}
