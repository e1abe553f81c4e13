use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use ts_rs::TS;

/// Read projection of a candidate row, as consumed by the share-preview path.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, TS)]
pub struct CandidateSummary {
    pub party_code: String,
    pub candidate_code: String,
    pub display_name: String,
    pub candidate_number: Option<String>, // ballot position label, e.g. "1"
    pub party: String,
    pub election_name: Option<String>,
    pub constituency: Option<String>,
    pub photo_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub is_active: bool,
}

impl CandidateSummary {
    /// Look up the active candidate for an exact `(party_code, candidate_code)`
    /// pair. Uniqueness of the pair is enforced by the table, not here.
    pub async fn find_active(
        pool: &PgPool,
        party_code: &str,
        candidate_code: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        tracing::debug!(party_code, candidate_code, "Looking up active candidate");

        sqlx::query_as::<_, CandidateSummary>(
            r#"SELECT party_code,
                      candidate_code,
                      name AS display_name,
                      candidate_number,
                      party,
                      election_name,
                      constituency,
                      photo_url,
                      thumbnail_url,
                      is_active
               FROM candidates
               WHERE party_code = $1
                 AND candidate_code = $2
                 AND is_active = TRUE
               LIMIT 1"#,
        )
        .bind(party_code)
        .bind(candidate_code)
        .fetch_optional(pool)
        .await
    }

    /// Distinct party codes that currently have at least one active candidate.
    pub async fn active_party_codes(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        let codes: Vec<(String,)> = sqlx::query_as(
            r#"SELECT DISTINCT party_code
               FROM candidates
               WHERE is_active = TRUE
               ORDER BY party_code"#,
        )
        .fetch_all(pool)
        .await?;

        Ok(codes.into_iter().map(|(code,)| code).collect())
    }

    /// First non-empty share image, photo before thumbnail.
    pub fn share_image(&self) -> Option<&str> {
        [self.photo_url.as_deref(), self.thumbnail_url.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|url| !url.is_empty())
    }

    /// `electionName` and `constituency` joined by a space, empty parts omitted.
    pub fn office_line(&self) -> String {
        [self.election_name.as_deref(), self.constituency.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
