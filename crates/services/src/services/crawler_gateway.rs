//! Social crawler gateway.
//!
//! Link-preview bots do not execute the single-page app, so requests for a
//! candidate page (`/{party_code}/{candidate_code}`) coming from a known
//! crawler are redirected to the server-rendered Open Graph endpoint. Every
//! other request passes through untouched.

use url::form_urlencoded;

use super::party_codes::PartyCodeRegistry;

/// Lower-case user-agent fragments of social platform link previewers.
pub const CRAWLER_SIGNATURES: &[&str] = &[
    "facebookexternalhit",
    "facebot",
    "twitterbot",
    "linkedinbot",
    "slackbot",
    "slack-imgproxy",
    "discordbot",
    "telegrambot",
    "whatsapp",
    "kakaotalk-scrap",
    "kakaostory-og-reader",
    "yeti",
    "daumoa",
    "skypeuripreview",
    "pinterest",
    "redditbot",
    "applebot",
    "embedly",
    "vkshare",
    "bingpreview",
];

pub const PARTY_QUERY_KEY: &str = "party";
pub const CODE_QUERY_KEY: &str = "code";

/// Outcome of classifying one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayDecision {
    PassThrough,
    Redirect { location: String },
}

/// Whether the user agent contains any known crawler signature.
pub fn is_social_crawler(user_agent: &str) -> bool {
    let user_agent = user_agent.to_ascii_lowercase();
    CRAWLER_SIGNATURES
        .iter()
        .any(|signature| user_agent.contains(signature))
}

/// Split a request path into exactly two decoded, non-empty segments.
pub fn candidate_path_segments(path: &str) -> Option<(String, String)> {
    let mut segments = path.split('/').filter(|segment| !segment.is_empty());
    let (first, second) = (segments.next()?, segments.next()?);
    if segments.next().is_some() {
        return None;
    }

    let first = urlencoding::decode(first).ok()?.into_owned();
    let second = urlencoding::decode(second).ok()?.into_owned();
    Some((first, second))
}

#[derive(Debug, Clone)]
pub struct CrawlerGateway {
    party_codes: PartyCodeRegistry,
    renderer_path: String,
    excluded_prefixes: Vec<String>,
}

impl CrawlerGateway {
    pub fn new(
        party_codes: PartyCodeRegistry,
        renderer_path: impl Into<String>,
        excluded_prefixes: Vec<String>,
    ) -> Self {
        Self {
            party_codes,
            renderer_path: renderer_path.into(),
            excluded_prefixes,
        }
    }

    pub fn renderer_path(&self) -> &str {
        &self.renderer_path
    }

    /// Classify a request by path, raw query string and `User-Agent`.
    ///
    /// Checks run cheapest first: excluded prefixes, segment count, party
    /// allow-list, then the user agent.
    pub fn classify(
        &self,
        path: &str,
        query: Option<&str>,
        user_agent: Option<&str>,
    ) -> GatewayDecision {
        if self.is_excluded(path) {
            return GatewayDecision::PassThrough;
        }

        let Some((party_code, candidate_code)) = candidate_path_segments(path) else {
            return GatewayDecision::PassThrough;
        };

        if !self.party_codes.contains(&party_code) {
            return GatewayDecision::PassThrough;
        }

        if !is_social_crawler(user_agent.unwrap_or_default()) {
            return GatewayDecision::PassThrough;
        }

        GatewayDecision::Redirect {
            location: self.renderer_location(&party_code, &candidate_code, query),
        }
    }

    fn is_excluded(&self, path: &str) -> bool {
        if path.trim_end_matches('/') == self.renderer_path.trim_end_matches('/') {
            return true;
        }
        let first = path.split('/').find(|segment| !segment.is_empty());
        first.is_some_and(|first| {
            self.excluded_prefixes
                .iter()
                .any(|prefix| prefix.trim_matches('/') == first)
        })
    }

    /// Renderer URL carrying the two identifiers followed by every original
    /// query pair except `party` and `code`.
    fn renderer_location(
        &self,
        party_code: &str,
        candidate_code: &str,
        query: Option<&str>,
    ) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer.append_pair(PARTY_QUERY_KEY, party_code);
        serializer.append_pair(CODE_QUERY_KEY, candidate_code);

        if let Some(query) = query {
            for (key, value) in form_urlencoded::parse(query.as_bytes()) {
                if key != PARTY_QUERY_KEY && key != CODE_QUERY_KEY {
                    serializer.append_pair(&key, &value);
                }
            }
        }

        format!("{}?{}", self.renderer_path, serializer.finish())
    }
}
