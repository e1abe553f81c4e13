//! Open Graph / Twitter Card pre-rendering for candidate share links.

use std::sync::Arc;

use db::models::candidate::CandidateSummary;
use tracing::{debug, warn};
use utils::html::escape_html;

use super::candidate_directory::CandidateDirectory;

pub const CHEER_QUERY_KEY: &str = "cheer";

/// Which share card to render for a resolved candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShareVariant {
    #[default]
    Candidate,
    Cheer,
}

impl ShareVariant {
    /// `1`, `true`, `yes` and `on` (any case) select the cheer card.
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag.map(|f| f.trim().to_ascii_lowercase()).as_deref() {
            Some("1" | "true" | "yes" | "on") => Self::Cheer,
            _ => Self::Candidate,
        }
    }
}

/// Site-level values used for canonical URLs and the fallback card.
#[derive(Debug, Clone)]
pub struct SiteMetadata {
    pub origin: String,
    pub name: String,
    pub description: String,
    pub default_image_url: String,
    pub cheer_description: String,
    pub locale: String,
}

impl SiteMetadata {
    /// Identifiers arrive decoded, so each is re-encoded as a single path segment.
    pub fn canonical_url(&self, party_code: &str, candidate_code: &str) -> String {
        format!(
            "{}/{}/{}",
            self.origin_trimmed(),
            urlencoding::encode(party_code),
            urlencoding::encode(candidate_code)
        )
    }

    fn origin_trimmed(&self) -> &str {
        self.origin.trim_end_matches('/')
    }
}

/// Unescaped card fields. Escaping happens only in [`OgDocument::to_html`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OgDocument {
    pub title: String,
    pub description: String,
    pub image: String,
    pub canonical_url: String,
    pub site_name: String,
    pub locale: String,
}

impl OgDocument {
    pub fn site_default(site: &SiteMetadata) -> Self {
        Self {
            title: site.name.clone(),
            description: site.description.clone(),
            image: site.default_image_url.clone(),
            canonical_url: site.origin_trimmed().to_string(),
            site_name: site.name.clone(),
            locale: site.locale.clone(),
        }
    }

    pub fn for_candidate(
        site: &SiteMetadata,
        candidate: &CandidateSummary,
        party_code: &str,
        candidate_code: &str,
        variant: ShareVariant,
    ) -> Self {
        let title = format!(
            "{} {}",
            candidate.candidate_number.as_deref().unwrap_or_default(),
            candidate.display_name
        )
        .trim()
        .to_string();

        let description = match variant {
            ShareVariant::Cheer => site.cheer_description.clone(),
            ShareVariant::Candidate => {
                let office = candidate.office_line();
                if office.is_empty() {
                    format!("{} candidate", candidate.party)
                } else {
                    office
                }
            }
        };

        let image = candidate
            .share_image()
            .unwrap_or(&site.default_image_url)
            .to_string();

        Self {
            title,
            description,
            image,
            canonical_url: site.canonical_url(party_code, candidate_code),
            site_name: site.name.clone(),
            locale: site.locale.clone(),
        }
    }

    pub fn to_html(&self) -> String {
        let title = escape_html(&self.title);
        let description = escape_html(&self.description);
        let image = escape_html(&self.image);
        let url = escape_html(&self.canonical_url);
        let site_name = escape_html(&self.site_name);
        let locale = escape_html(&self.locale);
        let lang = escape_html(self.locale.split(['_', '-']).next().unwrap_or_default());

        format!(
            r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
<meta charset="utf-8" />
<meta name="viewport" content="width=device-width, initial-scale=1" />
<title>{title}</title>
<meta name="description" content="{description}" />
<link rel="canonical" href="{url}" />
<meta property="og:type" content="website" />
<meta property="og:site_name" content="{site_name}" />
<meta property="og:locale" content="{locale}" />
<meta property="og:title" content="{title}" />
<meta property="og:description" content="{description}" />
<meta property="og:image" content="{image}" />
<meta property="og:url" content="{url}" />
<meta name="twitter:card" content="summary_large_image" />
<meta name="twitter:title" content="{title}" />
<meta name="twitter:description" content="{description}" />
<meta name="twitter:image" content="{image}" />
</head>
<body>
<h1>{title}</h1>
<p>{description}</p>
<a href="{url}">{url}</a>
</body>
</html>
"#
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Candidate,
    SiteDefault,
}

#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub html: String,
    pub outcome: RenderOutcome,
}

impl RenderedPage {
    /// Only resolved candidate cards may be cached by shared caches.
    pub fn is_cacheable(&self) -> bool {
        self.outcome == RenderOutcome::Candidate
    }
}

/// Renders share cards, falling back to the site card on any miss or error.
#[derive(Clone)]
pub struct OgRenderer {
    directory: Arc<dyn CandidateDirectory>,
    site: SiteMetadata,
}

impl OgRenderer {
    pub fn new(directory: Arc<dyn CandidateDirectory>, site: SiteMetadata) -> Self {
        Self { directory, site }
    }

    pub fn site(&self) -> &SiteMetadata {
        &self.site
    }

    pub async fn render(
        &self,
        party_code: Option<&str>,
        candidate_code: Option<&str>,
        variant: ShareVariant,
    ) -> RenderedPage {
        let party_code = party_code.filter(|code| !code.is_empty());
        let candidate_code = candidate_code.filter(|code| !code.is_empty());
        let (Some(party_code), Some(candidate_code)) = (party_code, candidate_code) else {
            debug!("Share card requested without identifiers, serving site card");
            return self.site_default();
        };

        match self.directory.find_active(party_code, candidate_code).await {
            Ok(Some(candidate)) => {
                let document = OgDocument::for_candidate(
                    &self.site,
                    &candidate,
                    party_code,
                    candidate_code,
                    variant,
                );
                RenderedPage {
                    html: document.to_html(),
                    outcome: RenderOutcome::Candidate,
                }
            }
            Ok(None) => {
                debug!(
                    party_code,
                    candidate_code, "No active candidate, serving site card"
                );
                self.site_default()
            }
            Err(e) => {
                warn!(
                    party_code,
                    candidate_code,
                    backend = self.directory.backend_name(),
                    error = %e,
                    "Candidate lookup failed, serving site card"
                );
                self.site_default()
            }
        }
    }

    fn site_default(&self) -> RenderedPage {
        RenderedPage {
            html: OgDocument::site_default(&self.site).to_html(),
            outcome: RenderOutcome::SiteDefault,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::*;
    use crate::services::candidate_directory::DirectoryError;

    struct MapDirectory {
        candidates: HashMap<(String, String), CandidateSummary>,
    }

    #[async_trait]
    impl CandidateDirectory for MapDirectory {
        async fn find_active(
            &self,
            party_code: &str,
            candidate_code: &str,
        ) -> Result<Option<CandidateSummary>, DirectoryError> {
            Ok(self
                .candidates
                .get(&(party_code.to_string(), candidate_code.to_string()))
                .filter(|c| c.is_active)
                .cloned())
        }

        async fn active_party_codes(&self) -> Result<Vec<String>, DirectoryError> {
            Ok(vec![])
        }

        async fn ping(&self) -> Result<(), DirectoryError> {
            Ok(())
        }

        fn backend_name(&self) -> &'static str {
            "map"
        }
    }

    struct FailingDirectory;

    #[async_trait]
    impl CandidateDirectory for FailingDirectory {
        async fn find_active(
            &self,
            _party_code: &str,
            _candidate_code: &str,
        ) -> Result<Option<CandidateSummary>, DirectoryError> {
            Err(DirectoryError::Http {
                status: 500,
                body: "boom".to_string(),
            })
        }

        async fn active_party_codes(&self) -> Result<Vec<String>, DirectoryError> {
            Err(DirectoryError::Timeout)
        }

        async fn ping(&self) -> Result<(), DirectoryError> {
            Err(DirectoryError::Timeout)
        }

        fn backend_name(&self) -> &'static str {
            "failing"
        }
    }

    fn site() -> SiteMetadata {
        SiteMetadata {
            origin: "https://vote.example/".to_string(),
            name: "Vote Link".to_string(),
            description: "Meet your candidates".to_string(),
            default_image_url: "https://vote.example/og-default.png".to_string(),
            cheer_description: "Someone cheered for this candidate!".to_string(),
            locale: "ko_KR".to_string(),
        }
    }

    fn candidate(party_code: &str, candidate_code: &str) -> CandidateSummary {
        CandidateSummary {
            party_code: party_code.to_string(),
            candidate_code: candidate_code.to_string(),
            display_name: "Park Jiwoo".to_string(),
            candidate_number: Some("3".to_string()),
            party: "Rebuilding Korea Party".to_string(),
            election_name: Some("2026 Local Election".to_string()),
            constituency: Some("Busan Mayor".to_string()),
            photo_url: None,
            thumbnail_url: Some("https://cdn.example/thumb.jpg".to_string()),
            is_active: true,
        }
    }

    fn renderer_with(candidates: Vec<CandidateSummary>) -> OgRenderer {
        let candidates = candidates
            .into_iter()
            .map(|c| ((c.party_code.clone(), c.candidate_code.clone()), c))
            .collect();
        OgRenderer::new(Arc::new(MapDirectory { candidates }), site())
    }

    #[test]
    fn test_share_variant_flag_parsing() {
        assert_eq!(ShareVariant::from_flag(None), ShareVariant::Candidate);
        assert_eq!(ShareVariant::from_flag(Some("")), ShareVariant::Candidate);
        assert_eq!(ShareVariant::from_flag(Some("0")), ShareVariant::Candidate);
        assert_eq!(ShareVariant::from_flag(Some("1")), ShareVariant::Cheer);
        assert_eq!(ShareVariant::from_flag(Some(" TRUE ")), ShareVariant::Cheer);
        assert_eq!(ShareVariant::from_flag(Some("yes")), ShareVariant::Cheer);
    }

    #[test]
    fn test_candidate_document_fields() {
        let doc = OgDocument::for_candidate(
            &site(),
            &candidate("rnp", "000042"),
            "rnp",
            "000042",
            ShareVariant::Candidate,
        );
        assert_eq!(doc.title, "3 Park Jiwoo");
        assert_eq!(doc.description, "2026 Local Election Busan Mayor");
        assert_eq!(doc.image, "https://cdn.example/thumb.jpg");
        assert_eq!(doc.canonical_url, "https://vote.example/rnp/000042");
    }

    #[test]
    fn test_title_without_number_is_trimmed() {
        let mut c = candidate("ppp", "1");
        c.candidate_number = None;
        let doc = OgDocument::for_candidate(&site(), &c, "ppp", "1", ShareVariant::Candidate);
        assert_eq!(doc.title, "Park Jiwoo");
    }

    #[test]
    fn test_description_falls_back_to_party() {
        let mut c = candidate("ppp", "1");
        c.election_name = None;
        c.constituency = None;
        c.thumbnail_url = None;
        let doc = OgDocument::for_candidate(&site(), &c, "ppp", "1", ShareVariant::Candidate);
        assert_eq!(doc.description, "Rebuilding Korea Party candidate");
        assert_eq!(doc.image, "https://vote.example/og-default.png");
    }

    #[test]
    fn test_cheer_variant_ignores_office_fields() {
        let doc = OgDocument::for_candidate(
            &site(),
            &candidate("ppp", "1"),
            "ppp",
            "1",
            ShareVariant::Cheer,
        );
        assert_eq!(doc.description, "Someone cheered for this candidate!");
    }

    #[tokio::test]
    async fn test_render_escapes_title_markup() {
        let mut c = candidate("ppp", "777");
        c.display_name = r#"<script>alert("x")</script> & 'co'"#.to_string();
        c.candidate_number = Some("1<b>".to_string());
        let page = renderer_with(vec![c])
            .render(Some("ppp"), Some("777"), ShareVariant::Candidate)
            .await;

        assert_eq!(page.outcome, RenderOutcome::Candidate);
        assert!(page.html.contains(
            r#"<meta property="og:title" content="1&lt;b&gt; &lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; &#39;co&#39;" />"#
        ));
        assert!(!page.html.contains("<script>"));
        assert!(!page.html.contains("<b>"));
    }

    #[tokio::test]
    async fn test_render_escapes_every_candidate_field() {
        let mut c = candidate("ppp", "9");
        c.election_name = Some("\"><img src=x>".to_string());
        c.thumbnail_url = Some("https://cdn.example/a.jpg\" onerror=\"x".to_string());
        let page = renderer_with(vec![c])
            .render(Some("ppp"), Some("9"), ShareVariant::Candidate)
            .await;

        assert!(!page.html.contains("<img"));
        assert!(!page.html.contains("\" onerror=\""));
        assert!(page.html.contains("&quot;&gt;&lt;img src=x&gt;"));
    }

    #[tokio::test]
    async fn test_miss_and_missing_identifiers_render_identical_default() {
        let renderer = renderer_with(vec![candidate("ppp", "123456")]);

        let miss = renderer
            .render(Some("ppp"), Some("000000"), ShareVariant::Candidate)
            .await;
        let omitted = renderer.render(None, None, ShareVariant::Candidate).await;
        let half = renderer.render(Some("ppp"), Some(""), ShareVariant::Cheer).await;

        assert_eq!(miss.outcome, RenderOutcome::SiteDefault);
        assert!(!miss.is_cacheable());
        assert_eq!(miss.html, omitted.html);
        assert_eq!(miss.html, half.html);
        assert!(miss.html.contains(r#"<meta property="og:title" content="Vote Link" />"#));
        assert!(miss.html.contains(r#"<link rel="canonical" href="https://vote.example" />"#));
    }

    #[tokio::test]
    async fn test_inactive_candidate_renders_default() {
        let mut c = candidate("ppp", "5");
        c.is_active = false;
        let page = renderer_with(vec![c])
            .render(Some("ppp"), Some("5"), ShareVariant::Candidate)
            .await;
        assert_eq!(page.outcome, RenderOutcome::SiteDefault);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_fail_open() {
        let renderer = OgRenderer::new(Arc::new(FailingDirectory), site());
        let failed = renderer
            .render(Some("ppp"), Some("1"), ShareVariant::Candidate)
            .await;
        let omitted = renderer.render(None, None, ShareVariant::Candidate).await;

        assert_eq!(failed.outcome, RenderOutcome::SiteDefault);
        assert_eq!(failed.html, omitted.html);
    }

    #[tokio::test]
    async fn test_cheer_render_uses_fixed_description() {
        let mut c = candidate("dmj", "42");
        c.election_name = Some("Anything".to_string());
        let page = renderer_with(vec![c])
            .render(Some("dmj"), Some("42"), ShareVariant::Cheer)
            .await;
        assert!(page.html.contains(
            r#"<meta property="og:description" content="Someone cheered for this candidate!" />"#
        ));
        assert!(!page.html.contains("Anything"));
    }

    #[tokio::test]
    async fn test_canonical_url_reuses_given_identifiers() {
        let renderer = renderer_with(vec![candidate("tmj", "031337")]);
        let page = renderer
            .render(Some("tmj"), Some("031337"), ShareVariant::Candidate)
            .await;
        assert!(page.is_cacheable());
        assert!(page.html.contains(
            r#"<meta property="og:url" content="https://vote.example/tmj/031337" />"#
        ));
        assert!(page.html.contains(r#"<html lang="ko">"#));
    }

    #[test]
    fn test_canonical_url_keeps_decoded_slash_in_one_segment() {
        let site = site();
        assert_eq!(
            site.canonical_url("ppp", "a/b"),
            "https://vote.example/ppp/a%2Fb"
        );
        assert_eq!(
            site.canonical_url("ppp", "서울 1"),
            "https://vote.example/ppp/%EC%84%9C%EC%9A%B8%201"
        );
    }
}
