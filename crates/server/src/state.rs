use std::{sync::Arc, time::Duration};

use db::DBService;
use secrecy::{ExposeSecret, SecretString};
use services::services::{
    candidate_directory::{CandidateDirectory, DirectoryError, PostgresDirectory, RestDirectory},
    crawler_gateway::CrawlerGateway,
    og_metadata::OgRenderer,
    party_codes::{PartyCodeRefresher, PartyCodeRegistry},
};

use crate::{
    config::{Config, DirectoryConfig},
    routes::og::RENDERER_PATH,
};

/// Cheap-to-clone handle shared by every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    directory: Arc<dyn CandidateDirectory>,
    party_codes: PartyCodeRegistry,
    gateway: CrawlerGateway,
    renderer: OgRenderer,
}

impl AppState {
    pub fn new(config: Config, directory: Arc<dyn CandidateDirectory>) -> Self {
        let party_codes = PartyCodeRegistry::new(&config.party_codes);
        let gateway = CrawlerGateway::new(
            party_codes.clone(),
            RENDERER_PATH,
            config.excluded_prefixes.clone(),
        );
        let renderer = OgRenderer::new(directory.clone(), config.site.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                directory,
                party_codes,
                gateway,
                renderer,
            }),
        }
    }

    /// Build the state with the directory backend named in `config`.
    pub fn from_config(config: Config) -> Result<Self, DirectoryError> {
        let directory = connect_directory(&config.directory, config.lookup_timeout)?;
        Ok(Self::new(config, directory))
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn directory(&self) -> &Arc<dyn CandidateDirectory> {
        &self.inner.directory
    }

    pub fn party_codes(&self) -> &PartyCodeRegistry {
        &self.inner.party_codes
    }

    pub fn gateway(&self) -> &CrawlerGateway {
        &self.inner.gateway
    }

    pub fn renderer(&self) -> &OgRenderer {
        &self.inner.renderer
    }

    pub fn party_code_refresher(&self) -> PartyCodeRefresher {
        PartyCodeRefresher::new(
            self.party_codes().clone(),
            self.directory().clone(),
            self.config().party_codes.clone(),
            self.config().party_code_refresh,
        )
    }
}

fn connect_directory(
    config: &DirectoryConfig,
    lookup_timeout: Duration,
) -> Result<Arc<dyn CandidateDirectory>, DirectoryError> {
    match config {
        DirectoryConfig::Postgres { database_url } => {
            let db = DBService::connect_lazy(database_url.expose_secret(), lookup_timeout)?;
            Ok(Arc::new(PostgresDirectory::new(db)))
        }
        DirectoryConfig::Rest { base_url, api_key } => {
            let api_key = SecretString::from(api_key.expose_secret().to_string());
            Ok(Arc::new(RestDirectory::new(base_url, api_key, lookup_timeout)?))
        }
    }
}
