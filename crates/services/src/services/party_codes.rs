//! Allow-list of party codes whose `/{party}/{candidate}` paths are candidate
//! pages. Seeded from configuration and kept in step with the directory.

use std::{
    collections::BTreeSet,
    sync::{Arc, RwLock},
    time::Duration,
};

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use super::candidate_directory::{CandidateDirectory, DirectoryError};

/// Shared, read-mostly set of allowed party codes.
#[derive(Debug, Clone, Default)]
pub struct PartyCodeRegistry {
    codes: Arc<RwLock<BTreeSet<String>>>,
}

impl PartyCodeRegistry {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let registry = Self::default();
        registry.replace(codes);
        registry
    }

    /// Exact membership test. Path segments are not normalised, so `PPP`
    /// is not a candidate page even when `ppp` is registered.
    pub fn contains(&self, code: &str) -> bool {
        self.read().contains(code)
    }

    /// Swap in a new set. Returns whether the set changed.
    pub fn replace<I, S>(&self, codes: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let next: BTreeSet<String> = codes
            .into_iter()
            .filter_map(|code| normalize(code.as_ref()))
            .collect();

        let mut guard = self
            .codes
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if *guard == next {
            return false;
        }
        *guard = next;
        true
    }

    /// Sorted copy of the current set.
    pub fn snapshot(&self) -> Vec<String> {
        self.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeSet<String>> {
        self.codes
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn normalize(code: &str) -> Option<String> {
    let code = code.trim();
    (!code.is_empty()).then(|| code.to_ascii_lowercase())
}

/// Background task that keeps the registry equal to the configured seed plus
/// every party code with an active candidate in the directory.
pub struct PartyCodeRefresher {
    registry: PartyCodeRegistry,
    directory: Arc<dyn CandidateDirectory>,
    seed: Vec<String>,
    poll_interval: Duration,
}

impl PartyCodeRefresher {
    pub fn new(
        registry: PartyCodeRegistry,
        directory: Arc<dyn CandidateDirectory>,
        seed: Vec<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            registry,
            directory,
            seed,
            poll_interval,
        }
    }

    /// Spawn the refresh loop. Returns `None` when the interval is zero.
    pub fn spawn(self) -> Option<tokio::task::JoinHandle<()>> {
        if self.poll_interval.is_zero() {
            info!("Party code refresh disabled, using configured list only");
            return None;
        }
        Some(tokio::spawn(async move {
            self.start().await;
        }))
    }

    async fn start(&self) {
        info!(
            "Starting party code refresher with interval {:?}, {} configured codes",
            self.poll_interval,
            self.seed.len()
        );

        let mut interval = interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            if let Err(e) = self.refresh_once().await {
                warn!(
                    backend = self.directory.backend_name(),
                    error = %e,
                    "Party code refresh failed, keeping previous list"
                );
            }
        }
    }

    /// One refresh pass. On error the registry is left untouched.
    pub async fn refresh_once(&self) -> Result<bool, DirectoryError> {
        let active = self.directory.active_party_codes().await?;
        let changed = self
            .registry
            .replace(self.seed.iter().map(String::as_str).chain(active.iter().map(String::as_str)));

        if changed {
            info!(codes = ?self.registry.snapshot(), "Party code allow-list updated");
        } else {
            debug!("Party code allow-list unchanged");
        }
        Ok(changed)
    }
}
