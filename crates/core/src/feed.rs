//! Asynchronous catalog and overlay fetching.
//!
//! Sources are HTTP(S) URLs or local paths. Loads are sequential: the
//! overlay is only attempted after the catalog resolves, and overlay
//! failure is treated as "no overlay present".

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::{
    catalog::Catalog,
    config::AppConfig,
    overlay::{self, OverlayReport},
};

/// Result of one full refresh cycle.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    /// Freshly loaded catalog with any overlay already applied.
    pub catalog: Catalog,
    /// Whether the built-in dataset stood in for the catalog source.
    pub from_fallback: bool,
    /// Overlay accounting, when an overlay source was configured and
    /// reachable.
    pub overlay: Option<OverlayReport>,
}

/// Fetches configured catalog/overlay sources.
#[derive(Clone)]
pub struct DataFeed {
    config: AppConfig,
    client: reqwest::Client,
}

impl DataFeed {
    /// Build a feed from configuration.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Fetch the raw catalog source text.
    pub async fn fetch_catalog(&self) -> Result<String> {
        self.fetch_source(&self.config.catalog_source).await
    }

    /// Fetch the raw overlay source text, swallowing failures.
    pub async fn fetch_overlay(&self) -> Option<String> {
        let source = self.config.overlay_source.as_deref()?;
        match self.fetch_source(source).await {
            Ok(text) => Some(text),
            Err(err) => {
                debug!("no overlay available from {source}: {err:#}");
                None
            }
        }
    }

    /// Load catalog then overlay. Safe to re-invoke at any time; each
    /// call fully replaces the previous catalog contents. Callers pass
    /// the outcome's catalog to `Registry::reconcile` to refresh
    /// dependent rosters.
    pub async fn refresh(&self) -> RefreshOutcome {
        let (catalog, from_fallback) = match self.fetch_catalog().await {
            Ok(text) => match Catalog::from_text(&text) {
                Ok(catalog) => (catalog, false),
                Err(err) => {
                    warn!("catalog source unusable, using built-in data: {err}");
                    (Catalog::builtin(), true)
                }
            },
            Err(err) => {
                warn!("catalog fetch failed, using built-in data: {err:#}");
                (Catalog::builtin(), true)
            }
        };

        let mut catalog = catalog;
        let overlay = match self.fetch_overlay().await {
            Some(text) => Some(overlay::apply_overlay(&mut catalog, &text)),
            None => None,
        };

        info!(
            riders = catalog.len(),
            from_fallback,
            overlay_applied = overlay.is_some(),
            "data refresh complete"
        );
        RefreshOutcome {
            catalog,
            from_fallback,
            overlay,
        }
    }

    async fn fetch_source(&self, source: &str) -> Result<String> {
        if source.starts_with("http://") || source.starts_with("https://") {
            let response = self
                .client
                .get(source)
                .send()
                .await
                .with_context(|| format!("failed to fetch {source}"))?
                .error_for_status()
                .with_context(|| format!("bad response from {source}"))?;
            response
                .text()
                .await
                .with_context(|| format!("failed to read body from {source}"))
        } else {
            tokio::fs::read_to_string(source)
                .await
                .with_context(|| format!("failed to read {source}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn config_with(catalog: &str, overlay: Option<&str>) -> AppConfig {
        AppConfig {
            catalog_source: catalog.to_string(),
            overlay_source: overlay.map(str::to_string),
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn refresh_reads_local_files_in_sequence() -> Result<()> {
        let dir = tempdir()?;
        let catalog_path = dir.path().join("riders.csv");
        let overlay_path = dir.path().join("scores.csv");
        fs::write(&catalog_path, "POGACAR Tadej;UAD;5030;q\nTHOMAS Geraint;IGD;57;\n")?;
        fs::write(&overlay_path, "POGACAR Tadej;80;600;20\n")?;

        let feed = DataFeed::new(config_with(
            catalog_path.to_str().expect("utf8 path"),
            overlay_path.to_str(),
        ));
        let outcome = feed.refresh().await;

        assert!(!outcome.from_fallback);
        assert_eq!(outcome.catalog.len(), 2);
        assert_eq!(outcome.overlay, Some(crate::overlay::OverlayReport { updated: 1, skipped: 0 }));
        assert_eq!(
            outcome.catalog.find_by_name("POGACAR Tadej").expect("rider").score,
            700
        );
        Ok(())
    }

    #[tokio::test]
    async fn missing_catalog_source_falls_back() {
        let feed = DataFeed::new(config_with("/nonexistent/riders.csv", None));
        let outcome = feed.refresh().await;
        assert!(outcome.from_fallback);
        assert_eq!(outcome.catalog, Catalog::builtin());
        assert!(outcome.overlay.is_none());
    }

    #[tokio::test]
    async fn overlay_failure_is_swallowed() -> Result<()> {
        let dir = tempdir()?;
        let catalog_path = dir.path().join("riders.csv");
        fs::write(&catalog_path, "VAN AERT Wout;TVL;1596;q\n")?;

        let feed = DataFeed::new(config_with(
            catalog_path.to_str().expect("utf8 path"),
            Some("/nonexistent/scores.csv"),
        ));
        let outcome = feed.refresh().await;
        assert!(!outcome.from_fallback);
        assert!(outcome.overlay.is_none());
        Ok(())
    }
}
