//! Cross-post use case - publishes changed documents to every pending platform
//!
//! Each successful platform is written into the document's `cross_posts`
//! mapping and saved before the next platform is attempted, so a rerun only
//! retries what is still missing.

use std::sync::Arc;
use tokio::time::Duration;

use crate::{
    model::{
        DocumentOutcome, DocumentReport, LiveArticle, PlatformOutcome, PlatformStatus,
        PlatformStep, PublishContext, PublishResult, RunReport, SiteConfig,
    },
    ports::{ContentFetcher, DocumentStore, PlatformError, Publisher},
    usecases::{change_set::ChangeSet, governor::RateGovernor},
};

/// Configuration for a cross-post run
#[derive(Debug, Clone)]
pub struct CrossPostConfig {
    pub site: SiteConfig,
    /// Log what would be published without calling any platform
    pub dry_run: bool,
    /// Pause between documents
    pub document_delay: Duration,
}

impl Default for CrossPostConfig {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            dry_run: false,
            document_delay: Duration::from_secs(10),
        }
    }
}

/// Cross-post orchestrator
pub struct CrossPoster<St, F>
where
    St: DocumentStore + ?Sized,
    F: ContentFetcher + ?Sized,
{
    store: Arc<St>,
    fetcher: Arc<F>,
    publishers: Vec<Arc<dyn Publisher>>,
    governor: RateGovernor,
    config: CrossPostConfig,
}

impl<St, F> CrossPoster<St, F>
where
    St: DocumentStore + ?Sized,
    F: ContentFetcher + ?Sized,
{
    /// Publishers are sorted into platform order; a second publisher for the
    /// same platform is dropped.
    pub fn new(
        store: Arc<St>,
        fetcher: Arc<F>,
        mut publishers: Vec<Arc<dyn Publisher>>,
        config: CrossPostConfig,
    ) -> Self {
        publishers.sort_by_key(|p| p.platform());
        let before = publishers.len();
        publishers.dedup_by_key(|p| p.platform());
        if publishers.len() != before {
            tracing::warn!("Duplicate publishers configured; keeping one per platform");
        }

        let governor = RateGovernor::new(config.document_delay);
        Self {
            store,
            fetcher,
            publishers,
            governor,
            config,
        }
    }

    /// Platforms this run will visit, in order
    pub fn platforms(&self) -> Vec<crate::model::Platform> {
        self.publishers.iter().map(|p| p.platform()).collect()
    }

    /// Process every document in the change-set
    pub async fn run(&self, change_set: &ChangeSet) -> RunReport {
        let mut report = RunReport::default();

        tracing::info!(
            documents = change_set.len(),
            platforms = ?self.platforms(),
            dry_run = self.config.dry_run,
            "Starting cross-post run"
        );

        let total = change_set.len();
        for (index, id) in change_set.iter().enumerate() {
            let outcome = self.process_document(id).await;
            report.documents.push(DocumentReport {
                id: id.to_string(),
                outcome,
            });

            if index + 1 < total {
                self.governor.pause().await;
            }
        }

        report
    }

    /// Process a single document
    pub async fn process_document(&self, id: &str) -> DocumentOutcome {
        tracing::info!(document = %id, "Processing document");

        let mut document = match self.store.load(id).await {
            Ok(document) => document,
            Err(e) => {
                tracing::error!(document = %id, error = %e, "Failed to load document");
                return DocumentOutcome::Failed {
                    error: format!("Failed to load document: {}", e),
                    platforms: vec![],
                };
            }
        };

        let missing = document.missing_fields();
        if !missing.is_empty() {
            tracing::warn!(document = %id, missing = ?missing, "Missing required metadata, skipping");
            return DocumentOutcome::Ineligible { missing };
        }

        let Some(canonical_url) = self.config.site.canonical_url(id) else {
            tracing::error!(document = %id, "Document is outside the collection directory");
            return DocumentOutcome::Failed {
                error: format!(
                    "{} is not under {}",
                    id, self.config.site.collection_dir
                ),
                platforms: vec![],
            };
        };

        let title = document.title().unwrap_or_default().to_string();
        let description = document.description().unwrap_or_default().to_string();

        let any_pending = self
            .publishers
            .iter()
            .any(|p| !document.platform_status(p.platform()).is_posted());

        let article = if any_pending {
            tracing::info!(document = %id, url = %canonical_url, "Waiting for live article");
            match self.fetcher.fetch_live(&canonical_url).await {
                Ok(article) => article,
                Err(e) => {
                    tracing::error!(document = %id, url = %canonical_url, error = %e, "Article is not live");
                    return DocumentOutcome::Failed {
                        error: format!("Live fetch failed: {}", e),
                        platforms: vec![],
                    };
                }
            }
        } else {
            LiveArticle::default()
        };

        let mut outcomes = Vec::with_capacity(self.publishers.len());

        for publisher in &self.publishers {
            let platform = publisher.platform();

            if let PlatformStatus::Posted(token) = document.platform_status(platform) {
                tracing::debug!(document = %id, platform = %platform, token = %token, "Already posted");
                outcomes.push(PlatformOutcome {
                    platform,
                    step: PlatformStep::AlreadyPosted(token),
                });
                continue;
            }

            if self.config.dry_run {
                tracing::info!(
                    document = %id,
                    platform = %platform,
                    url = %canonical_url,
                    "[DRY RUN] Would publish"
                );
                outcomes.push(PlatformOutcome {
                    platform,
                    step: PlatformStep::WouldPublish,
                });
                continue;
            }

            let result = {
                let context = PublishContext {
                    title: &title,
                    description: &description,
                    canonical_url: &canonical_url,
                    article: &article,
                    document: &document,
                };
                publisher.publish(&context).await
            };

            match result {
                Ok(token) => {
                    document.record(&PublishResult {
                        platform,
                        token: token.clone(),
                    });

                    if let Err(e) = self.store.save(&document).await {
                        tracing::error!(
                            document = %id,
                            platform = %platform,
                            token = %token,
                            error = %e,
                            "Published but failed to persist result; stopping this document"
                        );
                        outcomes.push(PlatformOutcome {
                            platform,
                            step: PlatformStep::Failed(format!(
                                "Published as {} but not persisted: {}",
                                token, e
                            )),
                        });
                        return DocumentOutcome::Failed {
                            error: format!("Failed to save document: {}", e),
                            platforms: outcomes,
                        };
                    }

                    tracing::info!(
                        document = %id,
                        platform = %platform,
                        token = %token,
                        "Posted to {}",
                        platform.display_name()
                    );
                    outcomes.push(PlatformOutcome {
                        platform,
                        step: PlatformStep::Posted(token),
                    });
                }
                Err(source) => {
                    let error = PlatformError { platform, source };
                    tracing::error!(document = %id, error = %error, "Failed to publish");
                    outcomes.push(PlatformOutcome {
                        platform,
                        step: PlatformStep::Failed(error.to_string()),
                    });
                }
            }
        }

        DocumentOutcome::Processed {
            platforms: outcomes,
        }
    }
}
