//! Run command - cross-post the documents touched by the latest change-set

use anyhow::{Context, Result, bail};
use crosspost_adapters::{
    documents::FsDocumentStore,
    git::GitChangeDetector,
    live::{HttpContentFetcher, LiveFetchConfig},
    publishers::{
        DevToCredentials, DevToPublisher, DisabledPublisher, HackerNewsCredentials,
        HackerNewsPublisher, MailchimpCredentials, MailchimpPublisher, MailchimpSettings,
        XCredentials, XThreadPublisher,
    },
};
use crosspost_domain::{
    ChangeDetector, DocumentOutcome, Platform, PlatformStep, Publisher, RunReport,
    usecases::{ChangeSet, CrossPostConfig, CrossPoster},
};
use secrecy::SecretString;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::args::RunArgs;
use crate::config::AppConfig;

pub async fn execute(args: RunArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let dry_run = args.dry_run || config.general.dry_run;
    let site = config.site.to_site_config();
    let repo_dir = config.general.repo_dir.clone();

    tracing::info!(
        dry_run = dry_run,
        repo_dir = %repo_dir.display(),
        base_url = %site.base_url,
        "Starting crosspost run"
    );

    let paths = if args.documents.is_empty() {
        let mut detector = GitChangeDetector::new(&repo_dir);
        if let Some(since) = &args.since {
            detector = detector.since(since.clone());
        }
        detector
            .changed_paths()
            .await
            .context("Failed to detect changed documents")?
    } else {
        args.documents.clone()
    };

    let change_set = ChangeSet::select(&paths, &site);
    if change_set.is_empty() {
        tracing::info!(changed = paths.len(), "No documents to process");
        return Ok(());
    }

    let platforms = config.selected_platforms(&args.platforms);
    if platforms.is_empty() {
        tracing::warn!("No platforms enabled");
        return Ok(());
    }

    let publishers = platforms
        .iter()
        .map(|platform| build_publisher(&config, *platform, dry_run))
        .collect::<Result<Vec<_>>>()?;

    let store = Arc::new(FsDocumentStore::new(&repo_dir));
    let fetcher = Arc::new(
        HttpContentFetcher::new(LiveFetchConfig {
            max_attempts: config.live.max_attempts,
            backoff: Duration::from_secs(config.live.backoff_secs),
            max_backoff: Duration::from_secs(config.live.max_backoff_secs),
        })
        .context("Failed to initialize live fetcher")?,
    );

    let poster = CrossPoster::new(
        store,
        fetcher,
        publishers,
        CrossPostConfig {
            site,
            dry_run,
            document_delay: Duration::from_secs(config.general.document_delay_secs),
        },
    );

    let report = poster.run(&change_set).await;
    log_report(&report);

    tracing::info!("crosspost run completed");
    Ok(())
}

fn build_publisher(config: &AppConfig, platform: Platform, dry_run: bool) -> Result<Arc<dyn Publisher>> {
    if dry_run {
        return Ok(Arc::new(DisabledPublisher::new(platform)));
    }

    let publisher: Arc<dyn Publisher> = match platform {
        Platform::DevTo => {
            let api_key = load_api_key(&config.dev_to.api_key_env, "dev_to")?;
            let series = config.dev_to.series.clone().filter(|s| !s.trim().is_empty());
            Arc::new(DevToPublisher::new(DevToCredentials { api_key }, series)?)
        }
        Platform::HackerNews => {
            if config.hacker_news.username.trim().is_empty() {
                bail!("Hacker News enabled but no username configured");
            }
            let password = load_api_key(&config.hacker_news.password_env, "hacker_news")?;
            Arc::new(HackerNewsPublisher::new(HackerNewsCredentials {
                username: config.hacker_news.username.clone(),
                password,
            }))
        }
        Platform::Twitter => {
            let user_token = load_api_key(&config.twitter.user_token_env, "twitter")?;
            Arc::new(XThreadPublisher::new(
                XCredentials { user_token },
                config.twitter.handle.clone(),
                config.twitter.max_chars,
            )?)
        }
        Platform::Mailchimp => {
            if config.mailchimp.from_name.trim().is_empty()
                || config.mailchimp.reply_to.trim().is_empty()
            {
                bail!("Mailchimp enabled but from_name or reply_to is not configured");
            }
            let api_key = load_api_key(&config.mailchimp.api_key_env, "mailchimp")?;
            Arc::new(MailchimpPublisher::new(
                MailchimpCredentials { api_key },
                MailchimpSettings {
                    list_id: config.mailchimp.list_id.clone(),
                    from_name: config.mailchimp.from_name.clone(),
                    reply_to: config.mailchimp.reply_to.clone(),
                    ..MailchimpSettings::default()
                },
            )?)
        }
    };

    Ok(publisher)
}

pub(crate) fn load_api_key(env_var: &str, platform: &str) -> Result<SecretString> {
    if env_var.trim().is_empty() {
        bail!("No credential env var configured for platform {}", platform);
    }

    let key = std::env::var(env_var).with_context(|| {
        format!(
            "Missing credential env var {} for platform {}",
            env_var, platform
        )
    })?;

    if key.trim().is_empty() {
        bail!(
            "Credential env var {} is empty for platform {}",
            env_var,
            platform
        );
    }

    Ok(SecretString::new(key.into()))
}

fn log_report(report: &RunReport) {
    for document in &report.documents {
        match &document.outcome {
            DocumentOutcome::Ineligible { missing } => {
                tracing::info!(document = %document.id, missing = ?missing, "Skipped");
            }
            DocumentOutcome::Failed { error, .. } => {
                tracing::warn!(document = %document.id, error = %error, "Document failed");
            }
            DocumentOutcome::Processed { .. } => {}
        }

        for outcome in document.platforms() {
            match &outcome.step {
                PlatformStep::AlreadyPosted(token) => {
                    tracing::info!(document = %document.id, platform = %outcome.platform, token = %token, "Already posted");
                }
                PlatformStep::Posted(token) => {
                    tracing::info!(document = %document.id, platform = %outcome.platform, token = %token, "Posted");
                }
                PlatformStep::WouldPublish => {
                    tracing::info!(document = %document.id, platform = %outcome.platform, "Would publish");
                }
                PlatformStep::Failed(error) => {
                    tracing::warn!(document = %document.id, platform = %outcome.platform, error = %error, "Failed");
                }
            }
        }
    }

    let summary = report.summary();
    tracing::info!(
        documents = summary.documents,
        ineligible = summary.ineligible,
        failed_documents = summary.failed_documents,
        posted = summary.posted,
        already_posted = summary.already_posted,
        failed_platforms = summary.failed_platforms,
        "Run summary"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_run_needs_no_credentials() {
        let mut config = AppConfig::default();
        config.dev_to.api_key_env = "CROSSPOST_TEST_UNSET_DEV_TO_KEY".to_string();

        let publisher = build_publisher(&config, Platform::DevTo, true).unwrap();
        assert_eq!(publisher.platform(), Platform::DevTo);

        assert!(build_publisher(&config, Platform::DevTo, false).is_err());
    }

    #[test]
    fn test_hacker_news_requires_username() {
        let config = AppConfig::default();
        let error = build_publisher(&config, Platform::HackerNews, false)
            .err()
            .unwrap();
        assert!(error.to_string().contains("username"));
    }

    #[test]
    fn test_mailchimp_requires_sender() {
        let config = AppConfig::default();
        let error = build_publisher(&config, Platform::Mailchimp, false)
            .err()
            .unwrap();
        assert!(error.to_string().contains("from_name"));
    }

    #[test]
    fn test_load_api_key_rejects_empty_env_name() {
        assert!(load_api_key("  ", "dev_to").is_err());
    }
}
