//! Doctor command - validate configuration and show status

use anyhow::Result;
use crosspost_domain::Platform;
use serde::Serialize;
use std::path::PathBuf;

use crate::args::DoctorArgs;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    site: CheckResult,
    repository: CheckResult,
    dev_to: CheckResult,
    hacker_news: CheckResult,
    twitter: CheckResult,
    mailchimp: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        site: CheckResult::error("Not checked"),
        repository: CheckResult::error("Not checked"),
        dev_to: CheckResult::error("Not checked"),
        hacker_news: CheckResult::error("Not checked"),
        twitter: CheckResult::error("Not checked"),
        mailchimp: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    // Check config
    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.site = check_site(config);
        report.repository = check_repository(config);
        report.dev_to = check_platform(config, Platform::DevTo);
        report.hacker_news = check_platform(config, Platform::HackerNews);
        report.twitter = check_platform(config, Platform::Twitter);
        report.mailchimp = check_platform(config, Platform::Mailchimp);
    }

    // Determine overall status
    let checks = [
        &report.config,
        &report.site,
        &report.repository,
        &report.dev_to,
        &report.hacker_news,
        &report.twitter,
        &report.mailchimp,
    ];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    // Output report
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

fn check_site(config: &AppConfig) -> CheckResult {
    let base_url = config.site.base_url.trim();

    if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
        return CheckResult::error(format!("Site base_url is not an http(s) URL: {:?}", base_url));
    }

    if config.site.collection_dir.trim().is_empty() {
        return CheckResult::error("Site collection_dir is empty");
    }

    let example = format!(
        "{}/example{}",
        config.site.collection_dir.trim_end_matches('/'),
        config.site.document_suffix
    );
    let site = config.site.to_site_config();

    match site.canonical_url(&example) {
        Some(url) => CheckResult::ok(format!("Base URL: {}", base_url))
            .with_details(serde_json::json!({ "example": { "document": example, "url": url } })),
        None => CheckResult::error("Could not derive a canonical URL for an example document"),
    }
}

fn check_repository(config: &AppConfig) -> CheckResult {
    let repo_dir = &config.general.repo_dir;

    if !repo_dir.is_dir() {
        return CheckResult::error(format!(
            "Repository directory does not exist: {}",
            repo_dir.display()
        ));
    }

    let collection = repo_dir.join(&config.site.collection_dir);
    if !collection.is_dir() {
        return CheckResult::warn(format!(
            "Collection directory not found: {}",
            collection.display()
        ));
    }

    if !repo_dir.join(".git").exists() {
        return CheckResult::warn(format!(
            "{} is not a git repository root; pass documents explicitly to 'run'",
            repo_dir.display()
        ));
    }

    CheckResult::ok(format!("Repository: {}", repo_dir.display()))
}

fn check_platform(config: &AppConfig, platform: Platform) -> CheckResult {
    if !config.is_enabled(platform) {
        return CheckResult::ok(format!("{} disabled", platform.display_name()));
    }

    let env_var = match platform {
        Platform::DevTo => &config.dev_to.api_key_env,
        Platform::HackerNews => &config.hacker_news.password_env,
        Platform::Twitter => &config.twitter.user_token_env,
        Platform::Mailchimp => &config.mailchimp.api_key_env,
    };

    if env_var.trim().is_empty() {
        return CheckResult::error(format!(
            "No credential env var configured for {}",
            platform.display_name()
        ));
    }

    if platform == Platform::HackerNews && config.hacker_news.username.trim().is_empty() {
        return CheckResult::error("No Hacker News username configured");
    }

    if platform == Platform::Mailchimp {
        let mut missing = Vec::new();
        if config.mailchimp.from_name.trim().is_empty() {
            missing.push("from_name");
        }
        if config.mailchimp.reply_to.trim().is_empty() {
            missing.push("reply_to");
        }
        if !missing.is_empty() {
            return CheckResult::error(format!(
                "Mailchimp campaigns need {} in [mailchimp]",
                missing.join(" and ")
            ))
            .with_details(serde_json::json!({ "missing": missing }));
        }

        if let Ok(key) = std::env::var(env_var) {
            if !key.is_empty() && !key.contains('-') {
                return CheckResult::error(format!(
                    "{} has no datacenter suffix (expected <key>-<dc>)",
                    env_var
                ));
            }
        }
    }

    match std::env::var(env_var) {
        Ok(val) if !val.is_empty() => CheckResult::ok(format!("Credential: {} (set)", env_var)),
        _ => CheckResult::warn(format!("Credential: {} (not set)", env_var)),
    }
}

fn print_report(report: &DoctorReport) {
    println!("crosspost Doctor Report");
    println!("=======================");
    println!();

    print_check("Config", &report.config);
    print_check("Site", &report.site);
    print_check("Repository", &report.repository);
    print_check("dev.to", &report.dev_to);
    print_check("Hacker News", &report.hacker_news);
    print_check("X", &report.twitter);
    print_check("Mailchimp", &report.mailchimp);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall == "ok" {
        println!();
        println!("Ready to run! Try: crosspost run --dry-run");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}
