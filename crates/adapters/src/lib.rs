//! crosspost adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `documents`: Front-matter documents on the local filesystem
//! - `live`: HTTP fetcher that waits for an article to go live
//! - `git`: Change detection from the repository history
//! - `dev_to`, `hacker_news`, `x_api`, `mailchimp`: platform publishers

mod disabled;
mod documents_fs;
mod http;

pub mod dev_to;
pub mod git;
pub mod hacker_news;
pub mod live;
pub mod mailchimp;
pub mod x_api;

/// Re-exports for document store adapters
pub mod documents {
    pub use crate::documents_fs::{FsDocumentStore, parse_document, render_document};
}

/// Re-exports for publisher adapters
pub mod publishers {
    pub use crate::dev_to::{DevToCredentials, DevToPublisher};
    pub use crate::disabled::DisabledPublisher;
    pub use crate::hacker_news::{HackerNewsCredentials, HackerNewsPublisher, Pacing};
    pub use crate::mailchimp::{MailchimpCredentials, MailchimpPublisher, MailchimpSettings};
    pub use crate::x_api::{XCredentials, XThreadPublisher};
}
