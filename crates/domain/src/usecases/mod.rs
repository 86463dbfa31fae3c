//! Application use cases / business logic

pub mod change_set;
pub mod cross_post;
pub mod governor;
pub mod thread;

pub use change_set::ChangeSet;
pub use cross_post::{CrossPostConfig, CrossPoster};
pub use governor::RateGovernor;
