pub mod banner;
pub mod breaking_news;
pub mod hooks;
pub mod metrics;
pub mod notices;
pub mod scheduler;
pub mod selector;
