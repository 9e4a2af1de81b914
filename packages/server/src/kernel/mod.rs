//! Kernel module - server infrastructure and dependencies.

pub mod browser_scraper;
pub mod deps;
pub mod llm_request;
pub mod simple_scraper;
pub mod test_dependencies;
pub mod traits;

pub use browser_scraper::{settle, PageFingerprint, ScrollablePage, SettleReport, WebDriverExtractor};
pub use deps::ServerDeps;
pub use llm_request::ChatModel;
pub use simple_scraper::{HttpExtractor, DESKTOP_USER_AGENT};
pub use test_dependencies::TestDependencies;
pub use traits::*;
