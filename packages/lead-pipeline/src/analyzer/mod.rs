//! Reference [`PageAnalyzer`](crate::traits::PageAnalyzer) built on HTTP + static HTML.

pub mod html;
pub mod http;

pub use html::{analyze_landing, analyze_profile, HtmlPageAnalyzer};
pub use http::HttpPageFetcher;

/// HTML heuristics over plain HTTP fetches.
pub type HttpPageAnalyzer = HtmlPageAnalyzer<HttpPageFetcher>;

impl HttpPageAnalyzer {
    pub fn from_http() -> Result<Self, reqwest::Error> {
        Ok(HtmlPageAnalyzer::new(HttpPageFetcher::new()?))
    }
}
