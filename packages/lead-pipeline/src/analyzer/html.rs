//! Sign-up and contact heuristics over static HTML.
//!
//! Works on the markup as served; pages that only render their forms through
//! JavaScript will not match.

use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use url::Url;

use crate::error::AnalysisError;
use crate::traits::{AnalysisRequest, PageAnalyzer, PageFetcher};
use crate::types::{AnalysisKind, PageAnalysis};

const SIGNUP_TEXT_PATTERNS: [&str; 8] = [
    r"sign\s*up",
    r"register",
    r"create\s*account",
    r"get\s*started",
    r"try\s*for\s*free",
    r"join\s*now",
    r"start\s*free\s*trial",
    r"create\s*profile",
];

const TEXT_ELEMENTS: &str = "button, a, span, div, p, h1, h2, h3, h4, h5, h6";

const FORM_MARKERS: [&str; 4] = ["signup", "register", "create-account", "newsletter"];

const SIGNUP_SELECTORS: [&str; 9] = [
    r#"[class*="signup"]"#,
    r#"[class*="register"]"#,
    r#"[class*="newsletter"]"#,
    r#"[id*="signup"]"#,
    r#"[id*="register"]"#,
    r#"[id*="newsletter"]"#,
    ".signup-form",
    ".registration-form",
    ".newsletter-form",
];

static SIGNUP_TEXT: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    SIGNUP_TEXT_PATTERNS
        .iter()
        .filter_map(|source| {
            Regex::new(&format!("(?i){source}"))
                .ok()
                .map(|re| (*source, re))
        })
        .collect()
});

static EMAIL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z0-9._-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,6}").ok());

/// [`PageAnalyzer`] that fetches a page and classifies its markup.
pub struct HtmlPageAnalyzer<F> {
    fetcher: F,
}

impl<F: PageFetcher> HtmlPageAnalyzer<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl<F: PageFetcher> PageAnalyzer for HtmlPageAnalyzer<F> {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<PageAnalysis, AnalysisError> {
        let page = self
            .fetcher
            .fetch(&request.url, request.navigation_timeout)
            .await?;

        let analysis = match request.kind {
            AnalysisKind::Landing => analyze_landing(&page.html, &page.final_url),
            AnalysisKind::Profile => analyze_profile(&page.html, &page.final_url),
        };

        tracing::debug!(
            url = %request.url,
            final_url = %page.final_url,
            kind = %request.kind,
            matched = analysis.matched,
            methods = ?analysis.detection_methods,
            "Page classified"
        );
        Ok(analysis)
    }
}

/// Look for sign-up affordances and contact details on a landing page.
pub fn analyze_landing(html: &str, final_url: &str) -> PageAnalysis {
    let document = Html::parse_document(html);
    let base = Url::parse(final_url).ok();
    let mut methods = BTreeSet::new();

    if has_email_input(&document) {
        methods.insert("email_input_fields".to_string());
    }

    if select_any(&document, r#"input[type="password"]"#) {
        methods.insert("password_fields".to_string());
    }

    if let Ok(selector) = Selector::parse(TEXT_ELEMENTS) {
        for element in document.select(&selector) {
            let text = element_text(element);
            for (source, pattern) in SIGNUP_TEXT.iter() {
                if pattern.is_match(&text) {
                    methods.insert(format!("text_pattern_{source}"));
                }
            }
        }
    }

    if let Ok(selector) = Selector::parse("form") {
        let signup_form = document.select(&selector).any(|form| {
            let markup = form.html().to_lowercase();
            FORM_MARKERS.iter().any(|marker| markup.contains(marker))
        });
        if signup_form {
            methods.insert("form_attributes".to_string());
        }
    }

    for css in SIGNUP_SELECTORS {
        if select_any(&document, css) {
            methods.insert(format!("css_selector_{css}"));
        }
    }

    let email = mailto_email(&document).or_else(|| {
        first_text(&document, "footer")
            .or_else(|| first_text(&document, "body"))
            .and_then(|text| find_email(&text))
    });

    PageAnalysis {
        matched: !methods.is_empty(),
        canonical_url: Some(final_url.to_string()),
        email,
        social_handle: instagram_link(&document, base.as_ref()),
        detection_methods: methods,
    }
}

/// Pull contact details from a social profile page.
pub fn analyze_profile(html: &str, final_url: &str) -> PageAnalysis {
    let document = Html::parse_document(html);
    let base = Url::parse(final_url).ok();

    let email = mailto_email(&document)
        .or_else(|| first_text(&document, "body").and_then(|text| find_email(&text)));

    PageAnalysis {
        matched: false,
        canonical_url: Some(final_url.to_string()),
        email,
        social_handle: instagram_link(&document, base.as_ref()),
        detection_methods: BTreeSet::new(),
    }
}

fn select_any(document: &Html, css: &str) -> bool {
    Selector::parse(css)
        .map(|selector| document.select(&selector).next().is_some())
        .unwrap_or(false)
}

fn has_email_input(document: &Html) -> bool {
    if select_any(document, r#"input[type="email"], input[name*="email"]"#) {
        return true;
    }

    let Ok(inputs) = Selector::parse("input[placeholder]") else {
        return false;
    };
    document.select(&inputs).any(|input| {
        input
            .value()
            .attr("placeholder")
            .is_some_and(|p| p.to_lowercase().contains("email"))
    })
}

/// Concatenated text nodes, like the DOM's `textContent`.
fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    document.select(&selector).next().map(element_text)
}

fn find_email(text: &str) -> Option<String> {
    EMAIL
        .as_ref()?
        .find(text)
        .map(|m| m.as_str().to_string())
}

fn mailto_email(document: &Html) -> Option<String> {
    let selector = Selector::parse(r#"a[href^="mailto:"]"#).ok()?;
    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| {
            href.trim_start_matches("mailto:")
                .split('?')
                .next()
                .unwrap_or_default()
                .trim()
                .to_string()
        })
        .find(|email| !email.is_empty())
}

fn instagram_link(document: &Html, base: Option<&Url>) -> Option<String> {
    let selector = Selector::parse(r#"a[href*="instagram.com"]"#).ok()?;
    let href = document
        .select(&selector)
        .find_map(|a| a.value().attr("href"))?;

    match base.and_then(|base| base.join(href).ok()) {
        Some(absolute) => Some(absolute.to_string()),
        None => Some(href.to_string()),
    }
}
