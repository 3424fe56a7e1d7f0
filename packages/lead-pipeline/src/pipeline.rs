//! Two-stage qualification of one candidate: landing page, then (optionally)
//! the advertiser's social profile.

use chrono::Utc;
use tokio::time::{sleep, timeout};

use crate::config::{ScanConfig, SocialHandleFallback};
use crate::domain::is_profile_url;
use crate::error::AnalysisError;
use crate::traits::{AnalysisRequest, PageAnalyzer};
use crate::types::{AdCandidate, AnalysisKind, Lead, PageAnalysis};

pub struct AnalysisPipeline<'a> {
    analyzer: &'a dyn PageAnalyzer,
    config: &'a ScanConfig,
}

impl<'a> AnalysisPipeline<'a> {
    pub fn new(analyzer: &'a dyn PageAnalyzer, config: &'a ScanConfig) -> Self {
        Self { analyzer, config }
    }

    /// Run both stages; `Some(lead)` only when the landing page matched.
    ///
    /// Failures are never retried and never propagate: a failed landing
    /// analysis disqualifies the candidate, a failed profile analysis just
    /// leaves the profile fields empty.
    pub async fn qualify(&self, candidate: &AdCandidate) -> Option<Lead> {
        let landing = self.run(&candidate.url, AnalysisKind::Landing).await?;

        if !landing.matched {
            tracing::debug!(url = %candidate.url, "No sign-up detected");
            return None;
        }

        tracing::info!(
            url = %candidate.url,
            methods = landing.detection_methods.len(),
            "Sign-up detected"
        );

        let profile = match candidate
            .profile_url()
            .filter(|url| is_profile_url(url, &self.config.profile_domain))
        {
            Some(profile_url) => {
                sleep(self.config.profile_settle_delay).await;
                self.run(profile_url, AnalysisKind::Profile).await
            }
            None => None,
        };

        Some(build_lead(
            candidate,
            &landing,
            profile.as_ref(),
            self.config.social_handle_fallback,
        ))
    }

    async fn run(&self, url: &str, kind: AnalysisKind) -> Option<PageAnalysis> {
        let request = AnalysisRequest {
            url: url.to_string(),
            kind,
            navigation_timeout: self.config.navigation_timeout,
        };
        let limit = self.config.analysis_timeout();

        let outcome = match timeout(limit, self.analyzer.analyze(&request)).await {
            Ok(result) => result,
            Err(_) => Err(AnalysisError::Timeout {
                url: url.to_string(),
                elapsed: limit,
            }),
        };

        match outcome {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                tracing::warn!(url = %url, kind = %kind, error = %e, "Page analysis failed");
                None
            }
        }
    }
}

/// Merge landing and profile results; landing wins, then profile, then the fallback.
pub fn build_lead(
    candidate: &AdCandidate,
    landing: &PageAnalysis,
    profile: Option<&PageAnalysis>,
    fallback: SocialHandleFallback,
) -> Lead {
    let profile_email = profile.and_then(|p| p.email());
    let profile_handle = profile.and_then(|p| p.social_handle());
    let profile_url = candidate.profile_url().unwrap_or_default();

    let social_handle = landing
        .social_handle()
        .or(profile_handle)
        .unwrap_or(match fallback {
            SocialHandleFallback::Empty => "",
            SocialHandleFallback::ProfileUrl => profile_url,
        });

    Lead {
        name: candidate.name.clone(),
        website: landing.canonical_url().unwrap_or(candidate.url.as_str()).to_string(),
        email: landing.email().or(profile_email).unwrap_or_default().to_string(),
        social_handle: social_handle.to_string(),
        social_profile_url: profile_url.to_string(),
        profile_email: profile_email.unwrap_or_default().to_string(),
        profile_social_handle: profile_handle.unwrap_or_default().to_string(),
        detection_methods: landing.detection_methods.clone(),
        found_at: Utc::now(),
    }
}
