use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// What a lead's social handle falls back to when neither the landing page
/// nor the profile page yields one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialHandleFallback {
    #[default]
    Empty,
    ProfileUrl,
}

impl FromStr for SocialHandleFallback {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "empty" => Ok(Self::Empty),
            "profile_url" | "profile-url" => Ok(Self::ProfileUrl),
            other => bail!("unknown social handle fallback '{}'", other),
        }
    }
}

/// Tunables for one scan session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Max unique domains admitted per session
    pub safety_cap: usize,
    /// Soft target for qualified leads; checked before the cap when set
    pub success_target: Option<usize>,
    /// Pause between the end of one item and the start of the next
    pub inter_step_delay: Duration,
    /// Pause before visiting a social profile
    pub profile_settle_delay: Duration,
    /// Cap on waiting for a page to finish loading
    pub navigation_timeout: Duration,
    /// Extra allowance for extraction once the page has loaded
    pub extraction_timeout: Duration,
    /// Registrable domain of the social platform profiles live on
    pub profile_domain: String,
    pub social_handle_fallback: SocialHandleFallback,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            safety_cap: 100,
            success_target: None,
            inter_step_delay: Duration::from_millis(2000),
            profile_settle_delay: Duration::from_millis(1000),
            navigation_timeout: Duration::from_millis(10_000),
            extraction_timeout: Duration::from_millis(5_000),
            profile_domain: "facebook.com".to_string(),
            social_handle_fallback: SocialHandleFallback::Empty,
        }
    }
}

impl ScanConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();

        let defaults = Self::default();

        Ok(Self {
            safety_cap: parse_var("LEAD_SAFETY_CAP")?.unwrap_or(defaults.safety_cap),
            success_target: parse_var("LEAD_SUCCESS_TARGET")?.or(defaults.success_target),
            inter_step_delay: parse_millis("LEAD_INTER_STEP_DELAY_MS")?
                .unwrap_or(defaults.inter_step_delay),
            profile_settle_delay: parse_millis("LEAD_PROFILE_SETTLE_DELAY_MS")?
                .unwrap_or(defaults.profile_settle_delay),
            navigation_timeout: parse_millis("LEAD_NAVIGATION_TIMEOUT_MS")?
                .unwrap_or(defaults.navigation_timeout),
            extraction_timeout: parse_millis("LEAD_EXTRACTION_TIMEOUT_MS")?
                .unwrap_or(defaults.extraction_timeout),
            profile_domain: env::var("LEAD_PROFILE_DOMAIN").unwrap_or(defaults.profile_domain),
            social_handle_fallback: parse_var("LEAD_SOCIAL_HANDLE_FALLBACK")?
                .unwrap_or(defaults.social_handle_fallback),
        })
    }

    pub fn with_safety_cap(mut self, cap: usize) -> Self {
        self.safety_cap = cap;
        self
    }

    pub fn with_success_target(mut self, target: usize) -> Self {
        self.success_target = Some(target);
        self
    }

    pub fn with_inter_step_delay(mut self, delay: Duration) -> Self {
        self.inter_step_delay = delay;
        self
    }

    pub fn with_profile_settle_delay(mut self, delay: Duration) -> Self {
        self.profile_settle_delay = delay;
        self
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    pub fn with_extraction_timeout(mut self, timeout: Duration) -> Self {
        self.extraction_timeout = timeout;
        self
    }

    pub fn with_profile_domain(mut self, domain: impl Into<String>) -> Self {
        self.profile_domain = domain.into();
        self
    }

    pub fn with_social_handle_fallback(mut self, fallback: SocialHandleFallback) -> Self {
        self.social_handle_fallback = fallback;
        self
    }

    /// Hard bound on one analyzer invocation: navigation wait plus extraction.
    pub fn analysis_timeout(&self) -> Duration {
        self.navigation_timeout + self.extraction_timeout
    }
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("{} has an invalid value '{}'", name, raw)),
        _ => Ok(None),
    }
}

fn parse_millis(name: &str) -> Result<Option<Duration>> {
    Ok(parse_var::<u64>(name)?.map(Duration::from_millis))
}
