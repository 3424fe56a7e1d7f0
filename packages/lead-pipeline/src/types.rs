use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use uuid::Uuid;

/// Opaque handle for the browsing context the scraping collaborator controls
/// (a tab id in the extension host).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextHandle(pub String);

impl ContextHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContextHandle {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A scraped ad entry awaiting qualification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdCandidate {
    /// Landing page target
    pub url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "fbLink", skip_serializing_if = "Option::is_none")]
    pub social_profile_url: Option<String>,
}

impl AdCandidate {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            social_profile_url: None,
        }
    }

    pub fn with_profile(mut self, profile_url: impl Into<String>) -> Self {
        self.social_profile_url = Some(profile_url.into());
        self
    }

    /// Profile link, treating the scraper's empty string as absent.
    pub fn profile_url(&self) -> Option<&str> {
        self.social_profile_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Which extraction a page analyzer runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    Landing,
    Profile,
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisKind::Landing => f.write_str("landing"),
            AnalysisKind::Profile => f.write_str("profile"),
        }
    }
}

/// Structured result of analyzing one loaded page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageAnalysis {
    /// Sign-up affordance detected (only meaningful for landing pages)
    pub matched: bool,
    pub canonical_url: Option<String>,
    pub email: Option<String>,
    pub social_handle: Option<String>,
    #[serde(default)]
    pub detection_methods: BTreeSet<String>,
}

impl PageAnalysis {
    pub fn email(&self) -> Option<&str> {
        non_empty(self.email.as_deref())
    }

    pub fn social_handle(&self) -> Option<&str> {
        non_empty(self.social_handle.as_deref())
    }

    pub fn canonical_url(&self) -> Option<&str> {
        non_empty(self.canonical_url.as_deref())
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

/// A candidate whose landing page showed a sign-up affordance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub name: String,
    pub website: String,
    pub email: String,
    pub social_handle: String,
    pub social_profile_url: String,
    pub profile_email: String,
    pub profile_social_handle: String,
    pub detection_methods: BTreeSet<String>,
    pub found_at: DateTime<Utc>,
}

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishReason {
    #[serde(rename = "Safety Cap Reached")]
    SafetyCapReached,
    #[serde(rename = "Target Reached")]
    TargetReached,
    #[serde(rename = "Stopped")]
    Stopped,
}

impl FinishReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinishReason::SafetyCapReached => "Safety Cap Reached",
            FinishReason::TargetReached => "Target Reached",
            FinishReason::Stopped => "Stopped",
        }
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orchestrator state machine position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPhase {
    #[default]
    Idle,
    Draining,
    AwaitingMoreInput,
    Finished(FinishReason),
}

/// The single persisted record describing one scan session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanState {
    /// Changes on every session reset; stale drain work compares against it.
    pub session_id: Uuid,
    pub scanned_domains: BTreeSet<String>,
    pub processing_queue: VecDeque<AdCandidate>,
    pub qualified_leads: Vec<Lead>,
    pub phase: ScanPhase,
    pub session_target: Option<ContextHandle>,
    /// Items popped from the queue this session
    pub processed_count: usize,
    pub started_at: Option<DateTime<Utc>>,
}

impl Default for ScanState {
    fn default() -> Self {
        Self {
            session_id: Uuid::nil(),
            scanned_domains: BTreeSet::new(),
            processing_queue: VecDeque::new(),
            qualified_leads: Vec::new(),
            phase: ScanPhase::Idle,
            session_target: None,
            processed_count: 0,
            started_at: None,
        }
    }
}

impl ScanState {
    /// Fresh, empty session bound to the given context.
    pub fn new_session(target: Option<ContextHandle>) -> Self {
        Self {
            session_id: Uuid::now_v7(),
            session_target: target,
            started_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// True while a drain loop is scheduled or running for this session.
    pub fn is_processing(&self) -> bool {
        self.phase == ScanPhase::Draining
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, ScanPhase::Finished(_))
    }

    pub fn progress(&self, safety_cap: usize) -> ScanProgress {
        ScanProgress {
            processed: self.processed_count,
            qualified: self.qualified_leads.len(),
            scanned: self.scanned_domains.len(),
            queued: self.processing_queue.len(),
            safety_cap,
        }
    }
}

/// Counters published to the UI after every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanProgress {
    pub processed: usize,
    pub qualified: usize,
    pub scanned: usize,
    pub queued: usize,
    pub safety_cap: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_accepts_extension_message_shape() {
        let json = r#"{"url":"https://shop.example.com","name":"Shop","fbLink":""}"#;
        let candidate: AdCandidate = serde_json::from_str(json).unwrap();

        assert_eq!(candidate.name, "Shop");
        assert_eq!(candidate.social_profile_url.as_deref(), Some(""));
        assert_eq!(candidate.profile_url(), None);
    }

    #[test]
    fn finish_reason_serializes_as_display_string() {
        let json = serde_json::to_string(&FinishReason::SafetyCapReached).unwrap();
        assert_eq!(json, "\"Safety Cap Reached\"");
        assert_eq!(FinishReason::TargetReached.to_string(), "Target Reached");
    }

    #[test]
    fn new_session_is_empty_and_idle() {
        let state = ScanState::new_session(Some(ContextHandle::from("tab-7")));

        assert!(!state.session_id.is_nil());
        assert!(state.scanned_domains.is_empty());
        assert!(state.processing_queue.is_empty());
        assert!(!state.is_processing());
        assert_eq!(state.session_target.as_ref().map(|h| h.as_str()), Some("tab-7"));
    }

    #[test]
    fn persisted_state_round_trips_through_json() {
        let mut state = ScanState::new_session(None);
        state.scanned_domains.insert("a.com".to_string());
        state.processing_queue.push_back(AdCandidate::new("https://a.com", "A"));
        state.phase = ScanPhase::Finished(FinishReason::Stopped);

        let json = serde_json::to_string(&state).unwrap();
        let restored: ScanState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);
    }
}
