//! Core data models for the report pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Prefix shared by every failure sentinel. Persisted section mappings stay
/// detectable by substring even after the typed outcome is gone.
pub const FAILURE_SENTINEL_PREFIX: &str = "Error generating";

//
// ================= Sections =================
//

/// The seven report sections, in document order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SectionKey {
    ExecutiveSummary,
    MarketOpportunity,
    FinancialPerformance,
    GoToMarket,
    LeadershipTeam,
    InvestorFit,
    Recommendations,
}

/// The six data-independent middle sections, in fixed generation order.
pub const MIDDLE_SECTIONS: [SectionKey; 6] = [
    SectionKey::MarketOpportunity,
    SectionKey::FinancialPerformance,
    SectionKey::GoToMarket,
    SectionKey::LeadershipTeam,
    SectionKey::InvestorFit,
    SectionKey::Recommendations,
];

impl SectionKey {
    /// All seven sections in document order.
    pub fn all() -> [SectionKey; 7] {
        [
            SectionKey::ExecutiveSummary,
            SectionKey::MarketOpportunity,
            SectionKey::FinancialPerformance,
            SectionKey::GoToMarket,
            SectionKey::LeadershipTeam,
            SectionKey::InvestorFit,
            SectionKey::Recommendations,
        ]
    }

    /// Stable key used in persisted section mappings.
    pub fn storage_key(&self) -> &'static str {
        match self {
            SectionKey::ExecutiveSummary => "executive_summary_investment_rationale",
            SectionKey::MarketOpportunity => "market_opportunity_competitive_landscape",
            SectionKey::FinancialPerformance => "financial_performance_investment_readiness",
            SectionKey::GoToMarket => "go_to_market_strategy_customer_traction",
            SectionKey::LeadershipTeam => "leadership_team",
            SectionKey::InvestorFit => "investor_fit_exit_strategy_funding",
            SectionKey::Recommendations => "final_recommendations_next_steps",
        }
    }

    /// Full display name, also embedded in the failure sentinel.
    pub fn display_name(&self) -> &'static str {
        match self {
            SectionKey::ExecutiveSummary => "Executive Summary & Investment Rationale",
            SectionKey::MarketOpportunity => "Market Opportunity & Competitive Landscape",
            SectionKey::FinancialPerformance => "Financial Performance & Investment Readiness",
            SectionKey::GoToMarket => "Go-To-Market (GTM) Strategy & Customer Traction",
            SectionKey::LeadershipTeam => "Leadership & Team",
            SectionKey::InvestorFit => "Investor Fit, Exit Strategy & Funding Narrative",
            SectionKey::Recommendations => "Final Recommendations & Next Steps",
        }
    }

    /// Short label used when concatenating outputs for the summary context.
    pub fn summary_label(&self) -> &'static str {
        match self {
            SectionKey::ExecutiveSummary => "Executive Summary",
            SectionKey::MarketOpportunity => "Market Opportunity",
            SectionKey::FinancialPerformance => "Financial Performance",
            SectionKey::GoToMarket => "Go-To-Market Strategy",
            SectionKey::LeadershipTeam => "Leadership & Team",
            SectionKey::InvestorFit => "Investor Fit",
            SectionKey::Recommendations => "Final Recommendations",
        }
    }

    /// Inverse of [`SectionKey::storage_key`].
    pub fn from_storage_key(key: &str) -> Option<Self> {
        SectionKey::all().into_iter().find(|s| s.storage_key() == key)
    }

    /// Heading used for the persisted section and the rendered document.
    pub fn document_title(&self) -> String {
        format!("Section {}: {}", self.position(), self.display_name())
    }

    /// 1-based position in the rendered document.
    pub fn position(&self) -> u32 {
        match self {
            SectionKey::ExecutiveSummary => 1,
            SectionKey::MarketOpportunity => 2,
            SectionKey::FinancialPerformance => 3,
            SectionKey::GoToMarket => 4,
            SectionKey::LeadershipTeam => 5,
            SectionKey::InvestorFit => 6,
            SectionKey::Recommendations => 7,
        }
    }

    /// The sentinel stored in place of generated text when all attempts fail.
    pub fn failure_sentinel(&self) -> String {
        format!("{} {}.", FAILURE_SENTINEL_PREFIX, self.display_name())
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

//
// ================= Section Outcomes =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SectionStatus {
    Generated,
    Failed,
    Cancelled,
}

/// Tagged result of one section's generation. Call sites pattern-match on
/// this instead of sniffing the text for the sentinel substring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SectionOutcome {
    Generated { text: String, attempts: u32 },
    Failed { sentinel: String, attempts: u32 },
    Cancelled,
}

impl SectionOutcome {
    pub fn status(&self) -> SectionStatus {
        match self {
            SectionOutcome::Generated { .. } => SectionStatus::Generated,
            SectionOutcome::Failed { .. } => SectionStatus::Failed,
            SectionOutcome::Cancelled => SectionStatus::Cancelled,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            SectionOutcome::Generated { attempts, .. } => *attempts,
            SectionOutcome::Failed { attempts, .. } => *attempts,
            SectionOutcome::Cancelled => 0,
        }
    }

    /// Text persisted for this section: the generated prose, the failure
    /// sentinel, or a cancellation marker distinct from both.
    pub fn text_for(&self, key: SectionKey) -> String {
        match self {
            SectionOutcome::Generated { text, .. } => text.clone(),
            SectionOutcome::Failed { sentinel, .. } => sentinel.clone(),
            SectionOutcome::Cancelled => {
                format!("Generation cancelled before {} completed.", key.display_name())
            }
        }
    }

    pub fn generated_text(&self) -> Option<&str> {
        match self {
            SectionOutcome::Generated { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Final result of one orchestration run: all seven sections in document
/// order, each fully generated, failed, or cancelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedReport {
    sections: Vec<(SectionKey, SectionOutcome)>,
}

impl GeneratedReport {
    pub fn new(sections: Vec<(SectionKey, SectionOutcome)>) -> Self {
        Self { sections }
    }

    pub fn outcome(&self, key: SectionKey) -> Option<&SectionOutcome> {
        self.sections.iter().find(|(k, _)| *k == key).map(|(_, o)| o)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(SectionKey, SectionOutcome)> {
        self.sections.iter()
    }

    /// Flat storage-key → text view for persistence.
    pub fn section_map(&self) -> BTreeMap<String, String> {
        self.sections
            .iter()
            .map(|(key, outcome)| (key.storage_key().to_string(), outcome.text_for(*key)))
            .collect()
    }

    pub fn statuses(&self) -> Vec<(SectionKey, SectionStatus)> {
        self.sections
            .iter()
            .map(|(key, outcome)| (*key, outcome.status()))
            .collect()
    }

    pub fn fully_generated(&self) -> bool {
        self.sections
            .iter()
            .all(|(_, outcome)| outcome.status() == SectionStatus::Generated)
    }

    pub fn failed_count(&self) -> usize {
        self.sections
            .iter()
            .filter(|(_, outcome)| outcome.status() == SectionStatus::Failed)
            .count()
    }
}

//
// ================= Request Parameters =================
//

/// Caller-supplied parameters for one report run. Immutable for the duration
/// of the run; context maps derived from it are copies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportRequest {
    pub company: Option<String>,
    pub industry: Option<String>,
    pub funding_stage: Option<String>,
    pub founder_name: Option<String>,
    pub founder_type: Option<String>,
    pub company_type: Option<String>,
    pub company_description: Option<String>,
    /// Free-text query driving vector retrieval; defaults when absent.
    pub report_query: Option<String>,
    /// Raw pitch-deck text supplied by the caller, if any.
    pub pitch_deck_text: Option<String>,
    /// Additional template fields merged into every context map.
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl ReportRequest {
    pub fn research_query(&self) -> &str {
        self.report_query
            .as_deref()
            .filter(|q| !q.trim().is_empty())
            .unwrap_or("Investment readiness analysis")
    }

    /// Base template context with defaults for every absent field. Every
    /// section template's placeholders must resolve from this map (plus
    /// `retrieved_context`, inserted by the orchestrator per step).
    pub fn base_context(&self) -> BTreeMap<String, String> {
        let field = |value: &Option<String>, default: &str| {
            value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(default)
                .to_string()
        };

        let mut ctx = BTreeMap::new();
        ctx.insert("company".into(), field(&self.company, "Unknown Company"));
        ctx.insert("industry".into(), field(&self.industry, "General Industry"));
        ctx.insert(
            "funding_stage".into(),
            field(&self.funding_stage, "Unknown Stage"),
        );
        ctx.insert(
            "founder_name".into(),
            field(&self.founder_name, "Unknown Founder"),
        );
        ctx.insert(
            "founder_type".into(),
            field(&self.founder_type, "Unknown Type"),
        );
        ctx.insert(
            "company_type".into(),
            field(&self.company_type, "Unknown Type"),
        );
        ctx.insert(
            "company_description".into(),
            field(&self.company_description, "the user did not provide a description"),
        );

        for (key, value) in &self.extra {
            ctx.entry(key.clone()).or_insert_with(|| value.clone());
        }

        ctx
    }
}

//
// ================= Retrieval =================
//

/// One nearest-neighbor hit, text resolved. Ordered by ascending distance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalMatch {
    pub datapoint_id: String,
    pub content: String,
    pub distance: f32,
}

//
// ================= Assessment Markers =================
//

/// Closed three-level status enumeration embedded in section prose. The
/// renderer recognizes exactly these markers; anything else is plain text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentMarker {
    Strong,
    Moderate,
    Weak,
}

impl AssessmentMarker {
    pub fn emoji(&self) -> &'static str {
        match self {
            AssessmentMarker::Strong => "\u{1F7E2}",   // 🟢
            AssessmentMarker::Moderate => "\u{1F7E1}", // 🟡
            AssessmentMarker::Weak => "\u{1F534}",     // 🔴
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            AssessmentMarker::Strong => "assessment-strong",
            AssessmentMarker::Moderate => "assessment-moderate",
            AssessmentMarker::Weak => "assessment-weak",
        }
    }

    pub fn from_emoji(s: &str) -> Option<Self> {
        match s {
            "\u{1F7E2}" => Some(AssessmentMarker::Strong),
            "\u{1F7E1}" => Some(AssessmentMarker::Moderate),
            "\u{1F534}" => Some(AssessmentMarker::Weak),
            _ => None,
        }
    }

    pub fn all() -> [AssessmentMarker; 3] {
        [
            AssessmentMarker::Strong,
            AssessmentMarker::Moderate,
            AssessmentMarker::Weak,
        ]
    }
}

//
// ================= Persistence Entities =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Generating,
    Completed,
    ReadyForReview,
    Approved,
    Failed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Generating => "generating",
            ReportStatus::Completed => "completed",
            ReportStatus::ReadyForReview => "ready_for_review",
            ReportStatus::Approved => "approved",
            ReportStatus::Failed => "failed",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pending" => ReportStatus::Pending,
            "generating" => ReportStatus::Generating,
            "completed" => ReportStatus::Completed,
            "ready_for_review" => ReportStatus::ReadyForReview,
            "approved" => ReportStatus::Approved,
            "failed" => ReportStatus::Failed,
            _ => ReportStatus::Pending,
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One persisted section row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSection {
    pub section_key: String,
    pub title: String,
    pub content: String,
    pub position: u32,
}

/// Persisted report record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub title: String,
    pub user_id: Option<Uuid>,
    pub startup_id: Option<String>,
    pub report_type: Option<String>,
    pub parameters: serde_json::Value,
    pub status: ReportStatus,
    pub progress: i32,
    pub sections: Vec<StoredSection>,
    pub document_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_sentinel_contains_display_name() {
        let sentinel = SectionKey::LeadershipTeam.failure_sentinel();
        assert!(sentinel.starts_with(FAILURE_SENTINEL_PREFIX));
        assert!(sentinel.contains("Leadership & Team"));
    }

    #[test]
    fn test_cancelled_text_is_not_a_failure_sentinel() {
        let text = SectionOutcome::Cancelled.text_for(SectionKey::MarketOpportunity);
        assert!(!text.contains(FAILURE_SENTINEL_PREFIX));
        assert!(text.contains("cancelled"));
    }

    #[test]
    fn test_section_map_has_seven_keys() {
        let report = GeneratedReport::new(
            SectionKey::all()
                .into_iter()
                .map(|key| {
                    (
                        key,
                        SectionOutcome::Generated {
                            text: format!("content for {}", key.storage_key()),
                            attempts: 1,
                        },
                    )
                })
                .collect(),
        );

        let map = report.section_map();
        assert_eq!(map.len(), 7);
        assert!(map.contains_key("executive_summary_investment_rationale"));
        assert!(report.fully_generated());
    }

    #[test]
    fn test_base_context_defaults() {
        let request = ReportRequest {
            company: Some("Acme".to_string()),
            ..Default::default()
        };
        let ctx = request.base_context();
        assert_eq!(ctx.get("company").map(String::as_str), Some("Acme"));
        assert_eq!(
            ctx.get("funding_stage").map(String::as_str),
            Some("Unknown Stage")
        );
    }

    #[test]
    fn test_extra_fields_do_not_override_named_fields() {
        let mut extra = BTreeMap::new();
        extra.insert("company".to_string(), "Shadow Co".to_string());
        extra.insert("region".to_string(), "EMEA".to_string());

        let request = ReportRequest {
            company: Some("Acme".to_string()),
            extra,
            ..Default::default()
        };
        let ctx = request.base_context();
        assert_eq!(ctx.get("company").map(String::as_str), Some("Acme"));
        assert_eq!(ctx.get("region").map(String::as_str), Some("EMEA"));
    }

    #[test]
    fn test_assessment_marker_round_trip() {
        for marker in AssessmentMarker::all() {
            assert_eq!(AssessmentMarker::from_emoji(marker.emoji()), Some(marker));
        }
        assert_eq!(AssessmentMarker::from_emoji("x"), None);
    }
}
