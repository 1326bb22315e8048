//! Engage campaign targeting rules.
//!
//! A visitor-auto campaign carries a list of [`EngageRule`]s. A visitor
//! matches the campaign when every rule passes. Only a fixed set of rule
//! kinds is understood ([`RuleKind`]); rules of any other kind pass, so a
//! campaign authored against a newer rule vocabulary still fires on the
//! rules this backend can check.

use serde::{Deserialize, Serialize};

/// Campaign kind that auto-starts conversations with anonymous visitors.
pub const KIND_VISITOR_AUTO: &str = "visitorAuto";

/// Campaign delivery method for in-widget messages.
pub const METHOD_MESSENGER: &str = "messenger";

/// Rule kind: exact match on the visitor's browser language.
pub const RULE_BROWSER_LANGUAGE: &str = "browserLanguage";

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Browser details reported by the widget on connect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrowserInfo {
    #[serde(default)]
    pub browser_language: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// Coarse geolocation of the connecting visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub city: Option<String>,
    pub country: Option<String>,
}

/// A single targeting rule as stored on a campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngageRule {
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Rule kinds this backend knows how to check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    BrowserLanguage,
}

impl RuleKind {
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            RULE_BROWSER_LANGUAGE => Some(Self::BrowserLanguage),
            _ => None,
        }
    }
}

impl EngageRule {
    /// Check this rule against a visitor.
    ///
    /// Unknown kinds pass.
    pub fn passes(&self, browser: &BrowserInfo, _location: &Location) -> bool {
        match RuleKind::parse(&self.kind) {
            Some(RuleKind::BrowserLanguage) => {
                browser.browser_language.as_deref() == self.value.as_deref()
            }
            None => true,
        }
    }
}

/// Returns `true` when every rule passes. An empty rule list passes.
pub fn passes_all_rules(rules: &[EngageRule], browser: &BrowserInfo, location: &Location) -> bool {
    rules.iter().all(|rule| rule.passes(browser, location))
}

/// Decode a campaign's stored rule list.
///
/// `null` decodes to no rules. Entries that are not rule objects are an
/// error.
pub fn parse_rules(value: &serde_json::Value) -> Result<Vec<EngageRule>, serde_json::Error> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value.clone())
}
