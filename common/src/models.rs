// Data model for ticket templates and tracker requests

use serde::{Deserialize, Serialize};

/// A ticket template: what to create and the schedule it fires on.
///
/// Templates are read fresh from configuration on every run and never
/// mutated after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketTemplate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Project identifier in the tracker, e.g. "group/project".
    pub project: String,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Labels specific to this template, merged with the configured
    /// default labels at dispatch time.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Tracker username to assign the created ticket to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    pub schedule: ScheduleRule,
}

fn default_active() -> bool {
    true
}

impl TicketTemplate {
    /// Template labels merged with the default labels, duplicates
    /// removed, first occurrence wins for ordering.
    pub fn resolved_labels(&self, default_labels: &[String]) -> Vec<String> {
        let mut merged: Vec<String> = Vec::new();
        for label in default_labels.iter().chain(self.labels.iter()) {
            if !merged.contains(label) {
                merged.push(label.clone());
            }
        }
        merged
    }
}

/// One template's schedule. Any subset of the three rule tiers may be
/// present; they are evaluated in a fixed order with OR semantics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleRule {
    /// Slash-delimited tokens: "run" (always fires) or weekday names
    /// or Monday-first indices, e.g. "mon/wed" or "run".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub every: Option<String>,
    /// Slash-delimited days of month, e.g. "1/15".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<String>,
    /// Slash-delimited month tokens paired with `day`, e.g. "jan/jun"
    /// or "*". Defaults to every month when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    /// N-th weekday of the month, e.g. 3rd Thursday.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nth: Option<NthRule>,
}

/// The n-th occurrence of a weekday within the current month.
///
/// Both fields are required for the tier to be evaluated; a missing
/// half is a configuration error reported per-template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NthRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday: Option<String>,
    /// 1-based: n = 1 is the first occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
}

/// Payload handed to the tracker collaborator for one matched template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRequest {
    pub project: String,
    pub title: String,
    pub description: String,
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

/// Tracker's view of a created ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedIssue {
    pub iid: u64,
    #[serde(default)]
    pub web_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template_with_labels(labels: &[&str]) -> TicketTemplate {
        TicketTemplate {
            title: "Backup check".to_string(),
            description: String::new(),
            project: "ops/maintenance".to_string(),
            active: true,
            labels: labels.iter().map(|s| s.to_string()).collect(),
            assignee: None,
            schedule: ScheduleRule::default(),
        }
    }

    #[test]
    fn test_active_defaults_to_true() {
        let template: TicketTemplate = serde_json::from_value(serde_json::json!({
            "title": "Backup check",
            "project": "ops/maintenance",
            "schedule": { "every": "run" }
        }))
        .unwrap();
        assert!(template.active);
        assert!(template.labels.is_empty());
        assert!(template.assignee.is_none());
    }

    #[test]
    fn test_resolved_labels_merges_and_dedupes() {
        let template = template_with_labels(&["backup", "recurring"]);
        let defaults = vec!["recurring".to_string(), "ops".to_string()];
        assert_eq!(
            template.resolved_labels(&defaults),
            vec!["recurring", "ops", "backup"]
        );
    }

    #[test]
    fn test_resolved_labels_without_defaults() {
        let template = template_with_labels(&["backup"]);
        assert_eq!(template.resolved_labels(&[]), vec!["backup"]);
    }

    #[test]
    fn test_nth_rule_tolerates_missing_fields_at_parse_time() {
        // Incomplete nth rules must survive deserialization so the
        // matcher can report them per-template instead of failing the
        // whole template file.
        let rule: ScheduleRule =
            serde_json::from_value(serde_json::json!({ "nth": { "weekday": "mon" } })).unwrap();
        let nth = rule.nth.unwrap();
        assert_eq!(nth.weekday.as_deref(), Some("mon"));
        assert!(nth.n.is_none());
    }
}
