// Template dispatcher
//
// Thin boundary between the pure schedule matcher and the tracker
// collaborator: walks the templates once per run, fires the matcher
// against the shared calendar context, and requests ticket creation
// for each match. One failing template never aborts the run.

use crate::calendar::CalendarContext;
use crate::models::{IssueRequest, TicketTemplate};
use crate::schedule::ScheduleMatch;
use crate::tracker::IssueTracker;
use std::sync::Arc;
use tracing::{error, info};

/// Outcome counts for one dispatch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Templates whose schedule was evaluated.
    pub evaluated: usize,
    /// Tickets successfully created (or dry-run printed).
    pub fired: usize,
    /// Inactive templates that were not evaluated.
    pub skipped: usize,
    /// Matched templates whose ticket creation failed.
    pub failed: usize,
}

/// Evaluates templates against one calendar context and forwards
/// matches to the tracker.
pub struct Dispatcher {
    tracker: Arc<dyn IssueTracker>,
    default_labels: Vec<String>,
}

impl Dispatcher {
    pub fn new(tracker: Arc<dyn IssueTracker>, default_labels: Vec<String>) -> Self {
        Self {
            tracker,
            default_labels,
        }
    }

    /// Run one batch: sequential, one ticket creation completing (or
    /// failing) before the next template is considered.
    pub async fn run(&self, templates: &[TicketTemplate], ctx: &CalendarContext) -> RunSummary {
        let mut summary = RunSummary::default();

        for template in templates {
            if !template.active {
                info!(title = %template.title, "Skipping inactive template");
                summary.skipped += 1;
                continue;
            }

            summary.evaluated += 1;
            if !template.schedule.matches(ctx) {
                continue;
            }

            let request = IssueRequest {
                project: template.project.clone(),
                title: template.title.clone(),
                description: template.description.clone(),
                labels: template.resolved_labels(&self.default_labels),
                assignee: template.assignee.clone(),
            };

            match self.tracker.create_issue(&request).await {
                Ok(issue) => {
                    info!(
                        title = %template.title,
                        project = %template.project,
                        iid = issue.iid,
                        "Template fired"
                    );
                    summary.fired += 1;
                }
                Err(e) => {
                    error!(
                        title = %template.title,
                        project = %template.project,
                        error = %e,
                        "Ticket creation failed, continuing with remaining templates"
                    );
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}
