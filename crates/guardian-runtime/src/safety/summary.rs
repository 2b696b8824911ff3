//! Activity summaries

use guardian_core::{ActivityItem, ActivityLog, GuardianResult, ModelRequest, RequestMessage};
use tracing::{debug, warn};

use super::SafetyClassifier;
use crate::prompts::{summary_prompt, SUMMARY_EMPTY, SUMMARY_UNAVAILABLE};

impl SafetyClassifier {
    /// Short parent-facing digest of an activity log
    ///
    /// Never fails: an empty model reply or any error yields a fixed
    /// fallback string instead.
    pub async fn summarize(&self, activities: &[ActivityItem]) -> String {
        match self.try_summarize(activities).await {
            Ok(text) if text.trim().is_empty() => {
                warn!("Model returned an empty summary");
                SUMMARY_EMPTY.to_string()
            }
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Summary failed");
                SUMMARY_UNAVAILABLE.to_string()
            }
        }
    }

    async fn try_summarize(&self, activities: &[ActivityItem]) -> GuardianResult<String> {
        let log = ActivityLog::new(activities);
        debug!(
            items = activities.len(),
            total_minutes = log.total_minutes(),
            flagged = log.flagged().len(),
            "Summarizing activity"
        );

        let data = serde_json::to_string(activities)?;
        let request = ModelRequest::new(vec![RequestMessage::user(summary_prompt(&data))]);
        let response = self.model.generate(&request).await?;
        Ok(response.content)
    }
}
