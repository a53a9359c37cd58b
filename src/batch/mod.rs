//! Batch driver: commits independent top-level shadows one after another.

use crate::reconciliation::{CommitError, HarvestContext};
use crate::shadow::{ObjectShadow, Shadow};
use crate::utils::now_iso;
use serde::Serialize;
use tracing::{error, info};

/// A shadow that failed to commit
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FailedShadow {
    pub shadow: String,
    pub error: String,
}

/// Outcome of a batch
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub started_at: String,
    pub finished_at: String,
    /// Object IDs resolved without committing anything (dry run)
    pub resolved: Vec<String>,
    /// Object IDs committed and published
    pub published: Vec<String>,
    /// Object IDs of skipped shadows that were unpublished
    pub unpublished: Vec<String>,
    /// Shadows with no backing object, by display name
    pub absent: Vec<String>,
    pub failed: Vec<FailedShadow>,
}

impl BatchReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Commit every shadow in order.
///
/// With `continue_on_error` a failing shadow is recorded and the next one is
/// processed. Otherwise the first failure aborts the batch.
pub async fn run_batch(
    ctx: &HarvestContext,
    shadows: &mut [ObjectShadow],
    continue_on_error: bool,
) -> Result<BatchReport, CommitError> {
    let mut report = BatchReport {
        started_at: now_iso(),
        ..BatchReport::default()
    };

    for (index, shadow) in shadows.iter_mut().enumerate() {
        info!(index, shadow = %shadow, "Processing object shadow");

        match shadow.commit(ctx, None).await {
            Ok(Some(object)) if ctx.options().no_shadow_commit => report.resolved.push(object.id),
            Ok(Some(object)) if shadow.skipped => report.unpublished.push(object.id),
            Ok(Some(object)) => report.published.push(object.id),
            Ok(None) => report.absent.push(shadow.to_string()),
            Err(e) if continue_on_error => {
                error!(index, shadow = %shadow, error = %e, "Failed to commit object shadow");
                report.failed.push(FailedShadow {
                    shadow: shadow.to_string(),
                    error: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    report.finished_at = now_iso();
    info!(
        resolved = report.resolved.len(),
        published = report.published.len(),
        unpublished = report.unpublished.len(),
        absent = report.absent.len(),
        failed = report.failed.len(),
        "Batch finished"
    );

    Ok(report)
}
