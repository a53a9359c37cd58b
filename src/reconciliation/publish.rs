use super::{CommitError, HarvestContext};
use crate::service::ServiceObject;
use crate::shadow::ObjectShadow;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;
use tracing::info;

/// Start of the publication window for an object published at `now`.
///
/// Backdated by a day to absorb clock skew between us and the service.
pub fn publish_start_date(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(1)
}

impl ObjectShadow {
    /// Publish `object` on every configured access point, open-ended
    pub async fn publish(
        &self,
        ctx: &HarvestContext,
        object: &ServiceObject,
    ) -> Result<(), CommitError> {
        let start = publish_start_date(Utc::now());

        for accesspoint in &self.publish_accesspoint_ids {
            info!(
                object = %object.id,
                accesspoint = %accesspoint,
                start = %start.format("%Y-%m-%d %H:%M:%S"),
                "Publishing object"
            );
            ctx.client()
                .set_publish_settings(&object.id, accesspoint, Some(start))
                .await
                .check("setting publish settings")?;
        }

        Ok(())
    }

    /// Access points to clear for `object`: everything it reports when
    /// unpublishing everywhere, plus the explicitly configured ones
    pub fn unpublish_targets(&self, object: &ServiceObject) -> BTreeSet<String> {
        let mut targets = BTreeSet::new();

        if self.unpublish_everywhere {
            targets.extend(object.access_points.iter().map(|a| a.id.clone()));
        }
        targets.extend(self.unpublish_accesspoint_ids.iter().cloned());

        targets
    }

    /// Clear the publication window of `object` on every unpublish target
    pub async fn unpublish(
        &self,
        ctx: &HarvestContext,
        object: &ServiceObject,
    ) -> Result<(), CommitError> {
        for accesspoint in self.unpublish_targets(object) {
            info!(object = %object.id, accesspoint = %accesspoint, "Unpublishing object");
            ctx.client()
                .set_publish_settings(&object.id, &accesspoint, None)
                .await
                .check("setting publish settings")?;
        }

        Ok(())
    }
}
