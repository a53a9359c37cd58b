use super::Shadow;
use crate::reconciliation::{CommitError, HarvestContext};
use crate::service::{ServiceError, ServiceMetadata, ServiceObject};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One metadata document pending attachment
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetadataShadow {
    pub schema_id: String,
    #[serde(default)]
    pub language_code: String,
    pub document: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetadataCommitStatus {
    /// The object already carried an identical document
    Unchanged,
    /// The document as stored by the service, with its new revision
    Written(ServiceMetadata),
}

#[async_trait]
impl Shadow for MetadataShadow {
    type Output = MetadataCommitStatus;

    async fn commit(
        &mut self,
        ctx: &HarvestContext,
        parent: Option<&ServiceObject>,
    ) -> Result<MetadataCommitStatus, CommitError> {
        let object = parent.ok_or(CommitError::MissingParent("metadata"))?;
        let existing = object.find_metadata(&self.schema_id, &self.language_code);

        if existing.is_some_and(|current| current.document == self.document) {
            debug!(
                object = %object.id,
                schema = %self.schema_id,
                "Metadata unchanged, skipping"
            );
            return Ok(MetadataCommitStatus::Unchanged);
        }

        let metadata = ServiceMetadata {
            schema_id: self.schema_id.clone(),
            language_code: self.language_code.clone(),
            revision: existing.map(|m| m.revision).unwrap_or_default(),
            document: self.document.clone(),
        };

        let mut response = ctx
            .client()
            .set_metadata(&object.id, &metadata)
            .await
            .check("setting metadata")?;

        if response.results.is_empty() {
            return Err(ServiceError::MissingResults {
                action: "setting metadata",
            }
            .into());
        }
        let stored = response.results.remove(0);

        debug!(
            object = %object.id,
            schema = %self.schema_id,
            revision = stored.revision,
            "Metadata written"
        );
        Ok(MetadataCommitStatus::Written(stored))
    }
}
