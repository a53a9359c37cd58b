use super::{CommitError, HarvestContext};
use crate::service::ServiceObject;
use crate::shadow::{FileSummary, MetadataCommitStatus, ObjectShadow, Shadow};
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{debug, info};

#[async_trait]
impl Shadow for ObjectShadow {
    type Output = Option<ServiceObject>;

    async fn commit(
        &mut self,
        ctx: &HarvestContext,
        parent: Option<&ServiceObject>,
    ) -> Result<Option<ServiceObject>, CommitError> {
        debug!(shadow = %self, "Committing the shadow of an object");
        if parent.is_some() {
            return Err(CommitError::RelatedObjectsUnsupported);
        }

        if ctx.options().no_shadow_commit {
            return match self.get(ctx, false).await? {
                Some(object) => {
                    info!(
                        id = %object.id,
                        "Because 'no-shadow-commit' is set, this object is not committed"
                    );
                    Ok(Some(object.clone()))
                }
                None => {
                    info!(
                        query = %self.query,
                        "Because 'no-shadow-commit' is set, this object would have been created"
                    );
                    Ok(None)
                }
            };
        }

        if ctx.options().require_files_on_objects && self.file_shadows.is_empty() {
            info!(
                shadow = %self,
                "Object shadow skipped because 'require-files-on-objects' is set and no file shadows were attached"
            );
            self.skipped = true;
        }

        let object = if self.skipped {
            self.get(ctx, false).await?.cloned()
        } else {
            let object = self.get_or_create(ctx).await?.clone();
            self.commit_children(ctx, &object).await?;
            Some(object)
        };

        match &object {
            Some(object) if !self.skipped => self.publish(ctx, object).await?,
            Some(object) => self.unpublish(ctx, object).await?,
            None => info!(
                query = %self.query,
                "No need to unpublish as this external object is not represented in the service"
            ),
        }

        for duplicate in self.duplicate_objects() {
            self.unpublish(ctx, duplicate).await?;
        }

        Ok(object)
    }
}

impl ObjectShadow {
    /// Commit metadata, files and related objects against the bound object,
    /// then delete files the object carries that no file shadow accounts for.
    async fn commit_children(
        &mut self,
        ctx: &HarvestContext,
        object: &ServiceObject,
    ) -> Result<(), CommitError> {
        // Later shadows for the same schema and language must see the
        // revision the previous write produced
        let mut written = object.clone();
        for metadata_shadow in &mut self.metadata_shadows {
            let status = metadata_shadow.commit(ctx, Some(&written)).await?;
            if let MetadataCommitStatus::Written(stored) = status {
                written.replace_metadata(stored);
            }
        }

        let mut summary = FileSummary::default();
        for file_shadow in &mut self.file_shadows {
            summary.statuses.push(file_shadow.commit(ctx, Some(object)).await?);
        }

        let committed: HashSet<u64> = self
            .file_shadows
            .iter()
            .filter_map(|f| f.file_id())
            .collect();
        for file_id in object.file_ids().filter(|id| !committed.contains(id)) {
            debug!(object = %object.id, file = file_id, "Deleting orphaned file");
            ctx.client()
                .delete_file(file_id)
                .await
                .check("deleting a file")?;
            summary.deleted.push(file_id);
        }

        info!(object = %object.id, "Committing files: {}", summary.line());
        self.set_file_summary(summary);

        // Shadows own their related shadows, so this cannot cycle
        for related in &mut self.related_object_shadows {
            related.commit(ctx, Some(object)).await?;
        }

        Ok(())
    }
}
