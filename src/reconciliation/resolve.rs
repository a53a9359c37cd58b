use super::{CommitError, HarvestContext, DUPLICATE_THRESHOLD};
use crate::service::{Expand, ObjectQuery, ServiceError, ServiceObject, SortOrder};
use crate::shadow::{Binding, ObjectShadow};
use tracing::{debug, info, warn};

impl ObjectShadow {
    /// Resolve the service record backing this shadow.
    ///
    /// Once bound, the record is returned without asking the service again.
    /// With `or_create` unset a missing record yields `None` and nothing is
    /// bound, so a later call queries again.
    pub async fn get(
        &self,
        ctx: &HarvestContext,
        or_create: bool,
    ) -> Result<Option<&ServiceObject>, CommitError> {
        if or_create {
            self.get_or_create(ctx).await.map(Some)
        } else {
            self.find(ctx).await
        }
    }

    /// Resolve the backing record, creating it when the query matches nothing
    pub async fn get_or_create(&self, ctx: &HarvestContext) -> Result<&ServiceObject, CommitError> {
        if let Some(object) = self.find(ctx).await? {
            return Ok(object);
        }

        let binding = Binding {
            object: self.create_object(ctx).await?,
            duplicates: Vec::new(),
        };
        Ok(&self.bind(binding).object)
    }

    /// Look the record up and bind it when the query matches anything
    async fn find(&self, ctx: &HarvestContext) -> Result<Option<&ServiceObject>, CommitError> {
        if let Some(object) = self.bound_object() {
            return Ok(Some(object));
        }

        debug!(query = %self.query, "Trying to get the object from the service");

        let query = ObjectQuery {
            query: self.query.clone(),
            sort: SortOrder::CreatedAscending,
            page_offset: 0,
            page_size: (DUPLICATE_THRESHOLD + 1) as u32,
            expand: Expand::all(),
        };
        let response = ctx
            .client()
            .query_objects(&query)
            .await
            .check("getting the object from the service")?;

        if response.total_count == 0 {
            return Ok(None);
        }

        let binding = select_canonical(&self.query, response.total_count, response.results)?;
        Ok(Some(&self.bind(binding).object))
    }

    async fn create_object(&self, ctx: &HarvestContext) -> Result<ServiceObject, CommitError> {
        let mut response = ctx
            .client()
            .create_object(self.object_type_id, self.folder_id)
            .await
            .check("creating the object in the service")?;

        if response.results.len() != 1 {
            return Err(CommitError::UnexpectedCreateCount {
                count: response.results.len(),
            });
        }

        let object = response.results.remove(0);
        info!(id = %object.id, "Created a new object in the service");
        Ok(object)
    }
}

/// Pick the earliest-created match and keep the rest as duplicates
fn select_canonical(
    query: &str,
    total_count: u64,
    mut results: Vec<ServiceObject>,
) -> Result<Binding, CommitError> {
    let duplicates = total_count - 1;
    if duplicates > DUPLICATE_THRESHOLD {
        return Err(CommitError::TooAmbiguous {
            query: query.to_string(),
            duplicates,
            threshold: DUPLICATE_THRESHOLD,
        });
    }
    if duplicates > 0 {
        warn!(
            query = %query,
            matches = total_count,
            "The query resulted in {} objects. Consider if the query should be more specific.",
            total_count
        );
    }

    if results.is_empty() {
        return Err(ServiceError::MissingResults {
            action: "getting the object from the service",
        }
        .into());
    }

    // Stable, so equal timestamps keep the service's order
    results.sort_by_key(|o| o.creation_timestamp);
    let object = results.remove(0);

    info!(
        id = %object.id,
        created = %object.creation_timestamp.to_rfc2822(),
        "Reusing object from service"
    );

    Ok(Binding {
        object,
        duplicates: results,
    })
}
