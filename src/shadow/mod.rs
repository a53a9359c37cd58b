//! In-memory staging representations of entities pending synchronization.
//!
//! Upstream processors build an [`ObjectShadow`] tree, and a single commit
//! pass then makes the service match it. Children are owned by value, so a
//! shadow tree can never contain a cycle.

mod file;
mod metadata;
mod object;

pub use file::{FileCommitStatus, FileShadow, FileSummary};
pub use metadata::{MetadataCommitStatus, MetadataShadow};
pub(crate) use object::Binding;
pub use object::ObjectShadow;

use crate::reconciliation::{CommitError, HarvestContext};
use crate::service::ServiceObject;
use async_trait::async_trait;

/// An entity that can be committed to the service.
#[async_trait]
pub trait Shadow: Send + Sync {
    type Output: Send;

    /// Commit the shadow. `parent` is the service object the owning shadow
    /// resolved to, or `None` for a top-level shadow.
    async fn commit(
        &mut self,
        ctx: &HarvestContext,
        parent: Option<&ServiceObject>,
    ) -> Result<Self::Output, CommitError>;
}
