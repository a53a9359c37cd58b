//! Maps object shadows onto service records.
//!
//! Resolution (`ObjectShadow::get`) finds or creates the backing record and
//! refuses to guess when a query matches too many. Commit cascades to
//! metadata, files and related objects, removes orphaned files, and then
//! applies publication state.

mod commit;
mod publish;
mod resolve;

pub use publish::publish_start_date;

use crate::config::RuntimeOptions;
use crate::service::{ServiceClient, ServiceError};
use std::sync::Arc;
use thiserror::Error;

/// How many extra matches a query may return before it is considered too
/// ambiguous to resolve automatically.
pub const DUPLICATE_THRESHOLD: u64 = 3;

#[derive(Error, Debug)]
pub enum CommitError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("{duplicates} duplicate objects is too many (> {threshold}). The query '{query}' is way too ambiguous.")]
    TooAmbiguous {
        query: String,
        duplicates: u64,
        threshold: u64,
    },

    #[error("The service didn't respond with a single object when creating it (got {count})")]
    UnexpectedCreateCount { count: usize },

    #[error("Committing related objects has not yet been implemented")]
    RelatedObjectsUnsupported,

    #[error("A {0} shadow can only be committed against a resolved object")]
    MissingParent(&'static str),
}

impl CommitError {
    /// Whether the failure was reported by the service rather than decided locally
    pub fn is_service_error(&self) -> bool {
        matches!(self, CommitError::Service(_))
    }
}

/// Capabilities threaded through every commit
#[derive(Clone)]
pub struct HarvestContext {
    client: Arc<dyn ServiceClient>,
    options: RuntimeOptions,
}

impl HarvestContext {
    pub fn new(client: Arc<dyn ServiceClient>, options: RuntimeOptions) -> Self {
        Self { client, options }
    }

    pub fn client(&self) -> &dyn ServiceClient {
        self.client.as_ref()
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }
}
