//! Contract for the remote content-management service.
//!
//! The reconciliation engine only talks to the service through
//! [`ServiceClient`]. Every response carries two independent success flags:
//! one for the transport layer and one for the service application itself.
//! Both have to be checked before results are trusted.

pub mod memory;
mod types;

pub use types::{
    AccessPoint, Expand, FileSpec, MetadataSchema, ObjectQuery, ServiceFile, ServiceMetadata,
    ServiceObject, SortOrder,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("General error when {action}: {message}")]
    Transport { action: &'static str, message: String },

    #[error("Service error when {action}: {message}")]
    Application { action: &'static str, message: String },

    #[error("The service reported matches when {action} but returned no results")]
    MissingResults { action: &'static str },
}

/// Outcome of one layer of a service call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Success,
    Failure(String),
}

impl Status {
    pub fn is_success(&self) -> bool {
        matches!(self, Status::Success)
    }
}

/// A response from the service
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceResponse<T> {
    pub transport: Status,
    pub application: Status,
    /// Total number of matching records, which may exceed `results.len()`
    pub total_count: u64,
    pub results: Vec<T>,
}

impl<T> ServiceResponse<T> {
    /// A successful response whose total count is the number of results
    pub fn ok(results: Vec<T>) -> Self {
        Self {
            transport: Status::Success,
            application: Status::Success,
            total_count: results.len() as u64,
            results,
        }
    }

    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self {
            transport: Status::Failure(message.into()),
            application: Status::Success,
            total_count: 0,
            results: Vec::new(),
        }
    }

    pub fn application_failure(message: impl Into<String>) -> Self {
        Self {
            transport: Status::Success,
            application: Status::Failure(message.into()),
            total_count: 0,
            results: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.transport.is_success() && self.application.is_success()
    }

    /// Check both success flags, transport first.
    ///
    /// `action` names the call in the resulting error, e.g. "getting the object".
    pub fn check(self, action: &'static str) -> Result<Self, ServiceError> {
        if let Status::Failure(message) = &self.transport {
            return Err(ServiceError::Transport {
                action,
                message: message.clone(),
            });
        }
        if let Status::Failure(message) = &self.application {
            return Err(ServiceError::Application {
                action,
                message: message.clone(),
            });
        }
        Ok(self)
    }
}

/// Operations consumed from the remote service.
///
/// Implementations must be safe to share between tasks; the engine never
/// relies on connection affinity.
#[async_trait]
pub trait ServiceClient: Send + Sync {
    /// Look up objects matching a query
    async fn query_objects(&self, query: &ObjectQuery) -> ServiceResponse<ServiceObject>;

    /// Create an empty object. Exactly one result is expected.
    async fn create_object(&self, object_type_id: u32, folder_id: u32)
        -> ServiceResponse<ServiceObject>;

    /// Delete a file from whatever object it is attached to
    async fn delete_file(&self, file_id: u64) -> ServiceResponse<()>;

    /// Create a file on an object
    async fn create_file(&self, object_id: &str, spec: &FileSpec) -> ServiceResponse<ServiceFile>;

    /// Set the publication window of an object on an access point.
    /// A `start_date` of `None` unpublishes the object from it.
    async fn set_publish_settings(
        &self,
        object_id: &str,
        access_point_id: &str,
        start_date: Option<DateTime<Utc>>,
    ) -> ServiceResponse<()>;

    /// Write a metadata document on an object. `metadata.revision` must be
    /// the revision being replaced, or 0 for a new document. The stored
    /// document is returned with its new revision.
    async fn set_metadata(
        &self,
        object_id: &str,
        metadata: &ServiceMetadata,
    ) -> ServiceResponse<ServiceMetadata>;

    /// Fetch a metadata schema by ID
    async fn get_metadata_schema(&self, schema_id: &str) -> ServiceResponse<MetadataSchema>;
}
