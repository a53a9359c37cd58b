//! In-process service backed by a JSON snapshot.
//!
//! Queries match an object when the query equals the object ID or occurs as
//! a whole term in any of its metadata documents. Every call is recorded so
//! callers can assert on the exact traffic a commit produced.

use super::{
    AccessPoint, FileSpec, MetadataSchema, ObjectQuery, ServiceClient, ServiceFile,
    ServiceMetadata, ServiceObject, ServiceResponse, SortOrder,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::fs;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Persisted state of the in-memory service
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSnapshot {
    #[serde(default)]
    pub objects: Vec<ServiceObject>,
    #[serde(default)]
    pub schemas: Vec<MetadataSchema>,
    #[serde(default)]
    pub last_file_id: u64,
}

/// Kinds of calls, used for failure injection and counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    QueryObjects,
    CreateObject,
    DeleteFile,
    CreateFile,
    SetPublishSettings,
    SetMetadata,
    GetMetadataSchema,
}

/// Which success flag an injected failure clears
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureLayer {
    Transport,
    Application,
}

/// A recorded call
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceCall {
    QueryObjects {
        query: String,
        page_size: u32,
    },
    CreateObject {
        object_type_id: u32,
        folder_id: u32,
    },
    DeleteFile {
        file_id: u64,
    },
    CreateFile {
        object_id: String,
        filename: String,
    },
    SetPublishSettings {
        object_id: String,
        access_point_id: String,
        start_date: Option<DateTime<Utc>>,
    },
    SetMetadata {
        object_id: String,
        schema_id: String,
    },
    GetMetadataSchema {
        schema_id: String,
    },
}

impl ServiceCall {
    pub fn operation(&self) -> Operation {
        match self {
            ServiceCall::QueryObjects { .. } => Operation::QueryObjects,
            ServiceCall::CreateObject { .. } => Operation::CreateObject,
            ServiceCall::DeleteFile { .. } => Operation::DeleteFile,
            ServiceCall::CreateFile { .. } => Operation::CreateFile,
            ServiceCall::SetPublishSettings { .. } => Operation::SetPublishSettings,
            ServiceCall::SetMetadata { .. } => Operation::SetMetadata,
            ServiceCall::GetMetadataSchema { .. } => Operation::GetMetadataSchema,
        }
    }

    /// Whether the call changes service state
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            ServiceCall::QueryObjects { .. } | ServiceCall::GetMetadataSchema { .. }
        )
    }
}

#[derive(Debug, Default)]
pub struct InMemoryService {
    state: Mutex<ServiceSnapshot>,
    calls: Mutex<Vec<ServiceCall>>,
    failures: Mutex<HashMap<Operation, FailureLayer>>,
    create_result_count: Mutex<Option<usize>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn is_term_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

/// Whether `term` occurs in `text` without running into a neighbouring term
fn contains_term(text: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }

    text.match_indices(term).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + term.len()..].chars().next();
        !before.is_some_and(is_term_char) && !after.is_some_and(is_term_char)
    })
}

impl InMemoryService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: ServiceSnapshot) -> Self {
        Self {
            state: Mutex::new(snapshot),
            ..Self::default()
        }
    }

    /// Load a snapshot file. A missing file yields an empty service.
    pub async fn load(path: &Path) -> Result<Self, SnapshotError> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path).await?;
        let snapshot: ServiceSnapshot = serde_json::from_str(&content)?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Write the current state to a snapshot file
    pub async fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let content = serde_json::to_string_pretty(&self.snapshot())?;
        fs::write(path, content).await?;
        Ok(())
    }

    pub fn snapshot(&self) -> ServiceSnapshot {
        lock(&self.state).clone()
    }

    pub fn insert_object(&self, object: ServiceObject) {
        lock(&self.state).objects.push(object);
    }

    pub fn insert_schema(&self, schema: MetadataSchema) {
        lock(&self.state).schemas.push(schema);
    }

    pub fn object(&self, id: &str) -> Option<ServiceObject> {
        lock(&self.state).objects.iter().find(|o| o.id == id).cloned()
    }

    pub fn objects(&self) -> Vec<ServiceObject> {
        lock(&self.state).objects.clone()
    }

    /// Make every later call of `operation` fail on the given layer
    pub fn fail(&self, operation: Operation, layer: FailureLayer) {
        lock(&self.failures).insert(operation, layer);
    }

    /// Make object creation answer with `count` objects instead of one
    pub fn set_create_result_count(&self, count: usize) {
        *lock(&self.create_result_count) = Some(count);
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        lock(&self.calls).clone()
    }

    pub fn count(&self, operation: Operation) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| c.operation() == operation)
            .count()
    }

    pub fn mutating_calls(&self) -> Vec<ServiceCall> {
        lock(&self.calls)
            .iter()
            .filter(|c| c.is_mutating())
            .cloned()
            .collect()
    }

    /// Record a call and return the injected failure for it, if any
    fn record<T>(&self, call: ServiceCall) -> Option<ServiceResponse<T>> {
        let operation = call.operation();
        lock(&self.calls).push(call);

        match lock(&self.failures).get(&operation) {
            Some(FailureLayer::Transport) => Some(ServiceResponse::transport_failure(format!(
                "injected transport failure for {:?}",
                operation
            ))),
            Some(FailureLayer::Application) => Some(ServiceResponse::application_failure(
                format!("injected application failure for {:?}", operation),
            )),
            None => None,
        }
    }

    fn matches(object: &ServiceObject, query: &str) -> bool {
        object.id == query
            || object
                .metadata
                .iter()
                .any(|m| contains_term(&m.document, query))
    }
}

#[async_trait]
impl ServiceClient for InMemoryService {
    async fn query_objects(&self, query: &ObjectQuery) -> ServiceResponse<ServiceObject> {
        if let Some(failure) = self.record(ServiceCall::QueryObjects {
            query: query.query.clone(),
            page_size: query.page_size,
        }) {
            return failure;
        }

        let state = lock(&self.state);
        let mut matches: Vec<ServiceObject> = state
            .objects
            .iter()
            .filter(|o| Self::matches(o, &query.query))
            .cloned()
            .collect();

        match query.sort {
            SortOrder::CreatedAscending => matches.sort_by_key(|o| o.creation_timestamp),
            SortOrder::CreatedDescending => {
                matches.sort_by_key(|o| std::cmp::Reverse(o.creation_timestamp))
            }
        }

        let total_count = matches.len() as u64;
        let results = matches
            .into_iter()
            .skip(query.page_offset as usize)
            .take(query.page_size as usize)
            .map(|mut o| {
                if !query.expand.metadata {
                    o.metadata.clear();
                }
                if !query.expand.files {
                    o.files.clear();
                }
                if !query.expand.access_points {
                    o.access_points.clear();
                }
                o
            })
            .collect();

        ServiceResponse {
            total_count,
            ..ServiceResponse::ok(results)
        }
    }

    async fn create_object(
        &self,
        object_type_id: u32,
        folder_id: u32,
    ) -> ServiceResponse<ServiceObject> {
        if let Some(failure) = self.record(ServiceCall::CreateObject {
            object_type_id,
            folder_id,
        }) {
            return failure;
        }

        let count = lock(&self.create_result_count).unwrap_or(1);
        let mut state = lock(&self.state);
        let mut created = Vec::with_capacity(count);
        for _ in 0..count {
            let object = ServiceObject {
                id: uuid::Uuid::new_v4().to_string(),
                object_type_id,
                folder_id,
                creation_timestamp: Utc::now(),
                access_points: Vec::new(),
                files: Vec::new(),
                metadata: Vec::new(),
            };
            state.objects.push(object.clone());
            created.push(object);
        }

        ServiceResponse::ok(created)
    }

    async fn delete_file(&self, file_id: u64) -> ServiceResponse<()> {
        if let Some(failure) = self.record(ServiceCall::DeleteFile { file_id }) {
            return failure;
        }

        let mut state = lock(&self.state);
        let owner = state
            .objects
            .iter_mut()
            .find(|o| o.files.iter().any(|f| f.id == file_id));

        match owner {
            Some(object) => {
                object.files.retain(|f| f.id != file_id);
                ServiceResponse::ok(Vec::new())
            }
            None => ServiceResponse::application_failure(format!("File {} not found", file_id)),
        }
    }

    async fn create_file(&self, object_id: &str, spec: &FileSpec) -> ServiceResponse<ServiceFile> {
        if let Some(failure) = self.record(ServiceCall::CreateFile {
            object_id: object_id.to_string(),
            filename: spec.filename.clone(),
        }) {
            return failure;
        }

        let mut state = lock(&self.state);
        let highest = state
            .objects
            .iter()
            .flat_map(|o| o.file_ids())
            .max()
            .unwrap_or_default();
        let id = state.last_file_id.max(highest) + 1;
        let Some(object) = state.objects.iter_mut().find(|o| o.id == object_id) else {
            return ServiceResponse::application_failure(format!(
                "Object {} not found",
                object_id
            ));
        };

        let file = ServiceFile {
            id,
            spec: spec.clone(),
        };
        object.files.push(file.clone());
        state.last_file_id = id;

        ServiceResponse::ok(vec![file])
    }

    async fn set_publish_settings(
        &self,
        object_id: &str,
        access_point_id: &str,
        start_date: Option<DateTime<Utc>>,
    ) -> ServiceResponse<()> {
        if let Some(failure) = self.record(ServiceCall::SetPublishSettings {
            object_id: object_id.to_string(),
            access_point_id: access_point_id.to_string(),
            start_date,
        }) {
            return failure;
        }

        let mut state = lock(&self.state);
        let Some(object) = state.objects.iter_mut().find(|o| o.id == object_id) else {
            return ServiceResponse::application_failure(format!(
                "Object {} not found",
                object_id
            ));
        };

        match object
            .access_points
            .iter_mut()
            .find(|a| a.id == access_point_id)
        {
            Some(access_point) => {
                access_point.start_date = start_date;
                access_point.end_date = None;
            }
            None => object.access_points.push(AccessPoint {
                id: access_point_id.to_string(),
                start_date,
                end_date: None,
            }),
        }

        ServiceResponse::ok(Vec::new())
    }

    async fn set_metadata(
        &self,
        object_id: &str,
        metadata: &ServiceMetadata,
    ) -> ServiceResponse<ServiceMetadata> {
        if let Some(failure) = self.record(ServiceCall::SetMetadata {
            object_id: object_id.to_string(),
            schema_id: metadata.schema_id.clone(),
        }) {
            return failure;
        }

        let mut state = lock(&self.state);
        let Some(object) = state.objects.iter_mut().find(|o| o.id == object_id) else {
            return ServiceResponse::application_failure(format!(
                "Object {} not found",
                object_id
            ));
        };

        let existing = object.metadata.iter_mut().find(|m| {
            m.schema_id == metadata.schema_id && m.language_code == metadata.language_code
        });
        match existing {
            Some(current) if current.revision != metadata.revision => {
                ServiceResponse::application_failure(format!(
                    "Revision mismatch: expected {}, got {}",
                    current.revision, metadata.revision
                ))
            }
            Some(current) => {
                current.document = metadata.document.clone();
                current.revision += 1;
                ServiceResponse::ok(vec![current.clone()])
            }
            None => {
                let stored = ServiceMetadata {
                    revision: 1,
                    ..metadata.clone()
                };
                object.metadata.push(stored.clone());
                ServiceResponse::ok(vec![stored])
            }
        }
    }

    async fn get_metadata_schema(&self, schema_id: &str) -> ServiceResponse<MetadataSchema> {
        if let Some(failure) = self.record(ServiceCall::GetMetadataSchema {
            schema_id: schema_id.to_string(),
        }) {
            return failure;
        }

        let state = lock(&self.state);
        let schemas = state
            .schemas
            .iter()
            .filter(|s| s.id == schema_id)
            .cloned()
            .collect();
        ServiceResponse::ok(schemas)
    }
}
