#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use harvester::service::memory::InMemoryService;
use harvester::service::{AccessPoint, FileSpec, ServiceFile, ServiceMetadata, ServiceObject};
use harvester::{HarvestContext, ObjectShadow, RuntimeOptions};
use std::sync::Arc;
use tempfile::TempDir;

pub const OBJECT_TYPE: u32 = 36;
pub const FOLDER: u32 = 706;

/// Create a temporary directory for testing
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// A service object created on the given day of January 2024, whose
/// metadata mentions `reference` so queries for it match
pub fn service_object(id: &str, day: u32, reference: &str) -> ServiceObject {
    ServiceObject {
        id: id.to_string(),
        object_type_id: OBJECT_TYPE,
        folder_id: FOLDER,
        creation_timestamp: Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap(),
        access_points: Vec::new(),
        files: Vec::new(),
        metadata: vec![ServiceMetadata {
            schema_id: "ref".to_string(),
            language_code: String::new(),
            revision: 1,
            document: format!("<reference>{}</reference>", reference),
        }],
    }
}

pub fn with_access_points(mut object: ServiceObject, ids: &[&str]) -> ServiceObject {
    object.access_points = ids
        .iter()
        .map(|id| AccessPoint {
            id: id.to_string(),
            start_date: Some(Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap()),
            end_date: None,
        })
        .collect();
    object
}

pub fn file_spec(filename: &str) -> FileSpec {
    FileSpec {
        format_id: 8,
        destination_id: 2,
        filename: filename.to_string(),
        original_filename: filename.to_string(),
        folder_path: "harvest/".to_string(),
    }
}

pub fn with_files(mut object: ServiceObject, files: &[(u64, &str)]) -> ServiceObject {
    object.files = files
        .iter()
        .map(|(id, filename)| ServiceFile {
            id: *id,
            spec: file_spec(filename),
        })
        .collect();
    object
}

/// A shadow looking up `reference`
pub fn shadow(reference: &str) -> ObjectShadow {
    ObjectShadow::new(reference, OBJECT_TYPE, FOLDER)
}

pub fn context(service: &Arc<InMemoryService>) -> HarvestContext {
    context_with(service, RuntimeOptions::default())
}

pub fn context_with(service: &Arc<InMemoryService>, options: RuntimeOptions) -> HarvestContext {
    HarvestContext::new(service.clone(), options)
}
