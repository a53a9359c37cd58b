use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An object record as reported by the service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceObject {
    pub id: String,
    pub object_type_id: u32,
    pub folder_id: u32,
    pub creation_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub access_points: Vec<AccessPoint>,
    #[serde(default)]
    pub files: Vec<ServiceFile>,
    #[serde(default)]
    pub metadata: Vec<ServiceMetadata>,
}

impl ServiceObject {
    /// IDs of every file currently attached to the object
    pub fn file_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.files.iter().map(|f| f.id)
    }

    /// Find attached metadata for a schema and language
    pub fn find_metadata(&self, schema_id: &str, language_code: &str) -> Option<&ServiceMetadata> {
        self.metadata
            .iter()
            .find(|m| m.schema_id == schema_id && m.language_code == language_code)
    }

    /// Insert `metadata`, replacing any entry for the same schema and language
    pub fn replace_metadata(&mut self, metadata: ServiceMetadata) {
        match self.metadata.iter_mut().find(|m| {
            m.schema_id == metadata.schema_id && m.language_code == metadata.language_code
        }) {
            Some(current) => *current = metadata,
            None => self.metadata.push(metadata),
        }
    }
}

/// Publication window of an object on one access point
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccessPoint {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

/// A file attached to an object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceFile {
    pub id: u64,
    #[serde(flatten)]
    pub spec: FileSpec,
}

/// The identifying attributes of a file, as sent on creation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileSpec {
    pub format_id: u32,
    pub destination_id: u32,
    pub filename: String,
    #[serde(default)]
    pub original_filename: String,
    #[serde(default)]
    pub folder_path: String,
}

impl FileSpec {
    /// Whether two specs address the same stored file.
    /// The original filename is informational and not compared.
    pub fn same_location(&self, other: &FileSpec) -> bool {
        self.format_id == other.format_id
            && self.destination_id == other.destination_id
            && self.filename == other.filename
            && self.folder_path == other.folder_path
    }
}

/// A metadata document attached to an object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMetadata {
    pub schema_id: String,
    #[serde(default)]
    pub language_code: String,
    pub revision: u32,
    pub document: String,
}

/// A metadata schema known to the service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetadataSchema {
    pub id: String,
    pub name: String,
    pub source: String,
}

/// Ordering requested from an object query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    CreatedAscending,
    CreatedDescending,
}

/// Which related sub-resources the service should include in query results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Expand {
    pub metadata: bool,
    pub files: bool,
    pub access_points: bool,
}

impl Expand {
    pub fn all() -> Self {
        Self {
            metadata: true,
            files: true,
            access_points: true,
        }
    }
}

/// A paged object lookup
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectQuery {
    pub query: String,
    pub sort: SortOrder,
    pub page_offset: u32,
    pub page_size: u32,
    pub expand: Expand,
}
