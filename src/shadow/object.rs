use super::{FileShadow, FileSummary, MetadataShadow};
use crate::service::ServiceObject;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// The service records an object shadow resolved to
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Binding {
    pub object: ServiceObject,
    /// Records matching the same query that were not selected
    pub duplicates: Vec<ServiceObject>,
}

/// Staging record for one external object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectShadow {
    /// Lookup expression identifying the candidate service record
    pub query: String,
    pub folder_id: u32,
    pub object_type_id: u32,
    #[serde(default)]
    pub skipped: bool,
    /// When skipped, also clear every access point the object reports
    #[serde(default)]
    pub unpublish_everywhere: bool,
    #[serde(default)]
    pub publish_accesspoint_ids: BTreeSet<String>,
    #[serde(default)]
    pub unpublish_accesspoint_ids: BTreeSet<String>,
    /// Scratch space shared between processing stages
    #[serde(default)]
    pub extras: HashMap<String, String>,
    #[serde(default)]
    pub metadata_shadows: Vec<MetadataShadow>,
    #[serde(default)]
    pub file_shadows: Vec<FileShadow>,
    #[serde(default)]
    pub related_object_shadows: Vec<ObjectShadow>,

    #[serde(skip)]
    binding: OnceCell<Binding>,
    #[serde(skip)]
    file_summary: Option<FileSummary>,
}

impl ObjectShadow {
    pub fn new(query: impl Into<String>, object_type_id: u32, folder_id: u32) -> Self {
        Self {
            query: query.into(),
            object_type_id,
            folder_id,
            ..Self::default()
        }
    }

    /// The matched or created service record, once resolved
    pub fn bound_object(&self) -> Option<&ServiceObject> {
        self.binding.get().map(|b| &b.object)
    }

    pub fn duplicate_objects(&self) -> &[ServiceObject] {
        self.binding
            .get()
            .map(|b| b.duplicates.as_slice())
            .unwrap_or_default()
    }

    /// Bind the shadow. A shadow binds at most once; later calls return
    /// the first binding unchanged.
    pub(crate) fn bind(&self, binding: Binding) -> &Binding {
        self.binding.get_or_init(|| binding)
    }

    /// File outcomes of the last non-skipped commit
    pub fn file_summary(&self) -> Option<&FileSummary> {
        self.file_summary.as_ref()
    }

    pub(crate) fn set_file_summary(&mut self, summary: FileSummary) {
        self.file_summary = Some(summary);
    }
}

impl fmt::Display for ObjectShadow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bound_object() {
            Some(object) if !object.id.is_empty() => write!(f, "{}", object.id),
            _ if !self.query.is_empty() => write!(f, "[object found from {}]", self.query),
            _ => Ok(()),
        }
    }
}
