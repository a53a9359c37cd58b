use super::Shadow;
use crate::reconciliation::{CommitError, HarvestContext};
use crate::service::{FileSpec, ServiceObject};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One file pending attachment or reuse
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileShadow {
    #[serde(flatten)]
    pub spec: FileSpec,

    #[serde(skip)]
    file_id: Option<u64>,
}

impl FileShadow {
    pub fn new(spec: FileSpec) -> Self {
        Self {
            spec,
            file_id: None,
        }
    }

    /// The service file ID, available after a successful commit
    pub fn file_id(&self) -> Option<u64> {
        self.file_id
    }
}

/// Outcome of committing one file shadow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileCommitStatus {
    Reused(u64),
    Created(u64),
    Failed(String),
}

impl FileCommitStatus {
    fn symbol(&self) -> char {
        match self {
            FileCommitStatus::Reused(_) => '.',
            FileCommitStatus::Created(_) => '+',
            FileCommitStatus::Failed(_) => '?',
        }
    }
}

/// File outcomes of one object commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSummary {
    pub statuses: Vec<FileCommitStatus>,
    /// Orphaned files removed from the object
    pub deleted: Vec<u64>,
}

impl FileSummary {
    pub fn reused(&self) -> usize {
        self.count(|s| matches!(s, FileCommitStatus::Reused(_)))
    }

    pub fn created(&self) -> usize {
        self.count(|s| matches!(s, FileCommitStatus::Created(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, FileCommitStatus::Failed(_)))
    }

    fn count(&self, predicate: impl Fn(&FileCommitStatus) -> bool) -> usize {
        self.statuses.iter().filter(|s| predicate(s)).count()
    }

    /// One symbol per file: `.` reused, `+` created, `?` failed, `-` deleted
    pub fn line(&self) -> String {
        self.statuses
            .iter()
            .map(FileCommitStatus::symbol)
            .chain(self.deleted.iter().map(|_| '-'))
            .collect()
    }
}

#[async_trait]
impl Shadow for FileShadow {
    type Output = FileCommitStatus;

    async fn commit(
        &mut self,
        ctx: &HarvestContext,
        parent: Option<&ServiceObject>,
    ) -> Result<FileCommitStatus, CommitError> {
        let object = parent.ok_or(CommitError::MissingParent("file"))?;

        if let Some(existing) = object.files.iter().find(|f| f.spec.same_location(&self.spec)) {
            self.file_id = Some(existing.id);
            return Ok(FileCommitStatus::Reused(existing.id));
        }

        let response = ctx.client().create_file(&object.id, &self.spec).await;
        let created = match response.check("creating a file") {
            Ok(mut response) if !response.results.is_empty() => response.results.remove(0),
            Ok(_) => {
                warn!(object = %object.id, file = %self.spec.filename, "File create returned no file");
                return Ok(FileCommitStatus::Failed(
                    "the service returned no file".to_string(),
                ));
            }
            Err(e) => {
                warn!(object = %object.id, file = %self.spec.filename, error = %e, "File create failed");
                return Ok(FileCommitStatus::Failed(e.to_string()));
            }
        };

        self.file_id = Some(created.id);
        Ok(FileCommitStatus::Created(created.id))
    }
}
