pub mod batch;
pub mod config;
pub mod processor;
pub mod reconciliation;
pub mod service;
pub mod shadow;
pub mod utils;

// Re-export commonly used types
pub use batch::{run_batch, BatchReport, FailedShadow};
pub use config::{read_config, write_config, ConfigError, HarvesterConfig, RuntimeOptions};
pub use processor::{
    MetadataGenerator, MetadataOutcome, MetadataProcessor, ProcessorError, SchemaValidator,
    TemplateMetadataGenerator,
};
pub use reconciliation::{CommitError, HarvestContext, DUPLICATE_THRESHOLD};
pub use service::memory::{InMemoryService, ServiceSnapshot};
pub use service::{ServiceClient, ServiceError, ServiceObject, ServiceResponse};
pub use shadow::{FileShadow, MetadataShadow, ObjectShadow, Shadow};
