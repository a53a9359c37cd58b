//! Metadata processing gate.
//!
//! A [`MetadataProcessor`] turns an external object into a metadata document
//! for one schema and attaches it to the object shadow. When validation is
//! enabled, a document that fails schema validation is not attached and the
//! shadow is left untouched; the caller sees this as
//! [`MetadataOutcome::ValidationFailed`] rather than an error.

mod template;

pub use template::TemplateMetadataGenerator;

use crate::reconciliation::HarvestContext;
use crate::shadow::{MetadataShadow, ObjectShadow};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to fetch metadata schema '{schema_id}': {reason}")]
    SchemaFetch { schema_id: String, reason: String },

    #[error("Validation is enabled but schema '{0}' has not been fetched")]
    SchemaNotFetched(String),

    #[error("Validation is enabled but no schema validator is configured")]
    NoValidator,

    #[error("Metadata generation failed: {0}")]
    Generation(String),

    #[error("Template error: {0}")]
    TemplateError(#[from] handlebars::TemplateError),

    #[error("Render error: {0}")]
    RenderError(#[from] handlebars::RenderError),
}

/// Produces a metadata document for an external object
pub trait MetadataGenerator<E>: Send + Sync {
    fn generate(&self, external: &E, shadow: &ObjectShadow) -> Result<String, ProcessorError>;
}

/// Checks a document against a schema source
pub trait SchemaValidator: Send + Sync {
    /// Returns the reason on failure
    fn validate(&self, schema_source: &str, document: &str) -> Result<(), String>;
}

/// What the gate did with a generated document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataOutcome {
    Attached,
    ValidationFailed(String),
}

pub struct MetadataProcessor<G> {
    schema_id: String,
    schema_source: Option<String>,
    language_code: String,
    validate: bool,
    generator: G,
    validator: Option<Box<dyn SchemaValidator>>,
}

impl<G> MetadataProcessor<G> {
    pub fn new(schema_id: impl Into<String>, generator: G) -> Self {
        Self {
            schema_id: schema_id.into(),
            schema_source: None,
            language_code: String::new(),
            validate: false,
            generator,
            validator: None,
        }
    }

    pub fn with_language(mut self, language_code: impl Into<String>) -> Self {
        self.language_code = language_code.into();
        self
    }

    /// Install a validator and turn validation on
    pub fn with_validator(mut self, validator: impl SchemaValidator + 'static) -> Self {
        self.validator = Some(Box::new(validator));
        self.validate = true;
        self
    }

    pub fn set_validate(&mut self, validate: bool) {
        self.validate = validate;
    }

    pub fn schema_source(&self) -> Option<&str> {
        self.schema_source.as_deref()
    }

    /// Fetch the schema source from the service
    pub async fn fetch_schema(&mut self, ctx: &HarvestContext) -> Result<(), ProcessorError> {
        debug!(schema = %self.schema_id, "Fetching schema");

        let response = ctx
            .client()
            .get_metadata_schema(&self.schema_id)
            .await
            .check("fetching a metadata schema")
            .map_err(|e| ProcessorError::SchemaFetch {
                schema_id: self.schema_id.clone(),
                reason: e.to_string(),
            })?;

        let schema = response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| ProcessorError::SchemaFetch {
                schema_id: self.schema_id.clone(),
                reason: "the service returned no schema".to_string(),
            })?;

        self.schema_source = Some(schema.source);
        Ok(())
    }

    /// Generate a document for `external` and attach it to `shadow`,
    /// unless validation is on and the document fails it
    pub fn process<E>(
        &self,
        external: &E,
        shadow: &mut ObjectShadow,
    ) -> Result<MetadataOutcome, ProcessorError>
    where
        G: MetadataGenerator<E>,
    {
        debug!(schema = %self.schema_id, "Metadata processor is processing");

        let document = self.generator.generate(external, shadow)?;

        if self.validate {
            let schema_source = self
                .schema_source
                .as_deref()
                .ok_or_else(|| ProcessorError::SchemaNotFetched(self.schema_id.clone()))?;
            let validator = self.validator.as_ref().ok_or(ProcessorError::NoValidator)?;

            if let Err(reason) = validator.validate(schema_source, &document) {
                debug!(
                    schema = %self.schema_id,
                    reason = %reason,
                    "Generated metadata failed validation, not attaching it"
                );
                return Ok(MetadataOutcome::ValidationFailed(reason));
            }
        }

        shadow.metadata_shadows.push(MetadataShadow {
            schema_id: self.schema_id.clone(),
            language_code: self.language_code.clone(),
            document,
        });
        Ok(MetadataOutcome::Attached)
    }
}
