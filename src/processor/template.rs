use super::{MetadataGenerator, ProcessorError};
use crate::shadow::ObjectShadow;
use handlebars::Handlebars;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

const TEMPLATE_NAME: &str = "metadata";

#[derive(Serialize)]
struct RenderContext<'a, E> {
    object: &'a E,
    extras: &'a HashMap<String, String>,
}

/// Renders metadata documents from a Handlebars template.
///
/// The template sees the external object as `object` and the shadow's
/// extras as `extras`. Output is escaped, so values are safe to place in
/// XML text and attributes.
pub struct TemplateMetadataGenerator {
    handlebars: Handlebars<'static>,
}

impl TemplateMetadataGenerator {
    pub fn new(template: &str) -> Result<Self, ProcessorError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_template_string(TEMPLATE_NAME, template)?;
        Ok(Self { handlebars })
    }

    /// Load the template from disk
    pub async fn from_file(path: &Path) -> Result<Self, ProcessorError> {
        let template = fs::read_to_string(path).await?;
        Self::new(&template)
    }
}

impl<E: Serialize> MetadataGenerator<E> for TemplateMetadataGenerator {
    fn generate(&self, external: &E, shadow: &ObjectShadow) -> Result<String, ProcessorError> {
        let context = RenderContext {
            object: external,
            extras: &shadow.extras,
        };
        Ok(self.handlebars.render(TEMPLATE_NAME, &context)?)
    }
}
