//! Static catalog of project templates

use crate::error::{Error, Result};

/// A reusable project skeleton hosted as `<author>/<name>` on GitHub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub id: String,
    pub author: String,
    pub name: String,
    pub description: String,
}

impl Template {
    pub fn new(id: &str, description: &str) -> Result<Self> {
        let (author, name) = Self::parse_id(id)?;
        Ok(Self {
            id: id.to_string(),
            author: author.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        })
    }

    /// Split an id into `(author, name)`; both segments must be non-empty
    pub fn parse_id(id: &str) -> Result<(&str, &str)> {
        let mut parts = id.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(author), Some(name), None) if !author.is_empty() && !name.is_empty() => {
                Ok((author, name))
            }
            _ => Err(Error::InvalidTemplateId(id.to_string())),
        }
    }
}

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        "blefnk/relivator",
        "Full-featured Next.js e-commerce starter with auth, database and payments",
    ),
    (
        "blefnk/next-react-ts-src-minimal",
        "Minimal Next.js + React + TypeScript starter with a src/ layout",
    ),
];

/// Lookup table of available templates, immutable at runtime
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: Vec<Template>,
}

impl TemplateRegistry {
    /// The templates shipped with the CLI
    pub fn builtin() -> Self {
        let templates = BUILTIN_TEMPLATES
            .iter()
            .filter_map(|(id, desc)| Template::new(id, desc).ok())
            .collect();
        Self { templates }
    }

    pub fn from_templates(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    pub fn find(&self, id: &str) -> Result<&Template> {
        self.templates
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::TemplateNotFound(id.to_string()))
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }
}
