//! Format types: which elements map to which named formats.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

fn name_pattern() -> &'static Regex {
    static NAME_REGEX: OnceLock<Regex> = OnceLock::new();
    NAME_REGEX.get_or_init(|| {
        Regex::new(r"^[a-z][a-z0-9-]*/[a-z][a-z0-9-]*$").expect("Invalid format name regex")
    })
}

fn class_pattern() -> &'static Regex {
    static CLASS_REGEX: OnceLock<Regex> = OnceLock::new();
    CLASS_REGEX
        .get_or_init(|| Regex::new(r"^[_a-zA-Z]+[a-zA-Z0-9_-]*$").expect("Invalid class regex"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatType {
    /// Namespaced name, e.g. `core/bold`.
    pub name: String,
    pub title: String,
    pub tag_name: String,
    /// Formats with a class only match elements carrying it.
    #[serde(default)]
    pub class_name: Option<String>,
    /// Format attribute key → markup attribute name.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Non-editable formats collapse to one object character.
    #[serde(default = "default_editable")]
    pub editable: bool,
    #[serde(default)]
    pub namespace: Option<String>,
}

fn default_editable() -> bool {
    true
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error(
        "Format names must contain a namespace prefix, include only lowercase alphanumeric characters or dashes, and start with a letter. Example: my-plugin/my-custom-format (got {0:?})"
    )]
    InvalidName(String),

    #[error("Format {0:?} is already registered.")]
    AlreadyRegistered(String),

    #[error("Format tag names must be a non-empty string (format {0:?}).")]
    MissingTagName(String),

    #[error(
        "A class name must begin with a letter, followed by any number of hyphens, letters, or numbers (got {0:?})."
    )]
    InvalidClassName(String),

    #[error("Format {existing:?} is already registered to handle class name {class_name:?}.")]
    ClassNameTaken {
        existing: String,
        class_name: String,
    },

    #[error("Format {existing:?} is already registered to handle bare tag name {tag_name:?}.")]
    BareTagTaken { existing: String, tag_name: String },

    #[error("The format {0:?} must have a title.")]
    MissingTitle(String),

    #[error("Format {0:?} is not registered.")]
    NotRegistered(String),
}

#[derive(Debug, Clone, Default)]
pub struct FormatRegistry {
    types: Vec<FormatType>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a format type, logging the reason when it is rejected.
    pub fn register(&mut self, format_type: FormatType) -> Option<&FormatType> {
        match self.try_register(format_type) {
            Ok(registered) => {
                log::debug!("registered format type {}", registered.name);
                Some(registered)
            }
            Err(err) => {
                log::error!("{err}");
                None
            }
        }
    }

    /// Like [`register`](Self::register), but hands the reason back.
    pub fn try_register(&mut self, format_type: FormatType) -> Result<&FormatType, RegistryError> {
        self.validate(&format_type)?;
        let index = self.types.len();
        self.types.push(format_type);
        Ok(&self.types[index])
    }

    fn validate(&self, format_type: &FormatType) -> Result<(), RegistryError> {
        let name = &format_type.name;
        if !name_pattern().is_match(name) {
            return Err(RegistryError::InvalidName(name.clone()));
        }
        if self.get_format_type(name).is_some() {
            return Err(RegistryError::AlreadyRegistered(name.clone()));
        }
        if format_type.tag_name.is_empty() {
            return Err(RegistryError::MissingTagName(name.clone()));
        }
        match &format_type.class_name {
            Some(class_name) => {
                if !class_pattern().is_match(class_name) {
                    return Err(RegistryError::InvalidClassName(class_name.clone()));
                }
                if let Some(existing) = self
                    .types
                    .iter()
                    .find(|t| t.class_name.as_deref() == Some(class_name))
                {
                    return Err(RegistryError::ClassNameTaken {
                        existing: existing.name.clone(),
                        class_name: class_name.clone(),
                    });
                }
            }
            None => {
                if let Some(existing) =
                    self.get_format_type_for_bare_element(&format_type.tag_name)
                {
                    return Err(RegistryError::BareTagTaken {
                        existing: existing.name.clone(),
                        tag_name: format_type.tag_name.clone(),
                    });
                }
            }
        }
        if format_type.title.is_empty() {
            return Err(RegistryError::MissingTitle(name.clone()));
        }
        Ok(())
    }

    /// Remove a format type, logging when it was never registered.
    pub fn unregister(&mut self, name: &str) -> Option<FormatType> {
        match self.types.iter().position(|t| t.name == name) {
            Some(index) => Some(self.types.remove(index)),
            None => {
                log::error!("{}", RegistryError::NotRegistered(name.to_string()));
                None
            }
        }
    }

    pub fn get_format_type(&self, name: &str) -> Option<&FormatType> {
        self.types.iter().find(|t| t.name == name)
    }

    /// The format whose class appears among the whitespace-separated tokens.
    pub fn get_format_type_for_class_name(&self, class: &str) -> Option<&FormatType> {
        self.types.iter().find(|t| {
            t.class_name
                .as_deref()
                .is_some_and(|name| class.split_whitespace().any(|token| token == name))
        })
    }

    /// The class-less format for a tag.
    pub fn get_format_type_for_bare_element(&self, tag_name: &str) -> Option<&FormatType> {
        self.types
            .iter()
            .find(|t| t.class_name.is_none() && t.tag_name == tag_name)
    }

    pub fn format_types(&self) -> &[FormatType] {
        &self.types
    }
}
