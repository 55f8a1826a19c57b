//! Schema types
//!
//! Metadata describing record types: their fields, relations and default ordering.

use crate::error::{Error, Result};
use crate::types::FieldType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Fields
// ============================================================================

/// What a field holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// A plain value
    Scalar {
        #[serde(rename = "type")]
        field_type: FieldType,
    },
    /// A reference to at most one record of another model
    ToOne { model: String },
    /// A multi-valued relation (never usable in a key)
    ManyToMany { model: String },
}

impl FieldKind {
    /// Name of the related model, for relations
    pub fn related_model(&self) -> Option<&str> {
        match self {
            Self::Scalar { .. } => None,
            Self::ToOne { model } | Self::ManyToMany { model } => Some(model),
        }
    }

    /// Check if this is a multi-valued relation
    pub fn is_many_to_many(&self) -> bool {
        matches!(self, Self::ManyToMany { .. })
    }
}

/// A field of a model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta {
    /// Field name, as used in key paths
    pub name: String,

    /// Whether the field can be null
    #[serde(default)]
    pub nullable: bool,

    /// Field kind
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldMeta {
    /// Create a scalar field
    pub fn scalar(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            nullable: false,
            kind: FieldKind::Scalar { field_type },
        }
    }

    /// Create a to-one relation (foreign key)
    pub fn to_one(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nullable: false,
            kind: FieldKind::ToOne {
                model: model.into(),
            },
        }
    }

    /// Create a many-to-many relation
    pub fn many_to_many(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nullable: false,
            kind: FieldKind::ManyToMany {
                model: model.into(),
            },
        }
    }

    /// Mark the field as nullable
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

// ============================================================================
// Models
// ============================================================================

/// A record type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMeta {
    /// Model name
    pub name: String,

    /// Default ordering; the first entry extends keys ending on a relation to this model
    #[serde(default)]
    pub ordering: Vec<String>,

    /// Fields
    #[serde(default)]
    pub fields: Vec<FieldMeta>,
}

impl ModelMeta {
    /// Create a model without fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ordering: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Add a field
    #[must_use]
    pub fn with_field(mut self, field: FieldMeta) -> Self {
        self.fields.push(field);
        self
    }

    /// Set the default ordering
    #[must_use]
    pub fn with_ordering<I, S>(mut self, ordering: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ordering = ordering.into_iter().map(Into::into).collect();
        self
    }

    /// Get a field by name
    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// First ordering field, without its direction marker
    pub fn default_ordering(&self) -> Option<&str> {
        self.ordering
            .first()
            .map(|field| field.strip_prefix('-').unwrap_or(field))
            .filter(|field| !field.is_empty())
    }
}

// ============================================================================
// Schema
// ============================================================================

/// Registry of the models keys can be resolved against
///
/// Built explicitly and passed by reference; there is no global registry.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    models: BTreeMap<String, ModelMeta>,
}

impl Schema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a schema and check that every relation points to a known model
    pub fn from_models(models: impl IntoIterator<Item = ModelMeta>) -> Result<Self> {
        let mut schema = Self::new();
        for model in models {
            schema.register(model)?;
        }
        schema.validate()?;
        Ok(schema)
    }

    /// Register a model
    pub fn register(&mut self, model: ModelMeta) -> Result<()> {
        if model.name.is_empty() {
            return Err(Error::config("Model name cannot be empty"));
        }
        if self.models.contains_key(&model.name) {
            return Err(Error::config(format!(
                "Model \"{}\" is registered twice",
                model.name
            )));
        }
        self.models.insert(model.name.clone(), model);
        Ok(())
    }

    /// Get a model by name
    pub fn model(&self, name: &str) -> Result<&ModelMeta> {
        self.models
            .get(name)
            .ok_or_else(|| Error::config(format!("Unknown model \"{name}\"")))
    }

    /// Iterate over registered models
    pub fn models(&self) -> impl Iterator<Item = &ModelMeta> {
        self.models.values()
    }

    /// Number of registered models
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Check if no model is registered
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Check that relation targets and orderings refer to known models and fields
    pub fn validate(&self) -> Result<()> {
        for model in self.models.values() {
            for field in &model.fields {
                if let Some(target) = field.kind.related_model() {
                    if !self.models.contains_key(target) {
                        return Err(Error::config(format!(
                            "Field \"{}.{}\" refers to unknown model \"{}\"",
                            model.name, field.name, target
                        )));
                    }
                }
            }

            if let Some(ordering) = model.default_ordering() {
                if model.field(ordering).is_none() {
                    return Err(Error::config(format!(
                        "Model \"{}\" is ordered by unknown field \"{}\"",
                        model.name, ordering
                    )));
                }
            }
        }
        Ok(())
    }
}
