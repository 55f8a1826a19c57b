//! Key path resolution
//!
//! Turns a key such as `-user.username` into a validated [`SortKey`].

use super::types::{FieldKind, FieldMeta, Schema};
use crate::error::{Error, Result};
use crate::types::FieldType;
use std::fmt;

/// Separator between the segments of a key path
pub const PATH_SEPARATOR: char = '.';

// ============================================================================
// Key Path
// ============================================================================

/// Field path from a record to a key value, e.g. `user.username`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    /// Parse a dotted path
    pub fn parse(path: &str) -> Result<Self> {
        let segments: Vec<String> = path.split(PATH_SEPARATOR).map(str::to_string).collect();

        if segments.iter().any(String::is_empty) {
            return Err(Error::config(format!("Invalid key path \"{path}\"")));
        }

        Ok(Self(segments))
    }

    /// Path segments, from the record outwards
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; a parsed path has at least one segment
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Extend the path by one segment
    #[must_use]
    pub fn join(&self, segment: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        Self(segments)
    }

    /// Check if the path is exactly the given dotted string
    pub fn matches(&self, dotted: &str) -> bool {
        let mut parts = dotted.split(PATH_SEPARATOR);
        self.0.iter().all(|s| parts.next() == Some(s.as_str())) && parts.next().is_none()
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{PATH_SEPARATOR}")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

// ============================================================================
// Field Info
// ============================================================================

/// The fields traversed by a key path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    path: KeyPath,
    fields: Vec<FieldMeta>,
}

impl FieldInfo {
    /// Resolve a path against a model of the schema
    pub fn resolve(schema: &Schema, model: &str, path: &KeyPath) -> Result<Self> {
        let mut current = schema.model(model)?;
        let mut fields = Vec::with_capacity(path.len());
        let last = path.len().saturating_sub(1);

        for (i, segment) in path.segments().iter().enumerate() {
            let field = current.field(segment).ok_or_else(|| {
                Error::config(format!(
                    "Invalid key: model \"{}\" has no field \"{}\"",
                    current.name, segment
                ))
            })?;
            fields.push(field.clone());

            if i < last {
                current = match field.kind.related_model() {
                    Some(target) => schema.model(target)?,
                    None => {
                        return Err(Error::config(format!(
                            "Invalid key: \"{path}\" goes through \"{segment}\", which is not a relation"
                        )))
                    }
                };
            }
        }

        Ok(Self {
            path: path.clone(),
            fields,
        })
    }

    /// The resolved path
    pub fn path(&self) -> &KeyPath {
        &self.path
    }

    /// Traversed fields, in path order
    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    /// The field at the end of the path
    pub fn last(&self) -> &FieldMeta {
        // resolve() produces one field per segment and paths are never empty
        &self.fields[self.fields.len() - 1]
    }

    /// Check if any traversed field is nullable
    pub fn is_nullable(&self) -> bool {
        self.fields.iter().any(|f| f.nullable)
    }

    /// Check if any traversed field is a many-to-many relation
    pub fn has_many_to_many(&self) -> bool {
        self.fields.iter().any(|f| f.kind.is_many_to_many())
    }
}

// ============================================================================
// Sort Key
// ============================================================================

/// A validated pagination key
///
/// Keys ending on a to-one relation are extended with the related model's
/// default ordering, so the effective path always ends on a scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    key: String,
    info: FieldInfo,
    reverse_order: bool,
    field_type: FieldType,
}

impl SortKey {
    /// Resolve `key` against `model`; a leading `-` means descending order
    pub fn resolve(schema: &Schema, model: &str, key: &str) -> Result<Self> {
        let (attr_name, reverse_order) = match key.strip_prefix('-') {
            Some(attr_name) => (attr_name, true),
            None => (key, false),
        };

        let mut path = KeyPath::parse(attr_name)?;
        let mut visited: Vec<String> = Vec::new();

        loop {
            let info = FieldInfo::resolve(schema, model, &path)?;

            if info.has_many_to_many() {
                return Err(Error::config(
                    "Invalid key: many-to-many fields cannot be used as key",
                ));
            }

            let target = match &info.last().kind {
                FieldKind::Scalar { field_type } => {
                    let field_type = *field_type;
                    return Ok(Self {
                        key: key.to_string(),
                        info,
                        reverse_order,
                        field_type,
                    });
                }
                FieldKind::ToOne { model } | FieldKind::ManyToMany { model } => model.clone(),
            };

            if visited.contains(&target) {
                return Err(Error::config(format!(
                    "Invalid key: default orderings of related models loop back to \"{target}\""
                )));
            }

            let related = schema.model(&target)?;
            let ordering = related.default_ordering().ok_or_else(|| {
                Error::config(format!(
                    "Invalid key: related model \"{target}\" should declare a default ordering"
                ))
            })?;

            path = path.join(ordering);
            visited.push(target);
        }
    }

    /// Key on a single scalar field, without a schema
    pub fn for_field(key: &str, field_type: FieldType, nullable: bool) -> Result<Self> {
        let (attr_name, reverse_order) = match key.strip_prefix('-') {
            Some(attr_name) => (attr_name, true),
            None => (key, false),
        };

        let path = KeyPath::parse(attr_name)?;
        if path.len() != 1 {
            return Err(Error::config(format!(
                "Invalid key: \"{attr_name}\" must be resolved against a schema"
            )));
        }

        let mut field = FieldMeta::scalar(attr_name, field_type);
        field.nullable = nullable;

        Ok(Self {
            key: key.to_string(),
            info: FieldInfo {
                path,
                fields: vec![field],
            },
            reverse_order,
            field_type,
        })
    }

    /// The key as given, including any `-` marker; tokens must carry the same string
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Effective attribute path (no direction marker, relation keys extended)
    pub fn attr_path(&self) -> &KeyPath {
        self.info.path()
    }

    /// Whether the collection is ordered by descending key
    pub fn reverse_order(&self) -> bool {
        self.reverse_order
    }

    /// Whether the key can be null for some records
    pub fn is_nullable(&self) -> bool {
        self.info.is_nullable()
    }

    /// Scalar type of the key values
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Fields traversed by the key
    pub fn field_info(&self) -> &FieldInfo {
        &self.info
    }
}
