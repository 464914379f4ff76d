//! Field types, struct schemas, and store definitions.

use super::literal::LiteralType;
use crate::error::{Result, ValuableError};
use crate::types::Raw;
use std::collections::HashSet;
use std::sync::Arc;

static ANY_FIELD: FieldType = FieldType::Literal(LiteralType::Any);

/// Type of one schema field or list element.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldType {
    Literal(LiteralType),
    List(Box<FieldType>),
    Struct(Schema),
}

impl FieldType {
    /// The untyped field: node shape follows the value's shape.
    pub fn any() -> Self {
        FieldType::Literal(LiteralType::Any)
    }

    /// A list whose elements all have type `of`.
    pub fn list_of(of: impl Into<FieldType>) -> Self {
        FieldType::List(Box::new(of.into()))
    }

    pub fn is_any(&self) -> bool {
        matches!(self, FieldType::Literal(LiteralType::Any))
    }

    /// Value used when an attribute is absent.
    pub fn default_raw(&self) -> Raw {
        match self {
            FieldType::Literal(literal) => literal.default_raw(),
            FieldType::List(_) => Raw::Array(Vec::new()),
            FieldType::Struct(schema) => schema.default_raw(),
        }
    }

    /// Validate `raw` against this type and fill absent struct fields with
    /// their defaults. The result is what a node of this type stores.
    pub fn normalize(&self, raw: Raw, strict: bool) -> Result<Raw> {
        match self {
            FieldType::Literal(literal) => literal.validate(&raw),
            FieldType::List(of) => match raw {
                Raw::Null => Ok(Raw::Array(Vec::new())),
                Raw::Array(items) => items
                    .into_iter()
                    .map(|item| of.normalize(item, strict))
                    .collect::<Result<Vec<_>>>()
                    .map(Raw::Array),
                other => Err(ValuableError::InvalidArgument(format!(
                    "List(): value must be an array, got {}",
                    other
                ))),
            },
            FieldType::Struct(schema) => schema.normalize(raw, strict),
        }
    }

    /// Strict definition check: nested schemas must be well formed.
    fn check(&self, path: &str) -> Result<()> {
        match self {
            FieldType::Literal(_) => Ok(()),
            FieldType::List(of) => of.check(path),
            FieldType::Struct(schema) => schema.check(path),
        }
    }
}

impl From<LiteralType> for FieldType {
    fn from(literal: LiteralType) -> Self {
        FieldType::Literal(literal)
    }
}

impl From<Schema> for FieldType {
    fn from(schema: Schema) -> Self {
        FieldType::Struct(schema)
    }
}

/// Ordered field declarations for a struct node.
///
/// An open schema accepts keys it does not declare, treating them as
/// untyped. Cloning is cheap; the field list is shared.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Schema {
    fields: Arc<Vec<(String, FieldType)>>,
    open: bool,
}

impl Schema {
    /// An empty closed schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty open schema, used when wrapping plain records.
    pub fn open() -> Self {
        Self {
            fields: Arc::new(Vec::new()),
            open: true,
        }
    }

    /// Declare a field.
    pub fn field(mut self, name: impl Into<String>, ty: impl Into<FieldType>) -> Self {
        Arc::make_mut(&mut self.fields).push((name.into(), ty.into()));
        self
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Declared field type, if any.
    pub fn field_type(&self, name: &str) -> Option<&FieldType> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, ty)| ty)
    }

    /// Type to use for `name`. Undeclared names resolve to the untyped
    /// field on open schemas and outside strict mode.
    pub fn resolve(&self, name: &str, strict: bool) -> Result<&FieldType> {
        match self.field_type(name) {
            Some(ty) => Ok(ty),
            None if self.open || !strict => Ok(&ANY_FIELD),
            None => Err(ValuableError::Schema(format!("unknown field: {}", name))),
        }
    }

    /// Declared field names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Declared fields with their types, in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &FieldType)> {
        self.fields.iter().map(|(name, ty)| (name.as_str(), ty))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Record with every declared field at its default.
    pub fn default_raw(&self) -> Raw {
        let record = self
            .fields
            .iter()
            .map(|(name, ty)| (name.clone(), ty.default_raw()))
            .collect();
        Raw::Object(record)
    }

    /// Validate attributes and fill absent fields with defaults.
    pub fn normalize(&self, raw: Raw, strict: bool) -> Result<Raw> {
        let mut attributes = match raw {
            Raw::Null => serde_json::Map::new(),
            Raw::Object(map) => map,
            other => {
                return Err(ValuableError::InvalidArgument(format!(
                    "Struct(): attributes must be an object, got {}",
                    other
                )))
            }
        };

        let mut record = serde_json::Map::new();
        for (name, ty) in self.fields.iter() {
            let value = match attributes.remove(name) {
                Some(value) => ty.normalize(value, strict)?,
                None => ty.default_raw(),
            };
            record.insert(name.clone(), value);
        }

        for (name, value) in attributes {
            let ty = self.resolve(&name, strict)?;
            record.insert(name, ty.normalize(value, strict)?);
        }

        Ok(Raw::Object(record))
    }

    fn check(&self, path: &str) -> Result<()> {
        let mut seen = HashSet::new();
        for (name, ty) in self.fields.iter() {
            if name.is_empty() {
                return Err(ValuableError::Schema(format!(
                    "{}: field names must be non-empty",
                    path
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(ValuableError::Schema(format!(
                    "{}: duplicate field {}",
                    path, name
                )));
            }
            ty.check(&format!("{}.{}", path, name))?;
        }
        Ok(())
    }
}

/// Model name to schema mapping a store is built from.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Definition {
    models: Vec<(String, Schema)>,
}

impl Definition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a model.
    pub fn model(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.models.push((name.into(), schema));
        self
    }

    /// Schema for a model name.
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.models
            .iter()
            .find(|(model, _)| model == name)
            .map(|(_, schema)| schema)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Declared model names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Whether both definitions declare the same set of model names.
    pub fn same_models(&self, other: &Definition) -> bool {
        let mine: HashSet<&str> = self.names().collect();
        let theirs: HashSet<&str> = other.names().collect();
        mine == theirs
    }

    /// Strict definition pass.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (name, schema) in &self.models {
            if name.is_empty() {
                return Err(ValuableError::Schema(
                    "Store(): model names must be non-empty".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(ValuableError::Schema(format!(
                    "Store(): model defined twice: {}",
                    name
                )));
            }
            schema.check(name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item_schema() -> Schema {
        Schema::new()
            .field("name", LiteralType::Str)
            .field("done", LiteralType::Bool)
    }

    #[test]
    fn test_normalize_fills_defaults() {
        let raw = item_schema().normalize(json!({"name": "a"}), true).unwrap();
        assert_eq!(raw, json!({"name": "a", "done": false}));
    }

    #[test]
    fn test_normalize_null_is_all_defaults() {
        let raw = item_schema().normalize(json!(null), true).unwrap();
        assert_eq!(raw, json!({"name": "", "done": false}));
    }

    #[test]
    fn test_unknown_field_rejected_when_strict() {
        let result = item_schema().normalize(json!({"nope": 1}), true);
        assert!(matches!(result, Err(ValuableError::Schema(_))));
    }

    #[test]
    fn test_unknown_field_kept_when_lenient() {
        let raw = item_schema().normalize(json!({"nope": 1}), false).unwrap();
        assert_eq!(raw["nope"], json!(1));
    }

    #[test]
    fn test_literal_mismatch_is_validation_error() {
        let result = item_schema().normalize(json!({"name": 5}), false);
        assert!(matches!(result, Err(ValuableError::Validation(_))));
    }

    #[test]
    fn test_typed_list_normalize() {
        let ty = FieldType::list_of(item_schema());
        let raw = ty.normalize(json!([{"name": "x"}]), true).unwrap();
        assert_eq!(raw, json!([{"name": "x", "done": false}]));
        assert!(ty.normalize(json!(3), true).is_err());
        assert_eq!(ty.normalize(json!(null), true).unwrap(), json!([]));
    }

    #[test]
    fn test_definition_rejects_duplicates() {
        let def = Definition::new()
            .model("Item", item_schema())
            .model("Item", item_schema());
        assert!(matches!(def.validate(), Err(ValuableError::Schema(_))));
    }

    #[test]
    fn test_definition_rejects_duplicate_nested_field() {
        let nested = Schema::new()
            .field("a", LiteralType::Str)
            .field("a", LiteralType::Str);
        let def = Definition::new().model("Outer", Schema::new().field("inner", nested));
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_same_models_ignores_order() {
        let a = Definition::new()
            .model("A", Schema::new())
            .model("B", Schema::new());
        let b = Definition::new()
            .model("B", Schema::new())
            .model("A", Schema::new());
        assert!(a.same_models(&b));
        assert!(!a.same_models(&Definition::new().model("A", Schema::new())));
    }
}
