//! Named type registry and the parsed schema product.
//!
//! Named types (records, enums, fixed) are owned by a flat fullname
//! registry; `AvroSchema::Named` nodes are handles resolved through it.
//! This keeps self-referential and mutually referential records acyclic:
//! the tree of owned nodes is a DAG, and cycles only exist by name.

use std::collections::HashMap;

use crate::error::SchemaError;
use crate::schema::AvroSchema;

/// A registry of named types by their fully qualified name.
///
/// Aliases are registered alongside primary fullnames, so a reference
/// through an alias resolves to the same defining node.
#[derive(Debug, Clone, Default)]
pub struct SchemaContext {
    named_types: HashMap<String, AvroSchema>,
}

impl SchemaContext {
    /// Create a new empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context from a map of fullname to defining node.
    pub fn from_named_types(named_types: HashMap<String, AvroSchema>) -> Self {
        Self { named_types }
    }

    /// Register a named type under a fullname.
    pub fn register(&mut self, fullname: String, schema: AvroSchema) {
        self.named_types.insert(fullname, schema);
    }

    /// Get the defining node for a fullname, if registered.
    pub fn get(&self, fullname: &str) -> Option<&AvroSchema> {
        self.named_types.get(fullname)
    }

    /// Check whether a fullname is registered.
    pub fn contains(&self, fullname: &str) -> bool {
        self.named_types.contains_key(fullname)
    }

    /// Number of registered names (aliases included).
    pub fn len(&self) -> usize {
        self.named_types.len()
    }

    /// Whether the context holds no named types.
    pub fn is_empty(&self) -> bool {
        self.named_types.is_empty()
    }

    /// All registered names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.named_types.keys().map(|s| s.as_str())
    }

    /// Build a context by extracting all named types from a schema tree.
    ///
    /// Useful for hand-constructed schemas that never went through the
    /// parser.
    pub fn build_from_schema(schema: &AvroSchema) -> Self {
        let mut context = Self::new();
        context.extract_named_types(schema);
        context
    }

    fn extract_named_types(&mut self, schema: &AvroSchema) {
        match schema {
            AvroSchema::Record(record) => {
                self.named_types.insert(record.fullname(), schema.clone());
                for field in &record.fields {
                    self.extract_named_types(&field.schema);
                }
            }
            AvroSchema::Enum(enum_schema) => {
                self.named_types
                    .insert(enum_schema.fullname(), schema.clone());
            }
            AvroSchema::Fixed(fixed_schema) => {
                self.named_types
                    .insert(fixed_schema.fullname(), schema.clone());
            }
            AvroSchema::Array(item_schema) => {
                self.extract_named_types(item_schema);
            }
            AvroSchema::Map(value_schema) => {
                self.extract_named_types(value_schema);
            }
            AvroSchema::Union(branches) => {
                for branch in branches {
                    self.extract_named_types(branch);
                }
            }
            AvroSchema::Logical(logical) => {
                self.extract_named_types(&logical.base);
            }
            // Primitives and Named references don't define named types
            _ => {}
        }
    }
}

/// A fully linked schema: the root node plus the context that resolves
/// every named reference inside it.
///
/// Constructed once by the parser (or [`Schema::from_parts`]), then
/// immutable. A `Schema` can be shared freely across concurrent encode
/// and decode calls.
#[derive(Debug, Clone)]
pub struct Schema {
    root: AvroSchema,
    context: SchemaContext,
}

impl Schema {
    /// Build a schema from a root node and a pre-populated context.
    ///
    /// Verifies that every `Named` handle reachable from the root (or
    /// from any registered node) resolves through the context.
    pub fn from_parts(root: AvroSchema, context: SchemaContext) -> Result<Self, SchemaError> {
        check_references(&root, &context, "$")?;
        Ok(Self { root, context })
    }

    /// Build a schema from a bare node, extracting named types into a
    /// fresh context.
    pub fn from_root(root: AvroSchema) -> Result<Self, SchemaError> {
        let context = SchemaContext::build_from_schema(&root);
        Self::from_parts(root, context)
    }

    /// The root schema node.
    pub fn root(&self) -> &AvroSchema {
        &self.root
    }

    /// The named type registry.
    pub fn context(&self) -> &SchemaContext {
        &self.context
    }
}

/// Verify that every `Named` handle reachable from `schema` resolves.
pub(crate) fn check_references(
    schema: &AvroSchema,
    context: &SchemaContext,
    path: &str,
) -> Result<(), SchemaError> {
    match schema {
        AvroSchema::Named(name) => {
            if context.contains(name) {
                Ok(())
            } else {
                Err(SchemaError::UnknownReference {
                    path: path.to_string(),
                    name: name.clone(),
                })
            }
        }
        AvroSchema::Record(record) => {
            for (i, field) in record.fields.iter().enumerate() {
                let field_path = format!("{}.fields[{}].type", path, i);
                check_references(&field.schema, context, &field_path)?;
            }
            Ok(())
        }
        AvroSchema::Array(items) => {
            check_references(items, context, &format!("{}.items", path))
        }
        AvroSchema::Map(values) => {
            check_references(values, context, &format!("{}.values", path))
        }
        AvroSchema::Union(branches) => {
            for (i, branch) in branches.iter().enumerate() {
                check_references(branch, context, &format!("{}[{}]", path, i))?;
            }
            Ok(())
        }
        AvroSchema::Logical(logical) => check_references(&logical.base, context, path),
        _ => Ok(()),
    }
}
