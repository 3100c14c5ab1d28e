//! JSON schema parser for Avro schemas.
//!
//! Parses Avro schema JSON into the AvroSchema type hierarchy and a
//! [`SchemaContext`] of named types, validating structural and semantic
//! rules along the way.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::error::SchemaError;
use crate::schema::{
    AvroSchema, EnumSchema, FieldOrder, FieldSchema, FixedSchema, LogicalType, LogicalTypeName,
    RecordSchema, Schema, SchemaContext,
};

/// Parse an Avro schema from a JSON string.
///
/// # Example
/// ```
/// use biplane::schema::parse_schema;
///
/// let schema = parse_schema(r#""string""#).unwrap();
/// ```
pub fn parse_schema(json: &str) -> Result<Schema, SchemaError> {
    parse_schema_with_options(json, false)
}

/// Parse an Avro schema from a JSON string with validation options.
///
/// In strict mode, unknown keys in schema objects, non-canonical names,
/// and alias collisions are hard errors. In lenient mode (default) they
/// are logged as warnings and parsing continues. Invariants of the
/// schema model itself (duplicate fullnames, malformed unions, bad
/// fixed sizes, duplicate field names or enum symbols) are hard errors
/// in both modes.
///
/// # Example
/// ```
/// use biplane::schema::parse_schema_with_options;
///
/// // Lenient mode - accepted with a warning
/// let schema = parse_schema_with_options(r#"{"type":"int","surprise":1}"#, false).unwrap();
///
/// // Strict mode - fails on the unknown key
/// let result = parse_schema_with_options(r#"{"type":"int","surprise":1}"#, true);
/// assert!(result.is_err());
/// ```
pub fn parse_schema_with_options(json: &str, strict: bool) -> Result<Schema, SchemaError> {
    let mut parser = SchemaParser::new().with_strict(strict);
    parser.parse_str(json)
}

const NAME_REGEX: &str = "[A-Za-z_][A-Za-z0-9_]*";

const RECORD_KEYS: &[&str] = &["type", "name", "namespace", "doc", "aliases", "fields"];
const FIELD_KEYS: &[&str] = &["name", "type", "default", "doc", "order", "aliases"];
const ENUM_KEYS: &[&str] = &[
    "type",
    "name",
    "namespace",
    "doc",
    "aliases",
    "symbols",
    "default",
];
const ARRAY_KEYS: &[&str] = &["type", "items"];
const MAP_KEYS: &[&str] = &["type", "values"];
const FIXED_KEYS: &[&str] = &[
    "type",
    "name",
    "namespace",
    "doc",
    "aliases",
    "size",
    "logicalType",
    "precision",
    "scale",
];
const PRIMITIVE_KEYS: &[&str] = &["type", "logicalType", "precision", "scale"];

/// Schema parser with named type resolution context.
///
/// Maintains a registry of named types (records, enums, fixed) for
/// resolving references during parsing, plus the JSON path of the node
/// currently being parsed for error reporting.
#[derive(Debug, Default)]
pub struct SchemaParser {
    /// Registry of named types by their fully qualified name
    named_types: HashMap<String, AvroSchema>,
    /// Alias fullname -> canonical fullname
    aliases: HashMap<String, String>,
    /// Current namespace for resolving unqualified names
    current_namespace: Option<String>,
    /// Whether to enforce strict schema validation
    strict: bool,
    /// Path segments of the node currently being parsed
    path: Vec<String>,
}

impl SchemaParser {
    /// Create a new SchemaParser with default settings (lenient mode).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to use strict schema validation.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Parse a schema from a JSON string.
    pub fn parse_str(&mut self, json: &str) -> Result<Schema, SchemaError> {
        let value: Value = serde_json::from_str(json)?;
        self.parse(&value)
    }

    /// Parse a schema from an already-deserialized JSON tree.
    ///
    /// The product is a fully linked [`Schema`]: a root node plus a
    /// context holding every named type (and alias) the document
    /// defined. References that never resolve fail here.
    pub fn parse(&mut self, value: &Value) -> Result<Schema, SchemaError> {
        let root = self.parse_value(value)?;

        let mut context = SchemaContext::from_named_types(self.named_types.clone());
        for (alias, target) in &self.aliases {
            if let Some(node) = self.named_types.get(target) {
                context.register(alias.clone(), node.clone());
            }
        }

        Schema::from_parts(root, context)
    }

    // ------------------------------------------------------------------
    // Path tracking
    // ------------------------------------------------------------------

    fn json_path(&self) -> String {
        let mut out = String::from("$");
        for segment in &self.path {
            out.push_str(segment);
        }
        out
    }

    fn in_segment<T>(
        &mut self,
        segment: String,
        f: impl FnOnce(&mut Self) -> Result<T, SchemaError>,
    ) -> Result<T, SchemaError> {
        self.path.push(segment);
        let result = f(self);
        self.path.pop();
        result
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    /// Parse a JSON value into an AvroSchema node.
    fn parse_value(&mut self, value: &Value) -> Result<AvroSchema, SchemaError> {
        match value {
            Value::String(s) => self.parse_string_schema(s),
            Value::Object(obj) => self.parse_object_schema(obj),
            Value::Array(arr) => self.parse_union_schema(arr),
            _ => Err(SchemaError::InvalidSchema {
                path: self.json_path(),
                message: format!("expected string, object, or array, found: {}", value),
            }),
        }
    }

    /// Parse a primitive type or named type reference from a string.
    fn parse_string_schema(&mut self, s: &str) -> Result<AvroSchema, SchemaError> {
        match s {
            "null" => Ok(AvroSchema::Null),
            "boolean" => Ok(AvroSchema::Boolean),
            "int" => Ok(AvroSchema::Int),
            "long" => Ok(AvroSchema::Long),
            "float" => Ok(AvroSchema::Float),
            "double" => Ok(AvroSchema::Double),
            "bytes" => Ok(AvroSchema::Bytes),
            "string" => Ok(AvroSchema::String),
            name => {
                // A named reference: either already defined or a forward
                // reference resolved by the link check at the end.
                Ok(AvroSchema::Named(self.resolve_name(name)))
            }
        }
    }

    /// Parse a complex type from a JSON object.
    fn parse_object_schema(
        &mut self,
        obj: &serde_json::Map<String, Value>,
    ) -> Result<AvroSchema, SchemaError> {
        let type_str = obj.get("type").and_then(|v| v.as_str()).ok_or_else(|| {
            SchemaError::MissingRequiredField {
                path: self.json_path(),
                field: "type".to_string(),
            }
        })?;

        // A logicalType annotation only applies to primitives and fixed;
        // elsewhere it is treated as an ordinary unknown key.
        let has_logical = obj.contains_key("logicalType");
        let logical_base = matches!(
            type_str,
            "int" | "long" | "float" | "double" | "boolean" | "bytes" | "string" | "fixed"
        );
        if has_logical && logical_base {
            return self.parse_logical_type(obj, type_str);
        }

        match type_str {
            "null" | "boolean" | "int" | "long" | "float" | "double" | "bytes" | "string" => {
                self.check_unknown_keys(obj, PRIMITIVE_KEYS)?;
                self.parse_string_schema(type_str)
            }
            "record" | "error" => self.parse_record_schema(obj),
            "enum" => self.parse_enum_schema(obj),
            "array" => self.parse_array_schema(obj),
            "map" => self.parse_map_schema(obj),
            "fixed" => self.parse_fixed_schema(obj),
            other => {
                // Type could be a named reference spelled as an object
                Ok(AvroSchema::Named(self.resolve_name(other)))
            }
        }
    }

    // ------------------------------------------------------------------
    // Unions
    // ------------------------------------------------------------------

    /// Parse a union schema from a JSON array.
    fn parse_union_schema(&mut self, arr: &[Value]) -> Result<AvroSchema, SchemaError> {
        if arr.is_empty() {
            return Err(SchemaError::InvalidUnion {
                path: self.json_path(),
                message: "union must have at least one branch".to_string(),
            });
        }

        let mut branches = Vec::with_capacity(arr.len());
        for (i, v) in arr.iter().enumerate() {
            let branch = self.in_segment(format!("[{}]", i), |p| p.parse_value(v))?;
            branches.push(branch);
        }

        self.validate_union(&branches)?;

        Ok(AvroSchema::Union(branches))
    }

    /// Validate union branch rules.
    ///
    /// Unions may not nest, may hold at most one branch of each unnamed
    /// kind, and named branches must differ by fullname. These are
    /// invariants of the schema model, so they hold in both modes.
    fn validate_union(&self, branches: &[AvroSchema]) -> Result<(), SchemaError> {
        let mut seen = HashSet::new();
        for (i, branch) in branches.iter().enumerate() {
            if matches!(branch, AvroSchema::Union(_)) {
                return Err(SchemaError::InvalidUnion {
                    path: self.json_path(),
                    message: format!("branch {} is a union; unions cannot be nested", i),
                });
            }
            let key = Self::union_type_key(branch);
            if !seen.insert(key.clone()) {
                return Err(SchemaError::InvalidUnion {
                    path: self.json_path(),
                    message: format!("duplicate branch type '{}' at position {}", key, i),
                });
            }
        }
        Ok(())
    }

    /// Key used for duplicate detection in unions.
    ///
    /// Unnamed kinds collapse to their kind (a logical annotation does
    /// not make a second `bytes` branch legal); named kinds key on the
    /// fullname.
    fn union_type_key(schema: &AvroSchema) -> String {
        match schema {
            AvroSchema::Null => "null".to_string(),
            AvroSchema::Boolean => "boolean".to_string(),
            AvroSchema::Int => "int".to_string(),
            AvroSchema::Long => "long".to_string(),
            AvroSchema::Float => "float".to_string(),
            AvroSchema::Double => "double".to_string(),
            AvroSchema::Bytes => "bytes".to_string(),
            AvroSchema::String => "string".to_string(),
            AvroSchema::Array(_) => "array".to_string(),
            AvroSchema::Map(_) => "map".to_string(),
            AvroSchema::Record(r) => r.fullname(),
            AvroSchema::Enum(e) => e.fullname(),
            AvroSchema::Fixed(f) => f.fullname(),
            AvroSchema::Named(n) => n.clone(),
            AvroSchema::Union(_) => "union".to_string(),
            AvroSchema::Logical(lt) => Self::union_type_key(&lt.base),
        }
    }

    // ------------------------------------------------------------------
    // Named types
    // ------------------------------------------------------------------

    /// Parse a record schema.
    fn parse_record_schema(
        &mut self,
        obj: &serde_json::Map<String, Value>,
    ) -> Result<AvroSchema, SchemaError> {
        self.check_unknown_keys(obj, RECORD_KEYS)?;
        let (name, namespace) = self.parse_name_and_namespace(obj, "record")?;
        let fullname = Self::join_fullname(&namespace, &name);

        self.check_duplicate_definition(&fullname)?;

        // Register a placeholder before parsing fields so that
        // self-references resolve.
        self.named_types
            .insert(fullname.clone(), AvroSchema::Named(fullname.clone()));

        let doc = obj.get("doc").and_then(|v| v.as_str()).map(String::from);
        let aliases = self.parse_aliases(obj, &namespace)?;

        let fields_value = obj
            .get("fields")
            .and_then(|v| v.as_array())
            .ok_or_else(|| SchemaError::MissingRequiredField {
                path: self.json_path(),
                field: "fields".to_string(),
            })?;

        let prev_namespace = self.current_namespace.clone();
        self.current_namespace = namespace.clone();

        let mut fields = Vec::with_capacity(fields_value.len());
        let mut field_names = HashSet::new();
        for (i, f) in fields_value.iter().enumerate() {
            let field =
                self.in_segment(format!(".fields[{}]", i), |p| p.parse_field_schema(f))?;
            if !field_names.insert(field.name.clone()) {
                self.current_namespace = prev_namespace;
                return Err(SchemaError::DuplicateName {
                    path: format!("{}.fields[{}]", self.json_path(), i),
                    name: field.name,
                });
            }
            fields.push(field);
        }

        self.current_namespace = prev_namespace;

        self.validate_field_aliases(&fields, &field_names)?;

        let record = RecordSchema {
            name,
            namespace,
            fields,
            doc,
            aliases,
        };

        let schema = AvroSchema::Record(record);
        self.named_types.insert(fullname.clone(), schema.clone());
        self.register_aliases(&fullname, &schema)?;

        Ok(schema)
    }

    /// Parse a field schema within a record.
    fn parse_field_schema(&mut self, value: &Value) -> Result<FieldSchema, SchemaError> {
        let obj = value
            .as_object()
            .ok_or_else(|| SchemaError::InvalidSchema {
                path: self.json_path(),
                message: "field must be an object".to_string(),
            })?;

        self.check_unknown_keys(obj, FIELD_KEYS)?;

        let name = obj
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SchemaError::MissingRequiredField {
                path: self.json_path(),
                field: "name".to_string(),
            })?
            .to_string();

        self.validate_name(&name, "field")?;

        let type_value =
            obj.get("type")
                .ok_or_else(|| SchemaError::MissingRequiredField {
                    path: self.json_path(),
                    field: "type".to_string(),
                })?;

        let schema = self.in_segment(".type".to_string(), |p| p.parse_value(type_value))?;

        let default = obj.get("default").cloned();
        if let Some(default_value) = &default {
            if let Err(message) = self.default_matches(&schema, default_value) {
                return Err(SchemaError::InvalidDefault {
                    path: format!("{}.default", self.json_path()),
                    message,
                });
            }
        }

        let doc = obj.get("doc").and_then(|v| v.as_str()).map(String::from);

        let order = match obj.get("order").and_then(|v| v.as_str()) {
            None | Some("ascending") => FieldOrder::Ascending,
            Some("descending") => FieldOrder::Descending,
            Some("ignore") => FieldOrder::Ignore,
            Some(other) => {
                if self.strict {
                    return Err(SchemaError::InvalidSchema {
                        path: format!("{}.order", self.json_path()),
                        message: format!("unknown field order '{}'", other),
                    });
                }
                tracing::warn!(order = other, path = %self.json_path(), "unknown field order, using ascending");
                FieldOrder::Ascending
            }
        };

        let aliases = obj
            .get("aliases")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        Ok(FieldSchema {
            name,
            schema,
            default,
            doc,
            order,
            aliases,
        })
    }

    /// Field alias sets must be disjoint from primary field names and
    /// from each other. Strict mode errors; lenient mode warns.
    fn validate_field_aliases(
        &mut self,
        fields: &[FieldSchema],
        field_names: &HashSet<String>,
    ) -> Result<(), SchemaError> {
        let mut seen_aliases = HashSet::new();
        for field in fields {
            for alias in &field.aliases {
                if field_names.contains(alias) || !seen_aliases.insert(alias.clone()) {
                    if self.strict {
                        return Err(SchemaError::DuplicateName {
                            path: self.json_path(),
                            name: alias.clone(),
                        });
                    }
                    tracing::warn!(alias = %alias, path = %self.json_path(), "field alias collides with another field name or alias");
                }
            }
        }
        Ok(())
    }

    /// Parse an enum schema.
    fn parse_enum_schema(
        &mut self,
        obj: &serde_json::Map<String, Value>,
    ) -> Result<AvroSchema, SchemaError> {
        self.check_unknown_keys(obj, ENUM_KEYS)?;
        let (name, namespace) = self.parse_name_and_namespace(obj, "enum")?;
        let fullname = Self::join_fullname(&namespace, &name);

        self.check_duplicate_definition(&fullname)?;

        let symbols_value = obj
            .get("symbols")
            .and_then(|v| v.as_array())
            .ok_or_else(|| SchemaError::MissingRequiredField {
                path: self.json_path(),
                field: "symbols".to_string(),
            })?;

        if symbols_value.is_empty() {
            return Err(SchemaError::InvalidSchema {
                path: format!("{}.symbols", self.json_path()),
                message: "enum must have at least one symbol".to_string(),
            });
        }

        let mut symbols = Vec::with_capacity(symbols_value.len());
        let mut seen = HashSet::new();
        for (i, v) in symbols_value.iter().enumerate() {
            let symbol = v.as_str().ok_or_else(|| SchemaError::InvalidSchema {
                path: format!("{}.symbols[{}]", self.json_path(), i),
                message: format!("enum symbol must be a string, found: {}", v),
            })?;
            self.validate_name(symbol, "enum symbol")?;
            if !seen.insert(symbol.to_string()) {
                return Err(SchemaError::DuplicateName {
                    path: format!("{}.symbols[{}]", self.json_path(), i),
                    name: symbol.to_string(),
                });
            }
            symbols.push(symbol.to_string());
        }

        let doc = obj.get("doc").and_then(|v| v.as_str()).map(String::from);
        let aliases = self.parse_aliases(obj, &namespace)?;

        let default = obj
            .get("default")
            .and_then(|v| v.as_str())
            .map(String::from);
        if let Some(d) = &default {
            if !symbols.iter().any(|s| s == d) {
                return Err(SchemaError::InvalidDefault {
                    path: format!("{}.default", self.json_path()),
                    message: format!("default symbol '{}' is not in the symbol list", d),
                });
            }
        }

        let enum_schema = EnumSchema {
            name,
            namespace,
            symbols,
            doc,
            aliases,
            default,
        };

        let schema = AvroSchema::Enum(enum_schema);
        self.named_types.insert(fullname.clone(), schema.clone());
        self.register_aliases(&fullname, &schema)?;

        Ok(schema)
    }

    /// Parse an array schema.
    fn parse_array_schema(
        &mut self,
        obj: &serde_json::Map<String, Value>,
    ) -> Result<AvroSchema, SchemaError> {
        self.check_unknown_keys(obj, ARRAY_KEYS)?;
        let items = obj
            .get("items")
            .ok_or_else(|| SchemaError::MissingRequiredField {
                path: self.json_path(),
                field: "items".to_string(),
            })?;

        let item_schema = self.in_segment(".items".to_string(), |p| p.parse_value(items))?;
        Ok(AvroSchema::Array(Box::new(item_schema)))
    }

    /// Parse a map schema.
    fn parse_map_schema(
        &mut self,
        obj: &serde_json::Map<String, Value>,
    ) -> Result<AvroSchema, SchemaError> {
        self.check_unknown_keys(obj, MAP_KEYS)?;
        let values = obj
            .get("values")
            .ok_or_else(|| SchemaError::MissingRequiredField {
                path: self.json_path(),
                field: "values".to_string(),
            })?;

        let value_schema = self.in_segment(".values".to_string(), |p| p.parse_value(values))?;
        Ok(AvroSchema::Map(Box::new(value_schema)))
    }

    /// Parse a fixed schema.
    fn parse_fixed_schema(
        &mut self,
        obj: &serde_json::Map<String, Value>,
    ) -> Result<AvroSchema, SchemaError> {
        self.check_unknown_keys(obj, FIXED_KEYS)?;
        let (name, namespace) = self.parse_name_and_namespace(obj, "fixed")?;
        let fullname = Self::join_fullname(&namespace, &name);

        self.check_duplicate_definition(&fullname)?;

        let size_value = obj
            .get("size")
            .ok_or_else(|| SchemaError::MissingRequiredField {
                path: self.json_path(),
                field: "size".to_string(),
            })?;
        let size = size_value
            .as_u64()
            .filter(|&s| s >= 1)
            .ok_or_else(|| SchemaError::InvalidSchema {
                path: format!("{}.size", self.json_path()),
                message: format!("fixed size must be a positive integer, found: {}", size_value),
            })? as usize;

        let doc = obj.get("doc").and_then(|v| v.as_str()).map(String::from);
        let aliases = self.parse_aliases(obj, &namespace)?;

        let fixed_schema = FixedSchema {
            name,
            namespace,
            size,
            doc,
            aliases,
        };

        let schema = AvroSchema::Fixed(fixed_schema);
        self.named_types.insert(fullname.clone(), schema.clone());
        self.register_aliases(&fullname, &schema)?;

        Ok(schema)
    }

    // ------------------------------------------------------------------
    // Logical types
    // ------------------------------------------------------------------

    /// Parse a logical type annotation on a primitive or fixed base.
    ///
    /// Invalid parameters drop the annotation to the underlying type in
    /// lenient mode and are errors in strict mode. Unknown logical type
    /// names always fall back to the base type.
    fn parse_logical_type(
        &mut self,
        obj: &serde_json::Map<String, Value>,
        type_str: &str,
    ) -> Result<AvroSchema, SchemaError> {
        let logical_name = match obj.get("logicalType").and_then(|v| v.as_str()) {
            Some(s) => s.to_string(),
            None => {
                return Err(SchemaError::InvalidLogicalType {
                    path: format!("{}.logicalType", self.json_path()),
                    message: "logicalType must be a string".to_string(),
                })
            }
        };

        let base = match type_str {
            "boolean" => AvroSchema::Boolean,
            "int" => AvroSchema::Int,
            "long" => AvroSchema::Long,
            "float" => AvroSchema::Float,
            "double" => AvroSchema::Double,
            "bytes" => AvroSchema::Bytes,
            "string" => AvroSchema::String,
            "fixed" => self.parse_fixed_schema(obj)?,
            other => {
                return Err(SchemaError::InvalidLogicalType {
                    path: self.json_path(),
                    message: format!("invalid base type for logical type: {}", other),
                })
            }
        };

        match self.resolve_logical_type(obj, &logical_name, &base) {
            Ok(Some(logical)) => Ok(AvroSchema::Logical(LogicalType::new(base, logical))),
            // Unknown logical type names are ignored per the Avro spec
            Ok(None) => Ok(base),
            Err(message) => {
                if self.strict {
                    Err(SchemaError::InvalidLogicalType {
                        path: self.json_path(),
                        message,
                    })
                } else {
                    tracing::warn!(
                        logical_type = %logical_name,
                        path = %self.json_path(),
                        %message,
                        "dropping invalid logical type annotation"
                    );
                    Ok(base)
                }
            }
        }
    }

    /// Validate a logical type annotation against its base.
    ///
    /// `Ok(None)` means the name is unknown and the annotation should be
    /// ignored; `Err` carries the validation failure.
    fn resolve_logical_type(
        &self,
        obj: &serde_json::Map<String, Value>,
        logical_name: &str,
        base: &AvroSchema,
    ) -> Result<Option<LogicalTypeName>, String> {
        match logical_name {
            "decimal" => {
                let precision = match obj.get("precision") {
                    None => return Err("decimal missing 'precision'".to_string()),
                    Some(v) => v
                        .as_i64()
                        .ok_or_else(|| format!("decimal precision must be an integer, found {}", v))?,
                };
                if precision < 1 {
                    return Err(format!("decimal precision must be >= 1, found {}", precision));
                }
                let scale = match obj.get("scale") {
                    None => 0,
                    Some(v) => v
                        .as_i64()
                        .ok_or_else(|| format!("decimal scale must be an integer, found {}", v))?,
                };
                if scale < 0 {
                    return Err(format!("decimal scale must be >= 0, found {}", scale));
                }
                if scale > precision {
                    return Err(format!(
                        "decimal scale {} exceeds precision {}",
                        scale, precision
                    ));
                }
                match base {
                    AvroSchema::Bytes => {}
                    AvroSchema::Fixed(f) => {
                        let max = max_decimal_precision(f.size);
                        if precision as u64 > max {
                            return Err(format!(
                                "decimal precision {} does not fit in fixed[{}] (max {})",
                                precision, f.size, max
                            ));
                        }
                    }
                    other => {
                        return Err(format!(
                            "decimal requires a bytes or fixed base, found {:?}",
                            other
                        ))
                    }
                }
                Ok(Some(LogicalTypeName::Decimal {
                    precision: precision as u32,
                    scale: scale as u32,
                }))
            }
            "uuid" => match base {
                AvroSchema::String => Ok(Some(LogicalTypeName::Uuid)),
                AvroSchema::Fixed(f) if f.size == 16 => Ok(Some(LogicalTypeName::Uuid)),
                AvroSchema::Fixed(f) => {
                    Err(format!("uuid requires fixed[16], found fixed[{}]", f.size))
                }
                other => Err(format!(
                    "uuid requires a string or fixed[16] base, found {:?}",
                    other
                )),
            },
            "date" => match base {
                AvroSchema::Int => Ok(Some(LogicalTypeName::Date)),
                other => Err(format!("date requires an int base, found {:?}", other)),
            },
            "time-millis" => match base {
                AvroSchema::Int => Ok(Some(LogicalTypeName::TimeMillis)),
                other => Err(format!("time-millis requires an int base, found {:?}", other)),
            },
            "time-micros" => match base {
                AvroSchema::Long => Ok(Some(LogicalTypeName::TimeMicros)),
                other => Err(format!("time-micros requires a long base, found {:?}", other)),
            },
            "timestamp-millis" => match base {
                AvroSchema::Long => Ok(Some(LogicalTypeName::TimestampMillis)),
                other => Err(format!(
                    "timestamp-millis requires a long base, found {:?}",
                    other
                )),
            },
            "timestamp-micros" => match base {
                AvroSchema::Long => Ok(Some(LogicalTypeName::TimestampMicros)),
                other => Err(format!(
                    "timestamp-micros requires a long base, found {:?}",
                    other
                )),
            },
            "timestamp-nanos" => match base {
                AvroSchema::Long => Ok(Some(LogicalTypeName::TimestampNanos)),
                other => Err(format!(
                    "timestamp-nanos requires a long base, found {:?}",
                    other
                )),
            },
            "local-timestamp-millis" => match base {
                AvroSchema::Long => Ok(Some(LogicalTypeName::LocalTimestampMillis)),
                other => Err(format!(
                    "local-timestamp-millis requires a long base, found {:?}",
                    other
                )),
            },
            "local-timestamp-micros" => match base {
                AvroSchema::Long => Ok(Some(LogicalTypeName::LocalTimestampMicros)),
                other => Err(format!(
                    "local-timestamp-micros requires a long base, found {:?}",
                    other
                )),
            },
            "duration" => match base {
                AvroSchema::Fixed(f) if f.size == 12 => Ok(Some(LogicalTypeName::Duration)),
                AvroSchema::Fixed(f) => Err(format!(
                    "duration requires fixed[12], found fixed[{}]",
                    f.size
                )),
                other => Err(format!("duration requires a fixed[12] base, found {:?}", other)),
            },
            _ => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Names, namespaces, aliases
    // ------------------------------------------------------------------

    /// Extract and validate `name`/`namespace` of a named type.
    ///
    /// A dotted name is a fullname and overrides the namespace
    /// attribute; otherwise the explicit namespace or the enclosing one
    /// applies. An empty namespace string means the null namespace.
    fn parse_name_and_namespace(
        &mut self,
        obj: &serde_json::Map<String, Value>,
        what: &str,
    ) -> Result<(String, Option<String>), SchemaError> {
        let raw_name = obj
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SchemaError::MissingRequiredField {
                path: self.json_path(),
                field: "name".to_string(),
            })?
            .to_string();

        let explicit_namespace = obj
            .get("namespace")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(String::from);

        let (name, namespace) = match raw_name.rfind('.') {
            Some(idx) => (
                raw_name[idx + 1..].to_string(),
                Some(raw_name[..idx].to_string()),
            ),
            None => (
                raw_name,
                explicit_namespace.or_else(|| self.current_namespace.clone()),
            ),
        };

        self.validate_name(&name, what)?;
        if let Some(ns) = &namespace {
            for component in ns.split('.') {
                self.validate_name(component, "namespace component")?;
            }
        }

        Ok((name, namespace))
    }

    fn join_fullname(namespace: &Option<String>, name: &str) -> String {
        match namespace {
            Some(ns) => format!("{}.{}", ns, name),
            None => name.to_string(),
        }
    }

    /// Resolve a type name to its fully qualified form against the
    /// current namespace.
    fn resolve_name(&self, name: &str) -> String {
        if name.contains('.') {
            name.to_string()
        } else if let Some(ns) = &self.current_namespace {
            format!("{}.{}", ns, name)
        } else {
            name.to_string()
        }
    }

    /// Defining the same fullname twice is always an error, whether the
    /// earlier owner was a definition or an alias.
    fn check_duplicate_definition(&self, fullname: &str) -> Result<(), SchemaError> {
        if self.named_types.contains_key(fullname) || self.aliases.contains_key(fullname) {
            return Err(SchemaError::DuplicateName {
                path: self.json_path(),
                name: fullname.to_string(),
            });
        }
        Ok(())
    }

    /// Parse the `aliases` attribute of a named type.
    fn parse_aliases(
        &mut self,
        obj: &serde_json::Map<String, Value>,
        _namespace: &Option<String>,
    ) -> Result<Vec<String>, SchemaError> {
        Ok(obj
            .get("aliases")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Register a named type's aliases as additional context entries.
    ///
    /// Unqualified aliases live in the namespace of the type they alias.
    /// A collision with an existing name or alias is a hard error in
    /// strict mode and skipped with a warning otherwise.
    fn register_aliases(
        &mut self,
        fullname: &str,
        schema: &AvroSchema,
    ) -> Result<(), SchemaError> {
        let namespace = fullname.rfind('.').map(|idx| fullname[..idx].to_string());
        let aliases = match schema {
            AvroSchema::Record(r) => r.aliases.clone(),
            AvroSchema::Enum(e) => e.aliases.clone(),
            AvroSchema::Fixed(f) => f.aliases.clone(),
            _ => Vec::new(),
        };
        for alias in aliases {
            let alias_fullname = if alias.contains('.') {
                alias
            } else {
                Self::join_fullname(&namespace, &alias)
            };
            if self.named_types.contains_key(&alias_fullname)
                || self.aliases.contains_key(&alias_fullname)
            {
                if self.strict {
                    return Err(SchemaError::DuplicateName {
                        path: self.json_path(),
                        name: alias_fullname,
                    });
                }
                tracing::warn!(alias = %alias_fullname, aliased = %fullname, "alias collides with an existing name, skipping");
                continue;
            }
            self.aliases.insert(alias_fullname, fullname.to_string());
        }
        Ok(())
    }

    /// Validate that a name follows Avro naming rules.
    ///
    /// Names must start with `[A-Za-z_]` and contain only
    /// `[A-Za-z0-9_]`. Strict mode errors; lenient mode warns.
    fn validate_name(&self, name: &str, what: &str) -> Result<(), SchemaError> {
        let message = if name.is_empty() {
            Some("name cannot be empty".to_string())
        } else {
            let mut chars = name.chars();
            let first = chars.next().unwrap();
            if !first.is_ascii_alphabetic() && first != '_' {
                Some(format!("{} must match {}", what, NAME_REGEX))
            } else if name
                .chars()
                .any(|c| !c.is_ascii_alphanumeric() && c != '_')
            {
                Some(format!("{} must match {}", what, NAME_REGEX))
            } else {
                None
            }
        };

        if let Some(message) = message {
            if self.strict {
                return Err(SchemaError::InvalidName {
                    path: self.json_path(),
                    name: name.to_string(),
                    message,
                });
            }
            tracing::warn!(name = %name, path = %self.json_path(), %message, "non-canonical name");
        }
        Ok(())
    }

    /// Flag keys outside the recognized set for this schema object.
    ///
    /// Avro allows arbitrary metadata attributes, so lenient mode only
    /// warns; strict mode rejects them.
    fn check_unknown_keys(
        &self,
        obj: &serde_json::Map<String, Value>,
        allowed: &[&str],
    ) -> Result<(), SchemaError> {
        for key in obj.keys() {
            if !allowed.contains(&key.as_str()) {
                if self.strict {
                    return Err(SchemaError::UnrecognizedKey {
                        path: self.json_path(),
                        key: key.clone(),
                    });
                }
                tracing::warn!(key = %key, path = %self.json_path(), "ignoring unrecognized schema key");
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Defaults
    // ------------------------------------------------------------------

    /// Check a JSON default value against a schema node.
    ///
    /// For unions the default applies to the first branch, per the Avro
    /// spec. Bytes and fixed defaults are strings whose code points are
    /// the byte values.
    fn default_matches(&self, schema: &AvroSchema, v: &Value) -> Result<(), String> {
        match schema {
            AvroSchema::Null => {
                if v.is_null() {
                    Ok(())
                } else {
                    Err(format!("null default expected, found {}", v))
                }
            }
            AvroSchema::Boolean => {
                if v.is_boolean() {
                    Ok(())
                } else {
                    Err(format!("boolean default expected, found {}", v))
                }
            }
            AvroSchema::Int => match v.as_i64() {
                Some(n) if n >= i32::MIN as i64 && n <= i32::MAX as i64 => Ok(()),
                _ => Err(format!("int default expected, found {}", v)),
            },
            AvroSchema::Long => match v.as_i64() {
                Some(_) => Ok(()),
                None => Err(format!("long default expected, found {}", v)),
            },
            AvroSchema::Float | AvroSchema::Double => {
                if v.is_number() {
                    Ok(())
                } else {
                    Err(format!("numeric default expected, found {}", v))
                }
            }
            AvroSchema::Bytes => match v.as_str() {
                Some(s) if s.chars().all(|c| (c as u32) <= 0xFF) => Ok(()),
                _ => Err(format!("bytes default must be a byte string, found {}", v)),
            },
            AvroSchema::String => {
                if v.is_string() {
                    Ok(())
                } else {
                    Err(format!("string default expected, found {}", v))
                }
            }
            AvroSchema::Enum(e) => match v.as_str() {
                Some(s) if e.symbols.iter().any(|sym| sym == s) => Ok(()),
                _ => Err(format!("default must be one of the enum symbols, found {}", v)),
            },
            AvroSchema::Fixed(f) => match v.as_str() {
                Some(s)
                    if s.chars().count() == f.size
                        && s.chars().all(|c| (c as u32) <= 0xFF) =>
                {
                    Ok(())
                }
                _ => Err(format!(
                    "fixed default must be a {}-byte string, found {}",
                    f.size, v
                )),
            },
            AvroSchema::Array(items) => match v.as_array() {
                Some(arr) => {
                    for item in arr {
                        self.default_matches(items, item)?;
                    }
                    Ok(())
                }
                None => Err(format!("array default expected, found {}", v)),
            },
            AvroSchema::Map(values) => match v.as_object() {
                Some(obj) => {
                    for value in obj.values() {
                        self.default_matches(values, value)?;
                    }
                    Ok(())
                }
                None => Err(format!("map default expected, found {}", v)),
            },
            AvroSchema::Union(branches) => match branches.first() {
                Some(first) => self.default_matches(first, v),
                None => Err("union has no branches".to_string()),
            },
            AvroSchema::Record(r) => match v.as_object() {
                Some(obj) => {
                    for field in &r.fields {
                        match obj.get(&field.name) {
                            Some(fv) => self.default_matches(&field.schema, fv)?,
                            None if field.default.is_some() => {}
                            None => {
                                return Err(format!(
                                    "record default missing field '{}'",
                                    field.name
                                ))
                            }
                        }
                    }
                    Ok(())
                }
                None => Err(format!("record default expected, found {}", v)),
            },
            // Forward references can't be checked yet; accept them.
            AvroSchema::Named(n) => match self.named_types.get(n) {
                Some(AvroSchema::Named(_)) | None => Ok(()),
                Some(resolved) => {
                    let resolved = resolved.clone();
                    self.default_matches(&resolved, v)
                }
            },
            AvroSchema::Logical(lt) => self.default_matches(&lt.base, v),
        }
    }
}

/// Largest decimal precision representable in an n-byte two's-complement
/// fixed: the digit count of `2^(8n-1) - 1`.
fn max_decimal_precision(size: usize) -> u64 {
    let bits = (8 * size).saturating_sub(1) as f64;
    (bits * std::f64::consts::LOG10_2).floor() as u64
}
