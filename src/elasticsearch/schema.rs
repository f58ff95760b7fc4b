//! Index schema analysis
//!
//! [`SchemaAnalyzer`] digests an Elasticsearch index definition (settings +
//! mappings, as JSON) and derives the options the translator needs: which
//! fields are not analyzed, which paths are nested or object, the declared
//! multi-fields and the default search field.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use super::translator::EsQueryOptions;

/// Field definition entry produced while walking a mapping
struct FieldEntry {
    /// Dotted path of the field
    path: String,
    /// The field definition object
    def: Map<String, Value>,
    /// `type` of the immediate parent field, when there is one
    parent_type: Option<String>,
}

fn type_of(def: &Map<String, Value>) -> Option<&str> {
    def.get("type").and_then(Value::as_str)
}

/// Analyzer deriving translator options from an index schema.
///
/// Accepts both the modern single-type layout (`mappings.properties`) and
/// the legacy layout with one mapping per document type.
pub struct SchemaAnalyzer {
    settings: Value,
    mappings: Vec<Map<String, Value>>,
}

impl SchemaAnalyzer {
    pub fn new(schema: &Value) -> Self {
        let settings = schema.get("settings").cloned().unwrap_or(Value::Null);
        let mappings_value = schema.get("mappings").cloned().unwrap_or(Value::Null);
        let mappings = if mappings_value.get("properties").is_some() {
            // ES >= 6: one document type per index
            mappings_value.as_object().cloned().into_iter().collect()
        } else {
            // ES < 6: multiple document types per index allowed
            mappings_value
                .as_object()
                .map(|types| {
                    types
                        .values()
                        .filter_map(|m| m.as_object().cloned())
                        .collect()
                })
                .unwrap_or_default()
        };
        Self { settings, mappings }
    }

    /// `settings.query.default_field`, when the schema declares one
    pub fn default_field(&self) -> Option<String> {
        self.settings
            .get("query")
            .and_then(|q| q.get("default_field"))
            .and_then(Value::as_str)
            .map(String::from)
    }

    fn fields(&self, subfields: bool) -> Vec<FieldEntry> {
        let mut entries = Vec::new();
        for mapping in &self.mappings {
            if let Some(properties) = mapping.get("properties").and_then(Value::as_object) {
                collect_fields(properties, "", None, subfields, &mut entries);
            }
        }
        entries
    }

    /// Dotted paths matched as single opaque tokens: anything that is not a
    /// full-text or structural mapping, plus legacy non-analyzed strings
    pub fn not_analyzed_fields(&self) -> BTreeSet<String> {
        let mut fields = BTreeSet::new();
        for entry in self.fields(true) {
            let not_analyzed = match type_of(&entry.def) {
                Some("string") => {
                    entry.def.get("index").and_then(Value::as_str) == Some("not_analyzed")
                }
                Some("text") | Some("nested") | Some("object") => false,
                _ => true,
            };
            if not_analyzed {
                fields.insert(entry.path);
            }
        }
        fields
    }

    /// Dotted nested path to the names of its direct sub-fields
    pub fn nested_fields(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut nested = BTreeMap::new();
        for entry in self.fields(false) {
            if type_of(&entry.def) == Some("nested") {
                let subs = entry
                    .def
                    .get("properties")
                    .and_then(Value::as_object)
                    .map(|props| props.keys().cloned().collect())
                    .unwrap_or_default();
                nested.insert(entry.path, subs);
            }
        }
        nested
    }

    /// Dotted leaf paths living under an explicit `object` mapping
    pub fn object_fields(&self) -> BTreeSet<String> {
        let mut fields = BTreeSet::new();
        for entry in self.fields(false) {
            let under_object = entry.parent_type.as_deref() == Some("object");
            let is_leaf = !matches!(type_of(&entry.def), Some("object") | Some("nested"));
            if under_object && is_leaf {
                fields.insert(entry.path);
            }
        }
        fields
    }

    /// `parent.sub` multi-fields to their type
    pub fn sub_fields(&self) -> BTreeMap<String, String> {
        let mut subs = BTreeMap::new();
        for entry in self.fields(false) {
            if let Some(field_defs) = entry.def.get("fields").and_then(Value::as_object) {
                for (sub_name, sub_def) in field_defs {
                    let sub_type = sub_def
                        .as_object()
                        .and_then(type_of)
                        .or_else(|| type_of(&entry.def))
                        .unwrap_or("keyword");
                    subs.insert(
                        format!("{}.{}", entry.path, sub_name),
                        sub_type.to_string(),
                    );
                }
            }
        }
        subs
    }

    /// Options suitable for [`super::translator::translate`]
    pub fn query_builder_options(&self) -> EsQueryOptions {
        EsQueryOptions {
            default_field: self.default_field(),
            not_analyzed_fields: self.not_analyzed_fields(),
            nested_fields: self.nested_fields(),
            object_fields: Some(self.object_fields()),
            sub_fields: Some(self.sub_fields()),
            ..EsQueryOptions::default()
        }
    }
}

fn collect_fields(
    properties: &Map<String, Value>,
    prefix: &str,
    parent_type: Option<&str>,
    subfields: bool,
    out: &mut Vec<FieldEntry>,
) {
    for (name, def) in properties {
        let Some(def) = def.as_object() else {
            continue;
        };
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };
        out.push(FieldEntry {
            path: path.clone(),
            def: def.clone(),
            parent_type: parent_type.map(String::from),
        });

        if subfields {
            if let Some(field_defs) = def.get("fields").and_then(Value::as_object) {
                for (sub_name, sub_def) in field_defs {
                    // a sub field definition overloads its parent's
                    let mut merged = def.clone();
                    merged.remove("fields");
                    if let Some(sub_def) = sub_def.as_object() {
                        for (k, v) in sub_def {
                            merged.insert(k.clone(), v.clone());
                        }
                    }
                    out.push(FieldEntry {
                        path: format!("{}.{}", path, sub_name),
                        def: merged,
                        parent_type: type_of(def).map(String::from),
                    });
                }
            }
        }

        if let Some(inner) = def.get("properties").and_then(Value::as_object) {
            collect_fields(inner, &path, type_of(def), subfields, out);
        }
    }
}
