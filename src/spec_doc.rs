//! Just enough of an OpenAPI reader to recover enum metadata: load the root
//! document, follow `$ref`s across files, and find a schema by name.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::normalize_path;
use crate::error::{GenerateError, Result};

const MAX_REF_DEPTH: usize = 32;

/// One permitted value of an enum schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumEntry {
    /// Canonical string form: strings verbatim, other scalars as JSON.
    pub raw: String,
    /// Human-readable description; the raw value when the spec has none.
    pub label: String,
    /// Member name from `x-enum-varnames`, if supplied.
    pub name: Option<String>,
}

/// Enum values recovered from the specification for one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecEnumMetadata {
    pub type_name: String,
    pub entries: Vec<EnumEntry>,
}

impl SpecEnumMetadata {
    pub fn get(&self, raw: &str) -> Option<&EnumEntry> {
        self.entries.iter().find(|entry| entry.raw == raw)
    }
}

/// Lower-cased alphanumerics only, so `payment_status`, `Payment-Status`
/// and `PaymentStatus` compare equal.
pub fn normalize_type_name(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

/// A root specification document plus every file loaded while resolving
/// references from it.
pub struct SpecDocument {
    root: PathBuf,
    documents: HashMap<PathBuf, Value>,
}

impl SpecDocument {
    pub fn open(root: &Path) -> Result<Self> {
        let root = normalize_path(root);
        let mut document = Self {
            root: root.clone(),
            documents: HashMap::new(),
        };
        document.load(&root)?;
        Ok(document)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load(&mut self, path: &Path) -> Result<&Value> {
        if !self.documents.contains_key(path) {
            let contents = fs::read_to_string(path).map_err(|err| GenerateError::fs(path, err))?;
            let is_json = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            let value: Value = if is_json {
                serde_json::from_str(&contents)
                    .map_err(|err| GenerateError::spec(path, err.to_string()))?
            } else {
                serde_yaml_bw::from_str(&contents)
                    .map_err(|err| GenerateError::spec(path, err.to_string()))?
            };
            tracing::debug!(document = %path.display(), "loaded specification document");
            self.documents.insert(path.to_path_buf(), value);
        }
        self.documents
            .get(path)
            .ok_or_else(|| GenerateError::spec(path, "document vanished from cache"))
    }

    /// Follows `$ref` chains starting at `value` (found in `document`).
    fn resolve(&mut self, document: &Path, value: &Value) -> Result<Value> {
        let mut current_doc = document.to_path_buf();
        let mut current = value.clone();

        for _ in 0..MAX_REF_DEPTH {
            let Some(reference) = current.get("$ref").and_then(Value::as_str) else {
                return Ok(current);
            };
            let (file, pointer) = match reference.split_once('#') {
                Some((file, pointer)) => (file, pointer),
                None => (reference, ""),
            };
            let target_doc = if file.is_empty() {
                current_doc.clone()
            } else {
                let base = current_doc.parent().unwrap_or(Path::new("."));
                normalize_path(&base.join(file))
            };
            let loaded = self.load(&target_doc)?;
            let target = if pointer.is_empty() {
                loaded.clone()
            } else {
                loaded.pointer(pointer).cloned().ok_or_else(|| {
                    GenerateError::spec(&target_doc, format!("unresolved reference {reference}"))
                })?
            };
            current_doc = target_doc;
            current = target;
        }

        Err(GenerateError::spec(
            document,
            format!("reference chain deeper than {MAX_REF_DEPTH}"),
        ))
    }

    /// Finds the enum schema whose name matches one of `candidates`
    /// (normalized), trying each candidate in order.
    ///
    /// `components.schemas` (or Swagger 2 `definitions`) of the root
    /// document is searched first; then the top-level and component keys of
    /// every document reachable through `$ref`s. A matching schema that is
    /// not an enum does not stop the search.
    pub fn find_enum(&mut self, candidates: &[String]) -> Result<EnumLookup> {
        let mut not_enum = None;
        for candidate in candidates {
            match self.find_component(candidate)? {
                EnumLookup::Found(found) => return Ok(EnumLookup::Found(found)),
                EnumLookup::NotEnum(message) => {
                    not_enum.get_or_insert(message);
                }
                EnumLookup::Missing => {}
            }
        }
        for candidate in candidates {
            match self.find_anywhere(candidate)? {
                EnumLookup::Found(found) => return Ok(EnumLookup::Found(found)),
                EnumLookup::NotEnum(message) => {
                    not_enum.get_or_insert(message);
                }
                EnumLookup::Missing => {}
            }
        }
        Ok(not_enum.map_or(EnumLookup::Missing, EnumLookup::NotEnum))
    }

    fn find_component(&mut self, name: &str) -> Result<EnumLookup> {
        let root = self.root.clone();
        let schemas = {
            let document = self.load(&root)?;
            schema_containers(document)
        };
        self.match_keys(&root, &schemas, name)
    }

    fn find_anywhere(&mut self, name: &str) -> Result<EnumLookup> {
        let mut pending = vec![self.root.clone()];
        let mut visited: BTreeSet<PathBuf> = BTreeSet::new();
        let mut not_enum = None;

        while let Some(path) = pending.pop() {
            if !visited.insert(path.clone()) {
                continue;
            }
            let document = self.load(&path)?.clone();
            let mut keys = schema_containers(&document);
            if let Some(top) = document.as_object() {
                keys.extend(top.iter().map(|(key, value)| (key.clone(), value.clone())));
            }

            match self.match_keys(&path, &keys, name)? {
                EnumLookup::Found(found) => return Ok(EnumLookup::Found(found)),
                EnumLookup::NotEnum(message) => {
                    not_enum.get_or_insert(message);
                }
                EnumLookup::Missing => {}
            }

            let mut refs = Vec::new();
            collect_refs(&document, &mut refs);
            let base = path.parent().unwrap_or(Path::new(".")).to_path_buf();
            for reference in refs {
                let file = reference.split('#').next().unwrap_or_default();
                if file.is_empty() {
                    continue;
                }
                let target = normalize_path(&base.join(file));
                if target.is_file() && !visited.contains(&target) {
                    pending.push(target);
                }
            }
        }
        Ok(not_enum.map_or(EnumLookup::Missing, EnumLookup::NotEnum))
    }

    /// Resolves each entry of `keys` whose name matches `name` and returns
    /// the first one that is an enum.
    fn match_keys(
        &mut self,
        document: &Path,
        keys: &[(String, Value)],
        name: &str,
    ) -> Result<EnumLookup> {
        let wanted = normalize_type_name(name);
        let mut not_enum = None;
        for (key, schema) in keys {
            if !schema.is_object() || normalize_type_name(key) != wanted {
                continue;
            }
            let resolved = self.resolve(document, schema)?;
            match extract_enum(key, &resolved) {
                Ok(found) => return Ok(EnumLookup::Found(found)),
                Err(message) => {
                    not_enum.get_or_insert(message);
                }
            }
        }
        Ok(not_enum.map_or(EnumLookup::Missing, EnumLookup::NotEnum))
    }
}

/// Outcome of looking an enum type up by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumLookup {
    Found(SpecEnumMetadata),
    /// A schema with that name exists but does not declare an enum.
    NotEnum(String),
    Missing,
}

/// Entries of `components.schemas` and `definitions`.
fn schema_containers(document: &Value) -> Vec<(String, Value)> {
    ["/components/schemas", "/definitions"]
        .iter()
        .filter_map(|pointer| document.pointer(pointer).and_then(Value::as_object))
        .flat_map(|schemas| schemas.iter())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn collect_refs(value: &Value, refs: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key == "$ref" {
                    if let Some(reference) = child.as_str() {
                        refs.push(reference.to_string());
                    }
                    continue;
                }
                collect_refs(child, refs);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_refs(item, refs);
            }
        }
        _ => {}
    }
}

/// Reads `enum` (+ `x-enum-varnames` / `x-enum-descriptions`) or a `oneOf`
/// list of `const` alternatives.
pub fn extract_enum(type_name: &str, schema: &Value) -> std::result::Result<SpecEnumMetadata, String> {
    if let Some(values) = schema.get("enum").and_then(Value::as_array) {
        let names = string_list(schema, &["x-enum-varnames", "x-enumNames"]);
        let descriptions = string_list(schema, &["x-enum-descriptions", "x-enumDescriptions"]);

        let mut entries = Vec::with_capacity(values.len());
        for (index, value) in values.iter().enumerate() {
            let raw = raw_value(value)
                .ok_or_else(|| format!("enum {type_name} has a non-scalar value at index {index}"))?;
            let label = descriptions
                .get(index)
                .filter(|label| !label.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| raw.clone());
            entries.push(EnumEntry {
                raw,
                label,
                name: names.get(index).filter(|name| !name.is_empty()).cloned(),
            });
        }
        return Ok(SpecEnumMetadata {
            type_name: type_name.to_string(),
            entries,
        });
    }

    if let Some(variants) = schema.get("oneOf").and_then(Value::as_array) {
        let mut entries = Vec::with_capacity(variants.len());
        for variant in variants {
            let value = variant
                .get("const")
                .or_else(|| {
                    variant
                        .get("enum")
                        .and_then(Value::as_array)
                        .filter(|values| values.len() == 1)
                        .and_then(|values| values.first())
                })
                .ok_or_else(|| format!("oneOf in {type_name} is not a list of constants"))?;
            let raw = raw_value(value)
                .ok_or_else(|| format!("enum {type_name} has a non-scalar constant"))?;
            let title = variant.get("title").and_then(Value::as_str);
            let label = variant
                .get("description")
                .and_then(Value::as_str)
                .or(title)
                .map(str::to_string)
                .unwrap_or_else(|| raw.clone());
            entries.push(EnumEntry {
                raw,
                label,
                name: title.map(str::to_string),
            });
        }
        return Ok(SpecEnumMetadata {
            type_name: type_name.to_string(),
            entries,
        });
    }

    Err(format!("schema {type_name} does not declare an enum"))
}

fn string_list(schema: &Value, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .find_map(|key| schema.get(*key).and_then(Value::as_array))
        .map(|items| {
            items
                .iter()
                .map(|item| raw_value(item).unwrap_or_default())
                .collect()
        })
        .unwrap_or_default()
}

fn raw_value(value: &Value) -> Option<String> {
    match value {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        Value::Bool(value) => Some(value.to_string()),
        Value::Null => Some("null".to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn extracts_descriptions_and_names() {
        let schema = json!({
            "type": "integer",
            "enum": [1, 2],
            "x-enum-varnames": ["NEW", "PAID"],
            "x-enum-descriptions": ["Created", ""]
        });
        let meta = extract_enum("PaymentStatus", &schema).unwrap();
        assert_eq!(meta.entries[0].raw, "1");
        assert_eq!(meta.entries[0].label, "Created");
        assert_eq!(meta.entries[0].name.as_deref(), Some("NEW"));
        assert_eq!(meta.entries[1].label, "2");
    }

    #[test]
    fn extracts_one_of_constants() {
        let schema = json!({
            "oneOf": [
                { "const": "card", "title": "CARD", "description": "Bank card" },
                { "const": "cash" }
            ]
        });
        let meta = extract_enum("PaymentMethod", &schema).unwrap();
        assert_eq!(meta.entries[0].label, "Bank card");
        assert_eq!(meta.entries[1].label, "cash");
        assert!(meta.entries[1].name.is_none());
    }

    #[test]
    fn rejects_schema_without_enum() {
        let schema = json!({ "type": "string" });
        assert!(extract_enum("Name", &schema).is_err());
    }

    #[test]
    fn normalizes_case_and_separators() {
        assert_eq!(normalize_type_name("Payment-Status_enum"), "paymentstatusenum");
    }
}
