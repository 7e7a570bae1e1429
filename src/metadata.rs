use crate::error::ConfigError;
use crate::statics;
use crate::value::{ConfigValue, Number};
use anyhow::Context;
use indexmap::IndexMap;
use serde::Deserialize;
use std::{fmt, fs, path::Path};

/// Declared type of a field. Drives widget choice and how entry text is coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum FieldType {
    Bool,
    Int,
    Float,
    String,
}

impl TryFrom<String> for FieldType {
    type Error = String;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        match tag.to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Ok(FieldType::Bool),
            "int" | "integer" => Ok(FieldType::Int),
            "float" | "number" => Ok(FieldType::Float),
            "string" | "str" => Ok(FieldType::String),
            _ => Err(format!("unknown field type `{tag}`")),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldType::Bool => statics::EN_TYPE_BOOL,
            FieldType::Int => statics::EN_TYPE_INT,
            FieldType::Float => statics::EN_TYPE_FLOAT,
            FieldType::String => statics::EN_TYPE_STRING,
        })
    }
}

impl FieldType {
    /// Type implied by a value already in a config file.
    pub fn infer(value: &ConfigValue) -> FieldType {
        match value {
            ConfigValue::Bool(_) => FieldType::Bool,
            ConfigValue::Number(n) if n.is_float() => FieldType::Float,
            ConfigValue::Number(_) => FieldType::Int,
            _ => FieldType::String,
        }
    }

    /// Convert entry text into a value of this type.
    pub fn coerce(self, key: &str, text: &str) -> Result<ConfigValue, ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: text.to_string(),
            expected: self,
        };
        let trimmed = text.trim();

        match self {
            FieldType::String => Ok(ConfigValue::String(text.to_string())),
            FieldType::Int => {
                if let Ok(v) = trimmed.parse::<i64>() {
                    return Ok(ConfigValue::Number(Number::I64(v)));
                }
                trimmed
                    .parse::<u64>()
                    .map(|v| ConfigValue::Number(Number::U64(v)))
                    .map_err(|_| invalid())
            }
            FieldType::Float => trimmed
                .parse::<f64>()
                .map(|v| ConfigValue::Number(Number::F64(v)))
                .map_err(|_| invalid()),
            FieldType::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(ConfigValue::Bool(true)),
                "false" | "0" | "no" | "off" => Ok(ConfigValue::Bool(false)),
                _ => Err(invalid()),
            },
        }
    }
}

/// Descriptive data for one configurable field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FieldMeta {
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    #[serde(rename = "type", default)]
    pub field_type: Option<FieldType>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl FieldMeta {
    pub fn label<'a>(&'a self, key: &'a str) -> &'a str {
        self.display_name
            .as_deref()
            .unwrap_or_else(|| key.rsplit('.').next().unwrap_or(key))
    }

    pub fn group(&self) -> &str {
        self.group.as_deref().unwrap_or(statics::META_DEFAULT_GROUP)
    }

    /// Declared type, or the type of the current value when none is declared.
    /// A boolean value is always a bool field, whatever the declaration says.
    pub fn resolved_type(&self, current: &ConfigValue) -> FieldType {
        if let ConfigValue::Bool(_) = current {
            return FieldType::Bool;
        }
        self.field_type.unwrap_or_else(|| FieldType::infer(current))
    }
}

/// One notebook tab: relative config file -> dotted key -> field metadata, in source order.
#[derive(Debug, Clone)]
pub struct Tab {
    pub name: String,
    pub files: IndexMap<String, IndexMap<String, FieldMeta>>,
}

type RawMetadata = IndexMap<String, IndexMap<String, IndexMap<String, FieldMeta>>>;

/// The static field catalog plus a reverse lookup from dotted key to owning file.
#[derive(Debug, Clone)]
pub struct Metadata {
    tabs: Vec<Tab>,
    lookup: IndexMap<String, (String, FieldMeta)>,
}

impl Metadata {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading {path:?}"))?;
        Self::parse(&text).with_context(|| format!("parsing metadata {path:?}"))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let raw: RawMetadata = json5::from_str(text)?;
        Ok(Self::from_tabs(
            raw.into_iter()
                .map(|(name, files)| Tab { name, files })
                .collect(),
        ))
    }

    pub fn from_tabs(tabs: Vec<Tab>) -> Self {
        let mut lookup = IndexMap::new();
        for tab in &tabs {
            for (file, fields) in &tab.files {
                for (key, meta) in fields {
                    // Later declarations of the same key take over ownership.
                    lookup.insert(key.clone(), (file.clone(), meta.clone()));
                }
            }
        }
        Self { tabs, lookup }
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn owner_of(&self, key: &str) -> Option<&str> {
        self.lookup.get(key).map(|(file, _)| file.as_str())
    }

    pub fn field(&self, key: &str) -> Option<&FieldMeta> {
        self.lookup.get(key).map(|(_, meta)| meta)
    }

    /// Metadata declared for `key` under `file`. The last declaration wins when a file
    /// appears in more than one tab.
    pub fn field_in(&self, file: &str, key: &str) -> Option<&FieldMeta> {
        self.tabs
            .iter()
            .rev()
            .find_map(|tab| tab.files.get(file).and_then(|fields| fields.get(key)))
    }

    /// Field type for `key` in `file` given its current value; inferred when undeclared.
    pub fn type_for(&self, file: &str, key: &str, current: &ConfigValue) -> FieldType {
        match self.field_in(file, key) {
            Some(meta) => meta.resolved_type(current),
            None => FieldType::infer(current),
        }
    }

    /// Resolve a key to its owner and metadata, failing with `UnknownKey`.
    pub fn resolve(&self, key: &str) -> Result<(&str, &FieldMeta), ConfigError> {
        self.lookup
            .get(key)
            .map(|(file, meta)| (file.as_str(), meta))
            .ok_or_else(|| ConfigError::UnknownKey {
                key: key.to_string(),
            })
    }

    /// Every dotted key with its owning file, in lookup order.
    pub fn keys(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lookup
            .iter()
            .map(|(key, (file, _))| (key.as_str(), file.as_str()))
    }

    pub fn field_count(&self) -> usize {
        self.lookup.len()
    }
}
