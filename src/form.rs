//! Toolkit-independent widget bindings: which fields are shown, grouped how, holding what
//! input, and how that input is written back (Apply).

use crate::error::ConfigError;
use crate::metadata::{FieldType, Metadata};
use crate::statics;
use crate::store::ConfigStore;
use crate::value::ConfigValue;
use indexmap::IndexMap;

/// Current widget state for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInput {
    Toggle(bool),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct FieldBinding {
    pub file: String,
    pub key: String,
    pub label: String,
    pub description: Option<String>,
    pub field_type: FieldType,
    pub input: FieldInput,
}

impl FieldBinding {
    /// The value this binding would write, coerced by the field type.
    pub fn value(&self) -> Result<ConfigValue, ConfigError> {
        match &self.input {
            FieldInput::Toggle(on) => Ok(ConfigValue::Bool(*on)),
            FieldInput::Text(text) => self.field_type.coerce(&self.key, text),
        }
    }

    fn sync_from(&mut self, value: &ConfigValue) {
        self.input = match (&self.input, value) {
            (FieldInput::Toggle(_), ConfigValue::Bool(on)) => FieldInput::Toggle(*on),
            _ => FieldInput::Text(value.display_text()),
        };
    }
}

#[derive(Debug, Clone)]
pub struct FormGroup {
    pub name: String,
    /// Indices into `Form::fields`.
    pub fields: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct FormTab {
    pub name: String,
    pub groups: Vec<FormGroup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub file: String,
    pub key: String,
    pub error: ConfigError,
}

/// Outcome of writing every binding back and flushing the changed files.
#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    pub written: Vec<String>,
    pub unchanged: Vec<String>,
    pub field_errors: Vec<FieldError>,
    pub file_errors: Vec<(String, String)>,
}

impl ApplyReport {
    pub fn is_success(&self) -> bool {
        self.field_errors.is_empty() && self.file_errors.is_empty()
    }

    pub fn summary(&self) -> &'static str {
        if self.is_success() {
            statics::EN_MSG_APPLY_OK
        } else {
            statics::EN_MSG_APPLY_FAILED
        }
    }

    /// One line per failure, for the error bar / stderr.
    pub fn error_lines(&self) -> Vec<String> {
        let fields = self
            .field_errors
            .iter()
            .map(|e| format!("Invalid value for {}: {}", e.key, e.error));
        let files = self
            .file_errors
            .iter()
            .map(|(file, err)| format!("Error processing file {file}: {err}"));
        fields.chain(files).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Form {
    pub tabs: Vec<FormTab>,
    pub fields: Vec<FieldBinding>,
}

impl Form {
    /// Bind every metadata field that resolves to a scalar in a loaded file.
    /// Fields that cannot be bound are skipped with a warning.
    pub fn build(metadata: &Metadata, store: &ConfigStore) -> (Self, Vec<String>) {
        let mut form = Form::default();
        let mut warnings = Vec::new();

        for tab in metadata.tabs() {
            let mut groups: IndexMap<String, Vec<usize>> = IndexMap::new();

            for (file, fields) in &tab.files {
                for (key, meta) in fields {
                    let value = match store.get(file, key) {
                        Ok(ConfigValue::Null) => {
                            tracing::warn!(%file, %key, "field is null");
                            warnings.push(format!(
                                "{key} in {file} is null and cannot be edited here."
                            ));
                            continue;
                        }
                        Ok(value) if value.is_scalar() => value,
                        Ok(value) => {
                            tracing::warn!(%file, %key, kind = value.type_name(), "field is not a scalar");
                            warnings.push(format!(
                                "{key} in {file} is a {} and cannot be edited here.",
                                value.type_name()
                            ));
                            continue;
                        }
                        Err(e) => {
                            tracing::error!(%file, %key, error = %e, "failed to get value");
                            warnings.push(format!(
                                "Failed to get value for {key} in {file}. It may be missing or misspelled."
                            ));
                            continue;
                        }
                    };

                    let field_type = meta.resolved_type(value);
                    let input = match value {
                        ConfigValue::Bool(on) => FieldInput::Toggle(*on),
                        _ => FieldInput::Text(value.display_text()),
                    };

                    let index = form.fields.len();
                    form.fields.push(FieldBinding {
                        file: file.clone(),
                        key: key.clone(),
                        label: meta.label(key).to_string(),
                        description: meta.description.clone(),
                        field_type,
                        input,
                    });
                    groups.entry(meta.group().to_string()).or_default().push(index);
                }
            }

            form.tabs.push(FormTab {
                name: tab.name.clone(),
                groups: groups
                    .into_iter()
                    .map(|(name, fields)| FormGroup { name, fields })
                    .collect(),
            });
        }

        (form, warnings)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn find(&self, file: &str, key: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.file == file && f.key == key)
    }

    /// Copy store values of one file back into its bindings (after a preset load).
    pub fn refresh_file(&mut self, store: &ConfigStore, file: &str) -> Vec<String> {
        let mut warnings = Vec::new();
        for binding in self.fields.iter_mut().filter(|b| b.file == file) {
            match store.get(&binding.file, &binding.key) {
                Ok(value) => binding.sync_from(value),
                Err(e) => {
                    tracing::warn!(file = %binding.file, key = %binding.key, error = %e, "binding not refreshed");
                    warnings.push(e.to_string());
                }
            }
        }
        warnings
    }

    pub fn refresh_all(&mut self, store: &ConfigStore) -> Vec<String> {
        store
            .file_names()
            .iter()
            .flat_map(|file| self.refresh_file(store, file))
            .collect()
    }

    /// Flip the store value behind a toggle right away and sync the widget to it.
    pub fn toggle(&mut self, index: usize, store: &mut ConfigStore) -> Result<bool, ConfigError> {
        let binding = self
            .fields
            .get_mut(index)
            .ok_or(ConfigError::NoSuchField { index })?;
        let on = store.toggle(&binding.file, &binding.key)?;
        binding.input = FieldInput::Toggle(on);
        Ok(on)
    }

    /// Number of bindings whose input would change the store if applied.
    pub fn pending_edits(&self, store: &ConfigStore) -> usize {
        self.fields
            .iter()
            .filter(|b| match (b.value(), store.get(&b.file, &b.key)) {
                (Ok(new), Ok(current)) => new != *current,
                _ => true,
            })
            .count()
    }

    pub fn fields_in(&self, file: &str) -> usize {
        self.fields.iter().filter(|b| b.file == file).count()
    }

    /// Write every binding into the store, then flush each loaded file that changed.
    /// A bad field is recorded and skipped; the rest of its file is still saved.
    pub fn apply(&self, store: &mut ConfigStore) -> ApplyReport {
        let mut report = ApplyReport::default();

        for file in store.file_names() {
            for binding in self.fields.iter().filter(|b| b.file == file) {
                let result = binding
                    .value()
                    .and_then(|value| store.set(&binding.file, &binding.key, value));
                if let Err(error) = result {
                    tracing::error!(file = %binding.file, key = %binding.key, %error, "invalid value");
                    report.field_errors.push(FieldError {
                        file: binding.file.clone(),
                        key: binding.key.clone(),
                        error,
                    });
                }
            }

            match store.flush(&file) {
                Ok(true) => report.written.push(file),
                Ok(false) => report.unchanged.push(file),
                Err(e) => {
                    tracing::error!(%file, error = %format!("{e:#}"), "error processing file");
                    report.file_errors.push((file, format!("{e:#}")));
                }
            }
        }

        report
    }
}
