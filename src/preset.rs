use crate::store::ConfigStore;
use crate::{ConfigValue, statics};
use anyhow::{Context, bail};
use indexmap::IndexMap;
use std::{fs, path::Path};

/// A reusable snapshot: relative config path -> full file contents.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub files: IndexMap<String, ConfigValue>,
}

impl Preset {
    /// Snapshot the in-memory contents of every required file that is loaded.
    pub fn capture(store: &ConfigStore, required: &[String]) -> Self {
        let files = required
            .iter()
            .filter_map(|relative| {
                store
                    .root(relative)
                    .ok()
                    .map(|root| (relative.clone(), root.clone()))
            })
            .collect();
        Self { files }
    }

    pub fn to_value(&self) -> ConfigValue {
        ConfigValue::Object(self.files.clone())
    }

    pub fn from_value(value: ConfigValue) -> anyhow::Result<Self> {
        match value {
            ConfigValue::Object(files) => Ok(Self { files }),
            other => bail!("preset must be a JSON object, found {}", other.type_name()),
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading {path:?}"))?;
        let value = ConfigValue::parse(&text).with_context(|| format!("parsing {path:?}"))?;
        Self::from_value(value).with_context(|| format!("loading preset {path:?}"))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| format!("creating {parent:?}"))?;
        }
        let text = self.to_value().to_pretty_json_with_newline(statics::NL_LF);
        fs::write(path, text).with_context(|| format!("writing {path:?}"))?;
        tracing::info!(path = %path.display(), files = self.files.len(), "saved preset");
        Ok(())
    }

    /// Overwrite the in-memory contents of each required file the preset carries.
    /// Entries for files outside `required`, or not loaded, are ignored.
    /// Returns the files that were replaced; nothing is written to disk.
    pub fn apply_to(&self, store: &mut ConfigStore, required: &[String]) -> Vec<String> {
        let mut replaced = Vec::new();
        for relative in required {
            let Some(contents) = self.files.get(relative) else {
                continue;
            };
            match store.replace(relative, contents.clone()) {
                Ok(()) => replaced.push(relative.clone()),
                Err(e) => tracing::warn!(file = %relative, error = %e, "preset entry skipped"),
            }
        }
        replaced
    }
}
