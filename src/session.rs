use crate::form::{ApplyReport, Form};
use crate::metadata::Metadata;
use crate::paths::{Resources, ServerLayout};
use crate::preset::Preset;
use crate::statics;
use crate::store::ConfigStore;
use anyhow::Context;
use std::path::{Path, PathBuf};

/// Everything loaded for one base directory: store, metadata, and the bound form.
#[derive(Debug, Clone)]
pub struct Session {
    pub layout: ServerLayout,
    pub required: Vec<String>,
    pub store: ConfigStore,
    pub metadata: Metadata,
    pub form: Form,
}

impl Session {
    /// Load the required-files list, the configs, and the metadata, then bind the form.
    /// A missing list or metadata file is fatal; missing configs and unbindable fields
    /// come back as warnings.
    pub fn open(layout: ServerLayout, resources: &Resources) -> anyhow::Result<(Self, Vec<String>)> {
        let required = resources
            .load_required_files()
            .context("Failed to load required files list.")?;
        let metadata =
            Metadata::load(&resources.metadata).context("Failed to load metadata file.")?;
        Ok(Self::from_parts(layout, required, metadata))
    }

    pub fn from_parts(
        layout: ServerLayout,
        required: Vec<String>,
        metadata: Metadata,
    ) -> (Self, Vec<String>) {
        if !layout.looks_valid() {
            tracing::warn!(dir = %layout.server_dir.display(), "server directory not found");
        }

        let (store, mut warnings) = ConfigStore::load_required(&layout.server_dir, &required);
        let (form, form_warnings) = Form::build(&metadata, &store);
        warnings.extend(form_warnings);

        tracing::info!(
            base = %layout.base_dir.display(),
            files = store.len(),
            fields = form.len(),
            warnings = warnings.len(),
            "session opened"
        );

        (
            Self {
                layout,
                required,
                store,
                metadata,
                form,
            },
            warnings,
        )
    }

    pub fn apply(&mut self) -> ApplyReport {
        let report = self.form.apply(&mut self.store);
        tracing::info!(
            written = report.written.len(),
            unchanged = report.unchanged.len(),
            errors = report.field_errors.len() + report.file_errors.len(),
            "applied changes"
        );
        report
    }

    pub fn capture_preset(&self) -> Preset {
        Preset::capture(&self.store, &self.required)
    }

    pub fn save_preset(&self, path: &Path) -> anyhow::Result<()> {
        self.capture_preset()
            .save(path)
            .context("Error saving preset")
    }

    /// Load a preset into memory and refresh the bindings. Returns the replaced files
    /// and any refresh warnings. Nothing is written until `apply`.
    pub fn load_preset(&mut self, path: &Path) -> anyhow::Result<(Vec<String>, Vec<String>)> {
        let preset = Preset::load(path).context("Error loading preset")?;
        let replaced = preset.apply_to(&mut self.store, &self.required);
        let warnings = replaced
            .iter()
            .flat_map(|file| self.form.refresh_file(&self.store, file))
            .collect();
        Ok((replaced, warnings))
    }

    /// Default preset file name inside the presets dir.
    pub fn default_preset_path(&self, name: &str) -> PathBuf {
        let mut path = self.layout.presets_dir.join(name);
        if path.extension().is_none() {
            path.set_extension(statics::JSON_EXT);
        }
        path
    }
}
