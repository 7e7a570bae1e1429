use crate::error::ConfigError;
use crate::{ConfigValue, statics};
use anyhow::Context;
use indexmap::IndexMap;
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => statics::NL_LF,
            LineEnding::CrLf => statics::NL_CRLF,
        }
    }
}

/// One loaded config file. `snapshot` is the contents as last read from or written to disk.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub full_path: PathBuf,
    pub line_ending: LineEnding,
    pub root: ConfigValue,
    snapshot: ConfigValue,
}

impl ConfigFile {
    pub fn load_path(path: &Path) -> anyhow::Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("reading {path:?}"))?;
        let line_ending = detect_line_ending(&bytes);
        let text = std::str::from_utf8(&bytes).context("config file is not valid UTF-8")?;
        // Tolerate a UTF-8 BOM left behind by Windows editors.
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let root = ConfigValue::parse(text).with_context(|| format!("parsing {path:?}"))?;

        Ok(Self {
            full_path: path.to_path_buf(),
            line_ending,
            snapshot: root.clone(),
            root,
        })
    }

    pub fn is_dirty(&self) -> bool {
        self.root != self.snapshot
    }

    pub fn snapshot(&self) -> &ConfigValue {
        &self.snapshot
    }

    pub fn generate_bytes(&self) -> Vec<u8> {
        self.root
            .to_pretty_json_with_newline(self.line_ending.as_str())
            .into_bytes()
    }

    /// Write to disk only when the contents differ from the snapshot.
    pub fn flush(&mut self) -> anyhow::Result<bool> {
        if !self.is_dirty() {
            return Ok(false);
        }

        if let Some(parent) = self.full_path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {parent:?}"))?;
        }
        let bytes = self.generate_bytes();
        fs::write(&self.full_path, &bytes)
            .with_context(|| format!("writing {:?}", self.full_path))?;

        self.snapshot = self.root.clone();
        tracing::info!(path = %self.full_path.display(), "saved config file");
        Ok(true)
    }
}

/// In-memory copies of the tracked config files, keyed by path relative to the server dir.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    files: IndexMap<String, ConfigFile>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every required file under `server_dir`. Files that fail to load are skipped
    /// and reported as warnings so the rest of the editor stays usable.
    pub fn load_required(server_dir: &Path, required: &[String]) -> (Self, Vec<String>) {
        let mut store = Self::new();
        let mut warnings = Vec::new();

        for relative in required {
            let full = server_dir.join(relative);
            match ConfigFile::load_path(&full) {
                Ok(file) => {
                    store.files.insert(relative.clone(), file);
                }
                Err(e) => {
                    tracing::error!(file = %relative, error = %format!("{e:#}"), "failed to load configuration file");
                    warnings.push(format!(
                        "Failed to load configuration file: {relative}. It may be missing or misspelled."
                    ));
                }
            }
        }

        (store, warnings)
    }

    pub fn insert(&mut self, relative: impl Into<String>, file: ConfigFile) {
        self.files.insert(relative.into(), file);
    }

    pub fn contains(&self, relative: &str) -> bool {
        self.files.contains_key(relative)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> impl Iterator<Item = (&str, &ConfigFile)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn file_names(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    pub fn file(&self, relative: &str) -> Result<&ConfigFile, ConfigError> {
        self.files
            .get(relative)
            .ok_or_else(|| ConfigError::FileNotLoaded {
                file: relative.to_string(),
            })
    }

    fn file_mut(&mut self, relative: &str) -> Result<&mut ConfigFile, ConfigError> {
        self.files
            .get_mut(relative)
            .ok_or_else(|| ConfigError::FileNotLoaded {
                file: relative.to_string(),
            })
    }

    pub fn root(&self, relative: &str) -> Result<&ConfigValue, ConfigError> {
        Ok(&self.file(relative)?.root)
    }

    pub fn get(&self, relative: &str, dotted: &str) -> Result<&ConfigValue, ConfigError> {
        let miss = || not_found(relative, dotted);
        let mut current = self.root(relative)?;
        for segment in split_path(dotted).ok_or_else(miss)? {
            current = current.child(segment).ok_or_else(miss)?;
        }
        Ok(current)
    }

    /// Replace the value at `dotted`. The full path must already exist.
    pub fn set(&mut self, relative: &str, dotted: &str, value: ConfigValue) -> Result<(), ConfigError> {
        let slot = self.slot_mut(relative, dotted)?;
        *slot = value;
        Ok(())
    }

    /// Flip a boolean in place and return its new value.
    pub fn toggle(&mut self, relative: &str, dotted: &str) -> Result<bool, ConfigError> {
        let slot = self.slot_mut(relative, dotted)?;
        let Some(current) = slot.as_bool() else {
            return Err(ConfigError::NotBool {
                file: relative.to_string(),
                key: dotted.to_string(),
            });
        };
        *slot = ConfigValue::Bool(!current);
        Ok(!current)
    }

    /// Swap a whole file's contents. Nothing is written until `flush`.
    pub fn replace(&mut self, relative: &str, root: ConfigValue) -> Result<(), ConfigError> {
        self.file_mut(relative)?.root = root;
        Ok(())
    }

    pub fn is_dirty(&self, relative: &str) -> bool {
        self.files.get(relative).is_some_and(ConfigFile::is_dirty)
    }

    pub fn dirty_files(&self) -> Vec<String> {
        self.files
            .iter()
            .filter(|(_, f)| f.is_dirty())
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn flush(&mut self, relative: &str) -> anyhow::Result<bool> {
        let file = self.file_mut(relative)?;
        file.flush()
            .with_context(|| format!("Failed to save configuration file: {relative}"))
    }

    fn slot_mut(&mut self, relative: &str, dotted: &str) -> Result<&mut ConfigValue, ConfigError> {
        let segments = split_path(dotted).ok_or_else(|| not_found(relative, dotted))?;
        let mut current = &mut self.file_mut(relative)?.root;
        for segment in segments {
            current = current
                .child_mut(segment)
                .ok_or_else(|| not_found(relative, dotted))?;
        }
        Ok(current)
    }
}

fn not_found(relative: &str, dotted: &str) -> ConfigError {
    ConfigError::NotFound {
        file: relative.to_string(),
        key: dotted.to_string(),
    }
}

/// Split `a.b.c` into segments; `None` for an empty path or an empty segment.
fn split_path(dotted: &str) -> Option<Vec<&str>> {
    let segments: Vec<&str> = dotted.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }
    Some(segments)
}

fn detect_line_ending(text_bytes: &[u8]) -> LineEnding {
    // Count actual newline terminators; a few stray CRLF lines should not flip the file.
    let mut lf_count = 0usize;
    let mut crlf_count = 0usize;

    for (i, b) in text_bytes.iter().enumerate() {
        if *b != b'\n' {
            continue;
        }
        if i > 0 && text_bytes[i - 1] == b'\r' {
            crlf_count += 1;
        } else {
            lf_count += 1;
        }
    }

    if crlf_count > lf_count {
        LineEnding::CrLf
    } else {
        LineEnding::Lf
    }
}
