use crate::value::ConfigValue;
use crate::statics;
use anyhow::Context;
use indexmap::IndexMap;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// Directories of an SPT install, derived from the user-chosen base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerLayout {
    pub base_dir: PathBuf,
    pub server_dir: PathBuf,
    pub config_dir: PathBuf,
    pub database_dir: PathBuf,
    pub presets_dir: PathBuf,
}

impl ServerLayout {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let server_dir = base_dir
            .join(statics::SPT_DATA_DIR)
            .join(statics::SPT_SERVER_DIR);
        let presets_dir = statics::SPT_PRESETS_DIR
            .iter()
            .fold(base_dir.clone(), |dir, part| dir.join(part));

        Self {
            config_dir: server_dir.join(statics::SPT_CONFIGS_DIR),
            database_dir: server_dir.join(statics::SPT_DATABASE_DIR),
            server_dir,
            presets_dir,
            base_dir,
        }
    }

    /// Absolute path of a config file given relative to the server dir.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.server_dir.join(relative)
    }

    pub fn looks_valid(&self) -> bool {
        self.server_dir.is_dir()
    }
}

/// The small settings file remembering which base directory was picked last time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppSettings {
    pub base_directory: Option<PathBuf>,
}

impl AppSettings {
    /// Default location: the per-user config dir, or the working directory when there is none.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join(statics::APP_DIR_NAME).join(statics::SETTINGS_FILE))
            .unwrap_or_else(|| PathBuf::from(statics::SETTINGS_FILE))
    }

    /// Read the settings file. A missing file yields defaults; a broken one is logged and ignored.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::try_load(path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %format!("{e:#}"), "error accessing settings file");
                Self::default()
            }
        }
    }

    fn try_load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading {path:?}"))?;
        let value = ConfigValue::parse(&text).with_context(|| format!("parsing {path:?}"))?;
        let base_directory = value
            .as_object()
            .and_then(|o| o.get(statics::SETTINGS_KEY_BASE_DIR))
            .and_then(ConfigValue::as_str)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        Ok(Self { base_directory })
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| format!("creating {parent:?}"))?;
        }
        let mut map = IndexMap::new();
        if let Some(dir) = &self.base_directory {
            map.insert(
                statics::SETTINGS_KEY_BASE_DIR.to_string(),
                ConfigValue::String(dir.to_string_lossy().into_owned()),
            );
        }
        let text = ConfigValue::Object(map).to_pretty_json();
        fs::write(path, text).with_context(|| format!("writing {path:?}"))
    }

    /// The saved base directory, if it still exists.
    pub fn existing_base_dir(&self) -> Option<&Path> {
        self.base_directory.as_deref().filter(|dir| dir.exists())
    }
}

/// Where the bundled metadata and required-files list are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resources {
    pub metadata: PathBuf,
    pub required_files: PathBuf,
}

impl Resources {
    pub fn bundled() -> Self {
        Self {
            metadata: resource_path(statics::RESOURCE_METADATA),
            required_files: resource_path(statics::RESOURCE_REQUIRED_FILES),
        }
    }

    pub fn load_required_files(&self) -> anyhow::Result<Vec<String>> {
        let text = fs::read_to_string(&self.required_files)
            .with_context(|| format!("reading {:?}", self.required_files))?;
        let list: Vec<String> = json5::from_str(&text)
            .with_context(|| format!("parsing required files list {:?}", self.required_files))?;
        Ok(list)
    }
}

/// Resolve a bundled resource: next to the executable first, then the working directory.
pub fn resource_path(name: &str) -> PathBuf {
    let exe_candidate = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(statics::RESOURCE_DIR).join(name)));

    match exe_candidate {
        Some(candidate) if candidate.exists() => candidate,
        _ => PathBuf::from(statics::RESOURCE_DIR).join(name),
    }
}

/// Recursively list files under `dir` whose name ends with `.{ext}`.
/// Keys are `/`-separated paths relative to `dir`. Errors are logged and yield an empty map.
pub fn scan_directory(dir: &Path, ext: &str) -> BTreeMap<String, PathBuf> {
    let mut found = BTreeMap::new();
    if let Err(e) = scan_into(dir, dir, ext, &mut found) {
        tracing::error!(dir = %dir.display(), error = %format!("{e:#}"), "error scanning directory");
        return BTreeMap::new();
    }
    found
}

fn scan_into(
    root: &Path,
    dir: &Path,
    ext: &str,
    found: &mut BTreeMap<String, PathBuf>,
) -> anyhow::Result<()> {
    let entries = fs::read_dir(dir).with_context(|| format!("reading {dir:?}"))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("reading {dir:?}"))?;
        let path = entry.path();
        if path.is_dir() {
            scan_into(root, &path, ext, found)?;
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(ext) {
            continue;
        }
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        found.insert(key, path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{AppSettings, ServerLayout, scan_directory};
    use std::{fs, path::PathBuf};

    #[test]
    fn layout_derives_spt_directories() {
        let layout = ServerLayout::new("/games/spt");
        assert_eq!(layout.server_dir, PathBuf::from("/games/spt/SPT_Data/Server"));
        assert_eq!(
            layout.config_dir,
            PathBuf::from("/games/spt/SPT_Data/Server/configs")
        );
        assert_eq!(
            layout.database_dir,
            PathBuf::from("/games/spt/SPT_Data/Server/database")
        );
        assert_eq!(
            layout.presets_dir,
            PathBuf::from("/games/spt/user/mods/turtles-serverconfig/presets")
        );
        assert_eq!(
            layout.resolve("configs/core.json"),
            PathBuf::from("/games/spt/SPT_Data/Server/configs/core.json")
        );
    }

    #[test]
    fn settings_roundtrip_and_ignore_missing_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config_dir.json");

        assert_eq!(AppSettings::load(&path), AppSettings::default());

        let settings = AppSettings {
            base_directory: Some(dir.path().to_path_buf()),
        };
        settings.save(&path).unwrap();
        let loaded = AppSettings::load(&path);
        assert_eq!(loaded, settings);
        assert_eq!(loaded.existing_base_dir(), Some(dir.path()));

        let gone = AppSettings {
            base_directory: Some(dir.path().join("does-not-exist")),
        };
        assert_eq!(gone.existing_base_dir(), None);
    }

    #[test]
    fn broken_settings_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config_dir.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(AppSettings::load(&path), AppSettings::default());
    }

    #[test]
    fn scan_directory_finds_nested_json_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("configs")).unwrap();
        fs::write(dir.path().join("configs").join("core.json"), "{}").unwrap();
        fs::write(dir.path().join("readme.txt"), "x").unwrap();
        fs::write(dir.path().join("top.json"), "{}").unwrap();

        let found = scan_directory(dir.path(), "json");
        let keys: Vec<&str> = found.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["configs/core.json", "top.json"]);

        assert!(scan_directory(&dir.path().join("missing"), "json").is_empty());
    }
}
