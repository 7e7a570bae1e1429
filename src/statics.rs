// Central place for UI strings and other non-localized constants.
// Keep these out of gui.rs to reduce duplication and make tweaks safer.

// English UI strings (EN_ prefix to make future localization easier)
pub const EN_APP_TITLE: &str = "Turtles Server Config";

pub const EN_BTN_APPLY: &str = "Apply Changes";
pub const EN_BTN_SAVE_PRESET: &str = "Save Preset";
pub const EN_BTN_LOAD_PRESET: &str = "Load Preset";
pub const EN_BTN_FILES: &str = "Files";
pub const EN_BTN_CHANGE_FOLDER: &str = "Change Folder...";
pub const EN_BTN_SELECT_FOLDER: &str = "Select Folder...";
pub const EN_BTN_ABOUT: &str = "About";
pub const EN_BTN_TOGGLE_THEME: &str = "Theme";
pub const EN_BTN_CLEAR: &str = "Clear";
pub const EN_BTN_CLOSE: &str = "Close";
pub const EN_BTN_YES: &str = "Yes";
pub const EN_BTN_NO: &str = "No";
pub const EN_BTN_CANCEL: &str = "Cancel";

pub const EN_TIP_APPLY: &str = "Apply the changes to the configuration files.";
pub const EN_TIP_SAVE_PRESET: &str = "Save the current configuration as a preset.";
pub const EN_TIP_LOAD_PRESET: &str = "Load a configuration preset.";

pub const EN_WINDOW_ABOUT: &str = "About";
pub const EN_WINDOW_FILES: &str = "Files";
pub const EN_WINDOW_WARNINGS: &str = "Warnings";
pub const EN_WINDOW_EXIT: &str = "Exit";

pub const EN_ABOUT_VERSION: &str = "Version:";
pub const EN_ABOUT_BODY: &str = "Edits SPT server configs in SPT_Data/Server. Presets live in user/mods/turtles-serverconfig/presets.";
pub const EN_LABEL_BASE_DIR: &str = "Base directory:";

pub const EN_HOME_HEADING: &str = "Turtles Server Config";
pub const EN_HOME_INSTRUCTIONS: &str = "Please select the base directory where SPT_Data is located.";
pub const EN_PICK_BASE_DIR_TITLE: &str = "Select the base directory where SPT_Data is located";

pub const EN_EXIT_PROMPT: &str = "Do you want to apply current settings before exiting?";

pub const EN_MSG_APPLY_OK: &str = "All configurations saved successfully!";
pub const EN_MSG_APPLY_FAILED: &str =
    "Some configurations failed to save. Please check the logs for details.";
pub const EN_MSG_PRESET_SAVED: &str = "Preset saved successfully!";
pub const EN_MSG_PRESET_LOADED: &str = "Preset loaded successfully! - Don't Forget to APPLY!";

pub const EN_COL_FILE: &str = "File";
pub const EN_COL_STATUS: &str = "Status";
pub const EN_COL_FIELDS: &str = "Fields";
pub const EN_STATUS_LOADED: &str = "loaded";
pub const EN_STATUS_MODIFIED: &str = "modified";
pub const EN_STATUS_MISSING: &str = "missing";
pub const EN_LABEL_PENDING_EDITS: &str = "unapplied edits:";

pub const EN_FORM_EMPTY: &str = "No editable fields. Check the metadata file and the warnings.";
pub const EN_TAB_EMPTY: &str = "No fields in this tab could be loaded.";

pub const EN_FILTER_JSON: &str = "JSON files";
pub const EN_LITERAL_NULL: &str = "null";
pub const EN_EMPTY: &str = "";

pub const EN_TYPE_NULL: &str = "null";
pub const EN_TYPE_BOOL: &str = "bool";
pub const EN_TYPE_INT: &str = "int";
pub const EN_TYPE_FLOAT: &str = "float";
pub const EN_TYPE_STRING: &str = "string";
pub const EN_TYPE_ARRAY: &str = "array";
pub const EN_TYPE_OBJECT: &str = "object";

// Newline constants (used for write formatting; keep out of store/value code).
pub const NL_LF: &str = "\n";
pub const NL_CRLF: &str = "\r\n";

pub const JSON_EXT: &str = "json";

// Metadata defaults.
pub const META_DEFAULT_GROUP: &str = "General";

// SPT install layout (SPT_ prefix), all relative to the chosen base directory.
pub const SPT_DATA_DIR: &str = "SPT_Data";
pub const SPT_SERVER_DIR: &str = "Server";
pub const SPT_CONFIGS_DIR: &str = "configs";
pub const SPT_DATABASE_DIR: &str = "database";
pub const SPT_PRESETS_DIR: &[&str] = &["user", "mods", "turtles-serverconfig", "presets"];

// Local files.
pub const APP_DIR_NAME: &str = "turtles-serverconfig";
pub const SETTINGS_FILE: &str = "config_dir.json";
pub const SETTINGS_KEY_BASE_DIR: &str = "base_directory";
pub const LOG_FILE: &str = "error.log";
pub const RESOURCE_DIR: &str = "assets";
pub const RESOURCE_METADATA: &str = "metadata.json";
pub const RESOURCE_REQUIRED_FILES: &str = "required_files.json";
