use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use turtles_serverconfig::{ConfigError, ConfigStore, ConfigValue};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn write_config(server_dir: &Path, relative: &str, text: &str) -> Result<()> {
    let path = server_dir.join(relative);
    fs::create_dir_all(path.parent().ok_or("no parent")?)?;
    fs::write(path, text)?;
    Ok(())
}

fn assert_all_lf_are_crlf(bytes: &[u8]) {
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'\n' {
            assert!(i > 0 && bytes[i - 1] == b'\r', "found bare LF at {i}");
        }
    }
}

#[test]
fn unmodified_file_is_never_rewritten() -> Result<()> {
    let dir = tempfile::tempdir()?;
    // Hand-edited layout the writer would not produce: 2-space indent, trailing comma.
    let input = "{\n  \"a\": 1,\n  \"b\": [1, 2,],\n}\n";
    write_config(dir.path(), "configs/core.json", input)?;

    let required = vec!["configs/core.json".to_string()];
    let (mut store, warnings) = ConfigStore::load_required(dir.path(), &required);
    assert!(warnings.is_empty());

    // Same value written back: still not dirty.
    store.set("configs/core.json", "a", ConfigValue::parse("1.0")?)?;
    assert!(!store.is_dirty("configs/core.json"));
    assert!(!store.flush("configs/core.json")?);

    let on_disk = fs::read_to_string(dir.path().join("configs/core.json"))?;
    assert_eq!(on_disk, input);
    Ok(())
}

#[test]
fn modified_file_is_written_in_server_layout() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_config(
        dir.path(),
        "configs/inraid.json",
        r#"{"save": {"loot": true, "durability": 0.5}, "maps": ["woods", "bigmap"], "extra": {}, "name": "Café"}"#,
    )?;

    let required = vec!["configs/inraid.json".to_string()];
    let (mut store, _) = ConfigStore::load_required(dir.path(), &required);

    assert!(!store.toggle("configs/inraid.json", "save.loot")?);
    assert_eq!(store.dirty_files(), vec!["configs/inraid.json".to_string()]);
    assert!(store.flush("configs/inraid.json")?);
    assert!(!store.is_dirty("configs/inraid.json"));

    let expected = "{\n    \"save\": {\n        \"loot\": false,\n        \"durability\": 0.5\n    },\n    \"maps\": [\n        \"woods\",\n        \"bigmap\"\n    ],\n    \"extra\": {},\n    \"name\": \"Caf\\u00e9\"\n}";
    let on_disk = fs::read_to_string(dir.path().join("configs/inraid.json"))?;
    assert_eq!(on_disk, expected);

    // A second flush has nothing to do.
    assert!(!store.flush("configs/inraid.json")?);
    Ok(())
}

#[test]
fn crlf_files_keep_crlf() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_config(
        dir.path(),
        "configs/bot.json",
        "{\r\n    \"maxBotCap\": {\r\n        \"default\": 20\r\n    }\r\n}\r\n",
    )?;

    let required = vec!["configs/bot.json".to_string()];
    let (mut store, _) = ConfigStore::load_required(dir.path(), &required);
    store.set(
        "configs/bot.json",
        "maxBotCap.default",
        ConfigValue::parse("25")?,
    )?;
    assert!(store.flush("configs/bot.json")?);

    let bytes = fs::read(dir.path().join("configs/bot.json"))?;
    assert!(bytes.contains(&b'\r'));
    assert_all_lf_are_crlf(&bytes);
    Ok(())
}

#[test]
fn flush_recreates_missing_parent_directories() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_config(dir.path(), "configs/deep/trader.json", r#"{"updateTimeDefault": 3600}"#)?;

    let required = vec!["configs/deep/trader.json".to_string()];
    let (mut store, _) = ConfigStore::load_required(dir.path(), &required);
    fs::remove_dir_all(dir.path().join("configs"))?;

    store.set(
        "configs/deep/trader.json",
        "updateTimeDefault",
        ConfigValue::parse("1800")?,
    )?;
    assert!(store.flush("configs/deep/trader.json")?);
    assert_eq!(
        fs::read_to_string(dir.path().join("configs/deep/trader.json"))?,
        "{\n    \"updateTimeDefault\": 1800\n}"
    );
    Ok(())
}

#[test]
fn missing_files_are_skipped_with_a_warning() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_config(dir.path(), "configs/core.json", "{}")?;
    write_config(dir.path(), "configs/broken.json", "{ not json")?;

    let required = vec![
        "configs/core.json".to_string(),
        "configs/ghost.json".to_string(),
        "configs/broken.json".to_string(),
    ];
    let (store, warnings) = ConfigStore::load_required(dir.path(), &required);

    assert_eq!(store.file_names(), vec!["configs/core.json".to_string()]);
    assert_eq!(
        warnings,
        vec![
            "Failed to load configuration file: configs/ghost.json. It may be missing or misspelled."
                .to_string(),
            "Failed to load configuration file: configs/broken.json. It may be missing or misspelled."
                .to_string(),
        ]
    );
    Ok(())
}

#[test]
fn set_never_creates_keys() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_config(dir.path(), "configs/core.json", r#"{"features": {"a": true}}"#)?;

    let required = vec!["configs/core.json".to_string()];
    let (mut store, _) = ConfigStore::load_required(dir.path(), &required);

    let err = store
        .set("configs/core.json", "features.b", ConfigValue::Bool(true))
        .unwrap_err();
    assert_eq!(
        err,
        ConfigError::NotFound {
            file: "configs/core.json".to_string(),
            key: "features.b".to_string(),
        }
    );
    assert!(!store.is_dirty("configs/core.json"));

    let err = store.get("configs/other.json", "a").unwrap_err();
    assert_eq!(
        err,
        ConfigError::FileNotLoaded {
            file: "configs/other.json".to_string()
        }
    );
    Ok(())
}
