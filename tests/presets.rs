use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use turtles_serverconfig::paths::ServerLayout;
use turtles_serverconfig::{ConfigStore, ConfigValue, Metadata, Preset, Session};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

const METADATA: &str = r#"{
    "Raid": {
        "configs/inraid.json": {
            "save.loot": { "displayName": "Keep Loot", "type": "bool", "group": "After Raid" },
            "carExtractBaseStandingGain": { "displayName": "Car Extract Gain", "type": "float" }
        }
    },
    "Economy": {
        "configs/ragfair.json": {
            "sell.chance.base": { "displayName": "Base Sell Chance", "type": "int", "group": "Selling" }
        }
    }
}"#;

fn server_fixture(base: &Path) -> Result<ServerLayout> {
    let layout = ServerLayout::new(base);
    fs::create_dir_all(&layout.config_dir)?;
    fs::write(
        layout.resolve("configs/inraid.json"),
        r#"{"save": {"loot": true}, "carExtractBaseStandingGain": 0.4}"#,
    )?;
    fs::write(
        layout.resolve("configs/ragfair.json"),
        r#"{"sell": {"chance": {"base": 50}}}"#,
    )?;
    Ok(layout)
}

fn required() -> Vec<String> {
    vec![
        "configs/inraid.json".to_string(),
        "configs/ragfair.json".to_string(),
    ]
}

#[test]
fn save_then_load_reproduces_the_store() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let layout = server_fixture(dir.path())?;
    let (mut store, _) = ConfigStore::load_required(&layout.server_dir, &required());

    let preset_path = layout.presets_dir.join("baseline.json");
    let baseline = Preset::capture(&store, &required());
    baseline.save(&preset_path)?;
    assert!(preset_path.exists());

    store.set("configs/inraid.json", "save.loot", ConfigValue::Bool(false))?;
    store.set(
        "configs/ragfair.json",
        "sell.chance.base",
        ConfigValue::parse("80")?,
    )?;

    let loaded = Preset::load(&preset_path)?;
    assert_eq!(loaded, baseline);
    let replaced = loaded.apply_to(&mut store, &required());
    assert_eq!(replaced, required());

    assert_eq!(Preset::capture(&store, &required()), baseline);
    assert!(store.dirty_files().is_empty());
    Ok(())
}

#[test]
fn entries_outside_the_required_list_are_ignored() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let layout = server_fixture(dir.path())?;
    let (mut store, _) = ConfigStore::load_required(&layout.server_dir, &required());

    let preset = Preset::from_value(ConfigValue::parse(
        r#"{
            "configs/ragfair.json": {"sell": {"chance": {"base": 75}}},
            "configs/unknown.json": {"x": 1}
        }"#,
    )?)?;

    let replaced = preset.apply_to(&mut store, &required());
    assert_eq!(replaced, vec!["configs/ragfair.json".to_string()]);
    assert!(!store.contains("configs/unknown.json"));
    assert_eq!(
        store.get("configs/ragfair.json", "sell.chance.base")?,
        &ConfigValue::parse("75")?
    );
    Ok(())
}

#[test]
fn session_preset_load_waits_for_apply() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let layout = server_fixture(dir.path())?;
    let metadata = Metadata::parse(METADATA)?;
    let (mut session, warnings) = Session::from_parts(layout, required(), metadata);
    assert!(warnings.is_empty());

    let path = session.default_preset_path("no-loot");
    assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("no-loot.json"));

    let mut preset = session.capture_preset();
    *preset
        .files
        .get_mut("configs/inraid.json")
        .and_then(|v| v.as_object_mut())
        .and_then(|o| o.get_mut("save"))
        .and_then(|v| v.as_object_mut())
        .and_then(|o| o.get_mut("loot"))
        .ok_or("save.loot")? = ConfigValue::Bool(false);
    preset.save(&path)?;

    let inraid = session.layout.resolve("configs/inraid.json");
    let before = fs::read(&inraid)?;

    let (replaced, warnings) = session.load_preset(&path)?;
    assert_eq!(replaced, required());
    assert!(warnings.is_empty());

    // Bindings follow the store, disk does not.
    let idx = session
        .form
        .find("configs/inraid.json", "save.loot")
        .ok_or("binding")?;
    assert_eq!(session.form.fields[idx].value()?, ConfigValue::Bool(false));
    assert_eq!(fs::read(&inraid)?, before);

    let report = session.apply();
    assert!(report.is_success());
    assert_eq!(report.written, vec!["configs/inraid.json".to_string()]);
    assert_eq!(report.unchanged, vec!["configs/ragfair.json".to_string()]);

    let on_disk = ConfigValue::parse(&fs::read_to_string(&inraid)?)?;
    assert_eq!(
        on_disk.child("save").and_then(|s| s.child("loot")),
        Some(&ConfigValue::Bool(false))
    );
    Ok(())
}

#[test]
fn a_preset_must_be_an_object() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("bad.json");
    fs::write(&path, "[1, 2, 3]")?;
    assert!(Preset::load(&path).is_err());
    Ok(())
}
