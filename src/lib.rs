//! Core library for Turtles Server Config.
//! Loads SPT server JSON configs, overlays field metadata, binds editable fields,
//! and writes validated values back only when they change.

pub mod error;
pub mod form;
mod gui;
pub mod metadata;
pub mod paths;
pub mod preset;
pub mod session;
pub mod statics;
pub mod store;
mod value;

pub use error::ConfigError;
pub use gui::{GuiOptions, run_gui};
pub use metadata::{FieldMeta, FieldType, Metadata};
pub use preset::Preset;
pub use session::Session;
pub use store::{ConfigFile, ConfigStore};
pub use value::{ConfigValue, Number};
