//! Process configuration: where files live and how long tokens last.

pub mod settings;

pub use settings::Settings;
