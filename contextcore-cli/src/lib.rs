pub mod settings;

pub use settings::{load_config, resolve_config, Overrides};
