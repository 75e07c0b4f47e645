//! Configuration: types, default locations, XML loading and validation.
//! Precedence is defaults < config.xml < CLI flags; the CLI layer applies the last step.

pub mod paths;
pub mod types;
mod validate;
pub mod xml;

pub use paths::{default_config_path, default_log_path, path_has_symlink_ancestor, CONFIG_ENV};
pub use types::{Config, LogLevel};
pub use xml::{create_template_config, load_config, load_config_from_xml_path};
