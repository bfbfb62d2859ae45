//! Path utilities for labhost.
//!
//! - Home directory (launch working directory)
//! - Conda environment registry file
//! - labhost data directory, `.env` overrides and preference file
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - No interactive/terminal I/O - adapters handle user prompts separately
//! - OS-specific logic is kept private in `platform`

mod error;
mod platform;

pub use error::PathError;
pub use platform::{
    binary_file_name, data_root, default_preferences_file, default_registry_file, env_file_path,
    expand_home, home_dir,
};
