//! testdeck Common Library
//!
//! Shared types for the testdeck client: the catalog model, generated
//! instructions and their two-stage decoding, image attachments and the
//! per-view busy flag.

pub mod busy;
pub mod error;
pub mod image;
pub mod instructions;
pub mod types;

// Re-export commonly used types
pub use busy::{BusyFlag, BusyGuard};
pub use error::{Error, Result};
pub use image::ImageAttachment;
pub use instructions::{
    decode_instructions, FeatureCard, GenerateResponse, GeneratedInstructions, ImproveResponse,
    InstructionFeature,
};
pub use types::*;

/// testdeck version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default directory for client configuration
pub fn default_config_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".testdeck")
}

/// Default configuration file path
pub fn default_config_path() -> std::path::PathBuf {
    default_config_dir().join("config.toml")
}

/// Home directory helper
mod dirs {
    pub fn home_dir() -> Option<std::path::PathBuf> {
        std::env::var_os("HOME").map(std::path::PathBuf::from)
    }
}
