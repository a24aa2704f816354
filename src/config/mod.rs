pub mod env;
pub mod types;
mod validators;

// Re-export all public types
pub use env::apply_env_overrides;
pub use types::*;
