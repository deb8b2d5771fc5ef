//! Outfit editing: request types, instruction text, and providers.

pub mod prompt;
mod provider;
pub mod providers;
mod types;

pub use prompt::{compose_instruction, IDENTITY_DIRECTIVE, IDENTITY_DIRECTIVE_VERSION};
pub use provider::{ImageEditor, DEFAULT_TIMEOUT};
pub use types::{DataUri, EditRequest, ImageFormat, ImageLocator, ProviderKind};
