#![warn(missing_docs)]
//! tryon - identity-preserving virtual try-on.
//!
//! Restyles the outfit in a portrait through a hosted image-generation API
//! while instructing the model to keep the person's face, hair, skin tone,
//! body shape and pose untouched.
//!
//! # Quick Start
//!
//! ```no_run
//! use tryon::{DataUri, EditRequest, GeminiEditor, ImageEditor};
//!
//! #[tokio::main]
//! async fn main() -> tryon::Result<()> {
//!     let editor = GeminiEditor::builder().api_key("my-key").build()?;
//!     let portrait = DataUri::from_path("me.jpg")?;
//!     let request = EditRequest::new(portrait, "A camel wool overcoat");
//!     let result = editor.edit(&request).await?;
//!     println!("{result}");
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `gemini`: Gemini multimodal generation; a reference garment is sent as an image
//! - `rest`: `/v1/images/generations` endpoint; a reference garment is only named in the prompt
//! - `cli`: Command-line interface

mod error;
pub mod image;
pub mod session;

// Re-export error types at crate root
pub use error::{Result, TryOnError};

pub use image::{
    DataUri, EditRequest, ImageEditor, ImageFormat, ImageLocator, ProviderKind, IDENTITY_DIRECTIVE,
    IDENTITY_DIRECTIVE_VERSION,
};
pub use session::{GenerationRecord, Step, StylePreset, TryOnSession, HISTORY_CAPACITY};

#[cfg(feature = "gemini")]
pub use image::providers::{GeminiEditor, GeminiEditorBuilder, GeminiModel};

#[cfg(feature = "rest")]
pub use image::providers::{RestEditor, RestEditorBuilder};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{Result, TryOnError};
    pub use crate::image::{DataUri, EditRequest, ImageEditor, ImageLocator};
    pub use crate::session::TryOnSession;

    #[cfg(feature = "gemini")]
    pub use crate::image::providers::GeminiEditor;

    #[cfg(feature = "rest")]
    pub use crate::image::providers::RestEditor;
}
