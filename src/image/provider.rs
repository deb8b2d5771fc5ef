//! Image-edit provider trait.

use crate::error::Result;
use crate::image::types::{EditRequest, ImageLocator, ProviderKind};
use async_trait::async_trait;

/// Default client-side timeout for a single edit call.
pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(120);

/// Trait for image-edit providers.
///
/// Implementations perform exactly one outbound call per [`edit`](Self::edit),
/// never retry, and keep no state between calls.
#[async_trait]
pub trait ImageEditor: Send + Sync {
    /// Restyles the outfit in `request.source_image`, keeping the subject's identity.
    async fn edit(&self, request: &EditRequest) -> Result<ImageLocator>;

    /// Returns the kind of this provider.
    fn kind(&self) -> ProviderKind;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str {
        match self.kind() {
            ProviderKind::Gemini => "Gemini (Google)",
            ProviderKind::Rest => "Image generation REST API",
        }
    }
}

#[async_trait]
impl<T: ImageEditor + ?Sized> ImageEditor for Box<T> {
    async fn edit(&self, request: &EditRequest) -> Result<ImageLocator> {
        (**self).edit(request).await
    }

    fn kind(&self) -> ProviderKind {
        (**self).kind()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<T: ImageEditor + ?Sized> ImageEditor for std::sync::Arc<T> {
    async fn edit(&self, request: &EditRequest) -> Result<ImageLocator> {
        (**self).edit(request).await
    }

    fn kind(&self) -> ProviderKind {
        (**self).kind()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
