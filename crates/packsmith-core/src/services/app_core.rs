//! `AppCore` - the application facade handed to adapters.

use std::sync::Arc;

use super::{ArtifactWriter, PanelService, ProductPipeline, SessionStore, TrellisService};
use crate::ports::{ChatGenerator, ImageGenerator, ModelGenerator, StateRepository};

/// Concrete port implementations chosen at the composition root.
#[derive(Clone)]
pub struct Ports {
    pub state: Arc<dyn StateRepository>,
    pub images: Arc<dyn ImageGenerator>,
    pub chat: Arc<dyn ChatGenerator>,
    pub models: Arc<dyn ModelGenerator>,
}

/// Access to every core service over one shared session store.
///
/// ```ignore
/// let core = AppCore::new(ports).with_artifacts(writer);
/// let status = core.product().start_create(prompt, 3).await?;
/// ```
pub struct AppCore {
    product: ProductPipeline,
    panels: PanelService,
    trellis: TrellisService,
    images: Arc<dyn ImageGenerator>,
    chat: Arc<dyn ChatGenerator>,
}

impl AppCore {
    pub fn new(ports: Ports) -> Self {
        let store = SessionStore::new(ports.state);
        Self {
            product: ProductPipeline::new(
                store.clone(),
                ports.images.clone(),
                ports.models.clone(),
            ),
            panels: PanelService::new(store.clone(), ports.images.clone()),
            trellis: TrellisService::new(store, ports.models),
            images: ports.images,
            chat: ports.chat,
        }
    }

    /// Save product runs to disk.
    #[must_use]
    pub fn with_artifacts(mut self, writer: ArtifactWriter) -> Self {
        self.product = self.product.with_artifacts(writer);
        self
    }

    pub const fn product(&self) -> &ProductPipeline {
        &self.product
    }

    pub const fn panels(&self) -> &PanelService {
        &self.panels
    }

    pub const fn trellis(&self) -> &TrellisService {
        &self.trellis
    }

    /// Image port for one-off edits.
    pub fn images(&self) -> &dyn ImageGenerator {
        self.images.as_ref()
    }

    pub fn chat(&self) -> &dyn ChatGenerator {
        self.chat.as_ref()
    }
}
