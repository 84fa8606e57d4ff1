// Application state module
// Everything a request handler needs, passed explicitly instead of globals

use std::sync::Arc;

use super::types::Config;
use crate::primitive::{PrimitiveCli, Transformer};
use crate::store::ImageStore;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Flat directory holding uploads and generated images
    pub store: ImageStore,
    /// Shape-vectorizing backend
    pub transformer: Arc<dyn Transformer>,
}

impl AppState {
    /// Build state backed by the external `primitive` binary from configuration
    pub fn new(config: &Config) -> Self {
        let mut transformer = PrimitiveCli::new(&config.primitive.binary)
            .with_extra_args(config.primitive.extra_args.clone());
        if let Some(dir) = &config.primitive.scratch_dir {
            transformer = transformer.with_scratch_dir(dir);
        }
        Self::with_transformer(config, Arc::new(transformer))
    }

    /// Build state around an arbitrary transformer
    pub fn with_transformer(config: &Config, transformer: Arc<dyn Transformer>) -> Self {
        Self {
            config: config.clone(),
            store: ImageStore::new(&config.storage.image_dir),
            transformer,
        }
    }
}
