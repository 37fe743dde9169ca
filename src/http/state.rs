use std::sync::Arc;

use crate::auth::Auth;
use crate::book::{Catalog, RatingEngine};
use crate::config::Config;
use crate::store::RecordStore;
use crate::uploads::{ImageProcessor, WebpProcessor};

/// Everything a request handler needs, built once at startup.
pub struct AppState<S> {
    pub auth: Auth<S>,
    pub catalog: Catalog<S>,
    pub ratings: RatingEngine<S>,
    pub config: Config,
}

impl<S: RecordStore + Clone> AppState<S> {
    /// State with the WebP processor writing into `config.uploads_dir`.
    pub fn new(store: S, config: Config) -> Arc<Self> {
        let images = Arc::new(WebpProcessor::new(
            config.uploads_dir.clone(),
            config.image_max_width,
        ));
        Self::with_images(store, config, images)
    }

    pub fn with_images(store: S, config: Config, images: Arc<dyn ImageProcessor>) -> Arc<Self> {
        Arc::new(Self {
            auth: Auth::from_config(store.clone(), &config),
            catalog: Catalog::new(store.clone(), images, config.public_url.clone()),
            ratings: RatingEngine::new(store),
            config,
        })
    }
}
