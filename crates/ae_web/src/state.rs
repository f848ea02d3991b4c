use std::sync::Arc;

use ae_core::{ArticleRepository, ArticleStorage};

pub struct AppState {
    pub repository: ArticleRepository,
}

impl AppState {
    pub fn new(storage: Arc<dyn ArticleStorage>) -> Self {
        Self {
            repository: ArticleRepository::new(storage),
        }
    }
}
