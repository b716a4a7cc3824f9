use std::sync::Arc;

use crate::config::Settings;
use crate::db::{AccountStore, CatalogStore, MemoryStore, PgStore};

/// Shared application state handed to every handler through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub accounts: Arc<dyn AccountStore>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn with_postgres(store: PgStore, settings: Settings) -> Self {
        let store = Arc::new(store);
        Self {
            catalog: store.clone(),
            accounts: store,
            settings: Arc::new(settings),
        }
    }

    pub fn with_memory(store: MemoryStore, settings: Settings) -> Self {
        let store = Arc::new(store);
        Self {
            catalog: store.clone(),
            accounts: store,
            settings: Arc::new(settings),
        }
    }
}
