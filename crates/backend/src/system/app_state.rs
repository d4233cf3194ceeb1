use std::sync::Arc;

use crate::shared::data::store::CartridgeStore;

/// Состояние приложения, общее для всех обработчиков
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CartridgeStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn CartridgeStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn CartridgeStore {
        self.store.as_ref()
    }
}
