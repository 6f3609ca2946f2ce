use std::sync::Arc;

use crate::state::registry::SubscriberRegistry;

/// Shared state handed to the HTTP routes.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SubscriberRegistry>,
}

impl AppState {
    pub fn new(registry: Arc<SubscriberRegistry>) -> Self {
        Self { registry }
    }
}
