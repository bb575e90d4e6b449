use std::time::Duration;

use crate::core::RequestContext;
use crate::store::{DocumentQueryService, KeyValueStore};

/// Shared application state for HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub kv: KeyValueStore,
    pub documents: DocumentQueryService,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(
        kv: KeyValueStore,
        documents: DocumentQueryService,
        request_timeout: Duration,
    ) -> Self {
        Self {
            kv,
            documents,
            request_timeout,
        }
    }

    /// Context for the store calls of one request.
    pub fn request_context(&self) -> RequestContext {
        RequestContext::with_timeout(self.request_timeout)
    }
}
