use std::sync::Arc;

use crate::cache::TtlCache;
use crate::client::NotionClient;
use crate::mapping::StreamRecord;

/// Shared state for the proxy's handlers.
#[derive(Clone)]
pub struct ProxyState {
    pub client: Arc<NotionClient>,
    /// Cached `GET /api/streams` result; cleared by every write.
    pub streams: Arc<TtlCache<Vec<StreamRecord>>>,
}
