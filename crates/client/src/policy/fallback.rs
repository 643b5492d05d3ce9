//! Synthesized response for requests that can be answered neither by the
//! network nor by the cache.

use cacheward_core::ResponseSnapshot;

pub const OFFLINE_STATUS: u16 = 503;
pub const OFFLINE_CONTENT_TYPE: &str = "text/plain";
pub const OFFLINE_BODY: &str = "Offline";

pub fn offline_response() -> ResponseSnapshot {
    ResponseSnapshot::new(
        OFFLINE_STATUS,
        vec![
            ("content-type".to_string(), OFFLINE_CONTENT_TYPE.to_string()),
            ("cache-control".to_string(), "no-store".to_string()),
        ],
        OFFLINE_BODY,
    )
}
