use domains::CacheKey;
use sha1::{Digest, Sha1};

/// Digest of the server id immediately followed by the item id.
///
/// No salt and no separator: keys must stay stable across restarts and match
/// entries written by earlier deployments.
pub fn derive_cache_key(server_id: &str, item_id: &str) -> CacheKey {
    let mut hasher = Sha1::new();
    hasher.update(server_id.as_bytes());
    hasher.update(item_id.as_bytes());
    CacheKey::from_digest(hasher.finalize().into())
}
