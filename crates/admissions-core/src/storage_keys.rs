//! Deterministic object keys.
//!
//! Each `(owner, slot)` pair maps to exactly one key, so retrying an upload overwrites
//! the previous object instead of leaving a new orphan behind.

use crate::constants::OBJECT_KEY_PREFIX;
use crate::models::FileSlot;
use uuid::Uuid;

/// Key of the object stored for `owner_id`'s `slot`.
pub fn object_key(owner_id: Uuid, slot: FileSlot) -> String {
    format!("{}/{}/{}", OBJECT_KEY_PREFIX, owner_id, slot.as_str())
}

/// Split a deterministic key back into its owner and slot.
///
/// Returns `None` for anything that is not exactly `applications/{uuid}/{slot}`.
pub fn parse_object_key(key: &str) -> Option<(Uuid, FileSlot)> {
    let mut parts = key.split('/');
    let prefix = parts.next()?;
    let owner = parts.next()?;
    let slot = parts.next()?;
    if prefix != OBJECT_KEY_PREFIX || parts.next().is_some() {
        return None;
    }
    let owner_id = Uuid::parse_str(owner).ok()?;
    // Reject non-canonical spellings (uppercase, braces, urn form)
    if owner_id.to_string() != owner {
        return None;
    }
    let slot = slot.parse::<FileSlot>().ok()?;
    Some((owner_id, slot))
}

/// Whether `key` is one of `owner_id`'s deterministic keys.
pub fn is_owned_by(key: &str, owner_id: Uuid) -> bool {
    matches!(parse_object_key(key), Some((owner, _)) if owner == owner_id)
}
