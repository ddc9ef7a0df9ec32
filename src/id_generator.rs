//! Identifier generation for specifications and products.
//!
//! Identifiers are random (version 4) UUIDs rendered in their hyphenated
//! form. They are opaque to every other component: nothing parses them back,
//! they are only compared for equality and used as map keys.

use uuid::Uuid;

/// Returns a fresh identifier, unique within the process with overwhelming
/// probability (122 random bits).
pub fn new_id() -> String {
    Uuid::new_v4().hyphenated().to_string()
}
