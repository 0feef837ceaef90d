//! Task identifiers in the queue's slug format.
//!
//! A slug is the 16 bytes of a v4 UUID, URL-safe base64 without padding
//! (22 characters). The top bit of the first byte is cleared so a slug
//! never starts with `-`, which command-line tools would read as a flag.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use uuid::Uuid;

/// A fresh random slug id.
pub fn slug_id() -> String {
    from_uuid(Uuid::new_v4())
}

/// Encode `uuid` as a slug.
pub fn from_uuid(uuid: Uuid) -> String {
    let mut bytes = *uuid.as_bytes();
    bytes[0] &= 0x7f;
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_is_22_url_safe_chars() {
        for _ in 0..64 {
            let slug = slug_id();
            assert_eq!(slug.len(), 22);
            assert!(slug
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
            assert!(!slug.starts_with('-'), "{slug}");
        }
    }

    #[test]
    fn first_bit_is_cleared() {
        let uuid = Uuid::from_bytes([0xff; 16]);
        let slug = from_uuid(uuid);
        let decoded = URL_SAFE_NO_PAD.decode(&slug).unwrap();
        assert_eq!(decoded[0], 0x7f);
        assert_eq!(&decoded[1..], &[0xff; 15]);
        assert!(slug.starts_with('f'));
    }

    #[test]
    fn slugs_differ() {
        assert_ne!(slug_id(), slug_id());
    }
}
