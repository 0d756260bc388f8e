//! Property-based tests for the fieldsign API wire contract
//!
//! The crate is a binary, so these exercise the wire-level invariants
//! (artifact naming, hash shapes) standalone; id validation goes through
//! the engine's own `is_safe_stem`.

use fieldsign_core::is_safe_stem;
use proptest::prelude::*;

// ============================================================
// Artifact Naming
// ============================================================

/// Signed artifact names follow `signed-{documentId}-{millis}.pdf`.
fn artifact_name(doc_id: &str, millis: i64) -> String {
    format!("signed-{}-{}.pdf", doc_id, millis)
}

fn valid_document_id() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,40}"
}

fn unsafe_document_id() -> impl Strategy<Value = String> {
    prop_oneof![
        "\\.\\./[a-z]{1,10}",        // Parent traversal
        "/[a-z]{1,10}",              // Absolute path
        "[a-z]{1,5}/[a-z]{1,5}",     // Nested path
        Just("".to_string()),        // Empty
        "[a-z]{1,5}\\.[a-z]{1,3}",   // Extension smuggling
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn artifact_names_match_the_wire_pattern(
        doc_id in valid_document_id(),
        millis in 0i64..=4_102_444_800_000,
    ) {
        let name = artifact_name(&doc_id, millis);
        let pattern = regex::Regex::new(r"^signed-[a-zA-Z0-9_-]+-\d+\.pdf$").unwrap();
        prop_assert!(pattern.is_match(&name));
    }

    #[test]
    fn valid_document_ids_are_safe_stems(id in valid_document_id()) {
        prop_assert!(is_safe_stem(&id));
    }

    #[test]
    fn path_like_document_ids_are_rejected(id in unsafe_document_id()) {
        prop_assert!(!is_safe_stem(&id));
    }

    // ============================================================
    // Hash Shape
    // ============================================================

    #[test]
    fn content_hashes_are_64_hex_chars(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let hash = fieldsign_hash(&bytes);
        prop_assert_eq!(hash.len(), 64);
        prop_assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn identical_bytes_hash_identically(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        prop_assert_eq!(fieldsign_hash(&bytes), fieldsign_hash(&bytes));
    }

    // ============================================================
    // Field Fractions on the Wire
    // ============================================================

    /// Fractions survive a JSON round trip bit-exactly for the values a
    /// browser actually produces (pixel / container divisions).
    #[test]
    fn field_fractions_round_trip_through_json(
        x_px in 0u32..4000,
        container in 1u32..4000,
    ) {
        let frac = f64::from(x_px) / f64::from(container);
        let json = serde_json::json!({ "xRel": frac });
        let back = json["xRel"].as_f64().unwrap();
        prop_assert_eq!(back, frac);
    }
}

/// Same construction as the engine: SHA-256, hex encoded.
fn fieldsign_hash(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    hex::encode(Sha256::digest(bytes))
}
