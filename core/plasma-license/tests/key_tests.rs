mod common;

use common::{t0, temp_store};
use plasma_license::{KeyId, KeyString, MAX_USES_PER_IDENTITY};
use proptest::prelude::*;

// ── KeyString ────────────────────────────────────────────────────

#[test]
fn mint_slices_the_id() {
    let id = KeyId::new();
    let key = KeyString::mint("7D", &id);
    let hex = id.to_hex().to_uppercase();

    assert_eq!(
        key.as_str(),
        format!("7D-{}-{}-{}", &hex[0..8], &hex[8..16], &hex[16..24])
    );
    assert_eq!(key.type_code(), "7D");
    assert_eq!(key.to_string(), key.as_str());
}

#[test]
fn key_ids_are_unique() {
    let a = KeyId::new();
    let b = KeyId::new();
    assert_ne!(a, b);
    assert_eq!(a.to_hex().len(), 32);
}

#[test]
fn well_formed_shapes() {
    assert!(KeyString::is_well_formed("7D-0123ABCD-89ABCDEF-00000000"));
    assert!(KeyString::is_well_formed("PM-AAAAAAAA-BBBBBBBB-CCCCCCCC"));
    assert!(KeyString::is_well_formed("100-AAAAAAAA-BBBBBBBB-CCCCCCCC"));

    assert!(!KeyString::is_well_formed(""));
    assert!(!KeyString::is_well_formed("7D-0123abcd-89ABCDEF-00000000"));
    assert!(!KeyString::is_well_formed("7D-0123ABCD-89ABCDEF"));
    assert!(!KeyString::is_well_formed("1000-AAAAAAAA-BBBBBBBB-CCCCCCCC"));
    assert!(!KeyString::is_well_formed("7D-0123ABC-89ABCDEF-00000000"));
    assert!(!KeyString::is_well_formed("7D-GGGGGGGG-89ABCDEF-00000000"));
}

#[test]
fn key_string_serializes_as_plain_string() {
    let key = KeyString::mint("PM", &KeyId::new());
    let json = serde_json::to_string(&key).unwrap();
    assert_eq!(json, format!("\"{key}\""));
}

// ── LicenseKey ───────────────────────────────────────────────────

#[test]
fn fresh_key_record() {
    let (_dir, mut store) = temp_store();
    let key = store.generate_at("1w", None, t0()).unwrap();
    let record = store.key(key.as_str()).unwrap().unwrap();

    assert_eq!(record.key_type(), "1w");
    assert_eq!(record.max_uses(), MAX_USES_PER_IDENTITY);
    assert!(record.used_by().is_empty());
    assert!(record.custom_data().is_none());
    assert!(!record.is_expired_at(t0()));
}

#[test]
fn record_json_uses_type_field() {
    let (_dir, mut store) = temp_store();
    let key = store.generate_at("permanent", None, t0()).unwrap();
    let record = store.key(key.as_str()).unwrap().unwrap();

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["type"], "permanent");
    assert!(json["expiry"].is_null());
    assert_eq!(json["max_uses"], 1);

    let summary = serde_json::to_value(record.summary(&key)).unwrap();
    assert_eq!(summary["key"], key.as_str());
    assert_eq!(summary["type"], "permanent");
    assert_eq!(summary["used_count"], 0);
}

proptest! {
    #[test]
    fn minted_keys_are_well_formed(code in "[0-9A-Z]{1,3}") {
        let key = KeyString::mint(&code, &KeyId::new());
        prop_assert!(KeyString::is_well_formed(key.as_str()));
        prop_assert_eq!(key.type_code(), code.as_str());
    }
}
