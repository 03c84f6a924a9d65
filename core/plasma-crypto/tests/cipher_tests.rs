use base64::{Engine, engine::general_purpose::STANDARD};
use plasma_crypto::{
    CryptoError, MasterKey, NONCE_SIZE, TAG_SIZE, seal, seal_str, unseal, unseal_str,
};

fn flip_byte(sealed: &str, index: usize) -> String {
    let mut blob = STANDARD.decode(sealed).unwrap();
    blob[index] ^= 0xFF;
    STANDARD.encode(blob)
}

#[test]
fn sealed_store_file_opens() {
    let key = MasterKey::generate();
    let json = r#"{"7D-0A1B2C3D-4E5F6071-8293A4B5":{"type":"7d"}}"#;
    let sealed = seal_str(&key, json).unwrap();
    assert!(!sealed.contains("7D-"));
    assert_eq!(unseal_str(&key, &sealed).unwrap(), json);
}

#[test]
fn empty_plaintext_is_just_nonce_and_tag() {
    let key = MasterKey::generate();
    let sealed = seal(&key, b"").unwrap();
    assert_eq!(STANDARD.decode(&sealed).unwrap().len(), NONCE_SIZE + TAG_SIZE);
    assert!(unseal(&key, &sealed).unwrap().is_empty());
}

#[test]
fn each_seal_uses_a_fresh_nonce() {
    let key = MasterKey::generate();
    assert_ne!(seal(&key, b"same").unwrap(), seal(&key, b"same").unwrap());
}

#[test]
fn foreign_key_cannot_open() {
    let sealed = seal_str(&MasterKey::generate(), "usage").unwrap();
    let err = unseal_str(&MasterKey::generate(), &sealed).unwrap_err();
    assert!(matches!(err, CryptoError::Decryption(_)));
}

#[test]
fn tampering_is_detected() {
    let key = MasterKey::generate();
    let sealed = seal(&key, b"Secret").unwrap();
    // One byte in the nonce, one in the ciphertext, one in the tag.
    for index in [0, NONCE_SIZE, NONCE_SIZE + 6 + TAG_SIZE - 1] {
        assert!(unseal(&key, &flip_byte(&sealed, index)).is_err(), "byte {index}");
    }
}

#[test]
fn trailing_newline_is_tolerated() {
    let key = MasterKey::generate();
    let sealed = seal_str(&key, "Data").unwrap();
    assert_eq!(unseal_str(&key, &format!("{sealed}\n")).unwrap(), "Data");
}

#[test]
fn truncated_or_garbage_blobs_fail() {
    let key = MasterKey::generate();
    let short = STANDARD.encode([0u8; NONCE_SIZE + TAG_SIZE - 1]);
    for blob in [short.as_str(), "!!!not-base64!!!", "{\"not\": \"sealed\"}", ""] {
        let err = unseal(&key, blob).unwrap_err();
        assert!(matches!(err, CryptoError::Decryption(_)), "{blob:?}");
    }
}

#[test]
fn non_utf8_payload_fails_as_string() {
    let key = MasterKey::generate();
    let sealed = seal(&key, &[0xFF, 0xFE]).unwrap();
    let err = unseal_str(&key, &sealed).unwrap_err();
    assert!(err.to_string().contains("invalid UTF-8"));
}
