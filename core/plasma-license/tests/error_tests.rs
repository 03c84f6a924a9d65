use plasma_crypto::CryptoError;
use plasma_license::LicenseError;
use std::path::PathBuf;

#[test]
fn error_display_invalid_format() {
    let err = LicenseError::InvalidFormat("bad duration".into());
    let msg = format!("{err}");
    assert!(msg.contains("invalid format"));
    assert!(msg.contains("bad duration"));
}

#[test]
fn error_display_code_exists() {
    let err = LicenseError::CodeExists("WELCOME".into());
    assert!(format!("{err}").contains("WELCOME"));
}

#[test]
fn error_display_corrupt_names_file() {
    let err = LicenseError::Corrupt {
        path: PathBuf::from("/data/licenses/valid_keys.json"),
        reason: "decryption failed".into(),
    };
    let msg = format!("{err}");
    assert!(msg.contains("valid_keys.json"));
    assert!(msg.contains("decryption failed"));
}

#[test]
fn error_display_config_and_network() {
    assert!(format!("{}", LicenseError::Config("empty url".into())).contains("configuration"));
    assert!(format!("{}", LicenseError::Network("refused".into())).contains("network"));
}

#[test]
fn error_from_crypto() {
    let err: LicenseError = CryptoError::Decryption("tag mismatch".into()).into();
    assert!(matches!(err, LicenseError::Crypto(_)));
}

#[test]
fn error_from_io() {
    let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err: LicenseError = io_err.into();
    assert!(matches!(err, LicenseError::Io(_)));
    assert!(format!("{err}").contains("IO error"));
}

#[test]
fn error_from_serde() {
    let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: LicenseError = serde_err.into();
    assert!(matches!(err, LicenseError::Serialization(_)));
}
