mod common;

use chrono::TimeDelta;
use common::{redeem_view, t0, temp_store_with_codes};
use plasma_license::{CodeBook, CodeRedemption, LicenseError, StorePaths, ValidationReason};
use pretty_assertions::assert_eq;
use std::fs;

#[test]
fn names_are_normalized() {
    assert_eq!(CodeBook::normalize("  welcome30 "), "WELCOME30");
}

#[test]
fn create_generates_underlying_key() {
    let (_dir, mut store, mut codes) = temp_store_with_codes();
    let code = codes
        .create_code_at(&mut store, "welcome", "30D", Some(7), t0())
        .unwrap();

    assert_eq!(code.duration, "30d");
    assert_eq!(code.expiry, Some(t0() + TimeDelta::days(7)));
    assert!(code.license_key.as_str().starts_with("30-"));
    assert!(store.key(code.license_key.as_str()).unwrap().is_some());

    let info = codes.code_info("WELCOME").unwrap().unwrap();
    assert_eq!(info, code);
}

#[test]
fn create_rejects_bad_input() {
    let (_dir, mut store, mut codes) = temp_store_with_codes();

    assert!(matches!(
        codes.create_code_at(&mut store, "   ", "1d", None, t0()),
        Err(LicenseError::InvalidFormat(_))
    ));
    assert!(matches!(
        codes.create_code_at(&mut store, "ZERO", "1d", Some(0), t0()),
        Err(LicenseError::InvalidFormat(_))
    ));
    assert!(matches!(
        codes.create_code_at(&mut store, "BAD", "sometime", None, t0()),
        Err(LicenseError::InvalidFormat(_))
    ));

    codes.create_code_at(&mut store, "dup", "1d", None, t0()).unwrap();
    match codes.create_code_at(&mut store, "DUP", "1w", None, t0()) {
        Err(LicenseError::CodeExists(name)) => assert_eq!(name, "DUP"),
        other => panic!("expected CodeExists, got {other:?}"),
    }

    // Only the one successful code minted a key.
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn redeem_flow() {
    let (_dir, mut store, mut codes) = temp_store_with_codes();
    codes
        .create_code_at(&mut store, "launch", "2h", None, t0())
        .unwrap();
    let at = t0() + TimeDelta::minutes(30);

    let first = codes
        .redeem_code_at(&mut store, "Launch", "alice", "Alice", at)
        .unwrap()
        .unwrap();
    assert_eq!(
        first,
        CodeRedemption::Redeemed {
            duration: "2h".into(),
            time_remaining: Some(TimeDelta::minutes(90)),
        }
    );
    assert!(first.is_redeemed());

    let second = codes
        .redeem_code_at(&mut store, "LAUNCH", "alice", "Alice", at)
        .unwrap()
        .unwrap();
    assert_eq!(second, CodeRedemption::AlreadyRedeemed { redeemed_at: at });

    let bob = codes
        .redeem_code_at(&mut store, "launch", "bob", "Bob", at)
        .unwrap()
        .unwrap();
    assert!(bob.is_redeemed());

    let info = codes.code_info("launch").unwrap().unwrap();
    let labels: Vec<&str> = info.redemptions.iter().map(|u| u.label.as_str()).collect();
    assert_eq!(labels, vec!["Alice", "Bob"]);

    assert!(store.check_access_at(Some("alice"), at).unwrap().has_access);
}

#[test]
fn unknown_code_is_none() {
    let (_dir, mut store, mut codes) = temp_store_with_codes();
    let outcome = codes
        .redeem_code_at(&mut store, "NOPE", "alice", "Alice", t0())
        .unwrap();
    assert_eq!(outcome, None);
}

#[test]
fn expired_code_is_refused() {
    let (_dir, mut store, mut codes) = temp_store_with_codes();
    codes
        .create_code_at(&mut store, "SHORT", "permanent", Some(1), t0())
        .unwrap();
    let expiry = t0() + TimeDelta::days(1);

    let on_boundary = codes
        .redeem_code_at(&mut store, "SHORT", "alice", "Alice", expiry)
        .unwrap()
        .unwrap();
    assert!(on_boundary.is_redeemed());

    let late = codes
        .redeem_code_at(
            &mut store,
            "SHORT",
            "bob",
            "Bob",
            expiry + TimeDelta::seconds(1),
        )
        .unwrap()
        .unwrap();
    assert_eq!(late, CodeRedemption::CodeExpired { expired_at: expiry });
}

#[test]
fn already_redeemed_is_checked_before_expiry() {
    let (_dir, mut store, mut codes) = temp_store_with_codes();
    codes
        .create_code_at(&mut store, "ONCE", "1w", Some(1), t0())
        .unwrap();
    codes
        .redeem_code_at(&mut store, "ONCE", "alice", "Alice", t0())
        .unwrap();

    let later = t0() + TimeDelta::days(3);
    let outcome = codes
        .redeem_code_at(&mut store, "ONCE", "alice", "Alice", later)
        .unwrap()
        .unwrap();
    assert_eq!(outcome, CodeRedemption::AlreadyRedeemed { redeemed_at: t0() });
}

#[test]
fn revoked_key_rejects_code() {
    let (_dir, mut store, mut codes) = temp_store_with_codes();
    let code = codes
        .create_code_at(&mut store, "GONE", "1d", None, t0())
        .unwrap();
    assert!(store.revoke(code.license_key.as_str()).unwrap());

    let outcome = codes
        .redeem_code_at(&mut store, "GONE", "alice", "Alice", t0())
        .unwrap()
        .unwrap();
    assert_eq!(
        outcome,
        CodeRedemption::KeyRejected {
            reason: ValidationReason::UnknownKey
        }
    );
    assert!(codes.code_info("GONE").unwrap().unwrap().redemptions.is_empty());
}

#[test]
fn redeem_through_redeem_only_store() {
    let (dir, mut store, mut codes) = temp_store_with_codes();
    codes
        .create_code_at(&mut store, "SHARED", "1d", None, t0())
        .unwrap();

    let mut redeemer = redeem_view(&dir);
    let outcome = codes
        .redeem_code_at(&mut redeemer, "SHARED", "carol", "Carol", t0())
        .unwrap()
        .unwrap();
    assert!(outcome.is_redeemed());
    assert!(store.check_access_at(Some("carol"), t0()).unwrap().has_access);
}

#[test]
fn remove_and_list() {
    let (_dir, mut store, mut codes) = temp_store_with_codes();
    let b = codes.create_code_at(&mut store, "B", "1d", None, t0()).unwrap();
    codes.create_code_at(&mut store, "A", "1w", None, t0()).unwrap();

    let names: Vec<String> = codes
        .list_codes()
        .unwrap()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(names, vec!["A", "B"]);

    let removed = codes.remove_code("b").unwrap().unwrap();
    assert_eq!(removed, b);
    assert!(codes.remove_code("b").unwrap().is_none());
    assert_eq!(codes.list_codes().unwrap().len(), 1);

    // The underlying key outlives its alias.
    assert!(store.key(b.license_key.as_str()).unwrap().is_some());
}

#[test]
fn code_file_is_sealed() {
    let (dir, mut store, mut codes) = temp_store_with_codes();
    codes
        .create_code_at(&mut store, "SECRET", "1d", None, t0())
        .unwrap();

    let contents = fs::read_to_string(StorePaths::in_dir(dir.path()).custom_codes).unwrap();
    assert!(!contents.contains("SECRET"));
}
