use chrono::{TimeDelta, TimeZone, Utc};
use plasma_license::{
    BanList, CodeBook, DEFAULT_BAN_REASON, IdentityHash, LicenseError, LicenseStore,
};
use plasma_license_server::admin::{
    MAX_KEYS_PER_REQUEST, ban_user, generate_keys, render_ban_list, render_code_info,
    render_code_list, render_key_list,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn temp_store() -> (TempDir, LicenseStore) {
    let dir = TempDir::new().unwrap();
    let store = LicenseStore::open_dir(dir.path()).unwrap();
    (dir, store)
}

#[test]
fn generate_keys_mints_the_requested_count() {
    let (_dir, mut store) = temp_store();
    let keys = generate_keys(&mut store, "1w", 3).unwrap();
    assert_eq!(keys.len(), 3);
    assert!(keys.iter().all(|k| k.as_str().starts_with("1W-")));
    assert_eq!(store.list().unwrap().len(), 3);
}

#[test]
fn generate_keys_enforces_bounds() {
    let (_dir, mut store) = temp_store();
    for count in [0, MAX_KEYS_PER_REQUEST + 1] {
        let err = generate_keys(&mut store, "1d", count).unwrap_err();
        assert!(matches!(err, LicenseError::InvalidFormat(_)));
    }
    assert!(store.list().unwrap().is_empty());

    assert_eq!(
        generate_keys(&mut store, "1d", MAX_KEYS_PER_REQUEST).unwrap().len(),
        MAX_KEYS_PER_REQUEST as usize
    );
}

#[test]
fn generate_keys_rejects_bad_duration() {
    let (_dir, mut store) = temp_store();
    assert!(generate_keys(&mut store, "forever-ish", 2).is_err());
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn key_list_marks_expiry() {
    let (_dir, mut store) = temp_store();
    let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    let short = store.generate_at("1h", None, t0).unwrap();
    let forever = store.generate_at("permanent", None, t0).unwrap();

    let later = t0 + TimeDelta::hours(2);
    let out = render_key_list(&store.list().unwrap(), later);
    let short_line = out.lines().find(|l| l.starts_with(short.as_str())).unwrap();
    assert!(short_line.contains("expired 2025-03-01 13:00"));
    let forever_line = out.lines().find(|l| l.starts_with(forever.as_str())).unwrap();
    assert!(forever_line.contains("never"));
    assert!(forever_line.ends_with("used by 0"));

    assert_eq!(render_key_list(&[], later), "No license keys issued yet.");
}

#[test]
fn code_list_shows_state() {
    let (_dir, mut store) = temp_store();
    let mut codes = CodeBook::open(store.paths()).unwrap();
    let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    codes.create_code_at(&mut store, "spring", "30d", Some(1), t0).unwrap();
    codes.create_code_at(&mut store, "open", "7d", None, t0).unwrap();
    codes
        .redeem_code_at(&mut store, "OPEN", "alice", "Alice", t0)
        .unwrap();
    codes
        .redeem_code_at(&mut store, "OPEN", "bob", "Bob", t0)
        .unwrap();

    let out = render_code_list(&codes.list_codes().unwrap(), t0 + TimeDelta::days(2));
    assert!(out.contains("SPRING - 30d (EXPIRED)"));
    assert!(out.contains("OPEN - 7d (used by 2 users)"));

    assert_eq!(render_code_list(&[], t0), "No custom codes created yet.");
}

#[test]
fn code_info_lists_recent_redemptions() {
    let (_dir, mut store) = temp_store();
    let mut codes = CodeBook::open(store.paths()).unwrap();
    let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    let created = codes.create_code_at(&mut store, "party", "1d", None, t0).unwrap();

    let fresh = render_code_info("party", &created);
    assert!(fresh.starts_with("Code: PARTY\n"));
    assert!(fresh.contains(&format!("License key: {}", created.license_key)));
    assert!(fresh.contains("Never expires"));
    assert!(fresh.contains("Available (no redemptions yet)"));

    for i in 0..7 {
        let at = t0 + TimeDelta::minutes(i);
        codes
            .redeem_code_at(&mut store, "party", &format!("guest-{i}"), &format!("Guest {i}"), at)
            .unwrap();
    }
    let code = codes.code_info("PARTY").unwrap().unwrap();
    let out = render_code_info("PARTY", &code);

    assert!(out.contains("Redemptions (7):"));
    assert!(!out.contains("Guest 1 "));
    assert!(out.contains("Guest 2 "));
    assert!(out.contains("Guest 6 "));
    assert!(out.contains("  ... and 2 more"));
    assert!(out.contains(IdentityHash::of("guest-6").short()));
    assert!(!out.contains("guest-6"));
}

#[test]
fn ban_joins_reason_words() {
    let (_dir, store) = temp_store();
    let mut bans = BanList::open(store.paths()).unwrap();

    let words: Vec<String> = ["violation", "of", "terms"].map(String::from).into();
    let record = ban_user(&mut bans, 123_456_789, &words).unwrap();
    assert_eq!(record.reason, "violation of terms");

    let bare = ban_user(&mut bans, 5, &[]).unwrap();
    assert_eq!(bare.reason, DEFAULT_BAN_REASON);
}

#[test]
fn ban_list_shows_user_date_and_reason() {
    let (_dir, store) = temp_store();
    let mut bans = BanList::open(store.paths()).unwrap();
    let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    bans.ban_at(42, "spam", t0).unwrap();

    let out = render_ban_list(&bans.list().unwrap());
    assert_eq!(out, "42  banned 2025-03-01 12:00  spam\n");
    assert_eq!(render_ban_list(&[]), "No banned users.");
}
