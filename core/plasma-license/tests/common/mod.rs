//! Shared test helpers for license tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use plasma_license::{CodeBook, LicenseStore, RedeemStore};
use tempfile::TempDir;

/// A fixed instant so expiry arithmetic is exact.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

/// Opens a fresh store in a temporary directory.
pub fn temp_store() -> (TempDir, LicenseStore) {
    let dir = TempDir::new().unwrap();
    let store = LicenseStore::open_dir(dir.path()).unwrap();
    (dir, store)
}

/// Opens a redeem-only store over the same directory.
pub fn redeem_view(dir: &TempDir) -> RedeemStore {
    RedeemStore::open_dir(dir.path()).unwrap()
}

/// Opens a store together with its code book.
pub fn temp_store_with_codes() -> (TempDir, LicenseStore, CodeBook) {
    let (dir, store) = temp_store();
    let codes = CodeBook::open(store.paths()).unwrap();
    (dir, store, codes)
}
