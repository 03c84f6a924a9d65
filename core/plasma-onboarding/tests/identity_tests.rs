use plasma_onboarding::{DeviceIdentity, IdentitySource, UserIdIdentity};

#[test]
fn user_id_identity_is_per_user() {
    let source = UserIdIdentity;
    assert_eq!(source.identity_for(42), "user:42");
    assert_ne!(source.identity_for(1), source.identity_for(2));
}

#[test]
fn device_identity_is_shared_by_all_users() {
    let source = DeviceIdentity::current();
    let id = source.identity_for(1);
    assert_eq!(id.len(), 16);
    assert_eq!(id, source.identity_for(2));
    assert_eq!(id, DeviceIdentity::default().identity_for(3));
}
