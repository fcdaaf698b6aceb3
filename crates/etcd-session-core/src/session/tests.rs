use super::*;
use chrono::Duration;
use serde_json::json;

#[test]
fn test_new_session_is_empty() {
    let session = Session::new("abc");
    assert_eq!(session.id(), "abc");
    assert!(session.is_new());
    assert!(session.attributes().is_empty());
    assert_eq!(session.max_inactive_interval, None);
}

#[test]
fn test_attributes() {
    let mut session = Session::new("abc");
    assert_eq!(session.set_attribute("x", json!(1)), None);
    assert_eq!(session.set_attribute("x", json!(2)), Some(json!(1)));
    assert_eq!(session.attribute("x"), Some(&json!(2)));

    assert_eq!(session.remove_attribute("x"), Some(json!(2)));
    assert_eq!(session.attribute("x"), None);
}

#[test]
fn test_access_clears_new_flag() {
    let mut session = Session::new("abc");
    let before = session.last_accessed_time;
    session.access();
    assert!(!session.is_new());
    assert!(session.last_accessed_time >= before);
}

#[test]
fn test_expiry() {
    let session = Session::new("abc").with_max_inactive_interval(60);
    let now = session.last_accessed_time;
    assert!(!session.is_expired_at(now + Duration::seconds(30)));
    assert!(session.is_expired_at(now + Duration::seconds(61)));

    let forever = Session::new("def");
    assert!(!forever.is_expired_at(now + Duration::days(365)));
}
