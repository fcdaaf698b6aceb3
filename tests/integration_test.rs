//! End-to-end tests for the session store over an in-memory key-value backend

use etcd_session_core::{
    session_key, EtcdStore, KvClient, LifecycleState, Session, SessionFlushValve, SessionManager,
    SessionStore, StandardManager,
};
use etcd_session_kv::MemoryKv;
use serde_json::json;
use std::sync::Arc;

fn started_store(kv: Arc<MemoryKv>) -> Arc<EtcdStore> {
    let store = Arc::new(EtcdStore::with_client(kv));
    store.configure("localhost", 2379);
    store.set_manager(Arc::new(StandardManager::new()));
    store.start().unwrap();
    store
}

#[test]
fn test_save_load_remove_cycle() {
    let kv = Arc::new(MemoryKv::new());
    let store = started_store(kv.clone());
    assert_eq!(store.state(), LifecycleState::Started);
    assert_eq!(store.endpoint(), "http://localhost:2379");

    let mut session = Session::new("abc");
    session.set_attribute("x", json!(1));
    store.save(&session);

    let loaded = store.load("abc");
    assert_eq!(loaded.id(), "abc");
    assert_eq!(loaded.attribute("x"), Some(&json!(1)));
    assert!(!loaded.is_new());

    store.remove("abc");
    assert!(kv.get(&session_key("abc")).unwrap_err().is_not_found());

    let fresh = store.load("abc");
    assert_eq!(fresh.id(), "abc");
    assert!(fresh.is_new());
    assert!(fresh.attributes().is_empty());
}

#[test]
fn test_clear_empties_namespace_and_keeps_working() {
    let kv = Arc::new(MemoryKv::new());
    let store = started_store(kv.clone());

    for id in ["a", "b", "c"] {
        store.save(&Session::new(id));
    }
    assert_eq!(store.size(), 3);
    let mut keys = store.keys().unwrap();
    keys.sort();
    assert_eq!(keys, vec!["a", "b", "c"]);

    store.clear();
    assert_eq!(store.size(), 0);
    assert_eq!(store.keys(), Some(Vec::new()));

    // clearing an absent namespace is a no-op
    store.clear();
    assert_eq!(store.size(), 0);

    store.save(&Session::new("d"));
    assert_eq!(store.keys(), Some(vec!["d".to_string()]));
}

#[test]
fn test_restart_keeps_persisted_sessions() {
    let kv = Arc::new(MemoryKv::new());
    let store = started_store(kv.clone());
    store.save(&Session::new("kept"));

    store.stop();
    assert_eq!(store.state(), LifecycleState::Stopped);
    assert!(!store.is_connected());
    assert_eq!(store.size(), etcd_session_core::SIZE_UNKNOWN);

    store.start().unwrap();
    assert!(store.is_connected());
    assert!(!store.load("kept").is_new());
}

#[test]
fn test_flush_valve_persists_through_store() {
    let kv = Arc::new(MemoryKv::new());
    let valve = Arc::new(SessionFlushValve::new());
    let manager = StandardManager::new();
    manager.add_valve(valve.clone());

    let store = Arc::new(EtcdStore::with_client(kv.clone()));
    store.set_manager(Arc::new(manager));
    store.start().unwrap();
    assert!(valve.has_store());

    let mut session = store
        .manager()
        .map(|manager| manager.create_session("flushed"))
        .unwrap();
    session.set_attribute("user", json!("alice"));
    valve.flush(Some(&session));

    assert_eq!(store.load("flushed").attribute("user"), Some(&json!("alice")));

    drop(store);
    assert!(!valve.has_store());
    valve.flush(Some(&session));
}
