use super::*;
use crate::manager::StandardManager;
use std::sync::Mutex;

fn host_event(previous: &str, current: &str) -> PropertyChangeEvent {
    PropertyChangeEvent::new(
        Property::Host,
        PropertyValue::Text(previous.to_string()),
        PropertyValue::Text(current.to_string()),
    )
}

#[test]
fn test_notify_reaches_all_listeners() {
    let support = PropertyChangeSupport::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    for _ in 0..2 {
        let seen = seen.clone();
        support.add(Arc::new(move |event: &PropertyChangeEvent| {
            seen.lock().unwrap().push(event.clone());
        }));
    }

    let event = host_event("localhost", "etcd.internal");
    assert_eq!(support.notify(&event), 2);
    assert_eq!(*seen.lock().unwrap(), vec![event.clone(), event]);
}

#[test]
fn test_remove_by_identity() {
    let support = PropertyChangeSupport::new();
    let first: Arc<dyn PropertyChangeListener> = Arc::new(|_: &PropertyChangeEvent| {});
    let second: Arc<dyn PropertyChangeListener> = Arc::new(|_: &PropertyChangeEvent| {});
    support.add(first.clone());
    support.add(second.clone());

    assert!(support.remove(&first));
    assert!(!support.remove(&first));
    assert_eq!(support.len(), 1);
    assert_eq!(support.notify(&host_event("a", "b")), 1);
}

#[test]
fn test_panicking_listener_is_isolated() {
    let support = PropertyChangeSupport::new();
    let calls = Arc::new(Mutex::new(0));

    support.add(Arc::new(|_: &PropertyChangeEvent| panic!("listener failure")));
    let counter = calls.clone();
    support.add(Arc::new(move |_: &PropertyChangeEvent| {
        *counter.lock().unwrap() += 1;
    }));

    assert_eq!(support.notify(&host_event("a", "b")), 1);
    assert_eq!(*calls.lock().unwrap(), 1);
}

#[test]
fn test_listener_may_reenter_registry() {
    let support = Arc::new(PropertyChangeSupport::new());
    let registry = support.clone();
    support.add(Arc::new(move |_: &PropertyChangeEvent| {
        assert_eq!(registry.len(), 1);
    }));
    assert_eq!(support.notify(&host_event("a", "b")), 1);
}

#[test]
fn test_manager_values_compare_by_identity() {
    let manager: Arc<dyn SessionManager> = Arc::new(StandardManager::new());
    let other: Arc<dyn SessionManager> = Arc::new(StandardManager::new());

    assert_eq!(
        PropertyValue::Manager(Some(manager.clone())),
        PropertyValue::Manager(Some(manager.clone()))
    );
    assert_ne!(
        PropertyValue::Manager(Some(manager)),
        PropertyValue::Manager(Some(other))
    );
    assert_eq!(PropertyValue::Manager(None), PropertyValue::Manager(None));
    assert_eq!(
        format!("{:?}", PropertyValue::Port(2379)),
        "Port(2379)".to_string()
    );
}
