//! Etcd-backed session store
//!
//! Sessions live at `sessions/<id>` as base64 text of the bound serializer's
//! output. One reader/writer lock guards the connection settings, the manager,
//! its serializer and the client handle:
//! - CRUD operations and getters take the shared lock, so they run
//!   concurrently and always see one consistent snapshot
//! - setters and the lifecycle take the exclusive lock
//!
//! Every CRUD operation is fail-open: failures are logged at error level and
//! turned into a safe default instead of being returned.

use crate::config::{endpoint, StoreConfig};
use crate::error::{Result, StoreError};
use crate::lifecycle::{Lifecycle, LifecycleState, Transition};
use crate::manager::SessionManager;
use crate::notify::{
    Property, PropertyChangeEvent, PropertyChangeListener, PropertyChangeSupport, PropertyValue,
};
use crate::serializer::{SerializationError, SessionSerializer};
use crate::session::Session;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use etcd_session_kv::{EtcdClient, EtcdClientConfig, KvClient, KvError, KvNode};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Root of the session namespace
pub const SESSIONS_KEY: &str = "sessions";

/// Returned by [`SessionStore::size`] when the namespace could not be listed
pub const SIZE_UNKNOWN: i32 = i32::MIN;

const INFO: &str = "EtcdStore/1.0";

/// Remote key of a session
///
/// The id is percent-encoded into a single key segment, so every session is
/// one leaf directly under [`SESSIONS_KEY`].
#[must_use]
pub fn session_key(id: &str) -> String {
    format!("{}/{}", SESSIONS_KEY, urlencoding::encode(id))
}

/// Session id stored under a leaf of the namespace
fn session_id(node: &KvNode) -> String {
    let name = node.name();
    urlencoding::decode(name).map_or_else(|_| name.to_string(), |id| id.into_owned())
}

/// Generic session store contract
pub trait SessionStore: Send + Sync {
    /// Implementation name and version
    fn info(&self) -> &str;

    /// Load a session; a fresh session is returned if it cannot be loaded
    fn load(&self, id: &str) -> Session;

    /// Persist a session
    fn save(&self, session: &Session);

    /// Delete a session
    fn remove(&self, id: &str);

    /// Delete every session
    fn clear(&self);

    /// Identifiers of the stored sessions; `None` if they cannot be listed
    fn keys(&self) -> Option<Vec<String>>;

    /// Number of stored sessions, or [`SIZE_UNKNOWN`]
    fn size(&self) -> i32;
}

/// Read-only management view of the store
pub trait StoreManagement {
    /// Connection host
    fn host(&self) -> String;

    /// Connection port
    fn port(&self) -> u16;
}

/// Builds the remote client from an endpoint when the store starts
pub type ClientFactory =
    Box<dyn Fn(&str) -> etcd_session_kv::Result<Arc<dyn KvClient>> + Send + Sync>;

/// State guarded by the store lock
struct StoreState {
    host: String,
    port: u16,
    manager: Option<Arc<dyn SessionManager>>,
    serializer: Option<Arc<dyn SessionSerializer>>,
    client: Option<Arc<dyn KvClient>>,
}

impl StoreState {
    fn client(&self) -> Result<&dyn KvClient> {
        self.client.as_deref().ok_or(StoreError::NotStarted)
    }

    fn serializer(&self) -> Result<&dyn SessionSerializer> {
        self.serializer.as_deref().ok_or(StoreError::NoManager)
    }

    fn fresh_session(&self, id: &str) -> Session {
        match &self.manager {
            Some(manager) => manager.create_session(id),
            None => Session::new(id),
        }
    }

    /// Immediate children of the namespace; a missing namespace is empty
    fn list_sessions(&self) -> Result<Vec<KvNode>> {
        match self.client()?.list(SESSIONS_KEY) {
            Ok(nodes) => Ok(nodes),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Session store persisting to etcd
pub struct EtcdStore {
    state: RwLock<StoreState>,
    lifecycle: Lifecycle,
    listeners: PropertyChangeSupport,
    client_factory: ClientFactory,
}

impl Default for EtcdStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EtcdStore {
    /// Create a store for `localhost:2379`
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&StoreConfig::default())
    }

    /// Create a store from configuration
    #[must_use]
    pub fn from_config(config: &StoreConfig) -> Self {
        info!(
            endpoint = %config.endpoint(),
            "Sessions will be persisted to etcd using EtcdStore"
        );
        Self {
            state: RwLock::new(StoreState {
                host: config.host.clone(),
                port: config.port,
                manager: None,
                serializer: None,
                client: None,
            }),
            lifecycle: Lifecycle::new(),
            listeners: PropertyChangeSupport::new(),
            client_factory: etcd_client_factory(config.request_timeout()),
        }
    }

    /// Create a store around an existing client
    ///
    /// The client is used from the first `start` on, and again after every
    /// restart.
    #[must_use]
    pub fn with_client(client: Arc<dyn KvClient>) -> Self {
        Self::new().with_client_factory(Box::new(move |_: &str| Ok::<_, KvError>(client.clone())))
    }

    /// Replace the constructor used by `start`
    #[must_use]
    pub fn with_client_factory(mut self, factory: ClientFactory) -> Self {
        self.client_factory = factory;
        self
    }

    fn read_state(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(|poisoned| {
            warn!("Session store lock poisoned; recovering");
            poisoned.into_inner()
        })
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(|poisoned| {
            warn!("Session store lock poisoned; recovering");
            poisoned.into_inner()
        })
    }

    // ── Configuration ────────────────────────────────────────────────────

    /// Connection host
    #[must_use]
    pub fn host(&self) -> String {
        self.read_state().host.clone()
    }

    /// Connection port
    #[must_use]
    pub fn port(&self) -> u16 {
        self.read_state().port
    }

    /// Connection endpoint formed from one consistent host/port snapshot
    #[must_use]
    pub fn endpoint(&self) -> String {
        let state = self.read_state();
        endpoint(&state.host, state.port)
    }

    /// Current session manager
    #[must_use]
    pub fn manager(&self) -> Option<Arc<dyn SessionManager>> {
        self.read_state().manager.clone()
    }

    /// Set the host to connect to
    ///
    /// Takes effect the next time the store is started.
    pub fn set_host(&self, host: impl Into<String>) {
        let host = host.into();
        let previous = {
            let mut state = self.write_state();
            warn_if_connected(&state, Property::Host);
            std::mem::replace(&mut state.host, host.clone())
        };
        self.listeners.notify(&PropertyChangeEvent::new(
            Property::Host,
            PropertyValue::Text(previous),
            PropertyValue::Text(host),
        ));
    }

    /// Set the port to connect to
    ///
    /// Takes effect the next time the store is started.
    pub fn set_port(&self, port: u16) {
        let previous = {
            let mut state = self.write_state();
            warn_if_connected(&state, Property::Port);
            std::mem::replace(&mut state.port, port)
        };
        self.listeners.notify(&PropertyChangeEvent::new(
            Property::Port,
            PropertyValue::Port(previous),
            PropertyValue::Port(port),
        ));
    }

    /// Set host and port in one critical section
    pub fn configure(&self, host: impl Into<String>, port: u16) {
        let host = host.into();
        let (previous_host, previous_port) = {
            let mut state = self.write_state();
            warn_if_connected(&state, Property::Host);
            (
                std::mem::replace(&mut state.host, host.clone()),
                std::mem::replace(&mut state.port, port),
            )
        };
        self.listeners.notify(&PropertyChangeEvent::new(
            Property::Host,
            PropertyValue::Text(previous_host),
            PropertyValue::Text(host),
        ));
        self.listeners.notify(&PropertyChangeEvent::new(
            Property::Port,
            PropertyValue::Port(previous_port),
            PropertyValue::Port(port),
        ));
    }

    /// Set the session manager and rebind its serializer
    pub fn set_manager(&self, manager: Arc<dyn SessionManager>) {
        let previous = {
            let mut state = self.write_state();
            state.serializer = Some(manager.session_serializer());
            state.manager.replace(manager.clone())
        };
        debug!(manager = %manager.name(), "Session manager bound to store");
        self.listeners.notify(&PropertyChangeEvent::new(
            Property::Manager,
            PropertyValue::Manager(previous),
            PropertyValue::Manager(Some(manager)),
        ));
    }

    /// Register a change listener
    pub fn add_property_change_listener(&self, listener: Arc<dyn PropertyChangeListener>) {
        self.listeners.add(listener);
    }

    /// Unregister a change listener; returns whether it was registered
    pub fn remove_property_change_listener(
        &self,
        listener: &Arc<dyn PropertyChangeListener>,
    ) -> bool {
        self.listeners.remove(listener)
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Whether a remote client handle exists
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.read_state().client.is_some()
    }

    /// Wire this store into the manager's flush valves
    ///
    /// Advisory: a missing manager or flush valve is logged, never an error.
    pub fn init(self: &Arc<Self>) {
        let _ = self
            .lifecycle
            .transition(Transition::Init, || -> Result<()> {
                let state = self.read_state();
                let Some(manager) = &state.manager else {
                    warn!("No session manager set; skipping flush valve wiring");
                    return Ok(());
                };

                let mut wired = 0;
                for valve in manager.valves() {
                    if let Some(flush) = valve.as_session_flush() {
                        debug!(valve = %valve.name(), "Setting EtcdStore as the store for valve");
                        flush.set_store(self.as_weak_store());
                        wired += 1;
                    }
                }
                if wired == 0 {
                    info!(manager = %manager.name(), "No SessionFlushValve found in pipeline");
                }
                Ok(())
            });
    }

    /// Construct the remote client if none exists yet
    ///
    /// Initializes first when still uninitialized. An existing handle is never
    /// reconstructed.
    ///
    /// # Errors
    ///
    /// Returns error if the client cannot be built from the configured
    /// endpoint; the store then stays in its previous state.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        if self.lifecycle.state() == LifecycleState::Uninitialized {
            self.init();
        }

        self.lifecycle.transition(Transition::Start, || -> Result<()> {
            let mut state = self.write_state();
            if state.client.is_none() {
                let endpoint = endpoint(&state.host, state.port);
                let client = (self.client_factory)(&endpoint)?;
                info!(endpoint = %endpoint, "Session store connected");
                state.client = Some(client);
            }
            Ok(())
        })?;
        Ok(())
    }

    /// Release the remote client handle
    ///
    /// The client keeps no persistent connection, so no remote teardown is
    /// needed. A later `start` builds a handle from the then-current settings.
    pub fn stop(&self) {
        let _ = self
            .lifecycle
            .transition(Transition::Stop, || -> Result<()> {
                let mut state = self.write_state();
                state.client = None;
                info!("Session store stopped");
                Ok(())
            });
    }

    fn as_weak_store(self: &Arc<Self>) -> Weak<dyn SessionStore> {
        Arc::downgrade(self) as Weak<dyn SessionStore>
    }

    /// Run `action` against one consistent snapshot under the shared lock,
    /// logging any failure and substituting `fallback`
    fn fail_open<T>(
        &self,
        operation: &'static str,
        session_id: Option<&str>,
        action: impl FnOnce(&StoreState) -> Result<T>,
        fallback: impl FnOnce(&StoreState) -> T,
    ) -> T {
        let state = self.read_state();
        match action(&state) {
            Ok(value) => value,
            Err(e) => {
                error!(
                    operation,
                    session_id = session_id.unwrap_or("-"),
                    error = %e,
                    "Session store operation failed; degrading"
                );
                fallback(&state)
            }
        }
    }
}

fn etcd_client_factory(request_timeout: Duration) -> ClientFactory {
    Box::new(move |endpoint: &str| {
        let config = EtcdClientConfig::new(endpoint).with_request_timeout(request_timeout);
        let client: Arc<dyn KvClient> = Arc::new(EtcdClient::new(config)?);
        Ok(client)
    })
}

fn warn_if_connected(state: &StoreState, property: Property) {
    if state.client.is_some() {
        warn!(%property, "Store already started; change applies after stop and start");
    }
}

impl SessionStore for EtcdStore {
    fn info(&self) -> &str {
        INFO
    }

    fn load(&self, id: &str) -> Session {
        self.fail_open(
            "load",
            Some(id),
            |state| {
                let node = state.client()?.get(&session_key(id))?;
                let encoded = node
                    .value
                    .ok_or_else(|| StoreError::MissingValue(node.key.clone()))?;
                let bytes = BASE64.decode(encoded.as_bytes())?;
                let session = state.serializer()?.deserialize(&bytes)?;
                if session.id() != id {
                    return Err(SerializationError::Malformed(format!(
                        "stored session has id '{}'",
                        session.id()
                    ))
                    .into());
                }
                debug!(session_id = %id, "Session loaded from etcd");
                Ok(session)
            },
            |state| state.fresh_session(id),
        )
    }

    fn save(&self, session: &Session) {
        let id = session.id();
        self.fail_open(
            "save",
            Some(id),
            |state| {
                let bytes = state.serializer()?.serialize(session)?;
                state.client()?.set(&session_key(id), &BASE64.encode(bytes))?;
                debug!(session_id = %id, "Session saved to etcd");
                Ok(())
            },
            |_| (),
        );
    }

    fn remove(&self, id: &str) {
        self.fail_open(
            "remove",
            Some(id),
            |state| match state.client()?.delete(&session_key(id)) {
                Ok(()) => {
                    debug!(session_id = %id, "Session removed from etcd");
                    Ok(())
                }
                Err(e) if e.is_not_found() => {
                    debug!(session_id = %id, "Session already absent");
                    Ok(())
                }
                Err(e) => Err(e.into()),
            },
            |_| (),
        );
    }

    fn clear(&self) {
        self.fail_open(
            "clear",
            None,
            |state| match state.client()?.delete_dir_recursive(SESSIONS_KEY) {
                Ok(()) => {
                    info!("Persisted sessions cleared");
                    Ok(())
                }
                Err(e) if e.is_not_found() => Ok(()),
                Err(e) => Err(e.into()),
            },
            |_| (),
        );
    }

    fn keys(&self) -> Option<Vec<String>> {
        self.fail_open(
            "keys",
            None,
            |state| {
                let keys = state
                    .list_sessions()?
                    .iter()
                    .map(session_id)
                    .collect();
                Ok(Some(keys))
            },
            |_| None,
        )
    }

    fn size(&self) -> i32 {
        self.fail_open(
            "size",
            None,
            |state| {
                let count = state.list_sessions()?.len();
                Ok(i32::try_from(count).unwrap_or(i32::MAX))
            },
            |_| SIZE_UNKNOWN,
        )
    }
}

impl StoreManagement for EtcdStore {
    fn host(&self) -> String {
        EtcdStore::host(self)
    }

    fn port(&self) -> u16 {
        EtcdStore::port(self)
    }
}
