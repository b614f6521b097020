//! Live connector instances and their registry.
//!
//! Connectors are stateful external dependencies (e.g. a chat platform
//! session) that requirement plugins get injected.  They are produced by
//! connector providers outside the core; the [`ConnectorRegistry`] only
//! stores, hands out, and removes them.
//!
//! # Locking
//!
//! The registry keeps a short-lived outer lock over a map of per-key slots.
//! Each slot is an async mutex, so `add` / `get` / `remove` on the same
//! `(type, key)` are serialized while distinct keys never wait on each other.
//!
//! ```text
//! slots: Mutex<HashMap<ConnectorKey, Arc<AsyncMutex<Option<ConnectorHandle>>>>>
//!              └─ held only to clone a slot ─┘     └─ held across the operation ─┘
//! ```
//!
//! A [`ConnectorReservation`] holds a key's slot while a provider is still
//! connecting, so two hosts racing on one key never both open a connection.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::error::{BoxError, CoreResult, LookupError};
use crate::types::{ConnectorKey, ConnectorTypeId};

// =============================================================================
// Connector trait
// =============================================================================

/// Upcast helper so `Arc<dyn Connector>` can be downcast to its concrete type.
///
/// Implemented for every sized `'static` type; never implement it by hand.
pub trait AsAnyArc: Any + Send + Sync {
    /// Converts the `Arc` into an `Arc<dyn Any>`.
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAnyArc for T {
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A live external dependency injected into requirement plugins.
#[async_trait]
pub trait Connector: AsAnyArc {
    /// The connector type this instance satisfies.
    fn connector_type(&self) -> ConnectorTypeId;

    /// Called once when the connector is removed from the registry.
    async fn disconnect(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Lifecycle state of a connector instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorState {
    /// Key reserved while the connector is being established.
    Configured,
    /// Connected and registered.
    Connected,
    /// Removed from the registry.
    Disconnected,
}

impl fmt::Display for ConnectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configured => write!(f, "Configured"),
            Self::Connected => write!(f, "Connected"),
            Self::Disconnected => write!(f, "Disconnected"),
        }
    }
}

// =============================================================================
// ConnectorHandle
// =============================================================================

/// Shared, read-only handle to a registered connector.
///
/// Cloning is cheap; all clones observe the same state.  Holders cannot
/// remove the connector, only the registry can.
#[derive(Clone)]
pub struct ConnectorHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    key: ConnectorKey,
    connector: Arc<dyn Connector>,
    state: RwLock<ConnectorState>,
}

impl ConnectorHandle {
    /// Wraps a connector in the `Configured` state.
    pub fn new(key: ConnectorKey, connector: Arc<dyn Connector>) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                key,
                connector,
                state: RwLock::new(ConnectorState::Configured),
            }),
        }
    }

    /// The key this connector is registered under.
    pub fn key(&self) -> &ConnectorKey {
        &self.inner.key
    }

    /// The current lifecycle state.
    pub fn state(&self) -> ConnectorState {
        *self.inner.state.read()
    }

    /// Returns whether the connector is currently connected.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectorState::Connected
    }

    /// The connector as a trait object.
    pub fn connector(&self) -> &Arc<dyn Connector> {
        &self.inner.connector
    }

    /// Returns the connector as its concrete type.
    pub fn downcast<T: Connector>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.inner.connector)
            .as_any_arc()
            .downcast::<T>()
            .ok()
    }

    /// Returns `true` if both handles refer to the same connector instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn set_state(&self, state: ConnectorState) {
        let mut guard = self.inner.state.write();
        let old_state = *guard;
        *guard = state;
        debug!(
            connector = %self.inner.key,
            old_state = %old_state,
            new_state = %state,
            "Connector state changed"
        );
    }
}

impl fmt::Debug for ConnectorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorHandle")
            .field("key", &self.inner.key)
            .field("state", &self.state())
            .finish()
    }
}

// =============================================================================
// ConnectorRegistry
// =============================================================================

type Slot = Arc<AsyncMutex<Option<ConnectorHandle>>>;

/// Registry of live connectors keyed by `(connector type, key)`.
///
/// This is the only structure of the core that is mutated after startup.
#[derive(Default)]
pub struct ConnectorRegistry {
    slots: Mutex<HashMap<ConnectorKey, Slot>>,
    reserved: Mutex<HashSet<ConnectorKey>>,
}

impl ConnectorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &ConnectorKey) -> Option<Slot> {
        self.slots.lock().get(key).cloned()
    }

    fn slot_or_insert(&self, key: &ConnectorKey) -> Slot {
        Arc::clone(self.slots.lock().entry(key.clone()).or_default())
    }

    /// Gives back the caller's reference to `slot`, dropping the slot from the
    /// map when it is empty and nobody else holds it.
    ///
    /// Slots are only cloned under the map lock, so a count of one seen here
    /// cannot grow before the slot is removed.
    fn release(&self, key: &ConnectorKey, slot: Slot) {
        let mut slots = self.slots.lock();
        let Some(current) = slots.get(key) else {
            return;
        };
        if !Arc::ptr_eq(current, &slot) {
            return;
        }
        drop(slot);

        let unused = Arc::strong_count(current) == 1
            && current.try_lock().is_ok_and(|guard| guard.is_none());
        if unused {
            slots.remove(key);
        }
    }

    /// Locks `(connector_type, key)` for a connector that is about to be
    /// established.
    ///
    /// Fails with [`LookupError::DuplicateConnector`] if the key is taken.
    /// Until the reservation is completed or dropped, the key is reported as
    /// [`ConnectorState::Configured`] by [`stats`](Self::stats) and other
    /// operations on the same key wait.
    pub async fn reserve(
        &self,
        connector_type: impl Into<ConnectorTypeId>,
        key: impl Into<String>,
    ) -> CoreResult<ConnectorReservation<'_>> {
        let key = ConnectorKey::new(connector_type, key);

        let guard = self.slot_or_insert(&key).lock_owned().await;
        if guard.is_some() {
            return Err(LookupError::DuplicateConnector { key }.into());
        }

        self.reserved.lock().insert(key.clone());
        debug!(connector = %key, "Reserved connector key");
        Ok(ConnectorReservation {
            registry: self,
            key,
            guard: Some(guard),
        })
    }

    /// Registers a live connector under `(connector_type, key)`.
    ///
    /// Fails with [`LookupError::DuplicateConnector`] if the key is taken and
    /// with [`LookupError::ConnectorTypeMismatch`] if the instance reports a
    /// different connector type.
    pub async fn add_connector(
        &self,
        connector_type: impl Into<ConnectorTypeId>,
        key: impl Into<String>,
        connector: Arc<dyn Connector>,
    ) -> CoreResult<ConnectorHandle> {
        self.reserve(connector_type, key).await?.complete(connector)
    }

    /// Returns the connector registered under `(connector_type, key)`.
    pub async fn get_connector(
        &self,
        connector_type: &ConnectorTypeId,
        key: &str,
    ) -> CoreResult<ConnectorHandle> {
        let key = ConnectorKey::new(connector_type.clone(), key);
        let not_found = || LookupError::ConnectorNotFound { key: key.clone() };

        let slot = self.slot(&key).ok_or_else(not_found)?;
        let handle = slot.lock().await.clone();
        match handle {
            Some(handle) => Ok(handle),
            None => {
                self.release(&key, slot);
                Err(not_found().into())
            }
        }
    }

    /// Disconnects and removes the connector registered under `(connector_type, key)`.
    ///
    /// The connector's `disconnect` hook runs while the key is locked, so a
    /// concurrent lookup on the same key waits and then observes its absence.
    /// A failing hook is logged; the connector is removed regardless.
    pub async fn remove_connector(
        &self,
        connector_type: &ConnectorTypeId,
        key: &str,
    ) -> CoreResult<ConnectorHandle> {
        let key = ConnectorKey::new(connector_type.clone(), key);

        let slot = self
            .slot(&key)
            .ok_or_else(|| LookupError::ConnectorNotFound { key: key.clone() })?;

        let taken = {
            let mut guard = slot.lock().await;
            match guard.take() {
                Some(handle) => {
                    if let Err(e) = handle.connector().disconnect().await {
                        warn!(connector = %key, error = %e, "Connector disconnect hook failed");
                    }
                    handle.set_state(ConnectorState::Disconnected);
                    Some(handle)
                }
                None => None,
            }
        };

        self.release(&key, slot);
        let handle = taken.ok_or_else(|| LookupError::ConnectorNotFound { key: key.clone() })?;
        info!(connector = %key, "Removed connector");
        Ok(handle)
    }

    /// Returns whether a connector is registered under the key.
    pub async fn contains(&self, connector_type: &ConnectorTypeId, key: &str) -> bool {
        self.get_connector(connector_type, key).await.is_ok()
    }

    /// Returns the keys of all registered connectors, sorted.
    ///
    /// Reserved keys are skipped.
    pub async fn keys(&self) -> Vec<ConnectorKey> {
        let mut keys = Vec::new();
        for (key, slot) in self.snapshot() {
            let present = slot.lock().await.is_some();
            if present {
                keys.push(key);
            } else {
                self.release(&key, slot);
            }
        }
        keys.sort();
        keys
    }

    /// Returns the number of registered connectors.
    pub async fn len(&self) -> usize {
        self.keys().await.len()
    }

    /// Returns `true` if no connector is registered.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Disconnects and removes every registered connector.
    ///
    /// Returns the number of connectors removed.
    pub async fn remove_all(&self) -> usize {
        let keys = self.keys().await;
        info!("Removing {} connector(s)", keys.len());

        let mut removed = 0;
        for key in keys {
            if self
                .remove_connector(&key.connector_type, &key.key)
                .await
                .is_ok()
            {
                removed += 1;
            }
        }
        removed
    }

    /// Returns statistics about registered and reserved connectors.
    pub async fn stats(&self) -> ConnectorStats {
        let mut stats = ConnectorStats {
            configured: self.reserved.lock().len(),
            ..Default::default()
        };
        let mut types = HashSet::new();
        for (key, slot) in self.snapshot() {
            let handle = slot.lock().await.clone();
            match handle {
                Some(handle) => {
                    stats.total += 1;
                    if handle.is_connected() {
                        stats.connected += 1;
                    }
                    types.insert(key.connector_type);
                }
                None => self.release(&key, slot),
            }
        }
        stats.types = types.len();
        stats
    }

    /// Clones every slot that is not currently reserved.
    fn snapshot(&self) -> Vec<(ConnectorKey, Slot)> {
        let reserved = self.reserved.lock();
        self.slots
            .lock()
            .iter()
            .filter(|(k, _)| !reserved.contains(*k))
            .map(|(k, s)| (k.clone(), Arc::clone(s)))
            .collect()
    }
}

impl fmt::Debug for ConnectorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorRegistry")
            .field("slots", &self.slots.lock().len())
            .field("reserved", &self.reserved.lock().len())
            .finish()
    }
}

// =============================================================================
// ConnectorReservation
// =============================================================================

/// Exclusive hold on a connector key while its connector is being established.
///
/// Dropping the reservation without [`complete`](Self::complete) frees the key.
pub struct ConnectorReservation<'a> {
    registry: &'a ConnectorRegistry,
    key: ConnectorKey,
    guard: Option<OwnedMutexGuard<Option<ConnectorHandle>>>,
}

impl ConnectorReservation<'_> {
    /// The reserved key.
    pub fn key(&self) -> &ConnectorKey {
        &self.key
    }

    /// Always [`ConnectorState::Configured`].
    pub fn state(&self) -> ConnectorState {
        ConnectorState::Configured
    }

    /// Stores `connector` under the reserved key.
    ///
    /// Fails with [`LookupError::ConnectorTypeMismatch`] if the instance
    /// reports a different connector type; the key is freed in that case.
    pub fn complete(mut self, connector: Arc<dyn Connector>) -> CoreResult<ConnectorHandle> {
        let actual = connector.connector_type();
        if actual != self.key.connector_type {
            let key = self.key.clone();
            return Err(LookupError::ConnectorTypeMismatch { key, actual }.into());
        }

        let handle = ConnectorHandle::new(self.key.clone(), connector);
        if let Some(guard) = self.guard.as_mut() {
            **guard = Some(handle.clone());
        }
        handle.set_state(ConnectorState::Connected);

        info!(connector = %self.key, "Registered connector");
        Ok(handle)
    }
}

impl Drop for ConnectorReservation<'_> {
    fn drop(&mut self) {
        self.registry.reserved.lock().remove(&self.key);

        if let Some(guard) = self.guard.take() {
            let vacant = guard.is_none();
            let slot = Arc::clone(OwnedMutexGuard::mutex(&guard));
            drop(guard);
            if vacant {
                self.registry.release(&self.key, slot);
            }
        }
    }
}

impl fmt::Debug for ConnectorReservation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorReservation")
            .field("key", &self.key)
            .finish()
    }
}

/// Statistics about the connector registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectorStats {
    /// Total number of registered connectors.
    pub total: usize,
    /// Number of connected connectors.
    pub connected: usize,
    /// Number of reserved keys whose connector is still being established.
    pub configured: usize,
    /// Number of distinct connector types.
    pub types: usize,
}

impl fmt::Display for ConnectorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Connectors: {} total ({} connected, {} configured), {} types",
            self.total, self.connected, self.configured, self.types
        )
    }
}
