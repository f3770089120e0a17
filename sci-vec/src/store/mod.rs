//! The store owning every vector of an interpreter.
//!
//! Vectors live in an arena addressed by generational [`VectorId`]s, so an
//! id kept past destruction reads as "not found" rather than reaching a
//! reused slot. The store also owns the function table, the index
//! aggregates and the idle queue that drives coalesced notifications.
//!
//! # Notifications
//!
//! Mutations made through [`VectorStore::update`] (and every verb built on
//! it) call [`VectorStore::mark_dirty`], which acts on the vector's
//! [`NotifyPolicy`]:
//!
//! - `Always` fans out an `Updated` event before returning,
//! - `OnIdle` schedules one flush on the idle queue, coalescing repeats
//!   until [`VectorStore::run_idle`] delivers it,
//! - `Never` does nothing until [`VectorStore::notify_now`].
//!
//! A mutation made by a client callback while its vector is fanning out is
//! deferred to the idle queue.

mod ops;

pub use ops::FftTargets;

use crate::buffer::{ValueBuffer, DEFAULT_CAPACITY};
use crate::error::{Error, Result};
use crate::expr::{ExprHost, Expression, FunctionTable};
use crate::index::IndexResolver;
use crate::kernel::{ConfigError, KernelLifecycle};
use crate::notify::{
    ClientEvent, ClientHandle, ClientId, IdleQueue, NotifyCallback, NotifyEvent, NotifyPolicy,
    NotifyState,
};
use crate::vector::Vector;
use core::fmt;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Generational handle of a vector in a [`VectorStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VectorId {
    index: u32,
    generation: u32,
}

impl VectorId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for VectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vector#{}.{}", self.index, self.generation)
    }
}

/// Constructor config for [`VectorStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Capacity allocated for new vectors.
    pub default_capacity: usize,
    /// Policy given to new vectors.
    pub notify_policy: NotifyPolicy,
    /// Seed of the generator behind `random`.
    pub seed: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_capacity: DEFAULT_CAPACITY,
            notify_policy: NotifyPolicy::OnIdle,
            seed: 0,
        }
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    vector: Option<Vector>,
}

/// Arena of named vectors plus the tables expressions consult.
#[derive(Debug)]
pub struct VectorStore {
    slots: Vec<Slot>,
    free: Vec<u32>,
    names: HashMap<String, VectorId>,
    idle: IdleQueue,
    functions: FunctionTable,
    resolver: IndexResolver,
    config: StoreConfig,
    next_client: u64,
    next_auto_name: u64,
}

impl KernelLifecycle for VectorStore {
    type Config = StoreConfig;

    fn try_new(config: Self::Config) -> core::result::Result<Self, ConfigError> {
        if config.default_capacity == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "default_capacity",
                reason: "default capacity must be > 0",
            });
        }
        Ok(Self::with_config(config))
    }
}

impl Default for VectorStore {
    fn default() -> Self {
        Self::with_config(StoreConfig::default())
    }
}

fn valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '.'))
}

impl VectorStore {
    fn with_config(config: StoreConfig) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            names: HashMap::new(),
            idle: IdleQueue::default(),
            functions: FunctionTable::with_seed(config.seed),
            resolver: IndexResolver::default(),
            config,
            next_client: 1,
            next_auto_name: 1,
        }
    }

    /// The math functions expressions may call.
    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    /// Mutable access to register host functions.
    pub fn functions_mut(&mut self) -> &mut FunctionTable {
        &mut self.functions
    }

    /// The index aggregates.
    pub fn resolver(&self) -> &IndexResolver {
        &self.resolver
    }

    /// Mutable access to register host aggregates.
    pub fn resolver_mut(&mut self) -> &mut IndexResolver {
        &mut self.resolver
    }

    /// Number of live vectors.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True without vectors.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names of the live vectors, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Create an empty vector. Without a name one is generated.
    pub fn create(&mut self, name: Option<&str>) -> Result<VectorId> {
        let name = match name {
            Some(name) => {
                if !valid_name(name) {
                    return Err(Error::invalid_arg(name, "not a valid vector name"));
                }
                if self.names.contains_key(name) {
                    return Err(Error::invalid_arg(name, "a vector by that name already exists"));
                }
                if self.functions.contains(name) {
                    return Err(Error::invalid_arg(name, "name is a math function"));
                }
                name.to_owned()
            }
            None => self.auto_name(),
        };

        let mut vector = Vector::with_capacity(name.as_str(), self.config.default_capacity)?;
        vector.policy = self.config.notify_policy;

        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.vector = Some(vector);
                VectorId::new(index, slot.generation)
            }
            None => {
                let index = u32::try_from(self.slots.len()).map_err(|_| Error::OutOfMemory {
                    requested: self.slots.len() + 1,
                })?;
                self.slots.push(Slot {
                    generation: 0,
                    vector: Some(vector),
                });
                VectorId::new(index, 0)
            }
        };
        debug!(%id, name = %name, "created vector");
        self.names.insert(name, id);
        Ok(id)
    }

    fn auto_name(&mut self) -> String {
        loop {
            let candidate = format!("vector{}", self.next_auto_name);
            self.next_auto_name += 1;
            if !self.names.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Id of the vector called `name`.
    pub fn lookup(&self, name: &str) -> Result<VectorId> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| Error::NotFound {
                name: name.to_owned(),
            })
    }

    /// The vector called `name`.
    pub fn vector_named(&self, name: &str) -> Result<&Vector> {
        self.get(self.lookup(name)?)
    }

    /// The vector behind `id`.
    pub fn get(&self, id: VectorId) -> Result<&Vector> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.vector.as_ref())
            .ok_or_else(|| Error::NotFound {
                name: id.to_string(),
            })
    }

    /// Mutable access without notification. Follow changes with
    /// [`VectorStore::mark_dirty`], or use [`VectorStore::update`].
    pub fn get_mut(&mut self, id: VectorId) -> Result<&mut Vector> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.vector.as_mut())
            .ok_or_else(|| Error::NotFound {
                name: id.to_string(),
            })
    }

    /// Whether `id` still names a vector.
    pub fn contains(&self, id: VectorId) -> bool {
        self.get(id).is_ok()
    }

    /// Mutate a vector and notify its clients. When `f` fails nobody is
    /// notified.
    pub fn update<R>(&mut self, id: VectorId, f: impl FnOnce(&mut Vector) -> Result<R>) -> Result<R> {
        let out = f(self.get_mut(id)?)?;
        self.mark_dirty(id)?;
        Ok(out)
    }

    /// Record a change to `id` and notify according to its policy.
    pub fn mark_dirty(&mut self, id: VectorId) -> Result<()> {
        let vector = self.get_mut(id)?;
        vector.invalidate();
        match vector.policy {
            NotifyPolicy::Never => {}
            NotifyPolicy::Always if !vector.notifying => {
                vector.state = NotifyState::Idle;
                self.fan_out(id, NotifyEvent::Updated);
            }
            // Deferred while its own clients run, whatever the policy.
            NotifyPolicy::Always | NotifyPolicy::OnIdle => self.schedule(id),
        }
        Ok(())
    }

    // Queue one idle flush of `id`; a flush already pending absorbs this one.
    fn schedule(&mut self, id: VectorId) {
        if let Ok(vector) = self.get_mut(id) {
            if vector.state == NotifyState::PendingIdleNotify {
                return;
            }
            vector.state = NotifyState::PendingIdleNotify;
            self.idle.schedule(id);
            debug!(%id, "scheduled idle notification");
        }
    }

    /// Deliver every notification scheduled so far. Returns the number of
    /// vectors flushed.
    pub fn run_idle(&mut self) -> usize {
        let mut flushed = 0;
        for id in self.idle.take_batch() {
            let pending = matches!(
                self.get(id).map(Vector::notify_state),
                Ok(NotifyState::PendingIdleNotify)
            );
            if pending {
                self.fan_out(id, NotifyEvent::Updated);
                flushed += 1;
            }
        }
        flushed
    }

    /// Number of idle-queue entries, cancelled ones included.
    pub fn idle_len(&self) -> usize {
        self.idle.len()
    }

    /// Set the notification policy. Switching to `Never` cancels a pending
    /// notification.
    pub fn set_notify_policy(&mut self, id: VectorId, policy: NotifyPolicy) -> Result<()> {
        let vector = self.get_mut(id)?;
        vector.policy = policy;
        if policy == NotifyPolicy::Never && vector.state == NotifyState::PendingIdleNotify {
            vector.state = NotifyState::Idle;
            debug!(%id, "cancelled idle notification");
        }
        Ok(())
    }

    /// Notify clients immediately, replacing any pending notification.
    /// Returns the number of clients reached.
    pub fn notify_now(&mut self, id: VectorId) -> Result<usize> {
        let vector = self.get_mut(id)?;
        if vector.notifying {
            self.schedule(id);
            return Ok(0);
        }
        vector.state = NotifyState::Idle;
        Ok(self.fan_out(id, NotifyEvent::Updated))
    }

    /// Drop a pending idle notification. Returns whether one was pending.
    pub fn cancel_notify(&mut self, id: VectorId) -> Result<bool> {
        let vector = self.get_mut(id)?;
        let pending = vector.state == NotifyState::PendingIdleNotify;
        if pending {
            vector.state = NotifyState::Idle;
            debug!(%id, "cancelled idle notification");
        }
        Ok(pending)
    }

    /// Whether an idle notification is pending.
    pub fn is_pending(&self, id: VectorId) -> Result<bool> {
        Ok(self.get(id)?.state == NotifyState::PendingIdleNotify)
    }

    /// Register a client of `id`. A vector that is being destroyed hands out
    /// a handle that is already detached.
    pub fn register_client(
        &mut self,
        id: VectorId,
        callback: Option<NotifyCallback>,
    ) -> Result<ClientHandle> {
        let client = ClientId(self.next_client);
        self.next_client += 1;
        let vector = self.get_mut(id)?;
        if vector.destroying {
            return Ok(ClientHandle::detached(client));
        }
        trace!(%id, %client, "registered client");
        Ok(vector.clients.register(client, id, callback))
    }

    /// Release a client registration. Returns false when the handle was
    /// already detached.
    pub fn release_client(&mut self, handle: ClientHandle) -> bool {
        let Some(server) = handle.server() else {
            return false;
        };
        match self.get_mut(server) {
            Ok(vector) => vector.clients.release(handle.id()),
            Err(_) => false,
        }
    }

    /// Destroy `id`: every client receives one `Destroyed` event and is
    /// detached, then the slot is freed. Destroying a vector from its own
    /// destroy callback is a no-op.
    pub fn destroy(&mut self, id: VectorId) -> Result<()> {
        let vector = self.get_mut(id)?;
        if vector.destroying {
            return Ok(());
        }
        vector.destroying = true;
        vector.state = NotifyState::Idle;
        let reached = self.fan_out(id, NotifyEvent::Destroyed);

        let slot = &mut self.slots[id.index as usize];
        let detached = match slot.vector.take() {
            Some(mut vector) => {
                self.names.remove(vector.name());
                vector.clients.detach_all()
            }
            None => 0,
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        debug!(%id, reached, detached, "destroyed vector");
        Ok(())
    }

    /// Destroy every vector.
    pub fn clear(&mut self) {
        let ids: Vec<VectorId> = self.names.values().copied().collect();
        for id in ids {
            let _ = self.destroy(id);
        }
    }

    // Deliver `kind` to a snapshot of the clients of `id`; clients released
    // meanwhile are skipped. Returns the number of clients reached.
    fn fan_out(&mut self, id: VectorId, kind: NotifyEvent) -> usize {
        // A destroy issued from a callback nests inside an update fan-out.
        let (snapshot, nested) = match self.get_mut(id) {
            Ok(vector) => {
                vector.state = NotifyState::NotifyingNow;
                let nested = core::mem::replace(&mut vector.notifying, true);
                (vector.clients.snapshot(), nested)
            }
            Err(_) => return 0,
        };
        let event = ClientEvent { server: id, kind };
        let mut reached = 0;
        for (client, callback) in snapshot {
            let live = match self.get(id) {
                Ok(vector) => vector.clients.contains(client),
                Err(_) => break,
            };
            if !live {
                continue;
            }
            trace!(%id, %client, ?kind, "notifying client");
            reached += 1;
            if let Some(callback) = callback {
                callback(self, event);
            }
        }
        if let Ok(vector) = self.get_mut(id) {
            vector.notifying = nested;
            if vector.state == NotifyState::NotifyingNow {
                vector.state = NotifyState::Idle;
            }
        }
        reached
    }

    /// Parse and evaluate `expression` without modifying any vector.
    pub fn evaluate(&self, expression: &str, host: &mut dyn ExprHost) -> Result<ValueBuffer> {
        Expression::parse(expression, &self.functions)?.eval(self, host)
    }

    /// Evaluate `expression` and store the result in `target`. A failing
    /// expression leaves `target` untouched.
    pub fn assign_expr(
        &mut self,
        target: VectorId,
        expression: &str,
        host: &mut dyn ExprHost,
    ) -> Result<()> {
        self.get(target)?;
        let result = self.evaluate(expression, host)?;
        self.update(target, |vector| vector.set_values(result.as_slice()))
    }
}
