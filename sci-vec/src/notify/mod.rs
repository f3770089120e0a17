//! Client registration and change notification.
//!
//! A vector does not own its clients. Each [`ClientHandle`] shares a link
//! cell with the registry entry; destroying the vector clears the link so a
//! stale handle reports "server gone" instead of reaching freed state.
//!
//! # Invariants
//!
//! 1. A client is notified at most once per flush, in registration order.
//! 2. Clients registered or released during a fan-out do not disturb the
//!    snapshot being delivered; released clients are skipped.
//! 3. After destruction no handle still reports a live server.

mod idle;

pub use idle::IdleQueue;

use crate::store::{VectorId, VectorStore};
use core::cell::Cell;
use core::fmt;
use core::str::FromStr;
use std::rc::Rc;

use crate::error::Error;

/// When a mutation is fanned out to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotifyPolicy {
    /// Never notify automatically.
    Never,
    /// Notify synchronously on every mutation.
    Always,
    /// Coalesce mutations into one notification on the next idle pass.
    #[default]
    OnIdle,
}

impl FromStr for NotifyPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "never" => Ok(NotifyPolicy::Never),
            "always" => Ok(NotifyPolicy::Always),
            "whenidle" | "idle" => Ok(NotifyPolicy::OnIdle),
            other => Err(Error::invalid_arg(
                other,
                "expected one of never, always, whenidle",
            )),
        }
    }
}

/// Notification state of one vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotifyState {
    /// Nothing scheduled.
    #[default]
    Idle,
    /// A coalesced notification waits in the idle queue.
    PendingIdleNotify,
    /// Client callbacks are running.
    NotifyingNow,
}

/// What happened to the server vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyEvent {
    /// Values changed.
    Updated,
    /// The vector is being destroyed.
    Destroyed,
}

/// Delivered to client callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientEvent {
    /// The vector that changed.
    pub server: VectorId,
    /// What happened.
    pub kind: NotifyEvent,
}

/// Client callback. Receives the store so it can read (or mutate) vectors.
pub type NotifyCallback = Rc<dyn Fn(&mut VectorStore, ClientEvent)>;

/// Identifies a client registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub(crate) u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client{}", self.0)
    }
}

type ServerLink = Rc<Cell<Option<VectorId>>>;

/// Owner-side handle of a client registration.
///
/// Outlives its server: once the vector is destroyed [`ClientHandle::server`]
/// returns `None`. Release it with [`VectorStore::release_client`].
#[derive(Debug)]
pub struct ClientHandle {
    id: ClientId,
    link: ServerLink,
}

impl ClientHandle {
    /// Registration id.
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// The server vector, or `None` once it has been destroyed.
    pub fn server(&self) -> Option<VectorId> {
        self.link.get()
    }

    /// True while the server vector exists.
    pub fn is_live(&self) -> bool {
        self.server().is_some()
    }

    pub(crate) fn detached(id: ClientId) -> Self {
        Self {
            id,
            link: Rc::new(Cell::new(None)),
        }
    }
}

struct ClientEntry {
    id: ClientId,
    callback: Option<NotifyCallback>,
    link: ServerLink,
}

/// Clients of one vector.
#[derive(Default)]
pub struct ClientRegistry {
    entries: Vec<ClientEntry>,
}

impl fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.id))
            .finish()
    }
}

impl ClientRegistry {
    /// Number of registered clients.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True without clients.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn register(
        &mut self,
        id: ClientId,
        server: VectorId,
        callback: Option<NotifyCallback>,
    ) -> ClientHandle {
        let link = Rc::new(Cell::new(Some(server)));
        self.entries.push(ClientEntry {
            id,
            callback,
            link: Rc::clone(&link),
        });
        ClientHandle { id, link }
    }

    pub(crate) fn release(&mut self, id: ClientId) -> bool {
        match self.entries.iter().position(|e| e.id == id) {
            Some(pos) => {
                let entry = self.entries.remove(pos);
                entry.link.set(None);
                true
            }
            None => false,
        }
    }

    pub(crate) fn contains(&self, id: ClientId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Membership snapshot taken before a fan-out.
    pub(crate) fn snapshot(&self) -> Vec<(ClientId, Option<NotifyCallback>)> {
        self.entries
            .iter()
            .map(|e| (e.id, e.callback.clone()))
            .collect()
    }

    /// Mark every client's server as gone and forget them.
    pub(crate) fn detach_all(&mut self) -> usize {
        let n = self.entries.len();
        for entry in self.entries.drain(..) {
            entry.link.set(None);
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> VectorId {
        VectorId::new(3, 1)
    }

    #[test]
    fn release_detaches_only_that_client() {
        let mut registry = ClientRegistry::default();
        let a = registry.register(ClientId(1), server(), None);
        let b = registry.register(ClientId(2), server(), None);

        assert!(registry.release(a.id()));
        assert!(!a.is_live());
        assert!(b.is_live());
        assert!(!registry.release(a.id()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn detach_all_invalidates_handles() {
        let mut registry = ClientRegistry::default();
        let handles: Vec<_> = (0..3)
            .map(|i| registry.register(ClientId(i), server(), None))
            .collect();
        assert_eq!(registry.detach_all(), 3);
        assert!(registry.is_empty());
        assert!(handles.iter().all(|h| h.server().is_none()));
    }

    #[test]
    fn policy_parses_host_keywords() {
        assert_eq!("whenidle".parse::<NotifyPolicy>(), Ok(NotifyPolicy::OnIdle));
        assert_eq!("always".parse::<NotifyPolicy>(), Ok(NotifyPolicy::Always));
        assert!("sometimes".parse::<NotifyPolicy>().is_err());
    }
}
