//! Contains the [`InstantiationTable`] deduplicating instantiations.

use std::{
    fmt,
    sync::{Arc, OnceLock},
};

use constgen_arena::{Arena, ID};
use constgen_term::generic_arguments::ResolvedArgs;
use constgen_type_system::{
    associated::AssociatedBindings,
    declaration::{Declaration, ItemKind, Signature},
};
use dashmap::{mapref::entry::Entry, DashMap};
use derive_new::new;
use getset::{CopyGetters, Getters};
use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Identifies one instantiation: the item and its canonical arguments.
///
/// Every value in `arguments` is canonical, so arguments equal under their
/// domain equality (`-0.0` and `0.0`) produce the same key.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct InstantiationKey {
    /// The instantiated item.
    pub item: ID<Declaration>,

    /// The resolved arguments.
    pub arguments: ResolvedArgs,
}

/// A concrete instantiation of a generic item.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters, new)]
pub struct InstantiationEntry {
    /// The instantiated item.
    #[get_copy = "pub"]
    item: ID<Declaration>,

    /// The kind of the instantiated item.
    #[get_copy = "pub"]
    kind: ItemKind,

    /// The name of the item followed by its arguments, e.g. `bar<3>`.
    #[get = "pub"]
    name: String,

    /// The resolved arguments.
    #[get = "pub"]
    arguments: ResolvedArgs,

    /// The signature with every parameter substituted.
    #[get = "pub"]
    signature: Signature,

    /// The associated constants the item refers to.
    #[get = "pub"]
    associated: AssociatedBindings,
}

impl fmt::Display for InstantiationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ItemKind::Function => write!(f, "fn {}{}", self.name, self.signature),
            ItemKind::Struct | ItemKind::Enum => {
                write!(f, "{} {}", self.kind, self.name)
            }
        }
    }
}

type Slot = Arc<OnceLock<Arc<InstantiationEntry>>>;

/// Maps instantiation keys to entries, building every entry exactly once.
///
/// The slot of a key is reserved while holding the lock of its map entry, so
/// concurrent requests for one key agree on the handle; the entry itself is
/// built outside of that lock behind a once-cell every concurrent requester
/// waits on.
#[derive(Debug, Default)]
pub struct InstantiationTable {
    ids: DashMap<InstantiationKey, ID<InstantiationEntry>>,
    entries: RwLock<Arena<Slot, ID<InstantiationEntry>>>,
}

impl InstantiationTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Returns the handle of the entry for `key`, running `build` to create
    /// the entry if it doesn't exist yet.
    ///
    /// `build` runs at most once per key across all threads; every caller
    /// returns after the entry is built.
    pub fn get_or_create(
        &self,
        key: InstantiationKey,
        build: impl FnOnce() -> InstantiationEntry,
    ) -> ID<InstantiationEntry> {
        let (id, slot) = match self.ids.entry(key) {
            Entry::Occupied(entry) => {
                let id = *entry.get();
                (id, self.slot(id))
            }
            Entry::Vacant(entry) => {
                let slot = Slot::default();
                let id = self.entries.write().insert(Arc::clone(&slot));
                entry.insert(id);

                (id, Some(slot))
            }
        };

        if let Some(slot) = slot {
            slot.get_or_init(|| {
                let entry = build();
                debug!("instantiated `{}` as {id}", entry.name);
                Arc::new(entry)
            });
        }

        id
    }

    fn slot(&self, id: ID<InstantiationEntry>) -> Option<Slot> {
        self.entries.read().get(id).cloned()
    }

    /// Returns the entry behind the handle, `None` if the handle is unknown
    /// or the entry is still being built.
    #[must_use]
    pub fn get(
        &self,
        id: ID<InstantiationEntry>,
    ) -> Option<Arc<InstantiationEntry>> {
        self.slot(id)?.get().cloned()
    }

    /// Returns the handle of the entry for `key` if it was created.
    #[must_use]
    pub fn find(&self, key: &InstantiationKey) -> Option<ID<InstantiationEntry>> {
        self.ids.get(key).map(|id| *id)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize { self.entries.read().len() }

    /// Returns `true` if no entry was created.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.read().is_empty() }

    /// Returns every built entry in creation order.
    #[must_use]
    pub fn entries(&self) -> Vec<(ID<InstantiationEntry>, Arc<InstantiationEntry>)> {
        self.entries
            .read()
            .entries()
            .filter_map(|(id, slot)| Some((id, slot.get()?.clone())))
            .collect()
    }
}
