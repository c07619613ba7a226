//! Handle-keyed resource tables scoped to one session.
//!
//! Each table sits behind its own mutex. Callers borrow entries through
//! closures ([`Registry::with`], [`Registry::with_mut`]) so that no reference
//! outlives the call that produced it. Never call into the platform from
//! inside one of those closures: platform callbacks re-enter the registries.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::RegistryError;
use crate::handle::{Handle, HandleAllocator};
use crate::model::{
    Activity, HardwareBuffer, Notification, NotificationChannel, Overlay, PixelBuffer,
    RemoteLayout, Task, View,
};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Activity,
    Overlay,
    View,
    Buffer,
    HardwareBuffer,
    RemoteLayout,
    RemoteView,
    Notification,
    Task,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Activity => "activity",
            Self::Overlay => "overlay",
            Self::View => "view",
            Self::Buffer => "buffer",
            Self::HardwareBuffer => "hardware buffer",
            Self::RemoteLayout => "remote layout",
            Self::RemoteView => "remote view",
            Self::Notification => "notification",
            Self::Task => "task",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
struct Entry<T> {
    owner: Option<Handle>,
    value: T,
}

#[derive(Debug)]
pub struct Registry<T> {
    kind: ResourceKind,
    entries: Mutex<HashMap<Handle, Entry<T>>>,
}

impl<T> Registry<T> {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn not_found(&self, handle: Handle) -> RegistryError {
        RegistryError::NotFound {
            kind: self.kind,
            handle,
        }
    }

    /// Inserts or replaces the entry for `handle`.
    pub fn insert(&self, handle: Handle, value: T) {
        self.insert_entry(handle, None, value);
    }

    /// Inserts an entry logically owned by another resource, see
    /// [`Registry::remove_owned_by`].
    pub fn insert_owned(&self, handle: Handle, owner: Handle, value: T) {
        self.insert_entry(handle, Some(owner), value);
    }

    fn insert_entry(&self, handle: Handle, owner: Option<Handle>, value: T) {
        lock(&self.entries).insert(handle, Entry { owner, value });
    }

    pub fn contains(&self, handle: Handle) -> bool {
        lock(&self.entries).contains_key(&handle)
    }

    pub fn owner_of(&self, handle: Handle) -> Result<Option<Handle>, RegistryError> {
        lock(&self.entries)
            .get(&handle)
            .map(|entry| entry.owner)
            .ok_or_else(|| self.not_found(handle))
    }

    pub fn with<R>(&self, handle: Handle, f: impl FnOnce(&T) -> R) -> Result<R, RegistryError> {
        let entries = lock(&self.entries);
        let entry = entries.get(&handle).ok_or_else(|| self.not_found(handle))?;
        Ok(f(&entry.value))
    }

    pub fn with_mut<R>(
        &self,
        handle: Handle,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R, RegistryError> {
        let mut entries = lock(&self.entries);
        let entry = entries
            .get_mut(&handle)
            .ok_or_else(|| self.not_found(handle))?;
        Ok(f(&mut entry.value))
    }

    pub fn remove(&self, handle: Handle) -> Result<T, RegistryError> {
        lock(&self.entries)
            .remove(&handle)
            .map(|entry| entry.value)
            .ok_or_else(|| self.not_found(handle))
    }

    /// Removes every entry owned by `owner`, ordered by handle.
    pub fn remove_owned_by(&self, owner: Handle) -> Vec<(Handle, T)> {
        self.remove_where(|_, entry_owner, _| entry_owner == Some(owner))
    }

    /// Removes every entry matching `predicate(handle, owner, value)`,
    /// ordered by handle.
    pub fn remove_where(
        &self,
        mut predicate: impl FnMut(Handle, Option<Handle>, &T) -> bool,
    ) -> Vec<(Handle, T)> {
        let mut entries = lock(&self.entries);
        let matching: Vec<Handle> = entries
            .iter()
            .filter(|(handle, entry)| predicate(**handle, entry.owner, &entry.value))
            .map(|(handle, _)| *handle)
            .collect();

        let mut removed: Vec<(Handle, T)> = matching
            .into_iter()
            .filter_map(|handle| entries.remove(&handle).map(|entry| (handle, entry.value)))
            .collect();
        removed.sort_by_key(|(handle, _)| *handle);
        removed
    }

    /// Empties the registry, ordered by handle.
    pub fn drain(&self) -> Vec<(Handle, T)> {
        let mut drained: Vec<(Handle, T)> = lock(&self.entries)
            .drain()
            .map(|(handle, entry)| (handle, entry.value))
            .collect();
        drained.sort_by_key(|(handle, _)| *handle);
        drained
    }

    pub fn handles(&self) -> Vec<Handle> {
        let mut handles: Vec<Handle> = lock(&self.entries).keys().copied().collect();
        handles.sort_unstable();
        handles
    }

    /// Handles owned by `owner` together with a projection of their value.
    pub fn collect_owned<R>(&self, owner: Handle, mut f: impl FnMut(&T) -> R) -> Vec<(Handle, R)> {
        let mut out: Vec<(Handle, R)> = lock(&self.entries)
            .iter()
            .filter(|(_, entry)| entry.owner == Some(owner))
            .map(|(handle, entry)| (*handle, f(&entry.value)))
            .collect();
        out.sort_by_key(|(handle, _)| *handle);
        out
    }

    /// Projections of every entry for which `f` returns `Some`, ordered by
    /// handle.
    pub fn collect_where<R>(
        &self,
        mut f: impl FnMut(Handle, Option<Handle>, &T) -> Option<R>,
    ) -> Vec<R> {
        let entries = lock(&self.entries);
        let mut handles: Vec<&Handle> = entries.keys().collect();
        handles.sort_unstable();
        handles
            .into_iter()
            .filter_map(|handle| {
                let entry = &entries[handle];
                f(*handle, entry.owner, &entry.value)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> Registry<T> {
    pub fn get(&self, handle: Handle) -> Result<T, RegistryError> {
        self.with(handle, T::clone)
    }
}

/// The resource tables and handle namespace of one session.
#[derive(Debug)]
pub struct Registries {
    pub allocator: HandleAllocator,
    pub activities: Registry<Activity>,
    pub overlays: Registry<Overlay>,
    pub views: Registry<View>,
    pub buffers: Registry<PixelBuffer>,
    pub hardware_buffers: Registry<HardwareBuffer>,
    pub remote_layouts: Registry<RemoteLayout>,
    pub notifications: Registry<Notification>,
    pub tasks: Registry<Task>,
    pub channels: Mutex<BTreeMap<String, NotificationChannel>>,
}

impl Default for Registries {
    fn default() -> Self {
        Self::new(HandleAllocator::default())
    }
}

impl Registries {
    pub fn new(allocator: HandleAllocator) -> Self {
        Self {
            allocator,
            activities: Registry::new(ResourceKind::Activity),
            overlays: Registry::new(ResourceKind::Overlay),
            views: Registry::new(ResourceKind::View),
            buffers: Registry::new(ResourceKind::Buffer),
            hardware_buffers: Registry::new(ResourceKind::HardwareBuffer),
            remote_layouts: Registry::new(ResourceKind::RemoteLayout),
            notifications: Registry::new(ResourceKind::Notification),
            tasks: Registry::new(ResourceKind::Task),
            channels: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn allocate(&self) -> Result<Handle, RegistryError> {
        self.allocator.allocate()
    }

    pub fn release(&self, handle: Handle) {
        self.allocator.release(handle);
    }

    /// True if `aid` names a live activity or overlay.
    pub fn is_container(&self, aid: Handle) -> bool {
        self.activities.contains(aid) || self.overlays.contains(aid)
    }

    /// Drops every view owned by an activity or overlay and releases the
    /// handles.
    pub fn remove_views_of(&self, owner: Handle) -> Vec<(Handle, View)> {
        let removed = self.views.remove_owned_by(owner);
        for (handle, _) in &removed {
            self.release(*handle);
        }
        removed
    }

    /// Removes `root` (optionally) and all of its descendants inside
    /// `owner`, deepest views first.
    pub fn remove_view_tree(
        &self,
        owner: Handle,
        root: Handle,
        include_root: bool,
    ) -> Vec<(Handle, View)> {
        let parents: HashMap<Handle, Option<Handle>> = self
            .views
            .collect_owned(owner, |view| view.parent)
            .into_iter()
            .collect();

        let depth_below_root = |mut handle: Handle| -> Option<usize> {
            let mut depth = 0;
            loop {
                if handle == root {
                    return Some(depth);
                }
                handle = parents.get(&handle).copied().flatten()?;
                depth += 1;
                if depth > parents.len() {
                    return None;
                }
            }
        };

        let mut depths: HashMap<Handle, usize> = HashMap::new();
        for handle in parents.keys() {
            if let Some(depth) = depth_below_root(*handle) {
                if depth > 0 || include_root {
                    depths.insert(*handle, depth);
                }
            }
        }

        let mut removed = self
            .views
            .remove_where(|handle, entry_owner, _| {
                entry_owner == Some(owner) && depths.contains_key(&handle)
            });
        removed.sort_by_key(|(handle, _)| std::cmp::Reverse(depths[handle]));

        for (handle, _) in &removed {
            self.release(*handle);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ViewKind;

    #[test]
    fn lookup_after_insert_and_not_found_after_remove() {
        let registry = Registry::<u32>::new(ResourceKind::Buffer);
        registry.insert(7, 42);

        assert_eq!(registry.get(7), Ok(42));
        assert_eq!(registry.remove(7), Ok(42));
        assert_eq!(
            registry.get(7),
            Err(RegistryError::NotFound {
                kind: ResourceKind::Buffer,
                handle: 7
            })
        );

        registry.insert(7, 43);
        assert_eq!(registry.get(7), Ok(43));
    }

    #[test]
    fn with_mut_mutates_in_place() {
        let registry = Registry::<Vec<u8>>::new(ResourceKind::Buffer);
        registry.insert(1, vec![1]);
        registry
            .with_mut(1, |value| value.push(2))
            .expect("entry exists");
        assert_eq!(registry.get(1), Ok(vec![1, 2]));
        assert!(registry.with_mut(2, |_| ()).is_err());
    }

    #[test]
    fn remove_owned_by_only_touches_owned_entries() {
        let registry = Registry::<&str>::new(ResourceKind::View);
        registry.insert_owned(1, 0, "a");
        registry.insert_owned(2, 0, "b");
        registry.insert_owned(3, 9, "c");
        registry.insert(4, "d");

        let removed = registry.remove_owned_by(0);
        assert_eq!(removed, vec![(1, "a"), (2, "b")]);
        assert_eq!(registry.handles(), vec![3, 4]);
    }

    #[test]
    fn drain_empties_registry() {
        let registry = Registry::<u8>::new(ResourceKind::Task);
        registry.insert(2, 0);
        registry.insert(1, 0);
        assert_eq!(registry.drain(), vec![(1, 0), (2, 0)]);
        assert!(registry.is_empty());
        assert!(registry.drain().is_empty());
    }

    #[test]
    fn view_tree_removal_cascades_to_descendants_only() {
        let registries = Registries::default();
        let aid = registries.allocate().expect("aid");
        let root = registries.allocate().expect("root");
        let child = registries.allocate().expect("child");
        let grandchild = registries.allocate().expect("grandchild");
        let sibling = registries.allocate().expect("sibling");

        registries
            .views
            .insert_owned(root, aid, View::new(ViewKind::LinearLayout, None));
        registries
            .views
            .insert_owned(child, aid, View::new(ViewKind::FrameLayout, Some(root)));
        registries
            .views
            .insert_owned(grandchild, aid, View::new(ViewKind::TextView, Some(child)));
        registries
            .views
            .insert_owned(sibling, aid, View::new(ViewKind::TextView, None));

        let removed: Vec<Handle> = registries
            .remove_view_tree(aid, root, false)
            .into_iter()
            .map(|(handle, _)| handle)
            .collect();
        assert_eq!(removed, vec![grandchild, child]);
        assert!(registries.views.contains(root));
        assert!(!registries.allocator.is_live(child));

        let removed = registries.remove_view_tree(aid, root, true);
        assert_eq!(removed.len(), 1);
        assert_eq!(registries.views.handles(), vec![sibling]);
    }

    #[test]
    fn concurrent_insert_remove_keeps_registry_consistent() {
        use std::sync::Arc;
        use std::thread;

        let registries = Arc::new(Registries::default());
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let registries = registries.clone();
                thread::spawn(move || {
                    let mut mine = Vec::new();
                    for _ in 0..250 {
                        let handle = registries.allocate().expect("allocate");
                        registries.tasks.insert(handle, Task::default());
                        mine.push(handle);
                    }
                    for handle in &mine {
                        registries.tasks.remove(*handle).expect("own entry present");
                        registries.release(*handle);
                    }
                    mine
                })
            })
            .collect();

        let mut all = Vec::new();
        for worker in workers {
            all.extend(worker.join().expect("worker thread"));
        }
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 1000);
        assert!(registries.tasks.is_empty());
        assert_eq!(registries.allocator.live_count(), 0);
    }
}
