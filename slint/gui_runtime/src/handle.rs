use std::collections::HashSet;
use std::sync::Mutex;

use crate::error::RegistryError;
use crate::registry::lock;

/// Integer identifier of a session resource. Valid handles are non-negative.
pub type Handle = i32;

/// Wire sentinel for "no handle", returned by failed creations.
pub const NO_HANDLE: Handle = -1;

/// Maps the wire convention (negative means absent) onto `Option`.
pub fn optional(handle: Handle) -> Option<Handle> {
    (handle >= 0).then_some(handle)
}

/// Session-wide handle namespace shared by every resource kind.
///
/// Allocation walks forward from the last issued handle and only wraps after
/// reaching the limit, so a released handle is not reissued until the rest of
/// the namespace has been cycled through.
#[derive(Debug)]
pub struct HandleAllocator {
    state: Mutex<AllocatorState>,
    limit: Handle,
}

#[derive(Debug, Default)]
struct AllocatorState {
    next: Handle,
    live: HashSet<Handle>,
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self::with_limit(Handle::MAX)
    }
}

impl HandleAllocator {
    /// Allocator issuing handles in `0..limit`.
    pub fn with_limit(limit: Handle) -> Self {
        Self {
            state: Mutex::new(AllocatorState::default()),
            limit: limit.max(1),
        }
    }

    pub fn allocate(&self) -> Result<Handle, RegistryError> {
        let mut state = lock(&self.state);

        if state.live.len() >= self.limit as usize {
            return Err(RegistryError::Exhausted);
        }

        loop {
            let candidate = state.next;
            state.next = if candidate >= self.limit - 1 {
                0
            } else {
                candidate + 1
            };

            if state.live.insert(candidate) {
                return Ok(candidate);
            }
        }
    }

    /// Returns `false` if the handle was not live.
    pub fn release(&self, handle: Handle) -> bool {
        lock(&self.state).live.remove(&handle)
    }

    pub fn is_live(&self, handle: Handle) -> bool {
        lock(&self.state).live.contains(&handle)
    }

    pub fn live_count(&self) -> usize {
        lock(&self.state).live.len()
    }

    pub fn release_all(&self) {
        lock(&self.state).live.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_handle_is_zero_and_handles_are_unique() {
        let allocator = HandleAllocator::default();
        let handles: Vec<_> = (0..100)
            .map(|_| allocator.allocate().expect("allocate"))
            .collect();

        assert_eq!(handles[0], 0);
        let unique: HashSet<_> = handles.iter().copied().collect();
        assert_eq!(unique.len(), handles.len());
        assert_eq!(allocator.live_count(), 100);
    }

    #[test]
    fn released_handle_is_not_reissued_immediately() {
        let allocator = HandleAllocator::with_limit(4);
        let first = allocator.allocate().expect("allocate");
        assert!(allocator.release(first));

        let second = allocator.allocate().expect("allocate");
        assert_ne!(first, second);
    }

    #[test]
    fn exhaustion_is_a_defined_error_and_release_recovers() {
        let allocator = HandleAllocator::with_limit(3);
        for _ in 0..3 {
            allocator.allocate().expect("allocate within limit");
        }
        assert_eq!(allocator.allocate(), Err(RegistryError::Exhausted));

        assert!(allocator.release(1));
        assert_eq!(allocator.allocate(), Ok(1));
    }

    #[test]
    fn wraps_around_skipping_live_handles() {
        let allocator = HandleAllocator::with_limit(3);
        let a = allocator.allocate().expect("allocate");
        let b = allocator.allocate().expect("allocate");
        let c = allocator.allocate().expect("allocate");
        assert_eq!((a, b, c), (0, 1, 2));

        allocator.release(0);
        allocator.release(2);
        assert_eq!(allocator.allocate(), Ok(0));
        assert_eq!(allocator.allocate(), Ok(2));
    }

    #[test]
    fn double_release_reports_false() {
        let allocator = HandleAllocator::default();
        let handle = allocator.allocate().expect("allocate");
        assert!(allocator.release(handle));
        assert!(!allocator.release(handle));
        assert!(!allocator.is_live(handle));
    }

    #[test]
    fn optional_maps_negative_to_none() {
        assert_eq!(optional(NO_HANDLE), None);
        assert_eq!(optional(0), Some(0));
    }
}
