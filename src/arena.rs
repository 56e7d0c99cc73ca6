//! Sources of address space for the allocator.
//!
//! An [`Arena`] knows how to do one thing: extend a contiguous range of bytes
//! and say where the new bytes start. The allocator never gives bytes back.

use std::{
  alloc::{self, Layout},
  ptr::NonNull,
};

use crate::{align::ALIGNMENT, error::ArenaError};

/// The environment primitive the allocator is built on.
///
/// # Safety
///
/// The allocator writes block headers and client data through every address
/// returned by [`grow`](Arena::grow), from safe code. An implementation must
/// guarantee that a successful `grow(bytes)`:
///
/// - returns an address aligned to [`ALIGNMENT`],
/// - is valid for reads and writes of `bytes` bytes for as long as the arena
///   lives, and is not used by anything else,
/// - is higher than every address returned before it, with no overlap.
///
/// A failed call must leave the arena as it was.
///
/// # Examples
///
/// ```rust
/// use std::ptr::NonNull;
///
/// use rheap::{Arena, ArenaError, FreeListAllocator, align::ALIGNMENT};
///
/// #[repr(C, align(16))]
/// struct Slab([u8; 1024]);
///
/// struct SlabArena {
///   base: NonNull<u8>,
///   used: usize,
/// }
///
/// // SAFETY: hands out disjoint, increasing, 16-aligned ranges of a leaked
/// // buffer nothing else references.
/// unsafe impl Arena for SlabArena {
///   fn grow(
///     &mut self,
///     bytes: usize,
///   ) -> Result<NonNull<u8>, ArenaError> {
///     let remaining = 1024 - self.used;
///     if bytes > remaining {
///       return Err(ArenaError::CapacityExceeded { requested: bytes, remaining });
///     }
///
///     let start = unsafe { self.base.add(self.used) };
///     self.used += bytes;
///     Ok(start)
///   }
/// }
///
/// let slab: &'static mut Slab = Box::leak(Box::new(Slab([0; 1024])));
/// let arena = SlabArena { base: NonNull::from(slab).cast(), used: 0 };
/// let mut allocator = FreeListAllocator::new(arena);
///
/// let allocation = allocator.allocate(100).unwrap();
/// assert_eq!(allocation.as_ptr().as_ptr() as usize % ALIGNMENT, 0);
/// assert!(allocator.allocate(2048).is_none());
/// ```
pub unsafe trait Arena {
  /// Extends the arena by `bytes` and returns the first of the new bytes.
  ///
  /// `bytes` is always a multiple of [`ALIGNMENT`].
  fn grow(
    &mut self,
    bytes: usize,
  ) -> Result<NonNull<u8>, ArenaError>;
}

/// Grows the process data segment with `sbrk(2)`.
///
/// The program break is process-wide state: this arena assumes nothing else
/// moves it concurrently. Something else moving it between two growths is
/// tolerated, the allocator simply never merges blocks across the gap.
#[cfg(unix)]
#[derive(Debug, Default)]
pub struct SbrkArena {
  grows: usize,
}

#[cfg(unix)]
impl SbrkArena {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of successful growths so far.
  pub fn grow_count(&self) -> usize {
    self.grows
  }

  /// Current program break.
  pub fn program_break() -> *mut u8 {
    unsafe { libc::sbrk(0) as *mut u8 }
  }
}

// SAFETY: each successful `sbrk` hands out fresh bytes above the previous
// break, and the returned start is padded up to `ALIGNMENT`.
#[cfg(unix)]
unsafe impl Arena for SbrkArena {
  fn grow(
    &mut self,
    bytes: usize,
  ) -> Result<NonNull<u8>, ArenaError> {
    let current = Self::program_break();
    let padding = crate::align::padding_for(current as usize);

    let total = bytes.checked_add(padding).ok_or(ArenaError::TooLarge(bytes))?;
    let increment = libc::intptr_t::try_from(total).map_err(|_| ArenaError::TooLarge(total))?;

    let previous = unsafe { libc::sbrk(increment) };

    if previous == usize::MAX as *mut libc::c_void {
      return Err(ArenaError::OutOfMemory {
        requested: total,
        source: std::io::Error::last_os_error(),
      });
    }

    self.grows += 1;

    log::trace!("sbrk grew by {total} bytes ({padding} padding) at {previous:?}");

    // A successful `sbrk` never returns null, and the padding stays inside
    // the range it just granted.
    Ok(unsafe { NonNull::new_unchecked((previous as *mut u8).add(padding)) })
  }
}

/// A bounded arena over a single buffer taken from the system allocator.
///
/// Growth hands out the buffer front to back; nothing is returned until the
/// arena itself is dropped.
#[derive(Debug)]
pub struct FixedArena {
  base: NonNull<u8>,
  layout: Layout,
  used: usize,
  grows: usize,
}

impl FixedArena {
  /// Reserves `capacity` bytes (rounded up to [`ALIGNMENT`]).
  pub fn with_capacity(capacity: usize) -> Result<Self, ArenaError> {
    if capacity == 0 || capacity > isize::MAX as usize - ALIGNMENT {
      return Err(ArenaError::InvalidCapacity(capacity));
    }

    let layout = Layout::from_size_align(crate::align!(capacity), ALIGNMENT)
      .map_err(|_| ArenaError::InvalidCapacity(capacity))?;

    let base = match NonNull::new(unsafe { alloc::alloc(layout) }) {
      Some(base) => base,
      None => alloc::handle_alloc_error(layout),
    };

    Ok(Self {
      base,
      layout,
      used: 0,
      grows: 0,
    })
  }

  pub fn capacity(&self) -> usize {
    self.layout.size()
  }

  /// Bytes handed out so far.
  pub fn used(&self) -> usize {
    self.used
  }

  /// Number of successful growths so far.
  pub fn grow_count(&self) -> usize {
    self.grows
  }

  /// First byte of the buffer.
  pub fn base(&self) -> NonNull<u8> {
    self.base
  }
}

// SAFETY: growth bumps through one owned buffer whose base is 16-aligned and
// whose every grant is a multiple of `ALIGNMENT`, checked against capacity.
unsafe impl Arena for FixedArena {
  fn grow(
    &mut self,
    bytes: usize,
  ) -> Result<NonNull<u8>, ArenaError> {
    let remaining = self.capacity() - self.used;

    if bytes > remaining {
      return Err(ArenaError::CapacityExceeded { requested: bytes, remaining });
    }

    let start = unsafe { self.base.add(self.used) };
    self.used += bytes;
    self.grows += 1;

    Ok(start)
  }
}

impl Drop for FixedArena {
  fn drop(&mut self) {
    unsafe { alloc::dealloc(self.base.as_ptr(), self.layout) };
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use std::sync::Mutex;

  use super::*;

  /// Serializes tests that move the program break.
  pub(crate) static SBRK_LOCK: Mutex<()> = Mutex::new(());

  #[test]
  fn test_fixed_arena_grows_front_to_back() {
    let mut arena = FixedArena::with_capacity(100).unwrap();
    assert_eq!(arena.capacity(), 112);

    let first = arena.grow(48).unwrap();
    let second = arena.grow(64).unwrap();

    assert_eq!(first, arena.base());
    assert_eq!(second.as_ptr() as usize - first.as_ptr() as usize, 48);
    assert_eq!(first.as_ptr() as usize % ALIGNMENT, 0);
    assert_eq!(arena.used(), 112);
    assert_eq!(arena.grow_count(), 2);
  }

  #[test]
  fn test_fixed_arena_exhaustion_leaves_state() {
    let mut arena = FixedArena::with_capacity(64).unwrap();
    arena.grow(48).unwrap();

    match arena.grow(32) {
      Err(ArenaError::CapacityExceeded { requested, remaining }) => {
        assert_eq!(requested, 32);
        assert_eq!(remaining, 16);
      }
      other => panic!("unexpected growth result: {other:?}"),
    }

    assert_eq!(arena.used(), 48);
    assert_eq!(arena.grow_count(), 1);
    assert!(arena.grow(16).is_ok());
  }

  #[test]
  fn test_fixed_arena_rejects_zero_capacity() {
    assert!(matches!(FixedArena::with_capacity(0), Err(ArenaError::InvalidCapacity(0))));
  }

  #[cfg(unix)]
  #[test]
  fn test_sbrk_arena_returns_aligned_growth() {
    let _break = SBRK_LOCK.lock().unwrap();
    let mut arena = SbrkArena::new();

    let first = arena.grow(64).unwrap();
    assert_eq!(first.as_ptr() as usize % ALIGNMENT, 0);

    let second = arena.grow(32).unwrap();
    assert_eq!(second.as_ptr() as usize % ALIGNMENT, 0);
    assert!(second > first);
    assert_eq!(arena.grow_count(), 2);

    unsafe {
      first.as_ptr().write_bytes(0x5A, 64);
      assert_eq!(*first.as_ptr().add(63), 0x5A);
    }
  }
}
