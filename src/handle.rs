use std::{fmt, ptr::NonNull};

use crate::block::{Block, HEADER_SIZE};

/// A live allocation handed out by a [`FreeListAllocator`](crate::FreeListAllocator).
///
/// The handle owns the right to release or resize its block, which is why
/// those operations take it by value. It only ever points one header past a
/// block header, and the header is recovered in exactly one place.
pub struct Allocation {
  payload: NonNull<u8>,
}

impl Allocation {
  pub(crate) fn new(header: NonNull<Block>) -> Self {
    Self {
      payload: unsafe { Block::payload(header) },
    }
  }

  /// Rebuilds a handle from a pointer previously obtained through
  /// [`Allocation::into_raw`].
  ///
  /// # Safety
  ///
  /// `ptr` must come from `into_raw` on a handle of a still-alive allocator,
  /// and no other handle for the same block may exist.
  pub unsafe fn from_raw(ptr: NonNull<u8>) -> Self {
    Self { payload: ptr }
  }

  /// Start of the usable region. Always aligned to [`ALIGNMENT`](crate::align::ALIGNMENT).
  pub fn as_ptr(&self) -> NonNull<u8> {
    self.payload
  }

  /// Gives up the handle, leaving only the raw pointer.
  pub fn into_raw(self) -> NonNull<u8> {
    self.payload
  }

  pub(crate) fn header(&self) -> NonNull<Block> {
    unsafe { self.payload.sub(HEADER_SIZE).cast::<Block>() }
  }
}

impl fmt::Debug for Allocation {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_tuple("Allocation").field(&self.payload).finish()
  }
}

impl PartialEq for Allocation {
  fn eq(
    &self,
    other: &Self,
  ) -> bool {
    self.payload == other.payload
  }
}
