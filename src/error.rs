//! Error types for the allocator and its arenas

use std::io;

use thiserror::Error;

use crate::handle::Allocation;

/// Reasons an [`Arena`](crate::arena::Arena) could not extend itself.
#[derive(Error, Debug)]
pub enum ArenaError {
  /// The operating system refused to move the program break
  #[error("environment refused to extend the arena by {requested} bytes: {source}")]
  OutOfMemory {
    /// Bytes asked for, padding included
    requested: usize,
    /// Error reported by the OS
    source: io::Error,
  },

  /// A bounded arena has no room left
  #[error("arena capacity exceeded: requested {requested} bytes, {remaining} remaining")]
  CapacityExceeded {
    /// Bytes asked for
    requested: usize,
    /// Bytes still available
    remaining: usize,
  },

  /// The request does not fit the platform's break increment type
  #[error("growth of {0} bytes is not representable")]
  TooLarge(usize),

  /// A bounded arena was configured with an unusable capacity
  #[error("invalid arena capacity: {0} bytes")]
  InvalidCapacity(usize),
}

/// Reasons an allocation request produced no allocation.
#[derive(Error, Debug)]
pub enum AllocError {
  /// Zero-byte requests are rejected
  #[error("zero-sized request")]
  ZeroSize,

  /// The requested size (or `count * element_size`) is not representable
  #[error("requested size overflows")]
  SizeOverflow,

  /// The arena could not grow
  #[error(transparent)]
  Arena(#[from] ArenaError),
}

impl AllocError {
  /// Whether the request itself was invalid, as opposed to memory running out.
  pub fn is_invalid_request(&self) -> bool {
    matches!(self, Self::ZeroSize | Self::SizeOverflow)
  }
}

/// A failed resize. The original allocation, if any, is untouched and can be
/// taken back with [`ResizeError::into_original`].
#[derive(Error, Debug)]
#[error("resize to {requested} bytes failed: {source}")]
pub struct ResizeError {
  requested: usize,
  source: AllocError,
  original: Option<Allocation>,
}

impl ResizeError {
  pub(crate) fn new(
    requested: usize,
    source: AllocError,
    original: Option<Allocation>,
  ) -> Self {
    Self { requested, source, original }
  }

  /// Size that was asked for.
  pub fn requested(&self) -> usize {
    self.requested
  }

  /// Why the new size could not be satisfied.
  pub fn cause(&self) -> &AllocError {
    &self.source
  }

  /// Hands back the allocation that was passed in, still live and unchanged.
  pub fn into_original(self) -> Option<Allocation> {
    self.original
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_messages() {
    let err = AllocError::from(ArenaError::CapacityExceeded { requested: 64, remaining: 32 });
    assert_eq!(err.to_string(), "arena capacity exceeded: requested 64 bytes, 32 remaining");
    assert!(!err.is_invalid_request());

    let err = ResizeError::new(10, AllocError::ZeroSize, None);
    assert_eq!(err.to_string(), "resize to 10 bytes failed: zero-sized request");
    assert!(err.cause().is_invalid_request());
    assert!(err.into_original().is_none());
  }
}
