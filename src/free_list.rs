use std::ptr::{self, NonNull};

use crate::{
  align,
  align::ALIGNMENT,
  arena::Arena,
  block::{Block, HEADER_SIZE},
  config::{Coalesce, Config},
  error::{AllocError, ResizeError},
  handle::Allocation,
  inspect::{Blocks, MemoryMap},
};

/// Largest request the allocator will try to satisfy. Anything above fails
/// with [`AllocError::SizeOverflow`].
pub const MAX_REQUEST: usize = (isize::MAX as usize - HEADER_SIZE) & !(ALIGNMENT - 1);

/// Outcome of a first-fit scan.
enum Fit {
  /// A free block large enough for the request.
  Found(NonNull<Block>),
  /// Nothing fits; carries the last block of the chain, if any.
  Tail(Option<NonNull<Block>>),
}

/// First-fit allocator over a singly linked chain of block headers.
///
/// Headers are kept in increasing address order: new blocks are only ever
/// appended at the arena end or carved out of an existing block by a split.
#[derive(Debug)]
pub struct FreeListAllocator<A: Arena> {
  head: Option<NonNull<Block>>,
  arena: A,
  config: Config,
}

#[cfg(unix)]
impl Default for FreeListAllocator<crate::arena::SbrkArena> {
  fn default() -> Self {
    Self::new(crate::arena::SbrkArena::new())
  }
}

impl<A: Arena> FreeListAllocator<A> {
  pub fn new(arena: A) -> Self {
    Self::with_config(arena, Config::default())
  }

  pub fn with_config(
    arena: A,
    config: Config,
  ) -> Self {
    Self {
      head: None,
      arena,
      config,
    }
  }

  pub fn arena(&self) -> &A {
    &self.arena
  }

  pub fn config(&self) -> Config {
    self.config
  }

  /// Allocates at least `size` bytes, 16-aligned.
  ///
  /// Returns `None` for zero-sized requests and when the arena cannot grow.
  /// Use [`try_allocate`](Self::try_allocate) to learn which.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Option<Allocation> {
    self.try_allocate(size).ok()
  }

  pub fn try_allocate(
    &mut self,
    size: usize,
  ) -> Result<Allocation, AllocError> {
    let size = Self::aligned(size)?;

    let header = match self.find_fit(size) {
      Fit::Found(mut header) => {
        unsafe {
          if let Some(remainder) = Block::split(header, size) {
            log::trace!("split {header:?}: kept {size} bytes, {remainder:?} is free");
          }
          header.as_mut().is_free = false;
        }
        log::trace!("reused {header:?} for {size} bytes");
        header
      }
      Fit::Tail(tail) => self.grow(tail, size)?,
    };

    Ok(Allocation::new(header))
  }

  /// Allocates `count * element_size` zeroed bytes.
  ///
  /// A product that overflows `usize` yields `None`.
  pub fn zero_allocate(
    &mut self,
    count: usize,
    element_size: usize,
  ) -> Option<Allocation> {
    self.try_zero_allocate(count, element_size).ok()
  }

  pub fn try_zero_allocate(
    &mut self,
    count: usize,
    element_size: usize,
  ) -> Result<Allocation, AllocError> {
    let total = count.checked_mul(element_size).ok_or(AllocError::SizeOverflow)?;
    let allocation = self.try_allocate(total)?;

    unsafe { allocation.as_ptr().write_bytes(0, total) };

    Ok(allocation)
  }

  /// Marks the block free and merges it with free neighbours.
  ///
  /// Releasing `None` does nothing. With [`Coalesce::Forward`] only the
  /// following blocks are absorbed, so a free block right before this one
  /// stays separate.
  ///
  /// # Safety
  ///
  /// `allocation` must have been returned by this allocator. A block released
  /// twice through a forged handle is detected on a best-effort basis only:
  /// once its header has been absorbed by a neighbour the behaviour is
  /// undefined.
  pub unsafe fn release(
    &mut self,
    allocation: Option<Allocation>,
  ) {
    let Some(allocation) = allocation else {
      return;
    };

    let mut header = allocation.header();

    unsafe {
      if header.as_ref().is_free {
        log::error!("ignoring release of already free block {header:?}");
        return;
      }

      header.as_mut().is_free = true;
      Self::coalesce_forward(header);

      if self.config.coalesce == Coalesce::Both {
        self.coalesce_backward(header);
      }
    }
  }

  /// Resizes an allocation, in place when it already has room.
  ///
  /// `None` behaves like [`allocate`](Self::allocate). Shrinking splits off
  /// the surplus when it can hold a header and one alignment unit. Growing
  /// moves the data to a new block and releases the old one. On failure the
  /// error carries the original allocation back, untouched.
  ///
  /// # Safety
  ///
  /// `allocation` must have been returned by this allocator.
  pub unsafe fn resize(
    &mut self,
    allocation: Option<Allocation>,
    new_size: usize,
  ) -> Result<Allocation, ResizeError> {
    let Some(allocation) = allocation else {
      return self
        .try_allocate(new_size)
        .map_err(|source| ResizeError::new(new_size, source, None));
    };

    let size = match Self::aligned(new_size) {
      Ok(size) => size,
      Err(source) => return Err(ResizeError::new(new_size, source, Some(allocation))),
    };

    let header = allocation.header();
    let current = unsafe { header.as_ref().size };

    if current >= size {
      unsafe {
        if let Some(remainder) = Block::split(header, size) {
          log::trace!("shrunk {header:?} to {size} bytes, {remainder:?} is free");
          Self::coalesce_forward(remainder);
        }
      }
      return Ok(allocation);
    }

    let moved = match self.try_allocate(new_size) {
      Ok(moved) => moved,
      Err(source) => return Err(ResizeError::new(new_size, source, Some(allocation))),
    };

    unsafe {
      ptr::copy_nonoverlapping(
        allocation.as_ptr().as_ptr(),
        moved.as_ptr().as_ptr(),
        current.min(size),
      );
      self.release(Some(allocation));
    }

    Ok(moved)
  }

  /// Usable bytes behind `allocation`. At least what was requested.
  ///
  /// # Safety
  ///
  /// `allocation` must have been returned by this allocator.
  pub unsafe fn usable_size(
    &self,
    allocation: &Allocation,
  ) -> usize {
    unsafe { allocation.header().as_ref().size }
  }

  /// Every block in arena order.
  pub fn blocks(&self) -> Blocks<'_> {
    Blocks::new(self.head)
  }

  /// Listing of every block: address, size and free flag.
  pub fn debug_dump(&self) -> MemoryMap<'_> {
    MemoryMap::new(self.blocks())
  }

  fn aligned(size: usize) -> Result<usize, AllocError> {
    match size {
      0 => Err(AllocError::ZeroSize),
      size if size > MAX_REQUEST => Err(AllocError::SizeOverflow),
      size => Ok(align!(size)),
    }
  }

  fn find_fit(
    &self,
    size: usize,
  ) -> Fit {
    let mut last = None;
    let mut current = self.head;

    while let Some(header) = current {
      let block = unsafe { header.as_ref() };

      if block.is_free && block.size >= size {
        return Fit::Found(header);
      }

      last = Some(header);
      current = block.next;
    }

    Fit::Tail(last)
  }

  /// Appends a live block of `size` payload bytes after `tail`.
  fn grow(
    &mut self,
    tail: Option<NonNull<Block>>,
    size: usize,
  ) -> Result<NonNull<Block>, AllocError> {
    let bytes = size + HEADER_SIZE;
    let start = self
      .arena
      .grow(bytes)
      .inspect_err(|err| log::debug!("arena refused to grow: {err}"))?;

    let header = unsafe { Block::write(start, Block::new(size, false, None)) };

    match tail {
      Some(mut tail) => {
        debug_assert!(tail < header, "arena grew below the chain tail");
        unsafe { tail.as_mut().next = Some(header) };
      }
      None => self.head = Some(header),
    }

    log::trace!("grew arena by {bytes} bytes, new block {header:?}");

    Ok(header)
  }

  /// Absorbs every free, physically adjacent successor into `header`.
  unsafe fn coalesce_forward(mut header: NonNull<Block>) {
    unsafe {
      while let Some(next) = header.as_ref().next {
        let absorbed = next.as_ref();

        if !absorbed.is_free || !Block::is_adjacent(header, next) {
          break;
        }

        let (size, after) = (absorbed.size, absorbed.next);
        let block = header.as_mut();
        block.size += HEADER_SIZE + size;
        block.next = after;

        log::trace!("coalesced {next:?} into {header:?}");
      }
    }
  }

  /// Merges `header` into its predecessor when that one is free and adjacent.
  unsafe fn coalesce_backward(
    &mut self,
    header: NonNull<Block>,
  ) {
    let mut current = self.head;

    while let Some(previous) = current {
      let block = unsafe { previous.as_ref() };

      if block.next == Some(header) {
        if block.is_free && unsafe { Block::is_adjacent(previous, header) } {
          unsafe { Self::coalesce_forward(previous) };
        }
        return;
      }

      current = block.next;
    }
  }
}
