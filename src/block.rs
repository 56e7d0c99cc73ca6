use std::{mem, ptr::NonNull};

/// Header written immediately before every payload in the arena.
///
/// The header is padded to [`ALIGNMENT`](crate::align::ALIGNMENT) so that a
/// 16-aligned header is always followed by a 16-aligned payload.
#[repr(C, align(16))]
pub(crate) struct Block {
  pub size: usize,
  pub next: Option<NonNull<Block>>,
  pub is_free: bool,
}

/// Bytes of bookkeeping in front of every payload.
pub const HEADER_SIZE: usize = mem::size_of::<Block>();

const _: () = assert!(HEADER_SIZE % crate::align::ALIGNMENT == 0);

impl Block {
  pub fn new(
    size: usize,
    is_free: bool,
    next: Option<NonNull<Block>>,
  ) -> Self {
    Self { size, next, is_free }
  }

  /// Writes a fresh header at `at` and returns it.
  ///
  /// # Safety
  ///
  /// `at` must be aligned for `Block` and valid for `HEADER_SIZE` bytes of writes.
  pub unsafe fn write(
    at: NonNull<u8>,
    block: Block,
  ) -> NonNull<Block> {
    let header = at.cast::<Block>();
    unsafe { header.write(block) };
    header
  }

  /// First payload byte of `header`.
  ///
  /// # Safety
  ///
  /// `header` must point into the arena.
  pub unsafe fn payload(header: NonNull<Block>) -> NonNull<u8> {
    unsafe { header.cast::<u8>().add(HEADER_SIZE) }
  }

  /// One past the last payload byte of `header`.
  ///
  /// # Safety
  ///
  /// `header` must point at a live header.
  pub unsafe fn end(header: NonNull<Block>) -> NonNull<u8> {
    unsafe { Self::payload(header).add(header.as_ref().size) }
  }

  /// Whether `next` starts exactly where `header`'s payload ends.
  ///
  /// # Safety
  ///
  /// `header` must point at a live header.
  pub unsafe fn is_adjacent(
    header: NonNull<Block>,
    next: NonNull<Block>,
  ) -> bool {
    unsafe { Self::end(header) == next.cast::<u8>() }
  }

  /// Carves a free block out of the tail of `header`, leaving exactly
  /// `keep` payload bytes in `header`.
  ///
  /// Returns `None` without touching anything when the surplus cannot hold
  /// a header plus one alignment unit. Because both sizes are multiples of
  /// the alignment this is the same as the surplus strictly exceeding one
  /// header.
  ///
  /// # Safety
  ///
  /// `header` must point at a live header and `keep` must be aligned.
  pub unsafe fn split(
    mut header: NonNull<Block>,
    keep: usize,
  ) -> Option<NonNull<Block>> {
    unsafe {
      let block = header.as_mut();

      if block.size < keep + HEADER_SIZE + crate::align::ALIGNMENT {
        return None;
      }

      let at = Self::payload(header).add(keep);
      let remainder = Self::write(
        at,
        Block::new(block.size - keep - HEADER_SIZE, true, block.next),
      );

      block.size = keep;
      block.next = Some(remainder);

      Some(remainder)
    }
  }
}
