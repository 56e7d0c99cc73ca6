//! Read-only views of the block chain.

use std::{fmt, marker::PhantomData, ptr::NonNull};

use crate::block::{Block, HEADER_SIZE};

/// Snapshot of one block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
  /// Address of the header.
  pub address: usize,
  /// Usable payload bytes.
  pub size: usize,
  pub is_free: bool,
}

impl BlockInfo {
  /// Address of the first payload byte.
  pub fn payload(&self) -> usize {
    self.address + HEADER_SIZE
  }

  /// Header plus payload.
  pub fn footprint(&self) -> usize {
    HEADER_SIZE + self.size
  }
}

/// Iterator over the chain in arena order.
#[derive(Clone)]
pub struct Blocks<'a> {
  current: Option<NonNull<Block>>,
  _chain: PhantomData<&'a ()>,
}

impl Blocks<'_> {
  pub(crate) fn new(head: Option<NonNull<Block>>) -> Self {
    Self {
      current: head,
      _chain: PhantomData,
    }
  }
}

impl Iterator for Blocks<'_> {
  type Item = BlockInfo;

  fn next(&mut self) -> Option<Self::Item> {
    let header = self.current?;
    let block = unsafe { header.as_ref() };

    self.current = block.next;

    Some(BlockInfo {
      address: header.as_ptr() as usize,
      size: block.size,
      is_free: block.is_free,
    })
  }
}

/// Human readable listing of every block, one per line.
pub struct MemoryMap<'a> {
  blocks: Blocks<'a>,
}

impl<'a> MemoryMap<'a> {
  pub(crate) fn new(blocks: Blocks<'a>) -> Self {
    Self { blocks }
  }
}

impl fmt::Display for MemoryMap<'_> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "Memory Blocks:")?;

    for block in self.blocks.clone() {
      writeln!(
        f,
        "Block at {:#x}, size: {}, free: {}",
        block.address, block.size, block.is_free
      )?;
    }

    Ok(())
  }
}
