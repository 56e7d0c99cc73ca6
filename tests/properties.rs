//! Random operation sequences against a bounded arena.

use proptest::prelude::*;
use rheap::{
  Allocation, Coalesce, Config, FixedArena, FreeListAllocator, HEADER_SIZE, align::ALIGNMENT,
};

const CAPACITY: usize = 64 * 1024;

#[derive(Debug, Clone)]
enum Op {
  Allocate(usize),
  ZeroAllocate(usize, usize),
  Release(usize),
  Resize(usize, usize),
}

fn arb_op() -> impl Strategy<Value = Op> {
  prop_oneof![
    (1usize..600).prop_map(Op::Allocate),
    (1usize..40, 1usize..16).prop_map(|(count, size)| Op::ZeroAllocate(count, size)),
    any::<usize>().prop_map(Op::Release),
    (any::<usize>(), 1usize..800).prop_map(|(index, size)| Op::Resize(index, size)),
  ]
}

/// A live allocation together with the byte it was filled with.
struct Live {
  allocation: Allocation,
  len: usize,
  byte: u8,
}

impl Live {
  fn fill(&self) {
    unsafe { self.allocation.as_ptr().write_bytes(self.byte, self.len) };
  }

  fn intact(&self) -> bool {
    let bytes = unsafe { std::slice::from_raw_parts(self.allocation.as_ptr().as_ptr(), self.len) };
    bytes.iter().all(|&b| b == self.byte)
  }
}

fn check_chain(allocator: &FreeListAllocator<FixedArena>) -> Result<(), TestCaseError> {
  let blocks: Vec<_> = allocator.blocks().collect();
  let base = allocator.arena().base().as_ptr() as usize;

  let mut expected_address = base;
  for block in &blocks {
    prop_assert_eq!(block.address, expected_address, "chain must tile the arena");
    prop_assert!(block.size > 0);
    prop_assert_eq!(block.size % ALIGNMENT, 0);
    expected_address += block.footprint();
  }

  prop_assert_eq!(expected_address - base, allocator.arena().used());
  Ok(())
}

fn run(
  config: Config,
  ops: Vec<Op>,
) -> Result<(), TestCaseError> {
  let arena = FixedArena::with_capacity(CAPACITY).unwrap();
  let mut allocator = FreeListAllocator::with_config(arena, config);
  let mut live: Vec<Live> = Vec::new();
  let mut next_byte = 1u8;

  for op in ops {
    match op {
      Op::Allocate(size) => {
        if let Some(allocation) = allocator.allocate(size) {
          prop_assert_eq!(allocation.as_ptr().as_ptr() as usize % ALIGNMENT, 0);
          let entry = Live { allocation, len: size, byte: next_byte };
          entry.fill();
          live.push(entry);
        }
      }
      Op::ZeroAllocate(count, size) => {
        if let Some(allocation) = allocator.zero_allocate(count, size) {
          let mut entry = Live { allocation, len: count * size, byte: 0 };
          prop_assert!(entry.intact(), "zero_allocate returned dirty memory");
          entry.byte = next_byte;
          entry.fill();
          live.push(entry);
        }
      }
      Op::Release(index) if !live.is_empty() => {
        let entry = live.swap_remove(index % live.len());
        unsafe { allocator.release(Some(entry.allocation)) };
      }
      Op::Resize(index, size) if !live.is_empty() => {
        let Live { allocation, len, byte } = live.swap_remove(index % live.len());

        let entry = match unsafe { allocator.resize(Some(allocation), size) } {
          Ok(allocation) => {
            let kept = Live { allocation, len: len.min(size), byte };
            prop_assert!(kept.intact(), "resize lost the preserved prefix");
            let usable = unsafe { allocator.usable_size(&kept.allocation) };
            prop_assert!(usable >= size);
            Live { len: size, ..kept }
          }
          Err(err) => Live {
            allocation: err.into_original().unwrap(),
            len,
            byte,
          },
        };

        entry.fill();
        live.push(entry);
      }
      _ => {}
    }

    next_byte = next_byte.wrapping_add(1).max(1);

    check_chain(&allocator)?;
    for entry in &live {
      prop_assert!(entry.intact(), "a live allocation was overwritten");
    }
  }

  for entry in live {
    unsafe { allocator.release(Some(entry.allocation)) };
  }

  check_chain(&allocator)?;
  prop_assert!(allocator.blocks().all(|block| block.is_free));
  Ok(())
}

proptest! {
  #[test]
  fn forward_coalescing_keeps_chain_consistent(ops in prop::collection::vec(arb_op(), 1..80)) {
    run(Config::new(), ops)?;
  }
}

proptest! {
  #[test]
  fn bidirectional_coalescing_keeps_chain_consistent(
    ops in prop::collection::vec(arb_op(), 1..80),
  ) {
    run(Config::new().with_coalesce(Coalesce::Both), ops)?;
  }
}

proptest! {
  #[test]
  fn resize_preserves_prefix(old in 1usize..512, new in 1usize..512) {
    let mut allocator = FreeListAllocator::new(FixedArena::with_capacity(4096).unwrap());
    let allocation = allocator.allocate(old).unwrap();
    let pattern: Vec<u8> = (0..old).map(|i| (i % 251) as u8).collect();

    unsafe {
      std::ptr::copy_nonoverlapping(pattern.as_ptr(), allocation.as_ptr().as_ptr(), old);

      let resized = allocator.resize(Some(allocation), new).unwrap();
      let kept = old.min(new);
      let bytes = std::slice::from_raw_parts(resized.as_ptr().as_ptr(), kept);

      prop_assert_eq!(bytes, &pattern[..kept]);
      prop_assert!(allocator.usable_size(&resized) >= new);
    }
  }
}

proptest! {
  #[test]
  fn release_then_reuse_never_grows(size in 1usize..1024, smaller in 1usize..1024) {
    let smaller = smaller.min(size);
    let mut allocator = FreeListAllocator::new(FixedArena::with_capacity(4096).unwrap());

    let first = allocator.allocate(size).unwrap();
    let address = first.as_ptr();
    unsafe { allocator.release(Some(first)) };

    let reused = allocator.allocate(smaller).unwrap();
    prop_assert_eq!(reused.as_ptr(), address);
    prop_assert_eq!(allocator.arena().grow_count(), 1);

    let blocks: Vec<_> = allocator.blocks().collect();
    let total: usize = blocks.iter().map(|block| block.footprint()).sum();
    prop_assert_eq!(total, HEADER_SIZE + rheap::align!(size));
  }
}
