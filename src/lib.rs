//! # rheap - A First-Fit Free-List Allocator
//!
//! This crate provides a general purpose allocator that carves client
//! allocations out of an arena it grows on demand, by default with the
//! `sbrk` system call.
//!
//! ## Overview
//!
//! Every allocation is preceded by a header, and the headers form a singly
//! linked chain in address order:
//!
//! ```text
//!   Arena (grows to the right):
//!
//!   head
//!    │
//!    ▼
//!   ┌──────┬──────────┬──────┬───────┬──────┬──────────────┐
//!   │ hdr  │ payload  │ hdr  │ free  │ hdr  │   payload    │ ← program break
//!   │ used │          │ free │       │ used │              │
//!   └──┬───┴──────────┴──▲─┬─┴───────┴──▲───┴──────────────┘
//!      └─────────────────┘ └────────────┘
//!                 next           next
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rheap
//!   ├── align      - ALIGNMENT and the align! macro
//!   ├── arena      - Arena trait, SbrkArena, FixedArena
//!   ├── block      - Block header (internal)
//!   ├── config     - Coalescing options
//!   ├── error      - AllocError, ArenaError, ResizeError
//!   ├── free_list  - FreeListAllocator
//!   ├── handle     - Allocation handles
//!   └── inspect    - Block listing and memory map
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rheap::{FixedArena, FreeListAllocator};
//!
//! let mut allocator = FreeListAllocator::new(FixedArena::with_capacity(4096).unwrap());
//!
//! let numbers = allocator.zero_allocate(40, 4).unwrap();
//! unsafe {
//!     numbers.as_ptr().cast::<u32>().write(42);
//!
//!     let numbers = allocator.resize(Some(numbers), 20 * 4).unwrap();
//!     assert_eq!(numbers.as_ptr().cast::<u32>().read(), 42);
//!
//!     allocator.release(Some(numbers));
//! }
//!
//! println!("{}", allocator.debug_dump());
//! ```
//!
//! ## How It Works
//!
//! - **allocate** rounds the size up to 16 bytes and takes the first free
//!   block that fits, splitting off the surplus when it can hold another
//!   header. With nothing free it grows the arena by exactly one header plus
//!   the rounded size.
//! - **release** marks the block free and absorbs free blocks that follow it.
//!   It does not look backwards unless [`Coalesce::Both`] is configured:
//!
//! ```text
//!   before release(B):   [A free][B used][C free]
//!   after:               [A free][B+C free       ]
//! ```
//!
//! - **zero_allocate** is allocate followed by zeroing.
//! - **resize** shrinks in place (splitting off the surplus) or moves the data
//!   to a new block and releases the old one.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no synchronization; the allocator is neither `Send` nor `Sync`
//! - **Never shrinks**: memory is not returned to the OS
//! - **First fit**: no size classes
//!
//! ## Safety
//!
//! Allocating is safe. Releasing and resizing take an [`Allocation`] by value
//! and are `unsafe` because the handle must belong to the allocator it is
//! given back to.

pub mod align;
mod arena;
mod block;
mod config;
mod error;
mod free_list;
mod handle;
mod inspect;

#[cfg(unix)]
pub use arena::SbrkArena;
pub use arena::{Arena, FixedArena};
pub use block::HEADER_SIZE;
pub use config::{Coalesce, Config};
pub use error::{AllocError, ArenaError, ResizeError};
pub use free_list::{FreeListAllocator, MAX_REQUEST};
pub use handle::Allocation;
pub use inspect::{BlockInfo, Blocks, MemoryMap};
