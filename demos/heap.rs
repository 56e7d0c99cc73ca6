use std::io::Read;

use rheap::{FreeListAllocator, SbrkArena};

/// Waits until the user presses ENTER, when `--step` is given.
/// Useful to inspect the heap with `pmap` or `gdb` between steps.
fn pause(step: bool) {
  if step {
    println!("\n>>> Press ENTER to continue...");
    let _ = std::io::stdin().bytes().next();
  }
}

fn print_program_break(label: &str) {
  println!(
    "[{}] PID = {}, program break = {:?}",
    label,
    std::process::id(),
    SbrkArena::program_break(),
  );
}

fn main() {
  env_logger::init();

  let step = std::env::args().any(|arg| arg == "--step");
  let mut allocator = FreeListAllocator::default();

  print_program_break("start");
  println!("Initial memory map:\n{}", allocator.debug_dump());
  pause(step);

  // --------------------------------------------------------------------
  // 1) Room for 40 u32s. The chain is empty, so the arena grows.
  // --------------------------------------------------------------------
  let array = allocator.allocate(40 * size_of::<u32>());
  println!("Memory map after allocate for array:\n{}", allocator.debug_dump());
  pause(step);

  // --------------------------------------------------------------------
  // 2) 25 zeroed u32s. Nothing is free yet, so the arena grows again.
  // --------------------------------------------------------------------
  let zeroed = allocator.zero_allocate(25, size_of::<u32>());
  println!("Memory map after zero_allocate:\n{}", allocator.debug_dump());
  pause(step);

  // --------------------------------------------------------------------
  // 3) Shrink the first array to 20 u32s. It stays in place and the
  //    surplus becomes a free block.
  // --------------------------------------------------------------------
  let array = match unsafe { allocator.resize(array, 20 * size_of::<u32>()) } {
    Ok(array) => Some(array),
    Err(err) => {
      eprintln!("resize failed: {err}");
      err.into_original()
    }
  };
  println!("Memory map after resize for array:\n{}", allocator.debug_dump());
  pause(step);

  // --------------------------------------------------------------------
  // 4) Release both. The first release absorbs the free remainder.
  // --------------------------------------------------------------------
  unsafe { allocator.release(array) };
  println!("Memory map after release for array:\n{}", allocator.debug_dump());
  pause(step);

  unsafe { allocator.release(zeroed) };
  println!("Memory map after release for zeroed:\n{}", allocator.debug_dump());

  print_program_break("end");
  println!(
    "\n{} arena growths. The OS reclaims the arena when the process exits.",
    allocator.arena().grow_count()
  );
}
