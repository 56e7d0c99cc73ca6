/// Alignment of every payload handed out by the allocator, and granularity of
/// every recorded block size.
pub const ALIGNMENT: usize = 16;

/// Rounds the given size up to the next multiple of [`ALIGNMENT`].
///
/// The caller is responsible for keeping `$value` at least `ALIGNMENT - 1`
/// below `usize::MAX`.
///
/// # Examples
///
/// ```rust
/// use rheap::align;
///
/// assert_eq!(align!(1), 16);
/// assert_eq!(align!(16), 16);
/// assert_eq!(align!(100), 112);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    ($value + $crate::align::ALIGNMENT - 1) & !($crate::align::ALIGNMENT - 1)
  };
}

/// Returns how many bytes must be skipped from `address` to reach the next
/// [`ALIGNMENT`] boundary.
pub const fn padding_for(address: usize) -> usize {
  (ALIGNMENT - address % ALIGNMENT) % ALIGNMENT
}
