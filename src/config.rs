/// Which neighbours a released block merges with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Coalesce {
  /// Merge with free successors only. A free predecessor stays separate
  /// until it is itself released again or reused.
  #[default]
  Forward,
  /// Also merge into a free, physically adjacent predecessor. Finding the
  /// predecessor costs a walk from the head of the chain.
  Both,
}

/// Allocator options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config {
  pub coalesce: Coalesce,
}

impl Config {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_coalesce(
    mut self,
    coalesce: Coalesce,
  ) -> Self {
    self.coalesce = coalesce;
    self
  }
}
