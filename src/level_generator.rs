//! Skip lists use a probabilistic distribution of nodes over their internal
//! layers, whereby the lowest layer (layer 0) contains all the nodes, and each
//! layer `$n > 0$` contains a random subset of the nodes on layer `$n - 1$`.
//!
//! Most commonly, a geometric distribution is used whereby the chance that a
//! node occupies layer `$n$` is `$p$` times the chance of occupying layer
//! `$n - 1$` (with `$0 < p < 1$`).
//!
//! The level of a node is drawn exactly once, when the node is first inserted.
//! Updating the value stored under an existing key does not re-draw its level.

pub mod geometric;

pub use geometric::{Geometric, GeometricError};

/// Upon the insertion of a new node in the list, the node is replicated to
/// high layers with a certain probability as determined by a
/// [`LevelGenerator`].
pub trait LevelGenerator {
    /// The total number of layers that are assumed to exist.
    #[must_use]
    fn total(&self) -> usize;

    /// Generate a random level for a new node in the range `[0, total)`.
    ///
    /// This function should _never_ return a level greater or equal to
    /// [`total`][LevelGenerator::total].
    #[must_use]
    fn level(&mut self) -> usize;
}
