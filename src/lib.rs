//! A skip list is a way of storing sorted elements in such a way that they can
//! be accessed, inserted and removed, all in `O(log n)` on average.
//!
//! Conceptually, a skip list resembles something like:
//!
//! ```text
//! <head> ----------> [2] --------------------------------------------------> [9] ---------->
//! <head> ----------> [2] ------------------------------------[7] ----------> [9] ---------->
//! <head> ----------> [2] ----------> [4] ------------------> [7] ----------> [9] --> [10] ->
//! <head> --> [1] --> [2] --> [3] --> [4] --> [5] --> [6] --> [7] --> [8] --> [9] --> [10] ->
//! ```
//!
//! where each node `[x]` carries forward references to nodes further down the
//! list, allowing a search to skip ahead. The number of layers a node
//! participates in is drawn at insertion time from a geometric distribution
//! (see [`level_generator`]), so on average half the nodes reach layer 1, a
//! quarter reach layer 2, and so on. This is a probabilistic expectation only:
//! the worst case remains `O(n)`.
//!
//! The main type is [`SkipMap`], an ordered map keyed by any `Ord` type.
//! Duplicate inserts update the stored value in place; absence of a key is an
//! ordinary outcome (`None`), never an error.
//!
//! The structure is strictly single-threaded: there is no internal locking and
//! concurrent mutation is unsupported. All memory is released when the map is
//! dropped, by a linear walk along the bottom layer. If the allocator fails
//! while creating a node, the process aborts per Rust's global allocation
//! policy; the map never returns a null-like result for an allocation failure.

pub mod level_generator;
mod skipmap;
mod skipnode;

pub use crate::level_generator::{Geometric, GeometricError, LevelGenerator};
pub use crate::skipmap::{IntoIter, Iter, Keys, SkipMap, Values};
