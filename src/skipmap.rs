//! [`SkipMap`] stores key-value pairs, with the keys being unique and always
//! sorted.

use std::{
    borrow::Borrow,
    cmp, default,
    fmt::{self, Write},
    iter, mem, ptr,
};

use crate::level_generator::{Geometric, GeometricError, LevelGenerator};
use crate::skipnode::SkipNode;

pub use crate::skipnode::{IntoIter, Iter};

// ////////////////////////////////////////////////////////////////////////////
// SkipMap
// ////////////////////////////////////////////////////////////////////////////

/// An ordered map backed by a skip list.
///
/// Entries are stored in a layered singly-linked structure ordered by key,
/// with each node's layer count drawn at insertion time from the map's
/// [level generator](crate::level_generator). Insertion, lookup and removal
/// all run in `O(log n)` expected time; iteration visits entries in strictly
/// increasing key order.
///
/// The map tracks its current maximum active layer: it grows when a freshly
/// inserted node out-levels every existing node, and shrinks lazily when a
/// removal empties the topmost layer. Keys are unique; inserting an existing
/// key replaces the stored value and keeps the node's original height.
///
/// # Examples
///
/// ```
/// use hoplist::SkipMap;
///
/// let mut map = SkipMap::new();
/// map.insert(1, "one");
/// map.insert(2, "two");
///
/// assert_eq!(map.get(&1), Some(&"one"));
/// assert_eq!(map.len(), 2);
///
/// assert_eq!(map.remove(&1), Some("one"));
/// assert_eq!(map.get(&1), None);
/// ```
pub struct SkipMap<K, V> {
    /// The head node, which participates in every layer and carries no entry.
    head: Box<SkipNode<K, V>>,
    /// Number of stored entries.
    len: usize,
    /// Highest layer currently occupied by any node; 0 when empty.
    level: usize,
    level_generator: Geometric,
}

// ///////////////////////////////////////////////
// Inherent methods
// ///////////////////////////////////////////////

impl<K, V> SkipMap<K, V> {
    /// Create a new skip map with the default number of 16 layers and a
    /// promotion probability of `1/2`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hoplist::SkipMap;
    ///
    /// let mut map: SkipMap<i64, String> = SkipMap::new();
    /// ```
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_generator(Geometric::default())
    }

    /// Constructs a new, empty skip map with the optimal number of layers for
    /// the intended capacity. Specifically, it uses `floor(log2(capacity))`
    /// layers, ensuring that only *a few* nodes occupy the highest layer.
    ///
    /// # Examples
    ///
    /// ```
    /// use hoplist::SkipMap;
    ///
    /// let mut map = SkipMap::with_capacity(100);
    /// map.extend((0..100).map(|x| (x, x)));
    /// ```
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let levels = cmp::max(1, (capacity as f64).log2().floor() as usize);
        // `levels >= 1` always holds, so this cannot fail.
        let generator = Geometric::new(levels, 0.5).unwrap_or_default();
        Self::with_generator(generator)
    }

    /// Create a new skip map drawing node levels from the given generator.
    ///
    /// This is the configuration point for the maximum layer cap, the
    /// promotion probability, and the random seed; see
    /// [`Geometric`][crate::Geometric]. A seeded generator makes the
    /// structure fully deterministic.
    ///
    /// # Examples
    ///
    /// ```
    /// use hoplist::{Geometric, SkipMap};
    ///
    /// let generator = Geometric::with_seed(16, 0.5, 12345)?;
    /// let mut map: SkipMap<i64, i64> = SkipMap::with_generator(generator);
    /// # Ok::<(), hoplist::GeometricError>(())
    /// ```
    #[inline]
    #[must_use]
    pub fn with_generator(generator: Geometric) -> Self {
        SkipMap {
            head: Box::new(SkipNode::head(generator.total())),
            len: 0,
            level: 0,
            level_generator: generator,
        }
    }

    /// Create a new skip map with `levels` layers and promotion probability
    /// `p`.
    ///
    /// # Errors
    ///
    /// Fails if `levels` is zero or `p` is outside of `$(0, 1)$`.
    #[inline]
    pub fn with_config(levels: usize, p: f64) -> Result<Self, GeometricError> {
        Ok(Self::with_generator(Geometric::new(levels, p)?))
    }

    /// Clears the map, removing all entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use hoplist::SkipMap;
    ///
    /// let mut map = SkipMap::new();
    /// map.extend((0..10).map(|x| (x, x)));
    /// map.clear();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
        self.level = 0;
        // Dropping the old head releases every node along layer 0.
        *self.head = SkipNode::head(self.level_generator.total());
    }

    /// Returns the number of entries in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use hoplist::SkipMap;
    ///
    /// let mut map = SkipMap::new();
    /// map.extend((0..10).map(|x| (x, x)));
    /// assert_eq!(map.len(), 10);
    /// ```
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the map contains no entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use hoplist::SkipMap;
    ///
    /// let mut map = SkipMap::new();
    /// assert!(map.is_empty());
    ///
    /// map.insert(1, "Rust");
    /// assert!(!map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Provides a reference to the entry with the smallest key, or `None` if
    /// the map is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use hoplist::SkipMap;
    ///
    /// let mut map = SkipMap::new();
    /// assert!(map.front().is_none());
    ///
    /// map.insert(2, "World");
    /// map.insert(1, "Hello");
    /// assert_eq!(map.front(), Some((&1, &"Hello")));
    /// ```
    #[inline]
    #[must_use]
    pub fn front(&self) -> Option<(&K, &V)> {
        self.head.next_ref().and_then(SkipNode::item_ref)
    }

    /// Creates an iterator over the entries of the map, in increasing key
    /// order.
    ///
    /// # Examples
    ///
    /// ```
    /// use hoplist::SkipMap;
    ///
    /// let mut map = SkipMap::new();
    /// map.extend((0..10).map(|x| (x, x)));
    /// for (k, v) in map.iter() {
    ///     println!("Key: {}, Value: {}", k, v);
    /// }
    /// ```
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            next: self.head.next_ref(),
            size: self.len,
        }
    }

    /// Creates an iterator over the keys of the map, in increasing order.
    ///
    /// # Examples
    ///
    /// ```
    /// use hoplist::SkipMap;
    ///
    /// let mut map = SkipMap::new();
    /// map.extend((0..10).map(|x| (x, x)));
    /// for k in map.keys() {
    ///     println!("Key: {}", k);
    /// }
    /// ```
    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys(self.iter())
    }

    /// Creates an iterator over the values of the map, ordered by their keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use hoplist::SkipMap;
    ///
    /// let mut map = SkipMap::new();
    /// map.extend((0..10).map(|x| (x, x)));
    /// for v in map.values() {
    ///     println!("Value: {}", v);
    /// }
    /// ```
    #[must_use]
    pub fn values(&self) -> Values<'_, K, V> {
        Values(self.iter())
    }
}

impl<K, V> SkipMap<K, V>
where
    K: cmp::Ord,
{
    /// Insert an entry into the map.
    ///
    /// If the key is already present, the stored value is replaced in place
    /// and the old value is returned; the size is unchanged and the node
    /// keeps the height drawn at its first insertion. Otherwise a new node is
    /// created at a freshly drawn level and `None` is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use hoplist::SkipMap;
    ///
    /// let mut map = SkipMap::new();
    ///
    /// assert_eq!(map.insert(1, "Hello"), None);
    /// assert_eq!(map.insert(1, "World"), Some("Hello"));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let update = self.find_update(&key);

        // SAFETY: every pointer in the update vector refers to the head or a
        // node owned by the layer-0 chain, and nothing else aliases them
        // while `&mut self` is held.
        unsafe {
            if let Some(found) = (&(*update[0]).links)[0].as_mut() {
                if found.key_ref() == Some(&key) {
                    // Update in place: no new node, no level change, no
                    // random draw.
                    if let Some(slot) = found.value_mut() {
                        return Some(mem::replace(slot, value));
                    }
                }
            }

            let level = self.level_generator.level();
            if level > self.level {
                // Layers above the previous maximum have no real nodes;
                // their update entries already point at the head.
                self.level = level;
            }

            let node = Box::into_raw(Box::new(SkipNode::new(key, value, level)));
            for (layer, &prev) in update.iter().enumerate().take(level + 1) {
                (&mut (*node).links)[layer] = (&(*prev).links)[layer];
                (&mut (*prev).links)[layer] = node;
            }
        }
        self.len += 1;
        None
    }

    /// Returns a reference to the value corresponding to the key, or `None`
    /// if the key is absent. Absence is an ordinary outcome, not an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use hoplist::SkipMap;
    ///
    /// let mut map = SkipMap::new();
    /// map.extend((0..10).map(|x| (x, x)));
    /// assert_eq!(map.get(&0), Some(&0));
    /// assert!(map.get(&10).is_none());
    /// ```
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).and_then(SkipNode::value_ref)
    }

    /// Returns a mutable reference to the value corresponding to the key, or
    /// `None` if the key is absent.
    ///
    /// The key itself cannot be modified, as the map's ordering depends on
    /// it.
    ///
    /// # Examples
    ///
    /// ```
    /// use hoplist::SkipMap;
    ///
    /// let mut map = SkipMap::new();
    /// map.extend((0..10).map(|x| (x, x)));
    /// if let Some(v) = map.get_mut(&0) {
    ///     *v = 100;
    /// }
    /// assert_eq!(map.get(&0), Some(&100));
    /// ```
    #[must_use]
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = self.find_mut(key)?;
        // SAFETY: `find_mut` derives the pointer from `&mut self`, so the
        // mutable borrow it yields is the only live borrow into the map.
        unsafe { (*node).value_mut() }
    }

    /// Returns `true` if the key is present in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use hoplist::SkipMap;
    ///
    /// let mut map = SkipMap::new();
    /// map.extend((0..10).map(|x| (x, x)));
    /// assert!(map.contains_key(&4));
    /// assert!(!map.contains_key(&15));
    /// ```
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Removes the entry with the given key, returning its value, or `None`
    /// if the key is absent (in which case the map is untouched).
    ///
    /// After unlinking the node from every layer it participates in, the
    /// map's maximum active layer shrinks while the topmost layer is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use hoplist::SkipMap;
    ///
    /// let mut map = SkipMap::new();
    /// map.extend((0..10).map(|x| (x, x)));
    /// assert_eq!(map.remove(&4), Some(4));
    /// assert!(map.remove(&4).is_none());
    /// ```
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let update = self.find_update(key);

        // SAFETY: as in `insert`, the update vector points at the head or at
        // live nodes exclusively reachable through `&mut self`.
        unsafe {
            let target = (&(*update[0]).links)[0];
            match target.as_ref() {
                Some(node) if node.key_ref().map(|k| k.borrow()) == Some(key) => {}
                _ => return None,
            }

            // Unlink bottom-up. The nesting invariant (a node at layer i is
            // present at every layer below) means the first layer whose
            // predecessor does not link to the target ends the scan.
            for (layer, &prev) in update.iter().enumerate() {
                if (&(*prev).links)[layer] != target {
                    break;
                }
                (&mut (*prev).links)[layer] = (&(*target).links)[layer];
            }

            // The node no longer owns a tail; clearing its layer-0 link keeps
            // its drop from walking into live successors.
            (&mut (*target).links)[0] = ptr::null_mut();
            let node = Box::from_raw(target);

            while self.level > 0 && self.head.links[self.level].is_null() {
                self.level -= 1;
            }
            self.len -= 1;
            node.into_inner().map(|(_key, value)| value)
        }
    }

    /// Renders the internal layer structure as text, one line per active
    /// layer from top to bottom, each listing that layer's key sequence.
    ///
    /// This is a read-only diagnostic; the exact format is not a
    /// compatibility surface.
    ///
    /// # Examples
    ///
    /// ```
    /// use hoplist::SkipMap;
    ///
    /// let mut map = SkipMap::new();
    /// map.extend((0..4).map(|x| (x, x)));
    /// println!("{}", map.dump());
    /// ```
    #[must_use]
    pub fn dump(&self) -> String
    where
        K: fmt::Debug,
    {
        let mut out = String::new();
        for layer in (0..=self.level).rev() {
            let _ = write!(out, "Level {layer}:");
            let mut node = self.head.as_ref();
            // SAFETY: links are null or point into the layer-0-owned chain.
            unsafe {
                while let Some(next) = node.links[layer].as_ref() {
                    if let Some(key) = next.key_ref() {
                        let _ = write!(out, " [{key:?}]");
                    }
                    node = next;
                }
            }
            out.push('\n');
        }
        out
    }

    /// Locate the node carrying `key`, if any.
    ///
    /// Starts at the head on the highest active layer, advances while the
    /// next key is strictly less than the target, and drops a layer when it
    /// can advance no further, never revisiting a node. The candidate is the
    /// successor of the final layer-0 position.
    fn find<Q>(&self, key: &Q) -> Option<&SkipNode<K, V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut node: *const SkipNode<K, V> = self.head.as_ref();
        // SAFETY: links are null or point into the layer-0-owned chain, which
        // is kept alive by the `&self` borrow.
        unsafe {
            for layer in (0..=self.level).rev() {
                loop {
                    let next = (&(*node).links)[layer];
                    match next.as_ref() {
                        Some(n) if n.key_ref().is_some_and(|k| k.borrow() < key) => node = next,
                        _ => break,
                    }
                }
            }
            let candidate = (&(*node).links)[0].as_ref()?;
            (candidate.key_ref().map(|k| k.borrow()) == Some(key)).then_some(candidate)
        }
    }

    /// [`find`][SkipMap::find] with mutable provenance: the pointer it
    /// returns descends from `&mut self`, so the caller may write through it.
    fn find_mut<Q>(&mut self, key: &Q) -> Option<*mut SkipNode<K, V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut node: *mut SkipNode<K, V> = self.head.as_mut();
        // SAFETY: links are null or point into the layer-0-owned chain, which
        // is kept alive by the `&mut self` borrow.
        unsafe {
            for layer in (0..=self.level).rev() {
                loop {
                    let next = (&(*node).links)[layer];
                    match next.as_ref() {
                        Some(n) if n.key_ref().is_some_and(|k| k.borrow() < key) => node = next,
                        _ => break,
                    }
                }
            }
            let candidate = (&(*node).links)[0];
            match candidate.as_ref() {
                Some(n) if n.key_ref().map(|k| k.borrow()) == Some(key) => Some(candidate),
                _ => None,
            }
        }
    }

    /// The traversal shared by [`insert`][SkipMap::insert] and
    /// [`remove`][SkipMap::remove]: one descending pass recording, per layer,
    /// the rightmost node whose key is strictly less than the target.
    /// `update[0].links[0]` is then the candidate node for the key itself.
    ///
    /// The vector covers every layer the map could ever activate; layers
    /// above the current maximum keep the head as their predecessor, ready
    /// for an insertion that raises the maximum.
    fn find_update<Q>(&mut self, key: &Q) -> Vec<*mut SkipNode<K, V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut node: *mut SkipNode<K, V> = self.head.as_mut();
        let mut update = vec![node; self.head.links.len()];
        // SAFETY: links are null or point into the layer-0-owned chain; the
        // traversal only reads through them.
        unsafe {
            for layer in (0..=self.level).rev() {
                loop {
                    let next = (&(*node).links)[layer];
                    match next.as_ref() {
                        Some(n) if n.key_ref().is_some_and(|k| k.borrow() < key) => node = next,
                        _ => break,
                    }
                }
                update[layer] = node;
            }
        }
        update
    }
}

// ///////////////////////////////////////////////
// Internal methods
// ///////////////////////////////////////////////

impl<K: Ord, V> SkipMap<K, V> {
    /// Checks the structural invariants of the map.
    #[allow(dead_code)]
    fn check(&self) {
        assert!(self.level < self.level_generator.total());
        let mut max_node_level = 0;
        let mut count = 0;

        // Layer 0 must hold every entry in strictly increasing key order.
        let mut node = self.head.as_ref();
        while let Some(next) = node.next_ref() {
            assert!(next.level <= self.level);
            assert_eq!(next.links.len(), next.level + 1);
            if let (Some(key), Some(next_key)) = (node.key_ref(), next.key_ref()) {
                assert!(key < next_key);
            }
            max_node_level = cmp::max(max_node_level, next.level);
            count += 1;
            node = next;
        }
        assert_eq!(count, self.len);
        assert_eq!(max_node_level, self.level);

        // Every layer must be a strictly increasing sub-chain of nodes that
        // actually reach it.
        for layer in 0..=self.level {
            let mut node = self.head.as_ref();
            // SAFETY: links are null or point into the layer-0-owned chain.
            unsafe {
                while let Some(next) = node.links[layer].as_ref() {
                    assert!(next.level >= layer);
                    if let (Some(key), Some(next_key)) = (node.key_ref(), next.key_ref()) {
                        assert!(key < next_key);
                    }
                    node = next;
                }
            }
        }
    }
}

// ///////////////////////////////////////////////
// Trait implementation
// ///////////////////////////////////////////////

// SAFETY: the raw links only ever point at nodes owned by the map itself, so
// the map is as thread-compatible as its contents.
unsafe impl<K: Send, V: Send> Send for SkipMap<K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for SkipMap<K, V> {}

impl<K, V> default::Default for SkipMap<K, V> {
    fn default() -> Self {
        SkipMap::new()
    }
}

/// This implementation of `PartialEq` only checks that the entries are equal;
/// it does not compare structural features such as node levels or generator
/// configuration.
impl<K, V> cmp::PartialEq for SkipMap<K, V>
where
    K: cmp::PartialEq,
    V: cmp::PartialEq,
{
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K, V> cmp::Eq for SkipMap<K, V>
where
    K: cmp::Eq,
    V: cmp::Eq,
{
}

impl<K, V> Extend<(K, V)> for SkipMap<K, V>
where
    K: Ord,
{
    #[inline]
    fn extend<I: iter::IntoIterator<Item = (K, V)>>(&mut self, iterable: I) {
        for (key, value) in iterable {
            self.insert(key, value);
        }
    }
}

impl<K, V> iter::FromIterator<(K, V)> for SkipMap<K, V>
where
    K: Ord,
{
    #[inline]
    fn from_iter<I>(iter: I) -> Self
    where
        I: iter::IntoIterator<Item = (K, V)>,
    {
        let mut map = SkipMap::new();
        map.extend(iter);
        map
    }
}

impl<K, V> iter::IntoIterator for SkipMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(mut self) -> Self::IntoIter {
        // Detaching the chain from the head leaves the map's drop with
        // nothing to free; the iterator owns the nodes from here.
        let next = self.head.take_next();
        IntoIter {
            next,
            size: self.len,
        }
    }
}

impl<'a, K, V> iter::IntoIterator for &'a SkipMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> fmt::Debug for SkipMap<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> fmt::Display for SkipMap<K, V>
where
    K: fmt::Display,
    V: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "({k}, {v})")?;
        }
        write!(f, "]")
    }
}

// ///////////////////////////////////////////////
// Extra structs
// ///////////////////////////////////////////////

/// Iterator over a [`SkipMap`]'s keys.
pub struct Keys<'a, K, V>(Iter<'a, K, V>);

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(key, _)| key)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

/// Iterator over a [`SkipMap`]'s values.
pub struct Values<'a, K, V>(Iter<'a, K, V>);

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(_, value)| value)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

// ////////////////////////////////////////////////////////////////////////////
// Tests
// ////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::SkipMap;
    use crate::level_generator::Geometric;

    fn seeded(seed: u64) -> SkipMap<i64, i64> {
        SkipMap::with_generator(Geometric::with_seed(16, 0.5, seed).unwrap())
    }

    #[test]
    fn basic_small() {
        let mut map: SkipMap<i64, i64> = SkipMap::new();
        map.check();
        assert!(map.remove(&1).is_none());
        map.check();
        assert!(map.insert(1, 0).is_none());
        map.check();
        assert_eq!(map.insert(1, 5), Some(0));
        map.check();
        assert_eq!(map.remove(&1), Some(5));
        map.check();
        assert!(map.insert(1, 10).is_none());
        map.check();
        assert!(map.insert(2, 20).is_none());
        map.check();
        assert_eq!(map.remove(&1), Some(10));
        map.check();
        assert_eq!(map.remove(&2), Some(20));
        map.check();
        assert!(map.remove(&1).is_none());
        map.check();
        assert!(map.is_empty());
    }

    #[test]
    fn basic_large() {
        let size = 10_000;
        let mut map = SkipMap::with_capacity(size);
        assert!(map.is_empty());

        for i in 0..size {
            map.insert(i, i * 10);
            assert_eq!(map.len(), i + 1);
        }
        map.check();

        for i in 0..size {
            assert_eq!(map.remove(&i), Some(i * 10));
            assert_eq!(map.len(), size - i - 1);
        }
        map.check();
    }

    #[test]
    fn insert_existing_updates_value_in_place() {
        let mut map = SkipMap::new();
        for i in 0..100 {
            assert!(map.insert(i, format!("{i}")).is_none());
        }
        assert_eq!(map.len(), 100);

        for i in 0..100 {
            assert_eq!(map.insert(i, format!("{i}!")), Some(format!("{i}")));
        }
        assert_eq!(map.len(), 100);
        for i in 0..100 {
            assert_eq!(map.get(&i), Some(&format!("{i}!")));
        }
        map.check();
    }

    #[test]
    fn ordering_after_arbitrary_inserts() {
        // Inserting in a scrambled order must still enumerate sorted with no
        // duplicates.
        let mut map = seeded(7);
        for key in [44, 2, 91, 17, 2, 63, 44, 0, 99, 17] {
            map.insert(key, key);
        }
        let keys: Vec<_> = map.keys().copied().collect();
        assert_eq!(keys, vec![0, 2, 17, 44, 63, 91, 99]);
        assert_eq!(map.len(), keys.len());
        map.check();
    }

    #[test]
    fn round_trip() {
        let mut map = seeded(11);
        for i in 0..1000_i64 {
            map.insert(i * 3, i);
        }
        for i in 0..1000_i64 {
            assert_eq!(map.get(&(i * 3)), Some(&i));
            assert!(map.get(&(i * 3 + 1)).is_none());
            assert!(map.get(&(i * 3 + 2)).is_none());
        }
        assert!(map.get(&-1).is_none());
        assert!(map.get(&3000).is_none());
    }

    #[test]
    fn remove_absent_leaves_map_unchanged() {
        let mut map = seeded(3);
        map.extend((0..50).map(|x| (x * 2, x)));
        let before: Vec<_> = map.iter().map(|(&k, &v)| (k, v)).collect();

        assert!(map.remove(&1).is_none());
        assert!(map.remove(&-10).is_none());
        assert!(map.remove(&100).is_none());

        let after: Vec<_> = map.iter().map(|(&k, &v)| (k, v)).collect();
        assert_eq!(before, after);
        assert_eq!(map.len(), 50);
        map.check();
    }

    #[test]
    fn height_collapses_after_removal() {
        let mut map = seeded(5);
        for i in 0..512 {
            map.insert(i, i);
        }
        assert!(map.level > 0, "512 nodes should occupy more than one layer");

        // Removing everything must drive the active layer back to 0.
        for i in 0..512 {
            map.remove(&i);
            map.check();
        }
        assert_eq!(map.level, 0);
        assert!(map.is_empty());
    }

    #[test]
    fn get_mut() {
        let mut map: SkipMap<i64, i64> = (0..10).map(|x| (x, x)).collect();
        assert!(map.get_mut(&10).is_none());
        *map.get_mut(&3).unwrap() = 42;
        assert_eq!(map.get(&3), Some(&42));
        map.check();
    }

    #[test]
    fn get_mut_writes_survive_structural_changes() {
        let mut map: SkipMap<i64, i64> = (0..32).map(|x| (x, x)).collect();
        for key in 0..32 {
            *map.get_mut(&key).unwrap() *= 10;
        }
        assert_eq!(map.remove(&7), Some(70));
        *map.get_mut(&8).unwrap() += 1;
        map.check();
        assert_eq!(map.get(&8), Some(&81));
        assert!(
            map.iter()
                .filter(|&(&k, _)| k != 8)
                .all(|(&k, &v)| v == k * 10)
        );
    }

    #[test]
    fn clear() {
        let mut map: SkipMap<_, _> = (0..100).map(|x| (x, x)).collect();
        assert_eq!(map.len(), 100);
        map.clear();
        map.check();
        assert!(map.is_empty());
        assert!(map.get(&1).is_none());
        assert!(map.iter().next().is_none());
    }

    #[test]
    fn iter() {
        let size = 1000;
        let map: SkipMap<_, _> = (0..size).map(|x| (x, 2 * x)).collect();

        let mut iter = map.iter();
        for i in 0..size {
            assert_eq!(iter.size_hint(), (size - i, Some(size - i)));
            assert_eq!(iter.next(), Some((&i, &(2 * i))));
        }
        assert_eq!(iter.size_hint(), (0, Some(0)));
        assert!(iter.next().is_none());

        // Iteration is restartable: a fresh iterator sees the same sequence.
        assert!(map.iter().map(|(&k, _)| k).eq(0..size));
    }

    #[test]
    fn into_iter() {
        let size = 1000;
        let map: SkipMap<_, _> = (0..size).map(|x| (x, 2 * x)).collect();
        let mut iter = map.into_iter();
        for i in 0..size {
            assert_eq!(iter.size_hint(), (size - i, Some(size - i)));
            assert_eq!(iter.next(), Some((i, 2 * i)));
        }
        assert!(iter.next().is_none());
    }

    #[test]
    fn iter_key_val() {
        let size = 100;
        let map: SkipMap<_, _> = (0..size).map(|x| (x, 2 * x)).collect();
        assert!(map.keys().copied().eq(0..size));
        assert!(map.values().copied().eq((0..size).map(|x| 2 * x)));
    }

    #[test]
    fn contains() {
        let (min, max) = (25, 75);
        let map: SkipMap<_, _> = (min..max).map(|x| (x, x)).collect();
        for i in 0..100 {
            assert_eq!(map.contains_key(&i), (min..max).contains(&i));
        }
    }

    #[rstest]
    #[case::forward(&[1, 2, 3, 4, 5])]
    #[case::reverse(&[5, 4, 3, 2, 1])]
    #[case::shuffled(&[3, 1, 5, 2, 4])]
    fn insertion_order_is_irrelevant(#[case] keys: &[i64]) {
        let mut map = SkipMap::new();
        for &key in keys {
            map.insert(key, ());
        }
        assert!(map.keys().copied().eq(1..=5));
        map.check();
    }

    #[test]
    fn dump_lists_every_layer() {
        let mut map = seeded(13);
        for i in 0..64 {
            map.insert(i, i);
        }
        let dump = map.dump();
        let lines: Vec<_> = dump.lines().collect();
        assert_eq!(lines.len(), map.level + 1);

        // Top to bottom, first line is the highest layer.
        assert!(lines[0].starts_with(&format!("Level {}:", map.level)));

        // The bottom layer lists every key in order.
        let bottom = lines[lines.len() - 1];
        let expected: String = (0..64).fold("Level 0:".to_string(), |mut acc, i| {
            acc.push_str(&format!(" [{i}]"));
            acc
        });
        assert_eq!(bottom, expected);
    }

    #[test]
    fn dump_is_read_only() {
        let mut map = seeded(17);
        map.extend((0..20).map(|x| (x, x)));
        let before: Vec<_> = map.iter().map(|(&k, &v)| (k, v)).collect();
        let _ = map.dump();
        let after: Vec<_> = map.iter().map(|(&k, &v)| (k, v)).collect();
        assert_eq!(before, after);
        assert_eq!(map.len(), 20);
        map.check();
    }

    /// Value whose drop is observable, for verifying teardown.
    struct Counted(Arc<AtomicUsize>);

    impl Drop for Counted {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn drop_releases_every_entry() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut map = SkipMap::new();
        for i in 0..1000 {
            map.insert(i, Counted(Arc::clone(&drops)));
        }
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        drop(map);
        assert_eq!(drops.load(Ordering::SeqCst), 1000);
    }

    #[test]
    fn remove_drops_exactly_one_entry() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut map = SkipMap::new();
        for i in 0..10 {
            map.insert(i, Counted(Arc::clone(&drops)));
        }
        let removed = map.remove(&3).unwrap();
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        drop(removed);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        drop(map);
        assert_eq!(drops.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn update_in_place_drops_the_old_value() {
        let drops = Arc::new(AtomicUsize::new(0));
        let mut map = SkipMap::new();
        map.insert(1, Counted(Arc::clone(&drops)));
        drop(map.insert(1, Counted(Arc::clone(&drops))));
        assert_eq!(drops.load(Ordering::SeqCst), 1);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn equality() {
        let a: SkipMap<i64, i64> = (0..100).map(|x| (x, x)).collect();
        let b: SkipMap<i64, i64> = (0..100).map(|x| (x, x)).collect();
        let c: SkipMap<i64, i64> = (0..10).map(|x| (x, x)).collect();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn debug_display() {
        let map: SkipMap<_, _> = (0..3).map(|x| (x, x)).collect();
        assert_eq!(format!("{map:?}"), "{0: 0, 1: 1, 2: 2}");
        assert_eq!(format!("{map}"), "[(0, 0), (1, 1), (2, 2)]");
    }

    #[test]
    fn string_keys_with_borrowed_lookup() {
        let mut map: SkipMap<String, usize> = SkipMap::new();
        map.insert("banana".to_string(), 2);
        map.insert("apple".to_string(), 1);
        map.insert("cherry".to_string(), 3);

        assert_eq!(map.get("apple"), Some(&1));
        assert!(map.get("durian").is_none());
        assert_eq!(map.remove("banana"), Some(2));
        assert!(map.keys().map(String::as_str).eq(["apple", "cherry"]));
    }

    #[test]
    fn mixed_workload() -> Result<()> {
        // Insert ten scrambled keys, update one, probe misses, delete one,
        // then drain.
        let mut map = SkipMap::with_config(16, 0.5)?;
        let keys = [10, 50, 30, 20, 40, 90, 60, 80, 70, 100];
        for &key in &keys {
            map.insert(key, key * 10);
        }
        assert_eq!(map.len(), 10);
        assert!(
            map.keys()
                .copied()
                .eq([10, 20, 30, 40, 50, 60, 70, 80, 90, 100])
        );

        assert_eq!(map.insert(50, 9999), Some(500));
        assert_eq!(map.len(), 10);
        assert_eq!(map.get(&50), Some(&9999));

        assert!(map.get(&101).is_none());
        assert!(map.get(&-1).is_none());

        assert_eq!(map.remove(&30), Some(300));
        assert_eq!(map.len(), 9);
        assert!(map.get(&30).is_none());

        assert!(map.remove(&999).is_none());
        assert_eq!(map.len(), 9);

        for &key in &keys {
            map.remove(&key);
        }
        assert_eq!(map.len(), 0);
        assert!(map.iter().next().is_none());
        map.check();
        Ok(())
    }
}
