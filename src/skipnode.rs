//! The nodes that make up a [`SkipMap`][crate::SkipMap], and the iterators
//! that walk their bottom layer.

use std::{iter, ptr};

// ////////////////////////////////////////////////////////////////////////////
// SkipNode
// ////////////////////////////////////////////////////////////////////////////

/// A single node of the skip list.
///
/// The map owns the head node, which carries no item and participates in
/// every layer; it is a "virtual minimum" that sorts before every real key
/// without reserving a sentinel key value. Every other node carries exactly
/// one key-value pair.
///
/// A node of level `n` has `n + 1` forward links, one per layer `0..=n`. The
/// link at layer 0 is the *owning* edge: each node is exclusively owned by
/// its layer-0 predecessor, so the bottom layer forms a linear ownership
/// chain through which every node is eventually freed. All links above layer
/// 0 are non-owning navigation aliases into nodes kept alive by that chain.
pub struct SkipNode<K, V> {
    /// The stored entry. `None` only for the head node.
    pub item: Option<(K, V)>,
    /// The highest layer this node participates in.
    pub level: usize,
    /// Forward links, one per layer in `0..=level`. A null pointer marks the
    /// end of the chain at that layer. `links[0]` owns its target.
    pub links: Vec<*mut Self>,
}

impl<K, V> SkipNode<K, V> {
    /// Create a new head node participating in all `total_levels` layers.
    pub fn head(total_levels: usize) -> Self {
        SkipNode {
            item: None,
            level: total_levels - 1,
            links: iter::repeat_n(ptr::null_mut(), total_levels).collect(),
        }
    }

    /// Create a new node carrying `key` and `value` at the given level, with
    /// all links unset.
    pub fn new(key: K, value: V, level: usize) -> Self {
        SkipNode {
            item: Some((key, value)),
            level,
            links: iter::repeat_n(ptr::null_mut(), level + 1).collect(),
        }
    }

    /// Consumes the node, returning the entry it carried.
    pub fn into_inner(mut self) -> Option<(K, V)> {
        self.item.take()
    }

    pub fn key_ref(&self) -> Option<&K> {
        self.item.as_ref().map(|(key, _)| key)
    }

    pub fn value_ref(&self) -> Option<&V> {
        self.item.as_ref().map(|(_, value)| value)
    }

    pub fn value_mut(&mut self) -> Option<&mut V> {
        self.item.as_mut().map(|(_, value)| value)
    }

    pub fn item_ref(&self) -> Option<(&K, &V)> {
        self.item.as_ref().map(|(key, value)| (key, value))
    }

    /// The next node along the bottom layer.
    pub fn next_ref(&self) -> Option<&Self> {
        // SAFETY: every link is either null or points to a live node owned by
        // the layer-0 chain.
        unsafe { self.links[0].as_ref() }
    }

    /// Detach and take ownership of the next node on the bottom layer.
    ///
    /// The caller must ensure no layer-1-or-above link into the taken node is
    /// left dangling.
    pub fn take_next(&mut self) -> Option<Box<Self>> {
        let next = self.links[0];
        if next.is_null() {
            return None;
        }
        self.links[0] = ptr::null_mut();
        // SAFETY: a non-null links[0] always comes from Box::into_raw and is
        // owned by this node, which has just relinquished it.
        Some(unsafe { Box::from_raw(next) })
    }
}

impl<K, V> Drop for SkipNode<K, V> {
    fn drop(&mut self) {
        // Walk the bottom layer iteratively: a naive recursive drop would
        // overflow the stack on long lists. Upper-layer links of freed nodes
        // dangle during the walk, but nothing follows them any more.
        let mut next = self.take_next();
        while let Some(mut node) = next {
            next = node.take_next();
        }
    }
}

// /////////////////////////////////
// Iterators
// /////////////////////////////////
//
// All iteration is an in-order walk of the bottom layer, which contains every
// entry exactly once in increasing key order.

/// Borrowing iterator over the entries of a skip list, in key order.
pub struct Iter<'a, K, V> {
    pub(crate) next: Option<&'a SkipNode<K, V>>,
    pub(crate) size: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.next_ref();
        self.size -= 1;
        node.item_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.size, Some(self.size))
    }
}

/// Owning iterator over the entries of a skip list, in key order.
pub struct IntoIter<K, V> {
    pub(crate) next: Option<Box<SkipNode<K, V>>>,
    pub(crate) size: usize,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let mut node = self.next.take()?;
        self.next = node.take_next();
        self.size -= 1;
        node.into_inner()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.size, Some(self.size))
    }
}
