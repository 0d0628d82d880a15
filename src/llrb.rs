use std::{
    cmp::{self, Ordering},
    mem,
    ops::{Bound, Deref, DerefMut, RangeBounds},
};

use compare::{Compare, Natural};
use log::{debug, error, trace};

use crate::depth::Depth;
use crate::error::Error;
use crate::node::{is_black, is_red, size, Node};

// Range and iteration scan the tree in batches of this many entries.
const ITER_LIMIT: usize = 100;

/// Llrb manage a single instance of in-memory ordered symbol table using
/// [left-leaning-red-black][llrb] tree.
///
/// Keys are ordered by a comparator `C`, which defaults to the natural
/// order of `K`. Every node caches the size of its sub-tree, which makes
/// [`rank`](Llrb::rank) and [`select`](Llrb::select) logarithmic.
///
/// [llrb]: https://en.wikipedia.org/wiki/Left-leaning_red-black_tree
#[derive(Clone)]
pub struct Llrb<K, V, C = Natural<K>>
where
    C: Compare<K>,
{
    name: String,
    root: Option<Box<Node<K, V>>>,
    cmp: C,
}

/// Different ways to construct a new Llrb instance.
impl<K, V> Llrb<K, V>
where
    K: Clone + Ord,
    V: Clone,
{
    /// Create an empty instance of Llrb, identified by `name`, ordering
    /// keys by their natural order. Applications can choose unique names.
    pub fn new<S>(name: S) -> Llrb<K, V>
    where
        S: AsRef<str>,
    {
        Llrb::with_cmp(name, compare::natural())
    }

    /// Create a new instance of Llrb tree and load it with entries
    /// from `iter`. If a key repeats, later value overwrites the earlier.
    pub fn load_from<S, I>(name: S, iter: I) -> Llrb<K, V>
    where
        S: AsRef<str>,
        I: Iterator<Item = (K, V)>,
    {
        let mut llrb = Llrb::new(name);
        for (key, value) in iter {
            llrb.put(key, value);
        }
        debug!("llrb {}: loaded {} entries", llrb.name, llrb.len());
        llrb
    }
}

impl<K, V, C> Llrb<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Compare<K>,
{
    /// Create an empty instance of Llrb, identified by `name`, ordering
    /// keys using `cmp`.
    ///
    /// ```
    /// use llrb_table::{natural, Compare, Llrb};
    ///
    /// let mut llrb = Llrb::with_cmp("reversed", natural().rev());
    /// llrb.put(1, "one");
    /// llrb.put(2, "two");
    /// assert_eq!(llrb.min(), Some(2));
    /// ```
    pub fn with_cmp<S>(name: S, cmp: C) -> Llrb<K, V, C>
    where
        S: AsRef<str>,
    {
        Llrb {
            name: name.as_ref().to_string(),
            root: Default::default(),
            cmp,
        }
    }
}

/// Maintenance API.
impl<K, V, C> Llrb<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Compare<K>,
{
    /// Identify this instance. Applications can choose unique names while
    /// creating Llrb instances.
    #[inline]
    pub fn id(&self) -> String {
        self.name.clone()
    }

    /// Return a reference to the comparator ordering this instance.
    #[inline]
    pub fn cmp(&self) -> &C {
        &self.cmp
    }

    /// Return number of entries in this instance.
    #[inline]
    pub fn len(&self) -> usize {
        size(self.root.as_ref().map(Deref::deref))
    }

    /// Check whether this index is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Return quickly with basic statisics, only entries() and node_size()
    /// are valid with this statisics.
    pub fn stats(&self) -> Stats {
        Stats::new(self.len(), mem::size_of::<Node<K, V>>())
    }
}

type Upsert<K, V> = (Box<Node<K, V>>, Option<V>);

type Delete<K, V> = (Option<Box<Node<K, V>>>, Option<V>);

type Delmin<K, V> = (Option<Box<Node<K, V>>>, Option<Box<Node<K, V>>>);

/// Write operations on Llrb instance.
impl<K, V, C> Llrb<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Compare<K>,
{
    /// Set value for key. If there is an existing entry for key,
    /// overwrite the old value with new value and return the old value.
    /// Overwriting does not change the shape of the tree.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        let (mut root, old_value) = Self::upsert(self.root.take(), key, value, &self.cmp);
        root.set_black();
        self.root = Some(root);
        old_value
    }

    /// Create a new {key, value} entry in the index. If key is already
    /// present return error and leave the existing entry untouched.
    pub fn create(&mut self, key: K, value: V) -> Result<(), Error<K>> {
        if self.contains(&key) {
            trace!("llrb {}: create on existing key", self.name);
            return Err(Error::OverwriteKey);
        }
        self.put(key, value);
        Ok(())
    }

    /// Delete key from this instance and return its value. If key is
    /// not present, then delete is effectively a no-op.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        // descent below assumes the key is reachable.
        if !self.contains(key) {
            trace!("llrb {}: remove on missing key", self.name);
            return None;
        }

        let root = self.prepare_delete()?;
        let (root, old_value) = Self::do_delete(Some(root), key, &self.cmp);
        self.finish_delete(root);
        old_value
    }

    /// Delete the smallest entry from this instance and return it.
    pub fn delete_min(&mut self) -> Option<(K, V)> {
        let root = match self.prepare_delete() {
            Some(root) => root,
            None => {
                trace!("llrb {}: delete_min on empty index", self.name);
                return None;
            }
        };
        let (root, old_node) = Self::do_delete_min(Some(root));
        self.finish_delete(root);
        old_node.map(|node| {
            let node = *node;
            (node.key, node.value)
        })
    }

    /// Delete the largest entry from this instance and return it.
    pub fn delete_max(&mut self) -> Option<(K, V)> {
        let root = match self.prepare_delete() {
            Some(root) => root,
            None => {
                trace!("llrb {}: delete_max on empty index", self.name);
                return None;
            }
        };
        let (root, old_node) = Self::do_delete_max(Some(root));
        self.finish_delete(root);
        old_node.map(|node| {
            let node = *node;
            (node.key, node.value)
        })
    }

    /// Validate LLRB tree with following rules:
    ///
    /// * Root is black.
    /// * From root to any leaf, no consecutive reds allowed in its path.
    /// * Red links lean left.
    /// * Number of blacks should be same under left child and right child.
    /// * Make sure keys are in sorted order, as per the comparator.
    /// * Cached sub-tree sizes add up.
    ///
    /// Additionally return full statistics on the tree. Refer to [`Stats`]
    /// for more information.
    pub fn validate(&self) -> Result<Stats, Error<K>> {
        let root = self.root.as_ref().map(Deref::deref);
        let mut depths = Depth::new();

        let res = if is_red(root) {
            Err(Error::RedRoot)
        } else {
            let bounds = (None, None);
            Self::validate_tree(root, false, 0, 0, bounds, &self.cmp, &mut depths)
        };

        match res {
            Ok(blacks) => {
                let mut stats = self.stats();
                stats.set_blacks(blacks);
                stats.set_depths(depths);
                Ok(stats)
            }
            Err(err) => {
                error!("llrb {}: validation failed", self.name);
                Err(err)
            }
        }
    }

    // Root is made red when both its children are black, so that the
    // descent always has a red link to push down.
    fn prepare_delete(&mut self) -> Option<Box<Node<K, V>>> {
        let mut root = self.root.take()?;
        if is_black(root.left_deref()) && is_black(root.right_deref()) {
            root.set_red();
        }
        Some(root)
    }

    fn finish_delete(&mut self, root: Option<Box<Node<K, V>>>) {
        self.root = root.map(|mut root| {
            root.set_black();
            root
        });
    }
}

/// Read operations on Llrb instance.
impl<K, V, C> Llrb<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Compare<K>,
{
    /// Get the value for key.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        self.get_node(key).map(|node| node.value.clone())
    }

    /// Check whether key is present in this instance.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        self.get_node(key).is_some()
    }

    /// Return the smallest key.
    pub fn min(&self) -> Option<K> {
        let mut node = self.root.as_ref().map(Deref::deref)?;
        while let Some(left) = node.left_deref() {
            node = left;
        }
        Some(node.key.clone())
    }

    /// Return the largest key.
    pub fn max(&self) -> Option<K> {
        let mut node = self.root.as_ref().map(Deref::deref)?;
        while let Some(right) = node.right_deref() {
            node = right;
        }
        Some(node.key.clone())
    }

    /// Return the largest key less than or equal to `key`.
    pub fn floor<Q>(&self, key: &Q) -> Option<K>
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        let mut node = self.root.as_ref().map(Deref::deref);
        let mut floor: Option<&Node<K, V>> = None;
        while let Some(nref) = node {
            node = match self.cmp.compare(key, &nref.key) {
                Ordering::Equal => return Some(nref.key.clone()),
                Ordering::Less => nref.left_deref(),
                Ordering::Greater => {
                    floor = Some(nref);
                    nref.right_deref()
                }
            };
        }
        floor.map(|node| node.key.clone())
    }

    /// Return the smallest key greater than or equal to `key`.
    pub fn ceiling<Q>(&self, key: &Q) -> Option<K>
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        let mut node = self.root.as_ref().map(Deref::deref);
        let mut ceiling: Option<&Node<K, V>> = None;
        while let Some(nref) = node {
            node = match self.cmp.compare(key, &nref.key) {
                Ordering::Equal => return Some(nref.key.clone()),
                Ordering::Greater => nref.right_deref(),
                Ordering::Less => {
                    ceiling = Some(nref);
                    nref.left_deref()
                }
            };
        }
        ceiling.map(|node| node.key.clone())
    }

    /// Return the number of keys strictly less than `key`. `key` need
    /// not be present.
    pub fn rank<Q>(&self, key: &Q) -> usize
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        let mut node = self.root.as_ref().map(Deref::deref);
        let mut rank = 0;
        while let Some(nref) = node {
            node = match self.cmp.compare(key, &nref.key) {
                Ordering::Less => nref.left_deref(),
                Ordering::Greater => {
                    rank += 1 + size(nref.left_deref());
                    nref.right_deref()
                }
                Ordering::Equal => return rank + size(nref.left_deref()),
            };
        }
        rank
    }

    /// Return the key at zero-based position `index` in sort order.
    /// Inverse of [`rank`](Llrb::rank).
    pub fn select(&self, mut index: usize) -> Option<K> {
        let mut node = self.root.as_ref().map(Deref::deref);
        while let Some(nref) = node {
            let lsize = size(nref.left_deref());
            node = match index.cmp(&lsize) {
                Ordering::Less => nref.left_deref(),
                Ordering::Greater => {
                    index -= lsize + 1;
                    nref.right_deref()
                }
                Ordering::Equal => return Some(nref.key.clone()),
            };
        }
        None
    }

    /// Return keys between `low` and `high`, both inclusive, in sort order.
    pub fn keys<Q>(&self, low: &Q, high: &Q) -> Vec<K>
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        let mut acc = vec![];
        let root = self.root.as_ref().map(Deref::deref);
        Self::range_collect(root, low, high, &self.cmp, &mut acc, &|n: &Node<K, V>| {
            n.key.clone()
        });
        acc
    }

    /// Return values for keys between `low` and `high`, both inclusive,
    /// in key order.
    pub fn values<Q>(&self, low: &Q, high: &Q) -> Vec<V>
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        let mut acc = vec![];
        let root = self.root.as_ref().map(Deref::deref);
        Self::range_collect(root, low, high, &self.cmp, &mut acc, &|n: &Node<K, V>| {
            n.value.clone()
        });
        acc
    }

    /// Return all keys in sort order.
    pub fn key_set(&self) -> Vec<K> {
        let mut acc = Vec::with_capacity(self.len());
        Self::in_order(self.root.as_ref().map(Deref::deref), &mut |n: &Node<K, V>| {
            acc.push(n.key.clone())
        });
        acc
    }

    /// Return all values, in key order.
    pub fn value_set(&self) -> Vec<V> {
        let mut acc = Vec::with_capacity(self.len());
        Self::in_order(self.root.as_ref().map(Deref::deref), &mut |n: &Node<K, V>| {
            acc.push(n.value.clone())
        });
        acc
    }

    /// Return the height of the tree, counting links on the longest path
    /// from root. Empty tree has height -1.
    pub fn height(&self) -> isize {
        Self::height_tree(self.root.as_ref().map(Deref::deref))
    }

    /// Return an iterator over all entries in this instance.
    pub fn iter(&self) -> Iter<K, V, C> {
        Iter {
            root: self.root.as_ref().map(Deref::deref),
            cmp: &self.cmp,
            node_iter: vec![].into_iter(),
            after_key: Some(Bound::Unbounded),
            limit: ITER_LIMIT,
        }
    }

    /// Range over all entries from low to high.
    pub fn range<R>(&self, range: R) -> Range<K, V, C>
    where
        R: RangeBounds<K>,
    {
        Range {
            root: self.root.as_ref().map(Deref::deref),
            cmp: &self.cmp,
            node_iter: vec![].into_iter(),
            low: Some(range.start_bound().cloned()),
            high: range.end_bound().cloned(),
            limit: ITER_LIMIT,
        }
    }

    fn get_node<Q>(&self, key: &Q) -> Option<&Node<K, V>>
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        let mut node = self.root.as_ref().map(Deref::deref);
        while let Some(nref) = node {
            node = match self.cmp.compare(key, &nref.key) {
                Ordering::Less => nref.left_deref(),
                Ordering::Greater => nref.right_deref(),
                Ordering::Equal => return Some(nref),
            };
        }
        None
    }
}

impl<K, V, C> Llrb<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Compare<K>,
{
    fn upsert(node: Option<Box<Node<K, V>>>, key: K, value: V, cmp: &C) -> Upsert<K, V> {
        let mut node = match node {
            None => return (Node::new(key, value, false /*black*/), None),
            Some(node) => node,
        };

        let old_value = match cmp.compare(&key, &node.key) {
            Ordering::Less => {
                let (left, o) = Self::upsert(node.left.take(), key, value, cmp);
                node.left = Some(left);
                o
            }
            Ordering::Greater => {
                let (right, o) = Self::upsert(node.right.take(), key, value, cmp);
                node.right = Some(right);
                o
            }
            Ordering::Equal => {
                let old_value = node.set_value(value);
                return (node, Some(old_value));
            }
        };

        node.update_size();
        (Self::walkuprot_23(node), old_value)
    }

    fn do_delete<Q>(node: Option<Box<Node<K, V>>>, key: &Q, cmp: &C) -> Delete<K, V>
    where
        C: Compare<Q, K>,
        Q: ?Sized,
    {
        let mut node = match node {
            None => panic!("do_delete(): missing key, call the programmer"),
            Some(node) => node,
        };

        if cmp.compares_lt(key, &node.key) {
            let left = node.left_deref();
            if !is_red(left) && !is_red(left.and_then(Node::left_deref)) {
                node = Self::move_red_left(node);
            }
            let (left, old_value) = Self::do_delete(node.left.take(), key, cmp);
            node.left = left;
            (Some(Self::fixup(node)), old_value)
        } else {
            if is_red(node.left_deref()) {
                node = Self::rotate_right(node);
            }

            if cmp.compares_eq(key, &node.key) && node.right.is_none() {
                debug_assert!(node.left.is_none());
                let node = *node;
                return (None, Some(node.value));
            }

            let right = node.right_deref();
            if !is_red(right) && !is_red(right.and_then(Node::left_deref)) {
                node = Self::move_red_right(node);
            }

            if cmp.compares_eq(key, &node.key) {
                // replace with in-order successor.
                let (right, successor) = Self::do_delete_min(node.right.take());
                node.right = right;
                let successor = match successor {
                    Some(successor) => *successor,
                    None => panic!("do_delete(): fatal logic, call the programmer"),
                };
                node.key = successor.key;
                let old_value = node.set_value(successor.value);
                (Some(Self::fixup(node)), Some(old_value))
            } else {
                let (right, old_value) = Self::do_delete(node.right.take(), key, cmp);
                node.right = right;
                (Some(Self::fixup(node)), old_value)
            }
        }
    }

    fn do_delete_min(node: Option<Box<Node<K, V>>>) -> Delmin<K, V> {
        let mut node = match node {
            None => return (None, None),
            Some(node) => node,
        };
        if node.left.is_none() {
            debug_assert!(node.right.is_none());
            return (None, Some(node));
        }
        let left = node.left_deref();
        if !is_red(left) && !is_red(left.and_then(Node::left_deref)) {
            node = Self::move_red_left(node);
        }
        let (left, old_node) = Self::do_delete_min(node.left.take());
        node.left = left;
        (Some(Self::fixup(node)), old_node)
    }

    fn do_delete_max(node: Option<Box<Node<K, V>>>) -> Delmin<K, V> {
        let mut node = match node {
            None => return (None, None),
            Some(node) => node,
        };
        // don't leave a red link on the left while walking the right spine.
        if is_red(node.left_deref()) {
            node = Self::rotate_right(node);
        }
        if node.right.is_none() {
            debug_assert!(node.left.is_none());
            return (None, Some(node));
        }
        let right = node.right_deref();
        if !is_red(right) && !is_red(right.and_then(Node::left_deref)) {
            node = Self::move_red_right(node);
        }
        let (right, old_node) = Self::do_delete_max(node.right.take());
        node.right = right;
        (Some(Self::fixup(node)), old_node)
    }

    fn validate_tree(
        node: Option<&Node<K, V>>,
        fromred: bool,
        mut nb: usize,
        depth: usize,
        (low, high): (Option<&K>, Option<&K>),
        cmp: &C,
        depths: &mut Depth,
    ) -> Result<usize, Error<K>> {
        let node = match node {
            None => {
                depths.sample(depth);
                return Ok(nb);
            }
            Some(node) => node,
        };

        let red = !node.is_black();
        if fromred && red {
            return Err(Error::ConsecutiveReds(node.key.clone()));
        }
        if !red {
            nb += 1;
        }
        let (left, right) = (node.left_deref(), node.right_deref());
        if let Some(right) = right.filter(|right| !right.is_black()) {
            return Err(Error::RightLeaningRed(right.key.clone()));
        }
        match low {
            Some(low) if !cmp.compares_gt(&node.key, low) => {
                return Err(Error::SortError(node.key.clone(), low.clone()));
            }
            _ => (),
        }
        match high {
            Some(high) if !cmp.compares_lt(&node.key, high) => {
                return Err(Error::SortError(node.key.clone(), high.clone()));
            }
            _ => (),
        }

        let lbounds = (low, Some(&node.key));
        let rbounds = (Some(&node.key), high);
        let lblacks = Self::validate_tree(left, red, nb, depth + 1, lbounds, cmp, depths)?;
        let rblacks = Self::validate_tree(right, red, nb, depth + 1, rbounds, cmp, depths)?;
        if lblacks != rblacks {
            let err = format!("left: {} right: {}", lblacks, rblacks);
            return Err(Error::UnbalancedBlacks(err));
        }

        let n = 1 + size(left) + size(right);
        if node.size != n {
            let err = format!("cached: {} actual: {}", node.size, n);
            return Err(Error::SizeMismatch(node.key.clone(), err));
        }
        Ok(lblacks)
    }

    fn range_collect<Q, T, F>(
        node: Option<&Node<K, V>>,
        low: &Q,
        high: &Q,
        cmp: &C,
        acc: &mut Vec<T>,
        f: &F,
    ) where
        C: Compare<Q, K>,
        Q: ?Sized,
        F: Fn(&Node<K, V>) -> T,
    {
        let node = match node {
            None => return,
            Some(node) => node,
        };
        let (complo, comphi) = (cmp.compare(low, &node.key), cmp.compare(high, &node.key));
        if complo == Ordering::Less {
            Self::range_collect(node.left_deref(), low, high, cmp, acc, f);
        }
        if complo != Ordering::Greater && comphi != Ordering::Less {
            acc.push(f(node));
        }
        if comphi == Ordering::Greater {
            Self::range_collect(node.right_deref(), low, high, cmp, acc, f);
        }
    }

    fn in_order<'a, F>(node: Option<&'a Node<K, V>>, f: &mut F)
    where
        F: FnMut(&'a Node<K, V>),
    {
        if let Some(node) = node {
            Self::in_order(node.left_deref(), f);
            f(node);
            Self::in_order(node.right_deref(), f);
        }
    }

    fn height_tree(node: Option<&Node<K, V>>) -> isize {
        match node {
            None => -1,
            Some(node) => {
                let lh = Self::height_tree(node.left_deref());
                let rh = Self::height_tree(node.right_deref());
                1 + cmp::max(lh, rh)
            }
        }
    }

    //--------- rotation routines for 2-3 algorithm ----------------

    // node's size must be fresh, rotations preserve it.
    fn walkuprot_23(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        if is_red(node.right_deref()) && !is_red(node.left_deref()) {
            node = Self::rotate_left(node);
        }
        let left = node.left_deref();
        if is_red(left) && is_red(left.and_then(Node::left_deref)) {
            node = Self::rotate_right(node);
        }
        if is_red(node.left_deref()) && is_red(node.right_deref()) {
            Self::flip(node.deref_mut())
        }
        node
    }

    //              (i)                       (i)
    //               |                         |
    //              node                       x
    //              /  \                      / \
    //             /    (r)                 (r)  \
    //            /       \                 /     \
    //          left       x             node      xr
    //                    / \            /  \
    //                  xl   xr       left   xl
    //
    fn rotate_left(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        let mut x = match node.right.take() {
            Some(x) if !x.is_black() => x,
            _ => panic!("rotate_left(): rotating a black link ? Call the programmer"),
        };
        node.right = x.left.take();
        x.black = node.black;
        node.set_red();
        x.size = node.size;
        node.update_size();
        x.left = Some(node);
        x
    }

    //              (i)                       (i)
    //               |                         |
    //              node                       x
    //              /  \                      / \
    //            (r)   \                   (r)  \
    //           /       \                 /      \
    //          x       right             xl      node
    //         / \                                / \
    //       xl   xr                             xr  right
    //
    fn rotate_right(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        let mut x = match node.left.take() {
            Some(x) if !x.is_black() => x,
            _ => panic!("rotate_right(): rotating a black link ? Call the programmer"),
        };
        node.left = x.right.take();
        x.black = node.black;
        node.set_red();
        x.size = node.size;
        node.update_size();
        x.right = Some(node);
        x
    }

    //        (x)                   (!x)
    //         |                     |
    //        node                  node
    //        / \                   / \
    //      (y) (z)              (!y) (!z)
    //     /      \              /      \
    //   left    right         left    right
    //
    fn flip(node: &mut Node<K, V>) {
        match (node.left.as_mut(), node.right.as_mut()) {
            (Some(left), Some(right)) => {
                left.toggle_link();
                right.toggle_link();
            }
            _ => panic!("flip(): missing child, call the programmer"),
        }
        node.toggle_link();
    }

    // shape-restoring step shared by all delete paths.
    fn fixup(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        node.update_size();
        if is_red(node.right_deref()) {
            node = Self::rotate_left(node);
        }
        let left = node.left_deref();
        if is_red(left) && is_red(left.and_then(Node::left_deref)) {
            node = Self::rotate_right(node);
        }
        if is_red(node.left_deref()) && is_red(node.right_deref()) {
            Self::flip(node.deref_mut());
        }
        node
    }

    fn move_red_left(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        Self::flip(node.deref_mut());
        if is_red(node.right_deref().and_then(Node::left_deref)) {
            node.right = node.right.take().map(Self::rotate_right);
            node = Self::rotate_left(node);
            Self::flip(node.deref_mut());
        }
        node
    }

    fn move_red_right(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
        Self::flip(node.deref_mut());
        if is_red(node.left_deref().and_then(Node::left_deref)) {
            node = Self::rotate_right(node);
            Self::flip(node.deref_mut());
        }
        node
    }
}

pub struct Iter<'a, K, V, C> {
    root: Option<&'a Node<K, V>>,
    cmp: &'a C,
    node_iter: std::vec::IntoIter<(K, V)>,
    after_key: Option<Bound<K>>,
    limit: usize,
}

impl<'a, K, V, C> Iter<'a, K, V, C>
where
    K: Clone,
    V: Clone,
    C: Compare<K>,
{
    fn scan_iter(
        &self,
        node: Option<&Node<K, V>>,
        acc: &mut Vec<(K, V)>, // accumulator for batch of nodes
    ) -> bool {
        let node = match node {
            None => return true,
            Some(node) => node,
        };

        let (left, right) = (node.left_deref(), node.right_deref());
        match &self.after_key {
            None => return false,
            Some(Bound::Included(akey)) | Some(Bound::Excluded(akey)) => {
                if self.cmp.compares_le(&node.key, akey) {
                    return self.scan_iter(right, acc);
                }
            }
            Some(Bound::Unbounded) => (),
        }

        if !self.scan_iter(left, acc) {
            return false;
        }

        acc.push((node.key.clone(), node.value.clone()));
        if acc.len() >= self.limit {
            return false;
        }

        self.scan_iter(right, acc)
    }
}

impl<'a, K, V, C> Iterator for Iter<'a, K, V, C>
where
    K: Clone,
    V: Clone,
    C: Compare<K>,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        match self.node_iter.next() {
            None => {
                let mut a: Vec<(K, V)> = Vec::with_capacity(self.limit);
                self.scan_iter(self.root, &mut a);
                self.after_key = a.last().map(|x| Bound::Excluded(x.0.clone()));
                self.node_iter = a.into_iter();
                self.node_iter.next()
            }
            item @ Some(_) => item,
        }
    }
}

pub struct Range<'a, K, V, C> {
    root: Option<&'a Node<K, V>>,
    cmp: &'a C,
    node_iter: std::vec::IntoIter<(K, V)>,
    low: Option<Bound<K>>,
    high: Bound<K>,
    limit: usize,
}

impl<'a, K, V, C> Range<'a, K, V, C>
where
    K: Clone,
    V: Clone,
    C: Compare<K>,
{
    /// Iterate the same range in descending order.
    pub fn rev(self) -> Reverse<'a, K, V, C> {
        let (low, high) = match self.low {
            Some(low) => (low, Some(self.high)),
            None => (Bound::Unbounded, None), // exhausted
        };
        Reverse {
            root: self.root,
            cmp: self.cmp,
            node_iter: vec![].into_iter(),
            low,
            high,
            limit: self.limit,
        }
    }

    fn range_iter(
        &self,
        node: Option<&Node<K, V>>,
        acc: &mut Vec<(K, V)>, // accumulator for batch of nodes
    ) -> bool {
        let node = match node {
            None => return true,
            Some(node) => node,
        };

        let (left, right) = (node.left_deref(), node.right_deref());
        match &self.low {
            Some(Bound::Included(qow)) if self.cmp.compares_lt(&node.key, qow) => {
                return self.range_iter(right, acc);
            }
            Some(Bound::Excluded(qow)) if self.cmp.compares_le(&node.key, qow) => {
                return self.range_iter(right, acc);
            }
            _ => (),
        }

        if !self.range_iter(left, acc) {
            return false;
        }

        acc.push((node.key.clone(), node.value.clone()));
        if acc.len() >= self.limit {
            return false;
        }

        self.range_iter(right, acc)
    }
}

impl<'a, K, V, C> Iterator for Range<'a, K, V, C>
where
    K: Clone,
    V: Clone,
    C: Compare<K>,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let item = match self.node_iter.next() {
            None if self.low.is_some() => {
                let mut acc: Vec<(K, V)> = Vec::with_capacity(self.limit);
                self.range_iter(self.root, &mut acc);
                self.low = acc.last().map(|x| Bound::Excluded(x.0.clone()));
                self.node_iter = acc.into_iter();
                self.node_iter.next()
            }
            None => None,
            item @ Some(_) => item,
        };
        // check for upper bound
        match item {
            None => None,
            Some(item) => match &self.high {
                Bound::Unbounded => Some(item),
                Bound::Included(qigh) if self.cmp.compares_le(&item.0, qigh) => Some(item),
                Bound::Excluded(qigh) if self.cmp.compares_lt(&item.0, qigh) => Some(item),
                _ => {
                    self.low = None;
                    self.node_iter = vec![].into_iter();
                    None
                }
            },
        }
    }
}

pub struct Reverse<'a, K, V, C> {
    root: Option<&'a Node<K, V>>,
    cmp: &'a C,
    node_iter: std::vec::IntoIter<(K, V)>,
    high: Option<Bound<K>>,
    low: Bound<K>,
    limit: usize,
}

impl<'a, K, V, C> Reverse<'a, K, V, C>
where
    K: Clone,
    V: Clone,
    C: Compare<K>,
{
    fn reverse_iter(
        &self,
        node: Option<&Node<K, V>>,
        acc: &mut Vec<(K, V)>, // accumulator for batch of nodes
    ) -> bool {
        let node = match node {
            None => return true,
            Some(node) => node,
        };

        let (left, right) = (node.left_deref(), node.right_deref());
        match &self.high {
            Some(Bound::Included(qigh)) if self.cmp.compares_gt(&node.key, qigh) => {
                return self.reverse_iter(left, acc);
            }
            Some(Bound::Excluded(qigh)) if self.cmp.compares_ge(&node.key, qigh) => {
                return self.reverse_iter(left, acc);
            }
            _ => (),
        }

        if !self.reverse_iter(right, acc) {
            return false;
        }

        acc.push((node.key.clone(), node.value.clone()));
        if acc.len() >= self.limit {
            return false;
        }

        self.reverse_iter(left, acc)
    }
}

impl<'a, K, V, C> Iterator for Reverse<'a, K, V, C>
where
    K: Clone,
    V: Clone,
    C: Compare<K>,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let item = match self.node_iter.next() {
            None if self.high.is_some() => {
                let mut acc: Vec<(K, V)> = Vec::with_capacity(self.limit);
                self.reverse_iter(self.root, &mut acc);
                self.high = acc.last().map(|x| Bound::Excluded(x.0.clone()));
                self.node_iter = acc.into_iter();
                self.node_iter.next()
            }
            None => None,
            item @ Some(_) => item,
        };
        // check for lower bound
        match item {
            None => None,
            Some(item) => match &self.low {
                Bound::Unbounded => Some(item),
                Bound::Included(qow) if self.cmp.compares_ge(&item.0, qow) => Some(item),
                Bound::Excluded(qow) if self.cmp.compares_gt(&item.0, qow) => Some(item),
                _ => {
                    self.high = None;
                    self.node_iter = vec![].into_iter();
                    None
                }
            },
        }
    }
}

/// Statistics on [`Llrb`] tree. Serves two purpose:
///
/// * To get partial but quick statistics via [`Llrb::stats`] method.
/// * To get full statisics via [`Llrb::validate`] method.
#[derive(Default, Debug)]
pub struct Stats {
    entries: usize, // number of entries in the tree.
    node_size: usize,
    blacks: Option<usize>,
    depths: Option<Depth>,
}

impl Stats {
    fn new(entries: usize, node_size: usize) -> Stats {
        Stats {
            entries,
            node_size,
            blacks: Default::default(),
            depths: Default::default(),
        }
    }

    #[inline]
    fn set_blacks(&mut self, blacks: usize) {
        self.blacks = Some(blacks)
    }

    #[inline]
    fn set_depths(&mut self, depths: Depth) {
        self.depths = Some(depths)
    }

    /// Return number entries in [`Llrb`] instance.
    #[inline]
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Return node-size, including over-head for `Llrb<k,V>`. Although
    /// the node overhead is constant, the node size varies based on
    /// key and value types. EG:
    ///
    /// ```
    /// use llrb_table::Llrb;
    /// let llrb: Llrb<u64, i128> = Llrb::new("myinstance");
    ///
    /// // key and value alone take 24 bytes, links, color and size
    /// // add to that.
    /// assert!(llrb.stats().node_size() > 24);
    /// ```
    #[inline]
    pub fn node_size(&self) -> usize {
        self.node_size
    }

    /// Return number of black nodes from root to leaf, on both left
    /// and right child.
    #[inline]
    pub fn blacks(&self) -> Option<usize> {
        self.blacks
    }

    /// Return [`Depth`] statistics.
    pub fn depths(&self) -> Option<Depth> {
        self.depths
            .as_ref()
            .filter(|depths| depths.samples() > 0)
            .cloned()
    }
}
