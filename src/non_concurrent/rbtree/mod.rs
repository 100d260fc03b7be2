//! A red-black tree over fixed-size opaque records.
//!
//! Every element is `elem_size` bytes, stored inline after its node header and
//! ordered by a caller-supplied [`Compare`]. Equal elements are stored once:
//! inserting a duplicate is a successful no-op.
//!
//! The tree does no locking of its own. To share one between threads, put it
//! behind a lock and hold the lock for every call.

use std::cmp::Ordering;
use std::fmt;

mod alloc;
mod compare;
mod error;
mod node;
mod traverse;

pub use alloc::{Global, NodeAllocator};
pub use compare::{Bytewise, Compare};
pub use error::RBTreeError;
pub use node::Node;
pub use traverse::{Iter, TraversalOrder};

use node::{Color, Direction, Link, RBTreeNode};


/// An ordered set of `elem_size`-byte records.
///
/// Absent links point at a per-tree sentinel (`nil`) instead of being null.
/// The sentinel is always black, and erase may temporarily point its `parent`
/// at a real node so the fixup never has to special-case a missing child.
pub struct RBTree<C: Compare = Bytewise, A: NodeAllocator = Global> {
    root: Link,
    nil: Link,
    len: usize,
    elem_size: usize,
    node_layout: std::alloc::Layout,
    cmp: C,
    alloc: A,
}

// SAFETY: the tree exclusively owns every node, so sending it moves all of them
unsafe impl<C: Compare + Send, A: NodeAllocator + Send> Send for RBTree<C, A> {}
// SAFETY: `&RBTree` only ever reads nodes
unsafe impl<C: Compare + Sync, A: NodeAllocator + Sync> Sync for RBTree<C, A> {}

impl RBTree {
    /// Creates an empty tree of `elem_size`-byte records ordered bytewise.
    pub fn new(elem_size: usize) -> Result<Self, RBTreeError> {
        Self::with_comparator_in(elem_size, Bytewise, Global)
    }
}

impl<C: Compare> RBTree<C> {
    pub fn with_comparator(elem_size: usize, cmp: C) -> Result<Self, RBTreeError> {
        Self::with_comparator_in(elem_size, cmp, Global)
    }
}

impl<C: Compare, A: NodeAllocator> RBTree<C, A> {
    /// Creates an empty tree whose nodes come from `alloc`.
    ///
    /// Fails with `InvalidArgument` if `elem_size` is zero, and with
    /// `AllocationFailure` if the sentinel can't be allocated.
    pub fn with_comparator_in(elem_size: usize, cmp: C, alloc: A) -> Result<Self, RBTreeError> {
        if elem_size == 0 {
            warn!("Refusing to create a tree of zero-sized elements");
            return Err(RBTreeError::InvalidArgument)
        }
        let Some(node_layout) = node::node_layout(elem_size) else {
            warn!("Element size {elem_size:#x} is too large for a node");
            return Err(RBTreeError::InvalidArgument)
        };

        let Some(nil) = alloc.allocate(node::sentinel_layout()) else {
            error!("Failed to allocate the sentinel node");
            return Err(RBTreeError::AllocationFailure)
        };
        let nil = nil.cast::<RBTreeNode>();
        // SAFETY: freshly allocated with the layout of a header
        unsafe { nil.write(RBTreeNode::new(Color::Black, nil)) };

        debug!("Created tree of {elem_size}-byte elements (sentinel @ {nil:016x?})");

        Ok(Self {
            root: nil,
            nil,
            len: 0,
            elem_size,
            node_layout,
            cmp,
            alloc,
        })
    }

    /// The number of elements in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The size in bytes of every element.
    pub fn elem_size(&self) -> usize {
        self.elem_size
    }

    /// Inserts a copy of `data`.
    ///
    /// Returns `Ok(true)` if the element was added, and `Ok(false)` if an equal
    /// element was already present (the tree is left as it was).
    ///
    /// Complexity: O(log(n))
    pub fn insert(&mut self, data: &[u8]) -> Result<bool, RBTreeError> {
        self.check_len(data)?;

        let mut parent = self.nil;
        let mut side = Direction::Left;
        let mut cursor = self.root;
        while cursor != self.nil {
            parent = cursor;
            side = match self.cmp.compare(self.payload(cursor), data) {
                Ordering::Less => Direction::Right,
                Ordering::Greater => Direction::Left,
                Ordering::Equal => return Ok(false),
            };
            cursor = self.child(cursor, side);
        }

        let node = self.allocate_node(data)?;
        self.set_parent(node, parent);
        self.len += 1;

        if parent == self.nil {
            self.root = node;
            self.set_color(node, Color::Black);
        } else {
            self.set_child(parent, side, node);
            self.insert_fixup(node);
        }
        Ok(true)
    }

    /// Removes the element equal to `data`.
    ///
    /// Complexity: O(log(n))
    pub fn erase(&mut self, data: &[u8]) -> Result<(), RBTreeError> {
        self.check_len(data)?;

        let node = self.search(data);
        if node == self.nil {
            return Err(RBTreeError::NotFound)
        }
        self.remove_node(node);
        Ok(())
    }

    /// Finds the element equal to `data`, if any.
    ///
    /// Complexity: O(log(n))
    pub fn find(&self, data: &[u8]) -> Option<Node<'_>> {
        if data.len() != self.elem_size {
            warn!("Looked up a {}-byte record in a tree of {}-byte elements", data.len(), self.elem_size);
            return None
        }
        self.node_handle(self.search(data))
    }

    pub fn contains(&self, data: &[u8]) -> bool {
        self.find(data).is_some()
    }

    /// The smallest element.
    pub fn first(&self) -> Option<Node<'_>> {
        self.node_handle(self.min(self.root))
    }

    /// The largest element.
    pub fn last(&self) -> Option<Node<'_>> {
        self.node_handle(self.max(self.root))
    }

    /// Removes every element. The tree stays usable.
    ///
    /// Complexity: O(n)
    pub fn clear(&mut self) {
        let count = self.len;
        let root = std::mem::replace(&mut self.root, self.nil);
        self.free_subtree(root);
        debug_assert_eq!(self.len, 0);
        debug!("Cleared {count} elements");
    }
}

// Internal algorithms
impl<C: Compare, A: NodeAllocator> RBTree<C, A> {
    fn check_len(&self, data: &[u8]) -> Result<(), RBTreeError> {
        if data.len() == self.elem_size {
            return Ok(())
        }
        warn!("Got a {}-byte record for a tree of {}-byte elements", data.len(), self.elem_size);
        Err(RBTreeError::InvalidArgument)
    }

    /// The node equal to `data`, or `nil`.
    fn search(&self, data: &[u8]) -> Link {
        let mut node = self.root;
        while node != self.nil {
            node = match self.cmp.compare(self.payload(node), data) {
                Ordering::Less => self.child(node, Direction::Right),
                Ordering::Greater => self.child(node, Direction::Left),
                Ordering::Equal => break,
            };
        }
        node
    }

    fn node_handle(&self, node: Link) -> Option<Node<'_>> {
        if node == self.nil {
            return None
        }
        // SAFETY: a real node of this tree, borrowed along with `self`
        Some(unsafe { Node::new(node, self.elem_size) })
    }

    fn allocate_node(&self, data: &[u8]) -> Result<Link, RBTreeError> {
        let Some(block) = self.alloc.allocate(self.node_layout) else {
            error!("Failed to allocate a node ({:?})", self.node_layout);
            return Err(RBTreeError::AllocationFailure)
        };
        let node = block.cast::<RBTreeNode>();
        // SAFETY: the block fits a header followed by `elem_size` bytes, and `data` is `elem_size` bytes
        unsafe {
            node.write(RBTreeNode::new(Color::Red, self.nil));
            std::ptr::copy_nonoverlapping(data.as_ptr(), node::payload_ptr(node), self.elem_size);
        }
        Ok(node)
    }

    /// SAFETY: `node` must be a real node that is no longer linked into the tree.
    unsafe fn deallocate_node(&self, node: Link) {
        // SAFETY: allocated in `allocate_node` with this layout, freed once
        unsafe { self.alloc.deallocate(node.cast(), self.node_layout) }
    }

    /// Frees every node of the subtree at `node`, children before parents.
    fn free_subtree(&mut self, node: Link) {
        if node == self.nil {
            return
        }
        self.free_subtree(self.child(node, Direction::Left));
        self.free_subtree(self.child(node, Direction::Right));
        // SAFETY: both children are gone and the caller already unlinked this subtree
        unsafe { self.deallocate_node(node) };
        self.len -= 1;
    }

    /// Unlinks and frees `node`, then restores the red-black properties.
    fn remove_node(&mut self, node: Link) {
        let left = self.child(node, Direction::Left);
        let right = self.child(node, Direction::Right);

        // the color of the slot that physically disappears, and the node now in it
        let mut removed_color = self.color(node);
        let replacement;

        if left == self.nil {
            replacement = right;
            self.transplant(node, right);
        } else if right == self.nil {
            replacement = left;
            self.transplant(node, left);
        } else {
            let successor = self.min(right);
            removed_color = self.color(successor);
            replacement = self.child(successor, Direction::Right);

            if self.parent(successor) == node {
                // `replacement` may be `nil`, which then needs a parent for the fixup
                self.set_parent(replacement, successor);
            } else {
                self.transplant(successor, replacement);
                self.set_child(successor, Direction::Right, right);
                self.set_parent(right, successor);
            }

            self.transplant(node, successor);
            self.set_child(successor, Direction::Left, left);
            self.set_parent(left, successor);
            let color = self.color(node);
            self.set_color(successor, color);
        }

        // SAFETY: `node` has been spliced out above
        unsafe { self.deallocate_node(node) };
        self.len -= 1;

        if removed_color == Color::Black {
            self.erase_fixup(replacement);
        }
    }

    fn insert_fixup(&mut self, mut node: Link) {
        while self.color(self.parent(node)) == Color::Red {
            // a red parent is never the root, so the grandparent is real
            let parent = self.parent(node);
            let grandparent = self.parent(parent);
            let side = self.side_of(parent);
            let uncle = self.child(grandparent, side.opposite());

            if self.color(uncle) == Color::Red {
                trace!("insert fixup: red uncle, recoloring");
                self.set_color(parent, Color::Black);
                self.set_color(uncle, Color::Black);
                self.set_color(grandparent, Color::Red);
                node = grandparent;
                continue
            }

            if node == self.child(parent, side.opposite()) {
                trace!("insert fixup: inner grandchild, rotating parent {side:?}");
                node = parent;
                self.rotate(node, side);
            }

            trace!("insert fixup: outer grandchild, rotating grandparent {:?}", side.opposite());
            let parent = self.parent(node);
            self.set_color(parent, Color::Black);
            self.set_color(grandparent, Color::Red);
            self.rotate(grandparent, side.opposite());
        }
        self.set_color(self.root, Color::Black);
    }

    /// Resolves a single black deficiency at `node`, which may be `nil`.
    fn erase_fixup(&mut self, mut node: Link) {
        while node != self.root && self.color(node) == Color::Black {
            let parent = self.parent(node);
            let side = self.side_of(node);
            let mut sibling = self.child(parent, side.opposite());

            if self.color(sibling) == Color::Red {
                trace!("erase fixup: red sibling, rotating parent {side:?}");
                self.set_color(sibling, Color::Black);
                self.set_color(parent, Color::Red);
                self.rotate(parent, side);
                sibling = self.child(parent, side.opposite());
            }

            let near = self.child(sibling, side);
            let far = self.child(sibling, side.opposite());

            if self.color(near) == Color::Black && self.color(far) == Color::Black {
                trace!("erase fixup: black nephews, moving deficiency up");
                self.set_color(sibling, Color::Red);
                node = parent;
                continue
            }

            if self.color(far) == Color::Black {
                trace!("erase fixup: red near nephew, rotating sibling {:?}", side.opposite());
                self.set_color(near, Color::Black);
                self.set_color(sibling, Color::Red);
                self.rotate(sibling, side.opposite());
                sibling = self.child(parent, side.opposite());
            }

            trace!("erase fixup: red far nephew, rotating parent {side:?}");
            let parent_color = self.color(parent);
            self.set_color(sibling, parent_color);
            self.set_color(parent, Color::Black);
            let far = self.child(sibling, side.opposite());
            self.set_color(far, Color::Black);
            self.rotate(parent, side);
            node = self.root;
        }
        self.set_color(node, Color::Black);
    }

    /// Rotates the subtree at `node` towards `dir`: the child on the opposite
    /// side takes `node`'s place and `node` becomes its `dir` child.
    ///
    /// Colors are left alone.
    fn rotate(&mut self, node: Link, dir: Direction) {
        let pivot = self.child(node, dir.opposite());
        debug_assert!(pivot != self.nil, "rotating {dir:?} without a child to promote");

        let inner = self.child(pivot, dir);
        self.set_child(node, dir.opposite(), inner);
        if inner != self.nil {
            self.set_parent(inner, node);
        }

        self.transplant(node, pivot);
        self.set_child(pivot, dir, node);
        self.set_parent(node, pivot);
    }

    /// Puts the subtree at `new` where `old` hangs from its parent (or the
    /// root), and points `new` back at that parent. The subtrees themselves are
    /// untouched. `new` may be `nil`, whose parent is then set for the fixup.
    fn transplant(&mut self, old: Link, new: Link) {
        let parent = self.parent(old);
        if parent == self.nil {
            self.root = new;
        } else {
            let side = self.side_of(old);
            self.set_child(parent, side, new);
        }
        self.set_parent(new, parent);
    }

    /// The leftmost node of the subtree at `node`, or `nil` if it's empty.
    fn min(&self, mut node: Link) -> Link {
        if node == self.nil {
            return node
        }
        while self.child(node, Direction::Left) != self.nil {
            node = self.child(node, Direction::Left);
        }
        node
    }

    fn max(&self, mut node: Link) -> Link {
        if node == self.nil {
            return node
        }
        while self.child(node, Direction::Right) != self.nil {
            node = self.child(node, Direction::Right);
        }
        node
    }
}

// Link accessors.
//
// Every link reachable from `root` or `nil` points at either a live node of
// this tree or the sentinel, which is what makes the dereferences below sound.
impl<C: Compare, A: NodeAllocator> RBTree<C, A> {
    #[inline]
    fn color(&self, node: Link) -> Color {
        unsafe { (*node.as_ptr()).color }
    }

    #[inline]
    fn set_color(&mut self, node: Link, color: Color) {
        unsafe { (*node.as_ptr()).color = color }
    }

    #[inline]
    fn parent(&self, node: Link) -> Link {
        unsafe { (*node.as_ptr()).parent }
    }

    #[inline]
    fn set_parent(&mut self, node: Link, parent: Link) {
        unsafe { (*node.as_ptr()).parent = parent }
    }

    #[inline]
    fn child(&self, node: Link, dir: Direction) -> Link {
        unsafe { (*node.as_ptr()).children[dir as usize] }
    }

    #[inline]
    fn set_child(&mut self, node: Link, dir: Direction, child: Link) {
        unsafe { (*node.as_ptr()).children[dir as usize] = child }
    }

    /// Which child of its parent `node` is.
    ///
    /// For `nil`, this relies on the synthetic parent set during erase: the
    /// deficient side is the one holding `nil`, and its sibling is always real.
    #[inline]
    fn side_of(&self, node: Link) -> Direction {
        match self.child(self.parent(node), Direction::Left) == node {
            true => Direction::Left,
            false => Direction::Right,
        }
    }

    /// The payload of a real node.
    #[inline]
    fn payload(&self, node: Link) -> &[u8] {
        debug_assert!(node != self.nil, "the sentinel has no payload");
        unsafe { node::payload(node, self.elem_size) }
    }
}

impl<C: Compare, A: NodeAllocator> Drop for RBTree<C, A> {
    fn drop(&mut self) {
        self.clear();
        // SAFETY: allocated in the constructor with this layout, and nothing links to it anymore
        unsafe { self.alloc.deallocate(self.nil.cast(), node::sentinel_layout()) };
    }
}

impl<C: Compare, A: NodeAllocator> fmt::Debug for RBTree<C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
