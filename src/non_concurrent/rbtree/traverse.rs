use std::iter::FusedIterator;

use super::node::{Direction, Link};
use super::{Compare, NodeAllocator, RBTree};


/// The order in which [`RBTree::traverse`] visits elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalOrder {
    /// Node, then left subtree, then right subtree.
    PreOrder,
    /// Ascending order under the tree's comparator.
    InOrder,
    /// Left subtree, then right subtree, then node.
    PostOrder,
}

impl<C: Compare, A: NodeAllocator> RBTree<C, A> {
    /// Calls `visitor` once with every element, depth-first in the given order.
    ///
    /// The walk always visits every element. The tree is borrowed for the
    /// whole walk, so it can't be mutated from inside `visitor`.
    ///
    /// Complexity: O(n), recursing at most `2*log₂(n+1)` deep.
    pub fn traverse<'a, F>(&'a self, order: TraversalOrder, mut visitor: F)
    where
        F: FnMut(&'a [u8]),
    {
        self.walk(self.root, order, &mut visitor);
    }

    fn walk<'a, F>(&'a self, node: Link, order: TraversalOrder, visitor: &mut F)
    where
        F: FnMut(&'a [u8]),
    {
        if node == self.nil {
            return
        }
        let left = self.child(node, Direction::Left);
        let right = self.child(node, Direction::Right);

        match order {
            TraversalOrder::PreOrder => {
                visitor(self.payload(node));
                self.walk(left, order, visitor);
                self.walk(right, order, visitor);
            }
            TraversalOrder::InOrder => {
                self.walk(left, order, visitor);
                visitor(self.payload(node));
                self.walk(right, order, visitor);
            }
            TraversalOrder::PostOrder => {
                self.walk(left, order, visitor);
                self.walk(right, order, visitor);
                visitor(self.payload(node));
            }
        }
    }

    /// Iterates over the elements in ascending order.
    pub fn iter(&self) -> Iter<'_, C, A> {
        Iter {
            tree: self,
            next: self.min(self.root),
            remaining: self.len,
        }
    }

    /// The in-order successor of a real node, or `nil`.
    fn successor(&self, node: Link) -> Link {
        let right = self.child(node, Direction::Right);
        if right != self.nil {
            return self.min(right)
        }

        // climb until we come up from a left subtree
        let mut node = node;
        let mut parent = self.parent(node);
        while parent != self.nil && node == self.child(parent, Direction::Right) {
            node = parent;
            parent = self.parent(parent);
        }
        parent
    }
}

/// In-order iterator over an [`RBTree`], created by [`RBTree::iter`].
pub struct Iter<'a, C: Compare, A: NodeAllocator> {
    tree: &'a RBTree<C, A>,
    next: Link,
    remaining: usize,
}

impl<'a, C: Compare, A: NodeAllocator> Iterator for Iter<'a, C, A> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.next == self.tree.nil {
            return None
        }
        let node = self.next;
        self.next = self.tree.successor(node);
        self.remaining -= 1;
        Some(self.tree.payload(node))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<C: Compare, A: NodeAllocator> ExactSizeIterator for Iter<'_, C, A> {}
impl<C: Compare, A: NodeAllocator> FusedIterator for Iter<'_, C, A> {}

impl<C: Compare, A: NodeAllocator> Clone for Iter<'_, C, A> {
    fn clone(&self) -> Self {
        Self { tree: self.tree, next: self.next, remaining: self.remaining }
    }
}

impl<'a, C: Compare, A: NodeAllocator> IntoIterator for &'a RBTree<C, A> {
    type Item = &'a [u8];
    type IntoIter = Iter<'a, C, A>;

    fn into_iter(self) -> Iter<'a, C, A> {
        self.iter()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{initialize_logging, key_of, record};

    fn collect(tree: &RBTree, order: TraversalOrder) -> Vec<u32> {
        let mut out = vec![];
        tree.traverse(order, |data| out.push(key_of(data)));
        out
    }

    #[test]
    fn test_empty_traversal() {
        initialize_logging();
        let tree = RBTree::new(4).unwrap();
        for order in [TraversalOrder::PreOrder, TraversalOrder::InOrder, TraversalOrder::PostOrder] {
            assert!(collect(&tree, order).is_empty());
        }
        assert_eq!(tree.iter().next(), None);
    }

    /// Inserting 1, 2, 3 rotates into a perfect three-node tree rooted at 2
    #[test]
    fn test_three_orders() {
        initialize_logging();
        let mut tree = RBTree::new(4).unwrap();
        for k in [1, 2, 3] {
            tree.insert(&record(k)).unwrap();
        }
        assert_eq!(collect(&tree, TraversalOrder::PreOrder), [2, 1, 3]);
        assert_eq!(collect(&tree, TraversalOrder::InOrder), [1, 2, 3]);
        assert_eq!(collect(&tree, TraversalOrder::PostOrder), [1, 3, 2]);
    }

    #[test]
    fn test_orders_visit_everything_once() {
        initialize_logging();
        let mut tree = RBTree::new(4).unwrap();
        for k in (0..200).map(|i| (i * 37) % 200) {
            tree.insert(&record(k)).unwrap();
        }

        let inorder = collect(&tree, TraversalOrder::InOrder);
        assert_eq!(inorder, (0..200).collect::<Vec<_>>());

        let pre = collect(&tree, TraversalOrder::PreOrder);
        let post = collect(&tree, TraversalOrder::PostOrder);
        // the root comes first in pre-order and last in post-order
        let root = key_of(tree.payload(tree.root));
        assert_eq!(pre.first(), Some(&root));
        assert_eq!(post.last(), Some(&root));

        for mut order in [pre, post] {
            order.sort();
            assert_eq!(order, inorder);
        }
    }

    #[test]
    fn test_iter_matches_inorder() {
        initialize_logging();
        let mut tree = RBTree::new(4).unwrap();
        for k in [50, 20, 80, 10, 30, 70, 90, 25, 35, 5] {
            tree.insert(&record(k)).unwrap();
        }
        tree.erase(&record(20)).unwrap();

        let iter = tree.iter();
        assert_eq!(iter.len(), 9);
        let keys: Vec<u32> = iter.map(key_of).collect();
        assert_eq!(keys, collect(&tree, TraversalOrder::InOrder));

        // iteration can stop early, unlike `traverse`
        let below_40: Vec<u32> = (&tree).into_iter().map(key_of).take_while(|&k| k < 40).collect();
        assert_eq!(below_40, [5, 10, 25, 30, 35]);
    }

    #[test]
    fn test_iter_is_fused() {
        initialize_logging();
        let mut tree = RBTree::new(4).unwrap();
        tree.insert(&record(1)).unwrap();
        let mut iter = tree.iter();
        assert!(iter.next().is_some());
        assert!(iter.next().is_none());
        assert!(iter.next().is_none());
        assert_eq!(iter.len(), 0);
    }
}
