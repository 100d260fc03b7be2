#![deny(unsafe_op_in_unsafe_fn)]

#[macro_use]
extern crate log;

// not concurrent
pub mod non_concurrent;

// the ordered tree is the main API to use
pub use non_concurrent::rbtree::{
    Bytewise, Compare, Global, Iter, Node, NodeAllocator, RBTree, RBTreeError, TraversalOrder,
};

#[cfg(test)]
mod testing;
