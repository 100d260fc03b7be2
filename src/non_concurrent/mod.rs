//! Data structures that do no synchronization of their own.

pub mod rbtree;
