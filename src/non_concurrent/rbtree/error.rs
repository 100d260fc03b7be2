use std::fmt;


#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RBTreeError {
    /// A zero element size, or a record whose length isn't the element size.
    InvalidArgument,
    /// The allocator couldn't provide a node or the sentinel.
    AllocationFailure,
    /// No element compares equal to the one given. This is an expected outcome, not a fault.
    NotFound,
}

impl fmt::Display for RBTreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RBTreeError::InvalidArgument => f.write_str("invalid argument"),
            RBTreeError::AllocationFailure => f.write_str("allocation failed"),
            RBTreeError::NotFound => f.write_str("element not found"),
        }
    }
}

impl std::error::Error for RBTreeError {}
