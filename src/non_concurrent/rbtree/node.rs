use std::alloc::Layout;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Color {
    Red,
    Black,
}

/// Which child of a node a link is.
///
/// Every mirrored case of the fixup routines is written once in terms of a
/// `Direction` and its opposite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Direction {
    Left = 0,
    Right = 1,
}

impl Direction {
    pub(super) fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

pub(super) type Link = NonNull<RBTreeNode>;

// No red node has a red child, so a node of height `h` has black height at least `h/2`,
// and its subtree holds at least `2^(h/2) - 1` nodes.
// LEMMA: An RBTree with `n` internal nodes has height at most `2*log₂(n+1)`
// (which bounds the recursion in `traverse` and `clear`)

/// NOTE: every real node is followed by `elem_size` contiguous payload bytes in
/// the same allocation. The sentinel is a bare header with no payload.
#[repr(C)]
pub(super) struct RBTreeNode {
    pub(super) color: Color,
    /// Lookup only, never freed through.
    pub(super) parent: Link,
    /// Indexed by `Direction as usize`.
    pub(super) children: [Link; 2],
}

impl RBTreeNode {
    /// A fresh header whose every link points at `nil`.
    pub(super) fn new(color: Color, nil: Link) -> Self {
        Self {
            color,
            parent: nil,
            children: [nil, nil],
        }
    }
}

/// Offset of the payload from the start of a node allocation.
pub(super) const PAYLOAD_OFFSET: usize = size_of::<RBTreeNode>();

/// The layout of a header followed by `elem_size` payload bytes.
///
/// Returns `None` if the total size overflows `isize`.
pub(super) fn node_layout(elem_size: usize) -> Option<Layout> {
    let payload = Layout::array::<u8>(elem_size).ok()?;
    let (layout, offset) = Layout::new::<RBTreeNode>().extend(payload).ok()?;
    debug_assert_eq!(offset, PAYLOAD_OFFSET);
    Some(layout.pad_to_align())
}

/// The layout of the sentinel, which carries no payload.
pub(super) fn sentinel_layout() -> Layout {
    Layout::new::<RBTreeNode>()
}

/// Pointer to the first payload byte of `node`.
pub(super) fn payload_ptr(node: Link) -> *mut u8 {
    // SAFETY: stays within the node allocation (the offset is at most one past the header)
    unsafe { node.as_ptr().cast::<u8>().add(PAYLOAD_OFFSET) }
}

/// SAFETY: `node` must be a live real node (not the sentinel) of a tree with
/// `elem_size`-byte elements, and must outlive `'a` without being mutated.
pub(super) unsafe fn payload<'a>(node: Link, elem_size: usize) -> &'a [u8] {
    // SAFETY: guaranteed by caller
    unsafe { std::slice::from_raw_parts(payload_ptr(node), elem_size) }
}


/// A handle to one element stored in an [`RBTree`](super::RBTree).
///
/// The handle borrows the tree, so it can't outlive it or survive a mutation.
#[derive(Clone, Copy)]
pub struct Node<'a> {
    ptr: Link,
    elem_size: usize,
    _tree: PhantomData<&'a RBTreeNode>,
}

impl<'a> Node<'a> {
    /// SAFETY: `ptr` must be a real node owned by a tree borrowed for `'a`.
    pub(super) unsafe fn new(ptr: Link, elem_size: usize) -> Self {
        Self { ptr, elem_size, _tree: PhantomData }
    }

    /// The element's payload bytes.
    pub fn data(&self) -> &'a [u8] {
        // SAFETY: the tree is borrowed for `'a`, so the node is live and unchanged
        unsafe { payload(self.ptr, self.elem_size) }
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Node").field(&self.data()).finish()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_layout_holds_payload() {
        for elem_size in [1, 3, 8, 17, 64] {
            let layout = node_layout(elem_size).unwrap();
            assert!(layout.size() >= PAYLOAD_OFFSET + elem_size);
            assert_eq!(layout.align(), align_of::<RBTreeNode>());
            assert_eq!(layout.size() % layout.align(), 0);
        }
    }

    #[test]
    fn test_node_layout_overflow() {
        assert!(node_layout(isize::MAX as usize).is_none());
    }

    #[test]
    fn test_direction_index() {
        let mut header = RBTreeNode::new(Color::Red, NonNull::dangling());
        let other = NonNull::from(&header);
        header.children[Direction::Right as usize] = other;
        assert_eq!(header.children[1], other);
        assert_ne!(header.children[Direction::Left as usize], other);
        assert_eq!(Direction::Left.opposite(), Direction::Right);
        assert_eq!(Direction::Right.opposite(), Direction::Left);
    }
}
