use std::cmp::Ordering;


/// A total order over fixed-size records.
///
/// Both slices passed to `compare` are exactly `elem_size` bytes long.
/// Any `Fn(&[u8], &[u8]) -> Ordering` is a comparator.
pub trait Compare {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering;
}

impl<F> Compare for F
where
    F: Fn(&[u8], &[u8]) -> Ordering,
{
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        self(a, b)
    }
}

/// Lexicographic comparison of the raw bytes, i.e. `memcmp`.
///
/// This is the comparator used when none is given. Big-endian unsigned
/// integers sort numerically under it, native-endian ones generally don't.
#[derive(Debug, Default, Clone, Copy)]
pub struct Bytewise;

impl Compare for Bytewise {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        a.cmp(b)
    }
}
