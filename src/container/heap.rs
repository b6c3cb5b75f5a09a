//! Binary heap algorithms over an index-addressable sequence
//!
//! Any type exposing `len/less/swap` can be maintained as a heap in place.
//! The heap root is the element for which `less` holds against all others,
//! so a min-heap or max-heap is chosen purely by the implementor's `less`.

/// Sequence operations required by the heap algorithms
pub trait HeapOps {
    /// Logical number of elements participating in the heap
    fn len(&self) -> usize;
    /// Reports whether element `i` must sort before element `j`
    fn less(&self, i: usize, j: usize) -> bool;
    /// Swaps elements `i` and `j`
    fn swap(&mut self, i: usize, j: usize);
}

/// Establishes the heap invariant over the first `len()` elements in O(n).
pub fn init<H: HeapOps + ?Sized>(h: &mut H) {
    let n = h.len();
    if n < 2 {
        return;
    }
    for i in (0..n / 2).rev() {
        down(h, i, n);
    }
}

/// Re-establishes the heap invariant after element `i` changed value.
pub fn fix<H: HeapOps + ?Sized>(h: &mut H, i: usize) {
    let n = h.len();
    if !down(h, i, n) {
        up(h, i);
    }
}

/// Moves element `j` toward the root while it sorts before its parent.
pub fn up<H: HeapOps + ?Sized>(h: &mut H, mut j: usize) {
    while j > 0 {
        let parent = (j - 1) / 2;
        if !h.less(j, parent) {
            break;
        }
        h.swap(parent, j);
        j = parent;
    }
}

/// Moves element `i0` toward the leaves within the first `n` elements.
///
/// Returns true if the element moved.
pub fn down<H: HeapOps + ?Sized>(h: &mut H, i0: usize, n: usize) -> bool {
    let mut i = i0;
    loop {
        let left = 2 * i + 1;
        if left >= n {
            break;
        }
        let mut child = left;
        let right = left + 1;
        if right < n && h.less(right, left) {
            child = right;
        }
        if !h.less(child, i) {
            break;
        }
        h.swap(i, child);
        i = child;
    }
    i > i0
}
