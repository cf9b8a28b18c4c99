// ABOUTME: Order-preserving split of a token sequence into bounded-size chunks
// ABOUTME: Lazy, restartable, and allocation-free until a chunk is collected

use std::iter::FusedIterator;
use std::num::NonZeroUsize;

/// Lazy sequence of consecutive sub-slices of at most `size` elements.
///
/// Each clone walks the same slice independently, so a partition can be
/// iterated any number of times.
#[derive(Debug, Clone)]
pub struct Partition<'a, T> {
    remaining: &'a [T],
    size: usize,
}

/// Split `items` into chunks of `size`, the last one possibly shorter.
///
/// Yields exactly `ceil(items.len() / size)` chunks; an empty input yields none.
pub fn split<T>(items: &[T], size: NonZeroUsize) -> Partition<'_, T> {
    Partition {
        remaining: items,
        size: size.get(),
    }
}

impl<'a, T> Iterator for Partition<'a, T> {
    type Item = &'a [T];

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }
        let at = self.size.min(self.remaining.len());
        let (chunk, rest) = self.remaining.split_at(at);
        self.remaining = rest;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining.len().div_ceil(self.size);
        (n, Some(n))
    }
}

impl<T> ExactSizeIterator for Partition<'_, T> {}

impl<T> FusedIterator for Partition<'_, T> {}
