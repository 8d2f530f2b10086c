//! Lazy iterator chain
//!
//! A `LazyChain` yields the items of a sequence of sub-iterators that are
//! produced on demand by a callback. The callback receives the zero-based
//! number of the sub-iterator being requested. The first time it returns
//! `None` the chain is finished for good: the callback is dropped and never
//! called again, even if later indices would have produced items.

use std::fmt;
use std::iter;

/// Boxed, sendable iterator
pub type BoxIter<'a, T> = Box<dyn Iterator<Item = T> + Send + 'a>;

pub struct LazyChain<F, I> {
    next_index: usize,
    current: Option<I>,
    source: Option<F>,
}

impl<F, I> LazyChain<F, I>
where
    F: FnMut(usize) -> Option<I>,
    I: Iterator,
{
    pub fn new(source: F) -> Self {
        Self {
            next_index: 0,
            current: None,
            source: Some(source),
        }
    }

    /// Number of sub-iterators requested so far
    pub fn requested(&self) -> usize {
        self.next_index
    }

    /// Whether the callback has signalled exhaustion
    pub fn is_exhausted(&self) -> bool {
        self.source.is_none()
    }
}

impl<F, I> Iterator for LazyChain<F, I>
where
    F: FnMut(usize) -> Option<I>,
    I: Iterator,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.current.as_mut().and_then(Iterator::next) {
                return Some(item);
            }
            let source = self.source.as_mut()?;
            let index = self.next_index;
            self.next_index += 1;
            match source(index) {
                Some(next) => self.current = Some(next),
                None => {
                    self.source = None;
                    self.current = None;
                    return None;
                }
            }
        }
    }
}

impl<F, I> fmt::Debug for LazyChain<F, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyChain")
            .field("next_index", &self.next_index)
            .field("exhausted", &self.source.is_none())
            .finish()
    }
}

/// An iterator that yields `item` and then everything `delegate` yields
///
/// Used to put back an element that was pulled from an iterator to peek at
/// it.
pub fn pushback<'a, T, D>(item: T, delegate: D) -> impl Iterator<Item = T> + Send + 'a
where
    T: Send + 'a,
    D: Iterator<Item = T> + Send + 'a,
{
    let mut item = Some(item);
    let mut delegate = Some(delegate);
    LazyChain::new(move |index| -> Option<BoxIter<'a, T>> {
        match index {
            0 => item.take().map(|x| Box::new(iter::once(x)) as BoxIter<'a, T>),
            1 => delegate.take().map(|d| Box::new(d) as BoxIter<'a, T>),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests;
