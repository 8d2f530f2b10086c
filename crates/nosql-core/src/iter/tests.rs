//! Tests for the lazy iterator chain

use super::*;
use std::cell::RefCell;
use std::rc::Rc;

mod chain_tests {
    use super::*;

    #[test]
    fn test_chain_concatenates_batches_in_order() {
        let batches = vec![vec![1, 2], vec![], vec![3]];
        let chain = LazyChain::new(|i| batches.get(i).cloned().map(Vec::into_iter));
        assert_eq!(chain.collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_chain_stops_at_first_none() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let log = calls.clone();
        let chain = LazyChain::new(move |i| {
            log.borrow_mut().push(i);
            match i {
                0 => Some(vec!["a", "b"].into_iter()),
                1 => None,
                _ => Some(vec!["never"].into_iter()),
            }
        });

        assert_eq!(chain.collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(*calls.borrow(), vec![0, 1]);
    }

    #[test]
    fn test_chain_never_calls_back_after_exhaustion() {
        let calls = Rc::new(RefCell::new(0usize));
        let count = calls.clone();
        let mut chain = LazyChain::new(move |i| {
            *count.borrow_mut() += 1;
            (i == 0).then(|| vec![7].into_iter())
        });

        assert_eq!(chain.next(), Some(7));
        assert_eq!(chain.next(), None);
        assert!(chain.is_exhausted());
        assert_eq!(chain.next(), None);
        assert_eq!(chain.next(), None);
        assert_eq!(*calls.borrow(), 2);
        assert_eq!(chain.requested(), 2);
    }

    #[test]
    fn test_chain_is_lazy() {
        let calls = Rc::new(RefCell::new(0usize));
        let count = calls.clone();
        let mut chain = LazyChain::new(move |i| {
            *count.borrow_mut() += 1;
            (i < 10).then(|| std::iter::once(i))
        });

        assert_eq!(*calls.borrow(), 0);
        assert_eq!(chain.next(), Some(0));
        assert_eq!(*calls.borrow(), 1);
    }
}

mod pushback_tests {
    use super::*;

    #[test]
    fn test_pushback_yields_item_then_delegate() {
        let it = pushback("X", vec!["Y", "Z"].into_iter());
        assert_eq!(it.collect::<Vec<_>>(), vec!["X", "Y", "Z"]);
    }

    #[test]
    fn test_pushback_with_empty_delegate() {
        let it = pushback(1, std::iter::empty());
        assert_eq!(it.collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_pushback_after_peek() {
        let mut source = vec![10, 20, 30].into_iter();
        let first = source.next().unwrap();
        let restored: Vec<_> = pushback(first, source).collect();
        assert_eq!(restored, vec![10, 20, 30]);
    }
}
