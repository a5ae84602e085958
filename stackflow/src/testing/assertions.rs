//! Call-ordering assertions.

use std::fmt::Debug;

/// Asserts that every item matching `first` comes before every item matching
/// `then`.
pub fn assert_all_before<T, A, B>(items: &[T], first: A, then: B)
where
    T: Debug,
    A: Fn(&T) -> bool,
    B: Fn(&T) -> bool,
{
    let last_first = items.iter().rposition(|i| first(i));
    let first_then = items.iter().position(|i| then(i));

    if let (Some(a), Some(b)) = (last_first, first_then) {
        assert!(
            a < b,
            "Expected all matching items before index {b}, found one at {a}: {items:?}"
        );
    }
}

/// Asserts that `expected` appears in `items` as an ordered subsequence.
pub fn assert_called_in_order<T>(items: &[T], expected: &[T])
where
    T: Debug + PartialEq,
{
    let mut remaining = expected.iter().peekable();
    for item in items {
        if remaining.peek() == Some(&item) {
            remaining.next();
        }
    }
    let missing: Vec<_> = remaining.collect();
    assert!(
        missing.is_empty(),
        "Expected calls {expected:?} in order, missing {missing:?} from {items:?}"
    );
}
