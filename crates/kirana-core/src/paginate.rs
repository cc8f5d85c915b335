//! # Line-Item Paginator
//!
//! Splits billed rows into fixed-size pages for the printed layout.
//!
//! ```text
//! 23 rows, page size 10
//!
//!   page 1: rows  1-10
//!   page 2: rows 11-20
//!   page 3: rows 21-23   ← summary block prints here
//! ```
//!
//! An empty bill still prints one (empty) page.

use std::num::NonZeroUsize;

/// Rows per printed page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// [`DEFAULT_PAGE_SIZE`] as the type [`paginate`] takes.
pub fn default_page_size() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_PAGE_SIZE).unwrap_or(NonZeroUsize::MIN)
}

/// Splits `items` into pages of at most `page_size`, in original order.
///
/// ## Example
/// ```rust
/// use std::num::NonZeroUsize;
/// use kirana_core::paginate::paginate;
///
/// let rows: Vec<u32> = (1..=23).collect();
/// let pages = paginate(&rows, NonZeroUsize::new(10).unwrap());
/// let sizes: Vec<usize> = pages.iter().map(Vec::len).collect();
/// assert_eq!(sizes, [10, 10, 3]);
///
/// let empty: Vec<Vec<u32>> = paginate(&[], NonZeroUsize::new(10).unwrap());
/// assert_eq!(empty, vec![Vec::<u32>::new()]);
/// ```
pub fn paginate<T: Clone>(items: &[T], page_size: NonZeroUsize) -> Vec<Vec<T>> {
    if items.is_empty() {
        return vec![Vec::new()];
    }

    items.chunks(page_size.get()).map(<[T]>::to_vec).collect()
}

/// Number of pages [`paginate`] produces for `len` rows.
pub fn page_count(len: usize, page_size: NonZeroUsize) -> usize {
    len.div_ceil(page_size.get()).max(1)
}

// =============================================================================
// Unit Tests
// =============================================================================


#[cfg(test)]
mod props {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn pages_concatenate_to_input(items in prop::collection::vec(any::<u16>(), 0..200), n in 1usize..25) {
            let page_size = NonZeroUsize::new(n).unwrap();
            let pages = paginate(&items, page_size);

            prop_assert_eq!(pages.len(), page_count(items.len(), page_size));
            prop_assert!(pages.iter().all(|p| p.len() <= n));
            if let Some((last, full)) = pages.split_last() {
                prop_assert!(full.iter().all(|p| p.len() == n));
                prop_assert!(!last.is_empty() || items.is_empty());
            }

            let flattened: Vec<u16> = pages.into_iter().flatten().collect();
            prop_assert_eq!(flattened, items);
        }
    }
}
