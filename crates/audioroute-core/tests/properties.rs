//! Property-based tests for the growable array and literal parsing.

use audioroute_core::{DYN_ARRAY_GRANULE, DynArray, parse_i32, parse_u32};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Capacity is always a whole number of granules until compressed, and
    /// never smaller than the element count.
    #[test]
    fn capacity_tracks_granules(n in 0usize..400) {
        let mut a: DynArray<u16> = DynArray::new();
        for i in 0..n {
            a.push(u16::try_from(i).unwrap()).unwrap();
            prop_assert!(a.len() <= a.capacity());
            prop_assert_eq!(a.capacity() % DYN_ARRAY_GRANULE, 0);
            prop_assert!(a.capacity() - a.len() < DYN_ARRAY_GRANULE);
        }

        a.compress();
        prop_assert_eq!(a.capacity(), n);
        for (i, v) in a.iter().enumerate() {
            prop_assert_eq!(usize::from(*v), i);
        }
    }

    /// Decimal, hex and octal spellings of the same value agree.
    #[test]
    fn literal_spellings_agree(v in any::<u32>()) {
        prop_assert_eq!(parse_u32(&v.to_string()).unwrap(), v);
        prop_assert_eq!(parse_u32(&format!("{v:#x}")).unwrap(), v);
        prop_assert_eq!(parse_u32(&format!("0{v:o}")).unwrap(), v);
    }

    /// Signed literals round-trip through their decimal text.
    #[test]
    fn signed_literals(v in any::<i32>()) {
        prop_assert_eq!(parse_i32(&v.to_string()).unwrap(), v);
    }
}
