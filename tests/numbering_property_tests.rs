//! Property-based tests for the gap-filling number allocator
//!
//! This module uses the proptest crate to verify that allocation
//! behavior is correct across a wide range of randomly generated
//! number sets, not just specific test cases. The central invariant:
//! the allocator always returns the smallest unused integer strictly
//! greater than the baseline.

use payment_approval::numbering::next_number;
use proptest::prelude::*;
use std::collections::BTreeSet;

/// Strategy for a set of numbers in use, with duplicates and ordering
/// handled by the BTreeSet itself
fn existing_numbers_strategy() -> impl Strategy<Value = BTreeSet<u32>> {
    prop::collection::btree_set(0u32..5_000, 0..300)
}

proptest! {
    /// Property: the result is strictly greater than the baseline and
    /// not already in use.
    #[test]
    fn result_is_unused_and_above_baseline(
        existing in existing_numbers_strategy(),
        baseline in 0u32..2_500,
    ) {
        let n = next_number(&existing, baseline);
        prop_assert!(n > baseline);
        prop_assert!(!existing.contains(&n));
    }

    /// Property: every integer between the baseline and the result is
    /// in use — i.e. the result is the *lowest* gap, not just any gap.
    #[test]
    fn everything_below_the_result_is_in_use(
        existing in existing_numbers_strategy(),
        baseline in 0u32..2_500,
    ) {
        let n = next_number(&existing, baseline);
        for candidate in (baseline + 1)..n {
            prop_assert!(existing.contains(&candidate));
        }
    }

    /// Property: allocation is pure — the same snapshot always yields
    /// the same number, which is what lets concurrent callers agree.
    #[test]
    fn allocation_is_deterministic(
        existing in existing_numbers_strategy(),
        baseline in 0u32..2_500,
    ) {
        prop_assert_eq!(
            next_number(&existing, baseline),
            next_number(&existing, baseline)
        );
    }

    /// Property: recording the allocated number and allocating again
    /// yields a strictly larger number; repeated allocation never hands
    /// out duplicates.
    #[test]
    fn recording_the_result_moves_allocation_forward(
        mut existing in existing_numbers_strategy(),
        baseline in 0u32..2_500,
    ) {
        let first = next_number(&existing, baseline);
        existing.insert(first);
        let second = next_number(&existing, baseline);
        prop_assert!(second > first);
    }

    /// Property: removing a number below the current frontier makes the
    /// allocator hand exactly that number out next (gap refill).
    #[test]
    fn freed_numbers_are_reused_first(
        baseline in 0u32..1_000,
        len in 2u32..50,
        gap_offset in 1u32..50,
    ) {
        let gap_offset = gap_offset % len + 1; // keep the gap inside the run
        let mut existing: BTreeSet<u32> =
            (baseline + 1..=baseline + len).collect();
        let freed = baseline + gap_offset;
        existing.remove(&freed);

        prop_assert_eq!(next_number(&existing, baseline), freed);
    }
}
