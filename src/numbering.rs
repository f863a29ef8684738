//! Gap-filling sequence allocation for human-facing document numbers
//!
//! Numbers are never stored as a counter; the next number is derived
//! from the live set of numbers in use. Deleting a document frees its
//! number, and the next allocation reuses the lowest freed slot. The
//! function is pure so the caller must serialize the snapshot-allocate-
//! persist sequence; see the executor's per-kind locks.

use std::collections::BTreeSet;

/// First payment order gets `PAYMENT_NUMBER_BASELINE + 1`.
pub const PAYMENT_NUMBER_BASELINE: u32 = 1000;
/// Exit permits number independently per company partition.
pub const EXIT_NUMBER_BASELINE: u32 = 100;

/// Smallest unused integer strictly greater than `baseline`.
///
/// `existing` iterates in ascending order, so the first element greater
/// than the running candidate proves a gap below it.
pub fn next_number(existing: &BTreeSet<u32>, baseline: u32) -> u32 {
    let mut candidate = baseline + 1;
    for &n in existing {
        if n < candidate {
            continue;
        }
        if n == candidate {
            candidate += 1;
        } else {
            break;
        }
    }
    candidate
}
