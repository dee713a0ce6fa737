//! Brute-force oracles.
//!
//! Slow, obviously correct reference answers for properties checked against
//! the fast solvers in `agricola_core`.

/// Whether `counts` fits `slots` when every slot goes to at most one
/// species, by trying every assignment.
///
/// Exponential in the number of slots; keep inputs small.
#[must_use]
pub fn brute_force_can_hold(slots: &[u32], counts: &[u32]) -> bool {
    let bins = counts.len() + 1;
    let mut assignment = vec![0usize; slots.len()];
    loop {
        let mut totals = vec![0u32; counts.len()];
        for (slot, &bin) in slots.iter().zip(&assignment) {
            if bin < counts.len() {
                totals[bin] += slot;
            }
        }
        if totals.iter().zip(counts).all(|(have, need)| have >= need) {
            return true;
        }
        // Next assignment, counting in base `bins`.
        let mut position = 0;
        loop {
            if position == assignment.len() {
                return false;
            }
            assignment[position] += 1;
            if assignment[position] < bins {
                break;
            }
            assignment[position] = 0;
            position += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_herd_fits_anywhere() {
        assert!(brute_force_can_hold(&[], &[0, 0, 0]));
    }

    #[test]
    fn test_species_cannot_share_a_slot() {
        assert!(!brute_force_can_hold(&[4], &[1, 1, 0]));
        assert!(brute_force_can_hold(&[4, 1], &[3, 1, 0]));
    }

    #[test]
    fn test_species_may_span_slots() {
        assert!(brute_force_can_hold(&[2, 2, 1], &[5, 0, 0]));
        assert!(!brute_force_can_hold(&[2, 2, 1], &[5, 1, 0]));
    }
}
