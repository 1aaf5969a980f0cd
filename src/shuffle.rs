//! Low-entropy shuffle for names without a weight entry.
//!
//! The shuffle only exists so that the first alias record in the zone is not
//! always the answer. It is driven by 16-bit values shaped like DNS
//! transaction ids and is not meant to be uniformly random.

use rand::RngCore;

/// Source of pseudo-random 16-bit ids.
pub trait IdSource {
    /// Produce the next id.
    fn next_id(&mut self) -> u16;
}

impl<R: RngCore> IdSource for R {
    fn next_id(&mut self) -> u16 {
        // Low half of a u32 draw, like a fresh DNS message id.
        self.next_u32() as u16
    }
}

/// Shuffle `records` in place and return the first one.
///
/// - two records: swapped when the id is even,
/// - more: `len * (1 + id % 4)` swaps of two distinct id-chosen indices.
///
/// Returns `None` only for an empty slice.
pub fn shuffle_first<'a, T, S>(records: &'a mut [T], ids: &mut S) -> Option<&'a T>
where
    S: IdSource + ?Sized,
{
    let len = records.len();
    match len {
        0 => return None,
        1 => {}
        2 => {
            if ids.next_id() % 2 == 0 {
                records.swap(0, 1);
            }
        }
        _ => {
            let rounds = len * (1 + usize::from(ids.next_id()) % 4);
            for _ in 0..rounds {
                let q = usize::from(ids.next_id()) % len;
                let mut p = usize::from(ids.next_id()) % len;
                if p == q {
                    p = (p + 1) % len;
                }
                records.swap(q, p);
            }
        }
    }
    records.first()
}
