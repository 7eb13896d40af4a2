//! Merkle commitments over unordered sets of 256-bit values.
//!
//! Values are sorted numerically before pairing, so the root depends only on
//! the set, never on submission order. Each node is
//! `SHA-256(int_hex(left) || int_hex(right))` read back as a 256-bit integer.
//! A trailing unpaired node at any level is paired with itself.

use crate::crypto::sha256;
use crate::error::{CoreError, Result};
use crate::types::Hash256;

/// Hash one pair of nodes into their parent.
pub fn hash_pair(left: &Hash256, right: &Hash256) -> Hash256 {
    let mut input = left.to_int_hex();
    input.push_str(&right.to_int_hex());
    sha256(input.as_bytes())
}

/// Reduce one level by pairing consecutive nodes.
fn next_level(nodes: &[Hash256]) -> Vec<Hash256> {
    nodes
        .chunks(2)
        .map(|pair| match pair {
            [left, right] => hash_pair(left, right),
            _ => hash_pair(&pair[0], &pair[0]),
        })
        .collect()
}

/// Compute the Merkle root of a non-empty set of values.
///
/// A single value `v` yields `hash_pair(v, v)`.
pub fn merkle_root(values: &[Hash256]) -> Result<Hash256> {
    if values.is_empty() {
        return Err(CoreError::EmptyMerkleSet);
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let mut level = next_level(&sorted);
    while level.len() > 1 {
        level = next_level(&level);
    }
    Ok(level[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn h(byte: u8) -> Hash256 {
        Hash256::from_bytes([byte; 32])
    }

    #[test]
    fn test_empty_set_fails() {
        assert!(matches!(merkle_root(&[]), Err(CoreError::EmptyMerkleSet)));
    }

    #[test]
    fn test_single_value_pairs_with_itself() {
        let v = h(0x11);
        let expected = sha256(format!("{}{}", v.to_int_hex(), v.to_int_hex()).as_bytes());
        assert_eq!(merkle_root(&[v]).unwrap(), expected);
    }

    #[test]
    fn test_pair_uses_minimal_hex() {
        let one = Hash256::from_hex("1").unwrap();
        let two = Hash256::from_hex("2").unwrap();
        assert_eq!(hash_pair(&one, &two), sha256(b"12"));
    }

    #[test]
    fn test_three_values() {
        let (a, b, c) = (h(0x01), h(0x02), h(0x03));
        let left = hash_pair(&a, &b);
        let right = hash_pair(&c, &c);
        assert_eq!(merkle_root(&[c, a, b]).unwrap(), hash_pair(&left, &right));
    }

    #[test]
    fn test_five_values() {
        let vals: Vec<Hash256> = (1..=5).map(h).collect();
        let l1 = vec![
            hash_pair(&vals[0], &vals[1]),
            hash_pair(&vals[2], &vals[3]),
            hash_pair(&vals[4], &vals[4]),
        ];
        let l2 = vec![hash_pair(&l1[0], &l1[1]), hash_pair(&l1[2], &l1[2])];
        let root = hash_pair(&l2[0], &l2[1]);
        assert_eq!(merkle_root(&vals).unwrap(), root);
    }

    #[test]
    fn test_different_sets_differ() {
        assert_ne!(
            merkle_root(&[h(1), h(2)]).unwrap(),
            merkle_root(&[h(1), h(3)]).unwrap()
        );
    }

    proptest! {
        #[test]
        fn root_is_permutation_invariant(
            values in prop::collection::vec(any::<[u8; 32]>(), 1..24),
            seed in any::<u64>(),
        ) {
            let values: Vec<Hash256> = values.into_iter().map(Hash256::from_bytes).collect();
            let mut shuffled = values.clone();
            // Deterministic rotation + reversal driven by the seed.
            let len = shuffled.len();
            shuffled.rotate_left((seed as usize) % len);
            if seed & 1 == 1 {
                shuffled.reverse();
            }
            prop_assert_eq!(merkle_root(&values).unwrap(), merkle_root(&shuffled).unwrap());
        }
    }
}
