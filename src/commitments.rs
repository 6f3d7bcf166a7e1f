//! Pedersen commitments with label-derived generators

use crate::group::GroupElementExt;
use ark_ec::{CurveGroup, PrimeGroup};
use ark_ff::PrimeField;
use sha3::{
    digest::{ExtendableOutput, Update, XofReader},
    Shake256,
};

/// Generators for multi-scalar commitments
#[derive(Debug, Clone)]
pub struct MultiCommitGens<G: CurveGroup> {
    pub n: usize,
    pub G: Vec<G>,
    pub h: G,
}

impl<G: CurveGroup> MultiCommitGens<G> {
    /// Derive n+1 generators from a label via a SHAKE-256 XOF
    pub fn new(n: usize, label: &[u8]) -> Self {
        let mut shake = Shake256::default();
        shake.update(label);
        shake.update(G::generator().compress().as_bytes());

        let mut reader = shake.finalize_xof();
        let mut gens: Vec<G> = Vec::new();
        let mut uniform_bytes = [0u8; 64];

        for _ in 0..n + 1 {
            reader.read(&mut uniform_bytes);
            gens.push(G::from_uniform_bytes(&uniform_bytes));
        }

        MultiCommitGens {
            n,
            G: gens[..n].to_vec(),
            h: gens[n],
        }
    }

    pub fn from_generators(gens: Vec<G>, h: G) -> Self {
        MultiCommitGens {
            n: gens.len(),
            G: gens,
            h,
        }
    }

    pub fn scale(&self, s: &G::ScalarField) -> Self {
        MultiCommitGens {
            n: self.n,
            h: self.h,
            G: (0..self.n).map(|i| self.G[i] * s).collect(),
        }
    }

    pub fn split_at(&self, mid: usize) -> (Self, Self) {
        let (G1, G2) = self.G.split_at(mid);

        (
            MultiCommitGens {
                n: G1.len(),
                G: G1.to_vec(),
                h: self.h,
            },
            MultiCommitGens {
                n: G2.len(),
                G: G2.to_vec(),
                h: self.h,
            },
        )
    }
}

/// Trait for Pedersen commitments
pub trait Commitments<G: CurveGroup> {
    fn commit(&self, blind: &G::ScalarField, gens_n: &MultiCommitGens<G>) -> G;
}

impl<F: PrimeField, G: CurveGroup<ScalarField = F>> Commitments<G> for F {
    fn commit(&self, blind: &G::ScalarField, gens_n: &MultiCommitGens<G>) -> G {
        assert_eq!(gens_n.n, 1);
        G::vartime_multiscalar_mul(&[*self, *blind], &[gens_n.G[0], gens_n.h])
    }
}

// Vec<F> commits through this impl via auto-deref
impl<F: PrimeField, G: CurveGroup<ScalarField = F>> Commitments<G> for [F] {
    fn commit(&self, blind: &G::ScalarField, gens_n: &MultiCommitGens<G>) -> G {
        assert_eq!(gens_n.n, self.len());
        G::vartime_multiscalar_mul(self, &gens_n.G) + gens_n.h * *blind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::{Fr, G1Projective};
    use ark_ff::Zero;

    #[test]
    fn test_commitment_gens() {
        let gens = MultiCommitGens::<G1Projective>::new(4, b"test");
        assert_eq!(gens.n, 4);
        assert_eq!(gens.G.len(), 4);
    }

    #[test]
    fn test_gens_are_deterministic() {
        let gens1 = MultiCommitGens::<G1Projective>::new(3, b"test");
        let gens2 = MultiCommitGens::<G1Projective>::new(3, b"test");
        assert_eq!(gens1.G, gens2.G);
        assert_eq!(gens1.h, gens2.h);

        let other = MultiCommitGens::<G1Projective>::new(3, b"other");
        assert_ne!(gens1.G, other.G);
    }

    #[test]
    fn test_scalar_commit() {
        let gens = MultiCommitGens::<G1Projective>::new(1, b"test");
        let commit = Fr::from(42u64).commit(&Fr::from(123u64), &gens);
        assert!(!commit.is_zero());
    }

    #[test]
    fn test_vector_commit() {
        let gens = MultiCommitGens::<G1Projective>::new(3, b"test");
        let vals = vec![Fr::from(1u64), Fr::from(2u64), Fr::from(3u64)];
        let commit = vals.commit(&Fr::from(456u64), &gens);
        assert!(!commit.is_zero());

        let manual = gens.G[0] * vals[0] + gens.G[1] * vals[1] + gens.G[2] * vals[2]
            + gens.h * Fr::from(456u64);
        assert_eq!(commit, manual);
    }
}
