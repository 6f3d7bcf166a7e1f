//! Group operations over a generic curve group

use crate::errors::ProofVerifyError;
use ark_ec::{CurveGroup, PrimeGroup, VariableBaseMSM};
use ark_ff::PrimeField;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use core::borrow::Borrow;

/// Compressed group element (canonical compressed point encoding)
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct CompressedGroup(pub Vec<u8>);

impl CompressedGroup {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Decompress to a group element; fails on non-canonical or off-curve bytes
    pub fn decompress<G: CurveGroup>(&self) -> Result<G, ProofVerifyError> {
        G::Affine::deserialize_compressed(self.0.as_slice())
            .map(Into::into)
            .map_err(|_| ProofVerifyError::DecompressionError)
    }
}

/// Extension trait adding compression, hash-to-group, and variable-time MSM
pub trait GroupElementExt: CurveGroup {
    /// Compress to canonical bytes
    fn compress(&self) -> CompressedGroup {
        let mut bytes = Vec::new();
        self.into_affine()
            .serialize_compressed(&mut bytes)
            .expect("serialization into a Vec is infallible");
        CompressedGroup(bytes)
    }

    /// Map 64 uniform bytes to a group element via a wide-reduced scalar
    /// times the fixed generator. Only used to derive public generators.
    fn from_uniform_bytes(bytes: &[u8; 64]) -> Self {
        Self::generator() * Self::ScalarField::from_le_bytes_mod_order(bytes)
    }

    /// Variable-time multi-scalar multiplication
    fn vartime_multiscalar_mul<I, J>(scalars: I, points: J) -> Self
    where
        I: IntoIterator,
        I::Item: Borrow<Self::ScalarField>,
        J: IntoIterator,
        J::Item: Borrow<Self>,
    {
        let scalars: Vec<Self::ScalarField> =
            scalars.into_iter().map(|s| *s.borrow()).collect();
        let points: Vec<Self> = points.into_iter().map(|p| *p.borrow()).collect();
        assert_eq!(scalars.len(), points.len());
        let bases = Self::normalize_batch(&points);
        <Self as VariableBaseMSM>::msm_unchecked(&bases, &scalars)
    }
}

impl<G: CurveGroup> GroupElementExt for G {}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::G1Projective;
    use ark_curve25519::EdwardsProjective;
    use ark_ff::Zero;

    type FrBls = ark_bls12_381::Fr;

    #[test]
    fn test_msm() {
        let g = G1Projective::generator();
        let scalars = [FrBls::from(2u64), FrBls::from(3u64)];
        let points = [g, g];
        let result = G1Projective::vartime_multiscalar_mul(&scalars, &points);
        assert_eq!(result, g * FrBls::from(5u64));
    }

    #[test]
    fn test_compress_decompress() {
        let g = EdwardsProjective::generator() * ark_curve25519::Fr::from(7u64);
        let decompressed: EdwardsProjective = g.compress().decompress().unwrap();
        assert_eq!(g, decompressed);
    }

    #[test]
    fn test_decompress_rejects_garbage() {
        let mut bytes = G1Projective::generator().compress().0;
        bytes.truncate(bytes.len() - 1);
        let garbage = CompressedGroup(bytes);
        assert!(garbage.decompress::<G1Projective>().is_err());
    }

    #[test]
    fn test_from_uniform_bytes_nonzero() {
        let bytes = [42u8; 64];
        let p = G1Projective::from_uniform_bytes(&bytes);
        assert!(!p.is_zero());
    }
}
