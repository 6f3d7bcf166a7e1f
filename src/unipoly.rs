//! Univariate polynomial representation for sumcheck round messages

use crate::commitments::{Commitments, MultiCommitGens};
use crate::transcript::{AppendToTranscript, ProofTranscript};
use ark_ec::CurveGroup;
use ark_ff::PrimeField;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use merlin::Transcript;

/// Univariate polynomial in coefficient form
/// ax^2 + bx + c stored as vec![c, b, a]
#[derive(Debug, Clone)]
pub struct UniPoly<F: PrimeField> {
    coeffs: Vec<F>,
}

/// Compressed univariate polynomial (without linear term)
/// ax^2 + bx + c stored as vec![c, a]
#[derive(Debug, Clone, CanonicalSerialize, CanonicalDeserialize)]
pub struct CompressedUniPoly<F: PrimeField> {
    coeffs_except_linear_term: Vec<F>,
}

impl<F: PrimeField> UniPoly<F> {
    /// Create polynomial from evaluations at 0, 1, 2, ... (degree-2 or degree-3)
    pub fn from_evals(evals: &[F]) -> Self {
        assert!(evals.len() == 3 || evals.len() == 4);

        let coeffs = if evals.len() == 3 {
            // ax^2 + bx + c
            let two_inv = F::from(2u64).inverse().unwrap();

            let c = evals[0];
            let a = two_inv * (evals[2] - evals[1] - evals[1] + c);
            let b = evals[1] - c - a;
            vec![c, b, a]
        } else {
            // ax^3 + bx^2 + cx + d
            let two_inv = F::from(2u64).inverse().unwrap();
            let six_inv = F::from(6u64).inverse().unwrap();

            let d = evals[0];
            let a = six_inv
                * (evals[3] - evals[2] - evals[2] - evals[2] + evals[1] + evals[1] + evals[1]
                    - evals[0]);
            let b = two_inv
                * (evals[0] + evals[0] - evals[1] - evals[1] - evals[1] - evals[1] - evals[1]
                    + evals[2]
                    + evals[2]
                    + evals[2]
                    + evals[2]
                    - evals[3]);
            let c = evals[1] - d - a - b;
            vec![d, c, b, a]
        };

        UniPoly { coeffs }
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len() - 1
    }

    pub fn as_vec(&self) -> Vec<F> {
        self.coeffs.clone()
    }

    pub fn eval_at_zero(&self) -> F {
        self.coeffs[0]
    }

    pub fn eval_at_one(&self) -> F {
        self.coeffs.iter().copied().sum()
    }

    pub fn evaluate(&self, r: &F) -> F {
        let mut eval = self.coeffs[0];
        let mut power = *r;
        for i in 1..self.coeffs.len() {
            eval += power * self.coeffs[i];
            power *= *r;
        }
        eval
    }

    pub fn compress(&self) -> CompressedUniPoly<F> {
        let coeffs_except_linear_term = [&self.coeffs[..1], &self.coeffs[2..]].concat();
        assert_eq!(coeffs_except_linear_term.len() + 1, self.coeffs.len());
        CompressedUniPoly {
            coeffs_except_linear_term,
        }
    }

    pub fn commit<G>(&self, gens: &MultiCommitGens<G>, blind: &F) -> G
    where
        G: CurveGroup<ScalarField = F>,
    {
        self.coeffs.commit(blind, gens)
    }
}

impl<F: PrimeField> CompressedUniPoly<F> {
    /// Decompress using hint = poly(0) + poly(1)
    pub fn decompress(&self, hint: &F) -> UniPoly<F> {
        let mut linear_term =
            *hint - self.coeffs_except_linear_term[0] - self.coeffs_except_linear_term[0];
        for i in 1..self.coeffs_except_linear_term.len() {
            linear_term -= self.coeffs_except_linear_term[i];
        }

        let mut coeffs = vec![self.coeffs_except_linear_term[0], linear_term];
        coeffs.extend(&self.coeffs_except_linear_term[1..]);
        assert_eq!(self.coeffs_except_linear_term.len() + 1, coeffs.len());
        UniPoly { coeffs }
    }
}

impl<F: PrimeField> AppendToTranscript for UniPoly<F> {
    fn append_to_transcript(&self, label: &'static [u8], transcript: &mut Transcript) {
        transcript.append_message(label, b"UniPoly_begin");
        for coeff in &self.coeffs {
            transcript.append_scalar(b"coeff", coeff);
        }
        transcript.append_message(label, b"UniPoly_end");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::Fr;
    use ark_ff::One;

    #[test]
    fn test_from_evals_quad() {
        // polynomial is 2x^2 + 3x + 1
        let e0 = Fr::one();
        let e1 = Fr::from(6u64);
        let e2 = Fr::from(15u64);
        let evals = vec![e0, e1, e2];
        let poly = UniPoly::from_evals(&evals);

        assert_eq!(poly.eval_at_zero(), e0);
        assert_eq!(poly.eval_at_one(), e1);
        assert_eq!(poly.coeffs.len(), 3);
        assert_eq!(poly.coeffs[0], Fr::one());
        assert_eq!(poly.coeffs[1], Fr::from(3u64));
        assert_eq!(poly.coeffs[2], Fr::from(2u64));

        let hint = e0 + e1;
        let decompressed = poly.compress().decompress(&hint);
        assert_eq!(decompressed.coeffs, poly.coeffs);

        assert_eq!(poly.evaluate(&Fr::from(3u64)), Fr::from(28u64));
    }

    #[test]
    fn test_from_evals_cubic() {
        // polynomial is x^3 + 2x^2 + 3x + 1
        let e0 = Fr::one();
        let e1 = Fr::from(7u64);
        let e2 = Fr::from(23u64);
        let e3 = Fr::from(55u64);
        let evals = vec![e0, e1, e2, e3];
        let poly = UniPoly::from_evals(&evals);

        assert_eq!(poly.eval_at_zero(), e0);
        assert_eq!(poly.eval_at_one(), e1);
        assert_eq!(poly.coeffs.len(), 4);
        assert_eq!(poly.coeffs[0], Fr::one());
        assert_eq!(poly.coeffs[1], Fr::from(3u64));
        assert_eq!(poly.coeffs[2], Fr::from(2u64));
        assert_eq!(poly.coeffs[3], Fr::one());

        let hint = e0 + e1;
        let decompressed = poly.compress().decompress(&hint);
        assert_eq!(decompressed.coeffs, poly.coeffs);

        assert_eq!(poly.evaluate(&Fr::from(4u64)), Fr::from(109u64));
    }
}
