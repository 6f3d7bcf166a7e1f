//! Dense multilinear polynomials and their commitments
//!
//! A polynomial over ell variables is stored as its 2^ell evaluations over the
//! boolean hypercube. The commitment views the evaluation vector as a matrix
//! and commits row by row; an evaluation proof reduces to a log-size dot
//! product argument over the row-combined vector.

use crate::commitments::{Commitments, MultiCommitGens};
use crate::errors::ProofVerifyError;
use crate::group::GroupElementExt;
use crate::math::Math;
use crate::nizk::{DotProductProofGens, DotProductProofLog};
use crate::random::RandomTape;
use crate::transcript::{AppendToTranscript, ProofTranscript};
use ark_ec::CurveGroup;
use ark_ff::{One, PrimeField, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use core::ops::Index;
use merlin::Transcript;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Polynomial commitment generators, sized for the matrix row length
#[derive(Clone)]
pub struct PolyCommitmentGens<G: CurveGroup> {
    pub gens: DotProductProofGens<G>,
}

impl<G: CurveGroup> PolyCommitmentGens<G> {
    pub fn new(num_vars: usize, label: &'static [u8]) -> Self {
        let (_left, right) = EqPolynomial::<G::ScalarField>::compute_factored_lens(num_vars);
        let gens = DotProductProofGens::new(right.pow2(), label);
        PolyCommitmentGens { gens }
    }
}

/// Blinds for polynomial commitment, one per matrix row
pub struct PolyCommitmentBlinds<F: PrimeField> {
    pub blinds: Vec<F>,
}

/// Polynomial commitment: one Pedersen commitment per matrix row
#[derive(Debug, Clone, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct PolyCommitment<G: CurveGroup> {
    pub C: Vec<G>,
}

impl<G: CurveGroup> AppendToTranscript for PolyCommitment<G> {
    fn append_to_transcript(&self, label: &'static [u8], transcript: &mut Transcript) {
        transcript.append_message(label, b"poly_commitment_begin");
        for c in &self.C {
            transcript.append_point(b"poly_commitment_share", &c.compress());
        }
        transcript.append_message(label, b"poly_commitment_end");
    }
}

/// Polynomial evaluation proof
#[derive(Debug, Clone, CanonicalSerialize, CanonicalDeserialize)]
pub struct PolyEvalProof<G: CurveGroup> {
    proof: DotProductProofLog<G>,
}

impl<G: CurveGroup> PolyEvalProof<G> {
    fn protocol_name() -> &'static [u8] {
        b"polynomial evaluation proof"
    }

    pub fn prove(
        poly: &DensePolynomial<G::ScalarField>,
        blinds_opt: Option<&PolyCommitmentBlinds<G::ScalarField>>,
        r: &[G::ScalarField],
        Zr: &G::ScalarField,
        blind_Zr_opt: Option<&G::ScalarField>,
        gens: &PolyCommitmentGens<G>,
        transcript: &mut Transcript,
        random_tape: &mut RandomTape<G::ScalarField>,
    ) -> (PolyEvalProof<G>, G) {
        transcript.append_protocol_name(PolyEvalProof::<G>::protocol_name());

        assert_eq!(poly.get_num_vars(), r.len());

        let (left_num_vars, right_num_vars) =
            EqPolynomial::<G::ScalarField>::compute_factored_lens(r.len());
        let L_size = left_num_vars.pow2();
        let R_size = right_num_vars.pow2();

        let default_blinds = PolyCommitmentBlinds {
            blinds: vec![G::ScalarField::zero(); L_size],
        };
        let blinds = blinds_opt.map_or(&default_blinds, |p| p);

        assert_eq!(blinds.blinds.len(), L_size);

        let zero = G::ScalarField::zero();
        let blind_Zr = blind_Zr_opt.map_or(&zero, |p| p);

        // compute the L and R vectors
        let eq = EqPolynomial::new(r.to_vec());
        let (L, R) = eq.compute_factored_evals();
        assert_eq!(L.len(), L_size);
        assert_eq!(R.len(), R_size);

        // compute the vector underneath L*Z and the L-combined blinds
        let LZ = poly.bound(&L);
        let LZ_blind: G::ScalarField = (0..L.len()).map(|i| blinds.blinds[i] * L[i]).sum();

        // a dot product proof of size R_size
        let (proof, _C_LR, C_Zr_prime) = DotProductProofLog::prove(
            &gens.gens,
            transcript,
            random_tape,
            &LZ,
            &LZ_blind,
            &R,
            Zr,
            blind_Zr,
        );

        (PolyEvalProof { proof }, C_Zr_prime)
    }

    pub fn verify(
        &self,
        gens: &PolyCommitmentGens<G>,
        transcript: &mut Transcript,
        r: &[G::ScalarField],
        C_Zr: &G,
        comm: &PolyCommitment<G>,
    ) -> Result<(), ProofVerifyError> {
        transcript.append_protocol_name(PolyEvalProof::<G>::protocol_name());

        // compute L and R
        let eq = EqPolynomial::new(r.to_vec());
        let (L, R) = eq.compute_factored_evals();

        // weighted sum of the row commitments by L
        let C_LZ = G::vartime_multiscalar_mul(&L, &comm.C);

        self.proof
            .verify(R.len(), &gens.gens, transcript, &R, &C_LZ, C_Zr)
    }

    pub fn verify_plain(
        &self,
        gens: &PolyCommitmentGens<G>,
        transcript: &mut Transcript,
        r: &[G::ScalarField],
        Zr: &G::ScalarField,
        comm: &PolyCommitment<G>,
    ) -> Result<(), ProofVerifyError> {
        // commit to the claimed evaluation with a blind of zero
        let C_Zr = Zr.commit(&G::ScalarField::zero(), &gens.gens.gens_1);

        self.verify(gens, transcript, r, &C_Zr, comm)
    }
}

/// Dense multilinear polynomial in evaluation form
#[derive(Debug, Clone)]
pub struct DensePolynomial<F: PrimeField> {
    num_vars: usize,
    len: usize,
    Z: Vec<F>,
}

impl<F: PrimeField> DensePolynomial<F> {
    pub fn new(Z: Vec<F>) -> Self {
        let len = Z.len();
        let num_vars = if len > 0 { len.log_2() } else { 0 };
        DensePolynomial { num_vars, len, Z }
    }

    pub fn get_num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn evals(&self) -> &[F] {
        &self.Z
    }

    pub fn split(&self, idx: usize) -> (DensePolynomial<F>, DensePolynomial<F>) {
        assert!(idx < self.len());
        (
            DensePolynomial::new(self.Z[..idx].to_vec()),
            DensePolynomial::new(self.Z[idx..2 * idx].to_vec()),
        )
    }

    /// Bind the polynomial's top variable to r
    pub fn bound_poly_var_top(&mut self, r: &F) {
        let n = self.len() / 2;
        for i in 0..n {
            self.Z[i] = self.Z[i] + *r * (self.Z[i + n] - self.Z[i]);
        }
        self.Z.truncate(n);
        self.num_vars -= 1;
        self.len = n;
    }

    /// Bind the polynomial's bottom variable to r
    pub fn bound_poly_var_bot(&mut self, r: &F) {
        let n = self.len() / 2;
        for i in 0..n {
            self.Z[i] = self.Z[2 * i] + *r * (self.Z[2 * i + 1] - self.Z[2 * i]);
        }
        self.Z.truncate(n);
        self.num_vars -= 1;
        self.len = n;
    }

    /// Evaluate the polynomial at point r
    pub fn evaluate(&self, r: &[F]) -> F {
        assert_eq!(r.len(), self.get_num_vars());
        let chis = EqPolynomial::new(r.to_vec()).evals();
        assert_eq!(chis.len(), self.Z.len());
        compute_dotproduct(&self.Z, &chis)
    }

    pub fn vec(&self) -> &Vec<F> {
        &self.Z
    }

    pub fn extend(&mut self, other: &DensePolynomial<F>) {
        assert_eq!(self.Z.len(), self.len);
        let other_vec = other.vec();
        assert_eq!(other_vec.len(), self.len);
        self.Z.extend(other_vec);
        self.num_vars += 1;
        self.len *= 2;
    }

    pub fn merge<'a, I>(polys: I) -> DensePolynomial<F>
    where
        I: IntoIterator<Item = &'a DensePolynomial<F>>,
    {
        let mut Z: Vec<F> = Vec::new();
        for poly in polys.into_iter() {
            Z.extend(poly.vec());
        }
        Z.resize(Z.len().next_power_of_two(), F::zero());
        DensePolynomial::new(Z)
    }

    pub fn from_usize(Z: &[usize]) -> Self {
        DensePolynomial::new(Z.iter().map(|&x| F::from(x as u64)).collect())
    }

    fn commit_inner<G>(&self, blinds: &[F], gens: &MultiCommitGens<G>) -> PolyCommitment<G>
    where
        G: CurveGroup<ScalarField = F>,
    {
        let L_size = blinds.len();
        let R_size = self.Z.len() / L_size;
        assert_eq!(L_size * R_size, self.Z.len());

        #[cfg(feature = "parallel")]
        let iter = (0..L_size).into_par_iter();
        #[cfg(not(feature = "parallel"))]
        let iter = 0..L_size;

        let C = iter
            .map(|i| self.Z[R_size * i..R_size * (i + 1)].commit(&blinds[i], gens))
            .collect();
        PolyCommitment { C }
    }

    pub fn commit<G>(
        &self,
        gens: &PolyCommitmentGens<G>,
        random_tape: Option<&mut RandomTape<F>>,
    ) -> (PolyCommitment<G>, PolyCommitmentBlinds<F>)
    where
        G: CurveGroup<ScalarField = F>,
    {
        let n = self.Z.len();
        let ell = self.get_num_vars();
        assert_eq!(n, ell.pow2());

        let (left_num_vars, right_num_vars) = EqPolynomial::<F>::compute_factored_lens(ell);
        let L_size = left_num_vars.pow2();
        let R_size = right_num_vars.pow2();
        assert_eq!(L_size * R_size, n);

        let blinds = if let Some(t) = random_tape {
            PolyCommitmentBlinds {
                blinds: t.random_vector(b"poly_blinds", L_size),
            }
        } else {
            PolyCommitmentBlinds {
                blinds: vec![F::zero(); L_size],
            }
        };

        (self.commit_inner(&blinds.blinds, &gens.gens.gens_n), blinds)
    }

    /// Compute L * Z where Z is viewed as an L_size x R_size matrix
    pub fn bound(&self, L: &[F]) -> Vec<F> {
        let (left_num_vars, right_num_vars) =
            EqPolynomial::<F>::compute_factored_lens(self.get_num_vars());
        let L_size = left_num_vars.pow2();
        let R_size = right_num_vars.pow2();

        #[cfg(feature = "parallel")]
        let iter = (0..R_size).into_par_iter();
        #[cfg(not(feature = "parallel"))]
        let iter = 0..R_size;

        iter.map(|i| (0..L_size).map(|j| L[j] * self.Z[j * R_size + i]).sum())
            .collect()
    }
}

impl<F: PrimeField> Index<usize> for DensePolynomial<F> {
    type Output = F;

    #[inline(always)]
    fn index(&self, index: usize) -> &F {
        &self.Z[index]
    }
}

/// Equality polynomial: eq(x, r) = prod_i (r_i * x_i + (1 - r_i) * (1 - x_i))
pub struct EqPolynomial<F: PrimeField> {
    r: Vec<F>,
}

impl<F: PrimeField> EqPolynomial<F> {
    pub fn new(r: Vec<F>) -> Self {
        EqPolynomial { r }
    }

    /// Evaluate eq(r, rx)
    pub fn evaluate(&self, rx: &[F]) -> F {
        assert_eq!(self.r.len(), rx.len());
        (0..rx.len())
            .map(|i| self.r[i] * rx[i] + (F::one() - self.r[i]) * (F::one() - rx[i]))
            .product()
    }

    /// Compute all evaluations of eq(r, x) for x in {0,1}^n
    pub fn evals(&self) -> Vec<F> {
        let ell = self.r.len();
        let mut evals: Vec<F> = vec![F::one(); ell.pow2()];
        let mut size = 1;

        for j in 0..ell {
            size *= 2;
            for i in (0..size).rev().step_by(2) {
                let scalar = evals[i / 2];
                evals[i] = scalar * self.r[j];
                evals[i - 1] = scalar - evals[i];
            }
        }
        evals
    }

    pub fn compute_factored_lens(ell: usize) -> (usize, usize) {
        (ell / 2, ell - ell / 2)
    }

    pub fn compute_factored_evals(&self) -> (Vec<F>, Vec<F>) {
        let ell = self.r.len();
        let (left_num_vars, _right_num_vars) = Self::compute_factored_lens(ell);

        let L = EqPolynomial::new(self.r[..left_num_vars].to_vec()).evals();
        let R = EqPolynomial::new(self.r[left_num_vars..ell].to_vec()).evals();

        (L, R)
    }
}

/// Multilinear extension of the identity map over bit vectors
pub struct IdentityPolynomial {
    size_point: usize,
}

impl IdentityPolynomial {
    pub fn new(size_point: usize) -> Self {
        IdentityPolynomial { size_point }
    }

    pub fn evaluate<F: PrimeField>(&self, r: &[F]) -> F {
        let len = r.len();
        assert_eq!(len, self.size_point);
        (0..len)
            .map(|i| F::from((len - i - 1).pow2() as u64) * r[i])
            .sum()
    }
}

/// Compute dot product of two vectors
pub fn compute_dotproduct<F: PrimeField>(a: &[F], b: &[F]) -> F {
    assert_eq!(a.len(), b.len());

    #[cfg(feature = "parallel")]
    {
        a.par_iter()
            .zip(b.par_iter())
            .map(|(a_i, b_i)| *a_i * *b_i)
            .sum()
    }

    #[cfg(not(feature = "parallel"))]
    {
        a.iter().zip(b.iter()).map(|(a_i, b_i)| *a_i * *b_i).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::{Fr, G1Projective};
    use ark_std::{test_rng, UniformRand};

    fn evaluate_with_lr(Z: &[Fr], r: &[Fr]) -> Fr {
        let eq = EqPolynomial::new(r.to_vec());
        let (L, R) = eq.compute_factored_evals();

        let ell = r.len();
        let (left_num_vars, _) = EqPolynomial::<Fr>::compute_factored_lens(ell);
        let L_size = left_num_vars.pow2();
        let R_size = Z.len() / L_size;

        // compute v = L * Z * R
        (0..L_size)
            .map(|i| {
                (0..R_size)
                    .map(|j| L[i] * Z[i * R_size + j] * R[j])
                    .sum::<Fr>()
            })
            .sum()
    }

    #[test]
    fn test_dense_polynomial_evaluate() {
        // Z = [1, 2, 3, 4]: f(0,0)=1, f(0,1)=2, f(1,0)=3, f(1,1)=4
        let Z = vec![
            Fr::from(1u64),
            Fr::from(2u64),
            Fr::from(3u64),
            Fr::from(4u64),
        ];
        let poly = DensePolynomial::new(Z);

        let r = vec![Fr::zero(), Fr::zero()];
        assert_eq!(poly.evaluate(&r), Fr::from(1u64));

        let r = vec![Fr::one(), Fr::one()];
        assert_eq!(poly.evaluate(&r), Fr::from(4u64));
    }

    #[test]
    fn test_evaluation_matches_factored_form() {
        let mut rng = test_rng();
        let ell = 6;
        let Z: Vec<Fr> = (0..ell.pow2()).map(|_| Fr::rand(&mut rng)).collect();
        let r: Vec<Fr> = (0..ell).map(|_| Fr::rand(&mut rng)).collect();

        let poly = DensePolynomial::new(Z.clone());
        assert_eq!(poly.evaluate(&r), evaluate_with_lr(&Z, &r));
    }

    #[test]
    fn test_bound_poly_var_top() {
        let Z = vec![
            Fr::from(1u64),
            Fr::from(2u64),
            Fr::from(3u64),
            Fr::from(4u64),
        ];
        let mut poly = DensePolynomial::new(Z);

        poly.bound_poly_var_top(&Fr::zero());
        assert_eq!(poly.len(), 2);
        assert_eq!(poly[0], Fr::from(1u64));
        assert_eq!(poly[1], Fr::from(2u64));
    }

    #[test]
    fn test_poly_commit_and_eval_proof() {
        let mut rng = test_rng();
        let ell = 4;
        let Z: Vec<Fr> = (0..ell.pow2()).map(|_| Fr::rand(&mut rng)).collect();
        let poly = DensePolynomial::new(Z);

        let gens = PolyCommitmentGens::<G1Projective>::new(ell, b"test-poly-commit");
        let mut random_tape = RandomTape::new(b"proof");
        let (comm, blinds) = poly.commit(&gens, Some(&mut random_tape));

        let r: Vec<Fr> = (0..ell).map(|_| Fr::rand(&mut rng)).collect();
        let eval = poly.evaluate(&r);

        let mut prover_transcript = Transcript::new(b"example");
        let (proof, C_Zr) = PolyEvalProof::prove(
            &poly,
            Some(&blinds),
            &r,
            &eval,
            None,
            &gens,
            &mut prover_transcript,
            &mut random_tape,
        );

        let mut verifier_transcript = Transcript::new(b"example");
        assert!(proof
            .verify(&gens, &mut verifier_transcript, &r, &C_Zr, &comm)
            .is_ok());
    }
}
