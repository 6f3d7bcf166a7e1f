//! Sumcheck protocol, in a transparent and a zero-knowledge variant
//!
//! The non-ZK variant sends compressed round polynomials in the clear. The ZK
//! variant sends Pedersen commitments to the round polynomials and proves the
//! two per-round claims (consistency with the running claim and with the next
//! round's evaluation) with a batched dot-product proof.

#![allow(clippy::too_many_arguments)]

use crate::commitments::{Commitments, MultiCommitGens};
use crate::dense_mlpoly::DensePolynomial;
use crate::errors::ProofVerifyError;
use crate::group::GroupElementExt;
use crate::nizk::DotProductProof;
use crate::random::RandomTape;
use crate::transcript::{AppendToTranscript, ProofTranscript};
use crate::unipoly::{CompressedUniPoly, UniPoly};
use ark_ec::CurveGroup;
use ark_ff::{One, PrimeField, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use merlin::Transcript;

/// Sumcheck proof for a single instance
#[derive(Debug, Clone, CanonicalSerialize, CanonicalDeserialize)]
pub struct SumcheckInstanceProof<F: PrimeField> {
    pub compressed_polys: Vec<CompressedUniPoly<F>>,
}

impl<F: PrimeField> SumcheckInstanceProof<F> {
    pub fn new(compressed_polys: Vec<CompressedUniPoly<F>>) -> Self {
        SumcheckInstanceProof { compressed_polys }
    }

    /// Verify the sumcheck proof, returning the final claim and the challenges
    pub fn verify(
        &self,
        claim: F,
        num_rounds: usize,
        degree_bound: usize,
        transcript: &mut Transcript,
    ) -> Result<(F, Vec<F>), ProofVerifyError> {
        let mut e = claim;
        let mut r: Vec<F> = Vec::new();

        // verify that there is a univariate polynomial for each round
        if self.compressed_polys.len() != num_rounds {
            return Err(ProofVerifyError::VerificationFailed(
                "wrong number of rounds".to_string(),
            ));
        }

        for i in 0..self.compressed_polys.len() {
            let poly = self.compressed_polys[i].decompress(&e);

            // verify degree bound
            if poly.degree() != degree_bound {
                return Err(ProofVerifyError::VerificationFailed(format!(
                    "degree mismatch at round {}: expected {}, got {}",
                    i,
                    degree_bound,
                    poly.degree()
                )));
            }

            // check if G_k(0) + G_k(1) = e
            if poly.eval_at_zero() + poly.eval_at_one() != e {
                return Err(ProofVerifyError::SumcheckError(i));
            }

            // append the prover's message to the transcript
            poly.append_to_transcript(b"poly", transcript);

            // derive the verifier's challenge for the next round
            let r_i: F = transcript.challenge_scalar(b"challenge_nextround");

            r.push(r_i);

            // evaluate the claimed degree-ell polynomial at r_i
            e = poly.evaluate(&r_i);
        }

        Ok((e, r))
    }

    /// Prove sumcheck for a product of three multilinear polynomials
    pub fn prove_cubic<C>(
        claim: &F,
        num_rounds: usize,
        poly_A: &mut DensePolynomial<F>,
        poly_B: &mut DensePolynomial<F>,
        poly_C: &mut DensePolynomial<F>,
        comb_func: C,
        transcript: &mut Transcript,
    ) -> (Self, Vec<F>, Vec<F>)
    where
        C: Fn(&F, &F, &F) -> F,
    {
        let mut e = *claim;
        let mut r: Vec<F> = Vec::new();
        let mut cubic_polys: Vec<CompressedUniPoly<F>> = Vec::new();

        for _j in 0..num_rounds {
            let mut eval_point_0 = F::zero();
            let mut eval_point_2 = F::zero();
            let mut eval_point_3 = F::zero();

            let len = poly_A.len() / 2;
            for i in 0..len {
                // eval 0: bound_func is A(low)
                eval_point_0 += comb_func(&poly_A[i], &poly_B[i], &poly_C[i]);

                // eval 2: bound_func is -A(low) + 2*A(high)
                let poly_A_bound_point = poly_A[len + i] + poly_A[len + i] - poly_A[i];
                let poly_B_bound_point = poly_B[len + i] + poly_B[len + i] - poly_B[i];
                let poly_C_bound_point = poly_C[len + i] + poly_C[len + i] - poly_C[i];
                eval_point_2 += comb_func(
                    &poly_A_bound_point,
                    &poly_B_bound_point,
                    &poly_C_bound_point,
                );

                // eval 3: bound_func is -2A(low) + 3A(high)
                let poly_A_bound_point = poly_A_bound_point + poly_A[len + i] - poly_A[i];
                let poly_B_bound_point = poly_B_bound_point + poly_B[len + i] - poly_B[i];
                let poly_C_bound_point = poly_C_bound_point + poly_C[len + i] - poly_C[i];

                eval_point_3 += comb_func(
                    &poly_A_bound_point,
                    &poly_B_bound_point,
                    &poly_C_bound_point,
                );
            }

            let evals = vec![eval_point_0, e - eval_point_0, eval_point_2, eval_point_3];
            let poly = UniPoly::from_evals(&evals);

            // append the prover's message to the transcript
            poly.append_to_transcript(b"poly", transcript);

            // derive the verifier's challenge for the next round
            let r_j: F = transcript.challenge_scalar(b"challenge_nextround");
            r.push(r_j);

            // bound all tables to the verifier's challenge
            poly_A.bound_poly_var_top(&r_j);
            poly_B.bound_poly_var_top(&r_j);
            poly_C.bound_poly_var_top(&r_j);

            e = poly.evaluate(&r_j);
            cubic_polys.push(poly.compress());
        }

        (
            SumcheckInstanceProof::new(cubic_polys),
            r,
            vec![poly_A[0], poly_B[0], poly_C[0]],
        )
    }

    /// Prove a batch of cubic sumcheck instances combined with random
    /// coefficients. The "par" instances share the third polynomial; the
    /// "seq" instances each carry their own.
    pub fn prove_cubic_batched<C>(
        claim: &F,
        num_rounds: usize,
        poly_vec_par: (
            &mut Vec<&mut DensePolynomial<F>>,
            &mut Vec<&mut DensePolynomial<F>>,
            &mut DensePolynomial<F>,
        ),
        poly_vec_seq: (
            &mut Vec<&mut DensePolynomial<F>>,
            &mut Vec<&mut DensePolynomial<F>>,
            &mut Vec<&mut DensePolynomial<F>>,
        ),
        coeffs: &[F],
        comb_func: C,
        transcript: &mut Transcript,
    ) -> (Self, Vec<F>, (Vec<F>, Vec<F>, F), (Vec<F>, Vec<F>, Vec<F>))
    where
        C: Fn(&F, &F, &F) -> F,
    {
        let (poly_A_vec_par, poly_B_vec_par, poly_C_par) = poly_vec_par;
        let (poly_A_vec_seq, poly_B_vec_seq, poly_C_vec_seq) = poly_vec_seq;

        let mut e = *claim;
        let mut r: Vec<F> = Vec::new();
        let mut cubic_polys: Vec<CompressedUniPoly<F>> = Vec::new();

        for _j in 0..num_rounds {
            let mut evals: Vec<(F, F, F)> = Vec::new();

            for (poly_A, poly_B) in poly_A_vec_par.iter().zip(poly_B_vec_par.iter()) {
                let mut eval_point_0 = F::zero();
                let mut eval_point_2 = F::zero();
                let mut eval_point_3 = F::zero();

                let len = poly_A.len() / 2;
                for i in 0..len {
                    // eval 0: bound_func is A(low)
                    eval_point_0 += comb_func(&poly_A[i], &poly_B[i], &poly_C_par[i]);

                    // eval 2: bound_func is -A(low) + 2*A(high)
                    let poly_A_bound_point = poly_A[len + i] + poly_A[len + i] - poly_A[i];
                    let poly_B_bound_point = poly_B[len + i] + poly_B[len + i] - poly_B[i];
                    let poly_C_bound_point =
                        poly_C_par[len + i] + poly_C_par[len + i] - poly_C_par[i];
                    eval_point_2 += comb_func(
                        &poly_A_bound_point,
                        &poly_B_bound_point,
                        &poly_C_bound_point,
                    );

                    // eval 3: bound_func is -2A(low) + 3A(high)
                    let poly_A_bound_point = poly_A_bound_point + poly_A[len + i] - poly_A[i];
                    let poly_B_bound_point = poly_B_bound_point + poly_B[len + i] - poly_B[i];
                    let poly_C_bound_point =
                        poly_C_bound_point + poly_C_par[len + i] - poly_C_par[i];

                    eval_point_3 += comb_func(
                        &poly_A_bound_point,
                        &poly_B_bound_point,
                        &poly_C_bound_point,
                    );
                }

                evals.push((eval_point_0, eval_point_2, eval_point_3));
            }

            for i in 0..poly_A_vec_seq.len() {
                let poly_A = &poly_A_vec_seq[i];
                let poly_B = &poly_B_vec_seq[i];
                let poly_C = &poly_C_vec_seq[i];

                let mut eval_point_0 = F::zero();
                let mut eval_point_2 = F::zero();
                let mut eval_point_3 = F::zero();
                let len = poly_A.len() / 2;
                for j in 0..len {
                    eval_point_0 += comb_func(&poly_A[j], &poly_B[j], &poly_C[j]);
                    let poly_A_bound_point = poly_A[len + j] + poly_A[len + j] - poly_A[j];
                    let poly_B_bound_point = poly_B[len + j] + poly_B[len + j] - poly_B[j];
                    let poly_C_bound_point = poly_C[len + j] + poly_C[len + j] - poly_C[j];
                    eval_point_2 += comb_func(
                        &poly_A_bound_point,
                        &poly_B_bound_point,
                        &poly_C_bound_point,
                    );
                    let poly_A_bound_point = poly_A_bound_point + poly_A[len + j] - poly_A[j];
                    let poly_B_bound_point = poly_B_bound_point + poly_B[len + j] - poly_B[j];
                    let poly_C_bound_point = poly_C_bound_point + poly_C[len + j] - poly_C[j];
                    eval_point_3 += comb_func(
                        &poly_A_bound_point,
                        &poly_B_bound_point,
                        &poly_C_bound_point,
                    );
                }
                evals.push((eval_point_0, eval_point_2, eval_point_3));
            }

            let evals_combined_0: F = (0..evals.len()).map(|i| evals[i].0 * coeffs[i]).sum();
            let evals_combined_2: F = (0..evals.len()).map(|i| evals[i].1 * coeffs[i]).sum();
            let evals_combined_3: F = (0..evals.len()).map(|i| evals[i].2 * coeffs[i]).sum();

            let evals = vec![
                evals_combined_0,
                e - evals_combined_0,
                evals_combined_2,
                evals_combined_3,
            ];
            let poly = UniPoly::from_evals(&evals);

            // append the prover's message to the transcript
            poly.append_to_transcript(b"poly", transcript);

            // derive the verifier's challenge for the next round
            let r_j: F = transcript.challenge_scalar(b"challenge_nextround");
            r.push(r_j);

            // bound all tables to the verifier's challenge
            for (poly_A, poly_B) in poly_A_vec_par.iter_mut().zip(poly_B_vec_par.iter_mut()) {
                poly_A.bound_poly_var_top(&r_j);
                poly_B.bound_poly_var_top(&r_j);
            }
            poly_C_par.bound_poly_var_top(&r_j);

            for i in 0..poly_A_vec_seq.len() {
                poly_A_vec_seq[i].bound_poly_var_top(&r_j);
                poly_B_vec_seq[i].bound_poly_var_top(&r_j);
                poly_C_vec_seq[i].bound_poly_var_top(&r_j);
            }

            e = poly.evaluate(&r_j);
            cubic_polys.push(poly.compress());
        }

        let poly_A_par_final = (0..poly_A_vec_par.len())
            .map(|i| poly_A_vec_par[i][0])
            .collect();
        let poly_B_par_final = (0..poly_B_vec_par.len())
            .map(|i| poly_B_vec_par[i][0])
            .collect();
        let claims_prod = (poly_A_par_final, poly_B_par_final, poly_C_par[0]);

        let poly_A_seq_final = (0..poly_A_vec_seq.len())
            .map(|i| poly_A_vec_seq[i][0])
            .collect();
        let poly_B_seq_final = (0..poly_B_vec_seq.len())
            .map(|i| poly_B_vec_seq[i][0])
            .collect();
        let poly_C_seq_final = (0..poly_C_vec_seq.len())
            .map(|i| poly_C_vec_seq[i][0])
            .collect();
        let claims_dotp = (poly_A_seq_final, poly_B_seq_final, poly_C_seq_final);

        (
            SumcheckInstanceProof::new(cubic_polys),
            r,
            claims_prod,
            claims_dotp,
        )
    }
}

/// Zero-knowledge sumcheck: round polynomials and running claims only ever
/// appear inside Pedersen commitments
#[derive(Debug, Clone, CanonicalSerialize, CanonicalDeserialize)]
pub struct ZKSumcheckInstanceProof<G: CurveGroup> {
    pub comm_polys: Vec<G>,
    pub comm_evals: Vec<G>,
    pub proofs: Vec<DotProductProof<G>>,
}

impl<G: CurveGroup> ZKSumcheckInstanceProof<G> {
    pub fn new(
        comm_polys: Vec<G>,
        comm_evals: Vec<G>,
        proofs: Vec<DotProductProof<G>>,
    ) -> Self {
        ZKSumcheckInstanceProof {
            comm_polys,
            comm_evals,
            proofs,
        }
    }

    /// For each round, checks under homomorphic commitments that
    /// poly(0) + poly(1) equals the running claim and poly(r_j) equals the
    /// next round's claim, batched into one dot-product proof.
    pub fn verify(
        &self,
        comm_claim: &G,
        num_rounds: usize,
        degree_bound: usize,
        gens_1: &MultiCommitGens<G>,
        gens_n: &MultiCommitGens<G>,
        transcript: &mut Transcript,
    ) -> Result<(G, Vec<G::ScalarField>), ProofVerifyError> {
        // verify that there is a univariate polynomial for each round
        if self.comm_polys.len() != num_rounds
            || self.comm_evals.len() != num_rounds
            || self.proofs.len() != num_rounds
        {
            return Err(ProofVerifyError::VerificationFailed(
                "wrong number of rounds".to_string(),
            ));
        }

        let mut comm_claim_per_round = *comm_claim;
        let mut r: Vec<G::ScalarField> = Vec::new();

        for i in 0..self.comm_polys.len() {
            self.comm_polys[i]
                .compress()
                .append_to_transcript(b"comm_poly", transcript);

            // derive the verifier's challenge for the next round
            let r_i: G::ScalarField = transcript.challenge_scalar(b"challenge_nextround");

            // absorb the two claims, same order as the prover
            comm_claim_per_round
                .compress()
                .append_to_transcript(b"comm_claim_per_round", transcript);
            self.comm_evals[i]
                .compress()
                .append_to_transcript(b"comm_eval", transcript);

            // produce two weights
            let w: Vec<G::ScalarField> =
                transcript.challenge_vector(b"combine_two_claims_to_one", 2);

            // commitment to the weighted sum of the two claims
            let comm_target =
                G::vartime_multiscalar_mul(&w, &[comm_claim_per_round, self.comm_evals[i]]);

            // a = w[0] * a_sc + w[1] * a_eval, where
            //   a_sc   = [2, 1, 1, ...]      decommits poly(0) + poly(1)
            //   a_eval = [1, r_i, r_i^2, ...] decommits poly(r_i)
            let a = {
                let a_sc = {
                    let mut a = vec![G::ScalarField::one(); degree_bound + 1];
                    a[0] += G::ScalarField::one();
                    a
                };

                let a_eval = {
                    let mut a = vec![G::ScalarField::one(); degree_bound + 1];
                    for j in 1..a.len() {
                        a[j] = a[j - 1] * r_i;
                    }
                    a
                };

                assert_eq!(a_sc.len(), a_eval.len());
                (0..a_sc.len())
                    .map(|j| w[0] * a_sc[j] + w[1] * a_eval[j])
                    .collect::<Vec<G::ScalarField>>()
            };

            self.proofs[i].verify(
                gens_1,
                gens_n,
                transcript,
                &a,
                &self.comm_polys[i],
                &comm_target,
            )?;

            comm_claim_per_round = self.comm_evals[i];
            r.push(r_i);
        }

        Ok((self.comm_evals[self.comm_evals.len() - 1], r))
    }

    /// Prove a cubic sumcheck with an additive term, eq * (A * B - C)
    pub fn prove_cubic_with_additive_term<C>(
        claim: &G::ScalarField,
        blind_claim: &G::ScalarField,
        num_rounds: usize,
        poly_tau: &mut DensePolynomial<G::ScalarField>,
        poly_Az: &mut DensePolynomial<G::ScalarField>,
        poly_Bz: &mut DensePolynomial<G::ScalarField>,
        poly_Cz: &mut DensePolynomial<G::ScalarField>,
        comb_func: C,
        gens_1: &MultiCommitGens<G>,
        gens_n: &MultiCommitGens<G>,
        transcript: &mut Transcript,
        random_tape: &mut RandomTape<G::ScalarField>,
    ) -> (Self, Vec<G::ScalarField>, Vec<G::ScalarField>, G::ScalarField)
    where
        C: Fn(&G::ScalarField, &G::ScalarField, &G::ScalarField, &G::ScalarField) -> G::ScalarField,
    {
        let blinds_poly = random_tape.random_vector(b"blinds_poly", num_rounds);
        let blinds_evals = random_tape.random_vector(b"blinds_evals", num_rounds);

        let mut claim_per_round = *claim;
        let mut comm_claim_per_round = claim_per_round.commit(blind_claim, gens_1);

        let mut r: Vec<G::ScalarField> = Vec::new();
        let mut comm_polys: Vec<G> = Vec::new();
        let mut comm_evals: Vec<G> = Vec::new();
        let mut proofs: Vec<DotProductProof<G>> = Vec::new();

        for j in 0..num_rounds {
            let (poly, comm_poly) = {
                let mut eval_point_0 = G::ScalarField::zero();
                let mut eval_point_2 = G::ScalarField::zero();
                let mut eval_point_3 = G::ScalarField::zero();

                let len = poly_tau.len() / 2;
                for i in 0..len {
                    // eval 0: bound_func is poly(low)
                    eval_point_0 +=
                        comb_func(&poly_tau[i], &poly_Az[i], &poly_Bz[i], &poly_Cz[i]);

                    // eval 2: bound_func is -poly(low) + 2*poly(high)
                    let poly_tau_bound = poly_tau[len + i] + poly_tau[len + i] - poly_tau[i];
                    let poly_Az_bound = poly_Az[len + i] + poly_Az[len + i] - poly_Az[i];
                    let poly_Bz_bound = poly_Bz[len + i] + poly_Bz[len + i] - poly_Bz[i];
                    let poly_Cz_bound = poly_Cz[len + i] + poly_Cz[len + i] - poly_Cz[i];
                    eval_point_2 += comb_func(
                        &poly_tau_bound,
                        &poly_Az_bound,
                        &poly_Bz_bound,
                        &poly_Cz_bound,
                    );

                    // eval 3: bound_func is -2*poly(low) + 3*poly(high)
                    let poly_tau_bound = poly_tau_bound + poly_tau[len + i] - poly_tau[i];
                    let poly_Az_bound = poly_Az_bound + poly_Az[len + i] - poly_Az[i];
                    let poly_Bz_bound = poly_Bz_bound + poly_Bz[len + i] - poly_Bz[i];
                    let poly_Cz_bound = poly_Cz_bound + poly_Cz[len + i] - poly_Cz[i];

                    eval_point_3 += comb_func(
                        &poly_tau_bound,
                        &poly_Az_bound,
                        &poly_Bz_bound,
                        &poly_Cz_bound,
                    );
                }

                let evals = vec![
                    eval_point_0,
                    claim_per_round - eval_point_0,
                    eval_point_2,
                    eval_point_3,
                ];
                let poly = UniPoly::from_evals(&evals);
                let comm_poly = poly.commit(gens_n, &blinds_poly[j]);
                (poly, comm_poly)
            };

            // append the prover's message to the transcript
            comm_poly
                .compress()
                .append_to_transcript(b"comm_poly", transcript);
            comm_polys.push(comm_poly);

            // derive the verifier's challenge for the next round
            let r_j: G::ScalarField = transcript.challenge_scalar(b"challenge_nextround");

            // bound all tables to the verifier's challenge
            poly_tau.bound_poly_var_top(&r_j);
            poly_Az.bound_poly_var_top(&r_j);
            poly_Bz.bound_poly_var_top(&r_j);
            poly_Cz.bound_poly_var_top(&r_j);

            // produce a proof of sum-check and of evaluation
            let (proof, claim_next_round, comm_claim_next_round) = {
                let eval = poly.evaluate(&r_j);
                let comm_eval = eval.commit(&blinds_evals[j], gens_1);

                // under homomorphic commitments we prove
                // (1) <poly_coeffs, [2, 1, 1, ...]> = claim_per_round
                // (2) <poly_coeffs, [1, r_j, r_j^2, ...]> = eval
                // batched with random weights

                comm_claim_per_round
                    .compress()
                    .append_to_transcript(b"comm_claim_per_round", transcript);
                comm_eval
                    .compress()
                    .append_to_transcript(b"comm_eval", transcript);

                // produce two weights
                let w: Vec<G::ScalarField> =
                    transcript.challenge_vector(b"combine_two_claims_to_one", 2);

                // compute a weighted sum of the RHS
                let target = w[0] * claim_per_round + w[1] * eval;
                let comm_target =
                    G::vartime_multiscalar_mul(&w, &[comm_claim_per_round, comm_eval]);

                let blind = {
                    let blind_sc = if j == 0 {
                        blind_claim
                    } else {
                        &blinds_evals[j - 1]
                    };
                    let blind_eval = &blinds_evals[j];
                    w[0] * *blind_sc + w[1] * *blind_eval
                };
                debug_assert_eq!(target.commit(&blind, gens_1), comm_target);

                let a = {
                    let a_sc = {
                        let mut a = vec![G::ScalarField::one(); poly.degree() + 1];
                        a[0] += G::ScalarField::one();
                        a
                    };

                    let a_eval = {
                        let mut a = vec![G::ScalarField::one(); poly.degree() + 1];
                        for k in 1..a.len() {
                            a[k] = a[k - 1] * r_j;
                        }
                        a
                    };

                    assert_eq!(a_sc.len(), a_eval.len());
                    (0..a_sc.len())
                        .map(|k| w[0] * a_sc[k] + w[1] * a_eval[k])
                        .collect::<Vec<G::ScalarField>>()
                };

                let (proof, _comm_poly, _comm_sc_eval) = DotProductProof::prove(
                    gens_1,
                    gens_n,
                    transcript,
                    random_tape,
                    &poly.as_vec(),
                    &blinds_poly[j],
                    &a,
                    &target,
                    &blind,
                );

                (proof, eval, comm_eval)
            };

            proofs.push(proof);
            claim_per_round = claim_next_round;
            comm_claim_per_round = comm_claim_next_round;
            r.push(r_j);
            comm_evals.push(comm_claim_per_round);
        }

        (
            ZKSumcheckInstanceProof::new(comm_polys, comm_evals, proofs),
            r,
            vec![poly_tau[0], poly_Az[0], poly_Bz[0], poly_Cz[0]],
            blinds_evals[num_rounds - 1],
        )
    }

    /// Prove a quadratic sumcheck, A * B
    pub fn prove_quad<C>(
        claim: &G::ScalarField,
        blind_claim: &G::ScalarField,
        num_rounds: usize,
        poly_A: &mut DensePolynomial<G::ScalarField>,
        poly_B: &mut DensePolynomial<G::ScalarField>,
        comb_func: C,
        gens_1: &MultiCommitGens<G>,
        gens_n: &MultiCommitGens<G>,
        transcript: &mut Transcript,
        random_tape: &mut RandomTape<G::ScalarField>,
    ) -> (Self, Vec<G::ScalarField>, Vec<G::ScalarField>, G::ScalarField)
    where
        C: Fn(&G::ScalarField, &G::ScalarField) -> G::ScalarField,
    {
        let blinds_poly = random_tape.random_vector(b"blinds_poly", num_rounds);
        let blinds_evals = random_tape.random_vector(b"blinds_evals", num_rounds);

        let mut claim_per_round = *claim;
        let mut comm_claim_per_round = claim_per_round.commit(blind_claim, gens_1);

        let mut r: Vec<G::ScalarField> = Vec::new();
        let mut comm_polys: Vec<G> = Vec::new();
        let mut comm_evals: Vec<G> = Vec::new();
        let mut proofs: Vec<DotProductProof<G>> = Vec::new();

        for j in 0..num_rounds {
            let (poly, comm_poly) = {
                let mut eval_point_0 = G::ScalarField::zero();
                let mut eval_point_2 = G::ScalarField::zero();

                let len = poly_A.len() / 2;
                for i in 0..len {
                    // eval 0
                    eval_point_0 += comb_func(&poly_A[i], &poly_B[i]);

                    // eval 2
                    let poly_A_bound = poly_A[len + i] + poly_A[len + i] - poly_A[i];
                    let poly_B_bound = poly_B[len + i] + poly_B[len + i] - poly_B[i];
                    eval_point_2 += comb_func(&poly_A_bound, &poly_B_bound);
                }

                let evals = vec![eval_point_0, claim_per_round - eval_point_0, eval_point_2];
                let poly = UniPoly::from_evals(&evals);
                let comm_poly = poly.commit(gens_n, &blinds_poly[j]);
                (poly, comm_poly)
            };

            // append the prover's message to the transcript
            comm_poly
                .compress()
                .append_to_transcript(b"comm_poly", transcript);
            comm_polys.push(comm_poly);

            // derive the verifier's challenge for the next round
            let r_j: G::ScalarField = transcript.challenge_scalar(b"challenge_nextround");

            // bound tables to the verifier's challenge
            poly_A.bound_poly_var_top(&r_j);
            poly_B.bound_poly_var_top(&r_j);

            // produce a proof of sum-check and of evaluation
            let (proof, claim_next_round, comm_claim_next_round) = {
                let eval = poly.evaluate(&r_j);
                let comm_eval = eval.commit(&blinds_evals[j], gens_1);

                comm_claim_per_round
                    .compress()
                    .append_to_transcript(b"comm_claim_per_round", transcript);
                comm_eval
                    .compress()
                    .append_to_transcript(b"comm_eval", transcript);

                // produce two weights
                let w: Vec<G::ScalarField> =
                    transcript.challenge_vector(b"combine_two_claims_to_one", 2);

                // compute a weighted sum of the RHS
                let target = w[0] * claim_per_round + w[1] * eval;
                let comm_target =
                    G::vartime_multiscalar_mul(&w, &[comm_claim_per_round, comm_eval]);

                let blind = {
                    let blind_sc = if j == 0 {
                        blind_claim
                    } else {
                        &blinds_evals[j - 1]
                    };
                    let blind_eval = &blinds_evals[j];
                    w[0] * *blind_sc + w[1] * *blind_eval
                };
                debug_assert_eq!(target.commit(&blind, gens_1), comm_target);

                let a = {
                    let a_sc = {
                        let mut a = vec![G::ScalarField::one(); poly.degree() + 1];
                        a[0] += G::ScalarField::one();
                        a
                    };

                    let a_eval = {
                        let mut a = vec![G::ScalarField::one(); poly.degree() + 1];
                        for k in 1..a.len() {
                            a[k] = a[k - 1] * r_j;
                        }
                        a
                    };

                    assert_eq!(a_sc.len(), a_eval.len());
                    (0..a_sc.len())
                        .map(|k| w[0] * a_sc[k] + w[1] * a_eval[k])
                        .collect::<Vec<G::ScalarField>>()
                };

                let (proof, _comm_poly, _comm_sc_eval) = DotProductProof::prove(
                    gens_1,
                    gens_n,
                    transcript,
                    random_tape,
                    &poly.as_vec(),
                    &blinds_poly[j],
                    &a,
                    &target,
                    &blind,
                );

                (proof, eval, comm_eval)
            };

            proofs.push(proof);
            claim_per_round = claim_next_round;
            comm_claim_per_round = comm_claim_next_round;
            r.push(r_j);
            comm_evals.push(comm_claim_per_round);
        }

        (
            ZKSumcheckInstanceProof::new(comm_polys, comm_evals, proofs),
            r,
            vec![poly_A[0], poly_B[0]],
            blinds_evals[num_rounds - 1],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::Fr;

    #[test]
    fn test_sumcheck_cubic() {
        let mut poly_A = DensePolynomial::new(vec![
            Fr::from(1u64),
            Fr::from(2u64),
            Fr::from(3u64),
            Fr::from(4u64),
        ]);
        let mut poly_B = DensePolynomial::new(vec![Fr::from(1u64); 4]);
        let mut poly_C = DensePolynomial::new(vec![Fr::from(1u64); 4]);

        let claim: Fr = (0..4).map(|i| poly_A[i] * poly_B[i] * poly_C[i]).sum();

        let comb_func = |a: &Fr, b: &Fr, c: &Fr| *a * *b * *c;

        let mut transcript = Transcript::new(b"test");
        let (proof, _r, _claims) = SumcheckInstanceProof::prove_cubic(
            &claim,
            2,
            &mut poly_A,
            &mut poly_B,
            &mut poly_C,
            comb_func,
            &mut transcript,
        );

        let mut verifier_transcript = Transcript::new(b"test");
        let (final_claim, r) = proof.verify(claim, 2, 3, &mut verifier_transcript).unwrap();

        // the final claim matches the polynomials bound at r
        let mut poly_A2 = DensePolynomial::new(vec![
            Fr::from(1u64),
            Fr::from(2u64),
            Fr::from(3u64),
            Fr::from(4u64),
        ]);
        poly_A2.bound_poly_var_top(&r[0]);
        poly_A2.bound_poly_var_top(&r[1]);
        assert_eq!(final_claim, poly_A2[0]);
    }

    #[test]
    fn test_sumcheck_rejects_wrong_claim() {
        let mut poly_A = DensePolynomial::new(vec![
            Fr::from(5u64),
            Fr::from(6u64),
            Fr::from(7u64),
            Fr::from(8u64),
        ]);
        let mut poly_B = DensePolynomial::new(vec![Fr::from(1u64); 4]);
        let mut poly_C = DensePolynomial::new(vec![Fr::from(1u64); 4]);

        let claim: Fr = (0..4).map(|i| poly_A[i] * poly_B[i] * poly_C[i]).sum();
        let comb_func = |a: &Fr, b: &Fr, c: &Fr| *a * *b * *c;

        let mut transcript = Transcript::new(b"test");
        let (proof, _r, _claims) = SumcheckInstanceProof::prove_cubic(
            &claim,
            2,
            &mut poly_A,
            &mut poly_B,
            &mut poly_C,
            comb_func,
            &mut transcript,
        );

        let mut verifier_transcript = Transcript::new(b"test");
        assert!(proof
            .verify(claim + Fr::from(1u64), 2, 3, &mut verifier_transcript)
            .is_err());
    }
}
