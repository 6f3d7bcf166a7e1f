//! Proves satisfiability of an R1CS instance with two sum-check instances
//! and a commitment to the witness

#![allow(clippy::too_many_arguments)]

use crate::commitments::{Commitments, MultiCommitGens};
use crate::dense_mlpoly::{
    DensePolynomial, EqPolynomial, PolyCommitment, PolyCommitmentBlinds, PolyCommitmentGens,
    PolyEvalProof,
};
use crate::errors::ProofVerifyError;
use crate::group::GroupElementExt;
use crate::math::Math;
use crate::nizk::{EqualityProof, KnowledgeProof, ProductProof};
use crate::r1cs::R1CSInstance;
use crate::random::RandomTape;
use crate::sparse_mlpoly::{SparsePolyEntry, SparsePolynomial};
use crate::sumcheck::ZKSumcheckInstanceProof;
use crate::timer::Timer;
use crate::transcript::{AppendToTranscript, ProofTranscript};
use ark_ec::CurveGroup;
use ark_ff::{One, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use merlin::Transcript;

pub struct R1CSSumcheckGens<G: CurveGroup> {
    gens_1: MultiCommitGens<G>,
    gens_3: MultiCommitGens<G>,
    gens_4: MultiCommitGens<G>,
}

impl<G: CurveGroup> R1CSSumcheckGens<G> {
    // gens_1 must be provided by the caller so the sum-check claims live in
    // the same commitment space as the polynomial commitment
    pub fn new(label: &'static [u8], gens_1_ref: &MultiCommitGens<G>) -> Self {
        let gens_1 = gens_1_ref.clone();
        let gens_3 = MultiCommitGens::new(3, label);
        let gens_4 = MultiCommitGens::new(4, label);

        R1CSSumcheckGens {
            gens_1,
            gens_3,
            gens_4,
        }
    }
}

pub struct R1CSGens<G: CurveGroup> {
    gens_sc: R1CSSumcheckGens<G>,
    gens_pc: PolyCommitmentGens<G>,
}

impl<G: CurveGroup> R1CSGens<G> {
    pub fn new(label: &'static [u8], _num_cons: usize, num_vars: usize) -> Self {
        let num_poly_vars = num_vars.log_2();
        let gens_pc = PolyCommitmentGens::new(num_poly_vars, label);
        let gens_sc = R1CSSumcheckGens::new(label, &gens_pc.gens.gens_1);
        R1CSGens { gens_sc, gens_pc }
    }
}

#[derive(Debug, Clone, CanonicalSerialize, CanonicalDeserialize)]
pub struct R1CSProof<G: CurveGroup> {
    comm_vars: PolyCommitment<G>,
    sc_proof_phase1: ZKSumcheckInstanceProof<G>,
    claims_phase2: (G, G, G, G),
    pok_claims_phase2: (KnowledgeProof<G>, ProductProof<G>),
    proof_eq_sc_phase1: EqualityProof<G>,
    sc_proof_phase2: ZKSumcheckInstanceProof<G>,
    comm_vars_at_ry: G,
    proof_eval_vars_at_ry: PolyEvalProof<G>,
    proof_eq_sc_phase2: EqualityProof<G>,
}

impl<G: CurveGroup> R1CSProof<G> {
    fn protocol_name() -> &'static [u8] {
        b"R1CS proof"
    }

    pub fn prove(
        inst: &R1CSInstance<G::ScalarField>,
        vars: Vec<G::ScalarField>,
        input: &[G::ScalarField],
        gens: &R1CSGens<G>,
        transcript: &mut Transcript,
        random_tape: &mut RandomTape<G::ScalarField>,
    ) -> (R1CSProof<G>, Vec<G::ScalarField>, Vec<G::ScalarField>) {
        let timer_prove = Timer::new("R1CSProof::prove");
        transcript.append_protocol_name(R1CSProof::<G>::protocol_name());

        // we require the number of public inputs plus one (for the constant
        // term) to fit in the variable space
        assert!(input.len() < vars.len());

        transcript.append_scalars(b"input", input);

        let timer_commit = Timer::new("polycommit");
        let (poly_vars, comm_vars, blinds_vars) = {
            // create a multilinear polynomial using the supplied assignment for variables
            let poly_vars = DensePolynomial::new(vars.clone());

            // produce a commitment to the satisfying assignment
            let (comm_vars, blinds_vars): (PolyCommitment<G>, PolyCommitmentBlinds<_>) =
                poly_vars.commit(&gens.gens_pc, Some(random_tape));

            // add the commitment to the prover's transcript
            comm_vars.append_to_transcript(b"poly_commitment", transcript);
            (poly_vars, comm_vars, blinds_vars)
        };
        timer_commit.stop();

        let timer_sc_proof_phase1 = Timer::new("prove_sc_phase_one");

        // append input to variables to create a single vector z
        let z = {
            let num_inputs = input.len();
            let num_vars = vars.len();
            let mut z = vars;
            z.push(G::ScalarField::one()); // add constant term in z
            z.extend(input);
            z.resize(2 * num_vars, G::ScalarField::zero()); // pad with zeros
            assert!(num_inputs < num_vars);
            z
        };

        // derive the verifier's challenge tau
        let (num_rounds_x, num_rounds_y) = (inst.get_num_cons().log_2(), z.len().log_2());
        let tau: Vec<G::ScalarField> = transcript.challenge_vector(b"challenge_tau", num_rounds_x);

        // compute the initial evaluation table for R(\tau, x)
        let mut poly_tau = DensePolynomial::new(EqPolynomial::new(tau).evals());
        let (mut poly_Az, mut poly_Bz, mut poly_Cz) =
            inst.multiply_vec(inst.get_num_cons(), z.len(), &z);

        let comb_func = |poly_A_comp: &G::ScalarField,
                         poly_B_comp: &G::ScalarField,
                         poly_C_comp: &G::ScalarField,
                         poly_D_comp: &G::ScalarField|
         -> G::ScalarField { *poly_A_comp * (*poly_B_comp * *poly_C_comp - *poly_D_comp) };
        let (sc_proof_phase1, rx, _claims_phase1, blind_claim_postsc1) =
            ZKSumcheckInstanceProof::prove_cubic_with_additive_term(
                &G::ScalarField::zero(), // claim is zero
                &G::ScalarField::zero(), // blind for claim is also zero
                num_rounds_x,
                &mut poly_tau,
                &mut poly_Az,
                &mut poly_Bz,
                &mut poly_Cz,
                comb_func,
                &gens.gens_sc.gens_1,
                &gens.gens_sc.gens_4,
                transcript,
                random_tape,
            );
        assert_eq!(poly_tau.len(), 1);
        assert_eq!(poly_Az.len(), 1);
        assert_eq!(poly_Bz.len(), 1);
        assert_eq!(poly_Cz.len(), 1);
        timer_sc_proof_phase1.stop();

        let (tau_claim, Az_claim, Bz_claim, Cz_claim) =
            (&poly_tau[0], &poly_Az[0], &poly_Bz[0], &poly_Cz[0]);
        let (Az_blind, Bz_blind, Cz_blind, prod_Az_Bz_blind) = (
            random_tape.random_scalar(b"Az_blind"),
            random_tape.random_scalar(b"Bz_blind"),
            random_tape.random_scalar(b"Cz_blind"),
            random_tape.random_scalar(b"prod_Az_Bz_blind"),
        );

        let (pok_Cz_claim, comm_Cz_claim) = KnowledgeProof::prove(
            &gens.gens_sc.gens_1,
            transcript,
            random_tape,
            Cz_claim,
            &Cz_blind,
        );

        let (proof_prod, comm_Az_claim, comm_Bz_claim, comm_prod_Az_Bz_claims) = {
            let prod = *Az_claim * *Bz_claim;
            ProductProof::prove(
                &gens.gens_sc.gens_1,
                transcript,
                random_tape,
                Az_claim,
                &Az_blind,
                Bz_claim,
                &Bz_blind,
                &prod,
                &prod_Az_Bz_blind,
            )
        };

        transcript.append_point(b"comm_Az_claim", &comm_Az_claim.compress());
        transcript.append_point(b"comm_Bz_claim", &comm_Bz_claim.compress());
        transcript.append_point(b"comm_Cz_claim", &comm_Cz_claim.compress());
        transcript.append_point(b"comm_prod_Az_Bz_claims", &comm_prod_Az_Bz_claims.compress());

        // prove the final step of sum-check #1; the proof is derived from the
        // blinds of the claims
        let taus_bound_rx = tau_claim;
        let blind_expected_claim_postsc1 = *taus_bound_rx * (prod_Az_Bz_blind - Cz_blind);
        let claim_post_phase1 = (*Az_claim * *Bz_claim - *Cz_claim) * *taus_bound_rx;
        let (proof_eq_sc_phase1, _C1, _C2) = EqualityProof::prove(
            &gens.gens_sc.gens_1,
            transcript,
            random_tape,
            &claim_post_phase1,
            &blind_expected_claim_postsc1,
            &claim_post_phase1,
            &blind_claim_postsc1,
        );

        let timer_sc_proof_phase2 = Timer::new("prove_sc_phase_two");
        // combine the three claims into a single claim
        let r_A: G::ScalarField = transcript.challenge_scalar(b"challenge_Az");
        let r_B: G::ScalarField = transcript.challenge_scalar(b"challenge_Bz");
        let r_C: G::ScalarField = transcript.challenge_scalar(b"challenge_Cz");
        let claim_phase2 = r_A * *Az_claim + r_B * *Bz_claim + r_C * *Cz_claim;
        let blind_claim_phase2 = r_A * Az_blind + r_B * Bz_blind + r_C * Cz_blind;

        let evals_ABC = {
            // compute the initial evaluation table for R(\tau, x)
            let evals_rx = EqPolynomial::new(rx.clone()).evals();
            let (evals_A, evals_B, evals_C) =
                inst.compute_eval_table_sparse(inst.get_num_cons(), z.len(), &evals_rx);

            assert_eq!(evals_A.len(), evals_B.len());
            assert_eq!(evals_A.len(), evals_C.len());
            (0..evals_A.len())
                .map(|i| r_A * evals_A[i] + r_B * evals_B[i] + r_C * evals_C[i])
                .collect::<Vec<G::ScalarField>>()
        };

        // another instance of the sum-check protocol
        let comb_func2 = |poly_A_comp: &G::ScalarField,
                          poly_B_comp: &G::ScalarField|
         -> G::ScalarField { *poly_A_comp * *poly_B_comp };
        let (sc_proof_phase2, ry, claims_phase2, blind_claim_postsc2) =
            ZKSumcheckInstanceProof::prove_quad(
                &claim_phase2,
                &blind_claim_phase2,
                num_rounds_y,
                &mut DensePolynomial::new(z),
                &mut DensePolynomial::new(evals_ABC),
                comb_func2,
                &gens.gens_sc.gens_1,
                &gens.gens_sc.gens_3,
                transcript,
                random_tape,
            );
        timer_sc_proof_phase2.stop();

        let timer_polyeval = Timer::new("polyeval");
        let eval_vars_at_ry = poly_vars.evaluate(&ry[1..]);
        let blind_eval = random_tape.random_scalar(b"blind_eval");
        let (proof_eval_vars_at_ry, comm_vars_at_ry) = PolyEvalProof::prove(
            &poly_vars,
            Some(&blinds_vars),
            &ry[1..],
            &eval_vars_at_ry,
            Some(&blind_eval),
            &gens.gens_pc,
            transcript,
            random_tape,
        );
        timer_polyeval.stop();

        // prove the final step of sum-check #2
        let blind_eval_Z_at_ry = (G::ScalarField::one() - ry[0]) * blind_eval;
        let blind_expected_claim_postsc2 = claims_phase2[1] * blind_eval_Z_at_ry;
        let claim_post_phase2 = claims_phase2[0] * claims_phase2[1];
        let (proof_eq_sc_phase2, _C1, _C2) = EqualityProof::prove(
            &gens.gens_pc.gens.gens_1,
            transcript,
            random_tape,
            &claim_post_phase2,
            &blind_expected_claim_postsc2,
            &claim_post_phase2,
            &blind_claim_postsc2,
        );

        timer_prove.stop();

        (
            R1CSProof {
                comm_vars,
                sc_proof_phase1,
                claims_phase2: (
                    comm_Az_claim,
                    comm_Bz_claim,
                    comm_Cz_claim,
                    comm_prod_Az_Bz_claims,
                ),
                pok_claims_phase2: (pok_Cz_claim, proof_prod),
                proof_eq_sc_phase1,
                sc_proof_phase2,
                comm_vars_at_ry,
                proof_eval_vars_at_ry,
                proof_eq_sc_phase2,
            },
            rx,
            ry,
        )
    }

    pub fn verify(
        &self,
        num_vars: usize,
        num_cons: usize,
        input: &[G::ScalarField],
        evals: &(G::ScalarField, G::ScalarField, G::ScalarField),
        transcript: &mut Transcript,
        gens: &R1CSGens<G>,
    ) -> Result<(Vec<G::ScalarField>, Vec<G::ScalarField>), ProofVerifyError> {
        transcript.append_protocol_name(R1CSProof::<G>::protocol_name());

        transcript.append_scalars(b"input", input);

        let n = num_vars;
        // add the commitment to the verifier's transcript
        self.comm_vars
            .append_to_transcript(b"poly_commitment", transcript);

        let (num_rounds_x, num_rounds_y) = (num_cons.log_2(), (2 * num_vars).log_2());

        // derive the verifier's challenge tau
        let tau: Vec<G::ScalarField> = transcript.challenge_vector(b"challenge_tau", num_rounds_x);

        // verify the first sum-check instance
        let claim_phase1 =
            G::ScalarField::zero().commit(&G::ScalarField::zero(), &gens.gens_sc.gens_1);
        let (comm_claim_post_phase1, rx) = self.sc_proof_phase1.verify(
            &claim_phase1,
            num_rounds_x,
            3,
            &gens.gens_sc.gens_1,
            &gens.gens_sc.gens_4,
            transcript,
        )?;

        // perform the intermediate sum-check test with claimed Az, Bz, and Cz
        let (comm_Az_claim, comm_Bz_claim, comm_Cz_claim, comm_prod_Az_Bz_claims) =
            &self.claims_phase2;
        let (pok_Cz_claim, proof_prod) = &self.pok_claims_phase2;

        pok_Cz_claim.verify(&gens.gens_sc.gens_1, transcript, comm_Cz_claim)?;
        proof_prod.verify(
            &gens.gens_sc.gens_1,
            transcript,
            comm_Az_claim,
            comm_Bz_claim,
            comm_prod_Az_Bz_claims,
        )?;

        transcript.append_point(b"comm_Az_claim", &comm_Az_claim.compress());
        transcript.append_point(b"comm_Bz_claim", &comm_Bz_claim.compress());
        transcript.append_point(b"comm_Cz_claim", &comm_Cz_claim.compress());
        transcript.append_point(b"comm_prod_Az_Bz_claims", &comm_prod_Az_Bz_claims.compress());

        let taus_bound_rx: G::ScalarField = (0..rx.len())
            .map(|i| {
                rx[i] * tau[i]
                    + (G::ScalarField::one() - rx[i]) * (G::ScalarField::one() - tau[i])
            })
            .product();
        let expected_claim_post_phase1 =
            (*comm_prod_Az_Bz_claims - *comm_Cz_claim) * taus_bound_rx;

        // verify proof that expected_claim_post_phase1 == claim_post_phase1
        self.proof_eq_sc_phase1.verify(
            &gens.gens_sc.gens_1,
            transcript,
            &expected_claim_post_phase1,
            &comm_claim_post_phase1,
        )?;

        // derive three public challenges and then derive a joint claim
        let r_A: G::ScalarField = transcript.challenge_scalar(b"challenge_Az");
        let r_B: G::ScalarField = transcript.challenge_scalar(b"challenge_Bz");
        let r_C: G::ScalarField = transcript.challenge_scalar(b"challenge_Cz");

        // r_A * comm_Az_claim + r_B * comm_Bz_claim + r_C * comm_Cz_claim
        let comm_claim_phase2 = G::vartime_multiscalar_mul(
            &[r_A, r_B, r_C],
            &[*comm_Az_claim, *comm_Bz_claim, *comm_Cz_claim],
        );

        // verify the joint claim with a sum-check protocol
        let (comm_claim_post_phase2, ry) = self.sc_proof_phase2.verify(
            &comm_claim_phase2,
            num_rounds_y,
            2,
            &gens.gens_sc.gens_1,
            &gens.gens_sc.gens_3,
            transcript,
        )?;

        // verify Z(ry) proof against the initial commitment
        self.proof_eval_vars_at_ry.verify(
            &gens.gens_pc,
            transcript,
            &ry[1..],
            &self.comm_vars_at_ry,
            &self.comm_vars,
        )?;

        let poly_input_eval = {
            // constant term
            let mut input_as_sparse_poly_entries =
                vec![SparsePolyEntry::new(0, G::ScalarField::one())];
            // remaining inputs
            input_as_sparse_poly_entries.extend(
                (0..input.len()).map(|i| SparsePolyEntry::new(i + 1, input[i])),
            );
            SparsePolynomial::new(n.log_2(), input_as_sparse_poly_entries).evaluate(&ry[1..])
        };

        // compute commitment to eval_Z_at_ry = (1 - ry[0]) * self.eval_vars_at_ry + ry[0] * poly_input_eval
        let comm_eval_Z_at_ry = G::vartime_multiscalar_mul(
            &[G::ScalarField::one() - ry[0], ry[0]],
            &[
                self.comm_vars_at_ry,
                poly_input_eval.commit(&G::ScalarField::zero(), &gens.gens_pc.gens.gens_1),
            ],
        );

        // perform the final check in the second sum-check protocol
        let (eval_A_r, eval_B_r, eval_C_r) = evals;
        let expected_claim_post_phase2 =
            comm_eval_Z_at_ry * (r_A * *eval_A_r + r_B * *eval_B_r + r_C * *eval_C_r);

        // verify proof that expected_claim_post_phase2 == claim_post_phase2
        self.proof_eq_sc_phase2.verify(
            &gens.gens_sc.gens_1,
            transcript,
            &expected_claim_post_phase2,
            &comm_claim_post_phase2,
        )?;

        Ok((rx, ry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::{Fr, G1Projective};

    fn produce_tiny_r1cs() -> (R1CSInstance<Fr>, Vec<Fr>, Vec<Fr>) {
        // three constraints over eight variables and two inputs
        // (z0 + z1) * i0 - z2 = 0
        // (z0 + i1) * z2 - z3 = 0
        // z4 * 1 - 0 = 0
        let num_cons = 4;
        let num_vars = 8;
        let num_inputs = 2;

        let one = Fr::one();
        let mut A: Vec<(usize, usize, Fr)> = Vec::new();
        let mut B: Vec<(usize, usize, Fr)> = Vec::new();
        let mut C: Vec<(usize, usize, Fr)> = Vec::new();

        A.push((0, 0, one));
        A.push((0, 1, one));
        B.push((0, num_vars + 1, one));
        C.push((0, 2, one));

        A.push((1, 0, one));
        A.push((1, num_vars + 2, one));
        B.push((1, 2, one));
        C.push((1, 3, one));

        A.push((2, 4, one));
        B.push((2, num_vars, one));

        let inst = R1CSInstance::new(num_cons, num_vars, num_inputs, &A, &B, &C);

        // compute a satisfying assignment
        let i0 = Fr::from(5u64);
        let i1 = Fr::from(7u64);
        let z0 = Fr::from(9u64);
        let z1 = Fr::from(2u64);
        let z2 = (z0 + z1) * i0;
        let z3 = (z0 + i1) * z2;
        let z4 = Fr::zero();

        let mut vars = vec![Fr::zero(); num_vars];
        vars[0] = z0;
        vars[1] = z1;
        vars[2] = z2;
        vars[3] = z3;
        vars[4] = z4;
        let input = vec![i0, i1];
        assert!(inst.is_sat(&vars, &input));

        (inst, vars, input)
    }

    #[test]
    fn test_r1cs_proof() {
        let (inst, vars, input) = produce_tiny_r1cs();

        let gens =
            R1CSGens::<G1Projective>::new(b"test-m", inst.get_num_cons(), inst.get_num_vars());

        let mut random_tape = RandomTape::new(b"proof");
        let mut prover_transcript = Transcript::new(b"example");
        let (proof, rx, ry) = R1CSProof::prove(
            &inst,
            vars,
            &input,
            &gens,
            &mut prover_transcript,
            &mut random_tape,
        );

        let inst_evals = inst.evaluate(&rx, &ry);

        let mut verifier_transcript = Transcript::new(b"example");
        assert!(proof
            .verify(
                inst.get_num_vars(),
                inst.get_num_cons(),
                &input,
                &inst_evals,
                &mut verifier_transcript,
                &gens,
            )
            .is_ok());
    }
}
