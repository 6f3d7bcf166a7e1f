//! Spartan: high-speed zkSNARKs without trusted setup
//!
//! This crate implements the Spartan proof system for R1CS over any curve
//! implementing arkworks' `CurveGroup`.
//!
//! # SNARK Mode
//! Use `SNARKGens`, `SNARK::encode`, `SNARK::prove`, and `SNARK::verify` for
//! succinct verification with preprocessing: the verifier works with a
//! commitment to the R1CS matrices rather than the matrices themselves.
//!
//! # NIZK Mode
//! Use `NIZKGens` and `NIZK` for proofs without preprocessing; the verifier
//! evaluates the R1CS matrices itself.

#![allow(non_snake_case)]
#![allow(clippy::too_many_arguments)]

pub mod commitments;
pub mod dense_mlpoly;
pub mod errors;
pub mod group;
pub mod math;
pub mod nizk;
pub mod product_tree;
pub mod r1cs;
pub mod r1csproof;
pub mod random;
pub mod snark;
pub mod sparse_mlpoly;
pub mod sumcheck;
pub mod timer;
pub mod transcript;
pub mod unipoly;

// Re-exports
pub use commitments::{Commitments, MultiCommitGens};
pub use dense_mlpoly::{DensePolynomial, EqPolynomial, PolyCommitmentGens};
pub use errors::{ProofVerifyError, R1CSError};
pub use group::{CompressedGroup, GroupElementExt};
pub use nizk::{
    DotProductProofGens, DotProductProofLog, EqualityProof, KnowledgeProof, ProductProof,
};
pub use r1cs::R1CSInstance;
pub use r1csproof::{R1CSGens, R1CSProof};
pub use random::RandomTape;
pub use snark::{
    Assignment, InputsAssignment, Instance, NIZKGens, SNARKGens, VarsAssignment, NIZK, SNARK,
};
pub use sumcheck::{SumcheckInstanceProof, ZKSumcheckInstanceProof};
pub use unipoly::{CompressedUniPoly, UniPoly};

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::CurveGroup;
    use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
    use merlin::Transcript;

    fn scalar_to_bytes<F: ark_ff::PrimeField>(s: &F) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        s.serialize_compressed(bytes.as_mut_slice()).unwrap();
        bytes
    }

    // produces a tiny R1CS instance over three constraints, five variables,
    // and two inputs:
    //   (z0 + z1) * i0 = z2
    //   (z0 + i1) * z2 = z3
    //         z4 * 1   = 0
    #[allow(clippy::type_complexity)]
    fn produce_tiny_r1cs<F: ark_ff::PrimeField>(
    ) -> (usize, usize, usize, usize, Instance<F>, VarsAssignment<F>, InputsAssignment<F>) {
        let num_cons = 3;
        let num_vars = 5;
        let num_inputs = 2;
        // max number of non-zero entries in any single matrix
        let num_non_zero_entries = 5;

        let one = scalar_to_bytes(&F::one());

        // columns 0..num_vars are variables, column num_vars is the constant
        // one, and columns num_vars + 1 + i are the inputs
        let mut A: Vec<(usize, usize, [u8; 32])> = Vec::new();
        let mut B: Vec<(usize, usize, [u8; 32])> = Vec::new();
        let mut C: Vec<(usize, usize, [u8; 32])> = Vec::new();

        // constraint 0: (z0 + z1) * i0 - z2 = 0
        A.push((0, 0, one));
        A.push((0, 1, one));
        B.push((0, num_vars + 1, one));
        C.push((0, 2, one));

        // constraint 1: (z0 + i1) * z2 - z3 = 0
        A.push((1, 0, one));
        A.push((1, num_vars + 2, one));
        B.push((1, 2, one));
        C.push((1, 3, one));

        // constraint 2: z4 * 1 - 0 = 0
        A.push((2, 4, one));
        B.push((2, num_vars, one));

        let inst = Instance::new(num_cons, num_vars, num_inputs, &A, &B, &C).unwrap();

        // compute a satisfying assignment
        let mut rng = ark_std::test_rng();
        let i0 = F::rand(&mut rng);
        let i1 = F::rand(&mut rng);
        let z0 = F::rand(&mut rng);
        let z1 = F::rand(&mut rng);
        let z2 = (z0 + z1) * i0;
        let z3 = (z0 + i1) * z2;
        let z4 = F::zero();

        let vars = VarsAssignment::from_scalars(vec![z0, z1, z2, z3, z4]);
        let inputs = InputsAssignment::from_scalars(vec![i0, i1]);
        assert!(inst.is_sat(&vars, &inputs).unwrap());

        (
            num_cons,
            num_vars,
            num_inputs,
            num_non_zero_entries,
            inst,
            vars,
            inputs,
        )
    }

    fn snark_end_to_end_helper<G: CurveGroup>() {
        let (num_cons, num_vars, num_inputs, num_non_zero_entries, inst, vars, inputs) =
            produce_tiny_r1cs::<G::ScalarField>();

        // produce public parameters
        let gens = SNARKGens::<G>::new(num_cons, num_vars, num_inputs, num_non_zero_entries);

        // create a commitment to the R1CS instance
        let (comm, decomm) = SNARK::encode(&inst, &gens);

        // produce a proof of satisfiability
        let mut prover_transcript = Transcript::new(b"snark_example");
        let proof = SNARK::prove(
            &inst,
            &comm,
            &decomm,
            vars,
            &inputs,
            &gens,
            &mut prover_transcript,
        );

        // verify the proof of satisfiability
        let mut verifier_transcript = Transcript::new(b"snark_example");
        assert!(proof
            .verify(&comm, &inputs, &mut verifier_transcript, &gens)
            .is_ok());
    }

    fn nizk_end_to_end_helper<G: CurveGroup>() {
        let (num_cons, num_vars, num_inputs, _num_non_zero_entries, inst, vars, inputs) =
            produce_tiny_r1cs::<G::ScalarField>();

        // produce public parameters
        let gens = NIZKGens::<G>::new(num_cons, num_vars, num_inputs);

        // produce a proof of satisfiability
        let mut prover_transcript = Transcript::new(b"nizk_example");
        let proof = NIZK::prove(&inst, vars, &inputs, &gens, &mut prover_transcript);

        // verify the proof of satisfiability
        let mut verifier_transcript = Transcript::new(b"nizk_example");
        assert!(proof
            .verify(&inst, &inputs, &mut verifier_transcript, &gens)
            .is_ok());
    }

    #[test]
    fn test_snark_bls12_381() {
        snark_end_to_end_helper::<ark_bls12_381::G1Projective>();
    }

    #[test]
    fn test_snark_curve25519() {
        snark_end_to_end_helper::<ark_curve25519::EdwardsProjective>();
    }

    #[test]
    fn test_nizk_bls12_381() {
        nizk_end_to_end_helper::<ark_bls12_381::G1Projective>();
    }

    #[test]
    fn test_nizk_curve25519() {
        nizk_end_to_end_helper::<ark_curve25519::EdwardsProjective>();
    }

    #[test]
    fn test_synthetic_r1cs_end_to_end() {
        type G = ark_bls12_381::G1Projective;

        let num_cons = 16;
        let num_vars = 16;
        let num_inputs = 2;
        let (inst, vars, inputs) =
            Instance::<ark_bls12_381::Fr>::produce_synthetic_r1cs(num_cons, num_vars, num_inputs);
        assert!(inst.is_sat(&vars, &inputs).unwrap());

        // SNARK
        let gens = SNARKGens::<G>::new(num_cons, num_vars, num_inputs, num_cons);
        let (comm, decomm) = SNARK::encode(&inst, &gens);
        let mut prover_transcript = Transcript::new(b"snark_example");
        let proof = SNARK::prove(
            &inst,
            &comm,
            &decomm,
            vars.clone(),
            &inputs,
            &gens,
            &mut prover_transcript,
        );
        let mut verifier_transcript = Transcript::new(b"snark_example");
        assert!(proof
            .verify(&comm, &inputs, &mut verifier_transcript, &gens)
            .is_ok());

        // NIZK
        let gens = NIZKGens::<G>::new(num_cons, num_vars, num_inputs);
        let mut prover_transcript = Transcript::new(b"nizk_example");
        let proof = NIZK::prove(&inst, vars, &inputs, &gens, &mut prover_transcript);
        let mut verifier_transcript = Transcript::new(b"nizk_example");
        assert!(proof
            .verify(&inst, &inputs, &mut verifier_transcript, &gens)
            .is_ok());
    }

    #[test]
    fn test_snark_serialization_roundtrip() {
        type G = ark_bls12_381::G1Projective;

        let (num_cons, num_vars, num_inputs, num_non_zero_entries, inst, vars, inputs) =
            produce_tiny_r1cs::<ark_bls12_381::Fr>();

        let gens = SNARKGens::<G>::new(num_cons, num_vars, num_inputs, num_non_zero_entries);
        let (comm, decomm) = SNARK::encode(&inst, &gens);

        let mut prover_transcript = Transcript::new(b"snark_example");
        let proof = SNARK::prove(
            &inst,
            &comm,
            &decomm,
            vars,
            &inputs,
            &gens,
            &mut prover_transcript,
        );

        let mut proof_encoded: Vec<u8> = Vec::new();
        proof.serialize_compressed(&mut proof_encoded).unwrap();

        // decoding and re-encoding must reproduce the exact bytes
        let proof_decoded =
            SNARK::<G>::deserialize_compressed(proof_encoded.as_slice()).unwrap();
        let mut proof_reencoded: Vec<u8> = Vec::new();
        proof_decoded
            .serialize_compressed(&mut proof_reencoded)
            .unwrap();
        assert_eq!(proof_encoded, proof_reencoded);

        // the decoded proof still verifies
        let mut verifier_transcript = Transcript::new(b"snark_example");
        assert!(proof_decoded
            .verify(&comm, &inputs, &mut verifier_transcript, &gens)
            .is_ok());
    }

    #[test]
    fn test_snark_rejects_corrupted_proof() {
        type G = ark_bls12_381::G1Projective;

        let (num_cons, num_vars, num_inputs, num_non_zero_entries, inst, vars, inputs) =
            produce_tiny_r1cs::<ark_bls12_381::Fr>();

        let gens = SNARKGens::<G>::new(num_cons, num_vars, num_inputs, num_non_zero_entries);
        let (comm, decomm) = SNARK::encode(&inst, &gens);

        let mut prover_transcript = Transcript::new(b"snark_example");
        let proof = SNARK::prove(
            &inst,
            &comm,
            &decomm,
            vars,
            &inputs,
            &gens,
            &mut prover_transcript,
        );

        let mut proof_encoded: Vec<u8> = Vec::new();
        proof.serialize_compressed(&mut proof_encoded).unwrap();

        // flip a bit in the last byte, inside a scalar or point encoding; the
        // corrupted proof must either fail to decode or fail to verify
        let last = proof_encoded.len() - 1;
        proof_encoded[last] ^= 0x01;
        match SNARK::<G>::deserialize_compressed(proof_encoded.as_slice()) {
            Err(_) => (),
            Ok(corrupted) => {
                let mut verifier_transcript = Transcript::new(b"snark_example");
                assert!(corrupted
                    .verify(&comm, &inputs, &mut verifier_transcript, &gens)
                    .is_err());
            }
        }
    }

    #[test]
    fn test_nizk_rejects_corrupted_proof() {
        type G = ark_bls12_381::G1Projective;

        let (num_cons, num_vars, num_inputs, _num_non_zero_entries, inst, vars, inputs) =
            produce_tiny_r1cs::<ark_bls12_381::Fr>();

        let gens = NIZKGens::<G>::new(num_cons, num_vars, num_inputs);

        let mut prover_transcript = Transcript::new(b"nizk_example");
        let proof = NIZK::prove(&inst, vars, &inputs, &gens, &mut prover_transcript);

        let mut proof_encoded: Vec<u8> = Vec::new();
        proof.serialize_compressed(&mut proof_encoded).unwrap();

        // flip a bit somewhere in the middle of the encoding; the corrupted
        // proof must either fail to decode or fail to verify
        let mid = proof_encoded.len() / 2;
        proof_encoded[mid] ^= 0x01;
        match NIZK::<G>::deserialize_compressed(proof_encoded.as_slice()) {
            Err(_) => (),
            Ok(corrupted) => {
                let mut verifier_transcript = Transcript::new(b"nizk_example");
                assert!(corrupted
                    .verify(&inst, &inputs, &mut verifier_transcript, &gens)
                    .is_err());
            }
        }
    }

    #[test]
    fn test_nizk_rejects_wrong_transcript_label() {
        type G = ark_bls12_381::G1Projective;

        let (num_cons, num_vars, num_inputs, _num_non_zero_entries, inst, vars, inputs) =
            produce_tiny_r1cs::<ark_bls12_381::Fr>();

        let gens = NIZKGens::<G>::new(num_cons, num_vars, num_inputs);

        let mut prover_transcript = Transcript::new(b"nizk_example");
        let proof = NIZK::prove(&inst, vars, &inputs, &gens, &mut prover_transcript);

        // a verifier seeding its transcript differently derives different
        // challenges and must reject
        let mut verifier_transcript = Transcript::new(b"nizk_example_other");
        assert!(proof
            .verify(&inst, &inputs, &mut verifier_transcript, &gens)
            .is_err());
    }
}
