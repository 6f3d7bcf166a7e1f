//! Public interface: `Instance` and `Assignment` wrappers that pad user-supplied
//! R1CS instances to the internal power-of-two shape, plus the `SNARK` and
//! `NIZK` proof systems built on top of them

use crate::errors::{ProofVerifyError, R1CSError};
use crate::r1cs::{R1CSCommitment, R1CSCommitmentGens, R1CSDecommitment, R1CSEvalProof, R1CSInstance};
use crate::r1csproof::{R1CSGens, R1CSProof};
use crate::random::RandomTape;
use crate::timer::Timer;
use crate::transcript::{AppendToTranscript, ProofTranscript};
use ark_ec::CurveGroup;
use ark_ff::PrimeField;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use core::cmp::max;
use merlin::Transcript;

/// `Assignment` holds an assignment of values to either the inputs or variables in an `Instance`
#[derive(Debug, Clone, CanonicalSerialize, CanonicalDeserialize)]
pub struct Assignment<F: PrimeField> {
    pub assignment: Vec<F>,
}

impl<F: PrimeField> Assignment<F> {
    /// Constructs a new `Assignment` from a slice of 32-byte little-endian
    /// scalar encodings; non-canonical encodings are rejected
    pub fn new(assignment: &[[u8; 32]]) -> Result<Assignment<F>, R1CSError> {
        let bytes_to_scalar = |vec: &[[u8; 32]]| -> Result<Vec<F>, R1CSError> {
            let mut vec_scalar: Vec<F> = Vec::new();
            for v in vec {
                let val = F::deserialize_compressed(v.as_slice())
                    .map_err(|_| R1CSError::InvalidScalar)?;
                vec_scalar.push(val);
            }
            Ok(vec_scalar)
        };

        let assignment_scalar = bytes_to_scalar(assignment)?;
        Ok(Assignment {
            assignment: assignment_scalar,
        })
    }

    /// Constructs a new `Assignment` from field elements directly
    pub fn from_scalars(assignment: Vec<F>) -> Self {
        Assignment { assignment }
    }

    /// pads Assignment to the specified length
    fn pad(&self, len: usize) -> VarsAssignment<F> {
        // check that the new length is higher than current length
        assert!(len > self.assignment.len());

        let mut padded_assignment = self.assignment.clone();
        padded_assignment.resize(len, F::zero());

        Assignment {
            assignment: padded_assignment,
        }
    }
}

/// `VarsAssignment` holds an assignment of values to variables in an `Instance`
pub type VarsAssignment<F> = Assignment<F>;

/// `InputsAssignment` holds an assignment of values to inputs in an `Instance`
pub type InputsAssignment<F> = Assignment<F>;

/// `Instance` holds the description of R1CS matrices
pub struct Instance<F: PrimeField> {
    inst: R1CSInstance<F>,
    digest: Vec<u8>,
}

impl<F: PrimeField> Instance<F> {
    /// Constructs a new `Instance` and an associated satisfying assignment
    pub fn new(
        num_cons: usize,
        num_vars: usize,
        num_inputs: usize,
        A: &[(usize, usize, [u8; 32])],
        B: &[(usize, usize, [u8; 32])],
        C: &[(usize, usize, [u8; 32])],
    ) -> Result<Instance<F>, R1CSError> {
        let (num_vars_padded, num_cons_padded) = {
            let num_vars_padded = {
                let mut num_vars_padded = max(num_vars, num_inputs + 1);
                if num_vars_padded != num_vars_padded.next_power_of_two() {
                    num_vars_padded = num_vars_padded.next_power_of_two();
                }
                num_vars_padded
            };

            let num_cons_padded = {
                // ensure that num_cons_padded is at least 2
                let mut num_cons_padded = max(num_cons, 2);
                if num_cons_padded != num_cons_padded.next_power_of_two() {
                    num_cons_padded = num_cons_padded.next_power_of_two();
                }
                num_cons_padded
            };

            (num_vars_padded, num_cons_padded)
        };

        let bytes_to_scalar =
            |tups: &[(usize, usize, [u8; 32])]| -> Result<Vec<(usize, usize, F)>, R1CSError> {
                let mut mat: Vec<(usize, usize, F)> = Vec::new();
                for &(row, col, val_bytes) in tups {
                    // row must be smaller than num_cons
                    if row >= num_cons {
                        return Err(R1CSError::InvalidIndex);
                    }

                    // col must be smaller than num_vars + 1 + num_inputs
                    if col >= num_vars + 1 + num_inputs {
                        return Err(R1CSError::InvalidIndex);
                    }

                    let val = F::deserialize_compressed(val_bytes.as_slice())
                        .map_err(|_| R1CSError::InvalidScalar)?;

                    // shift the column index of entries referring to the
                    // constant term or the inputs, so they land after the
                    // padded variable block
                    if col >= num_vars {
                        mat.push((row, col + num_vars_padded - num_vars, val));
                    } else {
                        mat.push((row, col, val));
                    }
                }

                // pad with additional constraints up until num_cons_padded
                // when the instance has zero or one constraints
                if num_cons == 0 || num_cons == 1 {
                    for i in tups.len()..num_cons_padded {
                        mat.push((i, num_vars, F::zero()));
                    }
                }

                Ok(mat)
            };

        let A_scalar = bytes_to_scalar(A)?;
        let B_scalar = bytes_to_scalar(B)?;
        let C_scalar = bytes_to_scalar(C)?;

        let inst = R1CSInstance::new(
            num_cons_padded,
            num_vars_padded,
            num_inputs,
            &A_scalar,
            &B_scalar,
            &C_scalar,
        );

        let digest = inst.get_digest();

        Ok(Instance { inst, digest })
    }

    /// Constructs a new synthetic R1CS `Instance` and an associated satisfying assignment
    pub fn produce_synthetic_r1cs(
        num_cons: usize,
        num_vars: usize,
        num_inputs: usize,
    ) -> (Instance<F>, VarsAssignment<F>, InputsAssignment<F>) {
        let (inst, vars, inputs) =
            R1CSInstance::produce_synthetic_r1cs(num_cons, num_vars, num_inputs);
        let digest = inst.get_digest();
        (
            Instance { inst, digest },
            Assignment { assignment: vars },
            Assignment { assignment: inputs },
        )
    }

    /// Checks if a given R1CSInstance is satisfiable with a given variables and inputs assignments
    pub fn is_sat(
        &self,
        vars: &VarsAssignment<F>,
        inputs: &InputsAssignment<F>,
    ) -> Result<bool, R1CSError> {
        if vars.assignment.len() > self.inst.get_num_vars() {
            return Err(R1CSError::InvalidNumberOfInputs);
        }

        if inputs.assignment.len() != self.inst.get_num_inputs() {
            return Err(R1CSError::InvalidNumberOfInputs);
        }

        // we might need to pad variables
        let padded_vars = {
            let num_padded_vars = self.inst.get_num_vars();
            let num_vars = vars.assignment.len();
            if num_padded_vars > num_vars {
                vars.pad(num_padded_vars)
            } else {
                vars.clone()
            }
        };

        Ok(self
            .inst
            .is_sat(&padded_vars.assignment, &inputs.assignment))
    }
}

/// `SNARKGens` holds public parameters for producing and verifying proofs with the Spartan SNARK
pub struct SNARKGens<G: CurveGroup> {
    gens_r1cs_sat: R1CSGens<G>,
    gens_r1cs_eval: R1CSCommitmentGens<G>,
}

impl<G: CurveGroup> SNARKGens<G> {
    /// Constructs a new `SNARKGens` given the size of the R1CS statement
    /// `num_nz_entries` specifies the maximum number of non-zero entries in
    /// any of the three R1CS matrices
    pub fn new(num_cons: usize, num_vars: usize, num_inputs: usize, num_nz_entries: usize) -> Self {
        let num_vars_padded = {
            let mut num_vars_padded = max(num_vars, num_inputs + 1);
            if num_vars_padded != num_vars_padded.next_power_of_two() {
                num_vars_padded = num_vars_padded.next_power_of_two();
            }
            num_vars_padded
        };
        let num_cons_padded = {
            let mut num_cons_padded = max(num_cons, 2);
            if num_cons_padded != num_cons_padded.next_power_of_two() {
                num_cons_padded = num_cons_padded.next_power_of_two();
            }
            num_cons_padded
        };

        let gens_r1cs_sat = R1CSGens::new(b"gens_r1cs_sat", num_cons_padded, num_vars_padded);
        let gens_r1cs_eval = R1CSCommitmentGens::new(
            b"gens_r1cs_eval",
            num_cons_padded,
            num_vars_padded,
            num_inputs,
            num_nz_entries,
        );
        SNARKGens {
            gens_r1cs_sat,
            gens_r1cs_eval,
        }
    }
}

/// `SNARK` holds a proof produced by Spartan SNARK
#[derive(Debug, Clone, CanonicalSerialize, CanonicalDeserialize)]
pub struct SNARK<G: CurveGroup> {
    r1cs_sat_proof: R1CSProof<G>,
    inst_evals: (G::ScalarField, G::ScalarField, G::ScalarField),
    r1cs_eval_proof: R1CSEvalProof<G>,
}

impl<G: CurveGroup> SNARK<G> {
    fn protocol_name() -> &'static [u8] {
        b"Spartan SNARK proof"
    }

    /// A public computation to create a commitment to an R1CS instance
    pub fn encode(
        inst: &Instance<G::ScalarField>,
        gens: &SNARKGens<G>,
    ) -> (R1CSCommitment<G>, R1CSDecommitment<G::ScalarField>) {
        let timer_encode = Timer::new("SNARK::encode");
        let (comm, decomm) = inst.inst.commit(&gens.gens_r1cs_eval);
        timer_encode.stop();
        (comm, decomm)
    }

    /// A method to produce a SNARK proof of the satisfiability of an R1CS instance
    pub fn prove(
        inst: &Instance<G::ScalarField>,
        comm: &R1CSCommitment<G>,
        decomm: &R1CSDecommitment<G::ScalarField>,
        vars: VarsAssignment<G::ScalarField>,
        inputs: &InputsAssignment<G::ScalarField>,
        gens: &SNARKGens<G>,
        transcript: &mut Transcript,
    ) -> Self {
        let timer_prove = Timer::new("SNARK::prove");

        // we create a Transcript object seeded with a random scalar
        // to aid the prover produce its randomness
        let mut random_tape = RandomTape::new(b"proof");

        transcript.append_protocol_name(SNARK::<G>::protocol_name());
        comm.append_to_transcript(b"comm", transcript);

        let (r1cs_sat_proof, rx, ry) = {
            // we might need to pad variables
            let padded_vars = {
                let num_padded_vars = inst.inst.get_num_vars();
                let num_vars = vars.assignment.len();
                if num_padded_vars > num_vars {
                    vars.pad(num_padded_vars)
                } else {
                    vars
                }
            };

            R1CSProof::prove(
                &inst.inst,
                padded_vars.assignment,
                &inputs.assignment,
                &gens.gens_r1cs_sat,
                transcript,
                &mut random_tape,
            )
        };

        // We send evaluations of A, B, C at r = (rx, ry) as claims
        // to enable the verifier complete the first sum-check
        let timer_eval = Timer::new("eval_sparse_polys");
        let inst_evals = {
            let (Ar, Br, Cr) = inst.inst.evaluate(&rx, &ry);
            transcript.append_scalar(b"Ar_claim", &Ar);
            transcript.append_scalar(b"Br_claim", &Br);
            transcript.append_scalar(b"Cr_claim", &Cr);
            (Ar, Br, Cr)
        };
        timer_eval.stop();

        let r1cs_eval_proof = R1CSEvalProof::prove(
            decomm,
            &rx,
            &ry,
            &inst_evals,
            &gens.gens_r1cs_eval,
            transcript,
            &mut random_tape,
        );

        timer_prove.stop();
        SNARK {
            r1cs_sat_proof,
            inst_evals,
            r1cs_eval_proof,
        }
    }

    /// A method to verify the SNARK proof of the satisfiability of an R1CS instance
    pub fn verify(
        &self,
        comm: &R1CSCommitment<G>,
        input: &InputsAssignment<G::ScalarField>,
        transcript: &mut Transcript,
        gens: &SNARKGens<G>,
    ) -> Result<(), ProofVerifyError> {
        let timer_verify = Timer::new("SNARK::verify");
        transcript.append_protocol_name(SNARK::<G>::protocol_name());

        // append a commitment to the computation to the transcript
        comm.append_to_transcript(b"comm", transcript);

        let timer_sat_proof = Timer::new("verify_sat_proof");
        assert_eq!(input.assignment.len(), comm.get_num_inputs());
        let (rx, ry) = self.r1cs_sat_proof.verify(
            comm.get_num_vars(),
            comm.get_num_cons(),
            &input.assignment,
            &self.inst_evals,
            transcript,
            &gens.gens_r1cs_sat,
        )?;
        timer_sat_proof.stop();

        let timer_eval_proof = Timer::new("verify_eval_proof");
        let (Ar, Br, Cr) = &self.inst_evals;
        transcript.append_scalar(b"Ar_claim", Ar);
        transcript.append_scalar(b"Br_claim", Br);
        transcript.append_scalar(b"Cr_claim", Cr);
        self.r1cs_eval_proof.verify(
            comm,
            &rx,
            &ry,
            &self.inst_evals,
            &gens.gens_r1cs_eval,
            transcript,
        )?;
        timer_eval_proof.stop();

        timer_verify.stop();
        Ok(())
    }
}

/// `NIZKGens` holds public parameters for producing and verifying proofs with the Spartan NIZK
pub struct NIZKGens<G: CurveGroup> {
    gens_r1cs_sat: R1CSGens<G>,
}

impl<G: CurveGroup> NIZKGens<G> {
    /// Constructs a new `NIZKGens` given the size of the R1CS statement
    pub fn new(num_cons: usize, num_vars: usize, num_inputs: usize) -> Self {
        let num_vars_padded = {
            let mut num_vars_padded = max(num_vars, num_inputs + 1);
            if num_vars_padded != num_vars_padded.next_power_of_two() {
                num_vars_padded = num_vars_padded.next_power_of_two();
            }
            num_vars_padded
        };

        let gens_r1cs_sat = R1CSGens::new(b"gens_r1cs_sat", num_cons, num_vars_padded);
        NIZKGens { gens_r1cs_sat }
    }
}

/// `NIZK` holds a proof produced by Spartan NIZK
#[derive(Debug, Clone, CanonicalSerialize, CanonicalDeserialize)]
pub struct NIZK<G: CurveGroup> {
    r1cs_sat_proof: R1CSProof<G>,
    r: (Vec<G::ScalarField>, Vec<G::ScalarField>),
}

impl<G: CurveGroup> NIZK<G> {
    fn protocol_name() -> &'static [u8] {
        b"Spartan NIZK proof"
    }

    /// A method to produce a NIZK proof of the satisfiability of an R1CS instance
    pub fn prove(
        inst: &Instance<G::ScalarField>,
        vars: VarsAssignment<G::ScalarField>,
        input: &InputsAssignment<G::ScalarField>,
        gens: &NIZKGens<G>,
        transcript: &mut Transcript,
    ) -> Self {
        let timer_prove = Timer::new("NIZK::prove");

        // we create a Transcript object seeded with a random scalar
        // to aid the prover produce its randomness
        let mut random_tape = RandomTape::new(b"proof");

        transcript.append_protocol_name(NIZK::<G>::protocol_name());
        transcript.append_message(b"R1CSInstanceDigest", &inst.digest);

        let (r1cs_sat_proof, rx, ry) = {
            // we might need to pad variables
            let padded_vars = {
                let num_padded_vars = inst.inst.get_num_vars();
                let num_vars = vars.assignment.len();
                if num_padded_vars > num_vars {
                    vars.pad(num_padded_vars)
                } else {
                    vars
                }
            };

            R1CSProof::prove(
                &inst.inst,
                padded_vars.assignment,
                &input.assignment,
                &gens.gens_r1cs_sat,
                transcript,
                &mut random_tape,
            )
        };

        timer_prove.stop();
        NIZK {
            r1cs_sat_proof,
            r: (rx, ry),
        }
    }

    /// A method to verify a NIZK proof of the satisfiability of an R1CS instance
    pub fn verify(
        &self,
        inst: &Instance<G::ScalarField>,
        input: &InputsAssignment<G::ScalarField>,
        transcript: &mut Transcript,
        gens: &NIZKGens<G>,
    ) -> Result<(), ProofVerifyError> {
        let timer_verify = Timer::new("NIZK::verify");

        transcript.append_protocol_name(NIZK::<G>::protocol_name());
        transcript.append_message(b"R1CSInstanceDigest", &inst.digest);

        // We send evaluations of A, B, C at r = (rx, ry) as claims
        // to enable the verifier complete the first sum-check
        let timer_eval = Timer::new("eval_sparse_polys");
        let (claimed_rx, claimed_ry) = &self.r;
        let inst_evals = inst.inst.evaluate(claimed_rx, claimed_ry);
        timer_eval.stop();

        let timer_sat_proof = Timer::new("verify_sat_proof");
        assert_eq!(input.assignment.len(), inst.inst.get_num_inputs());
        let (rx, ry) = self.r1cs_sat_proof.verify(
            inst.inst.get_num_vars(),
            inst.inst.get_num_cons(),
            &input.assignment,
            &inst_evals,
            transcript,
            &gens.gens_r1cs_sat,
        )?;

        // verify if claimed randomness is correct
        if rx != *claimed_rx || ry != *claimed_ry {
            return Err(ProofVerifyError::InternalError);
        }
        timer_sat_proof.stop();

        timer_verify.stop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::{Fr as F, G1Projective};
    use ark_ff::{One, Zero};

    fn scalar_to_bytes(s: &F) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        s.serialize_compressed(bytes.as_mut_slice()).unwrap();
        bytes
    }

    // a single constraint: (z0) * (z0) = (z0), over one input fixed to z0
    fn tiny_instance() -> (
        usize,
        usize,
        usize,
        Vec<(usize, usize, [u8; 32])>,
        Vec<(usize, usize, [u8; 32])>,
        Vec<(usize, usize, [u8; 32])>,
        VarsAssignment<F>,
        InputsAssignment<F>,
    ) {
        let num_cons = 1;
        let num_vars = 1;
        let num_inputs = 1;

        let one = scalar_to_bytes(&F::one());
        let A = vec![(0, 0, one)];
        let B = vec![(0, 0, one)];
        let C = vec![(0, num_vars + 1, one)];

        // witness z0 = 1 together with the input 1 satisfies z0 * z0 = i0
        let vars = VarsAssignment::from_scalars(vec![F::one()]);
        let inputs = InputsAssignment::from_scalars(vec![F::one()]);

        (num_cons, num_vars, num_inputs, A, B, C, vars, inputs)
    }

    #[test]
    fn test_padded_constraints() {
        let (num_cons, num_vars, num_inputs, A, B, C, assignment_vars, assignment_inputs) =
            tiny_instance();

        let inst =
            Instance::<F>::new(num_cons, num_vars, num_inputs, &A, &B, &C).unwrap();
        assert!(inst.is_sat(&assignment_vars, &assignment_inputs).unwrap());

        // SNARK public params
        let gens = SNARKGens::<G1Projective>::new(num_cons, num_vars, num_inputs, A.len());

        // create a commitment to the R1CS instance
        let (comm, decomm) = SNARK::encode(&inst, &gens);

        // produce a SNARK
        let mut prover_transcript = Transcript::new(b"snark_example");
        let proof = SNARK::prove(
            &inst,
            &comm,
            &decomm,
            assignment_vars.clone(),
            &assignment_inputs,
            &gens,
            &mut prover_transcript,
        );

        // verify the SNARK
        let mut verifier_transcript = Transcript::new(b"snark_example");
        assert!(proof
            .verify(&comm, &assignment_inputs, &mut verifier_transcript, &gens)
            .is_ok());

        // NIZK public params
        let gens = NIZKGens::<G1Projective>::new(num_cons, num_vars, num_inputs);

        // produce a NIZK
        let mut prover_transcript = Transcript::new(b"nizk_example");
        let proof = NIZK::prove(
            &inst,
            assignment_vars,
            &assignment_inputs,
            &gens,
            &mut prover_transcript,
        );

        // verify the NIZK
        let mut verifier_transcript = Transcript::new(b"nizk_example");
        assert!(proof
            .verify(&inst, &assignment_inputs, &mut verifier_transcript, &gens)
            .is_ok());
    }

    #[test]
    fn test_rejects_invalid_index() {
        let num_cons = 1;
        let num_vars = 1;
        let num_inputs = 1;

        let one = scalar_to_bytes(&F::one());
        // row index out of range
        let A = vec![(1, 0, one)];
        let B = vec![(0, 0, one)];
        let C = vec![(0, 2, one)];

        let res = Instance::<F>::new(num_cons, num_vars, num_inputs, &A, &B, &C);
        assert!(matches!(res, Err(R1CSError::InvalidIndex)));
    }

    #[test]
    fn test_rejects_invalid_scalar() {
        let num_cons = 1;
        let num_vars = 1;
        let num_inputs = 1;

        let one = scalar_to_bytes(&F::one());
        // a value that is not a canonical field-element encoding
        let larger_than_mod = [0xFF; 32];
        let A = vec![(0, 0, larger_than_mod)];
        let B = vec![(0, 0, one)];
        let C = vec![(0, 2, one)];

        let res = Instance::<F>::new(num_cons, num_vars, num_inputs, &A, &B, &C);
        assert!(matches!(res, Err(R1CSError::InvalidScalar)));
    }

    #[test]
    fn test_is_sat_rejects_bad_witness() {
        let (num_cons, num_vars, num_inputs, A, B, C, _vars, inputs) = tiny_instance();

        let inst =
            Instance::<F>::new(num_cons, num_vars, num_inputs, &A, &B, &C).unwrap();

        // z0 = 0 does not satisfy z0 * z0 = 1
        let bad_vars = VarsAssignment::from_scalars(vec![F::zero()]);
        assert!(!inst.is_sat(&bad_vars, &inputs).unwrap());
    }
}
