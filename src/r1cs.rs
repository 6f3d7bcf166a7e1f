//! R1CS instances and commitments to them

#![allow(clippy::too_many_arguments)]

use crate::dense_mlpoly::DensePolynomial;
use crate::errors::ProofVerifyError;
use crate::math::Math;
use crate::random::RandomTape;
use crate::sparse_mlpoly::{
    MultiSparseMatPolynomialAsDense, SparseMatEntry, SparseMatPolyCommitment,
    SparseMatPolyCommitmentGens, SparseMatPolyEvalProof, SparseMatPolynomial,
};
use crate::timer::Timer;
use crate::transcript::AppendToTranscript;
use ark_ec::CurveGroup;
use ark_ff::PrimeField;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use flate2::{write::ZlibEncoder, Compression};
use merlin::Transcript;
use rand::rngs::OsRng;

/// `R1CSInstance` holds the three sparse matrices of a rank-1 constraint
/// system, with power-of-2 dimensions
#[derive(Debug, Clone, CanonicalSerialize, CanonicalDeserialize)]
pub struct R1CSInstance<F: PrimeField> {
    num_cons: usize,
    num_vars: usize,
    num_inputs: usize,
    A: SparseMatPolynomial<F>,
    B: SparseMatPolynomial<F>,
    C: SparseMatPolynomial<F>,
}

impl<F: PrimeField> R1CSInstance<F> {
    pub fn new(
        num_cons: usize,
        num_vars: usize,
        num_inputs: usize,
        A: &[(usize, usize, F)],
        B: &[(usize, usize, F)],
        C: &[(usize, usize, F)],
    ) -> Self {
        Timer::print(&format!("number_of_constraints {num_cons}"));
        Timer::print(&format!("number_of_variables {num_vars}"));
        Timer::print(&format!("number_of_inputs {num_inputs}"));
        Timer::print(&format!("number_non-zero_entries_A {}", A.len()));
        Timer::print(&format!("number_non-zero_entries_B {}", B.len()));
        Timer::print(&format!("number_non-zero_entries_C {}", C.len()));

        // matrices are dimensioned as num_cons x (2 * num_vars), so we
        // require num_cons and num_vars to be powers of 2
        assert_eq!(num_cons.next_power_of_two(), num_cons);
        assert_eq!(num_vars.next_power_of_two(), num_vars);

        // the number of inputs plus the constant term must fit in the second
        // half of the z vector
        assert!(num_inputs < num_vars);

        let num_poly_vars_x = num_cons.log_2();
        let num_poly_vars_y = (2 * num_vars).log_2();

        let mat_A = A
            .iter()
            .map(|(row, col, val)| SparseMatEntry::new(*row, *col, *val))
            .collect::<Vec<_>>();
        let mat_B = B
            .iter()
            .map(|(row, col, val)| SparseMatEntry::new(*row, *col, *val))
            .collect::<Vec<_>>();
        let mat_C = C
            .iter()
            .map(|(row, col, val)| SparseMatEntry::new(*row, *col, *val))
            .collect::<Vec<_>>();

        let poly_A = SparseMatPolynomial::new(num_poly_vars_x, num_poly_vars_y, mat_A);
        let poly_B = SparseMatPolynomial::new(num_poly_vars_x, num_poly_vars_y, mat_B);
        let poly_C = SparseMatPolynomial::new(num_poly_vars_x, num_poly_vars_y, mat_C);

        R1CSInstance {
            num_cons,
            num_vars,
            num_inputs,
            A: poly_A,
            B: poly_B,
            C: poly_C,
        }
    }

    pub fn get_num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn get_num_cons(&self) -> usize {
        self.num_cons
    }

    pub fn get_num_inputs(&self) -> usize {
        self.num_inputs
    }

    /// Compressed canonical encoding, used to bind the instance into transcripts
    pub fn get_digest(&self) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        self.serialize_compressed(&mut encoder).unwrap();
        encoder.finish().unwrap()
    }

    /// Produce a random satisfiable instance together with a satisfying assignment
    pub fn produce_synthetic_r1cs(
        num_cons: usize,
        num_vars: usize,
        num_inputs: usize,
    ) -> (R1CSInstance<F>, Vec<F>, Vec<F>) {
        Timer::print(&format!("number_of_constraints {num_cons}"));
        Timer::print(&format!("number_of_variables {num_vars}"));
        Timer::print(&format!("number_of_inputs {num_inputs}"));

        let mut rng = OsRng;

        // z is organized as [vars, 1, inputs]
        let size_z = num_vars + num_inputs + 1;

        // produce a random satisfying assignment
        let Z = {
            let mut Z: Vec<F> = (0..size_z).map(|_| F::rand(&mut rng)).collect();
            Z[num_vars] = F::one(); // set the constant term to 1
            Z
        };

        // three sparse matrices
        let mut A: Vec<SparseMatEntry<F>> = Vec::new();
        let mut B: Vec<SparseMatEntry<F>> = Vec::new();
        let mut C: Vec<SparseMatEntry<F>> = Vec::new();
        let one = F::one();
        for i in 0..num_cons {
            let A_idx = i % size_z;
            let B_idx = (i + 2) % size_z;
            A.push(SparseMatEntry::new(i, A_idx, one));
            B.push(SparseMatEntry::new(i, B_idx, one));
            let AB_val = Z[A_idx] * Z[B_idx];

            let C_idx = (i + 3) % size_z;
            let C_val = Z[C_idx];

            if C_val == F::zero() {
                C.push(SparseMatEntry::new(i, num_vars, AB_val));
            } else {
                C.push(SparseMatEntry::new(
                    i,
                    C_idx,
                    AB_val * C_val.inverse().unwrap(),
                ));
            }
        }

        let num_poly_vars_x = num_cons.log_2();
        let num_poly_vars_y = (2 * num_vars).log_2();
        let inst = R1CSInstance {
            num_cons,
            num_vars,
            num_inputs,
            A: SparseMatPolynomial::new(num_poly_vars_x, num_poly_vars_y, A),
            B: SparseMatPolynomial::new(num_poly_vars_x, num_poly_vars_y, B),
            C: SparseMatPolynomial::new(num_poly_vars_x, num_poly_vars_y, C),
        };

        assert!(inst.is_sat(&Z[..num_vars], &Z[num_vars + 1..]));

        (inst, Z[..num_vars].to_vec(), Z[num_vars + 1..].to_vec())
    }

    pub fn is_sat(&self, vars: &[F], input: &[F]) -> bool {
        assert_eq!(vars.len(), self.num_vars);
        assert_eq!(input.len(), self.num_inputs);

        let z = {
            let mut z = vars.to_vec();
            z.push(F::one());
            z.extend(input);
            z
        };

        // verify if Az * Bz - Cz = [0, ...]
        let Az = self
            .A
            .multiply_vec(self.num_cons, self.num_vars + self.num_inputs + 1, &z);
        let Bz = self
            .B
            .multiply_vec(self.num_cons, self.num_vars + self.num_inputs + 1, &z);
        let Cz = self
            .C
            .multiply_vec(self.num_cons, self.num_vars + self.num_inputs + 1, &z);

        assert_eq!(Az.len(), self.num_cons);
        assert_eq!(Bz.len(), self.num_cons);
        assert_eq!(Cz.len(), self.num_cons);
        (0..self.num_cons).all(|i| Az[i] * Bz[i] == Cz[i])
    }

    pub fn multiply_vec(
        &self,
        num_rows: usize,
        num_cols: usize,
        z: &[F],
    ) -> (DensePolynomial<F>, DensePolynomial<F>, DensePolynomial<F>) {
        assert_eq!(num_rows, self.num_cons);
        assert_eq!(z.len(), num_cols);
        (
            DensePolynomial::new(self.A.multiply_vec(num_rows, num_cols, z)),
            DensePolynomial::new(self.B.multiply_vec(num_rows, num_cols, z)),
            DensePolynomial::new(self.C.multiply_vec(num_rows, num_cols, z)),
        )
    }

    pub fn compute_eval_table_sparse(
        &self,
        num_rows: usize,
        num_cols: usize,
        evals: &[F],
    ) -> (Vec<F>, Vec<F>, Vec<F>) {
        assert_eq!(num_rows, self.num_cons);
        assert!(num_cols > self.num_vars);
        (
            self.A.compute_eval_table_sparse(evals, num_rows, num_cols),
            self.B.compute_eval_table_sparse(evals, num_rows, num_cols),
            self.C.compute_eval_table_sparse(evals, num_rows, num_cols),
        )
    }

    /// Evaluate the multilinear extensions of A, B, and C at (rx, ry)
    pub fn evaluate(&self, rx: &[F], ry: &[F]) -> (F, F, F) {
        let evals = SparseMatPolynomial::multi_evaluate(&[&self.A, &self.B, &self.C], rx, ry);
        (evals[0], evals[1], evals[2])
    }

    pub fn commit<G: CurveGroup<ScalarField = F>>(
        &self,
        gens: &R1CSCommitmentGens<G>,
    ) -> (R1CSCommitment<G>, R1CSDecommitment<F>) {
        let (comm, dense) =
            SparseMatPolynomial::multi_commit(&[&self.A, &self.B, &self.C], &gens.gens);
        let r1cs_comm = R1CSCommitment {
            num_cons: self.num_cons,
            num_vars: self.num_vars,
            num_inputs: self.num_inputs,
            comm,
        };
        let r1cs_decomm = R1CSDecommitment { dense };

        (r1cs_comm, r1cs_decomm)
    }
}

/// Generators for committing to the three matrices of an R1CS instance
pub struct R1CSCommitmentGens<G: CurveGroup> {
    gens: SparseMatPolyCommitmentGens<G>,
}

impl<G: CurveGroup> R1CSCommitmentGens<G> {
    pub fn new(
        label: &'static [u8],
        num_cons: usize,
        num_vars: usize,
        num_inputs: usize,
        num_nz_entries: usize,
    ) -> Self {
        assert!(num_inputs < num_vars);
        let num_poly_vars_x = num_cons.log_2();
        let num_poly_vars_y = (2 * num_vars).log_2();
        let gens = SparseMatPolyCommitmentGens::new(
            label,
            num_poly_vars_x,
            num_poly_vars_y,
            num_nz_entries,
            3,
        );
        R1CSCommitmentGens { gens }
    }
}

#[derive(Debug, Clone, CanonicalSerialize, CanonicalDeserialize)]
pub struct R1CSCommitment<G: CurveGroup> {
    num_cons: usize,
    num_vars: usize,
    num_inputs: usize,
    comm: SparseMatPolyCommitment<G>,
}

impl<G: CurveGroup> AppendToTranscript for R1CSCommitment<G> {
    fn append_to_transcript(&self, _label: &'static [u8], transcript: &mut Transcript) {
        transcript.append_u64(b"num_cons", self.num_cons as u64);
        transcript.append_u64(b"num_vars", self.num_vars as u64);
        transcript.append_u64(b"num_inputs", self.num_inputs as u64);
        self.comm.append_to_transcript(b"comm", transcript);
    }
}

impl<G: CurveGroup> R1CSCommitment<G> {
    pub fn get_num_cons(&self) -> usize {
        self.num_cons
    }

    pub fn get_num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn get_num_inputs(&self) -> usize {
        self.num_inputs
    }
}

/// Prover's artifact of committing to an R1CS instance
pub struct R1CSDecommitment<F: PrimeField> {
    dense: MultiSparseMatPolynomialAsDense<F>,
}

/// Proof that the committed matrices evaluate to the claimed values at (rx, ry)
#[derive(Debug, Clone, CanonicalSerialize, CanonicalDeserialize)]
pub struct R1CSEvalProof<G: CurveGroup> {
    proof: SparseMatPolyEvalProof<G>,
}

impl<G: CurveGroup> R1CSEvalProof<G> {
    pub fn prove(
        decomm: &R1CSDecommitment<G::ScalarField>,
        rx: &[G::ScalarField],
        ry: &[G::ScalarField],
        evals: &(G::ScalarField, G::ScalarField, G::ScalarField),
        gens: &R1CSCommitmentGens<G>,
        transcript: &mut Transcript,
        random_tape: &mut RandomTape<G::ScalarField>,
    ) -> Self {
        let timer = Timer::new("R1CSEvalProof::prove");
        let evals_vec = vec![evals.0, evals.1, evals.2];
        let proof = SparseMatPolyEvalProof::prove(
            &decomm.dense,
            rx,
            ry,
            &evals_vec,
            &gens.gens,
            transcript,
            random_tape,
        );
        timer.stop();

        R1CSEvalProof { proof }
    }

    pub fn verify(
        &self,
        comm: &R1CSCommitment<G>,
        rx: &[G::ScalarField],
        ry: &[G::ScalarField],
        evals: &(G::ScalarField, G::ScalarField, G::ScalarField),
        gens: &R1CSCommitmentGens<G>,
        transcript: &mut Transcript,
    ) -> Result<(), ProofVerifyError> {
        let evals_vec = vec![evals.0, evals.1, evals.2];
        self.proof
            .verify(&comm.comm, rx, ry, &evals_vec, &gens.gens, transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::{Fr, G1Projective};
    use ark_ff::{One, Zero};
    use ark_std::UniformRand;

    #[test]
    fn test_r1cs_is_sat() {
        // single constraint: x * x = x, satisfied by x in {0, 1}
        let A = vec![(0, 0, Fr::one())];
        let B = vec![(0, 0, Fr::one())];
        let C = vec![(0, 0, Fr::one())];

        let inst = R1CSInstance::new(1, 2, 0, &A, &B, &C);

        let inputs: Vec<Fr> = vec![];
        assert!(inst.is_sat(&[Fr::one(), Fr::zero()], &inputs));
        assert!(inst.is_sat(&[Fr::zero(), Fr::zero()], &inputs));
        assert!(!inst.is_sat(&[Fr::from(2u64), Fr::zero()], &inputs));
    }

    #[test]
    fn test_synthetic_r1cs() {
        let (inst, vars, inputs) = R1CSInstance::<Fr>::produce_synthetic_r1cs(16, 16, 2);
        assert!(inst.is_sat(&vars, &inputs));
    }

    #[test]
    fn check_r1cs_eval_proof() {
        let num_cons = 16;
        let num_vars = 16;
        let num_inputs = 2;
        let (inst, _vars, _inputs) =
            R1CSInstance::<Fr>::produce_synthetic_r1cs(num_cons, num_vars, num_inputs);

        let gens = R1CSCommitmentGens::<G1Projective>::new(
            b"gens_r1cs_eval",
            num_cons,
            num_vars,
            num_inputs,
            num_cons,
        );
        let (comm, decomm) = inst.commit(&gens);

        let rx: Vec<Fr> = (0..num_cons.log_2())
            .map(|_| Fr::rand(&mut OsRng))
            .collect();
        let ry: Vec<Fr> = (0..(2 * num_vars).log_2())
            .map(|_| Fr::rand(&mut OsRng))
            .collect();
        let evals = inst.evaluate(&rx, &ry);

        let mut random_tape = RandomTape::new(b"proof");
        let mut prover_transcript = Transcript::new(b"example");
        let proof = R1CSEvalProof::prove(
            &decomm,
            &rx,
            &ry,
            &evals,
            &gens,
            &mut prover_transcript,
            &mut random_tape,
        );

        let mut verifier_transcript = Transcript::new(b"example");
        assert!(proof
            .verify(&comm, &rx, &ry, &evals, &gens, &mut verifier_transcript)
            .is_ok());
    }
}
