//! Product tree circuits for batch product verification
//! Used in the memory-checking protocol for sparse polynomial evaluation

use crate::dense_mlpoly::{DensePolynomial, EqPolynomial};
use crate::errors::ProofVerifyError;
use crate::math::Math;
use crate::sumcheck::SumcheckInstanceProof;
use crate::transcript::ProofTranscript;
use ark_ff::PrimeField;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use merlin::Transcript;

/// Binary tree of pairwise products over the entries of a polynomial
#[derive(Debug)]
pub struct ProductCircuit<F: PrimeField> {
    left_vec: Vec<DensePolynomial<F>>,
    right_vec: Vec<DensePolynomial<F>>,
}

impl<F: PrimeField> ProductCircuit<F> {
    fn compute_layer(
        inp_left: &DensePolynomial<F>,
        inp_right: &DensePolynomial<F>,
    ) -> (DensePolynomial<F>, DensePolynomial<F>) {
        let len = inp_left.len() + inp_right.len();
        let outp_left = (0..len / 4)
            .map(|i| inp_left[i] * inp_right[i])
            .collect::<Vec<F>>();
        let outp_right = (len / 4..len / 2)
            .map(|i| inp_left[i] * inp_right[i])
            .collect::<Vec<F>>();

        (
            DensePolynomial::new(outp_left),
            DensePolynomial::new(outp_right),
        )
    }

    pub fn new(poly: &DensePolynomial<F>) -> Self {
        let mut left_vec: Vec<DensePolynomial<F>> = Vec::new();
        let mut right_vec: Vec<DensePolynomial<F>> = Vec::new();

        let num_layers = poly.len().log_2();
        let (outp_left, outp_right) = poly.split(poly.len() / 2);

        left_vec.push(outp_left);
        right_vec.push(outp_right);

        for i in 0..num_layers - 1 {
            let (outp_left, outp_right) =
                ProductCircuit::compute_layer(&left_vec[i], &right_vec[i]);
            left_vec.push(outp_left);
            right_vec.push(outp_right);
        }

        ProductCircuit { left_vec, right_vec }
    }

    pub fn evaluate(&self) -> F {
        let len = self.left_vec.len();
        assert_eq!(self.left_vec[len - 1].get_num_vars(), 0);
        assert_eq!(self.right_vec[len - 1].get_num_vars(), 0);
        self.left_vec[len - 1][0] * self.right_vec[len - 1][0]
    }
}

/// Weighted dot product of two polynomials
pub struct DotProductCircuit<F: PrimeField> {
    pub left: DensePolynomial<F>,
    pub right: DensePolynomial<F>,
    pub weight: DensePolynomial<F>,
}

impl<F: PrimeField> DotProductCircuit<F> {
    pub fn new(
        left: DensePolynomial<F>,
        right: DensePolynomial<F>,
        weight: DensePolynomial<F>,
    ) -> Self {
        assert_eq!(left.len(), right.len());
        assert_eq!(left.len(), weight.len());
        DotProductCircuit { left, right, weight }
    }

    pub fn evaluate(&self) -> F {
        (0..self.left.len())
            .map(|i| self.left[i] * self.right[i] * self.weight[i])
            .sum()
    }

    pub fn split(&mut self) -> (DotProductCircuit<F>, DotProductCircuit<F>) {
        let idx = self.left.len() / 2;
        assert_eq!(idx * 2, self.left.len());
        let (l1, l2) = self.left.split(idx);
        let (r1, r2) = self.right.split(idx);
        let (w1, w2) = self.weight.split(idx);
        (
            DotProductCircuit {
                left: l1,
                right: r1,
                weight: w1,
            },
            DotProductCircuit {
                left: l2,
                right: r2,
                weight: w2,
            },
        )
    }
}

#[derive(Debug, Clone, CanonicalSerialize, CanonicalDeserialize)]
pub struct LayerProofBatched<F: PrimeField> {
    pub proof: SumcheckInstanceProof<F>,
    pub claims_prod_left: Vec<F>,
    pub claims_prod_right: Vec<F>,
}

impl<F: PrimeField> LayerProofBatched<F> {
    pub fn verify(
        &self,
        claim: F,
        num_rounds: usize,
        degree_bound: usize,
        transcript: &mut Transcript,
    ) -> Result<(F, Vec<F>), ProofVerifyError> {
        self.proof
            .verify(claim, num_rounds, degree_bound, transcript)
    }
}

#[derive(Debug, Clone, CanonicalSerialize, CanonicalDeserialize)]
pub struct ProductCircuitEvalProofBatched<F: PrimeField> {
    proof: Vec<LayerProofBatched<F>>,
    pub claims_dotp: (Vec<F>, Vec<F>, Vec<F>),
}

impl<F: PrimeField> ProductCircuitEvalProofBatched<F> {
    pub fn prove(
        prod_circuit_vec: &mut [&mut ProductCircuit<F>],
        dotp_circuit_vec: &mut [&mut DotProductCircuit<F>],
        transcript: &mut Transcript,
    ) -> (Self, Vec<F>) {
        assert!(!prod_circuit_vec.is_empty());

        let mut claims_dotp_final = (Vec::new(), Vec::new(), Vec::new());

        let mut proof_layers: Vec<LayerProofBatched<F>> = Vec::new();
        let num_layers = prod_circuit_vec[0].left_vec.len();
        let mut claims_to_verify = (0..prod_circuit_vec.len())
            .map(|i| prod_circuit_vec[i].evaluate())
            .collect::<Vec<F>>();
        let mut rand = Vec::new();

        for layer_id in (0..num_layers).rev() {
            let len = prod_circuit_vec[0].left_vec[layer_id].len()
                + prod_circuit_vec[0].right_vec[layer_id].len();

            let mut poly_C_par = DensePolynomial::new(EqPolynomial::new(rand.clone()).evals());
            assert_eq!(poly_C_par.len(), len / 2);

            let num_rounds_prod = poly_C_par.len().log_2();
            let comb_func_prod = |poly_A_comp: &F, poly_B_comp: &F, poly_C_comp: &F| -> F {
                *poly_A_comp * *poly_B_comp * *poly_C_comp
            };

            let mut poly_A_batched_par: Vec<&mut DensePolynomial<F>> = Vec::new();
            let mut poly_B_batched_par: Vec<&mut DensePolynomial<F>> = Vec::new();
            for prod_circuit in prod_circuit_vec.iter_mut() {
                poly_A_batched_par.push(&mut prod_circuit.left_vec[layer_id]);
                poly_B_batched_par.push(&mut prod_circuit.right_vec[layer_id]);
            }
            let poly_vec_par = (
                &mut poly_A_batched_par,
                &mut poly_B_batched_par,
                &mut poly_C_par,
            );

            // prepare sequential instances that don't share poly_C
            let mut poly_A_batched_seq: Vec<&mut DensePolynomial<F>> = Vec::new();
            let mut poly_B_batched_seq: Vec<&mut DensePolynomial<F>> = Vec::new();
            let mut poly_C_batched_seq: Vec<&mut DensePolynomial<F>> = Vec::new();
            if layer_id == 0 && !dotp_circuit_vec.is_empty() {
                for item in dotp_circuit_vec.iter() {
                    claims_to_verify.push(item.evaluate());
                    assert_eq!(len / 2, item.left.len());
                    assert_eq!(len / 2, item.right.len());
                    assert_eq!(len / 2, item.weight.len());
                }

                for dotp_circuit in dotp_circuit_vec.iter_mut() {
                    poly_A_batched_seq.push(&mut dotp_circuit.left);
                    poly_B_batched_seq.push(&mut dotp_circuit.right);
                    poly_C_batched_seq.push(&mut dotp_circuit.weight);
                }
            }
            let poly_vec_seq = (
                &mut poly_A_batched_seq,
                &mut poly_B_batched_seq,
                &mut poly_C_batched_seq,
            );

            // produce a fresh set of coeffs and a joint claim
            let coeff_vec: Vec<F> =
                transcript.challenge_vector(b"rand_coeffs_next_layer", claims_to_verify.len());
            let claim: F = (0..claims_to_verify.len())
                .map(|i| claims_to_verify[i] * coeff_vec[i])
                .sum();

            let (proof, rand_prod, claims_prod, claims_dotp) =
                SumcheckInstanceProof::prove_cubic_batched(
                    &claim,
                    num_rounds_prod,
                    poly_vec_par,
                    poly_vec_seq,
                    &coeff_vec,
                    comb_func_prod,
                    transcript,
                );

            let (claims_prod_left, claims_prod_right, _claims_eq) = claims_prod;
            for i in 0..prod_circuit_vec.len() {
                transcript.append_scalar(b"claim_prod_left", &claims_prod_left[i]);
                transcript.append_scalar(b"claim_prod_right", &claims_prod_right[i]);
            }

            if layer_id == 0 && !dotp_circuit_vec.is_empty() {
                let (claims_dotp_left, claims_dotp_right, claims_dotp_weight) = claims_dotp;
                for i in 0..dotp_circuit_vec.len() {
                    transcript.append_scalar(b"claim_dotp_left", &claims_dotp_left[i]);
                    transcript.append_scalar(b"claim_dotp_right", &claims_dotp_right[i]);
                    transcript.append_scalar(b"claim_dotp_weight", &claims_dotp_weight[i]);
                }
                claims_dotp_final = (claims_dotp_left, claims_dotp_right, claims_dotp_weight);
            }

            // produce a random challenge to condense two claims into a single claim
            let r_layer = transcript.challenge_scalar(b"challenge_r_layer");

            claims_to_verify = (0..prod_circuit_vec.len())
                .map(|i| {
                    claims_prod_left[i] + r_layer * (claims_prod_right[i] - claims_prod_left[i])
                })
                .collect::<Vec<F>>();

            let mut ext = vec![r_layer];
            ext.extend(rand_prod);
            rand = ext;

            proof_layers.push(LayerProofBatched {
                proof,
                claims_prod_left,
                claims_prod_right,
            });
        }

        (
            ProductCircuitEvalProofBatched {
                proof: proof_layers,
                claims_dotp: claims_dotp_final,
            },
            rand,
        )
    }

    pub fn verify(
        &self,
        claims_prod_vec: &[F],
        claims_dotp_vec: &[F],
        len: usize,
        transcript: &mut Transcript,
    ) -> Result<(Vec<F>, Vec<F>, Vec<F>), ProofVerifyError> {
        let num_layers = len.log_2();
        let mut rand: Vec<F> = Vec::new();
        if self.proof.len() != num_layers {
            return Err(ProofVerifyError::InternalError);
        }

        let mut claims_to_verify = claims_prod_vec.to_owned();
        let mut claims_to_verify_dotp: Vec<F> = Vec::new();

        for (num_rounds, i) in (0..num_layers).enumerate() {
            if i == num_layers - 1 {
                claims_to_verify.extend(claims_dotp_vec);
            }

            // produce random coefficients, one for each instance
            let coeff_vec: Vec<F> =
                transcript.challenge_vector(b"rand_coeffs_next_layer", claims_to_verify.len());

            // produce a joint claim
            let claim: F = (0..claims_to_verify.len())
                .map(|i| claims_to_verify[i] * coeff_vec[i])
                .sum();

            let (claim_last, rand_prod) = self.proof[i].verify(claim, num_rounds, 3, transcript)?;

            let claims_prod_left = &self.proof[i].claims_prod_left;
            let claims_prod_right = &self.proof[i].claims_prod_right;
            if claims_prod_left.len() != claims_prod_vec.len()
                || claims_prod_right.len() != claims_prod_vec.len()
            {
                return Err(ProofVerifyError::InternalError);
            }

            for j in 0..claims_prod_vec.len() {
                transcript.append_scalar(b"claim_prod_left", &claims_prod_left[j]);
                transcript.append_scalar(b"claim_prod_right", &claims_prod_right[j]);
            }

            if rand.len() != rand_prod.len() {
                return Err(ProofVerifyError::InternalError);
            }
            let eq: F = (0..rand.len())
                .map(|j| {
                    rand[j] * rand_prod[j] + (F::one() - rand[j]) * (F::one() - rand_prod[j])
                })
                .product();
            let mut claim_expected: F = (0..claims_prod_vec.len())
                .map(|j| coeff_vec[j] * (claims_prod_left[j] * claims_prod_right[j] * eq))
                .sum();

            // add claims from the dotp instances
            if i == num_layers - 1 {
                let num_prod_instances = claims_prod_vec.len();
                let (claims_dotp_left, claims_dotp_right, claims_dotp_weight) = &self.claims_dotp;
                if claims_dotp_left.len() != claims_dotp_vec.len()
                    || claims_dotp_right.len() != claims_dotp_vec.len()
                    || claims_dotp_weight.len() != claims_dotp_vec.len()
                {
                    return Err(ProofVerifyError::InternalError);
                }
                for k in 0..claims_dotp_left.len() {
                    transcript.append_scalar(b"claim_dotp_left", &claims_dotp_left[k]);
                    transcript.append_scalar(b"claim_dotp_right", &claims_dotp_right[k]);
                    transcript.append_scalar(b"claim_dotp_weight", &claims_dotp_weight[k]);

                    claim_expected += coeff_vec[k + num_prod_instances]
                        * claims_dotp_left[k]
                        * claims_dotp_right[k]
                        * claims_dotp_weight[k];
                }
            }

            if claim_expected != claim_last {
                return Err(ProofVerifyError::InternalError);
            }

            // produce a random challenge
            let r_layer = transcript.challenge_scalar(b"challenge_r_layer");

            claims_to_verify = (0..claims_prod_left.len())
                .map(|j| {
                    claims_prod_left[j] + r_layer * (claims_prod_right[j] - claims_prod_left[j])
                })
                .collect::<Vec<F>>();

            // add claims to verify for dotp circuit
            if i == num_layers - 1 {
                let (claims_dotp_left, claims_dotp_right, claims_dotp_weight) = &self.claims_dotp;

                for k in 0..claims_dotp_vec.len() / 2 {
                    let claim_left = claims_dotp_left[2 * k]
                        + r_layer * (claims_dotp_left[2 * k + 1] - claims_dotp_left[2 * k]);
                    let claim_right = claims_dotp_right[2 * k]
                        + r_layer * (claims_dotp_right[2 * k + 1] - claims_dotp_right[2 * k]);
                    let claim_weight = claims_dotp_weight[2 * k]
                        + r_layer * (claims_dotp_weight[2 * k + 1] - claims_dotp_weight[2 * k]);
                    claims_to_verify_dotp.push(claim_left);
                    claims_to_verify_dotp.push(claim_right);
                    claims_to_verify_dotp.push(claim_weight);
                }
            }

            let mut ext = vec![r_layer];
            ext.extend(rand_prod);
            rand = ext;
        }
        Ok((claims_to_verify, claims_to_verify_dotp, rand))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::Fr;
    use ark_ff::One;

    #[test]
    fn test_product_circuit() {
        let vals = vec![Fr::from(2u64), Fr::from(3u64), Fr::from(5u64), Fr::from(7u64)];
        let poly = DensePolynomial::new(vals);
        let circuit = ProductCircuit::new(&poly);
        assert_eq!(circuit.evaluate(), Fr::from(210u64));
    }

    #[test]
    fn test_dot_product_circuit() {
        let left = DensePolynomial::new(vec![
            Fr::from(1u64),
            Fr::from(2u64),
            Fr::from(3u64),
            Fr::from(4u64),
        ]);
        let right = DensePolynomial::new(vec![
            Fr::from(5u64),
            Fr::from(6u64),
            Fr::from(7u64),
            Fr::from(8u64),
        ]);
        let weight = DensePolynomial::new(vec![Fr::one(); 4]);

        let circuit = DotProductCircuit::new(left, right, weight);
        assert_eq!(circuit.evaluate(), Fr::from(70u64));
    }

    #[test]
    fn test_product_circuit_eval_proof_batched() {
        let poly1 = DensePolynomial::new(vec![
            Fr::from(2u64),
            Fr::from(3u64),
            Fr::from(5u64),
            Fr::from(7u64),
        ]);
        let poly2 = DensePolynomial::new(vec![
            Fr::from(11u64),
            Fr::from(13u64),
            Fr::from(17u64),
            Fr::from(19u64),
        ]);

        let mut circuit1 = ProductCircuit::new(&poly1);
        let mut circuit2 = ProductCircuit::new(&poly2);

        let claim1 = circuit1.evaluate();
        let claim2 = circuit2.evaluate();

        let mut prover_transcript = Transcript::new(b"example");
        let (proof, rand) = ProductCircuitEvalProofBatched::prove(
            &mut [&mut circuit1, &mut circuit2],
            &mut [],
            &mut prover_transcript,
        );

        let mut verifier_transcript = Transcript::new(b"example");
        let (_claims, _claims_dotp, rand_verify) = proof
            .verify(&[claim1, claim2], &[], 4, &mut verifier_transcript)
            .unwrap();
        assert_eq!(rand, rand_verify);
    }

    #[test]
    fn test_product_circuit_eval_proof_rejects_tampered_claim() {
        let poly = DensePolynomial::new(vec![
            Fr::from(2u64),
            Fr::from(3u64),
            Fr::from(5u64),
            Fr::from(7u64),
        ]);
        let mut circuit = ProductCircuit::new(&poly);
        let claim = circuit.evaluate();

        let mut prover_transcript = Transcript::new(b"example");
        let (mut proof, _rand) = ProductCircuitEvalProofBatched::prove(
            &mut [&mut circuit],
            &mut [],
            &mut prover_transcript,
        );

        proof.proof[0].claims_prod_left[0] += Fr::one();

        let mut verifier_transcript = Transcript::new(b"example");
        assert!(proof
            .verify(&[claim], &[], 4, &mut verifier_transcript)
            .is_err());
    }

    #[test]
    fn test_product_circuit_eval_proof_batched_with_dotp() {
        let poly1 = DensePolynomial::new(vec![
            Fr::from(2u64),
            Fr::from(3u64),
            Fr::from(5u64),
            Fr::from(7u64),
        ]);
        let mut circuit1 = ProductCircuit::new(&poly1);
        let claim1 = circuit1.evaluate();

        let left = DensePolynomial::new(vec![Fr::from(1u64), Fr::from(2u64)]);
        let right = DensePolynomial::new(vec![Fr::from(3u64), Fr::from(4u64)]);
        let weight = DensePolynomial::new(vec![Fr::one(); 2]);

        let mut dotp_circuit = DotProductCircuit::new(left, right, weight);
        let claim_dotp = dotp_circuit.evaluate();

        let mut prover_transcript = Transcript::new(b"example");
        let (proof, rand) = ProductCircuitEvalProofBatched::prove(
            &mut [&mut circuit1],
            &mut [&mut dotp_circuit],
            &mut prover_transcript,
        );

        let mut verifier_transcript = Transcript::new(b"example");
        let (_claims, _claims_dotp, rand_verify) = proof
            .verify(&[claim1], &[claim_dotp], 4, &mut verifier_transcript)
            .unwrap();
        assert_eq!(rand, rand_verify);
    }
}
