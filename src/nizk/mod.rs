//! Sigma protocols over Pedersen commitments
//!
//! All proofs are made non-interactive with the shared Fiat-Shamir transcript;
//! every blind the prover needs comes from the RandomTape.

#![allow(clippy::too_many_arguments)]

use crate::commitments::{Commitments, MultiCommitGens};
use crate::errors::ProofVerifyError;
use crate::group::GroupElementExt;
use crate::random::RandomTape;
use crate::transcript::ProofTranscript;
use ark_ec::CurveGroup;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use merlin::Transcript;

mod bullet;
pub use bullet::BulletReductionProof;

/// Proves knowledge of an opening (x, r) of a Pedersen commitment
#[derive(Debug, Clone, CanonicalSerialize, CanonicalDeserialize)]
pub struct KnowledgeProof<G: CurveGroup> {
    alpha: G,
    z1: G::ScalarField,
    z2: G::ScalarField,
}

impl<G: CurveGroup> KnowledgeProof<G> {
    fn protocol_name() -> &'static [u8] {
        b"knowledge proof"
    }

    pub fn prove(
        gens_n: &MultiCommitGens<G>,
        transcript: &mut Transcript,
        random_tape: &mut RandomTape<G::ScalarField>,
        x: &G::ScalarField,
        r: &G::ScalarField,
    ) -> (KnowledgeProof<G>, G) {
        transcript.append_protocol_name(KnowledgeProof::<G>::protocol_name());

        let t1 = random_tape.random_scalar(b"t1");
        let t2 = random_tape.random_scalar(b"t2");

        let C = x.commit(r, gens_n);
        transcript.append_point(b"C", &C.compress());

        let alpha = t1.commit(&t2, gens_n);
        transcript.append_point(b"alpha", &alpha.compress());

        let c: G::ScalarField = transcript.challenge_scalar(b"c");

        let z1 = *x * c + t1;
        let z2 = *r * c + t2;

        (KnowledgeProof { alpha, z1, z2 }, C)
    }

    pub fn verify(
        &self,
        gens_n: &MultiCommitGens<G>,
        transcript: &mut Transcript,
        C: &G,
    ) -> Result<(), ProofVerifyError> {
        transcript.append_protocol_name(KnowledgeProof::<G>::protocol_name());
        transcript.append_point(b"C", &C.compress());
        transcript.append_point(b"alpha", &self.alpha.compress());

        let c: G::ScalarField = transcript.challenge_scalar(b"c");

        let lhs = self.z1.commit(&self.z2, gens_n);
        let rhs = *C * c + self.alpha;

        if lhs == rhs {
            Ok(())
        } else {
            Err(ProofVerifyError::InternalError)
        }
    }
}

/// Proves two Pedersen commitments open to the same value
#[derive(Debug, Clone, CanonicalSerialize, CanonicalDeserialize)]
pub struct EqualityProof<G: CurveGroup> {
    alpha: G,
    z: G::ScalarField,
}

impl<G: CurveGroup> EqualityProof<G> {
    fn protocol_name() -> &'static [u8] {
        b"equality proof"
    }

    pub fn prove(
        gens_n: &MultiCommitGens<G>,
        transcript: &mut Transcript,
        random_tape: &mut RandomTape<G::ScalarField>,
        v1: &G::ScalarField,
        s1: &G::ScalarField,
        v2: &G::ScalarField,
        s2: &G::ScalarField,
    ) -> (EqualityProof<G>, G, G) {
        transcript.append_protocol_name(EqualityProof::<G>::protocol_name());

        let r = random_tape.random_scalar(b"r");

        let C1 = v1.commit(s1, gens_n);
        transcript.append_point(b"C1", &C1.compress());

        let C2 = v2.commit(s2, gens_n);
        transcript.append_point(b"C2", &C2.compress());

        let alpha = gens_n.h * r;
        transcript.append_point(b"alpha", &alpha.compress());

        let c: G::ScalarField = transcript.challenge_scalar(b"c");

        let z = c * (*s1 - *s2) + r;

        (EqualityProof { alpha, z }, C1, C2)
    }

    pub fn verify(
        &self,
        gens_n: &MultiCommitGens<G>,
        transcript: &mut Transcript,
        C1: &G,
        C2: &G,
    ) -> Result<(), ProofVerifyError> {
        transcript.append_protocol_name(EqualityProof::<G>::protocol_name());
        transcript.append_point(b"C1", &C1.compress());
        transcript.append_point(b"C2", &C2.compress());
        transcript.append_point(b"alpha", &self.alpha.compress());

        let c: G::ScalarField = transcript.challenge_scalar(b"c");

        let C = *C1 - *C2;
        let rhs = C * c + self.alpha;
        let lhs = gens_n.h * self.z;

        if lhs == rhs {
            Ok(())
        } else {
            Err(ProofVerifyError::InternalError)
        }
    }
}

/// Proves z = x * y for committed x, y, z
#[derive(Debug, Clone, CanonicalSerialize, CanonicalDeserialize)]
pub struct ProductProof<G: CurveGroup> {
    alpha: G,
    beta: G,
    delta: G,
    z: [G::ScalarField; 5],
}

impl<G: CurveGroup> ProductProof<G> {
    fn protocol_name() -> &'static [u8] {
        b"product proof"
    }

    pub fn prove(
        gens_n: &MultiCommitGens<G>,
        transcript: &mut Transcript,
        random_tape: &mut RandomTape<G::ScalarField>,
        x: &G::ScalarField,
        rX: &G::ScalarField,
        y: &G::ScalarField,
        rY: &G::ScalarField,
        z: &G::ScalarField,
        rZ: &G::ScalarField,
    ) -> (ProductProof<G>, G, G, G) {
        transcript.append_protocol_name(ProductProof::<G>::protocol_name());

        let b1 = random_tape.random_scalar(b"b1");
        let b2 = random_tape.random_scalar(b"b2");
        let b3 = random_tape.random_scalar(b"b3");
        let b4 = random_tape.random_scalar(b"b4");
        let b5 = random_tape.random_scalar(b"b5");

        let X = x.commit(rX, gens_n);
        transcript.append_point(b"X", &X.compress());

        let Y = y.commit(rY, gens_n);
        transcript.append_point(b"Y", &Y.compress());

        let Z = z.commit(rZ, gens_n);
        transcript.append_point(b"Z", &Z.compress());

        let alpha = b1.commit(&b2, gens_n);
        transcript.append_point(b"alpha", &alpha.compress());

        let beta = b3.commit(&b4, gens_n);
        transcript.append_point(b"beta", &beta.compress());

        // delta lives under the rebased generator X
        let delta = {
            let gens_X = MultiCommitGens::from_generators(vec![X], gens_n.h);
            b3.commit(&b5, &gens_X)
        };
        transcript.append_point(b"delta", &delta.compress());

        let c: G::ScalarField = transcript.challenge_scalar(b"c");

        let z1 = b1 + c * *x;
        let z2 = b2 + c * *rX;
        let z3 = b3 + c * *y;
        let z4 = b4 + c * *rY;
        let z5 = b5 + c * (*rZ - *rX * *y);

        (
            ProductProof {
                alpha,
                beta,
                delta,
                z: [z1, z2, z3, z4, z5],
            },
            X,
            Y,
            Z,
        )
    }

    fn check_equality(
        P: &G,
        X: &G,
        c: &G::ScalarField,
        gens_n: &MultiCommitGens<G>,
        z1: &G::ScalarField,
        z2: &G::ScalarField,
    ) -> bool {
        let lhs = *P + *X * *c;
        let rhs = z1.commit(z2, gens_n);
        lhs == rhs
    }

    pub fn verify(
        &self,
        gens_n: &MultiCommitGens<G>,
        transcript: &mut Transcript,
        X: &G,
        Y: &G,
        Z: &G,
    ) -> Result<(), ProofVerifyError> {
        transcript.append_protocol_name(ProductProof::<G>::protocol_name());

        transcript.append_point(b"X", &X.compress());
        transcript.append_point(b"Y", &Y.compress());
        transcript.append_point(b"Z", &Z.compress());
        transcript.append_point(b"alpha", &self.alpha.compress());
        transcript.append_point(b"beta", &self.beta.compress());
        transcript.append_point(b"delta", &self.delta.compress());

        let z1 = self.z[0];
        let z2 = self.z[1];
        let z3 = self.z[2];
        let z4 = self.z[3];
        let z5 = self.z[4];

        let c: G::ScalarField = transcript.challenge_scalar(b"c");

        if ProductProof::check_equality(&self.alpha, X, &c, gens_n, &z1, &z2)
            && ProductProof::check_equality(&self.beta, Y, &c, gens_n, &z3, &z4)
            && ProductProof::check_equality(
                &self.delta,
                Z,
                &c,
                &MultiCommitGens::from_generators(vec![*X], gens_n.h),
                &z3,
                &z5,
            )
        {
            Ok(())
        } else {
            Err(ProofVerifyError::InternalError)
        }
    }
}

/// Proves <x, a> = y for a committed vector x, public vector a, committed y
#[derive(Debug, Clone, CanonicalSerialize, CanonicalDeserialize)]
pub struct DotProductProof<G: CurveGroup> {
    delta: G,
    beta: G,
    z: Vec<G::ScalarField>,
    z_delta: G::ScalarField,
    z_beta: G::ScalarField,
}

impl<G: CurveGroup> DotProductProof<G> {
    fn protocol_name() -> &'static [u8] {
        b"dot product proof"
    }

    pub fn compute_dotproduct(a: &[G::ScalarField], b: &[G::ScalarField]) -> G::ScalarField {
        assert_eq!(a.len(), b.len());
        (0..a.len()).map(|i| a[i] * b[i]).sum()
    }

    pub fn prove(
        gens_1: &MultiCommitGens<G>,
        gens_n: &MultiCommitGens<G>,
        transcript: &mut Transcript,
        random_tape: &mut RandomTape<G::ScalarField>,
        x_vec: &[G::ScalarField],
        blind_x: &G::ScalarField,
        a_vec: &[G::ScalarField],
        y: &G::ScalarField,
        blind_y: &G::ScalarField,
    ) -> (DotProductProof<G>, G, G) {
        transcript.append_protocol_name(DotProductProof::<G>::protocol_name());

        let n = x_vec.len();
        assert_eq!(x_vec.len(), a_vec.len());
        assert_eq!(gens_n.n, a_vec.len());
        assert_eq!(gens_1.n, 1);

        let d_vec = random_tape.random_vector(b"d_vec", n);
        let r_delta = random_tape.random_scalar(b"r_delta");
        let r_beta = random_tape.random_scalar(b"r_beta");

        let Cx = x_vec.commit(blind_x, gens_n);
        transcript.append_point(b"Cx", &Cx.compress());

        let Cy = y.commit(blind_y, gens_1);
        transcript.append_point(b"Cy", &Cy.compress());

        transcript.append_scalars(b"a", a_vec);

        let delta = d_vec.commit(&r_delta, gens_n);
        transcript.append_point(b"delta", &delta.compress());

        let dotproduct_a_d = DotProductProof::<G>::compute_dotproduct(a_vec, &d_vec);

        let beta = dotproduct_a_d.commit(&r_beta, gens_1);
        transcript.append_point(b"beta", &beta.compress());

        let c: G::ScalarField = transcript.challenge_scalar(b"c");

        let z = (0..d_vec.len())
            .map(|i| c * x_vec[i] + d_vec[i])
            .collect::<Vec<G::ScalarField>>();

        let z_delta = c * *blind_x + r_delta;
        let z_beta = c * *blind_y + r_beta;

        (
            DotProductProof {
                delta,
                beta,
                z,
                z_delta,
                z_beta,
            },
            Cx,
            Cy,
        )
    }

    pub fn verify(
        &self,
        gens_1: &MultiCommitGens<G>,
        gens_n: &MultiCommitGens<G>,
        transcript: &mut Transcript,
        a: &[G::ScalarField],
        Cx: &G,
        Cy: &G,
    ) -> Result<(), ProofVerifyError> {
        assert_eq!(gens_n.n, a.len());
        assert_eq!(gens_1.n, 1);

        transcript.append_protocol_name(DotProductProof::<G>::protocol_name());
        transcript.append_point(b"Cx", &Cx.compress());
        transcript.append_point(b"Cy", &Cy.compress());
        transcript.append_scalars(b"a", a);
        transcript.append_point(b"delta", &self.delta.compress());
        transcript.append_point(b"beta", &self.beta.compress());

        let c: G::ScalarField = transcript.challenge_scalar(b"c");

        let mut result = *Cx * c + self.delta == self.z.commit(&self.z_delta, gens_n);

        let dotproduct_z_a = DotProductProof::<G>::compute_dotproduct(&self.z, a);
        result &= *Cy * c + self.beta == dotproduct_z_a.commit(&self.z_beta, gens_1);

        if result {
            Ok(())
        } else {
            Err(ProofVerifyError::InternalError)
        }
    }
}

/// Generators for dot product proofs
#[derive(Clone)]
pub struct DotProductProofGens<G: CurveGroup> {
    pub n: usize,
    pub gens_n: MultiCommitGens<G>,
    pub gens_1: MultiCommitGens<G>,
}

impl<G: CurveGroup> DotProductProofGens<G> {
    pub fn new(n: usize, label: &[u8]) -> Self {
        let (gens_n, gens_1) = MultiCommitGens::new(n + 1, label).split_at(n);
        DotProductProofGens { n, gens_n, gens_1 }
    }
}

/// Logarithmic-size dot product proof via bullet reduction
#[derive(Debug, Clone, CanonicalSerialize, CanonicalDeserialize)]
pub struct DotProductProofLog<G: CurveGroup> {
    bullet_reduction_proof: BulletReductionProof,
    delta: G,
    beta: G,
    z1: G::ScalarField,
    z2: G::ScalarField,
}

impl<G: CurveGroup> DotProductProofLog<G> {
    fn protocol_name() -> &'static [u8] {
        b"dot product proof (log)"
    }

    pub fn compute_dotproduct(a: &[G::ScalarField], b: &[G::ScalarField]) -> G::ScalarField {
        assert_eq!(a.len(), b.len());
        (0..a.len()).map(|i| a[i] * b[i]).sum()
    }

    pub fn prove(
        gens: &DotProductProofGens<G>,
        transcript: &mut Transcript,
        random_tape: &mut RandomTape<G::ScalarField>,
        x_vec: &[G::ScalarField],
        blind_x: &G::ScalarField,
        a_vec: &[G::ScalarField],
        y: &G::ScalarField,
        blind_y: &G::ScalarField,
    ) -> (DotProductProofLog<G>, G, G) {
        use crate::math::Math;

        transcript.append_protocol_name(DotProductProofLog::<G>::protocol_name());

        let n = x_vec.len();
        assert_eq!(x_vec.len(), a_vec.len());
        assert_eq!(gens.n, n);

        let d = random_tape.random_scalar(b"d");
        let r_delta = random_tape.random_scalar(b"r_delta");
        let r_beta = random_tape.random_scalar(b"r_beta");
        let blinds_vec = {
            let lg_n = n.log_2();
            let v1 = random_tape.random_vector(b"blinds_vec_1", lg_n);
            let v2 = random_tape.random_vector(b"blinds_vec_2", lg_n);
            (0..lg_n)
                .map(|i| (v1[i], v2[i]))
                .collect::<Vec<(G::ScalarField, G::ScalarField)>>()
        };

        let Cx = x_vec.commit(blind_x, &gens.gens_n);
        transcript.append_point(b"Cx", &Cx.compress());

        let Cy = y.commit(blind_y, &gens.gens_1);
        transcript.append_point(b"Cy", &Cy.compress());

        transcript.append_scalars(b"a", a_vec);

        // sample a random base and scale the generator used for
        // the output of the inner product
        let r: G::ScalarField = transcript.challenge_scalar(b"r");
        let gens_1_scaled = gens.gens_1.scale(&r);

        let blind_Gamma = *blind_x + r * *blind_y;
        let (bullet_reduction_proof, _Gamma_hat, x_hat, a_hat, g_hat, rhat_Gamma) =
            BulletReductionProof::prove(
                transcript,
                &gens_1_scaled.G[0],
                &gens.gens_n.G,
                &gens.gens_n.h,
                x_vec,
                a_vec,
                &blind_Gamma,
                &blinds_vec,
            );
        let y_hat = x_hat * a_hat;

        let delta = {
            let gens_hat = MultiCommitGens::from_generators(vec![g_hat], gens.gens_1.h);
            d.commit(&r_delta, &gens_hat)
        };
        transcript.append_point(b"delta", &delta.compress());

        let beta = d.commit(&r_beta, &gens_1_scaled);
        transcript.append_point(b"beta", &beta.compress());

        let c: G::ScalarField = transcript.challenge_scalar(b"c");

        let z1 = d + c * y_hat;
        let z2 = a_hat * (c * rhat_Gamma + r_beta) + r_delta;

        (
            DotProductProofLog {
                bullet_reduction_proof,
                delta,
                beta,
                z1,
                z2,
            },
            Cx,
            Cy,
        )
    }

    pub fn verify(
        &self,
        n: usize,
        gens: &DotProductProofGens<G>,
        transcript: &mut Transcript,
        a: &[G::ScalarField],
        Cx: &G,
        Cy: &G,
    ) -> Result<(), ProofVerifyError> {
        assert_eq!(gens.n, n);
        assert_eq!(a.len(), n);

        transcript.append_protocol_name(DotProductProofLog::<G>::protocol_name());
        transcript.append_point(b"Cx", &Cx.compress());
        transcript.append_point(b"Cy", &Cy.compress());
        transcript.append_scalars(b"a", a);

        // sample a random base and scale the generator used for
        // the output of the inner product
        let r: G::ScalarField = transcript.challenge_scalar(b"r");
        let gens_1_scaled = gens.gens_1.scale(&r);

        let Gamma = *Cx + *Cy * r;

        let (g_hat, Gamma_hat, a_hat) =
            self.bullet_reduction_proof
                .verify(n, a, transcript, &Gamma, &gens.gens_n.G)?;

        transcript.append_point(b"delta", &self.delta.compress());
        transcript.append_point(b"beta", &self.beta.compress());

        let c: G::ScalarField = transcript.challenge_scalar(b"c");

        let lhs = (Gamma_hat * c + self.beta) * a_hat + self.delta;
        let rhs = (g_hat + gens_1_scaled.G[0] * a_hat) * self.z1 + gens_1_scaled.h * self.z2;

        if lhs == rhs {
            Ok(())
        } else {
            Err(ProofVerifyError::InternalError)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::{Fr, G1Projective};
    use ark_std::UniformRand;
    use rand::rngs::OsRng;

    type G = G1Projective;

    #[test]
    fn check_knowledgeproof() {
        let gens_1 = MultiCommitGens::<G>::new(1, b"test-knowledgeproof");

        let x = Fr::rand(&mut OsRng);
        let r = Fr::rand(&mut OsRng);

        let mut random_tape = RandomTape::new(b"proof");
        let mut prover_transcript = Transcript::new(b"example");
        let (proof, committed_value) =
            KnowledgeProof::prove(&gens_1, &mut prover_transcript, &mut random_tape, &x, &r);

        let mut verifier_transcript = Transcript::new(b"example");
        assert!(proof
            .verify(&gens_1, &mut verifier_transcript, &committed_value)
            .is_ok());
    }

    #[test]
    fn check_equalityproof() {
        let gens_1 = MultiCommitGens::<G>::new(1, b"test-equalityproof");
        let v1 = Fr::rand(&mut OsRng);
        let v2 = v1;
        let s1 = Fr::rand(&mut OsRng);
        let s2 = Fr::rand(&mut OsRng);

        let mut random_tape = RandomTape::new(b"proof");
        let mut prover_transcript = Transcript::new(b"example");
        let (proof, C1, C2) = EqualityProof::prove(
            &gens_1,
            &mut prover_transcript,
            &mut random_tape,
            &v1,
            &s1,
            &v2,
            &s2,
        );

        let mut verifier_transcript = Transcript::new(b"example");
        assert!(proof
            .verify(&gens_1, &mut verifier_transcript, &C1, &C2)
            .is_ok());
    }

    #[test]
    fn check_productproof() {
        let gens_1 = MultiCommitGens::<G>::new(1, b"test-productproof");
        let x = Fr::rand(&mut OsRng);
        let rX = Fr::rand(&mut OsRng);
        let y = Fr::rand(&mut OsRng);
        let rY = Fr::rand(&mut OsRng);
        let z = x * y;
        let rZ = Fr::rand(&mut OsRng);

        let mut random_tape = RandomTape::new(b"proof");
        let mut prover_transcript = Transcript::new(b"example");
        let (proof, X, Y, Z) = ProductProof::prove(
            &gens_1,
            &mut prover_transcript,
            &mut random_tape,
            &x,
            &rX,
            &y,
            &rY,
            &z,
            &rZ,
        );

        let mut verifier_transcript = Transcript::new(b"example");
        assert!(proof
            .verify(&gens_1, &mut verifier_transcript, &X, &Y, &Z)
            .is_ok());
    }

    #[test]
    fn check_dotproductproof() {
        let n = 16;

        let gens_1 = MultiCommitGens::<G>::new(1, b"test-two");
        let gens_n = MultiCommitGens::<G>::new(n, b"test-n");

        let x: Vec<Fr> = (0..n).map(|_| Fr::rand(&mut OsRng)).collect();
        let a: Vec<Fr> = (0..n).map(|_| Fr::rand(&mut OsRng)).collect();
        let y = DotProductProof::<G>::compute_dotproduct(&x, &a);
        let r_x = Fr::rand(&mut OsRng);
        let r_y = Fr::rand(&mut OsRng);

        let mut random_tape = RandomTape::new(b"proof");
        let mut prover_transcript = Transcript::new(b"example");
        let (proof, Cx, Cy) = DotProductProof::prove(
            &gens_1,
            &gens_n,
            &mut prover_transcript,
            &mut random_tape,
            &x,
            &r_x,
            &a,
            &y,
            &r_y,
        );

        let mut verifier_transcript = Transcript::new(b"example");
        assert!(proof
            .verify(&gens_1, &gens_n, &mut verifier_transcript, &a, &Cx, &Cy)
            .is_ok());
    }

    #[test]
    fn check_dotproductproof_log() {
        let n = 16;

        let gens = DotProductProofGens::<G>::new(n, b"test-n");

        let x: Vec<Fr> = (0..n).map(|_| Fr::rand(&mut OsRng)).collect();
        let a: Vec<Fr> = (0..n).map(|_| Fr::rand(&mut OsRng)).collect();
        let y = DotProductProofLog::<G>::compute_dotproduct(&x, &a);

        let r_x = Fr::rand(&mut OsRng);
        let r_y = Fr::rand(&mut OsRng);

        let mut random_tape = RandomTape::new(b"proof");
        let mut prover_transcript = Transcript::new(b"example");
        let (proof, Cx, Cy) = DotProductProofLog::prove(
            &gens,
            &mut prover_transcript,
            &mut random_tape,
            &x,
            &r_x,
            &a,
            &y,
            &r_y,
        );

        let mut verifier_transcript = Transcript::new(b"example");
        assert!(proof
            .verify(n, &gens, &mut verifier_transcript, &a, &Cx, &Cy)
            .is_ok());
    }
}
