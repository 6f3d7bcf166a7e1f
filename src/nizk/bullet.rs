//! Bullet reduction proof for logarithmic-size inner product arguments

use crate::errors::ProofVerifyError;
use crate::group::{CompressedGroup, GroupElementExt};
use crate::math::Math;
use crate::transcript::{AppendToTranscript, ProofTranscript};
use ark_ec::CurveGroup;
use ark_ff::{Field, PrimeField};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use merlin::Transcript;

#[derive(Debug, Clone, CanonicalSerialize, CanonicalDeserialize)]
pub struct BulletReductionProof {
    L_vec: Vec<CompressedGroup>,
    R_vec: Vec<CompressedGroup>,
}

impl BulletReductionProof {
    /// Create an inner-product argument for the relation:
    /// Gamma = <a,G> + <a,b>*Q + blind*H
    #[allow(clippy::too_many_arguments)]
    pub fn prove<G: CurveGroup>(
        transcript: &mut Transcript,
        Q: &G,
        G_vec: &[G],
        H: &G,
        a_vec: &[G::ScalarField],
        b_vec: &[G::ScalarField],
        blind: &G::ScalarField,
        blinds_vec: &[(G::ScalarField, G::ScalarField)],
    ) -> (
        BulletReductionProof,
        G,              // Gamma
        G::ScalarField, // a_hat
        G::ScalarField, // b_hat
        G,              // g_hat
        G::ScalarField, // rhat_Gamma
    ) {
        let mut n = G_vec.len();
        assert_eq!(a_vec.len(), n);
        assert_eq!(b_vec.len(), n);
        assert!(n.is_power_of_two());

        let lg_n = n.log_2();
        assert_eq!(blinds_vec.len(), lg_n);

        let mut G_fold: Vec<G> = G_vec.to_vec();
        let mut a: Vec<G::ScalarField> = a_vec.to_vec();
        let mut b: Vec<G::ScalarField> = b_vec.to_vec();

        let mut L_vec: Vec<CompressedGroup> = Vec::with_capacity(lg_n);
        let mut R_vec: Vec<CompressedGroup> = Vec::with_capacity(lg_n);

        // Gamma is a commitment to a_vec with base Q and blinding factor blind
        let Gamma = G::vartime_multiscalar_mul(&a, &G_fold)
            + *Q * compute_dotproduct(&a, &b)
            + *H * *blind;

        let mut blind_Gamma = *blind;

        for i in 0..lg_n {
            n /= 2;

            let (a_L, a_R) = a.split_at(n);
            let (b_L, b_R) = b.split_at(n);
            let (G_L, G_R) = G_fold.split_at(n);

            let c_L = compute_dotproduct(a_L, b_R);
            let c_R = compute_dotproduct(a_R, b_L);

            let (blind_L, blind_R) = blinds_vec[i];

            let L = G::vartime_multiscalar_mul(a_L, G_R) + *Q * c_L + *H * blind_L;
            let R = G::vartime_multiscalar_mul(a_R, G_L) + *Q * c_R + *H * blind_R;

            L.compress().append_to_transcript(b"L", transcript);
            R.compress().append_to_transcript(b"R", transcript);

            let u: G::ScalarField = transcript.challenge_scalar(b"u");
            let u_inv = u.inverse().unwrap();

            // Fold the generators
            G_fold = G_L
                .iter()
                .zip(G_R.iter())
                .map(|(g_L, g_R)| *g_L * u_inv + *g_R * u)
                .collect();

            // Fold the scalars
            a = a_L
                .iter()
                .zip(a_R.iter())
                .map(|(a_L, a_R)| u * *a_L + u_inv * *a_R)
                .collect();

            b = b_L
                .iter()
                .zip(b_R.iter())
                .map(|(b_L, b_R)| u_inv * *b_L + u * *b_R)
                .collect();

            blind_Gamma = u * u * blind_L + blind_Gamma + u_inv * u_inv * blind_R;

            L_vec.push(L.compress());
            R_vec.push(R.compress());
        }

        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
        assert_eq!(G_fold.len(), 1);

        (
            BulletReductionProof { L_vec, R_vec },
            Gamma,
            a[0],
            b[0],
            G_fold[0],
            blind_Gamma,
        )
    }

    /// Fold the commitment and generators with the recomputed challenges;
    /// the caller performs the final equality check
    pub fn verify<G: CurveGroup>(
        &self,
        n: usize,
        b_vec: &[G::ScalarField],
        transcript: &mut Transcript,
        Gamma: &G,
        G_vec: &[G],
    ) -> Result<(G, G, G::ScalarField), ProofVerifyError> {
        assert_eq!(b_vec.len(), n);
        assert_eq!(G_vec.len(), n);
        assert!(n.is_power_of_two());

        let lg_n = n.log_2();
        if self.L_vec.len() != lg_n || self.R_vec.len() != lg_n {
            return Err(ProofVerifyError::InvalidProof);
        }

        let mut u_vec: Vec<G::ScalarField> = Vec::with_capacity(lg_n);

        for i in 0..lg_n {
            self.L_vec[i].append_to_transcript(b"L", transcript);
            self.R_vec[i].append_to_transcript(b"R", transcript);
            u_vec.push(transcript.challenge_scalar(b"u"));
        }

        // per-generator scaling factors implied by the folding challenges
        let s = compute_s(&u_vec);

        let g_hat = G::vartime_multiscalar_mul(&s, G_vec);
        let b_hat = compute_dotproduct(&s, b_vec);

        // Gamma_hat from the L's and R's
        let Gamma_hat = {
            let u_sq: Vec<G::ScalarField> = u_vec.iter().map(|u| *u * *u).collect();
            let u_sq_inv: Vec<G::ScalarField> =
                u_sq.iter().map(|u_sq| u_sq.inverse().unwrap()).collect();

            let L_decomp: Vec<G> = self
                .L_vec
                .iter()
                .map(|L| L.decompress())
                .collect::<Result<Vec<G>, _>>()?;
            let R_decomp: Vec<G> = self
                .R_vec
                .iter()
                .map(|R| R.decompress())
                .collect::<Result<Vec<G>, _>>()?;

            let Gamma_L = G::vartime_multiscalar_mul(&u_sq, &L_decomp);
            let Gamma_R = G::vartime_multiscalar_mul(&u_sq_inv, &R_decomp);

            Gamma_L + *Gamma + Gamma_R
        };

        Ok((g_hat, Gamma_hat, b_hat))
    }
}

fn compute_dotproduct<F: PrimeField>(a: &[F], b: &[F]) -> F {
    assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(a_i, b_i)| *a_i * *b_i).sum()
}

/// Compute the per-element subset-product scalars from the u challenges
fn compute_s<F: PrimeField>(u_vec: &[F]) -> Vec<F> {
    let lg_n = u_vec.len();
    let n = 1 << lg_n;

    let u_inv: Vec<F> = u_vec.iter().map(|u| u.inverse().unwrap()).collect();

    let mut s: Vec<F> = vec![F::one(); n];
    for i in 0..n {
        for j in 0..lg_n {
            if i >> j & 1 == 1 {
                s[i] *= u_vec[lg_n - 1 - j];
            } else {
                s[i] *= u_inv[lg_n - 1 - j];
            }
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commitments::MultiCommitGens;
    use ark_bls12_381::{Fr, G1Projective};
    use ark_ec::PrimeGroup;
    use ark_std::UniformRand;
    use rand::rngs::OsRng;

    #[test]
    fn test_bullet_reduction_proof() {
        let n = 8;

        let gens = MultiCommitGens::<G1Projective>::new(n, b"test-gens");
        let G = gens.G.clone();
        let H = gens.h;
        let Q = G1Projective::generator();

        let a: Vec<Fr> = (0..n).map(|_| Fr::rand(&mut OsRng)).collect();
        let b: Vec<Fr> = (0..n).map(|_| Fr::rand(&mut OsRng)).collect();
        let blind = Fr::rand(&mut OsRng);

        let lg_n = n.log_2();
        let blinds_vec: Vec<(Fr, Fr)> = (0..lg_n)
            .map(|_| (Fr::rand(&mut OsRng), Fr::rand(&mut OsRng)))
            .collect();

        let mut prover_transcript = Transcript::new(b"test");
        let (proof, Gamma, a_hat, b_hat, g_hat, _rhat_Gamma) = BulletReductionProof::prove(
            &mut prover_transcript,
            &Q,
            &G,
            &H,
            &a,
            &b,
            &blind,
            &blinds_vec,
        );

        let mut verifier_transcript = Transcript::new(b"test");
        let (g_hat_v, Gamma_hat, b_hat_v) = proof
            .verify(n, &b, &mut verifier_transcript, &Gamma, &G)
            .unwrap();

        assert_eq!(g_hat, g_hat_v);
        assert_eq!(b_hat, b_hat_v);
        // the folded commitment opens to (a_hat, a_hat * b_hat) under (g_hat, Q)
        assert_eq!(
            Gamma_hat,
            g_hat_v * a_hat + Q * (a_hat * b_hat) + H * _rhat_Gamma
        );
    }
}
