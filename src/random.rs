//! Random tape for prover randomness

use crate::transcript::ProofTranscript;
use ark_ff::PrimeField;
use core::marker::PhantomData;
use merlin::Transcript;
use rand::rngs::OsRng;

/// A private transcript keyed with fresh OS randomness; all prover blinds are
/// squeezed from it so proof generation is deterministic given the tape.
pub struct RandomTape<F: PrimeField> {
    tape: Transcript,
    _field: PhantomData<F>,
}

impl<F: PrimeField> RandomTape<F> {
    pub fn new(name: &'static [u8]) -> Self {
        let tape = {
            let mut rng = OsRng;
            let mut tape = Transcript::new(name);
            tape.append_scalar(b"init_randomness", &F::rand(&mut rng));
            tape
        };
        Self {
            tape,
            _field: PhantomData,
        }
    }

    pub fn random_scalar(&mut self, label: &'static [u8]) -> F {
        self.tape.challenge_scalar(label)
    }

    pub fn random_vector(&mut self, label: &'static [u8], len: usize) -> Vec<F> {
        self.tape.challenge_vector(label, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::Fr;

    #[test]
    fn test_random_tape() {
        let mut tape = RandomTape::<Fr>::new(b"test");
        let s1 = tape.random_scalar(b"r1");
        let s2 = tape.random_scalar(b"r2");
        assert_ne!(s1, s2);
    }

    #[test]
    fn test_random_vector() {
        let mut tape = RandomTape::<Fr>::new(b"test");
        let v = tape.random_vector(b"vec", 5);
        assert_eq!(v.len(), 5);
    }
}
