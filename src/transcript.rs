//! Fiat-Shamir transcript using Merlin

use crate::group::CompressedGroup;
use ark_ff::PrimeField;
use merlin::Transcript;

/// Trait for objects that absorb themselves into a transcript
pub trait AppendToTranscript {
    fn append_to_transcript(&self, label: &'static [u8], transcript: &mut Transcript);
}

/// Extension trait for Transcript to absorb field/group data and squeeze challenges
pub trait ProofTranscript {
    /// Append a protocol name to the transcript
    fn append_protocol_name(&mut self, protocol_name: &'static [u8]);

    /// Append a scalar to the transcript
    fn append_scalar<F: PrimeField>(&mut self, label: &'static [u8], scalar: &F);

    /// Append multiple scalars to the transcript
    fn append_scalars<F: PrimeField>(&mut self, label: &'static [u8], scalars: &[F]);

    /// Append a compressed group element to the transcript
    fn append_point(&mut self, label: &'static [u8], point: &CompressedGroup);

    /// Squeeze a challenge scalar (64 uniform bytes, wide reduction)
    fn challenge_scalar<F: PrimeField>(&mut self, label: &'static [u8]) -> F;

    /// Squeeze a vector of challenge scalars
    fn challenge_vector<F: PrimeField>(&mut self, label: &'static [u8], n: usize) -> Vec<F>;
}

impl ProofTranscript for Transcript {
    fn append_protocol_name(&mut self, protocol_name: &'static [u8]) {
        self.append_message(b"protocol-name", protocol_name);
    }

    fn append_scalar<F: PrimeField>(&mut self, label: &'static [u8], scalar: &F) {
        let mut buf = Vec::new();
        scalar
            .serialize_compressed(&mut buf)
            .expect("serialization into a Vec is infallible");
        self.append_message(label, &buf);
    }

    fn append_scalars<F: PrimeField>(&mut self, label: &'static [u8], scalars: &[F]) {
        for scalar in scalars {
            self.append_scalar(label, scalar);
        }
    }

    fn append_point(&mut self, label: &'static [u8], point: &CompressedGroup) {
        self.append_message(label, point.as_bytes());
    }

    fn challenge_scalar<F: PrimeField>(&mut self, label: &'static [u8]) -> F {
        let mut buf = [0u8; 64];
        self.challenge_bytes(label, &mut buf);
        F::from_le_bytes_mod_order(&buf)
    }

    fn challenge_vector<F: PrimeField>(&mut self, label: &'static [u8], n: usize) -> Vec<F> {
        (0..n).map(|_| self.challenge_scalar(label)).collect()
    }
}

impl AppendToTranscript for CompressedGroup {
    fn append_to_transcript(&self, label: &'static [u8], transcript: &mut Transcript) {
        transcript.append_point(label, self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::Fr;

    #[test]
    fn test_challenges_are_deterministic() {
        let run = || {
            let mut t = Transcript::new(b"test");
            t.append_protocol_name(b"unit");
            t.append_scalar(b"x", &Fr::from(42u64));
            t.challenge_scalar::<Fr>(b"c")
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_label_divergence_changes_challenges() {
        let mut t1 = Transcript::new(b"test");
        let mut t2 = Transcript::new(b"test");
        t1.append_scalar(b"x", &Fr::from(42u64));
        t2.append_scalar(b"y", &Fr::from(42u64));
        assert_ne!(
            t1.challenge_scalar::<Fr>(b"c"),
            t2.challenge_scalar::<Fr>(b"c")
        );
    }

    #[test]
    fn test_operand_divergence_changes_challenges() {
        let mut t1 = Transcript::new(b"test");
        let mut t2 = Transcript::new(b"test");
        t1.append_scalar(b"x", &Fr::from(1u64));
        t2.append_scalar(b"x", &Fr::from(2u64));
        assert_ne!(
            t1.challenge_scalar::<Fr>(b"c"),
            t2.challenge_scalar::<Fr>(b"c")
        );
    }
}
