//! Error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum R1CSError {
    /// returned if a matrix entry points outside the constraint system
    #[error("Invalid index in R1CS matrix")]
    InvalidIndex,
    /// returned if a byte encoding is not a canonical field element
    #[error("Invalid scalar value")]
    InvalidScalar,
    /// returned if the supplied assignment has the wrong length
    #[error("Invalid number of inputs")]
    InvalidNumberOfInputs,
    /// returned if the witness does not satisfy the constraints
    #[error("Constraint system is not satisfiable")]
    NotSatisfiable,
    /// returned if inner-layer dimensions are not powers of 2
    #[error("Dimensions must be powers of 2")]
    InvalidDimensions,
}

#[derive(Error, Debug, Clone)]
pub enum ProofVerifyError {
    #[error("Proof verification failed: {0}")]
    VerificationFailed(String),
    #[error("Invalid proof format")]
    InvalidProof,
    /// returned if a compressed group element does not decode to a valid point
    #[error("Compressed group element failed to decompress")]
    DecompressionError,
    #[error("Sumcheck verification failed at round {0}")]
    SumcheckError(usize),
    #[error("Internal error")]
    InternalError,
}
