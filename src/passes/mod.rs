//! Module-level transformation passes.

pub mod promote_verifier;

pub use promote_verifier::{
    IntrinsicDecl, VerifierIntrinsics, promote_function, promote_verifier_calls,
};
