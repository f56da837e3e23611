mod base;
mod verifier;

pub use base::*;
pub use verifier::*;
