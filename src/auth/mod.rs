//! Bearer-credential verification against the backend session service.

pub mod principal;
pub mod verifier;

pub use principal::{AuthContext, AuthOutcome, Principal};
pub use verifier::AuthVerifier;
