pub mod verifier;

pub use verifier::GoogleTokenVerifier;
