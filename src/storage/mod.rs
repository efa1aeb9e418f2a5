pub mod credentials;
pub mod persistence;

pub use credentials::CredentialStore;
pub use persistence::{decode_key, encode_key};
