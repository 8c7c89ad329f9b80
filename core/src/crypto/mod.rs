pub mod types;
pub mod aad;
pub mod aead;
pub mod kdf;
pub mod nonce;

pub use types::*;
pub use aad::*;
pub use aead::*;
pub use kdf::*;
pub use nonce::*;
