//! Concrete packet layouts for the handshake, login, and play states this
//! proxy touches.

pub mod handshake;
pub mod login;
pub mod play;

pub use handshake::Handshake;
pub use login::{EncryptionRequest, EncryptionResponse, LoginDisconnect, LoginStart, LoginSuccess};
pub use play::{ChatMessageClientbound, ChatMessageServerbound, PlayDisconnect};
