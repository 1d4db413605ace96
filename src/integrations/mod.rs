//! External service integrations.

pub mod d4sign_client {
    pub use crate::d4sign_client::*;
}
