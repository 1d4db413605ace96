// Domain-layer modules and shared errors
pub mod deal_models {
    pub use crate::deal_models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
