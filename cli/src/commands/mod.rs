//! CLI command implementations

pub mod add_tx;
pub mod history;
pub mod info;
pub mod keygen;
pub mod prove;
