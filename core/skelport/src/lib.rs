pub mod classify;
pub mod discover;
pub mod export;
pub mod naming;
pub mod runtime;
#[cfg(feature = "spine")] pub mod spine;

pub use export::*;
