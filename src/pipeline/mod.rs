pub mod cancel;
pub mod chain;
pub mod channel;
pub(crate) mod config;
pub mod pipe;
pub mod runtime;
pub mod transform;
