//! Engine configuration model shared by ref-engines and CAS-engines.

pub mod config;
pub mod reference;

pub use config::EngineConfig;
pub use reference::EngineReference;
