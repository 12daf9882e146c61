pub mod convert;
pub mod gating;
pub mod process;
