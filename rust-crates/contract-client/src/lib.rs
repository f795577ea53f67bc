pub mod bindings;
pub mod deployment;
pub mod pasanaku;

pub use pasanaku::PasanakuRpc;
