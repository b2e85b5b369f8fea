// sidenote-common: note types and wire formats shared across the sidenote crates

pub mod protocol;
pub mod transfer;
pub mod types;
