// src/core/mod.rs

pub mod colibri;
pub mod flower;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;
