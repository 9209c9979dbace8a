pub mod aggregate;
pub mod auth;
pub mod export;
pub mod roster;
pub mod sheets;

#[cfg(test)]
pub(crate) mod testing;
