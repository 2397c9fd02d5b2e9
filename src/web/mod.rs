pub(crate) mod asset;
pub mod server;
