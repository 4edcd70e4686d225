//! Mapserver DNS Infrastructure Layer
pub mod dns;
pub mod map_client;
