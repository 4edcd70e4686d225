#![allow(dead_code)]

mod fixtures;
mod mock_map_client;

pub use fixtures::ProofFixture;
pub use mock_map_client::MockMapClient;
