#![allow(dead_code)]

mod fixtures;
mod map_server_mock;

pub use fixtures::{
    signed_proof, signed_proof_with_entry, test_key_pair, test_public_key, TREE_ID, TREE_NONCE,
};
pub use map_server_mock::{MockBehavior, MockMapServer};
