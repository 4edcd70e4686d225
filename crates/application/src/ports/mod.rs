mod map_client;

pub use map_client::MapClient;

// Re-export for convenience
pub use mapserver_dns_domain::MapProof;
