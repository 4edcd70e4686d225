pub mod protocol;
pub mod tcp;

pub use protocol::{FrameError, GetProofForDomains, MapResponse};
pub use tcp::TcpMapClient;
