use mapserver_dns_domain::MapProof;
use mapserver_dns_infrastructure::map_client::protocol::{read_frame, write_frame};
use mapserver_dns_infrastructure::map_client::{GetProofForDomains, MapResponse};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

#[derive(Clone)]
pub enum MockBehavior {
    /// Answers with the known proofs for the requested domains, in request
    /// order, skipping unknown ones.
    Proofs(HashMap<String, MapProof>),
    /// Status-1 error response.
    Error(String),
    /// Announces a frame of this many bytes and sends nothing else.
    AnnounceLength(u32),
    /// Reads the request and never answers.
    Silent,
}

pub struct MockMapServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<GetProofForDomains>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockMapServer {
    pub async fn start(behavior: MockBehavior) -> Result<Self, std::io::Error> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let requests = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let recorded = Arc::clone(&requests);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    accepted = listener.accept() => {
                        let Ok((stream, _)) = accepted else { continue };
                        let behavior = behavior.clone();
                        let recorded = Arc::clone(&recorded);
                        tokio::spawn(async move {
                            let _ = Self::serve(stream, behavior, recorded).await;
                        });
                    }
                }
            }
        });

        Ok(Self {
            addr,
            requests,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    pub fn requests(&self) -> Vec<GetProofForDomains> {
        self.requests.lock().unwrap().clone()
    }

    async fn serve(
        mut stream: tokio::net::TcpStream,
        behavior: MockBehavior,
        recorded: Arc<Mutex<Vec<GetProofForDomains>>>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let payload = read_frame(&mut stream, 1 << 20).await?;
        let request = GetProofForDomains::decode(&payload)?;
        recorded.lock().unwrap().push(request.clone());

        let response = match behavior {
            MockBehavior::Proofs(proofs) => MapResponse::Proofs(
                request
                    .domains
                    .iter()
                    .filter_map(|d| proofs.get(d).cloned())
                    .collect(),
            ),
            MockBehavior::Error(message) => MapResponse::Error(message),
            MockBehavior::AnnounceLength(len) => {
                stream.write_all(&len.to_be_bytes()).await?;
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                return Ok(());
            }
            MockBehavior::Silent => {
                tokio::time::sleep(std::time::Duration::from_secs(30)).await;
                return Ok(());
            }
        };

        write_frame(&mut stream, &response.encode()?).await?;
        Ok(())
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockMapServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
