use mapserver_dns_application::use_cases::RequestStage;
use mapserver_dns_domain::FailurePolicy;
use mapserver_dns_infrastructure::dns::{DnsServerHandler, Transport};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tracing::{debug, error, info};

const UDP_RECV_BUFFER: usize = 4096;
const TCP_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn start_dns_server(
    bind_addr: String,
    handler: DnsServerHandler,
    policy: FailurePolicy,
) -> anyhow::Result<()> {
    let listeners = DnsListeners::bind(&bind_addr)?;
    info!(
        bind_address = %listeners.bind_addr,
        tcp_local_addr = ?listeners.tcp_local_addr().ok(),
        failure_policy = ?policy,
        "DNS server ready"
    );
    listeners.serve(handler, policy).await
}

/// UDP socket and TCP listener bound to the same address. Queries are
/// accepted as soon as `bind` returns.
pub struct DnsListeners {
    bind_addr: SocketAddr,
    udp: Arc<UdpSocket>,
    tcp: TcpListener,
}

impl DnsListeners {
    pub fn bind(bind_addr: &str) -> anyhow::Result<Self> {
        let socket_addr: SocketAddr = bind_addr.parse()?;
        let domain = if socket_addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };

        Ok(Self {
            bind_addr: socket_addr,
            udp: Arc::new(create_udp_socket(domain, socket_addr)?),
            tcp: create_tcp_listener(domain, socket_addr)?,
        })
    }

    pub fn tcp_local_addr(&self) -> std::io::Result<SocketAddr> {
        self.tcp.local_addr()
    }

    pub async fn serve(
        self,
        handler: DnsServerHandler,
        policy: FailurePolicy,
    ) -> anyhow::Result<()> {
        let handler = Arc::new(handler);
        tokio::try_join!(
            run_udp(self.udp, handler.clone(), policy),
            run_tcp(self.tcp, handler, policy),
        )?;
        Ok(())
    }
}

/// Reply for one query after the failure policy is applied.
async fn respond(
    handler: &DnsServerHandler,
    packet: &[u8],
    from: SocketAddr,
    transport: Transport,
    policy: FailurePolicy,
) -> Option<Vec<u8>> {
    match handler.handle(packet, from, transport).await {
        Ok(reply) => Some(reply),
        Err(e) => {
            debug!(
                client = %from,
                transport = transport.as_str(),
                stage = ?RequestStage::Errored,
                failure_policy = ?policy,
                error = %e,
                "Query failed"
            );
            match policy {
                FailurePolicy::ServFail => DnsServerHandler::servfail(packet),
                FailurePolicy::Drop => None,
            }
        }
    }
}

async fn run_udp(
    socket: Arc<UdpSocket>,
    handler: Arc<DnsServerHandler>,
    policy: FailurePolicy,
) -> anyhow::Result<()> {
    let mut recv_buf = [0u8; UDP_RECV_BUFFER];

    loop {
        let (n, from) = match socket.recv_from(&mut recv_buf).await {
            Ok(received) => received,
            Err(e) => {
                error!(error = %e, "UDP recv error");
                continue;
            }
        };

        let packet: Arc<[u8]> = Arc::from(&recv_buf[..n]);
        let handler = handler.clone();
        let socket = socket.clone();
        tokio::spawn(async move {
            if let Some(reply) = respond(&handler, &packet, from, Transport::Udp, policy).await {
                match socket.send_to(&reply, from).await {
                    Ok(_) => debug!(client = %from, stage = ?RequestStage::Sent),
                    Err(e) => error!(client = %from, error = %e, "UDP send error"),
                }
            }
        });
    }
}

async fn run_tcp(
    listener: TcpListener,
    handler: Arc<DnsServerHandler>,
    policy: FailurePolicy,
) -> anyhow::Result<()> {
    loop {
        let (stream, from) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!(error = %e, "TCP accept error");
                continue;
            }
        };

        let handler = handler.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_tcp_connection(stream, from, &handler, policy).await {
                debug!(client = %from, error = %e, "TCP connection closed");
            }
        });
    }
}

/// Answers length-prefixed queries until the client closes or goes idle.
async fn serve_tcp_connection(
    mut stream: TcpStream,
    from: SocketAddr,
    handler: &DnsServerHandler,
    policy: FailurePolicy,
) -> std::io::Result<()> {
    loop {
        let mut len_buf = [0u8; 2];
        match tokio::time::timeout(TCP_IDLE_TIMEOUT, stream.read_exact(&mut len_buf)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
            Ok(Err(e)) => return Err(e),
            Err(_) => return Ok(()),
        }

        let mut packet = vec![0u8; u16::from_be_bytes(len_buf) as usize];
        tokio::time::timeout(TCP_IDLE_TIMEOUT, stream.read_exact(&mut packet))
            .await
            .map_err(|_| std::io::Error::from(std::io::ErrorKind::TimedOut))??;

        let Some(reply) = respond(handler, &packet, from, Transport::Tcp, policy).await else {
            continue;
        };
        let reply_len = u16::try_from(reply.len()).map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("reply of {} bytes exceeds TCP message limit", reply.len()),
            )
        })?;

        stream.write_all(&reply_len.to_be_bytes()).await?;
        stream.write_all(&reply).await?;
        stream.flush().await?;
        debug!(client = %from, stage = ?RequestStage::Sent);
    }
}

fn create_udp_socket(domain: Domain, socket_addr: SocketAddr) -> anyhow::Result<UdpSocket> {
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.set_recv_buffer_size(512 * 1024)?;
    socket.set_send_buffer_size(512 * 1024)?;
    socket.bind(&socket_addr.into())?;
    socket.set_nonblocking(true)?;
    let std_socket: std::net::UdpSocket = socket.into();
    Ok(UdpSocket::from_std(std_socket)?)
}

fn create_tcp_listener(domain: Domain, socket_addr: SocketAddr) -> anyhow::Result<TcpListener> {
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;
    socket.set_nonblocking(true)?;
    let std_listener: std::net::TcpListener = socket.into();
    Ok(TcpListener::from_std(std_listener)?)
}
