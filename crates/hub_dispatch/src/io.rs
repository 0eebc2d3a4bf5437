use std::time::Duration;

use bytes::BytesMut;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// READ_PROLOGUE (§4.5 step 1): up to 4096 bytes from the client with a
/// deadline. Zero bytes or a timeout both mean CLOSE, so both collapse to
/// `None` here.
pub async fn read_prologue(stream: &mut TcpStream, deadline: Duration) -> Option<BytesMut> {
    let mut tmp = [0u8; 4096];
    let n = match timeout(deadline, stream.read(&mut tmp)).await {
        Ok(Ok(n)) => n,
        Ok(Err(_)) | Err(_) => return None,
    };
    if n == 0 {
        return None;
    }
    let mut buf = BytesMut::with_capacity(n);
    buf.extend_from_slice(&tmp[..n]);
    Some(buf)
}

/// CONNECT_UPSTREAM (§4.5 step 3): parse `scheme://host:port` and open a TCP
/// connection with a deadline.
pub async fn connect_upstream(url: &str, deadline: Duration) -> anyhow::Result<TcpStream> {
    let addr = host_port(url)?;
    match timeout(deadline, TcpStream::connect(addr)).await {
        Ok(res) => Ok(res?),
        Err(_) => anyhow::bail!("connect timeout to upstream '{url}'"),
    }
}

fn host_port(url: &str) -> anyhow::Result<&str> {
    url.splitn(2, "://")
        .nth(1)
        .filter(|rest| !rest.is_empty())
        .ok_or_else(|| anyhow::anyhow!("upstream url '{url}' has no host:port"))
}

/// SNIFF (§4.5 step 6): up to 4096 bytes of the upstream's first read, with a
/// deadline. Unlike the prologue read, an EOF here (upstream closed before
/// sending anything) counts as a failed leg, not a silent empty splice.
pub async fn read_sniff(stream: &mut TcpStream, deadline: Duration) -> anyhow::Result<BytesMut> {
    let mut tmp = [0u8; 4096];
    let n = match timeout(deadline, stream.read(&mut tmp)).await {
        Ok(Ok(n)) => n,
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => anyhow::bail!("sniff read timeout"),
    };
    if n == 0 {
        anyhow::bail!("upstream closed before responding");
    }
    let mut buf = BytesMut::with_capacity(n);
    buf.extend_from_slice(&tmp[..n]);
    Ok(buf)
}
