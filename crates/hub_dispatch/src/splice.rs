use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// SPLICE (§4.5 step 7): full-duplex forwarding between the client and the
/// committed upstream leg. Two unidirectional pumps race via `select!`;
/// whichever side closes or errors first ends the connection, and both
/// halves are dropped (closing both sockets) once either pump returns.
pub async fn splice(client: TcpStream, upstream: TcpStream) {
    let (mut client_read, mut client_write) = client.into_split();
    let (mut upstream_read, mut upstream_write) = upstream.into_split();

    let client_to_upstream = async {
        let mut buf = [0u8; 4096];
        loop {
            let n = match client_read.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => n,
            };
            if upstream_write.write_all(&buf[..n]).await.is_err() {
                return;
            }
        }
    };

    let upstream_to_client = async {
        let mut buf = [0u8; 4096];
        loop {
            let n = match upstream_read.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => n,
            };
            if client_write.write_all(&buf[..n]).await.is_err() {
                return;
            }
        }
    };

    tokio::select! {
        _ = client_to_upstream => {}
        _ = upstream_to_client => {}
    }
}
