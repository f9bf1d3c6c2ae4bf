use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// Size of the per-direction copy buffer
const RELAY_BUF_SIZE: usize = 8 * 1024;

/// relay copies bytes between the client and the destination until either
/// direction finishes.
///
/// Each direction runs in its own task. When one of them hits EOF or an error
/// it shuts down the stream it was writing to and the other task is aborted,
/// so both connections are torn down together. Half-closed connections are not
/// kept alive.
pub async fn relay<A, B>(client: A, destination: B)
where
    A: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    B: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (client_read, client_write) = tokio::io::split(client);
    let (dest_read, dest_write) = tokio::io::split(destination);

    // Byte counters survive the aborted direction
    let from_client = Arc::new(AtomicU64::new(0));
    let from_server = Arc::new(AtomicU64::new(0));

    // Spawn one task per direction
    let mut upstream = tokio::spawn(forward(
        client_read,
        dest_write,
        Arc::clone(&from_client),
        "client -> destination",
    ));
    let mut downstream = tokio::spawn(forward(
        dest_read,
        client_write,
        Arc::clone(&from_server),
        "destination -> client",
    ));

    // Wait for either direction to complete
    let remaining = tokio::select! {
        _ = &mut upstream => downstream,
        _ = &mut downstream => upstream,
    };

    // Dropping the remaining halves closes both streams
    remaining.abort();
    let _ = remaining.await;

    info!(
        "connection closed: {} bytes from client, {} bytes from server",
        from_client.load(Ordering::Relaxed),
        from_server.load(Ordering::Relaxed)
    );
}

/// forward copies one direction, adding every byte written to `relayed`
async fn forward<R, W>(
    mut reader: R,
    mut writer: W,
    relayed: Arc<AtomicU64>,
    direction: &'static str,
) where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; RELAY_BUF_SIZE];

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => {
                debug!("{}: end of stream", direction);
                break;
            }
            Ok(n) => n,
            Err(e) => {
                debug!("{}: read failed: {}", direction, e);
                break;
            }
        };

        if let Err(e) = writer.write_all(&buf[..n]).await {
            debug!("{}: write failed: {}", direction, e);
            break;
        }

        relayed.fetch_add(n as u64, Ordering::Relaxed);
    }

    let _ = writer.shutdown().await;
}
