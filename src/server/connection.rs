//! Per-connection session loop (C7).
//!
//! Grounded in the teacher's `server/connection.rs` `HttpConnection::run`:
//! reset-parse-handle-write-repeat until the connection should close. The
//! state machine is simplified since there is no HTTP/0.9+ path and no
//! connection-lifetime/request-count expiry to track (§5 says the only
//! timed wait in this system is the shutdown drain, not per-connection).

use crate::errors::AppError;
use crate::http::request::Parser;
use crate::http::response::{error_response, Response};
use crate::http::types::Version;
use crate::limits::{ConnLimits, ReqLimits};
use crate::router::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::warn;

/// Runs the request/response loop for one accepted connection until the
/// peer closes it or a `Connection: close` is observed (§4.7).
pub(crate) async fn run(stream: TcpStream, router: Arc<Router>, conn_limits: ConnLimits, req_limits: ReqLimits) {
    let (read_half, mut write_half) = stream.into_split();
    let mut parser = Parser::new(read_half, req_limits, conn_limits.socket_read_timeout);

    loop {
        let parsed = match parser.parse().await {
            Ok(Some(parsed)) => parsed,
            Ok(None) => return,
            Err(_) => return,
        };

        let (bytes, keep_alive) = match parsed {
            Ok(request) => {
                let close_requested = request.header("Connection") == Some("close");
                let mut response = match router.dispatch(&request).await {
                    Ok(response) => response,
                    Err(err) => build_error_response(&err),
                };
                if close_requested {
                    response.close();
                }
                let keep_alive = response.keep_alive();
                (response.serialize(request.version()), keep_alive)
            }
            // A parser exception always terminates the session (§4.7).
            Err(parse_err) => {
                warn!(target: "connection", "parse error, closing connection: {parse_err}");
                (error_response(Version::Http11, &parse_err.into()), false)
            }
        };

        if write_all(&mut write_half, &bytes, conn_limits.socket_write_timeout).await.is_err() {
            warn!(target: "connection", "write failed, closing connection");
            return;
        }
        if !keep_alive {
            return;
        }
    }
}

fn build_error_response(err: &AppError) -> Response {
    let mut resp = Response::new();
    resp.status(err.status());
    resp.body_with("application/json", err.envelope());
    resp
}

async fn write_all(stream: &mut OwnedWriteHalf, bytes: &[u8], write_timeout: Duration) -> std::io::Result<()> {
    timeout(write_timeout, stream.write_all(bytes))
        .await
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "socket write timed out"))?
}
