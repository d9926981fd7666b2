// ABOUTME: Minimal HTTP/1 JSON client over TCP using hyper.
// ABOUTME: One connection per call; the hub and the CLI use it to reach peers.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{CONTENT_TYPE, HOST};
use hyper::{Method, Request};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::net::TcpStream;

use super::error::ConnectionError;
use super::messages::ErrorBody;

/// POST a JSON body to `path` on `addr` and decode the JSON reply.
pub async fn post_json<Req, Resp>(addr: &str, path: &str, body: &Req) -> Result<Resp, ConnectionError>
where
    Req: Serialize + ?Sized,
    Resp: DeserializeOwned,
{
    let payload = serde_json::to_vec(body).map_err(|e| ConnectionError::Request {
        addr: addr.to_string(),
        reason: format!("failed to encode request: {}", e),
    })?;
    let bytes = send(addr, Method::POST, path, Bytes::from(payload)).await?;
    decode(addr, &bytes)
}

/// GET `path` on `addr` and decode the JSON reply.
pub async fn get_json<Resp>(addr: &str, path: &str) -> Result<Resp, ConnectionError>
where
    Resp: DeserializeOwned,
{
    let bytes = send(addr, Method::GET, path, Bytes::new()).await?;
    decode(addr, &bytes)
}

fn decode<Resp: DeserializeOwned>(addr: &str, bytes: &[u8]) -> Result<Resp, ConnectionError> {
    serde_json::from_slice(bytes).map_err(|e| ConnectionError::Decode {
        addr: addr.to_string(),
        reason: e.to_string(),
    })
}

async fn send(addr: &str, method: Method, path: &str, body: Bytes) -> Result<Bytes, ConnectionError> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|e| ConnectionError::Connect {
            addr: addr.to_string(),
            reason: e.to_string(),
        })?;

    let io = TokioIo::new(stream);

    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|e| ConnectionError::Connect {
            addr: addr.to_string(),
            reason: format!("HTTP handshake failed: {}", e),
        })?;

    // Spawn connection handler
    let conn_addr = addr.to_string();
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!("connection to {} closed with error: {}", conn_addr, e);
        }
    });

    let req = Request::builder()
        .method(method)
        .uri(path)
        .header(HOST, addr)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(body))
        .map_err(|e| ConnectionError::Request {
            addr: addr.to_string(),
            reason: format!("failed to build request: {}", e),
        })?;

    let resp = sender
        .send_request(req)
        .await
        .map_err(|e| ConnectionError::Request {
            addr: addr.to_string(),
            reason: e.to_string(),
        })?;

    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .map_err(|e| ConnectionError::Request {
            addr: addr.to_string(),
            reason: format!("failed to read response: {}", e),
        })?
        .to_bytes();

    if !status.is_success() {
        let message = serde_json::from_slice::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
        return Err(ConnectionError::Remote {
            addr: addr.to_string(),
            status: status.as_u16(),
            message,
        });
    }

    Ok(body)
}
