// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::constants::RATIO_DISPLAY_PLACES;
use crate::common::error::AppError;
use crate::common::parsing::parse_address;
use crate::domain::position::{AccountPosition, format_bps};
use crate::guardian::{GuardianService, RegistrationRequest};
use alloy::primitives::Address;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

const MAX_REQUEST_BYTES: usize = 64 * 1024;
const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(10);

struct Request {
    method: String,
    route: String,
    query: String,
    body: Vec<u8>,
}

struct Response {
    status: &'static str,
    content_type: &'static str,
    body: String,
}

impl Response {
    fn json(status: &'static str, body: Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    fn error(status: &'static str, err: &AppError) -> Self {
        Self::json(
            status,
            json!({"error": err.to_string(), "category": err.category()}),
        )
    }

    fn into_http(self) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status,
            self.content_type,
            self.body.len(),
            self.body
        )
    }
}

/// Binds the JSON API and serves it until `shutdown` fires.
pub async fn spawn_api_server(
    addr: SocketAddr,
    service: Arc<GuardianService>,
    shutdown: CancellationToken,
) -> Result<SocketAddr, AppError> {
    spawn_api_server_with_timeout(addr, service, shutdown, REQUEST_READ_TIMEOUT).await
}

/// Same as `spawn_api_server`; clients that don't finish sending a request
/// within `read_timeout` get a 408 and are disconnected.
pub async fn spawn_api_server_with_timeout(
    addr: SocketAddr,
    service: Arc<GuardianService>,
    shutdown: CancellationToken,
    read_timeout: Duration,
) -> Result<SocketAddr, AppError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("API server failed to bind {addr}: {e}")))?;
    let local = listener
        .local_addr()
        .map_err(|e| AppError::Config(format!("API server address: {e}")))?;
    tracing::info!(target: "api", addr = %local, "API server listening");

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!(target: "api", "API server stopped");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((socket, peer)) => {
                        let service = service.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(socket, &service, read_timeout).await {
                                tracing::debug!(target: "api", peer = %peer, error = %e, "Connection dropped");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::warn!(target: "api", error = %e, "API accept error");
                        continue;
                    }
                }
            }
        }
    });

    Ok(local)
}

async fn handle_connection(
    mut socket: TcpStream,
    service: &GuardianService,
    read_timeout: Duration,
) -> std::io::Result<()> {
    let read = tokio::time::timeout(read_timeout, read_request(&mut socket)).await;
    let response = match read {
        Ok(Ok(Some(request))) => {
            tracing::debug!(target: "api", method = %request.method, route = %request.route, "Request");
            route(request, service).await
        }
        Ok(Ok(None)) => Response::json("400 Bad Request", json!({"error": "malformed request"})),
        Ok(Err(e)) => return Err(e),
        Err(_) => {
            tracing::debug!(target: "api", timeout_ms = read_timeout.as_millis() as u64, "Request read timed out");
            Response::json("408 Request Timeout", json!({"error": "request timed out"}))
        }
    };
    socket.write_all(response.into_http().as_bytes()).await?;
    socket.shutdown().await
}

/// Reads the head and a `Content-Length` body. `None` for unparseable input.
async fn read_request(socket: &mut TcpStream) -> std::io::Result<Option<Request>> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    let head_end = loop {
        if let Some(pos) = find_head_end(&buf) {
            break pos;
        }
        if buf.len() > MAX_REQUEST_BYTES {
            return Ok(None);
        }
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.lines();
    let Some(request_line) = lines.next() else {
        return Ok(None);
    };
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
        return Ok(None);
    };
    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    if content_length > MAX_REQUEST_BYTES {
        return Ok(None);
    }

    let mut body = buf[head_end + 4..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);

    let (route, query) = target.split_once('?').unwrap_or((target, ""));
    Ok(Some(Request {
        method: method.to_ascii_uppercase(),
        route: route.to_string(),
        query: query.to_string(),
        body,
    }))
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn query_param(query: &str, key: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

fn address_param(query: &str) -> Result<Address, AppError> {
    let raw = query_param(query, "address")
        .ok_or_else(|| AppError::validation("address", "missing query parameter"))?;
    parse_address("address", &raw)
}

async fn route(request: Request, service: &GuardianService) -> Response {
    match (request.method.as_str(), request.route.as_str()) {
        ("GET", "/api/state") => match address_param(&request.query) {
            Ok(user) => match service.position(user).await {
                Ok(position) => Response::json(
                    "200 OK",
                    render_state(&position, service.repayment_contract()),
                ),
                Err(e) => Response::error("400 Bad Request", &e),
            },
            Err(e) => Response::error("400 Bad Request", &e),
        },
        ("GET", "/api/cert") => Response::json("200 OK", service.certificate().typed_data()),
        ("POST", "/api/register") => register(&request.body, service).await,
        ("GET", "/api/status") => match address_param(&request.query) {
            Ok(user) => match service.account(&user) {
                Some(account) => Response::json(
                    "200 OK",
                    json!({
                        "account": account.user.to_string(),
                        "state": account.state(),
                        "threshold": format_bps(account.threshold_bps()),
                    }),
                ),
                None => Response::error(
                    "404 Not Found",
                    &AppError::NotFound(format!("account {user} is not registered")),
                ),
            },
            Err(e) => Response::error("400 Bad Request", &e),
        },
        ("GET", "/metrics") => Response {
            status: "200 OK",
            content_type: "text/plain; version=0.0.4",
            body: service.stats().render(service.monitored_accounts()),
        },
        _ => Response::json("404 Not Found", json!({"error": "not found"})),
    }
}

async fn register(body: &[u8], service: &GuardianService) -> Response {
    let request: RegistrationRequest = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => {
            let err = AppError::validation("body", format!("couldn't parse registration: {e}"));
            return Response::error("400 Bad Request", &err);
        }
    };
    match service.register(&request).await {
        Ok(outcome) => {
            // Updating a finished account changes nothing on chain; say so.
            let state = parse_address("user", request.user.trim())
                .ok()
                .and_then(|user| service.account(&user))
                .map(|account| account.state());
            Response::json(
                "200 OK",
                json!({
                    "status": outcome.as_str(),
                    "account": request.user.trim(),
                    "state": state,
                    "guarded": state.is_some_and(|s| !s.is_terminal()),
                }),
            )
        }
        Err(e) => Response::error("400 Bad Request", &e),
    }
}

fn render_state(position: &AccountPosition, contract: Address) -> Value {
    let loan = &position.loan;
    json!({
        "collateral-name": loan.collateral_name,
        "collateral-address": loan.collateral.to_string(),
        "collateral-amount": position.collateral_amount.to_string(),
        "a-token-address": loan.a_token.to_string(),
        "debt-name": loan.debt_name,
        "debt-address": loan.debt.to_string(),
        "debt-amount": position.debt_amount.to_string(),
        "current-ratio": position.ratio.to_fixed(RATIO_DISPLAY_PLACES),
        "liquidation-threshold": loan.liquidation_threshold_display(),
        "contract-address": contract.to_string(),
    })
}
