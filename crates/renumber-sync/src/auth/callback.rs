use crate::error::{Result, SyncError};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::Duration;
use subtle::ConstantTimeEq;
use tracing::debug;
use url::Url;

const CALLBACK_PATH: &str = "/";
const READ_TIMEOUT: Duration = Duration::from_secs(10);

const SUCCESS_HTML: &str =
    "<html><body><h1>Authentication successful</h1><p>You may close this window.</p></body></html>";
const ERROR_HTML: &str =
    "<html><body><h1>Authentication failed</h1><p>You may close this window and retry.</p></body></html>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackPayload {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// One-shot loopback listener that receives the OAuth redirect.
#[derive(Debug)]
pub struct CallbackListener {
    listener: TcpListener,
    port: u16,
}

impl CallbackListener {
    /// Binds `127.0.0.1:port`; port 0 picks a free one.
    pub fn bind(port: u16) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port)).map_err(|err| {
            SyncError::Auth(format!("oauth callback bind on port {port} failed: {err}"))
        })?;
        let port = listener.local_addr()?.port();
        Ok(Self { listener, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}{}", self.port, CALLBACK_PATH)
    }

    /// Blocks until the browser delivers the redirect. Stray requests such
    /// as favicon lookups get a 404 and are ignored.
    pub fn wait(self, expected_state: &str) -> Result<CallbackPayload> {
        loop {
            let (mut socket, _) = self.listener.accept()?;
            socket.set_read_timeout(Some(READ_TIMEOUT))?;

            let request = match read_request(&mut socket) {
                Ok(request) => request,
                Err(err) => {
                    debug!(error = %err, "ignoring unreadable callback request");
                    continue;
                }
            };
            let payload = match extract_request_target(&request).and_then(parse_callback_target)
            {
                Ok(payload) => payload,
                Err(err) => {
                    debug!(error = %err, "ignoring unexpected callback request");
                    respond(&mut socket, "HTTP/1.1 404 Not Found", "");
                    continue;
                }
            };

            validate_state(&payload, expected_state)?;
            if payload.error.is_some() {
                respond(&mut socket, "HTTP/1.1 400 Bad Request", ERROR_HTML);
            } else {
                respond(&mut socket, "HTTP/1.1 200 OK", SUCCESS_HTML);
            }
            return Ok(payload);
        }
    }
}

fn read_request(socket: &mut TcpStream) -> Result<String> {
    let mut buffer = vec![0u8; 8192];
    let size = socket.read(&mut buffer)?;
    if size == 0 {
        return Err(SyncError::Auth("oauth callback request is empty".to_string()));
    }
    Ok(String::from_utf8_lossy(&buffer[..size]).into_owned())
}

fn respond(socket: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "{status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes());
    let _ = socket.flush();
}

fn extract_request_target(request: &str) -> Result<&str> {
    let first = request
        .lines()
        .next()
        .ok_or_else(|| SyncError::Auth("oauth callback malformed request".to_string()))?;
    let mut parts = first.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let target = parts.next().unwrap_or_default();
    if method != "GET" || target.is_empty() {
        return Err(SyncError::Auth("oauth callback must be GET".to_string()));
    }
    Ok(target)
}

pub fn parse_callback_target(target: &str) -> Result<CallbackPayload> {
    let url = Url::parse(&format!("http://127.0.0.1{target}"))?;
    if url.path() != CALLBACK_PATH {
        return Err(SyncError::Auth("invalid oauth callback path".to_string()));
    }

    let mut code: Option<String> = None;
    let mut state: Option<String> = None;
    let mut error: Option<String> = None;
    let mut error_description: Option<String> = None;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.to_string()),
            "state" => state = Some(value.to_string()),
            "error" => error = Some(value.to_string()),
            "error_description" => error_description = Some(value.to_string()),
            _ => {}
        }
    }

    if code.is_none() && error.is_none() {
        return Err(SyncError::Auth("oauth callback missing code/error".to_string()));
    }

    Ok(CallbackPayload {
        code,
        state,
        error,
        error_description,
    })
}

fn validate_state(payload: &CallbackPayload, expected_state: &str) -> Result<()> {
    let state = payload
        .state
        .as_deref()
        .ok_or_else(|| SyncError::Auth("oauth callback missing state".to_string()))?;
    if !bool::from(state.as_bytes().ct_eq(expected_state.as_bytes())) {
        return Err(SyncError::Auth("oauth callback state mismatch".to_string()));
    }
    Ok(())
}
