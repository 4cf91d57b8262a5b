//! Audit step: capture request metadata around a mutating handler and hand
//! the entry to the recorder once the handler has returned.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, Query, RawPathParams, Request, State},
    http::{header::USER_AGENT, request::Parts, StatusCode},
    middleware::Next,
    response::Response,
    RequestPartsExt,
};
use serde_json::{json, Map, Value as JsonValue};

use warden_auth::AuditEntry;
use warden_infra::audit::AuditRecorder;

use crate::app::errors;
use crate::context::PrincipalContext;

/// Hard cap on buffered request bodies; matches axum's default extractor limit.
pub const MAX_BUFFERED_BODY: usize = 2 * 1024 * 1024;

const REDACTED_KEYS: &[&str] = &["password", "secret", "token"];

/// Audit configuration for one route.
#[derive(Clone, Debug)]
pub struct AuditAction {
    recorder: AuditRecorder,
    action: &'static str,
    resource_type: &'static str,
    body_limit: usize,
}

impl AuditAction {
    pub fn new(
        recorder: AuditRecorder,
        action: &'static str,
        resource_type: &'static str,
        body_limit: usize,
    ) -> Self {
        Self {
            recorder,
            action,
            resource_type,
            body_limit,
        }
    }
}

/// Route layer that records an audit entry for every invocation that got
/// past the permission gate, whatever the handler's outcome.
pub async fn capture(State(audit): State<AuditAction>, req: Request, next: Next) -> Response {
    let (mut parts, body) = req.into_parts();

    let bytes = match axum::body::to_bytes(body, MAX_BUFFERED_BODY).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return errors::json_error(
                StatusCode::PAYLOAD_TOO_LARGE,
                "payload_too_large",
                "request body too large",
            );
        }
    };

    let resource_id = resource_id(&mut parts).await;
    let query = query_snapshot(&mut parts).await;
    let actor = parts
        .extensions
        .get::<PrincipalContext>()
        .map(PrincipalContext::principal_id);
    let ip_address = client_ip(&parts);
    let user_agent = parts
        .headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let method = parts.method.to_string();
    let path = parts.uri.path().to_string();
    let body_snapshot = body_snapshot(&bytes, audit.body_limit);

    let response = next.run(Request::from_parts(parts, Body::from(bytes))).await;

    let entry = AuditEntry::new(audit.action, audit.resource_type)
        .with_actor(actor)
        .with_resource_id(resource_id)
        .with_details(json!({
            "method": method,
            "path": path,
            "query": query,
            "body": body_snapshot,
            "status": response.status().as_u16(),
        }))
        .with_client(ip_address, user_agent);
    audit.recorder.record(entry);

    response
}

/// The `id` path parameter, or the first one when the route names it otherwise.
async fn resource_id(parts: &mut Parts) -> Option<String> {
    let params = parts.extract::<RawPathParams>().await.ok()?;
    let mut first = None;
    for (name, value) in params.iter() {
        if name == "id" {
            return Some(value.to_string());
        }
        if first.is_none() {
            first = Some(value.to_string());
        }
    }
    first
}

/// Query parameters as an object. Falls back to the raw query string when it
/// does not decode, or when decoding would drop repeated keys.
async fn query_snapshot(parts: &mut Parts) -> JsonValue {
    let raw = parts.uri.query().map(str::to_string);
    let pairs = raw
        .as_deref()
        .map_or(0, |q| q.split('&').filter(|p| !p.is_empty()).count());

    match parts.extract::<Query<BTreeMap<String, String>>>().await {
        Ok(Query(q)) if q.len() == pairs => json!(q),
        _ => raw.map_or(JsonValue::Null, JsonValue::String),
    }
}

/// First `X-Forwarded-For` hop, else the connection's peer address.
pub fn client_ip(parts: &Parts) -> Option<String> {
    let forwarded = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    if let Some(ip) = forwarded {
        return Some(ip.to_string());
    }

    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}

fn body_snapshot(bytes: &Bytes, limit: usize) -> JsonValue {
    if bytes.is_empty() {
        return JsonValue::Null;
    }
    if bytes.len() > limit {
        return json!({ "truncated": true, "size": bytes.len() });
    }
    match serde_json::from_slice::<JsonValue>(bytes) {
        Ok(value) => redact(value),
        Err(_) => JsonValue::String(String::from_utf8_lossy(bytes).into_owned()),
    }
}

fn redact(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => JsonValue::Object(
            map.into_iter()
                .map(|(k, v)| {
                    let lower = k.to_ascii_lowercase();
                    if REDACTED_KEYS.iter().any(|r| lower.contains(r)) {
                        (k, JsonValue::String("[redacted]".to_string()))
                    } else {
                        (k, redact(v))
                    }
                })
                .collect::<Map<String, JsonValue>>(),
        ),
        JsonValue::Array(items) => JsonValue::Array(items.into_iter().map(redact).collect()),
        other => other,
    }
}
