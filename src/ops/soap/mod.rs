//! Client for the installation's SOAP service, spoken in its JSON envelope form.

pub mod admin;
pub mod mail;

use log::trace;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::protocol_bail;
use crate::utils::error::{Error, Result};
use crate::utils::http;

const USER_AGENT_NAME: &str = "zimbra-migrate";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Admin,
    Mail,
}

impl Namespace {
    fn urn(self) -> &'static str {
        match self {
            Namespace::Admin => "urn:zimbraAdmin",
            Namespace::Mail => "urn:zimbraMail",
        }
    }
}

/// Builds the request envelope. `body` must be a JSON object.
pub fn envelope(auth_token: Option<&str>, request: &str, ns: Namespace, body: Value) -> Value {
    let mut context = Map::new();
    context.insert("_jsns".into(), json!("urn:zimbra"));
    context.insert("format".into(), json!({ "type": "js" }));
    context.insert("userAgent".into(), json!({ "name": USER_AGENT_NAME }));
    if let Some(token) = auth_token {
        context.insert("authToken".into(), json!({ "_content": token }));
    }

    let mut request_body = match body {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    request_body.insert("_jsns".into(), json!(ns.urn()));

    let mut body = Map::new();
    body.insert(format!("{request}Request"), Value::Object(request_body));
    json!({
        "Header": { "context": context },
        "Body": body,
    })
}

fn fault_from(fault: &Value) -> Error {
    let reason = fault
        .pointer("/Reason/Text")
        .and_then(Value::as_str)
        .unwrap_or("unknown fault");
    let code = fault
        .pointer("/Detail/Error/Code")
        .and_then(Value::as_str)
        .map(str::to_string);
    Error::remote_fault(reason, code)
}

/// Picks `<request>Response` out of a response envelope, turning a fault into an error.
pub fn extract_response(envelope: &Value, request: &str) -> Result<Value> {
    let Some(body) = envelope.get("Body") else {
        protocol_bail!("response has no Body");
    };
    if let Some(fault) = body.get("Fault") {
        return Err(fault_from(fault));
    }
    let name = format!("{request}Response");
    match body.get(&name) {
        Some(response) => Ok(response.clone()),
        None => protocol_bail!("response has no {name}"),
    }
}

/// Text content of a `{"_content": ...}` node, or of the first element of an array of them.
pub fn content_of(node: &Value) -> Option<&str> {
    match node {
        Value::String(s) => Some(s.as_str()),
        Value::Array(items) => items.first().and_then(content_of),
        Value::Object(map) => map.get("_content").and_then(Value::as_str),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct SoapClient {
    http: reqwest::Client,
    url: String,
    auth_token: Option<String>,
}

impl SoapClient {
    pub fn new(http: reqwest::Client, url: impl Into<String>, auth_token: Option<String>) -> Self {
        Self {
            http,
            url: url.into(),
            auth_token,
        }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub async fn invoke_raw(&self, request: &str, ns: Namespace, body: Value) -> Result<Value> {
        let payload = envelope(self.auth_token.as_deref(), request, ns, body);
        trace!("{request}Request -> {}", self.url);
        let resp = http::request(&self.http, |client| {
            let builder = client.post(&self.url).json(&payload);
            match &self.auth_token {
                Some(token) => builder.header("Cookie", format!("ZM_AUTH_TOKEN={token}")),
                None => builder,
            }
        })
        .await?;

        let parsed: Value = match serde_json::from_str(&resp.body) {
            Ok(v) => v,
            Err(err) if resp.status.is_success() => return Err(err.into()),
            Err(_) => protocol_bail!("{request}Request failed with HTTP {}", resp.status),
        };
        extract_response(&parsed, request)
    }

    pub async fn invoke<T: DeserializeOwned>(
        &self,
        request: &str,
        ns: Namespace,
        body: Value,
    ) -> Result<T> {
        let response = self.invoke_raw(request, ns, body).await?;
        Ok(serde_json::from_value(response)?)
    }
}
