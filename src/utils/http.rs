use std::time::Duration;

use reqwest::StatusCode;

use crate::utils::error::Result;
use crate::utils::slow_warn::await_with_slow_warning;

const SLOW_REQUEST_THRESHOLD: Duration = Duration::from_secs(30);

pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Executes a request once and returns status and body without judging the status.
///
/// SOAP faults come back with a server-error status and a meaningful body, so the
/// caller decides what a failure status means.
pub async fn request(
    client: &reqwest::Client,
    req_builder: impl Fn(&reqwest::Client) -> reqwest::RequestBuilder,
) -> Result<RawResponse> {
    let request = req_builder(client).build()?;
    let what = format!("{} {}", request.method(), request.url());
    let resp = await_with_slow_warning(&what, SLOW_REQUEST_THRESHOLD, client.execute(request))
        .await?;
    let status = resp.status();
    let body = resp.text().await?;
    Ok(RawResponse { status, body })
}

pub fn build_client(accept_invalid_certs: bool) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()?;
    Ok(client)
}
