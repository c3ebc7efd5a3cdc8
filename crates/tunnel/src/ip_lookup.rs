use std::time::Duration;

/// HTTP client for the lookup, bounded by `timeout` per request.
pub fn lookup_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build()
}

/// Ask each endpoint in turn for this machine's public IP. The first 2xx
/// response with a non-empty body wins.
pub async fn fetch_public_ip(
    client: &reqwest::Client,
    endpoints: &[String],
) -> Result<String, String> {
    let mut last_error = "no public IP endpoints configured".to_string();
    for endpoint in endpoints {
        match fetch_one(client, endpoint).await {
            Ok(ip) => {
                tracing::debug!(%endpoint, %ip, "public IP resolved");
                return Ok(ip);
            }
            Err(e) => {
                tracing::debug!(%endpoint, "public IP lookup failed: {e}");
                last_error = e;
            }
        }
    }
    Err(last_error)
}

async fn fetch_one(client: &reqwest::Client, endpoint: &str) -> Result<String, String> {
    let resp = client
        .get(endpoint)
        .send()
        .await
        .map_err(|e| format!("{endpoint}: {e}"))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(format!("{endpoint}: HTTP {status}"));
    }
    let body = resp.text().await.map_err(|e| format!("{endpoint}: {e}"))?;
    let ip = body.trim();
    if ip.is_empty() {
        return Err(format!("{endpoint}: empty response"));
    }
    Ok(ip.to_string())
}
