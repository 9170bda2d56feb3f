use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use once_cell::sync::{Lazy, OnceCell};
use reqwest::{header, Client, Response};
use tokio::sync::Semaphore;

use crate::logging::Logger;

pub mod user_agent;

/// Limits concurrent upstream requests so the exchanges don't ban us.
static SEMAPHORE: Lazy<Semaphore> = Lazy::new(|| Semaphore::new(5));

/// A singleton instance of the reqwest client.
static CLIENT: OnceCell<Client> = OnceCell::new();

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("http"));

/// Returns the reqwest client singleton instance or creates one if it doesn't exist.
///
/// The client owns the process-wide connection pool and is safe to share
/// across requests; it must never be rebuilt per request.
fn get_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .brotli(true)
            .gzip(true)
            .connect_timeout(Duration::from_secs(8))
            .timeout(Duration::from_secs(15))
            .tcp_nodelay(true)
            .tcp_keepalive(Duration::from_secs(60))
            .pool_max_idle_per_host(20)
            .pool_idle_timeout(Duration::from_secs(90))
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .referer(true)
            .user_agent(user_agent::gen_random_ua())
            .build()
            .map_err(|e| anyhow!("Failed to create reqwest client: {:?}", e))
    })
}

/// Performs an HTTP GET request and returns the response as text.
///
/// Fails on transport errors (timeout, DNS, connection refused) and on
/// non-success status codes. Exactly one attempt is made; callers decide
/// whether a failed source is fatal.
///
/// # Arguments
///
/// * `url`: The URL to send the GET request to.
///
/// # Returns
///
/// * `Result<String>`: The response body, or an error if the request fails.
pub async fn get(url: &str, headers: Option<header::HeaderMap>) -> Result<String> {
    get_response(url, headers)
        .await?
        .text()
        .await
        .map_err(|e| anyhow!("Error parsing response text: {:?}", e))
}

pub async fn get_response(url: &str, headers: Option<header::HeaderMap>) -> Result<Response> {
    let client = get_client()?;
    let mut rb = client.get(url);

    if let Some(h) = headers {
        rb = rb.headers(h);
    }

    let permit = SEMAPHORE.acquire().await;
    let start = Instant::now();
    let res = rb.send().await;
    let elapsed = start.elapsed().as_millis();
    drop(permit);

    match res {
        Ok(response) => {
            LOGGER.info(format!("GET:{} {} ms", url, elapsed));
            response
                .error_for_status()
                .map_err(|why| anyhow!("Request to {} returned an error status: {:?}", url, why))
        }
        Err(why) => {
            LOGGER.error(format!("GET:{} failed because {:?}. {} ms", url, why, elapsed));
            Err(anyhow!("Failed to send request to {}: {:?}", url, why))
        }
    }
}
