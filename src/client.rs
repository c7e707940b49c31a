use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;

use crate::prelude::*;
use crate::reply::RawReply;

/// A deployed model that accepts inference requests.
pub trait Endpoint {
    /// Sends a request body and returns the undecoded reply.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the request can't be sent or the endpoint answers with an error
    /// status.
    fn invoke(&self, body: &Value) -> Result<RawReply>;
}

impl<T: Endpoint + ?Sized> Endpoint for &T {
    fn invoke(&self, body: &Value) -> Result<RawReply> {
        (**self).invoke(body)
    }
}

fn create_headers(api_key: Option<&str>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if let Some(key) = api_key {
        let mut authorization = HeaderValue::from_str(&format!("Bearer {key}"))?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);
    }

    Ok(headers)
}

/// HTTP(S) endpoint reached with a blocking client.
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    client: Client,
    url: String,
    headers: HeaderMap,
}

impl HttpEndpoint {
    /// Creates a new endpoint client.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the api key is not a valid header value or the client can't be
    /// built.
    pub fn new(
        url: impl Into<String>,
        api_key: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build()?;
        log::debug!("created reqwest client");

        Ok(Self {
            client,
            url: url.into(),
            headers: create_headers(api_key)?,
        })
    }
}

impl Endpoint for HttpEndpoint {
    fn invoke(&self, body: &Value) -> Result<RawReply> {
        log::debug!("POST: {}", self.url);

        let response = self
            .client
            .post(&self.url)
            .headers(self.headers.clone())
            .json(body)
            .send()?;

        let status = response.status();
        let bytes = response.bytes()?;

        if !status.is_success() {
            log::error!("endpoint answered with status {status}");
            return Err(Error::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        Ok(RawReply::Bytes(bytes.to_vec()))
    }
}
