use crate::core::error::AssistError;
use crate::providers::TextStream;
use futures::{StreamExt, future, stream};
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::debug;

/// Thin wrapper over `reqwest`: base URL plus query parameters sent with every request.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    query_params: Vec<(String, String)>,
}

impl HttpClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            query_params: Vec::new(),
        }
    }

    pub fn add_query_param(&mut self, key: &str, value: String) {
        self.query_params.retain(|(k, _)| k != key);
        self.query_params.push((key.to_string(), value));
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Response, AssistError> {
        let url = self.url(path);
        debug!(%url, "POST");

        let response = self
            .client
            .post(&url)
            .query(&self.query_params)
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssistError::Api(format!("{}: {}", status, body.trim())));
        }
        Ok(response)
    }

    /// Turn a streaming HTTP body into text fragments.
    ///
    /// Network reads are re-assembled on line boundaries before `parser` sees them, so an event
    /// split across two reads is parsed once, whole. Whatever is still buffered when the body
    /// ends is parsed as a final event. Chunks for which the parser yields `None` are skipped.
    pub fn stream_response<F>(&self, response: Response, parser: F) -> TextStream
    where
        F: Fn(String) -> Result<Option<String>, AssistError> + Send + Sync + 'static,
    {
        // `None` marks the end of the body.
        let reads = response
            .bytes_stream()
            .map(Some)
            .chain(stream::once(future::ready(None)));

        reads
            .scan(Vec::<u8>::new(), move |pending, item| {
                let out = match item {
                    Some(Ok(bytes)) => {
                        pending.extend_from_slice(&bytes);
                        match pending.iter().rposition(|b| *b == b'\n') {
                            Some(idx) => {
                                let complete: Vec<u8> = pending.drain(..=idx).collect();
                                decode_utf8(complete).and_then(&parser)
                            }
                            None => Ok(None),
                        }
                    }
                    Some(Err(e)) => Err(AssistError::from(e)),
                    None if pending.is_empty() => Ok(None),
                    None => decode_utf8(std::mem::take(pending)).and_then(&parser),
                };
                future::ready(Some(out))
            })
            .filter_map(|res| async move {
                match res {
                    Ok(Some(text)) => Some(Ok(text)),
                    Ok(None) => None,
                    Err(e) => Some(Err(e)),
                }
            })
            .boxed()
    }
}

fn decode_utf8(bytes: Vec<u8>) -> Result<String, AssistError> {
    String::from_utf8(bytes)
        .map_err(|e| AssistError::Serialization(format!("Stream is not valid UTF-8: {}", e)))
}
