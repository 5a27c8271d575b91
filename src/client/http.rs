//! HTTP Client
//!
//! Thin async transport over reqwest: token exchange, model lookup and the
//! streaming completion POST.

use crate::error::{CopilotError, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// HTTP client shared by the token, model and completion requests
#[derive(Debug, Clone)]
pub struct HttpClient {
    /// Inner reqwest client
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(request_timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| CopilotError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Issue a GET and return the status with the body text
    pub async fn get(&self, url: &str, headers: HeaderMap) -> Result<(StatusCode, String)> {
        let response = self.client.get(url).headers(headers).send().await?;
        let status = response.status();
        let body = response.text().await?;

        debug!(%url, %status, "GET finished");
        Ok((status, body))
    }

    /// Make a streaming POST request
    ///
    /// Returns the response body split into lines. The request is sent even
    /// when `token` is empty; rejecting it is the server's call.
    pub async fn post_stream(
        &self,
        url: &str,
        body: &impl Serialize,
        token: &str,
    ) -> Result<impl Stream<Item = Result<Bytes>>> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        headers.insert(AUTHORIZATION, bearer(token)?);

        let response = self
            .client
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        debug!(%url, %status, "streaming POST started");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(CopilotError::Auth(format!("{}: {}", status, body)));
            }

            return Err(CopilotError::Request(format!(
                "Streaming request failed with status {}: {}",
                status, body
            )));
        }

        Ok(body_lines(response.bytes_stream()))
    }
}

/// Build an `Authorization: Bearer <token>` header value
pub fn bearer(token: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|e| CopilotError::Config(format!("Invalid bearer token format: {}", e)))
}

/// Split a chunked body into lines
///
/// Lines end at `\n`, `\r` or `\r\n`, including a `\r\n` split across two
/// chunks. An unterminated last line is flushed when the body ends.
pub fn body_lines<S, E>(body: S) -> impl Stream<Item = Result<Bytes>>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: Into<CopilotError>,
{
    async_stream::stream! {
        let mut body = std::pin::pin!(body);
        let mut line: Vec<u8> = Vec::new();
        // A `\n` right after `\r` closes nothing new
        let mut after_cr = false;

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    let err: CopilotError = e.into();
                    yield Err(err);
                    return;
                }
            };

            for &byte in chunk.iter() {
                if std::mem::take(&mut after_cr) && byte == b'\n' {
                    continue;
                }

                match byte {
                    b'\n' => {
                        yield Ok::<_, CopilotError>(Bytes::from(std::mem::take(&mut line)));
                    }
                    b'\r' => {
                        after_cr = true;
                        yield Ok(Bytes::from(std::mem::take(&mut line)));
                    }
                    _ => line.push(byte),
                }
            }
        }

        if !line.is_empty() {
            yield Ok(Bytes::from(line));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect_lines(chunks: Vec<&'static str>) -> Vec<String> {
        let body = futures::stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok::<_, CopilotError>(Bytes::from_static(c.as_bytes()))),
        );

        body_lines(body)
            .map(|line| String::from_utf8(line.unwrap().to_vec()).unwrap())
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_client_creation() {
        let client = HttpClient::new(Duration::from_secs(5), Duration::from_secs(1));
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_body_lines_rejoins_split_chunks() {
        let lines = collect_lines(vec!["data: {\"a\"", ":1}\n\nda", "ta: [DONE]\n"]).await;
        assert_eq!(lines, vec!["data: {\"a\":1}", "", "data: [DONE]"]);
    }

    #[tokio::test]
    async fn test_body_lines_strips_crlf_and_flushes_tail() {
        let lines = collect_lines(vec!["one\r\ntwo\r\n", "three"]).await;
        assert_eq!(lines, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_body_lines_splits_on_bare_cr() {
        let lines = collect_lines(vec!["data: {\"a\":1}\r\rdata: [DONE]\r\r"]).await;
        assert_eq!(lines, vec!["data: {\"a\":1}", "", "data: [DONE]", ""]);
    }

    #[tokio::test]
    async fn test_body_lines_crlf_split_across_chunks() {
        let lines = collect_lines(vec!["one\r", "\ntwo\r", "\n\r\nthree"]).await;
        assert_eq!(lines, vec!["one", "two", "", "three"]);
    }

    #[tokio::test]
    async fn test_body_lines_long_line_in_small_chunks() {
        let chunks: Vec<&'static str> = std::iter::repeat("ab").take(5000).collect();
        let lines = collect_lines(chunks).await;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 10000);
    }

    #[tokio::test]
    async fn test_cr_terminated_stream_decodes() {
        let body = futures::stream::iter(vec![Ok::<_, CopilotError>(Bytes::from_static(
            b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\r\rdata: [DONE]\r\r",
        ))]);

        let text = crate::api::StreamDecoder::decode_stream(body_lines(body))
            .await
            .unwrap();
        assert_eq!(text, "Hi");
    }

    #[tokio::test]
    async fn test_body_lines_propagates_errors() {
        let body = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"first\n")),
            Err(CopilotError::Request("reset".into())),
        ]);

        let items: Vec<Result<Bytes>> = body_lines(body).collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(CopilotError::Request(_))));
    }

    #[test]
    fn test_bearer_header() {
        assert_eq!(bearer("abc").unwrap(), "Bearer abc");
        assert!(bearer("bad\ntoken").is_err());
    }
}
