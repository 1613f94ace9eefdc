// Copyright (C) 2025 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Issues non-streaming generate requests against an Ollama-style HTTP endpoint.

use eyre::eyre;
use loadmatrix_common::RequestFailure;
use loadmatrix_engine::{Completion, RequestIssuer};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{StatusCode, Url};
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

pub struct OllamaIssuer {
    client: reqwest::Client,
    endpoint: Url,
    request_timeout: Duration,
}

impl OllamaIssuer {
    pub fn new(endpoint: &str, request_timeout: Duration) -> Result<Self, eyre::Report> {
        let endpoint =
            Url::parse(endpoint).map_err(|e| eyre!("Invalid endpoint {endpoint:?}: {e}"))?;
        let client = reqwest::ClientBuilder::new()
            .timeout(request_timeout)
            .build()
            .map_err(|e| eyre!("Unable to build HTTP client: {e}"))?;
        Ok(Self {
            client,
            endpoint,
            request_timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn classify(&self, e: reqwest::Error) -> RequestFailure {
        if e.is_timeout() {
            RequestFailure::TimedOut(self.request_timeout)
        } else if e.is_decode() || e.is_body() {
            RequestFailure::MalformedResponse(e.to_string())
        } else {
            RequestFailure::Transport(e.to_string())
        }
    }
}

fn encode_request(model: &str, prompt: &str) -> Result<Vec<u8>, RequestFailure> {
    serde_json::to_vec(&GenerateRequest {
        model,
        prompt,
        stream: false,
    })
    .map_err(|e| RequestFailure::Transport(format!("Unable to encode request: {e}")))
}

/// A reply must be a JSON object. Its `response` text, when present, must be a string.
fn decode_response(body: &[u8]) -> Result<Completion, RequestFailure> {
    let reply: Map<String, Value> = serde_json::from_slice(body)
        .map_err(|e| RequestFailure::MalformedResponse(e.to_string()))?;
    let response_bytes = match reply.get("response") {
        None | Some(Value::Null) => 0,
        Some(Value::String(text)) => text.len(),
        Some(other) => {
            return Err(RequestFailure::MalformedResponse(format!(
                "response field is not a string: {other}"
            )));
        }
    };
    Ok(Completion { response_bytes })
}

impl RequestIssuer for OllamaIssuer {
    async fn send(&self, workload_id: &str, prompt: &str) -> Result<Completion, RequestFailure> {
        let body = encode_request(workload_id, prompt)?;
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(RequestFailure::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        decode_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_body() {
        let body = encode_request("deepseek-r1:7b", "你好").unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "model": "deepseek-r1:7b",
                "prompt": "你好",
                "stream": false,
            })
        );
    }

    #[test]
    fn test_decode_response() {
        let completion = decode_response(
            br#"{"model":"deepseek-r1:7b","response":"hello","done":true,"total_duration":12}"#,
        )
        .unwrap();
        assert_eq!(completion.response_bytes, 5);

        // Unknown fields are ignored, and a missing response is still a well-formed reply.
        let completion = decode_response(br#"{"done":true}"#).unwrap();
        assert_eq!(completion.response_bytes, 0);
    }

    #[test]
    fn test_malformed_response() {
        let bodies: [&[u8]; 5] = [
            b"<html>502 Bad Gateway</html>",
            b"[null]",
            b"[\"hello\"]",
            b"\"hello\"",
            br#"{"response": 42}"#,
        ];
        for body in bodies {
            assert!(
                matches!(
                    decode_response(body),
                    Err(RequestFailure::MalformedResponse(_))
                ),
                "accepted {:?}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        assert!(OllamaIssuer::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_a_failure() {
        // Nothing listens on the discard port in a test environment.
        let issuer =
            OllamaIssuer::new("http://127.0.0.1:9/api/generate", Duration::from_secs(2)).unwrap();
        let result = issuer.send("deepseek-r1:7b", "你好").await;
        assert!(matches!(
            result,
            Err(RequestFailure::Transport(_)) | Err(RequestFailure::TimedOut(_))
        ));
    }
}
