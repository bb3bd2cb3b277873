use async_trait::async_trait;
use log::*;
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::{
    errors::{TransportError, TransportResult},
    transport::{ReadCallRequest, ReadCallTransport},
    write::{BroadcastOutcome, SignedTransaction, WriteCallTransport},
};

// -----------------
// Read
// -----------------
#[derive(Debug, Deserialize)]
struct ReadCallEnvelope {
    okay: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    cause: Option<String>,
}

/// [ReadCallTransport] speaking the node's JSON read-only call endpoint.
#[derive(Clone)]
pub struct HttpReadCallTransport {
    client: Client,
    base_url: Url,
}

impl HttpReadCallTransport {
    pub fn new(base_url: Url) -> Self {
        Self::new_with_client(Client::new(), base_url)
    }

    pub fn new_with_client(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    fn endpoint(&self, request: &ReadCallRequest) -> TransportResult<Url> {
        self.base_url
            .join(&format!(
                "v2/contracts/call-read/{}/{}/{}",
                request.contract_address,
                request.contract_name,
                request.function_name
            ))
            .map_err(|err| TransportError::Decode(err.to_string()))
    }
}

#[async_trait]
impl ReadCallTransport for HttpReadCallTransport {
    async fn call_read(
        &self,
        request: &ReadCallRequest,
    ) -> TransportResult<Value> {
        let url = self.endpoint(request)?;
        let body = json!({
            "sender": request.sender,
            "arguments": request.arguments,
        });
        let response = self.client.post(url.clone()).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        trace!("{} POST {} {}", status, url, text);

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        parse_read_envelope(&text)
    }
}

fn parse_read_envelope(text: &str) -> TransportResult<Value> {
    let envelope: ReadCallEnvelope = serde_json::from_str(text)
        .map_err(|err| TransportError::Decode(err.to_string()))?;
    if envelope.okay {
        envelope.result.ok_or_else(|| {
            TransportError::Decode("okay response without result".to_string())
        })
    } else {
        Err(TransportError::Rejected {
            cause: envelope
                .cause
                .unwrap_or_else(|| "unknown cause".to_string()),
        })
    }
}

// -----------------
// Write
// -----------------
#[derive(Debug, Deserialize)]
struct BroadcastRejection {
    error: String,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Clone)]
pub struct HttpWriteCallTransport {
    client: Client,
    base_url: Url,
}

impl HttpWriteCallTransport {
    pub fn new(base_url: Url) -> Self {
        Self::new_with_client(Client::new(), base_url)
    }

    pub fn new_with_client(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl WriteCallTransport for HttpWriteCallTransport {
    async fn broadcast(
        &self,
        transaction: &SignedTransaction,
    ) -> TransportResult<BroadcastOutcome> {
        let url = self
            .base_url
            .join("v2/transactions")
            .map_err(|err| TransportError::Decode(err.to_string()))?;
        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(transaction.as_bytes().to_vec())
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        debug!("{} POST {} {}", status, url, text);

        parse_broadcast_response(status, text)
    }
}

fn parse_broadcast_response(
    status: StatusCode,
    text: String,
) -> TransportResult<BroadcastOutcome> {
    if status.is_success() {
        // The node answers with the txid as a JSON string
        let txid = serde_json::from_str::<String>(&text)
            .unwrap_or_else(|_| text.trim().trim_matches('"').to_string());
        return Ok(BroadcastOutcome::Accepted { txid });
    }
    if status == StatusCode::BAD_REQUEST {
        if let Ok(rejection) = serde_json::from_str::<BroadcastRejection>(&text)
        {
            return Ok(BroadcastOutcome::Rejected {
                error: rejection.error,
                reason: rejection.reason,
            });
        }
    }
    Err(TransportError::Status {
        status: status.as_u16(),
        body: text,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::args::CallArg;

    #[test]
    fn test_endpoint_layout() {
        let transport = HttpReadCallTransport::new(
            Url::parse("http://127.0.0.1:3999/").unwrap(),
        );
        let request = ReadCallRequest {
            contract_address: "ST1ADDR".to_string(),
            contract_name: "story-chain".to_string(),
            function_name: "get-story".to_string(),
            arguments: vec![CallArg::uint(1u8)],
            sender: "ST1ADDR".to_string(),
        };
        assert_eq!(
            transport.endpoint(&request).unwrap().as_str(),
            "http://127.0.0.1:3999/v2/contracts/call-read/ST1ADDR/story-chain/get-story"
        );
    }

    #[test]
    fn test_read_envelope_okay() {
        let value =
            parse_read_envelope(
                r#"{"okay":true,"result":{"type":"uint","value":"3"}}"#
            )
                .unwrap();
        assert_eq!(value, json!({ "type": "uint", "value": "3" }));
    }

    #[test]
    fn test_read_envelope_rejected() {
        let res = parse_read_envelope(
            r#"{"okay":false,"cause":"Unchecked(NoSuchContract)"}"#,
        );
        assert_matches!(
            res,
            Err(TransportError::Rejected { cause })
                if cause == "Unchecked(NoSuchContract)"
        );
    }

    #[test]
    fn test_read_envelope_malformed() {
        assert_matches!(
            parse_read_envelope("<html>"),
            Err(TransportError::Decode(_))
        );
        assert_matches!(
            parse_read_envelope(r#"{"okay":true}"#),
            Err(TransportError::Decode(_))
        );
    }

    #[test]
    fn test_broadcast_responses() {
        assert_eq!(
            parse_broadcast_response(StatusCode::OK, "\"0xabc\"".to_string())
                .unwrap(),
            BroadcastOutcome::Accepted {
                txid: "0xabc".to_string()
            }
        );
        assert_eq!(
            parse_broadcast_response(
                StatusCode::BAD_REQUEST,
                r#"{"error":"transaction rejected","reason":"BadNonce"}"#
                    .to_string()
            )
            .unwrap(),
            BroadcastOutcome::Rejected {
                error: "transaction rejected".to_string(),
                reason: Some("BadNonce".to_string()),
            }
        );
        assert_matches!(
            parse_broadcast_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "down".to_string()
            ),
            Err(TransportError::Status { status: 503, .. })
        );
    }
}
