//! JSON-RPC ledger client (Sui full-node read API).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{json, Value as JsonValue};

use barterhub_core::{ObjectId, UserAddress};
use barterhub_events::{EventEnvelope, EventId, RawEvent};

use super::r#trait::{EventOrder, LedgerError, LedgerReader, ObjectSnapshot};
use crate::config::RegistryConfig;

/// Upper bound on pages followed for one owned-objects listing.
const MAX_OWNED_PAGES: usize = 10;

/// Ledger reader over a full node's JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct JsonRpcLedger {
    client: reqwest::Client,
    rpc_url: String,
    request_ids: std::sync::Arc<AtomicU64>,
}

impl JsonRpcLedger {
    pub fn new(rpc_url: impl Into<String>, timeout: Duration) -> Result<Self, LedgerError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Transport(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            rpc_url: rpc_url.into(),
            request_ids: std::sync::Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn from_config(config: &RegistryConfig) -> Result<Self, LedgerError> {
        Self::new(config.rpc_url.clone(), config.rpc_timeout())
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: JsonValue) -> Result<T, LedgerError> {
        let id = self.request_ids.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let resp = self
            .client
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(format!("{method}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(LedgerError::Transport(format!("{method}: http status {status}")));
        }

        let envelope: RpcResponse<T> = resp
            .json()
            .await
            .map_err(|e| LedgerError::Decode(format!("{method}: {e}")))?;

        match (envelope.result, envelope.error) {
            (_, Some(err)) => Err(LedgerError::Rpc {
                code: err.code,
                message: err.message,
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Err(LedgerError::Decode(format!("{method}: response has neither result nor error"))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// The node renders `u64` as strings; accept both forms.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum U64Repr {
    Num(u64),
    Str(String),
}

impl U64Repr {
    fn value(&self) -> Result<u64, LedgerError> {
        match self {
            U64Repr::Num(n) => Ok(*n),
            U64Repr::Str(s) => s
                .parse()
                .map_err(|e| LedgerError::Decode(format!("expected integer, got {s:?}: {e}"))),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventPage {
    data: Vec<EventDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventIdDto {
    tx_digest: String,
    event_seq: U64Repr,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventDto {
    id: EventIdDto,
    #[serde(rename = "type")]
    event_type: String,
    sender: Option<String>,
    #[serde(default)]
    parsed_json: JsonValue,
    timestamp_ms: Option<U64Repr>,
}

impl EventDto {
    fn into_raw(self) -> Result<RawEvent, LedgerError> {
        let timestamp_ms = self.timestamp_ms.as_ref().map(U64Repr::value).transpose()?;
        Ok(EventEnvelope::new(
            EventId::new(self.id.tx_digest, self.id.event_seq.value()?),
            self.event_type,
            self.sender.and_then(|s| UserAddress::parse(&s).ok()),
            timestamp_ms,
            self.parsed_json,
        ))
    }
}

#[derive(Debug, Deserialize)]
struct ObjectResponse {
    data: Option<ObjectDataDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OwnedPage {
    data: Vec<ObjectResponse>,
    #[serde(default)]
    has_next_page: bool,
    next_cursor: Option<JsonValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectDataDto {
    object_id: String,
    version: U64Repr,
    #[serde(rename = "type")]
    type_name: Option<String>,
    owner: Option<JsonValue>,
    content: Option<ContentDto>,
}

#[derive(Debug, Deserialize)]
struct ContentDto {
    #[serde(default)]
    fields: JsonValue,
}

impl ObjectDataDto {
    fn into_snapshot(self) -> Result<ObjectSnapshot, LedgerError> {
        let object_id = ObjectId::parse(&self.object_id).map_err(|e| LedgerError::Decode(e.to_string()))?;
        // Only address-owned objects have an owner address.
        let owner = self
            .owner
            .as_ref()
            .and_then(|o| o.get("AddressOwner"))
            .and_then(JsonValue::as_str)
            .and_then(|s| UserAddress::parse(s).ok());

        Ok(ObjectSnapshot {
            object_id,
            version: self.version.value()?,
            type_name: self.type_name,
            owner,
            fields: self.content.map(|c| c.fields).unwrap_or(JsonValue::Null),
        })
    }
}

fn object_options() -> JsonValue {
    json!({ "showContent": true, "showType": true, "showOwner": true })
}

#[async_trait]
impl LedgerReader for JsonRpcLedger {
    async fn query_events(
        &self,
        event_type: &str,
        limit: usize,
        order: EventOrder,
    ) -> Result<Vec<RawEvent>, LedgerError> {
        let descending = order == EventOrder::Descending;
        let page: EventPage = self
            .call(
                "suix_queryEvents",
                json!([{ "MoveEventType": event_type }, null, limit, descending]),
            )
            .await?;
        page.data.into_iter().map(EventDto::into_raw).collect()
    }

    async fn get_object(&self, id: &ObjectId) -> Result<Option<ObjectSnapshot>, LedgerError> {
        // Missing objects come back as `{ "error": { "code": "notExists" } }` inside the result.
        let resp: ObjectResponse = self
            .call("sui_getObject", json!([id.as_str(), object_options()]))
            .await?;
        resp.data.map(ObjectDataDto::into_snapshot).transpose()
    }

    async fn owned_objects(
        &self,
        owner: &UserAddress,
        struct_type: &str,
    ) -> Result<Vec<ObjectSnapshot>, LedgerError> {
        let mut out = Vec::new();
        let mut cursor = JsonValue::Null;

        for _ in 0..MAX_OWNED_PAGES {
            let page: OwnedPage = self
                .call(
                    "suix_getOwnedObjects",
                    json!([
                        owner.as_str(),
                        { "filter": { "StructType": struct_type }, "options": object_options() },
                        cursor,
                        null
                    ]),
                )
                .await?;

            for obj in page.data {
                if let Some(data) = obj.data {
                    out.push(data.into_snapshot()?);
                }
            }

            match page.next_cursor {
                Some(next) if page.has_next_page && !next.is_null() => cursor = next,
                _ => return Ok(out),
            }
        }

        tracing::warn!(owner = %owner, struct_type, pages = MAX_OWNED_PAGES, "owned objects listing truncated");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_dto_maps_to_raw_event() {
        let dto: EventDto = serde_json::from_value(json!({
            "id": { "txDigest": "9xQ", "eventSeq": "2" },
            "packageId": "0x9e",
            "transactionModule": "centro_trueque",
            "sender": "0xA11CE",
            "type": "0x9e::centro_trueque::ArticuloAlmacenadoEvent",
            "parsedJson": { "clave": "4", "nombre_articulo": "Hat" },
            "timestampMs": "1700000000123"
        }))
        .unwrap();

        let raw = dto.into_raw().unwrap();
        assert_eq!(raw.event_id(), &EventId::new("9xQ", 2));
        assert_eq!(raw.sender().map(UserAddress::as_str), Some("0xa11ce"));
        assert_eq!(raw.timestamp_ms(), Some(1_700_000_000_123));
        assert_eq!(raw.payload()["clave"], "4");
    }

    #[test]
    fn object_dto_reads_address_owner_and_fields() {
        let resp: ObjectResponse = serde_json::from_value(json!({
            "data": {
                "objectId": "0xCA4D",
                "version": "17",
                "type": "0x9e::centro_trueque::CarnetDeSocio",
                "owner": { "AddressOwner": "0xa11ce" },
                "content": { "dataType": "moveObject", "fields": { "propietario": "0xa11ce" } }
            }
        }))
        .unwrap();

        let snap = resp.data.unwrap().into_snapshot().unwrap();
        assert_eq!(snap.object_id.as_str(), "0xca4d");
        assert_eq!(snap.version, 17);
        assert_eq!(snap.owner.map(String::from), Some("0xa11ce".to_string()));
        assert_eq!(snap.fields["propietario"], "0xa11ce");
    }

    #[test]
    fn shared_object_has_no_owner_and_missing_object_is_none() {
        let resp: ObjectResponse = serde_json::from_value(json!({
            "data": { "objectId": "0x5", "version": 3, "owner": { "Shared": { "initial_shared_version": 1 } } }
        }))
        .unwrap();
        let snap = resp.data.unwrap().into_snapshot().unwrap();
        assert_eq!(snap.owner, None);
        assert_eq!(snap.fields, JsonValue::Null);

        let missing: ObjectResponse =
            serde_json::from_value(json!({ "error": { "code": "notExists", "object_id": "0x5" } })).unwrap();
        assert!(missing.data.is_none());
    }

    #[test]
    fn client_uses_configured_endpoint() {
        let cfg = RegistryConfig {
            rpc_url: "http://127.0.0.1:9000".to_string(),
            ..RegistryConfig::default()
        };
        let ledger = JsonRpcLedger::from_config(&cfg).unwrap();
        assert_eq!(ledger.rpc_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn rpc_error_object_is_read() {
        let resp: RpcResponse<JsonValue> =
            serde_json::from_value(json!({ "jsonrpc": "2.0", "id": 1, "error": { "code": -32602, "message": "bad params" } }))
                .unwrap();
        let err = resp.error.unwrap();
        assert_eq!(err.code, -32602);
        assert_eq!(err.message, "bad params");
    }
}
