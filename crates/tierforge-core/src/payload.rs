//! Drag Payload Codec
//!
//! Writes drag metadata into the platform's key/value transfer object and
//! reads it back. Decoding never fails: malformed data degrades to the
//! plain-text fallback or to no payload at all.

use std::collections::HashMap;

use serde_json::{json, Value};

use crate::models::{Container, ItemId, TierId};

pub const ITEM_FORMAT: &str = "application/x-tierforge-item";
pub const TIER_FORMAT: &str = "application/x-tierforge-tier";
pub const TEXT_FORMAT: &str = "text/plain";

/// Source tag written when the origin container is not known
const UNKNOWN_SOURCE: &str = "unknown";

/// Key/value drag transfer object (`DataTransfer` in a browser)
pub trait TransferChannel {
    fn set_data(&mut self, format: &str, data: &str);

    fn get_data(&self, format: &str) -> Option<String>;

    /// Whether data of `format` is present. Browsers hide values during
    /// `dragover` but still expose the formats, so adapters override this.
    fn has_format(&self, format: &str) -> bool {
        self.get_data(format).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemPayload {
    pub item_id: ItemId,
    /// `None` for the plain-text fallback
    pub from: Option<Container>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierPayload {
    pub tier_id: TierId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragPayload {
    Item(ItemPayload),
    Tier(TierPayload),
}

pub fn encode_item(channel: &mut dyn TransferChannel, payload: &ItemPayload) {
    let from = payload
        .from
        .as_ref()
        .map(Container::as_str)
        .unwrap_or(UNKNOWN_SOURCE);
    let body = json!({ "itemId": payload.item_id, "fromTier": from });
    channel.set_data(ITEM_FORMAT, &body.to_string());
    channel.set_data(TEXT_FORMAT, &payload.item_id);
}

/// Tier payloads never write `text/plain`, so they cannot be mistaken for
/// an item by the fallback path.
pub fn encode_tier(channel: &mut dyn TransferChannel, payload: &TierPayload) {
    let body = json!({ "tierId": payload.tier_id });
    channel.set_data(TIER_FORMAT, &body.to_string());
}

pub fn decode_item(channel: &dyn TransferChannel) -> Option<ItemPayload> {
    if let Some(payload) = channel.get_data(ITEM_FORMAT).and_then(|raw| parse_item(&raw)) {
        return Some(payload);
    }

    let text = channel.get_data(TEXT_FORMAT)?;
    let item_id = text.trim();
    if item_id.is_empty() {
        return None;
    }
    Some(ItemPayload {
        item_id: item_id.to_string(),
        from: None,
    })
}

pub fn decode_tier(channel: &dyn TransferChannel) -> Option<TierPayload> {
    let raw = channel.get_data(TIER_FORMAT)?;
    let value: Value = serde_json::from_str(&raw).ok()?;
    let tier_id = non_empty_str(&value, "tierId")?;
    Some(TierPayload {
        tier_id: tier_id.to_string(),
    })
}

/// Tier payloads take precedence; they are never written alongside items.
pub fn decode(channel: &dyn TransferChannel) -> Option<DragPayload> {
    decode_tier(channel)
        .map(DragPayload::Tier)
        .or_else(|| decode_item(channel).map(DragPayload::Item))
}

fn parse_item(raw: &str) -> Option<ItemPayload> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(%err, "malformed item payload");
            return None;
        }
    };
    let item_id = non_empty_str(&value, "itemId")?;
    let from = value.get("fromTier")?.as_str()?;
    Some(ItemPayload {
        item_id: item_id.to_string(),
        from: match from {
            UNKNOWN_SOURCE | "" => None,
            other => Some(Container::from(other)),
        },
    })
}

fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key)?.as_str().filter(|s| !s.is_empty())
}

/// In-memory channel for the pointer-capture path and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryTransfer {
    data: HashMap<String, String>,
}

impl MemoryTransfer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransferChannel for MemoryTransfer {
    fn set_data(&mut self, format: &str, data: &str) {
        self.data.insert(format.to_string(), data.to_string());
    }

    fn get_data(&self, format: &str) -> Option<String> {
        self.data.get(format).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_payload_round_trip() {
        let mut channel = MemoryTransfer::new();
        let payload = ItemPayload {
            item_id: "fireball".into(),
            from: Some(Container::tier("s")),
        };
        encode_item(&mut channel, &payload);

        assert_eq!(channel.get_data(TEXT_FORMAT).as_deref(), Some("fireball"));
        assert_eq!(decode_item(&channel), Some(payload.clone()));
        assert_eq!(decode(&channel), Some(DragPayload::Item(payload)));
    }

    #[test]
    fn test_unranked_source_survives() {
        let mut channel = MemoryTransfer::new();
        encode_item(
            &mut channel,
            &ItemPayload {
                item_id: "i1".into(),
                from: Some(Container::Unranked),
            },
        );
        assert_eq!(decode_item(&channel).unwrap().from, Some(Container::Unranked));
    }

    #[test]
    fn test_plain_text_fallback() {
        let mut channel = MemoryTransfer::new();
        channel.set_data(TEXT_FORMAT, " i7 ");
        assert_eq!(
            decode_item(&channel),
            Some(ItemPayload {
                item_id: "i7".into(),
                from: None,
            })
        );
    }

    #[test]
    fn test_malformed_item_json_degrades_to_text() {
        let mut channel = MemoryTransfer::new();
        channel.set_data(ITEM_FORMAT, "{not json");
        channel.set_data(TEXT_FORMAT, "i3");
        assert_eq!(decode_item(&channel).unwrap().item_id, "i3");

        // Wrong field types are rejected as well
        channel.set_data(ITEM_FORMAT, r#"{"itemId": 4, "fromTier": "s"}"#);
        assert_eq!(decode_item(&channel).unwrap().from, None);

        // Missing source field
        channel.set_data(ITEM_FORMAT, r#"{"itemId": "i9"}"#);
        assert_eq!(decode_item(&channel).unwrap().item_id, "i3");
    }

    #[test]
    fn test_nothing_to_decode() {
        let channel = MemoryTransfer::new();
        assert_eq!(decode(&channel), None);

        let mut channel = MemoryTransfer::new();
        channel.set_data(TEXT_FORMAT, "   ");
        assert_eq!(decode_item(&channel), None);
    }

    #[test]
    fn test_tier_payload_is_not_an_item() {
        let mut channel = MemoryTransfer::new();
        encode_tier(&mut channel, &TierPayload { tier_id: "a".into() });
        assert!(channel.get_data(TEXT_FORMAT).is_none());
        assert_eq!(decode_item(&channel), None);
        assert_eq!(
            decode(&channel),
            Some(DragPayload::Tier(TierPayload { tier_id: "a".into() }))
        );
    }

    #[test]
    fn test_malformed_tier_payload() {
        let mut channel = MemoryTransfer::new();
        channel.set_data(TIER_FORMAT, r#"{"tierId": null}"#);
        assert_eq!(decode_tier(&channel), None);
        channel.set_data(TIER_FORMAT, "garbage");
        assert_eq!(decode_tier(&channel), None);
    }
}
