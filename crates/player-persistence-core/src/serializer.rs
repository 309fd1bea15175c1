use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::inventory::{EnderChest, PlayerInventory, SlotAddress};
use crate::item::{DecodedItem, ItemCodec, ItemCodecAdapter, ItemDocument, ItemStack};

/// One persisted slot: `{"Slot": 3, "ItemStack": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotEntry {
    #[serde(rename = "Slot")]
    pub slot: i32,
    #[serde(rename = "ItemStack")]
    pub item: ItemDocument,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RestoreReport {
    pub placed: u64,
    pub empty_fallbacks: u64,
    pub decode_failures: u64,
    pub dropped_slots: u64,
    pub malformed_entries: u64,
}

impl RestoreReport {
    pub fn is_clean(&self) -> bool {
        self.decode_failures == 0 && self.dropped_slots == 0 && self.malformed_entries == 0
    }
}

pub fn serialize_inventory<S, C>(
    inventory: &PlayerInventory<S>,
    adapter: &ItemCodecAdapter<C>,
) -> Result<String, CoreError>
where
    S: ItemStack,
    C: ItemCodec<S>,
{
    encode_entries(inventory.occupied_slots(), adapter)
}

pub fn serialize_ender_chest<S, C>(
    chest: &EnderChest<S>,
    adapter: &ItemCodecAdapter<C>,
) -> Result<String, CoreError>
where
    S: ItemStack,
    C: ItemCodec<S>,
{
    encode_entries(chest.occupied_slots(), adapter)
}

/// Replaces the inventory contents with the payload's slots.
///
/// The payload is parsed before anything is cleared, so an unreadable payload
/// leaves the inventory as it was. Individual bad entries never abort the
/// restore; they are counted in the returned report.
pub fn deserialize_inventory<S, C>(
    inventory: &mut PlayerInventory<S>,
    payload: &str,
    adapter: &ItemCodecAdapter<C>,
) -> Result<RestoreReport, CoreError>
where
    S: ItemStack,
    C: ItemCodec<S>,
{
    let entries = parse_payload(payload)?;
    inventory.clear();

    let mut report = RestoreReport::default();
    for entry in entries {
        let Some((slot, document)) = split_entry(entry) else {
            report.malformed_entries = report.malformed_entries.saturating_add(1);
            continue;
        };

        let Some(address) = SlotAddress::from_flat(slot) else {
            tracing::debug!(slot, "inventory slot outside known regions; dropped");
            report.dropped_slots = report.dropped_slots.saturating_add(1);
            continue;
        };

        if inventory.stack(address).is_none() {
            tracing::debug!(slot, "inventory slot beyond region size; dropped");
            report.dropped_slots = report.dropped_slots.saturating_add(1);
            continue;
        }

        let decoded = adapter.decode(&document);
        note_decoded(&mut report, slot, &decoded);
        inventory.set_stack(address, decoded.into_stack());
    }

    Ok(report)
}

/// Ender-chest counterpart of [`deserialize_inventory`]. Slots are native
/// chest indices with no region offsets.
pub fn deserialize_ender_chest<S, C>(
    chest: &mut EnderChest<S>,
    payload: &str,
    adapter: &ItemCodecAdapter<C>,
) -> Result<RestoreReport, CoreError>
where
    S: ItemStack,
    C: ItemCodec<S>,
{
    let entries = parse_payload(payload)?;
    chest.clear();

    let mut report = RestoreReport::default();
    for entry in entries {
        let Some((slot, document)) = split_entry(entry) else {
            report.malformed_entries = report.malformed_entries.saturating_add(1);
            continue;
        };

        let Some(index) = usize::try_from(slot)
            .ok()
            .filter(|index| *index < chest.slots.len())
        else {
            tracing::debug!(slot, "ender chest slot outside chest; dropped");
            report.dropped_slots = report.dropped_slots.saturating_add(1);
            continue;
        };

        let decoded = adapter.decode(&document);
        note_decoded(&mut report, slot, &decoded);
        chest.set_stack(index, decoded.into_stack());
    }

    Ok(report)
}

fn encode_entries<S, C>(
    slots: Vec<(i32, &S)>,
    adapter: &ItemCodecAdapter<C>,
) -> Result<String, CoreError>
where
    S: ItemStack,
    C: ItemCodec<S>,
{
    let entries: Vec<SlotEntry> = slots
        .into_iter()
        .filter_map(|(slot, stack)| adapter.encode(stack).map(|item| SlotEntry { slot, item }))
        .collect();

    serde_json::to_string(&entries).map_err(|err| CoreError::Payload(err.to_string()))
}

fn parse_payload(payload: &str) -> Result<Vec<Value>, CoreError> {
    match serde_json::from_str::<Value>(payload) {
        Ok(Value::Array(entries)) => Ok(entries),
        Ok(_) => Err(CoreError::Payload(
            "expected a JSON array of slot entries".to_owned(),
        )),
        Err(err) => Err(CoreError::Payload(err.to_string())),
    }
}

fn split_entry(entry: Value) -> Option<(i32, Value)> {
    let Value::Object(mut fields) = entry else {
        tracing::warn!("slot entry is not an object; skipped");
        return None;
    };

    let slot = fields
        .get("Slot")
        .and_then(Value::as_i64)
        .and_then(|slot| i32::try_from(slot).ok());
    let item = fields.remove("ItemStack");
    match (slot, item) {
        (Some(slot), Some(item)) => Some((slot, item)),
        _ => {
            tracing::warn!("slot entry missing Slot or ItemStack; skipped");
            None
        }
    }
}

fn note_decoded<S>(report: &mut RestoreReport, slot: i32, decoded: &DecodedItem<S>) {
    match decoded {
        DecodedItem::Item(_) => {
            report.placed = report.placed.saturating_add(1);
        }
        DecodedItem::Empty => {
            report.empty_fallbacks = report.empty_fallbacks.saturating_add(1);
        }
        DecodedItem::Failed { reason } => {
            tracing::warn!(slot, reason = %reason, "item failed to decode; slot left empty");
            report.empty_fallbacks = report.empty_fallbacks.saturating_add(1);
            report.decode_failures = report.decode_failures.saturating_add(1);
        }
    }
}
