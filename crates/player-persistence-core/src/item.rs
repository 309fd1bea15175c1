//! Item codec seam.
//!
//! The host game owns its item representation and the codec that turns it
//! into a structured document. This module only wraps that codec so that
//! empty stacks are never emitted and decode failures degrade to an empty
//! slot instead of aborting a restore.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub type ItemDocument = Map<String, Value>;

pub const AIR_ITEM_ID: &str = "minecraft:air";

pub trait ItemStack: Clone {
    fn empty() -> Self;
    fn is_empty(&self) -> bool;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ItemCodecError {
    #[error("item encode failed: {0}")]
    Encode(String),
    #[error("item decode failed: {0}")]
    Decode(String),
}

pub trait ItemCodec<S: ItemStack> {
    fn encode(&self, stack: &S) -> Result<ItemDocument, ItemCodecError>;
    fn decode(&self, document: &ItemDocument) -> Result<S, ItemCodecError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodedItem<S> {
    Item(S),
    Empty,
    Failed { reason: String },
}

impl<S: ItemStack> DecodedItem<S> {
    pub fn into_stack(self) -> S {
        match self {
            Self::Item(stack) => stack,
            Self::Empty | Self::Failed { .. } => S::empty(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ItemCodecAdapter<C> {
    codec: C,
}

impl<C> ItemCodecAdapter<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Returns `None` for empty stacks and for stacks the codec refuses.
    pub fn encode<S>(&self, stack: &S) -> Option<ItemDocument>
    where
        S: ItemStack,
        C: ItemCodec<S>,
    {
        if stack.is_empty() {
            return None;
        }

        match self.codec.encode(stack) {
            Ok(document) => Some(document),
            Err(error) => {
                tracing::warn!(error = %error, "item codec rejected stack; slot not persisted");
                None
            }
        }
    }

    pub fn decode<S>(&self, document: &Value) -> DecodedItem<S>
    where
        S: ItemStack,
        C: ItemCodec<S>,
    {
        let Some(object) = document.as_object() else {
            return DecodedItem::Failed {
                reason: "item document is not an object".to_owned(),
            };
        };

        match self.codec.decode(object) {
            Ok(stack) if stack.is_empty() => DecodedItem::Empty,
            Ok(stack) => DecodedItem::Item(stack),
            Err(error) => DecodedItem::Failed {
                reason: error.to_string(),
            },
        }
    }
}

/// Minimal item stack for hosts that do not bring their own type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicItemStack {
    pub id: String,
    pub count: u32,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub components: Map<String, Value>,
}

impl BasicItemStack {
    pub fn new(id: impl Into<String>, count: u32) -> Self {
        Self {
            id: id.into(),
            count,
            components: Map::new(),
        }
    }

    pub fn with_component(mut self, key: impl Into<String>, value: Value) -> Self {
        self.components.insert(key.into(), value);
        self
    }
}

impl ItemStack for BasicItemStack {
    fn empty() -> Self {
        Self::new(AIR_ITEM_ID, 0)
    }

    fn is_empty(&self) -> bool {
        self.count == 0 || self.id.is_empty() || self.id == AIR_ITEM_ID
    }
}

/// JSON codec for [`BasicItemStack`]: `{"id": ..., "count": ..., "components": {...}}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicItemCodec;

impl ItemCodec<BasicItemStack> for BasicItemCodec {
    fn encode(&self, stack: &BasicItemStack) -> Result<ItemDocument, ItemCodecError> {
        match serde_json::to_value(stack) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(other) => Err(ItemCodecError::Encode(format!(
                "expected object document, got {other}"
            ))),
            Err(err) => Err(ItemCodecError::Encode(err.to_string())),
        }
    }

    fn decode(&self, document: &ItemDocument) -> Result<BasicItemStack, ItemCodecError> {
        let stack: BasicItemStack = serde_json::from_value(Value::Object(document.clone()))
            .map_err(|err| ItemCodecError::Decode(err.to_string()))?;
        if stack.id.trim().is_empty() {
            return Err(ItemCodecError::Decode("item id must not be empty".to_owned()));
        }
        if stack.count == 0 {
            return Ok(BasicItemStack::empty());
        }
        Ok(stack)
    }
}
