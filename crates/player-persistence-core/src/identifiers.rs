use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

const NODE_ID_MAX_LEN: usize = 48;
const LOCATION_TABLE_PREFIX: &str = "player_locations_";

/// Globally unique player identity. Stored as hyphenated lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(Uuid);

impl PlayerId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn to_db_string(&self) -> String {
        self.0.hyphenated().to_string()
    }
}

impl From<Uuid> for PlayerId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for PlayerId {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|err| CoreError::InvalidPlayerId(format!("'{value}': {err}")))
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Server node identifier, validated so it can be embedded in a table name.
///
/// Accepts ASCII alphanumerics and `_`, 1 to 48 characters. The value is
/// lowercased so `Lobby` and `lobby` share one location table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(value: impl AsRef<str>) -> Result<Self, CoreError> {
        let raw = value.as_ref().trim();
        if raw.is_empty() {
            return Err(CoreError::Configuration(
                "server node identifier must not be empty".to_owned(),
            ));
        }
        if raw.len() > NODE_ID_MAX_LEN {
            return Err(CoreError::Configuration(format!(
                "server node identifier '{raw}' exceeds {NODE_ID_MAX_LEN} characters"
            )));
        }
        if let Some(invalid) = raw
            .chars()
            .find(|ch| !(ch.is_ascii_alphanumeric() || *ch == '_'))
        {
            return Err(CoreError::Configuration(format!(
                "server node identifier '{raw}' contains unsupported character '{invalid}'"
            )));
        }

        Ok(Self(raw.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn location_table(&self) -> String {
        format!("{LOCATION_TABLE_PREFIX}{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
