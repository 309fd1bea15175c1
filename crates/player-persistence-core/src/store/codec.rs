use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::CoreError;

pub fn parse_timestamp(value: &str) -> Result<OffsetDateTime, CoreError> {
    OffsetDateTime::parse(value.trim(), &Rfc3339).map_err(|err| {
        CoreError::Persistence(format!("invalid last_updated timestamp '{value}': {err}"))
    })
}

pub(crate) fn persistence(err: rusqlite::Error) -> CoreError {
    CoreError::Persistence(err.to_string())
}
