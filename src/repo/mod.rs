//! Postgres persistence
//!
//! Every function takes a `&mut PgConnection` so callers decide whether it
//! runs on a pooled connection or inside a transaction. Status columns are
//! stored as text and decoded through the domain enums' `FromStr`.

pub mod activity;
pub mod bids;
pub mod packages;
pub mod projects;
pub mod reports;
pub mod snapshot;
pub mod teams;
pub mod users;

use std::str::FromStr;

use crate::domain::UnknownVariant;

/// Parses a text column into a domain enum, surfacing bad values as a
/// decode error.
pub(crate) fn decode<T>(column: &str, value: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = UnknownVariant>,
{
    value.parse().map_err(|e: UnknownVariant| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

/// Converts fetched rows into entities, failing on the first bad row.
pub(crate) fn decode_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, sqlx::Error>
where
    T: TryFrom<R, Error = sqlx::Error>,
{
    rows.into_iter().map(T::try_from).collect()
}
