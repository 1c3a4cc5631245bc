pub mod club;
pub mod exercise;
pub mod history;
pub mod personal_record;
pub mod set_entry;
pub mod settings;

use serde::{Deserialize, Deserializer};

/// For patch fields: a missing field stays `None`, an explicit `null`
/// becomes `Some(None)`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
