//! Helpers for the id lists that link records to one another

use serde::{Deserialize, Deserializer};

use super::newtypes::RecordId;

/// Appends `id` unless it is already present. Returns true if the list changed.
pub(crate) fn attach(list: &mut Vec<RecordId>, id: &RecordId) -> bool {
    if list.contains(id) {
        return false;
    }
    list.push(id.clone());
    true
}

/// Removes the first occurrence of `id`. Returns true if the list changed.
pub(crate) fn detach(list: &mut Vec<RecordId>, id: &RecordId) -> bool {
    match list.iter().position(|existing| existing == id) {
        Some(index) => {
            list.remove(index);
            true
        }
        None => false,
    }
}

/// Reads a JSON list that older writers may have stored as `null`
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
