use super::rename_fields;
use crate::catalog::{FieldSet, ParameterGroup};
use crate::field_map::FieldMap;
use crate::value::{FieldValue, Record};
use tracing::{debug, warn};

/// Reads one parameter group out of an exchange payload, renaming its fields to their internal
/// names. A group that is absent (or not a mapping) is logged and left out.
pub(crate) fn exchange_to_internal(
    exchange: &Record,
    group: ParameterGroup,
    field_map: &FieldMap,
) -> Option<Record> {
    let exchange_key = field_map.exchange_name(group.internal_key());

    match exchange.get(exchange_key) {
        None => {
            warn!("The parameters group '{exchange_key}' is not present in the exchange parameters to be converted into the internal format");
            None
        }
        Some(FieldValue::Record(fields)) => {
            Some(rename_fields(fields, |name| field_map.internal_name(name)))
        }
        Some(other) => {
            warn!(
                "The parameters group '{exchange_key}' should be a mapping but is a {}, it is ignored",
                other.kind()
            );
            None
        }
    }
}

/// Writes one parameter group of an internal payload in exchange form, keeping only the fields
/// the exchange schema sanctions for it.
pub(crate) fn internal_to_exchange(
    internal: &Record,
    group: ParameterGroup,
    sanctioned: &FieldSet,
    field_map: &FieldMap,
) -> Option<Record> {
    let internal_key = group.internal_key();
    let fields = match internal.get(internal_key) {
        Some(FieldValue::Record(fields)) => fields,
        Some(other) => {
            warn!(
                "The parameters group '{internal_key}' should be a mapping but is a {}, it is not exported",
                other.kind()
            );
            return None;
        }
        None => return None,
    };

    Some(
        rename_fields(fields, |name| field_map.exchange_name(name))
            .into_iter()
            .filter(|(name, _)| {
                let keep = sanctioned.allows(name);
                if !keep {
                    debug!("'{name}' is not part of the exchange '{internal_key}' group, it is dropped");
                }
                keep
            })
            .collect(),
    )
}
