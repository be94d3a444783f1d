use super::{rename_fields, BUS_MEMBERS, BUS_MEMBERS_EXCHANGE, LABEL, TIMESERIES, UNIT};
use crate::catalog::{AssetCategory, SchemaCatalog};
use crate::field_map::FieldMap;
use crate::validation::{AssetField, ValidationReport};
use crate::value::{FieldValue, Record, UnitSeries};
use tracing::{debug, warn};

/// Reads one asset category out of an exchange payload.
///
/// The exchange list is re-keyed by asset label; the label itself is not kept as a field. When two
/// assets share a label the later one replaces the earlier one. A timeseries given as
/// `{unit, data}` is split into a bare series and a sibling `unit` field.
pub(crate) fn exchange_to_internal(
    exchange: &Record,
    category: AssetCategory,
    field_map: &FieldMap,
) -> Option<Record> {
    let exchange_key = field_map.exchange_name(category.internal_key());

    let Some(value) = exchange.get(exchange_key) else {
        warn!("The assets parameters '{exchange_key}' is not present in the exchange parameters to be converted into the internal format");
        return None;
    };
    let Some(assets) = value.as_list() else {
        warn!(
            "The assets parameters '{exchange_key}' should be a list but is a {}, it is ignored",
            value.kind()
        );
        return None;
    };

    let mut by_label = Record::new();
    for (position, asset) in assets.iter().enumerate() {
        let Some(fields) = asset.as_record() else {
            warn!(
                "Asset {position} of '{exchange_key}' should be a mapping but is a {}, it is ignored",
                asset.kind()
            );
            continue;
        };
        let Some(label) = fields.get(LABEL).and_then(FieldValue::as_text) else {
            warn!("Asset {position} of '{exchange_key}' has no text '{LABEL}', it is ignored");
            continue;
        };

        let mut internal = rename_fields(fields, |name| field_map.internal_name(name));
        internal.shift_remove(LABEL);
        split_timeseries_unit(&mut internal);

        if by_label
            .insert(label.to_string(), FieldValue::Record(internal))
            .is_some()
        {
            warn!("The label '{label}' is used by more than one asset of '{exchange_key}', only the last one is kept");
        }
    }

    Some(by_label)
}

fn split_timeseries_unit(asset: &mut Record) {
    let Some(FieldValue::UnitSeries(series)) =
        asset.get(TIMESERIES).cloned().map(FieldValue::classify)
    else {
        return;
    };

    asset.insert(TIMESERIES.to_string(), FieldValue::Series(series.data));
    if let Some(unit) = series.unit {
        asset.insert(UNIT.to_string(), FieldValue::Text(unit));
    }
}

/// Writes one asset category of an internal payload as an exchange list.
///
/// Synthetic bookkeeping assets are skipped. Every remaining asset gets its label back as a field,
/// its timeseries bundled with its unit and, for busses, its member assets flattened into a list of
/// labels. Fields unknown to the exchange schema are pruned; pruned and absent fields are recorded
/// in the report.
pub(crate) fn internal_to_exchange(
    internal: &Record,
    category: AssetCategory,
    catalog: &SchemaCatalog,
    field_map: &FieldMap,
    report: &mut ValidationReport,
) -> Option<Vec<Record>> {
    let internal_key = category.internal_key();
    let exchange_key = field_map.exchange_name(internal_key);

    let assets = match internal.get(internal_key) {
        Some(FieldValue::Record(assets)) => assets,
        Some(other) => {
            warn!(
                "The assets parameters '{internal_key}' should be a mapping but is a {}, it is not exported",
                other.kind()
            );
            return None;
        }
        None => return None,
    };

    report.open_category(exchange_key);
    let expected = catalog.asset_fields(category);
    let mut exported = Vec::with_capacity(assets.len());

    for (label, asset) in assets {
        if catalog.is_synthetic(label) {
            debug!("'{label}' of '{internal_key}' is a bookkeeping asset, it is not exported");
            continue;
        }
        let Some(fields) = asset.as_record() else {
            warn!(
                "Asset '{label}' of '{internal_key}' should be a mapping but is a {}, it is not exported",
                asset.kind()
            );
            continue;
        };

        let mut exchange_asset = Record::from([(LABEL.to_string(), FieldValue::from(label.as_str()))]);
        for (name, value) in fields {
            if name == LABEL {
                continue;
            }
            if category == AssetCategory::Busses && name == BUS_MEMBERS {
                exchange_asset.insert(BUS_MEMBERS_EXCHANGE.to_string(), bus_member_labels(value));
            } else {
                exchange_asset.insert(field_map.exchange_name(name).to_string(), value.clone());
            }
        }
        bundle_timeseries_unit(&mut exchange_asset, field_map.exchange_name(TIMESERIES), label);

        let (kept, pruned): (Vec<_>, Vec<_>) = exchange_asset
            .into_iter()
            .partition(|(name, _)| expected.contains(name));
        for (name, _) in pruned {
            report.record_extra(exchange_key, AssetField::new(label.as_str(), name));
        }
        let kept: Record = kept.into_iter().collect();
        for field in expected {
            if !kept.contains_key(field.as_str()) {
                report.record_missing(exchange_key, AssetField::new(label.as_str(), field.as_str()));
            }
        }

        exported.push(kept);
    }

    Some(exported)
}

/// The labels of a bus's member assets, in their original order.
fn bus_member_labels(members: &FieldValue) -> FieldValue {
    match members {
        FieldValue::Record(members) => FieldValue::List(
            members
                .keys()
                .map(|label| FieldValue::from(label.as_str()))
                .collect(),
        ),
        FieldValue::List(_) => members.clone(),
        other => {
            warn!(
                "Bus member assets should be a mapping but are a {}, they are exported as found",
                other.kind()
            );
            other.clone()
        }
    }
}

fn bundle_timeseries_unit(asset: &mut Record, timeseries_key: &str, label: &str) {
    let data = match asset.get(timeseries_key).cloned().map(FieldValue::classify) {
        None | Some(FieldValue::UnitSeries(_)) => return,
        Some(value) => match value.series_data() {
            Some(data) => data,
            None => {
                warn!(
                    "The timeseries of '{label}' should be a sequence of numbers but is a {}, it is exported as found",
                    value.kind()
                );
                return;
            }
        },
    };

    let unit = match asset.shift_remove(UNIT) {
        Some(FieldValue::Text(unit)) => Some(unit),
        Some(other) => {
            warn!(
                "The unit of '{label}' should be text but is a {}, it is left outside the timeseries",
                other.kind()
            );
            asset.insert(UNIT.to_string(), other);
            None
        }
        None => None,
    };

    asset.insert(
        timeseries_key.to_string(),
        FieldValue::UnitSeries(UnitSeries::new(unit, data)),
    );
}
