pub(crate) mod assets;
pub(crate) mod parameters;

use crate::catalog::SchemaCatalog;
use crate::field_map::{FieldMap, FieldMapError};
use crate::validation::{apply_missing_parameter_policy, MissingParameterError, ValidationReport};
use crate::value::{FieldValue, Record};
use tracing::{debug, info};

pub(crate) const LABEL: &str = "label";
pub(crate) const UNIT: &str = "unit";
pub(crate) const TIMESERIES: &str = "timeseries";
pub(crate) const BUS_MEMBERS: &str = "Asset_list";
pub(crate) const BUS_MEMBERS_EXCHANGE: &str = "assets";

/// Converts whole payloads between the exchange schema and the internal schema.
///
/// A translator holds only an immutable field map and catalog, so one instance can be shared
/// freely; every conversion builds its output from scratch and keeps nothing from its input.
#[derive(Clone, Debug)]
pub struct Translator {
    field_map: FieldMap,
    catalog: SchemaCatalog,
}

impl Translator {
    pub fn new(field_map: FieldMap, catalog: SchemaCatalog) -> Self {
        Self { field_map, catalog }
    }

    pub fn standard() -> Result<Self, FieldMapError> {
        Ok(Self::new(FieldMap::standard()?, SchemaCatalog::standard()))
    }

    pub fn field_map(&self) -> &FieldMap {
        &self.field_map
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    /// Converts a payload submitted through the hosting interface into simulation input.
    ///
    /// Absent groups and categories are only logged while converting. Once everything is
    /// converted, documented defaults are filled in; any required group or field still missing
    /// after that fails the conversion with every remaining gap listed.
    pub fn to_internal(&self, exchange: &Record) -> Result<Record, MissingParameterError> {
        let mut internal = Record::new();

        for group in self.catalog.imported_groups() {
            if let Some(fields) = parameters::exchange_to_internal(exchange, *group, &self.field_map)
            {
                internal.insert(group.internal_key().to_string(), FieldValue::Record(fields));
            }
        }

        for category in self.catalog.imported_categories() {
            if let Some(assets) = assets::exchange_to_internal(exchange, category, &self.field_map)
            {
                internal.insert(
                    category.internal_key().to_string(),
                    FieldValue::Record(assets),
                );
            }
        }

        apply_missing_parameter_policy(&mut internal, &self.catalog)?;

        Ok(internal)
    }

    /// Converts simulation results into an exchange payload, logging the schema drift report when
    /// `verbose` is set. The flag never changes the payload.
    pub fn to_exchange(&self, internal: &Record, verbose: bool) -> Record {
        let (exchange, report) = self.to_exchange_with_report(internal);
        if verbose {
            report.log();
        }
        exchange
    }

    /// Converts simulation results into an exchange payload, returning the drift report beside it.
    pub fn to_exchange_with_report(&self, internal: &Record) -> (Record, ValidationReport) {
        let mut exchange = Record::new();
        let mut report = ValidationReport::default();

        for (group, sanctioned) in self.catalog.exported_groups() {
            let exchange_key = self.field_map.exchange_name(group.internal_key());
            match parameters::internal_to_exchange(internal, group, sanctioned, &self.field_map) {
                Some(fields) => {
                    exchange.insert(exchange_key.to_string(), FieldValue::Record(fields));
                }
                None => report.record_missing_group(exchange_key),
            }
        }

        for category in self.catalog.exported_categories() {
            let exchange_key = self.field_map.exchange_name(category.internal_key());
            match assets::internal_to_exchange(
                internal,
                category,
                &self.catalog,
                &self.field_map,
                &mut report,
            ) {
                Some(assets) => {
                    exchange.insert(
                        exchange_key.to_string(),
                        FieldValue::List(assets.into_iter().map(FieldValue::Record).collect()),
                    );
                }
                None => report.record_missing_group(exchange_key),
            }
        }

        if !report.missing_groups.is_empty() {
            info!(
                "Groups absent from the results and left out of the exchange payload: {}",
                report.missing_groups.join(", ")
            );
        }

        (exchange, report)
    }
}

/// Builds a new record with every field name passed through `rename`, keeping field order. When
/// two source fields end up with the same name the later one wins.
pub(crate) fn rename_fields<'a>(
    fields: &'a Record,
    rename: impl Fn(&'a str) -> &'a str,
) -> Record {
    let mut renamed = Record::with_capacity(fields.len());
    for (name, value) in fields {
        let target = rename(name);
        if renamed.insert(target.to_string(), value.clone()).is_some() {
            debug!("More than one field is named '{target}' after renaming, the last one is kept");
        }
    }
    renamed
}
