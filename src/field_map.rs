use indexmap::map::Entry;
use indexmap::IndexMap;
use thiserror::Error;

/// Field names shared by both schemas but spelled differently, as (exchange, internal) pairs.
///
/// Group and category names are part of the same table, so that a top-level key is translated
/// exactly like a field inside a group.
const STANDARD_FIELD_PAIRS: [(&str, &str); 19] = [
    ("economic_data", "economic_data"),
    ("energy_providers", "energyProviders"),
    ("energy_busses", "energyBusses"),
    ("energy_consumption", "energyConsumption"),
    ("energy_conversion", "energyConversion"),
    ("energy_production", "energyProduction"),
    ("energy_storage", "energyStorage"),
    ("project_data", "project_data"),
    ("simulation_settings", "simulation_settings"),
    ("energy_vector", "energyVector"),
    ("installed_capacity", "installedCap"),
    ("optimize_capacity", "optimizeCap"),
    ("maximum_capacity", "maximumCap"),
    ("input_timeseries", "timeseries"),
    ("constraints", "constraints"),
    ("renewable_asset", "renewableAsset"),
    ("kpi", "kpi"),
    ("fixcost", "fixcost"),
    ("time_step", "timestep"),
];

#[derive(Clone, Debug, Error, PartialEq)]
pub enum FieldMapError {
    #[error("exchange field '{0}' is mapped more than once")]
    DuplicateExchangeName(String),
    #[error("internal field '{internal}' is the target of both '{first}' and '{second}', so the mapping cannot be inverted")]
    DuplicateInternalName {
        internal: String,
        first: String,
        second: String,
    },
}

/// Bidirectional lookup between exchange-schema and internal-schema field names.
///
/// The reverse table is derived from the forward table when the map is built, and building fails
/// if either direction would be ambiguous. Names with no entry pass through unchanged.
#[derive(Clone, Debug)]
pub struct FieldMap {
    to_internal: IndexMap<String, String>,
    to_exchange: IndexMap<String, String>,
}

impl FieldMap {
    pub fn new<E, I>(pairs: impl IntoIterator<Item = (E, I)>) -> Result<Self, FieldMapError>
    where
        E: Into<String>,
        I: Into<String>,
    {
        let mut to_internal: IndexMap<String, String> = IndexMap::new();
        for (exchange, internal) in pairs {
            match to_internal.entry(exchange.into()) {
                Entry::Occupied(entry) => {
                    return Err(FieldMapError::DuplicateExchangeName(entry.key().clone()))
                }
                Entry::Vacant(entry) => {
                    entry.insert(internal.into());
                }
            }
        }

        let mut to_exchange: IndexMap<String, String> = IndexMap::with_capacity(to_internal.len());
        for (exchange, internal) in &to_internal {
            if let Some(first) = to_exchange.insert(internal.clone(), exchange.clone()) {
                return Err(FieldMapError::DuplicateInternalName {
                    internal: internal.clone(),
                    first,
                    second: exchange.clone(),
                });
            }
        }

        Ok(Self {
            to_internal,
            to_exchange,
        })
    }

    pub fn standard() -> Result<Self, FieldMapError> {
        Self::new(STANDARD_FIELD_PAIRS)
    }

    pub fn to_internal(&self, exchange_name: &str) -> Option<&str> {
        self.to_internal.get(exchange_name).map(String::as_str)
    }

    pub fn to_exchange(&self, internal_name: &str) -> Option<&str> {
        self.to_exchange.get(internal_name).map(String::as_str)
    }

    /// The internal name for an exchange field, or the name itself when it is not mapped.
    pub fn internal_name<'a>(&'a self, exchange_name: &'a str) -> &'a str {
        self.to_internal(exchange_name).unwrap_or(exchange_name)
    }

    /// The exchange name for an internal field, or the name itself when it is not mapped.
    pub fn exchange_name<'a>(&'a self, internal_name: &'a str) -> &'a str {
        self.to_exchange(internal_name).unwrap_or(internal_name)
    }

    /// Forward pairs in the order they were declared.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.to_internal
            .iter()
            .map(|(exchange, internal)| (exchange.as_str(), internal.as_str()))
    }

    pub fn len(&self) -> usize {
        self.to_internal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_internal.is_empty()
    }
}
