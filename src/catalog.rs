use indexmap::IndexMap;
use itertools::Itertools;
use strum::{Display, EnumIter, IntoEnumIterator, IntoStaticStr};

/// Scalar parameter groups, keyed by their internal-schema name.
#[derive(Clone, Copy, Debug, Display, EnumIter, Eq, Hash, IntoStaticStr, PartialEq)]
pub enum ParameterGroup {
    #[strum(serialize = "project_data")]
    ProjectData,
    #[strum(serialize = "economic_data")]
    EconomicData,
    #[strum(serialize = "simulation_settings")]
    SimulationSettings,
    #[strum(serialize = "constraints")]
    Constraints,
    #[strum(serialize = "fixcost")]
    FixCost,
    #[strum(serialize = "kpi")]
    Kpi,
}

impl ParameterGroup {
    pub fn internal_key(self) -> &'static str {
        self.into()
    }
}

/// Asset categories, keyed by their internal-schema name.
#[derive(Clone, Copy, Debug, Display, EnumIter, Eq, Hash, IntoStaticStr, PartialEq)]
pub enum AssetCategory {
    #[strum(serialize = "energyConsumption")]
    Consumption,
    #[strum(serialize = "energyConversion")]
    Conversion,
    #[strum(serialize = "energyProduction")]
    Production,
    #[strum(serialize = "energyStorage")]
    Storage,
    #[strum(serialize = "energyBusses")]
    Busses,
    #[strum(serialize = "energyProviders")]
    Providers,
}

impl AssetCategory {
    pub fn internal_key(self) -> &'static str {
        self.into()
    }
}

/// The fields the exchange schema sanctions for a parameter group.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldSet {
    /// Any field is accepted and nothing is pruned.
    Open,
    Closed(Vec<String>),
}

impl FieldSet {
    fn closed(fields: &[&str]) -> Self {
        FieldSet::Closed(fields.iter().map(|field| field.to_string()).collect())
    }

    pub fn allows(&self, field: &str) -> bool {
        match self {
            FieldSet::Open => true,
            FieldSet::Closed(fields) => fields.iter().any(|allowed| allowed == field),
        }
    }
}

const EXCHANGE_PROVIDER_FIELDS: &[&str] = &[
    "asset_type",
    "label",
    "type_oemof",
    "energy_vector",
    "inflow_direction",
    "outflow_direction",
    "connected_consumption_sources",
    "connected_feedin_sink",
    "development_costs",
    "dispatch_price",
    "energy_price",
    "feedin_tariff",
    "installed_capacity",
    "lifetime",
    "optimize_capacity",
    "peak_demand_pricing",
    "peak_demand_pricing_period",
    "renewable_share",
    "specific_costs",
    "specific_costs_om",
    "unit",
];

const EXCHANGE_CONSUMPTION_FIELDS: &[&str] = &[
    "asset_type",
    "label",
    "inflow_direction",
    "type_oemof",
    "development_costs",
    "dispatch_price",
    "installed_capacity",
    "lifetime",
    "optimize_capacity",
    "specific_costs",
    "specific_costs_om",
    "input_timeseries",
    "energy_vector",
];

const EXCHANGE_CONVERSION_FIELDS: &[&str] = &[
    "asset_type",
    "label",
    "energy_vector",
    "type_oemof",
    "inflow_direction",
    "outflow_direction",
    "outflow_direction",
    "age_installed",
    "development_costs",
    "dispatch_price",
    "efficiency",
    "installed_capacity",
    "lifetime",
    "maximum_capacity",
    "optimize_capacity",
    "specific_costs",
    "specific_costs_om",
];

const EXCHANGE_PRODUCTION_FIELDS: &[&str] = &[
    "asset_type",
    "label",
    "type_oemof",
    "outflow_direction",
    "outflow_direction",
    "development_costs",
    "dispatch_price",
    "dispatchable",
    "installed_capacity",
    "lifetime",
    "maximum_capacity",
    "optimize_capacity",
    "specific_costs",
    "specific_costs_om",
    "input_timeseries",
    "age_installed",
    "renewable_asset",
    "energy_vector",
];

const EXCHANGE_STORAGE_FIELDS: &[&str] = &[
    "asset_type",
    "label",
    "energy_vector",
    "inflow_direction",
    "outflow_direction",
    "outflow_direction",
    "type_oemof",
    "input power",
    "output power",
    "storage capacity",
    "optimize_capacity",
    "input_timeseries",
];

const EXCHANGE_BUS_FIELDS: &[&str] = &["label", "assets", "energy_vector"];

/// Declarative description of both schemas: which fields the exchange side expects for every
/// group and category, and which internal parameters the simulation cannot run without.
///
/// A catalog is never mutated once built.
#[derive(Clone, Debug)]
pub struct SchemaCatalog {
    imported_groups: Vec<ParameterGroup>,
    exported_groups: IndexMap<ParameterGroup, FieldSet>,
    asset_fields: IndexMap<AssetCategory, Vec<String>>,
    required_parameters: IndexMap<ParameterGroup, Vec<String>>,
    synthetic_suffixes: Vec<String>,
}

impl SchemaCatalog {
    pub fn standard() -> Self {
        let imported_groups = vec![
            ParameterGroup::ProjectData,
            ParameterGroup::EconomicData,
            ParameterGroup::SimulationSettings,
            ParameterGroup::Constraints,
            ParameterGroup::FixCost,
        ];

        let exported_groups = IndexMap::from([
            (
                ParameterGroup::ProjectData,
                FieldSet::closed(&["project_id", "project_name", "scenario_id", "scenario_name"]),
            ),
            (
                ParameterGroup::SimulationSettings,
                FieldSet::closed(&["start_date", "evaluated_period", "time_step"]),
            ),
            (ParameterGroup::Constraints, FieldSet::Open),
            (ParameterGroup::Kpi, FieldSet::closed(&["scalars"])),
            (ParameterGroup::FixCost, FieldSet::closed(&[])),
        ]);

        let asset_fields = [
            (AssetCategory::Providers, EXCHANGE_PROVIDER_FIELDS),
            (AssetCategory::Consumption, EXCHANGE_CONSUMPTION_FIELDS),
            (AssetCategory::Conversion, EXCHANGE_CONVERSION_FIELDS),
            (AssetCategory::Production, EXCHANGE_PRODUCTION_FIELDS),
            (AssetCategory::Storage, EXCHANGE_STORAGE_FIELDS),
            (AssetCategory::Busses, EXCHANGE_BUS_FIELDS),
        ]
        .into_iter()
        .map(|(category, fields)| {
            (
                category,
                fields.iter().unique().map(|field| field.to_string()).collect(),
            )
        })
        .collect();

        let required_parameters = [
            (
                ParameterGroup::ProjectData,
                &[
                    "country",
                    "latitude",
                    "longitude",
                    "project_id",
                    "project_name",
                    "scenario_id",
                    "scenario_name",
                ][..],
            ),
            (
                ParameterGroup::EconomicData,
                &["currency", "discount_factor", "project_duration", "tax"][..],
            ),
            (
                ParameterGroup::SimulationSettings,
                &["evaluated_period", "output_lp_file", "start_date", "timestep"][..],
            ),
            (ParameterGroup::Constraints, &["minimal_renewable_factor"][..]),
            (ParameterGroup::FixCost, &[][..]),
        ]
        .into_iter()
        .map(|(group, fields)| (group, fields.iter().map(|f| f.to_string()).collect()))
        .collect();

        Self {
            imported_groups,
            exported_groups,
            asset_fields,
            required_parameters,
            synthetic_suffixes: vec!["_excess".to_string(), "_sink".to_string()],
        }
    }

    /// Parameter groups read from an exchange payload, in reading order.
    pub fn imported_groups(&self) -> &[ParameterGroup] {
        &self.imported_groups
    }

    /// Asset categories read from an exchange payload, in reading order.
    pub fn imported_categories(&self) -> impl Iterator<Item = AssetCategory> {
        AssetCategory::iter()
    }

    /// Parameter groups written to an exchange payload together with their sanctioned fields.
    pub fn exported_groups(&self) -> impl Iterator<Item = (ParameterGroup, &FieldSet)> {
        self.exported_groups
            .iter()
            .map(|(group, fields)| (*group, fields))
    }

    /// Asset categories written to an exchange payload, in writing order.
    pub fn exported_categories(&self) -> impl Iterator<Item = AssetCategory> + '_ {
        self.asset_fields.keys().copied()
    }

    /// Exchange field names expected on every asset of the category.
    pub fn asset_fields(&self, category: AssetCategory) -> &[String] {
        self.asset_fields
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn required_parameters(&self) -> impl Iterator<Item = (ParameterGroup, &[String])> {
        self.required_parameters
            .iter()
            .map(|(group, fields)| (*group, fields.as_slice()))
    }

    /// Whether an internal asset only exists for bookkeeping inside the simulation (excess
    /// handling, auxiliary sinks).
    pub fn is_synthetic(&self, label: &str) -> bool {
        self.synthetic_suffixes
            .iter()
            .any(|suffix| label.ends_with(suffix.as_str()))
    }
}

impl Default for SchemaCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
