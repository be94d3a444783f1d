use crate::catalog::{ParameterGroup, SchemaCatalog};
use crate::value::{FieldValue, Quantity, Record};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;
use std::iter;
use thiserror::Error;
use tracing::{info, warn};

const MINIMAL_RENEWABLE_FACTOR: &str = "minimal_renewable_factor";
const OUTPUT_LP_FILE: &str = "output_lp_file";
const MISSING_PARAMETERS_HEADER: &str =
    "The following parameter groups and sub parameters are missing from input parameters:";

/// A single field on a single asset, as referenced by a [`ValidationReport`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct AssetField {
    pub label: String,
    pub field: String,
}

impl AssetField {
    pub fn new(label: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            field: field.into(),
        }
    }
}

/// Schema drift found while producing an exchange payload.
///
/// Categories are keyed by their exchange name. None of this is fatal; it is only reported.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Fields the exchange schema expects that an asset did not provide.
    pub missing: IndexMap<String, Vec<AssetField>>,
    /// Fields an asset provided that the exchange schema does not know about. These were pruned.
    pub extra: IndexMap<String, Vec<AssetField>>,
    /// Parameter groups and asset categories absent from the internal payload altogether.
    pub missing_groups: Vec<String>,
}

impl ValidationReport {
    pub(crate) fn open_category(&mut self, category: &str) {
        self.missing.entry(category.to_string()).or_default();
        self.extra.entry(category.to_string()).or_default();
    }

    pub(crate) fn record_missing(&mut self, category: &str, field: AssetField) {
        self.missing
            .entry(category.to_string())
            .or_default()
            .push(field);
    }

    pub(crate) fn record_extra(&mut self, category: &str, field: AssetField) {
        let extra = self.extra.entry(category.to_string()).or_default();
        if !extra.contains(&field) {
            extra.push(field);
        }
    }

    pub(crate) fn record_missing_group(&mut self, group: &str) {
        self.missing_groups.push(group.to_string());
    }

    pub fn is_clean(&self) -> bool {
        self.missing_groups.is_empty()
            && self.missing.values().all(Vec::is_empty)
            && self.extra.values().all(Vec::is_empty)
    }

    /// Emits the report through the logger.
    pub fn log(&self) {
        info!("{} Missing values {}", "#".repeat(10), "#".repeat(10));
        for group in &self.missing_groups {
            info!("{group}: not present");
        }
        log_fields(&self.missing);
        info!("{} Extra values {}", "#".repeat(10), "#".repeat(12));
        log_fields(&self.extra);
    }
}

fn log_fields(fields_by_category: &IndexMap<String, Vec<AssetField>>) {
    for (category, fields) in fields_by_category {
        if fields.is_empty() {
            info!("{category}: none");
        }
        for AssetField { label, field } in fields {
            info!("{category}: ({label}, {field})");
        }
    }
}

/// What is missing from a parameter group or asset category.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum ParameterGap {
    /// The group is not present at all.
    WholeGroup,
    /// The group is present but lacks these fields.
    Fields(Vec<String>),
}

/// Raised when the internal payload still lacks required parameters after all defaults were
/// applied. Gaps are keyed by internal group name, in the order they were found.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{}", describe_gaps(.gaps))]
pub struct MissingParameterError {
    gaps: IndexMap<String, ParameterGap>,
}

impl MissingParameterError {
    pub fn gaps(&self) -> &IndexMap<String, ParameterGap> {
        &self.gaps
    }
}

fn describe_gaps(gaps: &IndexMap<String, ParameterGap>) -> String {
    let lines = gaps.iter().flat_map(|(group, gap)| {
        let fields = match gap {
            ParameterGap::WholeGroup => &[][..],
            ParameterGap::Fields(fields) => fields.as_slice(),
        };
        iter::once(group.clone())
            .chain(fields.iter().map(|field| format!("\t`{field}` parameter")))
    });

    iter::once(MISSING_PARAMETERS_HEADER.to_string())
        .chain(lines)
        .join("\n")
}

/// Compares a freshly converted internal payload against the parameters the simulation needs.
pub(crate) fn missing_parameters(
    internal: &Record,
    catalog: &SchemaCatalog,
) -> IndexMap<String, ParameterGap> {
    let mut gaps = IndexMap::new();

    for (group, required) in catalog.required_parameters() {
        let key = group.internal_key();
        match internal.get(key).and_then(FieldValue::as_record) {
            None => {
                gaps.insert(key.to_string(), ParameterGap::WholeGroup);
            }
            Some(fields) => {
                let absent: Vec<String> = required
                    .iter()
                    .filter(|field| !fields.contains_key(field.as_str()))
                    .cloned()
                    .collect();
                if !absent.is_empty() {
                    gaps.insert(key.to_string(), ParameterGap::Fields(absent));
                }
            }
        }
    }

    for category in catalog.imported_categories() {
        let key = category.internal_key();
        if !internal.contains_key(key) {
            gaps.insert(key.to_string(), ParameterGap::WholeGroup);
        }
    }

    gaps
}

/// Fills the gaps that have a documented default, and fails with every remaining gap otherwise.
pub(crate) fn apply_missing_parameter_policy(
    internal: &mut Record,
    catalog: &SchemaCatalog,
) -> Result<(), MissingParameterError> {
    let mut gaps = missing_parameters(internal, catalog);
    if gaps.is_empty() {
        return Ok(());
    }

    let constraints = ParameterGroup::Constraints.internal_key();
    if gaps.get(constraints) == Some(&ParameterGap::WholeGroup) {
        warn!("No '{constraints}' were provided, a {MINIMAL_RENEWABLE_FACTOR} of 0 is assumed");
        internal.insert(
            constraints.to_string(),
            FieldValue::Record(Record::from([(
                MINIMAL_RENEWABLE_FACTOR.to_string(),
                Quantity::new(0i64, "factor").into(),
            )])),
        );
        gaps.shift_remove(constraints);
    }

    let settings = ParameterGroup::SimulationSettings.internal_key();
    let only_lp_file_missing = matches!(
        gaps.get(settings),
        Some(ParameterGap::Fields(fields)) if fields.len() == 1 && fields[0] == OUTPUT_LP_FILE
    );
    if only_lp_file_missing {
        if let Some(FieldValue::Record(settings_fields)) = internal.get_mut(settings) {
            info!("No '{OUTPUT_LP_FILE}' setting was provided, the LP file will not be written");
            settings_fields.insert(
                OUTPUT_LP_FILE.to_string(),
                Quantity::new(false, "bool").into(),
            );
            gaps.shift_remove(settings);
        }
    }

    let fix_cost = ParameterGroup::FixCost.internal_key();
    if gaps.get(fix_cost) == Some(&ParameterGap::WholeGroup) {
        warn!("No '{fix_cost}' group was provided, an empty one is assumed");
        internal.insert(fix_cost.to_string(), FieldValue::Record(Record::new()));
        gaps.shift_remove(fix_cost);
    }

    if gaps.is_empty() {
        Ok(())
    } else {
        Err(MissingParameterError { gaps })
    }
}
