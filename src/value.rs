use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

/// An insertion-ordered mapping from field name to value. Parameter groups, assets and whole
/// documents are all records.
pub type Record = IndexMap<String, FieldValue>;

/// One timeseries sample. A sample the simulator could not compute is written as JSON `null`.
pub type Sample = Option<Number>;

/// A value found in either schema.
///
/// Reading JSON only ever yields the structural variants (scalars, `List`, `Record`), because a
/// mapping whose keys are user labels can look exactly like a quantity or a timeseries. Callers
/// that know they hold a field value use [`FieldValue::classify`] to get the richer shapes.
/// Numbers keep their original JSON representation so that integers are written back out as
/// integers.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(Number),
    Text(String),
    /// A bare timeseries, as held in the internal schema.
    Series(Vec<Sample>),
    /// A timeseries bundled with its unit, as held in the exchange schema.
    UnitSeries(UnitSeries),
    Quantity(Quantity),
    List(Vec<FieldValue>),
    Record(Record),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UnitSeries {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub data: Vec<Sample>,
}

impl UnitSeries {
    pub fn new(unit: Option<String>, data: Vec<Sample>) -> Self {
        Self { unit, data }
    }
}

/// A value paired with its physical unit tag, e.g. `{"unit": "factor", "value": 0}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Quantity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub value: Box<FieldValue>,
}

impl Quantity {
    pub fn new(value: impl Into<FieldValue>, unit: impl Into<String>) -> Self {
        Self {
            unit: Some(unit.into()),
            value: Box::new(value.into()),
        }
    }
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            FieldValue::Record(record) => Some(record),
            _ => None,
        }
    }

    /// The items of a list. An empty series counts as an empty list.
    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items.as_slice()),
            FieldValue::Series(data) if data.is_empty() => Some(&[]),
            _ => None,
        }
    }

    /// The samples of a bare timeseries, whether already classified or still a plain list of
    /// numbers and nulls.
    pub fn series_data(&self) -> Option<Vec<Sample>> {
        match self {
            FieldValue::Series(data) => Some(data.clone()),
            FieldValue::List(items) => samples(items),
            _ => None,
        }
    }

    /// Reads a field value as its most specific shape: a list of numbers (and nulls) becomes a
    /// `Series`, `{unit, data}` a `UnitSeries` and `{value, unit}` a `Quantity`. A `unit`, when
    /// present, must be text. Anything else is returned unchanged.
    ///
    /// Only the outermost value is classified.
    pub fn classify(self) -> Self {
        match self {
            FieldValue::List(items) => match samples(&items) {
                Some(data) => FieldValue::Series(data),
                None => FieldValue::List(items),
            },
            FieldValue::Record(record) => classify_record(record),
            other => other,
        }
    }

    /// Short name of the variant, used in log messages.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "boolean",
            FieldValue::Number(_) => "number",
            FieldValue::Text(_) => "text",
            FieldValue::Series(_) => "timeseries",
            FieldValue::UnitSeries(_) => "timeseries with unit",
            FieldValue::Quantity(_) => "value with unit",
            FieldValue::List(_) => "list",
            FieldValue::Record(_) => "record",
        }
    }
}

fn samples(items: &[FieldValue]) -> Option<Vec<Sample>> {
    items
        .iter()
        .map(|item| match item {
            FieldValue::Number(number) => Some(Some(number.clone())),
            FieldValue::Null => Some(None),
            _ => None,
        })
        .collect()
}

fn classify_record(mut record: Record) -> FieldValue {
    let unit = match record.get("unit") {
        None => None,
        Some(FieldValue::Text(unit)) => Some(unit.clone()),
        Some(_) => return FieldValue::Record(record),
    };
    if record.len() != 1 + usize::from(unit.is_some()) {
        return FieldValue::Record(record);
    }

    if let Some(data) = record.get("data").and_then(FieldValue::series_data) {
        return FieldValue::UnitSeries(UnitSeries::new(unit, data));
    }
    match record.shift_remove("value") {
        Some(value) => FieldValue::Quantity(Quantity {
            unit,
            value: Box::new(value),
        }),
        None => FieldValue::Record(record),
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Value::deserialize(deserializer)?.into())
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(flag) => FieldValue::Bool(flag),
            Value::Number(number) => FieldValue::Number(number),
            Value::String(text) => FieldValue::Text(text),
            Value::Array(items) => {
                FieldValue::List(items.into_iter().map(FieldValue::from).collect())
            }
            Value::Object(map) => FieldValue::Record(
                map.into_iter()
                    .map(|(key, value)| (key, value.into()))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(FieldValue::Null, FieldValue::Number)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Quantity> for FieldValue {
    fn from(value: Quantity) -> Self {
        FieldValue::Quantity(value)
    }
}

impl From<UnitSeries> for FieldValue {
    fn from(value: UnitSeries) -> Self {
        FieldValue::UnitSeries(value)
    }
}

impl From<Record> for FieldValue {
    fn from(value: Record) -> Self {
        FieldValue::Record(value)
    }
}
