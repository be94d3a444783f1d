pub mod catalog;
mod convert;
pub mod errors;
pub mod field_map;
pub mod output;
pub mod validation;
pub mod value;

pub use crate::catalog::{AssetCategory, FieldSet, ParameterGroup, SchemaCatalog};
pub use crate::convert::Translator;
pub use crate::errors::ConversionError;
pub use crate::field_map::{FieldMap, FieldMapError};
pub use crate::validation::{AssetField, MissingParameterError, ParameterGap, ValidationReport};
pub use crate::value::{FieldValue, Quantity, Record, UnitSeries};

use crate::output::Output;
use bitflags::bitflags;
use std::io::{BufReader, Read, Write};
use std::sync::LazyLock;
use tracing::{debug, instrument};

pub const CONVERTED_LOCATION_KEY: &str = "converted";
pub const REPORT_LOCATION_KEY: &str = "report";

static STANDARD_TRANSLATOR: LazyLock<Result<Translator, FieldMapError>> =
    LazyLock::new(Translator::standard);

/// The translator built from the standard field map and catalog, constructed on first use.
pub fn standard_translator() -> Result<&'static Translator, ConversionError> {
    STANDARD_TRANSLATOR
        .as_ref()
        .map_err(|err| ConversionError::from(err.clone()))
}

/// Converts an exchange payload into simulation input using the standard field map and catalog.
pub fn to_internal(exchange: &Record) -> Result<Record, ConversionError> {
    Ok(standard_translator()?.to_internal(exchange)?)
}

/// Converts simulation results into an exchange payload using the standard field map and catalog.
pub fn to_exchange(internal: &Record, verbose: bool) -> Result<Record, ConversionError> {
    Ok(standard_translator()?.to_exchange(internal, verbose))
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    ToInternal,
    ToExchange,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct ConversionFlags: u8 {
        const VERBOSE = 0b1;
        const WRITE_REPORT = 0b10;
    }
}

/// Reads a JSON payload from `input`, converts it in the given direction and writes the result
/// to the "converted" location of `output`.
///
/// When converting to the exchange schema with [`ConversionFlags::WRITE_REPORT`] set, the drift
/// report is also written to the "report" location. The report is returned either way.
#[instrument(skip_all)]
pub fn run_conversion(
    input: impl Read,
    output: impl Output,
    direction: Direction,
    flags: &ConversionFlags,
) -> anyhow::Result<Option<ValidationReport>> {
    let payload: Record =
        serde_json::from_reader(BufReader::new(input)).map_err(ConversionError::from)?;
    let translator = standard_translator()?;
    debug!("Converting a payload of {} top-level groups", payload.len());

    let (converted, report) = match direction {
        Direction::ToInternal => (
            translator
                .to_internal(&payload)
                .map_err(ConversionError::from)?,
            None,
        ),
        Direction::ToExchange => {
            let (converted, report) = translator.to_exchange_with_report(&payload);
            if flags.contains(ConversionFlags::VERBOSE) {
                report.log();
            }
            (converted, Some(report))
        }
    };

    if output.is_noop() {
        return Ok(report);
    }

    write_json(&output, CONVERTED_LOCATION_KEY, &converted)?;
    if let Some(report) = report
        .as_ref()
        .filter(|_| flags.contains(ConversionFlags::WRITE_REPORT))
    {
        write_json(&output, REPORT_LOCATION_KEY, report)?;
    }

    Ok(report)
}

fn write_json(
    output: &impl Output,
    location_key: &str,
    value: &impl serde::Serialize,
) -> anyhow::Result<()> {
    let mut writer = output.writer_for_location_key(location_key)?;
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
