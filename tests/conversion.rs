use esm_exchange::output::{FileOutput, SinkOutput};
use esm_exchange::{
    run_conversion, to_exchange, to_internal, ConversionFlags, Direction, FieldMap, FieldValue,
    ParameterGap, Record, Translator,
};
use pretty_assertions::assert_eq;
use rstest::*;
use serde_json::{json, Value};
use std::fs;
use std::fs::File;
use std::path::PathBuf;
use walkdir::WalkDir;

fn record(value: Value) -> Record {
    serde_json::from_value(value).unwrap()
}

fn to_json(value: &Record) -> Value {
    serde_json::to_value(value).unwrap()
}

#[fixture]
fn translator() -> Translator {
    Translator::standard().unwrap()
}

#[fixture]
fn exchange() -> Record {
    record(json!({
        "project_data": {
            "country": "Germany",
            "latitude": 52.5,
            "longitude": 13.4,
            "project_id": 7,
            "project_name": "District heating",
            "scenario_id": 1,
            "scenario_name": "Heat pump"
        },
        "economic_data": {
            "currency": "EUR",
            "discount_factor": {"value": 0.05, "unit": "factor"},
            "project_duration": {"value": 25, "unit": "year"},
            "tax": {"value": 0, "unit": "factor"}
        },
        "simulation_settings": {
            "evaluated_period": {"value": 1, "unit": "day"},
            "output_lp_file": {"value": false, "unit": "bool"},
            "start_date": "2019-01-01 00:00",
            "time_step": {"value": 60, "unit": "minutes"}
        },
        "constraints": {"minimal_renewable_factor": {"value": 0.3, "unit": "factor"}},
        "fixcost": {},
        "energy_providers": [
            {"label": "Utility", "energy_vector": "Electricity", "energy_price": {"value": 0.3, "unit": "currency/kWh"}}
        ],
        "energy_consumption": [
            {"label": "Heat demand", "energy_vector": "Heat", "input_timeseries": {"unit": "kW", "data": [1, 2, 3]}},
            {"label": "Office", "energy_vector": "Electricity", "input_timeseries": {"unit": "kW", "data": [0.5, 0.7, 0.4]}}
        ],
        "energy_conversion": [
            {"label": "Heat pump", "energy_vector": "Heat", "efficiency": {"value": 3.2, "unit": "factor"}, "installed_capacity": {"value": 20, "unit": "kW"}}
        ],
        "energy_production": [],
        "energy_storage": [],
        "energy_busses": [
            {"label": "Heat", "energy_vector": "Heat", "assets": ["Heat demand", "Heat pump"]},
            {"label": "Electricity", "energy_vector": "Electricity", "assets": ["Utility", "Office", "Heat pump"]}
        ]
    }))
}

/// Stands in for the simulator: turns a converted payload into something shaped like its results.
fn simulated_results(mut internal: Record) -> Record {
    for assets in ["energyConsumption", "energyConversion", "energyProviders"] {
        if let Some(FieldValue::Record(assets)) = internal.get_mut(assets) {
            for (_, asset) in assets.iter_mut() {
                if let FieldValue::Record(fields) = asset {
                    fields.insert("optimizedAddCap".to_string(), 0i64.into());
                }
            }
        }
    }
    for (category, bus) in [("energyBusses", "Heat"), ("energyBusses", "Electricity")] {
        if let Some(FieldValue::Record(busses)) = internal.get_mut(category) {
            if let Some(FieldValue::Record(fields)) = busses.get_mut(bus) {
                if let Some(FieldValue::List(members)) = fields.shift_remove("assets") {
                    let members: Record = members
                        .into_iter()
                        .filter_map(|member| {
                            member
                                .as_text()
                                .map(|label| (label.to_string(), FieldValue::from(label)))
                        })
                        .collect();
                    fields.insert("Asset_list".to_string(), FieldValue::Record(members));
                }
            }
        }
    }
    if let Some(FieldValue::Record(consumption)) = internal.get_mut("energyConsumption") {
        consumption.insert(
            "Heat_excess".to_string(),
            FieldValue::Record(record(json!({"energyVector": "Heat"}))),
        );
        consumption.insert(
            "Utility_feedin_sink".to_string(),
            FieldValue::Record(record(json!({"energyVector": "Electricity"}))),
        );
    }
    internal
}

#[rstest]
fn should_map_every_internal_name_back_to_its_exchange_name() {
    let field_map = FieldMap::standard().unwrap();

    for (exchange, internal) in field_map.pairs() {
        assert_eq!(field_map.internal_name(exchange), internal);
        assert_eq!(field_map.exchange_name(internal), exchange);
    }
}

#[rstest]
fn should_round_trip_asset_labels_and_declared_fields(translator: Translator, exchange: Record) {
    let internal = translator.to_internal(&exchange).unwrap();
    let exported = translator.to_exchange(&simulated_results(internal), false);

    let labels = |payload: &Record, category: &str| -> Vec<String> {
        payload[category]
            .as_list()
            .unwrap()
            .iter()
            .map(|asset| asset.as_record().unwrap()["label"].as_text().unwrap().to_string())
            .collect()
    };
    for category in [
        "energy_providers",
        "energy_consumption",
        "energy_conversion",
        "energy_production",
        "energy_storage",
        "energy_busses",
    ] {
        assert_eq!(labels(&exported, category), labels(&exchange, category));
    }
    assert_eq!(
        to_json(&exported)["energy_conversion"],
        to_json(&exchange)["energy_conversion"]
    );
    assert_eq!(
        to_json(&exported)["energy_busses"],
        to_json(&exchange)["energy_busses"]
    );
}

#[rstest]
fn should_relocate_timeseries_unit_and_restore_it(translator: Translator, exchange: Record) {
    let internal = translator.to_internal(&exchange).unwrap();

    assert_eq!(
        to_json(&internal)["energyConsumption"]["Heat demand"],
        json!({"energyVector": "Heat", "timeseries": [1, 2, 3], "unit": "kW"})
    );

    let exported = translator.to_exchange(&internal, false);

    assert_eq!(
        to_json(&exported)["energy_consumption"][0]["input_timeseries"],
        json!({"unit": "kW", "data": [1, 2, 3]})
    );
}

#[rstest]
fn should_export_identical_bytes_on_every_run(translator: Translator, exchange: Record) {
    let results = simulated_results(translator.to_internal(&exchange).unwrap());

    let first = serde_json::to_string(&translator.to_exchange(&results, false)).unwrap();
    let second = serde_json::to_string(&translator.to_exchange(&results, true)).unwrap();

    assert_eq!(first, second);
}

#[rstest]
fn should_fill_default_constraints_exactly(translator: Translator, mut exchange: Record) {
    exchange.shift_remove("constraints");

    let internal = translator.to_internal(&exchange).unwrap();

    assert_eq!(
        to_json(&internal)["constraints"],
        json!({"minimal_renewable_factor": {"unit": "factor", "value": 0}})
    );
}

#[rstest]
fn should_name_economic_data_when_it_is_missing(mut exchange: Record) {
    exchange.shift_remove("economic_data");

    let error = to_internal(&exchange).unwrap_err();

    assert!(error.to_string().contains("economic_data"));
    assert_eq!(
        error.missing_parameters().unwrap().gaps()["economic_data"],
        ParameterGap::WholeGroup
    );
}

#[rstest]
fn should_never_export_bookkeeping_assets(translator: Translator, exchange: Record) {
    let results = simulated_results(translator.to_internal(&exchange).unwrap());

    let exported = to_exchange(&results, false).unwrap();

    let labels: Vec<&str> = exported["energy_consumption"]
        .as_list()
        .unwrap()
        .iter()
        .map(|asset| asset.as_record().unwrap()["label"].as_text().unwrap())
        .collect();
    assert_eq!(labels, vec!["Heat demand", "Office"]);
}

#[rstest]
fn should_keep_the_later_asset_when_labels_clash(translator: Translator, mut exchange: Record) {
    let storage: FieldValue = serde_json::from_value(json!([
        {"label": "Tank", "energy_vector": "Heat"},
        {"label": "Tank", "energy_vector": "Electricity"}
    ]))
    .unwrap();
    exchange.insert("energy_storage".to_string(), storage);

    let internal = translator.to_internal(&exchange).unwrap();

    assert_eq!(
        to_json(&internal)["energyStorage"],
        json!({"Tank": {"energyVector": "Electricity"}})
    );
}

#[rstest]
fn should_round_trip_assets_labelled_like_reserved_keys(
    translator: Translator,
    mut exchange: Record,
) {
    let storage: FieldValue = serde_json::from_value(json!([
        {"label": "value", "energy_vector": "Electricity"}
    ]))
    .unwrap();
    let production: FieldValue = serde_json::from_value(json!([
        {"label": "data", "energy_vector": "Electricity", "input_timeseries": {"unit": "kW", "data": [4, null, 6]}}
    ]))
    .unwrap();
    exchange.insert("energy_storage".to_string(), storage);
    exchange.insert("energy_production".to_string(), production);

    let internal = translator.to_internal(&exchange).unwrap();
    let (exported, report) = translator.to_exchange_with_report(&internal);

    assert_eq!(
        to_json(&exported)["energy_storage"],
        json!([{"label": "value", "energy_vector": "Electricity"}])
    );
    assert_eq!(
        to_json(&exported)["energy_production"],
        json!([{"label": "data", "energy_vector": "Electricity", "input_timeseries": {"unit": "kW", "data": [4, null, 6]}}])
    );
    assert!(!report.missing_groups.contains(&"energy_storage".to_string()));
    assert!(report.extra["energy_production"].is_empty());
}

#[rstest]
fn should_export_bus_whose_only_member_is_labelled_value(translator: Translator) {
    let internal = record(json!({
        "energyStorage": {"value": {"energyVector": "Electricity"}},
        "energyBusses": {
            "Electricity": {"energyVector": "Electricity", "Asset_list": {"value": "value"}}
        }
    }));

    let exported = translator.to_exchange(&internal, false);

    assert_eq!(
        to_json(&exported)["energy_busses"],
        json!([{"label": "Electricity", "energy_vector": "Electricity", "assets": ["value"]}])
    );
    assert_eq!(
        to_json(&exported)["energy_storage"],
        json!([{"label": "value", "energy_vector": "Electricity"}])
    );
}

#[rstest]
fn should_report_pruned_fields_of_simulated_results(translator: Translator, exchange: Record) {
    let results = simulated_results(translator.to_internal(&exchange).unwrap());

    let (_, report) = translator.to_exchange_with_report(&results);

    assert!(report.extra["energy_conversion"]
        .iter()
        .any(|extra| extra.label == "Heat pump" && extra.field == "optimizedAddCap"));
    assert_eq!(report.missing_groups, vec!["kpi".to_string()]);
}

#[rstest]
fn should_reject_payload_that_is_not_an_object() {
    let result = run_conversion(
        "[1, 2, 3]".as_bytes(),
        SinkOutput,
        Direction::ToInternal,
        &ConversionFlags::empty(),
    );

    assert!(result.is_err());
}

#[rstest]
fn should_write_converted_payload_and_report_to_files() {
    let output_dir = std::env::temp_dir().join("esm_exchange_conversion_test");
    fs::create_dir_all(&output_dir).unwrap();
    let output = FileOutput::new(output_dir.clone(), "results__{}.json".to_string());

    let report = run_conversion(
        File::open("./demos/internal/bus_depot_results.json").unwrap(),
        &output,
        Direction::ToExchange,
        &ConversionFlags::WRITE_REPORT,
    )
    .unwrap()
    .unwrap();

    let converted: Value =
        serde_json::from_reader(File::open(output_dir.join("results__converted.json")).unwrap())
            .unwrap();
    let written_report: Value =
        serde_json::from_reader(File::open(output_dir.join("results__report.json")).unwrap())
            .unwrap();
    assert_eq!(
        converted["kpi"],
        json!({"scalars": {"levelized_costs_of_electricity_equivalent": 0.74, "renewable_factor": 0.52}})
    );
    assert!(converted.get("economic_data").is_none());
    assert_eq!(written_report, serde_json::to_value(&report).unwrap());
}

fn demo_files(root: &str) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| !e.file_type().is_dir() && e.file_name().to_str().unwrap().ends_with("json"))
        .map(|e| e.into_path())
        .collect()
}

#[rstest]
fn should_convert_all_exchange_demo_files() {
    let files = demo_files("./demos/exchange");
    assert!(!files.is_empty());

    for path in files {
        let result = run_conversion(
            File::open(&path).unwrap(),
            SinkOutput,
            Direction::ToInternal,
            &ConversionFlags::empty(),
        );
        assert!(
            result.is_ok(),
            "error was {:?} when converting file {}",
            result.err().unwrap(),
            path.display()
        );
    }
}

#[rstest]
fn should_convert_all_internal_demo_files() {
    for path in demo_files("./demos/internal") {
        let result = run_conversion(
            File::open(&path).unwrap(),
            SinkOutput,
            Direction::ToExchange,
            &ConversionFlags::VERBOSE,
        );
        assert!(
            result.is_ok(),
            "error was {:?} when converting file {}",
            result.err().unwrap(),
            path.display()
        );
    }
}
