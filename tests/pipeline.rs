//! Integration tests for the relabel/aggregate pipeline.
use emeval::aggregate::{AggregateBy, AggregationOptions, aggregate, pivot_by_period};
use emeval::relabel::relabel;
use emeval::results::{RawResultRow, ResultsMode};
use emeval::units::Quantity;
use float_cmp::assert_approx_eq;
use itertools::Itertools;

/// Parse a raw dump given as (variable label, value) pairs
fn parse_rows(rows: &[(&str, f64)]) -> Vec<RawResultRow> {
    rows.iter()
        .map(|(label, value)| RawResultRow::from_variable_label(label, *value).unwrap())
        .collect()
}

#[test]
fn storage_investments_land_in_detail_table_only() {
    let raw = parse_rows(&[
        ("('DE_storage_el_PHS_new_built', 'None', 2025)", 50.0),
        ("('DE_bus_el', 'DE_storage_el_PHS_new_built', 2025)", 10.0),
    ]);

    let rows = relabel(&raw, ResultsMode::Investment);
    let units = rows.iter().map(|row| row.unit.as_str()).collect_vec();
    assert_eq!(units, ["PHS_capacity", "PHS_outflow"]);

    let output = aggregate(
        &rows,
        &AggregationOptions::investment(AggregateBy::EnergyCarrier),
    );
    assert!(output.aggregated.is_empty());

    let detail = output
        .storage_detail
        .iter()
        .map(|(key, value)| (key.category_label().to_string(), *value))
        .collect_vec();
    assert_eq!(
        detail,
        [
            ("PHS_capacity".to_string(), Quantity(50.0)),
            ("PHS_outflow".to_string(), Quantity(10.0)),
        ]
    );
}

#[test]
fn relabeling_swaps_storage_directions_between_modes() {
    let raw = parse_rows(&[
        ("('DE_storage_el_battery_new_built', 'DE_bus_el', 2025)", 5.0),
        ("('DE_bus_el', 'DE_storage_el_battery_new_built', 2025)", 7.0),
    ]);

    let investment = relabel(&raw, ResultsMode::Investment);
    assert_eq!(investment[0].unit.as_str(), "battery_inflow");
    assert_eq!(investment[1].unit.as_str(), "battery_outflow");

    let dispatch = relabel(&raw, ResultsMode::Dispatch);
    assert_eq!(dispatch[0].unit.as_str(), "battery_new_built_outflow");
    assert_eq!(dispatch[1].unit.as_str(), "battery_new_built_inflow");
}

#[test]
fn investment_pipeline_aggregates_by_carrier_and_year() {
    let raw = parse_rows(&[
        ("('DE_transformer_natgas_GT_new_built', 'None', 2025)", 400.0),
        ("('DE_transformer_natgas_CC_new_built', 'None', 2025)", 100.0),
        ("('DE_transformer_natgas_GT_new_built', 'None', 2030)", 50.0),
        ("('DE_transformer_lignite_ST_new_built', 'None', 2025)", 80.0),
        ("('DE_storage_el_battery_new_built', 'None', 2025)", 30.0),
        ("('DE_bus_el', 'DE_sink_el_load', 2025)", 70.0),
        (
            "('DE_bus_el', 'DE_transformer_hydrogen_electrolyzer', 2030)",
            25.0,
        ),
        ("('DE_bus_el', 'hoho_cluster_shift_only', 2025)", 5.0),
        ("('hoho_cluster_shift_only', 'dsm_up', 2025)", 3.0),
    ]);

    let rows = relabel(&raw, ResultsMode::Investment);
    let options = AggregationOptions::investment(AggregateBy::EnergyCarrier);
    let output = aggregate(&rows, &options);

    let lookup = |label: &str, period: &str| {
        output
            .aggregated
            .iter()
            .find(|(key, _)| {
                key.category_label() == label
                    && key.period.as_ref().map(|p| p.as_str()) == Some(period)
            })
            .map(|(_, value)| value.value())
            .unwrap()
    };

    // Both natgas technologies are summed into one carrier cell per year
    assert_approx_eq!(f64, lookup("natgas", "2025"), 500.0);
    assert_approx_eq!(f64, lookup("natgas", "2030"), 50.0);
    assert_approx_eq!(f64, lookup("lignite", "2025"), 80.0);
    assert_approx_eq!(f64, lookup("hydrogen_electrolyzer", "2030"), 25.0);

    // Non-carrier units stay visible as singleton categories
    assert_approx_eq!(f64, lookup("DE_sink_el_load", "2025"), 70.0);
    assert_approx_eq!(
        f64,
        lookup("hoho_cluster_shift_only_demand_after", "2025"),
        5.0
    );
    assert_approx_eq!(f64, lookup("hoho_cluster_shift_only_dsm_up", "2025"), 3.0);

    // Battery energy capacity is reported apart
    assert_eq!(output.storage_detail.len(), 1);

    // Every input row contributes to exactly one output cell
    let input_total: f64 = raw.iter().map(|row| row.value.value()).sum();
    let output_total: f64 = output
        .aggregated
        .values()
        .chain(output.storage_detail.values())
        .map(|value| value.value())
        .sum();
    assert_approx_eq!(f64, input_total, output_total);
}

#[test]
fn aggregated_results_pivot_into_per_year_matrix() {
    let raw = parse_rows(&[
        ("('DE_transformer_natgas_GT_new_built', 'None', 2025)", 400.0),
        ("('DE_transformer_natgas_GT_new_built', 'None', 2030)", 50.0),
        ("('DE_transformer_lignite_ST_new_built', 'None', 2030)", 80.0),
    ]);

    let rows = relabel(&raw, ResultsMode::Investment);
    let output = aggregate(
        &rows,
        &AggregationOptions::investment(AggregateBy::EnergyCarrier),
    );

    let pivoted = pivot_by_period(&output.aggregated);
    assert_eq!(
        pivoted.periods.iter().map(|p| p.as_str()).collect_vec(),
        ["2025", "2030"]
    );
    assert_eq!(
        pivoted.rows["natgas"],
        vec![Some(Quantity(400.0)), Some(Quantity(50.0))]
    );
    assert_eq!(pivoted.rows["lignite"], vec![None, Some(Quantity(80.0))]);
}

#[test]
fn dispatch_pipeline_produces_single_totals() {
    let raw = parse_rows(&[
        (
            "('DE_transformer_natgas_GT', 'DE_bus_el', '2025-01-01 00:00:00')",
            10.0,
        ),
        (
            "('DE_transformer_natgas_GT', 'DE_bus_el', '2025-01-01 01:00:00')",
            12.0,
        ),
        (
            "('DE_storage_el_PHS', 'DE_bus_el', '2025-01-01 00:00:00')",
            4.0,
        ),
    ]);

    let rows = relabel(&raw, ResultsMode::Dispatch);
    let output = aggregate(
        &rows,
        &AggregationOptions::dispatch(AggregateBy::EnergyCarrier),
    );

    // Hourly generation is summed into one total per category
    let natgas = output
        .aggregated
        .iter()
        .find(|(key, _)| key.category_label() == "natgas")
        .unwrap();
    assert!(natgas.0.period.is_none());
    assert_approx_eq!(f64, natgas.1.value(), 22.0);

    // Storage discharge is an outflow in dispatch convention and split out
    let storage = output.storage_detail.keys().exactly_one().unwrap();
    assert_eq!(storage.category_label(), "PHS_outflow");
}
