//! Fixtures for tests
use crate::results::RawResultRow;
use crate::units::Quantity;
use indexmap::IndexSet;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Build a raw result row from plain label parts
pub fn raw_row(from: &str, to: &str, period: &str, value: f64) -> RawResultRow {
    RawResultRow {
        from_node: from.into(),
        to_node: to.into(),
        period: period.into(),
        value: Quantity(value),
    }
}

/// A small investment result dump covering storages, thermal units, sinks,
/// electrolyzers and a demand response cluster
#[fixture]
pub fn investment_rows() -> Vec<RawResultRow> {
    vec![
        raw_row("DE_storage_el_PHS_new_built", "None", "2025", 50.0),
        raw_row("DE_bus_el", "DE_storage_el_PHS_new_built", "2025", 10.0),
        raw_row("DE_storage_el_PHS_new_built", "DE_bus_el", "2025", 20.0),
        raw_row("DE_transformer_natgas_GT_new_built", "None", "2025", 400.0),
        raw_row("DE_transformer_natgas_CC_new_built", "None", "2030", 150.0),
        raw_row("DE_bus_el", "DE_sink_el_load", "2025", 70.0),
        raw_row(
            "DE_bus_el",
            "DE_transformer_hydrogen_electrolyzer",
            "2030",
            30.0,
        ),
        raw_row("DE_bus_el", "hoho_cluster_shift_only", "2025", 5.0),
        raw_row("hoho_cluster_shift_only", "dsm_up", "2025", 3.0),
    ]
}

#[fixture]
pub fn energy_carriers() -> IndexSet<String> {
    crate::carrier::default_energy_carriers()
}
