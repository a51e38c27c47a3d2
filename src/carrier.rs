//! Shared vocabulary for energy carriers, technologies and flexibility units.
use indexmap::IndexSet;

/// Energy carriers the model's generation units draw on
pub const DEFAULT_ENERGY_CARRIERS: &[&str] = &[
    "biomass",
    "uranium",
    "lignite",
    "hardcoal",
    "natgas",
    "hydrogen",
    "mixedfuels",
    "otherfossil",
    "waste",
    "oil",
];

/// Storage technologies reported with separate energy and power variables
pub const STORAGE_TECHNOLOGIES: &[&str] = &["PHS", "battery"];

/// Technology codes distinguished within one energy carrier.
///
/// Gas turbine, steam turbine, combined cycle and fuel cell.
pub const TECHNOLOGY_CODES: &[&str] = &["GT", "ST", "CC", "FC"];

/// State variables reported per demand response cluster
pub const DSM_STATE_VARIABLES: &[&str] =
    &["dsm_up", "dsm_do_shift", "dsm_do_shed", "dsm_storage_level"];

/// The default energy carrier set as an owned set
pub fn default_energy_carriers() -> IndexSet<String> {
    DEFAULT_ENERGY_CARRIERS
        .iter()
        .map(|carrier| carrier.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_carrier_set_matches_constants() {
        let carriers = default_energy_carriers();
        assert_eq!(carriers.len(), DEFAULT_ENERGY_CARRIERS.len());
        assert!(carriers.contains("lignite"));
        assert!(!carriers.contains("PHS"));
    }
}
