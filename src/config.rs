//! Scenario configuration for an evaluation run.
//!
//! Every evaluation targets one scenario of the investment model: a time
//! window, cost pathways and the flexibility options that were active. The
//! original run is fully described by the [`ScenarioConfig`] record, which is
//! passed by value to the reshaping routines that need it.
use crate::input::{input_err_msg, read_toml};
use crate::timeseries::{TIMESTAMP_FORMAT, parse_frequency};
use anyhow::{Context, Result, ensure};
use chrono::{Duration, NaiveDateTime};
use documented::DocumentedFields;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE_HEADER: &str = concat!(
    "# This file describes the model scenario under evaluation.
#
# The default options for emeval v",
    env!("CARGO_PKG_VERSION"),
    " are shown below, commented out. To change an option, uncomment it and set the value
# appropriately.
"
);

/// Scenario configuration as defined in a scenario TOML file.
///
/// The defaults describe the standard evaluation setup for the German
/// market zone.
#[derive(Clone, Debug, DocumentedFields, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Folder holding the prepared model input data
    pub input_path: PathBuf,
    /// Countries kept when filtering multi-country inputs; empty keeps all
    pub countries: Vec<String>,
    /// First time step of the evaluation window
    pub start_time: String,
    /// Last time step of the evaluation window
    pub end_time: String,
    /// Number of additional time steps read beyond the window end
    pub overlap_in_time_steps: u32,
    /// Model frequency, e.g. `1H` or `4H`
    pub freq: String,
    /// Fuel cost pathway the scenario was run with
    pub fuel_cost_pathway: String,
    /// Emissions cost pathway the scenario was run with
    pub emissions_cost_pathway: String,
    /// Flexibility options scenario in percent, e.g. `50`
    pub flexibility_options_scenario: String,
    /// Whether an annual emissions pathway limit was active
    pub activate_emissions_pathway_limit: bool,
    /// Whether an overall emissions budget limit was active
    pub activate_emissions_budget_limit: bool,
    /// Whether demand response clusters were modelled
    pub activate_demand_response: bool,
    /// Demand response scenario in percent, e.g. `50`
    pub demand_response_scenario: String,
    /// Demand response clusters considered by the scenario
    pub demand_response_clusters: Vec<String>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("inputs"),
            countries: Vec::new(),
            start_time: "2020-01-01 00:00:00".to_string(),
            end_time: "2045-12-31 23:00:00".to_string(),
            overlap_in_time_steps: 0,
            freq: "1H".to_string(),
            fuel_cost_pathway: "NZE".to_string(),
            emissions_cost_pathway: "long-term".to_string(),
            flexibility_options_scenario: "50".to_string(),
            activate_emissions_pathway_limit: true,
            activate_emissions_budget_limit: false,
            activate_demand_response: false,
            demand_response_scenario: "50".to_string(),
            demand_response_clusters: Vec::new(),
        }
    }
}

impl ScenarioConfig {
    /// Read a scenario file from the specified path.
    ///
    /// If the file is not present, the default scenario is used.
    ///
    /// # Returns
    ///
    /// The scenario as a `ScenarioConfig` struct or an error if loading or
    /// validation fails.
    pub fn from_path(file_path: &Path) -> Result<ScenarioConfig> {
        if !file_path.is_file() {
            return Ok(ScenarioConfig::default());
        }

        let config: ScenarioConfig = read_toml(file_path)?;
        config
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(config)
    }

    /// First time step of the evaluation window
    pub fn start(&self) -> Result<NaiveDateTime> {
        parse_timestamp(&self.start_time)
    }

    /// Last time step of the evaluation window
    pub fn end(&self) -> Result<NaiveDateTime> {
        parse_timestamp(&self.end_time)
    }

    /// The model frequency as a duration
    pub fn frequency(&self) -> Result<Duration> {
        parse_frequency(&self.freq)
    }

    /// Validate the scenario after reading it in
    pub fn validate(&self) -> Result<()> {
        let start = self.start()?;
        let end = self.end()?;
        ensure!(
            start < end,
            "start_time must be before end_time ({} vs {})",
            self.start_time,
            self.end_time
        );

        self.frequency()?;

        ensure!(
            !self.activate_demand_response || !self.demand_response_clusters.is_empty(),
            "demand_response_clusters must name at least one cluster \
             when activate_demand_response is set"
        );

        Ok(())
    }

    /// The names of the input data sets belonging to this scenario.
    ///
    /// Keys are the data-set roles the evaluation routines refer to; values
    /// are the file stems the model run wrote its inputs under. Cost-related
    /// names depend on the configured pathways, and activating demand
    /// response swaps the demand series for its demand-response-adjusted
    /// variant and adds the per-cluster parameter sets.
    pub fn input_file_names(&self) -> IndexMap<String, String> {
        let mut files = IndexMap::new();
        let mut insert = |role: &str, name: String| {
            files.insert(role.to_string(), name);
        };

        insert("buses", "buses".to_string());

        // Component data sets
        insert("sinks_excess", "sinks_excess".to_string());
        if self.activate_demand_response {
            insert(
                "sinks_demand_el",
                format!(
                    "sinks_demand_el_excl_demand_response_{}",
                    self.demand_response_scenario
                ),
            );
        } else {
            insert("sinks_demand_el", "sinks_demand_el".to_string());
        }
        insert("sources_shortage", "sources_shortage".to_string());
        insert("sources_commodity", "sources_commodity".to_string());
        insert(
            "sources_renewables",
            "sources_renewables_investment_model".to_string(),
        );
        insert("exogenous_storages_el", "storages_el_exogenous".to_string());
        insert(
            "new_built_storages_el",
            "storages_el_investment_options".to_string(),
        );
        insert(
            "exogenous_transformers",
            "transformers_exogenous".to_string(),
        );
        insert(
            "new_built_transformers",
            "transformers_investment_options".to_string(),
        );

        // Annual time series
        insert(
            "transformers_exogenous_max_ts",
            "transformers_exogenous_max_ts".to_string(),
        );
        insert(
            "costs_fuel_ts",
            format!("costs_fuel_{}_nominal_indexed_ts", self.fuel_cost_pathway),
        );
        insert(
            "costs_emissions_ts",
            format!(
                "costs_emissions_{}_nominal_indexed_ts",
                self.emissions_cost_pathway
            ),
        );
        insert(
            "costs_operation_ts",
            format!(
                "variable_costs_{}%_nominal",
                self.flexibility_options_scenario
            ),
        );
        insert(
            "costs_operation_storages_ts",
            format!(
                "variable_costs_storages_{}%_nominal",
                self.flexibility_options_scenario
            ),
        );
        insert(
            "costs_investment",
            format!(
                "investment_expenses_{}%_nominal",
                self.flexibility_options_scenario
            ),
        );
        insert(
            "costs_storages_investment_capacity",
            format!(
                "investment_expenses_storages_capacity_{}%_nominal",
                self.flexibility_options_scenario
            ),
        );
        insert(
            "costs_storages_investment_power",
            format!(
                "investment_expenses_storages_power_{}%_nominal",
                self.flexibility_options_scenario
            ),
        );
        insert(
            "linking_transformers_annual_ts",
            "linking_transformers_annual_ts".to_string(),
        );
        insert(
            "storages_el_exogenous_max_ts",
            "storages_el_exogenous_max_ts".to_string(),
        );

        // Hourly time series
        if self.activate_demand_response {
            insert(
                "sinks_demand_el_ts",
                format!(
                    "sinks_demand_el_excl_demand_response_ts_{}_hourly",
                    self.demand_response_scenario
                ),
            );
        } else {
            insert("sinks_demand_el_ts", "sinks_demand_el_ts_hourly".to_string());
        }
        insert(
            "sources_renewables_ts",
            "sources_renewables_ts_hourly".to_string(),
        );
        insert(
            "transformers_minload_ts",
            "transformers_minload_ts_hourly".to_string(),
        );
        insert(
            "transformers_availability_ts",
            "transformers_availability_ts_hourly".to_string(),
        );
        insert("linking_transformers_ts", "linking_transformers_ts".to_string());

        // Time-invariant data sets
        insert("emission_limits", "emission_limits".to_string());
        insert("wacc", "wacc".to_string());
        insert("interest_rate", "interest_rate".to_string());
        insert(
            "fixed_costs",
            format!("fixed_costs_{}%_nominal", self.flexibility_options_scenario),
        );
        insert(
            "fixed_costs_storages",
            format!(
                "fixed_costs_storages_{}%_nominal",
                self.flexibility_options_scenario
            ),
        );
        insert(
            "hydrogen_investment_maxima",
            "hydrogen_investment_maxima".to_string(),
        );
        insert("linking_transformers", "linking_transformers".to_string());

        // Development factors are only used when scaling against a limit
        if self.activate_emissions_pathway_limit || self.activate_emissions_budget_limit {
            insert(
                "emission_development_factors",
                "emission_development_factors".to_string(),
            );
        }

        if self.activate_demand_response {
            for cluster in &self.demand_response_clusters {
                insert(
                    &format!("sinks_dr_el_{cluster}"),
                    format!(
                        "{cluster}_potential_parameters_{}%",
                        self.demand_response_scenario
                    ),
                );
                insert(
                    &format!("sinks_dr_el_{cluster}_variable_costs"),
                    format!(
                        "{cluster}_variable_costs_parameters_{}%",
                        self.demand_response_scenario
                    ),
                );
                insert(
                    &format!("sinks_dr_el_{cluster}_fixed_costs_and_investments"),
                    format!(
                        "{cluster}_fixed_costs_and_investments_parameters_{}%",
                        self.demand_response_scenario
                    ),
                );
            }

            insert(
                "sinks_dr_el_ts",
                format!(
                    "sinks_demand_response_el_ts_{}",
                    self.demand_response_scenario
                ),
            );
            insert(
                "sinks_dr_el_ava_pos_ts",
                format!(
                    "sinks_demand_response_el_ava_pos_ts_{}",
                    self.demand_response_scenario
                ),
            );
            insert(
                "sinks_dr_el_ava_neg_ts",
                format!(
                    "sinks_demand_response_el_ava_neg_ts_{}",
                    self.demand_response_scenario
                ),
            );
        }

        files
    }

    /// The contents of the default scenario file.
    pub fn default_file_contents() -> String {
        // Scenario with default values for all params
        let config = ScenarioConfig::default();

        // Convert to TOML
        let config_raw = toml::to_string(&config).expect("Could not convert scenario to TOML");

        // Iterate through the generated TOML, commenting out parameter lines
        // and inserting their documentation comments
        let mut out = DEFAULT_CONFIG_FILE_HEADER.to_string();
        for line in config_raw.split('\n') {
            if let Some((field, _)) = line.split_once('=') {
                // Add documentation from doc comments
                let field = field.trim();

                // Use doc comment to document parameter. All fields should have doc comments.
                let docs =
                    ScenarioConfig::get_field_docs(field).expect("Missing doc comment for field");
                for line in docs.split('\n') {
                    write!(&mut out, "\n# # {}\n", line.trim()).unwrap();
                }

                writeln!(&mut out, "# {}", line.trim()).unwrap();
            }
        }

        out
    }
}

/// Parse a timestamp in the scenario window format
fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .with_context(|| format!("Invalid time stamp `{value}`"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn config_from_path_no_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("scenario.toml"); // NB: doesn't exist
        assert_eq!(
            ScenarioConfig::from_path(&file_path).unwrap(),
            ScenarioConfig::default()
        );
    }

    #[test]
    fn config_from_path() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("scenario.toml");

        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "fuel_cost_pathway = \"APS\"").unwrap();
            writeln!(file, "freq = \"4H\"").unwrap();
        }

        assert_eq!(
            ScenarioConfig::from_path(&file_path).unwrap(),
            ScenarioConfig {
                fuel_cost_pathway: "APS".to_string(),
                freq: "4H".to_string(),
                ..ScenarioConfig::default()
            }
        );
    }

    #[test]
    fn validate_rejects_reversed_window() {
        let config = ScenarioConfig {
            start_time: "2030-01-01 00:00:00".to_string(),
            end_time: "2020-01-01 00:00:00".to_string(),
            ..ScenarioConfig::default()
        };
        assert_error!(
            config.validate(),
            "start_time must be before end_time \
             (2030-01-01 00:00:00 vs 2020-01-01 00:00:00)"
        );
    }

    #[test]
    fn validate_rejects_bad_frequency() {
        let config = ScenarioConfig {
            freq: "daily".to_string(),
            ..ScenarioConfig::default()
        };
        assert_error!(
            config.validate(),
            "Invalid frequency `daily`; expected e.g. `1H`, `4H` or `15min`"
        );
    }

    #[test]
    fn validate_requires_clusters_for_demand_response() {
        let config = ScenarioConfig {
            activate_demand_response: true,
            ..ScenarioConfig::default()
        };
        assert_error!(
            config.validate(),
            "demand_response_clusters must name at least one cluster \
             when activate_demand_response is set"
        );
    }

    #[test]
    fn input_file_names_default_scenario() {
        let files = ScenarioConfig::default().input_file_names();
        assert_eq!(files["sinks_demand_el"], "sinks_demand_el");
        assert_eq!(files["costs_fuel_ts"], "costs_fuel_NZE_nominal_indexed_ts");
        assert_eq!(files["costs_investment"], "investment_expenses_50%_nominal");
        // Pathway limit is on by default
        assert!(files.contains_key("emission_development_factors"));
        assert!(!files.contains_key("sinks_dr_el_ts"));
    }

    #[test]
    fn input_file_names_with_demand_response() {
        let config = ScenarioConfig {
            activate_demand_response: true,
            demand_response_clusters: vec!["hoho_cluster_shift_only".to_string()],
            ..ScenarioConfig::default()
        };

        let files = config.input_file_names();
        assert_eq!(
            files["sinks_demand_el"],
            "sinks_demand_el_excl_demand_response_50"
        );
        assert_eq!(
            files["sinks_dr_el_hoho_cluster_shift_only"],
            "hoho_cluster_shift_only_potential_parameters_50%"
        );
        assert_eq!(
            files["sinks_dr_el_ts"],
            "sinks_demand_response_el_ts_50"
        );
    }

    #[test]
    fn default_file_contents() {
        assert!(!ScenarioConfig::default_file_contents().is_empty());
    }
}
