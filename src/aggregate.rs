//! Aggregation of relabeled results by energy carrier and/or technology.
//!
//! Unit labels carry their energy carrier up to the first underscore and a
//! technology descriptor after it (e.g. `natgas_GT_BNA0123`). Units that
//! match neither the carrier set nor a technology code stay visible as
//! singleton categories equal to their full label rather than being folded
//! into the recognized taxonomy.
//!
//! Storage energy quantities (MWh) must not be summed together with power
//! quantities (MW), so per-storage capacity and outflow groups are split
//! into a separate table. Together the two tables partition the grouped
//! input exactly.
use crate::carrier::{STORAGE_TECHNOLOGIES, TECHNOLOGY_CODES};
use crate::relabel::RelabeledRow;
use crate::results::{PeriodID, ResultsMode};
use crate::units::Quantity;
use anyhow::{Error, Result, bail};
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use std::fmt;
use std::str::FromStr;

/// Suffixes of per-storage variables carried in the storage detail table
const STORAGE_ELEMENT_SUFFIXES: &[&str] = &["_capacity", "_outflow"];
/// Suffix marking endogenous investment options (retained in dispatch labels)
const NEW_BUILT_SUFFIX: &str = "_new_built";
/// Compound electrolyzer carrier, kept unsplit
const ELECTROLYZER_CARRIER: &str = "hydrogen_electrolyzer";

/// The key to group aggregated results by
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display)]
pub enum AggregateBy {
    /// Group by energy carrier
    #[strum(serialize = "energy_carrier")]
    EnergyCarrier,
    /// Group by technology code
    #[strum(serialize = "technology")]
    Technology,
    /// Group by energy carrier and technology together
    #[strum(serialize = "both")]
    Both,
}

impl FromStr for AggregateBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "energy_carrier" => Ok(Self::EnergyCarrier),
            "technology" => Ok(Self::Technology),
            "both" => Ok(Self::Both),
            _ => bail!(
                "Aggregation mode `{s}` not defined; \
                 must be one of `energy_carrier`, `technology` or `both`"
            ),
        }
    }
}

/// A grouping category for one unit.
///
/// Units whose label matches no known carrier or technology fall back to a
/// singleton category carrying the full unit label. The fallback is a
/// separate variant so that mis-categorised units stay visible to callers
/// instead of blending into the recognized taxonomy.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Category {
    /// A recognized carrier or technology-code category
    Recognized(String),
    /// Fallback category equal to the full unit label
    Unclassified(String),
}

impl Category {
    /// The category label used for grouping and display
    pub fn label(&self) -> &str {
        match self {
            Self::Recognized(label) | Self::Unclassified(label) => label,
        }
    }

    /// Whether the unit matched the recognized taxonomy
    pub fn is_recognized(&self) -> bool {
        matches!(self, Self::Recognized(_))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One output cell key: the chosen categorisation plus, in investment mode,
/// the period
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct GroupKey {
    /// Energy carrier category ([`AggregateBy::EnergyCarrier`] and
    /// [`AggregateBy::Both`])
    pub energy_carrier: Option<Category>,
    /// Technology category ([`AggregateBy::Technology`] and
    /// [`AggregateBy::Both`])
    pub technology: Option<Category>,
    /// The period, for per-period aggregation
    pub period: Option<PeriodID>,
}

impl GroupKey {
    /// The label of the populated category (carrier takes precedence)
    pub fn category_label(&self) -> &str {
        self.energy_carrier
            .as_ref()
            .or(self.technology.as_ref())
            .map(Category::label)
            .unwrap_or_default()
    }

    /// A flat display label: the populated category labels joined with `.`
    pub fn display_label(&self) -> String {
        match (&self.energy_carrier, &self.technology) {
            (Some(carrier), Some(technology)) => format!("{carrier}.{technology}"),
            (Some(category), None) | (None, Some(category)) => category.label().to_string(),
            (None, None) => String::new(),
        }
    }
}

/// Aggregated values keyed by category and period
pub type GroupedTable = IndexMap<GroupKey, Quantity>;

/// The two disjoint tables produced by one aggregation pass
#[derive(Debug, Default)]
pub struct AggregationOutput {
    /// The main aggregate by carrier/technology
    pub aggregated: GroupedTable,
    /// Storage capacity and outflow groups, reported apart because they mix
    /// energy and power measures
    pub storage_detail: GroupedTable,
}

/// Options controlling one aggregation pass
#[derive(Clone, Debug)]
pub struct AggregationOptions {
    /// The grouping key
    pub by: AggregateBy,
    /// Recognized energy carrier names
    pub energy_carriers: IndexSet<String>,
    /// The result-table convention of the input rows
    pub mode: ResultsMode,
    /// Keep the full technology string to preserve the CHP distinction
    pub include_chp_information: bool,
}

impl AggregationOptions {
    /// Options for investment results with the default carrier set
    pub fn investment(by: AggregateBy) -> Self {
        Self {
            by,
            energy_carriers: crate::carrier::default_energy_carriers(),
            mode: ResultsMode::Investment,
            include_chp_information: false,
        }
    }

    /// Options for dispatch results with the default carrier set
    pub fn dispatch(by: AggregateBy) -> Self {
        Self {
            mode: ResultsMode::Dispatch,
            ..Self::investment(by)
        }
    }

    /// The output cell key the given row contributes to
    pub fn group_key(&self, row: &RelabeledRow) -> GroupKey {
        let energy_carrier = matches!(self.by, AggregateBy::EnergyCarrier | AggregateBy::Both)
            .then(|| classify_energy_carrier(row.unit.as_str(), &self.energy_carriers));
        let technology = matches!(self.by, AggregateBy::Technology | AggregateBy::Both)
            .then(|| classify_technology(row.unit.as_str(), self.include_chp_information));

        // Investment results are additionally keyed by milestone year;
        // dispatch summaries are a single total per category
        let period = (self.mode == ResultsMode::Investment).then(|| row.period.clone());

        GroupKey {
            energy_carrier,
            technology,
            period,
        }
    }
}

/// Split a unit label into its carrier and technology parts at the first
/// underscore
fn split_unit(unit: &str) -> (&str, Option<&str>) {
    match unit.split_once('_') {
        Some((fuel, tech)) => (fuel, Some(tech)),
        None => (unit, None),
    }
}

/// Derive the energy carrier category for a unit label.
pub fn classify_energy_carrier(unit: &str, energy_carriers: &IndexSet<String>) -> Category {
    let (fuel, tech) = split_unit(unit);

    // Exogenous units keep their transformer prefix in dispatch dumps; their
    // carrier is the next token
    let fuel = if fuel == "transformer" {
        tech.and_then(|tech| tech.split('_').next()).unwrap_or(fuel)
    } else {
        fuel
    };

    // Electrolyzers carry a compound technology name together with their
    // carrier; never split it apart
    if fuel == "hydrogen" && tech.is_some_and(|tech| tech.contains("electrolyzer")) {
        return Category::Recognized(ELECTROLYZER_CARRIER.to_string());
    }

    if energy_carriers.contains(fuel) {
        Category::Recognized(fuel.to_string())
    } else {
        Category::Unclassified(unit.to_string())
    }
}

/// Derive the technology category for a unit label.
pub fn classify_technology(unit: &str, include_chp_information: bool) -> Category {
    let (_, tech) = split_unit(unit);
    match tech {
        Some(tech) if TECHNOLOGY_CODES.iter().any(|code| tech.contains(code)) => {
            if include_chp_information {
                Category::Recognized(tech.to_string())
            } else {
                // The first token is the code; the rest is plant-specific
                let code = tech.split('_').next().unwrap_or(tech);
                Category::Recognized(code.to_string())
            }
        }
        _ => Category::Unclassified(unit.to_string()),
    }
}

/// Category labels carried in the storage detail table.
///
/// Dispatch labels keep the `_new_built` suffix, so the endogenous storage
/// variants are included there as well.
pub fn storage_detail_labels(mode: ResultsMode) -> IndexSet<String> {
    let mut technologies = STORAGE_TECHNOLOGIES
        .iter()
        .map(|tech| tech.to_string())
        .collect_vec();
    if mode == ResultsMode::Dispatch {
        technologies.extend(
            STORAGE_TECHNOLOGIES
                .iter()
                .map(|tech| format!("{tech}{NEW_BUILT_SUFFIX}")),
        );
    }

    technologies
        .iter()
        .cartesian_product(STORAGE_ELEMENT_SUFFIXES)
        .map(|(tech, suffix)| format!("{tech}{suffix}"))
        .collect()
}

/// Aggregate relabeled rows by the chosen category key.
///
/// Values are summed per group; in investment mode groups are additionally
/// keyed by period. Per-storage capacity and outflow groups are split into
/// the storage detail table. Every input row contributes to exactly one
/// output cell across the two tables.
pub fn aggregate(rows: &[RelabeledRow], options: &AggregationOptions) -> AggregationOutput {
    let mut grouped = GroupedTable::new();
    for row in rows {
        *grouped.entry(options.group_key(row)).or_default() += row.value;
    }

    let storage_labels = storage_detail_labels(options.mode);
    let (storage_detail, aggregated) = grouped
        .into_iter()
        .partition(|(key, _)| storage_labels.contains(key.category_label()));

    AggregationOutput {
        aggregated,
        storage_detail,
    }
}

/// A grouped table reshaped into a wide per-period matrix
#[derive(Debug, PartialEq)]
pub struct PivotedTable {
    /// Sorted period column headers; empty for tables without periods
    pub periods: Vec<PeriodID>,
    /// One row of per-period values per category label; `None` marks periods
    /// for which the category has no group
    pub rows: IndexMap<String, Vec<Option<Quantity>>>,
}

/// Reshape a grouped table into a wide matrix with one column per period.
///
/// This is the shape chart and export tooling consumes: rows are category
/// labels, columns are the sorted periods. Tables without periods collapse
/// into a single column.
pub fn pivot_by_period(table: &GroupedTable) -> PivotedTable {
    let periods = table
        .keys()
        .filter_map(|key| key.period.clone())
        .unique()
        .sorted()
        .collect_vec();

    let columns = periods.len().max(1);
    let mut rows: IndexMap<String, Vec<Option<Quantity>>> = IndexMap::new();
    for (key, value) in table {
        let row = rows
            .entry(key.display_label())
            .or_insert_with(|| vec![None; columns]);
        let column = key
            .period
            .as_ref()
            .and_then(|period| periods.iter().position(|candidate| candidate == period))
            .unwrap_or(0);
        row[column] = Some(row[column].map_or(*value, |existing| existing + *value));
    }

    PivotedTable { periods, rows }
}
