//! Raw decision-variable rows from the optimization model's result dump.
//!
//! Result dumps are keyed by stringified `(from, to, period)` tuples naming
//! an edge between two model nodes and the time bucket the value belongs to.
//! Investment dumps use milestone years as periods and carry capacities in
//! MW; dispatch dumps use hourly time stamps and carry energies in MWh.
use crate::id::define_id_type;
use crate::units::Quantity;
use anyhow::{Result, bail};
use serde_string_enum::DeserializeLabeledStringEnum;

define_id_type! {NodeID}
define_id_type! {UnitID}
define_id_type! {PeriodID}

/// Sentinel destination node marking capacity-only variables
pub const NO_DESTINATION: &str = "None";

/// The result-table convention a raw dump follows
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, DeserializeLabeledStringEnum, strum::Display)]
pub enum ResultsMode {
    /// Capacity decision variables, one value per milestone year (MW)
    #[string = "investment"]
    #[strum(serialize = "investment")]
    Investment,
    /// Hourly operational variables (MWh)
    #[string = "dispatch"]
    #[strum(serialize = "dispatch")]
    Dispatch,
}

/// One observation from the solver's result dump
#[derive(Clone, Debug, PartialEq)]
pub struct RawResultRow {
    /// Raw source node identifier (e.g. `DE_storage_el_PHS_new_built`)
    pub from_node: NodeID,
    /// Raw destination node identifier, or [`NO_DESTINATION`]
    pub to_node: NodeID,
    /// The time bucket the value belongs to
    pub period: PeriodID,
    /// The solved quantity
    pub value: Quantity,
}

impl RawResultRow {
    /// Build a row from a solver variable label and its value
    pub fn from_variable_label(label: &str, value: f64) -> Result<Self> {
        let (from_node, to_node, period) = parse_variable_label(label)?;
        Ok(Self {
            from_node,
            to_node,
            period,
            value: Quantity(value),
        })
    }
}

/// Decode a solver variable label into its node pair and period.
///
/// Labels are stringified tuples of the form `('<from>', '<to>', <period>)`,
/// with the period quoted or bare depending on the dump. The three parts are
/// whitespace separated; tuple punctuation and quotes are stripped.
///
/// # Returns
///
/// The `(from, to, period)` parts, or an error if the label does not decode
/// to exactly three parts.
pub fn parse_variable_label(label: &str) -> Result<(NodeID, NodeID, PeriodID)> {
    let mut parts = label.split_whitespace();
    let (Some(from), Some(to), Some(period), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        bail!("Invalid variable label `{label}`; expected `('<from>', '<to>', '<period>')`");
    };

    fn strip(part: &str) -> &str {
        part.trim_matches(|c| matches!(c, '(' | ')' | '\'' | ','))
    }
    Ok((strip(from).into(), strip(to).into(), strip(period).into()))
}
