//! Rewriting solver edge labels into canonical unit identifiers.
//!
//! Raw result rows are keyed by `(from, to)` node pairs following the model's
//! node-naming convention: a central electricity bus, storages, demand sinks,
//! transformers and demand response clusters, all carrying structural
//! prefixes such as `DE_storage_el_`. This module rewrites the `from` label
//! into a single human-meaningful unit identifier per row.
//!
//! The rewrite is an ordered table of [`RelabelRule`]s. Each rule's predicate
//! reads the *current* `from` label, i.e. the label as rewritten by earlier
//! rules, so a later applicable rule overwrites an earlier one. Rule order is
//! part of the contract.
use crate::carrier::DSM_STATE_VARIABLES;
use crate::results::{NO_DESTINATION, PeriodID, RawResultRow, ResultsMode, UnitID};
use crate::units::Quantity;
use itertools::Itertools;
use log::warn;
use std::collections::HashSet;

/// Token identifying storage nodes
const STORAGE_TOKEN: &str = "storage";
/// The central electricity bus node
const ELECTRICITY_BUS: &str = "DE_bus_el";
/// The electric-vehicle bus node
const EV_BUS: &str = "DE_bus_ev";
/// Token identifying electricity demand sink nodes
const DEMAND_SINK: &str = "DE_sink_el";
/// Token identifying hydrogen electrolyzer transformer nodes
const ELECTROLYZER: &str = "DE_transformer_hydrogen_electrolyzer";
/// Token identifying uncontrolled electric-vehicle charging transformers
const EV_UNCONTROLLED: &str = "ev_uncontrolled";
/// Token identifying cross-border linking transformer nodes
const CROSS_BORDER_LINK: &str = "DE_link_";
/// Structural prefixes stripped from final unit labels
const STRIP_TOKENS: &[&str] = &["DE_storage_el_", "DE_transformer_"];
/// Suffix marking endogenous investment options, stripped in investment mode
const NEW_BUILT_SUFFIX: &str = "_new_built";
/// Suffix for demand-response remainder flows
const DEMAND_AFTER_SUFFIX: &str = "_demand_after";

/// A relabeled result row; the destination column is dropped
#[derive(Clone, Debug, PartialEq)]
pub struct RelabeledRow {
    /// The canonical unit identifier derived from the raw node pair
    pub unit: UnitID,
    /// The time bucket the value belongs to
    pub period: PeriodID,
    /// The solved quantity
    pub value: Quantity,
}

/// A single label-rewrite rule.
///
/// The predicate is evaluated over the current `(from, to)` labels; when it
/// holds, the rewrite produces the new `from` label.
pub struct RelabelRule {
    /// Short rule name, used in diagnostics and tests
    pub name: &'static str,
    predicate: fn(&str, &str, ResultsMode) -> bool,
    apply: fn(&str, &str, ResultsMode) -> String,
}

impl RelabelRule {
    /// Whether this rule applies to the given `(from, to)` labels
    pub fn applies(&self, from: &str, to: &str, mode: ResultsMode) -> bool {
        (self.predicate)(from, to, mode)
    }

    /// The rewritten `from` label
    pub fn rewrite(&self, from: &str, to: &str, mode: ResultsMode) -> String {
        (self.apply)(from, to, mode)
    }
}

/// Suffix tagging storage flows towards a bus.
///
/// Investment dumps name storage flow directions relative to the grid while
/// dispatch dumps name them relative to the storage. The swap is a
/// deliberate convention difference between the two dump formats.
fn storage_to_bus_suffix(mode: ResultsMode) -> &'static str {
    match mode {
        ResultsMode::Investment => "_inflow",
        ResultsMode::Dispatch => "_outflow",
    }
}

/// Suffix tagging flows from a bus into a storage (complement of
/// [`storage_to_bus_suffix`])
fn bus_to_storage_suffix(mode: ResultsMode) -> &'static str {
    match mode {
        ResultsMode::Investment => "_outflow",
        ResultsMode::Dispatch => "_inflow",
    }
}

/// The label-rewrite rules, in application order.
///
/// The trailing demand-response rule deliberately matches *any* row still
/// leaving the electricity bus: all more specific destinations have been
/// rewritten away by the earlier rules, so what remains feeds a demand
/// response cluster and is tagged as the post-shift remainder.
pub const RELABEL_RULES: &[RelabelRule] = &[
    RelabelRule {
        name: "storage-capacity",
        predicate: |from, to, _| from.contains(STORAGE_TOKEN) && to.contains(NO_DESTINATION),
        apply: |from, _, _| format!("{from}_capacity"),
    },
    RelabelRule {
        name: "storage-to-bus",
        predicate: |from, to, _| {
            from.contains(STORAGE_TOKEN) && (to.contains(ELECTRICITY_BUS) || to.contains(EV_BUS))
        },
        apply: |from, _, mode| format!("{from}{}", storage_to_bus_suffix(mode)),
    },
    RelabelRule {
        name: "bus-to-storage",
        predicate: |from, to, _| from.contains(ELECTRICITY_BUS) && to.contains(STORAGE_TOKEN),
        apply: |_, to, mode| format!("{to}{}", bus_to_storage_suffix(mode)),
    },
    RelabelRule {
        name: "demand-sink",
        predicate: |from, to, _| from.contains(ELECTRICITY_BUS) && to.contains(DEMAND_SINK),
        apply: |_, to, _| to.to_string(),
    },
    RelabelRule {
        name: "electrolyzer",
        predicate: |from, to, _| from.contains(ELECTRICITY_BUS) && to.contains(ELECTROLYZER),
        apply: |_, to, _| to.to_string(),
    },
    RelabelRule {
        name: "ev-uncontrolled",
        predicate: |from, to, _| from.contains(ELECTRICITY_BUS) && to.contains(EV_UNCONTROLLED),
        apply: |_, to, _| to.to_string(),
    },
    RelabelRule {
        name: "cross-border-link",
        predicate: |from, to, _| from.contains(ELECTRICITY_BUS) && to.contains(CROSS_BORDER_LINK),
        apply: |_, to, _| to.to_string(),
    },
    RelabelRule {
        name: "demand-response-remainder",
        predicate: |from, _, _| from.contains(ELECTRICITY_BUS),
        apply: |_, to, _| format!("{to}{DEMAND_AFTER_SUFFIX}"),
    },
    RelabelRule {
        name: "dsm-state-variable",
        predicate: |_, to, _| DSM_STATE_VARIABLES.contains(&to),
        apply: |from, to, _| format!("{from}_{to}"),
    },
];

/// Rewrite raw result rows into unit-labelled rows.
///
/// Rules are applied in table order; unmatched rows pass through with their
/// source label unchanged (such rows end up as singleton categories in the
/// aggregation step). Structural prefixes are stripped from the final labels
/// and, in investment mode, the `_new_built` suffix as well.
pub fn relabel(rows: &[RawResultRow], mode: ResultsMode) -> Vec<RelabeledRow> {
    let relabeled = rows
        .iter()
        .map(|row| {
            let mut from = row.from_node.as_str().to_string();
            for rule in RELABEL_RULES {
                if rule.applies(&from, row.to_node.as_str(), mode) {
                    from = rule.rewrite(&from, row.to_node.as_str(), mode);
                }
            }

            let unit = strip_structural_tokens(&from, mode);
            if unit.contains(ELECTRICITY_BUS) || unit.contains(NO_DESTINATION) {
                warn!(
                    "Unit label `{unit}` still contains raw node tokens \
                     (from `{}`, to `{}`); unhandled node pattern",
                    row.from_node, row.to_node
                );
            }

            RelabeledRow {
                unit: unit.into(),
                period: row.period.clone(),
                value: row.value,
            }
        })
        .collect_vec();

    // Investment dumps hold one value per unit and milestone year
    if mode == ResultsMode::Investment {
        warn_on_duplicate_keys(&relabeled);
    }

    relabeled
}

/// Strip structural node-name tokens from a final unit label.
///
/// Removal is plain substring replacement and therefore idempotent:
/// re-stripping an already stripped label is a no-op.
pub fn strip_structural_tokens(label: &str, mode: ResultsMode) -> String {
    let mut unit = label.to_string();
    for token in STRIP_TOKENS {
        unit = unit.replace(token, "");
    }
    if mode == ResultsMode::Investment {
        unit = unit.replace(NEW_BUILT_SUFFIX, "");
    }

    unit
}

/// Warn about duplicate `(unit, period)` pairs after relabeling
fn warn_on_duplicate_keys(rows: &[RelabeledRow]) {
    let mut seen = HashSet::new();
    for row in rows {
        if !seen.insert((row.unit.clone(), row.period.clone())) {
            warn!(
                "Duplicate unit/period pair (`{}`, `{}`) after relabeling",
                row.unit, row.period
            );
        }
    }
}
