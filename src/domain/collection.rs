//! Planned vs. received reconciliation.
//!
//! Planned rows are keyed by `product_key` (`"<client> - <product>"`), received
//! rows by `process_key`. The two are free text, so both sides go through
//! [`correlation_key`] before they are merged.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};
use utoipa::ToSchema;

use crate::domain::round2;
use crate::model::collection::{PlannedCollection, ReceivedCollection};

/// Achievement percentage, undefined when nothing was planned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Achievement {
    Percent(f64),
    NotApplicable,
}

impl Achievement {
    pub fn of(received: f64, planned: f64) -> Self {
        if planned > 0.0 {
            Achievement::Percent(received / planned * 100.0)
        } else {
            Achievement::NotApplicable
        }
    }

    pub fn percent(&self) -> Option<f64> {
        match self {
            Achievement::Percent(p) => Some(*p),
            Achievement::NotApplicable => None,
        }
    }
}

impl fmt::Display for Achievement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Achievement::Percent(p) => write!(f, "{p:.1}%"),
            Achievement::NotApplicable => f.write_str("N/A"),
        }
    }
}

// A number when defined, the string "N/A" otherwise.
impl Serialize for Achievement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Achievement::Percent(p) => serializer.serialize_f64(round2(*p)),
            Achievement::NotApplicable => serializer.serialize_str("N/A"),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    #[schema(example = "Acme Bank - Home Loans")]
    pub label: String,
    pub planned_count: usize,
    pub total_planned_cases: u64,
    pub total_planned_money: f64,
    pub average_planned_money: f64,
    pub received_count: usize,
    pub total_received_money: f64,
    #[schema(value_type = Object, example = 90.0)]
    pub achievement: Achievement,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionTotals {
    pub total_planned_money: f64,
    pub total_received_money: f64,
    #[schema(value_type = Object, example = 90.0)]
    pub achievement: Achievement,
}

/// Trimmed, whitespace-collapsed, ASCII-lowercased label.
pub fn correlation_key(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

#[derive(Default)]
struct Group {
    label: Option<String>,
    planned_count: usize,
    planned_cases: u64,
    planned_money: f64,
    received_count: usize,
    received_money: f64,
}

impl Group {
    fn label_from(&mut self, raw: &str) {
        if self.label.is_none() {
            self.label = Some(raw.split_whitespace().collect::<Vec<_>>().join(" "));
        }
    }
}

/// Merge planned and received rows per label. Labels present on only one
/// side are kept with zeroes on the other. Output is sorted by key.
pub fn aggregate_collections(
    planned: &[PlannedCollection],
    received: &[ReceivedCollection],
) -> Vec<CollectionSummary> {
    let mut groups: BTreeMap<String, Group> = BTreeMap::new();

    for row in planned {
        let group = groups.entry(correlation_key(&row.product_key)).or_default();
        group.label_from(&row.product_key);
        group.planned_count += 1;
        group.planned_cases += u64::from(row.num_cases);
        group.planned_money += row.money_collection;
    }

    for row in received {
        let group = groups.entry(correlation_key(&row.process_key)).or_default();
        group.label_from(&row.process_key);
        group.received_count += 1;
        group.received_money += row.total;
    }

    groups
        .into_iter()
        .map(|(key, g)| {
            let average = if g.planned_count > 0 {
                g.planned_money / g.planned_count as f64
            } else {
                0.0
            };

            CollectionSummary {
                label: g.label.unwrap_or(key),
                planned_count: g.planned_count,
                total_planned_cases: g.planned_cases,
                total_planned_money: round2(g.planned_money),
                average_planned_money: round2(average),
                received_count: g.received_count,
                total_received_money: round2(g.received_money),
                achievement: Achievement::of(g.received_money, g.planned_money),
            }
        })
        .collect()
}

pub fn collection_totals(summaries: &[CollectionSummary]) -> CollectionTotals {
    let planned: f64 = summaries.iter().map(|s| s.total_planned_money).sum();
    let received: f64 = summaries.iter().map(|s| s.total_received_money).sum();

    CollectionTotals {
        total_planned_money: round2(planned),
        total_received_money: round2(received),
        achievement: Achievement::of(received, planned),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planned(key: &str, money: f64) -> PlannedCollection {
        PlannedCollection {
            id: 0,
            month: "2025-03".to_string(),
            supervisor_name: "Ravi".to_string(),
            product_key: key.to_string(),
            num_cases: 10,
            pos: 0.0,
            basic: 0.0,
            money_collection: money,
        }
    }

    fn received(key: &str, total: f64) -> ReceivedCollection {
        ReceivedCollection {
            id: 0,
            month: "2025-03".to_string(),
            process_key: key.to_string(),
            bill_amount: total,
            tds: 0.0,
            balance: total,
            rate: 0.0,
            gross_salary: 0.0,
            net_salary: 0.0,
            total,
        }
    }

    #[test]
    fn achievement_for_matching_labels() {
        let summary = aggregate_collections(
            &[planned("Acme - Loans", 20_000.0), planned("Acme - Loans", 30_000.0)],
            &[received("Acme - Loans", 45_000.0)],
        );

        assert_eq!(summary.len(), 1);
        let row = &summary[0];
        assert_eq!(row.planned_count, 2);
        assert_eq!(row.total_planned_cases, 20);
        assert_eq!(row.total_planned_money, 50_000.0);
        assert_eq!(row.average_planned_money, 25_000.0);
        assert_eq!(row.total_received_money, 45_000.0);
        assert_eq!(row.achievement, Achievement::Percent(90.0));
        assert_eq!(row.achievement.to_string(), "90.0%");
    }

    #[test]
    fn zero_plan_is_not_applicable() {
        let summary = aggregate_collections(
            &[planned("Beta - Cards", 0.0)],
            &[received("Beta - Cards", 12_000.0)],
        );

        assert_eq!(summary[0].achievement, Achievement::NotApplicable);
        assert_eq!(
            serde_json::to_value(&summary[0]).unwrap()["achievement"],
            "N/A"
        );
    }

    #[test]
    fn unmatched_labels_keep_zero_on_missing_side() {
        let summary = aggregate_collections(
            &[planned("Acme - Loans", 1_000.0)],
            &[received("Gamma - Auto", 500.0)],
        );

        assert_eq!(summary.len(), 2);
        let acme = summary.iter().find(|s| s.label == "Acme - Loans").unwrap();
        let gamma = summary.iter().find(|s| s.label == "Gamma - Auto").unwrap();

        assert_eq!(acme.total_received_money, 0.0);
        assert_eq!(acme.achievement, Achievement::Percent(0.0));
        assert_eq!(gamma.planned_count, 0);
        assert_eq!(gamma.average_planned_money, 0.0);
        assert_eq!(gamma.achievement, Achievement::NotApplicable);
    }

    #[test]
    fn labels_match_despite_case_and_spacing() {
        let summary = aggregate_collections(
            &[planned("Acme  -  Loans", 100.0)],
            &[received(" acme - loans", 50.0)],
        );

        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].label, "Acme - Loans");
        assert_eq!(summary[0].achievement, Achievement::Percent(50.0));
    }

    #[test]
    fn totals_across_labels() {
        let summary = aggregate_collections(
            &[planned("A", 40_000.0), planned("B", 10_000.0)],
            &[received("A", 30_000.0), received("B", 15_000.0)],
        );
        let totals = collection_totals(&summary);

        assert_eq!(totals.total_planned_money, 50_000.0);
        assert_eq!(totals.total_received_money, 45_000.0);
        assert_eq!(totals.achievement, Achievement::Percent(90.0));
        assert_eq!(
            serde_json::to_value(&totals).unwrap()["achievement"],
            serde_json::json!(90.0)
        );
    }
}
