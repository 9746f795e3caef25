//! Filtering and per-neighbourhood aggregation of joined incidents.

use std::collections::BTreeMap;

use incident_map_analytics_models::{
    AggregateOptions, AggregationResult, NeighbourhoodSummary, TypeShare,
};
use incident_map_incident_models::{FilterSpec, JoinedIncident};
use incident_map_neighborhood::PolygonStore;

/// Applies `filter` to `joined` and counts the survivors per
/// neighbourhood.
///
/// Every neighbourhood in `store` gets an entry, with `count: 0` if no
/// incident survived. Unassigned incidents pass through the filter but are
/// never counted toward a neighbourhood. Inputs are not modified, so
/// repeated calls return identical results.
#[must_use]
pub fn aggregate(
    joined: &[JoinedIncident],
    store: &PolygonStore,
    filter: &FilterSpec,
    options: &AggregateOptions,
) -> AggregationResult {
    let selections = filter.effective_selections();

    // neighbourhood id -> breakdown label -> count
    let mut grouped: BTreeMap<i64, BTreeMap<&str, u64>> = BTreeMap::new();
    let mut matched_incidents = 0_u64;
    let mut unassigned_incidents = 0_u64;

    for incident in joined {
        let passes = selections
            .iter()
            .all(|(attribute, values)| values.contains(incident.attribute(*attribute)));
        if !passes {
            continue;
        }
        matched_incidents += 1;

        let Some(id) = incident.neighbourhood_id else {
            unassigned_incidents += 1;
            continue;
        };

        *grouped
            .entry(id)
            .or_default()
            .entry(incident.attribute(options.breakdown))
            .or_insert(0) += 1;
    }

    let neighbourhoods: Vec<NeighbourhoodSummary> = store
        .all()
        .iter()
        .map(|polygon| {
            let breakdown = grouped.remove(&polygon.id).unwrap_or_default();
            let count: u64 = breakdown.values().sum();
            NeighbourhoodSummary {
                id: polygon.id,
                name: polygon.name.clone(),
                count,
                top_types: top_k(&breakdown, count, options.top_k),
            }
        })
        .collect();

    for (id, breakdown) in &grouped {
        log::warn!(
            "Ignoring {} incidents joined to neighbourhood {id}, which is not in the store",
            breakdown.values().sum::<u64>()
        );
    }

    AggregationResult {
        neighbourhoods,
        total_incidents: joined.len() as u64,
        matched_incidents,
        unassigned_incidents,
    }
}

/// The `k` most frequent labels, descending by count with ties broken by
/// label ascending.
#[allow(clippy::cast_precision_loss)]
fn top_k(breakdown: &BTreeMap<&str, u64>, total: u64, k: usize) -> Vec<TypeShare> {
    let mut entries: Vec<(&str, u64)> = breakdown.iter().map(|(l, c)| (*l, *c)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    entries
        .into_iter()
        .take(k)
        .map(|(label, count)| TypeShare {
            label: label.to_string(),
            count,
            percentage: if total == 0 {
                0.0
            } else {
                100.0 * count as f64 / total as f64
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use incident_map_incident_models::{
        FilterMode, IncidentAttribute, IncidentPoint, IncidentRecord,
    };
    use incident_map_neighborhood_models::{NeighbourhoodRecord, Ring};
    use incident_map_projection::SourceFrame;

    use super::*;

    fn square(id: i64) -> NeighbourhoodRecord {
        #[allow(clippy::cast_precision_loss)]
        let x0 = id as f64;
        NeighbourhoodRecord {
            id,
            name: format!("N{id}"),
            parts: vec![vec![Ring::from(vec![
                (x0, 0.0),
                (x0 + 1.0, 0.0),
                (x0 + 1.0, 1.0),
                (x0, 1.0),
            ])]],
            attributes: BTreeMap::new(),
        }
    }

    fn incident(
        neighbourhood_id: Option<i64>,
        category: &str,
        group: &str,
        type_group: &str,
    ) -> JoinedIncident {
        JoinedIncident {
            point: IncidentPoint {
                record: IncidentRecord {
                    x: 0.0,
                    y: 0.0,
                    frame: SourceFrame::Geographic,
                    category: category.to_string(),
                    group: group.to_string(),
                    type_group: type_group.to_string(),
                    extra: BTreeMap::new(),
                },
                longitude: 0.0,
                latitude: 0.0,
            },
            neighbourhood_id,
        }
    }

    fn store() -> PolygonStore {
        PolygonStore::build(vec![square(1), square(2), square(3)]).unwrap()
    }

    fn unfiltered() -> FilterSpec {
        FilterSpec::new(FilterMode::Simultaneous)
    }

    #[test]
    fn every_known_neighbourhood_has_an_entry() {
        let joined = vec![
            incident(Some(1), "Violent", "Assault", "Assault"),
            incident(Some(1), "Violent", "Assault", "Assault"),
            incident(Some(2), "Property", "Theft", "Theft From Vehicle"),
            incident(None, "Property", "Theft", "Theft From Vehicle"),
        ];

        let result = aggregate(&joined, &store(), &unfiltered(), &AggregateOptions::default());

        assert_eq!(
            result.counts(),
            BTreeMap::from([(1, 2), (2, 1), (3, 0)])
        );
        assert!(result.get(3).unwrap().top_types.is_empty());
        assert_eq!(result.total_incidents, 4);
        assert_eq!(result.matched_incidents, 4);
        assert_eq!(result.unassigned_incidents, 1);
    }

    #[test]
    fn top_k_sorts_by_count_then_label() {
        let mut joined = Vec::new();
        for (label, n) in [("C", 2), ("A", 5), ("B", 3)] {
            for _ in 0..n {
                joined.push(incident(Some(1), "Property", "Theft", label));
            }
        }

        let options = AggregateOptions {
            top_k: 2,
            breakdown: IncidentAttribute::TypeGroup,
        };
        let result = aggregate(&joined, &store(), &unfiltered(), &options);
        let summary = result.get(1).unwrap();

        assert_eq!(summary.count, 10);
        assert_eq!(
            summary.top_types,
            vec![
                TypeShare {
                    label: "A".to_string(),
                    count: 5,
                    percentage: 50.0
                },
                TypeShare {
                    label: "B".to_string(),
                    count: 3,
                    percentage: 30.0
                },
            ]
        );
    }

    #[test]
    fn ties_are_broken_by_label() {
        let joined = vec![
            incident(Some(2), "Property", "Theft", "Zeta"),
            incident(Some(2), "Property", "Theft", "Alpha"),
            incident(Some(2), "Property", "Theft", "Mu"),
        ];
        let result = aggregate(&joined, &store(), &unfiltered(), &AggregateOptions::default());
        let labels: Vec<&str> = result
            .get(2)
            .unwrap()
            .top_types
            .iter()
            .map(|t| t.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Alpha", "Mu", "Zeta"]);
    }

    #[test]
    fn exclusive_mode_applies_only_the_active_attribute() {
        let joined = vec![
            incident(Some(1), "Violent", "Assault", "Assault"),
            incident(Some(1), "Property", "Break and Enter", "Break and Enter"),
            incident(Some(2), "Property", "Theft", "Theft From Vehicle"),
        ];

        let filter = FilterSpec::new(FilterMode::Exclusive {
            attribute: IncidentAttribute::Category,
        })
        .with_selection(IncidentAttribute::Category, ["Property"])
        .with_selection(IncidentAttribute::TypeGroup, ["Assault"]);

        let result = aggregate(&joined, &store(), &filter, &AggregateOptions::default());
        assert_eq!(
            result.counts(),
            BTreeMap::from([(1, 1), (2, 1), (3, 0)])
        );
    }

    #[test]
    fn simultaneous_mode_ands_selections() {
        let joined = vec![
            incident(Some(1), "Property", "Break and Enter", "Break and Enter"),
            incident(Some(1), "Property", "Theft", "Theft From Vehicle"),
            incident(Some(2), "Violent", "Assault", "Break and Enter"),
        ];

        let filter = FilterSpec::new(FilterMode::Simultaneous)
            .with_selection(IncidentAttribute::Category, ["Property"])
            .with_selection(IncidentAttribute::TypeGroup, ["Break and Enter"]);

        let result = aggregate(&joined, &store(), &filter, &AggregateOptions::default());
        assert_eq!(
            result.counts(),
            BTreeMap::from([(1, 1), (2, 0), (3, 0)])
        );
        assert_eq!(result.matched_incidents, 1);
    }

    #[test]
    fn filter_excluding_everything_yields_zero_counts() {
        let joined = vec![incident(Some(1), "Violent", "Assault", "Assault")];
        let filter = FilterSpec::new(FilterMode::Simultaneous)
            .with_selection(IncidentAttribute::Category, ["Traffic"]);
        let result = aggregate(&joined, &store(), &filter, &AggregateOptions::default());
        assert!(result.neighbourhoods.iter().all(|n| n.count == 0));
        assert_eq!(result.neighbourhoods.len(), 3);
    }

    #[test]
    fn aggregate_is_idempotent() {
        let joined = vec![
            incident(Some(1), "Violent", "Assault", "Assault"),
            incident(Some(3), "Property", "Theft", "Theft Of Vehicle"),
            incident(None, "Property", "Theft", "Theft Of Vehicle"),
        ];
        let before = joined.clone();
        let store = store();
        let filter = unfiltered();
        let options = AggregateOptions::default();

        let first = aggregate(&joined, &store, &filter, &options);
        let second = aggregate(&joined, &store, &filter, &options);
        assert_eq!(first, second);
        assert_eq!(joined, before);
    }

    #[test]
    fn zero_total_reports_zero_percentage() {
        let empty = BTreeMap::from([("A", 0_u64)]);
        let shares = top_k(&empty, 0, 5);
        assert_eq!(shares.len(), 1);
        assert!(shares[0].percentage.abs() < f64::EPSILON);
    }
}
