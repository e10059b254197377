use crate::prelude::Point3;
use crate::report::{EntityKind, ReportEntity, ScenarioReport, Transfer};
use crate::telemetry::LogManager;
use serde::Serialize;
use std::collections::BTreeMap;

/// entity address -> peer address -> packet count.
pub type FlowCounts = BTreeMap<String, BTreeMap<String, u64>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowDelivery {
    /// Receiving entity.
    pub from: String,
    /// Sender whose packets reached `from`.
    pub to: String,
    pub pdr: f64,
    pub plr: f64,
}

fn count_by<F>(report: &ScenarioReport, transfers: F, by_source: bool) -> FlowCounts
where
    F: Fn(&ReportEntity) -> &[Transfer],
{
    let mut counts = FlowCounts::new();
    for entity in report.entities() {
        let peers = counts.entry(entity.address.clone()).or_default();
        for transfer in transfers(entity) {
            let peer = if by_source {
                &transfer.source
            } else {
                &transfer.destination
            };
            *peers.entry(peer.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Packets received by every entity, keyed by sender.
pub fn rx_counts(report: &ScenarioReport) -> FlowCounts {
    count_by(report, |e| &e.data_rx, true)
}

/// Packets transmitted by every entity, keyed by destination.
pub fn tx_counts(report: &ScenarioReport) -> FlowCounts {
    count_by(report, |e| &e.data_tx, false)
}

fn ratio(rx: &FlowCounts, tx: &FlowCounts, receiver: &str, sender: &str) -> Option<f64> {
    let received = *rx.get(receiver)?.get(sender)?;
    let sent = *tx.get(sender)?.get(receiver)?;
    (sent > 0).then(|| received as f64 * 100.0 / sent as f64)
}

pub fn delivery_ratios(rx: &FlowCounts, tx: &FlowCounts) -> Vec<FlowDelivery> {
    let logger = LogManager::new("delivery");
    let mut stats = Vec::new();
    for (receiver, senders) in rx {
        for sender in senders.keys() {
            match ratio(rx, tx, receiver, sender) {
                Some(pdr) => stats.push(FlowDelivery {
                    from: receiver.clone(),
                    to: sender.clone(),
                    pdr,
                    plr: 100.0 - pdr,
                }),
                None => logger.caution(&format!(
                    "no transmissions from {} to {} recorded, skipping flow",
                    sender, receiver
                )),
            }
        }
    }
    stats
}

enum Event<'a> {
    Position {
        entity: &'a str,
        kind: EntityKind,
        point: Point3,
    },
    Rx {
        entity: &'a str,
        peer: &'a str,
    },
    Tx {
        entity: &'a str,
        peer: &'a str,
    },
}

fn timeline(report: &ScenarioReport) -> Vec<(i64, Event<'_>)> {
    let mut events: Vec<(i64, Event<'_>)> = Vec::new();

    // ZSPs usually sit at t = 0: shift colliding samples by 1 ns so that
    // every ZSP keeps its own slot.
    let mut taken = std::collections::BTreeSet::new();
    for zsp in &report.zsps {
        for sample in &zsp.positions {
            let mut t = sample.t_ns;
            while !taken.insert(t) {
                t += 1;
            }
            events.push((
                t,
                Event::Position {
                    entity: &zsp.address,
                    kind: EntityKind::Zsp,
                    point: sample.point,
                },
            ));
        }
    }

    for drone in &report.drones {
        for sample in &drone.positions {
            events.push((
                sample.t_ns,
                Event::Position {
                    entity: &drone.address,
                    kind: EntityKind::Drone,
                    point: sample.point,
                },
            ));
        }
    }

    for entity in report.entities() {
        for transfer in &entity.data_rx {
            if let Some(t) = transfer.time_ns {
                events.push((
                    t,
                    Event::Rx {
                        entity: &entity.address,
                        peer: &transfer.source,
                    },
                ));
            }
        }
    }
    for entity in report.entities() {
        for transfer in &entity.data_tx {
            if let Some(t) = transfer.time_ns {
                events.push((
                    t,
                    Event::Tx {
                        entity: &entity.address,
                        peer: &transfer.destination,
                    },
                ));
            }
        }
    }

    events.sort_by_key(|(t, _)| *t);
    events
}

/// PDR of every drone sampled at its position updates, against the distance
/// from the closest ZSP.
///
/// The ratio is the one of the first sender the drone heard from.
/// Transfers without a timestamp cannot be placed on the timeline and are
/// ignored. Position updates produce no point until every sender heard so
/// far has recorded a transmission to the drone.
pub fn delivery_over_distance(report: &ScenarioReport) -> BTreeMap<String, Vec<(f64, f64)>> {
    let events = timeline(report);
    let zsp_points: Vec<Point3> = events
        .iter()
        .filter_map(|(_, e)| match e {
            Event::Position {
                kind: EntityKind::Zsp,
                point,
                ..
            } => Some(*point),
            _ => None,
        })
        .collect();

    let mut rx = FlowCounts::new();
    let mut tx = FlowCounts::new();
    // receiver -> senders in the order their first packet arrived
    let mut senders: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut series: BTreeMap<String, Vec<(f64, f64)>> = BTreeMap::new();

    for (_, event) in &events {
        match event {
            Event::Rx { entity, peer } => {
                let count = rx
                    .entry(entity.to_string())
                    .or_default()
                    .entry(peer.to_string())
                    .or_insert(0);
                if *count == 0 {
                    senders.entry(*entity).or_default().push(*peer);
                }
                *count += 1;
            }
            Event::Tx { entity, peer } => {
                *tx.entry(entity.to_string())
                    .or_default()
                    .entry(peer.to_string())
                    .or_insert(0) += 1;
            }
            Event::Position {
                entity,
                kind: EntityKind::Drone,
                point,
            } => {
                let points = series.entry(entity.to_string()).or_default();
                let Some(heard) = senders.get(*entity) else {
                    continue;
                };
                let all_sent = heard
                    .iter()
                    .all(|sender| tx.get(*sender).is_some_and(|to| to.contains_key(*entity)));
                if !all_sent {
                    continue;
                }
                let pdr = match ratio(&rx, &tx, entity, heard[0]) {
                    Some(pdr) => pdr,
                    None => continue,
                };
                let distance = zsp_points
                    .iter()
                    .map(|z| point.distance(z))
                    .fold(f64::INFINITY, f64::min);
                if !distance.is_finite() {
                    continue;
                }
                if points.last().map(|(d, _)| *d == distance).unwrap_or(false) {
                    continue;
                }
                points.push((distance, pdr));
            }
            Event::Position { .. } => {}
        }
    }

    series
}
