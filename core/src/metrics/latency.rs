use crate::traces::seqts::SeqTsRecord;
use std::collections::{BTreeMap, HashMap};
use std::net::Ipv4Addr;

/// End-to-end latency (seconds) of every received packet whose sequence
/// number was also transmitted.
///
/// Rx order is kept; when a sequence number was transmitted more than once
/// the first transmission wins.
pub fn join_latency(tx: &[SeqTsRecord], rx: &[SeqTsRecord]) -> Vec<f64> {
    if tx.is_empty() || rx.is_empty() {
        return Vec::new();
    }

    let mut sent: HashMap<u64, f64> = HashMap::with_capacity(tx.len());
    for record in tx {
        sent.entry(record.sn).or_insert(record.time_s);
    }

    rx.iter()
        .filter_map(|r| sent.get(&r.sn).map(|t| r.time_s - t))
        .collect()
}

/// Latency series of every transmitting host. Hosts with no receptions
/// yield an empty series.
pub fn host_latencies(
    tx_by_host: &BTreeMap<Ipv4Addr, Vec<SeqTsRecord>>,
    rx_by_host: &BTreeMap<Ipv4Addr, Vec<SeqTsRecord>>,
) -> BTreeMap<Ipv4Addr, Vec<f64>> {
    tx_by_host
        .iter()
        .map(|(host, tx)| {
            let rx = rx_by_host.get(host).map(Vec::as_slice).unwrap_or(&[]);
            (*host, join_latency(tx, rx))
        })
        .collect()
}
