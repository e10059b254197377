use crate::traces::seqts::SeqTsRecord;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

/// Packet loss ratio in `[0, 1]`.
pub fn packet_loss(tx_count: usize, rx_count: usize) -> f64 {
    if tx_count == 0 {
        0.0
    } else if rx_count == 0 {
        1.0
    } else {
        1.0 - rx_count as f64 / tx_count as f64
    }
}

/// Drops transmissions still in flight when the simulation stopped, i.e.
/// beyond the last received sequence number. Without receptions nothing
/// is dropped.
pub fn trim_in_flight(tx: &[SeqTsRecord], rx: &[SeqTsRecord]) -> Vec<SeqTsRecord> {
    match rx.last() {
        Some(last) => tx.iter().filter(|t| t.sn <= last.sn).cloned().collect(),
        None => tx.to_vec(),
    }
}

pub fn host_losses(
    tx_by_host: &BTreeMap<Ipv4Addr, Vec<SeqTsRecord>>,
    rx_by_host: &BTreeMap<Ipv4Addr, Vec<SeqTsRecord>>,
    trim: bool,
) -> BTreeMap<Ipv4Addr, f64> {
    tx_by_host
        .iter()
        .map(|(host, tx)| {
            let rx = rx_by_host.get(host).map(Vec::as_slice).unwrap_or(&[]);
            let sent = if trim {
                trim_in_flight(tx, rx).len()
            } else {
                tx.len()
            };
            (*host, packet_loss(sent, rx.len()))
        })
        .collect()
}
