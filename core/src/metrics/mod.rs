//! Network metrics derived from reports and traces.

pub mod delivery;
pub mod latency;
pub mod loss;
pub mod snr;
pub mod throughput;

pub use delivery::{delivery_over_distance, delivery_ratios, rx_counts, tx_counts, FlowDelivery};
pub use latency::{host_latencies, join_latency};
pub use loss::{host_losses, packet_loss, trim_in_flight};
pub use throughput::{bucket_throughput, ThroughputBucket, ThroughputUnit};
