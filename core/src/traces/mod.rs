//! Parsers for text traces written by the simulator and for external
//! mobility datasets.

pub mod geolog;
pub mod mobility;
pub mod pnat;
pub mod seqts;

pub use geolog::{GeoFix, GeoLogParser};
pub use mobility::{MobilityTraces, NodeTrace, TraceDialect};
pub use pnat::PnatTable;
pub use seqts::{RxSeqTsParser, SeqTsRecord, TxSeqTsParser, WifiTxParser};
