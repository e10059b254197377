pub mod stats;

pub use stats::{decimal, lin_to_db, round3, watt_to_dbm, StatsHelper};
