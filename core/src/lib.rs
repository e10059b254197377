//! Parsing, metrics and export core of the IoD Sim analysis toolkit.
//!
//! Every module works on files produced by a single simulation run (XML
//! report, ns-3 ascii traces, application logs, CSV statistics) or on the
//! scenario JSON fed to the simulator. Nothing here spawns processes.

pub mod export;
pub mod geo;
pub mod geometry;
pub mod math;
pub mod metrics;
pub mod prelude;
pub mod report;
pub mod scenario;
pub mod telemetry;
pub mod traces;

pub use prelude::{AnalysisError, AnalysisResult, LineParser, Point3, PositionSample, Waypoint};
