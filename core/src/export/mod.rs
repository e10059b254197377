pub mod kml;
pub mod ply;

pub use kml::Landmark;
pub use ply::RemSample;
