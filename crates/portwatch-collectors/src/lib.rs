mod esa;
mod lima;
mod nasa;
mod synth;

pub use esa::EsaCollector;
pub use lima::LimaCollector;
pub use nasa::NasaCollector;
