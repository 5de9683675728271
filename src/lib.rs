pub mod cobertura;
pub mod error;
pub mod ingest;
pub mod jacoco;
pub mod model;
pub mod writer;
