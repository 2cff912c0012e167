pub mod ingest;
pub mod show;
