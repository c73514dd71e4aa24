//! This crate is a thin umbrella over the pipeline's actual components
//! (`crates/`, `services/`); it exists only to host cross-component
//! integration tests under `tests/` that don't belong to any single one of
//! them.
