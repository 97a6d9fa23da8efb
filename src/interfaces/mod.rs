//! Transport bindings around the core: file-based seeding and the CSV
//! operation stream used by the CLI.

pub mod csv;
pub mod seed;
