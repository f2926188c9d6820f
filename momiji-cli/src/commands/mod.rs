//! Command modules for the `momiji` CLI: the REPL and the file loader
//! (spec §1's explicit placement of these as external collaborators).

pub mod loader;
pub mod repl;

pub use loader::run_file;
pub use repl::run_repl;
