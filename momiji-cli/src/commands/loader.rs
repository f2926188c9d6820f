//! The file loader (spec §6): compiles and runs exactly one script.

use std::path::Path;

use momiji_vm::{GcConfig, Vm};

use crate::config::Config;
use crate::error::CliError;

pub fn run_file(path: &Path, config: &Config) -> Result<(), CliError> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("cannot read '{}': {e}", path.display())))?;

    tracing::info!(path = %path.display(), "loaded script");

    let function = momiji_compiler::compile(&source).map_err(CliError::Compile)?;

    let mut vm = Vm::with_trace_execution(
        GcConfig { grow_factor: config.gc_heap_grow_factor, stress: config.stress_gc, ..GcConfig::default() },
        config.rng_seed,
        config.trace_execution,
    );
    vm.run(function)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_a_simple_script() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.momiji");
        std::fs::write(&path, "print 1 + 1;").unwrap();
        run_file(&path, &Config::default()).expect("should run");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = run_file(Path::new("/nonexistent/script.momiji"), &Config::default())
            .expect_err("should fail");
        assert_eq!(err.exit_code(), 74);
    }

    #[test]
    fn compile_error_maps_to_exit_code_65() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.momiji");
        std::fs::write(&path, "local x = ;").unwrap();
        let err = run_file(&path, &Config::default()).expect_err("should fail");
        assert_eq!(err.exit_code(), 65);
    }
}
