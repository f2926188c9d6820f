//! The interactive REPL (spec §6): a line reader with a bracket-balance
//! continuation accumulator, no line-editing crate involved (spec §10.4's
//! rationale for staying on plain `std::io`).

use std::io::Write as _;

use momiji_vm::{GcConfig, Vm};

use crate::config::Config;
use crate::error::CliError;

const PROMPT: &str = ">>> ";
const CONTINUATION_PROMPT: &str = "... ";

/// Tracks `()`/`{}`/`[]` nesting across accumulated lines. Only tracks
/// depth, not bracket *kind* matching — a REPL session typing mismatched
/// brackets gets a compile error once submitted, same as a script would.
fn bracket_balance(buffer: &str) -> i64 {
    let mut depth: i64 = 0;
    let mut in_string: Option<char> = None;
    let mut escaped = false;
    for ch in buffer.chars() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote {
                in_string = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => in_string = Some(ch),
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => depth -= 1,
            _ => {}
        }
    }
    depth
}

/// Runs the REPL to completion (EOF on stdin), sharing one `Vm` across
/// submissions so globals and natives persist between inputs.
pub fn run_repl(config: &Config) -> Result<(), CliError> {
    let mut vm = Vm::with_trace_execution(
        GcConfig { grow_factor: config.gc_heap_grow_factor, stress: config.stress_gc, ..GcConfig::default() },
        config.rng_seed,
        config.trace_execution,
    );
    let color = config.color.resolve();
    let stdin = std::io::stdin();
    let mut buffer = String::new();

    loop {
        let unbalanced = bracket_balance(&buffer) > 0;
        print!("{}", if unbalanced { CONTINUATION_PROMPT } else { PROMPT });
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        let bytes_read = stdin.read_line(&mut line)?;
        if bytes_read == 0 {
            break;
        }

        buffer.push_str(&line);

        if bracket_balance(&buffer) > 0 {
            // Still unbalanced: keep accumulating under the continuation prompt.
            continue;
        }
        if !line.trim().is_empty() {
            // Balanced, but the submitting blank line hasn't arrived yet.
            continue;
        }

        let source = buffer.trim().to_string();
        buffer.clear();
        if source.is_empty() {
            continue;
        }

        match momiji_compiler::compile(&source) {
            Ok(function) => {
                if let Err(err) = vm.run(function) {
                    let cli_err = CliError::Runtime(err);
                    eprint!("{}", cli_err.render(color));
                }
            }
            Err(errors) => {
                let cli_err = CliError::Compile(errors);
                eprint!("{}", cli_err.render(color));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_single_line_has_zero_depth() {
        assert_eq!(bracket_balance("print 1 + 2;"), 0);
    }

    #[test]
    fn unclosed_brace_has_positive_depth() {
        assert_eq!(bracket_balance("function f() {"), 1);
    }

    #[test]
    fn brackets_inside_strings_are_ignored() {
        assert_eq!(bracket_balance(r#"print "(unbalanced";"#), 0);
    }

    #[test]
    fn closing_bracket_outweighs_opening() {
        assert_eq!(bracket_balance("}"), -1);
    }
}
