//! The single-pass Pratt compiler: source text in, a bytecode [`Chunk`]
//! wrapped in a [`CompiledFunction`] out.
//!
//! This crate never touches a garbage-collected heap (see `DESIGN.md`'s
//! "Constant vs. Value split"): its output is a self-contained,
//! reference-counted tree of [`chunk::Constant`] values that
//! `momiji-vm` converts into heap objects exactly once, at the point
//! each nested function is first closed over.

mod compile;

pub mod chunk;
pub mod error;
pub mod opcode;

pub use chunk::{Chunk, CompiledFunction, Constant};
pub use compile::compile;
pub use error::{CompileError, CompileResult};
pub use opcode::OpCode;

#[cfg(test)]
mod tests {
    use super::*;

    fn compile_ok(source: &str) -> CompiledFunction {
        compile(source).unwrap_or_else(|errors| {
            panic!(
                "unexpected compile errors: {:?}",
                errors.iter().map(|e| e.diagnostic.message.clone()).collect::<Vec<_>>()
            )
        })
    }

    #[test]
    fn compiles_an_arithmetic_expression_statement() {
        let function = compile_ok("1 + 2 * 3;");
        assert!(!function.chunk.is_empty());
    }

    #[test]
    fn compiles_global_and_local_declarations() {
        let function = compile_ok("global x = 1; print x; { local y = 2; print y; }");
        assert_eq!(function.arity, 0);
    }

    #[test]
    fn compiles_if_while_for_and_switch() {
        compile_ok(
            r#"
            global i = 0;
            while (i < 3) {
                if (i == 1) { print "one"; } else { print i; }
                i = i + 1;
            }
            for (local j = 0; j < 2; j = j + 1) { print j; }
            switch (i) {
                case 3: print "three";
                default: print "other";
            }
            "#,
        );
    }

    #[test]
    fn compiles_functions_closures_and_classes() {
        compile_ok(
            r#"
            function make_counter() {
                local count = 0;
                return function() => count += 1;
            }
            class Animal {
                local legs = 4;
                speak() { print "..."; }
            }
            class Dog : Animal {
                speak() {
                    super.speak();
                    print this.legs;
                }
            }
            local tick = make_counter();
            print tick();
            "#,
        );
    }

    #[test]
    fn rejects_return_at_top_level() {
        let errors = compile("return 1;").expect_err("top-level return should fail to compile");
        assert!(!errors.is_empty());
    }

    #[test]
    fn rejects_self_referential_local_initializer() {
        let errors =
            compile("{ local x = x; }").expect_err("self-referential initializer should fail");
        assert!(!errors.is_empty());
    }

    #[test]
    fn rejects_assignment_to_ranged_index() {
        let errors = compile("global a = [1,2,3]; a[0:1] = [9];")
            .expect_err("ranged-index assignment should be a compile error");
        assert!(!errors.is_empty());
    }

    #[test]
    fn ranged_index_always_pushes_three_bounds() {
        let function = compile_ok("global a = [1,2,3]; print a[1:2];");
        let ops: Vec<u8> = function.chunk.code().to_vec();
        assert!(ops.contains(&crate::OpCode::GetIndexRanged.as_u8()));
    }
}
