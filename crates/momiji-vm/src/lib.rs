//! The stack-based bytecode virtual machine: heap, GC, symbol table, and
//! call-frame dispatcher (spec §3 "Runtime Model" / §4 "Execution Model").

pub mod error;
pub mod gc;
pub(crate) mod handle;
pub mod heap;
mod interner;
mod natives;
mod table;
pub mod value;
mod vm;

pub use error::RuntimeError;
pub use gc::{GcConfig, GcCycleReport, GcStats};
pub use handle::Handle;
pub use value::Value;
pub use vm::Vm;

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> Result<Vm, RuntimeError> {
        let function = momiji_compiler::compile(source).expect("compile error");
        let mut vm = Vm::new(GcConfig::default(), Some(1));
        vm.run(function)?;
        Ok(vm)
    }

    #[test]
    fn runs_a_closure_counter_end_to_end() {
        run(r#"
            function make_counter() {
                local count = 0;
                return function() => count += 1;
            }
            local tick = make_counter();
            print tick();
            print tick();
            print tick();
        "#)
        .expect("should run");
    }

    #[test]
    fn runs_classes_inheritance_and_super_calls() {
        run(r#"
            class Animal {
                local legs = 4;
                Animal(name) { this.name = name; }
                speak() { print this.name + " makes a sound"; }
            }
            class Dog : Animal {
                speak() {
                    super.speak();
                    print this.legs;
                }
            }
            local d = Dog("Rex");
            d.speak();
        "#)
        .expect("should run");
    }

    #[test]
    fn runs_array_and_map_literals_and_indexing() {
        run(r#"
            global a = [1, 2, 3];
            print a[0];
            a[3] = 4;
            print a[1:2];
            global m = {"x": 1, "y": 2};
            print m["x"];
        "#)
        .expect("should run");
    }

    #[test]
    fn undefined_global_read_is_a_runtime_error() {
        let err = run("print nope;").expect_err("should fail");
        assert!(err.diagnostic.message.contains("undefined global"));
    }

    #[test]
    fn assigning_an_undefined_global_is_a_runtime_error() {
        let err = run("nope = 1;").expect_err("should fail");
        assert!(err.diagnostic.message.contains("undefined global"));
    }

    #[test]
    fn stress_gc_survives_nested_allocation() {
        let function = momiji_compiler::compile(
            r#"
            function build(n) {
                local out = [];
                local i = 0;
                while (i < n) {
                    out[i] = {"n": i};
                    i = i + 1;
                }
                return out;
            }
            print len(build(50));
        "#,
        )
        .expect("compile error");
        let mut vm = Vm::new(GcConfig { stress: true, ..GcConfig::default() }, Some(1));
        vm.run(function).expect("should run under stress GC");
    }
}
