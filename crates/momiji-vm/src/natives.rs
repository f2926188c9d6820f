//! Built-in global callables (spec §6 "Built-in global callables").

use std::io::Write as _;

use crate::error::RuntimeError;
use crate::heap::object::{NativeFn, NativeObj, Obj};
use crate::value::Value;
use crate::vm::Vm;

fn arity_error(name: &str, expected: &str, got: usize) -> RuntimeError {
    RuntimeError::new(format!("{name}() expects {expected}, got {got} argument(s)"), 0, None)
}

fn clock(vm: &mut Vm, args: &[Value]) -> Result<Value, RuntimeError> {
    if !args.is_empty() {
        return Err(arity_error("clock", "0 arguments", args.len()));
    }
    Ok(Value::Number(vm.start_time.elapsed().as_secs_f64()))
}

fn input(vm: &mut Vm, args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() > 1 {
        return Err(arity_error("input", "0 or 1 arguments", args.len()));
    }
    if let Some(prompt) = args.first() {
        let Value::Object(handle) = prompt else {
            return Err(RuntimeError::new("input() prompt must be a string", 0, None));
        };
        let Obj::Str(s) = vm.heap.get(*handle) else {
            return Err(RuntimeError::new("input() prompt must be a string", 0, None));
        };
        print!("{}", s.as_str());
        let _ = std::io::stdout().flush();
    }

    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .map_err(|e| RuntimeError::new(format!("input() failed: {e}"), 0, None))?;
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(vm.intern_string(line.as_bytes()))
}

fn exit_native(vm: &mut Vm, args: &[Value]) -> Result<Value, RuntimeError> {
    let code = match args {
        [] => 0,
        [Value::Number(n)] => *n as i32,
        _ => return Err(arity_error("exit", "0 or 1 numeric arguments", args.len())),
    };
    let _ = vm;
    std::process::exit(code);
}

fn len(vm: &mut Vm, args: &[Value]) -> Result<Value, RuntimeError> {
    let [Value::Object(handle)] = args else {
        return Err(arity_error("len", "1 argument", args.len()));
    };
    match vm.heap.get(*handle) {
        Obj::Str(s) => Ok(Value::Number(s.bytes.len() as f64)),
        Obj::Array(a) => Ok(Value::Number(a.items.len() as f64)),
        other => Err(RuntimeError::new(
            format!("len() does not support {}", other.type_name()),
            0,
            None,
        )),
    }
}

fn command_string(vm: &Vm, args: &[Value]) -> Result<String, RuntimeError> {
    let [Value::Object(handle)] = args else {
        return Err(arity_error("exec/system", "1 string argument", args.len()));
    };
    match vm.heap.get(*handle) {
        Obj::Str(s) => Ok(s.as_str().into_owned()),
        _ => Err(RuntimeError::new("exec/system argument must be a string", 0, None)),
    }
}

/// Captures stdout of a shell command as a String.
fn exec_native(vm: &mut Vm, args: &[Value]) -> Result<Value, RuntimeError> {
    let command = command_string(vm, args)?;
    let output = std::process::Command::new("sh")
        .arg("-c")
        .arg(&command)
        .output()
        .map_err(|e| RuntimeError::new(format!("exec() failed: {e}"), 0, None))?;
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    Ok(vm.intern_string(stdout.as_bytes()))
}

/// Runs a shell command, returning its exit status code as a Number.
fn system_native(vm: &mut Vm, args: &[Value]) -> Result<Value, RuntimeError> {
    let command = command_string(vm, args)?;
    let status = std::process::Command::new("sh")
        .arg("-c")
        .arg(&command)
        .status()
        .map_err(|e| RuntimeError::new(format!("system() failed: {e}"), 0, None))?;
    Ok(Value::Number(f64::from(status.code().unwrap_or(-1))))
}

pub(crate) const BUILTINS: &[(&str, Option<u8>, NativeFn)] = &[
    ("clock", Some(0), clock as NativeFn),
    ("input", None, input as NativeFn),
    ("exit", None, exit_native as NativeFn),
    ("len", Some(1), len as NativeFn),
    ("exec", Some(1), exec_native as NativeFn),
    ("system", Some(1), system_native as NativeFn),
];

pub(crate) fn make_native(name: &'static str, arity: Option<u8>, func: NativeFn) -> Obj {
    Obj::Native(NativeObj { name, arity, func })
}
