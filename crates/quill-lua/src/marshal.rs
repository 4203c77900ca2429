//! Conversion of compiler return values and raised errors into host types.
//!
//! Success values must be tables with a non-empty UTF-8 `code` field;
//! anything else is malformed. Raised error objects are read field by field:
//!
//! | Field | Maps to |
//! |-------|---------|
//! | `message` | [`CompileError::message`] |
//! | `frame` (or `snippet`) | [`CompileError::snippet`] |
//! | `code` | [`CompileError::kind`] |
//! | `start.line`, `start.column` | [`CompileError::location`] |
//!
//! The filename always comes from the request, never from the error object.

use crate::error::EngineError;
use mlua::{FromLua, Table, Value};
use quill_types::{kinds, CompileError, Location};

/// Extracts generated code from a compiler return value.
pub(crate) fn generated_code(filename: &str, value: &Value) -> Result<String, CompileError> {
    let Value::Table(table) = value else {
        return Err(malformed(
            filename,
            &format!("compiler returned {} instead of a table", value.type_name()),
        ));
    };
    match table.get::<Value>("code") {
        Ok(Value::String(code)) => match code.to_str() {
            Ok(code) if code.is_empty() => {
                Err(malformed(filename, "compiler result field 'code' is empty"))
            }
            Ok(code) => Ok((*code).to_owned()),
            Err(_) => Err(malformed(filename, "compiler result field 'code' is not valid UTF-8")),
        },
        Ok(other) => Err(malformed(
            filename,
            &format!("compiler result field 'code' is {}, expected string", other.type_name()),
        )),
        Err(e) => Err(engine_fault(filename, &EngineError::from(e))),
    }
}

/// Builds a diagnostic from a raised error object.
pub(crate) fn diagnostic(filename: &str, raised: &Value) -> CompileError {
    match raised {
        Value::Table(table) => from_table(filename, table),
        Value::String(s) => CompileError::new(filename, s.to_string_lossy()),
        Value::Error(e) => CompileError::new(filename, e.to_string()).with_kind(kinds::ENGINE_FAULT),
        other => CompileError::new(
            filename,
            format!("compiler raised a {} value", other.type_name()),
        ),
    }
}

/// One-line description of a raised error object.
pub(crate) fn describe(raised: &Value) -> String {
    diagnostic("", raised).message
}

fn from_table(filename: &str, table: &Table) -> CompileError {
    let message = field::<String>(table, "message")
        .unwrap_or_else(|| "compiler raised an error without a message".to_string());
    let mut err = CompileError::new(filename, message);

    if let Some(snippet) = field::<String>(table, "frame").or_else(|| field(table, "snippet")) {
        err = err.with_snippet(snippet);
    }
    if let Some(kind) = field::<String>(table, "code") {
        err = err.with_kind(kind);
    }
    if let Some(start) = field::<Table>(table, "start") {
        if let (Some(line), Some(column)) = (field::<u32>(&start, "line"), field::<u32>(&start, "column")) {
            err = err.with_location(Location::new(line, column));
        }
    }
    err
}

/// Reads an optional field; values of the wrong type count as absent.
fn field<T: FromLua>(table: &Table, key: &str) -> Option<T> {
    table.get::<Option<T>>(key).ok().flatten()
}

/// Diagnostic for an engine fault outside the compiler's error path.
pub(crate) fn engine_fault(filename: &str, err: &EngineError) -> CompileError {
    CompileError::new(filename, err.to_string()).with_kind(kinds::ENGINE_FAULT)
}

/// Diagnostic for a return value that carries no generated code.
pub(crate) fn malformed(filename: &str, detail: &str) -> CompileError {
    CompileError::new(filename, detail).with_kind(kinds::MALFORMED_OUTPUT)
}
