//! Host bindings installed into every engine.
//!
//! | Binding | Description |
//! |---------|-------------|
//! | `quill.log(level, msg)` | Log through `tracing` at the given level |
//! | `quill.version` | Host crate version string |
//! | `print(...)` | Replaced: arguments are logged at debug level |
//!
//! Compiler programs must not write to the host's stdout, so the default
//! `print` is rebound to the logger.

use mlua::{Lua, MultiValue, Table, Value};

/// Global table name for host bindings.
pub(crate) const HOST_TABLE_NAME: &str = "quill";

/// Installs the `quill` table and the logging `print`.
pub(crate) fn register(lua: &Lua) -> mlua::Result<()> {
    let quill = ensure_host_table(lua)?;

    let log_fn = lua.create_function(|_, (level, msg): (String, String)| {
        match level.to_lowercase().as_str() {
            "trace" => tracing::trace!(target: "quill::program", "{}", msg),
            "debug" => tracing::debug!(target: "quill::program", "{}", msg),
            "warn" => tracing::warn!(target: "quill::program", "{}", msg),
            "error" => tracing::error!(target: "quill::program", "{}", msg),
            _ => tracing::info!(target: "quill::program", "{}", msg),
        }
        Ok(())
    })?;
    quill.set("log", log_fn)?;
    quill.set("version", env!("CARGO_PKG_VERSION"))?;

    let print_fn = lua.create_function(|_, args: MultiValue| {
        let line = args.iter().map(display).collect::<Vec<_>>().join("\t");
        tracing::debug!(target: "quill::program", "{}", line);
        Ok(())
    })?;
    lua.globals().set("print", print_fn)?;

    Ok(())
}

/// Returns the `quill` table, creating it if absent.
fn ensure_host_table(lua: &Lua) -> mlua::Result<Table> {
    let globals = lua.globals();
    if let Ok(table) = globals.get::<Table>(HOST_TABLE_NAME) {
        return Ok(table);
    }
    let table = lua.create_table()?;
    globals.set(HOST_TABLE_NAME, table.clone())?;
    Ok(table)
}

fn display(value: &Value) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.to_string_lossy(),
        other => format!("{}: {:p}", other.type_name(), other.to_pointer()),
    }
}
