//! Human-readable rendering of datamodel nodes returned by GET requests.
//!
//! A datamodel node carries `objectInfo`, `functions`, `parameters` and
//! optionally `errors`, `instances` and `children`. Anything else is printed
//! as pretty JSON.

use std::io::{self, Write};

use serde_json::Value;

use crate::report::display_value;

const LEVEL_RULE: &str = "===========================================";

/// Render a GET result: each node of an array, or the single node.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn render_all(value: &Value, out: &mut impl Write) -> io::Result<()> {
    match value {
        Value::Array(nodes) => nodes.iter().try_for_each(|node| render(node, 0, out)),
        node => render(node, 0, out),
    }
}

/// Render `node` and its children, `level` being the nesting depth.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn render(node: &Value, level: usize, out: &mut impl Write) -> io::Result<()> {
    let Some(info) = node.get("objectInfo") else {
        let pretty = serde_json::to_string_pretty(node).map_err(io::Error::other)?;
        return writeln!(out, "{pretty}");
    };

    writeln!(out)?;
    writeln!(out, "{LEVEL_RULE} level {level}")?;
    writeln!(out, "OBJECT NAME: '{}'  (name: {})", object_name(info), field(info, "name"))?;

    write_functions(node, "", out)?;
    write_parameters(node, "", out)?;

    if let Value::Object(entries) = node {
        for (key, value) in entries {
            match key.as_str() {
                "children" | "objectInfo" | "functions" | "parameters" => {}
                "errors" => write_errors(value, out)?,
                "instances" => write_instances(value, out)?,
                other => write_summary(other, value, out)?,
            }
        }
    }

    if let Some(Value::Array(children)) = node.get("children") {
        for child in children {
            render(child, level + 1, out)?;
        }
    }
    Ok(())
}

fn object_name(info: &Value) -> String {
    format!("{}.{}", field(info, "keyPath"), field(info, "key"))
}

fn field(value: &Value, key: &str) -> String {
    value.get(key).map(display_value).unwrap_or_default()
}

fn flag(argument: &Value, attribute: &str) -> bool {
    argument
        .pointer(&format!("/attributes/{attribute}"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// `name (a, opt b, out c)`: arguments are optional unless marked mandatory.
fn signature(function: &Value) -> String {
    let arguments = function
        .get("arguments")
        .and_then(Value::as_array)
        .map(|arguments| {
            arguments
                .iter()
                .map(|argument| {
                    let marker = if flag(argument, "out") {
                        "out "
                    } else if flag(argument, "mandatory") {
                        ""
                    } else {
                        "opt "
                    };
                    format!("{marker}{}", field(argument, "name"))
                })
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();

    format!("{} ({arguments})", field(function, "name"))
}

fn write_functions(node: &Value, indent: &str, out: &mut impl Write) -> io::Result<()> {
    if let Some(Value::Array(functions)) = node.get("functions") {
        for function in functions {
            writeln!(out, "{indent}function: {}", signature(function))?;
        }
    }
    Ok(())
}

fn write_parameters(node: &Value, indent: &str, out: &mut impl Write) -> io::Result<()> {
    if let Some(Value::Array(parameters)) = node.get("parameters") {
        for parameter in parameters {
            writeln!(
                out,
                "{indent}parameter:  {:<20} : {:<10} = '{}'",
                field(parameter, "name"),
                field(parameter, "type"),
                field(parameter, "value")
            )?;
        }
    }
    Ok(())
}

fn write_errors(errors: &Value, out: &mut impl Write) -> io::Result<()> {
    if let Value::Array(errors) = errors {
        for error in errors {
            writeln!(
                out,
                "{} {} {}",
                field(error, "error"),
                field(error, "info"),
                field(error, "description")
            )?;
        }
    }
    Ok(())
}

fn write_instances(instances: &Value, out: &mut impl Write) -> io::Result<()> {
    let Value::Array(instances) = instances else {
        return write_summary("instances", instances, out);
    };

    writeln!(out, "--> instances {}", instances.len())?;
    for (index, instance) in instances.iter().enumerate() {
        let info = instance.get("objectInfo").unwrap_or(&Value::Null);
        writeln!(
            out,
            "instance {}: '{}' (name: {})",
            index + 1,
            object_name(info),
            field(info, "name")
        )?;
        write_functions(instance, "    ", out)?;
        write_parameters(instance, "    ", out)?;
    }
    Ok(())
}

fn write_summary(key: &str, value: &Value, out: &mut impl Write) -> io::Result<()> {
    match value {
        Value::Array(items) => writeln!(out, "--> {key} {}", items.len()),
        Value::Object(entries) => writeln!(out, "--> {key} {}", entries.len()),
        Value::String(text) => writeln!(out, "--> {key} {}", text.chars().count()),
        other => writeln!(out, "--> {key} {other}"),
    }
}
