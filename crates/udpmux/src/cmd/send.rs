use std::net::SocketAddr;

use udpmux_router::Router;
use udpmux_value::Value;

use crate::cmd::SendArgs;
use crate::exit::{router_error, CliError, CliResult, SUCCESS, USAGE};

pub fn run(args: SendArgs, _format: crate::output::OutputFormat) -> CliResult<i32> {
    let dest: SocketAddr = args
        .dest
        .parse()
        .map_err(|err| CliError::new(USAGE, format!("invalid destination address: {err}")))?;

    let value = resolve_value(&args)?;

    let router = Router::new().map_err(|err| router_error("router setup failed", err))?;
    router.tx_attach(dest, args.channel);
    router
        .write(&value, args.channel)
        .map_err(|err| router_error("send failed", err))?;

    Ok(SUCCESS)
}

fn resolve_value(args: &SendArgs) -> CliResult<Value> {
    if let Some(data) = &args.data {
        return Ok(Value::String(data.clone()));
    }
    if let Some(json) = &args.json {
        let parsed: serde_json::Value = serde_json::from_str(json)
            .map_err(|err| CliError::new(USAGE, format!("--json is not valid JSON: {err}")))?;
        return json_to_value(&parsed);
    }
    if let Some(int) = args.int {
        return Ok(Value::Int64(int));
    }
    if let Some(uint) = args.uint {
        return Ok(Value::UInt64(uint));
    }
    if let Some(boolean) = args.boolean {
        return Ok(Value::Bool(boolean));
    }
    if args.null {
        return Ok(Value::Null);
    }
    Err(CliError::new(
        USAGE,
        "a payload is required: --data, --json, --int, --uint, --boolean, or --null",
    ))
}

/// Map a JSON document onto the wire types.
///
/// Integers become Int64 when they fit, UInt64 otherwise; fractional numbers
/// and objects have no wire counterpart and are usage errors.
fn json_to_value(json: &serde_json::Value) -> CliResult<Value> {
    match json {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_json::Value::String(s) => Ok(Value::String(s.clone())),
        serde_json::Value::Array(items) => items
            .iter()
            .map(json_to_value)
            .collect::<CliResult<Vec<_>>>()
            .map(Value::Array),
        serde_json::Value::Number(n) => {
            if let Some(int) = n.as_i64() {
                Ok(Value::Int64(int))
            } else if let Some(uint) = n.as_u64() {
                Ok(Value::UInt64(uint))
            } else {
                Err(CliError::new(
                    USAGE,
                    format!("fractional number {n} has no wire representation"),
                ))
            }
        }
        serde_json::Value::Object(_) => Err(CliError::new(
            USAGE,
            "JSON objects have no wire representation",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_with(json: Option<&str>, data: Option<&str>) -> SendArgs {
        SendArgs {
            dest: "127.0.0.1:50000".to_string(),
            channel: 0,
            data: data.map(str::to_string),
            json: json.map(str::to_string),
            int: None,
            uint: None,
            boolean: None,
            null: false,
        }
    }

    #[test]
    fn resolve_value_prefers_explicit_payloads() {
        let value = resolve_value(&args_with(None, Some("hi"))).unwrap();
        assert_eq!(value, Value::String("hi".to_string()));

        let err = resolve_value(&args_with(None, None)).unwrap_err();
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn json_maps_onto_wire_types() {
        let value = resolve_value(&args_with(Some(r#"[true, 5, -3, "x", null]"#), None)).unwrap();
        assert_eq!(
            value,
            Value::Array(vec![
                Value::Bool(true),
                Value::Int64(5),
                Value::Int64(-3),
                Value::String("x".to_string()),
                Value::Null,
            ])
        );
    }

    #[test]
    fn json_large_unsigned_becomes_uint64() {
        let json: serde_json::Value =
            serde_json::from_str(&u64::MAX.to_string()).unwrap();
        assert_eq!(json_to_value(&json).unwrap(), Value::UInt64(u64::MAX));
    }

    #[test]
    fn json_objects_and_fractions_are_usage_errors() {
        let obj: serde_json::Value = serde_json::from_str(r#"{"a":1}"#).unwrap();
        assert_eq!(json_to_value(&obj).unwrap_err().code, USAGE);

        let frac: serde_json::Value = serde_json::from_str("1.5").unwrap();
        assert_eq!(json_to_value(&frac).unwrap_err().code, USAGE);
    }
}
