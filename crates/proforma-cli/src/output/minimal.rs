use serde_json::Value;

/// Print just the key answer value from the output.
///
/// For an IRR solve that is the rate itself; for a simulation batch, the
/// mean simulated IRR; for a distribution analysis, the sample mean.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(irr) = result_obj.get("irr") {
        if irr.is_number() {
            println!("{}", format_minimal(irr));
            return;
        }
    }

    // Simulation batch: the IRR metric summary's mean
    if let Some(mean) = result_obj
        .pointer("/summary/irr/mean")
        .filter(|v| !v.is_null())
    {
        println!("{}", format_minimal(mean));
        return;
    }

    // Distribution analysis: the sample mean
    if let Some(mean) = result_obj.pointer("/summary/mean").filter(|v| !v.is_null()) {
        println!("{}", format_minimal(mean));
        return;
    }

    if let Value::Object(map) = result_obj {
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
