use serde_json::Value;
use tabled::{builder::Builder, Table};

/// Format output as tables using the tabled crate.
///
/// Simulation output gets a scalar table plus one row per summarized metric;
/// the per-trial table is elided here (use --output csv to export it).
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_flat_object(value);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &serde_json::Map<String, Value>) {
    if let Value::Object(res_map) = result {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in res_map {
            match key.as_str() {
                "trials" => {
                    let count = val.as_array().map(|a| a.len()).unwrap_or(0);
                    builder.push_record(["trials", &format!("({count} rows, csv output)")]);
                }
                "summary" => {}
                "buckets" => {}
                "distributions" => {
                    builder.push_record(["distributions", "(bucketed tables, json output)"]);
                }
                _ => builder.push_record([key.as_str(), &format_value(val)]),
            }
        }
        println!("{}", Table::from(builder));

        if let Some(Value::Object(summary)) = res_map.get("summary") {
            print_summary_table(summary);
        }
        if let Some(Value::Array(buckets)) = res_map.get("buckets") {
            println!();
            print_array_table(buckets);
        }
    } else {
        print_flat_object(&Value::Object(envelope.clone()));
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_summary_table(summary: &serde_json::Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Metric", "Mean", "StdDev", "P5", "P50", "P95"]);
    let mut extra: Vec<(String, String)> = Vec::new();

    if summary.contains_key("percentiles") {
        // A bare metric summary rather than a map of them
        push_metric_row(&mut builder, "values", summary);
    } else {
        for (metric, val) in summary {
            match val {
                Value::Object(stats) if stats.contains_key("percentiles") => {
                    push_metric_row(&mut builder, metric, stats);
                }
                Value::Null => {}
                other => extra.push((metric.clone(), format_value(other))),
            }
        }
    }

    println!("\n{}", Table::from(builder));
    for (name, rendered) in extra {
        println!("{name}: {rendered}");
    }
}

fn push_metric_row(builder: &mut Builder, name: &str, stats: &serde_json::Map<String, Value>) {
    let p = stats.get("percentiles").and_then(|p| p.as_object());
    let pick =
        |k: &str| -> String { p.and_then(|m| m.get(k)).map(format_value).unwrap_or_default() };
    builder.push_record([
        name,
        &stats.get("mean").map(format_value).unwrap_or_default(),
        &stats.get("std_dev").map(format_value).unwrap_or_default(),
        &pick("p5"),
        &pick("p50"),
        &pick("p95"),
    ]);
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        println!("{}", Table::from(builder));
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
