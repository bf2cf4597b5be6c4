use serde_json::Value;

use super::{result_of, scalar_text};

/// Fields that answer each command, checked in order. Dotted keys reach
/// into nested objects.
const PRIORITY_KEYS: [&str; 5] = [
    "summary.total_payable",
    "periods",
    "active_contracts",
    "summary.installment_count",
    "status",
];

/// Print just the key answer value from the output, falling back to the
/// first field of the result.
pub fn print_minimal(value: &Value) {
    let result = result_of(value);

    for key in PRIORITY_KEYS {
        if let Some(val) = lookup(result, key).filter(|v| !v.is_null()) {
            println!("{}", scalar_text(val));
            return;
        }
    }

    match result {
        Value::Object(map) => match map.iter().next() {
            Some((key, val)) => println!("{}: {}", key, scalar_text(val)),
            None => println!("{{}}"),
        },
        other => println!("{}", scalar_text(other)),
    }
}

fn lookup<'a>(value: &'a Value, dotted: &str) -> Option<&'a Value> {
    dotted
        .split('.')
        .try_fold(value, |current, part| current.as_object()?.get(part))
}
