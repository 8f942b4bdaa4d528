//! Payload normalisation between store JSON and domain values.
//!
//! Reads never fail.  `None` (or JSON `null`) means the node does not
//! exist; for the sensor and actuator streams that suppresses delivery
//! entirely.  Anything present but malformed falls back to a safe value:
//!
//! | Stream   | Accepted shapes                         | Fallback       |
//! |----------|-----------------------------------------|----------------|
//! | current  | `{value: n}`, bare number               | `0`            |
//! | series   | list or keyed map of `{timestamp,value}`| entry skipped  |
//! | actuator | `{isOn: b}`, bare bool                  | `false`        |
//! | mode     | `"auto"`/`"manual"`, `{mode: "…"}`      | `auto`         |

use serde_json::{Value, json};

use crate::model::{Mode, SensorPoint};

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

pub fn current(value: Option<&Value>) -> Option<f64> {
    present(value).map(|v| match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::Object(map) => map.get("value").and_then(Value::as_f64).unwrap_or(0.0),
        _ => 0.0,
    })
}

/// Whole series, ordered by timestamp.  Map-shaped payloads (push-id
/// keys) are flattened to their values first.
pub fn series(value: Option<&Value>) -> Option<Vec<SensorPoint>> {
    let value = present(value)?;
    let mut points: Vec<SensorPoint> = match value {
        Value::Array(items) => items.iter().filter_map(point).collect(),
        Value::Object(map) => map.values().filter_map(point).collect(),
        _ => Vec::new(),
    };
    points.sort_by_key(|p| p.timestamp);
    Some(points)
}

fn point(entry: &Value) -> Option<SensorPoint> {
    let obj = entry.as_object()?;
    let ts = obj.get("timestamp")?;
    let timestamp = ts.as_i64().or_else(|| ts.as_f64().map(|f| f as i64))?;
    let value = obj.get("value")?.as_f64()?;
    Some(SensorPoint::new(timestamp, value))
}

pub fn actuator(value: Option<&Value>) -> Option<bool> {
    present(value).map(|v| match v {
        Value::Bool(b) => *b,
        Value::Object(map) => map.get("isOn").and_then(Value::as_bool).unwrap_or(false),
        _ => false,
    })
}

/// Always yields a mode; absent or unrecognised values read as `auto`.
pub fn mode(value: Option<&Value>) -> Mode {
    let raw = match present(value) {
        Some(Value::String(s)) => Some(s.as_str()),
        Some(Value::Object(map)) => map.get("mode").and_then(Value::as_str),
        _ => None,
    };
    raw.and_then(|s| s.parse().ok()).unwrap_or(Mode::Auto)
}

/// `{isOn, timestamp}` written to `actuators/<k>/command`.
pub fn encode_command(is_on: bool, timestamp_ms: i64) -> Value {
    json!({ "isOn": is_on, "timestamp": timestamp_ms })
}

/// Mode is always written in the bare-string form.
pub fn encode_mode(mode: Mode) -> Value {
    Value::String(mode.as_str().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_shapes() {
        assert_eq!(current(Some(&json!({"value": 21.5}))), Some(21.5));
        assert_eq!(current(Some(&json!({"other": 1}))), Some(0.0));
        assert_eq!(current(Some(&json!(7))), Some(7.0));
        assert_eq!(current(Some(&Value::Null)), None);
        assert_eq!(current(None), None);
    }

    #[test]
    fn series_accepts_list_and_map() {
        let list = json!([
            {"timestamp": 2, "value": 2.0},
            {"timestamp": 1, "value": 1.0},
        ]);
        let map = json!({
            "-b": {"timestamp": 2, "value": 2.0},
            "-a": {"timestamp": 1, "value": 1.0},
        });
        let expected = vec![SensorPoint::new(1, 1.0), SensorPoint::new(2, 2.0)];
        assert_eq!(series(Some(&list)), Some(expected.clone()));
        assert_eq!(series(Some(&map)), Some(expected));
    }

    #[test]
    fn series_skips_malformed_entries() {
        let list = json!([
            null,
            {"timestamp": 5, "value": 3.5},
            {"timestamp": "x", "value": 1.0},
            {"value": 4.0},
            42,
        ]);
        assert_eq!(series(Some(&list)), Some(vec![SensorPoint::new(5, 3.5)]));
        assert_eq!(series(Some(&json!("junk"))), Some(Vec::new()));
        assert_eq!(series(None), None);
    }

    #[test]
    fn actuator_shapes() {
        assert_eq!(actuator(Some(&json!({"isOn": true}))), Some(true));
        assert_eq!(actuator(Some(&json!({}))), Some(false));
        assert_eq!(actuator(Some(&json!(true))), Some(true));
        assert_eq!(actuator(None), None);
    }

    #[test]
    fn mode_normalisation() {
        assert_eq!(mode(Some(&json!("manual"))), Mode::Manual);
        assert_eq!(mode(Some(&json!({"mode": "auto"}))), Mode::Auto);
        assert_eq!(mode(Some(&json!({"mode": "manual"}))), Mode::Manual);
        assert_eq!(mode(Some(&Value::Null)), Mode::Auto);
        assert_eq!(mode(None), Mode::Auto);
        assert_eq!(mode(Some(&json!("turbo"))), Mode::Auto);
        assert_eq!(mode(Some(&json!(3))), Mode::Auto);
    }

    #[test]
    fn encodings() {
        assert_eq!(encode_command(true, 99), json!({"isOn": true, "timestamp": 99}));
        assert_eq!(encode_mode(Mode::Manual), json!("manual"));
    }
}
