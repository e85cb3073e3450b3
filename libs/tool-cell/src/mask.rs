use serde_json::{Map, Value};

const PHONE_KEYS: [&str; 3] = ["patient_phone", "phone", "target"];
const TRUNCATE_KEYS: [&str; 2] = ["message", "reason"];
const TRUNCATE_LEN: usize = 40;

/// "01012345678" -> "010****5678". Values too short to mask safely are
/// left as-is.
pub fn mask_phone(value: &str) -> String {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 7 {
        return value.to_string();
    }
    format!("{}****{}", &digits[..3], &digits[digits.len() - 4..])
}

/// Copy of the args with phone numbers starred and free text truncated,
/// safe for the audit log.
pub fn mask_args(args: &Value) -> Value {
    let Some(object) = args.as_object() else {
        return args.clone();
    };
    let mut masked = Map::new();
    for (key, value) in object {
        if value.is_null() {
            continue;
        }
        let entry = match value {
            Value::String(s) if PHONE_KEYS.contains(&key.as_str()) => {
                Value::String(mask_phone(s))
            }
            Value::String(s) if TRUNCATE_KEYS.contains(&key.as_str()) => {
                Value::String(s.chars().take(TRUNCATE_LEN).collect())
            }
            other => other.clone(),
        };
        masked.insert(key.clone(), entry);
    }
    Value::Object(masked)
}
