use crate::statics;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt::Write as _;

/// A JSON number that remembers whether it was written as an integer or a float.
/// The server distinguishes `5` from `5.0` in some fields, so writes must keep the form.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    I64(i64),
    U64(u64),
    F64(f64),
}

impl Number {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::I64(v) => Some(*v),
            Number::U64(v) => i64::try_from(*v).ok(),
            Number::F64(_) => None,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Number::I64(v) => *v as f64,
            Number::U64(v) => *v as f64,
            Number::F64(v) => *v,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Number::F64(_))
    }

    fn write_json(&self, out: &mut String) {
        match self {
            Number::I64(v) => out.push_str(&v.to_string()),
            Number::U64(v) => out.push_str(&v.to_string()),
            Number::F64(v) => write_float(out, *v),
        }
    }
}

/// Numeric equality: `5 == 5.0`, matching how the server's own tooling compares values.
impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::I64(a), Number::I64(b)) => a == b,
            (Number::U64(a), Number::U64(b)) => a == b,
            (Number::I64(a), Number::U64(b)) | (Number::U64(b), Number::I64(a)) => {
                u64::try_from(*a).is_ok_and(|a| a == *b)
            }
            // NaN read from a file must equal itself or the file never settles as clean.
            (Number::F64(a), Number::F64(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Number::F64(f), int) | (int, Number::F64(f)) => {
                f.is_finite() && f.fract() == 0.0 && *f == int.as_f64()
            }
        }
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Number::I64(v) => serializer.serialize_i64(*v),
            Number::U64(v) => serializer.serialize_u64(*v),
            Number::F64(v) => serializer.serialize_f64(*v),
        }
    }
}

/// A parsed config file (or any part of one).
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<ConfigValue>),
    Object(IndexMap<String, ConfigValue>),
}

impl ConfigValue {
    pub fn as_object(&self) -> Option<&IndexMap<String, ConfigValue>> {
        match self {
            ConfigValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut IndexMap<String, ConfigValue>> {
        match self {
            ConfigValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, ConfigValue::Array(_) | ConfigValue::Object(_))
    }

    /// Look up one path segment: an object key, or an array index for all-digit segments.
    pub fn child(&self, segment: &str) -> Option<&ConfigValue> {
        match self {
            ConfigValue::Object(map) => map.get(segment),
            ConfigValue::Array(values) => segment.parse::<usize>().ok().and_then(|i| values.get(i)),
            _ => None,
        }
    }

    pub fn child_mut(&mut self, segment: &str) -> Option<&mut ConfigValue> {
        match self {
            ConfigValue::Object(map) => map.get_mut(segment),
            ConfigValue::Array(values) => segment
                .parse::<usize>()
                .ok()
                .and_then(|i| values.get_mut(i)),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::Null => statics::EN_TYPE_NULL,
            ConfigValue::Bool(_) => statics::EN_TYPE_BOOL,
            ConfigValue::Number(n) if n.is_float() => statics::EN_TYPE_FLOAT,
            ConfigValue::Number(_) => statics::EN_TYPE_INT,
            ConfigValue::String(_) => statics::EN_TYPE_STRING,
            ConfigValue::Array(_) => statics::EN_TYPE_ARRAY,
            ConfigValue::Object(_) => statics::EN_TYPE_OBJECT,
        }
    }

    pub fn parse(text: &str) -> anyhow::Result<ConfigValue> {
        Ok(json5::from_str::<ConfigValue>(text)?)
    }

    pub fn to_pretty_json(&self) -> String {
        self.to_pretty_json_with_newline(statics::NL_LF)
    }

    /// Serialize the way the server tooling writes configs:
    /// - 4-space indentation, `"key": value`
    /// - empty containers stay inline (`{}` / `[]`)
    /// - non-ASCII escaped as lowercase `\uXXXX`
    /// - no trailing newline
    pub fn to_pretty_json_with_newline(&self, newline: &str) -> String {
        let mut out = String::new();
        self.write_pretty(&mut out, 0, newline);
        out
    }

    pub fn to_compact_json(&self) -> String {
        let mut out = String::new();
        self.write_compact(&mut out);
        out
    }

    /// Text shown in an entry widget for this value.
    pub fn display_text(&self) -> String {
        match self {
            ConfigValue::String(s) => s.clone(),
            ConfigValue::Null => statics::EN_LITERAL_NULL.to_string(),
            ConfigValue::Bool(v) => v.to_string(),
            ConfigValue::Number(n) => {
                let mut out = String::new();
                n.write_json(&mut out);
                out
            }
            ConfigValue::Array(_) | ConfigValue::Object(_) => self.to_compact_json(),
        }
    }

    fn write_pretty(&self, out: &mut String, indent: usize, newline: &str) {
        match self {
            ConfigValue::Null => out.push_str("null"),
            ConfigValue::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
            ConfigValue::Number(n) => n.write_json(out),
            ConfigValue::String(s) => write_escaped_string_ascii(out, s),
            ConfigValue::Array(values) => {
                out.push('[');
                if values.is_empty() {
                    out.push(']');
                    return;
                }
                out.push_str(newline);
                for (i, v) in values.iter().enumerate() {
                    out.push_str(&" ".repeat(indent + 4));
                    v.write_pretty(out, indent + 4, newline);
                    if i + 1 != values.len() {
                        out.push(',');
                    }
                    out.push_str(newline);
                }
                out.push_str(&" ".repeat(indent));
                out.push(']');
            }
            ConfigValue::Object(map) => {
                out.push('{');
                if map.is_empty() {
                    out.push('}');
                    return;
                }
                out.push_str(newline);
                for (i, (k, v)) in map.iter().enumerate() {
                    out.push_str(&" ".repeat(indent + 4));
                    write_escaped_string_ascii(out, k);
                    out.push_str(": ");
                    v.write_pretty(out, indent + 4, newline);
                    if i + 1 != map.len() {
                        out.push(',');
                    }
                    out.push_str(newline);
                }
                out.push_str(&" ".repeat(indent));
                out.push('}');
            }
        }
    }

    fn write_compact(&self, out: &mut String) {
        match self {
            ConfigValue::Array(values) => {
                out.push('[');
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    v.write_compact(out);
                }
                out.push(']');
            }
            ConfigValue::Object(map) => {
                out.push('{');
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write_escaped_string(out, k);
                    out.push_str(": ");
                    v.write_compact(out);
                }
                out.push('}');
            }
            ConfigValue::String(s) => write_escaped_string(out, s),
            scalar => scalar.write_pretty(out, 0, statics::NL_LF),
        }
    }
}

/// Shortest round-trip digits, always with a fractional part or exponent so the value
/// reads back as a float. Exponent form below 1e-4 and from 1e16 up, padded to two digits.
fn write_float(out: &mut String, v: f64) {
    if v.is_nan() {
        out.push_str("NaN");
        return;
    }
    if v.is_infinite() {
        out.push_str(if v.is_sign_negative() { "-Infinity" } else { "Infinity" });
        return;
    }

    let sci = format!("{v:e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        out.push_str(&sci);
        return;
    };
    let Ok(exp) = exp.parse::<i32>() else {
        out.push_str(&sci);
        return;
    };

    if v != 0.0 && !(-4..16).contains(&exp) {
        out.push_str(mantissa);
        out.push('e');
        out.push(if exp < 0 { '-' } else { '+' });
        write!(out, "{:02}", exp.unsigned_abs()).ok();
        return;
    }

    let fixed = v.to_string();
    out.push_str(&fixed);
    if !fixed.contains('.') {
        out.push_str(".0");
    }
}

fn write_escaped_string(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                write!(out, "\\u{:04x}", c as u32).ok();
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn write_escaped_string_ascii(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            c if c.is_control() => {
                write!(out, "\\u{:04x}", c as u32).ok();
            }
            c if (c as u32) > 0x7F => {
                let cp = c as u32;
                if cp <= 0xFFFF {
                    write!(out, "\\u{:04x}", cp).ok();
                } else {
                    // Encode as UTF-16 surrogate pair.
                    let u = cp - 0x1_0000;
                    let high = 0xD800 + ((u >> 10) & 0x3FF);
                    let low = 0xDC00 + (u & 0x3FF);
                    write!(out, "\\u{:04x}\\u{:04x}", high, low).ok();
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

impl Serialize for ConfigValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ConfigValue::Null => serializer.serialize_unit(),
            ConfigValue::Bool(v) => serializer.serialize_bool(*v),
            ConfigValue::Number(n) => n.serialize(serializer),
            ConfigValue::String(s) => serializer.serialize_str(s),
            ConfigValue::Array(values) => values.serialize(serializer),
            ConfigValue::Object(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ConfigValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> de::Visitor<'de> for ValueVisitor {
            type Value = ConfigValue;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a JSON value")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(ConfigValue::Null)
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(ConfigValue::Null)
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(ConfigValue::Bool(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(ConfigValue::Number(Number::I64(v)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(ConfigValue::Number(Number::U64(v)))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(ConfigValue::Number(Number::F64(v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(ConfigValue::String(v.to_owned()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(ConfigValue::String(v))
            }

            fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut values = Vec::new();
                while let Some(value) = seq.next_element::<ConfigValue>()? {
                    values.push(value);
                }
                Ok(ConfigValue::Array(values))
            }

            fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut values = IndexMap::new();
                while let Some((key, value)) = map.next_entry::<String, ConfigValue>()? {
                    values.insert(key, value);
                }
                Ok(ConfigValue::Object(values))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigValue, Number};
    use crate::statics;
    use indexmap::IndexMap;

    fn float(v: f64) -> String {
        ConfigValue::Number(Number::F64(v)).to_pretty_json()
    }

    #[test]
    fn parse_keeps_integer_and_float_apart() {
        let v = ConfigValue::parse(r#"{ "a": 1, "b": 1.0 }"#).unwrap();
        let obj = v.as_object().unwrap();
        assert!(matches!(obj.get("a"), Some(ConfigValue::Number(n)) if !n.is_float() && n.as_i64() == Some(1)));
        assert!(matches!(obj.get("b"), Some(ConfigValue::Number(Number::F64(_)))));
    }

    #[test]
    fn parse_preserves_key_order() {
        let v = ConfigValue::parse(r#"{ "z": 1, "a": 2, "m": 3 }"#).unwrap();
        let keys: Vec<&str> = v.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn floats_follow_server_formatting() {
        assert_eq!(float(1.0), "1.0");
        assert_eq!(float(0.25), "0.25");
        assert_eq!(float(-3.0), "-3.0");
        assert_eq!(float(0.0001), "0.0001");
        assert_eq!(float(0.00001), "1e-05");
        assert_eq!(float(1.5e-7), "1.5e-07");
        assert_eq!(float(1e16), "1e+16");
        assert_eq!(float(123456789.5), "123456789.5");
        assert_eq!(float(f64::INFINITY), "Infinity");
    }

    #[test]
    fn empty_containers_stay_inline() {
        let mut map = IndexMap::new();
        map.insert("a".to_string(), ConfigValue::Object(IndexMap::new()));
        map.insert("b".to_string(), ConfigValue::Array(vec![]));
        let v = ConfigValue::Object(map);
        assert_eq!(v.to_pretty_json(), "{\n    \"a\": {},\n    \"b\": []\n}");
    }

    #[test]
    fn pretty_json_nests_with_four_spaces() {
        let v = ConfigValue::parse(r#"{"a": {"b": [1, true]}}"#).unwrap();
        assert_eq!(
            v.to_pretty_json_with_newline(statics::NL_CRLF),
            "{\r\n    \"a\": {\r\n        \"b\": [\r\n            1,\r\n            true\r\n        ]\r\n    }\r\n}"
        );
    }

    #[test]
    fn non_ascii_is_escaped_lowercase() {
        let v = ConfigValue::String("caf\u{00E9} 😀".to_string());
        assert_eq!(v.to_pretty_json(), "\"caf\\u00e9 \\ud83d\\ude00\"");
    }

    #[test]
    fn numbers_compare_numerically() {
        assert_eq!(Number::I64(5), Number::F64(5.0));
        assert_eq!(Number::U64(7), Number::I64(7));
        assert_ne!(Number::I64(5), Number::F64(5.5));
        assert_ne!(Number::I64(-1), Number::U64(u64::MAX));
        assert_eq!(Number::F64(f64::NAN), Number::F64(f64::NAN));
        assert_ne!(Number::F64(f64::NAN), Number::F64(1.0));
    }

    #[test]
    fn display_text_matches_entry_contents() {
        assert_eq!(ConfigValue::String("abc".into()).display_text(), "abc");
        assert_eq!(ConfigValue::Number(Number::F64(2.0)).display_text(), "2.0");
        assert_eq!(ConfigValue::Number(Number::I64(42)).display_text(), "42");
        assert_eq!(ConfigValue::Bool(false).display_text(), "false");
        let arr = ConfigValue::parse("[1, \"x\"]").unwrap();
        assert_eq!(arr.display_text(), "[1, \"x\"]");
    }

    #[test]
    fn child_indexes_objects_and_arrays() {
        let v = ConfigValue::parse(r#"{"list": [{"x": 1}]}"#).unwrap();
        let x = v.child("list").and_then(|l| l.child("0")).and_then(|e| e.child("x"));
        assert_eq!(x, Some(&ConfigValue::Number(Number::I64(1))));
        assert!(v.child("list").and_then(|l| l.child("1")).is_none());
        assert!(v.child("missing").is_none());
    }
}
