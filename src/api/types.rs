//! Wire types of the fleet API
//!
//! Car records are only partially modelled: the handful of fields the
//! crate reads are typed, everything else is kept in `extra` so a record
//! survives a round trip through the host API untouched.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// `{ "name": ... }` references used for brand, model and modification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedRef {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Latest live readings of one vehicle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Telemetry(pub Map<String, Value>);

impl Telemetry {
    /// Reading by key; an explicit `null` counts as absent
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(is_truthy)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(as_number)
    }
}

/// One vehicle as returned by `GET /car`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Car {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,

    #[serde(default, deserialize_with = "lenient")]
    pub brand: NamedRef,

    #[serde(default, deserialize_with = "lenient")]
    pub model: NamedRef,

    #[serde(default, deserialize_with = "lenient")]
    pub modification: NamedRef,

    #[serde(default, deserialize_with = "scalar_as_string")]
    pub numberplate: Option<String>,

    #[serde(default, deserialize_with = "scalar_as_string")]
    pub vin: Option<String>,

    /// Zero or one snapshot; the first object element is authoritative
    #[serde(default, deserialize_with = "telemetry_objects")]
    pub telematics: Vec<Telemetry>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Car {
    pub fn telemetry(&self) -> Option<&Telemetry> {
        self.telematics.first()
    }

    /// Reading from telemetry, falling back to the same key on the car record
    pub fn reading(&self, key: &str) -> Option<&Value> {
        self.telemetry()
            .and_then(|t| t.get(key))
            .or_else(|| self.extra.get(key).filter(|v| !v.is_null()))
    }

    /// Telemetry-only truthiness; missing telemetry or key is `false`
    pub fn telemetry_flag(&self, key: &str) -> bool {
        self.telemetry().is_some_and(|t| t.flag(key))
    }

    pub fn is_moving(&self) -> bool {
        self.telemetry_flag("moving")
    }

    pub fn is_charging(&self) -> bool {
        self.telemetry_flag("charging")
    }

    /// Identifier of the telematics unit, used for device commands
    pub fn imei(&self) -> Option<String> {
        match self.telemetry()?.get("imei")? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// A remote action offered for a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    pub command: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub fleet_view_group: i64,

    /// Command that undoes this one
    #[serde(default)]
    pub reverse: Option<i64>,
}

impl CommandDescriptor {
    /// Group 1 holds diagnostic/configuration commands
    pub fn is_diagnostic(&self) -> bool {
        self.fleet_view_group == 1
    }

    /// Reverse command id; `0` is treated as "none" like a missing value
    pub fn reverse_command(&self) -> Option<i64> {
        self.reverse.filter(|r| *r != 0)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CarsEnvelope {
    pub result: CarsPage,
}

/// Items stay raw so one malformed record can be skipped on its own
#[derive(Debug, Deserialize)]
pub(crate) struct CarsPage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommandsEnvelope {
    #[serde(default, deserialize_with = "null_as_default")]
    pub result: Vec<CommandDescriptor>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenBody {
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Loose truthiness used by the vendor payloads: zero, empty and null are
/// false, any non-empty string is true
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(serde_json::Number),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Any value that does not fit `T` becomes its default
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// Keep object elements only; a non-array value means no telemetry
fn telemetry_objects<'de, D>(deserializer: D) -> Result<Vec<Telemetry>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(Telemetry(map)),
            _ => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn car(value: Value) -> Car {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn numeric_and_string_ids_become_strings() {
        assert_eq!(car(json!({"id": 17})).id, "17");
        assert_eq!(car(json!({"id": "abc"})).id, "abc");
    }

    #[test]
    fn null_nested_fields_fall_back_to_defaults() {
        let c = car(json!({"id": 1, "brand": null, "telematics": null}));
        assert_eq!(c.brand.name, "");
        assert!(c.telemetry().is_none());
        assert!(!c.is_moving());
    }

    #[test]
    fn odd_field_types_do_not_fail_the_record() {
        let c = car(json!({
            "id": 1,
            "brand": "Lada",
            "vin": 123456,
            "numberplate": {"region": 77},
            "telematics": [null, {"moving": true}]
        }));
        assert_eq!(c.brand.name, "");
        assert_eq!(c.vin.as_deref(), Some("123456"));
        assert_eq!(c.numberplate, None);
        assert!(c.is_moving());

        let c = car(json!({"id": 2, "telematics": {"moving": true}}));
        assert!(c.telemetry().is_none());
    }

    #[test]
    fn reading_prefers_telemetry_then_car() {
        let c = car(json!({
            "id": 1,
            "battery": 40,
            "odometer": 1200,
            "telematics": [{"battery": 81, "odometer": null}]
        }));
        assert_eq!(c.reading("battery"), Some(&json!(81)));
        assert_eq!(c.reading("odometer"), Some(&json!(1200)));
        assert_eq!(c.reading("lat"), None);
    }

    #[test]
    fn only_first_telemetry_element_counts() {
        let c = car(json!({
            "id": 1,
            "telematics": [{"moving": false}, {"moving": true}]
        }));
        assert!(!c.is_moving());
    }

    #[test]
    fn imei_accepts_numbers_and_strings() {
        assert_eq!(
            car(json!({"id": 1, "telematics": [{"imei": 8612}]})).imei(),
            Some("8612".to_string())
        );
        assert_eq!(
            car(json!({"id": 1, "telematics": [{"imei": " 35 "}]})).imei(),
            Some("35".to_string())
        );
        assert_eq!(car(json!({"id": 1, "telematics": [{}]})).imei(), None);
    }

    #[test]
    fn unknown_fields_are_preserved() {
        let c = car(json!({"id": 1, "color": "white"}));
        let back = serde_json::to_value(&c).unwrap();
        assert_eq!(back["color"], json!("white"));
    }

    #[test]
    fn truthiness() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(!is_truthy(&json!(0)));
        assert!(is_truthy(&json!("0")));
        assert!(is_truthy(&json!("false")));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("yes")));
        assert!(!is_truthy(&Value::Null));
    }

    #[test]
    fn command_descriptor_defaults() {
        let d: CommandDescriptor =
            serde_json::from_value(json!({"command": 5, "title": "Open", "reverse": 0}))
                .unwrap();
        assert_eq!(d.fleet_view_group, 0);
        assert!(!d.is_diagnostic());
        assert_eq!(d.reverse_command(), None);
    }
}
