use std::collections::HashMap;

use numtoa::NumToA;

use crate::prelude::{fmt_err, InlineStr, SwfResult};

/// Dynamically typed value stored in workflow contexts, controls and step inputs. It mirrors the
/// JSON data model so it can cross the execution context / control / signal input boundaries.
#[derive(Clone, Debug, PartialEq)]
pub enum Object {
    Int(i32),
    Long(i64),
    Float(f64),
    Boolean(bool),
    String(InlineStr),
    Map(HashMap<InlineStr, Object>),
    List(Vec<Object>),
    Null,
}

impl Object {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> SwfResult<bool> {
        match self {
            Self::Boolean(v) => Ok(*v),
            _ => fmt_err!(IllegalArgument, "not a bool {:?}", self),
        }
    }

    pub fn as_string(&self) -> SwfResult<&InlineStr> {
        match self {
            Self::String(v) => Ok(v),
            _ => fmt_err!(IllegalArgument, "not a string {:?}", self),
        }
    }

    pub fn as_long(&self) -> SwfResult<i64> {
        match self {
            Self::Int(v) => Ok(*v as i64),
            Self::Long(v) => Ok(*v),
            _ => fmt_err!(IllegalArgument, "not an integer {:?}", self),
        }
    }

    pub fn as_list(&self) -> SwfResult<&Vec<Object>> {
        match self {
            Self::List(v) => Ok(v),
            _ => fmt_err!(IllegalArgument, "not a list {:?}", self),
        }
    }

    pub fn as_map(&self) -> SwfResult<&HashMap<InlineStr, Object>> {
        match self {
            Self::Map(v) => Ok(v),
            _ => fmt_err!(IllegalArgument, "not a map {:?}", self),
        }
    }

    /// Text form used when a value is substituted into a template (task lists, workflow ids).
    pub fn to_string(&self) -> InlineStr {
        match self {
            Object::Int(v) => (*v).numtoa_str(10, &mut [0; 16]).into(),
            Object::Long(v) => (*v).numtoa_str(10, &mut [0; 32]).into(),
            Object::Float(v) => format!("{}", v).into(),
            Object::Boolean(v) => {
                if *v {
                    "true".into()
                } else {
                    "false".into()
                }
            }
            Object::String(v) => v.clone(),
            Object::Map(v) => Self::convert_hashmap_to_json(v).to_string().into(),
            Object::List(v) => Self::convert_list_to_json(v).to_string().into(),
            Object::Null => "".into(),
        }
    }

    /// Canonical JSON text, stable for equal values. Used to compare values that cannot be hashed.
    pub fn canonical(&self) -> String {
        self.to_json().to_string()
    }
}

/// json <-> object
impl Object {
    pub fn convert_hashmap_to_json(hash_map: &HashMap<InlineStr, Object>) -> serde_json::Value {
        let mut map = serde_json::Map::with_capacity(hash_map.len());
        for (k, v) in hash_map {
            map.insert(k.to_string(), v.to_json());
        }
        serde_json::Value::Object(map)
    }

    fn convert_list_to_json(list: &[Object]) -> serde_json::Value {
        let mut json_list = Vec::with_capacity(list.len());
        for v in list {
            json_list.push(v.to_json());
        }
        serde_json::Value::Array(json_list)
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Object::Int(v) => serde_json::Value::Number((*v).into()),
            Object::Long(v) => serde_json::Value::Number((*v).into()),
            Object::Float(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Object::Boolean(v) => serde_json::Value::Bool(*v),
            Object::String(v) => serde_json::Value::String(v.to_string()),
            Object::Map(v) => Self::convert_hashmap_to_json(v),
            Object::List(v) => Self::convert_list_to_json(v),
            Object::Null => serde_json::Value::Null,
        }
    }

    pub fn convert_jsonmap_to_hashmap(
        jsonmap: &serde_json::Map<String, serde_json::Value>,
    ) -> HashMap<InlineStr, Object> {
        let mut map = HashMap::with_capacity(jsonmap.len());
        for (k, v) in jsonmap {
            map.insert(k.into(), Self::from_json(v));
        }
        map
    }

    pub fn from_json(json: &serde_json::Value) -> Object {
        match json {
            serde_json::Value::Bool(v) => (*v).into(),
            serde_json::Value::Number(v) => {
                if let Some(v) = v.as_i64() {
                    if v <= i32::MAX as i64 && v >= i32::MIN as i64 {
                        Object::Int(v as i32)
                    } else {
                        Object::Long(v)
                    }
                } else {
                    // u64 above i64::MAX or a real number
                    Object::Float(v.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(v) => v.into(),
            serde_json::Value::Object(v) => Object::Map(Self::convert_jsonmap_to_hashmap(v)),
            serde_json::Value::Array(v) => {
                Object::List(v.iter().map(Self::from_json).collect())
            }
            serde_json::Value::Null => Object::Null,
        }
    }
}

impl From<i32> for Object {
    fn from(value: i32) -> Self {
        Object::Int(value)
    }
}
impl From<i64> for Object {
    fn from(value: i64) -> Self {
        Object::Long(value)
    }
}
impl From<usize> for Object {
    fn from(value: usize) -> Self {
        if value <= i32::MAX as usize {
            Object::Int(value as i32)
        } else {
            Object::Long(value as i64)
        }
    }
}
impl From<u32> for Object {
    fn from(value: u32) -> Self {
        Object::from(value as usize)
    }
}
impl From<f64> for Object {
    fn from(value: f64) -> Self {
        Object::Float(value)
    }
}
impl From<bool> for Object {
    fn from(value: bool) -> Self {
        Object::Boolean(value)
    }
}
impl From<InlineStr> for Object {
    fn from(value: InlineStr) -> Self {
        Object::String(value)
    }
}
impl From<&InlineStr> for Object {
    fn from(value: &InlineStr) -> Self {
        Object::String(value.clone())
    }
}
impl From<&str> for Object {
    fn from(value: &str) -> Self {
        Object::String(InlineStr::from(value))
    }
}
impl From<&String> for Object {
    fn from(value: &String) -> Self {
        Object::String(InlineStr::from(value.as_str()))
    }
}
impl From<String> for Object {
    fn from(value: String) -> Self {
        Object::String(InlineStr::from(value))
    }
}
impl From<Vec<Object>> for Object {
    fn from(value: Vec<Object>) -> Self {
        Object::List(value)
    }
}
impl From<HashMap<InlineStr, Object>> for Object {
    fn from(value: HashMap<InlineStr, Object>) -> Self {
        Object::Map(value)
    }
}
impl From<&serde_json::Value> for Object {
    fn from(value: &serde_json::Value) -> Self {
        Object::from_json(value)
    }
}
