use swf_common::prelude::*;

/// Bookkeeping attached to every scheduled activity or child workflow and echoed back by the
/// service on the scheduling event. It is the only link between a history event and the step that
/// produced it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Control {
    pub step_number: Option<usize>,
    pub retry: Option<u32>,
    pub partition: Option<Object>,
    pub key: Option<InlineStr>,
    pub extra: HashMap<InlineStr, Object>,
}

impl Control {
    const STEP_NUMBER: &'static str = "step_number";
    const RETRY: &'static str = "retry";
    const PARTITION: &'static str = "partition";
    const KEY: &'static str = "key";

    pub fn new(step_number: usize, retry: u32) -> Self {
        Self {
            step_number: Some(step_number),
            retry: Some(retry),
            ..Default::default()
        }
    }

    pub fn decode(text: &str) -> SwfResult<Self> {
        let value = serde_json::from_str::<serde_json::Value>(text)
            .map_err(|e| ErrorCode::InvalidControl(format!("invalid control '{}': {}", text, e)))?;
        let map = match value {
            serde_json::Value::Object(map) => map,
            other => return fmt_err!(InvalidControl, "control must be an object, got {}", other),
        };

        let mut control = Self::default();
        for (k, v) in &map {
            match k.as_str() {
                Self::STEP_NUMBER => {
                    let number = v.as_u64().ok_or_else(|| {
                        ErrorCode::InvalidControl(format!("invalid step_number {}", v))
                    })?;
                    control.step_number = Some(number as usize);
                }
                Self::RETRY => {
                    let retry = v
                        .as_u64()
                        .ok_or_else(|| ErrorCode::InvalidControl(format!("invalid retry {}", v)))?;
                    control.retry = Some(retry.min(u32::MAX as u64) as u32);
                }
                Self::PARTITION => {
                    if !v.is_null() {
                        control.partition = Some(Object::from_json(v));
                    }
                }
                Self::KEY => match v {
                    serde_json::Value::String(s) => control.key = Some(s.into()),
                    serde_json::Value::Null => {}
                    _ => return fmt_err!(InvalidControl, "invalid key {}", v),
                },
                _ => {
                    control.extra.insert(k.into(), Object::from_json(v));
                }
            }
        }
        Ok(control)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (k, v) in &self.extra {
            map.insert(k.to_string(), v.to_json());
        }
        if let Some(number) = self.step_number {
            map.insert(Self::STEP_NUMBER.to_string(), number.into());
        }
        if let Some(retry) = self.retry {
            map.insert(Self::RETRY.to_string(), retry.into());
        }
        if let Some(partition) = &self.partition {
            map.insert(Self::PARTITION.to_string(), partition.to_json());
        }
        if let Some(key) = &self.key {
            map.insert(Self::KEY.to_string(), key.as_str().into());
        }
        serde_json::Value::Object(map)
    }

    pub fn encode(&self) -> String {
        self.to_json().to_string()
    }

    pub fn step_number(&self) -> SwfResult<usize> {
        self.step_number
            .ok_or_else(|| ErrorCode::InvalidControl("control has no step_number"))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decode_keeps_unknown_fields() {
        let control =
            Control::decode(r#"{"step_number": 2, "retry": 1, "partition": "B", "owner": "ops"}"#)
                .unwrap();
        assert_eq!(control.step_number().unwrap(), 2);
        assert_eq!(control.retry, Some(1));
        assert_eq!(control.partition, Some(Object::from("B")));
        assert_eq!(control.extra.get("owner"), Some(&Object::from("ops")));
        assert_eq!(
            control.to_json(),
            json!({"step_number": 2, "retry": 1, "partition": "B", "owner": "ops"})
        );
    }

    #[test]
    fn malformed_control() {
        let err = Control::decode("not json").unwrap_err();
        assert_eq!(err.code(), ErrorCode::invalid_control_code());
        let err = Control::decode(r#"{"step_number": -1}"#).unwrap_err();
        assert_eq!(err.code(), ErrorCode::invalid_control_code());
        let control = Control::decode("{}").unwrap();
        assert!(control.step_number().is_err());
    }
}
