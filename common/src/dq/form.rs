//! UI-renderable form-parameter descriptors.
//!
//! Every visible rule input entry becomes exactly one [`PluginParams`]. The
//! management UI renders the JSON array produced by [`JsonEncoding::encode`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event tag attached to fields that notify the UI when they change
pub const CHANGE: &str = "change";
/// Rendering size used by all generated fields
pub const SMALL: &str = "small";
/// Props `type` hint that turns an input into a multi-line text area
pub const TEXTAREA: &str = "textarea";

const GROUP_FONT_SIZE: u32 = 20;

/// A selectable option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamsOptions {
    pub label: String,
    pub value: Value,
    #[serde(default)]
    pub disabled: bool,
}

impl ParamsOptions {
    pub fn new(label: impl Into<String>, value: impl Into<Value>, disabled: bool) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            disabled,
        }
    }
}

/// Client-side validation rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validate {
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "type")]
    pub data_type: Option<String>,
    pub trigger: Option<String>,
}

impl Validate {
    pub fn required(required: bool) -> Self {
        Self {
            required,
            data_type: Some("string".to_string()),
            trigger: Some("blur".to_string()),
        }
    }
}

/// One form-parameter descriptor, tagged by its form-element type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PluginParams {
    Input(InputParam),
    Select(SelectParam),
    Group(GroupParam),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InputParamProps {
    pub disabled: Option<bool>,
    pub size: Option<String>,
    /// `textarea` for multi-line inputs, absent for single-line ones
    #[serde(rename = "type")]
    pub input_type: Option<String>,
    pub rows: Option<u32>,
    pub placeholder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputParam {
    pub field: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    pub value: Option<Value>,
    pub validate: Option<Vec<Validate>>,
    pub emit: Option<Vec<String>>,
    pub props: Option<InputParamProps>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SelectParamProps {
    pub size: Option<String>,
    pub placeholder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectParam {
    pub field: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    pub value: Option<Value>,
    pub options: Option<Vec<ParamsOptions>>,
    pub validate: Option<Vec<Validate>>,
    pub emit: Option<Vec<String>>,
    pub props: Option<SelectParamProps>,
}

/// Props of a group. `rules` holds the stored child definitions unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupParamsProps {
    #[serde(default)]
    pub rules: Vec<Value>,
    #[serde(rename = "fontSize")]
    pub font_size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupParam {
    pub field: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    pub validate: Option<Vec<Validate>>,
    pub emit: Option<Vec<String>>,
    pub props: Option<GroupParamsProps>,
}

/// Shared attributes every generated descriptor carries
#[derive(Debug, Clone)]
pub struct ParamBase {
    pub field: String,
    pub title: String,
    pub required: bool,
    pub emit: bool,
}

impl ParamBase {
    fn validate(&self) -> Option<Vec<Validate>> {
        Some(vec![Validate::required(self.required)])
    }

    fn emit(&self) -> Option<Vec<String>> {
        self.emit.then(|| vec![CHANGE.to_string()])
    }
}

impl InputParam {
    /// Single-line text field
    pub fn text(
        base: &ParamBase,
        disabled: bool,
        value: Option<String>,
        placeholder: Option<String>,
    ) -> Self {
        Self::build(base, disabled, value, placeholder, None, 2)
    }

    /// Multi-line text area
    pub fn textarea(
        base: &ParamBase,
        disabled: bool,
        value: Option<String>,
        placeholder: Option<String>,
    ) -> Self {
        Self::build(base, disabled, value, placeholder, Some(TEXTAREA), 1)
    }

    fn build(
        base: &ParamBase,
        disabled: bool,
        value: Option<String>,
        placeholder: Option<String>,
        input_type: Option<&str>,
        rows: u32,
    ) -> Self {
        Self {
            field: base.field.clone(),
            name: base.field.clone(),
            title: base.title.clone(),
            value: value.map(Value::String),
            validate: base.validate(),
            emit: base.emit(),
            props: Some(InputParamProps {
                disabled: Some(disabled),
                size: Some(SMALL.to_string()),
                input_type: input_type.map(str::to_string),
                rows: Some(rows),
                placeholder,
            }),
        }
    }
}

impl SelectParam {
    pub fn new(
        base: &ParamBase,
        options: Option<Vec<ParamsOptions>>,
        value: Option<String>,
        placeholder: Option<String>,
    ) -> Self {
        Self {
            field: base.field.clone(),
            name: base.field.clone(),
            title: base.title.clone(),
            value: value.map(Value::String),
            options,
            validate: base.validate(),
            emit: base.emit(),
            props: Some(SelectParamProps {
                size: Some(SMALL.to_string()),
                placeholder,
            }),
        }
    }
}

impl GroupParam {
    pub fn new(base: &ParamBase, rules: Vec<Value>) -> Self {
        Self {
            field: base.field.clone(),
            name: base.field.clone(),
            title: base.title.clone(),
            validate: base.validate(),
            emit: base.emit(),
            props: Some(GroupParamsProps {
                rules,
                font_size: Some(GROUP_FONT_SIZE),
            }),
        }
    }
}

/// JSON encoder settings, passed by value to each encode call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonEncoding {
    pub omit_null_fields: bool,
}

impl JsonEncoding {
    pub const fn omit_nulls() -> Self {
        Self {
            omit_null_fields: true,
        }
    }

    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, serde_json::Error> {
        let mut json = serde_json::to_value(value)?;
        if self.omit_null_fields {
            strip_null_fields(&mut json);
        }
        serde_json::to_string(&json)
    }
}

/// Remove every object member whose value is null, recursively
fn strip_null_fields(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_null_fields);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_null_fields),
        _ => {}
    }
}

/// Parse a raw JSON list stored in a metadata column.
///
/// Absent or blank input is an empty list. Malformed input is logged and
/// also treated as an empty list.
pub fn parse_json_list<T: DeserializeOwned>(raw: Option<&str>, kind: &str) -> Vec<T> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Vec::new();
    };

    match serde_json::from_str::<Vec<T>>(raw) {
        Ok(list) => list,
        Err(e) => {
            tracing::warn!(error = %e, kind = kind, "Failed to parse JSON list, using empty list");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base(emit: bool) -> ParamBase {
        ParamBase {
            field: "threshold".to_string(),
            title: "Threshold".to_string(),
            required: true,
            emit,
        }
    }

    #[test]
    fn test_input_param_shape() {
        let param = PluginParams::Input(InputParam::text(&base(false), false, None, None));
        let json: Value =
            serde_json::from_str(&JsonEncoding::omit_nulls().encode(&param).unwrap()).unwrap();

        assert_eq!(json["type"], "input");
        assert_eq!(json["field"], "threshold");
        assert_eq!(json["name"], "threshold");
        assert_eq!(json["props"]["disabled"], false);
        assert_eq!(json["props"]["rows"], 2);
        assert_eq!(json["validate"][0]["required"], true);
        assert_eq!(json["validate"][0]["trigger"], "blur");
        assert!(json.get("emit").is_none());
        assert!(json.get("value").is_none());
        assert!(json["props"].get("type").is_none());
    }

    #[test]
    fn test_textarea_differs_only_in_render_hint() {
        let area = InputParam::textarea(&base(true), true, Some("x".into()), None);
        let props = area.props.as_ref().unwrap();
        assert_eq!(props.input_type.as_deref(), Some(TEXTAREA));
        assert_eq!(props.rows, Some(1));
        assert_eq!(area.emit, Some(vec![CHANGE.to_string()]));

        let text = InputParam::text(&base(true), true, None, None);
        assert_eq!(text.props.as_ref().unwrap().input_type, None);
    }

    #[test]
    fn test_default_encoding_keeps_nulls() {
        let param = PluginParams::Input(InputParam::text(&base(false), false, None, None));
        let json: Value =
            serde_json::from_str(&JsonEncoding::default().encode(&param).unwrap()).unwrap();
        assert!(json.get("emit").unwrap().is_null());
    }

    #[test]
    fn test_strip_null_fields_keeps_array_elements() {
        let mut value = json!({"a": null, "b": [null, {"c": null, "d": 1}]});
        strip_null_fields(&mut value);
        assert_eq!(value, json!({"b": [null, {"d": 1}]}));
    }

    #[test]
    fn test_parse_json_list_is_lenient() {
        let options: Vec<ParamsOptions> =
            parse_json_list(Some(r#"[{"label":"A","value":1}]"#), "options");
        assert_eq!(options, vec![ParamsOptions::new("A", 1, false)]);

        let empty: Vec<ParamsOptions> = parse_json_list(Some("  "), "options");
        assert!(empty.is_empty());

        let broken: Vec<ParamsOptions> = parse_json_list(Some("{not json"), "options");
        assert!(broken.is_empty());
    }

    #[test]
    fn test_group_keeps_nested_rules_verbatim() {
        let raw = r#"[{"type":"input","field":"src","title":"Source","props":{"rows":2}},
                      {"type":"radio","field":"mode","options":[{"label":"A","value":"a"}]},
                      {"type":"select","field":"op","title":"Op",
                       "props":{"size":"small","multiple":true,"clearable":true}}]"#;
        let rules: Vec<Value> = parse_json_list(Some(raw), "group rules");
        assert_eq!(rules.len(), 3);

        let group = PluginParams::Group(GroupParam::new(&base(false), rules));
        let json: Value =
            serde_json::from_str(&JsonEncoding::omit_nulls().encode(&group).unwrap()).unwrap();
        let nested = &json["props"]["rules"];

        assert_eq!(nested[1]["type"], "radio");
        assert_eq!(nested[1]["options"][0]["value"], "a");
        assert_eq!(
            nested[2],
            json!({"type":"select","field":"op","title":"Op",
                   "props":{"size":"small","multiple":true,"clearable":true}})
        );
        assert!(nested[2].get("name").is_none());
        assert_eq!(json["props"]["fontSize"], 20);
    }
}
