//! Prompt schemas as plain data.
//!
//! A `Signature` names the input fields sent to the model and the output
//! fields expected back. `Prediction` reads those outputs leniently: models
//! routinely return numbers as strings, scalars where lists were asked for,
//! or omit fields altogether.

use serde_json::{Map, Value};

/// Expected JSON shape of an output field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    TextList,
    Number,
    Flag,
    Records,
}

impl FieldKind {
    fn json_type(&self) -> &'static str {
        match self {
            FieldKind::Text => "string",
            FieldKind::TextList => "array of strings",
            FieldKind::Number => "number between 0 and 1",
            FieldKind::Flag => "boolean",
            FieldKind::Records => "array of objects",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub desc: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn input(name: &'static str, desc: &'static str) -> Self {
        Self {
            name,
            desc,
            kind: FieldKind::Text,
        }
    }

    pub const fn output(name: &'static str, kind: FieldKind, desc: &'static str) -> Self {
        Self { name, desc, kind }
    }
}

/// A named task: instructions plus input and output field lists.
#[derive(Debug, Clone, Copy)]
pub struct Signature {
    pub name: &'static str,
    pub instructions: &'static str,
    pub inputs: &'static [FieldSpec],
    pub outputs: &'static [FieldSpec],
}

impl Signature {
    /// Renders the user prompt. Inputs not supplied are sent as empty strings.
    pub fn render_prompt(&self, inputs: &[(&str, String)]) -> String {
        let mut prompt = String::new();
        prompt.push_str(self.instructions.trim());
        prompt.push_str("\n\nINPUTS:\n");

        for field in self.inputs {
            let value = inputs
                .iter()
                .find(|(name, _)| *name == field.name)
                .map(|(_, v)| v.as_str())
                .unwrap_or("");
            prompt.push_str(&format!(
                "\n{} ({}):\n<<<\n{}\n>>>\n",
                field.name, field.desc, value
            ));
        }

        prompt.push_str("\nRespond with a single JSON object containing exactly these fields:\n");
        for field in self.outputs {
            prompt.push_str(&format!(
                "- \"{}\" ({}): {}\n",
                field.name,
                field.kind.json_type(),
                field.desc
            ));
        }

        prompt
    }
}

/// Structured output of one model call.
#[derive(Debug, Clone, Default)]
pub struct Prediction {
    fields: Map<String, Value>,
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(stringify)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        other => Some(other.to_string()),
    }
}

impl Prediction {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Any non-object value yields an empty prediction.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }

    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    /// Field as text; non-string values are stringified.
    pub fn text(&self, name: &str) -> Option<String> {
        self.raw(name).and_then(stringify)
    }

    /// Field as a list of strings; a scalar becomes a one-element list.
    pub fn text_list(&self, name: &str) -> Vec<String> {
        match self.raw(name) {
            Some(Value::Array(items)) => items.iter().filter_map(stringify).collect(),
            Some(other) => stringify(other).into_iter().collect(),
            None => Vec::new(),
        }
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.raw(name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.raw(name)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" => Some(true),
                "false" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Field as a list of objects. Bare strings become `{"url": s}`.
    pub fn records(&self, name: &str) -> Vec<Map<String, Value>> {
        let to_record = |v: &Value| match v {
            Value::Object(map) => Some(map.clone()),
            Value::String(s) => {
                let mut map = Map::new();
                map.insert("url".to_string(), Value::String(s.clone()));
                Some(map)
            }
            _ => None,
        };

        match self.raw(name) {
            Some(Value::Array(items)) => items.iter().filter_map(to_record).collect(),
            Some(other) => to_record(other).into_iter().collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DEMO: Signature = Signature {
        name: "demo",
        instructions: "Summarize the caption.",
        inputs: &[
            FieldSpec::input("caption", "Original caption"),
            FieldSpec::input("platform", "Source platform"),
        ],
        outputs: &[
            FieldSpec::output("summary", FieldKind::Text, "Two sentences"),
            FieldSpec::output("topics", FieldKind::TextList, "Key topics"),
        ],
    };

    #[test]
    fn test_render_prompt_lists_inputs_and_outputs() {
        let prompt = DEMO.render_prompt(&[("caption", "Sunset over Lisbon".to_string())]);
        assert!(prompt.starts_with("Summarize the caption."));
        assert!(prompt.contains("caption (Original caption):\n<<<\nSunset over Lisbon\n>>>"));
        assert!(prompt.contains("platform (Source platform):\n<<<\n\n>>>"));
        assert!(prompt.contains("- \"summary\" (string): Two sentences"));
        assert!(prompt.contains("- \"topics\" (array of strings): Key topics"));
    }

    #[test]
    fn test_text_stringifies_non_strings() {
        let p = Prediction::from_value(json!({
            "title": "  A title ",
            "count": 3,
            "flag": true,
            "list": ["a", "b"],
            "missing": null
        }));
        assert_eq!(p.text("title").as_deref(), Some("  A title "));
        assert_eq!(p.text("count").as_deref(), Some("3"));
        assert_eq!(p.text("flag").as_deref(), Some("true"));
        assert_eq!(p.text("list").as_deref(), Some("a, b"));
        assert_eq!(p.text("missing"), None);
        assert_eq!(p.text("absent"), None);
    }

    #[test]
    fn test_text_list_wraps_scalars() {
        let p = Prediction::from_value(json!({"one": "bmw", "many": ["bmw", 3, null]}));
        assert_eq!(p.text_list("one"), vec!["bmw"]);
        assert_eq!(p.text_list("many"), vec!["bmw", "3"]);
        assert!(p.text_list("absent").is_empty());
    }

    #[test]
    fn test_number_and_flag_parse_strings() {
        let p = Prediction::from_value(json!({
            "a": 0.7, "b": "0.4", "c": "high", "t": "True", "f": false
        }));
        assert_eq!(p.number("a"), Some(0.7));
        assert_eq!(p.number("b"), Some(0.4));
        assert_eq!(p.number("c"), None);
        assert_eq!(p.flag("t"), Some(true));
        assert_eq!(p.flag("f"), Some(false));
        assert_eq!(p.flag("c"), None);
    }

    #[test]
    fn test_records_accept_objects_and_strings() {
        let p = Prediction::from_value(json!({
            "images": [{"url": "https://a/1.jpg", "width": 1080}, "https://a/2.jpg", 5]
        }));
        let records = p.records("images");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["width"], 1080);
        assert_eq!(records[1]["url"], "https://a/2.jpg");
    }

    #[test]
    fn test_non_object_prediction_is_empty() {
        let p = Prediction::from_value(json!(["not", "an", "object"]));
        assert_eq!(p.text("anything"), None);
    }
}
