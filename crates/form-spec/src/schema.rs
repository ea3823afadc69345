use serde_json::Value;

use crate::spec::form::FormSpec;

/// JSON Schema describing a form declaration document.
pub fn form_schema() -> Value {
    serde_json::to_value(schemars::schema_for!(FormSpec)).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_describes_steps() {
        let schema = form_schema();
        let props = schema["properties"].as_object().expect("properties");
        assert!(props.contains_key("steps"));
        assert!(props.contains_key("id"));
    }
}
