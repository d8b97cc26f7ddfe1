//! Template answer validation (C11, §4.11): a closed sum of widget
//! kinds crossed with input kinds, each with explicit per-variant rules
//! (replacing the dynamically-typed widget dispatch of the original).

use crate::error::TemplateFieldError;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WidgetType {
    Text,
    Paragraph,
    CheckboxList,
    RadioList,
    SectionHeader,
    PageBreak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Any,
    Integer,
    Float,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateItem {
    pub id: String,
    pub widget_type: WidgetType,
    #[serde(default = "default_input_type")]
    pub input_type: InputType,
    pub title: String,
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default)]
    pub required: bool,
}

fn default_input_type() -> InputType {
    InputType::Any
}

#[derive(Debug, Clone, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub items: Vec<TemplateItem>,
}

fn validate_numeric(item: &TemplateItem, value: &str) -> Option<String> {
    match item.input_type {
        InputType::Integer if value.parse::<i64>().is_err() => {
            Some(format!("'{value}' is not a valid integer"))
        }
        InputType::Float if value.parse::<f64>().is_err() => {
            Some(format!("'{value}' is not a valid float"))
        }
        _ => None,
    }
}

/// Validate one item's answer values. Never mutates `item` or `values`;
/// an empty result means the answer is acceptable to submit.
pub fn validate_item(item: &TemplateItem, values: &[String]) -> Vec<TemplateFieldError> {
    let mut errors = Vec::new();
    let err = |message: String| TemplateFieldError {
        item_id: item.id.clone(),
        message,
    };

    match item.widget_type {
        WidgetType::SectionHeader | WidgetType::PageBreak => {}
        WidgetType::Text | WidgetType::Paragraph => {
            let value = values.first().map(|s| s.as_str()).unwrap_or("");
            if item.required && value.is_empty() {
                errors.push(err("a value is required".into()));
            } else if !value.is_empty() {
                if let Some(message) = validate_numeric(item, value) {
                    errors.push(err(message));
                }
            }
        }
        WidgetType::CheckboxList => {
            if item.required && values.is_empty() {
                errors.push(err("at least one selection is required".into()));
            }
            for v in values {
                if !item.choices.contains(v) {
                    errors.push(err(format!("'{v}' is not one of the allowed choices")));
                }
            }
        }
        WidgetType::RadioList => {
            if values.len() != 1 {
                if item.required || !values.is_empty() {
                    errors.push(err("exactly one selection is required".into()));
                }
            } else if !item.choices.contains(&values[0]) {
                errors.push(err(format!(
                    "'{}' is not one of the allowed choices",
                    values[0]
                )));
            }
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_item(required: bool, input_type: InputType) -> TemplateItem {
        TemplateItem {
            id: "q1".into(),
            widget_type: WidgetType::Text,
            input_type,
            title: "Age".into(),
            choices: vec![],
            required,
        }
    }

    #[test]
    fn required_text_rejects_empty() {
        let item = text_item(true, InputType::Any);
        let errors = validate_item(&item, &[]);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn integer_input_type_rejects_non_numeric() {
        let item = text_item(false, InputType::Integer);
        let errors = validate_item(&item, &["abc".to_string()]);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn integer_input_type_accepts_numeric() {
        let item = text_item(false, InputType::Integer);
        let errors = validate_item(&item, &["42".to_string()]);
        assert!(errors.is_empty());
    }

    #[test]
    fn section_header_is_never_validated() {
        let item = TemplateItem {
            id: "h1".into(),
            widget_type: WidgetType::SectionHeader,
            input_type: InputType::Any,
            title: "Section".into(),
            choices: vec![],
            required: true,
        };
        assert!(validate_item(&item, &[]).is_empty());
    }

    #[test]
    fn checkbox_list_rejects_choice_not_in_list() {
        let item = TemplateItem {
            id: "c1".into(),
            widget_type: WidgetType::CheckboxList,
            input_type: InputType::Any,
            title: "Pick".into(),
            choices: vec!["a".into(), "b".into()],
            required: false,
        };
        let errors = validate_item(&item, &["c".to_string()]);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn radio_list_requires_exactly_one_value() {
        let item = TemplateItem {
            id: "r1".into(),
            widget_type: WidgetType::RadioList,
            input_type: InputType::Any,
            title: "Pick one".into(),
            choices: vec!["a".into(), "b".into()],
            required: true,
        };
        assert_eq!(validate_item(&item, &[]).len(), 1);
        assert!(validate_item(&item, &["a".to_string()]).is_empty());
    }
}
