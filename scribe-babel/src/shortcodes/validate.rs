//! Attribute validation against a descriptor's schema

use super::{AttributeType, Attributes, ShortcodeDescriptor};
use thiserror::Error;

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttributeError {
    #[error("attribute '{attribute}' is required")]
    Missing { attribute: String },
    #[error("attribute '{attribute}' must be a number, got '{value}'")]
    NotANumber { attribute: String, value: String },
    #[error("attribute '{attribute}' = {value} is outside {min:?}..={max:?}")]
    OutOfRange {
        attribute: String,
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
    },
    #[error("attribute '{attribute}' = '{value}' is not one of {options:?}")]
    NotAnOption {
        attribute: String,
        value: String,
        options: Vec<String>,
    },
}

/// Check `attributes` against the schema, collecting every violation.
pub(super) fn validate(
    descriptor: &ShortcodeDescriptor,
    attributes: &Attributes,
) -> Result<(), Vec<AttributeError>> {
    let mut errors = Vec::new();
    for (name, spec) in &descriptor.attributes {
        let value = attributes
            .get(name)
            .filter(|v| !v.is_empty())
            .or(spec.default.as_deref());
        let Some(value) = value else {
            if spec.required {
                errors.push(AttributeError::Missing {
                    attribute: name.clone(),
                });
            }
            continue;
        };

        match spec.kind {
            AttributeType::Number => match value.trim().parse::<f64>() {
                Ok(number) => {
                    let below = spec.min.is_some_and(|min| number < min);
                    let above = spec.max.is_some_and(|max| number > max);
                    if below || above {
                        errors.push(AttributeError::OutOfRange {
                            attribute: name.clone(),
                            value: number,
                            min: spec.min,
                            max: spec.max,
                        });
                    }
                }
                Err(_) => errors.push(AttributeError::NotANumber {
                    attribute: name.clone(),
                    value: value.to_string(),
                }),
            },
            AttributeType::Select if !spec.options.is_empty() => {
                if !spec.options.iter().any(|option| option == value) {
                    errors.push(AttributeError::NotAnOption {
                        attribute: name.clone(),
                        value: value.to_string(),
                        options: spec.options.clone(),
                    });
                }
            }
            _ => {}
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
