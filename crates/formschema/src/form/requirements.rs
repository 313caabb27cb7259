use formschema_core::Schema;
use serde_json::Value;

use crate::field::FieldCursor;

pub const OPTION_HELP: &str = "help";
pub const OPTION_MIN_LENGTH: &str = "min_length";
pub const OPTION_MAX_LENGTH: &str = "max_length";
pub const OPTION_PATTERN: &str = "pattern";
pub const OPTION_MIN: &str = "min";
pub const OPTION_MAX: &str = "max";

/// Adds value constraints to a schema built for a field.
pub trait RequirementsDescriber {
    fn describe(&self, schema: &mut Schema, field: &FieldCursor<'_>);
}

/// Copies constraint options and the help text onto the schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintRequirementsDescriber;

impl RequirementsDescriber for ConstraintRequirementsDescriber {
    fn describe(&self, schema: &mut Schema, field: &FieldCursor<'_>) {
        let field = field.field();

        if let Some(help) = field.option_str(OPTION_HELP) {
            schema.append_description(help);
        }
        if let Some(min_length) = length_option(field.option(OPTION_MIN_LENGTH)) {
            schema.min_length = Some(min_length);
        }
        if let Some(max_length) = length_option(field.option(OPTION_MAX_LENGTH)) {
            schema.max_length = Some(max_length);
        }
        if let Some(pattern) = field.option_str(OPTION_PATTERN) {
            schema.pattern = Some(pattern.to_string());
        }
        if let Some(min) = field.option(OPTION_MIN).and_then(Value::as_f64) {
            schema.minimum = Some(min);
        }
        if let Some(max) = field.option(OPTION_MAX).and_then(Value::as_f64) {
            schema.maximum = Some(max);
        }
    }
}

fn length_option(value: Option<&Value>) -> Option<usize> {
    value
        .and_then(Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
}
