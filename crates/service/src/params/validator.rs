use models::{OperationRef, ServiceConfig, ValueType};
use serde::Serialize;
use serde_json::{Map, Value};

use super::mapping::{ParameterMap, ParameterSpec};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Missing required parameters become warnings (alias presets may leave
    /// some for the caller).
    pub partial: bool,
    /// Unknown parameters become errors instead of warnings.
    pub strict: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub missing: Vec<String>,
    pub extra: Vec<String>,
}

impl ValidationReport {
    fn finish(mut self) -> Self {
        self.valid = self.errors.is_empty();
        self
    }
}

pub struct ParameterValidator;

impl ParameterValidator {
    pub fn validate_arguments(
        op: OperationRef<'_>,
        args: &Map<String, Value>,
        opts: ValidationOptions,
    ) -> ValidationReport {
        let params = ParameterMap::build(op);
        Self::validate_against(&params, args, opts)
    }

    pub fn validate_against(
        params: &ParameterMap,
        args: &Map<String, Value>,
        opts: ValidationOptions,
    ) -> ValidationReport {
        let mut report = ValidationReport { warnings: params.warnings().to_vec(), ..Default::default() };

        for name in params.required() {
            if args.get(name).map_or(true, Value::is_null) {
                report.missing.push(name.to_string());
                let msg = format!("missing required parameter '{name}'");
                if opts.partial {
                    report.warnings.push(msg);
                } else {
                    report.errors.push(msg);
                }
            }
        }

        for (name, value) in args {
            match params.get(name) {
                Some(spec) => check_schema(name, spec, value, &mut report.errors),
                None => {
                    report.extra.push(name.clone());
                    let msg = format!("unknown parameter '{name}'");
                    if opts.strict {
                        report.errors.push(msg);
                    } else {
                        report.warnings.push(msg);
                    }
                }
            }
        }

        report.finish()
    }

    /// Check every alias of a service against its target in partial mode.
    pub fn validate_aliases(service: &ServiceConfig, strict: bool) -> Vec<(String, ValidationReport)> {
        service
            .aliases
            .iter()
            .filter_map(|alias| {
                let op = service.operation(&alias.endpoint)?;
                let report = Self::validate_arguments(op, &alias.args, ValidationOptions { partial: true, strict });
                Some((alias.name.clone(), report))
            })
            .collect()
    }
}

fn check_schema(name: &str, spec: &ParameterSpec, value: &Value, errors: &mut Vec<String>) {
    let Some(schema) = &spec.schema else { return };
    if value.is_null() {
        return;
    }
    if let Some(expected) = schema.value_type {
        if !expected.matches(value) {
            errors.push(format!(
                "parameter '{name}' expected {}, got {}",
                expected.as_str(),
                ValueType::describe(value)
            ));
            return;
        }
    }
    if let Some(allowed) = &schema.allowed {
        if !allowed.contains(value) {
            let options: Vec<String> = allowed.iter().map(Value::to_string).collect();
            errors.push(format!("parameter '{name}' must be one of [{}], got {value}", options.join(", ")));
        }
    }
}
