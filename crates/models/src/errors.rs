use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },
    #[error("alias '{0}' collides with an operation of the same name")]
    AliasCollision(String),
    #[error("alias '{alias}' references unknown operation '{target}'")]
    UnknownAliasTarget { alias: String, target: String },
    #[error("parse error: {0}")]
    Parse(String),
}
