use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unrecognized command key {0:?}")]
    Invalid(char),
    #[error("key has no command character")]
    NonCharacterKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("{name} must be greater than zero")]
    ZeroInterval { name: &'static str },
    #[error("invalid log filter {filter:?}: {message}")]
    InvalidLogFilter { filter: String, message: String },
}
