use thiserror::Error;

/// Errors reported to the control context.
///
/// The audio path never returns these; it degrades to passing input through.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AutomationError {
    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),

    #[error("envelope command queue is full")]
    QueueFull,

    #[error("controller is already bound to a node")]
    AlreadyBound,
}

pub type Result<T> = std::result::Result<T, AutomationError>;
