use thiserror::Error;

use crate::identity::{GroupId, TargetId};
use crate::listener::{ListenerId, PointerStream};

pub type Result<T> = std::result::Result<T, DragError>;

/// The host could not resolve an element's bounding box.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeasureError {
    #[error("target {0} is not mounted")]
    Unmounted(TargetId),

    #[error("bounds of target {0} are not finite")]
    NonFinite(TargetId),
}

/// A global pointer listener could not be registered or removed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListenerError {
    #[error("pointer source refused a {stream} listener")]
    Refused { stream: PointerStream },

    #[error("listener {0} is not registered")]
    Unknown(ListenerId),
}

/// Invalid or unreadable [`DragConfig`](crate::config::DragConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid drag config: {message}")]
    Invalid { message: String },

    #[cfg(feature = "config")]
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "config")]
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[cfg(feature = "config")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

/// Top-level error for dragline operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DragError {
    #[error(transparent)]
    Measure(#[from] MeasureError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("drag machine for group `{group}` was released")]
    Released { group: GroupId },
}

impl DragError {
    #[must_use]
    pub fn released(group: &GroupId) -> Self {
        Self::Released {
            group: group.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_error_message_names_target() {
        let error = DragError::from(MeasureError::Unmounted(TargetId::new(7)));
        assert_eq!(error.to_string(), "target #7 is not mounted");
    }

    #[test]
    fn released_error_names_group() {
        let error = DragError::released(&GroupId::new("cards"));
        assert_eq!(
            error.to_string(),
            "drag machine for group `cards` was released"
        );
    }

    #[test]
    fn listener_error_names_stream() {
        let error = ListenerError::Refused {
            stream: PointerStream::Up,
        };
        assert_eq!(error.to_string(), "pointer source refused a pointer-up listener");
    }
}
