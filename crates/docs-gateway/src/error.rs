use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, GatewayError>;

impl GatewayError {
    /// Map a non-success HTTP status from the remote service.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            401 => GatewayError::Unauthorized,
            404 => GatewayError::NotFound(message.into()),
            _ => GatewayError::Upstream {
                status,
                message: message.into(),
            },
        }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        GatewayError::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => GatewayError::from_status(status.as_u16(), err.to_string()),
            // Connection and decoding failures never reached a status line
            None => GatewayError::Upstream {
                status: 0,
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            GatewayError::from_status(401, "x"),
            GatewayError::Unauthorized
        ));
        assert!(matches!(
            GatewayError::from_status(404, "x"),
            GatewayError::NotFound(_)
        ));
        assert!(matches!(
            GatewayError::from_status(500, "boom"),
            GatewayError::Upstream { status: 500, .. }
        ));
        assert!(matches!(
            GatewayError::from_status(403, "quota"),
            GatewayError::Upstream { status: 403, .. }
        ));
    }
}
