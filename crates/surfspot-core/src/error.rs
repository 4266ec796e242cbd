//! Errors the surfspot binary reports to the person running it.
//!
//! Library crates keep their own error enums; the shell folds them into
//! [`AppError`] at the edge so one `user_message()` can be printed next to the
//! logged detail.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Short hint for the terminal; the `Display` form goes to the log.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Io(_) => "Could not read a local file. Check the path and permissions.",
            AppError::Other(_) => "Surfspot stopped unexpectedly. See the log for details.",
        }
    }

    /// Keep a [`ConfigError`] raised through `anyhow` recognizable as one.
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        match err.downcast::<ConfigError>() {
            Ok(config) => AppError::Config(config),
            Err(other) => AppError::Other(other),
        }
    }
}

/// Failures talking to the spots backend.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "Could not reach the spots service. Is it running?"
            }
            NetworkError::Timeout => "The spots service did not answer in time.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The spots service failed. Try again later."
            }
            NetworkError::ServerError { .. } => {
                "The spots service rejected the request. Check spots.api_url."
            }
            NetworkError::InvalidResponse(_) => {
                "The spots service sent data that is not a spot list."
            }
        }
    }
}

/// Problems with the config file or a file it points at.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "A setting or spots file is invalid. See the log for which.",
            ConfigError::ParseError(_) => "config.toml is not valid TOML.",
        }
    }
}

/// Classify a transport failure from `reqwest`.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_variant_has_a_hint() {
        let errors: Vec<AppError> = vec![
            NetworkError::Timeout.into(),
            NetworkError::ConnectionFailed("refused".into()).into(),
            NetworkError::InvalidResponse("html".into()).into(),
            ConfigError::Invalid("map.zoom".into()).into(),
            ConfigError::ParseError("line 1".into()).into(),
            AppError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "spots.json")),
            AppError::Other(anyhow::anyhow!("boom")),
        ];

        for err in errors {
            assert!(!err.user_message().is_empty(), "empty message for {err}");
        }
    }

    #[test]
    fn test_server_error_hint_depends_on_status() {
        let upstream = NetworkError::ServerError {
            status: 503,
            message: "unavailable".into(),
        };
        let client = NetworkError::ServerError {
            status: 404,
            message: "missing".into(),
        };
        assert!(upstream.user_message().contains("Try again later"));
        assert!(client.user_message().contains("spots.api_url"));
    }

    #[test]
    fn test_from_anyhow_recovers_config_error() {
        let err = AppError::from_anyhow(ConfigError::Invalid("map.zoom: too deep".into()).into());
        assert!(matches!(
            err,
            AppError::Config(ConfigError::Invalid(ref m)) if m.contains("map.zoom")
        ));
        assert_eq!(
            err.user_message(),
            "A setting or spots file is invalid. See the log for which."
        );
    }

    #[test]
    fn test_from_anyhow_keeps_other_errors() {
        let err = AppError::from_anyhow(anyhow::anyhow!("no config dir"));
        assert!(matches!(err, AppError::Other(_)));
        assert_eq!(err.to_string(), "no config dir");
    }
}
