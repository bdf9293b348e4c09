use thiserror::Error;

/// Failure kinds of a weather lookup.
///
/// Only [`WeatherError::InvalidInput`], [`WeatherError::UpstreamUnavailable`]
/// and [`WeatherError::Serialization`] ever reach a caller. Store failures are
/// absorbed by the service and only show up in logs.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("all weather providers failed")]
    UpstreamUnavailable(#[source] anyhow::Error),

    #[error("failed to read cached weather")]
    StoreRead(#[source] anyhow::Error),

    #[error("failed to store weather record")]
    StoreWrite(#[source] anyhow::Error),

    #[error("failed to serialize weather response")]
    Serialization(#[from] serde_json::Error),
}

impl WeatherError {
    /// Transport status the gateway answers with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            WeatherError::InvalidInput(_) => 400,
            WeatherError::UpstreamUnavailable(_)
            | WeatherError::StoreRead(_)
            | WeatherError::StoreWrite(_)
            | WeatherError::Serialization(_) => 500,
        }
    }

    /// The error and its whole cause chain on one line, for logs.
    pub fn describe(&self) -> String {
        match self {
            WeatherError::InvalidInput(msg) => msg.clone(),
            WeatherError::UpstreamUnavailable(e)
            | WeatherError::StoreRead(e)
            | WeatherError::StoreWrite(e) => format!("{self}: {e:#}"),
            WeatherError::Serialization(e) => format!("{self}: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(WeatherError::InvalidInput("missing".into()).status_code(), 400);
        assert_eq!(WeatherError::UpstreamUnavailable(anyhow::anyhow!("down")).status_code(), 500);
    }

    #[test]
    fn describe_includes_cause_chain() {
        let err = WeatherError::StoreRead(anyhow::anyhow!("disk gone").context("query failed"));
        assert_eq!(err.describe(), "failed to read cached weather: query failed: disk gone");
    }
}
