//! One-shot location acquisition.

/// A latitude/longitude fix, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Why a location request failed.
///
/// The four kinds are the only ones a caller ever sees; transport-specific
/// detail is folded into one of them by the provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location information unavailable")]
    PositionUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Unknown location error")]
    Unknown,
}

impl LocationError {
    /// Message shown to the user when the lookup fails.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "Você negou o acesso à localização.",
            Self::PositionUnavailable => "Informações de localização indisponíveis.",
            Self::Timeout => "A solicitação de localização expirou.",
            Self::Unknown => "Ocorreu um erro desconhecido.",
        }
    }
}

/// Shown when no location source exists at all.
pub const UNSUPPORTED_MESSAGE: &str = "Geolocalização não é suportada por este dispositivo.";

/// A source of the user's current position.
///
/// Implementations answer exactly once per call and never retry.
#[async_trait::async_trait]
pub trait LocationProvider: Send + Sync {
    async fn locate(&self) -> Result<Coordinates, LocationError>;
}

/// Coordinates supplied up front, e.g. from the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

#[async_trait::async_trait]
impl LocationProvider for FixedLocation {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_kind_has_a_distinct_message() {
        let messages = [
            LocationError::PermissionDenied.user_message(),
            LocationError::PositionUnavailable.user_message(),
            LocationError::Timeout.user_message(),
            LocationError::Unknown.user_message(),
        ];
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[tokio::test]
    async fn test_fixed_location_returns_its_coordinates() {
        let coords = Coordinates {
            latitude: -22.9068,
            longitude: -43.1729,
        };
        assert_eq!(FixedLocation(coords).locate().await, Ok(coords));
    }
}
