//! Core types for testdeck

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(v: i64) -> Self {
                Self(v)
            }
        }
    };
}

id_type!(
    /// Backend identifier of a project
    ProjectId
);
id_type!(
    /// Backend identifier of a feature
    FeatureId
);

/// A product under test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A unit of product functionality belonging to one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub id: FeatureId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub project: Option<ProjectId>,
}

/// Stored image and strategy of a feature.
///
/// The backend reports both as nullable; a missing strategy is shown as an
/// empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDetail {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub strategy: Option<String>,
}

impl FeatureDetail {
    pub fn strategy_text(&self) -> &str {
        self.strategy.as_deref().unwrap_or_default()
    }
}

/// Body of `POST add-project/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub description: String,
}

/// Body of `POST add-feature/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFeature {
    pub name: String,
    pub description: String,
    pub project: ProjectId,
}

/// Body of `POST add-or-replace-strategy/{id}/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyUpdate {
    pub description: String,
}

/// Acknowledgement returned by the strategy endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategySaved {
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `POST multimodal-llm/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedStrategy {
    pub response: String,
}

/// Error envelope used by both backends on non-2xx responses
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    /// Best-effort message from a failed response body.
    pub fn message_from(body: &[u8]) -> String {
        match serde_json::from_slice::<ErrorBody>(body) {
            Ok(e) => e.error,
            Err(_) => String::from_utf8_lossy(body).trim().to_string(),
        }
    }
}
