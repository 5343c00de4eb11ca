//! Generated testing instructions
//!
//! The instructions backend wraps its result twice: the HTTP body is a JSON
//! object whose `instructions` (or `modifications`) field is itself a string
//! holding JSON. Decoding therefore runs in two stages:
//!
//! ```text
//! body bytes ──serde──▶ GenerateResponse { instructions: String }
//!                                   │
//!                                   └──serde──▶ GeneratedInstructions { features }
//! ```
//!
//! The first stage is the transport client's concern. The second stage lives
//! here and fails with [`Error::EmbeddedInstructions`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Field of the generate response carrying the embedded payload
pub const INSTRUCTIONS_FIELD: &str = "instructions";
/// Field of the improve response carrying the embedded payload
pub const MODIFICATIONS_FIELD: &str = "modifications";

/// A full set of generated instructions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedInstructions {
    pub features: Vec<InstructionFeature>,
}

/// One test case: what is tested, the setup, the steps and what should happen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionFeature {
    pub description: String,
    #[serde(default)]
    pub pre_conditions: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub expected_results: Vec<String>,
}

/// Outer body of `POST generate_instructions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub instructions: String,
}

/// Outer body of `POST improve_instructions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImproveResponse {
    pub modifications: String,
}

/// Parse the JSON string embedded in a response field.
pub fn decode_instructions(field: &'static str, payload: &str) -> Result<GeneratedInstructions> {
    serde_json::from_str(payload).map_err(|source| Error::EmbeddedInstructions { field, source })
}

impl GeneratedInstructions {
    /// Serialize for the `previousInstructions` form field.
    pub fn to_form_value(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// One card per feature, in order.
    pub fn cards(&self) -> impl Iterator<Item = FeatureCard<'_>> {
        self.features.iter().map(FeatureCard)
    }
}

impl GenerateResponse {
    pub fn decode(&self) -> Result<GeneratedInstructions> {
        decode_instructions(INSTRUCTIONS_FIELD, &self.instructions)
    }
}

impl ImproveResponse {
    pub fn decode(&self) -> Result<GeneratedInstructions> {
        decode_instructions(MODIFICATIONS_FIELD, &self.modifications)
    }
}

/// Text rendering of a single feature.
///
/// Heading, preconditions paragraph, then steps and expected results as
/// numbered lists.
pub struct FeatureCard<'a>(pub &'a InstructionFeature);

impl FeatureCard<'_> {
    pub fn heading(&self) -> &str {
        &self.0.description
    }
}

impl fmt::Display for FeatureCard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let feature = self.0;
        writeln!(f, "## {}", feature.description)?;
        writeln!(f)?;
        writeln!(f, "Pre-conditions: {}", feature.pre_conditions)?;
        writeln!(f)?;
        writeln!(f, "Testing steps:")?;
        for (i, step) in feature.steps.iter().enumerate() {
            writeln!(f, "{:>3}. {}", i + 1, step)?;
        }
        writeln!(f)?;
        writeln!(f, "Expected results:")?;
        for (i, result) in feature.expected_results.iter().enumerate() {
            writeln!(f, "{:>3}. {}", i + 1, result)?;
        }
        Ok(())
    }
}
