//! CLI Commands

pub mod catalog;
pub mod config;
pub mod instructions;

use crate::views::Outcome;

/// Turn a skipped or failed outcome into a command error
pub(crate) fn ensure_applied(outcome: Outcome) -> anyhow::Result<()> {
    match outcome {
        Outcome::Applied => Ok(()),
        other => anyhow::bail!("{}", other),
    }
}
