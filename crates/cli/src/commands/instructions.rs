//! Instruction generator commands

use clap::{Args, Subcommand};
use std::path::PathBuf;

use testdeck_common::ImageAttachment;

use super::ensure_applied;
use crate::client::InstructionsClient;
use crate::config::ClientConfig;
use crate::output::{self, OutputFormat};
use crate::views::InstructionGenerator;

#[derive(Subcommand)]
pub enum InstructionsCommands {
    /// Generate testing instructions from screenshots
    Generate(GenerateArgs),
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Additional context for the generator
    #[arg(long, default_value = "")]
    pub context: String,

    /// Screenshot to attach (repeatable, sent in the given order)
    #[arg(long = "image")]
    pub images: Vec<PathBuf>,

    /// Feedback for one improvement round on the generated instructions
    #[arg(long)]
    pub improve: Option<String>,
}

pub async fn execute(cmd: InstructionsCommands, config: &ClientConfig, format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        InstructionsCommands::Generate(args) => generate(args, config, format).await,
    }
}

async fn generate(args: GenerateArgs, config: &ClientConfig, format: OutputFormat) -> anyhow::Result<()> {
    let view = InstructionGenerator::new(InstructionsClient::new(config)?);

    let mut images = Vec::with_capacity(args.images.len());
    for path in &args.images {
        images.push(ImageAttachment::from_path(path).await?);
    }
    view.set_context(args.context);
    view.add_images(images);

    ensure_applied(view.generate().await)?;

    if let Some(feedback) = args.improve {
        view.set_improvement_context(feedback);
        ensure_applied(view.improve().await)?;
    }

    if let Some(instructions) = view.instructions() {
        if instructions.is_empty() {
            output::print_warning("The generator returned no features.");
        }
        output::print_instructions(&instructions, format);
    }
    Ok(())
}
