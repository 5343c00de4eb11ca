//! Catalog commands: projects, features, images and strategies

use clap::{Args, Subcommand};
use std::path::PathBuf;
use tracing::info;

use testdeck_common::{FeatureId, ImageAttachment, ProjectId};

use super::ensure_applied;
use crate::client::CatalogClient;
use crate::config::ClientConfig;
use crate::output::{self, DetailView, OutputFormat};
use crate::views::CatalogManager;

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// List projects
    Projects,

    /// List the features of a project
    Features {
        /// Project ID
        #[arg(long)]
        project: ProjectId,
    },

    /// Create a project
    AddProject {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// Create a feature under a project
    AddFeature {
        /// Project ID
        #[arg(long)]
        project: ProjectId,

        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// Show a feature's stored image and strategy
    Show(FeatureTarget),

    /// Replace a feature's image
    UploadImage {
        #[command(flatten)]
        target: FeatureTarget,

        /// Image file to upload
        file: PathBuf,
    },

    /// Store a testing strategy for a feature
    SaveStrategy {
        #[command(flatten)]
        target: FeatureTarget,

        /// Strategy text
        #[arg(long)]
        text: String,
    },

    /// Generate a testing strategy from an image and context
    GenerateStrategy {
        #[command(flatten)]
        target: FeatureTarget,

        /// Screenshot of the feature
        #[arg(long)]
        image: PathBuf,

        /// What to focus the strategy on
        #[arg(long)]
        context: String,

        /// Store the generated strategy
        #[arg(long)]
        save: bool,
    },
}

#[derive(Args)]
pub struct FeatureTarget {
    /// Project ID
    #[arg(long)]
    pub project: ProjectId,

    /// Feature ID
    #[arg(long)]
    pub feature: FeatureId,
}

pub async fn execute(cmd: CatalogCommands, config: &ClientConfig, format: OutputFormat) -> anyhow::Result<()> {
    let (view, opened) = CatalogManager::open(CatalogClient::new(config)?).await;
    ensure_applied(opened)?;

    match cmd {
        CatalogCommands::Projects => {
            output::print_list(&view.state().projects, format);
        }

        CatalogCommands::Features { project } => {
            ensure_applied(view.select_project(project).await)?;
            output::print_list(&view.state().features, format);
        }

        CatalogCommands::AddProject { name, description } => {
            view.set_new_project(name.clone(), description);
            ensure_applied(view.add_project().await)?;
            output::print_success(&format!("Project '{}' added", name));
            output::print_list(&view.state().projects, format);
        }

        CatalogCommands::AddFeature { project, name, description } => {
            ensure_applied(view.select_project(project).await)?;
            view.set_new_feature(name.clone(), description);
            ensure_applied(view.add_feature().await)?;
            output::print_success(&format!("Feature '{}' added", name));
            output::print_list(&view.state().features, format);
        }

        CatalogCommands::Show(target) => {
            select(&view, &target).await?;
            print_detail(&view, format);
        }

        CatalogCommands::UploadImage { target, file } => {
            select(&view, &target).await?;
            let image = ImageAttachment::from_path(&file).await?;
            ensure_applied(view.upload_image(&image).await)?;
            output::print_success("Image uploaded");
            print_detail(&view, format);
        }

        CatalogCommands::SaveStrategy { target, text } => {
            select(&view, &target).await?;
            view.set_strategy(text);
            ensure_applied(view.save_strategy().await)?;
            output::print_success("Strategy saved");
            print_detail(&view, format);
        }

        CatalogCommands::GenerateStrategy { target, image, context, save } => {
            select(&view, &target).await?;
            let image = ImageAttachment::from_path(&image).await?;
            view.set_context(context);
            ensure_applied(view.generate_strategy(&image).await)?;
            info!(feature = %target.feature, "strategy generated");

            if save {
                ensure_applied(view.save_strategy().await)?;
                output::print_success("Generated strategy saved");
                print_detail(&view, format);
            } else {
                println!("{}", view.state().strategy);
                output::print_warning("Strategy not saved. Re-run with --save to store it.");
            }
        }
    }

    Ok(())
}

async fn select(view: &CatalogManager<CatalogClient>, target: &FeatureTarget) -> anyhow::Result<()> {
    ensure_applied(view.select_project(target.project).await)?;
    ensure_applied(view.select_feature(target.feature).await)
}

fn print_detail(view: &CatalogManager<CatalogClient>, format: OutputFormat) {
    let state = view.state();
    let detail = DetailView {
        image: state.image.clone(),
        image_url: view.image_url(),
        strategy: state.strategy,
    };
    output::print_item(&detail, format);
}
