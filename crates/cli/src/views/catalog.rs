//! Catalog manager view
//!
//! Projects, their features, and the selected feature's stored image and
//! testing strategy. Selection changes trigger the dependent fetch: picking
//! a project loads its features, picking a feature loads its detail.
//!
//! Strategy generation only replaces the displayed text. Nothing is stored
//! until [`CatalogManager::save_strategy`] runs.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info};

use testdeck_common::{
    BusyFlag, Feature, FeatureDetail, FeatureId, ImageAttachment, NewFeature, NewProject, Project,
    ProjectId, StrategyUpdate,
};

use super::{Outcome, SkipReason};
use crate::client::{CatalogApi, StrategyRequest};

/// Everything the catalog view shows or edits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogState {
    pub projects: Vec<Project>,
    pub selected_project: Option<ProjectId>,
    pub features: Vec<Feature>,
    pub selected_feature: Option<FeatureId>,
    /// Stored image path of the selected feature
    pub image: Option<String>,
    /// Strategy text as displayed, possibly edited or generated
    pub strategy: String,
    /// Free-text context for strategy generation
    pub context: String,
    pub new_project_name: String,
    pub new_project_description: String,
    pub new_feature_name: String,
    pub new_feature_description: String,
}

impl CatalogState {
    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn feature(&self, id: FeatureId) -> Option<&Feature> {
        self.features.iter().find(|f| f.id == id)
    }

    fn apply_detail(&mut self, detail: FeatureDetail) {
        self.strategy = detail.strategy_text().to_string();
        self.image = detail.image;
    }

    fn clear_feature(&mut self) {
        self.selected_feature = None;
        self.image = None;
        self.strategy.clear();
    }
}

/// Controller for the catalog view. Clones share state and busy flag.
pub struct CatalogManager<A> {
    api: Arc<A>,
    state: Arc<Mutex<CatalogState>>,
    busy: BusyFlag,
}

impl<A> Clone for CatalogManager<A> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            state: self.state.clone(),
            busy: self.busy.clone(),
        }
    }
}

impl<A: CatalogApi> CatalogManager<A> {
    pub fn new(api: A) -> Self {
        Self {
            api: Arc::new(api),
            state: Arc::new(Mutex::new(CatalogState::default())),
            busy: BusyFlag::new(),
        }
    }

    /// Create the view and load the project list
    pub async fn open(api: A) -> (Self, Outcome) {
        let view = Self::new(api);
        let outcome = view.refresh_projects().await;
        (view, outcome)
    }

    /// Snapshot of the current state
    pub fn state(&self) -> CatalogState {
        self.state.lock().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    pub fn busy_flag(&self) -> BusyFlag {
        self.busy.clone()
    }

    /// URL the selected feature's image is served from
    pub fn image_url(&self) -> Option<String> {
        let state = self.state.lock();
        state
            .image
            .as_deref()
            .filter(|path| !path.is_empty())
            .map(|path| self.api.media_url(path))
    }

    // Form inputs

    pub fn set_new_project(&self, name: impl Into<String>, description: impl Into<String>) {
        let mut state = self.state.lock();
        state.new_project_name = name.into();
        state.new_project_description = description.into();
    }

    pub fn set_new_feature(&self, name: impl Into<String>, description: impl Into<String>) {
        let mut state = self.state.lock();
        state.new_feature_name = name.into();
        state.new_feature_description = description.into();
    }

    pub fn set_strategy(&self, text: impl Into<String>) {
        self.state.lock().strategy = text.into();
    }

    pub fn set_context(&self, text: impl Into<String>) {
        self.state.lock().context = text.into();
    }

    // Fetches

    /// Reload the project list. On failure the previous list stays.
    pub async fn refresh_projects(&self) -> Outcome {
        let Some(_busy) = self.busy.try_acquire() else {
            return Outcome::Skipped(SkipReason::Busy);
        };
        self.load_projects().await
    }

    /// Select a project from the current list and load its features.
    ///
    /// The selection only changes once the feature list arrives. A selected
    /// feature that is not part of the new list is deselected.
    pub async fn select_project(&self, id: ProjectId) -> Outcome {
        {
            let state = self.state.lock();
            if state.project(id).is_none() {
                return Outcome::Skipped(SkipReason::UnknownSelection(format!("project {}", id)));
            }
            if state.selected_project == Some(id) {
                return Outcome::Skipped(SkipReason::Unchanged);
            }
        }
        let Some(_busy) = self.busy.try_acquire() else {
            return Outcome::Skipped(SkipReason::Busy);
        };

        match self.api.list_features(id).await {
            Ok(features) => {
                debug!(project = %id, count = features.len(), "fetched features");
                let mut state = self.state.lock();
                state.selected_project = Some(id);
                state.features = features;
                if let Some(current) = state.selected_feature {
                    if state.feature(current).is_none() {
                        state.clear_feature();
                    }
                }
                Outcome::Applied
            }
            Err(e) => Outcome::failed("fetching features", e),
        }
    }

    /// Select a feature from the current list and load its detail.
    ///
    /// Unsaved strategy edits of the previous feature are discarded.
    pub async fn select_feature(&self, id: FeatureId) -> Outcome {
        {
            let state = self.state.lock();
            if state.feature(id).is_none() {
                return Outcome::Skipped(SkipReason::UnknownSelection(format!("feature {}", id)));
            }
            if state.selected_feature == Some(id) {
                return Outcome::Skipped(SkipReason::Unchanged);
            }
        }
        let Some(_busy) = self.busy.try_acquire() else {
            return Outcome::Skipped(SkipReason::Busy);
        };

        match self.api.feature_detail(id).await {
            Ok(detail) => {
                let mut state = self.state.lock();
                state.selected_feature = Some(id);
                state.apply_detail(detail);
                Outcome::Applied
            }
            Err(e) => Outcome::failed("fetching feature details", e),
        }
    }

    /// Re-fetch the selected feature's stored detail
    pub async fn reload_detail(&self) -> Outcome {
        let Some(feature) = self.state.lock().selected_feature else {
            return Outcome::Skipped(SkipReason::NothingSelected("feature"));
        };
        let Some(_busy) = self.busy.try_acquire() else {
            return Outcome::Skipped(SkipReason::Busy);
        };
        self.load_detail(feature).await
    }

    // Mutations

    /// Create a project from the form inputs, then reload the list and
    /// clear the inputs.
    pub async fn add_project(&self) -> Outcome {
        let body = {
            let state = self.state.lock();
            NewProject {
                name: state.new_project_name.clone(),
                description: state.new_project_description.clone(),
            }
        };
        if body.name.is_empty() {
            return Outcome::Skipped(SkipReason::MissingInput("project name"));
        }
        let Some(_busy) = self.busy.try_acquire() else {
            return Outcome::Skipped(SkipReason::Busy);
        };

        if let Err(e) = self.api.add_project(&body).await {
            return Outcome::failed("adding project", e);
        }
        info!(name = %body.name, "project added");

        self.load_projects().await;
        let mut state = self.state.lock();
        state.new_project_name.clear();
        state.new_project_description.clear();
        Outcome::Applied
    }

    /// Create a feature under the selected project from the form inputs
    pub async fn add_feature(&self) -> Outcome {
        let body = {
            let state = self.state.lock();
            let Some(project) = state.selected_project else {
                return Outcome::Skipped(SkipReason::NothingSelected("project"));
            };
            NewFeature {
                name: state.new_feature_name.clone(),
                description: state.new_feature_description.clone(),
                project,
            }
        };
        if body.name.is_empty() {
            return Outcome::Skipped(SkipReason::MissingInput("feature name"));
        }
        let Some(_busy) = self.busy.try_acquire() else {
            return Outcome::Skipped(SkipReason::Busy);
        };

        if let Err(e) = self.api.add_feature(&body).await {
            return Outcome::failed("adding feature", e);
        }
        info!(name = %body.name, project = %body.project, "feature added");

        match self.api.list_features(body.project).await {
            Ok(features) => {
                let mut state = self.state.lock();
                if state.selected_project == Some(body.project) {
                    state.features = features;
                }
            }
            Err(e) => error!(error = %e, "Error fetching features"),
        }
        let mut state = self.state.lock();
        state.new_feature_name.clear();
        state.new_feature_description.clear();
        Outcome::Applied
    }

    /// Replace the selected feature's image, then reload its detail
    pub async fn upload_image(&self, image: &ImageAttachment) -> Outcome {
        let Some(feature) = self.state.lock().selected_feature else {
            return Outcome::Skipped(SkipReason::NothingSelected("feature"));
        };
        if image.is_empty() {
            return Outcome::Skipped(SkipReason::MissingInput("image file"));
        }
        let Some(_busy) = self.busy.try_acquire() else {
            return Outcome::Skipped(SkipReason::Busy);
        };

        if let Err(e) = self.api.replace_image(feature, image).await {
            return Outcome::failed("uploading image", e);
        }
        info!(feature = %feature, file = %image.file_name, "image uploaded");

        self.load_detail(feature).await;
        Outcome::Applied
    }

    /// Store the displayed strategy text, then reload the detail so the view
    /// shows the server's copy
    pub async fn save_strategy(&self) -> Outcome {
        let (feature, text) = {
            let state = self.state.lock();
            let Some(feature) = state.selected_feature else {
                return Outcome::Skipped(SkipReason::NothingSelected("feature"));
            };
            (feature, state.strategy.clone())
        };
        if text.is_empty() {
            return Outcome::Skipped(SkipReason::MissingInput("strategy"));
        }
        let Some(_busy) = self.busy.try_acquire() else {
            return Outcome::Skipped(SkipReason::Busy);
        };

        match self.api.save_strategy(feature, &StrategyUpdate { description: text }).await {
            Ok(saved) => {
                info!(
                    feature = %feature,
                    message = saved.message.as_deref().unwrap_or_default(),
                    "strategy saved"
                );
            }
            Err(e) => return Outcome::failed("adding strategy", e),
        }

        self.load_detail(feature).await;
        Outcome::Applied
    }

    /// Ask the backend for a strategy from an image and the context text.
    ///
    /// The result replaces the displayed strategy only.
    pub async fn generate_strategy(&self, image: &ImageAttachment) -> Outcome {
        let (feature, project, context) = {
            let state = self.state.lock();
            let Some(feature) = state.selected_feature else {
                return Outcome::Skipped(SkipReason::NothingSelected("feature"));
            };
            let Some(project) = state.selected_project else {
                return Outcome::Skipped(SkipReason::NothingSelected("project"));
            };
            (feature, project, state.context.clone())
        };
        if context.is_empty() {
            return Outcome::Skipped(SkipReason::MissingInput("context"));
        }
        if image.is_empty() {
            return Outcome::Skipped(SkipReason::MissingInput("image file"));
        }
        let Some(_busy) = self.busy.try_acquire() else {
            return Outcome::Skipped(SkipReason::Busy);
        };

        let request = StrategyRequest {
            feature,
            project,
            image,
            context: &context,
        };
        match self.api.generate_strategy(request).await {
            Ok(generated) => {
                let mut state = self.state.lock();
                if state.selected_feature == Some(feature) {
                    state.strategy = generated.response;
                }
                Outcome::Applied
            }
            Err(e) => Outcome::failed("generating strategy", e),
        }
    }

    // Unguarded loaders, called with the busy guard already held

    /// A selected project missing from the new list is deselected along with
    /// its features and feature detail.
    async fn load_projects(&self) -> Outcome {
        match self.api.list_projects().await {
            Ok(projects) => {
                debug!(count = projects.len(), "fetched projects");
                let mut state = self.state.lock();
                state.projects = projects;
                if let Some(current) = state.selected_project {
                    if state.project(current).is_none() {
                        debug!(project = %current, "selected project no longer listed");
                        state.selected_project = None;
                        state.features.clear();
                        state.clear_feature();
                    }
                }
                Outcome::Applied
            }
            Err(e) => Outcome::failed("fetching projects", e),
        }
    }

    async fn load_detail(&self, feature: FeatureId) -> Outcome {
        match self.api.feature_detail(feature).await {
            Ok(detail) => {
                let mut state = self.state.lock();
                if state.selected_feature == Some(feature) {
                    state.apply_detail(detail);
                }
                Outcome::Applied
            }
            Err(e) => Outcome::failed("fetching feature details", e),
        }
    }
}
