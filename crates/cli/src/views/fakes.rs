//! In-memory backends for view tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Notify;

use testdeck_common::{
    Feature, FeatureDetail, FeatureId, GeneratedInstructions, GeneratedStrategy, ImageAttachment,
    NewFeature, NewProject, Project, ProjectId, StrategySaved, StrategyUpdate,
};

use crate::client::{join_url, ApiError, ApiResult, CatalogApi, InstructionsApi, StrategyRequest};

fn unavailable(endpoint: &str) -> ApiError {
    ApiError::Status {
        endpoint: endpoint.to_string(),
        status: 500,
        message: "backend unavailable".to_string(),
    }
}

#[derive(Default)]
struct CatalogData {
    projects: Vec<Project>,
    features: Vec<Feature>,
    details: HashMap<FeatureId, FeatureDetail>,
    generated: String,
    failing: HashSet<&'static str>,
    calls: Vec<String>,
    projects_gate: Option<Arc<Notify>>,
}

/// Catalog backend backed by a few vectors. Clones share data.
#[derive(Clone, Default)]
pub struct FakeCatalog {
    data: Arc<Mutex<CatalogData>>,
}

impl FakeCatalog {
    pub fn seed_project(&self, name: &str) -> ProjectId {
        let mut data = self.data.lock();
        let id = ProjectId(data.projects.iter().map(|p| p.id.0).max().unwrap_or(0) + 1);
        data.projects.push(Project {
            id,
            name: name.to_string(),
            description: String::new(),
        });
        id
    }

    pub fn seed_feature(&self, project: ProjectId, name: &str) -> FeatureId {
        let mut data = self.data.lock();
        let id = FeatureId(data.features.iter().map(|f| f.id.0 + 1).max().unwrap_or(10));
        data.features.push(Feature {
            id,
            name: name.to_string(),
            description: String::new(),
            project: Some(project),
        });
        id
    }

    pub fn seed_detail(&self, feature: FeatureId, image: Option<&str>, strategy: Option<&str>) {
        self.data.lock().details.insert(
            feature,
            FeatureDetail {
                image: image.map(str::to_string),
                strategy: strategy.map(str::to_string),
            },
        );
    }

    /// Drop a project and its features, as if deleted on the server
    pub fn remove_project(&self, project: ProjectId) {
        let mut data = self.data.lock();
        data.projects.retain(|p| p.id != project);
        data.features.retain(|f| f.project != Some(project));
    }

    pub fn set_generated_strategy(&self, text: &str) {
        self.data.lock().generated = text.to_string();
    }

    /// Make every later call to the endpoint fail with a 500
    pub fn fail(&self, endpoint: &'static str) {
        self.data.lock().failing.insert(endpoint);
    }

    /// Hold the next project listing until the returned gate is notified
    pub fn hold_projects(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.data.lock().projects_gate = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.data.lock().calls.clone()
    }

    fn enter(&self, endpoint: &'static str) -> ApiResult<()> {
        let mut data = self.data.lock();
        data.calls.push(endpoint.to_string());
        if data.failing.contains(endpoint) {
            return Err(unavailable(endpoint));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn list_projects(&self) -> ApiResult<Vec<Project>> {
        self.enter("get-projects")?;
        let gate = self.data.lock().projects_gate.take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(self.data.lock().projects.clone())
    }

    async fn list_features(&self, project: ProjectId) -> ApiResult<Vec<Feature>> {
        self.enter("get-project-features")?;
        let data = self.data.lock();
        Ok(data
            .features
            .iter()
            .filter(|f| f.project == Some(project))
            .cloned()
            .collect())
    }

    async fn add_project(&self, body: &NewProject) -> ApiResult<()> {
        self.enter("add-project")?;
        let id = self.seed_project(&body.name);
        if let Some(p) = self.data.lock().projects.iter_mut().find(|p| p.id == id) {
            p.description = body.description.clone();
        }
        Ok(())
    }

    async fn add_feature(&self, body: &NewFeature) -> ApiResult<()> {
        self.enter("add-feature")?;
        self.seed_feature(body.project, &body.name);
        Ok(())
    }

    async fn feature_detail(&self, feature: FeatureId) -> ApiResult<FeatureDetail> {
        self.enter("get-feature-details")?;
        Ok(self.data.lock().details.get(&feature).cloned().unwrap_or_default())
    }

    async fn replace_image(&self, feature: FeatureId, image: &ImageAttachment) -> ApiResult<()> {
        self.enter("add-or-replace-image")?;
        let path = format!("/media/features/{}/{}", feature, image.file_name);
        self.data.lock().details.entry(feature).or_default().image = Some(path);
        Ok(())
    }

    async fn save_strategy(&self, feature: FeatureId, body: &StrategyUpdate) -> ApiResult<StrategySaved> {
        self.enter("add-or-replace-strategy")?;
        self.data.lock().details.entry(feature).or_default().strategy = Some(body.description.clone());
        Ok(StrategySaved {
            message: Some("Strategy saved".to_string()),
        })
    }

    async fn generate_strategy(&self, _request: StrategyRequest<'_>) -> ApiResult<GeneratedStrategy> {
        self.enter("multimodal-llm")?;
        Ok(GeneratedStrategy {
            response: self.data.lock().generated.clone(),
        })
    }

    fn media_url(&self, path: &str) -> String {
        join_url("http://media.test", path)
    }
}

#[derive(Default)]
struct InstructionsData {
    replies: Vec<ApiResult<GeneratedInstructions>>,
    received: Vec<(String, usize)>,
    improved_from: Vec<(GeneratedInstructions, String)>,
    gate: Option<Arc<Notify>>,
}

/// Instructions backend answering from a queue of prepared replies
#[derive(Clone, Default)]
pub struct FakeInstructions {
    data: Arc<Mutex<InstructionsData>>,
}

impl FakeInstructions {
    pub fn reply(&self, reply: ApiResult<GeneratedInstructions>) {
        self.data.lock().replies.push(reply);
    }

    pub fn hold_next(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.data.lock().gate = Some(gate.clone());
        gate
    }

    /// (context, image count) of every generate call
    pub fn generate_calls(&self) -> Vec<(String, usize)> {
        self.data.lock().received.clone()
    }

    /// (previous instructions, feedback) of every improve call
    pub fn improve_calls(&self) -> Vec<(GeneratedInstructions, String)> {
        self.data.lock().improved_from.clone()
    }

    async fn next_reply(&self) -> ApiResult<GeneratedInstructions> {
        let gate = self.data.lock().gate.take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let mut data = self.data.lock();
        if data.replies.is_empty() {
            return Err(unavailable("instructions"));
        }
        data.replies.remove(0)
    }
}

#[async_trait]
impl InstructionsApi for FakeInstructions {
    async fn generate(&self, context: &str, images: &[ImageAttachment]) -> ApiResult<GeneratedInstructions> {
        self.data.lock().received.push((context.to_string(), images.len()));
        self.next_reply().await
    }

    async fn improve(
        &self,
        previous: &GeneratedInstructions,
        improvement_context: &str,
    ) -> ApiResult<GeneratedInstructions> {
        self.data
            .lock()
            .improved_from
            .push((previous.clone(), improvement_context.to_string()));
        self.next_reply().await
    }
}
