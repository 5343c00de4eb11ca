//! Instruction generator view

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

use testdeck_common::{BusyFlag, GeneratedInstructions, ImageAttachment};

use super::{Outcome, SkipReason};
use crate::client::InstructionsApi;

/// Form inputs and the current instructions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorState {
    pub context: String,
    /// Attached screenshots, sent as `image0`, `image1`, ... in this order
    pub images: Vec<ImageAttachment>,
    pub instructions: Option<GeneratedInstructions>,
    pub improvement_context: String,
}

/// Controller for the instruction generator view
pub struct InstructionGenerator<A> {
    api: Arc<A>,
    state: Arc<Mutex<GeneratorState>>,
    busy: BusyFlag,
}

impl<A> Clone for InstructionGenerator<A> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            state: self.state.clone(),
            busy: self.busy.clone(),
        }
    }
}

impl<A: InstructionsApi> InstructionGenerator<A> {
    pub fn new(api: A) -> Self {
        Self {
            api: Arc::new(api),
            state: Arc::new(Mutex::new(GeneratorState::default())),
            busy: BusyFlag::new(),
        }
    }

    pub fn state(&self) -> GeneratorState {
        self.state.lock().clone()
    }

    pub fn instructions(&self) -> Option<GeneratedInstructions> {
        self.state.lock().instructions.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    pub fn busy_flag(&self) -> BusyFlag {
        self.busy.clone()
    }

    pub fn set_context(&self, text: impl Into<String>) {
        self.state.lock().context = text.into();
    }

    pub fn set_improvement_context(&self, text: impl Into<String>) {
        self.state.lock().improvement_context = text.into();
    }

    /// Append images; earlier attachments are kept
    pub fn add_images(&self, images: impl IntoIterator<Item = ImageAttachment>) {
        self.state.lock().images.extend(images);
    }

    pub fn add_image(&self, image: ImageAttachment) {
        self.add_images(std::iter::once(image));
    }

    /// Remove one attachment. Returns false for an out-of-range index.
    pub fn remove_image(&self, index: usize) -> bool {
        let mut state = self.state.lock();
        if index < state.images.len() {
            state.images.remove(index);
            true
        } else {
            false
        }
    }

    /// Request instructions for the current context and images.
    ///
    /// Any failure clears the instructions rather than leaving stale ones.
    pub async fn generate(&self) -> Outcome {
        let Some(_busy) = self.busy.try_acquire() else {
            return Outcome::Skipped(SkipReason::Busy);
        };
        let (context, images) = {
            let state = self.state.lock();
            (state.context.clone(), state.images.clone())
        };
        debug!(context = %context, images = images.len(), "generating instructions");

        match self.api.generate(&context, &images).await {
            Ok(instructions) => {
                info!(features = instructions.features.len(), "instructions generated");
                self.state.lock().instructions = Some(instructions);
                Outcome::Applied
            }
            Err(e) => {
                self.state.lock().instructions = None;
                Outcome::failed("generating instructions", e)
            }
        }
    }

    /// Send the current instructions back with feedback and replace them
    /// with the revision. On failure the current instructions stay.
    pub async fn improve(&self) -> Outcome {
        let (previous, feedback) = {
            let state = self.state.lock();
            let Some(previous) = state.instructions.clone() else {
                info!("No instructions to improve");
                return Outcome::Skipped(SkipReason::NoInstructions);
            };
            (previous, state.improvement_context.clone())
        };
        let Some(_busy) = self.busy.try_acquire() else {
            return Outcome::Skipped(SkipReason::Busy);
        };
        debug!(feedback = %feedback, "improving instructions");

        match self.api.improve(&previous, &feedback).await {
            Ok(instructions) => {
                info!(features = instructions.features.len(), "instructions improved");
                self.state.lock().instructions = Some(instructions);
                Outcome::Applied
            }
            Err(e) => Outcome::failed("improving instructions", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiError;
    use crate::views::fakes::FakeInstructions;
    use pretty_assertions::assert_eq;
    use testdeck_common::InstructionFeature;

    fn instructions(descriptions: &[&str]) -> GeneratedInstructions {
        GeneratedInstructions {
            features: descriptions
                .iter()
                .map(|d| InstructionFeature {
                    description: d.to_string(),
                    pre_conditions: "Logged in".to_string(),
                    steps: vec!["Open page".to_string()],
                    expected_results: vec!["Page loads".to_string()],
                })
                .collect(),
        }
    }

    fn screenshot(name: &str) -> ImageAttachment {
        ImageAttachment::new(name, vec![1u8, 2, 3]).unwrap()
    }

    #[tokio::test]
    async fn test_generate_renders_cards_in_order() {
        let api = FakeInstructions::default();
        api.reply(Ok(instructions(&["Cart", "Payment", "Receipt"])));
        let view = InstructionGenerator::new(api.clone());

        view.set_context("test the checkout page");
        view.add_images([screenshot("cart.png"), screenshot("pay.png")]);
        assert_eq!(view.generate().await, Outcome::Applied);

        assert_eq!(api.generate_calls(), vec![("test the checkout page".to_string(), 2)]);
        let current = view.instructions().unwrap();
        let headings: Vec<_> = current.cards().map(|c| c.heading().to_string()).collect();
        assert_eq!(headings, vec!["Cart", "Payment", "Receipt"]);
        assert!(!view.is_busy());
    }

    #[tokio::test]
    async fn test_generate_failure_clears() {
        let api = FakeInstructions::default();
        api.reply(Ok(instructions(&["Cart"])));
        api.reply(Err(ApiError::Domain(testdeck_common::Error::InvalidConfig(
            "garbled".to_string(),
        ))));
        let view = InstructionGenerator::new(api);

        view.generate().await;
        assert!(view.instructions().is_some());

        assert!(matches!(view.generate().await, Outcome::Failed(_)));
        assert_eq!(view.instructions(), None);
        assert!(!view.is_busy());
    }

    #[tokio::test]
    async fn test_improve_without_instructions_sends_nothing() {
        let api = FakeInstructions::default();
        let view = InstructionGenerator::new(api.clone());
        view.set_improvement_context("add negative cases");

        assert_eq!(view.improve().await, Outcome::Skipped(SkipReason::NoInstructions));
        assert!(api.improve_calls().is_empty());
    }

    #[tokio::test]
    async fn test_improve_replaces_and_sends_previous() {
        let api = FakeInstructions::default();
        api.reply(Ok(instructions(&["Cart"])));
        api.reply(Ok(instructions(&["Cart", "Empty cart"])));
        let view = InstructionGenerator::new(api.clone());

        view.generate().await;
        view.set_improvement_context("add negative cases");
        assert_eq!(view.improve().await, Outcome::Applied);

        assert_eq!(
            api.improve_calls(),
            vec![(instructions(&["Cart"]), "add negative cases".to_string())]
        );
        assert_eq!(view.instructions(), Some(instructions(&["Cart", "Empty cart"])));
    }

    #[tokio::test]
    async fn test_improve_failure_keeps_previous() {
        let api = FakeInstructions::default();
        api.reply(Ok(instructions(&["Cart"])));
        let view = InstructionGenerator::new(api);

        view.generate().await;
        assert!(matches!(view.improve().await, Outcome::Failed(_)));
        assert_eq!(view.instructions(), Some(instructions(&["Cart"])));
    }

    #[tokio::test]
    async fn test_remove_image() {
        let view = InstructionGenerator::new(FakeInstructions::default());
        view.add_image(screenshot("a.png"));
        view.add_images([screenshot("b.png"), screenshot("c.png")]);

        assert!(view.remove_image(1));
        assert!(!view.remove_image(5));
        let names: Vec<_> = view.state().images.into_iter().map(|i| i.file_name).collect();
        assert_eq!(names, vec!["a.png", "c.png"]);
    }

    #[tokio::test]
    async fn test_second_generate_while_busy_is_skipped() {
        let api = FakeInstructions::default();
        api.reply(Ok(instructions(&["Cart"])));
        let gate = api.hold_next();
        let view = InstructionGenerator::new(api.clone());

        let first = tokio::spawn({
            let view = view.clone();
            async move { view.generate().await }
        });
        while !view.is_busy() {
            tokio::task::yield_now().await;
        }

        assert_eq!(view.generate().await, Outcome::Skipped(SkipReason::Busy));
        assert_eq!(api.generate_calls().len(), 1);

        gate.notify_one();
        assert_eq!(first.await.unwrap(), Outcome::Applied);
        assert!(!view.is_busy());
    }
}
