//! Step driver: runs one configured step over a set of work items.

use crate::command::FILE_PLACEHOLDER;
use crate::{
    CandidateStrategy, GenerationRequest, GenerationStrategy, JudgeSettings, ModelSettings,
    PluginRegistry, PluginRunner, StandardStrategy, StepConfig, flow,
};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tessera_core::{ContentPart, Message, Role, WorkItem, render};
use tessera_error::TesseraResult;
use tessera_interface::{OutputPaths, RuntimeServices};

/// Wires a step's plugins and generation strategy.
///
/// For every incoming item the driver runs the plugins, routes their packets through
/// the flow controller, then generates once per surviving item and routes the result
/// through the flow controller again. Items are processed one after another; rows
/// provide the concurrency.
pub struct StepDriver {
    index: usize,
    step: StepConfig,
    model: ModelSettings,
    runner: PluginRunner,
    strategy: Option<Arc<dyn GenerationStrategy>>,
    services: RuntimeServices,
    paths: OutputPaths,
}

impl std::fmt::Debug for StepDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepDriver")
            .field("index", &self.index)
            .field("step", &self.step.name())
            .field("strategy", &self.strategy.as_ref().map(|s| s.name()))
            .finish()
    }
}

impl StepDriver {
    /// Build the driver for step `index`.
    ///
    /// Step model settings are completed from `defaults`. Steps with more than one
    /// candidate use the candidate strategy; other generating steps the standard one.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured plugin is not registered.
    pub fn new(
        index: usize,
        step: StepConfig,
        defaults: &ModelSettings,
        registry: Arc<PluginRegistry>,
        services: RuntimeServices,
        paths: OutputPaths,
    ) -> TesseraResult<Self> {
        for plugin in step.plugins() {
            registry.get(plugin.name())?;
        }

        let model = step.model().merged(defaults);
        let strategy = step
            .has_generation()
            .then(|| Self::strategy_for(&step, &model, &services, &paths));

        tracing::debug!(
            step = %step.name(),
            plugins = step.plugins().len(),
            strategy = strategy.as_ref().map(|s| s.name()),
            "Step driver ready"
        );

        Ok(Self {
            index,
            step,
            model,
            runner: PluginRunner::new(registry),
            strategy,
            services,
            paths,
        })
    }

    fn strategy_for(
        step: &StepConfig,
        model: &ModelSettings,
        services: &RuntimeServices,
        paths: &OutputPaths,
    ) -> Arc<dyn GenerationStrategy> {
        let standard = StandardStrategy::new(services.clone(), paths.clone());
        match step.candidates() {
            Some(candidates) if step.candidate_count() > 1 => {
                let mut strategy = CandidateStrategy::new(standard, step.candidate_count());
                if let Some(judge_model) = candidates.judge_model() {
                    strategy = strategy.with_judge(JudgeSettings {
                        options: judge_model.merged(model).to_options(),
                        instructions: candidates.judge_instructions().clone(),
                    });
                }
                Arc::new(strategy)
            }
            _ => Arc::new(standard),
        }
    }

    /// Replace the generation strategy.
    pub fn with_strategy(mut self, strategy: Arc<dyn GenerationStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Step name.
    pub fn name(&self) -> &str {
        self.step.name()
    }

    /// Step configuration.
    pub fn step(&self) -> &StepConfig {
        &self.step
    }

    /// Run the step over `items`.
    ///
    /// # Errors
    ///
    /// Returns the first plugin, template or generation error; the caller fails the
    /// owning row.
    #[tracing::instrument(skip_all, fields(step = %self.step.name(), items = items.len()))]
    pub async fn run(&self, items: &[WorkItem]) -> TesseraResult<Vec<WorkItem>> {
        let mut next = Vec::new();
        for item in items {
            next.extend(self.run_item(item).await?);
        }
        tracing::debug!(produced = next.len(), "Step complete");
        Ok(next)
    }

    async fn run_item(&self, item: &WorkItem) -> TesseraResult<Vec<WorkItem>> {
        let (branches, plugin_context) = if self.step.plugins().is_empty() {
            (vec![item.clone()], None)
        } else {
            let run = self
                .runner
                .run(
                    self.step.plugins(),
                    item.template_context(),
                    self.index,
                    &self.services,
                    &self.paths,
                )
                .await?;
            let branches = flow::process_batch(
                std::slice::from_ref(item),
                &run.groups,
                self.step.plugin_output(),
            );
            (branches, Some(run.context))
        };

        let Some(strategy) = &self.strategy else {
            return Ok(branches);
        };

        let mut next = Vec::new();
        for branch in &branches {
            let context = generation_context(branch, plugin_context.as_ref());
            let request = self.request_for(branch, &context)?;

            tracing::debug!(
                row = branch.original_index(),
                variation = ?branch.variation_index(),
                strategy = strategy.name(),
                "Generating"
            );
            let result = strategy.generate(&request).await?;

            next.extend(flow::apply_generation(
                std::slice::from_ref(branch),
                request.user_turn(),
                &result,
                self.step.output(),
                self.step.name(),
            ));
        }
        Ok(next)
    }

    /// Resolve the step configuration against one work item.
    ///
    /// # Errors
    ///
    /// Returns an error if a prompt or the output path references an unknown value.
    pub fn request_for(
        &self,
        item: &WorkItem,
        context: &JsonValue,
    ) -> TesseraResult<GenerationRequest> {
        let prompt = match self.step.prompt() {
            Some(template) => render(template, context)?,
            None => String::new(),
        };

        let mut parts: Vec<ContentPart> = item.accumulated_content().clone();
        parts.push(ContentPart::Text(prompt));
        let user_turn = Message {
            role: Role::User,
            content: parts,
        };

        let mut builder = GenerationRequest::builder();
        builder
            .history(item.history().clone())
            .user_turn(user_turn)
            .options(self.model.to_options())
            .cache_salt(base_salt(self.step.name(), item))
            .max_retries(*self.step.max_retries())
            .text_extension(self.step.text_extension().clone());

        if let Some(template) = self.step.system_prompt() {
            builder.system_prompt(render(template, context)?);
        }
        if let Some(template) = self.step.output_path() {
            builder.output_path(self.paths.resolve(&render(template, context)?));
        }
        if let Some(schema) = self.step.schema() {
            builder.schema(schema.clone());
        }
        if let Some(template) = self.step.verify_command() {
            builder.verify_command(render_command(template, context)?);
        }
        if let Some(template) = self.step.post_process_command() {
            builder.post_process_command(render_command(template, context)?);
        }
        if let Some(feedback) = self.step.feedback() {
            builder.feedback_loops(*feedback.loops());
            if let Some(model) = feedback.model() {
                builder.feedback_options(model.merged(&self.model).to_options());
            }
            if let Some(instructions) = feedback.instructions() {
                builder.feedback_instructions(instructions.clone());
            }
        }

        builder.build().map_err(|e| {
            tessera_error::GenerationError::new(
                tessera_error::GenerationErrorKind::Configuration(e.to_string()),
            )
            .into()
        })
    }
}

/// Template context for generation: the item's own context, completed with the
/// plugin outputs of this step.
fn generation_context(item: &WorkItem, plugin_context: Option<&JsonValue>) -> JsonValue {
    let mut context = item.template_context();
    if let (JsonValue::Object(map), Some(JsonValue::Object(plugins))) = (&mut context, plugin_context)
    {
        for (key, value) in plugins {
            map.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
    context
}

/// Render a command template, keeping the file placeholder for the command runner.
fn render_command(template: &str, context: &JsonValue) -> TesseraResult<String> {
    let mut context = context.clone();
    if let JsonValue::Object(map) = &mut context {
        map.insert(
            "file".to_string(),
            JsonValue::String(FILE_PLACEHOLDER.to_string()),
        );
    }
    Ok(render(template, &context)?)
}

fn base_salt(step: &str, item: &WorkItem) -> String {
    match item.variation_index() {
        Some(variation) => format!("{}_r{}_v{}", step, item.original_index(), variation),
        None => format!("{}_r{}", step, item.original_index()),
    }
}
