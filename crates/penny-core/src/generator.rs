//! External collaborators: the task generator and the money coach.
//!
//! Both are called off-thread through [`crate::staging`], so implementations
//! may block (network, model inference). Whatever they return is treated as
//! untrusted and normalized by the scheduler.

use penny_logic::advice::tidy_advice;
use penny_logic::generation::{parse_task_payload, CollaboratorError, GenerationRequest, TaskDefinition};

pub trait TaskGenerator: Send + Sync {
    fn generate(&self, request: &GenerationRequest) -> Result<Vec<TaskDefinition>, CollaboratorError>;
}

pub trait AdviceProvider: Send + Sync {
    fn advise(&self, context: &str) -> Result<String, CollaboratorError>;
}

/// No generator configured. Every month runs on the fallback task list.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineGenerator;

impl TaskGenerator for OfflineGenerator {
    fn generate(&self, _request: &GenerationRequest) -> Result<Vec<TaskDefinition>, CollaboratorError> {
        Err(CollaboratorError::Unavailable("no task generator configured".into()))
    }
}

/// Returns the same definitions for every month.
#[derive(Debug, Clone, Default)]
pub struct StaticGenerator {
    definitions: Vec<TaskDefinition>,
}

impl StaticGenerator {
    pub fn new(definitions: Vec<TaskDefinition>) -> Self {
        Self { definitions }
    }
}

impl TaskGenerator for StaticGenerator {
    fn generate(&self, _request: &GenerationRequest) -> Result<Vec<TaskDefinition>, CollaboratorError> {
        Ok(self.definitions.clone())
    }
}

/// Adapts a text-returning backend (typically a language model) into a
/// [`TaskGenerator`]. The raw text is parsed with [`parse_task_payload`].
pub struct PayloadGenerator<F> {
    fetch: F,
}

impl<F> PayloadGenerator<F>
where
    F: Fn(&GenerationRequest) -> Result<String, CollaboratorError> + Send + Sync,
{
    pub fn new(fetch: F) -> Self {
        Self { fetch }
    }
}

impl<F> TaskGenerator for PayloadGenerator<F>
where
    F: Fn(&GenerationRequest) -> Result<String, CollaboratorError> + Send + Sync,
{
    fn generate(&self, request: &GenerationRequest) -> Result<Vec<TaskDefinition>, CollaboratorError> {
        let raw = (self.fetch)(request)?;
        parse_task_payload(&raw)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineCoach;

impl AdviceProvider for OfflineCoach {
    fn advise(&self, _context: &str) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::Unavailable("Coach unavailable.".into()))
    }
}

/// Gives the same reply to every question.
#[derive(Debug, Clone)]
pub struct CannedCoach {
    reply: String,
}

impl CannedCoach {
    pub fn new(reply: impl Into<String>) -> Self {
        Self { reply: reply.into() }
    }
}

impl AdviceProvider for CannedCoach {
    fn advise(&self, _context: &str) -> Result<String, CollaboratorError> {
        tidy_advice(&self.reply).ok_or_else(|| CollaboratorError::Malformed("No advice returned.".into()))
    }
}
