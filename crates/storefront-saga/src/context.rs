/// Ambient state shared by every step of one saga invocation.
///
/// Steps only ever see the context through a shared reference, so the tenant
/// id and handle are read-only to them. The list of completed steps is
/// appended by the orchestrator after each successful `execute` and never
/// shrinks.
///
/// # Type Parameters
///
/// - `H`: Handle to the collaborators steps need (storage, event bus, settings)
#[derive(Debug)]
pub struct WorkflowContext<H> {
    tenant_id: String,
    handle: H,
    completed_steps: Vec<String>,
}

impl<H> WorkflowContext<H> {
    /// Create a fresh context for one invocation.
    #[must_use]
    pub fn new(tenant_id: impl Into<String>, handle: H) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            handle,
            completed_steps: Vec::new(),
        }
    }

    /// Tenant every storage read and write must be scoped to.
    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    #[must_use]
    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Names of the steps that finished `execute`, in completion order.
    #[must_use]
    pub fn completed_steps(&self) -> &[String] {
        &self.completed_steps
    }

    pub(crate) fn record_completed(&mut self, step: &str) {
        self.completed_steps.push(step.to_string());
    }

    /// Consume the context, returning the handle.
    #[must_use]
    pub fn into_handle(self) -> H {
        self.handle
    }
}
