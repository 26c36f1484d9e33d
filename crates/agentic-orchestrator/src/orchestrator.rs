//! Orchestrator implementation.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use storefront_agentic_capabilities::{CapabilityTransport, Framework};

use crate::{
    capabilities::CapabilitySet,
    config::OrchestratorConfig,
    error::OrchestrationError,
    ledger::StepLedger,
    patterns::{
        ConcurrentStrategy, GroupChatScript, GroupChatStrategy, HandoffStrategy,
        MagenticStrategy, OrchestrationStrategy, RunContext, SequentialStrategy,
    },
    response::ResponseAssembler,
    routing::HandoffTable,
    types::{OrchestrationRequest, OrchestrationRun, Strategy},
};

/// Per-run options.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Backend for this run; the configured default when `None`.
    pub framework: Option<Framework>,
    /// Token cancelling the run.
    pub cancel: Option<CancellationToken>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn framework(mut self, framework: Framework) -> Self {
        self.framework = Some(framework);
        self
    }

    #[must_use]
    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Entry point running any of the five strategies.
///
/// Stateless between runs: every `execute` call gets its own ledger and run
/// id, so one orchestrator can serve concurrent requests.
pub struct Orchestrator {
    capabilities: Arc<CapabilitySet>,
    config: OrchestratorConfig,
    sequential: SequentialStrategy,
    concurrent: ConcurrentStrategy,
    handoff: HandoffStrategy,
    group_chat: GroupChatStrategy,
    magentic: MagenticStrategy,
}

impl Orchestrator {
    /// Create an orchestrator over `capabilities` with default settings.
    #[must_use]
    pub fn new(capabilities: CapabilitySet) -> Self {
        Self {
            capabilities: Arc::new(capabilities),
            config: OrchestratorConfig::default(),
            sequential: SequentialStrategy::new(),
            concurrent: ConcurrentStrategy::new(),
            handoff: HandoffStrategy::default(),
            group_chat: GroupChatStrategy::default(),
            magentic: MagenticStrategy::new(),
        }
    }

    /// Create an orchestrator over `capabilities` with `config`.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Config`] if the configuration is invalid.
    pub fn configured(
        capabilities: CapabilitySet,
        config: OrchestratorConfig,
    ) -> Result<Self, OrchestrationError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(capabilities)
        })
    }

    /// Create an orchestrator with every capability on one transport.
    ///
    /// Client timeouts come from `config.capability_timeout_ms`.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Config`] if the configuration is invalid.
    pub fn from_transport(
        transport: Arc<dyn CapabilityTransport>,
        config: OrchestratorConfig,
    ) -> Result<Self, OrchestrationError> {
        let capabilities = CapabilitySet::from_transport(transport, config.capability_timeout());
        Self::configured(capabilities, config)
    }

    /// Create an orchestrator talking HTTP to the configured endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    #[cfg(feature = "http")]
    pub fn from_config(config: OrchestratorConfig) -> Result<Self, OrchestrationError> {
        config.validate()?;
        let capabilities =
            CapabilitySet::http(config.transport.clone(), config.capability_timeout())?;
        Self::configured(capabilities, config)
    }

    /// Replace the Handoff transition table.
    #[must_use]
    pub fn with_handoff_table(mut self, table: HandoffTable) -> Self {
        self.handoff = HandoffStrategy::new(table);
        self
    }

    /// Replace the GroupChat script.
    #[must_use]
    pub fn with_group_chat_script(mut self, script: GroupChatScript) -> Self {
        self.group_chat = GroupChatStrategy::new(script);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    fn strategy_for(&self, strategy: Strategy) -> &dyn OrchestrationStrategy {
        match strategy {
            Strategy::Sequential => &self.sequential,
            Strategy::Concurrent => &self.concurrent,
            Strategy::Handoff => &self.handoff,
            Strategy::GroupChat => &self.group_chat,
            Strategy::Magentic => &self.magentic,
        }
    }

    /// Run `strategy` for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::StrategyFailed`] if the strategy faults.
    pub async fn execute(
        &self,
        strategy: Strategy,
        request: &OrchestrationRequest,
    ) -> Result<OrchestrationRun, OrchestrationError> {
        self.execute_with(strategy, request, RunOptions::default())
            .await
    }

    /// Run `strategy` for `request` until done or `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Cancelled`] if `cancel` fires first.
    pub async fn execute_with_cancellation(
        &self,
        strategy: Strategy,
        request: &OrchestrationRequest,
        cancel: CancellationToken,
    ) -> Result<OrchestrationRun, OrchestrationError> {
        self.execute_with(strategy, request, RunOptions::new().cancel(cancel))
            .await
    }

    /// Run `strategy` for `request` with explicit options.
    ///
    /// A run either completes with a full [`OrchestrationRun`] or fails; there
    /// is no partial result. Capability failures never fail a run.
    ///
    /// # Errors
    ///
    /// - [`OrchestrationError::Cancelled`] if the run was cancelled
    /// - [`OrchestrationError::StrategyFailed`] if the strategy panicked or
    ///   recorded no step
    #[instrument(skip(self, request, options), fields(strategy = %strategy, user_id = %request.user_id()))]
    pub async fn execute_with(
        &self,
        strategy: Strategy,
        request: &OrchestrationRequest,
        options: RunOptions,
    ) -> Result<OrchestrationRun, OrchestrationError> {
        let start = std::time::Instant::now();
        let run_id = Uuid::new_v4();
        let cancel = options.cancel.unwrap_or_default();
        let framework = options.framework.unwrap_or(self.config.framework);

        if cancel.is_cancelled() {
            return Err(OrchestrationError::Cancelled);
        }

        info!(run_id = %run_id, framework = %framework, "Starting orchestration");

        let ctx = RunContext {
            run_id,
            request,
            capabilities: &self.capabilities,
            config: &self.config,
            framework,
            cancel,
        };
        let mut ledger = StepLedger::new();

        let outcome = AssertUnwindSafe(self.strategy_for(strategy).run(&ctx, &mut ledger))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                info!(run_id = %run_id, error = %e, "Orchestration stopped");
                return Err(e);
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(run_id = %run_id, error = %message, "Strategy panicked");
                return Err(OrchestrationError::StrategyFailed { strategy, message });
            }
        }

        if ledger.is_empty() {
            return Err(OrchestrationError::StrategyFailed {
                strategy,
                message: "no steps recorded".to_string(),
            });
        }

        let degraded = ledger.iter().filter(|s| s.is_degraded()).count();
        debug!(run_id = %run_id, steps = ledger.len(), "Assembling response");
        let run = ResponseAssembler::assemble(run_id, strategy, request, ledger);

        info!(
            run_id = %run_id,
            steps = run.steps.len(),
            degraded,
            duration_ms = %start.elapsed().as_millis(),
            "Orchestration completed"
        );

        Ok(run)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("capabilities", &self.capabilities)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "strategy panicked".to_string()
    }
}
