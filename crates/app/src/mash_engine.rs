//! Mash automation engine: drives a loaded batch through its steps.
//!
//! The engine owns the single [`AutomationState`] record. Every entry point
//! takes the transition lock, re-reads the state from the store, applies one
//! transition and persists the result before acting on it further. Telemetry,
//! timer wake-ups and operator calls may race; the lock serializes them and
//! the fresh read makes duplicate triggers harmless.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use brewhub_domain::device::{DeviceRef, Reading};
use brewhub_domain::error::{AutomationError, BrewhubError, DeviceError};
use brewhub_domain::event::{Event, EventType};
use brewhub_domain::recipe::{
    BatchStatus, BatchSummary, Recipe, RecipeSummary, validate_batch_id, validate_recipe_id,
};
use brewhub_domain::settings::Settings;
use brewhub_domain::state::{AutomationState, Mode, Stage, Timer};
use brewhub_domain::step::StepPolicy;
use brewhub_domain::time::{self, Timestamp};

use crate::ports::{
    DeviceGateway, EventPublisher, RecipeService, ScheduledTask, Scheduler, StateStore,
};

const STATE_KEY: &str = "state";
const SETTINGS_KEY: &str = "settings";

/// Static engine configuration, injected at construction.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub settings: Settings,
    /// Store namespace for the `state` and `settings` records.
    pub namespace: String,
    /// Upper bound applied to every device gateway call.
    pub device_timeout: Duration,
}

impl EngineConfig {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            namespace: "brewhub".to_string(),
            device_timeout: Duration::from_secs(5),
        }
    }
}

struct Armed<T> {
    generation: u64,
    deadline: Timestamp,
    task: T,
}

/// The mash automation state machine.
pub struct MashEngine<RS, DG, SS, EP, SC: Scheduler> {
    recipes: RS,
    gateway: DG,
    store: SS,
    publisher: EP,
    scheduler: SC,
    config: EngineConfig,
    transitions: tokio::sync::Mutex<()>,
    wake_up: Mutex<Option<Armed<SC::Task>>>,
    generation: AtomicU64,
}

impl<RS, DG, SS, EP, SC> MashEngine<RS, DG, SS, EP, SC>
where
    RS: RecipeService + Send + Sync + 'static,
    DG: DeviceGateway + Send + Sync + 'static,
    SS: StateStore + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    SC: Scheduler + 'static,
{
    pub fn new(
        recipes: RS,
        gateway: DG,
        store: SS,
        publisher: EP,
        scheduler: SC,
        config: EngineConfig,
    ) -> Self {
        Self {
            recipes,
            gateway,
            store,
            publisher,
            scheduler,
            config,
            transitions: tokio::sync::Mutex::new(()),
            wake_up: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Persist the settings record so operators can see which actuator is driven.
    ///
    /// # Errors
    ///
    /// Returns a storage or serialization error if the write fails.
    #[tracing::instrument(skip(self))]
    pub async fn initialize(&self) -> Result<(), BrewhubError> {
        let value = serde_json::to_value(&self.config.settings)?;
        self.store
            .set(&self.config.namespace, SETTINGS_KEY, value)
            .await?;
        tracing::info!(
            service_id = %self.setpoint_device().service_id,
            device_id = %self.setpoint_device().id,
            "settings persisted"
        );
        Ok(())
    }

    /// Settings as persisted, falling back to the configured ones.
    ///
    /// # Errors
    ///
    /// Returns a storage or serialization error if the read fails.
    pub async fn get_settings(&self) -> Result<Settings, BrewhubError> {
        match self.store.get(&self.config.namespace, SETTINGS_KEY).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(self.config.settings.clone()),
        }
    }

    /// The current automation state.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::NotLoaded`] when no batch was ever loaded.
    pub async fn get_state(&self) -> Result<AutomationState, BrewhubError> {
        self.require_state().await
    }

    /// List batches from the recipe service.
    ///
    /// # Errors
    ///
    /// Propagates recipe service failures.
    pub async fn get_batches(
        &self,
        status: Option<BatchStatus>,
    ) -> Result<Vec<BatchSummary>, BrewhubError> {
        self.recipes.get_batches(status).await
    }

    /// List recipes from the recipe service.
    ///
    /// # Errors
    ///
    /// Propagates recipe service failures.
    pub async fn get_recipes(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<RecipeSummary>, BrewhubError> {
        self.recipes.get_recipes(offset, limit).await
    }

    /// Fetch one recipe from the recipe service.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyRecipeId`](brewhub_domain::error::ValidationError::EmptyRecipeId)
    /// for a blank id, otherwise propagates recipe service failures.
    pub async fn get_recipe(&self, recipe_id: &str) -> Result<Recipe, BrewhubError> {
        let recipe_id = validate_recipe_id(recipe_id)?;
        self.recipes.get_recipe(recipe_id).await
    }

    pub async fn gateway_ready(&self) -> bool {
        self.gateway.is_ready().await
    }

    /// Deadline of the armed wake-up, if any.
    pub fn armed_deadline(&self) -> Option<Timestamp> {
        self.wake_up_slot().as_ref().map(|armed| armed.deadline)
    }

    /// Fetch and validate a batch, then replace the automation state with it.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank id or an empty stage, and
    /// propagates recipe service and storage failures. Nothing is written
    /// unless the batch is valid.
    #[tracing::instrument(skip(self))]
    pub async fn load_batch(&self, batch_id: &str) -> Result<AutomationState, BrewhubError> {
        let batch_id = validate_batch_id(batch_id)?;
        let batch = self.recipes.get_batch(batch_id).await?;
        let brewtracker = self.recipes.get_brewtracker(batch_id).await?;
        brewtracker.validate()?;

        let _guard = self.transitions.lock().await;
        self.cancel_wake_up();

        let state = AutomationState::loaded(
            batch_id,
            batch.recipe.id,
            batch.recipe.name,
            brewtracker.stages,
        );
        self.save_state(&state).await?;
        tracing::info!(recipe = %state.recipe_name, stages = state.raw_steps.len(), "batch loaded");
        self.notify(
            EventType::BatchLoaded,
            format!("Loaded {}", state.recipe_name),
            serde_json::json!({
                "batch_id": state.batch_id,
                "recipe_name": state.recipe_name,
            }),
        )
        .await;
        Ok(state)
    }

    /// Stamp the mash start time and run the first transition.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::NotLoaded`] without a loaded batch, and any
    /// error of the first transition.
    #[tracing::instrument(skip(self))]
    pub async fn start_automated_mash(self: &Arc<Self>) -> Result<(), BrewhubError> {
        let _guard = self.transitions.lock().await;
        let mut state = self.require_state().await?;
        let started = time::now();
        state.mash_start_time = Some(started);
        state.stage = Stage::Mash;
        state.stage_index = 0;
        self.save_state(&state).await?;
        tracing::info!(batch_id = %state.batch_id, %started, "mash started");
        self.notify(
            EventType::MashStarted,
            format!("Mash started for {}", state.recipe_name),
            serde_json::json!({ "batch_id": state.batch_id, "mash_start_time": started }),
        )
        .await;
        self.advance().await
    }

    /// Move to the next step and apply its policy.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::StageComplete`] when the stage has no more
    /// steps, a validation error for a malformed step, and device timeouts
    /// from the setpoint write. The persisted state keeps its last
    /// successfully written value in every case.
    #[tracing::instrument(skip(self))]
    pub async fn proceed_to_next_step(self: &Arc<Self>) -> Result<(), BrewhubError> {
        let _guard = self.transitions.lock().await;
        self.advance().await
    }

    /// React to telemetry from the device controller.
    ///
    /// Only acts while heating, and only on a reading from the configured
    /// setpoint device that meets or exceeds the step target.
    ///
    /// # Errors
    ///
    /// Propagates errors of the resulting transition.
    #[tracing::instrument(skip_all, fields(readings = readings.len()))]
    pub async fn on_actuator_telemetry(self: &Arc<Self>, readings: &[Reading]) -> Result<(), BrewhubError> {
        let _guard = self.transitions.lock().await;
        let Some(state) = self.load_state().await? else {
            return Ok(());
        };
        if state.mode != Mode::Heat {
            return Ok(());
        }
        let device = self.setpoint_device();
        let Some(reading) = readings.iter().find(|reading| reading.is_from(device)) else {
            tracing::debug!(device_id = %device.id, "no reading for setpoint device");
            return Ok(());
        };
        let target = state
            .heat_target()
            .ok_or(AutomationError::InconsistentState("heating without an active step"))?;
        if reading.value < target {
            tracing::debug!(value = reading.value, target, "target not reached yet");
            return Ok(());
        }
        tracing::info!(value = reading.value, target, "heating target reached");
        self.advance().await
    }

    /// Start a timed wait on the current step.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::InvalidTimer`] for a zero duration and
    /// [`AutomationError::NotLoaded`] without a loaded batch.
    #[tracing::instrument(skip(self))]
    pub async fn start_timer(self: &Arc<Self>, duration_secs: u64) -> Result<(), BrewhubError> {
        let _guard = self.transitions.lock().await;
        let state = self.require_state().await?;
        self.start_timer_locked(state, duration_secs).await
    }

    /// Re-arm a persisted timer after a restart or a gateway reconnect.
    ///
    /// Does nothing unless the state is resting and no wake-up is armed in
    /// this process. An overdue timer counts as fired.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::InconsistentState`] when the state rests
    /// without a persisted timer.
    #[tracing::instrument(skip(self))]
    pub async fn restore_timer(self: &Arc<Self>) -> Result<(), BrewhubError> {
        let _guard = self.transitions.lock().await;
        let Some(state) = self.load_state().await? else {
            return Ok(());
        };
        if state.mode != Mode::Rest || self.armed_deadline().is_some() {
            return Ok(());
        }
        let timer = state
            .timer
            .ok_or(AutomationError::InconsistentState("rest mode without a persisted timer"))?;
        if timer.is_overdue(time::now()) {
            tracing::info!(deadline = %timer.expected_end_time, "timer elapsed while away");
            return self.end_timer().await;
        }
        self.schedule_wake_up(timer.expected_end_time)?;
        tracing::info!(deadline = %timer.expected_end_time, "timer restored");
        Ok(())
    }

    /// Arm the single wake-up for `deadline`, cancelling any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::PastDeadline`] when `deadline` is not in
    /// the future. The previous wake-up is cancelled regardless.
    pub fn schedule_wake_up(self: &Arc<Self>, deadline: Timestamp) -> Result<(), AutomationError> {
        self.cancel_wake_up();
        let delay = time::until(deadline, time::now())
            .ok_or(AutomationError::PastDeadline { deadline })?;
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let engine = Arc::clone(self);
        let task = self.scheduler.schedule(delay, async move {
            engine.on_wake_up(generation).await;
        });
        *self.wake_up_slot() = Some(Armed {
            generation,
            deadline,
            task,
        });
        tracing::debug!(%deadline, generation, "wake-up armed");
        Ok(())
    }

    /// Read the setpoint block, replace its stored setting with `target` and
    /// write it back.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Timeout`] when either call exceeds the device
    /// timeout and [`DeviceError::MissingSetting`] when the block has no
    /// stored setting.
    #[tracing::instrument(skip(self))]
    pub async fn adjust_setpoint(&self, target: f64) -> Result<(), BrewhubError> {
        let device = self.setpoint_device();
        let block = self
            .bounded(device, "read", self.gateway.read(device))
            .await?;
        let previous = block.stored_setting();
        let patch = block
            .stored_setting_patch(target)
            .ok_or_else(|| DeviceError::MissingSetting {
                device_id: device.id.clone(),
            })?;
        let updated = self
            .bounded(device, "patch", self.gateway.patch(device, patch))
            .await?;
        tracing::info!(
            device_id = %device.id,
            previous = ?previous,
            current = ?updated.stored_setting(),
            "setpoint adjusted"
        );
        Ok(())
    }

    /// Cancel the armed wake-up. Called on shutdown.
    pub fn shutdown(&self) {
        self.cancel_wake_up();
        tracing::info!("mash engine stopped");
    }

    async fn advance(self: &Arc<Self>) -> Result<(), BrewhubError> {
        loop {
            let mut state = self.require_state().await?;

            let stage_index = state
                .stage_position()
                .ok_or(AutomationError::InconsistentState("stage index is negative"))?;
            let next = state.step_index + 1;
            let Some(step) = state.step_at(next).cloned() else {
                return Err(AutomationError::StageComplete {
                    stage_index,
                    step_index: next,
                }
                .into());
            };
            let policy = step.classify(stage_index, usize::try_from(next).unwrap_or_default())?;
            self.cancel_wake_up();

            state.step_index = next;
            state.mode = Mode::Standby;
            state.timer = None;
            let label = step.label().to_string();
            tracing::debug!(step_index = next, step = %label, ?policy, "advancing");

            match policy {
                StepPolicy::AutoAdvance => {
                    state.step = Some(step);
                    self.save_state(&state).await?;
                    self.notify(
                        EventType::StepAutoAdvanced,
                        format!("{label} complete, proceeding"),
                        serde_json::json!({ "step_index": next }),
                    )
                    .await;
                }
                StepPolicy::PauseForHeat { target } => {
                    self.adjust_setpoint(target.value).await?;
                    let mut step = step;
                    step.value = target.value;
                    state.step = Some(step);
                    state.mode = Mode::Heat;
                    self.save_state(&state).await?;
                    tracing::info!(step_index = next, %target, "heating");
                    self.notify(
                        EventType::HeatingStarted,
                        format!("Heating to {target}"),
                        serde_json::json!({ "step_index": next, "target": target }),
                    )
                    .await;
                    return Ok(());
                }
                StepPolicy::PauseForUser { description } => {
                    state.step = Some(step);
                    self.save_state(&state).await?;
                    tracing::info!(step_index = next, %description, "waiting for operator");
                    self.notify(
                        EventType::AutomationPaused,
                        format!("Automation paused: {description}"),
                        serde_json::json!({ "step_index": next }),
                    )
                    .await;
                    return Ok(());
                }
                StepPolicy::TimedWait { duration_secs } => {
                    state.step = Some(step);
                    self.save_state(&state).await?;
                    return self.start_timer_locked(state, duration_secs).await;
                }
            }
        }
    }

    async fn start_timer_locked(
        self: &Arc<Self>,
        mut state: AutomationState,
        duration_secs: u64,
    ) -> Result<(), BrewhubError> {
        let timer = Timer::start(time::now(), duration_secs)?;
        state.mode = Mode::Rest;
        state.timer = Some(timer);
        self.save_state(&state).await?;
        tracing::info!(duration_secs, deadline = %timer.expected_end_time, "timer started");
        self.notify(
            EventType::TimerStarted,
            format!("Waiting {duration_secs}s"),
            serde_json::json!({ "step_index": state.step_index, "timer": timer }),
        )
        .await;
        self.schedule_wake_up(timer.expected_end_time)?;
        Ok(())
    }

    async fn on_wake_up(self: Arc<Self>, generation: u64) {
        let _guard = self.transitions.lock().await;
        if !self.claim_wake_up(generation) {
            tracing::debug!(generation, "ignoring stale wake-up");
            return;
        }
        if let Err(err) = self.end_timer().await {
            report_autonomous_failure("timer", &err);
        }
    }

    async fn end_timer(self: &Arc<Self>) -> Result<(), BrewhubError> {
        let mut state = self.require_state().await?;
        if state.mode != Mode::Rest {
            tracing::debug!(mode = %state.mode, "timer fired outside rest mode");
            return Ok(());
        }
        state.timer = None;
        state.mode = Mode::Standby;
        self.save_state(&state).await?;
        self.notify(
            EventType::TimerElapsed,
            "Timer over, proceeding",
            serde_json::json!({ "step_index": state.step_index }),
        )
        .await;
        self.advance().await
    }

    async fn bounded<T>(
        &self,
        device: &DeviceRef,
        operation: &'static str,
        call: impl Future<Output = Result<T, BrewhubError>>,
    ) -> Result<T, BrewhubError> {
        tokio::time::timeout(self.config.device_timeout, call)
            .await
            .map_err(|_| DeviceError::Timeout {
                device_id: device.id.clone(),
                operation,
                timeout_secs: self.config.device_timeout.as_secs(),
            })?
    }

    fn setpoint_device(&self) -> &DeviceRef {
        self.config.settings.setpoint_device()
    }

    async fn load_state(&self) -> Result<Option<AutomationState>, BrewhubError> {
        self.store
            .get(&self.config.namespace, STATE_KEY)
            .await?
            .map(serde_json::from_value)
            .transpose()
            .map_err(BrewhubError::from)
    }

    async fn require_state(&self) -> Result<AutomationState, BrewhubError> {
        self.load_state()
            .await?
            .ok_or_else(|| AutomationError::NotLoaded.into())
    }

    async fn save_state(&self, state: &AutomationState) -> Result<(), BrewhubError> {
        let value = serde_json::to_value(state)?;
        self.store.set(&self.config.namespace, STATE_KEY, value).await
    }

    async fn notify(&self, event_type: EventType, message: impl Into<String>, data: serde_json::Value) {
        let event = Event::new(event_type, message, data);
        if let Err(err) = self.publisher.publish(event).await {
            tracing::warn!(%event_type, error = ?err, "failed to publish notification");
        }
    }

    fn wake_up_slot(&self) -> MutexGuard<'_, Option<Armed<SC::Task>>> {
        self.wake_up.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cancel_wake_up(&self) {
        if let Some(armed) = self.wake_up_slot().take() {
            armed.task.cancel();
            tracing::debug!(generation = armed.generation, "wake-up cancelled");
        }
    }

    fn claim_wake_up(&self, generation: u64) -> bool {
        let mut slot = self.wake_up_slot();
        match slot.as_ref() {
            Some(armed) if armed.generation == generation => {
                *slot = None;
                true
            }
            _ => false,
        }
    }
}

/// Log a failure of a transition nobody is waiting on.
///
/// Running out of steps is expected at the end of a stage and only warrants
/// a warning.
pub fn report_autonomous_failure(trigger: &'static str, err: &BrewhubError) {
    if err.is_stage_complete() {
        tracing::warn!(trigger, error = ?err, "stage complete, automation stopped");
    } else {
        tracing::error!(trigger, error = ?err, "automation transition failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use brewhub_domain::error::ValidationError;
    use brewhub_domain::recipe::StageSteps;
    use brewhub_domain::state::NOT_STARTED;
    use brewhub_domain::step::Step;
    use chrono::TimeDelta;

    use crate::testing::{FakeGateway, FakeRecipes, ManualScheduler, MemoryStore, SpyPublisher};

    // -- helpers --

    type TestEngine = MashEngine<FakeRecipes, FakeGateway, MemoryStore, SpyPublisher, ManualScheduler>;

    struct Harness {
        engine: Arc<TestEngine>,
        gateway: FakeGateway,
        store: MemoryStore,
        publisher: SpyPublisher,
        scheduler: ManualScheduler,
    }

    fn settings() -> Settings {
        Settings::new(DeviceRef::new("spark-one", "HERMS MT Setpoint"))
    }

    fn harness_with(recipes: FakeRecipes, gateway: FakeGateway, publisher: SpyPublisher) -> Harness {
        let store = MemoryStore::default();
        let scheduler = ManualScheduler::default();
        let engine = Arc::new(MashEngine::new(
            recipes,
            gateway.clone(),
            store.clone(),
            publisher.clone(),
            scheduler.clone(),
            EngineConfig::new(settings()),
        ));
        Harness {
            engine,
            gateway,
            store,
            publisher,
            scheduler,
        }
    }

    fn harness(steps: Vec<Step>) -> Harness {
        harness_with(
            FakeRecipes::with_steps(steps),
            FakeGateway::new(),
            SpyPublisher::default(),
        )
    }

    fn step(pause_before: Option<bool>) -> Step {
        Step {
            description: "step".to_string(),
            kind: "event".to_string(),
            name: None,
            pause_before,
            value: 0.0,
            tooltip: None,
            duration: None,
        }
    }

    fn heat_step(tooltip: &str) -> Step {
        Step {
            tooltip: Some(tooltip.to_string()),
            value: 1.0,
            ..step(Some(true))
        }
    }

    fn timed_step(duration: u64) -> Step {
        Step {
            duration: Some(duration),
            ..step(None)
        }
    }

    fn reading(value: f64) -> Reading {
        Reading {
            service_id: "spark-one".to_string(),
            device_id: "HERMS MT Setpoint".to_string(),
            value,
        }
    }

    fn resting_state(steps: Vec<Step>, expected_end_time: Timestamp) -> AutomationState {
        let mut state = AutomationState::loaded(
            "B1",
            None,
            "Tripel",
            vec![StageSteps {
                name: "Mash".to_string(),
                steps,
            }],
        );
        state.step_index = 0;
        state.step = state.step_at(0).cloned();
        state.mode = Mode::Rest;
        state.timer = Some(Timer {
            start_time: expected_end_time - TimeDelta::seconds(600),
            duration: 600,
            expected_end_time,
        });
        state
    }

    // -- load / start --

    #[tokio::test]
    async fn should_persist_fresh_state_when_loading_batch() {
        let h = harness(vec![step(Some(true))]);

        let state = h.engine.load_batch(" B1 ").await.unwrap();

        assert_eq!(state.batch_id, "B1");
        assert_eq!(state.recipe_id.as_deref(), Some("R1"));
        assert_eq!(state.recipe_name, "Tripel");
        assert_eq!(state.step_index, NOT_STARTED);
        assert_eq!(state.mode, Mode::Standby);
        assert_eq!(h.store.state(), Some(state));
        assert_eq!(h.publisher.count(EventType::BatchLoaded), 1);
    }

    #[tokio::test]
    async fn should_reject_blank_batch_id_before_fetching() {
        let h = harness(vec![step(Some(true))]);

        let err = h.engine.load_batch("  ").await.unwrap_err();

        assert!(matches!(err, BrewhubError::Validation(ValidationError::EmptyBatchId)));
        assert_eq!(h.store.writes(), 0);
    }

    #[tokio::test]
    async fn should_fetch_recipe_by_trimmed_id() {
        let h = harness(Vec::new());

        let recipe = h.engine.get_recipe(" R1 ").await.unwrap();

        assert_eq!(recipe.name, "Tripel");
        assert_eq!(h.store.writes(), 0);
    }

    #[tokio::test]
    async fn should_reject_blank_recipe_id() {
        let h = harness(Vec::new());

        let err = h.engine.get_recipe("").await.unwrap_err();

        assert!(matches!(err, BrewhubError::Validation(ValidationError::EmptyRecipeId)));
    }

    #[tokio::test]
    async fn should_propagate_unknown_recipe_as_not_found() {
        let h = harness(Vec::new());

        let err = h.engine.get_recipe("R9").await.unwrap_err();

        assert!(matches!(err, BrewhubError::NotFound(_)));
    }

    #[tokio::test]
    async fn should_abort_load_when_a_stage_is_empty() {
        let h = harness(Vec::new());

        let err = h.engine.load_batch("B1").await.unwrap_err();

        assert!(matches!(
            err,
            BrewhubError::Validation(ValidationError::EmptyRecipe { .. })
        ));
        assert_eq!(h.store.writes(), 0);
        assert!(h.store.state().is_none());
    }

    #[tokio::test]
    async fn should_cancel_pending_wake_up_when_loading_batch() {
        let h = harness(vec![timed_step(600), step(Some(true))]);
        h.engine.load_batch("B1").await.unwrap();
        h.engine.start_automated_mash().await.unwrap();
        assert_eq!(h.scheduler.outstanding(), 1);

        h.engine.load_batch("B2").await.unwrap();

        assert!(h.scheduler.is_cancelled(0));
        assert_eq!(h.scheduler.outstanding(), 0);
        assert!(h.engine.armed_deadline().is_none());
        assert_eq!(h.store.state().unwrap().batch_id, "B2");
    }

    #[tokio::test]
    async fn should_refuse_to_start_without_loaded_batch() {
        let h = harness(vec![step(Some(true))]);

        let err = h.engine.start_automated_mash().await.unwrap_err();

        assert!(matches!(err, BrewhubError::Automation(AutomationError::NotLoaded)));
        assert!(matches!(
            h.engine.get_state().await.unwrap_err(),
            BrewhubError::Automation(AutomationError::NotLoaded)
        ));
    }

    #[tokio::test]
    async fn should_stamp_start_time_and_run_first_step() {
        let h = harness(vec![step(Some(true))]);
        h.engine.load_batch("B1").await.unwrap();

        h.engine.start_automated_mash().await.unwrap();

        let state = h.store.state().unwrap();
        assert!(state.mash_start_time.is_some());
        assert_eq!(state.stage_index, 0);
        assert_eq!(state.step_index, 0);
        assert_eq!(h.publisher.count(EventType::MashStarted), 1);
        assert_eq!(h.publisher.count(EventType::AutomationPaused), 1);
    }

    // -- step progression --

    #[tokio::test]
    async fn should_chain_auto_advance_steps_until_pause() {
        let h = harness(vec![step(Some(false)), step(Some(false)), step(Some(true))]);
        h.engine.load_batch("B1").await.unwrap();
        let writes_before = h.store.writes();

        h.engine.proceed_to_next_step().await.unwrap();

        let state = h.store.state().unwrap();
        assert_eq!(state.step_index, 2);
        assert_eq!(state.mode, Mode::Standby);
        assert_eq!(h.publisher.count(EventType::StepAutoAdvanced), 2);
        assert_eq!(h.publisher.count(EventType::AutomationPaused), 1);
        assert_eq!(h.store.writes() - writes_before, 3);
    }

    #[tokio::test]
    async fn should_reject_malformed_step_without_writing() {
        let h = harness(vec![timed_step(0)]);
        h.engine.load_batch("B1").await.unwrap();
        let writes_before = h.store.writes();

        let err = h.engine.proceed_to_next_step().await.unwrap_err();

        assert!(matches!(
            err,
            BrewhubError::Validation(ValidationError::MalformedStep {
                stage_index: 0,
                step_index: 0,
                ..
            })
        ));
        assert_eq!(h.store.state().unwrap().step_index, NOT_STARTED);
        assert_eq!(h.store.writes(), writes_before);
    }

    #[tokio::test]
    async fn should_report_stage_complete_without_writing() {
        let h = harness(vec![step(Some(false))]);
        h.engine.load_batch("B1").await.unwrap();
        h.engine.proceed_to_next_step().await.unwrap_err();
        let writes_before = h.store.writes();

        let err = h.engine.proceed_to_next_step().await.unwrap_err();

        assert!(matches!(
            err,
            BrewhubError::Automation(AutomationError::StageComplete {
                stage_index: 0,
                step_index: 1,
            })
        ));
        assert_eq!(h.store.writes(), writes_before);
        assert_eq!(h.store.state().unwrap().step_index, 0);
    }

    #[tokio::test]
    async fn should_write_parsed_target_as_step_value_when_heating() {
        let h = harness(vec![heat_step("Heat to 65 °C")]);
        h.engine.load_batch("B1").await.unwrap();

        h.engine.proceed_to_next_step().await.unwrap();

        let state = h.store.state().unwrap();
        assert_eq!(state.mode, Mode::Heat);
        assert_eq!(state.step.unwrap().value, 65.0);
        assert_eq!(
            h.gateway.patches(),
            vec![serde_json::json!({"storedSetting": {"value": 65.0, "unit": "degC"}})]
        );
        assert_eq!(h.publisher.count(EventType::HeatingStarted), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_surface_device_timeout_and_keep_previous_state() {
        let h = harness_with(
            FakeRecipes::with_steps(vec![heat_step("Heat to 65 °C")]),
            FakeGateway::hanging(),
            SpyPublisher::default(),
        );
        h.engine.load_batch("B1").await.unwrap();
        let before = h.store.state();

        let err = h.engine.proceed_to_next_step().await.unwrap_err();

        assert!(matches!(
            err,
            BrewhubError::Device(DeviceError::Timeout {
                operation: "read",
                timeout_secs: 5,
                ..
            })
        ));
        assert_eq!(h.store.state(), before);
        assert_eq!(h.gateway.reads(), 1);
        assert!(h.gateway.patches().is_empty());
    }

    #[tokio::test]
    async fn should_fail_when_setpoint_block_has_no_stored_setting() {
        let h = harness_with(
            FakeRecipes::with_steps(vec![heat_step("Heat to 65 °C")]),
            FakeGateway::with_data(serde_json::json!({"value": {"value": 20.0}})),
            SpyPublisher::default(),
        );
        h.engine.load_batch("B1").await.unwrap();

        let err = h.engine.proceed_to_next_step().await.unwrap_err();

        assert!(matches!(
            err,
            BrewhubError::Device(DeviceError::MissingSetting { .. })
        ));
        assert_eq!(h.store.state().unwrap().step_index, NOT_STARTED);
    }

    #[tokio::test]
    async fn should_keep_going_when_notifier_fails() {
        let h = harness_with(
            FakeRecipes::with_steps(vec![step(Some(false)), step(Some(true))]),
            FakeGateway::new(),
            SpyPublisher::failing(),
        );

        h.engine.load_batch("B1").await.unwrap();
        h.engine.proceed_to_next_step().await.unwrap();

        assert_eq!(h.store.state().unwrap().step_index, 1);
    }

    // -- telemetry --

    #[tokio::test]
    async fn should_ignore_duplicate_qualifying_telemetry() {
        let h = harness(vec![heat_step("Mash in at 65 °C"), step(Some(true))]);
        h.engine.load_batch("B1").await.unwrap();
        h.engine.start_automated_mash().await.unwrap();

        h.engine.on_actuator_telemetry(&[reading(66.0)]).await.unwrap();
        h.engine.on_actuator_telemetry(&[reading(70.0)]).await.unwrap();

        let state = h.store.state().unwrap();
        assert_eq!(state.step_index, 1);
        assert_eq!(state.mode, Mode::Standby);
        assert_eq!(h.gateway.patches().len(), 1);
        assert_eq!(h.publisher.count(EventType::AutomationPaused), 1);
    }

    #[tokio::test]
    async fn should_wait_while_below_target() {
        let h = harness(vec![heat_step("65 °C"), step(Some(true))]);
        h.engine.load_batch("B1").await.unwrap();
        h.engine.start_automated_mash().await.unwrap();

        h.engine.on_actuator_telemetry(&[reading(64.9)]).await.unwrap();

        assert_eq!(h.store.state().unwrap().mode, Mode::Heat);
    }

    #[tokio::test]
    async fn should_ignore_readings_from_other_devices() {
        let h = harness(vec![heat_step("65 °C"), step(Some(true))]);
        h.engine.load_batch("B1").await.unwrap();
        h.engine.start_automated_mash().await.unwrap();
        let other = Reading {
            device_id: "HLT Setpoint".to_string(),
            ..reading(90.0)
        };

        h.engine.on_actuator_telemetry(&[other]).await.unwrap();
        h.engine.on_actuator_telemetry(&[]).await.unwrap();

        assert_eq!(h.store.state().unwrap().step_index, 0);
    }

    #[tokio::test]
    async fn should_ignore_telemetry_when_not_heating() {
        let h = harness(vec![step(Some(true)), step(Some(true))]);
        h.engine.load_batch("B1").await.unwrap();
        h.engine.start_automated_mash().await.unwrap();
        let writes_before = h.store.writes();

        h.engine.on_actuator_telemetry(&[reading(100.0)]).await.unwrap();

        assert_eq!(h.store.writes(), writes_before);
        assert_eq!(h.store.state().unwrap().step_index, 0);
    }

    // -- timers --

    #[tokio::test]
    async fn should_persist_timer_and_arm_single_wake_up() {
        let h = harness(vec![step(Some(true))]);
        h.engine.load_batch("B1").await.unwrap();

        h.engine.start_timer(600).await.unwrap();
        h.engine.start_timer(300).await.unwrap();

        let state = h.store.state().unwrap();
        let timer = state.timer.unwrap();
        assert_eq!(state.mode, Mode::Rest);
        assert_eq!(timer.expected_end_time - timer.start_time, TimeDelta::seconds(300));
        assert_eq!(h.engine.armed_deadline(), Some(timer.expected_end_time));
        assert!(h.scheduler.is_cancelled(0));
        assert_eq!(h.scheduler.outstanding(), 1);
        assert!(h.scheduler.delay(1) <= Duration::from_secs(300));
    }

    #[tokio::test]
    async fn should_reject_zero_duration_timer() {
        let h = harness(vec![step(Some(true))]);
        h.engine.load_batch("B1").await.unwrap();

        let err = h.engine.start_timer(0).await.unwrap_err();

        assert!(matches!(
            err,
            BrewhubError::Automation(AutomationError::InvalidTimer { duration_secs: 0 })
        ));
        assert_eq!(h.scheduler.scheduled(), 0);
    }

    #[tokio::test]
    async fn should_reject_wake_up_in_the_past() {
        let h = harness(vec![step(Some(true))]);
        let deadline = time::now() - TimeDelta::seconds(1);

        let err = h.engine.schedule_wake_up(deadline).unwrap_err();

        assert_eq!(err, AutomationError::PastDeadline { deadline });
        assert_eq!(h.scheduler.scheduled(), 0);
    }

    #[tokio::test]
    async fn should_proceed_when_timer_fires() {
        let h = harness(vec![timed_step(600), step(Some(true))]);
        h.engine.load_batch("B1").await.unwrap();
        h.engine.start_automated_mash().await.unwrap();

        h.scheduler.fire(0).await;

        let state = h.store.state().unwrap();
        assert_eq!(state.step_index, 1);
        assert_eq!(state.mode, Mode::Standby);
        assert!(state.timer.is_none());
        assert_eq!(h.publisher.count(EventType::TimerElapsed), 1);
        assert!(h.engine.armed_deadline().is_none());
    }

    #[tokio::test]
    async fn should_ignore_stale_wake_up() {
        let h = harness(vec![timed_step(600), step(Some(true)), step(Some(true))]);
        h.engine.load_batch("B1").await.unwrap();
        h.engine.start_automated_mash().await.unwrap();
        h.engine.proceed_to_next_step().await.unwrap();
        assert!(h.scheduler.is_cancelled(0));
        let writes_before = h.store.writes();

        h.scheduler.fire(0).await;

        assert_eq!(h.store.state().unwrap().step_index, 1);
        assert_eq!(h.store.writes(), writes_before);
        assert_eq!(h.publisher.count(EventType::TimerElapsed), 0);
    }

    #[tokio::test]
    async fn should_keep_wake_up_armed_when_stage_is_complete() {
        let h = harness(vec![timed_step(600)]);
        h.engine.load_batch("B1").await.unwrap();
        h.engine.start_automated_mash().await.unwrap();

        let err = h.engine.proceed_to_next_step().await.unwrap_err();

        assert!(err.is_stage_complete());
        assert!(!h.scheduler.is_cancelled(0));
        assert!(h.engine.armed_deadline().is_some());
        assert_eq!(h.store.state().unwrap().mode, Mode::Rest);
    }

    #[tokio::test]
    async fn should_cancel_wake_up_on_shutdown() {
        let h = harness(vec![timed_step(600)]);
        h.engine.load_batch("B1").await.unwrap();
        h.engine.start_automated_mash().await.unwrap();

        h.engine.shutdown();

        assert!(h.scheduler.is_cancelled(0));
        assert!(h.engine.armed_deadline().is_none());
    }

    // -- restart recovery --

    #[tokio::test]
    async fn should_proceed_once_when_restored_timer_is_overdue() {
        let h = harness(Vec::new());
        h.store.seed(&resting_state(
            vec![timed_step(600), step(Some(true))],
            time::now() - TimeDelta::seconds(5),
        ));

        h.engine.restore_timer().await.unwrap();

        let state = h.store.state().unwrap();
        assert_eq!(state.step_index, 1);
        assert_eq!(state.mode, Mode::Standby);
        assert_eq!(state.timer, None);
        assert_eq!(h.publisher.count(EventType::TimerElapsed), 1);
        assert_eq!(h.publisher.count(EventType::AutomationPaused), 1);
        assert_eq!(h.scheduler.scheduled(), 0);
    }

    #[tokio::test]
    async fn should_rearm_future_timer_without_writing() {
        let h = harness(Vec::new());
        let deadline = time::now() + TimeDelta::seconds(300);
        h.store.seed(&resting_state(vec![timed_step(600), step(Some(true))], deadline));

        h.engine.restore_timer().await.unwrap();

        assert_eq!(h.store.writes(), 0);
        assert_eq!(h.engine.armed_deadline(), Some(deadline));
        assert_eq!(h.scheduler.outstanding(), 1);
        assert!(h.scheduler.delay(0) <= Duration::from_secs(300));
    }

    #[tokio::test]
    async fn should_not_rearm_when_wake_up_already_armed() {
        let h = harness(Vec::new());
        h.store.seed(&resting_state(
            vec![timed_step(600)],
            time::now() + TimeDelta::seconds(300),
        ));
        h.engine.restore_timer().await.unwrap();

        h.engine.restore_timer().await.unwrap();

        assert_eq!(h.scheduler.scheduled(), 1);
        assert!(!h.scheduler.is_cancelled(0));
    }

    #[tokio::test]
    async fn should_flag_rest_without_timer_as_inconsistent() {
        let h = harness(Vec::new());
        let mut state = resting_state(vec![timed_step(600)], time::now());
        state.timer = None;
        h.store.seed(&state);

        let err = h.engine.restore_timer().await.unwrap_err();

        assert!(matches!(
            err,
            BrewhubError::Automation(AutomationError::InconsistentState(_))
        ));
        assert_eq!(h.store.writes(), 0);
    }

    #[tokio::test]
    async fn should_do_nothing_on_restore_when_not_resting() {
        let h = harness(vec![step(Some(true))]);
        h.engine.restore_timer().await.unwrap();
        h.engine.load_batch("B1").await.unwrap();

        h.engine.restore_timer().await.unwrap();

        assert_eq!(h.scheduler.scheduled(), 0);
    }

    // -- settings --

    #[tokio::test]
    async fn should_persist_settings_on_initialize() {
        let h = harness(Vec::new());
        assert_eq!(h.engine.get_settings().await.unwrap(), settings());

        h.engine.initialize().await.unwrap();

        assert_eq!(h.store.writes(), 1);
        assert_eq!(h.engine.get_settings().await.unwrap(), settings());
    }

    #[tokio::test]
    async fn should_pass_status_filter_to_recipe_service() {
        let h = harness(Vec::new());
        let batches = h
            .engine
            .get_batches(Some(BatchStatus::Fermenting))
            .await
            .unwrap();
        assert_eq!(batches[0].status.as_deref(), Some("Fermenting"));
    }

    // -- end to end --

    #[tokio::test]
    async fn should_run_heat_auto_advance_and_timer_through_stage_end() {
        let h = harness(vec![
            heat_step("Heat to 65 °C"),
            step(Some(false)),
            timed_step(600),
        ]);
        h.engine.load_batch("B1").await.unwrap();

        h.engine.start_automated_mash().await.unwrap();
        let heating = h.store.state().unwrap();
        assert_eq!(heating.mode, Mode::Heat);
        assert_eq!(heating.step_index, 0);
        assert_eq!(heating.heat_target(), Some(65.0));

        h.engine.on_actuator_telemetry(&[reading(65.0)]).await.unwrap();
        let resting = h.store.state().unwrap();
        assert_eq!(resting.mode, Mode::Rest);
        assert_eq!(resting.step_index, 2);
        assert_eq!(resting.timer.unwrap().duration, 600);
        assert_eq!(h.publisher.count(EventType::StepAutoAdvanced), 1);

        h.scheduler.fire(0).await;
        let finished = h.store.state().unwrap();
        assert_eq!(finished.step_index, 2);
        assert_eq!(finished.mode, Mode::Standby);
        assert!(finished.timer.is_none());
        let writes_after = h.store.writes();

        let err = h.engine.proceed_to_next_step().await.unwrap_err();
        assert!(err.is_stage_complete());
        assert_eq!(h.store.writes(), writes_after);
    }
}
