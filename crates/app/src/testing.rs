//! In-memory port fakes shared by the unit tests.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use brewhub_domain::device::{Block, DeviceRef};
use brewhub_domain::error::{BrewhubError, DeviceError, NotFoundError};
use brewhub_domain::event::{Event, EventType};
use brewhub_domain::recipe::{
    Batch, BatchRecipe, BatchStatus, BatchSummary, Brewtracker, Recipe, RecipeSummary, StageSteps,
};
use brewhub_domain::state::AutomationState;
use brewhub_domain::step::Step;

use crate::ports::{
    DeviceGateway, EventPublisher, RecipeService, ScheduledTask, Scheduler, StateStore,
};

const STATE_KEY: &str = "state";

#[derive(Clone, Default)]
pub struct FakeRecipes {
    stages: Arc<Mutex<Vec<StageSteps>>>,
}

impl FakeRecipes {
    pub fn with_steps(steps: Vec<Step>) -> Self {
        Self {
            stages: Arc::new(Mutex::new(vec![StageSteps {
                name: "Mash".to_string(),
                steps,
            }])),
        }
    }
}

impl RecipeService for FakeRecipes {
    fn get_batches(
        &self,
        status: Option<BatchStatus>,
    ) -> impl Future<Output = Result<Vec<BatchSummary>, BrewhubError>> + Send {
        let batches = vec![BatchSummary {
            id: "B1".to_string(),
            name: "Batch".to_string(),
            batch_no: Some(1),
            status: status.map(|status| status.to_string()),
            brewer: None,
        }];
        async { Ok(batches) }
    }

    fn get_batch(&self, batch_id: &str) -> impl Future<Output = Result<Batch, BrewhubError>> + Send {
        let batch = Batch {
            id: batch_id.to_string(),
            name: "Batch".to_string(),
            batch_no: Some(1),
            status: Some("Brewing".to_string()),
            recipe: BatchRecipe {
                id: Some("R1".to_string()),
                name: "Tripel".to_string(),
            },
        };
        async { Ok(batch) }
    }

    fn get_brewtracker(
        &self,
        _batch_id: &str,
    ) -> impl Future<Output = Result<Brewtracker, BrewhubError>> + Send {
        let stages = self.stages.lock().unwrap().clone();
        async {
            Ok(Brewtracker {
                id: None,
                name: None,
                stages,
            })
        }
    }

    fn get_recipes(
        &self,
        _offset: u32,
        _limit: u32,
    ) -> impl Future<Output = Result<Vec<RecipeSummary>, BrewhubError>> + Send {
        async { Ok(Vec::new()) }
    }

    fn get_recipe(&self, recipe_id: &str) -> impl Future<Output = Result<Recipe, BrewhubError>> + Send {
        let result: Result<Recipe, BrewhubError> = if recipe_id == "R1" {
            Ok(Recipe {
                id: "R1".to_string(),
                name: "Tripel".to_string(),
                details: serde_json::Map::new(),
            })
        } else {
            Err(NotFoundError {
                entity: "recipe",
                id: recipe_id.to_string(),
            }
            .into())
        };
        async { result }
    }
}

struct GatewayInner {
    block: Block,
    reads: usize,
    patches: Vec<serde_json::Value>,
    hang: bool,
    ready: bool,
}

#[derive(Clone)]
pub struct FakeGateway {
    inner: Arc<Mutex<GatewayInner>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::with_data(serde_json::json!({
            "storedSetting": {"value": 20.0, "unit": "degC"},
            "value": {"value": 20.0, "unit": "degC"}
        }))
    }

    pub fn with_data(data: serde_json::Value) -> Self {
        Self {
            inner: Arc::new(Mutex::new(GatewayInner {
                block: Block {
                    id: "HERMS MT Setpoint".to_string(),
                    service_id: Some("spark-one".to_string()),
                    block_type: "SetpointSensorPair".to_string(),
                    data,
                },
                reads: 0,
                patches: Vec::new(),
                hang: false,
                ready: true,
            })),
        }
    }

    pub fn hanging() -> Self {
        let gateway = Self::new();
        gateway.inner.lock().unwrap().hang = true;
        gateway
    }

    pub fn set_ready(&self, ready: bool) {
        self.inner.lock().unwrap().ready = ready;
    }

    pub fn reads(&self) -> usize {
        self.inner.lock().unwrap().reads
    }

    pub fn patches(&self) -> Vec<serde_json::Value> {
        self.inner.lock().unwrap().patches.clone()
    }
}

impl DeviceGateway for FakeGateway {
    fn read(&self, _device: &DeviceRef) -> impl Future<Output = Result<Block, BrewhubError>> + Send {
        let mut inner = self.inner.lock().unwrap();
        inner.reads += 1;
        let hang = inner.hang;
        let block = inner.block.clone();
        async move {
            if hang {
                std::future::pending::<()>().await;
            }
            Ok(block)
        }
    }

    fn patch(
        &self,
        _device: &DeviceRef,
        data: serde_json::Value,
    ) -> impl Future<Output = Result<Block, BrewhubError>> + Send {
        let mut inner = self.inner.lock().unwrap();
        inner.patches.push(data.clone());
        if let (Some(target), Some(patch)) =
            (inner.block.data.as_object_mut(), data.as_object())
        {
            for (key, value) in patch {
                target.insert(key.clone(), value.clone());
            }
        }
        let block = inner.block.clone();
        async { Ok(block) }
    }

    fn is_ready(&self) -> impl Future<Output = bool> + Send {
        let ready = self.inner.lock().unwrap().ready;
        async move { ready }
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<HashMap<(String, String), serde_json::Value>>>,
    writes: Arc<Mutex<usize>>,
}

impl MemoryStore {
    pub fn seed(&self, state: &AutomationState) {
        self.records.lock().unwrap().insert(
            ("brewhub".to_string(), STATE_KEY.to_string()),
            serde_json::to_value(state).unwrap(),
        );
    }

    pub fn state(&self) -> Option<AutomationState> {
        self.records
            .lock()
            .unwrap()
            .get(&("brewhub".to_string(), STATE_KEY.to_string()))
            .cloned()
            .map(|value| serde_json::from_value(value).unwrap())
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

impl StateStore for MemoryStore {
    fn get(
        &self,
        namespace: &str,
        id: &str,
    ) -> impl Future<Output = Result<Option<serde_json::Value>, BrewhubError>> + Send {
        let value = self
            .records
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), id.to_string()))
            .cloned();
        async { Ok(value) }
    }

    fn set(
        &self,
        namespace: &str,
        id: &str,
        value: serde_json::Value,
    ) -> impl Future<Output = Result<(), BrewhubError>> + Send {
        self.records
            .lock()
            .unwrap()
            .insert((namespace.to_string(), id.to_string()), value);
        *self.writes.lock().unwrap() += 1;
        async { Ok(()) }
    }
}

#[derive(Clone, Default)]
pub struct SpyPublisher {
    events: Arc<Mutex<Vec<Event>>>,
    failing: bool,
}

impl SpyPublisher {
    /// A publisher whose every publish fails after recording the event.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn count(&self, event_type: EventType) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event.event_type == event_type)
            .count()
    }
}

impl EventPublisher for SpyPublisher {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), BrewhubError>> + Send {
        self.events.lock().unwrap().push(event);
        let failing = self.failing;
        async move {
            if failing {
                Err(DeviceError::Unavailable.into())
            } else {
                Ok(())
            }
        }
    }
}

type BoxedTask = Pin<Box<dyn Future<Output = ()> + Send>>;

struct Entry {
    delay: Duration,
    cancelled: Arc<AtomicBool>,
    task: Option<BoxedTask>,
}

#[derive(Clone, Default)]
pub struct ManualScheduler {
    entries: Arc<Mutex<Vec<Entry>>>,
}

pub struct ManualTask {
    cancelled: Arc<AtomicBool>,
}

impl ScheduledTask for ManualTask {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl Scheduler for ManualScheduler {
    type Task = ManualTask;

    fn schedule<F>(&self, delay: Duration, task: F) -> Self::Task
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.entries.lock().unwrap().push(Entry {
            delay,
            cancelled: Arc::clone(&cancelled),
            task: Some(Box::pin(task)),
        });
        ManualTask { cancelled }
    }
}

impl ManualScheduler {
    pub fn scheduled(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Scheduled, not cancelled and not fired.
    pub fn outstanding(&self) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.task.is_some() && !entry.cancelled.load(Ordering::SeqCst))
            .count()
    }

    pub fn is_cancelled(&self, index: usize) -> bool {
        self.entries.lock().unwrap()[index]
            .cancelled
            .load(Ordering::SeqCst)
    }

    pub fn delay(&self, index: usize) -> Duration {
        self.entries.lock().unwrap()[index].delay
    }

    /// Run a scheduled task even if it was cancelled, as a racing timer would.
    pub async fn fire(&self, index: usize) {
        let task = self.entries.lock().unwrap()[index].task.take();
        if let Some(task) = task {
            task.await;
        }
    }
}
