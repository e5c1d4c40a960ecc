//! In-memory port implementations shared by the unit tests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use image::{DynamicImage, GrayImage};

use framebot_domain::error::{FramebotError, NotFoundError};
use framebot_domain::geometry::{Point, Rect};
use framebot_domain::id::{JobId, OperationId, TaskId};
use framebot_domain::job::Job;
use framebot_domain::operation::Operation;
use framebot_domain::run::RunEvent;
use framebot_domain::task::Task;

use crate::automation_engine::Desktop;
use crate::ports::{
    EventPublisher, InputController, JobRepository, OperationRepository, ScreenSampler,
    TaskRepository, TemplateSource, WindowHandle, WindowLocator,
};

// ── images ─────────────────────────────────────────────────────

/// Deterministic high-entropy grayscale image.
pub fn noise(width: u32, height: u32, seed: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let mut h = x
            .wrapping_mul(0x9E37_79B1)
            .wrapping_add(y.wrapping_mul(0x85EB_CA77))
            .wrapping_add(seed.wrapping_mul(0xC2B2_AE3D));
        h ^= h >> 15;
        h = h.wrapping_mul(0x2C1B_3C6D);
        h ^= h >> 12;
        image::Luma([(h & 0xFF) as u8])
    })
}

/// `background` with `patch` pasted at (`x`, `y`).
pub fn with_patch(background: &GrayImage, patch: &GrayImage, x: u32, y: u32) -> GrayImage {
    let mut frame = background.clone();
    image::imageops::replace(&mut frame, patch, i64::from(x), i64::from(y));
    frame
}

// ── fake desktop ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Move(Point),
    Press,
    Release,
}

struct DesktopState {
    title: String,
    bounds: Rect,
    can_drive: bool,
    foreground_calls: usize,
    frames: Vec<GrayImage>,
    captures: usize,
    templates: HashMap<String, Arc<GrayImage>>,
    template_loads: HashMap<String, usize>,
    input: Vec<InputEvent>,
}

/// One window, a scripted sequence of frames and a template library.
///
/// Capture `n` returns frame `min(n, len - 1)`, so the last frame repeats.
#[derive(Clone)]
pub struct FakeDesktop {
    state: Arc<Mutex<DesktopState>>,
}

impl FakeDesktop {
    pub fn new(title: &str, bounds: Rect) -> Self {
        Self {
            state: Arc::new(Mutex::new(DesktopState {
                title: title.to_string(),
                bounds,
                can_drive: true,
                foreground_calls: 0,
                frames: Vec::new(),
                captures: 0,
                templates: HashMap::new(),
                template_loads: HashMap::new(),
                input: Vec::new(),
            })),
        }
    }

    pub fn with_frames(self, frames: Vec<GrayImage>) -> Self {
        self.state.lock().unwrap().frames = frames;
        self
    }

    pub fn with_template(self, name: &str, image: GrayImage) -> Self {
        self.state
            .lock()
            .unwrap()
            .templates
            .insert(name.to_string(), Arc::new(image));
        self
    }

    pub fn elevated(self) -> Self {
        self.state.lock().unwrap().can_drive = false;
        self
    }

    pub fn desktop(&self) -> Desktop<Self, Self, Self, Self> {
        Desktop {
            windows: self.clone(),
            sampler: self.clone(),
            input: self.clone(),
            templates: self.clone(),
        }
    }

    pub fn input_log(&self) -> Vec<InputEvent> {
        self.state.lock().unwrap().input.clone()
    }

    pub fn clicks(&self) -> Vec<Point> {
        let mut at = None;
        let mut clicks = Vec::new();
        for event in self.input_log() {
            match event {
                InputEvent::Move(p) => at = Some(p),
                InputEvent::Press => {}
                InputEvent::Release => clicks.extend(at),
            }
        }
        clicks
    }

    pub fn captures(&self) -> usize {
        self.state.lock().unwrap().captures
    }

    pub fn loads_of(&self, name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .template_loads
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    pub fn foreground_calls(&self) -> usize {
        self.state.lock().unwrap().foreground_calls
    }
}

impl WindowLocator for FakeDesktop {
    fn find_by_title(
        &self,
        title: &str,
    ) -> impl Future<Output = Result<Option<WindowHandle>, FramebotError>> + Send {
        let found = self.state.lock().unwrap().title == title;
        async move { Ok(found.then_some(WindowHandle(1))) }
    }

    fn bring_to_foreground(
        &self,
        _handle: WindowHandle,
    ) -> impl Future<Output = Result<(), FramebotError>> + Send {
        self.state.lock().unwrap().foreground_calls += 1;
        async { Ok(()) }
    }

    fn bounds(
        &self,
        _handle: WindowHandle,
    ) -> impl Future<Output = Result<Rect, FramebotError>> + Send {
        let bounds = self.state.lock().unwrap().bounds;
        async move { Ok(bounds) }
    }

    fn can_drive(
        &self,
        _handle: WindowHandle,
    ) -> impl Future<Output = Result<bool, FramebotError>> + Send {
        let can = self.state.lock().unwrap().can_drive;
        async move { Ok(can) }
    }
}

impl ScreenSampler for FakeDesktop {
    fn capture(&self, _region: Rect) -> impl Future<Output = Result<DynamicImage, FramebotError>> + Send {
        let mut state = self.state.lock().unwrap();
        let n = state.captures.min(state.frames.len().saturating_sub(1));
        state.captures += 1;
        let frame = state.frames.get(n).cloned().unwrap_or_default();
        drop(state);
        async move { Ok(DynamicImage::ImageLuma8(frame)) }
    }
}

impl InputController for FakeDesktop {
    fn move_to(&self, point: Point) -> impl Future<Output = Result<(), FramebotError>> + Send {
        self.state.lock().unwrap().input.push(InputEvent::Move(point));
        async { Ok(()) }
    }

    fn press_left(&self) -> impl Future<Output = Result<(), FramebotError>> + Send {
        self.state.lock().unwrap().input.push(InputEvent::Press);
        async { Ok(()) }
    }

    fn release_left(&self) -> impl Future<Output = Result<(), FramebotError>> + Send {
        self.state.lock().unwrap().input.push(InputEvent::Release);
        async { Ok(()) }
    }
}

impl TemplateSource for FakeDesktop {
    fn load(&self, name: &str) -> impl Future<Output = Result<Arc<GrayImage>, FramebotError>> + Send {
        let mut state = self.state.lock().unwrap();
        *state.template_loads.entry(name.to_string()).or_default() += 1;
        let result = state.templates.get(name).cloned().ok_or_else(|| {
            NotFoundError {
                entity: "Template",
                id: name.to_string(),
            }
            .into()
        });
        async move { result }
    }
}

// ── in-memory store ────────────────────────────────────────────

#[derive(Default)]
struct StoreState {
    next_id: i64,
    jobs: Vec<Job>,
    tasks: Vec<Task>,
    operations: Vec<Operation>,
}

impl StoreState {
    fn next(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Job hierarchy kept in creation order.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

fn missing(entity: &'static str, id: impl ToString) -> FramebotError {
    NotFoundError {
        entity,
        id: id.to_string(),
    }
    .into()
}

impl JobRepository for InMemoryStore {
    fn create_job(&self, mut job: Job) -> impl Future<Output = Result<Job, FramebotError>> + Send {
        let mut state = self.state.lock().unwrap();
        job.id = JobId::new(state.next());
        state.jobs.push(job.clone());
        async move { Ok(job) }
    }

    fn get_job(&self, id: JobId) -> impl Future<Output = Result<Option<Job>, FramebotError>> + Send {
        let found = self.state.lock().unwrap().jobs.iter().find(|j| j.id == id).cloned();
        async move { Ok(found) }
    }

    fn find_job_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Job>, FramebotError>> + Send {
        let found = self
            .state
            .lock()
            .unwrap()
            .jobs
            .iter()
            .find(|j| j.name == name)
            .cloned();
        async move { Ok(found) }
    }

    fn list_jobs(&self) -> impl Future<Output = Result<Vec<Job>, FramebotError>> + Send {
        let jobs = self.state.lock().unwrap().jobs.clone();
        async move { Ok(jobs) }
    }

    fn update_job(&self, job: Job) -> impl Future<Output = Result<Job, FramebotError>> + Send {
        let mut state = self.state.lock().unwrap();
        let result = match state.jobs.iter_mut().find(|j| j.id == job.id) {
            Some(slot) => {
                *slot = job.clone();
                Ok(job)
            }
            None => Err(missing("Job", job.id)),
        };
        async move { result }
    }

    fn delete_job(&self, id: JobId) -> impl Future<Output = Result<(), FramebotError>> + Send {
        let mut state = self.state.lock().unwrap();
        let task_ids: Vec<TaskId> = state
            .tasks
            .iter()
            .filter(|t| t.job_id == id)
            .map(|t| t.id)
            .collect();
        state.operations.retain(|o| !task_ids.contains(&o.task_id));
        state.tasks.retain(|t| t.job_id != id);
        let before = state.jobs.len();
        state.jobs.retain(|j| j.id != id);
        let result = removed(before, state.jobs.len(), "Job", id);
        async { result }
    }
}

impl TaskRepository for InMemoryStore {
    fn create_task(&self, mut task: Task) -> impl Future<Output = Result<Task, FramebotError>> + Send {
        let mut state = self.state.lock().unwrap();
        task.id = TaskId::new(state.next());
        state.tasks.push(task.clone());
        async move { Ok(task) }
    }

    fn get_task(&self, id: TaskId) -> impl Future<Output = Result<Option<Task>, FramebotError>> + Send {
        let found = self.state.lock().unwrap().tasks.iter().find(|t| t.id == id).cloned();
        async move { Ok(found) }
    }

    fn list_tasks(
        &self,
        job_id: JobId,
    ) -> impl Future<Output = Result<Vec<Task>, FramebotError>> + Send {
        let tasks: Vec<Task> = self
            .state
            .lock()
            .unwrap()
            .tasks
            .iter()
            .filter(|t| t.job_id == job_id)
            .cloned()
            .collect();
        async move { Ok(tasks) }
    }

    fn update_task(&self, task: Task) -> impl Future<Output = Result<Task, FramebotError>> + Send {
        let mut state = self.state.lock().unwrap();
        let result = match state.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => {
                *slot = task.clone();
                Ok(task)
            }
            None => Err(missing("Task", task.id)),
        };
        async move { result }
    }

    fn delete_task(&self, id: TaskId) -> impl Future<Output = Result<(), FramebotError>> + Send {
        let mut state = self.state.lock().unwrap();
        state.operations.retain(|o| o.task_id != id);
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != id);
        let result = removed(before, state.tasks.len(), "Task", id);
        async { result }
    }
}

impl OperationRepository for InMemoryStore {
    fn create_operation(
        &self,
        mut operation: Operation,
    ) -> impl Future<Output = Result<Operation, FramebotError>> + Send {
        let mut state = self.state.lock().unwrap();
        operation.id = OperationId::new(state.next());
        state.operations.push(operation.clone());
        async move { Ok(operation) }
    }

    fn get_operation(
        &self,
        id: OperationId,
    ) -> impl Future<Output = Result<Option<Operation>, FramebotError>> + Send {
        let found = self
            .state
            .lock()
            .unwrap()
            .operations
            .iter()
            .find(|o| o.id == id)
            .cloned();
        async move { Ok(found) }
    }

    fn list_operations(
        &self,
        task_id: TaskId,
    ) -> impl Future<Output = Result<Vec<Operation>, FramebotError>> + Send {
        let operations: Vec<Operation> = self
            .state
            .lock()
            .unwrap()
            .operations
            .iter()
            .filter(|o| o.task_id == task_id)
            .cloned()
            .collect();
        async move { Ok(operations) }
    }

    fn update_operation(
        &self,
        operation: Operation,
    ) -> impl Future<Output = Result<Operation, FramebotError>> + Send {
        let mut state = self.state.lock().unwrap();
        let result = match state.operations.iter_mut().find(|o| o.id == operation.id) {
            Some(slot) => {
                *slot = operation.clone();
                Ok(operation)
            }
            None => Err(missing("Operation", operation.id)),
        };
        async move { result }
    }

    fn delete_operation(
        &self,
        id: OperationId,
    ) -> impl Future<Output = Result<(), FramebotError>> + Send {
        let mut state = self.state.lock().unwrap();
        let before = state.operations.len();
        state.operations.retain(|o| o.id != id);
        let result = removed(before, state.operations.len(), "Operation", id);
        async { result }
    }
}

fn removed(before: usize, after: usize, entity: &'static str, id: impl ToString) -> Result<(), FramebotError> {
    if before == after {
        return Err(missing(entity, id));
    }
    Ok(())
}

// ── event recorder ─────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingPublisher {
    events: Arc<Mutex<Vec<RunEvent>>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: RunEvent) -> impl Future<Output = Result<(), FramebotError>> + Send {
        self.events.lock().unwrap().push(event);
        async { Ok(()) }
    }
}
