//! Run scheduler: executes a job's task/operation tree on a worker.
//!
//! A run binds a fresh [`AutomationEngine`] to the job's window, checks that
//! the window exists and can be driven, brings it to the foreground and then
//! walks the tree depth-first in resolved order. Skipped items are reported
//! and passed over; the first failing operation aborts the whole run.
//! After every executed task and operation the scheduler sleeps for the
//! configured settle interval.
//!
//! Progress is published as [`RunEvent`]s; every run ends with exactly one
//! terminal event.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use framebot_domain::error::{AutomationError, FramebotError, NotFoundError};
use framebot_domain::id::{JobId, RunId};
use framebot_domain::job::Job;
use framebot_domain::operation::{Operation, Step};
use framebot_domain::run::{OperationReport, RunEvent, RunReport, StepState, TaskReport};
use framebot_domain::task::Task;
use framebot_domain::template::MatchMode;

use crate::automation_engine::{AutomationEngine, Desktop, EngineConfig, err_chain};
use crate::ports::{
    EventPublisher, InputController, JobRepository, OperationRepository, ScreenSampler,
    TaskRepository, TemplateSource, WindowLocator,
};

/// Scheduler tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Settle time after each executed task.
    pub task_pause: Duration,
    /// Settle time after each executed operation.
    pub operation_pause: Duration,
    pub engine: EngineConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            task_pause: Duration::from_secs(1),
            operation_pause: Duration::from_secs(1),
            engine: EngineConfig::default(),
        }
    }
}

/// A run executing on its own worker.
#[derive(Debug)]
pub struct RunHandle {
    run_id: RunId,
    join: JoinHandle<Result<RunReport, FramebotError>>,
}

impl RunHandle {
    #[must_use]
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the run to finish.
    ///
    /// # Errors
    ///
    /// Returns the error that stopped the run, or a platform error if the
    /// worker panicked.
    pub async fn wait(self) -> Result<RunReport, FramebotError> {
        self.join
            .await
            .map_err(|e| FramebotError::Platform(Box::new(e)))?
    }
}

/// Executes jobs against the desktop.
pub struct RunScheduler<R, W, S, I, T, P> {
    repo: Arc<R>,
    desktop: Desktop<W, S, I, T>,
    publisher: P,
    config: SchedulerConfig,
}

impl<R, W, S, I, T, P> Clone for RunScheduler<R, W, S, I, T, P>
where
    W: Clone,
    S: Clone,
    I: Clone,
    T: Clone,
    P: Clone,
{
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            desktop: self.desktop.clone(),
            publisher: self.publisher.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R, W, S, I, T, P> RunScheduler<R, W, S, I, T, P>
where
    R: JobRepository + TaskRepository + OperationRepository + 'static,
    W: WindowLocator + Clone + Send + Sync + 'static,
    S: ScreenSampler + Clone + Send + Sync + 'static,
    I: InputController + Clone + Send + Sync + 'static,
    T: TemplateSource + Clone + Send + Sync + 'static,
    P: EventPublisher + Clone + Send + Sync + 'static,
{
    pub fn new(repo: R, desktop: Desktop<W, S, I, T>, publisher: P, config: SchedulerConfig) -> Self {
        Self {
            repo: Arc::new(repo),
            desktop,
            publisher,
            config,
        }
    }

    /// Start running `job_id` on a dedicated worker and return immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(&self, job_id: JobId) -> RunHandle {
        let run_id = RunId::new();
        let scheduler = self.clone();
        let join = tokio::spawn(async move { scheduler.execute(run_id, job_id).await });
        RunHandle { run_id, join }
    }

    /// Run `job_id` to completion on the current task.
    ///
    /// # Errors
    ///
    /// Returns [`FramebotError::NotFound`] for an unknown job, otherwise the
    /// error that stopped the run.
    pub async fn run(&self, job_id: JobId) -> Result<RunReport, FramebotError> {
        self.execute(RunId::new(), job_id).await
    }

    #[tracing::instrument(skip(self))]
    async fn execute(&self, run_id: RunId, job_id: JobId) -> Result<RunReport, FramebotError> {
        let job = self.repo.get_job(job_id).await?.ok_or_else(|| NotFoundError {
            entity: "Job",
            id: job_id.to_string(),
        })?;

        let mut report = RunReport::new(run_id, job.id, &job.name, framebot_domain::time::now());
        self.publish(RunEvent::Started {
            run_id,
            job_id: job.id,
            job_name: job.name.clone(),
        })
        .await;
        tracing::info!(job = %job.name, window = %job.window_title, "run started");

        let outcome = self.drive(&job, &mut report).await;
        report.finished_at = Some(framebot_domain::time::now());

        match outcome {
            Ok(()) => {
                report.state = report.state.advance(StepState::Succeeded)?;
                tracing::info!(
                    job = %job.name,
                    operations = report.executed_operations(),
                    "run succeeded"
                );
                self.publish(RunEvent::Succeeded {
                    report: report.clone(),
                })
                .await;
                Ok(report)
            }
            Err(err) => {
                report.state = report.state.advance(StepState::Failed)?;
                let error = err_chain(&err);
                tracing::warn!(job = %job.name, %error, "run failed");
                self.publish(RunEvent::Failed { report, error }).await;
                Err(err)
            }
        }
    }

    async fn drive(&self, job: &Job, report: &mut RunReport) -> Result<(), FramebotError> {
        let run_id = report.run_id;
        report.state = report.state.advance(StepState::Running)?;

        let engine = AutomationEngine::new(
            job.window_title.clone(),
            self.desktop.clone(),
            self.config.engine.clone(),
        );
        engine.ensure_privileges().await?;
        engine.bring_to_foreground().await?;

        let tasks = self.repo.ordered_tasks(job).await?;
        report.tasks = tasks
            .iter()
            .map(|t| TaskReport {
                task_id: t.id,
                name: t.name.clone(),
                state: StepState::Pending,
                operations: Vec::new(),
            })
            .collect();

        for (task, task_report) in tasks.iter().zip(report.tasks.iter_mut()) {
            if task.skip {
                tracing::info!(task = %task.name, "skipping task");
                self.transition_task(run_id, task_report, StepState::Skipped)
                    .await?;
                continue;
            }

            self.transition_task(run_id, task_report, StepState::Running)
                .await?;
            let outcome = self.run_task(&engine, task, task_report, run_id).await;
            let next = if outcome.is_ok() {
                StepState::Succeeded
            } else {
                StepState::Failed
            };
            self.transition_task(run_id, task_report, next).await?;
            outcome?;

            tokio::time::sleep(self.config.task_pause).await;
        }
        Ok(())
    }

    async fn run_task(
        &self,
        engine: &AutomationEngine<W, S, I, T>,
        task: &Task,
        task_report: &mut TaskReport,
        run_id: RunId,
    ) -> Result<(), FramebotError> {
        tracing::info!(task = %task.name, "running task");
        let operations = self.repo.ordered_operations(task).await?;
        task_report.operations = operations
            .iter()
            .map(|o| OperationReport {
                operation_id: o.id,
                name: o.name.clone(),
                state: StepState::Pending,
            })
            .collect();

        for (operation, op_report) in operations.iter().zip(task_report.operations.iter_mut()) {
            if operation.skip {
                tracing::info!(operation = %operation.name, "skipping operation");
                self.transition_operation(run_id, op_report, StepState::Skipped)
                    .await?;
                continue;
            }

            self.transition_operation(run_id, op_report, StepState::Running)
                .await?;
            let outcome = run_operation(engine, operation).await;
            let next = if outcome.is_ok() {
                StepState::Succeeded
            } else {
                StepState::Failed
            };
            self.transition_operation(run_id, op_report, next).await?;
            outcome?;

            tokio::time::sleep(self.config.operation_pause).await;
        }
        Ok(())
    }

    async fn transition_task(
        &self,
        run_id: RunId,
        report: &mut TaskReport,
        next: StepState,
    ) -> Result<(), FramebotError> {
        report.state = report.state.advance(next)?;
        self.publish(RunEvent::TaskChanged {
            run_id,
            task_id: report.task_id,
            name: report.name.clone(),
            state: next,
        })
        .await;
        Ok(())
    }

    async fn transition_operation(
        &self,
        run_id: RunId,
        report: &mut OperationReport,
        next: StepState,
    ) -> Result<(), FramebotError> {
        report.state = report.state.advance(next)?;
        self.publish(RunEvent::OperationChanged {
            run_id,
            operation_id: report.operation_id,
            name: report.name.clone(),
            state: next,
        })
        .await;
        Ok(())
    }

    async fn publish(&self, event: RunEvent) {
        // Fire-and-forget
        let _ = self.publisher.publish(event).await;
    }
}

/// Execute one operation on `engine`.
async fn run_operation<W, S, I, T>(
    engine: &AutomationEngine<W, S, I, T>,
    operation: &Operation,
) -> Result<(), FramebotError>
where
    W: WindowLocator + Sync,
    S: ScreenSampler + Sync,
    I: InputController + Sync,
    T: TemplateSource + Sync,
{
    let step = operation
        .step()
        .map_err(|source| AutomationError::Configuration {
            operation: operation.name.clone(),
            source,
        })?;
    tracing::debug!(operation = %operation.name, kind = %operation.kind, "running operation");

    match step {
        Step::ClickImage {
            click_template,
            screen_template,
            click_count,
        } => {
            engine
                .click_image_with_retry(
                    &operation.name,
                    &click_template,
                    &screen_template,
                    MatchMode::In,
                    click_count,
                )
                .await?;
        }
        Step::ClickPercent {
            x_fraction,
            y_fraction,
            match_template,
            click_count,
        } => {
            engine
                .click_percent_with_retry(
                    &operation.name,
                    x_fraction,
                    y_fraction,
                    match_template.as_deref(),
                    MatchMode::Is,
                    click_count,
                )
                .await?;
        }
        Step::Sleep { seconds } => {
            tokio::time::sleep(Duration::from_secs(seconds)).await;
        }
        Step::WaitUntil {
            screen_template,
            timeout_seconds,
        } => {
            engine.wait_until(&screen_template, timeout_seconds).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use framebot_domain::geometry::{Point, Rect};
    use framebot_domain::id::TaskId;
    use framebot_domain::operation::OperationKind;
    use tokio::time::Instant;

    use crate::test_support::{FakeDesktop, InMemoryStore, RecordingPublisher, noise, with_patch};

    type Scheduler = RunScheduler<
        InMemoryStore,
        FakeDesktop,
        FakeDesktop,
        FakeDesktop,
        FakeDesktop,
        RecordingPublisher,
    >;

    const TITLE: &str = "NIKKE";
    const BOUNDS: Rect = Rect::new(0, 0, 100, 100);

    fn config() -> SchedulerConfig {
        SchedulerConfig {
            engine: EngineConfig {
                retry_limit: 2,
                ..EngineConfig::default()
            },
            ..SchedulerConfig::default()
        }
    }

    fn scheduler(store: &InMemoryStore, fake: &FakeDesktop, events: &RecordingPublisher) -> Scheduler {
        RunScheduler::new(store.clone(), fake.desktop(), events.clone(), config())
    }

    async fn job(store: &InMemoryStore) -> Job {
        store
            .create_job(Job::builder().name("dailies").window_title(TITLE).build().unwrap())
            .await
            .unwrap()
    }

    async fn task(store: &InMemoryStore, job: &Job, name: &str, skip: bool) -> Task {
        store
            .create_task(
                Task::builder()
                    .job_id(job.id)
                    .name(name)
                    .skip(skip)
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn tap(store: &InMemoryStore, task: &Task, name: &str, x: f64, skip: bool) -> Operation {
        store
            .create_operation(
                Operation::builder()
                    .task_id(task.id)
                    .name(name)
                    .click_percent(x, 0.5)
                    .skip(skip)
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    fn xs(fake: &FakeDesktop) -> Vec<i32> {
        fake.clicks().iter().map(|p| p.x).collect()
    }

    // ── ordering and skips ─────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn should_run_operations_in_resolved_order() {
        let store = InMemoryStore::default();
        let fake = FakeDesktop::new(TITLE, BOUNDS);
        let events = RecordingPublisher::default();
        let job = job(&store).await;
        let mut t = task(&store, &job, "mail", false).await;
        let a = tap(&store, &t, "a", 0.1, false).await;
        let _b = tap(&store, &t, "b", 0.2, false).await;
        let c = tap(&store, &t, "c", 0.3, false).await;
        t.operation_order = vec![c.id, a.id];
        store.update_task(t).await.unwrap();

        scheduler(&store, &fake, &events).run(job.id).await.unwrap();

        assert_eq!(xs(&fake), vec![30, 10, 20]);
    }

    #[tokio::test(start_paused = true)]
    async fn should_skip_flagged_tasks_and_operations() {
        let store = InMemoryStore::default();
        let fake = FakeDesktop::new(TITLE, BOUNDS);
        let events = RecordingPublisher::default();
        let job = job(&store).await;
        let t1 = task(&store, &job, "one", false).await;
        tap(&store, &t1, "a", 0.1, false).await;
        tap(&store, &t1, "b", 0.2, true).await;
        let t2 = task(&store, &job, "two", true).await;
        tap(&store, &t2, "c", 0.3, false).await;
        let t3 = task(&store, &job, "three", false).await;
        tap(&store, &t3, "d", 0.4, false).await;

        let report = scheduler(&store, &fake, &events).run(job.id).await.unwrap();

        assert_eq!(xs(&fake), vec![10, 40]);
        assert_eq!(report.state, StepState::Succeeded);
        assert_eq!(report.executed_operations(), 2);
        assert_eq!(report.task(t2.id).unwrap().state, StepState::Skipped);
        assert!(report.task(t2.id).unwrap().operations.is_empty());
        assert_eq!(
            report.task(t1.id).unwrap().operations[1].state,
            StepState::Skipped
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_sleep_after_each_executed_item_only() {
        let store = InMemoryStore::default();
        let fake = FakeDesktop::new(TITLE, BOUNDS);
        let events = RecordingPublisher::default();
        let job = job(&store).await;
        let t1 = task(&store, &job, "one", false).await;
        tap(&store, &t1, "a", 0.1, false).await;
        tap(&store, &t1, "b", 0.2, true).await;
        task(&store, &job, "two", true).await;

        let started = Instant::now();
        scheduler(&store, &fake, &events).run(job.id).await.unwrap();

        // one click pause, one operation pause, one task pause
        assert_eq!(started.elapsed(), Duration::from_millis(2100));
    }

    #[tokio::test(start_paused = true)]
    async fn should_succeed_with_no_tasks() {
        let store = InMemoryStore::default();
        let fake = FakeDesktop::new(TITLE, BOUNDS);
        let events = RecordingPublisher::default();
        let job = job(&store).await;

        let report = scheduler(&store, &fake, &events).run(job.id).await.unwrap();

        assert_eq!(report.state, StepState::Succeeded);
        assert!(report.tasks.is_empty());
        assert_eq!(fake.foreground_calls(), 1);
    }

    // ── failures ───────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn should_stop_at_first_failing_operation() {
        let store = InMemoryStore::default();
        let fake = FakeDesktop::new(TITLE, BOUNDS)
            .with_frames(vec![noise(100, 100, 1)])
            .with_template("shop-screen.png", noise(100, 100, 2));
        let events = RecordingPublisher::default();
        let job = job(&store).await;
        let t1 = task(&store, &job, "one", false).await;
        tap(&store, &t1, "a", 0.1, false).await;
        store
            .create_operation(
                Operation::builder()
                    .task_id(t1.id)
                    .name("gated")
                    .click_percent(0.2, 0.5)
                    .match_template("shop-screen.png")
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();
        tap(&store, &t1, "c", 0.3, false).await;
        let t2 = task(&store, &job, "two", false).await;
        tap(&store, &t2, "d", 0.4, false).await;

        let err = scheduler(&store, &fake, &events).run(job.id).await.unwrap_err();

        assert!(matches!(
            err.as_automation(),
            Some(AutomationError::CannotProceed { operation }) if operation == "gated"
        ));
        assert_eq!(xs(&fake), vec![10]);

        let recorded = events.events();
        let terminal: Vec<&RunEvent> = recorded.iter().filter(|e| e.is_terminal()).collect();
        assert_eq!(terminal.len(), 1);
        let RunEvent::Failed { report, error } = terminal[0] else {
            panic!("expected failure event, got {:?}", terminal[0]);
        };
        assert!(error.contains("gated"));
        assert_eq!(report.state, StepState::Failed);
        assert_eq!(report.task(t1.id).unwrap().state, StepState::Failed);
        let states: Vec<StepState> = report.task(t1.id).unwrap().operations.iter().map(|o| o.state).collect();
        assert_eq!(
            states,
            vec![StepState::Succeeded, StepState::Failed, StepState::Pending]
        );
        assert_eq!(report.task(t2.id).unwrap().state, StepState::Pending);
    }

    #[tokio::test]
    async fn should_fail_before_any_input_when_window_elevated() {
        let store = InMemoryStore::default();
        let fake = FakeDesktop::new(TITLE, BOUNDS).elevated();
        let events = RecordingPublisher::default();
        let job = job(&store).await;
        let t1 = task(&store, &job, "one", false).await;
        tap(&store, &t1, "a", 0.1, false).await;

        let err = scheduler(&store, &fake, &events).run(job.id).await.unwrap_err();

        assert!(matches!(
            err.as_automation(),
            Some(AutomationError::PermissionDenied { .. })
        ));
        assert!(fake.input_log().is_empty());
        assert_eq!(fake.foreground_calls(), 0);
    }

    #[tokio::test]
    async fn should_fail_when_window_missing() {
        let store = InMemoryStore::default();
        let fake = FakeDesktop::new("other", BOUNDS);
        let events = RecordingPublisher::default();
        let job = job(&store).await;

        let err = scheduler(&store, &fake, &events).run(job.id).await.unwrap_err();

        assert!(matches!(
            err.as_automation(),
            Some(AutomationError::WindowNotFound { .. })
        ));
        assert!(matches!(events.events().last(), Some(RunEvent::Failed { .. })));
    }

    #[tokio::test]
    async fn should_fail_with_configuration_error_for_unknown_kind() {
        let store = InMemoryStore::default();
        let fake = FakeDesktop::new(TITLE, BOUNDS);
        let events = RecordingPublisher::default();
        let job = job(&store).await;
        let t1 = task(&store, &job, "one", false).await;
        let mut op = tap(&store, &t1, "drag", 0.1, false).await;
        op.kind = OperationKind::Unknown("drag".to_string());
        store.update_operation(op).await.unwrap();

        let err = scheduler(&store, &fake, &events).run(job.id).await.unwrap_err();

        assert!(matches!(
            err.as_automation(),
            Some(AutomationError::Configuration { operation, .. }) if operation == "drag"
        ));
        assert!(fake.input_log().is_empty());
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_job() {
        let store = InMemoryStore::default();
        let fake = FakeDesktop::new(TITLE, BOUNDS);
        let events = RecordingPublisher::default();

        let err = scheduler(&store, &fake, &events)
            .run(JobId::new(42))
            .await
            .unwrap_err();

        assert!(matches!(err, FramebotError::NotFound(_)));
        assert!(events.events().is_empty());
    }

    // ── operations ─────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn should_click_image_gated_by_sub_region_check() {
        let background = noise(100, 100, 1);
        let badge = noise(10, 10, 2);
        let button = noise(8, 8, 3);
        let frame = with_patch(&with_patch(&background, &badge, 5, 5), &button, 60, 40);
        let fake = FakeDesktop::new(TITLE, BOUNDS)
            .with_frames(vec![frame])
            .with_template("claim-screen.png", badge)
            .with_template("claim-click.png", button);
        let store = InMemoryStore::default();
        let events = RecordingPublisher::default();
        let job = job(&store).await;
        let t1 = task(&store, &job, "one", false).await;
        store
            .create_operation(
                Operation::builder()
                    .task_id(t1.id)
                    .name("claim")
                    .click_image()
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        scheduler(&store, &fake, &events).run(job.id).await.unwrap();

        assert_eq!(fake.clicks(), vec![Point::new(64, 44)]);
    }

    #[tokio::test(start_paused = true)]
    async fn should_sleep_for_implicit_wait() {
        let store = InMemoryStore::default();
        let fake = FakeDesktop::new(TITLE, BOUNDS);
        let events = RecordingPublisher::default();
        let job = job(&store).await;
        let t1 = task(&store, &job, "one", false).await;
        store
            .create_operation(
                Operation::builder()
                    .task_id(t1.id)
                    .name("loading")
                    .wait(30)
                    .implicit()
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        let started = Instant::now();
        scheduler(&store, &fake, &events).run(job.id).await.unwrap();

        // wait, operation pause, task pause
        assert_eq!(started.elapsed(), Duration::from_secs(32));
        assert_eq!(fake.captures(), 0);
    }

    // ── events and workers ─────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn should_publish_progress_then_single_success() {
        let store = InMemoryStore::default();
        let fake = FakeDesktop::new(TITLE, BOUNDS);
        let events = RecordingPublisher::default();
        let job = job(&store).await;
        let t1 = task(&store, &job, "one", false).await;
        tap(&store, &t1, "a", 0.1, false).await;

        scheduler(&store, &fake, &events).run(job.id).await.unwrap();

        let recorded = events.events();
        assert!(matches!(recorded.first(), Some(RunEvent::Started { .. })));
        assert!(matches!(recorded.last(), Some(RunEvent::Succeeded { .. })));
        assert_eq!(recorded.iter().filter(|e| e.is_terminal()).count(), 1);
        let task_states: Vec<StepState> = recorded
            .iter()
            .filter_map(|e| match e {
                RunEvent::TaskChanged { task_id, state, .. } if *task_id == t1.id => Some(*state),
                _ => None,
            })
            .collect();
        assert_eq!(task_states, vec![StepState::Running, StepState::Succeeded]);
        let run_id = recorded[0].run_id();
        assert!(recorded.iter().all(|e| e.run_id() == run_id));
    }

    #[tokio::test(start_paused = true)]
    async fn should_run_on_spawned_worker() {
        let store = InMemoryStore::default();
        let fake = FakeDesktop::new(TITLE, BOUNDS);
        let events = RecordingPublisher::default();
        let job = job(&store).await;
        let t1 = task(&store, &job, "one", false).await;
        tap(&store, &t1, "a", 0.5, false).await;

        let handle = scheduler(&store, &fake, &events).spawn(job.id);
        let run_id = handle.run_id();
        let report = handle.wait().await.unwrap();

        assert_eq!(report.run_id, run_id);
        assert_eq!(report.job_id, job.id);
        assert!(report.finished_at.is_some());
        assert_eq!(fake.clicks(), vec![Point::new(50, 50)]);
    }

    #[tokio::test(start_paused = true)]
    async fn should_leave_unlisted_tasks_in_creation_order() {
        let store = InMemoryStore::default();
        let fake = FakeDesktop::new(TITLE, BOUNDS);
        let events = RecordingPublisher::default();
        let mut job = job(&store).await;
        let mut order: Vec<TaskId> = Vec::new();
        for (name, x) in [("t1", 0.1), ("t2", 0.2), ("t3", 0.3)] {
            let t = task(&store, &job, name, false).await;
            tap(&store, &t, name, x, false).await;
            order.push(t.id);
        }
        job.task_order = vec![order[2], TaskId::new(999)];
        store.update_job(job.clone()).await.unwrap();

        scheduler(&store, &fake, &events).run(job.id).await.unwrap();

        assert_eq!(xs(&fake), vec![30, 10, 20]);
    }
}
