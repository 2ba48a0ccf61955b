//! Pipeline runner.
//!
//! A [`Pipeline`] pairs the task DAG with the action registered for each
//! task. `run(name)` executes the named task after everything it
//! transitively depends on, strictly in dependency order. A task whose
//! dependency did not complete is skipped, never started.

use std::collections::HashMap;

use futures::future::BoxFuture;
use serde::Serialize;

use crate::core::{Task, TaskDAG, TaskId, TaskStatus};
use crate::{klog, klog_debug, klog_error, Error, Result};

/// The work behind a task.
pub trait TaskAction: Send + Sync {
    fn run(&self) -> BoxFuture<'_, Result<()>>;
}

/// A task as listed by `kiln tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    pub name: String,
    pub description: String,
    pub dependencies: Vec<String>,
}

/// Final status of every task that took part in a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub target: TaskId,
    pub tasks: Vec<(TaskId, TaskStatus)>,
}

impl RunReport {
    pub fn status_of(&self, name: &str) -> Option<&TaskStatus> {
        self.tasks
            .iter()
            .find(|(id, _)| id.as_str() == name)
            .map(|(_, status)| status)
    }
}

#[derive(Default)]
pub struct Pipeline {
    dag: TaskDAG,
    actions: HashMap<TaskId, Box<dyn TaskAction>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `task` with its action. Every dependency must already be
    /// registered; an edge that would close a cycle is rejected.
    pub fn register(
        &mut self,
        task: Task,
        dependencies: &[&str],
        action: impl TaskAction + 'static,
    ) -> Result<()> {
        let id = task.id.clone();
        if self.dag.contains_task(&id) {
            return Err(Error::Validation(format!("Task already registered: {}", id)));
        }
        for dependency in dependencies {
            if !self.dag.contains_task(&TaskId::new(dependency)) {
                return Err(Error::UnknownTask(dependency.to_string()));
            }
        }

        self.dag.add_task(task);
        for dependency in dependencies {
            self.dag.add_dependency(&TaskId::new(dependency), &id)?;
        }
        self.actions.insert(id, Box::new(action));
        Ok(())
    }

    pub fn dag(&self) -> &TaskDAG {
        &self.dag
    }

    /// Registered tasks in dependency order.
    pub fn tasks(&self) -> Result<Vec<TaskSummary>> {
        Ok(self
            .dag
            .topological_order()?
            .into_iter()
            .map(|task| TaskSummary {
                name: task.name().to_string(),
                description: task.description.clone(),
                dependencies: self
                    .dag
                    .get_dependencies(&task.id)
                    .into_iter()
                    .map(|dep| dep.name().to_string())
                    .collect(),
            })
            .collect())
    }

    /// Run `name` and everything it depends on.
    ///
    /// Returns the error of the first task that failed, so a lint failure
    /// surfaces as [`Error::LintFailed`] even when `build` was requested.
    pub async fn run(&mut self, name: &str) -> Result<RunReport> {
        let target = TaskId::new(name);
        let plan = self.dag.execution_plan(&target)?;
        self.dag.reset();
        klog!(
            "Running {} (plan: {})",
            target,
            plan.iter().map(TaskId::as_str).collect::<Vec<_>>().join(" -> ")
        );

        let mut first_error = None;
        for id in &plan {
            if let Some(dependency) = self.unfinished_dependency(id) {
                let reason = Error::DependencyFailed {
                    task: id.to_string(),
                    dependency,
                }
                .to_string();
                klog_debug!("Skipping {}: {}", id, reason);
                update(&mut self.dag, id, |task| task.skip(&reason));
                continue;
            }

            let Some(action) = self.actions.get(id) else {
                return Err(Error::UnknownTask(id.to_string()));
            };

            update(&mut self.dag, id, Task::start);
            klog_debug!("Task {} started", id);
            match action.run().await {
                Ok(()) => {
                    klog_debug!("Task {} completed", id);
                    update(&mut self.dag, id, Task::complete);
                }
                Err(e) => {
                    klog_error!("Task {} failed: {}", id, e);
                    let message = e.to_string();
                    update(&mut self.dag, id, |task| task.fail(&message));
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        Ok(RunReport {
            tasks: plan
                .iter()
                .filter_map(|id| self.dag.get_task(id))
                .map(|task| (task.id.clone(), task.status.clone()))
                .collect(),
            target,
        })
    }

    fn unfinished_dependency(&self, id: &TaskId) -> Option<String> {
        self.dag
            .get_dependencies(id)
            .into_iter()
            .find(|dep| !dep.is_completed())
            .map(|dep| dep.name().to_string())
    }
}

fn update(dag: &mut TaskDAG, id: &TaskId, f: impl FnOnce(&mut Task)) {
    if let Some(task) = dag.get_task_mut(id) {
        f(task);
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").field("dag", &self.dag).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    type Journal = Arc<Mutex<Vec<String>>>;

    struct Record {
        name: &'static str,
        journal: Journal,
        fail: bool,
    }

    impl TaskAction for Record {
        fn run(&self) -> BoxFuture<'_, Result<()>> {
            Box::pin(async move {
                self.journal.lock().unwrap().push(self.name.to_string());
                if self.fail {
                    Err(Error::LintFailed(1))
                } else {
                    Ok(())
                }
            })
        }
    }

    fn pipeline(lint_fails: bool) -> (Pipeline, Journal) {
        let journal: Journal = Arc::default();
        let mut pipeline = Pipeline::new();
        pipeline
            .register(
                Task::new("lint", "Check sources"),
                &[],
                Record {
                    name: "lint",
                    journal: Arc::clone(&journal),
                    fail: lint_fails,
                },
            )
            .unwrap();
        pipeline
            .register(
                Task::new("build", "Transpile sources"),
                &["lint"],
                Record {
                    name: "build",
                    journal: Arc::clone(&journal),
                    fail: false,
                },
            )
            .unwrap();
        (pipeline, journal)
    }

    #[tokio::test]
    async fn test_run_in_dependency_order() {
        let (mut pipeline, journal) = pipeline(false);
        let report = pipeline.run("build").await.unwrap();
        assert_eq!(*journal.lock().unwrap(), vec!["lint", "build"]);
        assert_eq!(report.target, TaskId::new("build"));
        assert_eq!(report.status_of("lint"), Some(&TaskStatus::Completed));
        assert_eq!(report.status_of("build"), Some(&TaskStatus::Completed));
    }

    #[tokio::test]
    async fn test_run_only_needed_tasks() {
        let (mut pipeline, journal) = pipeline(false);
        let report = pipeline.run("lint").await.unwrap();
        assert_eq!(*journal.lock().unwrap(), vec!["lint"]);
        assert_eq!(report.tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_dependency_skips_dependent() {
        let (mut pipeline, journal) = pipeline(true);
        let err = pipeline.run("build").await.unwrap_err();
        assert!(matches!(err, Error::LintFailed(1)));
        assert_eq!(*journal.lock().unwrap(), vec!["lint"]);

        let build = pipeline.dag().get_task(&TaskId::new("build")).unwrap();
        assert_eq!(
            build.status,
            TaskStatus::Skipped {
                reason: "Task 'build' not run: dependency 'lint' failed".to_string()
            }
        );
        assert!(build.started_at.is_none());
    }

    #[tokio::test]
    async fn test_run_resets_between_invocations() {
        let (mut pipeline, journal) = pipeline(false);
        pipeline.run("build").await.unwrap();
        pipeline.run("build").await.unwrap();
        assert_eq!(journal.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_unknown_task() {
        let (mut pipeline, _) = pipeline(false);
        let err = pipeline.run("deploy").await.unwrap_err();
        assert!(matches!(err, Error::UnknownTask(name) if name == "deploy"));
    }

    #[test]
    fn test_register_rejects_unknown_dependency() {
        let mut pipeline = Pipeline::new();
        let err = pipeline
            .register(
                Task::new("build", ""),
                &["lint"],
                Record {
                    name: "build",
                    journal: Arc::default(),
                    fail: false,
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::UnknownTask(_)));
        assert!(pipeline.dag().is_empty());
    }

    #[test]
    fn test_register_rejects_duplicate() {
        let (mut pipeline, journal) = pipeline(false);
        let err = pipeline
            .register(
                Task::new("lint", ""),
                &[],
                Record {
                    name: "lint",
                    journal,
                    fail: false,
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_tasks_listing() {
        let (pipeline, _) = pipeline(false);
        let tasks = pipeline.tasks().unwrap();
        assert_eq!(
            tasks,
            vec![
                TaskSummary {
                    name: "lint".to_string(),
                    description: "Check sources".to_string(),
                    dependencies: vec![],
                },
                TaskSummary {
                    name: "build".to_string(),
                    description: "Transpile sources".to_string(),
                    dependencies: vec!["lint".to_string()],
                },
            ]
        );
    }
}
