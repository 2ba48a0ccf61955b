//! Task DAG (Directed Acyclic Graph) for dependency management.
//!
//! The pipeline's tasks and their declared dependencies are held in an
//! explicit graph built once at startup. Running a task means running the
//! sub-graph of everything it transitively depends on, in dependency order.

use crate::core::task::{Task, TaskId};
use crate::error::{Error, Result};
use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Reversed, Walker};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// The task dependency graph.
///
/// Nodes are tasks; an edge `a -> b` means `b` depends on `a` (`a` must
/// complete before `b` can start).
pub struct TaskDAG {
    graph: DiGraph<Task, ()>,
    task_index: HashMap<TaskId, NodeIndex>,
}

impl TaskDAG {
    /// Create a new empty TaskDAG.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            task_index: HashMap::new(),
        }
    }

    /// Add a task to the DAG.
    ///
    /// If a task with the same name already exists, returns the existing
    /// NodeIndex and leaves the stored task untouched.
    pub fn add_task(&mut self, task: Task) -> NodeIndex {
        if let Some(&index) = self.task_index.get(&task.id) {
            return index;
        }

        let id = task.id.clone();
        let index = self.graph.add_node(task);
        self.task_index.insert(id, index);
        index
    }

    /// Declare that `task` depends on `dependency`.
    ///
    /// # Errors
    /// Returns an error if either task is unknown or if the edge would
    /// create a cycle (the graph is left unchanged in that case).
    pub fn add_dependency(&mut self, dependency: &TaskId, task: &TaskId) -> Result<()> {
        let from_index = self.index_of(dependency)?;
        let to_index = self.index_of(task)?;

        if self.graph.find_edge(from_index, to_index).is_some() {
            return Ok(());
        }

        let edge = self.graph.add_edge(from_index, to_index, ());
        if is_cyclic_directed(&self.graph) {
            self.graph.remove_edge(edge);
            return Err(Error::Validation(format!(
                "Adding dependency from {} to {} would create a cycle",
                dependency, task
            )));
        }

        Ok(())
    }

    fn index_of(&self, id: &TaskId) -> Result<NodeIndex> {
        self.task_index
            .get(id)
            .copied()
            .ok_or_else(|| Error::UnknownTask(id.to_string()))
    }

    pub fn get_task(&self, id: &TaskId) -> Option<&Task> {
        self.task_index
            .get(id)
            .and_then(|&index| self.graph.node_weight(index))
    }

    pub fn get_task_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        let index = *self.task_index.get(id)?;
        self.graph.node_weight_mut(index)
    }

    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains_task(&self, id: &TaskId) -> bool {
        self.task_index.contains_key(id)
    }

    /// Check whether `task` directly depends on `dependency`.
    pub fn has_dependency(&self, dependency: &TaskId, task: &TaskId) -> bool {
        match (self.task_index.get(dependency), self.task_index.get(task)) {
            (Some(&from), Some(&to)) => self.graph.find_edge(from, to).is_some(),
            _ => false,
        }
    }

    /// Direct dependencies of a task, sorted by name.
    pub fn get_dependencies(&self, id: &TaskId) -> Vec<&Task> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Tasks that directly depend on the given task, sorted by name.
    pub fn get_dependents(&self, id: &TaskId) -> Vec<&Task> {
        self.neighbors(id, Direction::Outgoing)
    }

    fn neighbors(&self, id: &TaskId, direction: Direction) -> Vec<&Task> {
        let Some(&index) = self.task_index.get(id) else {
            return Vec::new();
        };
        let mut tasks: Vec<&Task> = self
            .graph
            .neighbors_directed(index, direction)
            .filter_map(|neighbor| self.graph.node_weight(neighbor))
            .collect();
        tasks.sort_by(|a, b| a.id.cmp(&b.id));
        tasks
    }

    /// All tasks in registration order.
    pub fn all_tasks(&self) -> Vec<&Task> {
        self.graph.node_weights().collect()
    }

    // ========== Scheduling Operations ==========

    /// Get tasks in topological order (each task after all of its dependencies).
    pub fn topological_order(&self) -> Result<Vec<&Task>> {
        let sorted = toposort(&self.graph, None).map_err(|cycle| {
            let task_name = self
                .graph
                .node_weight(cycle.node_id())
                .map(|t| t.name())
                .unwrap_or("unknown");
            Error::Validation(format!("Cycle detected at task: {}", task_name))
        })?;

        Ok(sorted
            .into_iter()
            .filter_map(|index| self.graph.node_weight(index))
            .collect())
    }

    /// Ids of the tasks that must run for `target`, in execution order.
    ///
    /// The plan contains `target` and every task it transitively depends on,
    /// ordered so each task follows all of its dependencies. Independent
    /// tasks keep their topological-sort order.
    ///
    /// # Errors
    /// Returns [`Error::UnknownTask`] if `target` is not registered.
    pub fn execution_plan(&self, target: &TaskId) -> Result<Vec<TaskId>> {
        let target_index = self.index_of(target)?;

        let reversed = Reversed(&self.graph);
        let needed: HashSet<NodeIndex> = petgraph::visit::Dfs::new(reversed, target_index)
            .iter(reversed)
            .collect();

        Ok(self
            .topological_order()?
            .into_iter()
            .filter(|task| {
                self.task_index
                    .get(&task.id)
                    .is_some_and(|index| needed.contains(index))
            })
            .map(|task| task.id.clone())
            .collect())
    }

    /// Reset every task to Pending.
    pub fn reset(&mut self) {
        for task in self.graph.node_weights_mut() {
            task.reset();
        }
    }
}

impl Default for TaskDAG {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TaskDAG {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskDAG")
            .field("tasks", &self.task_count())
            .field("dependencies", &self.dependency_count())
            .finish()
    }
}
