use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::generator::stage::StageOutput;
use crate::types::{StageKind, Task};

/// 单个任务的执行结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskOutcome {
    Completed { output: StageOutput },
    Error { error: String, task: Task },
    UnknownAgent { task: Task },
}

impl TaskOutcome {
    pub fn output(&self) -> Option<&StageOutput> {
        match self {
            TaskOutcome::Completed { output } => Some(output),
            _ => None,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            TaskOutcome::Completed { .. } => "completed",
            TaskOutcome::Error { .. } => "error",
            TaskOutcome::UnknownAgent { .. } => "unknown_agent",
        }
    }
}

/// 一次运行内的结果表，按任务id索引并保持插入顺序
///
/// 重复插入同一个id时原位替换，不改变顺序。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunResults {
    entries: Vec<(String, TaskOutcome)>,
}

impl RunResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, task_id: impl Into<String>, outcome: TaskOutcome) {
        let task_id = task_id.into();
        match self.entries.iter_mut().find(|(id, _)| *id == task_id) {
            Some(entry) => entry.1 = outcome,
            None => self.entries.push((task_id, outcome)),
        }
    }

    pub fn get(&self, task_id: &str) -> Option<&TaskOutcome> {
        self.entries
            .iter()
            .find(|(id, _)| id == task_id)
            .map(|(_, outcome)| outcome)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TaskOutcome)> {
        self.entries
            .iter()
            .map(|(id, outcome)| (id.as_str(), outcome))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 查找某个阶段的输出：约定id上的同类输出优先，其次是最近一次的同类输出
    pub fn find(&self, kind: StageKind) -> Option<&StageOutput> {
        let canonical = self
            .get(kind.canonical_task_id())
            .and_then(TaskOutcome::output)
            .filter(|output| output.kind() == kind);

        canonical.or_else(|| {
            self.entries
                .iter()
                .rev()
                .filter_map(|(_, outcome)| outcome.output())
                .find(|output| output.kind() == kind)
        })
    }
}

impl Serialize for RunResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, outcome) in &self.entries {
            map.serialize_entry(id, outcome)?;
        }
        map.end()
    }
}
