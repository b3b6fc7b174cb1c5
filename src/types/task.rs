use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// 流水线中的阶段类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageKind {
    Planner,
    Summarizer,
    Hypothesizer,
    Validator,
    Creative,
}

impl StageKind {
    /// 任务描述中使用的agent名称
    pub const fn agent_name(self) -> &'static str {
        match self {
            Self::Planner => "planner_agent",
            Self::Summarizer => "data_agent",
            Self::Hypothesizer => "insight_agent",
            Self::Validator => "evaluator_agent",
            Self::Creative => "creative_agent",
        }
    }

    /// 结果表中该阶段输出的约定任务id
    pub const fn canonical_task_id(self) -> &'static str {
        match self {
            Self::Planner => "plan",
            Self::Summarizer => "data_summary",
            Self::Hypothesizer => "insights",
            Self::Validator => "evaluation",
            Self::Creative => "creatives",
        }
    }
}

impl Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.agent_name())
    }
}

impl std::str::FromStr for StageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "planner_agent" | "planner" => Ok(StageKind::Planner),
            "data_agent" | "data" | "summarizer" => Ok(StageKind::Summarizer),
            "insight_agent" | "insight" | "hypothesizer" => Ok(StageKind::Hypothesizer),
            "evaluator_agent" | "evaluator" | "validator" => Ok(StageKind::Validator),
            "creative_agent" | "creative" | "creative_generator" => Ok(StageKind::Creative),
            _ => Err(format!("Unknown agent: {}", s)),
        }
    }
}

/// 任务中声明的agent，未知名称保留原文，执行时生成`unknown_agent`结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AgentTag {
    Stage(StageKind),
    Unknown(String),
}

impl AgentTag {
    pub fn stage(&self) -> Option<StageKind> {
        match self {
            AgentTag::Stage(kind) => Some(*kind),
            AgentTag::Unknown(_) => None,
        }
    }
}

impl From<String> for AgentTag {
    fn from(value: String) -> Self {
        match value.parse::<StageKind>() {
            Ok(kind) => AgentTag::Stage(kind),
            Err(_) => AgentTag::Unknown(value),
        }
    }
}

impl From<AgentTag> for String {
    fn from(value: AgentTag) -> Self {
        match value {
            AgentTag::Stage(kind) => kind.agent_name().to_string(),
            AgentTag::Unknown(name) => name,
        }
    }
}

impl From<StageKind> for AgentTag {
    fn from(kind: StageKind) -> Self {
        AgentTag::Stage(kind)
    }
}

impl Display for AgentTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentTag::Stage(kind) => write!(f, "{}", kind),
            AgentTag::Unknown(name) => write!(f, "{}", name),
        }
    }
}

/// 规划器生成的单个分析任务
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub agent: AgentTag,
    pub description: String,
    /// 声明的前置任务，仅供参考，执行时不做强制排序
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl Task {
    pub fn new(id: &str, agent: StageKind, description: &str, dependencies: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            agent: AgentTag::Stage(agent),
            description: description.to_string(),
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
        }
    }
}
