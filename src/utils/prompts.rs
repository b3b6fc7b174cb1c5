use std::path::PathBuf;

/// 依次尝试候选文件，返回第一个可读取的内容
pub fn load_first_available(candidates: &[PathBuf]) -> Option<(PathBuf, String)> {
    candidates.iter().find_map(|path| {
        std::fs::read_to_string(path)
            .ok()
            .map(|content| (path.clone(), content))
    })
}

/// 各阶段的系统提示词模板
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Planner,
    Insight,
    Creative,
}

impl PromptKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            PromptKind::Planner => "planner_prompt.md",
            PromptKind::Insight => "insight_prompt.md",
            PromptKind::Creative => "creative_prompt.md",
        }
    }

    /// 模板文件不存在时使用的一句话提示词
    pub fn fallback(&self) -> &'static str {
        match self {
            PromptKind::Planner => "You are a strategic marketing planner.",
            PromptKind::Insight => "You are a business insight specialist.",
            PromptKind::Creative => "You are a creative strategist.",
        }
    }
}

/// 提示词模板库，候选目录按顺序查找
#[derive(Debug, Clone, Default)]
pub struct PromptLibrary {
    dirs: Vec<PathBuf>,
}

impl PromptLibrary {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    pub fn candidates(&self, kind: PromptKind) -> Vec<PathBuf> {
        self.dirs.iter().map(|dir| dir.join(kind.file_name())).collect()
    }

    pub fn system_prompt(&self, kind: PromptKind) -> String {
        match load_first_available(&self.candidates(kind)) {
            Some((path, content)) => {
                tracing::debug!("加载提示词模板: {}", path.display());
                content
            }
            None => {
                tracing::warn!("未找到提示词模板 {}，使用默认提示词", kind.file_name());
                kind.fallback().to_string()
            }
        }
    }
}
