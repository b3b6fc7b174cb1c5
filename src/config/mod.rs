use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "adsight.toml";

/// LLM Provider类型，均通过OpenAI兼容接口访问
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "groq")]
    #[default]
    Groq,
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "ollama")]
    Ollama,
}

impl LLMProvider {
    /// 各Provider的默认API基地址
    pub fn default_base_url(&self) -> &'static str {
        match self {
            LLMProvider::Groq => "https://api.groq.com/openai/v1",
            LLMProvider::OpenAI => "https://api.openai.com/v1",
            LLMProvider::DeepSeek => "https://api.deepseek.com",
            LLMProvider::Ollama => "http://localhost:11434/v1",
        }
    }

    /// 是否需要API KEY才能访问
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, LLMProvider::Ollama)
    }
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::Groq => write!(f, "groq"),
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "groq" => Ok(LLMProvider::Groq),
            "openai" => Ok(LLMProvider::OpenAI),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    /// 投放数据CSV路径，不存在时会生成示例数据
    pub data_path: PathBuf,

    /// 报告输出目录
    pub output_path: PathBuf,

    /// 日志与执行轨迹目录
    pub logs_path: PathBuf,

    /// 提示词模板目录，按顺序查找
    pub prompt_dirs: Vec<PathBuf>,

    /// LLM模型配置
    pub llm: LLMConfig,

    /// 文案生成配置
    pub creative: CreativeConfig,

    /// 是否启用详细日志
    pub verbose: bool,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY，为空时进入离线模式
    pub api_key: String,

    /// LLM API基地址
    pub api_base_url: String,

    /// 模型名称
    pub model: String,

    /// 温度
    pub temperature: f64,

    /// 最大输出tokens
    pub max_tokens: u32,

    /// 强制使用离线的确定性响应
    pub offline: bool,
}

/// 文案生成配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CreativeConfig {
    /// 每个广告系列生成的文案数量
    pub num_suggestions: usize,

    /// 最多处理的低效广告系列数量
    pub max_campaigns: usize,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// 应用日志文件路径
    pub fn app_log_path(&self) -> PathBuf {
        self.logs_path.join("app.log")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/sample_fb_ads.csv"),
            output_path: PathBuf::from("reports"),
            logs_path: PathBuf::from("logs"),
            prompt_dirs: vec![PathBuf::from("prompts"), PathBuf::from("../prompts")],
            llm: LLMConfig::default(),
            creative: CreativeConfig::default(),
            verbose: false,
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        let provider = LLMProvider::default();
        Self {
            api_key: std::env::var("GROQ_API_KEY").unwrap_or_default(),
            api_base_url: provider.default_base_url().to_string(),
            provider,
            model: String::from("gemma2-9b-it"),
            temperature: 0.7,
            max_tokens: 2000,
            offline: false,
        }
    }
}

impl Default for CreativeConfig {
    fn default() -> Self {
        Self {
            num_suggestions: 5,
            max_campaigns: 5,
        }
    }
}
