use crate::config::{Config, DEFAULT_CONFIG_FILE, LLMProvider};
use anyhow::{Result, anyhow};
use clap::Parser;
use std::path::PathBuf;

/// adsight - 多智能体广告投放数据分析
#[derive(Parser, Debug)]
#[command(name = "adsight")]
#[command(
    about = "Multi-agent analyst for advertising performance data. It plans the analysis, summarizes campaigns, explains performance changes, validates the explanations and proposes new creatives."
)]
#[command(version)]
pub struct Args {
    /// 分析问题
    #[arg(default_value = "Analyze ROAS drop")]
    pub query: String,

    /// 投放数据CSV路径
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 报告输出目录
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// 日志目录
    #[arg(long)]
    pub logs_path: Option<PathBuf>,

    /// 提示词模板目录，优先于配置中的目录
    #[arg(long)]
    pub prompts_dir: Option<PathBuf>,

    /// LLM Provider (groq, openai, deepseek, ollama)
    #[arg(long)]
    pub provider: Option<String>,

    /// 模型名称
    #[arg(short, long)]
    pub model: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub api_key: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub api_base_url: Option<String>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 每个广告系列生成的文案数量
    #[arg(short = 'n', long)]
    pub num_suggestions: Option<usize>,

    /// 不访问LLM，使用确定性的离线响应
    #[arg(long)]
    pub offline: bool,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// 将CLI参数转换为配置，优先级：CLI参数 > 配置文件 > 默认值
    pub fn into_config(&self) -> Result<Config> {
        let mut config = if let Some(config_path) = &self.config {
            // 显式指定的配置文件必须可读
            Config::from_file(config_path)?
        } else {
            let default_config_path = std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(DEFAULT_CONFIG_FILE);

            if default_config_path.exists() {
                Config::from_file(&default_config_path)?
            } else {
                Config::default()
            }
        };

        if let Some(data) = &self.data {
            config.data_path = data.clone();
        }
        if let Some(output_path) = &self.output_path {
            config.output_path = output_path.clone();
        }
        if let Some(logs_path) = &self.logs_path {
            config.logs_path = logs_path.clone();
        }
        if let Some(prompts_dir) = &self.prompts_dir {
            config.prompt_dirs.insert(0, prompts_dir.clone());
        }

        // 覆盖LLM配置
        if let Some(provider_str) = &self.provider {
            let provider = provider_str
                .parse::<LLMProvider>()
                .map_err(|e| anyhow!(e))?;
            // 切换Provider且未指定基地址时，使用该Provider的默认地址
            if provider != config.llm.provider && self.api_base_url.is_none() {
                config.llm.api_base_url = provider.default_base_url().to_string();
            }
            config.llm.provider = provider;
        }
        if let Some(api_base_url) = &self.api_base_url {
            config.llm.api_base_url = api_base_url.clone();
        }
        if let Some(api_key) = &self.api_key {
            config.llm.api_key = api_key.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(num_suggestions) = self.num_suggestions {
            config.creative.num_suggestions = num_suggestions;
        }
        if self.offline {
            config.llm.offline = true;
        }
        if self.verbose {
            config.verbose = true;
        }

        Ok(config)
    }
}
