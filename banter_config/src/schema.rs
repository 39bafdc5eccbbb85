use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::ConfigError;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_MAX_WORKERS: usize = 10;
const DEFAULT_SEARCH_RESULTS: usize = 5;
const DEFAULT_WINDOW_PAIRS: usize = 5;

/// Fully resolved service configuration.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub providers: ProvidersConfig,
    pub server: ServerConfig,
    pub memory: MemoryConfig,
    pub conversation: ConversationConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProvidersConfig {
    pub openai: OpenAiConfig,
    pub tavily: TavilyConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TavilyConfig {
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    pub port: u16,
    pub max_workers: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoryConfig {
    /// Message pairs kept verbatim per session
    pub window_pairs: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationConfig {
    pub web_search: bool,
    pub search_results: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

/// Contents of `config.json`. Every field is optional; the environment
/// and the built-in defaults fill the gaps.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub providers: FileProviders,
    pub server: FileServer,
    pub memory: FileMemory,
    pub conversation: FileConversation,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileProviders {
    pub openai: FileOpenAi,
    pub tavily: FileTavily,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileOpenAi {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileTavily {
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileServer {
    pub port: Option<u16>,
    pub max_workers: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileMemory {
    pub window_pairs: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConversation {
    pub web_search: Option<bool>,
    pub search_results: Option<usize>,
    pub system_prompt: Option<String>,
}

impl FileConfig {
    /// Parse the JSON contents of a config file.
    pub fn parse(content: &str, path: PathBuf) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|source| ConfigError::Parse { path, source })
    }
}

impl Config {
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        Ok(dirs::home_dir().ok_or(ConfigError::NoHome)?.join("banter"))
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load `~/banter/config.json` if it exists and overlay the process
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        let file = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            info!("Loaded config from {}", path.display());
            FileConfig::parse(&content, path)?
        } else {
            FileConfig::default()
        };

        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Merge defaults, file values and environment values.
    ///
    /// Environment variables win over the file. Empty environment values
    /// are treated as unset.
    pub fn resolve<F>(file: FileConfig, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let openai_key = env("OPENAI_API_KEY")
            .or(file.providers.openai.api_key)
            .ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;
        let tavily_key = env("TAVILY_API_KEY")
            .or(file.providers.tavily.api_key)
            .ok_or(ConfigError::Missing("TAVILY_API_KEY"))?;
        let port = parsed(&env, "BANTER_PORT")?
            .or(file.server.port)
            .ok_or(ConfigError::Missing("BANTER_PORT"))?;

        let max_workers = match parsed(&env, "BANTER_MAX_WORKERS")?.or(file.server.max_workers) {
            Some(n) => n,
            None => {
                warn!("BANTER_MAX_WORKERS not set, defaulting to {DEFAULT_MAX_WORKERS}");
                DEFAULT_MAX_WORKERS
            }
        };
        if max_workers == 0 {
            return Err(ConfigError::Invalid {
                key: "BANTER_MAX_WORKERS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let web_search = match env("BANTER_WEB_SEARCH") {
            Some(raw) => parse_flag("BANTER_WEB_SEARCH", &raw)?,
            None => file.conversation.web_search.unwrap_or(false),
        };

        Ok(Self {
            providers: ProvidersConfig {
                openai: OpenAiConfig {
                    api_key: openai_key,
                    base_url: env("OPENAI_BASE_URL")
                        .or(file.providers.openai.base_url)
                        .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
                    model: env("BANTER_MODEL")
                        .or(file.providers.openai.model)
                        .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                },
                tavily: TavilyConfig {
                    api_key: tavily_key,
                },
            },
            server: ServerConfig { port, max_workers },
            memory: MemoryConfig {
                window_pairs: parsed(&env, "BANTER_MEMORY_WINDOW")?
                    .or(file.memory.window_pairs)
                    .unwrap_or(DEFAULT_WINDOW_PAIRS),
            },
            conversation: ConversationConfig {
                web_search,
                search_results: parsed(&env, "BANTER_SEARCH_RESULTS")?
                    .or(file.conversation.search_results)
                    .unwrap_or(DEFAULT_SEARCH_RESULTS),
                system_prompt: env("BANTER_SYSTEM_PROMPT").or(file.conversation.system_prompt),
            },
        })
    }

    pub fn ensure_config_dir() -> Result<PathBuf, ConfigError> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir).map_err(|source| ConfigError::Io {
            path: config_dir.clone(),
            source,
        })?;
        Ok(config_dir)
    }

    /// Write a template `config.json`. Refuses to overwrite an existing file.
    pub fn create_config() -> Result<PathBuf, ConfigError> {
        let config_path = Self::ensure_config_dir()?.join("config.json");

        if config_path.exists() {
            return Err(ConfigError::Invalid {
                key: "config.json",
                value: config_path.display().to_string(),
                reason: "file already exists, edit it directly".to_string(),
            });
        }

        std::fs::write(&config_path, CONFIG_TEMPLATE).map_err(|source| ConfigError::Io {
            path: config_path.clone(),
            source,
        })?;
        Ok(config_path)
    }
}

const CONFIG_TEMPLATE: &str = r#"{
  "providers": {
    "openai": {
      "api_key": "your-openai-api-key-here",
      "base_url": "https://api.openai.com/v1",
      "model": "gpt-3.5-turbo"
    },
    "tavily": {
      "api_key": "your-tavily-api-key-here"
    }
  },
  "server": {
    "port": 50051,
    "max_workers": 10
  },
  "memory": {
    "window_pairs": 5
  },
  "conversation": {
    "web_search": false,
    "search_results": 5
  }
}
"#;

fn parsed<T, F>(env: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    env(key)
        .map(|raw| {
            raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("OPENAI_API_KEY", "sk-test"),
        ("TAVILY_API_KEY", "tvly-test"),
        ("BANTER_PORT", "50051"),
    ];

    #[test]
    fn test_defaults_fill_optional_settings() {
        let config = Config::resolve(FileConfig::default(), env_of(&REQUIRED)).unwrap();

        assert_eq!(config.providers.openai.api_key, "sk-test");
        assert_eq!(config.providers.openai.base_url, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(config.providers.openai.model, "gpt-3.5-turbo");
        assert_eq!(config.server.port, 50051);
        assert_eq!(config.server.max_workers, 10);
        assert_eq!(config.memory.window_pairs, 5);
        assert!(!config.conversation.web_search);
        assert_eq!(config.conversation.search_results, 5);
        assert!(config.conversation.system_prompt.is_none());
    }

    #[test]
    fn test_missing_required_settings() {
        let err = Config::resolve(FileConfig::default(), env_of(&REQUIRED[1..])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("OPENAI_API_KEY")));

        let err = Config::resolve(FileConfig::default(), env_of(&REQUIRED[..2])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("BANTER_PORT")));

        let mut env = REQUIRED.to_vec();
        env[1] = ("TAVILY_API_KEY", "  ");
        let err = Config::resolve(FileConfig::default(), env_of(&env)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("TAVILY_API_KEY")));
    }

    #[test]
    fn test_unparseable_values_are_rejected() {
        let mut env = REQUIRED.to_vec();
        env.push(("BANTER_MAX_WORKERS", "many"));
        let err = Config::resolve(FileConfig::default(), env_of(&env)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "BANTER_MAX_WORKERS", .. }));

        let mut env = REQUIRED.to_vec();
        env[2] = ("BANTER_PORT", "70000");
        let err = Config::resolve(FileConfig::default(), env_of(&env)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "BANTER_PORT", .. }));

        let mut env = REQUIRED.to_vec();
        env.push(("BANTER_WEB_SEARCH", "maybe"));
        let err = Config::resolve(FileConfig::default(), env_of(&env)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "BANTER_WEB_SEARCH", .. }));

        let mut env = REQUIRED.to_vec();
        env.push(("BANTER_MAX_WORKERS", "0"));
        assert!(Config::resolve(FileConfig::default(), env_of(&env)).is_err());
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = FileConfig::parse(
            r#"{
                "providers": { "openai": { "api_key": "from-file", "model": "file-model" } },
                "server": { "port": 8080, "max_workers": 3 },
                "memory": { "window_pairs": 2 },
                "conversation": { "web_search": true, "system_prompt": "System: file" }
            }"#,
            PathBuf::from("config.json"),
        )
        .unwrap();
        let env = env_of(&[
            ("TAVILY_API_KEY", "tvly"),
            ("BANTER_MODEL", "env-model"),
            ("BANTER_WEB_SEARCH", "false"),
            ("BANTER_SEARCH_RESULTS", "3"),
        ]);

        let config = Config::resolve(file, env).unwrap();

        assert_eq!(config.providers.openai.api_key, "from-file");
        assert_eq!(config.providers.openai.model, "env-model");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.max_workers, 3);
        assert_eq!(config.memory.window_pairs, 2);
        assert!(!config.conversation.web_search);
        assert_eq!(config.conversation.search_results, 3);
        assert_eq!(config.conversation.system_prompt.as_deref(), Some("System: file"));
    }

    #[test]
    fn test_flag_spellings() {
        assert!(parse_flag("K", "TRUE").unwrap());
        assert!(parse_flag("K", "1").unwrap());
        assert!(!parse_flag("K", "off").unwrap());
    }

    #[test]
    fn test_malformed_file() {
        let err = FileConfig::parse("{ not json", PathBuf::from("x.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_template_is_valid_file_config() {
        let file = FileConfig::parse(CONFIG_TEMPLATE, PathBuf::from("t.json")).unwrap();
        assert_eq!(file.server.port, Some(50051));
        assert_eq!(file.memory.window_pairs, Some(5));
    }
}
