//! # Configuration
//!
//! Sidequest reads a single TOML file (default `config.toml`). Every section
//! except `[storage]` and `[logging]` may be omitted and falls back to defaults.
//!
//! ```toml
//! [storage]
//! data_dir = "./data"
//!
//! [logging]
//! level = "info"
//! file = "sidequest.log"
//!
//! [game]
//! spawn_interval_secs = 180
//! spawn_chance = 0.5
//! world_event_minutes = 15
//!
//! [generator]
//! enabled = true
//! model = "gemini-3-flash-preview"
//! # api_key may also come from GEMINI_API_KEY
//! ```
//!
//! Values are checked by [`Config::validate`] right after loading.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::game::engine::EngineSettings;
use crate::game::generator::{DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL};
use crate::game::scheduler::SchedulerConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    pub security: Option<SecurityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the sled database.
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_spawn_interval")]
    pub spawn_interval_secs: u64,
    #[serde(default = "default_spawn_chance")]
    pub spawn_chance: f64,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_countdown_interval")]
    pub countdown_interval_secs: u64,
    #[serde(default = "default_world_event_minutes")]
    pub world_event_minutes: u32,
    #[serde(default = "default_ability_cooldown")]
    pub ability_cooldown_minutes: u32,
    #[serde(default = "default_daily_bonus")]
    pub daily_bonus_xp: u32,
    #[serde(default = "default_npc_name")]
    pub npc_name: String,
}

fn default_spawn_interval() -> u64 {
    180
}
fn default_spawn_chance() -> f64 {
    0.5
}
fn default_sweep_interval() -> u64 {
    30
}
fn default_countdown_interval() -> u64 {
    1
}
fn default_world_event_minutes() -> u32 {
    15
}
fn default_ability_cooldown() -> u32 {
    60
}
fn default_daily_bonus() -> u32 {
    50
}
fn default_npc_name() -> String {
    "Garrick".to_string()
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            spawn_interval_secs: default_spawn_interval(),
            spawn_chance: default_spawn_chance(),
            sweep_interval_secs: default_sweep_interval(),
            countdown_interval_secs: default_countdown_interval(),
            world_event_minutes: default_world_event_minutes(),
            ability_cooldown_minutes: default_ability_cooldown(),
            daily_bonus_xp: default_daily_bonus(),
            npc_name: default_npc_name(),
        }
    }
}

impl GameConfig {
    /// Engine tunables derived from this section.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            scheduler: SchedulerConfig {
                spawn_interval: chrono::Duration::seconds(self.spawn_interval_secs as i64),
                sweep_interval: chrono::Duration::seconds(self.sweep_interval_secs as i64),
                countdown_interval: chrono::Duration::seconds(self.countdown_interval_secs as i64),
            },
            spawn_chance: self.spawn_chance,
            world_event_minutes: self.world_event_minutes,
            ability_cooldown: chrono::Duration::minutes(i64::from(self.ability_cooldown_minutes)),
            daily_bonus_xp: self.daily_bonus_xp,
            npc_name: self.npc_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// When false the game runs entirely on built-in content.
    #[serde(default)]
    pub enabled: bool,
    /// Gemini API key; falls back to the `GEMINI_API_KEY` environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}
fn default_endpoint() -> String {
    DEFAULT_GEMINI_ENDPOINT.to_string()
}
fn default_timeout() -> u64 {
    30
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            model: default_model(),
            endpoint: default_endpoint(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl GeneratorConfig {
    /// Configured key, or the one from the environment.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Argon2Config {
    #[serde(default)]
    pub memory_kib: Option<u32>,
    #[serde(default)]
    pub time_cost: Option<u32>,
    #[serde(default)]
    pub parallelism: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecurityConfig {
    #[serde(default)]
    pub argon2: Option<Argon2Config>,
}

impl Config {
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;
        config.validate()?;
        Ok(config)
    }

    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;
        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }
        let g = &self.game;
        if !(0.0..=1.0).contains(&g.spawn_chance) {
            return Err(anyhow!("game.spawn_chance must be between 0 and 1"));
        }
        if g.spawn_interval_secs == 0 || g.sweep_interval_secs == 0 || g.countdown_interval_secs == 0 {
            return Err(anyhow!("game intervals must be at least one second"));
        }
        if g.world_event_minutes == 0 {
            return Err(anyhow!("game.world_event_minutes must be positive"));
        }
        if g.npc_name.trim().is_empty() {
            return Err(anyhow!("game.npc_name must not be empty"));
        }
        if self.generator.enabled && self.generator.timeout_seconds == 0 {
            return Err(anyhow!("generator.timeout_seconds must be positive"));
        }
        Ok(())
    }

    /// Argon2 parameters from `[security.argon2]`, if any were set.
    pub fn argon2_params(&self) -> Option<argon2::Params> {
        let a = self.security.as_ref()?.argon2.as_ref()?;
        let builder = argon2::Params::DEFAULT;
        let mem = a.memory_kib.unwrap_or(builder.m_cost());
        let time = a.time_cost.unwrap_or(builder.t_cost());
        let para = a.parallelism.unwrap_or(builder.p_cost());
        argon2::Params::new(mem, time, para, None).ok()
    }

    /// Sled database directory under `data_dir`.
    pub fn db_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.storage.data_dir).join("sidequest.db")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                data_dir: "./data".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("sidequest.log".to_string()),
            },
            game: GameConfig::default(),
            generator: GeneratorConfig::default(),
            security: Some(SecurityConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_file_fills_game_defaults() {
        let toml_src = r#"
            [storage]
            data_dir = "/tmp/sq"

            [logging]
            level = "debug"
        "#;
        let config: Config = toml::from_str(toml_src).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.game.spawn_interval_secs, 180);
        assert_eq!(config.game.npc_name, "Garrick");
        assert!(!config.generator.enabled);
        assert_eq!(config.generator.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.generator.endpoint, DEFAULT_GEMINI_ENDPOINT);
        assert!(config.argon2_params().is_none());

        let settings = config.game.engine_settings();
        assert_eq!(settings.world_event_minutes, 15);
        assert_eq!(settings.ability_cooldown, chrono::Duration::hours(1));
        assert_eq!(settings.scheduler.sweep_interval, chrono::Duration::seconds(30));
    }

    #[test]
    fn invalid_spawn_chance_is_rejected() {
        let mut config = Config::default();
        config.game.spawn_chance = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert!(parsed.validate().is_ok());
        assert_eq!(parsed.storage.data_dir, "./data");
    }

    #[test]
    fn argon2_overrides_are_applied() {
        let mut config = Config::default();
        config.security = Some(SecurityConfig {
            argon2: Some(Argon2Config {
                memory_kib: Some(8192),
                time_cost: Some(2),
                parallelism: None,
            }),
        });
        let params = config.argon2_params().unwrap();
        assert_eq!(params.m_cost(), 8192);
        assert_eq!(params.t_cost(), 2);
    }

    #[tokio::test]
    async fn create_default_writes_a_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path = path.to_str().unwrap();
        Config::create_default(path).await.unwrap();
        let loaded = Config::load(path).await.unwrap();
        assert_eq!(loaded.game.daily_bonus_xp, 50);
    }
}
