//! # Sidequest - a real-life RPG
//!
//! Sidequest turns everyday tasks into quests. Players accept a quest, go do
//! it, and submit a photo as proof; a content generator judges the proof and
//! the engine awards XP, attributes, loot and achievements.
//!
//! ## Features
//!
//! - **Progression**: XP thresholds that grow by half each level, per-quest-type
//!   attribute gains, single-step level ups and a daily login streak.
//! - **Quest board**: generated daily quests, timed quests with a countdown,
//!   a "dopamine menu" grouping and at most one live world event at a time.
//! - **Generated content**: quests, world events, narration, lore, NPC chat and
//!   proof verification through the Gemini API (feature `gemini`), with built-in
//!   fallbacks whenever the generator is disabled or fails.
//! - **Persistence**: the profile blob, credential map and session token live in
//!   a `sled` database.
//! - **Accounts**: Argon2id password digests for the local account store.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sidequest::config::Config;
//! use sidequest::game::{Content, ProgressionEngine, SledStore, SystemClock, ThreadRandom};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let store = SledStore::open(config.db_path())?;
//!     let engine = ProgressionEngine::bootstrap(
//!         store,
//!         Content::offline(),
//!         SystemClock,
//!         ThreadRandom,
//!         config.game.engine_settings(),
//!     )
//!     .await?;
//!     println!("Level {}", engine.profile().level);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`game`] - profile model, progression rules, quest board, scheduler, generator seam and engine
//! - [`config`] - configuration loading and validation
//! - [`validation`] - account field validation and free-text sanitizing
//! - [`logutil`] - single-line log formatting helpers

pub mod config;
pub mod game;
pub mod logutil;
pub mod validation;
