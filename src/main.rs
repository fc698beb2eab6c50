//! Binary entrypoint for the Sidequest CLI.
//!
//! Commands:
//! - `init` - write a starter `config.toml`
//! - `status` - print the stored profile and session
//! - `register --email <e> --name <n>` - create a local account (password prompted)
//! - `login --email <e>` - sign in (password prompted)
//! - `logout` - clear the session token
//! - `play [--guest]` - start the interactive quest session
//!
//! See the library crate docs for module-level details: `sidequest::`.
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use sidequest::config::Config;
use sidequest::game::storage;
use sidequest::game::{
    session, AuthService, Content, ProgressionEngine, SledStore, SystemClock, ThreadRandom,
    UserProfile,
};
use sidequest::logutil::{escape_log, mask_email};

#[derive(Parser)]
#[command(name = "sidequest")]
#[command(about = "A real-life RPG: accept quests, prove them with a photo, level up")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Show the stored profile and current session
    Status,
    /// Create a local account and sign in
    Register {
        #[arg(short, long)]
        email: String,
        /// Display name for the new character
        #[arg(short, long)]
        name: String,
    },
    /// Sign in to an existing account
    Login {
        #[arg(short, long)]
        email: String,
    },
    /// Clear the current session
    Logout,
    /// Start an interactive session
    Play {
        /// Play without an account, on the locally stored profile
        #[arg(long)]
        guest: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        Config::create_default(&cli.config).await?;
        info!("Configuration file created at {}", cli.config);
        println!("Wrote {}. Edit [generator] to enable generated content.", cli.config);
        return Ok(());
    }

    let config = Config::load(&cli.config).await?;
    init_logging(&Some(config.clone()), cli.verbose);

    let store = SledStore::open(config.db_path())?;
    let accounts = AuthService::with_params(store.clone(), config.argon2_params());

    match cli.command {
        Commands::Init => {}
        Commands::Status => {
            match storage::load_profile(&store)? {
                Some(profile) => print_profile(&profile),
                None => println!("No profile yet. Run `sidequest play` to begin."),
            }
            match accounts.get_session()? {
                Some(user) => println!(
                    "Signed in as {}",
                    user.email.as_deref().unwrap_or(user.name.as_str())
                ),
                None => println!("Not signed in."),
            }
        }
        Commands::Register { email, name } => {
            let pass1 = rpassword::prompt_password("New password: ")?;
            let pass2 = rpassword::prompt_password("Confirm password: ")?;
            if pass1 != pass2 {
                println!("Error: passwords do not match.");
                return Ok(());
            }
            match accounts.register(&email, &pass1, &name, chrono::Utc::now()) {
                Ok(profile) => {
                    storage::save_profile(&store, &profile)?;
                    println!("Welcome, {}. Your adventure begins.", profile.name);
                }
                Err(e) => println!("Error: {e}"),
            }
        }
        Commands::Login { email } => {
            let password = rpassword::prompt_password("Password: ")?;
            match accounts.login(&email, &password) {
                Ok(profile) => {
                    storage::save_profile(&store, &profile)?;
                    println!("Welcome back, {} (level {}).", profile.name, profile.level);
                }
                Err(e) => println!("Error: {e}"),
            }
        }
        Commands::Logout => {
            accounts.logout()?;
            println!("Signed out.");
        }
        Commands::Play { guest } => {
            if !guest {
                let Some(user) = accounts.get_session()? else {
                    return Err(anyhow!(
                        "not signed in; run `sidequest login`, `sidequest register`, or `play --guest`"
                    ));
                };
                adopt_session_profile(&store, user)?;
            }

            let content = build_content(&config);
            let settings = config.game.engine_settings();
            let tick_every = std::time::Duration::from_secs(config.game.countdown_interval_secs);
            let engine =
                ProgressionEngine::bootstrap(store, content, SystemClock, ThreadRandom, settings)
                    .await?;
            info!(
                "session started for {} (level {})",
                escape_log(&engine.profile().name),
                engine.profile().level
            );
            session::run(engine, tick_every).await?;
        }
    }

    Ok(())
}

/// Make the signed-in account's profile the active one unless it already is.
fn adopt_session_profile(store: &SledStore, user: UserProfile) -> Result<()> {
    let current = storage::load_profile(store)?;
    if current.as_ref().map(|p| p.id.as_str()) != Some(user.id.as_str()) {
        if let Some(email) = user.email.as_deref() {
            info!("switching active profile to {}", mask_email(email));
        }
        storage::save_profile(store, &user)?;
    }
    Ok(())
}

fn build_content(config: &Config) -> Content {
    if !config.generator.enabled {
        info!("generator disabled; using built-in content");
        return Content::offline();
    }
    #[cfg(feature = "gemini")]
    {
        use std::sync::Arc;

        use sidequest::game::GeminiGenerator;
        match config.generator.resolved_api_key() {
            Some(key) => {
                let generator = GeminiGenerator::new(
                    &config.generator.endpoint,
                    &config.generator.model,
                    &key,
                    config.generator.timeout_seconds,
                );
                info!("content generator: {}", config.generator.model);
                Content::new(Arc::new(generator))
            }
            None => {
                warn!("generator enabled but no API key configured; using built-in content");
                Content::offline()
            }
        }
    }
    #[cfg(not(feature = "gemini"))]
    {
        warn!("built without the 'gemini' feature; using built-in content");
        Content::offline()
    }
}

fn print_profile(profile: &UserProfile) {
    println!("{} {} the {}", profile.avatar, profile.name, profile.title);
    println!(
        "Level {} {:?}  XP {}/{}  Streak {} day(s)",
        profile.level, profile.player_class, profile.current_xp, profile.next_level_xp, profile.streak
    );
    let a = &profile.attributes;
    println!(
        "STR {}  INT {}  CHA {}",
        a.strength, a.intellect, a.charisma
    );
    println!(
        "Loot {}  Achievements {}  Lore {}",
        profile.inventory.len(),
        profile.achievements.len(),
        profile.lore_unlocked.len()
    );
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse::<log::LevelFilter>().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    // sled and the HTTP stack are chatty at debug
    builder.filter_module("sled", log::LevelFilter::Warn);
    builder.filter_module("reqwest", log::LevelFilter::Warn);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // The interactive session owns the terminal; only mirror to stderr when it isn't a TTY.
        let mirror = !atty::is(atty::Stream::Stderr);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if mirror {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
