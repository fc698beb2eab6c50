//! Interactive terminal session: reads commands from stdin, drives the engine's
//! scheduler from an interval, and folds in results of background generator
//! calls (narrative, verification, world events) as they arrive.

use std::time::Duration;

use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::game::achievement;
use crate::game::clock::{Clock, RandomSource};
use crate::game::engine::{
    AbilityOutcome, NarrativeDraft, ProfileEdit, ProgressionEngine, TickEvent, TickOutcome,
    VerificationTicket,
};
use crate::game::errors::GameError;
use crate::game::quest::QuestPhase;
use crate::game::storage::KeyValueStore;
use crate::game::types::{
    LoreCategory, NarrativeMode, PlayerClass, Quest, VerificationResult,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Status,
    Board,
    Menu,
    Accept(String),
    View,
    Leave,
    Submit { image_path: String, report: String },
    Retry,
    Abandon,
    Oracle(String),
    Bonus,
    Ability,
    Lore(LoreCategory),
    Library,
    Achievements,
    Feed,
    Leaderboard,
    Chat(String),
    Onboard {
        class: PlayerClass,
        mode: NarrativeMode,
        preference: String,
    },
    Edit(EditField, String),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Name,
    Avatar,
    Color,
}

pub const HELP: &str = "\
commands:
  status | board | menu | feed | ranks | achievements | library
  accept <quest-id>      start a quest
  submit <image> [note]  send proof for the active quest
  view | leave           show or hide the active quest (timers pause when hidden)
  retry | abandon        after a failed verdict / drop the active quest
  oracle <request>       ask the Oracle for a custom quest
  bonus                  claim the daily bonus
  reroll                 class ability: new quests (1h cooldown)
  lore <bestiary|history|library>
  chat <message>         talk to the tavern keeper
  onboard <class> <mode> [preference]
  name|avatar|color <value>
  quit";

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let need = |what: &str| -> Result<String, String> {
        if rest.is_empty() {
            Err(format!("usage: {} {}", verb, what))
        } else {
            Ok(rest.to_string())
        }
    };

    let cmd = match verb.to_ascii_lowercase().as_str() {
        "help" | "?" => Command::Help,
        "status" | "me" => Command::Status,
        "board" | "quests" => Command::Board,
        "menu" => Command::Menu,
        "accept" | "a" => Command::Accept(need("<quest-id>")?),
        "view" => Command::View,
        "leave" | "back" => Command::Leave,
        "submit" => {
            let args = need("<image> [note]")?;
            let (path, report) = match args.split_once(char::is_whitespace) {
                Some((path, report)) => (path.to_string(), report.trim().to_string()),
                None => (args, String::new()),
            };
            Command::Submit {
                image_path: path,
                report,
            }
        }
        "retry" => Command::Retry,
        "abandon" => Command::Abandon,
        "oracle" => Command::Oracle(need("<request>")?),
        "bonus" | "claim" => Command::Bonus,
        "reroll" | "ability" => Command::Ability,
        "lore" => {
            let arg = need("<bestiary|history|library>")?;
            let category =
                LoreCategory::parse(&arg).ok_or_else(|| format!("unknown lore category: {}", arg))?;
            Command::Lore(category)
        }
        "library" | "archive" => Command::Library,
        "achievements" | "ach" => Command::Achievements,
        "feed" => Command::Feed,
        "ranks" | "leaderboard" => Command::Leaderboard,
        "chat" | "say" => Command::Chat(need("<message>")?),
        "onboard" => {
            let args = need("<class> <mode> [preference]")?;
            let mut parts = args.splitn(3, char::is_whitespace);
            let class_arg = parts.next().unwrap_or_default();
            let class = PlayerClass::parse(class_arg)
                .ok_or_else(|| format!("unknown class: {}", class_arg))?;
            let mode_arg = parts.next().unwrap_or_default();
            let mode = NarrativeMode::parse(mode_arg)
                .ok_or_else(|| format!("unknown narrative mode: {}", mode_arg))?;
            Command::Onboard {
                class,
                mode,
                preference: parts.next().unwrap_or_default().trim().to_string(),
            }
        }
        "name" => Command::Edit(EditField::Name, need("<name>")?),
        "avatar" => Command::Edit(EditField::Avatar, need("<glyph>")?),
        "color" => Command::Edit(EditField::Color, need("<color>")?),
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command '{}'; try 'help'", other)),
    };
    Ok(Some(cmd))
}

fn quest_line(quest: &Quest) -> String {
    let mut line = format!(
        "[{}] {} - {:?}, {} XP, {}",
        quest.id,
        quest.title,
        quest.difficulty,
        quest.xp_reward,
        quest.quest_type.as_str()
    );
    if let Some(minutes) = quest.duration_minutes {
        line.push_str(&format!(", {} min", minutes));
    }
    if let Some(hint) = &quest.location_hint {
        line.push_str(&format!(", find: {}", hint));
    }
    if quest.completed {
        line.push_str(" (done)");
    }
    line
}

fn verdict_lines(result: &VerificationResult) -> String {
    let mut out = format!(
        "{} | confidence {} | mood {}\n  \"{}\"",
        if result.success { "SUCCESS" } else { "FAILED" },
        result.confidence_score,
        result.sentiment,
        result.ai_comment
    );
    if let Some(loot) = &result.loot {
        out.push_str(&format!("\n  loot: {} ({:?})", loot.name, loot.rarity));
    }
    out
}

pub fn render_status<S, C, R>(engine: &ProgressionEngine<S, C, R>) -> String
where
    S: KeyValueStore + Clone,
    C: Clock,
    R: RandomSource,
{
    let p = engine.profile();
    let mut out = format!(
        "{} {} the {} ({})\nlevel {} | XP {}/{} | streak {} | quests {}\nSTR {} INT {} CHA {} | items {} | lore {}",
        p.avatar,
        p.name,
        p.title,
        p.player_class.as_str(),
        p.level,
        p.current_xp,
        p.next_level_xp,
        p.streak,
        p.completed_quests,
        p.attributes.strength,
        p.attributes.intellect,
        p.attributes.charisma,
        p.inventory.len(),
        p.lore_unlocked.len(),
    );
    if !p.daily_narrative.is_empty() {
        out.push_str(&format!("\n\n{}", p.daily_narrative));
    }
    if engine.daily_bonus_available() {
        out.push_str("\n\nA daily bonus is waiting. Type 'bonus'.");
    }
    if let Some(active) = engine.active_quest() {
        out.push_str(&format!("\n\nactive: {}", quest_line(&active.quest)));
        match &active.phase {
            QuestPhase::InProgress => {
                if let Some(ms) = engine.countdown_remaining_ms() {
                    out.push_str(&format!(" | {}s left", (ms.max(0) + 999) / 1000));
                }
            }
            QuestPhase::Verifying => out.push_str(" | verifying..."),
            QuestPhase::Resolved(result) => {
                out.push_str(&format!("\n  {}", verdict_lines(result)))
            }
        }
    }
    out
}

pub fn render_board<S, C, R>(engine: &ProgressionEngine<S, C, R>) -> String
where
    S: KeyValueStore + Clone,
    C: Clock,
    R: RandomSource,
{
    let quests = engine.board().quests();
    if quests.is_empty() {
        return "The quest board is empty.".to_string();
    }
    quests.iter().map(quest_line).collect::<Vec<_>>().join("\n")
}

pub fn render_menu<S, C, R>(engine: &ProgressionEngine<S, C, R>) -> String
where
    S: KeyValueStore + Clone,
    C: Clock,
    R: RandomSource,
{
    let mut out = String::new();
    for (category, quests) in engine.dopamine_menu() {
        out.push_str(category.heading());
        out.push('\n');
        for quest in quests {
            out.push_str("  ");
            out.push_str(&quest_line(quest));
            out.push('\n');
        }
    }
    out.trim_end().to_string()
}

fn render_tick_event(event: &TickEvent) -> Option<String> {
    match event {
        TickEvent::Countdown { remaining_ms, .. } => {
            let secs = (remaining_ms + 999) / 1000;
            // Announce every 15 seconds and the final five.
            if secs % 15 == 0 || secs <= 5 {
                Some(format!("{}s left", secs))
            } else {
                None
            }
        }
        TickEvent::QuestTimedOut { .. } => {
            Some(verdict_lines(&VerificationResult::timed_out()))
        }
        TickEvent::EventSpawned(quest) => Some(format!("WORLD EVENT! {}", quest_line(quest))),
        TickEvent::EventsExpired(ids) => Some(format!("world event ended: {}", ids.join(", "))),
    }
}

/// Run the interactive loop until `quit` or end of input.
pub async fn run<S, C, R>(
    mut engine: ProgressionEngine<S, C, R>,
    tick_every: Duration,
) -> Result<(), GameError>
where
    S: KeyValueStore + Clone,
    C: Clock,
    R: RandomSource,
{
    let (narrative_tx, mut narrative_rx) = mpsc::channel::<NarrativeDraft>(4);
    let (event_tx, mut event_rx) = mpsc::channel::<Quest>(1);
    let (verdict_tx, mut verdict_rx) =
        mpsc::channel::<(VerificationTicket, VerificationResult)>(1);

    let spawn_narrative = |engine: &mut ProgressionEngine<S, C, R>| {
        if let Some(job) = engine.narrative_job() {
            let tx = narrative_tx.clone();
            tokio::spawn(async move {
                let draft = job.run().await;
                let _ = tx.send(draft).await;
            });
        }
    };
    spawn_narrative(&mut engine);

    println!("{}\n\n{}\n", render_status(&engine), render_board(&engine));
    println!("Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut interval = tokio::time::interval(tick_every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let TickOutcome { events, spawn } = engine.poll_tick();
                for event in &events {
                    if let Some(text) = render_tick_event(event) {
                        println!("{}", text);
                    }
                }
                if let Some(job) = spawn {
                    let tx = event_tx.clone();
                    tokio::spawn(async move {
                        let event = job.run().await;
                        let _ = tx.send(event).await;
                    });
                }
            }

            Some(event) = event_rx.recv() => {
                if let Some(text) = engine.offer_world_event(event).as_ref().and_then(render_tick_event) {
                    println!("{}", text);
                }
            }

            Some(draft) = narrative_rx.recv() => {
                match engine.apply_daily_narrative(draft) {
                    Ok(true) => println!("\n{}\n", engine.profile().daily_narrative),
                    Ok(false) => {}
                    Err(e) => warn!("narrative not saved: {}", e),
                }
            }

            Some((ticket, result)) = verdict_rx.recv() => {
                match engine.finish_verification(ticket, result) {
                    Ok(outcome) => {
                        println!("{}", verdict_lines(&outcome.result));
                        if let Some(reward) = &outcome.reward {
                            println!("+{} XP{}", reward.xp_gained, if reward.leveled_up { " - LEVEL UP!" } else { "" });
                        }
                    }
                    Err(e) => warn!("verdict discarded: {}", e),
                }
            }

            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("input closed; ending session");
                    break;
                };
                let cmd = match parse_command(&line) {
                    Ok(Some(cmd)) => cmd,
                    Ok(None) => continue,
                    Err(msg) => {
                        println!("{}", msg);
                        continue;
                    }
                };
                debug!("command: {:?}", cmd);
                if cmd == Command::Quit {
                    break;
                }
                match cmd {
                    Command::Submit { image_path, report } => {
                        let image = match tokio::fs::read(&image_path).await {
                            Ok(bytes) => bytes,
                            Err(e) => {
                                println!("cannot read {}: {}", image_path, e);
                                continue;
                            }
                        };
                        match engine.begin_verification(image, &image_path, &report) {
                            Ok(ticket) => {
                                println!("The Dungeon Master examines your proof...");
                                let content = engine.content().clone();
                                let tx = verdict_tx.clone();
                                tokio::spawn(async move {
                                    let result = ticket.judge(&content).await;
                                    let _ = tx.send((ticket, result)).await;
                                });
                            }
                            Err(e) => println!("{}", e),
                        }
                    }
                    Command::Ability => match engine.use_ability().await {
                        Ok(AbilityOutcome::Rerolled { ready_at }) => {
                            println!("The board shimmers and reforms. Ability ready again at {}.", ready_at.format("%H:%M"));
                            println!("{}", render_board(&engine));
                            spawn_narrative(&mut engine);
                        }
                        Ok(AbilityOutcome::OnCooldown { ready_at }) => {
                            println!("Ability still on cooldown until {}.", ready_at.format("%H:%M"));
                        }
                        Err(e) => println!("{}", e),
                    },
                    other => match handle(&mut engine, other).await {
                        Ok(text) => println!("{}", text),
                        Err(e) => println!("{}", e),
                    },
                }
                for id in engine.take_unlocks() {
                    if let Some(rule) = achievement::find_rule(id) {
                        println!("Achievement unlocked: {} {}", rule.icon, rule.title);
                    }
                }
            }
        }
    }
    Ok(())
}

/// Commands that complete inline and produce a reply.
async fn handle<S, C, R>(
    engine: &mut ProgressionEngine<S, C, R>,
    cmd: Command,
) -> Result<String, GameError>
where
    S: KeyValueStore + Clone,
    C: Clock,
    R: RandomSource,
{
    Ok(match cmd {
        Command::Help => HELP.to_string(),
        Command::Status => render_status(engine),
        Command::Board => render_board(engine),
        Command::Menu => render_menu(engine),
        Command::Accept(id) => {
            let active = engine.accept_quest(&id)?;
            format!("Quest started: {}\n{}", active.quest.title, active.quest.description)
        }
        Command::View => {
            engine.return_to_quest_view();
            render_status(engine)
        }
        Command::Leave => {
            engine.leave_quest_view();
            "You step away from the quest.".to_string()
        }
        Command::Retry => {
            engine.retry_quest()?;
            "Back into the fray.".to_string()
        }
        Command::Abandon => {
            engine.abandon_quest()?;
            "Quest abandoned.".to_string()
        }
        Command::Oracle(request) => {
            let quest = engine.summon_oracle(&request).await?;
            format!("The Oracle speaks: {}", quest_line(&quest))
        }
        Command::Bonus => {
            if engine.claim_daily_bonus()? {
                format!("+{} XP daily bonus!", engine.settings().daily_bonus_xp)
            } else {
                "No bonus to claim today.".to_string()
            }
        }
        Command::Lore(category) => {
            let entry = engine.research_lore(category).await?;
            format!(
                "{} {}\n{}",
                entry.icon.as_deref().unwrap_or("📜"),
                entry.title,
                entry.content
            )
        }
        Command::Library => {
            let p = engine.profile();
            let mut out = String::new();
            for category in [LoreCategory::Bestiary, LoreCategory::History, LoreCategory::Library] {
                out.push_str(&format!("{}:\n", category.as_str()));
                for entry in p.lore_in(category) {
                    out.push_str(&format!("  {} {}\n", entry.icon.as_deref().unwrap_or("📜"), entry.title));
                }
            }
            out.trim_end().to_string()
        }
        Command::Achievements => achievement::catalog_with_status(engine.profile())
            .into_iter()
            .map(|(rule, unlocked)| {
                format!(
                    "{} {} - {}{}",
                    rule.icon,
                    rule.title,
                    rule.description,
                    if unlocked { " [unlocked]" } else { "" }
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Command::Feed => {
            if engine.feed().is_empty() {
                "The feed is quiet.".to_string()
            } else {
                engine
                    .feed()
                    .iter()
                    .map(|post| {
                        format!(
                            "{} {} ({}) completed \"{}\" - {} likes, {}",
                            post.author_avatar,
                            post.author_name,
                            post.author_title,
                            post.quest_title,
                            post.likes,
                            post.timestamp
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        Command::Leaderboard => engine
            .leaderboard()
            .iter()
            .enumerate()
            .map(|(i, e)| {
                format!(
                    "{}. {} {} - level {}, {} XP{}",
                    i + 1,
                    e.avatar,
                    e.name,
                    e.level,
                    e.xp,
                    if e.is_user { " (you)" } else { "" }
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Command::Chat(message) => {
            let reply = engine.chat_with_npc(&message).await?;
            format!("{}: {}", engine.settings().npc_name, reply)
        }
        Command::Onboard {
            class,
            mode,
            preference,
        } => {
            engine.complete_onboarding(class, mode, &preference)?;
            format!("You are now a {}. Your tale is told as {}.", class.as_str(), mode.as_str())
        }
        Command::Edit(field, value) => {
            let edit = match field {
                EditField::Name => ProfileEdit {
                    name: Some(value),
                    ..Default::default()
                },
                EditField::Avatar => ProfileEdit {
                    avatar: Some(value),
                    ..Default::default()
                },
                EditField::Color => ProfileEdit {
                    avatar_color: Some(value),
                    ..Default::default()
                },
            };
            engine.save_profile(edit)?;
            "Profile saved.".to_string()
        }
        Command::Submit { .. } | Command::Ability | Command::Quit => String::new(),
    })
}
