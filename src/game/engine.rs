//! The progression engine: owns the active profile and every piece of session
//! state derived from it, and is the only place that mutates them.
//!
//! All operations take `&mut self`, so a tick or a user action always sees one
//! consistent snapshot. Each profile mutation ends in [`ProgressionEngine::commit`],
//! which settles achievements, writes the profile once, mirrors it to the
//! account store and refreshes the leaderboard row.

use chrono::{DateTime, Duration, TimeZone, Utc};
use log::{debug, info, warn};

use crate::game::achievement;
use crate::game::auth::AuthService;
use crate::game::clock::{Clock, RandomSource, SystemClock, ThreadRandom};
use crate::game::errors::GameError;
use crate::game::generator::Content;
use crate::game::progression::{self, RewardSummary};
use crate::game::quest::{ActiveQuest, QuestBoard, QuestPhase};
use crate::game::scheduler::{Scheduler, SchedulerConfig, TaskKind};
use crate::game::social;
use crate::game::storage::{self, KeyValueStore};
use crate::game::types::{
    DopamineCategory, LeaderboardEntry, LoreCategory, LoreEntry, NarrativeMode, NpcMessage,
    NpcSender, PlayerClass, Quest, SocialPost, UserProfile, VerificationResult,
};
use crate::logutil::{byte_size, escape_log};
use crate::validation::{sanitize_free_text, validate_display_name};

pub const DEFAULT_PROFILE_ID: &str = "user-1";
pub const DEFAULT_PROFILE_NAME: &str = "Player One";
pub const NPC_GREETING: &str =
    "Greetings, Traveler! Pull up a chair. What tales do you bring from the outside world?";

/// Tunables for the engine, normally filled from the `[game]` config section.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub scheduler: SchedulerConfig,
    /// Probability that a spawn attempt produces a world event.
    pub spawn_chance: f64,
    pub world_event_minutes: u32,
    pub ability_cooldown: Duration,
    pub daily_bonus_xp: u32,
    pub npc_name: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            spawn_chance: 0.5,
            world_event_minutes: 15,
            ability_cooldown: Duration::hours(1),
            daily_bonus_xp: 50,
            npc_name: "Garrick".to_string(),
        }
    }
}

/// Something a scheduler tick changed, for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum TickEvent {
    /// Seconds left on the active timed quest.
    Countdown { quest_id: String, remaining_ms: i64 },
    /// The active timed quest ran out; its result is now a failure.
    QuestTimedOut { quest_id: String },
    EventSpawned(Quest),
    EventsExpired(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbilityOutcome {
    /// Board replaced; the ability is usable again at `ready_at`.
    Rerolled { ready_at: DateTime<Utc> },
    /// Still cooling down; nothing changed.
    OnCooldown { ready_at: DateTime<Utc> },
}

/// Profile customization. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileEdit {
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub avatar_color: Option<String>,
}

/// A proof submission that has passed the in-flight guard and awaits judgement.
#[derive(Debug, Clone)]
pub struct VerificationTicket {
    quest: Quest,
    image: Vec<u8>,
    proof_ref: String,
    report: String,
}

impl VerificationTicket {
    pub fn quest(&self) -> &Quest {
        &self.quest
    }

    /// Ask the verifier. Never fails; generator errors become a failure verdict.
    pub async fn judge(&self, content: &Content) -> VerificationResult {
        content
            .verify_submission(&self.quest, &self.image, &self.report)
            .await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerificationOutcome {
    pub result: VerificationResult,
    pub reward: Option<RewardSummary>,
    pub unlocked: Vec<&'static str>,
}

/// Background narrative request. Owns snapshots so it can run on another task.
/// Stamped with the board generation it was written for.
#[derive(Clone)]
pub struct NarrativeJob {
    content: Content,
    profile: UserProfile,
    quests: Vec<Quest>,
    generation: u64,
}

impl NarrativeJob {
    pub async fn run(self) -> NarrativeDraft {
        let text = self.content.daily_narrative(&self.profile, &self.quests).await;
        NarrativeDraft {
            generation: self.generation,
            text,
        }
    }
}

/// A finished narrative waiting to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeDraft {
    generation: u64,
    text: String,
}

impl NarrativeDraft {
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Background world-event request produced by a spawn tick.
#[derive(Clone)]
pub struct WorldEventJob {
    content: Content,
    now: DateTime<Utc>,
    lifetime_minutes: u32,
}

impl WorldEventJob {
    pub async fn run(self) -> Quest {
        self.content.world_event(self.now, self.lifetime_minutes).await
    }
}

/// What a non-blocking tick produced: events to show now, and possibly a
/// world event to generate off the engine and hand back through
/// [`ProgressionEngine::offer_world_event`].
pub struct TickOutcome {
    pub events: Vec<TickEvent>,
    pub spawn: Option<WorldEventJob>,
}

pub struct ProgressionEngine<S, C = SystemClock, R = ThreadRandom>
where
    S: KeyValueStore + Clone,
    C: Clock,
    R: RandomSource,
{
    store: S,
    accounts: AuthService<S>,
    content: Content,
    clock: C,
    random: R,
    settings: EngineSettings,
    profile: UserProfile,
    board: QuestBoard,
    active: Option<ActiveQuest>,
    feed: Vec<SocialPost>,
    leaderboard: Vec<LeaderboardEntry>,
    tavern: Vec<NpcMessage>,
    scheduler: Scheduler,
    daily_bonus_available: bool,
    quest_view_visible: bool,
    narrative_refresh_due: bool,
    narrative_generation: u64,
    event_spawn_in_flight: bool,
    recent_unlocks: Vec<&'static str>,
}

impl<S, C, R> ProgressionEngine<S, C, R>
where
    S: KeyValueStore + Clone,
    C: Clock,
    R: RandomSource,
{
    /// Load (or create) the profile, roll the day over if needed, and fetch
    /// the day's board, feed and leaderboard concurrently.
    pub async fn bootstrap(
        store: S,
        content: Content,
        clock: C,
        random: R,
        settings: EngineSettings,
    ) -> Result<Self, GameError> {
        let now = clock.now();
        let mut daily_bonus_available = false;

        let profile = match storage::load_profile(&store)? {
            Some(mut profile) => {
                let last_day = clock.day_of(profile.last_login);
                if progression::apply_daily_rollover(&mut profile, last_day, clock.today(), now) {
                    storage::save_profile(&store, &profile)?;
                    daily_bonus_available = true;
                    info!(
                        "new day for {}: streak {}, daily bonus available",
                        escape_log(&profile.name),
                        profile.streak
                    );
                }
                profile
            }
            None => {
                let profile = UserProfile::new(DEFAULT_PROFILE_ID, DEFAULT_PROFILE_NAME, now);
                storage::save_profile(&store, &profile)?;
                info!("created new profile {}", profile.id);
                profile
            }
        };

        let (quests, feed, rivals) = tokio::join!(
            content.daily_quests(&profile),
            content.social_feed(),
            content.leaderboard(profile.level)
        );
        let leaderboard = social::merge_leaderboard(rivals, &profile);

        let mut scheduler = Scheduler::new();
        for kind in [TaskKind::WorldEventSpawn, TaskKind::ExpiredEventSweep] {
            scheduler.start(kind, settings.scheduler.period_of(kind), now);
        }

        let mut engine = Self {
            accounts: AuthService::new(store.clone()),
            store,
            content,
            clock,
            random,
            settings,
            profile,
            board: QuestBoard::new(quests),
            active: None,
            feed,
            leaderboard,
            tavern: vec![NpcMessage::new("init", NpcSender::Npc, NPC_GREETING)],
            scheduler,
            daily_bonus_available,
            quest_view_visible: false,
            narrative_refresh_due: false,
            narrative_generation: 0,
            event_spawn_in_flight: false,
            recent_unlocks: Vec::new(),
        };
        // Achievements are settled once loading is done, never mid-load.
        engine.commit()?;
        Ok(engine)
    }

    /// Settle achievements, persist, mirror to the account store and resync the leaderboard.
    fn commit(&mut self) -> Result<Vec<&'static str>, GameError> {
        let unlocked = achievement::unlock_new(&mut self.profile);
        for id in &unlocked {
            info!("achievement unlocked: {}", id);
        }
        storage::save_profile(&self.store, &self.profile)?;
        self.accounts.update_user(&self.profile)?;
        social::sync_leaderboard(&mut self.leaderboard, &self.profile);
        self.recent_unlocks.extend(unlocked.iter().copied());
        Ok(unlocked)
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn board(&self) -> &QuestBoard {
        &self.board
    }

    pub fn active_quest(&self) -> Option<&ActiveQuest> {
        self.active.as_ref()
    }

    pub fn feed(&self) -> &[SocialPost] {
        &self.feed
    }

    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        &self.leaderboard
    }

    pub fn tavern_log(&self) -> &[NpcMessage] {
        &self.tavern
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn daily_bonus_available(&self) -> bool {
        self.daily_bonus_available
    }

    pub fn quest_view_visible(&self) -> bool {
        self.quest_view_visible
    }

    /// Achievements unlocked since the last call.
    pub fn take_unlocks(&mut self) -> Vec<&'static str> {
        std::mem::take(&mut self.recent_unlocks)
    }

    pub fn dopamine_menu(&self) -> Vec<(DopamineCategory, Vec<&Quest>)> {
        self.board.dopamine_menu()
    }

    /// Milliseconds left on the active timed quest, if one is running.
    pub fn countdown_remaining_ms(&self) -> Option<i64> {
        let active = self.active.as_ref()?;
        if !active.has_running_timer() {
            return None;
        }
        active.remaining_ms(self.clock.now_ms())
    }

    fn arm_countdown_if_needed(&mut self, now: DateTime<Utc>) {
        let running = self
            .active
            .as_ref()
            .map(|a| a.has_running_timer())
            .unwrap_or(false);
        if running && self.quest_view_visible {
            let period = self.settings.scheduler.countdown_interval;
            self.scheduler.start(TaskKind::QuestCountdown, period, now);
        }
    }

    /// Make a board quest the active one. Replaces any previous active quest
    /// unless its proof is still being judged.
    pub fn accept_quest(&mut self, quest_id: &str) -> Result<&ActiveQuest, GameError> {
        if matches!(
            self.active.as_ref().map(|a| &a.phase),
            Some(QuestPhase::Verifying)
        ) {
            return Err(GameError::SubmissionInFlight);
        }
        let quest = self
            .board
            .get(quest_id)
            .ok_or_else(|| GameError::UnknownQuest(quest_id.to_string()))?;
        if quest.completed {
            return Err(GameError::QuestResolved);
        }

        let now = self.clock.now();
        let started = ActiveQuest::start(quest, now.timestamp_millis());
        info!("accepted quest {} ({})", started.id(), escape_log(&started.quest.title));

        self.scheduler.cancel(TaskKind::QuestCountdown);
        self.active = Some(started);
        self.quest_view_visible = true;
        self.arm_countdown_if_needed(now);
        self.active.as_ref().ok_or(GameError::NoActiveQuest)
    }

    /// The quest view was navigated away from; the countdown stops ticking.
    pub fn leave_quest_view(&mut self) {
        self.quest_view_visible = false;
        self.scheduler.cancel(TaskKind::QuestCountdown);
    }

    pub fn return_to_quest_view(&mut self) {
        self.quest_view_visible = true;
        let now = self.clock.now();
        self.arm_countdown_if_needed(now);
    }

    /// Drop the active quest. Not allowed while its proof is being judged.
    pub fn abandon_quest(&mut self) -> Result<(), GameError> {
        match self.active.as_ref().map(|a| &a.phase) {
            None => Err(GameError::NoActiveQuest),
            Some(QuestPhase::Verifying) => Err(GameError::SubmissionInFlight),
            Some(_) => {
                self.scheduler.cancel(TaskKind::QuestCountdown);
                if let Some(active) = self.active.take() {
                    info!("abandoned quest {}", active.id());
                }
                self.quest_view_visible = false;
                Ok(())
            }
        }
    }

    /// Go back to the quest after a failed verdict. A timed quest keeps the
    /// deadline it was given on acceptance.
    pub fn retry_quest(&mut self) -> Result<(), GameError> {
        let active = self.active.as_mut().ok_or(GameError::NoActiveQuest)?;
        let succeeded = match &active.phase {
            QuestPhase::Verifying => return Err(GameError::SubmissionInFlight),
            QuestPhase::InProgress => return Ok(()),
            QuestPhase::Resolved(result) => result.success,
        };
        if succeeded {
            return Err(GameError::QuestResolved);
        }
        active.phase = QuestPhase::InProgress;
        self.quest_view_visible = true;
        let now = self.clock.now();
        self.arm_countdown_if_needed(now);
        Ok(())
    }

    /// Run every scheduler task that is due and wait for any world event it
    /// spawns. One clock read per tick.
    pub async fn tick(&mut self) -> Result<Vec<TickEvent>, GameError> {
        let TickOutcome { mut events, spawn } = self.poll_tick();
        if let Some(job) = spawn {
            let event = job.run().await;
            events.extend(self.offer_world_event(event));
        }
        Ok(events)
    }

    /// Run every due task without calling the generator. A spawn that wins
    /// the coin flip comes back as a job for the caller to run.
    pub fn poll_tick(&mut self) -> TickOutcome {
        let now = self.clock.now();
        let now_ms = now.timestamp_millis();
        let mut events = Vec::new();
        let mut spawn = None;

        for task in self.scheduler.due(now) {
            match task {
                TaskKind::QuestCountdown => self.run_countdown(now_ms, &mut events),
                TaskKind::ExpiredEventSweep => {
                    let removed = self.board.sweep_expired(now_ms);
                    if !removed.is_empty() {
                        let ids: Vec<String> = removed.into_iter().map(|q| q.id).collect();
                        info!("world events expired: {}", ids.join(", "));
                        events.push(TickEvent::EventsExpired(ids));
                    }
                }
                TaskKind::WorldEventSpawn => spawn = self.world_event_job(now),
            }
        }
        TickOutcome { events, spawn }
    }

    fn run_countdown(&mut self, now_ms: i64, events: &mut Vec<TickEvent>) {
        let Some(active) = self.active.as_mut() else {
            self.scheduler.cancel(TaskKind::QuestCountdown);
            return;
        };
        if !active.has_running_timer() || !self.quest_view_visible {
            self.scheduler.cancel(TaskKind::QuestCountdown);
            return;
        }
        let remaining = active.remaining_ms(now_ms).unwrap_or(0);
        if remaining <= 0 {
            active.phase = QuestPhase::Resolved(VerificationResult::timed_out());
            let quest_id = active.quest.id.clone();
            self.scheduler.cancel(TaskKind::QuestCountdown);
            info!("timed quest {} ran out", quest_id);
            events.push(TickEvent::QuestTimedOut { quest_id });
        } else {
            events.push(TickEvent::Countdown {
                quest_id: active.quest.id.clone(),
                remaining_ms: remaining,
            });
        }
    }

    fn world_event_job(&mut self, now: DateTime<Utc>) -> Option<WorldEventJob> {
        if self.event_spawn_in_flight {
            debug!("spawn skipped: a world event is already being generated");
            return None;
        }
        if self.board.live_world_event().is_some() {
            debug!("spawn skipped: a world event is already live");
            return None;
        }
        if !self.random.chance(self.settings.spawn_chance) {
            return None;
        }
        self.event_spawn_in_flight = true;
        Some(WorldEventJob {
            content: self.content.clone(),
            now,
            lifetime_minutes: self.settings.world_event_minutes,
        })
    }

    /// Put a generated world event on the board. Dropped when another event
    /// went live meanwhile or this one expired before it arrived.
    pub fn offer_world_event(&mut self, event: Quest) -> Option<TickEvent> {
        self.event_spawn_in_flight = false;
        if event.is_expired_event(self.clock.now_ms()) {
            debug!("world event {} arrived expired; dropped", event.id);
            return None;
        }
        if self.board.try_add_world_event(event.clone()) {
            info!("world event spawned: {}", escape_log(&event.title));
            Some(TickEvent::EventSpawned(event))
        } else {
            debug!("world event {} dropped: another event is live", event.id);
            None
        }
    }

    /// Pass the in-flight guard for the active quest and stop its countdown.
    ///
    /// The deadline of a timed quest is checked against the clock here, not
    /// only by the countdown task: an overdue submission resolves the quest
    /// as timed out and never reaches the verifier.
    pub fn begin_verification(
        &mut self,
        image: Vec<u8>,
        proof_ref: &str,
        report: &str,
    ) -> Result<VerificationTicket, GameError> {
        let now_ms = self.clock.now_ms();
        let active = self.active.as_mut().ok_or(GameError::NoActiveQuest)?;
        match active.phase {
            QuestPhase::Verifying => return Err(GameError::SubmissionInFlight),
            QuestPhase::Resolved(_) => return Err(GameError::QuestResolved),
            QuestPhase::InProgress => {}
        }
        if active.remaining_ms(now_ms).map_or(false, |ms| ms <= 0) {
            active.phase = QuestPhase::Resolved(VerificationResult::timed_out());
            self.scheduler.cancel(TaskKind::QuestCountdown);
            info!("late proof for {} rejected: timed out", active.quest.id);
            return Err(GameError::TimeRanOut);
        }
        active.phase = QuestPhase::Verifying;
        let quest = active.quest.clone();
        self.scheduler.cancel(TaskKind::QuestCountdown);
        debug!("verifying proof for {} ({})", quest.id, byte_size(image.len()));
        Ok(VerificationTicket {
            quest,
            image,
            proof_ref: proof_ref.to_string(),
            report: sanitize_free_text(report).unwrap_or_default(),
        })
    }

    /// Apply a verdict for a ticket issued by [`Self::begin_verification`].
    pub fn finish_verification(
        &mut self,
        ticket: VerificationTicket,
        result: VerificationResult,
    ) -> Result<VerificationOutcome, GameError> {
        let active = self.active.as_mut().ok_or(GameError::NoActiveQuest)?;
        if active.quest.id != ticket.quest.id || active.phase != QuestPhase::Verifying {
            warn!("dropping verdict for {}: no matching submission", ticket.quest.id);
            return Err(GameError::NoActiveQuest);
        }
        active.phase = QuestPhase::Resolved(result.clone());

        if !result.success {
            info!(
                "proof for {} rejected: {}",
                ticket.quest.id,
                escape_log(&result.ai_comment)
            );
            return Ok(VerificationOutcome {
                result,
                reward: None,
                unlocked: Vec::new(),
            });
        }

        let now = self.clock.now();
        let reward = progression::apply_quest_reward(
            &mut self.profile,
            ticket.quest.quest_type,
            result.xp_awarded,
            result.loot.as_ref(),
            &ticket.proof_ref,
            now,
        );
        self.board.mark_completed(&ticket.quest.id);
        self.feed.insert(
            0,
            social::completion_post(&self.profile, &ticket.quest.title, &ticket.proof_ref, now),
        );
        info!(
            "quest {} completed: +{} XP (level {})",
            ticket.quest.id, result.xp_awarded, self.profile.level
        );
        let unlocked = self.commit()?;
        Ok(VerificationOutcome {
            result,
            reward: Some(reward),
            unlocked,
        })
    }

    /// Submit proof for the active quest and wait for the verdict.
    pub async fn verify(
        &mut self,
        image: Vec<u8>,
        proof_ref: &str,
        report: &str,
    ) -> Result<VerificationOutcome, GameError> {
        let ticket = self.begin_verification(image, proof_ref, report)?;
        let result = ticket.judge(&self.content).await;
        self.finish_verification(ticket, result)
    }

    /// Ask the Oracle for a quest matching `context`. On failure nothing changes.
    pub async fn summon_oracle(&mut self, context: &str) -> Result<Quest, GameError> {
        let context = sanitize_free_text(context)
            .ok_or_else(|| GameError::InvalidInput("the Oracle needs a question".to_string()))?;
        let quest = self.content.oracle_quest(&context).await?;
        info!("oracle granted {}", escape_log(&quest.title));
        self.board.prepend(quest.clone());
        Ok(quest)
    }

    /// Claim the once-per-day XP bonus. Returns false when there is nothing to claim.
    pub fn claim_daily_bonus(&mut self) -> Result<bool, GameError> {
        if !self.daily_bonus_available {
            return Ok(false);
        }
        progression::apply_daily_bonus(&mut self.profile, self.settings.daily_bonus_xp);
        self.daily_bonus_available = false;
        self.commit()?;
        info!("daily bonus claimed: +{} XP", self.settings.daily_bonus_xp);
        Ok(true)
    }

    /// Class ability: reroll the board, then cool down.
    pub async fn use_ability(&mut self) -> Result<AbilityOutcome, GameError> {
        let now = self.clock.now();
        if let Some(cooldown_ms) = self.profile.ability_cooldown {
            if now.timestamp_millis() <= cooldown_ms {
                let ready_at = Utc
                    .timestamp_millis_opt(cooldown_ms)
                    .single()
                    .unwrap_or(now);
                return Ok(AbilityOutcome::OnCooldown { ready_at });
            }
        }

        let quests = self.content.daily_quests(&self.profile).await;
        self.board.replace(quests);
        let ready_at = now + self.settings.ability_cooldown;
        self.profile.ability_cooldown = Some(ready_at.timestamp_millis());
        self.narrative_refresh_due = true;
        self.narrative_generation += 1;
        self.commit()?;
        info!("quests rerolled; ability ready at {}", ready_at);
        Ok(AbilityOutcome::Rerolled { ready_at })
    }

    /// A narrative request, when today's narrative is missing or the board was
    /// rerolled since it was written.
    pub fn narrative_job(&mut self) -> Option<NarrativeJob> {
        if !self.profile.daily_narrative.is_empty() && !self.narrative_refresh_due {
            return None;
        }
        self.narrative_refresh_due = false;
        Some(NarrativeJob {
            content: self.content.clone(),
            profile: self.profile.clone(),
            quests: self.board.quests().to_vec(),
            generation: self.narrative_generation,
        })
    }

    /// Store a finished narrative. Returns false, changing nothing, when the
    /// board was rerolled after its job was issued.
    pub fn apply_daily_narrative(&mut self, draft: NarrativeDraft) -> Result<bool, GameError> {
        if draft.generation != self.narrative_generation {
            debug!(
                "dropping stale narrative (generation {}, current {})",
                draft.generation, self.narrative_generation
            );
            return Ok(false);
        }
        self.profile.daily_narrative = draft.text;
        self.commit()?;
        Ok(true)
    }

    /// Fetch and apply the narrative inline, for callers that do not spawn jobs.
    pub async fn ensure_daily_narrative(&mut self) -> Result<(), GameError> {
        if let Some(job) = self.narrative_job() {
            let draft = job.run().await;
            self.apply_daily_narrative(draft)?;
        }
        Ok(())
    }

    /// Research a lore entry; the newest entry goes first.
    pub async fn research_lore(&mut self, category: LoreCategory) -> Result<LoreEntry, GameError> {
        let now = self.clock.now();
        let entry = self.content.lore_entry(category, now).await;
        self.profile.lore_unlocked.insert(0, entry.clone());
        self.commit()?;
        Ok(entry)
    }

    pub fn save_profile(&mut self, edit: ProfileEdit) -> Result<(), GameError> {
        let name = match edit.name.as_deref() {
            Some(name) => Some(
                validate_display_name(name).map_err(|e| GameError::InvalidInput(e.to_string()))?,
            ),
            None => None,
        };
        let avatar = non_blank(edit.avatar, "avatar")?;
        let avatar_color = non_blank(edit.avatar_color, "avatar color")?;

        if let Some(name) = name {
            self.profile.name = name;
        }
        if let Some(avatar) = avatar {
            self.profile.avatar = avatar;
        }
        if let Some(color) = avatar_color {
            self.profile.avatar_color = color;
        }
        self.commit()?;
        Ok(())
    }

    /// One-time class and preference setup.
    pub fn complete_onboarding(
        &mut self,
        class: PlayerClass,
        mode: NarrativeMode,
        dopamine_preference: &str,
    ) -> Result<(), GameError> {
        if self.profile.has_onboarded {
            return Err(GameError::InvalidInput("onboarding already completed".to_string()));
        }
        self.profile.player_class = class;
        self.profile.attributes = progression::class_attributes(class);
        self.profile.narrative_mode = mode;
        if let Some(pref) = sanitize_free_text(dopamine_preference) {
            self.profile.dopamine_preference = pref;
        }
        self.profile.has_onboarded = true;
        self.commit()?;
        info!("onboarded as {} ({})", class.as_str(), mode.as_str());
        Ok(())
    }

    /// Talk to the tavern keeper. Returns the reply, which is also logged in the conversation.
    pub async fn chat_with_npc(&mut self, message: &str) -> Result<String, GameError> {
        let message = sanitize_free_text(message)
            .ok_or_else(|| GameError::InvalidInput("say something first".to_string()))?;
        let now_ms = self.clock.now_ms();
        let history = self.tavern.clone();
        self.tavern
            .push(NpcMessage::new(&now_ms.to_string(), NpcSender::User, &message));

        let reply = self
            .content
            .chat_with_npc(&self.settings.npc_name, &message, &history)
            .await;
        self.tavern.push(NpcMessage::new(
            &(now_ms + 1).to_string(),
            NpcSender::Npc,
            &reply,
        ));
        Ok(reply)
    }
}

fn non_blank(value: Option<String>, field: &str) -> Result<Option<String>, GameError> {
    match value {
        Some(v) if v.trim().is_empty() => {
            Err(GameError::InvalidInput(format!("{} cannot be blank", field)))
        }
        Some(v) => Ok(Some(v.trim().to_string())),
        None => Ok(None),
    }
}
