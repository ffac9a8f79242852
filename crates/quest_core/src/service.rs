//! crates/quest_core/src/service.rs
//!
//! `ProgressionService` owns a user's progression records. It reads them
//! through the ports, plans the change with `progression` and commits the
//! whole change in one guarded write.

use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::Clock;
use crate::domain::{
    ExperienceTotal, NewQuest, Quest, QuestStatus, SkillCategory, SkillProgress, StreakState,
    DEFAULT_XP_REWARD,
};
use crate::ports::{
    CommitOutcome, GuardedWrite, PortError, PortResult, ProgressionCommit, ProgressionStore,
    QuestRepository, QuestTransition,
};
use crate::progression::{
    plan_completion, plan_reversal, streak_multiplier, streak_status, LevelProgress,
    ProgressionEvent, ProgressionRules, StreakStatus, StreakTier,
};

/// The records of a user after a completion, a reversal or a no-op.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionOutcome {
    pub quest: Quest,
    pub experience: ExperienceTotal,
    pub streak: StreakState,
    pub skill: SkillProgress,
    /// Signed change applied to the total XP.
    pub xp_delta: i64,
    /// `false` when the quest was already in the requested state.
    pub changed: bool,
    pub events: Vec<ProgressionEvent>,
}

/// Read-only summary of a user's progression.
#[derive(Debug, Clone, PartialEq)]
pub struct UserStats {
    pub experience: ExperienceTotal,
    pub level_progress: LevelProgress,
    pub streak: StreakState,
    pub streak_status: StreakStatus,
    pub multiplier: f64,
    pub tier: &'static StreakTier,
    pub next_tier: Option<&'static StreakTier>,
    /// One entry per category, in `SkillCategory::ALL` order.
    pub skills: Vec<SkillProgress>,
}

pub struct ProgressionService {
    store: Arc<dyn ProgressionStore>,
    quests: Arc<dyn QuestRepository>,
    clock: Arc<dyn Clock>,
    rules: ProgressionRules,
}

impl ProgressionService {
    pub fn new(
        store: Arc<dyn ProgressionStore>,
        quests: Arc<dyn QuestRepository>,
        clock: Arc<dyn Clock>,
        rules: ProgressionRules,
    ) -> Self {
        Self {
            store,
            quests,
            clock,
            rules,
        }
    }

    pub fn rules(&self) -> ProgressionRules {
        self.rules
    }

    // --- Quest Management ---

    pub async fn create_quest(
        &self,
        user_id: Uuid,
        title: &str,
        category: SkillCategory,
        xp_reward: Option<u32>,
    ) -> PortResult<Quest> {
        let title = title.trim();
        if title.is_empty() {
            return Err(PortError::InvalidInput("quest title must not be empty".to_string()));
        }
        let xp_reward = xp_reward.unwrap_or(DEFAULT_XP_REWARD);
        if xp_reward == 0 {
            return Err(PortError::InvalidInput("xp reward must be positive".to_string()));
        }

        let quest = self
            .quests
            .create_quest(NewQuest {
                user_id,
                title: title.to_string(),
                category,
                xp_reward,
            })
            .await?;
        debug!(quest_id = %quest.id, %user_id, category = %category, "quest created");
        Ok(quest)
    }

    pub async fn list_quests(&self, user_id: Uuid) -> PortResult<Vec<Quest>> {
        self.quests.list_quests(user_id).await
    }

    // --- Progression ---

    /// Completes a pending quest. Completing a completed quest changes nothing.
    pub async fn complete_quest(&self, user_id: Uuid, quest_id: Uuid) -> PortResult<ProgressionOutcome> {
        let quest = self.quests.get_quest(user_id, quest_id).await?;
        let (experience, streak, skill) = self.read_records(user_id, quest.category).await?;

        let Some(plan) = plan_completion(
            &quest,
            experience.as_ref().unwrap_or(&ExperienceTotal::zero(user_id)),
            streak.as_ref().unwrap_or(&StreakState::zero(user_id)),
            skill.as_ref().unwrap_or(&SkillProgress::zero(user_id, quest.category)),
            self.clock.now(),
            self.clock.today(),
            self.rules,
        ) else {
            debug!(%quest_id, "quest already completed, nothing to do");
            return Ok(unchanged(quest, experience, streak, skill, user_id));
        };

        let outcome = self
            .store
            .commit(ProgressionCommit {
                user_id,
                quest: QuestTransition {
                    quest_id,
                    from: QuestStatus::Pending,
                    to: QuestStatus::Completed,
                    completed_at: plan.quest.completed_at,
                    awarded_xp: plan.quest.awarded_xp,
                },
                experience: GuardedWrite {
                    expected: experience,
                    value: plan.experience,
                },
                streak: Some(GuardedWrite {
                    expected: streak,
                    value: plan.streak,
                }),
                skill: GuardedWrite {
                    expected: skill,
                    value: plan.skill,
                },
            })
            .await?;
        let updated = match outcome {
            CommitOutcome::Applied(quest) => quest,
            CommitOutcome::Superseded(current) => return self.superseded(user_id, current).await,
        };

        info!(
            %quest_id,
            %user_id,
            awarded_xp = plan.awarded_xp,
            total_xp = plan.experience.total_xp,
            level = plan.experience.level,
            streak = plan.streak.current_streak,
            "quest completed"
        );
        log_events(user_id, &plan.events);

        Ok(ProgressionOutcome {
            quest: updated,
            experience: plan.experience,
            streak: plan.streak,
            skill: plan.skill,
            xp_delta: i64::from(plan.awarded_xp),
            changed: true,
            events: plan.events,
        })
    }

    /// Returns a completed quest to pending and takes back its XP. The streak is kept.
    pub async fn uncomplete_quest(&self, user_id: Uuid, quest_id: Uuid) -> PortResult<ProgressionOutcome> {
        let quest = self.quests.get_quest(user_id, quest_id).await?;
        let (experience, streak, skill) = self.read_records(user_id, quest.category).await?;

        let Some(plan) = plan_reversal(
            &quest,
            experience.as_ref().unwrap_or(&ExperienceTotal::zero(user_id)),
            skill.as_ref().unwrap_or(&SkillProgress::zero(user_id, quest.category)),
        ) else {
            debug!(%quest_id, "quest already pending, nothing to do");
            return Ok(unchanged(quest, experience, streak, skill, user_id));
        };

        let outcome = self
            .store
            .commit(ProgressionCommit {
                user_id,
                quest: QuestTransition {
                    quest_id,
                    from: QuestStatus::Completed,
                    to: QuestStatus::Pending,
                    completed_at: None,
                    awarded_xp: None,
                },
                experience: GuardedWrite {
                    expected: experience,
                    value: plan.experience,
                },
                streak: None,
                skill: GuardedWrite {
                    expected: skill,
                    value: plan.skill,
                },
            })
            .await?;
        let updated = match outcome {
            CommitOutcome::Applied(quest) => quest,
            CommitOutcome::Superseded(current) => return self.superseded(user_id, current).await,
        };

        info!(
            %quest_id,
            %user_id,
            revoked_xp = plan.revoked_xp,
            total_xp = plan.experience.total_xp,
            level = plan.experience.level,
            "quest uncompleted"
        );
        log_events(user_id, &plan.events);

        Ok(ProgressionOutcome {
            quest: updated,
            experience: plan.experience,
            streak: streak.unwrap_or_else(|| StreakState::zero(user_id)),
            skill: plan.skill,
            xp_delta: -i64::from(plan.revoked_xp),
            changed: true,
            events: plan.events,
        })
    }

    /// Completes a pending quest or un-completes a completed one.
    pub async fn toggle_quest(&self, user_id: Uuid, quest_id: Uuid) -> PortResult<ProgressionOutcome> {
        let quest = self.quests.get_quest(user_id, quest_id).await?;
        match quest.status {
            QuestStatus::Pending => self.complete_quest(user_id, quest_id).await,
            QuestStatus::Completed => self.uncomplete_quest(user_id, quest_id).await,
        }
    }

    // --- Stats ---

    pub async fn stats(&self, user_id: Uuid) -> PortResult<UserStats> {
        let experience = self
            .store
            .read_experience(user_id)
            .await?
            .unwrap_or_else(|| ExperienceTotal::zero(user_id));
        let streak = self
            .store
            .read_streak(user_id)
            .await?
            .unwrap_or_else(|| StreakState::zero(user_id));
        let stored = self.store.read_skills(user_id).await?;

        let skills = SkillCategory::ALL
            .into_iter()
            .map(|category| {
                stored
                    .iter()
                    .find(|s| s.skill == category)
                    .copied()
                    .unwrap_or_else(|| SkillProgress::zero(user_id, category))
            })
            .collect();

        Ok(UserStats {
            experience,
            level_progress: LevelProgress::new(experience.total_xp),
            streak_status: streak_status(&streak, self.clock.today()),
            multiplier: streak_multiplier(streak.current_streak),
            tier: StreakTier::for_streak(streak.current_streak),
            next_tier: StreakTier::next_after(streak.current_streak),
            streak,
            skills,
        })
    }

    /// Another request already moved the quest to the state this one wanted.
    async fn superseded(&self, user_id: Uuid, quest: Quest) -> PortResult<ProgressionOutcome> {
        debug!(
            quest_id = %quest.id,
            status = quest.status.as_str(),
            "quest changed concurrently, nothing to do"
        );
        let (experience, streak, skill) = self.read_records(user_id, quest.category).await?;
        Ok(unchanged(quest, experience, streak, skill, user_id))
    }

    async fn read_records(
        &self,
        user_id: Uuid,
        category: SkillCategory,
    ) -> PortResult<(Option<ExperienceTotal>, Option<StreakState>, Option<SkillProgress>)> {
        let experience = self.store.read_experience(user_id).await?;
        let streak = self.store.read_streak(user_id).await?;
        let skill = self.store.read_skill(user_id, category).await?;
        Ok((experience, streak, skill))
    }
}

fn unchanged(
    quest: Quest,
    experience: Option<ExperienceTotal>,
    streak: Option<StreakState>,
    skill: Option<SkillProgress>,
    user_id: Uuid,
) -> ProgressionOutcome {
    let category = quest.category;
    ProgressionOutcome {
        quest,
        experience: experience.unwrap_or_else(|| ExperienceTotal::zero(user_id)),
        streak: streak.unwrap_or_else(|| StreakState::zero(user_id)),
        skill: skill.unwrap_or_else(|| SkillProgress::zero(user_id, category)),
        xp_delta: 0,
        changed: false,
        events: Vec::new(),
    }
}

fn log_events(user_id: Uuid, events: &[ProgressionEvent]) {
    for event in events {
        match event {
            ProgressionEvent::LevelUp { old_level, new_level } => {
                info!(%user_id, old_level, new_level, "level up")
            }
            ProgressionEvent::SkillLevelUp {
                skill,
                old_level,
                new_level,
            } => info!(%user_id, skill = %skill, old_level, new_level, "skill level up"),
            ProgressionEvent::TierReached { title, bonus_percent } => {
                info!(%user_id, title, bonus_percent, "streak tier reached")
            }
            other => debug!(%user_id, event = ?other, "progression event"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::domain::NewQuest;
    use crate::memory::MemoryStore;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};

    /// Serves one fixed quest snapshot, as a read that raced a concurrent write would.
    struct StaleQuests {
        inner: Arc<MemoryStore>,
        snapshot: Quest,
    }

    #[async_trait]
    impl QuestRepository for StaleQuests {
        async fn create_quest(&self, quest: NewQuest) -> PortResult<Quest> {
            self.inner.create_quest(quest).await
        }

        async fn get_quest(&self, _user_id: Uuid, _quest_id: Uuid) -> PortResult<Quest> {
            Ok(self.snapshot.clone())
        }

        async fn list_quests(&self, user_id: Uuid) -> PortResult<Vec<Quest>> {
            self.inner.list_quests(user_id).await
        }
    }

    struct Harness {
        clock: Arc<FixedClock>,
        store: Arc<MemoryStore>,
        service: ProgressionService,
        user: Uuid,
    }

    fn harness_with(rules: ProgressionRules) -> Harness {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 6, 10, 8, 30, 0).unwrap()));
        let store = Arc::new(MemoryStore::new(clock.clone()));
        let service = ProgressionService::new(store.clone(), store.clone(), clock.clone(), rules);
        Harness {
            clock,
            store,
            service,
            user: Uuid::new_v4(),
        }
    }

    fn harness() -> Harness {
        harness_with(ProgressionRules::default())
    }

    impl Harness {
        async fn quest(&self, category: SkillCategory, reward: u32) -> Quest {
            self.service
                .create_quest(self.user, "Daily practice", category, Some(reward))
                .await
                .unwrap()
        }
    }

    #[tokio::test]
    async fn complete_sets_status_and_is_idempotent() {
        let h = harness();
        let quest = h.quest(SkillCategory::Mind, 50).await;

        let first = h.service.complete_quest(h.user, quest.id).await.unwrap();
        assert!(first.changed);
        assert_eq!(first.quest.status, QuestStatus::Completed);
        assert_eq!(first.quest.completed_at, Some(h.clock.now()));
        assert_eq!(first.experience.total_xp, 50);

        let second = h.service.complete_quest(h.user, quest.id).await.unwrap();
        assert!(!second.changed);
        assert_eq!(second.xp_delta, 0);
        assert_eq!(second.experience.total_xp, 50);
        assert_eq!(second.streak.current_streak, 1);
        assert!(second.events.is_empty());
    }

    #[tokio::test]
    async fn completion_at_950_reaches_level_two() {
        let h = harness();
        h.store.write_experience(h.user, 950, 1).await.unwrap();
        let quest = h.quest(SkillCategory::Wealth, 100).await;

        let outcome = h.service.complete_quest(h.user, quest.id).await.unwrap();
        assert_eq!(outcome.experience.total_xp, 1050);
        assert_eq!(outcome.experience.level, 2);
        assert!(outcome
            .events
            .contains(&ProgressionEvent::LevelUp { old_level: 1, new_level: 2 }));

        let stored = h.store.read_experience(h.user).await.unwrap().unwrap();
        assert_eq!(stored, ExperienceTotal::new(h.user, 1050));
    }

    #[tokio::test]
    async fn two_quests_same_day_count_once() {
        let h = harness();
        let a = h.quest(SkillCategory::Body, 50).await;
        let b = h.quest(SkillCategory::Body, 50).await;

        let first = h.service.complete_quest(h.user, a.id).await.unwrap();
        let second = h.service.complete_quest(h.user, b.id).await.unwrap();
        assert_eq!(first.streak.current_streak, 1);
        assert_eq!(second.streak.current_streak, 1);
        assert_eq!(second.experience.total_xp, 100);
    }

    #[tokio::test]
    async fn consecutive_days_extend_and_gaps_reset() {
        let h = harness();
        for expected in 1..=3 {
            let quest = h.quest(SkillCategory::Discipline, 10).await;
            let outcome = h.service.complete_quest(h.user, quest.id).await.unwrap();
            assert_eq!(outcome.streak.current_streak, expected);
            h.clock.advance_days(1);
        }

        // Skip a day.
        h.clock.advance_days(1);
        let quest = h.quest(SkillCategory::Discipline, 10).await;
        let outcome = h.service.complete_quest(h.user, quest.id).await.unwrap();
        assert_eq!(outcome.streak.current_streak, 1);
        assert_eq!(outcome.streak.longest_streak, 3);
        assert!(outcome
            .events
            .contains(&ProgressionEvent::StreakReset { previous: 3 }));
    }

    #[tokio::test]
    async fn streak_of_six_becomes_discipline_flow() {
        let h = harness();
        let yesterday = h.clock.today() - Duration::days(1);
        h.store.write_streak(h.user, 6, 6, Some(yesterday)).await.unwrap();
        let quest = h.quest(SkillCategory::Mind, 50).await;

        let outcome = h.service.complete_quest(h.user, quest.id).await.unwrap();
        assert_eq!(outcome.streak.current_streak, 7);
        assert_eq!(outcome.streak.longest_streak, 7);

        let stats = h.service.stats(h.user).await.unwrap();
        assert_eq!(stats.tier.title, "Discipline Flow");
        assert_eq!(stats.tier.bonus_percent, 15);
        assert_eq!(stats.next_tier.map(|t| t.title), Some("Warrior Spirit"));
        assert_eq!(stats.streak_status, StreakStatus::Active);
    }

    #[tokio::test]
    async fn streak_three_days_stale_resets() {
        let h = harness();
        let three_days_ago = h.clock.today() - Duration::days(3);
        h.store.write_streak(h.user, 9, 15, Some(three_days_ago)).await.unwrap();
        let quest = h.quest(SkillCategory::Creativity, 50).await;

        let outcome = h.service.complete_quest(h.user, quest.id).await.unwrap();
        assert_eq!(outcome.streak.current_streak, 1);
        assert_eq!(outcome.streak.longest_streak, 15);
    }

    #[tokio::test]
    async fn completion_feeds_category_skill() {
        let h = harness();
        let quest = h.quest(SkillCategory::Relationships, 120).await;
        h.service.complete_quest(h.user, quest.id).await.unwrap();

        let skill = h
            .store
            .read_skill(h.user, SkillCategory::Relationships)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(skill.xp, 120);
        assert_eq!(skill.level, 2);
        assert!(h.store.read_skill(h.user, SkillCategory::Mind).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn uncomplete_reverses_xp_but_keeps_streak() {
        let h = harness();
        let quest = h.quest(SkillCategory::Mind, 80).await;
        h.service.complete_quest(h.user, quest.id).await.unwrap();

        let undone = h.service.uncomplete_quest(h.user, quest.id).await.unwrap();
        assert!(undone.changed);
        assert_eq!(undone.xp_delta, -80);
        assert_eq!(undone.quest.status, QuestStatus::Pending);
        assert!(undone.quest.completed_at.is_none());
        assert_eq!(undone.experience.total_xp, 0);
        assert_eq!(undone.skill.xp, 0);
        assert_eq!(undone.streak.current_streak, 1);

        let again = h.service.uncomplete_quest(h.user, quest.id).await.unwrap();
        assert!(!again.changed);
        assert_eq!(again.experience.total_xp, 0);

        let streak = h.store.read_streak(h.user).await.unwrap().unwrap();
        assert_eq!(streak.current_streak, 1);
    }

    #[tokio::test]
    async fn complete_uncomplete_complete_nets_one_award() {
        let h = harness_with(ProgressionRules {
            apply_streak_bonus: true,
        });
        let yesterday = h.clock.today() - Duration::days(1);
        h.store.write_streak(h.user, 6, 6, Some(yesterday)).await.unwrap();
        let quest = h.quest(SkillCategory::Body, 50).await;

        let first = h.service.complete_quest(h.user, quest.id).await.unwrap();
        assert_eq!(first.xp_delta, 68);
        h.service.uncomplete_quest(h.user, quest.id).await.unwrap();
        let again = h.service.complete_quest(h.user, quest.id).await.unwrap();

        // Same day, so the streak and the bonus stay the same.
        assert_eq!(again.streak.current_streak, 7);
        assert_eq!(again.experience.total_xp, 68);
        assert_eq!(again.skill.xp, 68);
    }

    #[tokio::test]
    async fn toggle_flips_status() {
        let h = harness();
        let quest = h.quest(SkillCategory::Wealth, 40).await;

        let on = h.service.toggle_quest(h.user, quest.id).await.unwrap();
        assert_eq!(on.quest.status, QuestStatus::Completed);
        let off = h.service.toggle_quest(h.user, quest.id).await.unwrap();
        assert_eq!(off.quest.status, QuestStatus::Pending);
        assert_eq!(off.experience.total_xp, 0);
    }

    #[tokio::test]
    async fn failed_commit_leaves_records_untouched() {
        let h = harness();
        h.store.write_experience(h.user, 300, 1).await.unwrap();
        let quest = h.quest(SkillCategory::Mind, 50).await;

        h.store.fail_commits(true);
        let err = h.service.complete_quest(h.user, quest.id).await.unwrap_err();
        assert!(matches!(err, PortError::Unexpected(_)));

        let stored = h.store.get_quest(h.user, quest.id).await.unwrap();
        assert_eq!(stored.status, QuestStatus::Pending);
        assert_eq!(h.store.read_experience(h.user).await.unwrap().unwrap().total_xp, 300);
        assert!(h.store.read_streak(h.user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn other_users_quest_is_not_found() {
        let h = harness();
        let quest = h.quest(SkillCategory::Mind, 50).await;
        let err = h
            .service
            .complete_quest(Uuid::new_v4(), quest.id)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn create_quest_validates_and_defaults() {
        let h = harness();
        let quest = h
            .service
            .create_quest(h.user, "  Meditate  ", SkillCategory::Mind, None)
            .await
            .unwrap();
        assert_eq!(quest.title, "Meditate");
        assert_eq!(quest.xp_reward, DEFAULT_XP_REWARD);
        assert_eq!(quest.status, QuestStatus::Pending);

        let blank = h.service.create_quest(h.user, "   ", SkillCategory::Mind, None).await;
        assert!(matches!(blank, Err(PortError::InvalidInput(_))));
        let zero = h.service.create_quest(h.user, "Walk", SkillCategory::Body, Some(0)).await;
        assert!(matches!(zero, Err(PortError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn stats_default_for_new_user() {
        let h = harness();
        let stats = h.service.stats(h.user).await.unwrap();
        assert_eq!(stats.experience.total_xp, 0);
        assert_eq!(stats.experience.level, 1);
        assert_eq!(stats.level_progress.next_level_xp, 1000);
        assert_eq!(stats.streak.current_streak, 0);
        assert_eq!(stats.streak_status, StreakStatus::Broken);
        assert_eq!(stats.tier.title, "Starting Path");
        assert_eq!(stats.skills.len(), 6);
        assert_eq!(stats.skills[0].skill, SkillCategory::Mind);
        assert!(stats.skills.iter().all(|s| s.xp == 0 && s.level == 1));
    }

    #[tokio::test]
    async fn duplicate_completion_from_stale_read_is_a_no_op() {
        let h = harness();
        let pending = h.quest(SkillCategory::Body, 50).await;
        h.service.complete_quest(h.user, pending.id).await.unwrap();

        // A second request read the quest before the first one committed.
        let stale = ProgressionService::new(
            h.store.clone(),
            Arc::new(StaleQuests {
                inner: h.store.clone(),
                snapshot: pending.clone(),
            }),
            h.clock.clone(),
            ProgressionRules::default(),
        );

        let again = stale.complete_quest(h.user, pending.id).await.unwrap();
        assert!(!again.changed);
        assert_eq!(again.xp_delta, 0);
        assert!(again.events.is_empty());
        assert_eq!(again.quest.status, QuestStatus::Completed);
        assert_eq!(again.experience.total_xp, 50);
        assert_eq!(again.streak.current_streak, 1);
        assert_eq!(again.skill.xp, 50);

        // A double-clicked toggle takes the same path.
        let toggled = stale.toggle_quest(h.user, pending.id).await.unwrap();
        assert!(!toggled.changed);
        assert_eq!(h.store.read_experience(h.user).await.unwrap().unwrap().total_xp, 50);
    }

    #[tokio::test]
    async fn duplicate_uncompletion_from_stale_read_is_a_no_op() {
        let h = harness();
        let quest = h.quest(SkillCategory::Mind, 40).await;
        let completed = h.service.complete_quest(h.user, quest.id).await.unwrap().quest;
        h.service.uncomplete_quest(h.user, quest.id).await.unwrap();

        let stale = ProgressionService::new(
            h.store.clone(),
            Arc::new(StaleQuests {
                inner: h.store.clone(),
                snapshot: completed,
            }),
            h.clock.clone(),
            ProgressionRules::default(),
        );

        let again = stale.uncomplete_quest(h.user, quest.id).await.unwrap();
        assert!(!again.changed);
        assert_eq!(again.quest.status, QuestStatus::Pending);
        assert_eq!(again.experience.total_xp, 0);
    }

    #[tokio::test]
    async fn concurrent_experience_write_is_a_conflict() {
        let h = harness();
        let quest = h.quest(SkillCategory::Wealth, 50).await;

        h.store.race_commits(true);
        let err = h.service.complete_quest(h.user, quest.id).await.unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));

        let stored = h.store.get_quest(h.user, quest.id).await.unwrap();
        assert_eq!(stored.status, QuestStatus::Pending);
        assert!(h.store.read_streak(h.user).await.unwrap().is_none());
        assert!(h.store.read_skill(h.user, SkillCategory::Wealth).await.unwrap().is_none());

        h.store.race_commits(false);
        let retried = h.service.complete_quest(h.user, quest.id).await.unwrap();
        assert!(retried.changed);
        assert_eq!(retried.experience.total_xp, 51);
    }
}
