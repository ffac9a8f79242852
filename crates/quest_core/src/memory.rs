//! crates/quest_core/src/memory.rs
//!
//! An in-process adapter implementing every port on top of one mutex.
//! Used by tests and for running the engine without a database.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::clock::Clock;
use crate::domain::{
    ExperienceTotal, NewQuest, Profile, ProfileFields, Quest, QuestStatus, Reflection,
    SkillCategory, SkillProgress, StreakState,
};
use crate::ports::{
    check_completion_time, check_streak_bounds, CommitOutcome, GuardedWrite, PortError,
    PortResult, ProfileRepository, ProgressionCommit, ProgressionStore, QuestRepository,
    ReflectionRepository,
};

#[derive(Default)]
struct MemoryState {
    // Kept in insertion order so ties on `created_at` still list newest first.
    quests: Vec<Quest>,
    experience: HashMap<Uuid, ExperienceTotal>,
    streaks: HashMap<Uuid, StreakState>,
    skills: HashMap<(Uuid, SkillCategory), SkillProgress>,
    reflections: Vec<Reflection>,
    profiles: HashMap<Uuid, Profile>,
}

impl MemoryState {
    fn quest_mut(&mut self, user_id: Option<Uuid>, quest_id: Uuid) -> PortResult<&mut Quest> {
        self.quests
            .iter_mut()
            .find(|q| q.id == quest_id && user_id.map_or(true, |u| q.user_id == u))
            .ok_or_else(|| PortError::NotFound(format!("Quest {} not found", quest_id)))
    }
}

pub struct MemoryStore {
    clock: Arc<dyn Clock>,
    state: Mutex<MemoryState>,
    fail_commits: AtomicBool,
    race_commits: AtomicBool,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: Mutex::new(MemoryState::default()),
            fail_commits: AtomicBool::new(false),
            race_commits: AtomicBool::new(false),
        }
    }

    /// Makes every following `commit` fail as a storage error would.
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Makes every following `commit` lose a race: another writer adds 1 XP to
    /// the user's total right before the guards are checked.
    pub fn race_commits(&self, race: bool) {
        self.race_commits.store(race, Ordering::SeqCst);
    }

    fn lock(&self) -> PortResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| PortError::Unexpected("memory store lock poisoned".to_string()))
    }
}

fn check_guard<T: PartialEq>(name: &str, current: Option<&T>, write: &GuardedWrite<T>) -> PortResult<()> {
    if !write.matches(current) {
        return Err(PortError::Conflict(format!("{} changed since it was read", name)));
    }
    Ok(())
}

//=========================================================================================
// `ProgressionStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProgressionStore for MemoryStore {
    async fn read_experience(&self, user_id: Uuid) -> PortResult<Option<ExperienceTotal>> {
        Ok(self.lock()?.experience.get(&user_id).copied())
    }

    async fn write_experience(&self, user_id: Uuid, total_xp: u64, level: u32) -> PortResult<()> {
        self.lock()?.experience.insert(
            user_id,
            ExperienceTotal {
                user_id,
                total_xp,
                level,
            },
        );
        Ok(())
    }

    async fn read_streak(&self, user_id: Uuid) -> PortResult<Option<StreakState>> {
        Ok(self.lock()?.streaks.get(&user_id).copied())
    }

    async fn write_streak(
        &self,
        user_id: Uuid,
        current_streak: u32,
        longest_streak: u32,
        last_completion_date: Option<NaiveDate>,
    ) -> PortResult<()> {
        check_streak_bounds(current_streak, longest_streak)?;
        self.lock()?.streaks.insert(
            user_id,
            StreakState {
                user_id,
                current_streak,
                longest_streak,
                last_completion_date,
            },
        );
        Ok(())
    }

    async fn update_quest_status(
        &self,
        quest_id: Uuid,
        status: QuestStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> PortResult<Quest> {
        check_completion_time(status, completed_at)?;
        let mut state = self.lock()?;
        let quest = state.quest_mut(None, quest_id)?;
        quest.status = status;
        quest.completed_at = completed_at;
        if status == QuestStatus::Pending {
            quest.awarded_xp = None;
        }
        Ok(quest.clone())
    }

    async fn read_skill(
        &self,
        user_id: Uuid,
        skill: SkillCategory,
    ) -> PortResult<Option<SkillProgress>> {
        Ok(self.lock()?.skills.get(&(user_id, skill)).copied())
    }

    async fn write_skill(
        &self,
        user_id: Uuid,
        skill: SkillCategory,
        xp: u64,
        level: u32,
    ) -> PortResult<()> {
        self.lock()?.skills.insert(
            (user_id, skill),
            SkillProgress {
                user_id,
                skill,
                xp,
                level,
            },
        );
        Ok(())
    }

    async fn read_skills(&self, user_id: Uuid) -> PortResult<Vec<SkillProgress>> {
        let state = self.lock()?;
        let mut skills: Vec<SkillProgress> = state
            .skills
            .values()
            .filter(|s| s.user_id == user_id)
            .copied()
            .collect();
        skills.sort_by_key(|s| s.skill);
        Ok(skills)
    }

    async fn commit(&self, commit: ProgressionCommit) -> PortResult<CommitOutcome> {
        let mut state = self.lock()?;
        let user_id = commit.user_id;

        // Validate every guard before touching anything.
        let current = state.quest_mut(Some(user_id), commit.quest.quest_id)?;
        if current.status != commit.quest.from {
            return Ok(CommitOutcome::Superseded(current.clone()));
        }
        if self.race_commits.load(Ordering::SeqCst) {
            let raced = state.experience.get(&user_id).map_or(0, |e| e.total_xp) + 1;
            state.experience.insert(user_id, ExperienceTotal::new(user_id, raced));
        }
        check_guard("experience", state.experience.get(&user_id), &commit.experience)?;
        if let Some(streak) = &commit.streak {
            check_guard("streak", state.streaks.get(&user_id), streak)?;
        }
        let skill_key = (user_id, commit.skill.value.skill);
        check_guard("skill progress", state.skills.get(&skill_key), &commit.skill)?;

        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("simulated storage failure".to_string()));
        }

        state.experience.insert(user_id, commit.experience.value);
        if let Some(streak) = commit.streak {
            state.streaks.insert(user_id, streak.value);
        }
        state.skills.insert(skill_key, commit.skill.value);

        let quest = state.quest_mut(Some(user_id), commit.quest.quest_id)?;
        quest.status = commit.quest.to;
        quest.completed_at = commit.quest.completed_at;
        quest.awarded_xp = commit.quest.awarded_xp;
        Ok(CommitOutcome::Applied(quest.clone()))
    }
}

//=========================================================================================
// `QuestRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl QuestRepository for MemoryStore {
    async fn create_quest(&self, quest: NewQuest) -> PortResult<Quest> {
        let created = Quest {
            id: Uuid::new_v4(),
            user_id: quest.user_id,
            title: quest.title,
            category: quest.category,
            status: QuestStatus::Pending,
            xp_reward: quest.xp_reward,
            awarded_xp: None,
            completed_at: None,
            created_at: self.clock.now(),
        };
        self.lock()?.quests.push(created.clone());
        Ok(created)
    }

    async fn get_quest(&self, user_id: Uuid, quest_id: Uuid) -> PortResult<Quest> {
        let mut state = self.lock()?;
        let quest = state.quest_mut(Some(user_id), quest_id)?.clone();
        Ok(quest)
    }

    async fn list_quests(&self, user_id: Uuid) -> PortResult<Vec<Quest>> {
        let state = self.lock()?;
        let mut quests: Vec<Quest> = state
            .quests
            .iter()
            .rev()
            .filter(|q| q.user_id == user_id)
            .cloned()
            .collect();
        quests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(quests)
    }
}

//=========================================================================================
// `ReflectionRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl ReflectionRepository for MemoryStore {
    async fn list_reflections(&self, user_id: Uuid) -> PortResult<Vec<Reflection>> {
        let state = self.lock()?;
        let mut reflections: Vec<Reflection> = state
            .reflections
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        reflections.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reflections)
    }

    async fn create_reflection(
        &self,
        user_id: Uuid,
        question: &str,
        answer: &str,
    ) -> PortResult<Reflection> {
        let now = self.clock.now();
        let reflection = Reflection {
            id: Uuid::new_v4(),
            user_id,
            question: question.to_string(),
            answer: answer.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.lock()?.reflections.push(reflection.clone());
        Ok(reflection)
    }

    async fn update_reflection(
        &self,
        user_id: Uuid,
        reflection_id: Uuid,
        answer: &str,
    ) -> PortResult<Reflection> {
        let now = self.clock.now();
        let mut state = self.lock()?;
        let reflection = state
            .reflections
            .iter_mut()
            .find(|r| r.id == reflection_id && r.user_id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("Reflection {} not found", reflection_id)))?;
        reflection.answer = answer.to_string();
        reflection.updated_at = now;
        Ok(reflection.clone())
    }
}

//=========================================================================================
// `ProfileRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn get_profile(&self, user_id: Uuid) -> PortResult<Option<Profile>> {
        Ok(self.lock()?.profiles.get(&user_id).cloned())
    }

    async fn save_profile(&self, user_id: Uuid, fields: ProfileFields) -> PortResult<Profile> {
        let now = self.clock.now();
        let mut state = self.lock()?;
        let created_at = state.profiles.get(&user_id).map_or(now, |p| p.created_at);
        let profile = Profile {
            user_id,
            fields,
            created_at,
            updated_at: now,
        };
        state.profiles.insert(user_id, profile.clone());
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{Duration, TimeZone};

    fn store() -> (Arc<FixedClock>, MemoryStore) {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()));
        let store = MemoryStore::new(clock.clone());
        (clock, store)
    }

    fn new_quest(user_id: Uuid, title: &str) -> NewQuest {
        NewQuest {
            user_id,
            title: title.to_string(),
            category: SkillCategory::Body,
            xp_reward: 50,
        }
    }

    #[tokio::test]
    async fn quests_are_scoped_and_listed_newest_first() {
        let (clock, store) = store();
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();

        let first = store.create_quest(new_quest(user, "Run")).await.unwrap();
        clock.advance(Duration::minutes(5));
        let second = store.create_quest(new_quest(user, "Stretch")).await.unwrap();
        let third = store.create_quest(new_quest(user, "Swim")).await.unwrap();
        store.create_quest(new_quest(other, "Lift")).await.unwrap();

        let listed: Vec<Uuid> = store.list_quests(user).await.unwrap().iter().map(|q| q.id).collect();
        assert_eq!(listed, vec![third.id, second.id, first.id]);

        let err = store.get_quest(other, first.id).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn commit_rejects_stale_experience() {
        let (_clock, store) = store();
        let user = Uuid::new_v4();
        let quest = store.create_quest(new_quest(user, "Run")).await.unwrap();
        store.write_experience(user, 500, 1).await.unwrap();

        let commit = ProgressionCommit {
            user_id: user,
            quest: crate::ports::QuestTransition {
                quest_id: quest.id,
                from: QuestStatus::Pending,
                to: QuestStatus::Completed,
                completed_at: Some(store.clock.now()),
                awarded_xp: Some(50),
            },
            // Caller believes no experience row exists.
            experience: GuardedWrite {
                expected: None,
                value: ExperienceTotal::new(user, 50),
            },
            streak: None,
            skill: GuardedWrite {
                expected: None,
                value: SkillProgress::new(user, SkillCategory::Body, 50),
            },
        };

        let err = store.commit(commit).await.unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));

        // Nothing was applied.
        let quest = store.get_quest(user, quest.id).await.unwrap();
        assert_eq!(quest.status, QuestStatus::Pending);
        assert_eq!(store.read_experience(user).await.unwrap().unwrap().total_xp, 500);
        assert!(store.read_skill(user, SkillCategory::Body).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_quest_status_clears_award_when_pending() {
        let (clock, store) = store();
        let user = Uuid::new_v4();
        let quest = store.create_quest(new_quest(user, "Run")).await.unwrap();

        let done = store
            .update_quest_status(quest.id, QuestStatus::Completed, Some(clock.now()))
            .await
            .unwrap();
        assert!(done.is_completed());
        assert!(done.completed_at.is_some());

        let undone = store
            .update_quest_status(quest.id, QuestStatus::Pending, None)
            .await
            .unwrap();
        assert_eq!(undone.status, QuestStatus::Pending);
        assert!(undone.completed_at.is_none());
        assert!(undone.awarded_xp.is_none());
    }

    #[tokio::test]
    async fn reflections_update_answer_and_timestamp() {
        let (clock, store) = store();
        let user = Uuid::new_v4();
        let created = store
            .create_reflection(user, "What drained you today?", "Meetings")
            .await
            .unwrap();

        clock.advance(Duration::hours(2));
        let updated = store
            .update_reflection(user, created.id, "Too many meetings")
            .await
            .unwrap();
        assert_eq!(updated.answer, "Too many meetings");
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.updated_at, created.created_at + Duration::hours(2));

        let err = store
            .update_reflection(Uuid::new_v4(), created.id, "hijack")
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
        assert_eq!(store.list_reflections(user).await.unwrap().len(), 1);
    }

    fn completion_commit(store: &MemoryStore, user: Uuid, quest_id: Uuid) -> ProgressionCommit {
        ProgressionCommit {
            user_id: user,
            quest: crate::ports::QuestTransition {
                quest_id,
                from: QuestStatus::Pending,
                to: QuestStatus::Completed,
                completed_at: Some(store.clock.now()),
                awarded_xp: Some(50),
            },
            experience: GuardedWrite {
                expected: None,
                value: ExperienceTotal::new(user, 50),
            },
            streak: None,
            skill: GuardedWrite {
                expected: None,
                value: SkillProgress::new(user, SkillCategory::Body, 50),
            },
        }
    }

    #[tokio::test]
    async fn commit_on_moved_quest_is_superseded() {
        let (_clock, store) = store();
        let user = Uuid::new_v4();
        let quest = store.create_quest(new_quest(user, "Run")).await.unwrap();

        let first = store
            .commit(completion_commit(&store, user, quest.id))
            .await
            .unwrap();
        assert!(matches!(first, CommitOutcome::Applied(ref q) if q.is_completed()));

        // A replay of the same transition finds the quest already completed.
        let replay = store
            .commit(completion_commit(&store, user, quest.id))
            .await
            .unwrap();
        match replay {
            CommitOutcome::Superseded(current) => assert!(current.is_completed()),
            other => panic!("expected superseded, got {:?}", other),
        }
        assert_eq!(store.read_experience(user).await.unwrap().unwrap().total_xp, 50);
    }

    #[tokio::test]
    async fn writes_reject_shapes_the_schema_forbids() {
        let (clock, store) = store();
        let user = Uuid::new_v4();
        let quest = store.create_quest(new_quest(user, "Run")).await.unwrap();

        let streak = store.write_streak(user, 5, 2, None).await;
        assert!(matches!(streak, Err(PortError::InvalidInput(_))));
        assert!(store.read_streak(user).await.unwrap().is_none());

        let undated = store
            .update_quest_status(quest.id, QuestStatus::Completed, None)
            .await;
        assert!(matches!(undated, Err(PortError::InvalidInput(_))));
        let dated_pending = store
            .update_quest_status(quest.id, QuestStatus::Pending, Some(clock.now()))
            .await;
        assert!(matches!(dated_pending, Err(PortError::InvalidInput(_))));
        assert_eq!(
            store.get_quest(user, quest.id).await.unwrap().status,
            QuestStatus::Pending
        );
    }

    #[tokio::test]
    async fn profile_save_keeps_creation_time() {
        let (clock, store) = store();
        let user = Uuid::new_v4();
        assert!(store.get_profile(user).await.unwrap().is_none());

        let created = store
            .save_profile(
                user,
                ProfileFields {
                    username: "Kenji".to_string(),
                    ..ProfileFields::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(created.created_at, created.updated_at);

        clock.advance(Duration::days(1));
        let updated = store
            .save_profile(
                user,
                ProfileFields {
                    username: "Kenji".to_string(),
                    character_class: crate::domain::CharacterClass::Sage,
                    biggest_dream: "Run a marathon".to_string(),
                    ..ProfileFields::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.updated_at, created.created_at + Duration::days(1));

        let stored = store.get_profile(user).await.unwrap().unwrap();
        assert_eq!(stored.fields.character_class, crate::domain::CharacterClass::Sage);
        assert_eq!(stored.fields.biggest_dream, "Run a marathon");
        assert!(store.get_profile(Uuid::new_v4()).await.unwrap().is_none());
    }
}
