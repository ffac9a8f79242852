//! crates/quest_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete persistence backend.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{
    ExperienceTotal, NewQuest, Profile, ProfileFields, Quest, QuestStatus, Reflection,
    SkillCategory, SkillProgress, StreakState,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A guarded write found different data than the caller read.
    #[error("Conflicting update: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Atomic Progression Commit
//=========================================================================================

/// A record write guarded by the value the caller observed.
///
/// `expected == None` means the caller saw no row; the store must then insert
/// and must fail if a row has appeared in the meantime.
#[derive(Debug, Clone, PartialEq)]
pub struct GuardedWrite<T> {
    pub expected: Option<T>,
    pub value: T,
}

impl<T: PartialEq> GuardedWrite<T> {
    /// Whether the stored value is still the one the caller observed.
    pub fn matches(&self, current: Option<&T>) -> bool {
        self.expected.as_ref() == current
    }
}

/// A quest status change guarded by the status the caller observed.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestTransition {
    pub quest_id: Uuid,
    pub from: QuestStatus,
    pub to: QuestStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub awarded_xp: Option<u32>,
}

/// Everything one completion or reversal writes. Stores apply it all or nothing
/// and answer `PortError::Conflict` when a record guard fails.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionCommit {
    pub user_id: Uuid,
    pub quest: QuestTransition,
    pub experience: GuardedWrite<ExperienceTotal>,
    /// `None` leaves the streak untouched.
    pub streak: Option<GuardedWrite<StreakState>>,
    pub skill: GuardedWrite<SkillProgress>,
}

/// What a store did with a `ProgressionCommit`.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// Every write was applied. Carries the updated quest.
    Applied(Quest),
    /// The quest had already left `from`, so nothing was written. Carries the
    /// quest as currently stored.
    Superseded(Quest),
}

//=========================================================================================
// Record Shape Checks
//=========================================================================================

/// Rejects a streak whose longest run is shorter than the current one.
pub fn check_streak_bounds(current_streak: u32, longest_streak: u32) -> PortResult<()> {
    if longest_streak < current_streak {
        return Err(PortError::InvalidInput(format!(
            "longest streak {} is below current streak {}",
            longest_streak, current_streak
        )));
    }
    Ok(())
}

/// A completed quest needs a completion time and a pending one must not have one.
pub fn check_completion_time(
    status: QuestStatus,
    completed_at: Option<DateTime<Utc>>,
) -> PortResult<()> {
    match (status, completed_at) {
        (QuestStatus::Completed, None) => Err(PortError::InvalidInput(
            "completed quest needs completed_at".to_string(),
        )),
        (QuestStatus::Pending, Some(_)) => Err(PortError::InvalidInput(
            "pending quest cannot have completed_at".to_string(),
        )),
        _ => Ok(()),
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait ProgressionStore: Send + Sync {
    // --- Experience ---
    async fn read_experience(&self, user_id: Uuid) -> PortResult<Option<ExperienceTotal>>;

    async fn write_experience(&self, user_id: Uuid, total_xp: u64, level: u32) -> PortResult<()>;

    // --- Streaks ---
    async fn read_streak(&self, user_id: Uuid) -> PortResult<Option<StreakState>>;

    async fn write_streak(
        &self,
        user_id: Uuid,
        current_streak: u32,
        longest_streak: u32,
        last_completion_date: Option<NaiveDate>,
    ) -> PortResult<()>;

    // --- Quest Status ---
    async fn update_quest_status(
        &self,
        quest_id: Uuid,
        status: QuestStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> PortResult<Quest>;

    // --- Skills ---
    async fn read_skill(
        &self,
        user_id: Uuid,
        skill: SkillCategory,
    ) -> PortResult<Option<SkillProgress>>;

    async fn write_skill(
        &self,
        user_id: Uuid,
        skill: SkillCategory,
        xp: u64,
        level: u32,
    ) -> PortResult<()>;

    async fn read_skills(&self, user_id: Uuid) -> PortResult<Vec<SkillProgress>>;

    // --- Atomic Update ---
    /// Applies every write of `commit` atomically.
    ///
    /// A quest that is no longer in `commit.quest.from` yields
    /// `CommitOutcome::Superseded` and writes nothing.
    async fn commit(&self, commit: ProgressionCommit) -> PortResult<CommitOutcome>;
}

#[async_trait]
pub trait QuestRepository: Send + Sync {
    async fn create_quest(&self, quest: NewQuest) -> PortResult<Quest>;

    /// Fails with `NotFound` when the quest does not exist or belongs to someone else.
    async fn get_quest(&self, user_id: Uuid, quest_id: Uuid) -> PortResult<Quest>;

    /// Newest first.
    async fn list_quests(&self, user_id: Uuid) -> PortResult<Vec<Quest>>;
}

#[async_trait]
pub trait ReflectionRepository: Send + Sync {
    /// Newest first.
    async fn list_reflections(&self, user_id: Uuid) -> PortResult<Vec<Reflection>>;

    async fn create_reflection(
        &self,
        user_id: Uuid,
        question: &str,
        answer: &str,
    ) -> PortResult<Reflection>;

    async fn update_reflection(
        &self,
        user_id: Uuid,
        reflection_id: Uuid,
        answer: &str,
    ) -> PortResult<Reflection>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// `None` until the user saves a profile for the first time.
    async fn get_profile(&self, user_id: Uuid) -> PortResult<Option<Profile>>;

    /// Creates or replaces the profile, keeping `created_at` of an existing one.
    async fn save_profile(&self, user_id: Uuid, fields: ProfileFields) -> PortResult<Profile>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn streak_bounds_reject_longest_below_current() {
        assert!(check_streak_bounds(3, 3).is_ok());
        assert!(check_streak_bounds(0, 9).is_ok());
        assert!(matches!(check_streak_bounds(4, 2), Err(PortError::InvalidInput(_))));
    }

    #[test]
    fn completion_time_must_match_status() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        assert!(check_completion_time(QuestStatus::Completed, Some(at)).is_ok());
        assert!(check_completion_time(QuestStatus::Pending, None).is_ok());
        assert!(matches!(
            check_completion_time(QuestStatus::Completed, None),
            Err(PortError::InvalidInput(_))
        ));
        assert!(matches!(
            check_completion_time(QuestStatus::Pending, Some(at)),
            Err(PortError::InvalidInput(_))
        ));
    }
}
