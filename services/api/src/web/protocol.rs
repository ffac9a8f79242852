//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged between the browser client and the
//! API server, and their conversions from the core domain types.

use chrono::{DateTime, NaiveDate, Utc};
use quest_core::domain::{
    ExperienceTotal, Profile, ProfileFields, Quest, Reflection, SkillProgress, StreakState,
    DEFAULT_AVATAR_EMOJI,
};
use quest_core::progression::{LevelProgress, ProgressionEvent, StreakTier, SKILL_XP_PER_LEVEL};
use quest_core::service::{ProgressionOutcome, UserStats};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Requests Sent FROM the Client (Browser) TO the Server
//=========================================================================================

#[derive(Deserialize, Debug, ToSchema)]
pub struct CreateQuestRequest {
    pub title: String,
    /// One of Mind, Body, Wealth, Relationships, Creativity, Discipline.
    pub category: String,
    /// Defaults to 50 when omitted.
    pub xp_reward: Option<u32>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct CreateReflectionRequest {
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct UpdateReflectionRequest {
    pub answer: String,
}

/// Replaces the whole profile. Omitted fields fall back to their defaults.
#[derive(Deserialize, Debug, ToSchema)]
#[serde(default)]
pub struct UpdateProfileRequest {
    pub username: String,
    /// One of warrior, sage, guardian, innovator.
    pub character_class: String,
    pub avatar_emoji: String,
    pub mission_statement: String,
    pub biggest_dream: String,
    pub daily_routine: String,
    pub greatest_strength: String,
    pub biggest_weakness: String,
    pub ideal_day: String,
    pub biggest_challenge: String,
    pub motivation_source: String,
}

impl Default for UpdateProfileRequest {
    fn default() -> Self {
        Self {
            username: String::new(),
            character_class: "warrior".to_string(),
            avatar_emoji: DEFAULT_AVATAR_EMOJI.to_string(),
            mission_statement: String::new(),
            biggest_dream: String::new(),
            daily_routine: String::new(),
            greatest_strength: String::new(),
            biggest_weakness: String::new(),
            ideal_day: String::new(),
            biggest_challenge: String::new(),
            motivation_source: String::new(),
        }
    }
}

//=========================================================================================
// Responses Sent FROM the Server TO the Client (Browser)
//=========================================================================================

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct QuestResponse {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    /// `pending` or `completed`.
    pub status: String,
    pub xp_reward: u32,
    pub awarded_xp: Option<u32>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Quest> for QuestResponse {
    fn from(quest: &Quest) -> Self {
        Self {
            id: quest.id,
            title: quest.title.clone(),
            category: quest.category.as_str().to_string(),
            status: quest.status.as_str().to_string(),
            xp_reward: quest.xp_reward,
            awarded_xp: quest.awarded_xp,
            completed_at: quest.completed_at,
            created_at: quest.created_at,
        }
    }
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct ExperienceResponse {
    pub total_xp: u64,
    pub level: u32,
}

impl From<&ExperienceTotal> for ExperienceResponse {
    fn from(experience: &ExperienceTotal) -> Self {
        Self {
            total_xp: experience.total_xp,
            level: experience.level,
        }
    }
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct StreakResponse {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_completion_date: Option<NaiveDate>,
}

impl From<&StreakState> for StreakResponse {
    fn from(streak: &StreakState) -> Self {
        Self {
            current_streak: streak.current_streak,
            longest_streak: streak.longest_streak,
            last_completion_date: streak.last_completion_date,
        }
    }
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct SkillResponse {
    pub skill: String,
    pub xp: u64,
    pub level: u32,
    /// Progress through the current skill level, 0-99.
    pub progress_percent: u8,
}

impl From<&SkillProgress> for SkillResponse {
    fn from(skill: &SkillProgress) -> Self {
        Self {
            skill: skill.skill.as_str().to_string(),
            xp: skill.xp,
            level: skill.level,
            progress_percent: ((skill.xp % SKILL_XP_PER_LEVEL) * 100 / SKILL_XP_PER_LEVEL) as u8,
        }
    }
}

/// Something notable that happened while applying a progression change.
#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressionEventPayload {
    XpAwarded { amount: u32, bonus: u32 },
    XpRevoked { amount: u32 },
    LevelUp { old_level: u32, new_level: u32 },
    LevelDown { old_level: u32, new_level: u32 },
    SkillLevelUp { skill: String, old_level: u32, new_level: u32 },
    SkillLevelDown { skill: String, old_level: u32, new_level: u32 },
    StreakStarted,
    StreakExtended { count: u32 },
    StreakReset { previous: u32 },
    TierReached { title: String, bonus_percent: u32 },
}

impl From<&ProgressionEvent> for ProgressionEventPayload {
    fn from(event: &ProgressionEvent) -> Self {
        match *event {
            ProgressionEvent::XpAwarded { amount, bonus } => Self::XpAwarded { amount, bonus },
            ProgressionEvent::XpRevoked { amount } => Self::XpRevoked { amount },
            ProgressionEvent::LevelUp { old_level, new_level } => Self::LevelUp { old_level, new_level },
            ProgressionEvent::LevelDown { old_level, new_level } => Self::LevelDown { old_level, new_level },
            ProgressionEvent::SkillLevelUp {
                skill,
                old_level,
                new_level,
            } => Self::SkillLevelUp {
                skill: skill.as_str().to_string(),
                old_level,
                new_level,
            },
            ProgressionEvent::SkillLevelDown {
                skill,
                old_level,
                new_level,
            } => Self::SkillLevelDown {
                skill: skill.as_str().to_string(),
                old_level,
                new_level,
            },
            ProgressionEvent::StreakStarted => Self::StreakStarted,
            ProgressionEvent::StreakExtended { count } => Self::StreakExtended { count },
            ProgressionEvent::StreakReset { previous } => Self::StreakReset { previous },
            ProgressionEvent::TierReached { title, bonus_percent } => Self::TierReached {
                title: title.to_string(),
                bonus_percent,
            },
        }
    }
}

/// The response payload sent after completing, un-completing or toggling a quest.
#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct ProgressionResponse {
    pub quest: QuestResponse,
    pub experience: ExperienceResponse,
    pub streak: StreakResponse,
    pub skill: SkillResponse,
    pub xp_delta: i64,
    /// `false` when the quest was already in the requested state.
    pub changed: bool,
    pub events: Vec<ProgressionEventPayload>,
}

impl From<&ProgressionOutcome> for ProgressionResponse {
    fn from(outcome: &ProgressionOutcome) -> Self {
        Self {
            quest: (&outcome.quest).into(),
            experience: (&outcome.experience).into(),
            streak: (&outcome.streak).into(),
            skill: (&outcome.skill).into(),
            xp_delta: outcome.xp_delta,
            changed: outcome.changed,
            events: outcome.events.iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct LevelProgressResponse {
    pub level: u32,
    pub total_xp: u64,
    pub current_level_xp: u64,
    pub next_level_xp: u64,
    pub xp_to_next: u64,
    pub percent: u8,
}

impl From<&LevelProgress> for LevelProgressResponse {
    fn from(progress: &LevelProgress) -> Self {
        Self {
            level: progress.level,
            total_xp: progress.total_xp,
            current_level_xp: progress.current_level_xp,
            next_level_xp: progress.next_level_xp,
            xp_to_next: progress.xp_to_next,
            percent: progress.percent,
        }
    }
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct TierResponse {
    pub title: String,
    pub min_streak: u32,
    pub bonus_percent: u32,
}

impl From<&StreakTier> for TierResponse {
    fn from(tier: &StreakTier) -> Self {
        Self {
            title: tier.title.to_string(),
            min_streak: tier.min_streak,
            bonus_percent: tier.bonus_percent,
        }
    }
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct NextTierResponse {
    pub tier: TierResponse,
    pub days_remaining: u32,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct StatsResponse {
    pub experience: ExperienceResponse,
    pub level_progress: LevelProgressResponse,
    pub streak: StreakResponse,
    /// `active`, `warning` or `broken`.
    pub streak_status: String,
    pub multiplier: f64,
    pub tier: TierResponse,
    pub next_tier: Option<NextTierResponse>,
    pub skills: Vec<SkillResponse>,
}

impl From<&UserStats> for StatsResponse {
    fn from(stats: &UserStats) -> Self {
        let streak = stats.streak.current_streak;
        Self {
            experience: (&stats.experience).into(),
            level_progress: (&stats.level_progress).into(),
            streak: (&stats.streak).into(),
            streak_status: stats.streak_status.as_str().to_string(),
            multiplier: stats.multiplier,
            tier: stats.tier.into(),
            next_tier: stats.next_tier.map(|tier| NextTierResponse {
                tier: tier.into(),
                days_remaining: tier.days_remaining(streak),
            }),
            skills: stats.skills.iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct ReflectionResponse {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Reflection> for ReflectionResponse {
    fn from(reflection: &Reflection) -> Self {
        Self {
            id: reflection.id,
            question: reflection.question.clone(),
            answer: reflection.answer.clone(),
            created_at: reflection.created_at,
            updated_at: reflection.updated_at,
        }
    }
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct ProfileResponse {
    pub username: String,
    pub character_class: String,
    pub avatar_emoji: String,
    pub mission_statement: String,
    pub biggest_dream: String,
    pub daily_routine: String,
    pub greatest_strength: String,
    pub biggest_weakness: String,
    pub ideal_day: String,
    pub biggest_challenge: String,
    pub motivation_source: String,
    /// `null` until the profile is saved for the first time.
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProfileResponse {
    fn from_fields(fields: &ProfileFields, updated_at: Option<DateTime<Utc>>) -> Self {
        Self {
            username: fields.username.clone(),
            character_class: fields.character_class.as_str().to_string(),
            avatar_emoji: fields.avatar_emoji.clone(),
            mission_statement: fields.mission_statement.clone(),
            biggest_dream: fields.biggest_dream.clone(),
            daily_routine: fields.daily_routine.clone(),
            greatest_strength: fields.greatest_strength.clone(),
            biggest_weakness: fields.biggest_weakness.clone(),
            ideal_day: fields.ideal_day.clone(),
            biggest_challenge: fields.biggest_challenge.clone(),
            motivation_source: fields.motivation_source.clone(),
            updated_at,
        }
    }

    /// The profile a user sees before saving one.
    pub fn unsaved() -> Self {
        Self::from_fields(&ProfileFields::default(), None)
    }
}

impl From<&Profile> for ProfileResponse {
    fn from(profile: &Profile) -> Self {
        Self::from_fields(&profile.fields, Some(profile.updated_at))
    }
}
