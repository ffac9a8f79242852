//! crates/quest_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::progression::{level_for_xp, skill_level_for_xp};

/// XP granted by a quest when the client does not name a reward.
pub const DEFAULT_XP_REWARD: u32 = 50;

//=========================================================================================
// Skill Categories
//=========================================================================================

/// The six life-skill categories every quest belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkillCategory {
    Mind,
    Body,
    Wealth,
    Relationships,
    Creativity,
    Discipline,
}

impl SkillCategory {
    /// All categories, in display order.
    pub const ALL: [SkillCategory; 6] = [
        SkillCategory::Mind,
        SkillCategory::Body,
        SkillCategory::Wealth,
        SkillCategory::Relationships,
        SkillCategory::Creativity,
        SkillCategory::Discipline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mind => "Mind",
            Self::Body => "Body",
            Self::Wealth => "Wealth",
            Self::Relationships => "Relationships",
            Self::Creativity => "Creativity",
            Self::Discipline => "Discipline",
        }
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name one of the six categories.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown skill category '{0}'")]
pub struct UnknownSkillCategory(pub String);

impl FromStr for SkillCategory {
    type Err = UnknownSkillCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownSkillCategory(s.to_string()))
    }
}

//=========================================================================================
// Quests
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestStatus {
    Pending,
    Completed,
}

impl QuestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown quest status '{0}'")]
pub struct UnknownQuestStatus(pub String);

impl FromStr for QuestStatus {
    type Err = UnknownQuestStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            _ => Err(UnknownQuestStatus(s.to_string())),
        }
    }
}

/// A single trackable task owned by one user.
///
/// `completed_at` and `awarded_xp` are present exactly when the quest is completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub category: SkillCategory,
    pub status: QuestStatus,
    pub xp_reward: u32,
    /// XP that was actually granted by the completion, after any streak bonus.
    pub awarded_xp: Option<u32>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Quest {
    pub fn is_completed(&self) -> bool {
        self.status == QuestStatus::Completed
    }
}

/// The fields a caller supplies to create a quest.
#[derive(Debug, Clone)]
pub struct NewQuest {
    pub user_id: Uuid,
    pub title: String,
    pub category: SkillCategory,
    pub xp_reward: u32,
}

//=========================================================================================
// Progression Records
//=========================================================================================

/// Total accumulated experience of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExperienceTotal {
    pub user_id: Uuid,
    pub total_xp: u64,
    pub level: u32,
}

impl ExperienceTotal {
    /// Builds a record whose level is derived from `total_xp`.
    pub fn new(user_id: Uuid, total_xp: u64) -> Self {
        Self {
            user_id,
            total_xp,
            level: level_for_xp(total_xp),
        }
    }

    /// The value used when a user has no experience row yet.
    pub fn zero(user_id: Uuid) -> Self {
        Self::new(user_id, 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakState {
    pub user_id: Uuid,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_completion_date: Option<NaiveDate>,
}

impl StreakState {
    pub fn zero(user_id: Uuid) -> Self {
        Self {
            user_id,
            current_streak: 0,
            longest_streak: 0,
            last_completion_date: None,
        }
    }
}

/// Experience within one skill category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillProgress {
    pub user_id: Uuid,
    pub skill: SkillCategory,
    pub xp: u64,
    pub level: u32,
}

impl SkillProgress {
    pub fn new(user_id: Uuid, skill: SkillCategory, xp: u64) -> Self {
        Self {
            user_id,
            skill,
            xp,
            level: skill_level_for_xp(xp),
        }
    }

    pub fn zero(user_id: Uuid, skill: SkillCategory) -> Self {
        Self::new(user_id, skill, 0)
    }
}

//=========================================================================================
// Reflections
//=========================================================================================

/// A journal entry: a reflection question and the user's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reflection {
    pub id: Uuid,
    pub user_id: Uuid,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//=========================================================================================
// Profiles
//=========================================================================================

/// Avatar shown when a user has not picked one.
pub const DEFAULT_AVATAR_EMOJI: &str = "\u{1F3AF}";

/// The archetype a user picks for their character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CharacterClass {
    #[default]
    Warrior,
    Sage,
    Guardian,
    Innovator,
}

impl CharacterClass {
    pub const ALL: [CharacterClass; 4] = [
        CharacterClass::Warrior,
        CharacterClass::Sage,
        CharacterClass::Guardian,
        CharacterClass::Innovator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warrior => "warrior",
            Self::Sage => "sage",
            Self::Guardian => "guardian",
            Self::Innovator => "innovator",
        }
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown character class '{0}'")]
pub struct UnknownCharacterClass(pub String);

impl FromStr for CharacterClass {
    type Err = UnknownCharacterClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCharacterClass(s.to_string()))
    }
}

/// The editable part of a profile: character setup plus the self-reflection answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileFields {
    pub username: String,
    pub character_class: CharacterClass,
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

impl Default for ProfileFields {
    fn default() -> Self {
        Self {
            username: String::new(),
            character_class: CharacterClass::default(),
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

/// A stored profile. One per user, created on the first save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub user_id: Uuid,
    pub fields: ProfileFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skill_category_parses_exact_names() {
        for category in SkillCategory::ALL {
            assert_eq!(category.as_str().parse::<SkillCategory>(), Ok(category));
        }
        assert!("mind".parse::<SkillCategory>().is_err());
        assert!("Spirit".parse::<SkillCategory>().is_err());
    }

    #[test]
    fn quest_status_round_trips_through_str() {
        for status in [QuestStatus::Pending, QuestStatus::Completed] {
            assert_eq!(status.as_str().parse::<QuestStatus>(), Ok(status));
        }
        assert_eq!(
            "done".parse::<QuestStatus>(),
            Err(UnknownQuestStatus("done".to_string()))
        );
    }

    #[test]
    fn character_class_parses_lowercase_names() {
        assert_eq!("sage".parse::<CharacterClass>(), Ok(CharacterClass::Sage));
        assert!("Sage".parse::<CharacterClass>().is_err());
        assert!("rogue".parse::<CharacterClass>().is_err());
        assert_eq!(CharacterClass::default(), CharacterClass::Warrior);
    }

    #[test]
    fn profile_fields_default_to_warrior_with_target_avatar() {
        let fields = ProfileFields::default();
        assert_eq!(fields.character_class, CharacterClass::Warrior);
        assert_eq!(fields.avatar_emoji, DEFAULT_AVATAR_EMOJI);
        assert!(fields.username.is_empty());
        assert!(fields.motivation_source.is_empty());
    }

    #[test]
    fn records_derive_levels() {
        let user = Uuid::new_v4();
        assert_eq!(ExperienceTotal::zero(user).level, 1);
        assert_eq!(ExperienceTotal::new(user, 2500).level, 3);
        assert_eq!(SkillProgress::zero(user, SkillCategory::Body).level, 1);
        assert_eq!(SkillProgress::new(user, SkillCategory::Body, 250).level, 3);
    }
}
