//! crates/quest_core/src/progression.rs
//!
//! The progression rules: levels, streaks, streak tiers and the plans that
//! describe how completing or un-completing a quest changes a user's records.
//!
//! Everything here is pure. The `service` module reads the current records
//! through the ports, asks this module for a plan and commits the plan.

use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::{ExperienceTotal, Quest, QuestStatus, SkillCategory, SkillProgress, StreakState};

/// Total XP needed per account level.
pub const XP_PER_LEVEL: u64 = 1000;

/// XP needed per level inside one skill category.
pub const SKILL_XP_PER_LEVEL: u64 = 100;

/// Multiplier step per streak day, in percent.
pub const STREAK_STEP_PERCENT: u64 = 5;

//=========================================================================================
// Levels
//=========================================================================================

/// Account level for a total, never below 1.
pub fn level_for_xp(total_xp: u64) -> u32 {
    u32::try_from(total_xp / XP_PER_LEVEL)
        .map(|l| l.saturating_add(1))
        .unwrap_or(u32::MAX)
}

/// Skill level for the XP earned inside one category, never below 1.
pub fn skill_level_for_xp(xp: u64) -> u32 {
    u32::try_from(xp / SKILL_XP_PER_LEVEL)
        .map(|l| l.saturating_add(1))
        .unwrap_or(u32::MAX)
}

/// Where a total sits inside its level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProgress {
    pub level: u32,
    pub total_xp: u64,
    /// Total at which the current level started
    pub current_level_xp: u64,
    /// Total at which the next level starts
    pub next_level_xp: u64,
    pub xp_to_next: u64,
    /// Progress through the current level, 0-100
    pub percent: u8,
}

impl LevelProgress {
    pub fn new(total_xp: u64) -> Self {
        let level = level_for_xp(total_xp);
        let current_level_xp = (total_xp / XP_PER_LEVEL) * XP_PER_LEVEL;
        let next_level_xp = current_level_xp.saturating_add(XP_PER_LEVEL);
        let into_level = total_xp - current_level_xp;
        // into_level < XP_PER_LEVEL, so this is always 0..=99
        let percent = (into_level * 100 / XP_PER_LEVEL) as u8;

        Self {
            level,
            total_xp,
            current_level_xp,
            next_level_xp,
            xp_to_next: next_level_xp - total_xp,
            percent,
        }
    }
}

//=========================================================================================
// Streak Tiers and Multiplier
//=========================================================================================

/// A named streak milestone with its flat XP bonus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakTier {
    pub min_streak: u32,
    pub title: &'static str,
    pub bonus_percent: u32,
}

/// All tiers (must be sorted by `min_streak`)
pub static STREAK_TIERS: &[StreakTier] = &[
    StreakTier {
        min_streak: 0,
        title: "Starting Path",
        bonus_percent: 0,
    },
    StreakTier {
        min_streak: 3,
        title: "Momentum Build",
        bonus_percent: 10,
    },
    StreakTier {
        min_streak: 7,
        title: "Discipline Flow",
        bonus_percent: 15,
    },
    StreakTier {
        min_streak: 14,
        title: "Warrior Spirit",
        bonus_percent: 25,
    },
    StreakTier {
        min_streak: 21,
        title: "Sensei Level",
        bonus_percent: 35,
    },
    StreakTier {
        min_streak: 30,
        title: "Legendary Master",
        bonus_percent: 50,
    },
];

impl StreakTier {
    /// Highest tier the streak qualifies for.
    pub fn for_streak(streak: u32) -> &'static StreakTier {
        STREAK_TIERS
            .iter()
            .rev()
            .find(|t| streak >= t.min_streak)
            .unwrap_or(&STREAK_TIERS[0])
    }

    /// The next tier above the streak, `None` once the top tier is reached.
    pub fn next_after(streak: u32) -> Option<&'static StreakTier> {
        STREAK_TIERS.iter().find(|t| t.min_streak > streak)
    }

    pub fn days_remaining(&self, streak: u32) -> u32 {
        self.min_streak.saturating_sub(streak)
    }
}

/// Display multiplier: 1 + 0.05 per streak day.
///
/// Built from the same integer percent as `boosted_reward`, so 3 days is exactly `1.15`.
pub fn streak_multiplier(streak: u32) -> f64 {
    let percent = 100 + STREAK_STEP_PERCENT * u64::from(streak);
    percent as f64 / 100.0
}

/// `reward × streak_multiplier(streak)`, rounded half up.
///
/// Computed in integer percent so the rounding is exact.
pub fn boosted_reward(reward: u32, streak: u32) -> u32 {
    let percent = 100 + STREAK_STEP_PERCENT * u64::from(streak);
    let scaled = u64::from(reward) * percent;
    u32::try_from((scaled + 50) / 100).unwrap_or(u32::MAX)
}

//=========================================================================================
// Streak State Transitions
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakChange {
    /// Another completion on a day that already counted.
    Unchanged,
    /// First completion ever.
    Started,
    /// Completion on the day after the last one.
    Extended,
    /// Completion after a gap; the previous run is lost.
    Reset { previous: u32 },
}

/// How a streak looks from `today`, without any new completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakStatus {
    /// Already completed something today.
    Active,
    /// Last completion was yesterday; today keeps the streak alive.
    Warning,
    Broken,
}

impl StreakStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Warning => "warning",
            Self::Broken => "broken",
        }
    }
}

pub fn streak_status(state: &StreakState, today: NaiveDate) -> StreakStatus {
    let Some(last) = state.last_completion_date else {
        return StreakStatus::Broken;
    };
    if state.current_streak == 0 {
        return StreakStatus::Broken;
    }
    match today.signed_duration_since(last).num_days() {
        0 => StreakStatus::Active,
        1 => StreakStatus::Warning,
        _ => StreakStatus::Broken,
    }
}

/// Applies one completion on `today` to a streak.
pub fn advance_streak(state: &StreakState, today: NaiveDate) -> (StreakState, StreakChange) {
    let (current, change) = match state.last_completion_date {
        Some(last) if last == today => return (*state, StreakChange::Unchanged),
        Some(last) if today.signed_duration_since(last).num_days() == 1 => {
            (state.current_streak.saturating_add(1), StreakChange::Extended)
        }
        Some(_) => (
            1,
            StreakChange::Reset {
                previous: state.current_streak,
            },
        ),
        None => (1, StreakChange::Started),
    };

    let next = StreakState {
        user_id: state.user_id,
        current_streak: current,
        longest_streak: state.longest_streak.max(current),
        last_completion_date: Some(today),
    };
    (next, change)
}

//=========================================================================================
// Progression Events
//=========================================================================================

/// Things that happened while applying a completion or a reversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressionEvent {
    XpAwarded { amount: u32, bonus: u32 },
    XpRevoked { amount: u32 },
    LevelUp { old_level: u32, new_level: u32 },
    LevelDown { old_level: u32, new_level: u32 },
    SkillLevelUp { skill: SkillCategory, old_level: u32, new_level: u32 },
    SkillLevelDown { skill: SkillCategory, old_level: u32, new_level: u32 },
    StreakStarted,
    StreakExtended { count: u32 },
    StreakReset { previous: u32 },
    TierReached { title: &'static str, bonus_percent: u32 },
}

//=========================================================================================
// Plans
//=========================================================================================

/// Tunable rules of the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressionRules {
    /// Scale awards by `streak_multiplier` instead of only displaying it.
    pub apply_streak_bonus: bool,
}

/// The full set of record changes produced by completing a quest.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionPlan {
    pub quest: Quest,
    pub experience: ExperienceTotal,
    pub streak: StreakState,
    pub streak_change: StreakChange,
    pub skill: SkillProgress,
    pub awarded_xp: u32,
    pub events: Vec<ProgressionEvent>,
}

/// The record changes produced by un-completing a quest. Streaks are never
/// rolled back.
#[derive(Debug, Clone, PartialEq)]
pub struct ReversalPlan {
    pub quest: Quest,
    pub experience: ExperienceTotal,
    pub skill: SkillProgress,
    pub revoked_xp: u32,
    pub events: Vec<ProgressionEvent>,
}

/// Plans the completion of `quest`. Returns `None` when it is already completed.
///
/// `skill` must be the progress record of `quest.category` (or its zero value).
pub fn plan_completion(
    quest: &Quest,
    experience: &ExperienceTotal,
    streak: &StreakState,
    skill: &SkillProgress,
    now: DateTime<Utc>,
    today: NaiveDate,
    rules: ProgressionRules,
) -> Option<CompletionPlan> {
    if quest.status != QuestStatus::Pending {
        return None;
    }
    debug_assert_eq!(skill.skill, quest.category);

    let mut events = Vec::new();

    let (next_streak, streak_change) = advance_streak(streak, today);
    match streak_change {
        StreakChange::Unchanged => {}
        StreakChange::Started => events.push(ProgressionEvent::StreakStarted),
        StreakChange::Extended => events.push(ProgressionEvent::StreakExtended {
            count: next_streak.current_streak,
        }),
        StreakChange::Reset { previous } => events.push(ProgressionEvent::StreakReset { previous }),
    }
    let old_tier = StreakTier::for_streak(streak.current_streak);
    let new_tier = StreakTier::for_streak(next_streak.current_streak);
    if streak_change != StreakChange::Unchanged && new_tier.min_streak > old_tier.min_streak {
        events.push(ProgressionEvent::TierReached {
            title: new_tier.title,
            bonus_percent: new_tier.bonus_percent,
        });
    }

    let awarded_xp = if rules.apply_streak_bonus {
        boosted_reward(quest.xp_reward, next_streak.current_streak)
    } else {
        quest.xp_reward
    };
    events.push(ProgressionEvent::XpAwarded {
        amount: awarded_xp,
        bonus: awarded_xp.saturating_sub(quest.xp_reward),
    });

    let next_experience = ExperienceTotal::new(
        experience.user_id,
        experience.total_xp.saturating_add(u64::from(awarded_xp)),
    );
    if next_experience.level > experience.level {
        events.push(ProgressionEvent::LevelUp {
            old_level: experience.level,
            new_level: next_experience.level,
        });
    }

    let next_skill = SkillProgress::new(
        skill.user_id,
        skill.skill,
        skill.xp.saturating_add(u64::from(awarded_xp)),
    );
    if next_skill.level > skill.level {
        events.push(ProgressionEvent::SkillLevelUp {
            skill: skill.skill,
            old_level: skill.level,
            new_level: next_skill.level,
        });
    }

    let completed = Quest {
        status: QuestStatus::Completed,
        completed_at: Some(now),
        awarded_xp: Some(awarded_xp),
        ..quest.clone()
    };

    Some(CompletionPlan {
        quest: completed,
        experience: next_experience,
        streak: next_streak,
        streak_change,
        skill: next_skill,
        awarded_xp,
        events,
    })
}

/// Plans un-completing `quest`. Returns `None` when it is still pending.
///
/// Removes exactly the XP the completion granted. Quests completed before
/// `awarded_xp` was recorded give back their base reward.
pub fn plan_reversal(
    quest: &Quest,
    experience: &ExperienceTotal,
    skill: &SkillProgress,
) -> Option<ReversalPlan> {
    if quest.status != QuestStatus::Completed {
        return None;
    }
    debug_assert_eq!(skill.skill, quest.category);

    let revoked_xp = quest.awarded_xp.unwrap_or(quest.xp_reward);
    let mut events = vec![ProgressionEvent::XpRevoked { amount: revoked_xp }];

    let next_experience = ExperienceTotal::new(
        experience.user_id,
        experience.total_xp.saturating_sub(u64::from(revoked_xp)),
    );
    if next_experience.level < experience.level {
        events.push(ProgressionEvent::LevelDown {
            old_level: experience.level,
            new_level: next_experience.level,
        });
    }

    let next_skill = SkillProgress::new(
        skill.user_id,
        skill.skill,
        skill.xp.saturating_sub(u64::from(revoked_xp)),
    );
    if next_skill.level < skill.level {
        events.push(ProgressionEvent::SkillLevelDown {
            skill: skill.skill,
            old_level: skill.level,
            new_level: next_skill.level,
        });
    }

    let pending = Quest {
        status: QuestStatus::Pending,
        completed_at: None,
        awarded_xp: None,
        ..quest.clone()
    };

    Some(ReversalPlan {
        quest: pending,
        experience: next_experience,
        skill: next_skill,
        revoked_xp,
        events,
    })
}
