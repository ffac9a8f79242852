pub mod clock;
pub mod domain;
pub mod memory;
pub mod ports;
pub mod progression;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::{
    CharacterClass, ExperienceTotal, NewQuest, Profile, ProfileFields, Quest, QuestStatus,
    Reflection, SkillCategory, SkillProgress, StreakState, UnknownCharacterClass,
    UnknownQuestStatus, UnknownSkillCategory, DEFAULT_AVATAR_EMOJI, DEFAULT_XP_REWARD,
};
pub use memory::MemoryStore;
pub use ports::{
    CommitOutcome, GuardedWrite, PortError, PortResult, ProfileRepository, ProgressionCommit,
    ProgressionStore, QuestRepository, QuestTransition, ReflectionRepository,
};
pub use progression::{
    LevelProgress, ProgressionEvent, ProgressionRules, StreakChange, StreakStatus, StreakTier,
};
pub use service::{ProgressionOutcome, ProgressionService, UserStats};
