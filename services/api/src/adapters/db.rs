//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete implementation of
//! the persistence ports from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use quest_core::domain::{
    CharacterClass, ExperienceTotal, NewQuest, Profile, ProfileFields, Quest, QuestStatus,
    Reflection, SkillCategory, SkillProgress, StreakState,
};
use quest_core::ports::{
    check_completion_time, check_streak_bounds, CommitOutcome, PortError, PortResult,
    ProfileRepository, ProgressionCommit, ProgressionStore, QuestRepository, ReflectionRepository,
};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

const QUEST_COLUMNS: &str =
    "id, user_id, title, category, status, xp_reward, awarded_xp, completed_at, created_at";

const PROFILE_COLUMNS: &str = "id, username, character_class, avatar_emoji, mission_statement, \
     biggest_dream, daily_routine, greatest_strength, biggest_weakness, ideal_day, \
     biggest_challenge, motivation_source, created_at, updated_at";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the persistence ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// Conversions
//=========================================================================================

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Maps a unique violation on a guarded insert to a conflict.
fn insert_error(name: &str, e: sqlx::Error) -> PortError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PortError::Conflict(format!("{} was created concurrently", name))
        }
        _ => unexpected(e),
    }
}

fn to_u32(value: i32, field: &str) -> PortResult<u32> {
    u32::try_from(value).map_err(|_| PortError::Unexpected(format!("negative {} in database", field)))
}

fn to_u64(value: i64, field: &str) -> PortResult<u64> {
    u64::try_from(value).map_err(|_| PortError::Unexpected(format!("negative {} in database", field)))
}

fn to_i32(value: u32, field: &str) -> PortResult<i32> {
    i32::try_from(value).map_err(|_| PortError::InvalidInput(format!("{} out of range", field)))
}

fn to_i64(value: u64, field: &str) -> PortResult<i64> {
    i64::try_from(value).map_err(|_| PortError::InvalidInput(format!("{} out of range", field)))
}

fn parse_category(raw: &str) -> PortResult<SkillCategory> {
    raw.parse::<SkillCategory>()
        .map_err(|e| PortError::Unexpected(e.to_string()))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct QuestRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    category: String,
    status: String,
    xp_reward: i32,
    awarded_xp: Option<i32>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}
impl QuestRecord {
    fn to_domain(self) -> PortResult<Quest> {
        let status = self
            .status
            .parse::<QuestStatus>()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Quest {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            category: parse_category(&self.category)?,
            status,
            xp_reward: to_u32(self.xp_reward, "xp_reward")?,
            awarded_xp: self.awarded_xp.map(|x| to_u32(x, "awarded_xp")).transpose()?,
            completed_at: self.completed_at,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct ExperienceRecord {
    user_id: Uuid,
    total_xp: i64,
    level: i32,
}
impl ExperienceRecord {
    fn to_domain(self) -> PortResult<ExperienceTotal> {
        Ok(ExperienceTotal {
            user_id: self.user_id,
            total_xp: to_u64(self.total_xp, "total_xp")?,
            level: to_u32(self.level, "level")?,
        })
    }
}

#[derive(FromRow)]
struct StreakRecord {
    user_id: Uuid,
    current_streak: i32,
    longest_streak: i32,
    last_quest_date: Option<NaiveDate>,
}
impl StreakRecord {
    fn to_domain(self) -> PortResult<StreakState> {
        Ok(StreakState {
            user_id: self.user_id,
            current_streak: to_u32(self.current_streak, "current_streak")?,
            longest_streak: to_u32(self.longest_streak, "longest_streak")?,
            last_completion_date: self.last_quest_date,
        })
    }
}

#[derive(FromRow)]
struct SkillRecord {
    user_id: Uuid,
    skill_name: String,
    xp: i64,
    level: i32,
}
impl SkillRecord {
    fn to_domain(self) -> PortResult<SkillProgress> {
        Ok(SkillProgress {
            user_id: self.user_id,
            skill: parse_category(&self.skill_name)?,
            xp: to_u64(self.xp, "skill xp")?,
            level: to_u32(self.level, "skill level")?,
        })
    }
}

#[derive(FromRow)]
struct ReflectionRecord {
    id: Uuid,
    user_id: Uuid,
    question: String,
    answer: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl ReflectionRecord {
    fn to_domain(self) -> Reflection {
        Reflection {
            id: self.id,
            user_id: self.user_id,
            question: self.question,
            answer: self.answer,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct ProfileRecord {
    id: Uuid,
    username: String,
    character_class: String,
    avatar_emoji: String,
    mission_statement: String,
    biggest_dream: String,
    daily_routine: String,
    greatest_strength: String,
    biggest_weakness: String,
    ideal_day: String,
    biggest_challenge: String,
    motivation_source: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl ProfileRecord {
    fn to_domain(self) -> PortResult<Profile> {
        let character_class = self
            .character_class
            .parse::<CharacterClass>()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Profile {
            user_id: self.id,
            fields: ProfileFields {
                username: self.username,
                character_class,
                avatar_emoji: self.avatar_emoji,
                mission_statement: self.mission_statement,
                biggest_dream: self.biggest_dream,
                daily_routine: self.daily_routine,
                greatest_strength: self.greatest_strength,
                biggest_weakness: self.biggest_weakness,
                ideal_day: self.ideal_day,
                biggest_challenge: self.biggest_challenge,
                motivation_source: self.motivation_source,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

//=========================================================================================
// Row Helpers (shared by the plain port methods and the transactional commit)
//=========================================================================================

async fn select_experience(
    conn: &mut PgConnection,
    user_id: Uuid,
    for_update: bool,
) -> PortResult<Option<ExperienceTotal>> {
    let sql = if for_update {
        "SELECT user_id, total_xp, level FROM user_xp WHERE user_id = $1 FOR UPDATE"
    } else {
        "SELECT user_id, total_xp, level FROM user_xp WHERE user_id = $1"
    };
    sqlx::query_as::<_, ExperienceRecord>(sql)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(unexpected)?
        .map(ExperienceRecord::to_domain)
        .transpose()
}

/// `existed == false` inserts and fails with a conflict if the row appeared meanwhile.
async fn save_experience(
    conn: &mut PgConnection,
    value: &ExperienceTotal,
    existed: bool,
) -> PortResult<()> {
    let total_xp = to_i64(value.total_xp, "total_xp")?;
    let level = to_i32(value.level, "level")?;
    if existed {
        sqlx::query("UPDATE user_xp SET total_xp = $2, level = $3, updated_at = now() WHERE user_id = $1")
            .bind(value.user_id)
            .bind(total_xp)
            .bind(level)
            .execute(&mut *conn)
            .await
            .map_err(unexpected)?;
    } else {
        sqlx::query("INSERT INTO user_xp (user_id, total_xp, level) VALUES ($1, $2, $3)")
            .bind(value.user_id)
            .bind(total_xp)
            .bind(level)
            .execute(&mut *conn)
            .await
            .map_err(|e| insert_error("experience", e))?;
    }
    Ok(())
}

async fn select_streak(
    conn: &mut PgConnection,
    user_id: Uuid,
    for_update: bool,
) -> PortResult<Option<StreakState>> {
    let sql = if for_update {
        "SELECT user_id, current_streak, longest_streak, last_quest_date FROM user_streaks WHERE user_id = $1 FOR UPDATE"
    } else {
        "SELECT user_id, current_streak, longest_streak, last_quest_date FROM user_streaks WHERE user_id = $1"
    };
    sqlx::query_as::<_, StreakRecord>(sql)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(unexpected)?
        .map(StreakRecord::to_domain)
        .transpose()
}

async fn save_streak(conn: &mut PgConnection, value: &StreakState, existed: bool) -> PortResult<()> {
    let current = to_i32(value.current_streak, "current_streak")?;
    let longest = to_i32(value.longest_streak, "longest_streak")?;
    if existed {
        sqlx::query(
            "UPDATE user_streaks
             SET current_streak = $2, longest_streak = $3, last_quest_date = $4, updated_at = now()
             WHERE user_id = $1",
        )
        .bind(value.user_id)
        .bind(current)
        .bind(longest)
        .bind(value.last_completion_date)
        .execute(&mut *conn)
        .await
        .map_err(unexpected)?;
    } else {
        sqlx::query(
            "INSERT INTO user_streaks (user_id, current_streak, longest_streak, last_quest_date)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(value.user_id)
        .bind(current)
        .bind(longest)
        .bind(value.last_completion_date)
        .execute(&mut *conn)
        .await
        .map_err(|e| insert_error("streak", e))?;
    }
    Ok(())
}

async fn select_skill(
    conn: &mut PgConnection,
    user_id: Uuid,
    skill: SkillCategory,
    for_update: bool,
) -> PortResult<Option<SkillProgress>> {
    let sql = if for_update {
        "SELECT user_id, skill_name, xp, level FROM skill_progress WHERE user_id = $1 AND skill_name = $2 FOR UPDATE"
    } else {
        "SELECT user_id, skill_name, xp, level FROM skill_progress WHERE user_id = $1 AND skill_name = $2"
    };
    sqlx::query_as::<_, SkillRecord>(sql)
        .bind(user_id)
        .bind(skill.as_str())
        .fetch_optional(&mut *conn)
        .await
        .map_err(unexpected)?
        .map(SkillRecord::to_domain)
        .transpose()
}

async fn save_skill(conn: &mut PgConnection, value: &SkillProgress, existed: bool) -> PortResult<()> {
    let xp = to_i64(value.xp, "skill xp")?;
    let level = to_i32(value.level, "skill level")?;
    if existed {
        sqlx::query(
            "UPDATE skill_progress SET xp = $3, level = $4, updated_at = now()
             WHERE user_id = $1 AND skill_name = $2",
        )
        .bind(value.user_id)
        .bind(value.skill.as_str())
        .bind(xp)
        .bind(level)
        .execute(&mut *conn)
        .await
        .map_err(unexpected)?;
    } else {
        sqlx::query("INSERT INTO skill_progress (user_id, skill_name, xp, level) VALUES ($1, $2, $3, $4)")
            .bind(value.user_id)
            .bind(value.skill.as_str())
            .bind(xp)
            .bind(level)
            .execute(&mut *conn)
            .await
            .map_err(|e| insert_error("skill progress", e))?;
    }
    Ok(())
}

//=========================================================================================
// `ProgressionStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProgressionStore for DbAdapter {
    async fn read_experience(&self, user_id: Uuid) -> PortResult<Option<ExperienceTotal>> {
        let mut conn = self.pool.acquire().await.map_err(unexpected)?;
        select_experience(&mut conn, user_id, false).await
    }

    async fn write_experience(&self, user_id: Uuid, total_xp: u64, level: u32) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO user_xp (user_id, total_xp, level) VALUES ($1, $2, $3)
             ON CONFLICT (user_id) DO UPDATE
             SET total_xp = EXCLUDED.total_xp, level = EXCLUDED.level, updated_at = now()",
        )
        .bind(user_id)
        .bind(to_i64(total_xp, "total_xp")?)
        .bind(to_i32(level, "level")?)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn read_streak(&self, user_id: Uuid) -> PortResult<Option<StreakState>> {
        let mut conn = self.pool.acquire().await.map_err(unexpected)?;
        select_streak(&mut conn, user_id, false).await
    }

    async fn write_streak(
        &self,
        user_id: Uuid,
        current_streak: u32,
        longest_streak: u32,
        last_completion_date: Option<NaiveDate>,
    ) -> PortResult<()> {
        check_streak_bounds(current_streak, longest_streak)?;
        sqlx::query(
            "INSERT INTO user_streaks (user_id, current_streak, longest_streak, last_quest_date)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id) DO UPDATE
             SET current_streak = EXCLUDED.current_streak,
                 longest_streak = EXCLUDED.longest_streak,
                 last_quest_date = EXCLUDED.last_quest_date,
                 updated_at = now()",
        )
        .bind(user_id)
        .bind(to_i32(current_streak, "current_streak")?)
        .bind(to_i32(longest_streak, "longest_streak")?)
        .bind(last_completion_date)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn update_quest_status(
        &self,
        quest_id: Uuid,
        status: QuestStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> PortResult<Quest> {
        check_completion_time(status, completed_at)?;
        let sql = format!(
            "UPDATE quests
             SET status = $1, completed_at = $2,
                 awarded_xp = CASE WHEN $1 = 'pending' THEN NULL ELSE awarded_xp END
             WHERE id = $3
             RETURNING {}",
            QUEST_COLUMNS
        );
        sqlx::query_as::<_, QuestRecord>(&sql)
            .bind(status.as_str())
            .bind(completed_at)
            .bind(quest_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("Quest {} not found", quest_id)))?
            .to_domain()
    }

    async fn read_skill(
        &self,
        user_id: Uuid,
        skill: SkillCategory,
    ) -> PortResult<Option<SkillProgress>> {
        let mut conn = self.pool.acquire().await.map_err(unexpected)?;
        select_skill(&mut conn, user_id, skill, false).await
    }

    async fn write_skill(
        &self,
        user_id: Uuid,
        skill: SkillCategory,
        xp: u64,
        level: u32,
    ) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO skill_progress (user_id, skill_name, xp, level) VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, skill_name) DO UPDATE
             SET xp = EXCLUDED.xp, level = EXCLUDED.level, updated_at = now()",
        )
        .bind(user_id)
        .bind(skill.as_str())
        .bind(to_i64(xp, "skill xp")?)
        .bind(to_i32(level, "skill level")?)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn read_skills(&self, user_id: Uuid) -> PortResult<Vec<SkillProgress>> {
        let records = sqlx::query_as::<_, SkillRecord>(
            "SELECT user_id, skill_name, xp, level FROM skill_progress WHERE user_id = $1 ORDER BY skill_name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let mut skills = records
            .into_iter()
            .map(SkillRecord::to_domain)
            .collect::<PortResult<Vec<_>>>()?;
        skills.sort_by_key(|s| s.skill);
        Ok(skills)
    }

    async fn commit(&self, commit: ProgressionCommit) -> PortResult<CommitOutcome> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        let user_id = commit.user_id;
        let transition = &commit.quest;

        // The status guard turns a concurrent duplicate transition into a no-op.
        let sql = format!(
            "UPDATE quests SET status = $1, completed_at = $2, awarded_xp = $3
             WHERE id = $4 AND user_id = $5 AND status = $6
             RETURNING {}",
            QUEST_COLUMNS
        );
        let updated = sqlx::query_as::<_, QuestRecord>(&sql)
            .bind(transition.to.as_str())
            .bind(transition.completed_at)
            .bind(transition.awarded_xp.map(|x| to_i32(x, "awarded_xp")).transpose()?)
            .bind(transition.quest_id)
            .bind(user_id)
            .bind(transition.from.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(unexpected)?;
        let Some(updated) = updated else {
            let sql = format!("SELECT {} FROM quests WHERE id = $1 AND user_id = $2", QUEST_COLUMNS);
            let current = sqlx::query_as::<_, QuestRecord>(&sql)
                .bind(transition.quest_id)
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(unexpected)?
                .ok_or_else(|| PortError::NotFound(format!("Quest {} not found", transition.quest_id)))?;
            // Dropping `tx` rolls back; nothing was written.
            return Ok(CommitOutcome::Superseded(current.to_domain()?));
        };

        let experience = select_experience(&mut tx, user_id, true).await?;
        if !commit.experience.matches(experience.as_ref()) {
            return Err(PortError::Conflict("experience changed since it was read".to_string()));
        }
        save_experience(&mut tx, &commit.experience.value, experience.is_some()).await?;

        if let Some(write) = &commit.streak {
            let streak = select_streak(&mut tx, user_id, true).await?;
            if !write.matches(streak.as_ref()) {
                return Err(PortError::Conflict("streak changed since it was read".to_string()));
            }
            save_streak(&mut tx, &write.value, streak.is_some()).await?;
        }

        let skill = select_skill(&mut tx, user_id, commit.skill.value.skill, true).await?;
        if !commit.skill.matches(skill.as_ref()) {
            return Err(PortError::Conflict("skill progress changed since it was read".to_string()));
        }
        save_skill(&mut tx, &commit.skill.value, skill.is_some()).await?;

        tx.commit().await.map_err(unexpected)?;
        Ok(CommitOutcome::Applied(updated.to_domain()?))
    }
}

//=========================================================================================
// `QuestRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl QuestRepository for DbAdapter {
    async fn create_quest(&self, quest: NewQuest) -> PortResult<Quest> {
        let sql = format!(
            "INSERT INTO quests (id, user_id, title, category, xp_reward)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            QUEST_COLUMNS
        );
        sqlx::query_as::<_, QuestRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(quest.user_id)
            .bind(&quest.title)
            .bind(quest.category.as_str())
            .bind(to_i32(quest.xp_reward, "xp_reward")?)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?
            .to_domain()
    }

    async fn get_quest(&self, user_id: Uuid, quest_id: Uuid) -> PortResult<Quest> {
        let sql = format!("SELECT {} FROM quests WHERE id = $1 AND user_id = $2", QUEST_COLUMNS);
        sqlx::query_as::<_, QuestRecord>(&sql)
            .bind(quest_id)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => PortError::NotFound(format!("Quest {} not found", quest_id)),
                _ => unexpected(e),
            })?
            .to_domain()
    }

    async fn list_quests(&self, user_id: Uuid) -> PortResult<Vec<Quest>> {
        let sql = format!(
            "SELECT {} FROM quests WHERE user_id = $1 ORDER BY created_at DESC",
            QUEST_COLUMNS
        );
        let records = sqlx::query_as::<_, QuestRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        records.into_iter().map(QuestRecord::to_domain).collect()
    }
}

//=========================================================================================
// `ReflectionRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl ReflectionRepository for DbAdapter {
    async fn list_reflections(&self, user_id: Uuid) -> PortResult<Vec<Reflection>> {
        let records = sqlx::query_as::<_, ReflectionRecord>(
            "SELECT id, user_id, question, answer, created_at, updated_at
             FROM reflections WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let reflections = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(reflections)
    }

    async fn create_reflection(
        &self,
        user_id: Uuid,
        question: &str,
        answer: &str,
    ) -> PortResult<Reflection> {
        let record = sqlx::query_as::<_, ReflectionRecord>(
            "INSERT INTO reflections (id, user_id, question, answer) VALUES ($1, $2, $3, $4)
             RETURNING id, user_id, question, answer, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(question)
        .bind(answer)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn update_reflection(
        &self,
        user_id: Uuid,
        reflection_id: Uuid,
        answer: &str,
    ) -> PortResult<Reflection> {
        let record = sqlx::query_as::<_, ReflectionRecord>(
            "UPDATE reflections SET answer = $1, updated_at = now()
             WHERE id = $2 AND user_id = $3
             RETURNING id, user_id, question, answer, created_at, updated_at",
        )
        .bind(answer)
        .bind(reflection_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Reflection {} not found", reflection_id)))?;
        Ok(record.to_domain())
    }
}

//=========================================================================================
// `ProfileRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProfileRepository for DbAdapter {
    async fn get_profile(&self, user_id: Uuid) -> PortResult<Option<Profile>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", PROFILE_COLUMNS);
        sqlx::query_as::<_, ProfileRecord>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .map(ProfileRecord::to_domain)
            .transpose()
    }

    async fn save_profile(&self, user_id: Uuid, fields: ProfileFields) -> PortResult<Profile> {
        let sql = format!(
            "INSERT INTO users (id, username, character_class, avatar_emoji, mission_statement,
                                biggest_dream, daily_routine, greatest_strength, biggest_weakness,
                                ideal_day, biggest_challenge, motivation_source)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             ON CONFLICT (id) DO UPDATE
             SET username = EXCLUDED.username,
                 character_class = EXCLUDED.character_class,
                 avatar_emoji = EXCLUDED.avatar_emoji,
                 mission_statement = EXCLUDED.mission_statement,
                 biggest_dream = EXCLUDED.biggest_dream,
                 daily_routine = EXCLUDED.daily_routine,
                 greatest_strength = EXCLUDED.greatest_strength,
                 biggest_weakness = EXCLUDED.biggest_weakness,
                 ideal_day = EXCLUDED.ideal_day,
                 biggest_challenge = EXCLUDED.biggest_challenge,
                 motivation_source = EXCLUDED.motivation_source,
                 updated_at = now()
             RETURNING {}",
            PROFILE_COLUMNS
        );
        sqlx::query_as::<_, ProfileRecord>(&sql)
            .bind(user_id)
            .bind(&fields.username)
            .bind(fields.character_class.as_str())
            .bind(&fields.avatar_emoji)
            .bind(&fields.mission_statement)
            .bind(&fields.biggest_dream)
            .bind(&fields.daily_routine)
            .bind(&fields.greatest_strength)
            .bind(&fields.biggest_weakness)
            .bind(&fields.ideal_day)
            .bind(&fields.biggest_challenge)
            .bind(&fields.motivation_source)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?
            .to_domain()
    }
}
