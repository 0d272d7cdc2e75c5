// src/services/roster.rs

use async_trait::async_trait;
use sqlx::SqlitePool;

/// Enrollment and ownership facts owned by the course-management system.
#[async_trait]
pub trait CourseRoster: Send + Sync {
    async fn is_enrolled(&self, student_id: i64, course_id: i64) -> Result<bool, sqlx::Error>;

    /// The instructor who owns the course, if the course exists.
    async fn instructor_of(&self, course_id: i64) -> Result<Option<i64>, sqlx::Error>;
}

/// Reads the roster tables shared with the course-management system.
#[derive(Clone)]
pub struct SqlCourseRoster {
    pool: SqlitePool,
}

impl SqlCourseRoster {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CourseRoster for SqlCourseRoster {
    async fn is_enrolled(&self, student_id: i64, course_id: i64) -> Result<bool, sqlx::Error> {
        let enrolled = sqlx::query_scalar::<_, i64>(
            "SELECT 1 FROM course_students WHERE course_id = ? AND student_id = ?",
        )
        .bind(course_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(enrolled.is_some())
    }

    async fn instructor_of(&self, course_id: i64) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT instructor_id FROM courses WHERE id = ?")
            .bind(course_id)
            .fetch_optional(&self.pool)
            .await
    }
}
