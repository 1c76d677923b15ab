use crate::error::JobsiteError;
use crate::pagination::PageRequest;
use crate::repository::sqlite::{lock, QueryConditions, SharedSqliteConnection};
use crate::repository::toolbox_talk_repository::ToolboxTalkRepository;
use crate::types::{ToolboxTalk, ToolboxTalkInput};
use chrono::Utc;
use rusqlite::{named_params, params, Connection, OptionalExtension, Row};

pub struct SqliteToolboxTalkRepository {
    connection: SharedSqliteConnection,
}

const CREATE_TOOLBOX_TALK_TABLE_SQL: &str = r"
    CREATE TABLE IF NOT EXISTS toolbox_talk (
        id integer primary key autoincrement not null,
        company_id integer not null,
        title varchar(512) not null,
        topic varchar(512),
        content text not null,
        published boolean not null default 0,
        created_by integer not null,
        created_at datetime not null,
        updated_at datetime not null,
        FOREIGN KEY (company_id) REFERENCES company(id) ON DELETE CASCADE
    );
";

pub(crate) fn create_toolbox_talk_table(
    connection: &SharedSqliteConnection,
) -> Result<(), JobsiteError> {
    let conn = lock(connection)?;
    conn.execute_batch(CREATE_TOOLBOX_TALK_TABLE_SQL)?;
    Ok(())
}

const SELECT_TOOLBOX_TALK: &str = "SELECT id, company_id, title, topic, content, published, created_by, created_at, updated_at FROM toolbox_talk";

fn map_toolbox_talk(row: &Row<'_>) -> rusqlite::Result<ToolboxTalk> {
    Ok(ToolboxTalk {
        id: row.get(0)?,
        company_id: row.get(1)?,
        title: row.get(2)?,
        topic: row.get(3)?,
        content: row.get(4)?,
        published: row.get(5)?,
        created_by: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn select_toolbox_talk(
    conn: &Connection,
    company_id: i64,
    talk_id: i64,
) -> Result<Option<ToolboxTalk>, JobsiteError> {
    let talk = conn
        .query_row(
            &format!("{SELECT_TOOLBOX_TALK} WHERE id = ?1 AND company_id = ?2"),
            params![talk_id, company_id],
            map_toolbox_talk,
        )
        .optional()?;
    Ok(talk)
}

impl SqliteToolboxTalkRepository {
    pub(crate) fn new(connection: SharedSqliteConnection) -> Self {
        Self { connection }
    }
}

impl ToolboxTalkRepository for SqliteToolboxTalkRepository {
    fn insert(
        &self,
        company_id: i64,
        created_by: i64,
        input: &ToolboxTalkInput,
    ) -> Result<ToolboxTalk, JobsiteError> {
        let conn = lock(&self.connection)?;
        conn.execute(
            "INSERT INTO toolbox_talk (company_id, title, topic, content, published, created_by, created_at, updated_at)
             VALUES (:company_id, :title, :topic, :content, :published, :created_by, :now, :now)",
            named_params! {
                ":company_id": company_id,
                ":title": input.title.trim(),
                ":topic": input.topic,
                ":content": input.content,
                ":published": input.published,
                ":created_by": created_by,
                ":now": Utc::now(),
            },
        )?;
        let id = conn.last_insert_rowid();
        select_toolbox_talk(&conn, company_id, id)?
            .ok_or_else(|| JobsiteError::not_found("ToolboxTalk", id))
    }

    fn update(
        &self,
        company_id: i64,
        talk_id: i64,
        input: &ToolboxTalkInput,
    ) -> Result<Option<ToolboxTalk>, JobsiteError> {
        let conn = lock(&self.connection)?;
        let changed = conn.execute(
            "UPDATE toolbox_talk SET title = :title, topic = :topic, content = :content,
                published = :published, updated_at = :now
             WHERE id = :id AND company_id = :company_id",
            named_params! {
                ":id": talk_id,
                ":company_id": company_id,
                ":title": input.title.trim(),
                ":topic": input.topic,
                ":content": input.content,
                ":published": input.published,
                ":now": Utc::now(),
            },
        )?;
        if changed == 0 {
            return Ok(None);
        }
        select_toolbox_talk(&conn, company_id, talk_id)
    }

    fn delete(&self, company_id: i64, talk_id: i64) -> Result<bool, JobsiteError> {
        let conn = lock(&self.connection)?;
        let deleted = conn.execute(
            "DELETE FROM toolbox_talk WHERE id = ?1 AND company_id = ?2",
            params![talk_id, company_id],
        )?;
        Ok(deleted > 0)
    }

    fn find_by_id(
        &self,
        company_id: i64,
        talk_id: i64,
    ) -> Result<Option<ToolboxTalk>, JobsiteError> {
        let conn = lock(&self.connection)?;
        select_toolbox_talk(&conn, company_id, talk_id)
    }

    fn list(
        &self,
        company_id: i64,
        search: Option<&str>,
        published_only: bool,
        page: &PageRequest,
    ) -> Result<(Vec<ToolboxTalk>, i64), JobsiteError> {
        let mut conditions = QueryConditions::for_company(company_id);
        conditions.push_search(&["title", "topic"], search);
        if published_only {
            conditions.push("published = ?", true);
        }

        let conn = lock(&self.connection)?;
        let total = conditions.count(&conn, "toolbox_talk")?;
        let rows = conditions.select_page(
            &conn,
            SELECT_TOOLBOX_TALK,
            "created_at DESC, id DESC",
            page,
            map_toolbox_talk,
        )?;
        Ok((rows, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::sqlite::tests::{create_company_for_test, test_database_manager};
    use crate::types::MembershipTier;

    fn talk(title: &str, published: bool) -> ToolboxTalkInput {
        ToolboxTalkInput {
            title: title.to_string(),
            topic: Some("Safety".to_string()),
            content: "Wear a harness above two metres.".to_string(),
            published,
        }
    }

    #[test]
    fn test_published_only_hides_drafts() -> Result<(), JobsiteError> {
        let db_manager = test_database_manager()?;
        let (company, admin) = create_company_for_test(&db_manager, MembershipTier::Basic)?;
        let repo = db_manager.create_toolbox_talk_repository();
        repo.insert(company.id, admin.id, &talk("Working at height", true))?;
        let draft = repo.insert(company.id, admin.id, &talk("Ladders", false))?;

        let (_, total) = repo.list(company.id, None, false, &PageRequest::default())?;
        assert_eq!(total, 2);
        let (rows, total) = repo.list(company.id, None, true, &PageRequest::default())?;
        assert_eq!(total, 1);
        assert_eq!(rows[0].title, "Working at height");

        let published = repo
            .update(company.id, draft.id, &talk("Ladders", true))?
            .expect("talk should exist");
        assert!(published.published);
        let (_, total) = repo.list(company.id, Some("ladder"), true, &PageRequest::default())?;
        assert_eq!(total, 1);
        Ok(())
    }
}
