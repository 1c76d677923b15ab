use crate::error::JobsiteError;
use crate::pagination::PageRequest;
use crate::repository::document_repository::{DocumentRepository, NewDocument};
use crate::repository::sqlite::{lock, QueryConditions, SharedSqliteConnection};
use crate::types::ProjectDocument;
use chrono::Utc;
use rusqlite::{named_params, params, Connection, OptionalExtension, Row};

pub struct SqliteDocumentRepository {
    connection: SharedSqliteConnection,
}

const CREATE_DOCUMENT_TABLE_SQL: &str = r"
    CREATE TABLE IF NOT EXISTS project_document (
        id integer primary key autoincrement not null,
        company_id integer not null,
        project_id integer not null,
        name varchar(1024) not null,
        category varchar(128) not null,
        url varchar(2048) not null,
        content_type varchar(256),
        size_bytes integer,
        uploaded_by integer not null,
        created_at datetime not null,
        FOREIGN KEY (company_id) REFERENCES company(id) ON DELETE CASCADE,
        FOREIGN KEY (project_id) REFERENCES project(id) ON DELETE CASCADE
    );
";

/// Creates the `project_document` table in the database.
pub(crate) fn create_document_table(
    connection: &SharedSqliteConnection,
) -> Result<(), JobsiteError> {
    let conn = lock(connection)?;
    conn.execute_batch(CREATE_DOCUMENT_TABLE_SQL)?;
    Ok(())
}

const SELECT_DOCUMENT: &str = "SELECT id, company_id, project_id, name, category, url, content_type, size_bytes, uploaded_by, created_at FROM project_document";

fn map_document(row: &Row<'_>) -> rusqlite::Result<ProjectDocument> {
    Ok(ProjectDocument {
        id: row.get(0)?,
        company_id: row.get(1)?,
        project_id: row.get(2)?,
        name: row.get(3)?,
        category: row.get(4)?,
        url: row.get(5)?,
        content_type: row.get(6)?,
        size_bytes: row.get(7)?,
        uploaded_by: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn select_document(
    conn: &Connection,
    company_id: i64,
    project_id: i64,
    document_id: i64,
) -> Result<Option<ProjectDocument>, JobsiteError> {
    let document = conn
        .query_row(
            &format!("{SELECT_DOCUMENT} WHERE id = ?1 AND project_id = ?2 AND company_id = ?3"),
            params![document_id, project_id, company_id],
            map_document,
        )
        .optional()?;
    Ok(document)
}

impl SqliteDocumentRepository {
    pub(crate) fn new(connection: SharedSqliteConnection) -> Self {
        Self { connection }
    }
}

impl DocumentRepository for SqliteDocumentRepository {
    fn insert(
        &self,
        company_id: i64,
        document: &NewDocument,
    ) -> Result<ProjectDocument, JobsiteError> {
        let conn = lock(&self.connection)?;
        conn.execute(
            "INSERT INTO project_document (
                company_id, project_id, name, category, url, content_type, size_bytes, uploaded_by, created_at
            ) VALUES (
                :company_id, :project_id, :name, :category, :url, :content_type, :size_bytes, :uploaded_by, :created_at
            )",
            named_params! {
                ":company_id": company_id,
                ":project_id": document.project_id,
                ":name": document.name,
                ":category": document.category,
                ":url": document.url,
                ":content_type": document.content_type,
                ":size_bytes": document.size_bytes,
                ":uploaded_by": document.uploaded_by,
                ":created_at": Utc::now(),
            },
        )?;
        let id = conn.last_insert_rowid();
        select_document(&conn, company_id, document.project_id, id)?
            .ok_or_else(|| JobsiteError::not_found("Document", id))
    }

    fn find_by_id(
        &self,
        company_id: i64,
        project_id: i64,
        document_id: i64,
    ) -> Result<Option<ProjectDocument>, JobsiteError> {
        let conn = lock(&self.connection)?;
        select_document(&conn, company_id, project_id, document_id)
    }

    fn list(
        &self,
        company_id: i64,
        project_id: i64,
        category: Option<&str>,
        page: &PageRequest,
    ) -> Result<(Vec<ProjectDocument>, i64), JobsiteError> {
        let mut conditions = QueryConditions::for_company(company_id);
        conditions.push("project_id = ?", project_id);
        conditions.push_opt(
            "category = ? collate nocase",
            category.map(str::trim).filter(|c| !c.is_empty()).map(String::from),
        );

        let conn = lock(&self.connection)?;
        let total = conditions.count(&conn, "project_document")?;
        let rows = conditions.select_page(
            &conn,
            SELECT_DOCUMENT,
            "created_at DESC, id DESC",
            page,
            map_document,
        )?;
        Ok((rows, total))
    }

    fn delete(
        &self,
        company_id: i64,
        project_id: i64,
        document_id: i64,
    ) -> Result<bool, JobsiteError> {
        let conn = lock(&self.connection)?;
        let deleted = conn.execute(
            "DELETE FROM project_document WHERE id = ?1 AND project_id = ?2 AND company_id = ?3",
            params![document_id, project_id, company_id],
        )?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::project_repository::ProjectRepository;
    use crate::repository::sqlite::tests::{create_company_for_test, test_database_manager};
    use crate::types::{MembershipTier, ProjectInput};

    #[test]
    fn test_documents_belong_to_one_project() -> Result<(), JobsiteError> {
        let db_manager = test_database_manager()?;
        let (company, admin) = create_company_for_test(&db_manager, MembershipTier::Basic)?;
        let projects = db_manager.create_project_repository();
        let bridge = projects.insert(
            company.id,
            &ProjectInput {
                name: "Bridge".to_string(),
                ..Default::default()
            },
        )?;
        let tower = projects.insert(
            company.id,
            &ProjectInput {
                name: "Tower".to_string(),
                ..Default::default()
            },
        )?;

        let repo = db_manager.create_document_repository();
        let plan = repo.insert(
            company.id,
            &NewDocument {
                project_id: bridge.id,
                name: "site-plan.pdf".to_string(),
                category: "drawings".to_string(),
                url: "http://localhost:8080/files/abc.pdf".to_string(),
                content_type: Some("application/pdf".to_string()),
                size_bytes: Some(1024),
                uploaded_by: admin.id,
            },
        )?;

        assert!(repo.find_by_id(company.id, tower.id, plan.id)?.is_none());
        let (rows, total) = repo.list(company.id, bridge.id, Some("Drawings"), &PageRequest::default())?;
        assert_eq!(total, 1);
        assert_eq!(rows[0].name, "site-plan.pdf");
        let (_, total) = repo.list(company.id, bridge.id, Some("permits"), &PageRequest::default())?;
        assert_eq!(total, 0);

        assert!(!repo.delete(company.id, tower.id, plan.id)?);
        assert!(repo.delete(company.id, bridge.id, plan.id)?);
        Ok(())
    }
}
