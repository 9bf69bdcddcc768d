use std::marker::PhantomData;

use taxdesk_core::{Assistant, Preparer, RepositoryError};

use super::{delete_by_id, not_found, returned_id};
use crate::executor::{QueryExecutor, Statement};
use crate::row::Row;

/// Statements for a table holding nothing but an id and a name.
#[derive(Debug)]
pub struct NamedStatements {
    pub entity: &'static str,
    pub insert: Statement,
    pub get: Statement,
    pub list: Statement,
    pub update_name: Statement,
    pub delete: Statement,
}

/// A record stored in an id + name table.
pub trait NamedRecord: Sized {
    const STATEMENTS: NamedStatements;

    fn from_parts(
        id: i64,
        name: String,
    ) -> Self;

    fn from_row(row: &Row) -> Result<Self, RepositoryError> {
        Ok(Self::from_parts(row.get_i64("id")?, row.get_string("name")?))
    }
}

impl NamedRecord for Preparer {
    const STATEMENTS: NamedStatements = NamedStatements {
        entity: "preparer",
        insert: Statement::new(
            "insert preparer",
            "INSERT INTO preparers (name) VALUES (?) RETURNING id",
        ),
        get: Statement::new("get preparer", "SELECT id, name FROM preparers WHERE id = ?"),
        list: Statement::new("list preparers", "SELECT id, name FROM preparers ORDER BY id"),
        update_name: Statement::new(
            "rename preparer",
            "UPDATE preparers SET name = ? WHERE id = ?",
        ),
        delete: Statement::new("delete preparer", "DELETE FROM preparers WHERE id = ?"),
    };

    fn from_parts(
        id: i64,
        name: String,
    ) -> Self {
        Preparer { id, name }
    }
}

impl NamedRecord for Assistant {
    const STATEMENTS: NamedStatements = NamedStatements {
        entity: "assistant",
        insert: Statement::new(
            "insert assistant",
            "INSERT INTO assistants (name) VALUES (?) RETURNING id",
        ),
        get: Statement::new("get assistant", "SELECT id, name FROM assistants WHERE id = ?"),
        list: Statement::new("list assistants", "SELECT id, name FROM assistants ORDER BY id"),
        update_name: Statement::new(
            "rename assistant",
            "UPDATE assistants SET name = ? WHERE id = ?",
        ),
        delete: Statement::new("delete assistant", "DELETE FROM assistants WHERE id = ?"),
    };

    fn from_parts(
        id: i64,
        name: String,
    ) -> Self {
        Assistant { id, name }
    }
}

/// CRUD for one id + name table.
#[derive(Debug, Clone)]
pub struct NamedRepository<T> {
    executor: QueryExecutor,
    _record: PhantomData<fn() -> T>,
}

pub type PreparerRepository = NamedRepository<Preparer>;
pub type AssistantRepository = NamedRepository<Assistant>;

impl<T: NamedRecord> NamedRepository<T> {
    pub fn new(executor: QueryExecutor) -> Self {
        Self {
            executor,
            _record: PhantomData,
        }
    }

    pub async fn insert(
        &self,
        name: &str,
    ) -> Result<i64, RepositoryError> {
        let statement = &T::STATEMENTS.insert;
        let row = self.executor.fetch_one(statement, &[name.into()]).await?;
        returned_id(row, statement)
    }

    pub async fn get(
        &self,
        id: i64,
    ) -> Result<T, RepositoryError> {
        self.executor
            .fetch_one(&T::STATEMENTS.get, &[id.into()])
            .await?
            .ok_or_else(|| not_found(T::STATEMENTS.entity, id))
            .and_then(|row| T::from_row(&row))
    }

    pub async fn list(&self) -> Result<Vec<T>, RepositoryError> {
        self.executor
            .fetch_all(&T::STATEMENTS.list, &[])
            .await?
            .iter()
            .map(T::from_row)
            .collect()
    }

    pub async fn update_name(
        &self,
        id: i64,
        new_name: &str,
    ) -> Result<(), RepositoryError> {
        let changed = self
            .executor
            .write(&T::STATEMENTS.update_name, &[new_name.into(), id.into()])
            .await?;
        if changed == 0 {
            return Err(not_found(T::STATEMENTS.entity, id));
        }
        Ok(())
    }

    pub async fn delete(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let statements = &T::STATEMENTS;
        delete_by_id(&self.executor, statements.entity, &statements.delete, id).await
    }
}
