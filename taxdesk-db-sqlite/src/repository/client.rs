use taxdesk_core::{Client, ClientUpdate, INCOME_SCALE, NewClient, RepositoryError};

use super::{delete_by_id, not_found, returned_id};
use crate::executor::{QueryExecutor, Statement};
use crate::row::{Row, SqlValue};

const ENTITY: &str = "client";

const INSERT: Statement = Statement::new(
    "insert client",
    "INSERT INTO clients (name, address, income, preparer_id)
     VALUES (?, ?, ?, ?)
     RETURNING id",
);

const GET: Statement = Statement::new(
    "get client",
    "SELECT id, name, address, income, materials_submitted, preparer_id
     FROM clients
     WHERE id = ?",
);

const LIST: Statement = Statement::new(
    "list clients",
    "SELECT id, name, address, income, materials_submitted, preparer_id
     FROM clients
     ORDER BY id",
);

const LIST_FOR_PREPARER: Statement = Statement::new(
    "list clients for preparer",
    "SELECT id, name, address, income, materials_submitted, preparer_id
     FROM clients
     WHERE preparer_id = ?
     ORDER BY id",
);

const UPDATE_NAME: Statement =
    Statement::new("update client name", "UPDATE clients SET name = ? WHERE id = ?");
const UPDATE_ADDRESS: Statement =
    Statement::new("update client address", "UPDATE clients SET address = ? WHERE id = ?");
const UPDATE_INCOME: Statement =
    Statement::new("update client income", "UPDATE clients SET income = ? WHERE id = ?");
const UPDATE_MATERIALS_SUBMITTED: Statement = Statement::new(
    "update client materials_submitted",
    "UPDATE clients SET materials_submitted = ? WHERE id = ?",
);
const UPDATE_PREPARER_ID: Statement = Statement::new(
    "update client preparer_id",
    "UPDATE clients SET preparer_id = ? WHERE id = ?",
);

const DELETE: Statement = Statement::new("delete client", "DELETE FROM clients WHERE id = ?");

fn row_to_client(row: &Row) -> Result<Client, RepositoryError> {
    Ok(Client {
        id: row.get_i64("id")?,
        name: row.get_string("name")?,
        address: row.get_optional_string("address")?,
        income: row.get_optional_decimal("income")?.map(|mut income| {
            income.rescale(INCOME_SCALE);
            income
        }),
        materials_submitted: row.get_bool("materials_submitted")?,
        preparer_id: row.get_optional_i64("preparer_id")?,
    })
}

/// The statement that changes exactly the column named by `update`, and the
/// value to bind for it.
fn update_statement(update: &ClientUpdate) -> (&'static Statement, SqlValue) {
    match update {
        ClientUpdate::Name(name) => (&UPDATE_NAME, name.as_str().into()),
        ClientUpdate::Address(address) => (&UPDATE_ADDRESS, address.clone().into()),
        ClientUpdate::Income(income) => (&UPDATE_INCOME, (*income).into()),
        ClientUpdate::MaterialsSubmitted(submitted) => {
            (&UPDATE_MATERIALS_SUBMITTED, (*submitted).into())
        }
        ClientUpdate::PreparerId(preparer_id) => (&UPDATE_PREPARER_ID, (*preparer_id).into()),
    }
}

#[derive(Debug, Clone)]
pub struct ClientRepository {
    executor: QueryExecutor,
}

impl ClientRepository {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    /// New clients always start with `materials_submitted = false`.
    pub async fn insert(
        &self,
        client: &NewClient,
    ) -> Result<i64, RepositoryError> {
        client.validate()?;
        let params: [SqlValue; 4] = [
            client.name.as_str().into(),
            client.address.as_deref().into(),
            client.income.into(),
            client.preparer_id.into(),
        ];
        let row = self.executor.fetch_one(&INSERT, &params).await?;
        returned_id(row, &INSERT)
    }

    pub async fn get(
        &self,
        id: i64,
    ) -> Result<Client, RepositoryError> {
        self.executor
            .fetch_one(&GET, &[id.into()])
            .await?
            .ok_or_else(|| not_found(ENTITY, id))
            .and_then(|row| row_to_client(&row))
    }

    pub async fn list(&self) -> Result<Vec<Client>, RepositoryError> {
        self.executor
            .fetch_all(&LIST, &[])
            .await?
            .iter()
            .map(row_to_client)
            .collect()
    }

    pub async fn list_for_preparer(
        &self,
        preparer_id: i64,
    ) -> Result<Vec<Client>, RepositoryError> {
        self.executor
            .fetch_all(&LIST_FOR_PREPARER, &[preparer_id.into()])
            .await?
            .iter()
            .map(row_to_client)
            .collect()
    }

    pub async fn update_field(
        &self,
        id: i64,
        update: &ClientUpdate,
    ) -> Result<(), RepositoryError> {
        update.validate()?;
        let (statement, value) = update_statement(update);
        if self.executor.write(statement, &[value, id.into()]).await? == 0 {
            return Err(not_found(ENTITY, id));
        }
        Ok(())
    }

    pub async fn delete(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        delete_by_id(&self.executor, ENTITY, &DELETE, id).await
    }
}
