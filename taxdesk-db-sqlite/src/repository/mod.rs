//! SQLite-backed repositories, one per table, plus [`SqliteRepository`]
//! which bundles them behind [`AccountingRepository`].

mod client;
mod named;
mod tax_return;

use async_trait::async_trait;
use taxdesk_core::{
    AccountingRepository, Assistant, Client, ClientUpdate, DbConfig, NewClient, NewTaxReturn,
    Preparer, RepositoryError, TaxReturn, TaxReturnUpdate,
};
use tracing::debug;

pub use client::ClientRepository;
pub use named::{
    AssistantRepository, NamedRecord, NamedRepository, NamedStatements, PreparerRepository,
};
pub use tax_return::TaxReturnRepository;

use crate::executor::{QueryExecutor, Statement};
use crate::pool::ConnectionPool;
use crate::row::Row;
use crate::schema::create_schema;

pub(crate) fn not_found(
    entity: &'static str,
    id: i64,
) -> RepositoryError {
    RepositoryError::NotFound { entity, id }
}

/// Pull the generated key out of an `INSERT ... RETURNING id`.
pub(crate) fn returned_id(
    row: Option<Row>,
    statement: &Statement,
) -> Result<i64, RepositoryError> {
    row.ok_or_else(|| {
        RepositoryError::Decode(format!("'{}' returned no id", statement.intent))
    })?
    .get_i64("id")
}

/// Delete one row by id in a single statement. The table's `AFTER DELETE`
/// trigger winds the AUTOINCREMENT counter back in the same transaction.
pub(crate) async fn delete_by_id(
    executor: &QueryExecutor,
    entity: &'static str,
    delete: &Statement,
    id: i64,
) -> Result<(), RepositoryError> {
    if executor.write(delete, &[id.into()]).await? == 0 {
        return Err(not_found(entity, id));
    }
    debug!(entity, id, "deleted");
    Ok(())
}

/// Every table's repository over one shared pool.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    executor: QueryExecutor,
    preparers: PreparerRepository,
    assistants: AssistantRepository,
    clients: ClientRepository,
    tax_returns: TaxReturnRepository,
}

impl SqliteRepository {
    /// Open the pool described by `config` and make sure the schema exists.
    pub async fn connect(config: &DbConfig) -> Result<Self, RepositoryError> {
        let pool = ConnectionPool::connect(config).await?;
        let repo = Self::new_with_pool(pool);
        create_schema(&repo.executor).await?;
        Ok(repo)
    }

    /// Wrap an existing pool. The schema is left as it is.
    pub fn new_with_pool(pool: ConnectionPool) -> Self {
        let executor = QueryExecutor::new(pool);
        Self {
            preparers: PreparerRepository::new(executor.clone()),
            assistants: AssistantRepository::new(executor.clone()),
            clients: ClientRepository::new(executor.clone()),
            tax_returns: TaxReturnRepository::new(executor.clone()),
            executor,
        }
    }

    pub fn pool(&self) -> &ConnectionPool {
        self.executor.pool()
    }

    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    pub fn preparers(&self) -> &PreparerRepository {
        &self.preparers
    }

    pub fn assistants(&self) -> &AssistantRepository {
        &self.assistants
    }

    pub fn clients(&self) -> &ClientRepository {
        &self.clients
    }

    pub fn tax_returns(&self) -> &TaxReturnRepository {
        &self.tax_returns
    }

    pub async fn shutdown(&self) {
        self.executor.pool().shutdown().await;
    }
}

#[async_trait]
impl AccountingRepository for SqliteRepository {
    async fn insert_preparer(
        &self,
        name: &str,
    ) -> Result<i64, RepositoryError> {
        self.preparers.insert(name).await
    }

    async fn get_preparer(
        &self,
        id: i64,
    ) -> Result<Preparer, RepositoryError> {
        self.preparers.get(id).await
    }

    async fn list_preparers(&self) -> Result<Vec<Preparer>, RepositoryError> {
        self.preparers.list().await
    }

    async fn update_preparer_name(
        &self,
        id: i64,
        new_name: &str,
    ) -> Result<(), RepositoryError> {
        self.preparers.update_name(id, new_name).await
    }

    async fn delete_preparer(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        self.preparers.delete(id).await
    }

    async fn insert_assistant(
        &self,
        name: &str,
    ) -> Result<i64, RepositoryError> {
        self.assistants.insert(name).await
    }

    async fn get_assistant(
        &self,
        id: i64,
    ) -> Result<Assistant, RepositoryError> {
        self.assistants.get(id).await
    }

    async fn list_assistants(&self) -> Result<Vec<Assistant>, RepositoryError> {
        self.assistants.list().await
    }

    async fn update_assistant_name(
        &self,
        id: i64,
        new_name: &str,
    ) -> Result<(), RepositoryError> {
        self.assistants.update_name(id, new_name).await
    }

    async fn delete_assistant(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        self.assistants.delete(id).await
    }

    async fn insert_client(
        &self,
        client: &NewClient,
    ) -> Result<i64, RepositoryError> {
        self.clients.insert(client).await
    }

    async fn get_client(
        &self,
        id: i64,
    ) -> Result<Client, RepositoryError> {
        self.clients.get(id).await
    }

    async fn list_clients(&self) -> Result<Vec<Client>, RepositoryError> {
        self.clients.list().await
    }

    async fn list_clients_for_preparer(
        &self,
        preparer_id: i64,
    ) -> Result<Vec<Client>, RepositoryError> {
        self.clients.list_for_preparer(preparer_id).await
    }

    async fn update_client(
        &self,
        id: i64,
        update: &ClientUpdate,
    ) -> Result<(), RepositoryError> {
        self.clients.update_field(id, update).await
    }

    async fn delete_client(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        self.clients.delete(id).await
    }

    async fn insert_tax_return(
        &self,
        tax_return: &NewTaxReturn,
    ) -> Result<i64, RepositoryError> {
        self.tax_returns.insert(tax_return).await
    }

    async fn get_tax_return(
        &self,
        id: i64,
    ) -> Result<TaxReturn, RepositoryError> {
        self.tax_returns.get(id).await
    }

    async fn get_tax_return_by_client(
        &self,
        client_id: i64,
    ) -> Result<TaxReturn, RepositoryError> {
        self.tax_returns.get_by_client(client_id).await
    }

    async fn list_tax_returns(&self) -> Result<Vec<TaxReturn>, RepositoryError> {
        self.tax_returns.list().await
    }

    async fn update_tax_return(
        &self,
        id: i64,
        update: &TaxReturnUpdate,
    ) -> Result<(), RepositoryError> {
        self.tax_returns.update_field(id, update).await
    }

    async fn mark_filed(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        self.tax_returns.mark_filed(id).await
    }

    async fn mark_checked_by_preparer(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        self.tax_returns.mark_checked_by_preparer(id).await
    }

    async fn mark_filed_by_assistant(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        self.tax_returns.mark_filed_by_assistant(id).await
    }

    async fn delete_tax_return(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        self.tax_returns.delete(id).await
    }
}
