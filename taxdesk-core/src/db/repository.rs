use async_trait::async_trait;

use super::error::RepositoryError;
use crate::models::{
    Assistant, Client, ClientUpdate, NewClient, NewTaxReturn, Preparer, TaxReturn,
    TaxReturnUpdate,
};

/// Every operation the presentation layer may perform against the store.
///
/// Each call is its own unit of work: it either commits completely or fails
/// without leaving a partial write behind.
#[async_trait]
pub trait AccountingRepository: Send + Sync {
    // Preparers
    async fn insert_preparer(&self, name: &str) -> Result<i64, RepositoryError>;
    async fn get_preparer(&self, id: i64) -> Result<Preparer, RepositoryError>;
    async fn list_preparers(&self) -> Result<Vec<Preparer>, RepositoryError>;
    async fn update_preparer_name(&self, id: i64, name: &str) -> Result<(), RepositoryError>;
    async fn delete_preparer(&self, id: i64) -> Result<(), RepositoryError>;

    // Assistants
    async fn insert_assistant(&self, name: &str) -> Result<i64, RepositoryError>;
    async fn get_assistant(&self, id: i64) -> Result<Assistant, RepositoryError>;
    async fn list_assistants(&self) -> Result<Vec<Assistant>, RepositoryError>;
    async fn update_assistant_name(&self, id: i64, name: &str) -> Result<(), RepositoryError>;
    async fn delete_assistant(&self, id: i64) -> Result<(), RepositoryError>;

    // Clients
    async fn insert_client(&self, client: &NewClient) -> Result<i64, RepositoryError>;
    async fn get_client(&self, id: i64) -> Result<Client, RepositoryError>;
    async fn list_clients(&self) -> Result<Vec<Client>, RepositoryError>;
    async fn list_clients_for_preparer(
        &self,
        preparer_id: i64,
    ) -> Result<Vec<Client>, RepositoryError>;
    async fn update_client(&self, id: i64, update: &ClientUpdate) -> Result<(), RepositoryError>;
    async fn delete_client(&self, id: i64) -> Result<(), RepositoryError>;

    // Tax returns
    async fn insert_tax_return(&self, tax_return: &NewTaxReturn) -> Result<i64, RepositoryError>;
    async fn get_tax_return(&self, id: i64) -> Result<TaxReturn, RepositoryError>;
    async fn get_tax_return_by_client(&self, client_id: i64)
    -> Result<TaxReturn, RepositoryError>;
    async fn list_tax_returns(&self) -> Result<Vec<TaxReturn>, RepositoryError>;
    async fn update_tax_return(
        &self,
        id: i64,
        update: &TaxReturnUpdate,
    ) -> Result<(), RepositoryError>;
    async fn mark_filed(&self, id: i64) -> Result<(), RepositoryError>;
    async fn mark_checked_by_preparer(&self, id: i64) -> Result<(), RepositoryError>;
    /// Files the return on behalf of an assistant. Always clears
    /// `checked_by_preparer`, so the preparer has to review it again.
    async fn mark_filed_by_assistant(&self, id: i64) -> Result<(), RepositoryError>;
    async fn delete_tax_return(&self, id: i64) -> Result<(), RepositoryError>;
}
