use chrono::Utc;
use taxdesk_core::{
    ConstraintKind, DomainViolation, NewTaxReturn, RepositoryError, TaxReturn, TaxReturnUpdate,
};
use tracing::{info, warn};

use super::{delete_by_id, not_found, returned_id};
use crate::executor::{QueryExecutor, Statement};
use crate::row::{Row, SqlValue};

const ENTITY: &str = "tax return";
const ENTITY_BY_CLIENT: &str = "tax return for client";

const INSERT: Statement = Statement::new(
    "insert tax return",
    "INSERT INTO tax_returns
        (client_id, status, filing_timestamp, checked_by_preparer, filed_by_assistant)
     VALUES (?, ?, ?, ?, ?)
     RETURNING id",
);

const GET: Statement = Statement::new(
    "get tax return",
    "SELECT id, client_id, status, filing_timestamp, checked_by_preparer, filed_by_assistant
     FROM tax_returns
     WHERE id = ?",
);

const GET_BY_CLIENT: Statement = Statement::new(
    "get tax return by client",
    "SELECT id, client_id, status, filing_timestamp, checked_by_preparer, filed_by_assistant
     FROM tax_returns
     WHERE client_id = ?",
);

const LIST: Statement = Statement::new(
    "list tax returns",
    "SELECT id, client_id, status, filing_timestamp, checked_by_preparer, filed_by_assistant
     FROM tax_returns
     ORDER BY id",
);

const UPDATE_STATUS: Statement = Statement::new(
    "update tax return status",
    "UPDATE tax_returns SET status = ? WHERE id = ?",
);
const UPDATE_FILING_TIMESTAMP: Statement = Statement::new(
    "update tax return filing_timestamp",
    "UPDATE tax_returns SET filing_timestamp = ? WHERE id = ?",
);
const UPDATE_CHECKED_BY_PREPARER: Statement = Statement::new(
    "update tax return checked_by_preparer",
    "UPDATE tax_returns SET checked_by_preparer = ? WHERE id = ?",
);
const UPDATE_FILED_BY_ASSISTANT: Statement = Statement::new(
    "update tax return filed_by_assistant",
    "UPDATE tax_returns SET filed_by_assistant = ? WHERE id = ?",
);

const MARK_FILED: Statement = Statement::new(
    "mark tax return filed",
    "UPDATE tax_returns SET status = TRUE, filing_timestamp = ? WHERE id = ?",
);

const MARK_CHECKED_BY_PREPARER: Statement = Statement::new(
    "mark tax return checked by preparer",
    "UPDATE tax_returns SET checked_by_preparer = TRUE WHERE id = ?",
);

// Filing by an assistant invalidates any earlier preparer check.
const MARK_FILED_BY_ASSISTANT: Statement = Statement::new(
    "mark tax return filed by assistant",
    "UPDATE tax_returns
     SET status = TRUE,
         filing_timestamp = ?,
         filed_by_assistant = TRUE,
         checked_by_preparer = FALSE
     WHERE id = ?",
);

const DELETE: Statement =
    Statement::new("delete tax return", "DELETE FROM tax_returns WHERE id = ?");

fn row_to_tax_return(row: &Row) -> Result<TaxReturn, RepositoryError> {
    Ok(TaxReturn {
        id: row.get_i64("id")?,
        client_id: row.get_i64("client_id")?,
        status: row.get_bool("status")?,
        filing_timestamp: row.get_optional_timestamp("filing_timestamp")?,
        checked_by_preparer: row.get_bool("checked_by_preparer")?,
        filed_by_assistant: row.get_bool("filed_by_assistant")?,
    })
}

fn update_statement(update: &TaxReturnUpdate) -> (&'static Statement, SqlValue) {
    match update {
        TaxReturnUpdate::Status(filed) => (&UPDATE_STATUS, (*filed).into()),
        TaxReturnUpdate::FilingTimestamp(at) => (&UPDATE_FILING_TIMESTAMP, (*at).into()),
        TaxReturnUpdate::CheckedByPreparer(checked) => {
            (&UPDATE_CHECKED_BY_PREPARER, (*checked).into())
        }
        TaxReturnUpdate::FiledByAssistant(filed) => (&UPDATE_FILED_BY_ASSISTANT, (*filed).into()),
    }
}

#[derive(Debug, Clone)]
pub struct TaxReturnRepository {
    executor: QueryExecutor,
}

impl TaxReturnRepository {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    /// A client has at most one return. A second insert for the same client
    /// fails with [`DomainViolation::DuplicateTaxReturn`] and writes nothing.
    pub async fn insert(
        &self,
        tax_return: &NewTaxReturn,
    ) -> Result<i64, RepositoryError> {
        let params: [SqlValue; 5] = [
            tax_return.client_id.into(),
            tax_return.status.into(),
            tax_return.filing_timestamp.into(),
            tax_return.checked_by_preparer.into(),
            tax_return.filed_by_assistant.into(),
        ];
        match self.executor.fetch_one(&INSERT, &params).await {
            Ok(row) => returned_id(row, &INSERT),
            Err(err) if err.is_constraint(ConstraintKind::Unique) => {
                warn!(client_id = tax_return.client_id, "client already has a tax return");
                Err(DomainViolation::DuplicateTaxReturn {
                    client_id: tax_return.client_id,
                }
                .into())
            }
            Err(err) => Err(err),
        }
    }

    pub async fn get(
        &self,
        id: i64,
    ) -> Result<TaxReturn, RepositoryError> {
        self.executor
            .fetch_one(&GET, &[id.into()])
            .await?
            .ok_or_else(|| not_found(ENTITY, id))
            .and_then(|row| row_to_tax_return(&row))
    }

    /// When the client has no return, `NotFound` names the client id.
    pub async fn get_by_client(
        &self,
        client_id: i64,
    ) -> Result<TaxReturn, RepositoryError> {
        self.executor
            .fetch_one(&GET_BY_CLIENT, &[client_id.into()])
            .await?
            .ok_or_else(|| not_found(ENTITY_BY_CLIENT, client_id))
            .and_then(|row| row_to_tax_return(&row))
    }

    pub async fn list(&self) -> Result<Vec<TaxReturn>, RepositoryError> {
        self.executor
            .fetch_all(&LIST, &[])
            .await?
            .iter()
            .map(row_to_tax_return)
            .collect()
    }

    pub async fn update_field(
        &self,
        id: i64,
        update: &TaxReturnUpdate,
    ) -> Result<(), RepositoryError> {
        let (statement, value) = update_statement(update);
        self.write_one(statement, &[value, id.into()], id).await
    }

    pub async fn mark_filed(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        self.write_one(&MARK_FILED, &[Utc::now().into(), id.into()], id)
            .await?;
        info!(id, "tax return filed");
        Ok(())
    }

    pub async fn mark_checked_by_preparer(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        self.write_one(&MARK_CHECKED_BY_PREPARER, &[id.into()], id)
            .await
    }

    /// File the return on behalf of an assistant. Whatever the prior state,
    /// afterwards `status` and `filed_by_assistant` are set, the timestamp
    /// is now, and `checked_by_preparer` is cleared.
    pub async fn mark_filed_by_assistant(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        self.write_one(&MARK_FILED_BY_ASSISTANT, &[Utc::now().into(), id.into()], id)
            .await?;
        info!(id, "tax return filed by assistant");
        Ok(())
    }

    pub async fn delete(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError> {
        delete_by_id(&self.executor, ENTITY, &DELETE, id).await
    }

    async fn write_one(
        &self,
        statement: &Statement,
        params: &[SqlValue],
        id: i64,
    ) -> Result<(), RepositoryError> {
        if self.executor.write(statement, params).await? == 0 {
            return Err(not_found(ENTITY, id));
        }
        Ok(())
    }
}
