use taxdesk_core::{
    AccountingRepository, ClientUpdate, NewClient, NewTaxReturn, RepositoryError,
    TaxReturnUpdate,
};
use taxdesk_db_sqlite::SqliteRepository;
use taxdesk_db_sqlite::schema::table_names;
use tracing::debug;

use crate::cli::{ClientCommand, Command, NamedCommand, ReturnCommand};
use crate::render;

/// Perform one command and return what to print.
///
/// [`SqliteRepository::connect`] has already created any missing tables, so
/// `init` only reports what is there.
pub async fn run(
    repo: &SqliteRepository,
    command: Command,
) -> Result<String, RepositoryError> {
    debug!(?command, "running command");
    match command {
        Command::Init => {
            let tables = table_names(repo.executor()).await?;
            Ok(format!("Database ready. Tables: {}", tables.join(", ")))
        }
        Command::Preparer(cmd) => run_preparer(repo, cmd).await,
        Command::Assistant(cmd) => run_assistant(repo, cmd).await,
        Command::Client(cmd) => run_client(repo, cmd).await,
        Command::Return(cmd) => run_return(repo, cmd).await,
    }
}

async fn run_preparer(
    repo: &dyn AccountingRepository,
    command: NamedCommand,
) -> Result<String, RepositoryError> {
    Ok(match command {
        NamedCommand::Add { name } => {
            let id = repo.insert_preparer(&name).await?;
            format!("Added preparer {id}.")
        }
        NamedCommand::Get { id } => render::preparer(&repo.get_preparer(id).await?),
        NamedCommand::List => render::list(&repo.list_preparers().await?, render::preparer),
        NamedCommand::Rename { id, name } => {
            repo.update_preparer_name(id, &name).await?;
            format!("Renamed preparer {id}.")
        }
        NamedCommand::Delete { id } => {
            repo.delete_preparer(id).await?;
            format!("Deleted preparer {id}.")
        }
    })
}

async fn run_assistant(
    repo: &dyn AccountingRepository,
    command: NamedCommand,
) -> Result<String, RepositoryError> {
    Ok(match command {
        NamedCommand::Add { name } => {
            let id = repo.insert_assistant(&name).await?;
            format!("Added assistant {id}.")
        }
        NamedCommand::Get { id } => render::assistant(&repo.get_assistant(id).await?),
        NamedCommand::List => render::list(&repo.list_assistants().await?, render::assistant),
        NamedCommand::Rename { id, name } => {
            repo.update_assistant_name(id, &name).await?;
            format!("Renamed assistant {id}.")
        }
        NamedCommand::Delete { id } => {
            repo.delete_assistant(id).await?;
            format!("Deleted assistant {id}.")
        }
    })
}

async fn run_client(
    repo: &dyn AccountingRepository,
    command: ClientCommand,
) -> Result<String, RepositoryError> {
    Ok(match command {
        ClientCommand::Add(args) => {
            let id = repo
                .insert_client(&NewClient {
                    name: args.name,
                    address: args.address,
                    income: args.income,
                    preparer_id: args.preparer,
                })
                .await?;
            format!("Added client {id}.")
        }
        ClientCommand::Get { id } => render::client(&repo.get_client(id).await?),
        ClientCommand::List { preparer } => {
            let clients = match preparer {
                Some(preparer_id) => repo.list_clients_for_preparer(preparer_id).await?,
                None => repo.list_clients().await?,
            };
            render::list(&clients, render::client)
        }
        ClientCommand::Update { id, field, value } => {
            let update = ClientUpdate::parse(&field, &value)?;
            repo.update_client(id, &update).await?;
            format!("Updated {} of client {id}.", update.field().as_str())
        }
        ClientCommand::Delete { id } => {
            repo.delete_client(id).await?;
            format!("Deleted client {id}.")
        }
    })
}

async fn run_return(
    repo: &dyn AccountingRepository,
    command: ReturnCommand,
) -> Result<String, RepositoryError> {
    Ok(match command {
        ReturnCommand::Add { client_id } => {
            let id = repo
                .insert_tax_return(&NewTaxReturn::for_client(client_id))
                .await?;
            format!("Added tax return {id} for client {client_id}.")
        }
        ReturnCommand::Get { id, by_client } => {
            let tax_return = if by_client {
                repo.get_tax_return_by_client(id).await?
            } else {
                repo.get_tax_return(id).await?
            };
            render::tax_return(&tax_return)
        }
        ReturnCommand::List => render::list(&repo.list_tax_returns().await?, render::tax_return),
        ReturnCommand::Update { id, field, value } => {
            let update = TaxReturnUpdate::parse(&field, &value)?;
            repo.update_tax_return(id, &update).await?;
            format!("Updated {} of tax return {id}.", update.field().as_str())
        }
        ReturnCommand::File { id } => {
            repo.mark_filed(id).await?;
            format!("Filed tax return {id}.")
        }
        ReturnCommand::Check { id } => {
            repo.mark_checked_by_preparer(id).await?;
            format!("Tax return {id} checked by preparer.")
        }
        ReturnCommand::FileByAssistant { id } => {
            repo.mark_filed_by_assistant(id).await?;
            format!("Filed tax return {id} by assistant.")
        }
        ReturnCommand::Delete { id } => {
            repo.delete_tax_return(id).await?;
            format!("Deleted tax return {id}.")
        }
    })
}
