//! Orders commands

use anyhow::Result;

use super::ApiClient;
use crate::{output::OutputFormat, OrderCommands};

const COLUMNS: &[&str] = &["id", "customer_name", "customer_email", "raynet_id", "erp_id"];

pub async fn handle(action: OrderCommands, client: &ApiClient, format: OutputFormat) -> Result<()> {
    match action {
        OrderCommands::List { page } => {
            let query: Vec<_> = page.map(|p| ("page", p.to_string())).into_iter().collect();
            let orders = client.get("/orders", &query).await?;
            format.print_list(&orders, COLUMNS);
        }
        OrderCommands::Get { id } => {
            let order = client.get(&format!("/orders/{id}"), &[]).await?;
            format.print_item(&order);
        }
    }
    Ok(())
}
