//! Transaction list and CRUD

use crate::client::{decode, ApiClient, ClientError, ClientResult};
use crate::fetch::normalize_list;
use crate::models::{Transaction, TransactionInput};

use super::unwrap_entity;

fn transaction_path(id: &str) -> ClientResult<String> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ClientError::validation("Transaction id is required"));
    }
    Ok(format!("/expenses/{}", urlencoding::encode(id)))
}

/// All transactions, expenses and income alike
pub async fn list(client: &ApiClient) -> ClientResult<Vec<Transaction>> {
    let value = client.get("/expenses").await?;
    normalize_list(value).into_iter().map(decode).collect()
}

pub async fn get(client: &ApiClient, id: &str) -> ClientResult<Transaction> {
    let value = client.get(&transaction_path(id)?).await?;
    decode(unwrap_entity(value))
}

/// Create an expense or an income entry, depending on `input.kind`
pub async fn create(client: &ApiClient, input: &TransactionInput) -> ClientResult<Transaction> {
    input.validate()?;

    let value = client
        .post_json(input.kind.create_path(), input.to_body())
        .await?;

    tracing::info!(kind = %input.kind, category = %input.category, "Transaction added");
    created_entity(value, input)
}

pub async fn update(
    client: &ApiClient,
    id: &str,
    input: &TransactionInput,
) -> ClientResult<Transaction> {
    input.validate()?;

    let path = transaction_path(id)?;
    let value = client.put_json(&path, input.to_body()).await?;

    tracing::info!(id, "Transaction updated");
    created_entity(value, input)
}

/// Delete a transaction. Nothing is sent unless `confirmed` is set.
pub async fn delete(client: &ApiClient, id: &str, confirmed: bool) -> ClientResult<()> {
    let path = transaction_path(id)?;
    if !confirmed {
        return Err(ClientError::validation(
            "Deletion not confirmed; nothing was deleted",
        ));
    }

    client.delete(&path).await?;
    tracing::info!(id, "Transaction deleted");
    Ok(())
}

// Some deployments answer mutations with just a message; fall back to
// what was submitted.
fn created_entity(value: serde_json::Value, input: &TransactionInput) -> ClientResult<Transaction> {
    let value = unwrap_entity(value);
    let looks_like_entity = value.get("_id").is_some() || value.get("id").is_some();

    if looks_like_entity {
        decode(value)
    } else {
        Ok(Transaction {
            id: String::new(),
            title: input.title.trim().to_string(),
            amount: input.amount,
            category: input.category.clone(),
            date: input.date.format("%Y-%m-%d").to_string(),
            description: input.description.clone(),
            kind: Some(input.kind),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionKind;
    use chrono::NaiveDate;
    use serde_json::json;

    fn input() -> TransactionInput {
        TransactionInput {
            title: "Bus pass".into(),
            amount: 30.0,
            kind: TransactionKind::Expense,
            category: "Transport".into(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            description: Some("monthly".into()),
        }
    }

    #[test]
    fn test_transaction_path_encodes_id() {
        assert_eq!(transaction_path("abc123").unwrap(), "/expenses/abc123");
        assert_eq!(transaction_path("a/b").unwrap(), "/expenses/a%2Fb");
        assert!(matches!(
            transaction_path("  "),
            Err(ClientError::Validation(_))
        ));
    }

    #[test]
    fn test_created_entity_prefers_backend_document() {
        let tx = created_entity(
            json!({ "_id": "9", "title": "Bus pass", "amount": 30, "category": "Transport" }),
            &input(),
        )
        .unwrap();
        assert_eq!(tx.id, "9");
    }

    #[test]
    fn test_created_entity_falls_back_to_input() {
        let tx = created_entity(json!({ "message": "Expense added" }), &input()).unwrap();
        assert_eq!(tx.id, "");
        assert_eq!(tx.kind(), TransactionKind::Expense);
        assert_eq!(tx.date, "2024-05-01");
    }
}
