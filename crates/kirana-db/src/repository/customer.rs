//! # Customer Repository
//!
//! SQLite storage for customers. The phone number is unique and is how a
//! bill finds an existing customer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use kirana_core::{Customer, CustomerPatch};

use super::{parse_label, CustomerStore};
use crate::error::{DbError, DbResult};

#[derive(Debug, FromRow)]
struct CustomerRow {
    id: String,
    name: String,
    phone: String,
    address: String,
    gstin: Option<String>,
    email: Option<String>,
    customer_type: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = DbError;

    fn try_from(row: CustomerRow) -> DbResult<Self> {
        Ok(Customer {
            id: row.id,
            name: row.name,
            phone: row.phone,
            address: row.address,
            gstin: row.gstin,
            email: row.email,
            customer_type: parse_label("customer", &row.customer_type)?,
            status: parse_label("customer", &row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_CUSTOMER: &str = r#"
    SELECT id, name, phone, address, gstin, email, customer_type, status, created_at, updated_at
    FROM customers
"#;

/// SQLite-backed [`CustomerStore`].
#[derive(Debug, Clone)]
pub struct SqliteCustomerRepository {
    pool: SqlitePool,
}

impl SqliteCustomerRepository {
    /// Creates a new SqliteCustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SqliteCustomerRepository { pool }
    }

    async fn fetch_one_where(&self, clause: &str, value: &str) -> DbResult<Option<Customer>> {
        let row: Option<CustomerRow> =
            sqlx::query_as(&format!("{} WHERE {} = ?1", SELECT_CUSTOMER, clause))
                .bind(value)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Customer::try_from).transpose()
    }
}

#[async_trait]
impl CustomerStore for SqliteCustomerRepository {
    async fn find_by_phone(&self, phone: &str) -> DbResult<Option<Customer>> {
        self.fetch_one_where("phone", phone).await
    }

    async fn get(&self, id: &str) -> DbResult<Option<Customer>> {
        self.fetch_one_where("id", id).await
    }

    async fn list(&self) -> DbResult<Vec<Customer>> {
        let rows: Vec<CustomerRow> =
            sqlx::query_as(&format!("{} ORDER BY name COLLATE NOCASE", SELECT_CUSTOMER))
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Customer::try_from).collect()
    }

    async fn create(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, phone = %customer.phone, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, phone, address, gstin, email,
                customer_type, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(&customer.gstin)
        .bind(&customer.email)
        .bind(customer.customer_type.as_str())
        .bind(customer.status.as_str())
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &customer.phone),
            other => other,
        })?;

        Ok(())
    }

    async fn update(&self, id: &str, patch: &CustomerPatch) -> DbResult<Customer> {
        debug!(id = %id, "Updating customer");

        let result = sqlx::query(
            "UPDATE customers SET name = ?2, address = ?3, gstin = ?4, updated_at = ?5 WHERE id = ?1",
        )
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.address)
        .bind(&patch.gstin)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use kirana_core::{CustomerSnapshot, CustomerType};

    async fn repo() -> SqliteCustomerRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        SqliteCustomerRepository::new(db.pool().clone())
    }

    fn snapshot(name: &str, phone: &str) -> CustomerSnapshot {
        CustomerSnapshot {
            name: name.to_string(),
            phone: phone.to_string(),
            address: "Ward 4".to_string(),
            gstin: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_find_by_phone() {
        let repo = repo().await;
        let customer = Customer::from_snapshot(&snapshot("Asha", "9000000001"), Utc::now());
        repo.create(&customer).await.unwrap();

        let found = repo.find_by_phone("9000000001").await.unwrap().unwrap();
        assert_eq!(found.id, customer.id);
        assert_eq!(found.customer_type, CustomerType::Retail);
        assert!(repo.find_by_phone("9000000002").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_phone_is_unique() {
        let repo = repo().await;
        let now = Utc::now();
        repo.create(&Customer::from_snapshot(&snapshot("Asha", "9000000001"), now))
            .await
            .unwrap();

        let err = repo
            .create(&Customer::from_snapshot(&snapshot("Other", "9000000001"), now))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_and_list() {
        let repo = repo().await;
        let customer = Customer::from_snapshot(&snapshot("Zoya", "9000000001"), Utc::now());
        repo.create(&customer).await.unwrap();
        repo.create(&Customer::from_snapshot(&snapshot("arun", "9000000002"), Utc::now()))
            .await
            .unwrap();

        let patch = CustomerPatch {
            name: "Zoya Khan".to_string(),
            address: "Ward 9".to_string(),
            gstin: Some("29ABCDE1234F1Z5".to_string()),
        };
        let updated = repo.update(&customer.id, &patch).await.unwrap();
        assert_eq!(updated.name, "Zoya Khan");
        assert_eq!(updated.phone, "9000000001");

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["arun", "Zoya Khan"]);

        assert!(repo.update("missing", &patch).await.unwrap_err().is_not_found());
    }
}
