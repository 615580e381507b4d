//! JSON wire types for the ledger REST surface.
//!
//! DTOs mirror the server payloads field for field. Conversions into model
//! records validate identities and mark the result clean.

use crate::error::{ProtocolError, ProtocolResult};
use crate::id::RecordId;
use crate::model::{Account, Category, Transaction};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn server_key(entity: &'static str, id: i64) -> ProtocolResult<u64> {
    if id > 0 {
        Ok(id as u64)
    } else {
        Err(ProtocolError::InvalidIdentity { entity, id })
    }
}

/// Account as reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountDto {
    /// Server id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Balance.
    pub balance: Decimal,
    /// Currency code.
    pub currency: String,
    /// Last server-side modification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AccountDto {
    /// Converts into a clean local record, stamped with the server's
    /// modification time or `synced_at` when the server reports none.
    pub fn into_model(self, synced_at: DateTime<Utc>) -> ProtocolResult<Account> {
        Ok(Account {
            id: RecordId::Confirmed(server_key("account", self.id)?),
            name: self.name,
            balance: self.balance,
            currency: self.currency,
            dirty: false,
            modified_at: self.updated_at.unwrap_or(synced_at),
        })
    }
}

/// Body of `PUT /accounts/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountUpdateRequest {
    /// Display name.
    pub name: String,
    /// Balance.
    pub balance: Decimal,
    /// Currency code.
    pub currency: String,
}

impl From<&Account> for AccountUpdateRequest {
    fn from(account: &Account) -> Self {
        Self {
            name: account.name.clone(),
            balance: account.balance,
            currency: account.currency.clone(),
        }
    }
}

/// Category as reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDto {
    /// Server id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Optional glyph.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    /// Income or expense.
    pub is_income: bool,
}

impl TryFrom<CategoryDto> for Category {
    type Error = ProtocolError;

    fn try_from(dto: CategoryDto) -> ProtocolResult<Self> {
        Ok(Category {
            id: server_key("category", dto.id)?,
            name: dto.name,
            emoji: dto.emoji,
            is_income: dto.is_income,
        })
    }
}

impl From<&Category> for CategoryDto {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id as i64,
            name: category.name.clone(),
            emoji: category.emoji.clone(),
            is_income: category.is_income,
        }
    }
}

/// Transaction as reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDto {
    /// Server id.
    pub id: i64,
    /// Owning account.
    pub account_id: i64,
    /// Optional category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    /// Amount.
    pub amount: Decimal,
    /// Optional note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Occurrence time.
    pub transaction_date: DateTime<Utc>,
    /// Last server-side modification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TransactionDto {
    /// Converts into a clean local record. See [`AccountDto::into_model`].
    pub fn into_model(self, synced_at: DateTime<Utc>) -> ProtocolResult<Transaction> {
        Ok(Transaction {
            id: RecordId::Confirmed(server_key("transaction", self.id)?),
            account_id: server_key("account", self.account_id)?,
            category_id: self
                .category_id
                .map(|id| server_key("category", id))
                .transpose()?,
            amount: self.amount,
            comment: self.comment,
            occurred_at: self.transaction_date,
            dirty: false,
            deleted: false,
            modified_at: self.updated_at.unwrap_or(synced_at),
        })
    }
}

/// Body of `POST /transactions` and `PUT /transactions/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Owning account.
    pub account_id: i64,
    /// Optional category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    /// Amount.
    pub amount: Decimal,
    /// Occurrence time.
    pub transaction_date: DateTime<Utc>,
    /// Optional note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl From<&Transaction> for TransactionRequest {
    fn from(txn: &Transaction) -> Self {
        Self {
            account_id: txn.account_id as i64,
            category_id: txn.category_id.map(|id| id as i64),
            amount: txn.amount,
            transaction_date: txn.occurred_at,
            comment: txn.comment.clone(),
        }
    }
}
