//! Order Model

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// `NEW → {REGISTERED, PROCESSING} → {PROCESSED, INVALID}`; the two final
/// states never change again. An order may jump straight from NEW to a
/// final state when the accrual service resolves it immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "UPPERCASE"))]
pub enum OrderStatus {
    New,
    Registered,
    Processing,
    Processed,
    Invalid,
}

impl OrderStatus {
    /// PROCESSED and INVALID orders are settled and never re-polled.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Processed | OrderStatus::Invalid)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::Registered => "REGISTERED",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Processed => "PROCESSED",
            OrderStatus::Invalid => "INVALID",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order entity
///
/// `number` is the primary key: an order number belongs to whoever
/// submitted it first, permanently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub number: String,
    pub user_id: i64,
    pub status: OrderStatus,
    /// Points awarded; present only once the order reached PROCESSED.
    pub accrual: Option<f64>,
    pub uploaded_at: i64,
}

/// Order as rendered in the user-facing list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    pub number: String,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<f64>,
    pub uploaded_at: String,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            number: order.number,
            status: order.status,
            accrual: order.accrual,
            uploaded_at: crate::util::millis_to_rfc3339(order.uploaded_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_uppercase() {
        let s = serde_json::to_string(&OrderStatus::Processed).unwrap();
        assert_eq!(s, "\"PROCESSED\"");
        let back: OrderStatus = serde_json::from_str("\"INVALID\"").unwrap();
        assert_eq!(back, OrderStatus::Invalid);
    }

    #[test]
    fn terminal_states() {
        assert!(OrderStatus::Processed.is_terminal());
        assert!(OrderStatus::Invalid.is_terminal());
        assert!(!OrderStatus::New.is_terminal());
        assert!(!OrderStatus::Registered.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
    }

    #[test]
    fn view_omits_absent_accrual() {
        let view = OrderView::from(Order {
            number: "79927398713".to_string(),
            user_id: 1,
            status: OrderStatus::New,
            accrual: None,
            uploaded_at: 0,
        });
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("accrual").is_none());
        assert_eq!(json["uploaded_at"], "1970-01-01T00:00:00Z");
    }
}
