use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{AppError, AppResult};

/// Order model
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub token: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: String,
    pub branch_id: String,
    pub branch_name: Option<String>,
    pub comment: Option<String>,
    pub delivery_type: String,
    pub payment_method: String,
    pub total_amount: i64,
    pub status: String,
    /// JSON snapshot of the cart items at checkout time
    pub items: String,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn status_enum(&self) -> OrderStatus {
        OrderStatus::from(self.status.clone())
    }

    pub fn delivery_type_enum(&self) -> DeliveryType {
        DeliveryType::from(self.delivery_type.clone())
    }

    pub fn payment_method_enum(&self) -> PaymentMethod {
        PaymentMethod::from(self.payment_method.clone())
    }
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Succeeded,
    Cancelled,
}

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "succeeded" => OrderStatus::Succeeded,
            "cancelled" => OrderStatus::Cancelled,
            _ => OrderStatus::Pending,
        }
    }
}

impl From<OrderStatus> for String {
    fn from(s: OrderStatus) -> Self {
        match s {
            OrderStatus::Pending => "pending",
            OrderStatus::Succeeded => "succeeded",
            OrderStatus::Cancelled => "cancelled",
        }
        .to_string()
    }
}

/// How the order reaches the customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryType {
    Delivery,
    Pickup,
}

impl From<String> for DeliveryType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pickup" => DeliveryType::Pickup,
            _ => DeliveryType::Delivery,
        }
    }
}

impl From<DeliveryType> for String {
    fn from(d: DeliveryType) -> Self {
        match d {
            DeliveryType::Delivery => "delivery",
            DeliveryType::Pickup => "pickup",
        }
        .to_string()
    }
}

/// Payment method recorded on the order (no capture happens here)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Online,
}

impl From<String> for PaymentMethod {
    fn from(s: String) -> Self {
        match s.as_str() {
            "online" => PaymentMethod::Online,
            _ => PaymentMethod::Cash,
        }
    }
}

impl From<PaymentMethod> for String {
    fn from(p: PaymentMethod) -> Self {
        match p {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Online => "online",
        }
        .to_string()
    }
}

/// One line of the order snapshot stored in `orders.items`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemSnapshot {
    pub product_name: String,
    pub size: Option<i64>,
    pub quantity: i64,
    pub ingredients: Vec<String>,
    pub line_total: i64,
}

/// Checkout form payload
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub first_name: String,
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
    pub branch_id: String,
    #[serde(default)]
    pub comment: Option<String>,
    pub delivery_type: DeliveryType,
    pub payment_method: PaymentMethod,
}

impl CheckoutRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.first_name.trim().chars().count() < 2 {
            return Err(AppError::InvalidInput(
                "first_name must be at least 2 characters".to_string(),
            ));
        }
        if self.phone.trim().chars().count() < 10 {
            return Err(AppError::InvalidInput(
                "phone must be at least 10 characters".to_string(),
            ));
        }
        if self.branch_id.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "branch_id is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Checkout response
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResponse {
    pub order_id: i64,
    pub total_amount: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            first_name: "Anna".to_string(),
            phone: "+79990001122".to_string(),
            address: None,
            branch_id: "branch-1".to_string(),
            comment: None,
            delivery_type: DeliveryType::Pickup,
            payment_method: PaymentMethod::Cash,
        }
    }

    #[test]
    fn accepts_valid_checkout() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn rejects_short_name() {
        let mut req = request();
        req.first_name = "A".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_short_phone() {
        let mut req = request();
        req.phone = "12345".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_missing_branch() {
        let mut req = request();
        req.branch_id = "  ".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn address_stays_optional_for_delivery() {
        let mut req = request();
        req.delivery_type = DeliveryType::Delivery;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Succeeded,
            OrderStatus::Cancelled,
        ] {
            let s: String = status.into();
            assert_eq!(OrderStatus::from(s), status);
        }
    }

    #[test]
    fn unknown_strings_fall_back() {
        assert_eq!(OrderStatus::from("bogus".to_string()), OrderStatus::Pending);
        assert_eq!(
            DeliveryType::from("bogus".to_string()),
            DeliveryType::Delivery
        );
        assert_eq!(PaymentMethod::from("bogus".to_string()), PaymentMethod::Cash);
    }
}
