//! Payment-details query sent to the user service.

use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};

/// Asks the user service for the payment details of the ordering user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchUserPaymentDetails {
    pub user_id: UserId,
    pub order_id: OrderId,
}

/// A user as returned by the payment-details query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub first_name: String,
    pub last_name: String,
    pub user_id: UserId,
    pub payment_details: PaymentDetails,
}

/// Card details used to charge a user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub name: String,
    pub card_number: String,
    pub valid_until_month: u32,
    pub valid_until_year: u32,
    pub cvv: String,
}

// Card number and CVV never reach the logs.
impl std::fmt::Debug for PaymentDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let last_four = self
            .card_number
            .get(self.card_number.len().saturating_sub(4)..)
            .unwrap_or_default();
        f.debug_struct("PaymentDetails")
            .field("name", &self.name)
            .field("card_number", &format_args!("****{last_four}"))
            .field("valid_until_month", &self.valid_until_month)
            .field("valid_until_year", &self.valid_until_year)
            .field("cvv", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_masks_card_data() {
        let details = PaymentDetails {
            name: "Jane Doe".to_string(),
            card_number: "4111111111111111".to_string(),
            valid_until_month: 12,
            valid_until_year: 2030,
            cvv: "123".to_string(),
        };

        let debug = format!("{details:?}");
        assert!(debug.contains("****1111"));
        assert!(!debug.contains("4111111111111111"));
        assert!(!debug.contains("123\""));
    }
}
