// dtos/paymentdtos.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct FundWalletDto {
    // Minor currency units.
    #[validate(range(min = 1, message = "Amount must be a positive integer"))]
    pub amount: i64,

    #[validate(length(min = 1, max = 128, message = "Gateway reference is required"))]
    pub gateway_ref: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct WithdrawalRequestDto {
    #[validate(range(min = 1, message = "Amount must be a positive integer"))]
    pub amount: i64,

    #[validate(length(min = 1, max = 128, message = "Gateway reference is required"))]
    pub gateway_ref: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct HistoryQueryDto {
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponseDto {
    pub user_id: Uuid,
    pub balance: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fund_request_rejects_non_positive_amount() {
        let dto = FundWalletDto {
            amount: 0,
            gateway_ref: "ref-1".to_string(),
        };
        assert!(dto.validate().is_err());

        let dto = FundWalletDto {
            amount: -50,
            gateway_ref: "ref-1".to_string(),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn fund_request_requires_gateway_ref() {
        let dto = FundWalletDto {
            amount: 1000,
            gateway_ref: "".to_string(),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn valid_withdrawal_request_passes() {
        let dto = WithdrawalRequestDto {
            amount: 400,
            gateway_ref: "r3".to_string(),
        };
        assert!(dto.validate().is_ok());
    }
}
