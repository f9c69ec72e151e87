//! ERC-721 metadata for achievement tokens

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, B256, U256};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::DateTime;
use serde::Serialize;

use super::achievement::AchievementContract;
use super::ledger::LoanLedgerContract;
use super::rate::ExchangeRate;
use super::{bounded, ChainError};
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize)]
pub struct MetadataAttribute {
    pub trait_type: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataProperties {
    pub loan_id: String,
    pub owner: String,
    pub partner: String,
    pub amount: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AchievementMetadata {
    pub name: String,
    pub description: String,
    pub image: String,
    pub external_url: String,
    pub attributes: Vec<MetadataAttribute>,
    pub properties: MetadataProperties,
}

#[derive(Clone)]
pub struct MetadataService {
    achievements: Option<Arc<dyn AchievementContract>>,
    ledger: Option<Arc<dyn LoanLedgerContract>>,
    rate: ExchangeRate,
    app_url: String,
    timeout: Duration,
}

impl MetadataService {
    pub fn new(
        achievements: Option<Arc<dyn AchievementContract>>,
        ledger: Option<Arc<dyn LoanLedgerContract>>,
        rate: ExchangeRate,
        app_url: String,
        timeout: Duration,
    ) -> Self {
        Self {
            achievements,
            ledger,
            rate,
            app_url,
            timeout,
        }
    }

    pub async fn achievement_metadata(
        &self,
        token_id: &str,
    ) -> Result<AchievementMetadata, ApiError> {
        let token_id = token_id
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| ApiError::BadRequest("Invalid token ID".to_string()))?;

        let achievements = self.achievements.as_ref().ok_or_else(|| {
            ChainError::NotConfigured("NFT contract not configured".to_string())
        })?;
        let ledger = self.ledger.as_ref().ok_or_else(|| {
            ChainError::NotConfigured("Loan ledger contract not configured".to_string())
        })?;

        let token = U256::from(token_id);

        let loan_id = bounded(self.timeout, achievements.loan_for_token(token)).await?;
        if loan_id == B256::ZERO {
            return Err(ApiError::NotFound("Token not found".to_string()));
        }

        let record = bounded(self.timeout, ledger.get_loan(loan_id)).await?;
        let holder = bounded(self.timeout, achievements.owner_of(token)).await?;
        let amount_pkr = self.rate.from_native(record.amount)?;

        tracing::debug!(token_id, loan_id = %loan_id, holder = %holder, "Building achievement metadata");

        let loan_date = format_unix_date(record.loan_date);
        let expected_return_date = format_unix_date(record.expected_return_date);
        let repaid_on = format_unix_date(record.timestamp);
        let formatted_amount = group_thousands(amount_pkr);

        let image = format!(
            "data:image/svg+xml;base64,{}",
            STANDARD.encode(badge_svg(&formatted_amount, &loan_date))
        );

        let description = if record.description.is_empty() {
            "No description".to_string()
        } else {
            record.description.clone()
        };

        Ok(AchievementMetadata {
            name: format!("Loan Repayment Achievement #{}", token_id),
            description: format!(
                "Achievement NFT for successfully repaying a loan of {} PKR. \
                 This NFT represents trust, responsibility, and financial integrity.",
                formatted_amount
            ),
            image,
            external_url: format!("{}/nft/{}", self.app_url.trim_end_matches('/'), token_id),
            attributes: vec![
                attribute("Loan Amount", format!("{} PKR", amount_pkr)),
                attribute("Loan Date", loan_date),
                attribute("Expected Return Date", expected_return_date),
                attribute("Repayment Date", repaid_on),
                attribute("Owner Address", address_hex(record.owner)),
                attribute("Partner Address", address_hex(record.partner)),
                attribute("Holder Address", address_hex(holder)),
                attribute("Loan ID", loan_id.to_string()),
            ],
            properties: MetadataProperties {
                loan_id: loan_id.to_string(),
                owner: address_hex(record.owner),
                partner: address_hex(record.partner),
                amount: amount_pkr.to_string(),
                description,
            },
        })
    }
}

fn attribute(trait_type: &str, value: String) -> MetadataAttribute {
    MetadataAttribute {
        trait_type: trait_type.to_string(),
        value,
    }
}

fn address_hex(address: Address) -> String {
    address.to_checksum(None)
}

/// Unix seconds as YYYY-MM-DD (UTC)
/// Zero means the ledger holds no date
fn format_unix_date(seconds: U256) -> String {
    if seconds.is_zero() {
        return "Not specified".to_string();
    }
    DateTime::from_timestamp(seconds.saturating_to::<i64>(), 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if value < 0 {
        out.insert(0, '-');
    }
    out
}

fn badge_svg(amount: &str, date: &str) -> String {
    format!(
        r##"<svg width="500" height="500" xmlns="http://www.w3.org/2000/svg">
  <defs>
    <linearGradient id="bg" x1="0%" y1="0%" x2="100%" y2="100%">
      <stop offset="0%" style="stop-color:#667eea"/>
      <stop offset="50%" style="stop-color:#764ba2"/>
      <stop offset="100%" style="stop-color:#f093fb"/>
    </linearGradient>
    <linearGradient id="gold" x1="0%" y1="0%" x2="100%" y2="100%">
      <stop offset="0%" style="stop-color:#FFD700"/>
      <stop offset="100%" style="stop-color:#FFA500"/>
    </linearGradient>
  </defs>
  <rect width="500" height="500" fill="url(#bg)"/>
  <rect x="50" y="80" width="400" height="340" rx="30" fill="rgba(255,255,255,0.15)" stroke="rgba(255,255,255,0.3)" stroke-width="2"/>
  <g transform="translate(250, 180)">
    <path d="M -40 20 L -30 60 L 30 60 L 40 20 Z" fill="url(#gold)"/>
    <ellipse cx="0" cy="0" rx="35" ry="25" fill="url(#gold)"/>
    <path d="M 0 -20 L 3 -12 L 12 -12 L 5 -6 L 8 2 L 0 -3 L -8 2 L -5 -6 L -12 -12 L -3 -12 Z" fill="white"/>
  </g>
  <text x="250" y="280" font-family="Arial, sans-serif" font-size="36" font-weight="bold" fill="white" text-anchor="middle">Loan Repaid</text>
  <rect x="150" y="300" width="200" height="50" rx="25" fill="rgba(255,255,255,0.2)"/>
  <text x="250" y="335" font-family="Arial, sans-serif" font-size="28" font-weight="bold" fill="url(#gold)" text-anchor="middle">{amount} PKR</text>
  <text x="250" y="380" font-family="Arial, sans-serif" font-size="18" fill="white" text-anchor="middle">{date}</text>
  <rect x="175" y="410" width="150" height="30" rx="15" fill="rgba(255,255,255,0.25)"/>
  <text x="250" y="430" font-family="Arial, sans-serif" font-size="14" font-weight="600" fill="white" text-anchor="middle">ACHIEVEMENT NFT</text>
</svg>"##
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ledger::LedgerLoanRecord;
    use crate::chain::{MemoryAchievementContract, MemoryLoanLedger};
    use rust_decimal::Decimal;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_format_unix_date() {
        assert_eq!(format_unix_date(U256::ZERO), "Not specified");
        assert_eq!(format_unix_date(U256::from(1_700_000_000u64)), "2023-11-14");
    }

    fn service(
        nft: Arc<MemoryAchievementContract>,
        ledger: Arc<MemoryLoanLedger>,
    ) -> MetadataService {
        MetadataService::new(
            Some(nft),
            Some(ledger),
            ExchangeRate::new(Decimal::new(3, 6)),
            "http://localhost:3000/".to_string(),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_metadata_for_minted_token() {
        let nft = Arc::new(MemoryAchievementContract::new());
        let ledger = Arc::new(MemoryLoanLedger::new());
        let loan_id = B256::repeat_byte(0x42);
        let partner = Address::repeat_byte(0x02);

        ledger
            .insert(
                loan_id,
                LedgerLoanRecord {
                    owner: Address::repeat_byte(0x01),
                    partner,
                    amount: U256::from(3_000_000_000_000_000u64),
                    timestamp: U256::from(1_700_000_000u64),
                    description: String::new(),
                    loan_date: U256::from(1_700_000_000u64),
                    expected_return_date: U256::ZERO,
                },
            )
            .await;
        nft.mint_achievement(partner, loan_id, U256::ZERO)
            .await
            .unwrap();

        let metadata = service(nft, ledger).achievement_metadata("1").await.unwrap();

        assert_eq!(metadata.name, "Loan Repayment Achievement #1");
        assert_eq!(metadata.external_url, "http://localhost:3000/nft/1");
        assert_eq!(metadata.properties.amount, "1000");
        assert_eq!(metadata.properties.description, "No description");
        assert!(metadata.image.starts_with("data:image/svg+xml;base64,"));
        assert!(metadata
            .attributes
            .iter()
            .any(|a| a.trait_type == "Loan Amount" && a.value == "1000 PKR"));
    }

    #[tokio::test]
    async fn test_unknown_and_invalid_tokens() {
        let svc = service(
            Arc::new(MemoryAchievementContract::new()),
            Arc::new(MemoryLoanLedger::new()),
        );

        assert!(matches!(
            svc.achievement_metadata("7").await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            svc.achievement_metadata("0").await,
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            svc.achievement_metadata("abc").await,
            Err(ApiError::BadRequest(_))
        ));
    }
}
