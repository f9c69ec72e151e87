//! Wallet identity resolution across address spellings

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use udhaar_ledger::error::ApiError;
    use udhaar_ledger::identity::{IdentityService, SignupRequest};
    use udhaar_ledger::store::MemoryLedgerStore;

    const WALLET_HEX: &str = "52908400098527886E0F7030069857D2E4169EE7";

    fn service() -> IdentityService {
        IdentityService::new(Arc::new(MemoryLedgerStore::new()))
    }

    fn request(username: &str, wallet: &str) -> SignupRequest {
        SignupRequest {
            name: Some("Saima".to_string()),
            store_name: Some("Saima General Store".to_string()),
            username: Some(username.to_string()),
            email: Some("saima@example.com".to_string()),
            wallet_address: Some(wallet.to_string()),
        }
    }

    #[tokio::test]
    async fn test_every_spelling_resolves_to_one_user() {
        let service = service();
        let user = service.signup(request("saima", WALLET_HEX)).await.unwrap();
        assert_eq!(user.wallet_address, format!("0x{}", WALLET_HEX.to_lowercase()));

        for spelling in [
            WALLET_HEX.to_string(),
            WALLET_HEX.to_lowercase(),
            format!("0x{}", WALLET_HEX),
            format!("0x{}", WALLET_HEX.to_lowercase()),
            format!("  0x{}  ", WALLET_HEX),
        ] {
            let found = service.get_user(Some(&spelling)).await.unwrap();
            assert_eq!(found.id, user.id, "spelling {:?}", spelling);
        }
    }

    #[tokio::test]
    async fn test_same_wallet_in_another_case_conflicts() {
        let service = service();
        service.signup(request("saima", WALLET_HEX)).await.unwrap();

        let err = service
            .signup(request("saima2", &format!("0x{}", WALLET_HEX.to_lowercase())))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_username_taken() {
        let service = service();
        service.signup(request("saima", WALLET_HEX)).await.unwrap();

        let err = service
            .signup(request("saima", "0x1111111111111111111111111111111111111111"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(ref m) if m.contains("Username")));
    }

    #[tokio::test]
    async fn test_malformed_wallet_rejected() {
        let service = service();

        let err = service.signup(request("saima", "0x1234")).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err = service.get_user(Some("")).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
