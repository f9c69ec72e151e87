//! HTTP surface tests driving the full router

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use alloy::primitives::{Address, B256, U256};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use udhaar_ledger::chain::{
        AchievementContract, LedgerLoanRecord, LoanLedgerContract, MemoryAchievementContract,
        MemoryLoanLedger,
    };
    use udhaar_ledger::config::Config;
    use udhaar_ledger::middleware::RateLimiter;
    use udhaar_ledger::routes::build_router;
    use udhaar_ledger::state::{AppState, ChainContracts};
    use udhaar_ledger::store::MemoryLedgerStore;

    const OWNER_WALLET: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const PARTNER_WALLET: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    struct TestApp {
        router: Router,
        ledger: Arc<MemoryLoanLedger>,
    }

    fn app_with_limit(rps: u32) -> TestApp {
        let config = Config::memory_defaults();
        let nft = Arc::new(MemoryAchievementContract::new());
        let ledger = Arc::new(MemoryLoanLedger::new());
        let contracts = ChainContracts {
            achievements: Some(nft as Arc<dyn AchievementContract>),
            ledger: Some(ledger.clone() as Arc<dyn LoanLedgerContract>),
        };
        let state = AppState::new(&config, Arc::new(MemoryLedgerStore::new()), contracts);

        TestApp {
            router: build_router(state, &config, RateLimiter::new(rps)),
            ledger,
        }
    }

    fn app() -> TestApp {
        app_with_limit(10_000)
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
        send(router, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(router, request).await
    }

    async fn signup(router: &Router, username: &str, wallet: &str) -> (StatusCode, Value) {
        post(
            router,
            "/api/users",
            json!({
                "name": "Test User",
                "storeName": "Test Store",
                "username": username,
                "email": format!("{}@example.com", username),
                "walletAddress": wallet,
            }),
        )
        .await
    }

    /// Owner and partner registered and linked; returns the partner link id
    async fn seed(router: &Router) -> String {
        signup(router, "owner", OWNER_WALLET).await;
        signup(router, "partner", PARTNER_WALLET).await;
        let (status, body) = post(
            router,
            "/api/partners",
            json!({ "ownerWallet": OWNER_WALLET, "partnerUsername": "partner" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["partner"]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_and_security_headers() {
        let app = app();

        let response = app
            .router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "connected");
    }

    #[tokio::test]
    async fn test_signup_and_lookup() {
        let app = app();

        let (status, body) = signup(&app.router, "owner", OWNER_WALLET).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["user"]["storeName"], "Test Store");

        let (status, body) = signup(&app.router, "owner2", OWNER_WALLET).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");

        let unprefixed_upper = OWNER_WALLET.trim_start_matches("0x").to_uppercase();
        let (status, body) =
            get(&app.router, &format!("/api/users?walletAddress={}", unprefixed_upper)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["username"], "owner");

        let (status, _) = get(&app.router, "/api/users").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get(
            &app.router,
            "/api/users?walletAddress=0xcccccccccccccccccccccccccccccccccccccccc",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let app = app();

        let (status, _) = post(&app.router, "/api/users", json!({ "name": "x" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = post(
            &app.router,
            "/api/users",
            json!({
                "name": "Test",
                "storeName": "Store",
                "username": "bad-email",
                "email": "not-an-email",
                "walletAddress": OWNER_WALLET,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_partner_registry() {
        let app = app();
        seed(&app.router).await;

        let (status, _) = post(
            &app.router,
            "/api/partners",
            json!({ "ownerWallet": OWNER_WALLET, "partnerUsername": "partner" }),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = post(
            &app.router,
            "/api/partners",
            json!({ "ownerWallet": OWNER_WALLET, "partnerUsername": "owner" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post(
            &app.router,
            "/api/partners",
            json!({ "ownerWallet": OWNER_WALLET, "partnerUsername": "nobody" }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) =
            get(&app.router, &format!("/api/partners?ownerWallet={}", OWNER_WALLET)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["partnerCount"], 1);
        assert_eq!(body["partners"][0]["username"], "partner");
    }

    #[tokio::test]
    async fn test_loan_lifecycle_over_http() {
        let app = app();
        let partner_id = seed(&app.router).await;

        let (status, body) = post(
            &app.router,
            "/api/loans",
            json!({
                "ownerWallet": OWNER_WALLET,
                "partnerId": partner_id,
                "amount": 1000,
                "description": "Doodh",
                "loanDate": "2024-05-01",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["loan"]["status"], "pending");
        assert_eq!(body["loan"]["loanType"], "given");
        let loan_id = body["loan"]["id"].as_str().unwrap().to_string();

        let (status, body) = get(
            &app.router,
            &format!("/api/loans/pending?partnerWallet={}", PARTNER_WALLET),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["loans"].as_array().unwrap().len(), 1);
        assert_eq!(body["loans"][0]["owner"]["username"], "owner");

        let (status, body) = post(
            &app.router,
            "/api/loans/accept",
            json!({ "loanId": loan_id, "partnerWallet": PARTNER_WALLET, "action": "accept" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["needsOnChainRecording"], true);
        assert_eq!(body["loan"]["status"], "accepted");

        let (status, body) = post(
            &app.router,
            "/api/loans/record-onchain",
            json!({ "loanId": loan_id, "ownerWallet": OWNER_WALLET }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["loan"]["amountWei"], "3000000000000000");
        assert_eq!(body["loan"]["expectedReturnDate"], 0);

        let onchain_id = format!("0x{}", "77".repeat(32));
        let (status, body) = post(
            &app.router,
            "/api/loans/update-tx",
            json!({
                "loanId": loan_id,
                "txHash": format!("0x{}", "aa".repeat(32)),
                "onchainLoanId": onchain_id,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["loan"]["status"], "waiting on payment");

        let (status, body) = get(
            &app.router,
            &format!(
                "/api/loans/pay?loanId={}&partnerWallet={}",
                loan_id, PARTNER_WALLET
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["loan"]["onchainLoanId"], onchain_id.as_str());

        let (status, body) = post(
            &app.router,
            "/api/loans/pay",
            json!({
                "loanId": loan_id,
                "partnerWallet": PARTNER_WALLET,
                "txHash": format!("0x{}", "bb".repeat(32)),
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["loan"]["status"], "paid back");
        assert_eq!(body["nft"]["tokenId"], "1");
        assert_eq!(body["nft"]["alreadyMinted"], false);

        let (status, body) = get(
            &app.router,
            &format!(
                "/api/loans?ownerWallet={}&partnerWallet={}",
                OWNER_WALLET, PARTNER_WALLET
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["loansGiven"].as_array().unwrap().len(), 1);
        assert_eq!(body["loansTaken"].as_array().unwrap().len(), 1);
        assert_eq!(body["loansTaken"][0]["loanType"], "taken");
        // paid back loans leave both running totals
        assert_eq!(body["totalLoanGiven"], 0);
        assert_eq!(body["totalLoanTaken"], 0);
    }

    #[tokio::test]
    async fn test_loan_id_errors() {
        let app = app();
        seed(&app.router).await;

        let (status, _) = post(
            &app.router,
            "/api/loans/accept",
            json!({ "partnerWallet": PARTNER_WALLET, "action": "accept" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post(
            &app.router,
            "/api/loans/accept",
            json!({ "loanId": "not-a-uuid", "partnerWallet": PARTNER_WALLET, "action": "accept" }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = get(&app.router, "/api/loans").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_bodies_use_error_envelope() {
        let app = app();
        let partner_id = seed(&app.router).await;

        let (status, body) = post(
            &app.router,
            "/api/loans",
            json!({ "ownerWallet": OWNER_WALLET, "partnerId": partner_id, "amount": "500" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["message"].as_str().unwrap().contains("amount"));

        let request = Request::post("/api/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"username\": "))
            .unwrap();
        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let request = Request::post("/api/loans/accept")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("accept"))
            .unwrap();
        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_reused_onchain_id_is_conflict() {
        let app = app();
        let partner_id = seed(&app.router).await;
        let onchain_id = format!("0x{}", "99".repeat(32));

        let mut statuses = Vec::new();
        for amount in [300, 400] {
            let (_, body) = post(
                &app.router,
                "/api/loans",
                json!({ "ownerWallet": OWNER_WALLET, "partnerId": partner_id, "amount": amount }),
            )
            .await;
            let loan_id = body["loan"]["id"].as_str().unwrap().to_string();
            post(
                &app.router,
                "/api/loans/accept",
                json!({ "loanId": loan_id, "partnerWallet": PARTNER_WALLET, "action": "accept" }),
            )
            .await;

            let (status, body) = post(
                &app.router,
                "/api/loans/update-tx",
                json!({
                    "loanId": loan_id,
                    "txHash": format!("0x{}", "aa".repeat(32)),
                    "onchainLoanId": onchain_id,
                }),
            )
            .await;
            statuses.push((status, body));
        }

        assert_eq!(statuses[0].0, StatusCode::OK);
        assert_eq!(statuses[1].0, StatusCode::CONFLICT);
        assert_eq!(statuses[1].1["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_mint_is_idempotent_over_http() {
        let app = app();
        let request = json!({
            "recipientAddress": PARTNER_WALLET,
            "loanId": format!("0x{}", "42".repeat(32)),
            "amount": "3000000000000000",
        });

        let (status, body) = post(&app.router, "/api/nft/mint", request.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["alreadyMinted"], false);
        let token_id = body["tokenId"].clone();

        let (status, body) = post(&app.router, "/api/nft/mint", request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["alreadyMinted"], true);
        assert_eq!(body["tokenId"], token_id);

        let (status, body) = post(
            &app.router,
            "/api/nft/mint",
            json!({ "recipientAddress": PARTNER_WALLET }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["message"],
            "Bad request: recipientAddress, loanId, and amount required"
        );
    }

    #[tokio::test]
    async fn test_nft_metadata() {
        let app = app();
        let loan_id = format!("0x{}", "99".repeat(32));

        let (status, _) = post(
            &app.router,
            "/api/nft/mint",
            json!({
                "recipientAddress": PARTNER_WALLET,
                "loanId": loan_id,
                "amount": 3000000000000000u64,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        app.ledger
            .insert(
                loan_id.parse::<B256>().unwrap(),
                LedgerLoanRecord {
                    owner: OWNER_WALLET.parse::<Address>().unwrap(),
                    partner: PARTNER_WALLET.parse::<Address>().unwrap(),
                    amount: U256::from(3_000_000_000_000_000u64),
                    timestamp: U256::from(1_717_200_000u64),
                    description: "Cheeni".to_string(),
                    loan_date: U256::from(1_714_521_600u64),
                    expected_return_date: U256::ZERO,
                },
            )
            .await;

        let response = app
            .router
            .clone()
            .oneshot(
                Request::get("/api/nft/metadata/1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "no-cache, no-store, must-revalidate"
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["name"], "Loan Repayment Achievement #1");
        assert!(body["image"]
            .as_str()
            .unwrap()
            .starts_with("data:image/svg+xml;base64,"));

        let (status, _) = get(&app.router, "/api/nft/metadata/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get(&app.router, "/api/nft/metadata/7").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_voice_endpoints_without_keys() {
        let app = app();

        let boundary = "udhaar-boundary";
        let multipart = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"language\"\r\n\r\nur\r\n--{b}--\r\n",
            b = boundary
        );
        let request = Request::post("/api/transcribe")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(multipart))
            .unwrap();
        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Bad request: Audio file is required");

        let (status, body) = post(
            &app.router,
            "/api/extract-loan-info",
            json!({ "text": "Bilal ko 500 rupay diye" }),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn test_rate_limit() {
        let app = app_with_limit(1);

        for _ in 0..2 {
            let (status, _) = get(&app.router, "/").await;
            assert_eq!(status, StatusCode::OK);
        }

        let response = app
            .router
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "1");
    }
}
