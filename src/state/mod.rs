//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::chain::{
    AchievementContract, AchievementMinter, ExchangeRate, KeyCustody, LoanLedgerContract,
    LocalKeyCustody, MetadataService, OnchainAchievementContract, OnchainLoanLedger,
};
use crate::config::Config;
use crate::identity::IdentityService;
use crate::loan::{LoanService, PaymentService, RecordingService};
use crate::partner::PartnerService;
use crate::store::LedgerStore;
use crate::voice::{LoanInfoExtractor, Transcriber};

/// Contract adapters available to this process; `None` means not deployed
#[derive(Clone, Default)]
pub struct ChainContracts {
    pub achievements: Option<Arc<dyn AchievementContract>>,
    pub ledger: Option<Arc<dyn LoanLedgerContract>>,
}

impl ChainContracts {
    /// Connect to whichever contracts are configured. A misconfigured adapter is
    /// logged and left out so the rest of the API still serves.
    pub fn from_config(config: &Config) -> Self {
        let custody: Option<Arc<dyn KeyCustody>> =
            config.nft_minter_private_key.as_deref().and_then(|key| {
                match LocalKeyCustody::from_private_key(key) {
                    Ok(custody) => {
                        tracing::info!(minter = %custody.address(), "Minting key loaded");
                        Some(Arc::new(custody) as Arc<dyn KeyCustody>)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Ignoring NFT_MINTER_PRIVATE_KEY");
                        None
                    }
                }
            });

        let achievements = config.nft_contract_address.as_deref().and_then(|address| {
            match OnchainAchievementContract::new(&config.rpc_url, address, custody) {
                Ok(contract) => Some(Arc::new(contract) as Arc<dyn AchievementContract>),
                Err(e) => {
                    tracing::warn!(error = %e, "Achievement contract disabled");
                    None
                }
            }
        });

        let ledger = config.loan_ledger_contract.as_deref().and_then(|address| {
            match OnchainLoanLedger::new(&config.rpc_url, address) {
                Ok(contract) => Some(Arc::new(contract) as Arc<dyn LoanLedgerContract>),
                Err(e) => {
                    tracing::warn!(error = %e, "Loan ledger contract disabled");
                    None
                }
            }
        });

        Self {
            achievements,
            ledger,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LedgerStore>,
    pub identity_service: Arc<IdentityService>,
    pub partner_service: Arc<PartnerService>,
    pub loan_service: Arc<LoanService>,
    pub recording_service: Arc<RecordingService>,
    pub payment_service: Arc<PaymentService>,
    pub minter: Arc<AchievementMinter>,
    pub metadata_service: Arc<MetadataService>,
    pub transcriber: Arc<Transcriber>,
    pub extractor: Arc<LoanInfoExtractor>,
}

impl AppState {
    /// Wire every service from configuration
    pub fn new(config: &Config, store: Arc<dyn LedgerStore>, contracts: ChainContracts) -> Self {
        let rate = ExchangeRate::new(config.pkr_to_native_rate);
        let identity = IdentityService::new(store.clone());
        let minter = AchievementMinter::new(contracts.achievements.clone(), config.external_timeout);

        Self {
            store: store.clone(),
            identity_service: Arc::new(identity.clone()),
            partner_service: Arc::new(PartnerService::new(store.clone(), identity.clone())),
            loan_service: Arc::new(LoanService::new(store.clone(), identity.clone(), rate)),
            recording_service: Arc::new(RecordingService::new(
                store.clone(),
                identity.clone(),
                rate,
                config.loan_ledger_contract.clone(),
            )),
            payment_service: Arc::new(PaymentService::new(
                store,
                identity,
                rate,
                config.loan_ledger_contract.clone(),
                minter.clone(),
            )),
            minter: Arc::new(minter),
            metadata_service: Arc::new(MetadataService::new(
                contracts.achievements,
                contracts.ledger,
                rate,
                config.app_url.clone(),
                config.external_timeout,
            )),
            transcriber: Arc::new(Transcriber::new(
                config.uplift_ai_api_key.clone(),
                config.external_timeout,
            )),
            extractor: Arc::new(LoanInfoExtractor::new(
                config.openai_api_key.clone(),
                config.openai_model.clone(),
                config.external_timeout,
            )),
        }
    }
}

impl FromRef<AppState> for Arc<dyn LedgerStore> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.store.clone()
    }
}

impl FromRef<AppState> for Arc<IdentityService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.identity_service.clone()
    }
}

impl FromRef<AppState> for Arc<PartnerService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.partner_service.clone()
    }
}

impl FromRef<AppState> for Arc<LoanService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.loan_service.clone()
    }
}

impl FromRef<AppState> for Arc<RecordingService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.recording_service.clone()
    }
}

impl FromRef<AppState> for Arc<PaymentService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.payment_service.clone()
    }
}

impl FromRef<AppState> for Arc<AchievementMinter> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.minter.clone()
    }
}

impl FromRef<AppState> for Arc<MetadataService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.metadata_service.clone()
    }
}

impl FromRef<AppState> for Arc<Transcriber> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.transcriber.clone()
    }
}

impl FromRef<AppState> for Arc<LoanInfoExtractor> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.extractor.clone()
    }
}
