use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ApiError;
use crate::identity::service::required;
use crate::identity::IdentityService;
use crate::partner::model::{AddPartnerRequest, Partner};
use crate::store::LedgerStore;

#[derive(Clone)]
pub struct PartnerService {
    store: Arc<dyn LedgerStore>,
    identity: IdentityService,
}

impl PartnerService {
    pub fn new(store: Arc<dyn LedgerStore>, identity: IdentityService) -> Self {
        Self { store, identity }
    }

    pub async fn add_partner(&self, request: AddPartnerRequest) -> Result<Partner, ApiError> {
        let owner_wallet = required(request.owner_wallet.as_deref(), "ownerWallet")?;
        let partner_username = required(request.partner_username.as_deref(), "partnerUsername")?;

        let owner = self
            .identity
            .resolve_user_by_wallet(&owner_wallet, "Owner user not found")
            .await?;

        let partner = self
            .store
            .find_user_by_username(&partner_username)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!("No user with username '{}'", partner_username))
            })?;

        if partner.id == owner.id {
            return Err(ApiError::BadRequest(
                "You cannot add yourself as a partner".to_string(),
            ));
        }

        let link = self.store.insert_partner_link(owner.id, partner.id).await?;

        tracing::info!(
            owner_id = %owner.id,
            partner_id = %partner.id,
            link_id = %link.id,
            "Partner linked"
        );

        Ok(Partner {
            id: link.id,
            username: partner.username,
            name: partner.name,
            wallet_address: partner.wallet_address,
        })
    }

    pub async fn list_partners(&self, owner_wallet: Option<&str>) -> Result<Vec<Partner>, ApiError> {
        let owner_wallet = required(owner_wallet, "ownerWallet")?;
        let owner = self
            .identity
            .resolve_user_by_wallet(&owner_wallet, "Owner user not found")
            .await?;

        let links = self.store.list_partner_links(owner.id).await?;
        let ids: Vec<_> = links.iter().map(|l| l.partner_user_id).collect();
        let users: HashMap<_, _> = self
            .store
            .find_users(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(links
            .into_iter()
            .filter_map(|link| {
                users.get(&link.partner_user_id).map(|u| Partner {
                    id: link.id,
                    username: u.username.clone(),
                    name: u.name.clone(),
                    wallet_address: u.wallet_address.clone(),
                })
            })
            .collect())
    }
}
