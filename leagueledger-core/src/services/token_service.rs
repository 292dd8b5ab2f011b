// File: leagueledger-core/src/services/token_service.rs

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use rand::RngCore;
use tracing::info;
use uuid::Uuid;

use crate::Error;
use crate::models::{Token, TokenPreview, TokenSpec};
use crate::repositories::TokenRepository;

/// Random bytes per code: 192 bits, 32 URL-safe characters.
pub const CODE_BYTES: usize = 24;

/// Most tokens one batch call may issue.
pub const MAX_BATCH_QUANTITY: u32 = 1000;

/// Unguessable redemption code. The only credential a redeemer presents.
pub fn generate_code() -> String {
    let mut bytes = [0u8; CODE_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub struct TokenService {
    tokens: Arc<dyn TokenRepository>,
}

impl TokenService {
    pub fn new(tokens: Arc<dyn TokenRepository>) -> Self {
        Self { tokens }
    }

    pub async fn issue_token(&self, spec: TokenSpec) -> Result<Token, Error> {
        self.issue_in_set(spec, None).await
    }

    pub(crate) async fn issue_in_set(
        &self,
        spec: TokenSpec,
        set_id: Option<Uuid>,
    ) -> Result<Token, Error> {
        spec.validate()?;
        let token = spec.into_token(generate_code(), set_id, Utc::now());
        self.tokens.create_token(&token).await?;
        info!("Issued token {} (set {:?}, max_uses {})", token.token_id, set_id, token.effective_max_uses());
        Ok(token)
    }

    /// Issues `quantity` identical tokens, each with its own code, all or none.
    pub async fn issue_tokens(
        &self,
        spec: TokenSpec,
        set_id: Option<Uuid>,
        quantity: u32,
    ) -> Result<Vec<Token>, Error> {
        spec.validate()?;
        if quantity == 0 {
            return Err(Error::Validation("quantity must be at least 1".into()));
        }
        if quantity > MAX_BATCH_QUANTITY {
            return Err(Error::Validation(format!(
                "quantity may not exceed {MAX_BATCH_QUANTITY} (got {quantity})"
            )));
        }
        let now = Utc::now();
        let tokens: Vec<Token> = (0..quantity)
            .map(|_| spec.clone().into_token(generate_code(), set_id, now))
            .collect();
        self.tokens.create_tokens(&tokens).await?;
        info!("Issued {} tokens (set {:?})", tokens.len(), set_id);
        Ok(tokens)
    }

    pub async fn get_by_code(&self, code: &str) -> Result<Option<Token>, Error> {
        self.tokens.get_token_by_code(code).await
    }

    /// Unknown codes are `NotFound`; the preview never consumes a use.
    pub async fn preview(&self, code: &str) -> Result<TokenPreview, Error> {
        let token = self
            .get_by_code(code)
            .await?
            .ok_or_else(|| Error::NotFound("token".into()))?;
        Ok(token.preview_at(Utc::now()))
    }

    pub async fn get_by_id(&self, token_id: Uuid) -> Result<Option<Token>, Error> {
        self.tokens.get_token_by_id(token_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MemoryLedgerStore;
    use rust_decimal::Decimal;
    use std::collections::HashSet;

    #[test]
    fn codes_are_long_and_url_safe() {
        let code = generate_code();
        assert_eq!(code.len(), 32);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));

        let many: HashSet<String> = (0..1000).map(|_| generate_code()).collect();
        assert_eq!(many.len(), 1000);
    }

    #[tokio::test]
    async fn issued_token_is_fetchable_by_code() -> Result<(), Error> {
        let service = TokenService::new(Arc::new(MemoryLedgerStore::new()));
        let token = service.issue_token(TokenSpec::points(Decimal::from(10))).await?;

        let found = service.get_by_code(&token.code).await?.expect("token stored");
        assert_eq!(found.token_id, token.token_id);
        assert_eq!(found.use_count, 0);
        Ok(())
    }

    #[tokio::test]
    async fn invalid_spec_issues_nothing() {
        let store = Arc::new(MemoryLedgerStore::new());
        let service = TokenService::new(store.clone());
        let bad = TokenSpec { max_uses: Some(0), ..TokenSpec::points(Decimal::ONE) };
        assert!(matches!(service.issue_tokens(bad, None, 3).await, Err(Error::Validation(_))));
        assert!(matches!(
            service.issue_tokens(TokenSpec::points(Decimal::ONE), None, 0).await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn batch_quantity_is_capped() -> Result<(), Error> {
        let store = Arc::new(MemoryLedgerStore::new());
        let service = TokenService::new(store.clone());
        assert!(matches!(
            service.issue_tokens(TokenSpec::points(Decimal::ONE), None, u32::MAX).await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            service.issue_tokens(TokenSpec::points(Decimal::ONE), None, MAX_BATCH_QUANTITY + 1).await,
            Err(Error::Validation(_))
        ));

        let tokens = service.issue_tokens(TokenSpec::points(Decimal::ONE), None, MAX_BATCH_QUANTITY).await?;
        assert_eq!(tokens.len(), MAX_BATCH_QUANTITY as usize);
        Ok(())
    }
}
