use sea_orm::DatabaseConnection;

use crate::{
    auth::{Role, TokenBundle, TokenPurpose, jwt::TokenService, password},
    config::AppConfig,
    db::{account_repo, entities::account, session_repo},
    error::{AppError, AuthError},
};

pub enum ConfirmOutcome {
    Confirmed,
    AlreadyConfirmed,
}

#[derive(Clone, Copy)]
pub struct AuthService<'a> {
    db: &'a DatabaseConnection,
    tokens: &'a TokenService,
}

impl<'a> AuthService<'a> {
    pub fn new(db: &'a DatabaseConnection, tokens: &'a TokenService) -> Self {
        Self { db, tokens }
    }

    /// Creates an account. The very first account becomes a confirmed admin
    /// (bootstrap); everyone after that starts as an unconfirmed member and
    /// must go through email confirmation before login.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<account::Model, AppError> {
        let email = email.trim();
        let username = username.trim();
        if email.is_empty() || username.is_empty() {
            return Err(AppError::bad_request("Username and email required"));
        }

        if account_repo::find_by_email(self.db, email).await?.is_some()
            || account_repo::find_by_username(self.db, username)
                .await?
                .is_some()
        {
            return Err(AppError::conflict("Account already exist"));
        }

        let password_hash = password::hash_password(password)?;
        let first_account = account_repo::count(self.db).await? == 0;
        let (role, confirmed) = if first_account {
            (Role::Admin, true)
        } else {
            (Role::Member, false)
        };

        let created = account_repo::create_account(
            self.db,
            username,
            email,
            &password_hash,
            role.as_str(),
            confirmed,
        )
        .await?;

        if !created.confirmed {
            // Mail delivery is an external collaborator; we only record that
            // a confirmation is pending.
            tracing::info!("confirmation pending for {}", created.email);
        }

        Ok(created)
    }

    /// Login guards, in order: unknown identity, blocked account, unconfirmed
    /// email, wrong password. The first and last collapse to the same error;
    /// the middle two are intentionally distinct because they are user-facing
    /// account states, not token internals.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenBundle, AppError> {
        let account = account_repo::find_by_email(self.db, email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !account.active {
            return Err(AuthError::AccountBlocked.into());
        }
        if !account.confirmed {
            return Err(AuthError::EmailNotConfirmed.into());
        }
        if !password::verify_password(password, &account.password_hash)? {
            return Err(AuthError::InvalidCredentials.into());
        }

        let bundle = self.issue_pair(&account.email)?;
        session_repo::upsert_refresh(self.db, &account.id, &bundle.refresh_token).await?;
        Ok(bundle)
    }

    /// Rotation-on-use. The presented token must validate AND still be the
    /// stored value; the swap is a single conditional update, so two
    /// concurrent refreshes with the same token cannot both win. A stale
    /// presentation clears the stored session entirely, forcing re-login.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenBundle, AppError> {
        if session_repo::is_revoked(self.db, refresh_token).await? {
            return Err(AuthError::InvalidRefreshToken.into());
        }

        let email = self
            .tokens
            .validate(refresh_token, TokenPurpose::Refresh)
            .map_err(|_| AuthError::InvalidRefreshToken)?;

        let account = account_repo::find_by_email(self.db, &email)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;
        if !account.active {
            return Err(AuthError::AccountBlocked.into());
        }

        let bundle = self.issue_pair(&account.email)?;
        let swapped = session_repo::replace_refresh(
            self.db,
            &account.id,
            refresh_token,
            &bundle.refresh_token,
        )
        .await?;

        if !swapped {
            session_repo::clear_refresh(self.db, &account.id).await?;
            return Err(AuthError::InvalidRefreshToken.into());
        }

        Ok(bundle)
    }

    /// Clears the refresh session and blacklists the presented access token.
    /// A repeated logout with the same token fails the revocation check with
    /// 401 rather than blowing up.
    pub async fn logout(&self, access_token: &str) -> Result<(), AppError> {
        if session_repo::is_revoked(self.db, access_token).await? {
            return Err(AuthError::InvalidCredentials.into());
        }

        let email = self.tokens.validate(access_token, TokenPurpose::Access)?;
        let account = account_repo::find_by_email(self.db, &email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        session_repo::clear_refresh(self.db, &account.id).await?;
        session_repo::insert_revoked(self.db, access_token).await?;
        Ok(())
    }

    pub fn issue_confirm_token(&self, email: &str) -> Result<String, AppError> {
        Ok(self.tokens.issue(email, TokenPurpose::Email)?)
    }

    pub async fn confirm_email(&self, token: &str) -> Result<ConfirmOutcome, AppError> {
        let email = self
            .tokens
            .validate(token, TokenPurpose::Email)
            .map_err(|_| AppError::bad_request("Invalid token for verification"))?;

        let account = account_repo::find_by_email(self.db, &email)
            .await?
            .ok_or_else(|| AppError::bad_request("Verification error"))?;

        if account.confirmed {
            return Ok(ConfirmOutcome::AlreadyConfirmed);
        }
        account_repo::set_confirmed(self.db, &account.id).await?;
        Ok(ConfirmOutcome::Confirmed)
    }

    pub async fn seed_admin(&self, cfg: &AppConfig) -> anyhow::Result<()> {
        if let Some(existing) = account_repo::find_by_email(self.db, &cfg.admin_email).await? {
            tracing::info!("admin account already present: {}", existing.email);
            return Ok(());
        }

        let hash = password::hash_password(&cfg.admin_password)
            .map_err(|e| anyhow::anyhow!("admin seed hash error: {}", e.message()))?;
        let account = account_repo::create_account(
            self.db,
            &cfg.admin_username,
            &cfg.admin_email,
            &hash,
            Role::Admin.as_str(),
            true,
        )
        .await?;
        tracing::info!("seeded admin account {}", account.email);
        Ok(())
    }

    fn issue_pair(&self, email: &str) -> Result<TokenBundle, AppError> {
        let access_token = self.tokens.issue(email, TokenPurpose::Access)?;
        let refresh_token = self.tokens.issue(email, TokenPurpose::Refresh)?;
        Ok(TokenBundle {
            access_token,
            refresh_token,
            token_type: "Bearer",
            expires_in: self.tokens.access_ttl_secs(),
        })
    }
}
