//! Accounts, passwords and bearer tokens.
//!
//! The shipment core only needs two things from here: resolving a bearer
//! token to a [`Principal`], and looking up a display name for owner
//! annotation. [`InMemoryCredentialStore`] provides both plus the
//! register/login/logout flows behind the web boundary.

use std::collections::HashMap;

use parking_lot::RwLock;
use rand::RngCore;
use serde::Serialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::{AuthError, Error, StorageError, ValidationError};
use crate::input::VerifiedRegistration;
use crate::request::{Principal, PrincipalId, Role};
use crate::secret::Secret;

/// bcrypt cost used by [`InMemoryCredentialStore::new`].
pub const DEFAULT_HASH_COST: u32 = 10;

const MIN_HASH_COST: u32 = 4;
const MAX_HASH_COST: u32 = 31;

/// Looks up public profile data for a principal id.
pub trait ProfileDirectory: Send + Sync {
    /// Returns the display name of `id`, if the account exists.
    fn display_name(&self, id: PrincipalId) -> Option<String>;
}

/// Verifies identities and manages bearer tokens.
pub trait CredentialStore: ProfileDirectory {
    /// Creates a standard account and issues its first token.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` error if the email or phone is already taken,
    /// and a `Storage` error if the password cannot be hashed.
    fn register(&self, registration: VerifiedRegistration) -> Result<IssuedToken, Error>;

    /// Checks an email-or-phone and password pair and issues a token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown login or a
    /// wrong password alike.
    fn login(&self, login: &str, password: &Secret<String>) -> Result<IssuedToken, AuthError>;

    /// Revokes the presented token only. Returns `false` if it was not live.
    fn logout(&self, token: &BearerToken) -> bool;

    /// Resolves a live token to its principal.
    fn resolve(&self, token: &BearerToken) -> Option<Principal>;
}

/// A plain-text bearer token as presented by a client.
#[derive(Debug)]
pub struct BearerToken(Secret<String>);

impl BearerToken {
    /// Wraps a token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(Secret::new(token.into()))
    }

    /// Parses an `Authorization` header value of the form `Bearer <token>`.
    pub fn from_authorization(header: &str) -> Option<Self> {
        let (scheme, token) = header.trim().split_once(' ')?;
        let token = token.trim();
        (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| Self::new(token))
    }

    /// Exposes the token text.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }

    fn split(&self) -> Option<(u64, &str)> {
        let (id, plain) = self.expose_secret().split_once('|')?;
        Some((id.parse().ok()?, plain))
    }
}

/// Public account data, safe to return to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    /// Account id, also the principal id
    pub id: PrincipalId,
    /// Display name
    pub name: String,
    /// Normalized e-mail address
    pub email: String,
    /// Phone number
    pub phone: String,
    /// Whether the account holds the admin role
    pub is_admin: bool,
}

impl Account {
    /// Returns the principal this account authenticates as.
    pub fn principal(&self) -> Principal {
        let role = if self.is_admin {
            Role::Admin
        } else {
            Role::Standard
        };
        Principal {
            id: self.id,
            name: self.name.clone(),
            role,
        }
    }
}

/// A freshly issued token together with its account.
///
/// The token text is only available here; the store keeps its digest.
#[derive(Debug)]
pub struct IssuedToken {
    /// The authenticated account
    pub account: Account,
    /// Token to present as `Authorization: Bearer <token>`
    pub token: Secret<String>,
}

#[derive(Debug)]
struct AccountRecord {
    account: Account,
    // bcrypt hash string, salt included
    password_hash: String,
}

#[derive(Debug)]
struct TokenRecord {
    account: PrincipalId,
    digest: String,
}

#[derive(Debug, Default)]
struct Accounts {
    accounts: Vec<AccountRecord>,
    tokens: HashMap<u64, TokenRecord>,
    last_token_id: u64,
}

impl Accounts {
    fn by_id(&self, id: PrincipalId) -> Option<&AccountRecord> {
        // Account ids are positions + 1.
        let index = usize::try_from(id.get()).ok()?.checked_sub(1)?;
        self.accounts.get(index)
    }

    fn by_login(&self, login: &str) -> Option<&AccountRecord> {
        let email = login.to_lowercase();
        self.accounts
            .iter()
            .find(|r| r.account.email == email || r.account.phone == login)
    }
}

/// Credential store held in process memory.
///
/// Passwords are stored as bcrypt hashes and tokens as SHA-256 digests of
/// their secret part. Hashing and verification run outside the account lock.
///
/// # Examples
///
/// ```
/// use shipment_core::{
///     BearerToken, CredentialStore, InMemoryCredentialStore, RegistrationInput,
///     RegistrationValidator, Secret, Tainted,
/// };
///
/// let store = InMemoryCredentialStore::new();
/// let form = RegistrationInput {
///     name: Some("Alice".into()),
///     email: Some("alice@example.com".into()),
///     phone: Some("0500000001".into()),
///     password: Some(Secret::new("hunter22".into())),
///     password_confirmation: Some(Secret::new("hunter22".into())),
/// };
/// let verified = RegistrationValidator::new(255, 6).validate(Tainted::new(form)).unwrap();
/// let issued = store.register(verified).unwrap();
///
/// let token = BearerToken::new(issued.token.expose_secret().as_str());
/// assert_eq!(store.resolve(&token).unwrap().name, "Alice");
/// ```
#[derive(Debug)]
pub struct InMemoryCredentialStore {
    inner: RwLock<Accounts>,
    token_bytes: usize,
    hash_cost: u32,
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCredentialStore {
    /// Creates an empty store issuing 32-byte token secrets.
    pub fn new() -> Self {
        Self::with_token_bytes(32)
    }

    /// Creates an empty store issuing `token_bytes` random bytes per token.
    pub fn with_token_bytes(token_bytes: usize) -> Self {
        Self {
            inner: RwLock::new(Accounts::default()),
            token_bytes: token_bytes.max(16),
            hash_cost: DEFAULT_HASH_COST,
        }
    }

    /// Sets the bcrypt cost for new passwords, clamped to `4..=31`.
    ///
    /// Existing hashes keep the cost they were created with.
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost.clamp(MIN_HASH_COST, MAX_HASH_COST);
        self
    }

    /// Grants the admin role to an existing account.
    ///
    /// Registration never does this; admins are provisioned by an operator.
    /// Tokens already issued resolve with the new role immediately.
    pub fn grant_admin(&self, id: PrincipalId) -> bool {
        let mut inner = self.inner.write();
        let Some(index) = usize::try_from(id.get())
            .ok()
            .and_then(|i| i.checked_sub(1))
            .filter(|i| *i < inner.accounts.len())
        else {
            return false;
        };

        inner.accounts[index].account.is_admin = true;
        tracing::info!(principal = %id, "granted admin role");
        true
    }

    /// Returns the public data of an account.
    pub fn account(&self, id: PrincipalId) -> Option<Account> {
        self.inner.read().by_id(id).map(|r| r.account.clone())
    }

    fn issue(&self, inner: &mut Accounts, account: &Account) -> IssuedToken {
        inner.last_token_id += 1;
        let token_id = inner.last_token_id;
        let plain = random_hex(self.token_bytes);

        inner.tokens.insert(
            token_id,
            TokenRecord {
                account: account.id,
                digest: sha256_hex(plain.as_bytes()),
            },
        );

        IssuedToken {
            account: account.clone(),
            token: Secret::new(format!("{}|{}", token_id, plain)),
        }
    }
}

impl ProfileDirectory for InMemoryCredentialStore {
    fn display_name(&self, id: PrincipalId) -> Option<String> {
        self.inner.read().by_id(id).map(|r| r.account.name.clone())
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn register(&self, registration: VerifiedRegistration) -> Result<IssuedToken, Error> {
        let password_hash = bcrypt::hash(registration.password.expose_secret(), self.hash_cost)
            .map_err(|e| StorageError::with_source("hashing password", e))?;

        let mut inner = self.inner.write();

        let mut errors = ValidationError::new();
        if inner
            .accounts
            .iter()
            .any(|r| r.account.email == registration.email)
        {
            errors.push("email", "has already been taken");
        }
        if inner
            .accounts
            .iter()
            .any(|r| r.account.phone == registration.phone)
        {
            errors.push("phone", "has already been taken");
        }
        errors.into_result()?;

        let account = Account {
            id: PrincipalId::new(inner.accounts.len() as u64 + 1),
            name: registration.name,
            email: registration.email,
            phone: registration.phone,
            is_admin: false,
        };

        inner.accounts.push(AccountRecord {
            account: account.clone(),
            password_hash,
        });
        tracing::info!(principal = %account.id, "registered account");

        Ok(self.issue(&mut inner, &account))
    }

    fn login(&self, login: &str, password: &Secret<String>) -> Result<IssuedToken, AuthError> {
        let candidate = self
            .inner
            .read()
            .by_login(login.trim())
            .map(|r| (r.account.id, r.password_hash.clone()));

        let Some((id, _)) = candidate.filter(|(_, hash)| verify_password(password, hash)) else {
            tracing::debug!("login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        let mut inner = self.inner.write();
        let account = inner
            .by_id(id)
            .map(|r| r.account.clone())
            .ok_or(AuthError::InvalidCredentials)?;

        tracing::debug!(principal = %account.id, "login accepted");
        Ok(self.issue(&mut inner, &account))
    }

    fn logout(&self, token: &BearerToken) -> bool {
        let Some((id, plain)) = token.split() else {
            return false;
        };

        let mut inner = self.inner.write();
        let live = inner
            .tokens
            .get(&id)
            .is_some_and(|t| digest_matches(&t.digest, plain));
        if live {
            inner.tokens.remove(&id);
        }
        live
    }

    fn resolve(&self, token: &BearerToken) -> Option<Principal> {
        let (id, plain) = token.split()?;
        let inner = self.inner.read();
        let record = inner.tokens.get(&id)?;
        if !digest_matches(&record.digest, plain) {
            return None;
        }
        inner.by_id(record.account).map(|r| r.account.principal())
    }
}

fn verify_password(password: &Secret<String>, hash: &str) -> bool {
    bcrypt::verify(password.expose_secret(), hash).unwrap_or_else(|e| {
        tracing::error!(error = %e, "stored password hash is unreadable");
        false
    })
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn digest_matches(stored: &str, plain: &str) -> bool {
    stored
        .as_bytes()
        .ct_eq(sha256_hex(plain.as_bytes()).as_bytes())
        .into()
}

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
