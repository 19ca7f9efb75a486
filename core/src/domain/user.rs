//! User identity data model.
//!
//! Validated newtypes keep invalid identities unrepresentable: a [`User`]
//! can only be built from a [`Username`], [`FullName`], and optional [`Bio`]
//! that already satisfy the length and character constraints. Credentials are
//! split into [`Password`] (inbound plaintext, zeroized on drop, never
//! serialized) and [`PasswordHash`] (the stored Argon2 PHC string, never
//! serialized).

use std::fmt;
use std::sync::OnceLock;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHasher, PasswordVerifier, SaltString};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroizing;

/// Validation errors returned by the identity constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyUsername,
    UsernameTooLong { max: usize },
    UsernameInvalidCharacters,
    EmptyFullName,
    FullNameTooLong { max: usize },
    BioTooLong { max: usize },
    EmptyBio,
    EmptyPassword,
    InvalidPasswordHash,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::UsernameTooLong { max } => {
                write!(f, "username must be at most {max} characters")
            }
            Self::UsernameInvalidCharacters => write!(
                f,
                "username may only contain letters, numbers, or underscores",
            ),
            Self::EmptyFullName => write!(f, "full name must not be empty"),
            Self::FullNameTooLong { max } => {
                write!(f, "full name must be at most {max} characters")
            }
            Self::BioTooLong { max } => write!(f, "bio must be at most {max} characters"),
            Self::EmptyBio => write!(f, "bio must not be empty; omit it instead"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::InvalidPasswordHash => write!(f, "password hash is not a valid PHC string"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Maximum allowed length for a username.
pub const USERNAME_MAX: usize = 20;
/// Maximum allowed length for a full name.
pub const FULL_NAME_MAX: usize = 30;
/// Maximum allowed length for a bio.
pub const BIO_MAX: usize = 60;

static USERNAME_RE: OnceLock<Regex> = OnceLock::new();

fn username_regex() -> &'static Regex {
    USERNAME_RE.get_or_init(|| {
        // Length is enforced separately; this regex constrains allowed characters.
        let pattern = "^[A-Za-z0-9_]+$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("username regex failed to compile: {error}"))
    })
}

/// Unique login and mention handle for a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a [`Username`] from owned input.
    pub fn new(username: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(username.into())
    }

    fn from_owned(username: String) -> Result<Self, UserValidationError> {
        if username.is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        if username.chars().count() > USERNAME_MAX {
            return Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX });
        }
        if !username_regex().is_match(&username) {
            return Err(UserValidationError::UsernameInvalidCharacters);
        }
        Ok(Self(username))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Human readable display name for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FullName(String);

impl FullName {
    /// Validate and construct a [`FullName`] from owned input.
    pub fn new(full_name: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(full_name.into())
    }

    fn from_owned(full_name: String) -> Result<Self, UserValidationError> {
        if full_name.trim().is_empty() {
            return Err(UserValidationError::EmptyFullName);
        }
        if full_name.chars().count() > FULL_NAME_MAX {
            return Err(UserValidationError::FullNameTooLong { max: FULL_NAME_MAX });
        }
        Ok(Self(full_name))
    }
}

impl AsRef<str> for FullName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for FullName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<FullName> for String {
    fn from(value: FullName) -> Self {
        value.0
    }
}

impl TryFrom<String> for FullName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Short free-text profile blurb.
///
/// An absent bio is modelled as `Option<Bio>`, never as an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Bio(String);

impl Bio {
    /// Validate and construct a [`Bio`] from owned input.
    pub fn new(bio: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(bio.into())
    }

    fn from_owned(bio: String) -> Result<Self, UserValidationError> {
        if bio.trim().is_empty() {
            return Err(UserValidationError::EmptyBio);
        }
        if bio.chars().count() > BIO_MAX {
            return Err(UserValidationError::BioTooLong { max: BIO_MAX });
        }
        Ok(Self(bio))
    }
}

impl AsRef<str> for Bio {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Bio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Bio> for String {
    fn from(value: Bio) -> Self {
        value.0
    }
}

impl TryFrom<String> for Bio {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Inbound plaintext password.
///
/// ## Invariants
/// - Non-empty; caller-provided whitespace is retained to avoid surprising
///   credential comparisons.
/// - The buffer is zeroized on drop and is never serialized or logged.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Validate and construct a [`Password`] from raw input.
    pub fn new(password: impl Into<String>) -> Result<Self, UserValidationError> {
        let password = password.into();
        if password.is_empty() {
            return Err(UserValidationError::EmptyPassword);
        }
        Ok(Self(Zeroizing::new(password)))
    }

    /// Password string provided by the caller.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Stored credential hash in PHC string format.
///
/// Adapters persist and reload the PHC string verbatim; it never appears in
/// serialized domain records.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash a plaintext password into a fresh Argon2id PHC string.
    pub fn hash(password: &Password) -> Result<Self, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let hashed = Argon2::default().hash_password(password.as_str().as_bytes(), &salt)?;
        Ok(Self(hashed.to_string()))
    }

    /// Wrap a PHC string after checking that it parses.
    pub fn from_phc_string(value: impl Into<String>) -> Result<Self, UserValidationError> {
        let value = value.into();
        argon2::password_hash::PasswordHash::new(&value)
            .map_err(|_| UserValidationError::InvalidPasswordHash)?;
        Ok(Self(value))
    }

    /// Borrow the PHC string for persistence.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Check a plaintext password against this hash.
    ///
    /// An unparseable stored hash verifies as `false` rather than erroring;
    /// the credential is unusable either way.
    pub fn verify(&self, password: &Password) -> bool {
        let Ok(parsed) = argon2::password_hash::PasswordHash::new(&self.0) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_str().as_bytes(), &parsed)
            .is_ok()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

/// Application user.
///
/// ## Invariants
/// - `friend_count` equals the number of friendship edges the user
///   participates in; `post_count` equals the number of posts the user owns.
///   Both are maintained transactionally by the repositories and clamped at
///   zero on decrement.
/// - The credential hash is deliberately not part of this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable identifier.
    pub id: UserId,
    /// Unique login handle.
    pub username: Username,
    /// Display name shown to other users.
    pub full_name: FullName,
    /// Optional profile blurb.
    pub bio: Option<Bio>,
    /// Denormalized count of friendship edges.
    pub friend_count: i32,
    /// Denormalized count of owned posts.
    pub post_count: i32,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
}
