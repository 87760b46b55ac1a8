//! User directory: password hashing, credential checks and the role gate
//!
//! The core never re-checks permissions. A front end authenticates once,
//! calls [`Identity::require`] for the operation's role, then invokes the
//! core operation.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::AccountSeed;
use crate::error::{ChecklistError, ChecklistResult};
use crate::store::UserStore;
use crate::types::{NewUser, Role, User};

/// An authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl Identity {
    /// Fail with `Forbidden` unless this identity's role satisfies `required`.
    pub fn require(&self, required: Role) -> ChecklistResult<()> {
        if self.role.satisfies(required) {
            Ok(())
        } else {
            Err(ChecklistError::Forbidden(format!(
                "'{}' needs the {} role",
                self.username, required
            )))
        }
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

/// Argon2id PHC string with a random salt
pub fn hash_password(password: &str) -> ChecklistResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ChecklistError::Auth(format!("could not hash password: {}", e)))
}

/// False for a wrong password or an unparseable hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Hash the password and store the account. Duplicate usernames are rejected.
pub fn add_user<S: UserStore + ?Sized>(store: &mut S, user: &NewUser) -> ChecklistResult<i64> {
    let hash = hash_password(&user.password)?;
    let id = store.insert_user(user, &hash)?;
    info!(username = %user.username, role = %user.role, "user added");
    Ok(id)
}

/// Unknown user and wrong password produce the same error.
pub fn authenticate<S: UserStore + ?Sized>(
    store: &S,
    username: &str,
    password: &str,
) -> ChecklistResult<Identity> {
    match store.find_user(username)? {
        Some(user) if verify_password(password, &user.password_hash) => Ok(Identity::from(&user)),
        _ => {
            warn!(username = %username, "rejected login");
            Err(ChecklistError::Auth("invalid username or password".to_string()))
        }
    }
}

/// Admin-only; an admin cannot remove their own account.
pub fn delete_user_as<S: UserStore + ?Sized>(
    store: &mut S,
    actor: &Identity,
    id: i64,
) -> ChecklistResult<()> {
    actor.require(Role::Admin)?;
    if actor.id == id {
        return Err(ChecklistError::Forbidden(
            "cannot delete your own account".to_string(),
        ));
    }
    if !store.delete_user(id)? {
        return Err(ChecklistError::NotFound(format!("user #{}", id)));
    }
    info!(id, by = %actor.username, "user deleted");
    Ok(())
}

/// Create each configured account whose username is not taken yet.
/// Returns the usernames that were created.
pub fn seed_default_accounts<S: UserStore + ?Sized>(
    store: &mut S,
    seeds: &[AccountSeed],
) -> ChecklistResult<Vec<String>> {
    let mut created = Vec::new();
    for seed in seeds {
        if store.find_user(&seed.username)?.is_some() {
            continue;
        }
        add_user(store, &seed.to_new_user())?;
        created.push(seed.username.clone());
    }
    Ok(created)
}
