//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{CreateUser, Role, UpdatePassword, UpdateUser, User, UserClaims, UserQuery},
    policy::Permission,
    repository::{users::NewUser, Repository},
    services::storage::{ImageCategory, ImageStorage, ImageUpload},
    validation::validate,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    storage: ImageStorage,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, storage: ImageStorage, config: AuthConfig) -> Self {
        Self {
            repository,
            storage,
            config,
        }
    }

    /// Authenticate by username or email and return a JWT token
    pub async fn authenticate(&self, login: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_login(login.trim())
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid login or password".to_string()))?;

        if !verify_password(&user.password, password)? {
            tracing::info!(login = %login, "failed login attempt");
            return Err(AppError::Authentication("Invalid login or password".to_string()));
        }

        let token = self.create_token_for_user(&user)?;
        tracing::info!(user_id = user.id, role = %user.role, "user logged in");
        Ok((token, user))
    }

    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        UserClaims::for_user(user, self.config.jwt_expiration_hours)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    pub fn registration_open(&self) -> bool {
        self.config.allow_registration
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    pub async fn get_by_email(&self, email: &str) -> AppResult<User> {
        self.repository.users.get_by_email(email).await
    }

    pub async fn search_users(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        self.repository.users.search(query).await
    }

    /// Public self-registration; the account is always a viewer
    pub async fn register(&self, data: CreateUser) -> AppResult<User> {
        if !self.config.allow_registration {
            return Err(AppError::Authorization("Registration is disabled".to_string()));
        }
        self.create_with_role(data, Role::Viewer).await
    }

    /// Account creation by a superadmin, with any role (viewer by default)
    pub async fn create_user(&self, data: CreateUser) -> AppResult<User> {
        let role = data.role.unwrap_or(Role::Viewer);
        self.create_with_role(data, role).await
    }

    async fn create_with_role(&self, data: CreateUser, role: Role) -> AppResult<User> {
        data.require_fields()?;
        validate(&data)?;

        let username = data.username.as_deref().unwrap_or_default().trim();
        let email = data.email.as_deref().unwrap_or_default().trim();
        self.ensure_available(Some(username), Some(email), None).await?;

        let user = self
            .repository
            .users
            .create(&NewUser {
                username: username.to_string(),
                email: email.to_string(),
                name: data.name.as_deref().unwrap_or_default().trim().to_string(),
                password_hash: hash_password(data.password.as_deref().unwrap_or_default())?,
                role,
            })
            .await?;

        tracing::info!(user_id = user.id, role = %user.role, "user created");
        Ok(user)
    }

    async fn ensure_available(&self, username: Option<&str>, email: Option<&str>, exclude_id: Option<i32>) -> AppResult<()> {
        if let Some(username) = username {
            if self.repository.users.username_exists(username, exclude_id).await? {
                return Err(AppError::Conflict("Username already exists".to_string()));
            }
        }
        if let Some(email) = email {
            if self.repository.users.email_exists(email, exclude_id).await? {
                return Err(AppError::Conflict("Email already exists".to_string()));
            }
        }
        Ok(())
    }

    pub async fn update_user(&self, id: i32, data: UpdateUser) -> AppResult<User> {
        validate(&data)?;
        self.repository.users.get_by_id(id).await?;
        self.ensure_available(
            data.username.as_deref().map(str::trim),
            data.email.as_deref().map(str::trim),
            Some(id),
        )
        .await?;
        self.repository.users.update(id, &data).await
    }

    /// Replace a profile image and remove the previous file
    pub async fn update_image(&self, id: i32, upload: ImageUpload) -> AppResult<User> {
        let previous = self.repository.users.get_by_id(id).await?.image;
        let stored = self
            .storage
            .save(ImageCategory::Users, &upload.filename, &upload.bytes)
            .await?;

        let user = match self.repository.users.set_image(id, Some(&stored)).await {
            Ok(user) => user,
            Err(e) => {
                self.storage.discard(Some(&stored)).await;
                return Err(e);
            }
        };
        self.storage.discard(previous.as_deref()).await;
        Ok(user)
    }

    /// Change a password. The current password is checked unless a
    /// superadmin resets someone else's.
    pub async fn update_password(&self, actor: &UserClaims, id: i32, data: UpdatePassword) -> AppResult<()> {
        let needs_current = actor.user_id == id || !actor.role.allows(Permission::ManageUsers);
        data.require_fields(needs_current)?;
        validate(&data)?;

        let user = self.repository.users.get_by_id(id).await?;
        if needs_current {
            let current = data.current_password.as_deref().unwrap_or_default();
            if !verify_password(&user.password, current)? {
                return Err(AppError::InvalidPassword);
            }
        }

        let hash = hash_password(data.new_password.as_deref().unwrap_or_default())?;
        self.repository.users.set_password(id, &hash).await?;
        tracing::info!(user_id = id, by = actor.user_id, "password changed");
        Ok(())
    }

    pub async fn update_role(&self, actor: &UserClaims, id: i32, role: Role) -> AppResult<User> {
        if actor.user_id == id && role != actor.role {
            return Err(AppError::BadRequest("You cannot change your own role".to_string()));
        }
        let user = self.repository.users.set_role(id, role).await?;
        tracing::info!(user_id = id, role = %role, by = actor.user_id, "role changed");
        Ok(user)
    }

    pub async fn delete_user(&self, actor: &UserClaims, id: i32) -> AppResult<()> {
        if actor.user_id == id {
            return Err(AppError::BadRequest("You cannot delete your own account".to_string()));
        }
        let user = self.repository.users.get_by_id(id).await?;
        self.repository.users.delete(id).await?;
        self.storage.discard(user.image.as_deref()).await;
        tracing::info!(user_id = id, by = actor.user_id, "user deleted");
        Ok(())
    }

    /// Create the configured superadmin on an empty installation
    pub async fn ensure_bootstrap_superadmin(&self) -> AppResult<()> {
        let Some(ref account) = self.config.bootstrap else {
            return Ok(());
        };
        if self.repository.users.count_by_role(Role::Superadmin).await? > 0 {
            return Ok(());
        }

        let user = self
            .repository
            .users
            .create(&NewUser {
                username: account.username.clone(),
                email: account.email.clone(),
                name: account.username.clone(),
                password_hash: hash_password(&account.password)?,
                role: Role::Superadmin,
            })
            .await?;
        tracing::warn!(user_id = user.id, username = %user.username, "bootstrap superadmin created");
        Ok(())
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Check a password against a stored Argon2 hash
pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
