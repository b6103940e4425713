use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::LikeExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::errors::StoreError;
use crate::services::crypto;
use crate::services::permission_evaluator::{self, Action, Actor, Role, Target};
use crate::services::SequenceAllocator;
use crate::stores::{ensure_connected, escape_like};
use crate::types::db::user;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 20;
const PASSWORD_MIN: usize = 6;

/// Filter for the user listing.
#[derive(Clone, Debug, Default)]
pub struct UserFilter {
    /// Case-insensitive substring match over username OR email.
    pub search: Option<String>,
    pub role: Option<Role>,
}

pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Omitted role defaults to sales.
    pub role: Option<Role>,
}

/// Partial update; `None` fields are left untouched.
#[derive(Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug)]
pub struct UserPage {
    pub users: Vec<user::Model>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

/// User CRUD gated by the permission evaluator.
///
/// Every mutating operation runs the actor/target pair through
/// `permission_evaluator::decide` before touching storage; the evaluator's
/// denial reason is surfaced as a Forbidden error.
pub struct UserStore {
    db: DatabaseConnection,
    sequences: Arc<SequenceAllocator>,
}

impl UserStore {
    pub fn new(db: DatabaseConnection, sequences: Arc<SequenceAllocator>) -> Self {
        Self { db, sequences }
    }

    /// List users visible to the actor, newest first.
    ///
    /// super_admin sees everyone; admin sees only strictly lower-privileged
    /// roles; sales has no access to the listing at all.
    pub async fn list(
        &self,
        actor: Actor,
        filter: UserFilter,
        page: u64,
        page_size: u64,
    ) -> Result<UserPage, StoreError> {
        ensure_connected(&self.db).await?;

        let visible = self.visible_roles(actor)?;

        let mut condition = Condition::all().add(
            user::Column::Role.is_in(visible.iter().map(|r| r.as_str()).collect::<Vec<_>>()),
        );
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", escape_like(search));
            condition = condition.add(
                Condition::any()
                    .add(user::Column::Username.like(LikeExpr::new(&pattern).escape('\\')))
                    .add(user::Column::Email.like(LikeExpr::new(&pattern).escape('\\'))),
            );
        }
        if let Some(role) = filter.role {
            condition = condition.add(user::Column::Role.eq(role.as_str()));
        }

        let page = page.max(1);
        let page_size = page_size.clamp(1, 100);

        let total = user::Entity::find()
            .filter(condition.clone())
            .count(&self.db)
            .await
            .map_err(|e| StoreError::database("count_users", e))?;

        let users = user::Entity::find()
            .filter(condition)
            .order_by_desc(user::Column::Id)
            .offset((page - 1) * page_size)
            .limit(page_size)
            .all(&self.db)
            .await
            .map_err(|e| StoreError::database("list_users", e))?;

        Ok(UserPage {
            users,
            total,
            page,
            page_size,
            total_pages: total.div_ceil(page_size),
        })
    }

    pub async fn get_by_id(&self, actor: Actor, id: i64) -> Result<user::Model, StoreError> {
        ensure_connected(&self.db).await?;

        let user = self.find_required(id).await?;
        let role = stored_role(&user);
        // A user may always look at their own record; otherwise the listing
        // visibility rule applies.
        if user.id != actor.user_id && !self.visible_roles(actor)?.contains(&role) {
            return Err(StoreError::forbidden("insufficient privileges"));
        }
        Ok(user)
    }

    pub async fn create(&self, actor: Actor, input: NewUser) -> Result<user::Model, StoreError> {
        ensure_connected(&self.db).await?;

        let role = input.role.unwrap_or(Role::Sales);
        let decision =
            permission_evaluator::decide(Some(actor), Target::Proposed(role), Action::Create);
        if !decision.allowed {
            return Err(StoreError::forbidden(decision.reason));
        }

        let username = validate_username(&input.username)?;
        let email = validate_email(&input.email)?;
        validate_password(&input.password)?;
        self.ensure_unique(&username, &email, None).await?;

        let reservation = self.sequences.reserve_user_id().await?;
        let model = user::ActiveModel {
            id: Set(reservation.id()),
            username: Set(username),
            email: Set(email),
            password_hash: Set(crypto::hash_password(&input.password)?),
            role: Set(role.as_str().to_string()),
            created_at: Set(Utc::now().timestamp()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| StoreError::database("create_user", e))?;
        drop(reservation);

        tracing::info!(user_id = model.id, role = %role, "user created");
        Ok(model)
    }

    pub async fn update(
        &self,
        actor: Actor,
        id: i64,
        update: UserUpdate,
    ) -> Result<user::Model, StoreError> {
        ensure_connected(&self.db).await?;

        let current = self.find_required(id).await?;
        let current_role = stored_role(&current);
        let decision = permission_evaluator::decide(
            Some(actor),
            Target::Existing {
                user_id: current.id,
                role: current_role,
            },
            Action::Update,
        );
        if !decision.allowed {
            return Err(StoreError::forbidden(decision.reason));
        }

        // The evaluator cannot see whether the role is changing, so the
        // own-role rule lives here.
        if let Some(new_role) = update.role {
            if actor.user_id == id && new_role != current_role {
                return Err(StoreError::forbidden("cannot change own role"));
            }
        }

        let username = update
            .username
            .as_deref()
            .map(validate_username)
            .transpose()?;
        let email = update.email.as_deref().map(validate_email).transpose()?;
        if username.is_some() || email.is_some() {
            self.ensure_unique(
                username.as_deref().unwrap_or(&current.username),
                email.as_deref().unwrap_or(&current.email),
                Some(id),
            )
            .await?;
        }

        let mut active: user::ActiveModel = current.into();
        if let Some(username) = username {
            active.username = Set(username);
        }
        if let Some(email) = email {
            active.email = Set(email);
        }
        if let Some(password) = update.password.as_deref() {
            validate_password(password)?;
            active.password_hash = Set(crypto::hash_password(password)?);
        }
        if let Some(role) = update.role {
            active.role = Set(role.as_str().to_string());
        }

        let updated = active
            .update(&self.db)
            .await
            .map_err(|e| StoreError::database("update_user", e))?;
        tracing::info!(user_id = updated.id, "user updated");
        Ok(updated)
    }

    pub async fn delete(&self, actor: Actor, id: i64) -> Result<(), StoreError> {
        ensure_connected(&self.db).await?;

        let target = self.find_required(id).await?;
        let decision = permission_evaluator::decide(
            Some(actor),
            Target::Existing {
                user_id: target.id,
                role: stored_role(&target),
            },
            Action::Delete,
        );
        if !decision.allowed {
            return Err(StoreError::forbidden(decision.reason));
        }

        user::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| StoreError::database("delete_user", e))?;
        tracing::info!(user_id = id, "user deleted");
        Ok(())
    }

    /// Startup-only seeding path. The API cannot create a super_admin, so
    /// the first one is provisioned here, outside the permission
    /// evaluator. Returns None when an account with the username or email
    /// already exists.
    pub async fn seed_super_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<user::Model>, StoreError> {
        ensure_connected(&self.db).await?;

        let username = validate_username(username)?;
        let email = validate_email(email)?;
        validate_password(password)?;

        let existing = user::Entity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(&username))
                    .add(user::Column::Email.eq(&email)),
            )
            .one(&self.db)
            .await
            .map_err(|e| StoreError::database("check_user_uniqueness", e))?;
        if existing.is_some() {
            return Ok(None);
        }

        let reservation = self.sequences.reserve_user_id().await?;
        let model = user::ActiveModel {
            id: Set(reservation.id()),
            username: Set(username),
            email: Set(email),
            password_hash: Set(crypto::hash_password(password)?),
            role: Set(Role::SuperAdmin.as_str().to_string()),
            created_at: Set(Utc::now().timestamp()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| StoreError::database("seed_super_admin", e))?;
        drop(reservation);

        tracing::info!(user_id = model.id, "super admin account seeded");
        Ok(Some(model))
    }

    fn visible_roles(&self, actor: Actor) -> Result<Vec<Role>, StoreError> {
        match actor.role {
            Role::SuperAdmin => Ok(Role::ALL.to_vec()),
            Role::Admin => Ok(Role::ALL
                .into_iter()
                .filter(|r| *r < Role::Admin)
                .collect()),
            Role::Sales => Err(StoreError::forbidden("no management capability")),
        }
    }

    async fn find_required(&self, id: i64) -> Result<user::Model, StoreError> {
        user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| StoreError::database("find_user", e))?
            .ok_or_else(|| StoreError::not_found("user not found"))
    }

    async fn ensure_unique(
        &self,
        username: &str,
        email: &str,
        exclude_id: Option<i64>,
    ) -> Result<(), StoreError> {
        let mut query = user::Entity::find().filter(
            Condition::any()
                .add(user::Column::Username.eq(username))
                .add(user::Column::Email.eq(email)),
        );
        if let Some(id) = exclude_id {
            query = query.filter(user::Column::Id.ne(id));
        }
        let clash = query
            .one(&self.db)
            .await
            .map_err(|e| StoreError::database("check_user_uniqueness", e))?;
        match clash {
            Some(existing) if existing.username == username => {
                Err(StoreError::conflict("username already exists"))
            }
            Some(_) => Err(StoreError::conflict("email already exists")),
            None => Ok(()),
        }
    }
}

/// Role column as an enum; unknown strings degrade to the lowest privilege.
fn stored_role(user: &user::Model) -> Role {
    user.role.parse().unwrap_or(Role::Sales)
}

fn validate_username(raw: &str) -> Result<String, StoreError> {
    let username = raw.trim();
    if username.chars().count() < USERNAME_MIN || username.chars().count() > USERNAME_MAX {
        return Err(StoreError::validation(
            "username must be between 3 and 20 characters",
        ));
    }
    Ok(username.to_string())
}

fn validate_email(raw: &str) -> Result<String, StoreError> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(StoreError::validation("a valid email address is required"));
    }
    Ok(email)
}

fn validate_password(password: &str) -> Result<(), StoreError> {
    if password.chars().count() < PASSWORD_MIN {
        return Err(StoreError::validation(
            "password must be at least 6 characters",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;

    async fn setup() -> UserStore {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to create test database");
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
        let sequences = Arc::new(SequenceAllocator::new(db.clone()));
        UserStore::new(db, sequences)
    }

    fn super_admin() -> Actor {
        Actor {
            user_id: 1000,
            role: Role::SuperAdmin,
        }
    }

    fn admin(user_id: i64) -> Actor {
        Actor {
            user_id,
            role: Role::Admin,
        }
    }

    fn new_user(username: &str, role: Role) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: "secret123".to_string(),
            role: Some(role),
        }
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids_and_hashes_the_password() {
        let store = setup().await;
        let first = store
            .create(super_admin(), new_user("alice", Role::Sales))
            .await
            .unwrap();
        let second = store
            .create(super_admin(), new_user("bob", Role::Sales))
            .await
            .unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_ne!(first.password_hash, "secret123");
        assert!(crypto::verify_password("secret123", &first.password_hash));
    }

    #[tokio::test]
    async fn create_normalizes_username_and_email() {
        let store = setup().await;
        let user = store
            .create(
                super_admin(),
                NewUser {
                    username: "  alice  ".to_string(),
                    email: "Alice@Example.COM".to_string(),
                    password: "secret123".to_string(),
                    role: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.role, "sales");
    }

    #[tokio::test]
    async fn create_rejects_short_username_email_and_password() {
        let store = setup().await;
        let mut bad_username = new_user("alice", Role::Sales);
        bad_username.username = "ab".to_string();
        assert!(matches!(
            store.create(super_admin(), bad_username).await.unwrap_err(),
            StoreError::Validation(_)
        ));

        let mut bad_email = new_user("alice", Role::Sales);
        bad_email.email = "not-an-email".to_string();
        assert!(matches!(
            store.create(super_admin(), bad_email).await.unwrap_err(),
            StoreError::Validation(_)
        ));

        let mut bad_password = new_user("alice", Role::Sales);
        bad_password.password = "short".to_string();
        assert!(matches!(
            store.create(super_admin(), bad_password).await.unwrap_err(),
            StoreError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn duplicate_username_and_email_conflict() {
        let store = setup().await;
        store
            .create(super_admin(), new_user("alice", Role::Sales))
            .await
            .unwrap();

        let err = store
            .create(super_admin(), new_user("alice", Role::Sales))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "username already exists");

        let mut same_email = new_user("alicia", Role::Sales);
        same_email.email = "alice@example.com".to_string();
        let err = store.create(super_admin(), same_email).await.unwrap_err();
        assert_eq!(err.to_string(), "email already exists");
    }

    #[tokio::test]
    async fn admin_may_only_create_sales_accounts() {
        let store = setup().await;
        let actor = admin(50);
        store
            .create(actor, new_user("seller", Role::Sales))
            .await
            .unwrap();

        let err = store
            .create(actor, new_user("peer", Role::Admin))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "admin may only create sales accounts");
    }

    #[tokio::test]
    async fn super_admin_accounts_cannot_be_created() {
        let store = setup().await;
        let err = store
            .create(super_admin(), new_user("root2", Role::SuperAdmin))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)));
    }

    #[tokio::test]
    async fn listing_applies_the_visibility_filter() {
        let store = setup().await;
        store
            .create(super_admin(), new_user("seller", Role::Sales))
            .await
            .unwrap();
        store
            .create(super_admin(), new_user("manager", Role::Admin))
            .await
            .unwrap();

        let all = store
            .list(super_admin(), UserFilter::default(), 1, 20)
            .await
            .unwrap();
        assert_eq!(all.total, 2);

        // Admin only sees strictly lower-privileged accounts.
        let visible = store
            .list(admin(50), UserFilter::default(), 1, 20)
            .await
            .unwrap();
        assert_eq!(visible.total, 1);
        assert_eq!(visible.users[0].username, "seller");

        let err = store
            .list(
                Actor {
                    user_id: 60,
                    role: Role::Sales,
                },
                UserFilter::default(),
                1,
                20,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)));
    }

    #[tokio::test]
    async fn listing_searches_username_and_email_with_escaping() {
        let store = setup().await;
        store
            .create(super_admin(), new_user("alice", Role::Sales))
            .await
            .unwrap();
        let mut odd = new_user("percent", Role::Sales);
        odd.username = "pct_100%".to_string();
        store.create(super_admin(), odd).await.unwrap();

        let by_email = store
            .list(
                super_admin(),
                UserFilter {
                    search: Some("ALICE@EXAMPLE".to_string()),
                    role: None,
                },
                1,
                20,
            )
            .await
            .unwrap();
        assert_eq!(by_email.total, 1);
        assert_eq!(by_email.users[0].username, "alice");

        // A literal % in the term must not act as a wildcard.
        let literal = store
            .list(
                super_admin(),
                UserFilter {
                    search: Some("100%".to_string()),
                    role: None,
                },
                1,
                20,
            )
            .await
            .unwrap();
        assert_eq!(literal.total, 1);
        assert_eq!(literal.users[0].username, "pct_100%");
    }

    #[tokio::test]
    async fn listing_paginates_newest_first() {
        let store = setup().await;
        for i in 0..5 {
            store
                .create(super_admin(), new_user(&format!("user{i}"), Role::Sales))
                .await
                .unwrap();
        }

        let page = store
            .list(super_admin(), UserFilter::default(), 2, 2)
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        let ids: Vec<i64> = page.users.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[tokio::test]
    async fn get_by_id_respects_visibility() {
        let store = setup().await;
        let manager = store
            .create(super_admin(), new_user("manager", Role::Admin))
            .await
            .unwrap();

        // Another admin cannot inspect a peer...
        let err = store.get_by_id(admin(50), manager.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)));

        // ...but can always see their own record.
        let own = store
            .get_by_id(admin(manager.id), manager.id)
            .await
            .unwrap();
        assert_eq!(own.username, "manager");
    }

    #[tokio::test]
    async fn update_rehashes_password_and_changes_role() {
        let store = setup().await;
        let seller = store
            .create(super_admin(), new_user("seller", Role::Sales))
            .await
            .unwrap();
        let old_hash = seller.password_hash.clone();

        let updated = store
            .update(
                super_admin(),
                seller.id,
                UserUpdate {
                    password: Some("newsecret".to_string()),
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.role, "admin");
        assert_ne!(updated.password_hash, old_hash);
        assert!(crypto::verify_password("newsecret", &updated.password_hash));
    }

    #[tokio::test]
    async fn update_rejects_changing_own_role() {
        let store = setup().await;
        let seller = store
            .create(super_admin(), new_user("seller", Role::Sales))
            .await
            .unwrap();

        // The peer rules already deny a self-update when claims match the
        // stored role, so the own-role rule matters for stale claims: a
        // token still saying admin while the row has been demoted to sales.
        let err = store
            .update(
                admin(seller.id),
                seller.id,
                UserUpdate {
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "cannot change own role");

        // Other fields on the own record stay updatable in that state.
        let renamed = store
            .update(
                admin(seller.id),
                seller.id,
                UserUpdate {
                    username: Some("seller2".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.username, "seller2");
    }

    #[tokio::test]
    async fn super_admin_cannot_demote_themselves() {
        let store = setup().await;
        // Seed a super_admin row directly; the API cannot create one.
        user::ActiveModel {
            id: Set(99),
            username: Set("root".to_string()),
            email: Set("root@example.com".to_string()),
            password_hash: Set("hash".to_string()),
            role: Set("super_admin".to_string()),
            created_at: Set(0),
        }
        .insert(&store.db)
        .await
        .unwrap();

        let err = store
            .update(
                Actor {
                    user_id: 99,
                    role: Role::SuperAdmin,
                },
                99,
                UserUpdate {
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)));
    }

    #[tokio::test]
    async fn update_uniqueness_excludes_the_record_itself() {
        let store = setup().await;
        let seller = store
            .create(super_admin(), new_user("seller", Role::Sales))
            .await
            .unwrap();

        // Re-submitting the current username is not a conflict.
        let same = store
            .update(
                super_admin(),
                seller.id,
                UserUpdate {
                    username: Some("seller".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(same.username, "seller");

        store
            .create(super_admin(), new_user("other", Role::Sales))
            .await
            .unwrap();
        let err = store
            .update(
                super_admin(),
                seller.id,
                UserUpdate {
                    username: Some("other".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "username already exists");
    }

    #[tokio::test]
    async fn delete_is_evaluator_gated() {
        let store = setup().await;
        let seller = store
            .create(super_admin(), new_user("seller", Role::Sales))
            .await
            .unwrap();
        let manager = store
            .create(super_admin(), new_user("manager", Role::Admin))
            .await
            .unwrap();

        // Admin cannot delete a peer.
        let err = store.delete(admin(50), manager.id).await.unwrap_err();
        assert_eq!(err.to_string(), "admin may only act on sales");

        // Self-delete is denied even for super_admin.
        let err = store
            .delete(admin(seller.id), seller.id)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "cannot act on self");

        store.delete(super_admin(), seller.id).await.unwrap();
        let err = store
            .get_by_id(super_admin(), seller.id)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn seeding_a_super_admin_is_idempotent() {
        let store = setup().await;
        let seeded = store
            .seed_super_admin("root", "root@example.com", "secret123")
            .await
            .unwrap()
            .expect("first seed should create the account");
        assert_eq!(seeded.role, "super_admin");

        let again = store
            .seed_super_admin("root", "root@example.com", "secret123")
            .await
            .unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn deleting_a_missing_user_is_not_found() {
        let store = setup().await;
        let err = store.delete(super_admin(), 404).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
