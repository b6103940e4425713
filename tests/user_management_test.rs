mod common;

use common::{seed_super_admin, setup_app_data};

use mayfly_backend::errors::StoreError;
use mayfly_backend::services::permission_evaluator::{Actor, Role};
use mayfly_backend::stores::user_store::{NewUser, UserFilter, UserUpdate};

fn actor(user_id: i64, role: Role) -> Actor {
    Actor { user_id, role }
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
async fn seeded_super_admin_can_log_in_and_manage_accounts() {
    let app = setup_app_data().await;
    let root_id = seed_super_admin(&app).await;

    // Login by username and by email issue verifiable tokens.
    let outcome = app
        .auth_service
        .login("root", "rootsecret")
        .await
        .expect("seeded account should log in");
    assert_eq!(outcome.role, Role::SuperAdmin);

    let claims = app.tokens.verify(&outcome.token).expect("token should verify");
    assert_eq!(claims.user_id, root_id);
    assert_eq!(claims.role, Role::SuperAdmin);

    // Email identifiers are normalized to lowercase before lookup.
    let by_email = app
        .auth_service
        .login("ROOT@EXAMPLE.COM", "rootsecret")
        .await
        .unwrap();
    assert_eq!(by_email.user.id, root_id);

    // The super admin provisions an admin and a sales account.
    let root = actor(root_id, Role::SuperAdmin);
    let admin = app
        .user_store
        .create(root, new_user("manager", Role::Admin))
        .await
        .unwrap();
    app.user_store
        .create(root, new_user("seller", Role::Sales))
        .await
        .unwrap();

    // Those accounts can log in with their own credentials.
    let admin_login = app.auth_service.login("manager", "secret123").await.unwrap();
    assert_eq!(admin_login.role, Role::Admin);
    assert_eq!(admin_login.user.id, admin.id);
}

#[tokio::test]
async fn credential_failures_stay_generic() {
    let app = setup_app_data().await;
    seed_super_admin(&app).await;

    let wrong_password = app
        .auth_service
        .login("root", "not-the-password")
        .await
        .unwrap_err();
    let unknown_user = app
        .auth_service
        .login("ghost", "rootsecret")
        .await
        .unwrap_err();
    assert_eq!(wrong_password.to_string(), unknown_user.to_string());
}

#[tokio::test]
async fn admin_capabilities_are_limited_to_sales_accounts() {
    let app = setup_app_data().await;
    let root_id = seed_super_admin(&app).await;
    let root = actor(root_id, Role::SuperAdmin);

    let admin_user = app
        .user_store
        .create(root, new_user("manager", Role::Admin))
        .await
        .unwrap();
    let seller = app
        .user_store
        .create(root, new_user("seller", Role::Sales))
        .await
        .unwrap();
    let admin = actor(admin_user.id, Role::Admin);

    // Admin sees only the sales account in the listing.
    let visible = app
        .user_store
        .list(admin, UserFilter::default(), 1, 10)
        .await
        .unwrap();
    assert_eq!(visible.total, 1);
    assert_eq!(visible.users[0].id, seller.id);

    // Admin may manage the sales account.
    let renamed = app
        .user_store
        .update(
            admin,
            seller.id,
            UserUpdate {
                username: Some("seller-renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.username, "seller-renamed");

    // Admin may not create peers, touch the super admin, or see them.
    assert!(matches!(
        app.user_store
            .create(admin, new_user("peer", Role::Admin))
            .await
            .unwrap_err(),
        StoreError::Forbidden(_)
    ));
    assert!(matches!(
        app.user_store.delete(admin, root_id).await.unwrap_err(),
        StoreError::Forbidden(_)
    ));
    assert!(matches!(
        app.user_store.get_by_id(admin, root_id).await.unwrap_err(),
        StoreError::Forbidden(_)
    ));

    // Sales gets nothing at all.
    let sales = actor(seller.id, Role::Sales);
    assert!(matches!(
        app.user_store
            .list(sales, UserFilter::default(), 1, 10)
            .await
            .unwrap_err(),
        StoreError::Forbidden(_)
    ));
}

#[tokio::test]
async fn role_filter_and_search_compose_with_visibility() {
    let app = setup_app_data().await;
    let root_id = seed_super_admin(&app).await;
    let root = actor(root_id, Role::SuperAdmin);

    app.user_store
        .create(root, new_user("manager", Role::Admin))
        .await
        .unwrap();
    app.user_store
        .create(root, new_user("alice", Role::Sales))
        .await
        .unwrap();
    app.user_store
        .create(root, new_user("alan", Role::Sales))
        .await
        .unwrap();

    let sales_only = app
        .user_store
        .list(
            root,
            UserFilter {
                search: Some("al".to_string()),
                role: Some(Role::Sales),
            },
            1,
            10,
        )
        .await
        .unwrap();
    assert_eq!(sales_only.total, 2);
    assert!(sales_only.users.iter().all(|u| u.role == "sales"));

    // The seeded super admin shows up for the super admin only.
    let everyone = app
        .user_store
        .list(root, UserFilter::default(), 1, 10)
        .await
        .unwrap();
    assert_eq!(everyone.total, 4);
}
