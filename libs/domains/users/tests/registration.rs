//! Registration and login flows over the in-memory repository

use domain_users::{
    Argon2Hasher, InMemoryUserRepository, NewUser, RegAuthService, UserError, UserRepository,
};
use test_utils::TestDataBuilder;

fn service() -> (RegAuthService<InMemoryUserRepository>, InMemoryUserRepository) {
    let repo = InMemoryUserRepository::new();
    let hasher = Argon2Hasher::new(1024, 1, 1).unwrap();
    (RegAuthService::with_hasher(repo.clone(), hasher), repo)
}

#[tokio::test]
async fn test_register_then_login() {
    let (service, repo) = service();
    let data = TestDataBuilder::from_test_name("test_register_then_login");
    let email = data.email("main");
    let password = data.password("main");

    let id = service
        .register(NewUser::new(email.to_uppercase(), password.clone()).with_name("Ankur", "Anand"))
        .await
        .unwrap();

    let stored = repo.find(id).await.unwrap();
    assert_eq!(stored.email, email);
    assert_ne!(stored.password_hash, password);

    let user = service
        .is_credential_valid(&email, &password)
        .await
        .unwrap()
        .expect("password should verify");
    assert_eq!(user.id, id);
    assert_eq!(user.first_name, "Ankur");

    assert!(service.is_credential_valid(&email, "wrong password").await.unwrap().is_none());
}

#[tokio::test]
async fn test_second_registration_is_duplicate() {
    let (service, repo) = service();

    service
        .register(NewUser::new("ankuranand@example.com", "ankuranand"))
        .await
        .unwrap();
    assert!(service.is_duplicate_registration("anKuranand@example.com").await.unwrap());

    let err = service
        .register(NewUser::new("AnkurAnand@Example.com", "different-password"))
        .await
        .unwrap_err();
    assert!(matches!(err, UserError::DuplicateEmail(_)));

    // bypassing the pre-check still hits the unique constraint
    let err = service
        .store_user(NewUser::new("ankuranand@example.com", "different-password"))
        .await
        .unwrap_err();
    assert!(matches!(err, UserError::DuplicateEmail(_)));

    assert_eq!(repo.len().await, 1);
}

#[tokio::test]
async fn test_concurrent_registrations_store_one_user() {
    let (service, repo) = service();

    let attempts: Vec<_> = (0..8)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .register(NewUser::new("race@example.com", format!("password-{}", i)))
                    .await
            })
        })
        .collect();

    let mut stored = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => stored += 1,
            Err(UserError::DuplicateEmail(email)) => assert_eq!(email, "race@example.com"),
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(stored, 1);
    assert_eq!(repo.len().await, 1);
}

#[tokio::test]
async fn test_unknown_account_login_is_not_found() {
    let (service, _) = service();

    let err = service
        .is_credential_valid("nobody@example.com", "ankuranand")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(!service.is_duplicate_registration("nobody@example.com").await.unwrap());
}

#[tokio::test]
async fn test_update_and_list_users() {
    let (service, _) = service();
    let data = TestDataBuilder::from_test_name("test_update_and_list_users");

    let first = service
        .register(NewUser::new(data.email("a"), data.password("a")))
        .await
        .unwrap();
    service
        .register(
            NewUser::new(data.email("b"), data.password("b")).with_username(data.name("user", "b")),
        )
        .await
        .unwrap();

    let renamed = data.name("user", "renamed");
    let mut user = service.get_user(first).await.unwrap();
    user.username = renamed.clone();
    service.update_user(user).await.unwrap();

    let users = service.list_users().await.unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().any(|u| u.username == renamed));
    assert!(users.iter().any(|u| u.username == data.name("user", "b")));

    let mut clash = service.get_user(first).await.unwrap();
    clash.email = data.email("b");
    assert!(matches!(
        service.update_user(clash).await,
        Err(UserError::DuplicateEmail(_))
    ));
}
