//! Routing across tenants and storages.

use dg_core::Error;
use dg_model::User;
use dg_store::{ReaderStore, SearchQuery, WriterStore};
use dg_integration_tests::TestEnv;

/// Tests that an id held by two storages resolves to the first one.
#[tokio::test]
async fn first_storage_wins_for_ids() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    env.router
        .resolve_writer("acme", Some("primary"))?
        .create_user(&User::new("x").with_mail("x@primary.org"))
        .await?;
    env.router
        .resolve_writer("acme", Some("secondary"))?
        .create_user(&User::new("x").with_mail("x@secondary.org"))
        .await?;

    let reader = env.router.resolve_reader("acme", None)?;
    let x = reader.get_user("x").await?.expect("x exists");
    assert_eq!(x.mail.as_deref(), Some("x@primary.org"));

    let secondary = env.router.resolve_reader("acme", Some("secondary"))?;
    let x = secondary.get_user("x").await?.expect("x exists");
    assert_eq!(x.mail.as_deref(), Some("x@secondary.org"));
    Ok(())
}

/// Tests that writes without a storage go to the default storage.
#[tokio::test]
async fn writes_use_the_default_storage() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let writer = env.router.resolve_writer("acme", None)?;
    assert_eq!(writer.storage(), "primary");
    writer.create_user(&User::new("y")).await?;

    assert!(env.gateway("acme", "primary")?.adds() > 0);
    assert_eq!(env.gateway("acme", "secondary")?.adds(), 0);
    Ok(())
}

/// Tests tenant-wide searches walking every storage.
#[tokio::test]
async fn searches_span_storages() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    for (storage, names) in [("primary", ["ann", "bob"]), ("secondary", ["cid", "dan"])] {
        let writer = env.router.resolve_writer("acme", Some(storage))?;
        for name in names {
            writer.create_user(&User::new(name).with_last_name("Smith")).await?;
        }
    }

    let reader = env.router.resolve_reader("acme", None)?;
    let mut probe = User::new("");
    probe.last_name = Some("smi*".to_string());

    let first = reader.search_users(&probe, &SearchQuery::new().with_size(3)).await?;
    assert_eq!(first.len(), 3);
    let rest = reader
        .search_users(&probe, &SearchQuery::new().with_size(3).with_token(first.next_token.clone()))
        .await?;
    assert_eq!(rest.len(), 1);
    assert!(!rest.has_more());

    let mut names: Vec<String> = first.results.into_iter().chain(rest.results).map(|u| u.username).collect();
    names.sort();
    assert_eq!(names, ["ann", "bob", "cid", "dan"]);
    Ok(())
}

/// Tests that routing failures stay distinguishable.
#[tokio::test]
async fn routing_failures_are_distinct() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    assert!(matches!(env.router.resolve_reader("nope", None), Err(Error::TenantNotFound(_))));
    assert!(matches!(
        env.router.resolve_writer("acme", Some("nope")),
        Err(Error::StorageNotFound { .. })
    ));

    let solo = env.router.resolve_reader("solo", None)?;
    let err = solo.get_application("crm").await.unwrap_err();
    assert!(matches!(err, Error::UnsupportedForStorage { .. }));
    Ok(())
}
