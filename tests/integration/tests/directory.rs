//! Store behavior through the full stack.

use dg_core::Error;
use dg_model::{Habilitation, Organization, PostalAddress, User};
use dg_store::{ReaderStore, WriterStore};
use dg_integration_tests::TestEnv;

fn full_user() -> User {
    User::new("jdoe")
        .with_first_name("John")
        .with_last_name("Doe")
        .with_mail("jdoe@acme.org")
        .with_address(PostalAddress::new(["1 rue de la Paix", "75002 Paris"]))
        .with_organization(Organization::new("hq"))
        .with_habilitation(Habilitation::new("admin", "crm").with_property("paris"))
        .with_habilitation(Habilitation::new("viewer", "erp"))
}

/// Tests that every writable field survives a create and a read.
#[tokio::test]
async fn created_users_read_back_unchanged() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let writer = env.router.resolve_writer("acme", None)?;
    writer.create_organization(&Organization::new("hq")).await?;

    let user = full_user();
    writer.create_user(&user).await?;
    let read = writer.get_user("jdoe").await?.expect("user exists");

    assert_eq!(read.username, user.username);
    assert_eq!(read.first_name, user.first_name);
    assert_eq!(read.last_name, user.last_name);
    assert_eq!(read.mail, user.mail);
    assert_eq!(read.address.as_ref().map(|a| &a.lines), user.address.as_ref().map(|a| &a.lines));
    assert_eq!(read.organization.as_ref().map(|o| o.identifier.as_str()), Some("hq"));

    let mut tokens: Vec<String> = read.habilitations.iter().map(Habilitation::encode).collect();
    tokens.sort();
    assert_eq!(tokens, ["paris_admin_crm", "viewer_erp"]);
    assert!(!read.has_password);
    Ok(())
}

/// Tests that equal address content lands on one child entry.
#[tokio::test]
async fn identical_addresses_share_an_identifier() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let writer = env.router.resolve_writer("acme", None)?;
    let gateway = env.gateway("acme", "primary")?;
    let address = PostalAddress::new(["10 Downing Street", "London"]);

    writer.create_user(&User::new("a").with_address(address.clone())).await?;
    let entries_after_first = gateway.entries();
    writer.create_user(&User::new("b").with_address(address.clone())).await?;

    let a = writer.get_user("a").await?.expect("a exists");
    let b = writer.get_user("b").await?.expect("b exists");
    let id_a = a.address.and_then(|x| x.id);
    assert_eq!(id_a, b.address.and_then(|x| x.id));
    assert_eq!(id_a, Some(address.content_id()));
    // the second create only stores the user entry
    assert_eq!(gateway.entries(), entries_after_first + 1);
    Ok(())
}

/// Tests that writing back an unchanged entity issues no modification.
#[tokio::test]
async fn unchanged_updates_touch_nothing() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let writer = env.router.resolve_writer("acme", None)?;
    let gateway = env.gateway("acme", "primary")?;
    writer.create_organization(&Organization::new("hq")).await?;
    writer.create_user(&full_user()).await?;

    let read = writer.get_user("jdoe").await?.expect("user exists");
    writer.update_user(&read).await?;
    assert_eq!(gateway.modifies(), 0);

    let mut changed = read.clone();
    changed.mail = Some("john.doe@acme.org".to_string());
    writer.update_user(&changed).await?;
    assert_eq!(gateway.modifies(), 1);
    assert_eq!(
        writer.get_user("jdoe").await?.and_then(|u| u.mail).as_deref(),
        Some("john.doe@acme.org")
    );
    Ok(())
}

fn parent_chain_len(organization: &Organization) -> usize {
    let mut length = 0;
    let mut current = organization.organization.as_deref();
    while let Some(parent) = current {
        length += 1;
        current = parent.organization.as_deref();
    }
    length
}

/// Tests that self and mutual parent references terminate.
#[tokio::test]
async fn organization_cycles_terminate() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let writer = env.router.resolve_writer("solo", None)?;

    writer
        .create_organization(&Organization::new("loop").with_parent(Organization::new("loop")))
        .await?;
    let looped = writer.get_organization("loop").await?.expect("loop exists");
    assert_eq!(looped.identifier, "loop");
    assert!(parent_chain_len(&looped) <= 1);

    writer
        .create_organization(&Organization::new("a").with_parent(Organization::new("b")))
        .await?;
    writer
        .create_organization(&Organization::new("b").with_parent(Organization::new("a")))
        .await?;
    let a = writer.get_organization("a").await?.expect("a exists");
    assert_eq!(a.parent_id(), Some("b"));
    // bounded by organization_depth = 3, plus the unresolved stub
    assert!(parent_chain_len(&a) <= 4);
    Ok(())
}

/// Tests credential validation edge cases.
#[tokio::test]
async fn credentials_need_a_stored_password_and_a_candidate() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let writer = env.router.resolve_writer("acme", None)?;
    writer.create_user(&User::new("nopass")).await?;
    writer.create_user(&User::new("withpass")).await?;
    writer.init_password("withpass", "Correct-Horse-9", false).await?;

    assert!(!writer.validate_credentials("nopass", Some("anything")).await?);
    assert!(!writer.validate_credentials("nopass", None).await?);
    assert!(!writer.validate_credentials("withpass", None).await?);
    assert!(!writer.validate_credentials("withpass", Some("")).await?);
    assert!(!writer.validate_credentials("withpass", Some("wrong-Horse-9")).await?);
    assert!(writer.validate_credentials("withpass", Some("Correct-Horse-9")).await?);
    assert!(writer.get_user("withpass").await?.expect("exists").has_password);

    let err = writer
        .change_password("withpass", "not-it", "Another-Horse-7")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidCredential));
    Ok(())
}

/// Tests habilitation token forms.
#[test]
fn habilitation_tokens_round_trip() {
    assert_eq!(Habilitation::decode("prop_role_app").encode(), "prop_role_app");

    let short = Habilitation::decode("role_app");
    assert_eq!(short.property, None);
    assert_eq!(short.role, "role");
    assert_eq!(short.application.as_deref(), Some("app"));

    let malformed = Habilitation::decode("malformed");
    assert_eq!(malformed.role, "malformed");
    assert_eq!(malformed.application, None);
}
