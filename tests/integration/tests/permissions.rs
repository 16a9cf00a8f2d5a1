//! Permission checks against a live directory.

use dg_authz::{Caller, Category, Target};
use dg_model::{Application, User};
use dg_store::WriterStore;
use dg_integration_tests::TestEnv;

async fn seed_applications(env: &TestEnv) -> anyhow::Result<()> {
    let writer = env.router.resolve_writer("acme", None)?;
    writer.create_user(&User::new("jdoe")).await?;

    let mut crm = Application::new("crm").with_group("sales");
    crm.self_managed_groups = true;
    writer.create_application(&crm).await?;
    writer
        .create_application(&Application::new("erp").with_group("sales"))
        .await?;

    writer.add_user_to_group("jdoe", "crm", "sales").await?;
    writer.add_user_to_group("jdoe", "erp", "sales").await?;
    Ok(())
}

/// Tests that the admin role grants every category on any target.
#[tokio::test]
async fn admin_role_grants_everything() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let admin = Caller::with_roles(["dir_admin", "unrelated"]);

    assert!(env.evaluator.is_admin(&admin));
    assert!(env.evaluator.is_reader(&admin, "any-tenant", Some("any-storage")));
    assert!(env.evaluator.is_writer(&admin, "any-tenant", Some("any-storage")));
    assert!(env.evaluator.is_group_manager(&admin, "acme", "crm", "sales"));
    assert_eq!(env.evaluator.authorized_tenants(&admin, &env.config), ["acme", "solo"]);

    let nobody = Caller::with_roles(["unrelated"]);
    assert!(!env.evaluator.is_admin(&nobody));
    assert!(env.evaluator.authorized_tenants(&nobody, &env.config).is_empty());
    Ok(())
}

/// Tests the self-managed flag gating group membership.
#[tokio::test]
async fn self_managed_groups_follow_the_application_flag() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    seed_applications(&env).await?;
    let member = Caller::new(Some("jdoe"), ["DIR_ACME_READER"]);

    let crm = Target::tenant("acme").application("crm").group("sales");
    let erp = Target::tenant("acme").application("erp").group("sales");
    assert!(env.evaluator.is_member_of_self_managed_group(&member, &crm).await?);
    assert!(!env.evaluator.is_member_of_self_managed_group(&member, &erp).await?);

    let outsider = Caller::new(Some("asmith"), ["DIR_ACME_READER"]);
    assert!(!env.evaluator.is_member_of_self_managed_group(&outsider, &crm).await?);

    let missing = Target::tenant("acme").application("hr").group("sales");
    assert!(!env.evaluator.is_member_of_self_managed_group(&member, &missing).await?);
    let missing_group = Target::tenant("acme").application("crm").group("support");
    assert!(!env.evaluator.is_member_of_self_managed_group(&member, &missing_group).await?);

    assert!(
        env.evaluator
            .evaluate(Category::SelfManagedGroupMember, &member, &crm)
            .await?
    );
    Ok(())
}

/// Tests that group managers are distinct from group members.
#[tokio::test]
async fn managers_are_not_members() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    seed_applications(&env).await?;

    let manager = Caller::new(Some("boss"), ["SALES_MANAGERS"]);
    assert!(env.evaluator.is_group_manager(&manager, "acme", "crm", "sales"));
    let target = Target::tenant("acme").application("crm").group("sales");
    assert!(!env.evaluator.is_member_of_self_managed_group(&manager, &target).await?);

    let member = Caller::new(Some("jdoe"), ["SALES"]);
    assert!(!env.evaluator.is_group_manager(&member, "acme", "crm", "sales"));

    env.evaluator.check(Category::GroupManager, &manager, &target).await?;
    assert!(env
        .evaluator
        .check(Category::Writer, &manager, &Target::tenant("acme"))
        .await
        .is_err());
    Ok(())
}
