//! Unit tests for add-on activation.

use std::fs;

use rstest::{fixture, rstest};

use super::*;
use crate::host::HostVariant;
use crate::tests::{HostFixture, failing_builder, idle_builder, passing_builder, read_json};

struct Setup {
    fixture: HostFixture,
    host: HostInstallation,
    addon: PathBuf,
}

#[fixture]
fn setup() -> Setup {
    let fixture = HostFixture::new(&[HostVariant::Local]);
    let host = HostInstallation::new(HostVariant::Local, &fixture.app_support());
    let addon = fixture.workspace().join("my-addon");
    fs::create_dir_all(&addon).expect("addon dir");
    Setup {
        fixture,
        host,
        addon,
    }
}

fn request(setup: &Setup, create_link: bool, enable: bool) -> ActivationRequest<'_> {
    ActivationRequest {
        host: &setup.host,
        addon_path: &setup.addon,
        directory_name: "my-addon",
        create_link,
        enable,
    }
}

// ---------------------------------------------------------------------------
// Linking
// ---------------------------------------------------------------------------

#[cfg(unix)]
#[rstest]
fn links_addon_into_host(setup: Setup) {
    let outcome = activate(&request(&setup, true, false), &idle_builder()).expect("activate");
    let link = setup.fixture.addons_dir(HostVariant::Local).join("my-addon");
    assert_eq!(outcome.link, LinkOutcome::Created(link.clone()));
    assert_eq!(fs::read_link(&link).expect("read link"), setup.addon);
}

#[cfg(unix)]
#[rstest]
fn creates_missing_addons_directory(setup: Setup) {
    fs::remove_dir(setup.fixture.addons_dir(HostVariant::Local)).expect("remove addons");
    activate(&request(&setup, true, false), &idle_builder()).expect("activate");
    assert!(
        setup
            .fixture
            .addons_dir(HostVariant::Local)
            .join("my-addon")
            .is_dir()
    );
}

#[cfg(unix)]
#[rstest]
fn link_failure_is_fatal_and_skips_later_steps(setup: Setup) {
    let occupied = setup.fixture.addons_dir(HostVariant::Local).join("my-addon");
    fs::create_dir(&occupied).expect("occupy link path");

    let error =
        activate(&request(&setup, true, true), &idle_builder()).expect_err("link collides");

    assert!(matches!(error, ActivationError::Symlink { .. }));
    assert!(!setup.host.enabled_addons_path().exists());
    assert!(setup.addon.is_dir());
}

#[rstest]
#[case::unsupported_anywhere(io::ErrorKind::Unsupported, false, true)]
#[case::privileged_platform(io::ErrorKind::PermissionDenied, true, true)]
#[case::privileged_platform_collision(io::ErrorKind::AlreadyExists, true, true)]
#[case::denied_elsewhere(io::ErrorKind::PermissionDenied, false, false)]
#[case::collision_elsewhere(io::ErrorKind::AlreadyExists, false, false)]
fn link_failures_are_recoverable_only_where_links_are_unavailable(
    #[case] kind: io::ErrorKind,
    #[case] links_need_privileges: bool,
    #[case] recoverable: bool,
) {
    let error = io::Error::new(kind, "link failed");
    assert_eq!(
        link_failure_is_recoverable(&error, links_need_privileges),
        recoverable
    );
}

#[rstest]
fn no_link_when_not_requested(setup: Setup) {
    let outcome = activate(&request(&setup, false, false), &idle_builder()).expect("activate");
    assert_eq!(outcome.link, LinkOutcome::NotRequested);
    assert!(
        !setup
            .fixture
            .addons_dir(HostVariant::Local)
            .join("my-addon")
            .exists()
    );
}

// ---------------------------------------------------------------------------
// Build and enable
// ---------------------------------------------------------------------------

#[rstest]
fn builds_and_enables(setup: Setup) {
    let outcome = activate(&request(&setup, false, true), &passing_builder()).expect("activate");
    assert_eq!(outcome.build, BuildOutcome::Succeeded);
    assert_eq!(outcome.enable, EnableOutcome::Enabled);
    assert!(!outcome.is_degraded());
    let registry = read_json(&setup.host.enabled_addons_path());
    assert_eq!(registry["my-addon"], true);
}

#[rstest]
fn build_steps_run_in_order_inside_the_addon(setup: Setup) {
    let mut builder = crate::tests::MockBuilder::new();
    let mut sequence = mockall::Sequence::new();
    for expected in BuildStep::SEQUENCE {
        let addon = setup.addon.clone();
        builder
            .expect_run_step()
            .withf(move |directory, step| directory == addon && *step == expected)
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_, _| Ok(()));
    }
    activate(&request(&setup, false, true), &builder).expect("activate");
}

#[rstest]
fn build_failure_is_a_warning_and_still_enables(setup: Setup) {
    let outcome = activate(&request(&setup, false, true), &failing_builder()).expect("activate");
    assert_eq!(outcome.build, BuildOutcome::Failed(BuildStep::Install));
    assert_eq!(outcome.enable, EnableOutcome::Enabled);
    assert!(outcome.is_degraded());
    assert!(setup.addon.is_dir());
}

#[rstest]
fn disable_skips_build_and_registry(setup: Setup) {
    let outcome = activate(&request(&setup, false, false), &idle_builder()).expect("activate");
    assert_eq!(outcome.build, BuildOutcome::Skipped);
    assert_eq!(outcome.enable, EnableOutcome::Skipped);
    assert!(!setup.host.enabled_addons_path().exists());
}

#[rstest]
fn registry_failure_is_reported_without_undoing_the_addon(setup: Setup) {
    fs::write(setup.host.enabled_addons_path(), "not json").expect("seed registry");
    let outcome = activate(&request(&setup, false, true), &passing_builder()).expect("activate");
    assert_eq!(outcome.enable, EnableOutcome::Failed);
    assert!(outcome.is_degraded());
    assert!(setup.addon.is_dir());
}
