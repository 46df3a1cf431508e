use coreos_release_core::{
    BuildId, FixedClock, ReleaseConfig, ReleaseError, ReleasePlan, ReleaseRequest, Version,
    VersionOverrides, VersionRecord,
};
use coreos_release_test_support::fixtures::{
    TEST_EPOCH, VersionFileFixture, day_start, version_file_text,
};

#[test]
fn plans_from_version_file_and_persists_the_result() -> anyhow::Result<()> {
    let fixture = VersionFileFixture::with_contents(&version_file_text(30, 1, 0, "", "29.0.0"))?;
    let config = ReleaseConfig::new(TEST_EPOCH);
    let current = VersionRecord::load(fixture.path())?;

    let clock = FixedClock(day_start(30) + 3_600);
    let request = ReleaseRequest {
        build_id: Some(BuildId::from_counter("master", 88)?),
        ..ReleaseRequest::default()
    };
    let plan = ReleasePlan::compute(&config.codec(), &clock, Some(&current.version), &request)?;
    assert_eq!(plan.tag, "v30.2.0");
    assert_eq!(plan.branch, "build-30");

    plan.record().store(fixture.path())?;
    assert_eq!(
        fixture.read()?,
        version_file_text(30, 2, 0, "master-88", "30.1.0")
    );

    let reloaded = VersionRecord::load(fixture.path())?;
    assert_eq!(reloaded, plan.record());
    Ok(())
}

#[test]
fn next_day_restarts_the_counter() -> anyhow::Result<()> {
    let config = ReleaseConfig::new(TEST_EPOCH).with_current_version("30.4.0");
    let current = config.current_version()?;
    let plan = ReleasePlan::compute(
        &config.codec(),
        &FixedClock(day_start(31)),
        current.as_ref(),
        &ReleaseRequest::default(),
    )?;
    assert_eq!(plan.version.to_string(), "31.0.0");
    assert_eq!(plan.sdk_version.as_deref(), Some("30.4.0"));
    Ok(())
}

#[test]
fn sdk_collision_leaves_the_version_file_untouched() -> anyhow::Result<()> {
    let original = version_file_text(5, 0, 0, "", "");
    let fixture = VersionFileFixture::with_contents(&original)?;
    let current: Version = VersionRecord::load(fixture.path())?.version;
    let request = ReleaseRequest {
        sdk_version: Some("5.1.0".to_string()),
        overrides: VersionOverrides::default(),
        build_id: None,
    };

    let result = ReleasePlan::compute(
        &ReleaseConfig::new(TEST_EPOCH).codec(),
        &FixedClock(day_start(5)),
        Some(&current),
        &request,
    );
    assert!(matches!(
        result,
        Err(ReleaseError::SdkVersionMatchesRelease { .. })
    ));
    assert_eq!(fixture.read()?, original);
    Ok(())
}

#[test]
fn missing_version_file_is_optional() -> anyhow::Result<()> {
    let fixture = VersionFileFixture::empty()?;
    assert!(VersionRecord::load_optional(fixture.path())?.is_none());
    assert!(matches!(
        VersionRecord::load(fixture.path()),
        Err(ReleaseError::Io { operation: "read", .. })
    ));
    Ok(())
}
