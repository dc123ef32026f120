use super::*;
use testenv_core::Secret;

const REQUIRED: [&str; 9] = [
    "init-test-env",
    "--osm-testing-user",
    "osm_user",
    "--osm-testing-password",
    "osm_pw",
    "--off-testing-user",
    "off_user",
    "--off-testing-password",
    "off_pw",
];

fn parse(extra: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(REQUIRED.iter().chain(extra.iter()))
}

#[test]
fn test_required_flags_only() {
    let Ok(cli) = parse(&[]) else {
        panic!("required flags should parse");
    };

    let params = cli.invocation_parameters();
    assert_eq!(params.osm_testing.user, "osm_user");
    assert_eq!(params.osm_testing.password.expose(), "osm_pw");
    assert_eq!(params.off_testing.user, "off_user");
    assert_eq!(params.off_testing.password.expose(), "off_pw");
    assert_eq!(params.private_key_path, None);
    assert_eq!(params.seed_file, None);
    assert_eq!(params.object_storage, ObjectStorageParams::default());
    assert!(cli.settings.is_none());
    assert!(cli.readiness.is_none());
}

#[test]
fn test_missing_required_flag_is_usage_error() {
    let result = Cli::try_parse_from([
        "init-test-env",
        "--osm-testing-user",
        "osm_user",
        "--osm-testing-password",
        "osm_pw",
        "--off-testing-user",
        "off_user",
    ]);

    let Err(err) = result else {
        panic!("missing --off-testing-password should fail");
    };
    assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    assert!(err.to_string().contains("--off-testing-password"));
}

#[test]
fn test_optional_flags_flow_into_parameters() {
    let Ok(cli) = parse(&[
        "--ios-server-private-key-path",
        "/keys/server.p8",
        "--aws-s3-access-key-id",
        "AKIA",
        "--aws-s3-secret-access-key",
        "s3cr3t",
        "--aws-s3-region",
        "eu-central-1",
        "--aws-s3-bucket-name",
        "plante-test",
        "--seed-file",
        "/tmp/seed.sql",
    ]) else {
        panic!("optional flags should parse");
    };

    let params = cli.invocation_parameters();
    assert_eq!(params.private_key_path_or_default(), "/keys/server.p8");
    assert_eq!(params.seed_file, Some(PathBuf::from("/tmp/seed.sql")));
    assert_eq!(
        params.object_storage,
        ObjectStorageParams {
            access_key_id: Some("AKIA".to_string()),
            secret_access_key: Some(Secret::new("s3cr3t")),
            region: Some("eu-central-1".to_string()),
            bucket_name: Some("plante-test".to_string()),
        }
    );
}

#[test]
fn test_readiness_override_parses() {
    let Ok(cli) = parse(&["--readiness", "probe"]) else {
        panic!("probe should parse");
    };
    assert_eq!(cli.readiness, Some(ReadinessMode::Probe));

    let Err(err) = parse(&["--readiness", "sometimes"]) else {
        panic!("unknown readiness mode should fail");
    };
    assert!(err.to_string().contains("expected 'delay' or 'probe'"));
}
