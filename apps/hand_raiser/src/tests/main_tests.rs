use super::*;

#[test]
fn meeting_url_is_the_only_required_argument() {
    let args = Args::try_parse_from(["hand_raiser", "https://viam.zoom.us/j/123"]).expect("args");
    assert_eq!(args.url, "https://viam.zoom.us/j/123");
    assert!(!args.debug);
    assert!(!args.simulate_robot);
    assert!(args.config.is_none());

    assert!(Args::try_parse_from(["hand_raiser"]).is_err());
}

#[test]
fn flags_are_parsed() {
    let args = Args::try_parse_from([
        "hand_raiser",
        "--debug",
        "--config",
        "lab.toml",
        "--simulate-robot",
        "https://viam.zoom.us/j/123",
    ])
    .expect("args");
    assert!(args.debug);
    assert!(args.simulate_robot);
    assert_eq!(args.config, Some(PathBuf::from("lab.toml")));
}

#[test]
fn configured_robot_is_driven_over_http() {
    let settings = Settings {
        robot_url: Some("http://robot.local".into()),
        robot_secret: Some("secret".into()),
        ..Settings::default()
    };

    match servo_backend(&settings, false) {
        ServoBackend::Http { base_url, secret } => {
            assert_eq!(base_url, "http://robot.local");
            assert_eq!(secret.as_deref(), Some("secret"));
        }
        other => panic!("expected http backend, got {other:?}"),
    }
    assert!(matches!(
        servo_backend(&settings, true),
        ServoBackend::Simulated(_)
    ));
}

#[test]
fn missing_robot_falls_back_to_simulation() {
    assert!(matches!(
        servo_backend(&Settings::default(), false),
        ServoBackend::Simulated(_)
    ));
}
