use electrocars::error::ElectroCarsError;

#[test]
fn error_constructors_group_1() {
    assert!(matches!(
        ElectroCarsError::config("x"),
        ElectroCarsError::Config { .. }
    ));
    assert!(matches!(
        ElectroCarsError::credential_incomplete("x"),
        ElectroCarsError::CredentialIncomplete { .. }
    ));
    assert!(matches!(ElectroCarsError::web("x"), ElectroCarsError::Web { .. }));
    assert!(matches!(ElectroCarsError::io("x"), ElectroCarsError::Io { .. }));
}

#[test]
fn error_constructors_group_2() {
    assert!(matches!(
        ElectroCarsError::serialization("s"),
        ElectroCarsError::Serialization { .. }
    ));
    assert!(matches!(
        ElectroCarsError::network("x"),
        ElectroCarsError::Network { .. }
    ));
    assert!(matches!(ElectroCarsError::api("x"), ElectroCarsError::Api { .. }));
    assert!(matches!(ElectroCarsError::auth("x"), ElectroCarsError::Auth { .. }));
    assert!(matches!(
        ElectroCarsError::timeout("x"),
        ElectroCarsError::Timeout { .. }
    ));
    assert!(matches!(
        ElectroCarsError::generic("x"),
        ElectroCarsError::Generic { .. }
    ));
}

#[test]
fn conversions_from_library_errors() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    assert!(matches!(ElectroCarsError::from(io), ElectroCarsError::Io { .. }));

    let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(matches!(
        ElectroCarsError::from(json),
        ElectroCarsError::Serialization { .. }
    ));
}

#[test]
fn display_messages() {
    let e = ElectroCarsError::validation("field", "bad");
    let s = format!("{}", e);
    assert!(s.contains("Validation error"));
    assert!(s.contains("field"));
}
