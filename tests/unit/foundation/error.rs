use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        BlackboxError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        BlackboxError::telemetry("x")
            .to_string()
            .contains("telemetry error:")
    );
    assert!(BlackboxError::render("x").to_string().contains("render error:"));
    assert!(BlackboxError::export("x").to_string().contains("export error:"));
    assert!(
        BlackboxError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = BlackboxError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn json_errors_map_to_serde_variant() {
    let err: BlackboxError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(err, BlackboxError::Serde(_)));
}
