use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        MoodspaceError::not_found("x")
            .to_string()
            .contains("not found:")
    );
    assert!(MoodspaceError::io("x").to_string().contains("io error:"));
    assert!(
        MoodspaceError::conversion("x")
            .to_string()
            .contains("conversion error:")
    );
    assert!(
        MoodspaceError::entity_creation("x")
            .to_string()
            .contains("entity creation error:")
    );
    assert!(
        MoodspaceError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        MoodspaceError::read_only("x")
            .to_string()
            .contains("read-only asset:")
    );
    assert!(
        MoodspaceError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = MoodspaceError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn from_io_keeps_context_chain() {
    let err = anyhow::Error::new(std::io::Error::other("disk full")).context("write 'a.png'");
    let mapped = MoodspaceError::from_io(err);
    let msg = mapped.to_string();
    assert!(msg.starts_with("io error:"));
    assert!(msg.contains("write 'a.png'"));
    assert!(msg.contains("disk full"));
}

#[test]
fn not_found_predicate() {
    assert!(MoodspaceError::not_found("a").is_not_found());
    assert!(!MoodspaceError::io("a").is_not_found());
}
