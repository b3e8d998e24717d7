use doc_tools::command::{FORBIDDEN_CHARS, validate_doc_tools_command};
use doc_tools::error::DocToolsError;

#[test]
fn test_every_forbidden_character_is_rejected() {
    for c in FORBIDDEN_CHARS {
        let command = format!("generate rpk-docs {c}rm");
        let err = validate_doc_tools_command(&command).unwrap_err();
        assert!(
            matches!(err, DocToolsError::Validation(_)),
            "`{c}` should be a validation error"
        );
    }
}

#[test]
fn test_path_traversal_is_rejected() {
    let err = validate_doc_tools_command("review ../../etc").unwrap_err();
    assert!(err.to_string().contains(".."));
}

#[test]
fn test_quotes_and_control_characters_are_rejected() {
    assert!(validate_doc_tools_command("review 'modules'").is_err());
    assert!(validate_doc_tools_command("review \"modules\"").is_err());
    assert!(validate_doc_tools_command("review modules\nmcp").is_err());
}

#[test]
fn test_plain_commands_are_split_into_argv() {
    let argv = validate_doc_tools_command("generate property-docs --tag v25.1.3").unwrap();
    assert_eq!(argv, vec!["generate", "property-docs", "--tag", "v25.1.3"]);
}

#[test]
fn test_leading_program_name_is_dropped() {
    let argv = validate_doc_tools_command("  doc-tools get-redpanda-version --beta ").unwrap();
    assert_eq!(argv, vec!["get-redpanda-version", "--beta"]);
}

#[test]
fn test_empty_and_bare_program_name_are_rejected() {
    assert!(validate_doc_tools_command("   ").is_err());
    assert!(validate_doc_tools_command("doc-tools").is_err());
}

#[test]
fn test_mcp_subcommand_is_blocked() {
    let err = validate_doc_tools_command("doc-tools mcp").unwrap_err();
    assert!(err.to_string().contains("mcp"));
}
