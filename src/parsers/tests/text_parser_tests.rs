use crate::parsers::text;

#[test]
fn test_collapse_whitespace() {
    assert_eq!(text::collapse_whitespace(""), "");
    assert_eq!(text::collapse_whitespace("  a \n\t b  "), "a b");
}

#[test]
fn test_join_paragraphs() {
    let paragraphs = vec!["First  line", "   ", "Second\nline"];
    assert_eq!(text::join_paragraphs(&paragraphs), "First line\nSecond line");
    let empty: Vec<String> = Vec::new();
    assert_eq!(text::join_paragraphs(&empty), "");
}

#[test]
fn test_keyword_match_is_case_insensitive() {
    let keywords = vec!["alzheim".to_string()];
    assert!(text::contains_any_keyword("New ALZHEIMER'S study", &keywords));
    assert!(text::contains_any_keyword("an Alzheim trial", &keywords));
    assert!(!text::contains_any_keyword("Parkinson's update", &keywords));

    // Blank keywords never match everything
    assert!(!text::contains_any_keyword("anything", &["  "]));
}

#[test]
fn test_split_byline() {
    assert_eq!(
        text::split_byline("By Alzheimer's Research UK | Friday 25 July 2025"),
        (
            Some("Alzheimer's Research UK".to_string()),
            Some("Friday 25 July 2025".to_string())
        )
    );
    assert_eq!(
        text::split_byline("Jane Doe|3 March 2024"),
        (Some("Jane Doe".to_string()), Some("3 March 2024".to_string()))
    );
    assert_eq!(
        text::split_byline("3 March 2024"),
        (None, Some("3 March 2024".to_string()))
    );
}
