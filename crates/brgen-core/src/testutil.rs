//! Test utilities for brgen
//!
//! Helpers shared by unit tests, integration tests and benchmarks for
//! parsing snippets and locating nodes in the result.

use crate::ast::{walk, NodeId, NodeKind};
use crate::config::ParseOptions;
use crate::parser::{ParseErrorKind, SyntaxTree};

/// Result type for test helpers
pub type TestResult<T> = Result<T, String>;

/// Parse `source` with default options
///
/// # Errors
/// Returns the rendered parse error
pub fn parse_ok(source: &str) -> TestResult<SyntaxTree> {
    parse_with(source, &ParseOptions::default())
}

/// Parse `source` with the given options
///
/// # Errors
/// Returns the rendered parse error
pub fn parse_with(source: &str, options: &ParseOptions) -> TestResult<SyntaxTree> {
    crate::parse_source(source, options).map_err(|e| format!("Parse error: {e}"))
}

/// Parse `source` and expect it to fail
///
/// # Errors
/// Returns error if parsing succeeds
pub fn parse_err(source: &str) -> TestResult<ParseErrorKind> {
    match crate::parse_source(source, &ParseOptions::default()) {
        Ok(_) => Err(format!("Expected parse error for {source:?}")),
        Err(e) => Ok(e.kind),
    }
}

/// Every node reachable from the program root, in pre-order
pub fn reachable(tree: &SyntaxTree) -> Vec<NodeId> {
    let mut out = Vec::new();
    walk(&tree.ast, tree.root, |id, _| out.push(id));
    out
}

/// Reachable nodes whose kind is named `name` (see [`NodeKind::name`])
pub fn nodes_named(tree: &SyntaxTree, name: &str) -> Vec<NodeId> {
    reachable(tree)
        .into_iter()
        .filter(|&id| tree.ast.kind(id).name() == name)
        .collect()
}

/// First reachable field declared as `name`
pub fn find_field(tree: &SyntaxTree, name: &str) -> Option<NodeId> {
    reachable(tree).into_iter().find(|&id| {
        matches!(tree.ast.kind(id), NodeKind::Field(_)) && tree.ast.member_name(id) == Some(name)
    })
}

/// Field names of a struct, `_` standing in for anonymous fields
pub fn struct_field_names(tree: &SyntaxTree, struct_type: NodeId) -> Vec<String> {
    tree.ast
        .struct_type(struct_type)
        .map(|st| {
            st.fields
                .iter()
                .map(|&f| tree.ast.member_name(f).unwrap_or("_").to_string())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_report_outcomes() {
        assert!(parse_ok("x :u8\n").is_ok());
        assert!(parse_ok("x :\n").is_err());
        assert!(matches!(
            parse_err("a == b == c\n"),
            Ok(ParseErrorKind::UnexpectedToken { .. })
        ));
        assert!(parse_err("x :u8\n").is_err());
    }

    #[test]
    fn find_field_by_name() {
        let tree = parse_ok("format A:\n  len :u16\n").unwrap();
        let field = find_field(&tree, "len").unwrap();
        assert!(tree.ast.field(field).is_some());
        assert!(find_field(&tree, "missing").is_none());
        assert_eq!(nodes_named(&tree, "format").len(), 1);
    }
}
