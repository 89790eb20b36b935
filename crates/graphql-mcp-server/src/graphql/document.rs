//! Static analysis of GraphQL documents sent by tool callers

use apollo_compiler::ast::{Definition, Document, OperationType, Selection};
use apollo_compiler::parser::Parser;

use crate::errors::GraphQLError;

/// Parse a GraphQL document, reporting syntax errors
pub fn parse(query: &str) -> Result<Document, GraphQLError> {
    Parser::new()
        .parse_ast(query, "query.graphql")
        .map_err(|e| GraphQLError::Document(Box::new(e)))
}

/// Collapse every run of whitespace into a single space
pub fn format_graphql_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether any operation in the document is a mutation.
///
/// Unparseable documents are reported as not being mutations; callers are
/// expected to have rejected them with [`parse`] first.
pub fn is_mutation(query: &str) -> bool {
    parse(query).is_ok_and(|document| {
        document.definitions.iter().any(|definition| {
            matches!(
                definition,
                Definition::OperationDefinition(operation)
                    if operation.operation_type == OperationType::Mutation
            )
        })
    })
}

/// Count every field selection in the document, one point per field.
///
/// Fields inside fragment definitions and inline fragments count, fragment
/// spreads themselves do not. An unparseable document scores one more than
/// `max_complexity` so that it can never pass a complexity check.
pub fn calculate_query_complexity(query: &str, max_complexity: usize) -> usize {
    let Ok(document) = parse(query) else {
        return max_complexity.saturating_add(1);
    };

    document
        .definitions
        .iter()
        .map(|definition| match definition {
            Definition::OperationDefinition(operation) => count_fields(&operation.selection_set),
            Definition::FragmentDefinition(fragment) => count_fields(&fragment.selection_set),
            _ => 0,
        })
        .sum()
}

fn count_fields(selection_set: &[Selection]) -> usize {
    selection_set
        .iter()
        .map(|selection| match selection {
            Selection::Field(field) => 1 + count_fields(&field.selection_set),
            Selection::InlineFragment(fragment) => count_fields(&fragment.selection_set),
            Selection::FragmentSpread(_) => 0,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn format_collapses_whitespace() {
        let query = "\n  query GetUser {\n\tuser(id: 1) {\n    name\n  }\n}\n";

        assert_eq!(
            format_graphql_query(query),
            "query GetUser { user(id: 1) { name } }"
        );
    }

    #[test]
    fn parse_reports_syntax_errors() {
        let error = parse("query { user(id: ").unwrap_err();
        let message = error.to_string();

        assert!(!message.is_empty());
        assert!(!message.contains('\n'), "{message}");
        assert!(matches!(error, GraphQLError::Document(_)));
    }

    #[rstest]
    #[case::shorthand("{ user { id } }", false)]
    #[case::query("query GetUser { user { id } }", false)]
    #[case::subscription("subscription OnUser { user { id } }", false)]
    #[case::mutation("mutation CreateUser { createUser { id } }", true)]
    #[case::second_operation("query A { a } mutation B { b }", true)]
    #[case::unparseable("mutation {", false)]
    fn detects_mutations(#[case] query: &str, #[case] expected: bool) {
        assert_eq!(is_mutation(query), expected);
    }

    #[rstest]
    #[case::typename("{ __typename }", 1)]
    #[case::nested("{ user { id name friends { id } } }", 5)]
    #[case::aliases("{ a: user { id } b: user { id } }", 4)]
    #[case::inline_fragment("{ node { ... on User { id name } } }", 3)]
    #[case::fragment_definition(
        "query { user { ...UserFields } } fragment UserFields on User { id name }",
        3
    )]
    #[case::multiple_operations("query A { a } query B { b c }", 3)]
    fn counts_every_field(#[case] query: &str, #[case] expected: usize) {
        assert_eq!(calculate_query_complexity(query, 100), expected);
    }

    #[test]
    fn unparseable_query_exceeds_the_ceiling() {
        assert_eq!(calculate_query_complexity("{ user {", 100), 101);
        assert_eq!(calculate_query_complexity("{", usize::MAX), usize::MAX);
    }
}
