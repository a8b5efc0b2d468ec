/// Closed set of node kinds the rewriter reasons about.
///
/// Grammar kinds that carry no special meaning for matching or insertion
/// are kept as [`SyntaxKind::Other`] with their tree-sitter name, and
/// anonymous tokens (`(`, `fun`, `==`, ...) as [`SyntaxKind::Token`]. Two
/// nodes have the same kind exactly when their `SyntaxKind`s compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    SourceFile,

    // Declarations
    ClassDeclaration,
    ObjectDeclaration,
    CompanionObject,
    FunctionDeclaration,
    PropertyDeclaration,
    SecondaryConstructor,
    TypeAlias,

    // Declaration parts
    Modifiers,
    Annotation,
    PrimaryConstructor,
    DelegationSpecifier,
    ConstructorInvocation,
    ClassBody,
    EnumClassBody,
    FunctionBody,
    FunctionValueParameters,
    VariableDeclaration,
    UserType,
    TypeIdentifier,
    SimpleIdentifier,

    // Statements
    Statements,
    Assignment,
    DirectlyAssignableExpression,

    // Expressions
    CallExpression,
    CallSuffix,
    NavigationExpression,
    NavigationSuffix,
    ValueArguments,
    ValueArgument,
    ParenthesizedExpression,
    LambdaLiteral,
    AnonymousFunction,
    PrefixExpression,
    PostfixExpression,
    AsExpression,
    AdditiveExpression,
    MultiplicativeExpression,
    ComparisonExpression,
    EqualityExpression,
    ConjunctionExpression,
    DisjunctionExpression,
    ElvisExpression,
    InfixExpression,
    RangeExpression,
    CheckExpression,
    ThisExpression,
    StringLiteral,
    IntegerLiteral,
    RealLiteral,
    BooleanLiteral,
    CharacterLiteral,

    // Trivia
    LineComment,
    MultilineComment,

    Error,
    Token(&'static str),
    Other(&'static str),
}

impl SyntaxKind {
    /// Map a tree-sitter node onto its kind.
    pub fn of(node: &tree_sitter::Node<'_>) -> Self {
        if node.is_error() || node.is_missing() {
            return SyntaxKind::Error;
        }
        if !node.is_named() {
            return SyntaxKind::Token(node.kind());
        }
        Self::from_name(node.kind())
    }

    /// Map a named grammar kind onto its `SyntaxKind`.
    pub fn from_name(name: &'static str) -> Self {
        match name {
            "source_file" => SyntaxKind::SourceFile,
            "class_declaration" => SyntaxKind::ClassDeclaration,
            "object_declaration" => SyntaxKind::ObjectDeclaration,
            "companion_object" => SyntaxKind::CompanionObject,
            "function_declaration" => SyntaxKind::FunctionDeclaration,
            "property_declaration" => SyntaxKind::PropertyDeclaration,
            "secondary_constructor" => SyntaxKind::SecondaryConstructor,
            "type_alias" => SyntaxKind::TypeAlias,
            "modifiers" => SyntaxKind::Modifiers,
            "annotation" => SyntaxKind::Annotation,
            "primary_constructor" => SyntaxKind::PrimaryConstructor,
            "delegation_specifier" => SyntaxKind::DelegationSpecifier,
            "constructor_invocation" => SyntaxKind::ConstructorInvocation,
            "class_body" => SyntaxKind::ClassBody,
            "enum_class_body" => SyntaxKind::EnumClassBody,
            "function_body" => SyntaxKind::FunctionBody,
            "function_value_parameters" => SyntaxKind::FunctionValueParameters,
            "variable_declaration" => SyntaxKind::VariableDeclaration,
            "user_type" => SyntaxKind::UserType,
            "type_identifier" => SyntaxKind::TypeIdentifier,
            "simple_identifier" => SyntaxKind::SimpleIdentifier,
            "statements" => SyntaxKind::Statements,
            "assignment" => SyntaxKind::Assignment,
            "directly_assignable_expression" => SyntaxKind::DirectlyAssignableExpression,
            "call_expression" => SyntaxKind::CallExpression,
            "call_suffix" => SyntaxKind::CallSuffix,
            "navigation_expression" => SyntaxKind::NavigationExpression,
            "navigation_suffix" => SyntaxKind::NavigationSuffix,
            "value_arguments" => SyntaxKind::ValueArguments,
            "value_argument" => SyntaxKind::ValueArgument,
            "parenthesized_expression" => SyntaxKind::ParenthesizedExpression,
            "lambda_literal" => SyntaxKind::LambdaLiteral,
            "anonymous_function" => SyntaxKind::AnonymousFunction,
            "prefix_expression" => SyntaxKind::PrefixExpression,
            "postfix_expression" => SyntaxKind::PostfixExpression,
            "as_expression" => SyntaxKind::AsExpression,
            "additive_expression" => SyntaxKind::AdditiveExpression,
            "multiplicative_expression" => SyntaxKind::MultiplicativeExpression,
            "comparison_expression" => SyntaxKind::ComparisonExpression,
            "equality_expression" => SyntaxKind::EqualityExpression,
            "conjunction_expression" => SyntaxKind::ConjunctionExpression,
            "disjunction_expression" => SyntaxKind::DisjunctionExpression,
            "elvis_expression" => SyntaxKind::ElvisExpression,
            "infix_expression" => SyntaxKind::InfixExpression,
            "range_expression" => SyntaxKind::RangeExpression,
            "check_expression" => SyntaxKind::CheckExpression,
            "this_expression" => SyntaxKind::ThisExpression,
            "string_literal" => SyntaxKind::StringLiteral,
            "integer_literal" => SyntaxKind::IntegerLiteral,
            "real_literal" => SyntaxKind::RealLiteral,
            "boolean_literal" => SyntaxKind::BooleanLiteral,
            "character_literal" => SyntaxKind::CharacterLiteral,
            "line_comment" => SyntaxKind::LineComment,
            "multiline_comment" => SyntaxKind::MultilineComment,
            "ERROR" => SyntaxKind::Error,
            other => SyntaxKind::Other(other),
        }
    }

    /// Comments never take part in structural matching.
    pub fn is_trivia(self) -> bool {
        matches!(self, SyntaxKind::LineComment | SyntaxKind::MultilineComment)
    }

    /// Declarations the fragment inserter can edit.
    pub fn is_declaration(self) -> bool {
        matches!(
            self,
            SyntaxKind::ClassDeclaration
                | SyntaxKind::ObjectDeclaration
                | SyntaxKind::CompanionObject
                | SyntaxKind::FunctionDeclaration
                | SyntaxKind::PropertyDeclaration
                | SyntaxKind::SecondaryConstructor
                | SyntaxKind::TypeAlias
        )
    }

    /// Expressions built from two operands and an infix operator.
    pub fn is_binary_expression(self) -> bool {
        matches!(
            self,
            SyntaxKind::AdditiveExpression
                | SyntaxKind::MultiplicativeExpression
                | SyntaxKind::ComparisonExpression
                | SyntaxKind::EqualityExpression
                | SyntaxKind::ConjunctionExpression
                | SyntaxKind::DisjunctionExpression
                | SyntaxKind::ElvisExpression
                | SyntaxKind::InfixExpression
                | SyntaxKind::RangeExpression
                | SyntaxKind::CheckExpression
        )
    }

    /// Short name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            SyntaxKind::SourceFile => "source_file",
            SyntaxKind::ClassDeclaration => "class_declaration",
            SyntaxKind::ObjectDeclaration => "object_declaration",
            SyntaxKind::CompanionObject => "companion_object",
            SyntaxKind::FunctionDeclaration => "function_declaration",
            SyntaxKind::PropertyDeclaration => "property_declaration",
            SyntaxKind::SecondaryConstructor => "secondary_constructor",
            SyntaxKind::TypeAlias => "type_alias",
            SyntaxKind::Modifiers => "modifiers",
            SyntaxKind::Annotation => "annotation",
            SyntaxKind::PrimaryConstructor => "primary_constructor",
            SyntaxKind::DelegationSpecifier => "delegation_specifier",
            SyntaxKind::ConstructorInvocation => "constructor_invocation",
            SyntaxKind::ClassBody => "class_body",
            SyntaxKind::EnumClassBody => "enum_class_body",
            SyntaxKind::FunctionBody => "function_body",
            SyntaxKind::FunctionValueParameters => "function_value_parameters",
            SyntaxKind::VariableDeclaration => "variable_declaration",
            SyntaxKind::UserType => "user_type",
            SyntaxKind::TypeIdentifier => "type_identifier",
            SyntaxKind::SimpleIdentifier => "simple_identifier",
            SyntaxKind::Statements => "statements",
            SyntaxKind::Assignment => "assignment",
            SyntaxKind::DirectlyAssignableExpression => "directly_assignable_expression",
            SyntaxKind::CallExpression => "call_expression",
            SyntaxKind::CallSuffix => "call_suffix",
            SyntaxKind::NavigationExpression => "navigation_expression",
            SyntaxKind::NavigationSuffix => "navigation_suffix",
            SyntaxKind::ValueArguments => "value_arguments",
            SyntaxKind::ValueArgument => "value_argument",
            SyntaxKind::ParenthesizedExpression => "parenthesized_expression",
            SyntaxKind::LambdaLiteral => "lambda_literal",
            SyntaxKind::AnonymousFunction => "anonymous_function",
            SyntaxKind::PrefixExpression => "prefix_expression",
            SyntaxKind::PostfixExpression => "postfix_expression",
            SyntaxKind::AsExpression => "as_expression",
            SyntaxKind::AdditiveExpression => "additive_expression",
            SyntaxKind::MultiplicativeExpression => "multiplicative_expression",
            SyntaxKind::ComparisonExpression => "comparison_expression",
            SyntaxKind::EqualityExpression => "equality_expression",
            SyntaxKind::ConjunctionExpression => "conjunction_expression",
            SyntaxKind::DisjunctionExpression => "disjunction_expression",
            SyntaxKind::ElvisExpression => "elvis_expression",
            SyntaxKind::InfixExpression => "infix_expression",
            SyntaxKind::RangeExpression => "range_expression",
            SyntaxKind::CheckExpression => "check_expression",
            SyntaxKind::ThisExpression => "this_expression",
            SyntaxKind::StringLiteral => "string_literal",
            SyntaxKind::IntegerLiteral => "integer_literal",
            SyntaxKind::RealLiteral => "real_literal",
            SyntaxKind::BooleanLiteral => "boolean_literal",
            SyntaxKind::CharacterLiteral => "character_literal",
            SyntaxKind::LineComment => "line_comment",
            SyntaxKind::MultilineComment => "multiline_comment",
            SyntaxKind::Error => "ERROR",
            SyntaxKind::Token(text) => text,
            SyntaxKind::Other(name) => name,
        }
    }
}

impl std::fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_round_trip() {
        for name in [
            "source_file",
            "class_declaration",
            "function_declaration",
            "call_expression",
            "equality_expression",
            "multiline_comment",
        ] {
            assert_eq!(SyntaxKind::from_name(name).name(), name);
        }
    }

    #[test]
    fn unknown_names_are_kept() {
        let kind = SyntaxKind::from_name("when_expression");
        assert_eq!(kind, SyntaxKind::Other("when_expression"));
        assert_eq!(kind.to_string(), "when_expression");
    }

    #[test]
    fn classification() {
        assert!(SyntaxKind::LineComment.is_trivia());
        assert!(!SyntaxKind::SimpleIdentifier.is_trivia());
        assert!(SyntaxKind::ClassDeclaration.is_declaration());
        assert!(!SyntaxKind::ClassBody.is_declaration());
        assert!(SyntaxKind::ConjunctionExpression.is_binary_expression());
        assert!(!SyntaxKind::CallExpression.is_binary_expression());
    }
}
