//! The embedded expression and condition language.
//!
//! Node text holds newline-delimited statements of the form
//! `Namespace.Var<op>Value[;]`. The same line grammar serves two purposes:
//! instruction nodes turn their lines into assignments, and guards compare
//! the store against them.
//!
//! Guards always test equality, whatever operator symbol the line uses, and
//! a guard string honours only one of `&&` or `||`. Both behaviours are
//! relied upon by existing projects and are kept as they are.

mod literal;

pub use literal::*;

use story_model::{Value, VariableStore, VariableTree};

use crate::error::ExpressionError;

/// Operators in the order they are searched for.
const OPERATORS: [Operator; 7] = [
    Operator::Equal,
    Operator::NotEqual,
    Operator::GreaterOrEqual,
    Operator::LessOrEqual,
    Operator::Greater,
    Operator::Less,
    Operator::Assign,
];

/// The operator symbol a statement was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterOrEqual,
    LessOrEqual,
    Greater,
    Less,
    Assign,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::GreaterOrEqual => ">=",
            Operator::LessOrEqual => "<=",
            Operator::Greater => ">",
            Operator::Less => "<",
            Operator::Assign => "=",
        }
    }
}

/// One parsed line: a dotted path, the operator it used, and a value.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub path: Vec<String>,
    pub operator: Operator,
    pub value: Value,
}

impl Statement {
    /// Path segments as string slices, for store lookups.
    pub fn path_segments(&self) -> Vec<&str> {
        self.path.iter().map(String::as_str).collect()
    }
}

fn is_ignored(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with("//")
}

/// Parse a single line.
///
/// Blank lines and `//` comments yield `Ok(None)`.
pub fn parse_statement(line: &str) -> Result<Option<Statement>, ExpressionError> {
    if is_ignored(line) {
        return Ok(None);
    }
    let line = line.trim();

    // Priority order, not position: the first operator kind found wins.
    let (operator, at) = OPERATORS
        .iter()
        .find_map(|op| line.find(op.symbol()).map(|at| (*op, at)))
        .ok_or_else(|| ExpressionError::MissingOperator(line.to_string()))?;

    let path: Vec<String> = line[..at]
        .split('.')
        .map(|segment| segment.trim().to_string())
        .collect();
    if path.iter().any(String::is_empty) {
        return Err(ExpressionError::EmptyPath(line.to_string()));
    }

    let raw_value = line[at + operator.symbol().len()..]
        .trim()
        .trim_end_matches(';')
        .trim_end();

    Ok(Some(Statement {
        path,
        operator,
        value: parse_literal(raw_value),
    }))
}

/// The first line that is neither blank nor a comment.
pub fn first_meaningful_line(text: &str) -> Option<&str> {
    text.lines().find(|line| !is_ignored(line)).map(str::trim)
}

/// Turn expression text into a sparse assignment tree.
///
/// Every statement is treated as an assignment regardless of its operator.
/// Later lines win when they hit the same variable.
pub fn assignments_from_expression(text: &str) -> Result<VariableTree, ExpressionError> {
    let mut tree = VariableTree::new();
    for line in text.lines() {
        if let Some(statement) = parse_statement(line)? {
            let mut partial = VariableTree::new();
            partial.set(&statement.path, statement.value);
            tree.merge(&partial);
        }
    }
    Ok(tree)
}

/// Evaluate a guard against the store.
///
/// `&&` takes precedence over `||` when deciding how to split; a string
/// using both is split on `&&` only. A guard with no statements is true.
pub fn evaluate_guard(text: &str, store: &VariableStore) -> Result<bool, ExpressionError> {
    let (parts, all): (Vec<&str>, bool) = if text.contains("&&") {
        (text.split("&&").collect(), true)
    } else if text.contains("||") {
        (text.split("||").collect(), false)
    } else {
        (vec![text], true)
    };

    let mut statements = Vec::with_capacity(parts.len());
    for part in parts {
        if let Some(line) = first_meaningful_line(part) {
            if let Some(statement) = parse_statement(line)? {
                statements.push(statement);
            }
        }
    }

    if statements.is_empty() {
        return Ok(true);
    }

    let holds = |statement: &Statement| {
        store
            .get_path(&statement.path_segments())
            .is_some_and(|current| current.loosely_equals(&statement.value))
    };

    Ok(if all {
        statements.iter().all(holds)
    } else {
        statements.iter().any(holds)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use story_model::Namespace;

    fn store() -> VariableStore {
        VariableStore::from_namespaces(&[
            Namespace::new("NS")
                .with_variable("A", true)
                .with_variable("B", false)
                .with_variable("S", "true")
                .with_variable("N", 3),
        ])
    }

    #[test]
    fn test_parse_statement_operators() {
        let statement = parse_statement("NS.A>=5;").unwrap().unwrap();
        assert_eq!(statement.path, vec!["NS", "A"]);
        assert_eq!(statement.operator, Operator::GreaterOrEqual);
        assert_eq!(statement.value, Value::Number(5.0));

        let statement = parse_statement("  NS.Name = \"Ada\" ; ").unwrap().unwrap();
        assert_eq!(statement.operator, Operator::Assign);
        assert_eq!(statement.value, Value::String("Ada".into()));
    }

    #[test]
    fn test_operator_priority_beats_position() {
        // `==` is searched before `<`, even though `<` appears earlier.
        let statement = parse_statement("NS.A<x==1").unwrap().unwrap();
        assert_eq!(statement.operator, Operator::Equal);
        assert_eq!(statement.path, vec!["NS", "A<x"]);
        assert_eq!(statement.value, Value::Number(1.0));
    }

    #[test]
    fn test_nested_path() {
        let statement = parse_statement("Quest.Stage.Done=true").unwrap().unwrap();
        assert_eq!(statement.path, vec!["Quest", "Stage", "Done"]);
    }

    #[test]
    fn test_ignored_lines() {
        assert_eq!(parse_statement("").unwrap(), None);
        assert_eq!(parse_statement("   ").unwrap(), None);
        assert_eq!(parse_statement("  // NS.A=1").unwrap(), None);
    }

    #[test]
    fn test_malformed_lines() {
        assert_eq!(
            parse_statement("NS.A").unwrap_err(),
            ExpressionError::MissingOperator("NS.A".into())
        );
        assert!(matches!(
            parse_statement("NS..A=1").unwrap_err(),
            ExpressionError::EmptyPath(_)
        ));
        assert!(matches!(
            parse_statement("=1").unwrap_err(),
            ExpressionError::EmptyPath(_)
        ));
    }

    #[test]
    fn test_assignments_from_expression() {
        let tree = assignments_from_expression("NS.A=5;\nNS.B=true;").unwrap();
        assert_eq!(tree.get(&["NS", "A"]), Some(&Value::Number(5.0)));
        assert_eq!(tree.get(&["NS", "B"]), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_assignments_last_line_wins() {
        let tree = assignments_from_expression("NS.A=1;\nNS.A=2;").unwrap();
        assert_eq!(tree.get(&["NS", "A"]), Some(&Value::Number(2.0)));
    }

    #[test]
    fn test_assignments_skip_comments_and_blanks() {
        let tree =
            assignments_from_expression("// set up\n\nNS.A=1;\n   // NS.B=2;\nOther.C==\"x\"")
                .unwrap();
        assert_eq!(tree.get(&["NS", "A"]), Some(&Value::Number(1.0)));
        assert_eq!(tree.get(&["NS", "B"]), None);
        assert_eq!(tree.get(&["Other", "C"]), Some(&Value::String("x".into())));
    }

    #[test]
    fn test_assignments_reject_malformed_line() {
        assert!(assignments_from_expression("NS.A=1;\nnonsense").is_err());
    }

    #[test]
    fn test_guard_ignores_operator_symbol() {
        let store = store();
        assert!(evaluate_guard("NS.A==true", &store).unwrap());
        assert!(evaluate_guard("NS.A>true", &store).unwrap());
        assert!(evaluate_guard("NS.A=true", &store).unwrap());
        // `!=` still tests equality.
        assert!(evaluate_guard("NS.A!=true", &store).unwrap());
        assert!(!evaluate_guard("NS.A==false", &store).unwrap());
        assert!(evaluate_guard("NS.N<=3", &store).unwrap());
        assert!(!evaluate_guard("NS.N>=4", &store).unwrap());
    }

    #[test]
    fn test_guard_normalizes_boolean_strings() {
        let store = store();
        assert!(evaluate_guard("NS.S==true", &store).unwrap());
        assert!(evaluate_guard("NS.A==\"true\"", &store).unwrap());
    }

    #[test]
    fn test_guard_missing_variable_is_false() {
        assert!(!evaluate_guard("NS.Missing==true", &store()).unwrap());
    }

    #[test]
    fn test_compound_guards() {
        let store = store();
        assert!(evaluate_guard("NS.A==true&&NS.B==false", &store).unwrap());
        assert!(!evaluate_guard("NS.A==true&&NS.B==true", &store).unwrap());
        assert!(evaluate_guard("NS.A==false||NS.B==false", &store).unwrap());
        assert!(!evaluate_guard("NS.A==false||NS.B==true", &store).unwrap());
    }

    #[test]
    fn test_mixed_guard_splits_on_and_only() {
        let store = store();
        // Parts: "NS.A==true" and "NS.B==true||NS.A==true". The second part
        // parses as a single statement whose value is the raw text after `==`.
        assert!(!evaluate_guard("NS.A==true&&NS.B==true||NS.A==true", &store).unwrap());
    }

    #[test]
    fn test_empty_guard_is_true() {
        assert!(evaluate_guard("", &store()).unwrap());
        assert!(evaluate_guard("// only a comment", &store()).unwrap());
    }

    #[test]
    fn test_first_meaningful_line() {
        assert_eq!(
            first_meaningful_line("// note\n\n  NS.A==true \nNS.B==false"),
            Some("NS.A==true")
        );
        assert_eq!(first_meaningful_line("// nothing"), None);
    }
}
