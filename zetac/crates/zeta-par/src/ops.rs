//! The operator table.
//!
//! A fixed array of operator descriptors drives precedence climbing.
//! Matching switches on the first character of the lookahead so a single
//! comparison rules out most of the table; alphabetic operators (`not`,
//! `mod`, `in`, `instanceof`, `and`, `or`) must be whole identifiers, not
//! prefixes of longer ones.

use zeta_lex::Input;

/// Operator identity, matched on by the evaluator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpKind {
    Member,
    Index,
    Call,
    Neg,
    Not,
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    InstOf,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
    Assign,
}

/// Operator associativity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
}

/// One operator descriptor.
#[derive(Debug)]
pub struct OpInfo {
    /// Operator identity.
    pub kind: OpKind,
    /// Operator lexeme (e.g. `"+"`).
    pub sym: &'static str,
    /// Closing lexeme, for bracketing operators.
    pub close_sym: Option<&'static str>,
    /// Arity; -1 for variable arity (call).
    pub arity: i8,
    /// Precedence level, higher binds tighter.
    pub prec: u8,
    /// Associativity.
    pub assoc: Assoc,
    /// Non-associative flag (`-`, `/` and `mod` do not reassociate).
    pub nonassoc: bool,
}

/// Member operator.
pub static OP_MEMBER: OpInfo = OpInfo { kind: OpKind::Member, sym: ".", close_sym: None, arity: 2, prec: 16, assoc: Assoc::Left, nonassoc: false };

/// Array indexing.
pub static OP_INDEX: OpInfo = OpInfo { kind: OpKind::Index, sym: "[", close_sym: Some("]"), arity: 2, prec: 16, assoc: Assoc::Left, nonassoc: false };

/// Function call, variable arity.
pub static OP_CALL: OpInfo = OpInfo { kind: OpKind::Call, sym: "(", close_sym: Some(")"), arity: -1, prec: 15, assoc: Assoc::Left, nonassoc: false };

/// Prefix unary operators.
pub static OP_NEG: OpInfo = OpInfo { kind: OpKind::Neg, sym: "-", close_sym: None, arity: 1, prec: 13, assoc: Assoc::Right, nonassoc: false };
pub static OP_NOT: OpInfo = OpInfo { kind: OpKind::Not, sym: "not", close_sym: None, arity: 1, prec: 13, assoc: Assoc::Right, nonassoc: false };

/// Binary arithmetic operators.
pub static OP_MUL: OpInfo = OpInfo { kind: OpKind::Mul, sym: "*", close_sym: None, arity: 2, prec: 12, assoc: Assoc::Left, nonassoc: false };
pub static OP_DIV: OpInfo = OpInfo { kind: OpKind::Div, sym: "/", close_sym: None, arity: 2, prec: 12, assoc: Assoc::Left, nonassoc: true };
pub static OP_MOD: OpInfo = OpInfo { kind: OpKind::Mod, sym: "mod", close_sym: None, arity: 2, prec: 12, assoc: Assoc::Left, nonassoc: true };
pub static OP_ADD: OpInfo = OpInfo { kind: OpKind::Add, sym: "+", close_sym: None, arity: 2, prec: 11, assoc: Assoc::Left, nonassoc: false };
pub static OP_SUB: OpInfo = OpInfo { kind: OpKind::Sub, sym: "-", close_sym: None, arity: 2, prec: 11, assoc: Assoc::Left, nonassoc: true };

/// Relational operators.
pub static OP_LT: OpInfo = OpInfo { kind: OpKind::Lt, sym: "<", close_sym: None, arity: 2, prec: 9, assoc: Assoc::Left, nonassoc: false };
pub static OP_LE: OpInfo = OpInfo { kind: OpKind::Le, sym: "<=", close_sym: None, arity: 2, prec: 9, assoc: Assoc::Left, nonassoc: false };
pub static OP_GT: OpInfo = OpInfo { kind: OpKind::Gt, sym: ">", close_sym: None, arity: 2, prec: 9, assoc: Assoc::Left, nonassoc: false };
pub static OP_GE: OpInfo = OpInfo { kind: OpKind::Ge, sym: ">=", close_sym: None, arity: 2, prec: 9, assoc: Assoc::Left, nonassoc: false };
pub static OP_IN: OpInfo = OpInfo { kind: OpKind::In, sym: "in", close_sym: None, arity: 2, prec: 9, assoc: Assoc::Left, nonassoc: false };
pub static OP_INST_OF: OpInfo = OpInfo { kind: OpKind::InstOf, sym: "instanceof", close_sym: None, arity: 2, prec: 9, assoc: Assoc::Left, nonassoc: false };

/// Equality comparison.
pub static OP_EQ: OpInfo = OpInfo { kind: OpKind::Eq, sym: "==", close_sym: None, arity: 2, prec: 8, assoc: Assoc::Left, nonassoc: false };
pub static OP_NE: OpInfo = OpInfo { kind: OpKind::Ne, sym: "!=", close_sym: None, arity: 2, prec: 8, assoc: Assoc::Left, nonassoc: false };

/// Bitwise operators.
pub static OP_BIT_AND: OpInfo = OpInfo { kind: OpKind::BitAnd, sym: "&", close_sym: None, arity: 2, prec: 7, assoc: Assoc::Left, nonassoc: false };
pub static OP_BIT_XOR: OpInfo = OpInfo { kind: OpKind::BitXor, sym: "^", close_sym: None, arity: 2, prec: 6, assoc: Assoc::Left, nonassoc: false };
pub static OP_BIT_OR: OpInfo = OpInfo { kind: OpKind::BitOr, sym: "|", close_sym: None, arity: 2, prec: 5, assoc: Assoc::Left, nonassoc: false };

/// Logical operators.
pub static OP_AND: OpInfo = OpInfo { kind: OpKind::And, sym: "and", close_sym: None, arity: 2, prec: 4, assoc: Assoc::Left, nonassoc: false };
pub static OP_OR: OpInfo = OpInfo { kind: OpKind::Or, sym: "or", close_sym: None, arity: 2, prec: 3, assoc: Assoc::Left, nonassoc: false };

/// Assignment.
pub static OP_ASSIGN: OpInfo = OpInfo { kind: OpKind::Assign, sym: "=", close_sym: None, arity: 2, prec: 1, assoc: Assoc::Right, nonassoc: false };

/// Try to match an operator with at least `min_prec` precedence.
///
/// When `pre_unary` is set, only right-associative unary operators match
/// (`-` reads as negation rather than subtraction). The input is left
/// untouched when no acceptable operator is found.
pub fn match_op(input: &mut Input<'_>, min_prec: u8, pre_unary: bool) -> Option<&'static OpInfo> {
    let before = input.snapshot();

    // Switch on the first character to avoid a long cascade of matches.
    let op: Option<&'static OpInfo> = match input.peek_ch() {
        '.' => {
            input.read_ch();
            Some(&OP_MEMBER)
        }
        '[' => {
            input.read_ch();
            Some(&OP_INDEX)
        }
        '(' => {
            input.read_ch();
            Some(&OP_CALL)
        }
        'n' => input.match_keyword("not").then_some(&OP_NOT),
        '*' => {
            input.read_ch();
            Some(&OP_MUL)
        }
        '/' => {
            input.read_ch();
            Some(&OP_DIV)
        }
        'm' => input.match_keyword("mod").then_some(&OP_MOD),
        '+' => {
            input.read_ch();
            Some(&OP_ADD)
        }
        '-' => {
            input.read_ch();
            Some(if pre_unary { &OP_NEG } else { &OP_SUB })
        }
        '<' => {
            if input.match_str("<=") {
                Some(&OP_LE)
            } else {
                input.read_ch();
                Some(&OP_LT)
            }
        }
        '>' => {
            if input.match_str(">=") {
                Some(&OP_GE)
            } else {
                input.read_ch();
                Some(&OP_GT)
            }
        }
        'i' => {
            if input.match_keyword("instanceof") {
                Some(&OP_INST_OF)
            } else if input.match_keyword("in") {
                Some(&OP_IN)
            } else {
                None
            }
        }
        '=' => {
            if input.match_str("==") {
                Some(&OP_EQ)
            } else {
                input.read_ch();
                Some(&OP_ASSIGN)
            }
        }
        '!' => input.match_str("!=").then_some(&OP_NE),
        '&' => {
            input.read_ch();
            Some(&OP_BIT_AND)
        }
        '^' => {
            input.read_ch();
            Some(&OP_BIT_XOR)
        }
        '|' => {
            input.read_ch();
            Some(&OP_BIT_OR)
        }
        'a' => input.match_keyword("and").then_some(&OP_AND),
        'o' => input.match_keyword("or").then_some(&OP_OR),
        _ => None,
    };

    match op {
        Some(op)
            if op.prec >= min_prec
                && (!pre_unary || (op.arity == 1 && op.assoc == Assoc::Right)) =>
        {
            Some(op)
        }
        _ => {
            input.restore(before);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn try_match(source: &str, min_prec: u8, pre_unary: bool) -> Option<OpKind> {
        match_op(&mut Input::new(source), min_prec, pre_unary).map(|op| op.kind)
    }

    #[test]
    fn test_single_char_operators() {
        assert_eq!(try_match("+ b", 0, false), Some(OpKind::Add));
        assert_eq!(try_match("* b", 0, false), Some(OpKind::Mul));
        assert_eq!(try_match("(args)", 0, false), Some(OpKind::Call));
        assert_eq!(try_match("[0]", 0, false), Some(OpKind::Index));
        assert_eq!(try_match(".field", 0, false), Some(OpKind::Member));
    }

    #[test]
    fn test_two_char_operators_win_over_prefixes() {
        assert_eq!(try_match("<= b", 0, false), Some(OpKind::Le));
        assert_eq!(try_match("< b", 0, false), Some(OpKind::Lt));
        assert_eq!(try_match(">= b", 0, false), Some(OpKind::Ge));
        assert_eq!(try_match("== b", 0, false), Some(OpKind::Eq));
        assert_eq!(try_match("= b", 0, false), Some(OpKind::Assign));
        assert_eq!(try_match("!= b", 0, false), Some(OpKind::Ne));
        assert_eq!(try_match("!b", 0, false), None);
    }

    #[test]
    fn test_keyword_operators_respect_boundaries() {
        assert_eq!(try_match("and b", 0, false), Some(OpKind::And));
        assert_eq!(try_match("android", 0, false), None);
        assert_eq!(try_match("instanceof b", 0, false), Some(OpKind::InstOf));
        assert_eq!(try_match("in b", 0, false), Some(OpKind::In));
        assert_eq!(try_match("int_var", 0, false), None);
        assert_eq!(try_match("mod b", 0, false), Some(OpKind::Mod));
        assert_eq!(try_match("modulo", 0, false), None);
    }

    #[test]
    fn test_minus_reads_as_neg_only_prefix() {
        assert_eq!(try_match("-x", 0, true), Some(OpKind::Neg));
        assert_eq!(try_match("-x", 0, false), Some(OpKind::Sub));
    }

    #[test]
    fn test_pre_unary_rejects_binary_operators() {
        assert_eq!(try_match("+x", 0, true), None);
        assert_eq!(try_match("not x", 0, true), Some(OpKind::Not));
    }

    #[test]
    fn test_min_prec_filters_and_backtracks() {
        let mut input = Input::new("+ b");
        assert!(match_op(&mut input, 12, false).is_none());
        // The operator must not be consumed on rejection.
        assert_eq!(input.peek_ch(), '+');
        assert!(match_op(&mut input, 11, false).is_some());
    }

    #[test]
    fn test_precedence_table_matches_language_reference() {
        assert_eq!(OP_MEMBER.prec, 16);
        assert_eq!(OP_INDEX.prec, 16);
        assert_eq!(OP_CALL.prec, 15);
        assert_eq!(OP_NEG.prec, 13);
        assert_eq!(OP_MUL.prec, OP_DIV.prec);
        assert_eq!(OP_ADD.prec, 11);
        assert_eq!(OP_LT.prec, 9);
        assert_eq!(OP_EQ.prec, 8);
        assert_eq!(OP_BIT_AND.prec, 7);
        assert_eq!(OP_BIT_XOR.prec, 6);
        assert_eq!(OP_BIT_OR.prec, 5);
        assert_eq!(OP_AND.prec, 4);
        assert_eq!(OP_OR.prec, 3);
        assert_eq!(OP_ASSIGN.prec, 1);
        assert_eq!(OP_ASSIGN.assoc, Assoc::Right);
        assert!(OP_SUB.nonassoc && OP_DIV.nonassoc && OP_MOD.nonassoc);
    }
}
