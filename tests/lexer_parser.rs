//! Surface-syntax quirks: negative-number lexing, argument greediness,
//! operator precedence, and aliasing.

use logoscript::{Error, Interpreter};

#[test]
fn negative_literal_needs_no_space_but_subtraction_does() -> Result<(), Error> {
    let mut interp = Interpreter::new();
    // `forward -5` is one Number token (-5), not `forward` minus `5`.
    interp.run("forward -5")?;
    assert_eq!(interp.turtle().y(), -5.0);

    let mut interp2 = Interpreter::new();
    interp2.run(r#"make "x 3 - 2 print :x"#)?;
    assert_eq!(interp2.output(), vec!["1"]);
    Ok(())
}

#[test]
fn two_one_argument_calls_in_a_row_do_not_merge() -> Result<(), Error> {
    let mut interp = Interpreter::new();
    interp.run(
        r#"to sq :n
            repeat 4 [forward :n right 90]
        end
        sq 10  sq 20"#,
    )?;
    // Two separate calls (4 segments each), not one two-argument call.
    assert_eq!(interp.turtle().lines().len(), 8);
    Ok(())
}

#[test]
fn operator_precedence_matches_the_grammar_table() -> Result<(), Error> {
    let mut interp = Interpreter::new();
    // 2 + 3 * 4 = 14, not 20.
    interp.run("print 2 + 3 * 4")?;
    assert_eq!(interp.output(), vec!["14"]);
    Ok(())
}

#[test]
fn comparisons_do_not_chain() -> Result<(), Error> {
    let mut interp = Interpreter::new();
    // `1 < 2` evaluates to the single comparison; nothing chains with a
    // following `< 3` because comparison is not an operator on booleans here.
    interp.run("print 1 < 2")?;
    assert_eq!(interp.output(), vec!["true"]);
    Ok(())
}

#[test]
fn and_or_short_circuit_and_bind_looser_than_comparison() -> Result<(), Error> {
    let mut interp = Interpreter::new();
    interp.run("print 1 < 2 and 3 < 4")?;
    assert_eq!(interp.output(), vec!["true"]);
    Ok(())
}

#[test]
fn parenthesized_expression_overrides_precedence() -> Result<(), Error> {
    let mut interp = Interpreter::new();
    interp.run("print (2 + 3) * 4")?;
    assert_eq!(interp.output(), vec!["20"]);
    Ok(())
}

#[test]
fn comment_runs_to_end_of_line() -> Result<(), Error> {
    let mut interp = Interpreter::new();
    interp.run("print 1 ; this is a comment and should be skipped\nprint 2")?;
    assert_eq!(interp.output(), vec!["1", "2"]);
    Ok(())
}

#[test]
fn command_aliases_resolve_to_their_canonical_form() -> Result<(), Error> {
    let mut interp = Interpreter::new();
    interp.run("fd 10 rt 90 bk 5 lt 45 pu pd")?;
    assert_eq!(interp.turtle().lines().len(), 2);
    Ok(())
}

#[test]
fn quoted_atom_in_expression_position_is_a_text_literal_not_a_call() -> Result<(), Error> {
    // A bareword used as a value must be quoted; unquoted it would be parsed
    // as a procedure call instead.
    let mut interp = Interpreter::new();
    interp.run(r#"print "hello"#)?;
    assert_eq!(interp.output(), vec!["hello"]);
    Ok(())
}

#[test]
fn delimited_string_literal_supports_spaces_and_escapes() -> Result<(), Error> {
    // A `"` followed by anything other than an alphabetic/underscore character
    // opens a delimited literal (terminated by the next `"`, `\` escaping);
    // only a `"` followed directly by a letter is the bareword-atom form.
    let mut interp = Interpreter::new();
    interp.run(r#"print " hello \"world\" there""#)?;
    assert_eq!(interp.output(), vec![" hello \"world\" there"]);
    Ok(())
}

#[test]
fn blank_lines_between_statements_are_skipped() -> Result<(), Error> {
    let mut interp = Interpreter::new();
    interp.run("print 1\n\n\nprint 2")?;
    assert_eq!(interp.output(), vec!["1", "2"]);
    Ok(())
}
