//! The error taxonomy: lexical, parse, and runtime errors, plus the
//! requirement that partial turtle state and output survive a failure.

use logoscript::{Error, EvalError, EvalErrorType, Interpreter, ParseError, ParseErrorType};

#[test]
fn unrecognized_character_is_a_lex_error() {
    let mut interp = Interpreter::new();
    let err = interp.run("forward 10 @ 5").unwrap_err();
    assert!(matches!(err, Error::Lex(_)));
}

#[test]
fn unclosed_bracket_is_a_parse_error() {
    let mut interp = Interpreter::new();
    let err = interp.run("repeat 4 [forward 100").unwrap_err();
    assert!(matches!(
        err,
        Error::Parse(ParseError {
            error_type: ParseErrorType::UnclosedBracket,
            ..
        })
    ));
}

#[test]
fn missing_end_on_a_procedure_is_a_parse_error() {
    let mut interp = Interpreter::new();
    let err = interp.run("to sq :n\nforward :n").unwrap_err();
    assert!(matches!(
        err,
        Error::Parse(ParseError {
            error_type: ParseErrorType::MissingEnd,
            ..
        })
    ));
}

#[test]
fn keyword_in_expression_position_is_a_parse_error() {
    let mut interp = Interpreter::new();
    let err = interp.run(r#"make "x print"#).unwrap_err();
    assert!(matches!(
        err,
        Error::Parse(ParseError {
            error_type: ParseErrorType::KeywordInExpression(_),
            ..
        })
    ));
}

#[test]
fn arithmetic_on_text_is_a_type_error() {
    let mut interp = Interpreter::new();
    let err = interp.run(r#"print "hello + 1"#).unwrap_err();
    assert!(matches!(
        err,
        Error::Eval(EvalError {
            error_type: EvalErrorType::TypeError { .. },
            ..
        })
    ));
}

#[test]
fn first_of_a_number_is_a_type_error() {
    let mut interp = Interpreter::new();
    let err = interp.run("print first 5").unwrap_err();
    assert!(matches!(
        err,
        Error::Eval(EvalError {
            error_type: EvalErrorType::TypeError { .. },
            ..
        })
    ));
}

#[test]
fn division_and_modulo_by_zero_are_arithmetic_errors() {
    let mut div = Interpreter::new();
    assert!(matches!(
        div.run("print 1 / 0").unwrap_err(),
        Error::Eval(EvalError {
            error_type: EvalErrorType::DivisionByZero,
            ..
        })
    ));

    let mut rem = Interpreter::new();
    assert!(matches!(
        rem.run("print 1 % 0").unwrap_err(),
        Error::Eval(EvalError {
            error_type: EvalErrorType::DivisionByZero,
            ..
        })
    ));
}

#[test]
fn reading_an_undefined_variable_is_a_name_error() {
    let mut interp = Interpreter::new();
    let err = interp.run("print :nope").unwrap_err();
    assert!(matches!(
        err,
        Error::Eval(EvalError {
            error_type: EvalErrorType::UndefinedVariable(_),
            ..
        })
    ));
}

#[test]
fn turtle_state_and_output_survive_a_mid_program_error() {
    let mut interp = Interpreter::new();
    let err = interp
        .run(r#"forward 100 print "before print 1 / 0 forward 999"#)
        .unwrap_err();
    assert!(matches!(err, Error::Eval(_)));
    // The failing statement aborted the run, but everything produced before
    // it remains on the interpreter.
    assert_eq!(interp.turtle().lines().len(), 1);
    assert_eq!(interp.output(), vec!["before"]);
}
