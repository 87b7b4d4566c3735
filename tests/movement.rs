//! Turtle movement, heading, and pen-state statements driven through a full
//! program run rather than unit-testing `Turtle` directly.

use logoscript::{Error, Interpreter};

#[test]
fn heading_stays_normalized_after_many_turns() -> Result<(), Error> {
    let mut interp = Interpreter::new();
    interp.run("right 450 left 900 right 10")?;
    let h = interp.turtle().heading();
    assert!((0.0..360.0).contains(&h));
    Ok(())
}

#[test]
fn back_is_forward_negated() -> Result<(), Error> {
    let mut a = Interpreter::new();
    a.run("forward -30")?;
    let mut b = Interpreter::new();
    b.run("back 30")?;
    assert!((a.turtle().x() - b.turtle().x()).abs() < 1e-9);
    assert!((a.turtle().y() - b.turtle().y()).abs() < 1e-9);
    Ok(())
}

#[test]
fn setxy_setx_sety_move_without_changing_heading() -> Result<(), Error> {
    let mut interp = Interpreter::new();
    interp.run("right 45 setxy 10 20 setx 30 sety 40")?;
    assert_eq!(interp.turtle().x(), 30.0);
    assert_eq!(interp.turtle().y(), 40.0);
    assert_eq!(interp.turtle().heading(), 45.0);
    assert_eq!(interp.turtle().lines().len(), 3);
    Ok(())
}

#[test]
fn home_resets_position_and_heading_exactly() -> Result<(), Error> {
    let mut interp = Interpreter::new();
    interp.run("forward 70 right 123 home")?;
    assert_eq!((interp.turtle().x(), interp.turtle().y(), interp.turtle().heading()), (0.0, 0.0, 0.0));
    Ok(())
}

#[test]
fn clearscreen_empties_lines_but_keeps_pen_state() -> Result<(), Error> {
    let mut interp = Interpreter::new();
    interp.run("pencolor \"blue forward 10 clearscreen")?;
    assert!(interp.turtle().lines().is_empty());
    assert_eq!(interp.turtle().pen_color(), "blue");
    assert!(interp.turtle().pen_is_down());
    Ok(())
}

#[test]
fn clearscreen_is_idempotent() -> Result<(), Error> {
    let mut interp = Interpreter::new();
    interp.run("forward 10 right 20 clearscreen clearscreen")?;
    assert_eq!((interp.turtle().x(), interp.turtle().y(), interp.turtle().heading()), (0.0, 0.0, 0.0));
    assert!(interp.turtle().lines().is_empty());
    Ok(())
}

#[test]
fn circle_approximates_with_36_chords_and_faces_home() -> Result<(), Error> {
    let mut interp = Interpreter::new();
    interp.run("circle 50")?;
    assert_eq!(interp.turtle().lines().len(), 36);
    assert!(interp.turtle().heading().abs() < 1e-6);
    Ok(())
}

#[test]
fn arc_of_90_degrees_uses_nine_chords() -> Result<(), Error> {
    let mut interp = Interpreter::new();
    interp.run("arc 90 20")?;
    assert_eq!(interp.turtle().lines().len(), 9);
    assert!((interp.turtle().heading() - 90.0).abs() < 1e-6);
    Ok(())
}

#[test]
fn hideturtle_and_showturtle_toggle_visibility() -> Result<(), Error> {
    let mut interp = Interpreter::new();
    interp.run("hideturtle")?;
    assert!(!interp.turtle().is_visible());
    interp.run("showturtle")?;
    assert!(interp.turtle().is_visible());
    Ok(())
}

#[test]
fn pendownp_reporter_reflects_pen_state() -> Result<(), Error> {
    let mut interp = Interpreter::new();
    interp.run(r#"penup print pendown?"#)?;
    assert_eq!(interp.output(), vec!["false"]);
    Ok(())
}
