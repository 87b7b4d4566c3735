//! The [`Environment`] type: the frame chain that backs variable lookup,
//! `make`, and `local`.
//!
//! A flat `Vec` of frames would conflate two different kinds of nesting: the
//! blocks a `for` loop opens lexically, and the fresh, caller-independent
//! frame a procedure call opens. Only the latter resets the chain back to
//! the global frame; a `for` loop nests inside whatever frame is
//! already current. So the global table is held once, behind an `Rc<RefCell<_>>`
//! shared by every frame stack, while each procedure invocation gets its own
//! private stack of local frames sitting on top of it.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;

use crate::value::Value;

type Bindings = AHashMap<String, Option<Value>>;

/// The result of looking a name up in the environment.
pub enum Lookup {
    Found(Value),
    /// The name was declared (e.g. via `local`) but never assigned.
    Unset,
    Missing,
}

#[derive(Clone)]
pub struct Environment {
    global: Rc<RefCell<Bindings>>,
    locals: Vec<Bindings>,
}

impl Environment {
    /// A fresh top-level environment: an empty global frame, no local frames.
    /// Top-level statements execute with the global frame as "the current frame".
    pub fn new() -> Self {
        Self {
            global: Rc::new(RefCell::new(Bindings::new())),
            locals: Vec::new(),
        }
    }

    /// The environment a procedure call executes in: a fresh local-frame
    /// stack sharing this environment's global table. Caller locals are not
    /// visible to the callee, matching "lexical scope with global top".
    pub fn call_frame(&self) -> Self {
        Self {
            global: Rc::clone(&self.global),
            locals: vec![Bindings::new()],
        }
    }

    /// Bind the call's positional parameters in the (already-pushed) innermost frame.
    pub fn bind_param(&mut self, name: &str, value: Value) {
        let frame = self.locals.last_mut().expect("call_frame pushes one frame");
        frame.insert(name.to_string(), Some(value));
    }

    /// Open a new frame for a `for` loop, nested inside the current frame.
    pub fn push_for_frame(&mut self, var: &str, start: Value) {
        let mut frame = Bindings::new();
        frame.insert(var.to_string(), Some(start));
        self.locals.push(frame);
    }

    pub fn pop_for_frame(&mut self) {
        self.locals.pop();
    }

    pub fn get(&self, name: &str) -> Lookup {
        for frame in self.locals.iter().rev() {
            if let Some(slot) = frame.get(name) {
                return match slot {
                    Some(v) => Lookup::Found(v.clone()),
                    None => Lookup::Unset,
                };
            }
        }
        match self.global.borrow().get(name) {
            Some(Some(v)) => Lookup::Found(v.clone()),
            Some(None) => Lookup::Unset,
            None => Lookup::Missing,
        }
    }

    /// `make`: assign into the nearest enclosing frame that already binds
    /// `name` (walking from innermost local frame out to the global frame);
    /// if no frame defines it, create the binding in the current frame (the
    /// innermost local frame, or the global frame at top level).
    pub fn make(&mut self, name: &str, value: Value) {
        for frame in self.locals.iter_mut().rev() {
            if frame.contains_key(name) {
                frame.insert(name.to_string(), Some(value));
                return;
            }
        }
        if self.global.borrow().contains_key(name) {
            self.global.borrow_mut().insert(name.to_string(), Some(value));
            return;
        }
        match self.locals.last_mut() {
            Some(frame) => {
                frame.insert(name.to_string(), Some(value));
            }
            None => {
                self.global.borrow_mut().insert(name.to_string(), Some(value));
            }
        }
    }

    /// `local`: always creates an unset binding in the current frame, shadowing
    /// any outer binding of the same name.
    pub fn local(&mut self, name: &str) {
        match self.locals.last_mut() {
            Some(frame) => {
                frame.insert(name.to_string(), None);
            }
            None => {
                self.global.borrow_mut().insert(name.to_string(), None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_at_top_level_writes_global() {
        let mut env = Environment::new();
        env.make("x", Value::Number(1.0));
        assert!(matches!(env.get("x"), Lookup::Found(Value::Number(n)) if n == 1.0));
    }

    #[test]
    fn procedure_frame_does_not_see_caller_locals() {
        let mut outer = Environment::new();
        outer.local("secret");
        outer.make("secret", Value::Number(7.0));

        let call_env = outer.call_frame();
        assert!(matches!(call_env.get("secret"), Lookup::Missing));
    }

    #[test]
    fn local_shadows_and_is_invisible_after_scope_ends() {
        let mut env = Environment::new();
        env.make("v", Value::Number(1.0));

        let mut call_env = env.call_frame();
        call_env.local("v");
        assert!(matches!(call_env.get("v"), Lookup::Unset));
        // The caller's environment (a separate stack) is untouched.
        assert!(matches!(env.get("v"), Lookup::Found(Value::Number(n)) if n == 1.0));
    }

    #[test]
    fn for_frame_nests_inside_current_frame_not_global() {
        let mut env = Environment::new();
        let mut call_env = env.call_frame();
        call_env.push_for_frame("i", Value::Number(0.0));
        call_env.make("i", Value::Number(1.0));
        call_env.pop_for_frame();
        // The for-loop variable never escaped into the call frame or global.
        assert!(matches!(call_env.get("i"), Lookup::Missing));
        assert!(matches!(env.get("i"), Lookup::Missing));
    }
}
