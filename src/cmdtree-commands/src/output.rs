//! User-facing output.

use std::cell::RefCell;
use std::rc::Rc;

/// Destination for usage text, help pages, warnings and errors.
pub trait Output {
    fn line(&mut self, text: &str);
    fn warning(&mut self, text: &str);
    fn error(&mut self, text: &str);
}

/// Writes lines to stdout and diagnostics to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdOutput;

impl Output for StdOutput {
    fn line(&mut self, text: &str) {
        println!("{text}");
    }

    fn warning(&mut self, text: &str) {
        eprintln!("Warning: {text}");
    }

    fn error(&mut self, text: &str) {
        eprintln!("Error: {text}");
    }
}

#[derive(Debug, Default)]
struct Captured {
    lines: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
}

/// Records output in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput {
    inner: Rc<RefCell<Captured>>,
}

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.inner.borrow().lines.clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.inner.borrow().warnings.clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.inner.borrow().errors.clone()
    }
}

impl Output for CapturedOutput {
    fn line(&mut self, text: &str) {
        self.inner.borrow_mut().lines.push(text.to_string());
    }

    fn warning(&mut self, text: &str) {
        self.inner.borrow_mut().warnings.push(text.to_string());
    }

    fn error(&mut self, text: &str) {
        self.inner.borrow_mut().errors.push(text.to_string());
    }
}
