//! Directive state threaded through a single render.
//!
//! Directive nodes toggle named rendering options for the content that
//! follows them in document order. The state lives for exactly one render
//! call and is never shared.

use std::collections::HashMap;

use crate::ast::Directive;

/// Directive controlling vertical alignment of table cells.
pub const TABLE_ALIGNMENT: &str = "table-alignment";

/// Error reading a directive's arguments.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectiveError {
    /// The directive is not enabled.
    #[error("directive '{0}' is not enabled")]
    NotEnabled(String),
    /// The directive is enabled without the required argument.
    #[error("directive '{name}' has no argument at position {index}")]
    MissingArgument { name: String, index: usize },
}

/// Active directives and their arguments.
#[derive(Debug, Clone, Default)]
pub struct Directives {
    active: HashMap<String, Vec<String>>,
}

impl Directives {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a directive node: enabling replaces earlier arguments, disabling removes the name.
    pub fn apply(&mut self, directive: &Directive) {
        if directive.enabled {
            self.active
                .insert(directive.name.clone(), directive.args.clone());
        } else {
            self.active.remove(&directive.name);
        }
    }

    #[must_use]
    pub fn is_enabled(&self, name: &str) -> bool {
        self.active.contains_key(name)
    }

    /// Arguments of an enabled directive.
    #[must_use]
    pub fn args(&self, name: &str) -> Option<&[String]> {
        self.active.get(name).map(Vec::as_slice)
    }

    /// First non-empty argument of an enabled directive.
    ///
    /// # Errors
    ///
    /// Returns `DirectiveError::NotEnabled` when the directive is inactive and
    /// `DirectiveError::MissingArgument` when its first argument is absent or blank.
    pub fn first_arg(&self, name: &str) -> Result<&str, DirectiveError> {
        let args = self
            .args(name)
            .ok_or_else(|| DirectiveError::NotEnabled(name.to_owned()))?;
        args.first()
            .map(String::as_str)
            .filter(|arg| !arg.is_empty())
            .ok_or_else(|| DirectiveError::MissingArgument {
                name: name.to_owned(),
                index: 0,
            })
    }

    /// Vertical alignment for table cells, if alignment is enabled.
    ///
    /// Read errors are logged and treated as "no alignment".
    #[must_use]
    pub fn table_alignment(&self) -> Option<&str> {
        if !self.is_enabled(TABLE_ALIGNMENT) {
            return None;
        }
        match self.first_arg(TABLE_ALIGNMENT) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(directive = TABLE_ALIGNMENT, error = %e, "Ignoring unreadable directive");
                None
            }
        }
    }
}
