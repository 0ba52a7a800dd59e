//! Parameter bindings and placeholder rendering.
//!
//! Every value that flows into a statement is captured as a [`Binding`]: the
//! parameter path the execution layer resolves against its parameter
//! container, plus the value itself where the engine knows it. The
//! [`Binder`] is private to one render call and allocates placeholder text
//! in output order, so a rendered statement's bindings always line up with
//! its placeholders.

use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// A clone-friendly bound value using Arc.
///
/// Cloning a `Param` never copies the underlying value, which keeps intents
/// cheap to clone and re-render.
#[derive(Clone)]
pub struct Param(pub(crate) Arc<dyn ToSql + Send + Sync>);

impl Param {
    /// Create a new parameter from any ToSql value.
    pub fn new<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Param(Arc::new(value))
    }

    /// Get a reference to the inner value as a ToSql trait object.
    pub fn as_ref(&self) -> &(dyn ToSql + Sync) {
        &*self.0 as &(dyn ToSql + Sync)
    }
}

impl std::fmt::Debug for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Param").field(&"<dyn ToSql>").finish()
    }
}

/// Placeholder convention for one rendered statement.
///
/// The convention is a property of the execution layer's binding strategy,
/// not of the statement being described; a single statement never mixes
/// styles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParamStyle {
    /// `#{path}` references into the caller's parameter container. Required
    /// for batch renumbering, which rewrites the `ew` root per array index.
    #[default]
    Named,
    /// `?` placeholders bound positionally from the binding list.
    Positional,
}

/// One emitted placeholder: where the execution layer finds the value, and
/// the value itself when the engine holds it (predicate and assignment
/// values do; entity/id/map references resolve in the caller's container).
#[derive(Clone, Debug)]
pub struct Binding {
    pub path: String,
    pub value: Option<Param>,
}

/// The final artifact of a render: complete SQL text plus the ordered
/// bindings its placeholders refer to.
#[derive(Clone, Debug)]
pub struct Rendered {
    pub sql: String,
    pub bindings: Vec<Binding>,
}

impl Rendered {
    /// Bound values in placeholder order, for positional execution.
    /// Entries whose value lives in the caller's container are skipped.
    pub fn values(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.bindings
            .iter()
            .filter_map(|b| b.value.as_ref())
            .map(|p| p.as_ref())
            .collect()
    }
}

/// Render-scoped placeholder allocator.
///
/// Wrapper-held values get stable `ew.parameters.pN` keys in the order they
/// are written into the SQL text; explicit paths (entity properties, id list
/// slots, map keys) pass through unchanged.
#[derive(Debug)]
pub struct Binder {
    style: ParamStyle,
    seq: usize,
    bindings: Vec<Binding>,
}

impl Binder {
    pub fn new(style: ParamStyle) -> Self {
        Self {
            style,
            seq: 0,
            bindings: Vec::new(),
        }
    }

    /// Emit a placeholder for a value addressed by an explicit path.
    pub fn placeholder(&mut self, path: impl Into<String>, value: Option<Param>) -> String {
        let path = path.into();
        let text = match self.style {
            ParamStyle::Named => format!("#{{{path}}}"),
            ParamStyle::Positional => "?".to_string(),
        };
        self.bindings.push(Binding { path, value });
        text
    }

    /// Emit a placeholder for a wrapper-held value, allocating the next
    /// `ew.parameters.pN` key.
    pub fn bind(&mut self, value: Param) -> String {
        self.seq += 1;
        let path = format!("ew.parameters.p{}", self.seq);
        self.placeholder(path, Some(value))
    }

    /// Number of bindings emitted so far.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if no bindings were emitted.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Consume the binder, returning the ordered bindings.
    pub fn into_bindings(self) -> Vec<Binding> {
        self.bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_placeholder_renders_path() {
        let mut b = Binder::new(ParamStyle::Named);
        assert_eq!(b.placeholder("cm.id", Some(Param::new(1i64))), "#{cm.id}");
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn positional_placeholder_renders_question_mark() {
        let mut b = Binder::new(ParamStyle::Positional);
        assert_eq!(b.placeholder("cm.id", Some(Param::new(1i64))), "?");
    }

    #[test]
    fn bind_allocates_sequential_keys() {
        let mut b = Binder::new(ParamStyle::Named);
        assert_eq!(b.bind(Param::new("a")), "#{ew.parameters.p1}");
        assert_eq!(b.bind(Param::new("b")), "#{ew.parameters.p2}");
        let bindings = b.into_bindings();
        assert_eq!(bindings[0].path, "ew.parameters.p1");
        assert_eq!(bindings[1].path, "ew.parameters.p2");
    }
}
