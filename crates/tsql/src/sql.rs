//! Raw SQL escape hatch.
//!
//! A [`SqlFragment`] stores SQL pieces and bound values separately: everything
//! pushed through [`bind`](SqlFragment::bind) is always shipped as a parameter,
//! never concatenated into the text. [`raw`](SqlFragment::raw) is the explicit,
//! deliberate opt-out for trusted SQL text — it is never the default for a
//! value.
//!
//! # Example
//!
//! ```ignore
//! use tsql::sql;
//!
//! let frag = sql("length(title) > ").bind(10i32);
//! let qb = db.select_from("posts")?.where_fragment(frag);
//! ```

use crate::compile::ParamAccumulator;
use crate::value::Value;

#[derive(Clone, Debug, PartialEq)]
enum Piece {
    Raw(String),
    Bind(Value),
}

/// A parameter-safe raw SQL fragment.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct SqlFragment {
    pieces: Vec<Piece>,
}

/// Start a raw SQL fragment from trusted text.
pub fn sql(text: impl Into<String>) -> SqlFragment {
    SqlFragment {
        pieces: vec![Piece::Raw(text.into())],
    }
}

impl SqlFragment {
    /// Create an empty fragment.
    pub fn empty() -> Self {
        Self { pieces: Vec::new() }
    }

    /// Append a bound value. The value is always sent as a parameter.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.pieces.push(Piece::Bind(value.into()));
        self
    }

    /// Append trusted SQL text verbatim.
    ///
    /// This is the conscious opt-out of parameter binding. Never pass
    /// user-controlled input here.
    pub fn raw(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return self;
        }
        match self.pieces.last_mut() {
            Some(Piece::Raw(last)) => last.push_str(&text),
            _ => self.pieces.push(Piece::Raw(text)),
        }
        self
    }

    /// Number of bound values carried by this fragment.
    pub fn bind_count(&self) -> usize {
        self.pieces
            .iter()
            .filter(|p| matches!(p, Piece::Bind(_)))
            .count()
    }

    pub(crate) fn render(&self, acc: &mut ParamAccumulator<'_>) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Raw(text) => out.push_str(text),
                Piece::Bind(value) => out.push_str(&acc.bind(value.clone())),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{Postgres, SqlServer};

    #[test]
    fn binds_are_parameterized() {
        let frag = sql("score > ").bind(90i32).raw(" AND status = ").bind("ok");
        let mut acc = ParamAccumulator::new(&Postgres);
        let rendered = frag.render(&mut acc);
        assert_eq!(rendered, "score > $1 AND status = $2");
        let stmt = acc.finish(rendered);
        assert_eq!(stmt.params, vec![Value::Int4(90), Value::Text("ok".into())]);
        // The literal never appears in the text.
        assert!(!stmt.sql.contains("90"));
        assert!(!stmt.sql.contains("ok"));
    }

    #[test]
    fn raw_pieces_merge() {
        let frag = sql("a").raw("b").raw("c");
        assert_eq!(frag.bind_count(), 0);
        let mut acc = ParamAccumulator::new(&Postgres);
        assert_eq!(frag.render(&mut acc), "abc");
    }

    #[test]
    fn render_follows_dialect_placeholders() {
        let frag = sql("x = ").bind(1i64);
        let mut acc = ParamAccumulator::new(&SqlServer);
        assert_eq!(frag.render(&mut acc), "x = @P1");
    }
}
