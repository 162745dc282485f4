use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::expr::{Fragment, Segment};

static NEXT_NAMESPACE: AtomicU64 = AtomicU64::new(0);

static MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x01(\d+):(\d+)\x01").expect("marker pattern compiles")
});

/// One piece of a resolved expression.
#[derive(Debug, Clone)]
pub enum Piece {
    Text(String),
    Value(Segment),
}

/// Hands out placeholder markers while an expression string is being written.
///
/// Every marker carries the namespace of the `resolve` call that created it,
/// so an expression built inside another one never splits on the outer markers.
pub struct Emitter {
    namespace: u64,
    values: Vec<Segment>,
}

impl Emitter {
    fn new() -> Self {
        Self { namespace: NEXT_NAMESPACE.fetch_add(1, Ordering::Relaxed), values: Vec::new() }
    }

    /// Stands in for `value` inside the string being built.
    pub fn emit(&mut self, value: impl Into<Segment>) -> String {
        let index = self.values.len();
        self.values.push(value.into());
        format!("\u{1}{}:{}\u{1}", self.namespace, index)
    }

    pub fn param(&mut self, value: impl Into<Value>) -> String {
        self.emit(Segment::Param(value.into()))
    }

    pub fn frag(&mut self, fragment: Fragment) -> String {
        self.emit(Segment::Nested(fragment))
    }
}

pub struct Resolver;

impl Resolver {
    /// Runs `build` with a fresh emitter and splits the returned string back
    /// into literal text and the values that were emitted.
    pub fn resolve<F>(build: F) -> Vec<Piece>
    where
        F: FnOnce(&mut Emitter) -> String,
    {
        let mut emitter = Emitter::new();
        let text = build(&mut emitter);
        Self::split(&text, &emitter)
    }

    fn split(text: &str, emitter: &Emitter) -> Vec<Piece> {
        let mut pieces = Vec::new();
        let mut last = 0;
        for caps in MARKER.captures_iter(text) {
            let whole = match caps.get(0) {
                Some(m) => m,
                None => continue,
            };
            let namespace = caps[1].parse::<u64>().ok();
            let index = caps[2].parse::<usize>().ok();
            let value = match (namespace, index) {
                (Some(ns), Some(i)) if ns == emitter.namespace => emitter.values.get(i),
                _ => None,
            };
            // markers from other namespaces stay as text
            let Some(value) = value else { continue };

            if whole.start() > last {
                pieces.push(Piece::Text(text[last..whole.start()].to_string()));
            }
            pieces.push(Piece::Value(value.clone()));
            last = whole.end();
        }
        if last < text.len() {
            pieces.push(Piece::Text(text[last..].to_string()));
        }
        pieces
    }
}

impl Fragment {
    /// Builds a fragment from a format-style closure:
    ///
    /// ```ignore
    /// Fragment::sql(|e| format!("{} like {}", e.emit(&row["name"]), e.param("%x%")))
    /// ```
    pub fn sql<F>(build: F) -> Fragment
    where
        F: FnOnce(&mut Emitter) -> String,
    {
        Resolver::resolve(build)
            .into_iter()
            .map(|p| match p {
                Piece::Text(t) => Segment::Lit(t),
                Piece::Value(v) => v,
            })
            .collect()
    }
}
