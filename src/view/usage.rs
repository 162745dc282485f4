use std::collections::BTreeSet;

use crate::{
    column::Template,
    expr::{Fragment, Token, TokenId, TokenSet},
    view::ViewError,
};

/// Reachability of tokens from a view's template.
pub struct Usage;

impl Usage {
    /// A token is in scope when the template holds it, when every token it
    /// is derived from is in scope, or when it is a constant that reads no
    /// source at all.
    pub fn in_scope(token: &Token, scope: &BTreeSet<TokenId>) -> bool {
        if scope.contains(&token.id()) {
            return true;
        }
        if token.reads_source() {
            return false;
        }
        token.deps().iter().all(|d| Self::in_scope(d, scope))
    }

    pub fn check_fragment(fragment: &Fragment, scope: &BTreeSet<TokenId>, context: &'static str) -> Result<(), ViewError> {
        if fragment.reads_source() {
            return Err(ViewError::DanglingReference { context, token: "a raw source column".into() });
        }
        Self::check_tokens(fragment.tokens(), scope, context)
    }

    pub fn check_template(template: &Template, scope: &BTreeSet<TokenId>, context: &'static str) -> Result<(), ViewError> {
        Self::check_tokens(template.tokens(), scope, context)
    }

    fn check_tokens(tokens: Vec<Token>, scope: &BTreeSet<TokenId>, context: &'static str) -> Result<(), ViewError> {
        match tokens.into_iter().find(|t| !Self::in_scope(t, scope)) {
            Some(t) => Err(ViewError::DanglingReference { context, token: format!("{t:?}") }),
            None => Ok(()),
        }
    }

    /// Rewrites `needs` in terms of tokens the scope holds, replacing derived
    /// tokens by what they are derived from. Constants drop out.
    pub fn narrow(needs: &TokenSet, scope: &BTreeSet<TokenId>) -> TokenSet {
        let mut out = TokenSet::new();
        let mut seen = BTreeSet::new();
        for t in needs.iter() {
            Self::narrow_into(t, scope, &mut out, &mut seen);
        }
        out
    }

    fn narrow_into(token: &Token, scope: &BTreeSet<TokenId>, out: &mut TokenSet, seen: &mut BTreeSet<TokenId>) {
        if !seen.insert(token.id()) {
            return;
        }
        if scope.contains(&token.id()) {
            out.insert(token.clone());
            return;
        }
        for d in token.deps() {
            Self::narrow_into(&d, scope, out, seen);
        }
    }
}
