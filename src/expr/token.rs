use std::{
    collections::{btree_map, BTreeMap},
    fmt,
    hash::{Hash, Hasher},
    sync::{atomic::{AtomicU64, Ordering}, Arc},
};

use crate::expr::{Fragment, Segment};

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(0);
static NEXT_ALIAS: AtomicU64 = AtomicU64::new(0);

/// Identity of a [`Token`]. Ids are handed out in creation order, so sorting
/// by id gives a stable, reproducible order for select lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(u64);

/// Opaque symbol standing for one FROM/JOIN source. Its textual alias is only
/// decided when the final statement is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AliasId(u64);

impl AliasId {
    pub fn mint() -> Self {
        Self(NEXT_ALIAS.fetch_add(1, Ordering::Relaxed))
    }
}

struct TokenInner {
    id: TokenId,
    fragment: Fragment,
}

/// Identity-bearing handle to one SQL expression.
///
/// Two tokens are equal only when they come from the same `Token::new` call,
/// whatever text they hold. Cloning a token clones the handle, not the identity.
#[derive(Clone)]
pub struct Token(Arc<TokenInner>);

impl Token {
    pub fn new(fragment: impl Into<Fragment>) -> Self {
        let id = TokenId(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed));
        Self(Arc::new(TokenInner { id, fragment: fragment.into() }))
    }

    pub fn id(&self) -> TokenId {
        self.0.id
    }

    /// The expression this token stands for when nothing redirects it.
    pub fn fragment(&self) -> &Fragment {
        &self.0.fragment
    }

    /// Tokens referenced directly by this token's expression.
    pub fn deps(&self) -> Vec<Token> {
        self.0.fragment.tokens()
    }

    /// True when the expression reads a source column without going through
    /// another token, i.e. it only makes sense inside that source's scope.
    pub fn reads_source(&self) -> bool {
        self.0.fragment.reads_source()
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token#{}", self.0.id.0)
    }
}

impl From<Token> for Segment {
    fn from(token: Token) -> Self {
        Segment::Token(token)
    }
}

/// Set of tokens keyed (and ordered) by identity.
#[derive(Debug, Clone, Default)]
pub struct TokenSet(BTreeMap<TokenId, Token>);

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: Token) -> bool {
        self.0.insert(token.id(), token).is_none()
    }

    pub fn contains(&self, id: TokenId) -> bool {
        self.0.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.0.values()
    }

    pub fn union(&self, other: &TokenSet) -> TokenSet {
        let mut out = self.clone();
        out.extend(other.iter().cloned());
        out
    }
}

impl Extend<Token> for TokenSet {
    fn extend<I: IntoIterator<Item = Token>>(&mut self, iter: I) {
        for t in iter {
            self.insert(t);
        }
    }
}

impl FromIterator<Token> for TokenSet {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        let mut set = TokenSet::new();
        set.extend(iter);
        set
    }
}

impl IntoIterator for TokenSet {
    type Item = Token;
    type IntoIter = btree_map::IntoValues<TokenId, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_values()
    }
}
