use bitflags::bitflags;

bitflags! {
    /// Which clauses a body already carries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BodyState: u16 {
        const LEFT_JOIN  = 1 << 0;
        const INNER_JOIN = 1 << 1;
        const WHERE      = 1 << 2;
        const GROUP_BY   = 1 << 3;
        const HAVING     = 1 << 4;
        const ORDER      = 1 << 5;
        const SKIP       = 1 << 6;
        const TAKE       = 1 << 7;
    }
}

/// Clause kinds a combinator may append to an existing body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    /// WHERE, or HAVING once the body is grouped.
    Filter,
    GroupBy,
    Order,
    /// LIMIT / OFFSET only ever tighten the window.
    Paginate,
}

impl Clause {
    /// States in which the body has to become a subquery before `self` is appended.
    pub fn blockers(self) -> BodyState {
        match self {
            Clause::Filter => BodyState::SKIP | BodyState::TAKE,
            Clause::GroupBy => {
                BodyState::ORDER | BodyState::GROUP_BY | BodyState::HAVING | BodyState::SKIP | BodyState::TAKE
            }
            Clause::Order => BodyState::SKIP | BodyState::TAKE,
            Clause::Paginate => BodyState::empty(),
        }
    }

    pub fn requires_bracket(self, state: BodyState) -> bool {
        state.intersects(self.blockers())
    }
}
