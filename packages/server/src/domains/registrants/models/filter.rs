use super::RegistrantStatus;
use crate::common::RegistrantId;

/// Status predicate for registrant lookups
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    Any,
    /// NULL or blank status column
    Missing,
    Is(RegistrantStatus),
    In(Vec<RegistrantStatus>),
}

impl StatusFilter {
    pub fn matches(&self, status: Option<RegistrantStatus>) -> bool {
        match (self, status) {
            (StatusFilter::Any, _) => true,
            (StatusFilter::Missing, s) => s.is_none(),
            (StatusFilter::Is(want), Some(s)) => *want == s,
            (StatusFilter::In(want), Some(s)) => want.contains(&s),
            (StatusFilter::Is(_) | StatusFilter::In(_), None) => false,
        }
    }
}

/// Lookup filter understood by every registrant store.
///
/// Results are ordered by id; `after` and `limit` give cursor paging.
#[derive(Debug, Clone, Default)]
pub struct RegistrantFilter {
    pub status: StatusFilter,
    pub sector: Option<String>,
    pub member_id_prefix: Option<String>,
    pub has_member_id: Option<bool>,
    pub after: Option<RegistrantId>,
    pub limit: Option<i64>,
}

impl RegistrantFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    pub fn member_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.member_id_prefix = Some(prefix.into());
        self
    }

    pub fn has_member_id(mut self, present: bool) -> Self {
        self.has_member_id = Some(present);
        self
    }

    pub fn after(mut self, cursor: Option<RegistrantId>) -> Self {
        self.after = cursor;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_filter_matching() {
        use RegistrantStatus::*;

        assert!(StatusFilter::Any.matches(None));
        assert!(StatusFilter::Missing.matches(None));
        assert!(!StatusFilter::Missing.matches(Some(Pending)));
        assert!(StatusFilter::Is(Approved).matches(Some(Approved)));
        assert!(!StatusFilter::Is(Approved).matches(None));
        assert!(StatusFilter::In(vec![Pending, Incomplete]).matches(Some(Incomplete)));
        assert!(!StatusFilter::In(vec![Pending]).matches(Some(Archived)));
    }
}
