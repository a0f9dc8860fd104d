use std::sync::Arc;

use crate::{
    error::MatchError,
    nfa::GroupInfo,
    util::matches::{Match, Span},
};

/// The spans of every capture group of one match.
///
/// Create one with [`Regex::create_captures`](crate::Regex::create_captures) and reuse it
/// across searches. Group 0 is the overall match, and groups that did not participate in
/// the match have no span.
///
/// ```
/// use ib_regex::{Regex, Span};
///
/// let re = Regex::new(r"(?P<y>\d{4})-(\d{2})(x)?").unwrap();
/// let mut caps = re.create_captures();
/// assert!(re.captures_at("on 2010-03", 0, &mut caps));
/// assert_eq!(caps.get_match().unwrap().range(), 3..10);
/// assert_eq!(caps.get_group_by_name("y"), Some(Span::from(3..7)));
/// assert_eq!(caps.get(2), Some(Span::from(8..10)));
/// assert_eq!(caps.get(3), None);
/// assert_eq!(caps.get(4), None);
/// assert!(caps.try_get(4).is_err());
/// ```
#[derive(Clone, Debug)]
pub struct Captures {
    group_info: Arc<GroupInfo>,
    slots: Vec<Option<usize>>,
}

impl Captures {
    pub(crate) fn new(group_info: Arc<GroupInfo>) -> Self {
        let slots = vec![None; group_info.slot_len()];
        Self { group_info, slots }
    }

    pub(crate) fn is_for(&self, group_info: &Arc<GroupInfo>) -> bool {
        Arc::ptr_eq(&self.group_info, group_info)
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Option<usize>] {
        &mut self.slots
    }

    pub fn group_info(&self) -> &GroupInfo {
        &self.group_info
    }

    /// Whether the last search matched.
    #[inline]
    pub fn is_match(&self) -> bool {
        self.slots[0].is_some()
    }

    pub fn get_match(&self) -> Option<Match> {
        self.get(0).map(|span| Match::new(span.start, span.end))
    }

    /// The span of group `index`, or `None` if the group did not participate in the match
    /// or does not exist.
    pub fn get(&self, index: usize) -> Option<Span> {
        let start = (*self.slots.get(index * 2)?)?;
        let end = (*self.slots.get(index * 2 + 1)?)?;
        Some(Span { start, end })
    }

    /// Like [`Captures::get`], but reports groups that do not exist as an error.
    pub fn try_get(&self, index: usize) -> Result<Option<Span>, MatchError> {
        let len = self.group_len();
        if index >= len {
            return Err(MatchError::InvalidGroupIndex { index, len });
        }
        Ok(self.get(index))
    }

    pub fn get_group_by_name(&self, name: &str) -> Option<Span> {
        self.get(self.name_to_index(name)?)
    }

    pub fn name_to_index(&self, name: &str) -> Option<usize> {
        self.group_info.to_index(name)
    }

    /// The number of groups, including group 0.
    pub fn group_len(&self) -> usize {
        self.group_info.group_len()
    }

    /// The spans of all groups in index order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Option<Span>> + '_ {
        (0..self.group_len()).map(|index| self.get(index))
    }

    /// Clears all spans, so that [`Captures::is_match`] is false.
    pub fn clear(&mut self) {
        self.slots.fill(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax;

    fn captures(pattern: &str) -> Captures {
        Captures::new(Arc::new(GroupInfo::new(&syntax::parse(pattern).unwrap())))
    }

    #[test]
    fn spans() {
        let mut caps = captures("(a)(?P<b>b)?");
        assert!(!caps.is_match());
        assert_eq!(caps.group_len(), 3);
        caps.slots_mut()[..4].copy_from_slice(&[Some(0), Some(1), Some(0), Some(1)]);
        assert!(caps.is_match());
        assert_eq!(caps.get_match(), Some(Match::new(0, 1)));
        assert_eq!(caps.get(1), Some(Span::from(0..1)));
        assert_eq!(caps.get_group_by_name("b"), None);
        assert_eq!(caps.name_to_index("b"), Some(2));
        assert_eq!(caps.try_get(2), Ok(None));
        assert_eq!(
            caps.try_get(3),
            Err(MatchError::InvalidGroupIndex { index: 3, len: 3 })
        );
        assert_eq!(caps.iter().filter(Option::is_some).count(), 2);

        caps.clear();
        assert!(!caps.is_match());
        assert_eq!(caps.get_match(), None);
    }

    #[test]
    fn is_for() {
        let a = captures("a");
        let b = captures("a");
        assert!(a.is_for(&a.group_info));
        assert!(!a.is_for(&b.group_info));
    }
}
