use chrono::Utc;

/// Run-scoped source of test-case identifiers.
///
/// Identifiers keep the `<millis>-<fullTitle>` form, but the stamp never
/// repeats: when the wall clock has not advanced since the previous call the
/// stamp is bumped past it. Sharing one clock across every worker of a run
/// makes identifiers unique for the whole run even for identical titles.
#[derive(Debug, Default)]
pub struct IdClock {
    last_stamp: i64,
}

impl IdClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next strictly increasing millisecond stamp
    pub fn next_stamp(&mut self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let stamp = if now > self.last_stamp {
            now
        } else {
            self.last_stamp + 1
        };
        self.last_stamp = stamp;
        stamp
    }

    pub fn test_uuid(&mut self, full_title: &str) -> String {
        format!("{}-{}", self.next_stamp(), full_title)
    }
}

/// How a suite in a spec is treated when building the tree
///
/// The host nests every spec's real suites under one wrapper suite, which it
/// always reports first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteRole {
    /// Structural wrapper: folded into the synthetic root, its tests are not emitted
    Wrapper,
    /// User-authored suite
    Content,
}

impl SuiteRole {
    pub fn for_position(position: usize) -> Self {
        if position == 0 {
            SuiteRole::Wrapper
        } else {
            SuiteRole::Content
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_same_title_never_collides() {
        let mut clock = IdClock::new();
        let ids: HashSet<String> = (0..1000).map(|_| clock.test_uuid("Loginworks")).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_stamps_strictly_increase() {
        let mut clock = IdClock::new();
        let mut previous = clock.next_stamp();
        for _ in 0..100 {
            let next = clock.next_stamp();
            assert!(next > previous);
            previous = next;
        }
    }

    #[test]
    fn test_uuid_format() {
        let mut clock = IdClock::new();
        let uuid = clock.test_uuid("Suitetitle");
        let (stamp, title) = uuid.split_once('-').unwrap();
        assert!(stamp.parse::<i64>().is_ok());
        assert_eq!(title, "Suitetitle");
    }

    #[test]
    fn test_suite_roles() {
        assert_eq!(SuiteRole::for_position(0), SuiteRole::Wrapper);
        assert_eq!(SuiteRole::for_position(1), SuiteRole::Content);
        assert_eq!(SuiteRole::for_position(7), SuiteRole::Content);
    }
}
