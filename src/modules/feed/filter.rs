use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::modules::feed::model::{Emotion, FeedEntry};
use crate::utils::normalize_tag;

/// Ephemeral view filter over the flattened feed. Empty criteria match
/// everything; tags use AND semantics (an entry must carry every selected
/// tag), matched case- and `#`-prefix-insensitively.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    pub emotions: HashSet<Emotion>,
    pub tags: HashSet<String>,
    pub countries: HashSet<String>,
    pub date_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        self.emotions.is_empty()
            && self.tags.is_empty()
            && self.countries.is_empty()
            && self.date_range.is_none()
    }

    pub fn matches(&self, entry: &FeedEntry) -> bool {
        if !self.emotions.is_empty() && !self.emotions.contains(&entry.emotion) {
            return false;
        }

        if !self.countries.is_empty() && !self.countries.contains(&entry.country) {
            return false;
        }

        if !self.tags.is_empty() {
            let entry_tags: HashSet<String> =
                entry.tags.iter().map(|t| normalize_tag(t)).collect();
            let all_present =
                self.tags.iter().all(|wanted| entry_tags.contains(&normalize_tag(wanted)));
            if !all_present {
                return false;
            }
        }

        if let Some((from, to)) = self.date_range {
            if entry.created_at < from || entry.created_at > to {
                return false;
            }
        }

        true
    }

    pub fn apply(&self, entries: Vec<FeedEntry>) -> Vec<FeedEntry> {
        if self.is_empty() {
            return entries;
        }
        entries.into_iter().filter(|e| self.matches(e)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::auth::model::UserProfile;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn entry(tags: &[&str], emotion: Emotion, country: &str) -> FeedEntry {
        FeedEntry {
            id: Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext)),
            user_id: Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext)),
            latitude: 33.49,
            longitude: 126.53,
            place_name: "Jeju".into(),
            country: country.into(),
            emotion,
            photos: vec![],
            diary: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            like_count: 0,
            liked_by_me: false,
            view_count: 0,
            comment_count: 0,
            user: UserProfile {
                id: Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext)),
                username: "mina".into(),
                display_name: "Mina Park".into(),
                avatar_url: None,
            },
            created_at: chrono::Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn tag_filter_requires_every_selected_tag() {
        let mut filter = FilterState::default();
        filter.tags = ["바다".to_string(), "여행".to_string()].into_iter().collect();

        // Superset of the required tags: matches.
        assert!(filter.matches(&entry(&["바다", "여행", "제주"], Emotion::Happy, "KR")));
        // Only one of the two: AND semantics reject it.
        assert!(!filter.matches(&entry(&["바다"], Emotion::Happy, "KR")));
        assert!(!filter.matches(&entry(&["제주"], Emotion::Happy, "KR")));
    }

    #[test]
    fn tag_filter_ignores_case_and_hash_prefix() {
        let mut filter = FilterState::default();
        filter.tags = ["#Beach".to_string()].into_iter().collect();

        assert!(filter.matches(&entry(&["beach"], Emotion::Peaceful, "KR")));
        assert!(filter.matches(&entry(&["#BEACH"], Emotion::Peaceful, "KR")));
        assert!(!filter.matches(&entry(&["mountain"], Emotion::Peaceful, "KR")));
    }

    #[test]
    fn emotion_and_country_are_set_membership() {
        let mut filter = FilterState::default();
        filter.emotions = [Emotion::Happy, Emotion::Excited].into_iter().collect();
        filter.countries = ["KR".to_string()].into_iter().collect();

        assert!(filter.matches(&entry(&[], Emotion::Happy, "KR")));
        assert!(!filter.matches(&entry(&[], Emotion::Tired, "KR")));
        assert!(!filter.matches(&entry(&[], Emotion::Happy, "JP")));
    }

    #[test]
    fn date_range_is_inclusive() {
        let mut filter = FilterState::default();
        let from = chrono::Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let to = chrono::Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        filter.date_range = Some((from, to));

        // Entry timestamp equals the upper bound.
        assert!(filter.matches(&entry(&[], Emotion::Happy, "KR")));

        filter.date_range =
            Some((from, chrono::Utc.with_ymd_and_hms(2025, 6, 10, 0, 0, 0).unwrap()));
        assert!(!filter.matches(&entry(&[], Emotion::Happy, "KR")));
    }

    #[test]
    fn empty_filter_passes_everything_through() {
        let filter = FilterState::default();
        let entries = vec![entry(&["바다"], Emotion::Happy, "KR")];
        assert_eq!(filter.apply(entries.clone()), entries);
    }
}
