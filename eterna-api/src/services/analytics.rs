use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use diesel::prelude::*;
use serde::Serialize;

use crate::models::string_list;
use crate::schema::{matches, messages, profiles, users};

pub const GROWTH_DAYS: usize = 7;
const TOP_N: usize = 10;

/// Reporting window accepted by `?range=`; anything unrecognised is 30 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsRange {
    Week,
    Month,
    Quarter,
}

impl AnalyticsRange {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("7d") => Self::Week,
            Some("90d") => Self::Quarter,
            _ => Self::Month,
        }
    }

    pub fn days(self) -> i64 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
        }
    }

    pub fn since(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days())
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct LabelCount {
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct Analytics {
    pub range_days: i64,
    pub total_users: i64,
    pub active_users: i64,
    pub total_matches: i64,
    pub total_messages: i64,
    pub user_growth: Vec<DailyCount>,
    pub match_growth: Vec<DailyCount>,
    pub message_growth: Vec<DailyCount>,
    pub top_interests: Vec<LabelCount>,
    pub age_distribution: Vec<LabelCount>,
    pub location_stats: Vec<LabelCount>,
}

/// Counts per UTC day for the `GROWTH_DAYS` days ending on `today`, oldest
/// first. Timestamps outside the window are ignored.
pub fn daily_buckets(today: NaiveDate, stamps: &[DateTime<Utc>]) -> Vec<DailyCount> {
    let first = today - Duration::days(GROWTH_DAYS as i64 - 1);
    let mut counts = [0u64; GROWTH_DAYS];
    for stamp in stamps {
        let offset = (stamp.date_naive() - first).num_days();
        if (0..GROWTH_DAYS as i64).contains(&offset) {
            counts[offset as usize] += 1;
        }
    }
    counts
        .iter()
        .enumerate()
        .map(|(i, &count)| DailyCount { date: first + Duration::days(i as i64), count })
        .collect()
}

pub const AGE_BUCKETS: [&str; 5] = ["18-24", "25-34", "35-44", "45-54", "55+"];

fn age_bucket(age: i32) -> Option<usize> {
    match age {
        i32::MIN..=17 => None,
        18..=24 => Some(0),
        25..=34 => Some(1),
        35..=44 => Some(2),
        45..=54 => Some(3),
        _ => Some(4),
    }
}

/// Every bucket is present, even when empty.
pub fn age_distribution(ages: &[i32]) -> Vec<LabelCount> {
    let mut counts = [0u64; AGE_BUCKETS.len()];
    for bucket in ages.iter().filter_map(|&a| age_bucket(a)) {
        counts[bucket] += 1;
    }
    AGE_BUCKETS
        .iter()
        .zip(counts)
        .map(|(label, count)| LabelCount { label: label.to_string(), count })
        .collect()
}

/// The `TOP_N` most frequent labels, ties broken alphabetically. Blank
/// labels are skipped.
pub fn top_labels<I, S>(labels: I) -> Vec<LabelCount>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tally: HashMap<String, u64> = HashMap::new();
    for label in labels {
        let label = label.as_ref().trim();
        if !label.is_empty() {
            *tally.entry(label.to_string()).or_default() += 1;
        }
    }

    let mut ranked: Vec<LabelCount> = tally
        .into_iter()
        .map(|(label, count)| LabelCount { label, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    ranked.truncate(TOP_N);
    ranked
}

pub fn compute(conn: &mut PgConnection, range: AnalyticsRange, now: DateTime<Utc>) -> QueryResult<Analytics> {
    let since = range.since(now);
    let growth_start = (now.date_naive() - Duration::days(GROWTH_DAYS as i64 - 1))
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or(since);

    let total_users: i64 = users::table.count().get_result(conn)?;
    let active_users: i64 = profiles::table
        .filter(profiles::last_active.ge(since))
        .count()
        .get_result(conn)?;
    // Mirrored rows: count each pair once.
    let total_matches: i64 = matches::table
        .filter(matches::created_at.ge(since))
        .filter(matches::user_id.lt(matches::target_id))
        .count()
        .get_result(conn)?;
    let total_messages: i64 = messages::table
        .filter(messages::created_at.ge(since))
        .count()
        .get_result(conn)?;

    let user_stamps: Vec<DateTime<Utc>> = users::table
        .filter(users::created_at.ge(growth_start))
        .select(users::created_at)
        .load(conn)?;
    let match_stamps: Vec<DateTime<Utc>> = matches::table
        .filter(matches::created_at.ge(growth_start))
        .filter(matches::user_id.lt(matches::target_id))
        .select(matches::created_at)
        .load(conn)?;
    let message_stamps: Vec<DateTime<Utc>> = messages::table
        .filter(messages::created_at.ge(growth_start))
        .select(messages::created_at)
        .load(conn)?;

    let profile_rows: Vec<(serde_json::Value, i32, String)> = profiles::table
        .select((profiles::interests, profiles::age, profiles::location))
        .load(conn)?;

    let today = now.date_naive();
    let interests = profile_rows.iter().flat_map(|(i, _, _)| string_list(i));
    let ages: Vec<i32> = profile_rows.iter().map(|(_, a, _)| *a).collect();

    Ok(Analytics {
        range_days: range.days(),
        total_users,
        active_users,
        total_matches,
        total_messages,
        user_growth: daily_buckets(today, &user_stamps),
        match_growth: daily_buckets(today, &match_stamps),
        message_growth: daily_buckets(today, &message_stamps),
        top_interests: top_labels(interests),
        age_distribution: age_distribution(&ages),
        location_stats: top_labels(profile_rows.iter().map(|(_, _, l)| l.as_str())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn range_defaults_to_thirty_days() {
        assert_eq!(AnalyticsRange::parse(None).days(), 30);
        assert_eq!(AnalyticsRange::parse(Some("7d")).days(), 7);
        assert_eq!(AnalyticsRange::parse(Some("90d")).days(), 90);
        assert_eq!(AnalyticsRange::parse(Some("1y")).days(), 30);
    }

    #[test]
    fn buckets_cover_seven_days_oldest_first() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let stamps = vec![
            Utc.with_ymd_and_hms(2025, 3, 10, 23, 59, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 4, 12, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 3, 12, 0, 0).unwrap(),
        ];
        let buckets = daily_buckets(today, &stamps);
        assert_eq!(buckets.len(), 7);
        assert_eq!(buckets[0].date, NaiveDate::from_ymd_opt(2025, 3, 4).unwrap());
        assert_eq!(buckets[0].count, 1);
        assert_eq!(buckets[6].count, 2);
        assert_eq!(buckets.iter().map(|b| b.count).sum::<u64>(), 3);
    }

    #[test]
    fn ages_fall_into_fixed_buckets() {
        let dist = age_distribution(&[18, 24, 25, 44, 54, 55, 99, 17]);
        let counts: Vec<u64> = dist.iter().map(|d| d.count).collect();
        assert_eq!(counts, vec![2, 1, 1, 1, 2]);
        assert_eq!(dist[4].label, "55+");
    }

    #[test]
    fn top_labels_rank_by_count_then_name() {
        let ranked = top_labels(["jazz", "hiking", "jazz", " ", "art", "hiking", "jazz"]);
        assert_eq!(ranked[0], LabelCount { label: "jazz".into(), count: 3 });
        assert_eq!(ranked[1].label, "hiking");
        assert_eq!(ranked[2].label, "art");
        assert_eq!(ranked.len(), 3);
    }

    #[test]
    fn top_labels_are_capped() {
        let labels: Vec<String> = (0..25).map(|i| format!("city-{i:02}")).collect();
        assert_eq!(top_labels(&labels).len(), TOP_N);
    }
}
