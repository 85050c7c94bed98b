use diesel::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use uuid::Uuid;

use eterna_shared::errors::AppError;

use crate::models::Profile;
use crate::schema::{likes, profiles, users};

pub const PAGE_SIZE: i64 = 10;

const DEFAULT_AGE_MIN: i32 = 18;
const DEFAULT_AGE_MAX: i32 = 35;
const DEFAULT_DISTANCE: i32 = 50;

/// Raw `GET /api/discover` query. Values stay strings so bad numbers fall
/// back to defaults instead of failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct DiscoverQuery {
    #[serde(alias = "ageMin")]
    pub age_min: Option<String>,
    #[serde(alias = "ageMax")]
    pub age_max: Option<String>,
    pub distance: Option<String>,
    /// JSON array, e.g. `["hiking","jazz"]`.
    pub interests: Option<String>,
    pub location: Option<String>,
    pub gender: Option<String>,
    #[serde(alias = "lookingFor")]
    pub looking_for: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryFilter {
    pub age_min: i32,
    pub age_max: i32,
    /// Accepted but not applied; locations are free text.
    pub distance: i32,
    pub interests: Vec<String>,
    pub location: Option<String>,
    pub gender: Option<String>,
    pub looking_for: Vec<String>,
}

impl TryFrom<DiscoverQuery> for DiscoveryFilter {
    type Error = AppError;

    fn try_from(q: DiscoverQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            age_min: parse_int(q.age_min.as_deref(), DEFAULT_AGE_MIN),
            age_max: parse_int(q.age_max.as_deref(), DEFAULT_AGE_MAX),
            distance: parse_int(q.distance.as_deref(), DEFAULT_DISTANCE),
            interests: parse_list("interests", q.interests.as_deref())?,
            location: non_empty(q.location),
            gender: non_empty(q.gender),
            looking_for: parse_list("looking_for", q.looking_for.as_deref())?,
        })
    }
}

impl DiscoveryFilter {
    /// The age bound only narrows results once it differs from the full
    /// 18..=100 span.
    pub fn age_range(&self) -> Option<(i32, i32)> {
        (self.age_min > 18 || self.age_max < 100).then_some((self.age_min, self.age_max))
    }
}

fn parse_int(raw: Option<&str>, default: i32) -> i32 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn parse_list(field: &str, raw: Option<&str>) -> Result<Vec<String>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(json) => serde_json::from_str(json)
            .map_err(|_| AppError::bad_request(format!("{field} must be a JSON array of strings"))),
    }
}

/// Escapes LIKE wildcards so user input matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Candidates for `viewer`, most recently active first, paired with the
/// account name. At most [`PAGE_SIZE`] rows.
pub fn find_candidates(
    conn: &mut PgConnection,
    viewer: Uuid,
    filter: &DiscoveryFilter,
    verified_only: bool,
) -> QueryResult<Vec<(Profile, Option<String>)>> {
    let already_seen: Vec<Uuid> = likes::table
        .filter(likes::sender_id.eq(viewer))
        .select(likes::receiver_id)
        .load(conn)?;

    let mut query = profiles::table
        .inner_join(users::table)
        .filter(profiles::user_id.ne(viewer))
        .filter(diesel::dsl::not(profiles::user_id.eq_any(already_seen)))
        .filter(profiles::is_visible.eq(true))
        .filter(users::is_banned.eq(false))
        .select((profiles::all_columns, users::name))
        .into_boxed();

    if let Some((min, max)) = filter.age_range() {
        query = query.filter(profiles::age.between(min, max));
    }
    if let Some(gender) = &filter.gender {
        query = query.filter(profiles::gender.eq(gender.clone()));
    }
    if let Some(location) = &filter.location {
        query = query.filter(profiles::location.ilike(like_pattern(location)));
    }
    if !filter.interests.is_empty() {
        query = query.filter(profiles::interests.ne(serde_json::json!([])));
    }
    if !filter.looking_for.is_empty() {
        query = query.filter(profiles::looking_for.ne(serde_json::json!([])));
    }
    if verified_only {
        query = query.filter(users::verified.eq(true));
    }

    query
        .order(profiles::last_active.desc())
        .limit(PAGE_SIZE)
        .load(conn)
}

/// Randomises a page in place and reports whether more candidates likely exist.
pub fn shuffle_page<T, R: Rng + ?Sized>(page: &mut [T], rng: &mut R) -> bool {
    page.shuffle(rng);
    page.len() as i64 == PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn filter(q: DiscoverQuery) -> DiscoveryFilter {
        DiscoveryFilter::try_from(q).unwrap()
    }

    #[test]
    fn defaults_apply_when_params_missing() {
        let f = filter(DiscoverQuery::default());
        assert_eq!((f.age_min, f.age_max, f.distance), (18, 35, 50));
        assert!(f.interests.is_empty());
        assert_eq!(f.age_range(), Some((18, 35)));
    }

    #[test]
    fn unparseable_numbers_fall_back() {
        let f = filter(DiscoverQuery {
            age_min: Some("abc".into()),
            age_max: Some(" 40 ".into()),
            ..Default::default()
        });
        assert_eq!((f.age_min, f.age_max), (18, 40));
    }

    #[test]
    fn full_span_disables_age_filter() {
        let f = filter(DiscoverQuery {
            age_min: Some("18".into()),
            age_max: Some("100".into()),
            ..Default::default()
        });
        assert_eq!(f.age_range(), None);

        let f = filter(DiscoverQuery {
            age_min: Some("19".into()),
            age_max: Some("100".into()),
            ..Default::default()
        });
        assert_eq!(f.age_range(), Some((19, 100)));
    }

    #[test]
    fn list_params_are_json_arrays() {
        let f = filter(DiscoverQuery {
            interests: Some(r#"["hiking","jazz"]"#.into()),
            looking_for: Some("[]".into()),
            gender: Some("  ".into()),
            ..Default::default()
        });
        assert_eq!(f.interests, vec!["hiking", "jazz"]);
        assert!(f.looking_for.is_empty());
        assert_eq!(f.gender, None);
    }

    #[test]
    fn malformed_list_is_a_bad_request() {
        let err = DiscoveryFilter::try_from(DiscoverQuery {
            interests: Some("hiking".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.code(), eterna_shared::ErrorCode::BadRequest);
    }

    #[test]
    fn camel_case_aliases_are_accepted() {
        let q: DiscoverQuery =
            serde_json::from_value(serde_json::json!({"ageMin": "21", "lookingFor": "[\"friends\"]"})).unwrap();
        let f = filter(q);
        assert_eq!(f.age_min, 21);
        assert_eq!(f.looking_for, vec!["friends"]);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("san"), "%san%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn full_page_signals_more() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut full: Vec<i32> = (0..10).collect();
        assert!(shuffle_page(&mut full, &mut rng));
        let mut sorted = full.clone();
        sorted.sort();
        assert_eq!(sorted, (0..10).collect::<Vec<_>>());

        let mut short = vec![1, 2, 3];
        assert!(!shuffle_page(&mut short, &mut rng));
    }
}
