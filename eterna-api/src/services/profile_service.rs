use std::collections::HashMap;

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{NewPhoto, Photo, Profile, ProfileFields};
use crate::schema::{photos, profiles, users};

/// Body of `POST /api/profile` and `PUT /api/profile`.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "check_age_preference"))]
pub struct ProfileInput {
    #[validate(custom = "not_blank", length(max = 50))]
    pub display_name: String,
    #[validate(length(max = 500))]
    pub bio: Option<String>,
    #[validate(range(min = 18, max = 100, message = "age must be between 18 and 100"))]
    pub age: i32,
    #[validate(custom = "not_blank", length(max = 30))]
    pub gender: String,
    #[validate(custom = "not_blank", length(max = 120))]
    pub location: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub looking_for: Vec<String>,
    #[serde(default = "default_age_min")]
    #[validate(range(min = 18, max = 100))]
    pub age_min: i32,
    #[serde(default = "default_age_max")]
    #[validate(range(min = 18, max = 100))]
    pub age_max: i32,
    #[serde(default = "default_max_distance")]
    #[validate(range(min = 1, max = 500))]
    pub max_distance: i32,
}

fn default_age_min() -> i32 { 18 }
fn default_age_max() -> i32 { 100 }
fn default_max_distance() -> i32 { 50 }

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

fn check_age_preference(input: &ProfileInput) -> Result<(), ValidationError> {
    if input.age_min > input.age_max {
        let mut err = ValidationError::new("age_range");
        err.message = Some("age_min cannot exceed age_max".into());
        return Err(err);
    }
    Ok(())
}

impl ProfileInput {
    pub fn into_fields(self) -> ProfileFields {
        ProfileFields {
            display_name: self.display_name.trim().to_string(),
            bio: self.bio.map(|b| b.trim().to_string()).filter(|b| !b.is_empty()),
            age: self.age,
            gender: self.gender.trim().to_string(),
            location: self.location.trim().to_string(),
            interests: tidy_tags(self.interests),
            looking_for: tidy_tags(self.looking_for),
            age_min: self.age_min,
            age_max: self.age_max,
            max_distance: self.max_distance,
        }
    }
}

/// Trims, drops empties and de-duplicates while keeping the caller's order.
fn tidy_tags(tags: Vec<String>) -> serde_json::Value {
    let mut seen = Vec::<String>::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !seen.contains(&tag) {
            seen.push(tag);
        }
    }
    serde_json::Value::from(seen)
}

#[derive(Debug, Deserialize)]
pub struct PhotoSlot {
    pub url: String,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub is_main: bool,
}

/// Orders the requested photos and settles on exactly one main photo: the
/// first flagged one, or the first photo when none is flagged.
pub fn arrange_photos(profile_id: Uuid, slots: Vec<PhotoSlot>) -> Vec<NewPhoto> {
    let mut indexed: Vec<(i32, PhotoSlot)> = slots
        .into_iter()
        .enumerate()
        .filter(|(_, s)| !s.url.trim().is_empty())
        .map(|(i, s)| (s.position.unwrap_or(i as i32), s))
        .collect();
    indexed.sort_by_key(|(pos, _)| *pos);

    let main_index = indexed.iter().position(|(_, s)| s.is_main).unwrap_or(0);

    indexed
        .into_iter()
        .enumerate()
        .map(|(i, (_, slot))| NewPhoto {
            profile_id,
            url: slot.url.trim().to_string(),
            position: i as i32,
            is_main: i == main_index,
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct ProfileWithPhotos {
    #[serde(flatten)]
    pub profile: ProfileView,
    pub photos: Vec<Photo>,
}

/// Profile as sent to clients; JSON tag columns are unpacked into lists.
#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
    pub bio: Option<String>,
    pub age: i32,
    pub gender: String,
    pub location: String,
    pub interests: Vec<String>,
    pub looking_for: Vec<String>,
    pub age_min: i32,
    pub age_max: i32,
    pub max_distance: i32,
    pub is_visible: bool,
    pub last_active: chrono::DateTime<chrono::Utc>,
}

impl From<&Profile> for ProfileView {
    fn from(p: &Profile) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            display_name: p.display_name.clone(),
            bio: p.bio.clone(),
            age: p.age,
            gender: p.gender.clone(),
            location: p.location.clone(),
            interests: p.interest_list(),
            looking_for: p.looking_for_list(),
            age_min: p.age_min,
            age_max: p.age_max,
            max_distance: p.max_distance,
            is_visible: p.is_visible,
            last_active: p.last_active,
        }
    }
}

/// Compact profile used wherever another user is shown (matches, likes,
/// admin lists). `id` is the user id.
#[derive(Debug, Serialize, Clone)]
pub struct ProfileCard {
    pub id: Uuid,
    pub name: Option<String>,
    pub display_name: String,
    pub age: i32,
    pub bio: Option<String>,
    pub location: String,
    pub interests: Vec<String>,
    pub looking_for: Vec<String>,
    pub photos: Vec<Photo>,
}

pub fn find_by_user(conn: &mut PgConnection, user_id: Uuid) -> QueryResult<Option<Profile>> {
    profiles::table
        .filter(profiles::user_id.eq(user_id))
        .first::<Profile>(conn)
        .optional()
}

/// Photos of the given profiles, each list ordered by position.
pub fn photos_by_profile(
    conn: &mut PgConnection,
    profile_ids: &[Uuid],
) -> QueryResult<HashMap<Uuid, Vec<Photo>>> {
    let rows = photos::table
        .filter(photos::profile_id.eq_any(profile_ids))
        .order((photos::profile_id, photos::position.asc()))
        .load::<Photo>(conn)?;

    let mut grouped: HashMap<Uuid, Vec<Photo>> = HashMap::new();
    for photo in rows {
        grouped.entry(photo.profile_id).or_default().push(photo);
    }
    Ok(grouped)
}

pub fn with_photos(conn: &mut PgConnection, profile: &Profile) -> QueryResult<ProfileWithPhotos> {
    let photos = photos::table
        .filter(photos::profile_id.eq(profile.id))
        .order(photos::position.asc())
        .load::<Photo>(conn)?;
    Ok(ProfileWithPhotos { profile: ProfileView::from(profile), photos })
}

pub fn card(profile: &Profile, name: Option<String>, photos: Vec<Photo>) -> ProfileCard {
    ProfileCard {
        id: profile.user_id,
        name,
        display_name: profile.display_name.clone(),
        age: profile.age,
        bio: profile.bio.clone(),
        location: profile.location.clone(),
        interests: profile.interest_list(),
        looking_for: profile.looking_for_list(),
        photos,
    }
}

/// Cards for a set of users keyed by user id. Users without a profile are
/// absent from the map.
pub fn cards_for_users(
    conn: &mut PgConnection,
    user_ids: &[Uuid],
) -> QueryResult<HashMap<Uuid, ProfileCard>> {
    let rows: Vec<(Profile, Option<String>)> = profiles::table
        .inner_join(users::table)
        .filter(profiles::user_id.eq_any(user_ids))
        .select((profiles::all_columns, users::name))
        .load(conn)?;

    let profile_ids: Vec<Uuid> = rows.iter().map(|(p, _)| p.id).collect();
    let mut photos = photos_by_profile(conn, &profile_ids)?;

    Ok(rows
        .into_iter()
        .map(|(profile, name)| {
            let photos = photos.remove(&profile.id).unwrap_or_default();
            (profile.user_id, card(&profile, name, photos))
        })
        .collect())
}

/// The main photo out of a position-ordered list.
pub fn main_photo(photos: &[Photo]) -> Option<&Photo> {
    photos.iter().find(|p| p.is_main).or_else(|| photos.first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(value: serde_json::Value) -> ProfileInput {
        serde_json::from_value(value).unwrap()
    }

    fn valid() -> serde_json::Value {
        json!({
            "display_name": "Alex",
            "age": 29,
            "gender": "female",
            "location": "Lyon",
            "interests": ["hiking", " jazz ", "hiking", ""],
        })
    }

    #[test]
    fn valid_profile_passes_with_defaults() {
        let p = input(valid());
        assert!(p.validate().is_ok());
        let fields = p.into_fields();
        assert_eq!(fields.age_min, 18);
        assert_eq!(fields.age_max, 100);
        assert_eq!(fields.max_distance, 50);
        assert_eq!(fields.interests, json!(["hiking", "jazz"]));
        assert_eq!(fields.looking_for, json!([]));
    }

    #[test]
    fn underage_is_rejected() {
        let mut v = valid();
        v["age"] = json!(17);
        let errors = input(v).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("age"));
    }

    #[test]
    fn blank_required_fields_are_rejected() {
        let mut v = valid();
        v["display_name"] = json!("   ");
        v["location"] = json!("");
        let errors = input(v).validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("display_name"));
        assert!(fields.contains_key("location"));
    }

    #[test]
    fn preference_bounds_are_enforced() {
        let mut v = valid();
        v["max_distance"] = json!(501);
        assert!(input(v).validate().is_err());

        let mut v = valid();
        v["age_min"] = json!(40);
        v["age_max"] = json!(30);
        assert!(input(v).validate().is_err());
    }

    #[test]
    fn first_photo_becomes_main_when_none_flagged() {
        let pid = Uuid::now_v7();
        let slots = vec![
            PhotoSlot { url: "b".into(), position: Some(2), is_main: false },
            PhotoSlot { url: "a".into(), position: Some(1), is_main: false },
        ];
        let photos = arrange_photos(pid, slots);
        assert_eq!(photos[0].url, "a");
        assert!(photos[0].is_main);
        assert!(!photos[1].is_main);
        assert_eq!(photos[1].position, 1);
    }

    #[test]
    fn only_one_main_photo_survives() {
        let pid = Uuid::now_v7();
        let slots = vec![
            PhotoSlot { url: "a".into(), position: None, is_main: false },
            PhotoSlot { url: "b".into(), position: None, is_main: true },
            PhotoSlot { url: "c".into(), position: None, is_main: true },
        ];
        let photos = arrange_photos(pid, slots);
        let mains: Vec<_> = photos.iter().filter(|p| p.is_main).map(|p| p.url.as_str()).collect();
        assert_eq!(mains, vec!["b"]);
    }

    #[test]
    fn blank_urls_are_dropped() {
        let photos = arrange_photos(
            Uuid::now_v7(),
            vec![PhotoSlot { url: " ".into(), position: None, is_main: true }],
        );
        assert!(photos.is_empty());
    }
}
