use serde::{Deserialize, Serialize};

/// Avatar shown for users without a profile image
pub const DEFAULT_AVATAR_URL: &str = "https://www.gravatar.com/avatar/?d=mp";

/// A user record as served by the remote directory and stored in the local cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    #[serde(rename = "maidenName", default)]
    pub maiden_name: Option<String>,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub gender: Option<String>,
    pub email: String,
    pub phone: String,
    pub username: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(rename = "birthDate", default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub university: Option<String>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Profile image URL, falling back to a generic avatar
    pub fn display_image(&self) -> &str {
        match self.image.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => DEFAULT_AVATAR_URL,
        }
    }
}

/// One page of users with the pagination metadata reported by its source.
///
/// `total` is the size of the whole collection as known to whichever source
/// produced the page: the server's count online, the cached row count offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: u32,
    pub skip: u32,
    pub limit: u32,
}

impl UserPage {
    /// Whether another page exists past this one
    pub fn has_more(&self) -> bool {
        self.skip.saturating_add(self.limit) < self.total
    }

    /// Zero-based index of the page following this one
    pub fn next_page(&self) -> u32 {
        if self.limit == 0 {
            return 0;
        }
        self.skip / self.limit + 1
    }

    pub fn total_pages(&self) -> u32 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(self.limit)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_USER: &str = r#"{
        "id": 1,
        "firstName": "Emily",
        "lastName": "Johnson",
        "maidenName": "Smith",
        "age": 28,
        "gender": "female",
        "email": "emily.johnson@x.dummyjson.com",
        "phone": "+81 965-431-3024",
        "username": "emilys",
        "password": "emilyspass",
        "birthDate": "1996-5-30",
        "image": "https://dummyjson.com/icon/emilys/128",
        "bloodGroup": "O-",
        "height": 193.24,
        "weight": 63.16,
        "eyeColor": "Green",
        "hair": { "color": "Brown", "type": "Curly" },
        "university": "University of Wisconsin--Madison",
        "company": { "department": "Engineering", "name": "Dooley, Kozey and Cronin" }
    }"#;

    fn page(total: u32, skip: u32, limit: u32) -> UserPage {
        UserPage {
            users: Vec::new(),
            total,
            skip,
            limit,
        }
    }

    #[test]
    fn test_parse_user_ignores_unknown_fields() {
        let user: User = serde_json::from_str(SAMPLE_USER).unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.first_name, "Emily");
        assert_eq!(user.maiden_name.as_deref(), Some("Smith"));
        assert_eq!(user.birth_date.as_deref(), Some("1996-5-30"));
        assert_eq!(user.height, Some(193.24));
        assert_eq!(user.university.as_deref(), Some("University of Wisconsin--Madison"));
    }

    #[test]
    fn test_parse_user_missing_optional_fields() {
        let json = r#"{
            "id": 7,
            "firstName": "Ana",
            "lastName": "Lee",
            "maidenName": null,
            "email": "ana@example.com",
            "phone": "555-0100",
            "username": "ana"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.maiden_name, None);
        assert_eq!(user.age, None);
        assert_eq!(user.image, None);
    }

    #[test]
    fn test_full_name() {
        let user: User = serde_json::from_str(SAMPLE_USER).unwrap();
        assert_eq!(user.full_name(), "Emily Johnson");
    }

    #[test]
    fn test_display_image_fallback() {
        let mut user: User = serde_json::from_str(SAMPLE_USER).unwrap();
        assert_eq!(user.display_image(), "https://dummyjson.com/icon/emilys/128");

        user.image = None;
        assert_eq!(user.display_image(), DEFAULT_AVATAR_URL);

        user.image = Some(String::new());
        assert_eq!(user.display_image(), DEFAULT_AVATAR_URL);
    }

    #[test]
    fn test_user_serializes_with_wire_names() {
        let user: User = serde_json::from_str(SAMPLE_USER).unwrap();
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["firstName"], "Emily");
        assert_eq!(value["birthDate"], "1996-5-30");
        assert!(value.get("first_name").is_none());
    }

    #[test]
    fn test_has_more() {
        assert!(page(25, 0, 10).has_more());
        assert!(page(25, 10, 10).has_more());
        assert!(!page(25, 20, 10).has_more());
        assert!(!page(5, 0, 10).has_more());
        assert!(!page(0, 0, 10).has_more());
        // Exactly one full page left nothing over
        assert!(!page(20, 10, 10).has_more());
    }

    #[test]
    fn test_next_page_and_total_pages() {
        assert_eq!(page(25, 0, 10).next_page(), 1);
        assert_eq!(page(25, 20, 10).next_page(), 3);
        assert_eq!(page(25, 0, 10).total_pages(), 3);
        assert_eq!(page(20, 0, 10).total_pages(), 2);
        assert_eq!(page(0, 0, 10).total_pages(), 0);
    }

    #[test]
    fn test_zero_limit_does_not_divide() {
        assert_eq!(page(25, 0, 0).next_page(), 0);
        assert_eq!(page(25, 0, 0).total_pages(), 0);
    }
}
