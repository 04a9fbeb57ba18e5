use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// User profile as returned by the OpenID Connect userinfo endpoint.
///
/// Only `name` and `picture` are interpreted; every other field is kept
/// verbatim so the identity record stays opaque to this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Profile {
    pub name: String,
    pub picture: String,
    #[serde(flatten)]
    #[cfg_attr(feature = "ts", ts(skip))]
    pub extra: Map<String, Value>,
}

/// The signed-in user. Exists only after a successful profile fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Session {
    pub display_name: String,
    pub avatar_url: String,
    #[cfg_attr(feature = "ts", ts(type = "Record<string, unknown>"))]
    pub identity: Value,
}

impl Session {
    pub fn from_profile(profile: Profile) -> Self {
        let Profile { name, picture, extra } = profile;

        let mut identity = extra;
        identity.insert("name".to_string(), Value::String(name.clone()));
        identity.insert("picture".to_string(), Value::String(picture.clone()));

        Self {
            display_name: name,
            avatar_url: picture,
            identity: Value::Object(identity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_keeps_unknown_fields() {
        let json = r#"{"sub":"1170","name":"Ada","picture":"u.png","email":"ada@example.com","email_verified":true}"#;
        let profile: Profile = serde_json::from_str(json).expect("profile json");

        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.picture, "u.png");
        assert_eq!(profile.extra.get("sub"), Some(&Value::String("1170".to_string())));
        assert_eq!(profile.extra.get("email_verified"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_profile_requires_name_and_picture() {
        assert!(serde_json::from_str::<Profile>(r#"{"name":"Ada"}"#).is_err());
        assert!(serde_json::from_str::<Profile>(r#"{"picture":"u.png"}"#).is_err());
    }

    #[test]
    fn test_session_from_profile() {
        let profile: Profile =
            serde_json::from_str(r#"{"name":"Ada","picture":"u.png","locale":"en"}"#).unwrap();
        let session = Session::from_profile(profile);

        assert_eq!(session.display_name, "Ada");
        assert_eq!(session.avatar_url, "u.png");
        assert_eq!(session.identity["locale"], "en");
        assert_eq!(session.identity["name"], "Ada");
    }
}
