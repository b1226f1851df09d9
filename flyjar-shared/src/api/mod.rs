use serde::{Deserialize, Deserializer, Serialize, de};

pub mod endpoints;
pub mod messages;

/// Name of the raw request header carrying the session token.
pub const TOKEN_HEADER: &str = "token";

// Auth
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AuthReq {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl AuthReq {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResp {
    pub message: String,
    pub token: String,
}

// Generic bodies
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResp {
    pub message: String,
}

impl MessageResp {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResp {
    pub error: String,
}

// Profile
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResp {
    pub message: String,
    pub username: String,
    pub pokemon: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProfileUpdateReq {
    pub pokemon: Option<String>,
}

// Jars
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct JarReq {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JarDto {
    pub id: i32,
    pub user_id: Option<i32>,
    pub name: Option<String>,
}

// Flies
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlyReq {
    #[serde(default, deserialize_with = "lenient_id")]
    pub jar_id: Option<i32>,
    pub body_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlyDto {
    pub id: i32,
    pub jar_id: Option<i32>,
    pub body_color: Option<String>,
}

/// Accepts `3` as well as `"3"`; form-driven clients often send ids as strings.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Int(i32),
        Text(String),
    }

    match Option::<Repr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Repr::Int(n)) => Ok(Some(n)),
        Some(Repr::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid id {s:?}"))),
    }
}
