use serde::{Deserialize, Serialize};

#[derive(Serialize, Debug)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct AdminUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub role: String,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct LoginData {
    pub token: String,
    pub user: AdminUser,
}
