use serde::{Deserialize, Serialize};

use crate::users::repo_types::User;

/// Profile update. Password fields are rejected here; the password has
/// its own route with the re-authentication requirement.
#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub photo: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub status: &'static str,
    pub data: UserData,
}

#[derive(Debug, Serialize)]
pub struct UserData {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub status: &'static str,
    pub results: usize,
    pub data: UserListData,
}

#[derive(Debug, Serialize)]
pub struct UserListData {
    pub users: Vec<User>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
