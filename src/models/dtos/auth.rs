use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LoginBodyDto {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}
