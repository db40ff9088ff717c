use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UserClaim {
    pub id: i32,
    pub login: String,
    pub exp: i64,
}
