use std::env;

/// Everything the process reads from the environment, collected once at
/// startup. A missing variable kills the process before the server binds,
/// instead of surfacing mid-request.
#[derive(Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub s3_endpoint: String,
    pub s3_region: String,
    pub s3_bucket: String,
    pub s3_access_key: String,
    pub s3_secret_key: String,
    /// Base under which uploaded objects are publicly reachable,
    /// e.g. `https://cdn.example.com/vidhub`.
    pub s3_public_base: String,
}

fn required(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| panic!("{} must be set", name))
}

impl Config {
    pub fn from_env() -> Config {
        Config {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| String::from("127.0.0.1:5000")),
            database_url: required("DATABASE_URL"),
            jwt_secret: required("JWT_SECRET"),
            s3_endpoint: required("S3_ENDPOINT"),
            s3_region: required("S3_REGION"),
            s3_bucket: required("S3_BUCKET_NAME"),
            s3_access_key: required("S3_ACCESS_KEY_ID"),
            s3_secret_key: required("S3_SECRET_ACCESS_KEY"),
            s3_public_base: required("S3_PUBLIC_BASE"),
        }
    }
}
