use serde::Deserialize;

#[derive(Deserialize, Debug, Default, PartialEq, Eq)]
pub struct Database {
    pub url: String,
    pub min_pool_connection: u32,
    pub max_pool_connection: u32,
    #[serde(default)]
    pub run_migrations: bool,
}

#[derive(Deserialize, Debug, Default, PartialEq, Eq)]
pub struct Apps {
    pub address: String,
    pub port: u16,
    pub upload_dir: String,
    pub max_upload_bytes: usize,
}

#[derive(Deserialize, Debug, Default, PartialEq, Eq)]
pub struct Jwt {
    pub secret: String,
}

#[derive(Deserialize, Debug, Default, PartialEq, Eq)]
pub struct Cors {
    pub allowed_origin: String,
}

#[derive(Deserialize, Debug, Default, PartialEq, Eq)]
pub struct Logger {
    pub log: String,
}

#[derive(Deserialize, Debug, Default, PartialEq, Eq)]
pub struct PostAppConfig {
    pub apps: Apps,
    pub database: Database,
    pub jwt: Jwt,
    pub cors: Cors,
    pub logger: Logger,
}
