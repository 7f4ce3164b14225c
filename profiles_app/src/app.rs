use crate::config::Config;
use profiles_db::{profile::SqliteProfileRepo, user::SqliteUserRepo, Db, GetDb};
use profiles_domain::profile::repo::DelegateProfileRepo;
use profiles_domain::user::repo::DelegateUserRepo;
use profiles_domain::{GetConfig, System};

use std::sync::Arc;
use time::OffsetDateTime;

#[derive(Clone)]
pub struct App {
    pub config: Arc<Config>,
    pub db: Db,
}

impl System for App {
    fn get_current_time(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

impl GetConfig for App {
    fn get_jwt_signing_key(&self) -> &hmac::Hmac<sha2::Sha384> {
        &self.config.jwt_signing_key.0
    }
}

impl GetDb for App {
    fn get_db(&self) -> &Db {
        &self.db
    }
}

impl DelegateUserRepo<Self> for App {
    type Target = SqliteUserRepo;
}

impl DelegateProfileRepo<Self> for App {
    type Target = SqliteProfileRepo;
}
