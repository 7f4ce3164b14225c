use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(clap::Parser)]
#[command(about = "User accounts with editable profiles")]
pub struct Config {
    /// SQLite URL, e.g. `sqlite://profiles.db` or `sqlite::memory:`.
    #[arg(long, env)]
    pub database_url: String,

    #[arg(long, env)]
    pub jwt_signing_key: JwtSigningKey,

    #[arg(long, env, default_value = "0.0.0.0:8080")]
    pub listen_addr: SocketAddr,

    /// JSON file of users to create at startup when missing.
    #[arg(long, env)]
    pub fixtures: Option<PathBuf>,
}

#[derive(Clone)]
pub struct JwtSigningKey(pub hmac::Hmac<sha2::Sha384>);

impl std::str::FromStr for JwtSigningKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use hmac::Mac;

        Ok(Self(
            hmac::Hmac::<sha2::Sha384>::new_from_slice(s.as_bytes())
                .map_err(|e| format!("Failed to parse hmac: {e:?}"))?,
        ))
    }
}
