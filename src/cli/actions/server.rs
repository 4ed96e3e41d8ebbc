use crate::api::{self, state::ApiConfig};
use crate::cli::actions::Action;
use anyhow::Result;
use url::Url;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            jwt_secret,
            polka_key,
            platform,
        } => {
            // Fail early on a malformed DSN instead of inside the pool.
            let dsn = Url::parse(&dsn)?;

            let config = ApiConfig::new(jwt_secret, polka_key, platform);

            api::new(port, dsn.to_string(), config).await?;
        }
    }

    Ok(())
}
