//! Log a fresh session into the forum.

use tracing::info;

use super::selectors::{LOGIN_PASSWORD, LOGIN_SUBMIT, LOGIN_USERNAME};
use super::{ScrapeError, Settler};
use crate::browser::BrowserSession;
use crate::config::{Credentials, SiteConfig};

/// Fill and submit the login form at `<site>/login`.
pub async fn login(
    session: &mut dyn BrowserSession,
    settler: &Settler,
    site: &SiteConfig,
    credentials: &Credentials,
) -> Result<(), ScrapeError> {
    session.goto(&site.login_url()).await?;
    settler.settle(session).await?;

    // Check the whole form up front so a missing element never leaves a half-filled page.
    for (selector, name) in [
        (LOGIN_USERNAME, "username input"),
        (LOGIN_PASSWORD, "password input"),
        (LOGIN_SUBMIT, "login button"),
    ] {
        if session.count(selector).await? == 0 {
            return Err(ScrapeError::AuthUiMissing(name));
        }
    }

    session
        .type_text(LOGIN_USERNAME, 0, &credentials.username)
        .await?;
    session
        .type_text(LOGIN_PASSWORD, 0, &credentials.password)
        .await?;
    session.click(LOGIN_SUBMIT, 0).await?;
    settler.settle(session).await?;

    info!("Logged in as {}", credentials.username);
    Ok(())
}
