//! CSS selectors for the forum's DOM. Changes on the site break these.

/// Top-level forum and subforum anchors on the forum index.
pub const FORUM_LINKS: &str = "a[class*='forum-name'], a[class*='subforum-']";

/// Thread anchors on a forum listing page.
pub const THREAD_LINKS: &str = "a[class*='thread-subject']";

/// Poster name anchors, one per post.
pub const USERNAMES: &str = "a[class*='element_username']";

/// Quote glyph, one per post.
pub const QUOTE_BUTTONS: &str = "div[class*='iconf-quote-right']";

/// Reply composer filled by a quote click.
pub const REPLY_TEXTAREA: &str = "textarea#content";

/// Pagination "next" control (exact class match).
pub const NEXT_PAGE: &str = "input[class='right']";

pub const LOGIN_USERNAME: &str = "[name='username']";
pub const LOGIN_PASSWORD: &str = "input[type='password']";
pub const LOGIN_SUBMIT: &str = "input[type='submit'][value='Login']";
