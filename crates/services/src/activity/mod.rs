pub mod ports;

pub use ports::{
    is_bot_login, ActiveUser, PullRequestActivityRepository, UserPullRequestActivity,
    ACTIVE_USER_WINDOW_DAYS, BOT_LOGIN_SUFFIX,
};
