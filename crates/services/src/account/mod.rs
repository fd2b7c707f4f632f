pub mod ports;
pub mod service;

pub use ports::{
    Account, AccountError, AccountMembership, AccountRepository, AccountRole, AccountService,
    AccountType, CreateAccountParams, UpdateAccountParams,
};
pub use service::{AccountServiceImpl, TRIAL_LENGTH_DAYS};
