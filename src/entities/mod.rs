// Entity Models
//
// Input rows are immutable values; resolution produces labels keyed by row.

pub mod account;

pub use account::{
    AccountRecord, AccountType, Classification, DomainStatus, NormalizedDomain, NormalizedRecord,
};
