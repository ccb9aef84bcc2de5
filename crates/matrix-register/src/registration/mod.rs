pub mod assembler;
pub mod referrer_validator;
pub mod report;
pub mod submitter;
pub mod upline_resolver;

pub use assembler::{AssembledTransaction, TransactionAssembler};
pub use referrer_validator::{ReferrerContext, ReferrerValidator};
pub use report::{RegistrationReport, UplineVerification};
pub use submitter::{filter_ledger_logs, Submitter};
pub use upline_resolver::{UplineResolver, WalletFallbackPolicy};
