pub mod ledger;

pub use ledger::{
    require_lot, LedgerPosting, PostingOrder, ReceiptPosting, ReturnPosting, TransferLeg,
    TransferPosting, UsagePosting,
};
