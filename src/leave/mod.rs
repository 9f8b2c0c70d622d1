//! Leave lifecycle: balance accounting, status transitions and the desk that
//! runs them transactionally.

pub mod ledger;
pub mod service;
pub mod state;

#[cfg(test)]
mod tests;

pub use service::LeaveDesk;
