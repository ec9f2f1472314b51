//! The transaction action controller and its async driver.

pub mod controller;
pub mod dapp;
pub mod view;

pub use controller::ActionController;
pub use dapp::DepositDapp;
pub use view::PageView;
