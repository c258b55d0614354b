// Business logic layer; one service per storefront area
pub mod catalog;
pub mod chat;
pub mod checkout;
pub mod demo_requests;
pub mod orders;
pub mod purchases;
pub mod seed;
pub mod users;
