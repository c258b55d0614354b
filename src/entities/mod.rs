pub mod chat_message;
pub mod demo_request;
pub mod order;
pub mod product;
pub mod purchase;
pub mod review;
pub mod user;

pub use chat_message::Entity as ChatMessage;
pub use demo_request::Entity as DemoRequest;
pub use order::Entity as Order;
pub use product::Entity as Product;
pub use purchase::Entity as Purchase;
pub use review::Entity as Review;
pub use user::Entity as User;
