// Services layer - Business logic and pure decision functions
pub mod auth_service;
pub mod catalog_tree;
pub mod crypto;
pub mod permission_evaluator;
pub mod sequence;
pub mod token_service;

pub use auth_service::AuthService;
pub use permission_evaluator::{Action, Actor, Decision, Role, Target};
pub use sequence::SequenceAllocator;
pub use token_service::TokenService;
