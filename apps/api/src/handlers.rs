pub mod health;
pub mod risks;
pub mod security;
